use timer_pwm::gpio::{PinCode, Port};
use timer_pwm::prelude::*;
use timer_pwm::pwm::{Config, Error, Pwm, PwmHandle};
use timer_pwm::rcc::Clocks;
use timer_pwm::sim::{SimGpio, SimRcc, SimTimers};
use timer_pwm::timers::{Channel, PwmMode, TimerId, BDTR_MOE, CR1_ARPE};

type SimPwm = Pwm<SimTimers, SimRcc, SimGpio>;

fn pwm_at(sysclk_hz: u32) -> SimPwm {
    Pwm::new(
        SimTimers::new(),
        SimRcc::new(),
        SimGpio::new(),
        Clocks::new(sysclk_hz.hz()),
    )
}

fn init(pwm: &mut SimPwm, config: Config) -> PwmHandle {
    let mut handle = PwmHandle::new();
    pwm.init(&mut handle, &config).unwrap();
    handle
}

#[test]
fn init_accepts_every_pin_of_ports_a_to_d() {
    for code in 0xA0..=0xDFu8 {
        let mut pwm = pwm_at(144_000_000);
        let handle = init(
            &mut pwm,
            Config::new(TimerId::Tim2, Channel::C4, code, 1.khz()).mode(PwmMode::Mode1),
        );

        assert_eq!(handle.timer(), TimerId::Tim2);
        assert_eq!(handle.channel(), Channel::C4);
        assert_eq!(handle.mode(), PwmMode::Mode1);
        assert_eq!(handle.period(), 254);
        assert_eq!(handle.prescaler(), 566);
        assert_eq!(handle.duty_cycle(), 0);

        let (_, rcc, gpio) = pwm.free();
        let pin = PinCode::new(code).unwrap();
        assert!(rcc.is_enabled(pin.port().clock_enable()));
        assert!(rcc.is_enabled(TimerId::Tim2.clock_enable()));
        assert_eq!(gpio.config(pin), 0b1011);
    }
}

#[test]
fn invalid_pin_touches_nothing() {
    let invalid = (0x00..0xA0u8).chain(0xE0..=0xFF);
    for code in invalid {
        let mut pwm = pwm_at(144_000_000);
        let mut handle = PwmHandle::new();
        let config = Config::new(TimerId::Tim1, Channel::C1, code, 10.khz());

        assert_eq!(pwm.init(&mut handle, &config), Err(Error::InvalidPin));
        assert_eq!(handle, PwmHandle::default());

        let (timers, rcc, gpio) = pwm.free();
        assert_eq!(timers.writes(), 0);
        assert_eq!(rcc.writes(), 0);
        assert_eq!(gpio.writes(), 0);
    }
}

#[test]
fn invalid_pin_keeps_an_initialised_handle() {
    let mut pwm = pwm_at(144_000_000);
    let mut handle = init(
        &mut pwm,
        Config::new(TimerId::Tim1, Channel::C1, 0xA8, 10.khz()),
    );
    pwm.set_duty_cycle(&mut handle, 191);
    let before = handle;

    let config = Config::new(TimerId::Tim3, Channel::C2, 0x5A, 20.khz());
    assert_eq!(pwm.init(&mut handle, &config), Err(Error::InvalidPin));
    assert_eq!(handle, before);
}

#[test]
fn timebase_is_programmed() {
    let mut pwm = pwm_at(144_000_000);
    init(
        &mut pwm,
        Config::new(TimerId::Tim1, Channel::C1, 0xA8, 10.khz()),
    );

    let regs = pwm.timers().registers(TimerId::Tim1);
    assert_eq!(regs.psc, 56);
    assert_eq!(regs.arr, 254);
    // up counting, no clock division, counter still stopped
    assert_eq!(regs.cr1, 0);
}

#[test]
fn custom_resolution_changes_prescaler() {
    let mut pwm = pwm_at(72_000_000);
    let handle = init(
        &mut pwm,
        Config::new(TimerId::Tim3, Channel::C1, 0xA6, 1.khz()).resolution(999),
    );

    // 72_000_000 / 999 = 72_072, / 1_000 = 72
    assert_eq!(handle.prescaler(), 72);
    assert_eq!(handle.period(), 999);
    assert_eq!(pwm.timers().auto_reload(TimerId::Tim3), 999);
}

#[test]
fn duty_scenarios() {
    let mut pwm = pwm_at(144_000_000);
    let mut handle = init(
        &mut pwm,
        Config::new(TimerId::Tim1, Channel::C1, 0xA8, 10.khz()),
    );

    // (duty, compare)
    let cases = [(191, 64), (128, 127), (51, 204), (0, 255), (255, 0)];
    for &(duty, compare) in cases.iter() {
        pwm.set_duty_cycle(&mut handle, duty);
        assert_eq!(handle.duty_cycle(), compare);
        assert_eq!(pwm.timers().compare(TimerId::Tim1, Channel::C1), compare);
    }
}

#[test]
fn every_in_range_duty_is_inverted() {
    let mut pwm = pwm_at(144_000_000);
    let mut handle = init(
        &mut pwm,
        Config::new(TimerId::Tim4, Channel::C2, 0xB7, 40.khz()),
    );

    for duty in 0..=255 {
        pwm.set_duty_cycle(&mut handle, duty);
        assert_eq!(handle.duty_cycle(), 255 - duty);
        assert!(handle.duty_cycle() <= u32::from(handle.period()) + 1);
    }
}

#[test]
fn out_of_range_duty_is_clamped_to_off() {
    let mut pwm = pwm_at(144_000_000);
    let mut handle = init(
        &mut pwm,
        Config::new(TimerId::Tim4, Channel::C3, 0xB8, 40.khz()),
    );

    pwm.set_duty_cycle(&mut handle, 255);
    let at_max = *pwm.timers().registers(TimerId::Tim4);

    for &duty in [256, 1_000, u32::MAX].iter() {
        pwm.set_duty_cycle(&mut handle, duty);
        assert_eq!(handle.duty_cycle(), 0);
        assert_eq!(*pwm.timers().registers(TimerId::Tim4), at_max);
    }
}

#[test]
fn set_duty_cycle_is_idempotent() {
    let mut pwm = pwm_at(144_000_000);
    let mut handle = init(
        &mut pwm,
        Config::new(TimerId::Tim2, Channel::C1, 0xA0, 5.khz()),
    );

    pwm.set_duty_cycle(&mut handle, 100);
    let once = *pwm.timers().registers(TimerId::Tim2);
    pwm.set_duty_cycle(&mut handle, 100);

    assert_eq!(*pwm.timers().registers(TimerId::Tim2), once);
}

#[test]
fn set_duty_cycle_programs_channel() {
    let mut pwm = pwm_at(144_000_000);
    let mut handle = init(
        &mut pwm,
        Config::new(TimerId::Tim1, Channel::C2, 0xA9, 10.khz()),
    );
    pwm.set_duty_cycle(&mut handle, 128);

    let regs = pwm.timers().registers(TimerId::Tim1);
    assert_eq!(regs.oc_mode(Channel::C2), 0b111);
    assert!(regs.output_enabled(Channel::C2));
    assert!(!regs.active_low(Channel::C2));
    assert!(!regs.oc_preload_enabled(Channel::C2));
    assert_eq!(regs.cr1 & CR1_ARPE, CR1_ARPE);
    assert_eq!(regs.bdtr & BDTR_MOE, BDTR_MOE);
    assert!(regs.counter_enabled());
    // other channels are left alone
    assert!(!regs.output_enabled(Channel::C1));
    assert_eq!(regs.oc_mode(Channel::C1), 0);
}

#[test]
fn mode_one_selects_pwm_mode_1() {
    let mut pwm = pwm_at(144_000_000);
    let mut handle = init(
        &mut pwm,
        Config::new(TimerId::Tim3, Channel::C4, 0xB1, 20.khz()).mode(PwmMode::Mode1),
    );
    pwm.set_duty_cycle(&mut handle, 10);

    let regs = pwm.timers().registers(TimerId::Tim3);
    assert_eq!(regs.oc_mode(Channel::C4), 0b110);
}

#[test]
fn disable_stops_every_channel_of_the_timer() {
    let mut pwm = pwm_at(144_000_000);
    let mut pa6 = init(
        &mut pwm,
        Config::new(TimerId::Tim3, Channel::C1, 0xA6, 20.khz()),
    );
    let mut pa7 = init(
        &mut pwm,
        Config::new(TimerId::Tim3, Channel::C2, 0xA7, 20.khz()),
    );
    let mut pb8 = init(
        &mut pwm,
        Config::new(TimerId::Tim4, Channel::C3, 0xB8, 40.khz()),
    );
    pwm.set_duty_cycle(&mut pa6, 128);
    pwm.set_duty_cycle(&mut pa7, 128);
    pwm.set_duty_cycle(&mut pb8, 51);

    pwm.disable_output(&pa7);

    // pa6 shares TIM3 with pa7 and halts with it, TIM4 keeps running
    assert!(!pwm.timers().is_counting(pa6.timer()));
    assert!(!pwm.timers().is_counting(TimerId::Tim3));
    assert!(pwm.timers().is_counting(TimerId::Tim4));
    // compare values survive
    assert_eq!(pwm.timers().compare(TimerId::Tim3, Channel::C1), 127);
    assert_eq!(pwm.timers().compare(TimerId::Tim3, Channel::C2), 127);

    pwm.enable_output(&pa6);
    assert!(pwm.timers().is_counting(TimerId::Tim3));
}

#[test]
fn set_duty_cycle_restarts_a_disabled_timer() {
    let mut pwm = pwm_at(144_000_000);
    let mut handle = init(
        &mut pwm,
        Config::new(TimerId::Tim2, Channel::C2, 0xA1, 10.khz()),
    );
    pwm.set_duty_cycle(&mut handle, 10);
    pwm.disable_output(&handle);
    assert!(!pwm.timers().is_counting(TimerId::Tim2));

    pwm.set_duty_cycle(&mut handle, 20);
    assert!(pwm.timers().is_counting(TimerId::Tim2));
}

#[test]
fn reinit_overwrites_the_shared_timebase_only() {
    let mut pwm = pwm_at(144_000_000);
    let mut pa6 = init(
        &mut pwm,
        Config::new(TimerId::Tim3, Channel::C1, 0xA6, 20.khz()),
    );
    pwm.set_duty_cycle(&mut pa6, 200);

    let pa7 = init(
        &mut pwm,
        Config::new(TimerId::Tim3, Channel::C2, 0xA7, 1.khz()).resolution(99),
    );

    // the earlier handle still records its own timebase
    assert_eq!(pa6.prescaler(), 28);
    assert_eq!(pa6.period(), 254);
    assert_eq!(pa7.period(), 99);
    // the timer now runs at the last requested timebase
    assert_eq!(pwm.timers().prescaler(TimerId::Tim3), u32::from(pa7.prescaler()));
    assert_eq!(pwm.timers().auto_reload(TimerId::Tim3), 99);
    // pa6 compare register is untouched
    assert_eq!(pwm.timers().compare(TimerId::Tim3, Channel::C1), 55);
}

#[test]
fn gpio_ports_are_clocked_on_demand() {
    let mut pwm = pwm_at(144_000_000);
    init(
        &mut pwm,
        Config::new(TimerId::Tim4, Channel::C3, 0xB8, 40.khz()),
    );

    let (_, rcc, _) = pwm.free();
    assert!(rcc.is_enabled(Port::B.clock_enable()));
    assert!(!rcc.is_enabled(Port::A.clock_enable()));
    assert!(rcc.is_enabled(TimerId::Tim4.clock_enable()));
    assert!(!rcc.is_enabled(TimerId::Tim1.clock_enable()));
}
