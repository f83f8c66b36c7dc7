//! PWM on PA8 (TIM1_CH1), PA6 (TIM3_CH1), PA7 (TIM3_CH2) and PB8 (TIM4_CH3)
//!
//! The carriers are only approximated, the prescaler is an integer divider.

#![no_main]
#![no_std]

// Halt on panic
use panic_halt as _;

use cortex_m_rt::entry;

use timer_pwm as hal;

use hal::{
    device, pac,
    prelude::*,
    pwm::{Config, Pwm, PwmHandle},
    rcc::Clocks,
    timers::{Channel, TimerId},
};

#[entry]
fn main() -> ! {
    if let Some(dp) = pac::Peripherals::take() {
        // Clock tree left at reset, the core runs from the 8 MHz HSI
        let mut pwm = Pwm::new(
            device::Timers::new(dp.TIM1, dp.TIM2, dp.TIM3, dp.TIM4),
            device::Rcc::new(dp.RCC),
            device::Gpio::new(dp.GPIOA, dp.GPIOB, dp.GPIOC, dp.GPIOD),
            Clocks::new(8.mhz()),
        );

        let mut pa8 = PwmHandle::new();
        let mut pa6 = PwmHandle::new();
        let mut pa7 = PwmHandle::new();
        let mut pb8 = PwmHandle::new();

        pwm.init(&mut pa8, &Config::new(TimerId::Tim1, Channel::C1, 0xA8, 10.khz()))
            .unwrap();
        pwm.init(&mut pa6, &Config::new(TimerId::Tim3, Channel::C1, 0xA6, 20.khz()))
            .unwrap();
        pwm.init(&mut pa7, &Config::new(TimerId::Tim3, Channel::C2, 0xA7, 20.khz()))
            .unwrap();
        pwm.init(&mut pb8, &Config::new(TimerId::Tim4, Channel::C3, 0xB8, 40.khz()))
            .unwrap();

        // ~75 %, setting a duty also starts the timer
        pwm.set_duty_cycle(&mut pa8, 191);
        // 50 %
        pwm.set_duty_cycle(&mut pa6, 128);
        pwm.set_duty_cycle(&mut pa7, 128);
        // ~20 %
        pwm.set_duty_cycle(&mut pb8, 51);

        // TIM3 is shared, this stops PA6 as well
        pwm.disable_output(&pa7);
    }

    loop {
        cortex_m::asm::nop();
    }
}
