//! Register backend for the STM32F103
//!
//! The CH32V20x timers, clock controller and GPIO ports are register
//! compatible, so this backend drives those parts as well.
//!
//! # Example
//! ``` no_run
//! use timer_pwm::{device, pac, prelude::*, pwm::Pwm, rcc::Clocks};
//!
//! let dp = pac::Peripherals::take().unwrap();
//! let mut pwm = Pwm::new(
//!     device::Timers::new(dp.TIM1, dp.TIM2, dp.TIM3, dp.TIM4),
//!     device::Rcc::new(dp.RCC),
//!     device::Gpio::new(dp.GPIOA, dp.GPIOB, dp.GPIOC, dp.GPIOD),
//!     Clocks::new(72.mhz()),
//! );
//! ```

use crate::gpio::{self, PinCode, PinConfig, Port, Speed};
use crate::pac::{self, GPIOA, GPIOB, GPIOC, GPIOD, RCC, TIM1, TIM2, TIM3, TIM4};
use crate::rcc::{Bus, ClockGate};
use crate::timers::{self, Channel, OutputCompare, TimeBase, TimerId, TimerRegisters};

// Binds `$tim` to the register block of `$timer`. TIM1 and TIM2..TIM4 have
// distinct register block types, so `$body` is expanded once per timer.
macro_rules! with_timer {
    ($timers:expr, $timer:expr, |$tim:ident| $body:expr) => {
        match $timer {
            TimerId::Tim1 => {
                let $tim = &*$timers.tim1;
                $body
            }
            TimerId::Tim2 => {
                let $tim = &*$timers.tim2;
                $body
            }
            TimerId::Tim3 => {
                let $tim = &*$timers.tim3;
                $body
            }
            TimerId::Tim4 => {
                let $tim = &*$timers.tim4;
                $body
            }
        }
    };
}

// Read-modify-write of the CCMRx register holding `$channel`
macro_rules! modify_ccmr {
    ($tim:ident, $channel:expr, |$bits:ident| $value:expr) => {
        if $channel.layout().ccmr == 0 {
            $tim.ccmr1_output()
                .modify(|r, w| unsafe { w.bits({ let $bits = r.bits(); $value }) });
        } else {
            $tim.ccmr2_output()
                .modify(|r, w| unsafe { w.bits({ let $bits = r.bits(); $value }) });
        }
    };
}

/// TIM1 to TIM4
pub struct Timers {
    tim1: TIM1,
    tim2: TIM2,
    tim3: TIM3,
    tim4: TIM4,
}

impl Timers {
    pub fn new(tim1: TIM1, tim2: TIM2, tim3: TIM3, tim4: TIM4) -> Self {
        Timers {
            tim1,
            tim2,
            tim3,
            tim4,
        }
    }

    /// Releases the TIM peripherals
    pub fn release(self) -> (TIM1, TIM2, TIM3, TIM4) {
        (self.tim1, self.tim2, self.tim3, self.tim4)
    }
}

impl TimerRegisters for Timers {
    fn time_base_init(&mut self, timer: TimerId, time_base: &TimeBase) {
        with_timer!(self, timer, |tim| {
            tim.cr1
                .modify(|r, w| unsafe { w.bits(timers::cr1_time_base(r.bits(), time_base)) });
            tim.arr
                .write(|w| unsafe { w.bits(u32::from(time_base.period)) });
            tim.psc
                .write(|w| unsafe { w.bits(u32::from(time_base.prescaler)) });
        });
        if timer == TimerId::Tim1 {
            self.tim1
                .rcr
                .write(|w| unsafe { w.bits(u32::from(time_base.repetition_counter)) });
        }
        // load the prescaler now rather than at the next overflow
        with_timer!(self, timer, |tim| tim.egr.write(|w| unsafe { w.bits(timers::EGR_UG) }));
    }

    fn oc_init(&mut self, timer: TimerId, channel: Channel, oc: &OutputCompare) {
        with_timer!(self, timer, |tim| {
            tim.ccer
                .modify(|r, w| unsafe { w.bits(timers::ccer_disable(r.bits(), channel)) });
            modify_ccmr!(tim, channel, |ccmr| timers::ccmr_mode(ccmr, channel, oc.mode));
            tim.ccr[channel.index()].write(|w| unsafe { w.bits(oc.pulse) });
            tim.ccer
                .modify(|r, w| unsafe { w.bits(timers::ccer_output(r.bits(), channel, oc)) });
        });
    }

    fn oc_preload(&mut self, timer: TimerId, channel: Channel, enable: bool) {
        with_timer!(self, timer, |tim| {
            modify_ccmr!(tim, channel, |ccmr| timers::ccmr_preload(ccmr, channel, enable));
        });
    }

    fn arr_preload(&mut self, timer: TimerId, enable: bool) {
        with_timer!(self, timer, |tim| {
            tim.cr1
                .modify(|r, w| unsafe { w.bits(timers::cr1_arr_preload(r.bits(), enable)) })
        });
    }

    fn main_output(&mut self, timer: TimerId, enable: bool) {
        // general purpose timers have no break and dead-time register
        if timer == TimerId::Tim1 {
            self.tim1
                .bdtr
                .modify(|r, w| unsafe { w.bits(timers::bdtr_main_output(r.bits(), enable)) });
        }
    }

    fn counter(&mut self, timer: TimerId, enable: bool) {
        with_timer!(self, timer, |tim| {
            tim.cr1
                .modify(|r, w| unsafe { w.bits(timers::cr1_counter(r.bits(), enable)) })
        });
    }

    fn compare(&self, timer: TimerId, channel: Channel) -> u32 {
        with_timer!(self, timer, |tim| tim.ccr[channel.index()].read().bits())
    }

    fn auto_reload(&self, timer: TimerId) -> u32 {
        with_timer!(self, timer, |tim| tim.arr.read().bits())
    }

    fn prescaler(&self, timer: TimerId) -> u32 {
        with_timer!(self, timer, |tim| tim.psc.read().bits())
    }

    fn is_counting(&self, timer: TimerId) -> bool {
        with_timer!(self, timer, |tim| tim.cr1.read().bits() & timers::CR1_CEN != 0)
    }
}

/// Constrained RCC peripheral, only the peripheral clock enables are used
pub struct Rcc {
    rcc: RCC,
}

impl Rcc {
    pub fn new(rcc: RCC) -> Self {
        Rcc { rcc }
    }

    pub fn release(self) -> RCC {
        self.rcc
    }

    fn enable(&mut self, (bus, mask): (Bus, u32)) {
        let rcc = &self.rcc;
        cortex_m::interrupt::free(|_| match bus {
            Bus::Apb1 => rcc
                .apb1enr
                .modify(|r, w| unsafe { w.bits(r.bits() | mask) }),
            Bus::Apb2 => rcc
                .apb2enr
                .modify(|r, w| unsafe { w.bits(r.bits() | mask) }),
        });
    }
}

impl ClockGate for Rcc {
    fn enable_port(&mut self, port: Port) {
        self.enable(port.clock_enable());
    }

    fn enable_timer(&mut self, timer: TimerId) {
        self.enable(timer.clock_enable());
    }
}

/// GPIO ports A to D
pub struct Gpio {
    gpioa: GPIOA,
    gpiob: GPIOB,
    gpioc: GPIOC,
    gpiod: GPIOD,
}

impl Gpio {
    pub fn new(gpioa: GPIOA, gpiob: GPIOB, gpioc: GPIOC, gpiod: GPIOD) -> Self {
        Gpio {
            gpioa,
            gpiob,
            gpioc,
            gpiod,
        }
    }

    pub fn release(self) -> (GPIOA, GPIOB, GPIOC, GPIOD) {
        (self.gpioa, self.gpiob, self.gpioc, self.gpiod)
    }

    fn port(&self, port: Port) -> &pac::gpioa::RegisterBlock {
        match port {
            Port::A => &*self.gpioa,
            Port::B => &*self.gpiob,
            Port::C => &*self.gpioc,
            Port::D => &*self.gpiod,
        }
    }
}

impl PinConfig for Gpio {
    fn into_alternate_push_pull(&mut self, pin: PinCode, speed: Speed) {
        let reg = self.port(pin.port());
        let config = gpio::alternate_push_pull(speed);
        cortex_m::interrupt::free(|_| {
            if pin.config_register() == 0 {
                reg.crl
                    .modify(|r, w| unsafe { w.bits(gpio::with_pin_config(r.bits(), &pin, config)) });
            } else {
                reg.crh
                    .modify(|r, w| unsafe { w.bits(gpio::with_pin_config(r.bits(), &pin, config)) });
            }
        });
    }
}
