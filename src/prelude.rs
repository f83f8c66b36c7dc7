pub use embedded_hal::prelude::*;

pub use crate::gpio::PinConfig as _timer_pwm_gpio_PinConfig;
pub use crate::rcc::ClockGate as _timer_pwm_rcc_ClockGate;
pub use crate::time::U32Ext as _timer_pwm_time_U32Ext;
pub use crate::timers::TimerRegisters as _timer_pwm_timers_TimerRegisters;
