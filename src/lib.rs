#![cfg_attr(not(test), no_std)]

// must come first so the logging macros are visible to every module
#[macro_use]
mod fmt;

#[cfg(feature = "stm32f103")]
pub use stm32f1;

#[cfg(feature = "stm32f103")]
pub use stm32f1::stm32f103 as pac;

#[cfg(feature = "stm32f103")]
pub mod device;
pub mod gpio;
pub mod prelude;
pub mod pwm;
pub mod rcc;
pub mod sim;
pub mod time;
pub mod timers;
