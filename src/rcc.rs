use crate::gpio::Port;
use crate::time::Hertz;
use crate::timers::TimerId;

/// Peripheral bus, each with its own clock enable register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bus {
    /// Low speed bus (`APB1ENR`)
    Apb1,
    /// High speed bus (`APB2ENR`)
    Apb2,
}

impl Port {
    /// Bus and enable bit gating the clock of this port
    pub fn clock_enable(self) -> (Bus, u32) {
        // IOPAEN is bit 2, IOPBEN to IOPDEN follow
        (Bus::Apb2, 1 << (2 + self as u32))
    }
}

impl TimerId {
    /// Bus and enable bit gating the clock of this timer
    pub fn clock_enable(self) -> (Bus, u32) {
        match self {
            TimerId::Tim1 => (Bus::Apb2, 1 << 11),
            TimerId::Tim2 => (Bus::Apb1, 1 << 0),
            TimerId::Tim3 => (Bus::Apb1, 1 << 1),
            TimerId::Tim4 => (Bus::Apb1, 1 << 2),
        }
    }
}

/// Peripheral clock gating
pub trait ClockGate {
    /// Enables the clock of a GPIO port
    fn enable_port(&mut self, port: Port);

    /// Enables the clock of a timer
    fn enable_timer(&mut self, timer: TimerId);
}

/// Frozen clock frequencies
///
/// The existence of this value indicates that the clock configuration can no longer be changed
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Clocks {
    sysclk: Hertz,
}

impl Clocks {
    /// Records the system clock the timers are fed with
    pub fn new<F>(sysclk: F) -> Self
    where
        F: Into<Hertz>,
    {
        Clocks {
            sysclk: sysclk.into(),
        }
    }

    /// Returns the system (core) frequency
    pub fn sysclk(&self) -> Hertz {
        self.sysclk
    }
}
