//! Simulated peripherals
//!
//! Register level stand-ins for the timers, the clock controller and the
//! GPIO ports. They hold the values the hardware registers would hold after
//! the same sequence of writes, and count the writes so callers can check
//! that nothing was touched.

use crate::gpio::{self, PinCode, PinConfig, Port, Speed};
use crate::rcc::{Bus, ClockGate};
use crate::timers::{Channel, OutputCompare, Registers, TimeBase, TimerId, TimerRegisters};

/// TIM1 to TIM4
#[derive(Clone, Debug, Default)]
pub struct SimTimers {
    regs: [Registers; 4],
    writes: usize,
}

impl SimTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registers(&self, timer: TimerId) -> &Registers {
        &self.regs[timer.index()]
    }

    /// Number of register operations performed so far
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn regs_mut(&mut self, timer: TimerId) -> &mut Registers {
        self.writes += 1;
        &mut self.regs[timer.index()]
    }
}

impl TimerRegisters for SimTimers {
    fn time_base_init(&mut self, timer: TimerId, time_base: &TimeBase) {
        self.regs_mut(timer).time_base_init(time_base);
    }

    fn oc_init(&mut self, timer: TimerId, channel: Channel, oc: &OutputCompare) {
        self.regs_mut(timer).oc_init(channel, oc);
    }

    fn oc_preload(&mut self, timer: TimerId, channel: Channel, enable: bool) {
        self.regs_mut(timer).oc_preload(channel, enable);
    }

    fn arr_preload(&mut self, timer: TimerId, enable: bool) {
        self.regs_mut(timer).arr_preload(enable);
    }

    fn main_output(&mut self, timer: TimerId, enable: bool) {
        self.regs_mut(timer).main_output(enable);
    }

    fn counter(&mut self, timer: TimerId, enable: bool) {
        self.regs_mut(timer).counter(enable);
    }

    fn compare(&self, timer: TimerId, channel: Channel) -> u32 {
        self.registers(timer).ccr[channel.index()]
    }

    fn auto_reload(&self, timer: TimerId) -> u32 {
        self.registers(timer).arr
    }

    fn prescaler(&self, timer: TimerId) -> u32 {
        self.registers(timer).psc
    }

    fn is_counting(&self, timer: TimerId) -> bool {
        self.registers(timer).counter_enabled()
    }
}

/// Clock enable registers
#[derive(Clone, Debug, Default)]
pub struct SimRcc {
    pub apb1enr: u32,
    pub apb2enr: u32,
    writes: usize,
}

impl SimRcc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Whether a `(bus, mask)` pair from the clock tables is enabled
    pub fn is_enabled(&self, (bus, mask): (Bus, u32)) -> bool {
        let enr = match bus {
            Bus::Apb1 => self.apb1enr,
            Bus::Apb2 => self.apb2enr,
        };
        enr & mask == mask
    }

    fn enable(&mut self, (bus, mask): (Bus, u32)) {
        self.writes += 1;
        match bus {
            Bus::Apb1 => self.apb1enr |= mask,
            Bus::Apb2 => self.apb2enr |= mask,
        }
    }
}

impl ClockGate for SimRcc {
    fn enable_port(&mut self, port: Port) {
        self.enable(port.clock_enable());
    }

    fn enable_timer(&mut self, timer: TimerId) {
        self.enable(timer.clock_enable());
    }
}

/// CRL and CRH of ports A to D
#[derive(Clone, Debug)]
pub struct SimGpio {
    cr: [[u32; 2]; 4],
    writes: usize,
}

impl Default for SimGpio {
    fn default() -> Self {
        SimGpio {
            cr: [[gpio::CR_RESET; 2]; 4],
            writes: 0,
        }
    }
}

impl SimGpio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }

    /// CNF/MODE nibble of a pin
    pub fn config(&self, pin: PinCode) -> u32 {
        gpio::pin_config(self.cr[pin.port().index()][pin.config_register()], &pin)
    }

    /// Raw CRL (`0`) or CRH (`1`) of a port
    pub fn config_register(&self, port: Port, index: usize) -> u32 {
        self.cr[port.index()][index]
    }
}

impl PinConfig for SimGpio {
    fn into_alternate_push_pull(&mut self, pin: PinCode, speed: Speed) {
        self.writes += 1;
        let cr = &mut self.cr[pin.port().index()][pin.config_register()];
        *cr = gpio::with_pin_config(*cr, &pin, gpio::alternate_push_pull(speed));
    }
}
