//! Pulse width modulation on timer output compare channels
//!
//! A [`PwmHandle`] is populated once by [`Pwm::init`] and then driven with
//! [`Pwm::set_duty_cycle`]. Duty values are logical: `0` keeps the output low
//! for the whole period and `period + 1` keeps it high. The compare value
//! written to the hardware is the inverse, `period + 1 - duty`, which is
//! what the active high polarity needs in PWM mode 2.
//!
//! All channels of one timer share its counter. Initialising another channel
//! of the same timer reprograms the prescaler and period of every channel on
//! it, and [`Pwm::disable_output`] stops all of them.
//!
//! # Example
//! ``` no_run
//! use timer_pwm::prelude::*;
//! use timer_pwm::pwm::{Config, Pwm, PwmHandle};
//! use timer_pwm::rcc::Clocks;
//! use timer_pwm::sim::{SimGpio, SimRcc, SimTimers};
//! use timer_pwm::timers::{Channel, TimerId};
//!
//! let mut pwm = Pwm::new(
//!     SimTimers::new(),
//!     SimRcc::new(),
//!     SimGpio::new(),
//!     Clocks::new(144.mhz()),
//! );
//!
//! // PA8 is TIM1_CH1
//! let mut pa8 = PwmHandle::new();
//! pwm.init(&mut pa8, &Config::new(TimerId::Tim1, Channel::C1, 0xA8, 10.khz()))
//!     .unwrap();
//! // ~75 % on time, also starts the output
//! pwm.set_duty_cycle(&mut pa8, 191);
//! ```

use embedded_hal as hal;

use crate::gpio::{PinCode, PinConfig, Speed};
use crate::rcc::{ClockGate, Clocks};
use crate::time::Hertz;
use crate::timers::{
    Channel, ClockDivision, CounterMode, OutputCompare, Polarity, PwmMode, TimeBase, TimerId,
    TimerRegisters,
};

/// Period used when none is configured, 255 duty steps
pub const DEFAULT_RESOLUTION: u16 = 254;

/// PWM error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Pin code outside of ports A to D
    InvalidPin,
}

/// Channel configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub timer: TimerId,
    pub channel: Channel,
    /// Pin code, see [`crate::gpio`]
    pub pin: u8,
    /// Carrier frequency, only approximated
    pub frequency: Hertz,
    /// Counter top value, defaults to [`DEFAULT_RESOLUTION`]
    pub resolution: u16,
    /// Defaults to [`PwmMode::Mode2`]
    pub mode: PwmMode,
}

impl Config {
    pub fn new<F>(timer: TimerId, channel: Channel, pin: u8, frequency: F) -> Self
    where
        F: Into<Hertz>,
    {
        Config {
            timer,
            channel,
            pin,
            frequency: frequency.into(),
            resolution: DEFAULT_RESOLUTION,
            mode: PwmMode::default(),
        }
    }

    /// Sets the counter top value, `0` keeps the default
    pub fn resolution(mut self, count: u16) -> Self {
        if count != 0 {
            self.resolution = count;
        }
        self
    }

    pub fn mode(mut self, mode: PwmMode) -> Self {
        self.mode = mode;
        self
    }
}

/// State of one PWM output
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmHandle {
    timer: TimerId,
    channel: Channel,
    mode: PwmMode,
    prescaler: u16,
    period: u16,
    duty_cycle: u32,
}

impl PwmHandle {
    /// Zero valued handle, to be populated by [`Pwm::init`]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timer(&self) -> TimerId {
        self.timer
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn mode(&self) -> PwmMode {
        self.mode
    }

    pub fn prescaler(&self) -> u16 {
        self.prescaler
    }

    pub fn period(&self) -> u16 {
        self.period
    }

    /// Compare value last written, in `0..=period + 1`
    pub fn duty_cycle(&self) -> u32 {
        self.duty_cycle
    }
}

/// Prescaler approximating `frequency` with `resolution` counter steps
///
/// Both divisions round down, so the carrier is never faster than requested
/// and usually slower. A zero divisor, or a result that does not fit the
/// 16 bit prescaler, gives the slowest possible prescaler.
pub fn prescaler(sysclk: Hertz, resolution: u16, frequency: Hertz) -> u16 {
    sysclk
        .0
        .checked_div(u32::from(resolution))
        .and_then(|ticks| ticks.checked_div(frequency.0))
        .map_or(u16::MAX, |psc| cast::u16(psc).unwrap_or(u16::MAX))
}

/// Compare value producing `duty`, clamped to `period + 1`
pub fn compare_value(period: u16, duty: u32) -> u32 {
    let top = u32::from(period) + 1;
    top - duty.min(top)
}

/// PWM driver over the timer, clock and pin collaborators
pub struct Pwm<TIM, RCC, GPIO> {
    timers: TIM,
    rcc: RCC,
    gpio: GPIO,
    clocks: Clocks,
}

impl<TIM, RCC, GPIO> Pwm<TIM, RCC, GPIO>
where
    TIM: TimerRegisters,
    RCC: ClockGate,
    GPIO: PinConfig,
{
    pub fn new(timers: TIM, rcc: RCC, gpio: GPIO, clocks: Clocks) -> Self {
        Pwm {
            timers,
            rcc,
            gpio,
            clocks,
        }
    }

    /// Routes `config.pin` to its timer channel and programs the timebase
    ///
    /// An invalid pin is rejected before any register is touched and leaves
    /// `handle` as it was.
    pub fn init(&mut self, handle: &mut PwmHandle, config: &Config) -> Result<(), Error> {
        let pin = match PinCode::new(config.pin) {
            Ok(pin) => pin,
            Err(e) => {
                warn!("pwm: invalid pin code {=u8:#x}", config.pin);
                return Err(e);
            }
        };

        let prescaler = prescaler(self.clocks.sysclk(), config.resolution, config.frequency);

        self.rcc.enable_port(pin.port());
        self.rcc.enable_timer(config.timer);
        self.gpio.into_alternate_push_pull(pin, Speed::Mhz50);
        self.timers.time_base_init(
            config.timer,
            &TimeBase {
                prescaler,
                period: config.resolution,
                clock_division: ClockDivision::Div1,
                counter_mode: CounterMode::Up,
                repetition_counter: 0,
            },
        );

        *handle = PwmHandle {
            timer: config.timer,
            channel: config.channel,
            mode: config.mode,
            prescaler,
            period: config.resolution,
            duty_cycle: 0,
        };

        debug!(
            "pwm: {} {} on {}, prescaler {=u16} period {=u16}",
            config.timer, config.channel, pin, prescaler, config.resolution
        );
        Ok(())
    }

    /// Sets the logical duty, `0..=period + 1`, larger values are clamped
    ///
    /// Also enables the main output and the counter, so this is what starts
    /// the output after [`Pwm::init`] or [`Pwm::disable_output`].
    pub fn set_duty_cycle(&mut self, handle: &mut PwmHandle, duty: u32) {
        handle.duty_cycle = compare_value(handle.period, duty);

        let oc = OutputCompare {
            mode: handle.mode,
            output_enable: true,
            polarity: Polarity::ActiveHigh,
            pulse: handle.duty_cycle,
        };
        self.timers.oc_init(handle.timer, handle.channel, &oc);
        self.timers.main_output(handle.timer, true);
        self.timers.oc_preload(handle.timer, handle.channel, false);
        self.timers.arr_preload(handle.timer, true);
        self.timers.counter(handle.timer, true);

        trace!(
            "pwm: {} {} duty {=u32} compare {=u32}",
            handle.timer,
            handle.channel,
            duty,
            handle.duty_cycle
        );
    }

    /// Starts the counter of the handle's timer
    pub fn enable_output(&mut self, handle: &PwmHandle) {
        trace!("pwm: {} counter on", handle.timer);
        self.timers.counter(handle.timer, true);
    }

    /// Stops the counter of the handle's timer, halting every channel on it
    pub fn disable_output(&mut self, handle: &PwmHandle) {
        trace!("pwm: {} counter off", handle.timer);
        self.timers.counter(handle.timer, false);
    }

    /// Logical duty of the handle, the inverse of its compare value
    pub fn duty(&self, handle: &PwmHandle) -> u32 {
        self.max_duty(handle) - handle.duty_cycle
    }

    pub fn max_duty(&self, handle: &PwmHandle) -> u32 {
        u32::from(handle.period) + 1
    }

    /// Borrows a handle as an `embedded_hal` PWM pin
    pub fn channel<'a>(&'a mut self, handle: &'a mut PwmHandle) -> PwmChannel<'a, TIM, RCC, GPIO> {
        PwmChannel { pwm: self, handle }
    }

    pub fn timers(&self) -> &TIM {
        &self.timers
    }

    pub fn clocks(&self) -> Clocks {
        self.clocks
    }

    /// Releases the collaborators
    pub fn free(self) -> (TIM, RCC, GPIO) {
        (self.timers, self.rcc, self.gpio)
    }
}

/// A handle bound to its driver
pub struct PwmChannel<'a, TIM, RCC, GPIO> {
    pwm: &'a mut Pwm<TIM, RCC, GPIO>,
    handle: &'a mut PwmHandle,
}

impl<'a, TIM, RCC, GPIO> hal::PwmPin for PwmChannel<'a, TIM, RCC, GPIO>
where
    TIM: TimerRegisters,
    RCC: ClockGate,
    GPIO: PinConfig,
{
    type Duty = u32;

    /// Stops the whole timer
    fn disable(&mut self) {
        self.pwm.disable_output(&*self.handle)
    }

    fn enable(&mut self) {
        self.pwm.enable_output(&*self.handle)
    }

    fn get_duty(&self) -> u32 {
        self.pwm.duty(&*self.handle)
    }

    fn get_max_duty(&self) -> u32 {
        self.pwm.max_duty(&*self.handle)
    }

    fn set_duty(&mut self, duty: u32) {
        self.pwm.set_duty_cycle(self.handle, duty)
    }
}
