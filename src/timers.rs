//! General purpose and advanced control timers
//!
//! TIM1 (advanced) and TIM2 to TIM4 (general purpose) share the layout of
//! the registers used for PWM generation. The bit level encoding of every
//! operation lives here as plain functions over register values so that the
//! PAC backend and the simulated backend program identical bits.

/// Timer instance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerId {
    #[default]
    Tim1,
    Tim2,
    Tim3,
    Tim4,
}

impl TimerId {
    /// Position of the timer in timer ordered tables
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Output compare channel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    #[default]
    C1,
    C2,
    C3,
    C4,
}

impl Channel {
    pub fn index(self) -> usize {
        self as usize
    }

    pub(crate) fn layout(self) -> &'static ChannelLayout {
        &CHANNEL_LAYOUT[self.index()]
    }
}

/// Output compare mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmMode {
    /// Output active while the counter is below the compare value
    Mode1,
    /// Output active once the counter reached the compare value
    #[default]
    Mode2,
}

impl PwmMode {
    fn ocm_bits(self) -> u32 {
        match self {
            PwmMode::Mode1 => 0b110,
            PwmMode::Mode2 => 0b111,
        }
    }
}

/// Output polarity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    #[default]
    ActiveHigh,
    ActiveLow,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CounterMode {
    #[default]
    Up,
    Down,
    CenterAligned1,
    CenterAligned2,
    CenterAligned3,
}

/// Ratio between the timer clock and the sampling clock of the digital filters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockDivision {
    #[default]
    Div1,
    Div2,
    Div4,
}

/// Counter configuration shared by all channels of a timer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeBase {
    pub prescaler: u16,
    /// Auto reload value, the counter counts `0..=period`
    pub period: u16,
    pub clock_division: ClockDivision,
    pub counter_mode: CounterMode,
    /// Only implemented by TIM1
    pub repetition_counter: u8,
}

/// Output compare configuration of one channel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputCompare {
    pub mode: PwmMode,
    pub output_enable: bool,
    pub polarity: Polarity,
    pub pulse: u32,
}

/// Timer register access, addressed by timer identity
pub trait TimerRegisters {
    /// Programs counter mode, clock division, period and prescaler, then
    /// generates an update event so the prescaler is loaded immediately
    fn time_base_init(&mut self, timer: TimerId, time_base: &TimeBase);

    /// Programs mode, polarity, output state and compare value of a channel
    fn oc_init(&mut self, timer: TimerId, channel: Channel, oc: &OutputCompare);

    /// Compare value preload, new values wait for the next update event when enabled
    fn oc_preload(&mut self, timer: TimerId, channel: Channel, enable: bool);

    /// Auto reload preload
    fn arr_preload(&mut self, timer: TimerId, enable: bool);

    /// Main output enable, gates every output of an advanced timer
    fn main_output(&mut self, timer: TimerId, enable: bool);

    /// Starts or stops the counter
    fn counter(&mut self, timer: TimerId, enable: bool);

    /// Current compare value of a channel
    fn compare(&self, timer: TimerId, channel: Channel) -> u32;

    /// Current auto reload value
    fn auto_reload(&self, timer: TimerId) -> u32;

    fn prescaler(&self, timer: TimerId) -> u32;

    fn is_counting(&self, timer: TimerId) -> bool;
}

/// Where the bits of one channel live
pub(crate) struct ChannelLayout {
    /// 0 for CCMR1, 1 for CCMR2
    pub ccmr: usize,
    /// Offset of the channel byte within CCMRx
    pub ccmr_offset: u32,
    /// Offset of the channel nibble within CCER
    pub ccer_offset: u32,
}

pub(crate) static CHANNEL_LAYOUT: [ChannelLayout; 4] = [
    ChannelLayout {
        ccmr: 0,
        ccmr_offset: 0,
        ccer_offset: 0,
    },
    ChannelLayout {
        ccmr: 0,
        ccmr_offset: 8,
        ccer_offset: 4,
    },
    ChannelLayout {
        ccmr: 1,
        ccmr_offset: 0,
        ccer_offset: 8,
    },
    ChannelLayout {
        ccmr: 1,
        ccmr_offset: 8,
        ccer_offset: 12,
    },
];

pub const CR1_CEN: u32 = 1 << 0;
const CR1_DIR: u32 = 1 << 4;
const CR1_CMS: u32 = 0b11 << 5;
pub const CR1_ARPE: u32 = 1 << 7;
const CR1_CKD: u32 = 0b11 << 8;

pub const EGR_UG: u32 = 1 << 0;

const CCMR_CCS: u32 = 0b11;
pub const CCMR_OCPE: u32 = 1 << 3;
const CCMR_OCM: u32 = 0b111 << 4;

pub const CCER_CCE: u32 = 1 << 0;
pub const CCER_CCP: u32 = 1 << 1;

pub const BDTR_MOE: u32 = 1 << 15;

fn set_bits(value: u32, mask: u32, enable: bool) -> u32 {
    if enable {
        value | mask
    } else {
        value & !mask
    }
}

/// CR1 with direction, center aligned mode and clock division of `time_base`
pub(crate) fn cr1_time_base(cr1: u32, time_base: &TimeBase) -> u32 {
    let (dir, cms) = match time_base.counter_mode {
        CounterMode::Up => (0, 0b00),
        CounterMode::Down => (CR1_DIR, 0b00),
        CounterMode::CenterAligned1 => (0, 0b01),
        CounterMode::CenterAligned2 => (0, 0b10),
        CounterMode::CenterAligned3 => (0, 0b11),
    };
    let ckd = match time_base.clock_division {
        ClockDivision::Div1 => 0b00,
        ClockDivision::Div2 => 0b01,
        ClockDivision::Div4 => 0b10,
    };
    (cr1 & !(CR1_DIR | CR1_CMS | CR1_CKD)) | dir | (cms << 5) | (ckd << 8)
}

pub(crate) fn cr1_arr_preload(cr1: u32, enable: bool) -> u32 {
    set_bits(cr1, CR1_ARPE, enable)
}

pub(crate) fn cr1_counter(cr1: u32, enable: bool) -> u32 {
    set_bits(cr1, CR1_CEN, enable)
}

/// CCMRx with the channel switched to output and `mode`
pub(crate) fn ccmr_mode(ccmr: u32, channel: Channel, mode: PwmMode) -> u32 {
    let offset = channel.layout().ccmr_offset;
    (ccmr & !((CCMR_OCM | CCMR_CCS) << offset)) | (mode.ocm_bits() << (4 + offset))
}

pub(crate) fn ccmr_preload(ccmr: u32, channel: Channel, enable: bool) -> u32 {
    set_bits(ccmr, CCMR_OCPE << channel.layout().ccmr_offset, enable)
}

pub(crate) fn ccer_disable(ccer: u32, channel: Channel) -> u32 {
    ccer & !(CCER_CCE << channel.layout().ccer_offset)
}

/// CCER with polarity and output state of `oc`
pub(crate) fn ccer_output(ccer: u32, channel: Channel, oc: &OutputCompare) -> u32 {
    let offset = channel.layout().ccer_offset;
    let ccer = set_bits(ccer, CCER_CCP << offset, oc.polarity == Polarity::ActiveLow);
    set_bits(ccer, CCER_CCE << offset, oc.output_enable)
}

pub(crate) fn bdtr_main_output(bdtr: u32, enable: bool) -> u32 {
    set_bits(bdtr, BDTR_MOE, enable)
}

/// Register file of a single timer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Registers {
    pub cr1: u32,
    pub egr: u32,
    pub ccmr: [u32; 2],
    pub ccer: u32,
    pub psc: u32,
    pub arr: u32,
    pub rcr: u32,
    pub ccr: [u32; 4],
    pub bdtr: u32,
}

impl Registers {
    pub fn time_base_init(&mut self, time_base: &TimeBase) {
        self.cr1 = cr1_time_base(self.cr1, time_base);
        self.arr = u32::from(time_base.period);
        self.psc = u32::from(time_base.prescaler);
        self.rcr = u32::from(time_base.repetition_counter);
        self.egr = EGR_UG;
    }

    pub fn oc_init(&mut self, channel: Channel, oc: &OutputCompare) {
        let ccmr = channel.layout().ccmr;
        // the channel is switched off while its mode changes
        self.ccer = ccer_disable(self.ccer, channel);
        self.ccmr[ccmr] = ccmr_mode(self.ccmr[ccmr], channel, oc.mode);
        self.ccr[channel.index()] = oc.pulse;
        self.ccer = ccer_output(self.ccer, channel, oc);
    }

    pub fn oc_preload(&mut self, channel: Channel, enable: bool) {
        let ccmr = channel.layout().ccmr;
        self.ccmr[ccmr] = ccmr_preload(self.ccmr[ccmr], channel, enable);
    }

    pub fn arr_preload(&mut self, enable: bool) {
        self.cr1 = cr1_arr_preload(self.cr1, enable);
    }

    pub fn main_output(&mut self, enable: bool) {
        self.bdtr = bdtr_main_output(self.bdtr, enable);
    }

    pub fn counter(&mut self, enable: bool) {
        self.cr1 = cr1_counter(self.cr1, enable);
    }

    pub fn counter_enabled(&self) -> bool {
        self.cr1 & CR1_CEN != 0
    }

    /// Output compare mode bits (OCxM) of a channel
    pub fn oc_mode(&self, channel: Channel) -> u32 {
        let layout = channel.layout();
        (self.ccmr[layout.ccmr] >> (4 + layout.ccmr_offset)) & 0b111
    }

    pub fn oc_preload_enabled(&self, channel: Channel) -> bool {
        let layout = channel.layout();
        self.ccmr[layout.ccmr] & (CCMR_OCPE << layout.ccmr_offset) != 0
    }

    pub fn output_enabled(&self, channel: Channel) -> bool {
        self.ccer & (CCER_CCE << channel.layout().ccer_offset) != 0
    }

    pub fn active_low(&self, channel: Channel) -> bool {
        self.ccer & (CCER_CCP << channel.layout().ccer_offset) != 0
    }
}
