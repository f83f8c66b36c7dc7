//! General Purpose Input / Output
//!
//! Pins are addressed with a one byte code: the high nibble selects the port
//! (`0xA` to `0xD`), the low nibble the pin number within that port, so
//! `0xA8` is PA8 and `0xBC` is PB12.

use crate::pwm::Error;

/// GPIO port
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
    C,
    D,
}

impl Port {
    /// Position of the port in port ordered tables
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A decoded pin code
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinCode {
    port: Port,
    pin: u8,
}

impl PinCode {
    /// Decodes `code`, rejecting any port nibble outside `0xA..=0xD`
    pub fn new(code: u8) -> Result<Self, Error> {
        let port = match code >> 4 {
            0xA => Port::A,
            0xB => Port::B,
            0xC => Port::C,
            0xD => Port::D,
            _ => return Err(Error::InvalidPin),
        };

        Ok(PinCode {
            port,
            pin: code & 0x0f,
        })
    }

    pub fn port(&self) -> Port {
        self.port
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Re-encodes the pin
    pub fn code(&self) -> u8 {
        ((0xA + self.port as u8) << 4) | self.pin
    }

    /// Configuration register holding this pin, 0 for CRL and 1 for CRH
    pub fn config_register(&self) -> usize {
        usize::from(self.pin / 8)
    }

    fn config_offset(&self) -> u32 {
        4 * u32::from(self.pin % 8)
    }
}

/// Output slew rate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    Mhz2,
    Mhz10,
    Mhz50,
}

impl Speed {
    fn mode_bits(self) -> u32 {
        match self {
            Speed::Mhz10 => 0b01,
            Speed::Mhz2 => 0b10,
            Speed::Mhz50 => 0b11,
        }
    }
}

/// Configuration register value a port comes out of reset with, every pin a
/// floating input
pub const CR_RESET: u32 = 0x4444_4444;

/// CNF/MODE nibble of an alternate function push pull output
pub fn alternate_push_pull(speed: Speed) -> u32 {
    0b1000 | speed.mode_bits()
}

/// Returns `cr` with the nibble of `pin` replaced by `config`
pub fn with_pin_config(cr: u32, pin: &PinCode, config: u32) -> u32 {
    let offset = pin.config_offset();
    (cr & !(0b1111 << offset)) | ((config & 0b1111) << offset)
}

/// Reads the nibble of `pin` out of `cr`
pub fn pin_config(cr: u32, pin: &PinCode) -> u32 {
    (cr >> pin.config_offset()) & 0b1111
}

/// Pin electrical configuration
pub trait PinConfig {
    /// Hands the pin over to its peripheral as a push pull output
    fn into_alternate_push_pull(&mut self, pin: PinCode, speed: Speed);
}
