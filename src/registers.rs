//! ADS1256 registers, command opcodes and setting codes.

use embedded_hal::spi::{Mode, MODE_1};

/// SPI mode the ADS1256 expects: clock idles low, data sampled on the trailing edge
pub const SPI_MODE: Mode = MODE_1;

/// SPI clock used for the ADS1256
pub const SPI_FREQUENCY_HZ: u32 = 1_000_000;

/// Largest positive raw code, 2^23 - 1
pub const FULL_SCALE: i32 = 0x7F_FFFF;

/// Addresses the driver reads and writes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    Status = 0x00,
    Mux = 0x01,
    Adcon = 0x02,
    Drate = 0x03,
}

impl Register {
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

/// One-byte command opcodes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    Wakeup = 0x00,
    ReadData = 0x01,
    ReadRegister = 0x10,
    WriteRegister = 0x50,
    SelfCalibrate = 0xF0,
    Sync = 0xFC,
    Standby = 0xFD,
    Reset = 0xFE,
}

impl Command {
    pub const fn opcode(self) -> u8 {
        self as u8
    }

    /// Combines a register command with its 4-bit address
    /// param register: target register
    /// returns: first byte of the register frame
    pub const fn with_register(self, register: Register) -> u8 {
        self as u8 | register.addr()
    }
}

/// Bits of the STATUS register
pub mod status {
    /// Bit order, 0 = most significant bit first
    pub const ORDER: u8 = 1 << 3;
    /// Auto-calibration after gain, rate or buffer changes
    pub const ACAL: u8 = 1 << 2;
    /// Analog input buffer
    pub const BUFEN: u8 = 1 << 1;
    /// Mirrors the data-ready line
    pub const DRDY: u8 = 1 << 0;

    /// Chip identifier kept in the upper nibble
    pub const fn id(status: u8) -> u8 {
        status >> 4
    }
}

/// Identifier the ADS1256 reports in the STATUS register
pub const ADS1256_ID: u8 = 0x3;

/// Programmable gain amplifier setting (ADCON bits 2..0)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Gain {
    #[default]
    X1 = 0x00,
    X2 = 0x01,
    X4 = 0x02,
    X8 = 0x03,
    X16 = 0x04,
    X32 = 0x05,
    X64 = 0x06,
}

impl Gain {
    pub const fn bits(self) -> u8 {
        self as u8
    }

    pub const fn factor(self) -> u8 {
        1 << (self as u8)
    }
}

/// Output data rate (DRATE register codes)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DataRate {
    Sps30000 = 0xF0,
    Sps15000 = 0xE0,
    Sps7500 = 0xD0,
    Sps3750 = 0xC0,
    Sps2000 = 0xB0,
    Sps1000 = 0xA1,
    Sps500 = 0x92,
    #[default]
    Sps100 = 0x82,
    Sps60 = 0x72,
    Sps50 = 0x63,
    Sps30 = 0x53,
    Sps25 = 0x43,
    Sps15 = 0x33,
    Sps10 = 0x23,
    Sps5 = 0x13,
    Sps2_5 = 0x03,
}

impl DataRate {
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// Analog inputs available to the multiplexer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Input {
    Ain0 = 0x0,
    Ain1 = 0x1,
    Ain2 = 0x2,
    Ain3 = 0x3,
    Ain4 = 0x4,
    Ain5 = 0x5,
    Ain6 = 0x6,
    Ain7 = 0x7,
    AinCom = 0x8,
}

/// Positive/negative input pair selected through the MUX register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel {
    pub positive: Input,
    pub negative: Input,
}

impl Channel {
    pub const AIN0: Channel = Channel::single_ended(Input::Ain0);
    pub const AIN1: Channel = Channel::single_ended(Input::Ain1);
    pub const AIN2: Channel = Channel::single_ended(Input::Ain2);
    pub const AIN3: Channel = Channel::single_ended(Input::Ain3);
    pub const AIN4: Channel = Channel::single_ended(Input::Ain4);
    pub const AIN5: Channel = Channel::single_ended(Input::Ain5);
    pub const AIN6: Channel = Channel::single_ended(Input::Ain6);
    pub const AIN7: Channel = Channel::single_ended(Input::Ain7);

    /// The eight inputs measured against AINCOM
    pub const SINGLE_ENDED: [Channel; 8] = [
        Channel::AIN0,
        Channel::AIN1,
        Channel::AIN2,
        Channel::AIN3,
        Channel::AIN4,
        Channel::AIN5,
        Channel::AIN6,
        Channel::AIN7,
    ];

    /// Measures `input` against AINCOM
    pub const fn single_ended(input: Input) -> Self {
        Self {
            positive: input,
            negative: Input::AinCom,
        }
    }

    pub const fn differential(positive: Input, negative: Input) -> Self {
        Self { positive, negative }
    }

    /// MUX register value: positive input in the high nibble, negative in the low one
    pub const fn mux(self) -> u8 {
        ((self.positive as u8) << 4) | self.negative as u8
    }
}

impl Default for Channel {
    fn default() -> Self {
        Channel::AIN0
    }
}

/// Turns the three data bytes of a conversion into a signed code.
///
/// The bytes arrive most significant first; bit 23 is the sign.
/// param bytes: bytes clocked out after RDATA
/// returns: code in [-2^23, 2^23 - 1]
pub const fn decode_raw(bytes: [u8; 3]) -> i32 {
    let value = ((bytes[0] as i32) << 16) | ((bytes[1] as i32) << 8) | bytes[2] as i32;
    if value & 0x80_0000 != 0 {
        value - 0x100_0000
    } else {
        value
    }
}

/// Scales a raw code to volts against the positive full-scale code
pub fn raw_to_voltage(raw: i32, vref: f64) -> f64 {
    (raw as f64 / FULL_SCALE as f64) * vref
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_full_scale_codes() {
        assert_eq!(decode_raw([0x7F, 0xFF, 0xFF]), 8_388_607);
        assert_eq!(decode_raw([0x80, 0x00, 0x00]), -8_388_608);
        assert_eq!(decode_raw([0xFF, 0xFF, 0xFF]), -1);
        assert_eq!(decode_raw([0x00, 0x00, 0x00]), 0);
        assert_eq!(decode_raw([0x40, 0x00, 0x00]), 0x40_0000);
    }

    #[test]
    fn decode_is_big_endian() {
        assert_eq!(decode_raw([0x01, 0x02, 0x03]), 0x01_0203);
        assert_eq!(decode_raw([0xFF, 0xFF, 0xFE]), -2);
    }

    #[test]
    fn voltage_uses_positive_full_scale() {
        assert_eq!(raw_to_voltage(FULL_SCALE, 5.0), 5.0);
        assert_eq!(raw_to_voltage(0, 5.0), 0.0);
        assert!(raw_to_voltage(-8_388_608, 5.0) < -5.0);
    }

    #[test]
    fn mux_byte() {
        assert_eq!(Channel::AIN0.mux(), 0x08);
        assert_eq!(Channel::AIN7.mux(), 0x78);
        assert_eq!(Channel::differential(Input::Ain2, Input::Ain3).mux(), 0x23);
    }

    #[test]
    fn register_frames() {
        assert_eq!(Command::WriteRegister.with_register(Register::Drate), 0x53);
        assert_eq!(Command::ReadRegister.with_register(Register::Status), 0x10);
        assert_eq!(Gain::X64.factor(), 64);
        assert_eq!(status::id(0x36), ADS1256_ID);
    }
}
