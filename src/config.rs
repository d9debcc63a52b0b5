use core::time::Duration;

use crate::calibration::Calibration;
use crate::registers::{status, Channel, DataRate, Gain};

/// AdcConfig holds what `init()` writes to the chip and the timing the driver uses.
/// gain: PGA setting written to ADCON
/// data_rate: conversion rate written to DRATE
/// buffer_enabled: analog input buffer (STATUS BUFEN)
/// auto_calibration: recalibrate after setting changes (STATUS ACAL)
/// drdy_timeout: how long to wait for data-ready before giving up
/// drdy_poll_interval: sleep between two data-ready polls
/// reset_settle: pause after each edge of the hardware reset
/// register_settle: pause after a register write and before reading a register back
/// command_settle: pause between SYNC and WAKEUP, and between RDATA and the data bytes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdcConfig {
    pub gain: Gain,
    pub data_rate: DataRate,
    pub buffer_enabled: bool,
    pub auto_calibration: bool,
    pub drdy_timeout: Duration,
    pub drdy_poll_interval: Duration,
    pub reset_settle: Duration,
    pub register_settle: Duration,
    pub command_settle: Duration,
}

impl Default for AdcConfig {
    fn default() -> Self {
        AdcConfig {
            gain: Gain::X1,
            data_rate: DataRate::Sps100,
            buffer_enabled: true,
            auto_calibration: true,
            drdy_timeout: Duration::from_secs(5),
            drdy_poll_interval: Duration::from_micros(100),
            reset_settle: Duration::from_millis(200),
            register_settle: Duration::from_millis(1),
            command_settle: Duration::from_micros(10),
        }
    }
}

impl AdcConfig {
    /// STATUS register value: MSB first, plus the selected buffer and calibration bits
    pub fn status_byte(&self) -> u8 {
        let mut value = 0;
        if self.auto_calibration {
            value |= status::ACAL;
        }
        if self.buffer_enabled {
            value |= status::BUFEN;
        }
        value
    }

    /// ADCON register value: clock out and sensor detect off
    pub fn adcon_byte(&self) -> u8 {
        self.gain.bits()
    }
}

/// MoistureConfig defines which channel a soil probe sits on and how it is calibrated.
/// channel: multiplexer input pair the probe is wired to
/// vref: reference voltage used to scale raw codes
/// calibration: dry and wet reference codes
/// calibration_samples: conversions averaged per calibration point
/// calibration_settle: pause before the first calibration conversion
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoistureConfig {
    pub channel: Channel,
    pub vref: f64,
    pub calibration: Calibration,
    pub calibration_samples: u8,
    pub calibration_settle: Duration,
}

impl Default for MoistureConfig {
    fn default() -> Self {
        MoistureConfig {
            channel: Channel::AIN0,
            vref: 5.0,
            calibration: Calibration::default(),
            calibration_samples: 10,
            calibration_settle: Duration::from_secs(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_enables_buffer_and_autocal() {
        let config = AdcConfig::default();
        assert_eq!(config.status_byte(), 0x06);
        assert_eq!(config.adcon_byte(), 0x00);
        assert_eq!(config.data_rate.bits(), 0x82);
    }

    #[test]
    fn status_without_buffer() {
        let config = AdcConfig {
            buffer_enabled: false,
            ..Default::default()
        };
        assert_eq!(config.status_byte(), status::ACAL);
    }

    #[test]
    fn moisture_defaults() {
        let config = MoistureConfig::default();
        assert_eq!(config.channel.mux(), 0x08);
        assert_eq!(config.calibration_samples, 10);
        assert_eq!(config.calibration.dry, 0x60_0000);
        assert_eq!(config.calibration.wet, 0x20_0000);
    }
}
