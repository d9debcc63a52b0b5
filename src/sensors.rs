//! Soil moisture readings on top of a channel reader.
//!
//! A [`MoistureSensor`] owns one channel and one dry/wet calibration pair.
//! It does not own the ADC: pass `&mut adc` for a single probe, or
//! `&RefCell<adc>` when several probes on different channels share one chip.

use core::cell::RefCell;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;

use crate::ads1256::Ads1256;
use crate::calibration::Calibration;
use crate::config::MoistureConfig;
use crate::error::{Error, MoistureError};
use crate::registers::{raw_to_voltage, Channel};
use crate::timer::micros;

/// What the moisture layer needs from an ADC
pub trait ChannelReader {
    type Error;

    /// One conversion, signed 24-bit code
    fn read_channel(&mut self, channel: Channel) -> Result<i32, Self::Error>;

    /// One conversion scaled to volts
    fn read_voltage(&mut self, channel: Channel, vref: f64) -> Result<f64, Self::Error> {
        Ok(raw_to_voltage(self.read_channel(channel)?, vref))
    }

    /// Releases the underlying hardware
    fn close(&mut self) -> Result<(), Self::Error>;
}

impl<SPI, RST, DRDY, D, PinE> ChannelReader for Ads1256<SPI, RST, DRDY, D>
where
    SPI: SpiDevice,
    RST: OutputPin<Error = PinE>,
    DRDY: InputPin<Error = PinE>,
    D: DelayNs,
{
    type Error = Error<SPI::Error, PinE>;

    fn read_channel(&mut self, channel: Channel) -> Result<i32, Self::Error> {
        Ads1256::read_channel(self, channel)
    }

    fn read_voltage(&mut self, channel: Channel, vref: f64) -> Result<f64, Self::Error> {
        Ads1256::read_voltage(self, channel, vref)
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        Ads1256::close(self)
    }
}

impl<R: ChannelReader + ?Sized> ChannelReader for &mut R {
    type Error = R::Error;

    fn read_channel(&mut self, channel: Channel) -> Result<i32, Self::Error> {
        (**self).read_channel(channel)
    }

    fn read_voltage(&mut self, channel: Channel, vref: f64) -> Result<f64, Self::Error> {
        (**self).read_voltage(channel, vref)
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        (**self).close()
    }
}

/// Shared access for several sensors on one ADC. Calls are serialized by the
/// caller; each one holds the borrow only for its own duration.
impl<R: ChannelReader> ChannelReader for &RefCell<R> {
    type Error = R::Error;

    fn read_channel(&mut self, channel: Channel) -> Result<i32, Self::Error> {
        self.borrow_mut().read_channel(channel)
    }

    fn read_voltage(&mut self, channel: Channel, vref: f64) -> Result<f64, Self::Error> {
        self.borrow_mut().read_voltage(channel, vref)
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.borrow_mut().close()
    }
}

/// One conversion seen three ways
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoistureReading {
    pub raw: i32,
    pub voltage: f64,
    pub percent: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationPoint {
    Dry,
    Wet,
}

pub struct MoistureSensor<R, D> {
    adc: R,
    delay: D,
    config: MoistureConfig,
}

impl<R, D> MoistureSensor<R, D>
where
    R: ChannelReader,
    D: DelayNs,
{
    /// param adc: reader for the chip the probe is wired to
    /// param delay: used for the pause before calibration
    /// param config: channel, reference voltage and calibration
    pub fn new(adc: R, delay: D, config: MoistureConfig) -> Self {
        Self { adc, delay, config }
    }

    pub fn channel(&self) -> Channel {
        self.config.channel
    }

    pub fn calibration(&self) -> Calibration {
        self.config.calibration
    }

    /// Replaces both reference points, e.g. with values saved from an earlier run
    pub fn set_calibration(&mut self, calibration: Calibration) {
        self.config.calibration = calibration;
    }

    pub fn read_raw(&mut self) -> Result<i32, R::Error> {
        self.adc.read_channel(self.config.channel)
    }

    pub fn read_voltage(&mut self) -> Result<f64, R::Error> {
        self.adc.read_voltage(self.config.channel, self.config.vref)
    }

    /// Moisture in percent, 0.0 at or beyond the dry point and 100.0 at or
    /// beyond the wet point.
    ///
    /// Fails with `InvalidCalibration` if the dry code is not above the wet
    /// one, instead of returning an inverted scale.
    pub fn read_moisture_percent(&mut self) -> Result<f64, MoistureError<R::Error>> {
        let raw = self.read_raw()?;
        self.percent(raw)
    }

    /// Raw code, voltage and percentage from a single conversion
    pub fn sample(&mut self) -> Result<MoistureReading, MoistureError<R::Error>> {
        let raw = self.read_raw()?;
        Ok(MoistureReading {
            raw,
            voltage: raw_to_voltage(raw, self.config.vref),
            percent: self.percent(raw)?,
        })
    }

    /// Averages readings with the probe in air and stores them as the 0% point
    pub fn calibrate_dry(&mut self) -> Result<i32, R::Error> {
        self.calibrate(CalibrationPoint::Dry)
    }

    /// Averages readings with the probe in water and stores them as the 100% point
    pub fn calibrate_wet(&mut self) -> Result<i32, R::Error> {
        self.calibrate(CalibrationPoint::Wet)
    }

    /// Waits for the probe to settle, then floor-averages
    /// `calibration_samples` conversions into the chosen point.
    /// The other point is left untouched and not checked against.
    pub fn calibrate(&mut self, point: CalibrationPoint) -> Result<i32, R::Error> {
        let samples = self.config.calibration_samples.max(1);
        self.delay
            .delay_us(micros(self.config.calibration_settle));

        let mut sum: i64 = 0;
        for _ in 0..samples {
            sum += self.read_raw()? as i64;
        }
        let value = sum.div_euclid(samples as i64) as i32;

        match point {
            CalibrationPoint::Dry => self.config.calibration.dry = value,
            CalibrationPoint::Wet => self.config.calibration.wet = value,
        }
        info!("{} point set to {} over {} samples", point, value, samples);

        if !self.config.calibration.is_valid() {
            warn!(
                "calibration dry {} is not above wet {}",
                self.config.calibration.dry,
                self.config.calibration.wet
            );
        }
        Ok(value)
    }

    pub fn close(&mut self) -> Result<(), R::Error> {
        self.adc.close()
    }

    /// Gives back the reader and delay
    pub fn release(self) -> (R, D) {
        (self.adc, self.delay)
    }

    fn percent(&self, raw: i32) -> Result<f64, MoistureError<R::Error>> {
        let calibration = self.config.calibration;
        calibration
            .percent(raw)
            .ok_or(MoistureError::InvalidCalibration {
                dry: calibration.dry,
                wet: calibration.wet,
            })
    }
}
