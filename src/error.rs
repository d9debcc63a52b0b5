//! Error types for the ADC driver and the moisture layer.

/// Errors raised by the ADS1256 driver.
///
/// `SpiE` is the error type of the SPI device, `PinE` the one shared by the
/// reset and data-ready lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<SpiE, PinE> {
    /// SPI transfer failed
    Spi(SpiE),
    /// Reset or data-ready line failed
    Pin(PinE),
    /// Data-ready did not assert within the configured bound
    Timeout,
    /// A conversion was requested before `init()` completed
    NotInitialized,
    /// The bus was already released by `close()`
    Closed,
}

impl<SpiE, PinE> Error<SpiE, PinE> {
    /// Whether the failure came from the data-ready wait
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }
}

/// Errors raised by [`MoistureSensor`](crate::sensors::MoistureSensor).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoistureError<E> {
    /// The underlying channel reader failed
    Adc(E),
    /// The dry point is not above the wet point, so no percentage can be derived
    InvalidCalibration { dry: i32, wet: i32 },
}

impl<E> From<E> for MoistureError<E> {
    fn from(err: E) -> Self {
        MoistureError::Adc(err)
    }
}
