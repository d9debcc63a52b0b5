#![cfg_attr(not(test), no_std)]

//! # greenhouse-moisture
//! ## Soil moisture sensing over an ADS1256 in Rust
//!
//! Features:
//! - ADS1256 24-bit ADC driver on embedded-hal 1.0 (SPI, reset and data-ready lines)
//! - Bounded data-ready waits with a configurable timeout
//! - Gain, data rate, self-calibration, standby and input scans
//! - Soil moisture percentage from dry/wet calibration points
//! - Several probes sharing one ADC
//! - Optional defmt logging

#[macro_use]
mod fmt;

pub mod ads1256;
pub mod calibration;
pub mod config;
pub mod error;
pub mod registers;
pub mod rendering;
pub mod sensors;
pub mod timer;

pub use ads1256::Ads1256;
pub use calibration::Calibration;
pub use config::{AdcConfig, MoistureConfig};
pub use error::{Error, MoistureError};
pub use registers::{Channel, DataRate, Gain, Input};
pub use sensors::{ChannelReader, MoistureReading, MoistureSensor};
