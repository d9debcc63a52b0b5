//! Blocking driver for the ADS1256 24-bit delta-sigma ADC.
//!
//! The driver owns the SPI device, the reset line, the data-ready line and a
//! delay provider. Every command that touches conversion state first waits
//! for data-ready to go low; commands sent while it is high are not accepted
//! reliably by the chip.
//!
//! ```text
//! new() -> init() -> read_channel()/read_voltage()/... -> close()
//!          |  hardware reset, STATUS/ADCON/DRATE, SELFCAL
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::{Operation, SpiDevice};

use crate::config::AdcConfig;
use crate::error::Error;
use crate::registers::{
    decode_raw, raw_to_voltage, status, Channel, Command, DataRate, Gain, Register,
};
use crate::timer::{micros, nanos, poll_until};

struct Bus<SPI, RST, DRDY, D> {
    spi: SPI,
    rst: RST,
    drdy: DRDY,
    delay: D,
}

pub struct Ads1256<SPI, RST, DRDY, D> {
    bus: Option<Bus<SPI, RST, DRDY, D>>,
    config: AdcConfig,
    configured: bool,
}

impl<SPI, RST, DRDY, D, PinE> Ads1256<SPI, RST, DRDY, D>
where
    SPI: SpiDevice,
    RST: OutputPin<Error = PinE>,
    DRDY: InputPin<Error = PinE>,
    D: DelayNs,
{
    /// Takes ownership of the bus. Nothing is sent until `init()`.
    /// param spi: SPI device already set to `SPI_MODE` and `SPI_FREQUENCY_HZ`
    /// param rst: reset line (output)
    /// param drdy: data-ready line (input, active low)
    /// param delay: delay provider, also the clock for data-ready timeouts
    /// param config: settings applied by `init()`
    pub fn new(spi: SPI, rst: RST, drdy: DRDY, delay: D, config: AdcConfig) -> Self {
        Self {
            bus: Some(Bus {
                spi,
                rst,
                drdy,
                delay,
            }),
            config,
            configured: false,
        }
    }

    pub fn config(&self) -> &AdcConfig {
        &self.config
    }

    /// Whether `close()` has not been called yet
    pub fn is_open(&self) -> bool {
        self.bus.is_some()
    }

    /// Whether `init()` completed, including self-calibration
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Resets the chip, writes the configuration and self-calibrates
    pub fn init(&mut self) -> Result<(), Error<SPI::Error, PinE>> {
        self.hardware_reset()?;
        self.configure()
    }

    /// Drives reset high, low, high with a settle pause after each edge.
    /// The chip ignores commands right after power-on until this is done.
    pub fn hardware_reset(&mut self) -> Result<(), Error<SPI::Error, PinE>> {
        let settle_us = micros(self.config.reset_settle);
        let bus = self.bus_mut()?;

        bus.rst.set_high().map_err(Error::Pin)?;
        bus.delay.delay_us(settle_us);
        bus.rst.set_low().map_err(Error::Pin)?;
        bus.delay.delay_us(settle_us);
        bus.rst.set_high().map_err(Error::Pin)?;
        bus.delay.delay_us(settle_us);

        self.configured = false;
        debug!("ADS1256 hardware reset done");
        Ok(())
    }

    fn configure(&mut self) -> Result<(), Error<SPI::Error, PinE>> {
        self.wait_ready()?;

        self.write_register(Register::Status, self.config.status_byte())?;
        self.write_register(Register::Adcon, self.config.adcon_byte())?;
        self.write_register(Register::Drate, self.config.data_rate.bits())?;

        self.self_calibrate()?;
        self.configured = true;

        info!(
            "ADS1256 configured: gain x{}, drate {=u8:#x}, status {=u8:#x}",
            self.config.gain.factor(),
            self.config.data_rate.bits(),
            self.config.status_byte()
        );
        Ok(())
    }

    /// Blocks until data-ready goes low, or fails with `Timeout`.
    /// The bus stays open after a timeout.
    fn wait_ready(&mut self) -> Result<(), Error<SPI::Error, PinE>> {
        let timeout = self.config.drdy_timeout;
        let interval = self.config.drdy_poll_interval;
        let bus = self.bus_mut()?;
        let drdy = &mut bus.drdy;

        let ready =
            poll_until(&mut bus.delay, timeout, interval, || drdy.is_low()).map_err(Error::Pin)?;
        if ready {
            Ok(())
        } else {
            warn!("ADS1256 data-ready timeout after {} us", micros(timeout));
            Err(Error::Timeout)
        }
    }

    /// Sends `[WREG | register, 0, value]` once the chip is ready
    pub fn write_register(
        &mut self,
        register: Register,
        value: u8,
    ) -> Result<(), Error<SPI::Error, PinE>> {
        self.wait_ready()?;

        let settle_us = micros(self.config.register_settle);
        let bus = self.bus_mut()?;
        bus.spi
            .write(&[Command::WriteRegister.with_register(register), 0x00, value])
            .map_err(Error::Spi)?;
        bus.delay.delay_us(settle_us);

        trace!("ADS1256 wrote {=u8:#x} to {}", value, register.addr());
        Ok(())
    }

    /// Sends `[RREG | register, 0]`, pauses, then clocks in one byte.
    /// The pause is fixed: data-ready does not signal this step.
    pub fn read_register(&mut self, register: Register) -> Result<u8, Error<SPI::Error, PinE>> {
        self.wait_ready()?;

        let settle_ns = nanos(self.config.register_settle);
        let mut value = [0u8; 1];
        self.bus_mut()?
            .spi
            .transaction(&mut [
                Operation::Write(&[Command::ReadRegister.with_register(register), 0x00]),
                Operation::DelayNs(settle_ns),
                Operation::Read(&mut value),
            ])
            .map_err(Error::Spi)?;

        Ok(value[0])
    }

    /// Runs offset and gain self-calibration and waits for it to finish
    pub fn self_calibrate(&mut self) -> Result<(), Error<SPI::Error, PinE>> {
        self.wait_ready()?;
        self.send_command(Command::SelfCalibrate)?;
        self.wait_ready()?;
        debug!("ADS1256 self-calibration done");
        Ok(())
    }

    /// Changes the PGA gain and recalibrates
    /// The stored configuration only changes once the chip accepted the write.
    pub fn set_gain(&mut self, gain: Gain) -> Result<(), Error<SPI::Error, PinE>> {
        let updated = AdcConfig { gain, ..self.config };
        self.write_register(Register::Adcon, updated.adcon_byte())?;
        self.config = updated;
        self.self_calibrate()
    }

    /// Changes the output data rate and recalibrates
    pub fn set_data_rate(&mut self, data_rate: DataRate) -> Result<(), Error<SPI::Error, PinE>> {
        self.write_register(Register::Drate, data_rate.bits())?;
        self.config.data_rate = data_rate;
        self.self_calibrate()
    }

    /// Chip identifier from the STATUS register, `ADS1256_ID` on a genuine part
    pub fn chip_id(&mut self) -> Result<u8, Error<SPI::Error, PinE>> {
        Ok(status::id(self.read_register(Register::Status)?))
    }

    /// Runs one conversion on `channel` and returns the signed 24-bit code
    pub fn read_channel(&mut self, channel: Channel) -> Result<i32, Error<SPI::Error, PinE>> {
        if self.bus.is_none() {
            return Err(Error::Closed);
        }
        if !self.configured {
            return Err(Error::NotInitialized);
        }

        self.wait_ready()?;
        self.write_register(Register::Mux, channel.mux())?;

        // SYNC then WAKEUP restarts the digital filter on the new input
        let settle_ns = nanos(self.config.command_settle);
        self.bus_mut()?
            .spi
            .transaction(&mut [
                Operation::Write(&[Command::Sync.opcode()]),
                Operation::DelayNs(settle_ns),
                Operation::Write(&[Command::Wakeup.opcode()]),
            ])
            .map_err(Error::Spi)?;

        self.wait_ready()?;

        let mut data = [0u8; 3];
        self.bus_mut()?
            .spi
            .transaction(&mut [
                Operation::Write(&[Command::ReadData.opcode()]),
                Operation::DelayNs(settle_ns),
                Operation::Read(&mut data),
            ])
            .map_err(Error::Spi)?;

        let raw = decode_raw(data);
        trace!("ADS1256 mux {=u8:#x} raw {}", channel.mux(), raw);
        Ok(raw)
    }

    /// Converts `channel` and scales the code to volts
    pub fn read_voltage(
        &mut self,
        channel: Channel,
        vref: f64,
    ) -> Result<f64, Error<SPI::Error, PinE>> {
        let raw = self.read_channel(channel)?;
        Ok(raw_to_voltage(raw, vref))
    }

    /// Converts the eight single-ended inputs in order
    pub fn read_all(&mut self) -> Result<[i32; 8], Error<SPI::Error, PinE>> {
        let mut codes = [0i32; 8];
        for (code, channel) in codes.iter_mut().zip(Channel::SINGLE_ENDED) {
            *code = self.read_channel(channel)?;
        }
        Ok(codes)
    }

    /// Puts the chip in standby. Data-ready stays high until `wake()`.
    pub fn standby(&mut self) -> Result<(), Error<SPI::Error, PinE>> {
        self.wait_ready()?;
        self.send_command(Command::Standby)?;
        debug!("ADS1256 in standby");
        Ok(())
    }

    /// Leaves standby. No data-ready wait, the line only drops after this.
    pub fn wake(&mut self) -> Result<(), Error<SPI::Error, PinE>> {
        self.send_command(Command::Wakeup)?;
        debug!("ADS1256 awake");
        Ok(())
    }

    /// Sends RESET, which returns every register to its power-on value, then
    /// writes the configuration again
    pub fn software_reset(&mut self) -> Result<(), Error<SPI::Error, PinE>> {
        self.wait_ready()?;
        self.send_command(Command::Reset)?;
        self.configured = false;
        self.configure()
    }

    /// Releases the bus and both lines. Every later call fails with `Closed`.
    pub fn close(&mut self) -> Result<(), Error<SPI::Error, PinE>> {
        match self.bus.take() {
            Some(_) => {
                self.configured = false;
                info!("ADS1256 bus released");
                Ok(())
            }
            None => Err(Error::Closed),
        }
    }

    /// Gives back the SPI device, reset line, data-ready line and delay
    pub fn release(self) -> Result<(SPI, RST, DRDY, D), Error<SPI::Error, PinE>> {
        self.bus
            .map(|bus| (bus.spi, bus.rst, bus.drdy, bus.delay))
            .ok_or(Error::Closed)
    }

    fn send_command(&mut self, command: Command) -> Result<(), Error<SPI::Error, PinE>> {
        self.bus_mut()?
            .spi
            .write(&[command.opcode()])
            .map_err(Error::Spi)
    }

    fn bus_mut(&mut self) -> Result<&mut Bus<SPI, RST, DRDY, D>, Error<SPI::Error, PinE>> {
        self.bus.as_mut().ok_or(Error::Closed)
    }
}
