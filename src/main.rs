#![no_std]
#![no_main]

use bsp::entry;
use core::cell::RefCell;
use defmt::*;
use defmt_rtt as _;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use embedded_hal_bus::spi::ExclusiveDevice;
use panic_probe as _;
use rp_pico::hal::Timer;

// Provide an alias for our BSP so we can switch targets quickly.
use rp_pico as bsp;

use bsp::hal::{
    clocks::{init_clocks_and_plls, Clock},
    pac,
    watchdog::Watchdog,
};
use greenhouse_moisture::registers::{raw_to_voltage, SPI_FREQUENCY_HZ, SPI_MODE};
use greenhouse_moisture::rendering::{render_calibration, render_channel, render_reading};
use greenhouse_moisture::timer::{BUTTON_DELAY, SENSOR_DELAY};
use greenhouse_moisture::{
    AdcConfig, Ads1256, Channel, MoistureConfig, MoistureError, MoistureSensor,
};
use rp_pico::hal;
use rp_pico::hal::fugit::RateExtU32;
use rp_pico::hal::gpio::FunctionSpi;

const VREF: f64 = 5.0;

#[derive(Debug, Format, PartialEq)]
enum CalibrationAction {
    Dry,
    Wet,
}

#[entry]
fn main() -> ! {
    info!("Moisture monitor starting");
    // Grab our singleton objects
    let mut pac = pac::Peripherals::take().unwrap();

    // Set up the watchdog driver - needed by the clock setup code
    let mut watchdog = Watchdog::new(pac.WATCHDOG);

    // The default is to generate a 125 MHz system clock
    let clocks = init_clocks_and_plls(
        rp_pico::XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    // The single-cycle I/O block controls our GPIO pins
    let sio = hal::Sio::new(pac.SIO);

    let pins = rp_pico::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    let mut delay = Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

    // Set up SPI1 for the ADS1256
    let sclk = pins.gpio10.into_function::<FunctionSpi>();
    let mosi = pins.gpio11.into_function::<FunctionSpi>();
    let miso = pins.gpio12.into_function::<FunctionSpi>();
    let spi_bus = hal::spi::Spi::<_, _, _, 8>::new(pac.SPI1, (mosi, miso, sclk)).init(
        &mut pac.RESETS,
        clocks.peripheral_clock.freq(),
        SPI_FREQUENCY_HZ.Hz(),
        SPI_MODE,
    );
    let cs = pins.gpio13.into_push_pull_output();
    let spi = ExclusiveDevice::new(spi_bus, cs, delay).unwrap();

    // Reset line and data-ready line
    let rst = pins.gpio14.into_push_pull_output();
    let drdy = pins.gpio15.into_pull_up_input();

    // Set up calibration buttons
    let mut dry_button = pins.gpio16.into_pull_down_input();
    let mut wet_button = pins.gpio17.into_pull_down_input();

    let mut adc = Ads1256::new(spi, rst, drdy, delay, AdcConfig::default());
    match adc.init() {
        Ok(()) => match adc.chip_id() {
            Ok(id) => info!("ADS1256 ready, chip id {}", id),
            Err(e) => warn!("Could not read chip id: {}", Debug2Format(&e)),
        },
        Err(e) => {
            // Start over, the chip may still have been powering up
            error!("ADS1256 init failed: {}, resetting", Debug2Format(&e));
            delay.delay_ms(SENSOR_DELAY);
            cortex_m::peripheral::SCB::sys_reset()
        }
    }

    // Show every input once so the wiring can be checked
    match adc.read_all() {
        Ok(codes) => {
            for (channel, raw) in Channel::SINGLE_ENDED.into_iter().zip(codes) {
                let line = render_channel(channel, raw, raw_to_voltage(raw, VREF));
                info!("{}", line.as_str());
            }
        }
        Err(e) => warn!("Input scan failed: {}", Debug2Format(&e)),
    }

    let adc = RefCell::new(adc);
    let config = MoistureConfig {
        vref: VREF,
        ..Default::default()
    };
    let mut sensor = MoistureSensor::new(&adc, delay, config);
    info!("{}", render_calibration(&sensor.calibration()).as_str());

    info!("Moisture monitor ready");

    loop {
        if let Some(action) = check_buttons(&mut dry_button, &mut wet_button) {
            info!("Calibrating {} point, hold the probe still", action);
            let result = match action {
                CalibrationAction::Dry => sensor.calibrate_dry(),
                CalibrationAction::Wet => sensor.calibrate_wet(),
            };
            match result {
                Ok(_) => info!("{}", render_calibration(&sensor.calibration()).as_str()),
                Err(e) => error!("Calibration failed: {}", Debug2Format(&e)),
            }
            delay.delay_ms(BUTTON_DELAY);
        }

        match sensor.sample() {
            Ok(reading) => {
                let line = render_reading(&reading);
                info!("{}", line.as_str());
            }
            Err(MoistureError::InvalidCalibration { dry, wet }) => {
                warn!("Calibration dry {} is not above wet {}, recalibrate", dry, wet)
            }
            Err(MoistureError::Adc(e)) => error!("Sample failed: {}", Debug2Format(&e)),
        }

        delay.delay_ms(SENSOR_DELAY);
    }
}

/// Checks the calibration buttons, dry first
/// param dry_button: pressed with the probe in air
/// param wet_button: pressed with the probe in water
/// returns: the requested calibration, if any
fn check_buttons<DRY: InputPin, WET: InputPin>(
    dry_button: &mut DRY,
    wet_button: &mut WET,
) -> Option<CalibrationAction> {
    if dry_button.is_high().unwrap_or(false) {
        Some(CalibrationAction::Dry)
    } else if wet_button.is_high().unwrap_or(false) {
        Some(CalibrationAction::Wet)
    } else {
        None
    }
}
