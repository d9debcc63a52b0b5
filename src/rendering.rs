use heapless::String;
use ufmt::{uWrite, uwrite};

use crate::calibration::Calibration;
use crate::registers::{Channel, Input};
use crate::sensors::MoistureReading;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

// Widest `write_fixed` output: sign, the 20 digits of u64::MAX and the point,
// plus the decimals. Line capacities below add up these widths, so no value
// of a reading can truncate a line.
const fn fixed_width(decimals: usize) -> usize {
    1 + 20 + 1 + decimals
}

const CODE_WIDTH: usize = 8;

/// "Moisture: " percent "% | " voltage "V | Raw: " code
pub const READING_LEN: usize = 10 + fixed_width(1) + 4 + fixed_width(3) + 9 + CODE_WIDTH;
/// "Dry: " code " | Wet: " code
pub const CALIBRATION_LEN: usize = 5 + CODE_WIDTH + 8 + CODE_WIDTH;
/// "AIN" digit "-AIN" digit ": " voltage "V (raw: " code ")"
pub const CHANNEL_LEN: usize = 4 + 5 + 2 + fixed_width(4) + 8 + CODE_WIDTH + 1;

/// Renders one moisture sample on a single line
/// param reading: sample to render
/// returns: e.g. `Moisture:  45.3% | 2.512V | Raw: 0x400000`
pub fn render_reading(reading: &MoistureReading) -> String<READING_LEN> {
    let mut line = String::new();
    // cannot overflow, see READING_LEN
    let _ = write_reading(&mut line, reading);
    line
}

fn write_reading<W: uWrite>(out: &mut W, reading: &MoistureReading) -> Result<(), W::Error> {
    out.write_str("Moisture: ")?;
    write_fixed(out, reading.percent, 1, 5)?;
    out.write_str("% | ")?;
    write_fixed(out, reading.voltage, 3, 0)?;
    out.write_str("V | Raw: ")?;
    write_code(out, reading.raw)
}

/// Renders both calibration points as hex codes
/// returns: e.g. `Dry: 0x600000 | Wet: 0x200000`
pub fn render_calibration(calibration: &Calibration) -> String<CALIBRATION_LEN> {
    let mut line = String::new();
    let _ = write_calibration(&mut line, calibration);
    line
}

fn write_calibration<W: uWrite>(out: &mut W, calibration: &Calibration) -> Result<(), W::Error> {
    out.write_str("Dry: ")?;
    write_code(out, calibration.dry)?;
    out.write_str(" | Wet: ")?;
    write_code(out, calibration.wet)
}

/// Renders a single channel of an input scan
/// param channel: input pair the code was converted on
/// param raw: signed 24-bit code
/// param voltage: the code scaled to volts
/// returns: e.g. `AIN0: 2.5000V (raw: 0x400000)`
pub fn render_channel(channel: Channel, raw: i32, voltage: f64) -> String<CHANNEL_LEN> {
    let mut line = String::new();
    let _ = write_channel(&mut line, channel, raw, voltage);
    line
}

fn write_channel<W: uWrite>(
    out: &mut W,
    channel: Channel,
    raw: i32,
    voltage: f64,
) -> Result<(), W::Error> {
    uwrite!(out, "AIN{}", channel.positive as u8)?;
    if channel.negative != Input::AinCom {
        uwrite!(out, "-AIN{}", channel.negative as u8)?;
    }
    out.write_str(": ")?;
    write_fixed(out, voltage, 4, 0)?;
    out.write_str("V (raw: ")?;
    write_code(out, raw)?;
    out.write_char(')')
}

/// Writes the two's-complement 24-bit code as `0x` plus six hex digits
fn write_code<W: uWrite>(out: &mut W, raw: i32) -> Result<(), W::Error> {
    let code = (raw as u32) & 0xFF_FFFF;
    out.write_str("0x")?;
    for shift in (0..6).rev() {
        let nibble = (code >> (shift * 4)) & 0xF;
        out.write_char(HEX_DIGITS[nibble as usize] as char)?;
    }
    Ok(())
}

/// Writes `value` with a fixed number of decimals, right aligned to `width`.
/// ufmt has no float support, so the value is split into integer and
/// fractional parts first. Halves round away from zero.
fn write_fixed<W: uWrite>(
    out: &mut W,
    value: f64,
    decimals: u32,
    width: usize,
) -> Result<(), W::Error> {
    let scale = 10u64.pow(decimals);
    let negative = value < 0.0;
    let magnitude = if negative { -value } else { value };
    let scaled = (magnitude * scale as f64 + 0.5) as u64;
    let (whole, fraction) = (scaled / scale, scaled % scale);
    let negative = negative && scaled != 0;

    let len = negative as usize + digits(whole) + 1 + decimals as usize;
    for _ in len..width {
        out.write_char(' ')?;
    }
    if negative {
        out.write_char('-')?;
    }
    uwrite!(out, "{}.", whole)?;
    for _ in digits(fraction)..decimals as usize {
        out.write_char('0')?;
    }
    uwrite!(out, "{}", fraction)
}

fn digits(mut value: u64) -> usize {
    let mut count = 1;
    while value >= 10 {
        value /= 10;
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(raw: i32, voltage: f64, percent: f64) -> MoistureReading {
        MoistureReading {
            raw,
            voltage,
            percent,
        }
    }

    #[test]
    fn reading_line() {
        let line = render_reading(&reading(0x40_0000, 2.5123, 45.26));
        assert_eq!(line.as_str(), "Moisture:  45.3% | 2.512V | Raw: 0x400000");
    }

    #[test]
    fn percent_is_padded_to_five() {
        assert_eq!(
            render_reading(&reading(0x60_0000, 3.75, 0.0)).as_str(),
            "Moisture:   0.0% | 3.750V | Raw: 0x600000"
        );
        assert_eq!(
            render_reading(&reading(0x20_0000, 1.25, 100.0)).as_str(),
            "Moisture: 100.0% | 1.250V | Raw: 0x200000"
        );
    }

    #[test]
    fn negative_codes_print_as_24_bit() {
        let line = render_reading(&reading(-1, -0.0000006, 100.0));
        assert_eq!(line.as_str(), "Moisture: 100.0% | 0.000V | Raw: 0xFFFFFF");

        let line = render_reading(&reading(-0x80_0000, -5.0, 100.0));
        assert_eq!(line.as_str(), "Moisture: 100.0% | -5.000V | Raw: 0x800000");
    }

    #[test]
    fn small_fractions_keep_leading_zeros() {
        let mut out: String<16> = String::new();
        write_fixed(&mut out, 1.05, 3, 0).unwrap();
        assert_eq!(out.as_str(), "1.050");

        out.clear();
        write_fixed(&mut out, 0.0125, 4, 0).unwrap();
        assert_eq!(out.as_str(), "0.0125");

        out.clear();
        write_fixed(&mut out, 9.99, 1, 5).unwrap();
        assert_eq!(out.as_str(), " 10.0");
    }

    #[test]
    fn calibration_line() {
        assert_eq!(
            render_calibration(&Calibration::DEFAULT).as_str(),
            "Dry: 0x600000 | Wet: 0x200000"
        );
    }

    #[test]
    fn channel_lines() {
        assert_eq!(
            render_channel(Channel::AIN3, 0x40_0000, 2.5).as_str(),
            "AIN3: 2.5000V (raw: 0x400000)"
        );
        let pair = Channel::differential(Input::Ain0, Input::Ain1);
        assert_eq!(
            render_channel(pair, 0x12, 0.0).as_str(),
            "AIN0-AIN1: 0.0000V (raw: 0x000012)"
        );
    }

    #[test]
    fn extreme_values_are_not_truncated() {
        let line = render_reading(&reading(-0x80_0000, f64::MIN, f64::MAX));
        assert!(line.starts_with("Moisture: 1844674407370955161.5% | -"));
        assert!(line.ends_with("V | Raw: 0x800000"), "{}", line.as_str());

        let pair = Channel::differential(Input::Ain7, Input::Ain6);
        let line = render_channel(pair, -1, f64::NEG_INFINITY);
        assert!(line.ends_with("V (raw: 0xFFFFFF)"), "{}", line.as_str());
        assert!(line.len() <= CHANNEL_LEN);
    }
}
