//! Exposure, gain, and timeout conversions.
//!
//! These are the only numeric rules in camerpi: turning photographer-style
//! shutter speeds into microseconds, ISO values into sensor gain, and a
//! timelapse plan into the timeout handed to the capture tool.

use std::fmt;
use std::str::FromStr;

/// Microseconds per second.
const MICROS_PER_SEC: u64 = 1_000_000;

/// Lowest gain accepted by the sensor.
pub const MIN_GAIN: u32 = 1;

/// Highest gain accepted by the sensor.
pub const MAX_GAIN: u32 = 144;

/// Seconds of slack added on top of the theoretical timelapse duration.
pub const TIMELAPSE_SLACK_SECS: u64 = 10;

/// Errors produced while parsing an exposure string.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExposureError {
    #[error("empty exposure value")]
    Empty,

    #[error("invalid exposure denominator '{0}'")]
    InvalidDenominator(String),

    #[error("exposure denominator must not be zero")]
    ZeroDenominator,

    #[error("invalid exposure seconds '{0}'")]
    InvalidSeconds(String),

    #[error("exposure must be a finite, non-negative number of seconds, got '{0}'")]
    OutOfRange(String),
}

/// A shutter time, stored in whole microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Exposure {
    micros: u64,
}

impl Exposure {
    pub fn from_micros(micros: u64) -> Self {
        Self { micros }
    }

    /// Shutter time as passed to `--shutter`.
    pub fn as_micros(&self) -> u64 {
        self.micros
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.micros as f64 / MICROS_PER_SEC as f64
    }
}

impl fmt::Display for Exposure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.micros)
    }
}

impl FromStr for Exposure {
    type Err = ExposureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_exposure(s).map(Self::from_micros)
    }
}

/// Parse an exposure string into microseconds.
///
/// Accepted forms:
/// * `1/N` - a fraction of a second (`1/500` is 2000us)
/// * `Ns` or `N"` - seconds, possibly fractional (`2s`, `0.5"`)
/// * `N` - shorthand for `1/N` (`30` is 33333us)
///
/// Results are truncated toward zero.
pub fn parse_exposure(s: &str) -> Result<u64, ExposureError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ExposureError::Empty);
    }

    if let Some(denominator) = s.strip_prefix("1/") {
        return reciprocal_micros(denominator);
    }

    if let Some(seconds) = s.strip_suffix('"').or_else(|| s.strip_suffix('s')) {
        return seconds_micros(seconds);
    }

    reciprocal_micros(s)
}

fn reciprocal_micros(denominator: &str) -> Result<u64, ExposureError> {
    let n: u64 = denominator
        .trim()
        .parse()
        .map_err(|_| ExposureError::InvalidDenominator(denominator.to_string()))?;
    if n == 0 {
        return Err(ExposureError::ZeroDenominator);
    }
    Ok(MICROS_PER_SEC / n)
}

fn seconds_micros(seconds: &str) -> Result<u64, ExposureError> {
    let secs: f64 = seconds
        .trim()
        .parse()
        .map_err(|_| ExposureError::InvalidSeconds(seconds.to_string()))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(ExposureError::OutOfRange(seconds.to_string()));
    }
    Ok((secs * MICROS_PER_SEC as f64) as u64)
}

/// Convert an ISO value into a sensor gain in `[MIN_GAIN, MAX_GAIN]`.
pub fn iso_to_gain(iso: u32) -> u32 {
    (iso / 100).clamp(MIN_GAIN, MAX_GAIN)
}

/// Timeout in milliseconds for a timelapse run.
///
/// Each frame takes `exposure + pause` rounded up to the next whole second,
/// plus [`TIMELAPSE_SLACK_SECS`] so the capture tool is never cut off early.
/// Saturates at `u64::MAX` for absurdly long runs.
pub fn timelapse_timeout_ms(frames: u32, exposure_secs: f64, pause_secs: f64) -> u64 {
    // float to int casts saturate
    let per_frame = (exposure_secs + pause_secs).ceil().max(0.0) as u64;
    u64::from(frames)
        .saturating_mul(per_frame)
        .saturating_add(TIMELAPSE_SLACK_SECS)
        .saturating_mul(1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fraction() {
        assert_eq!(parse_exposure("1/500"), Ok(2000));
        assert_eq!(parse_exposure("1/250"), Ok(4000));
        assert_eq!(parse_exposure("1/3"), Ok(333_333));
        assert_eq!(parse_exposure("1/1"), Ok(1_000_000));
    }

    #[test]
    fn test_parse_seconds_suffix() {
        assert_eq!(parse_exposure("2s"), Ok(2_000_000));
        assert_eq!(parse_exposure("2\""), Ok(2_000_000));
        assert_eq!(parse_exposure("0.5s"), Ok(500_000));
        assert_eq!(parse_exposure("30\""), Ok(30_000_000));
    }

    #[test]
    fn test_parse_bare_denominator() {
        assert_eq!(parse_exposure("30"), Ok(33_333));
        assert_eq!(parse_exposure("1000"), Ok(1000));
        assert_eq!(parse_exposure("1"), Ok(1_000_000));
    }

    #[test]
    fn test_parse_rejects_zero_denominator() {
        assert_eq!(parse_exposure("0"), Err(ExposureError::ZeroDenominator));
        assert_eq!(parse_exposure("1/0"), Err(ExposureError::ZeroDenominator));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_exposure("fast"),
            Err(ExposureError::InvalidDenominator(_))
        ));
        assert!(matches!(
            parse_exposure("1/abc"),
            Err(ExposureError::InvalidDenominator(_))
        ));
        assert!(matches!(
            parse_exposure("abcs"),
            Err(ExposureError::InvalidSeconds(_))
        ));
        assert_eq!(parse_exposure(""), Err(ExposureError::Empty));
        assert_eq!(parse_exposure("   "), Err(ExposureError::Empty));
    }

    #[test]
    fn test_parse_rejects_negative_seconds() {
        assert!(matches!(
            parse_exposure("-2s"),
            Err(ExposureError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_exposure("infs"),
            Err(ExposureError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_parse_is_pure() {
        for input in ["1/500", "2s", "30", "0.25\""] {
            assert_eq!(parse_exposure(input), parse_exposure(input));
        }
    }

    #[test]
    fn test_exposure_from_str() {
        let exposure: Exposure = "1/250".parse().unwrap();
        assert_eq!(exposure.as_micros(), 4000);
        assert!((exposure.as_secs_f64() - 0.004).abs() < f64::EPSILON);
        assert_eq!(exposure.to_string(), "4000us");
        assert!("nope".parse::<Exposure>().is_err());
    }

    #[test]
    fn test_exposure_error_display() {
        let msg = ExposureError::InvalidDenominator("x".to_string()).to_string();
        assert!(msg.contains("'x'"));
        assert!(ExposureError::ZeroDenominator.to_string().contains("zero"));
    }

    #[test]
    fn test_gain_clamping() {
        assert_eq!(iso_to_gain(0), 1);
        assert_eq!(iso_to_gain(50), 1);
        assert_eq!(iso_to_gain(100), 1);
        assert_eq!(iso_to_gain(199), 1);
        assert_eq!(iso_to_gain(200), 2);
        assert_eq!(iso_to_gain(4800), 48);
        assert_eq!(iso_to_gain(14400), 144);
        assert_eq!(iso_to_gain(14499), 144);
        assert_eq!(iso_to_gain(99999), 144);
        assert_eq!(iso_to_gain(u32::MAX), 144);
    }

    #[test]
    fn test_gain_is_monotonic() {
        let mut previous = iso_to_gain(0);
        for iso in (0..20_000).step_by(37) {
            let gain = iso_to_gain(iso);
            assert!(gain >= previous, "gain dropped at iso {}", iso);
            previous = gain;
        }
    }

    #[test]
    fn test_timelapse_timeout() {
        assert_eq!(timelapse_timeout_ms(10, 2.0, 0.5), 40_000);
        assert_eq!(timelapse_timeout_ms(1, 0.001, 0.0), 11_000);
        assert_eq!(timelapse_timeout_ms(5, 3.0, 0.0), 25_000);
        assert_eq!(timelapse_timeout_ms(3, 0.0, 0.0), 10_000);
    }

    #[test]
    fn test_timelapse_timeout_rounds_each_frame_up() {
        // 1.1s per frame counts as 2s
        assert_eq!(timelapse_timeout_ms(4, 1.0, 0.1), (10 + 4 * 2) * 1000);
    }

    #[test]
    fn test_timelapse_timeout_saturates() {
        assert_eq!(timelapse_timeout_ms(u32::MAX, 1e10, 0.0), u64::MAX);
        assert_eq!(timelapse_timeout_ms(1, f64::MAX, f64::MAX), u64::MAX);
        assert_eq!(timelapse_timeout_ms(0, 1e30, 0.0), 10_000);
    }
}
