//! Clip duration probing via ffprobe.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::command;
use crate::runner::ProcessRunner;
use crate::{Error, Result};

/// Prefix of the ffprobe `-show_format` line carrying the duration.
pub const DURATION_PREFIX: &str = "duration=";

/// Significant digits kept when rounding a probed duration.
const SIGNIFICANT_DIGITS: usize = 2;

/// A clip length in seconds, rounded to two significant digits.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ClipDuration(f64);

impl ClipDuration {
    /// Round `seconds` half-up to two significant digits.
    pub fn from_seconds(seconds: f64) -> Self {
        Self(round_significant(seconds, SIGNIFICANT_DIGITS))
    }

    pub fn seconds(&self) -> f64 {
        self.0
    }

    /// Whole seconds, rounded half-up.
    pub fn whole_seconds(&self) -> i64 {
        self.0.round() as i64
    }
}

impl fmt::Display for ClipDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Parses the decimal text ffprobe prints. Plain decimals are rounded on
/// their digits, so ties like `0.145` round up to `0.15`.
impl FromStr for ClipDuration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        let seconds: f64 = text
            .parse()
            .map_err(|e| Error::parse_error("ffprobe", format!("duration [{}]: {}", text, e)))?;
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(Error::parse_error(
                "ffprobe",
                format!("duration [{}] is not a length", text),
            ));
        }

        Ok(match round_decimal_text(text, SIGNIFICANT_DIGITS) {
            Some(rounded) => Self(rounded),
            None => Self::from_seconds(seconds),
        })
    }
}

/// Round `[+]digits[.digits]` half-up to `digits` significant digits.
///
/// `None` for any other notation, such as exponents.
fn round_decimal_text(text: &str, digits: usize) -> Option<f64> {
    let text = text.strip_prefix('+').unwrap_or(text);
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut all = Vec::with_capacity(int_part.len() + frac_part.len());
    for b in int_part.bytes().chain(frac_part.bytes()) {
        if !b.is_ascii_digit() {
            return None;
        }
        all.push(u64::from(b - b'0'));
    }

    let Some(first) = all.iter().position(|&d| d != 0) else {
        return Some(0.0);
    };
    let end = first + digits;

    let mut mantissa = (first..end)
        .fold(0u64, |acc, i| acc * 10 + all.get(i).copied().unwrap_or(0));
    if all.get(end).is_some_and(|&d| d >= 5) {
        mantissa += 1;
    }

    // Position of the decimal point relative to the last kept digit.
    let exponent = int_part.len() as i32 - end as i32;
    Some(scale(mantissa as f64, exponent))
}

/// Multiply or divide by an exact power of ten, keeping `15 / 100` the
/// nearest double to `0.15`.
fn scale(value: f64, exponent: i32) -> f64 {
    if exponent >= 0 {
        value * 10f64.powi(exponent)
    } else {
        value / 10f64.powi(-exponent)
    }
}

/// Half-up rounding of a binary value. Decimal ties that have no exact
/// binary form (`0.145`) may round down; text input goes through
/// [`round_decimal_text`] instead.
fn round_significant(value: f64, digits: usize) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let exponent = magnitude + 1 - digits as i32;
    if exponent >= 0 {
        let factor = 10f64.powi(exponent);
        (value / factor).round() * factor
    } else {
        let factor = 10f64.powi(-exponent);
        (value * factor).round() / factor
    }
}

/// Parse one prober output line; `None` if it is not the duration line.
pub fn parse_duration_line(line: &str) -> Option<Result<ClipDuration>> {
    let raw = line.trim_end().strip_prefix(DURATION_PREFIX)?;
    Some(raw.parse())
}

/// Determines clip durations by running ffprobe.
#[derive(Debug, Clone)]
pub struct Prober {
    ffprobe: PathBuf,
    runner: ProcessRunner,
}

impl Prober {
    pub fn new(ffprobe: impl Into<PathBuf>, runner: ProcessRunner) -> Self {
        Self {
            ffprobe: ffprobe.into(),
            runner,
        }
    }

    /// Probe `input` and return the first duration ffprobe reports.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if `input` is missing or a directory.
    /// - [`Error::DurationNotFound`] if the output has no duration line.
    pub fn probe(&self, input: &Path) -> Result<ClipDuration> {
        if !input.exists() {
            return Err(Error::InvalidInput(format!(
                "input file [{}] does not exist",
                input.display()
            )));
        }
        if input.is_dir() {
            return Err(Error::InvalidInput(format!(
                "input [{}] is a directory",
                input.display()
            )));
        }

        let cmd = command::probe(&self.ffprobe, input);
        tracing::debug!("Issuing ffprobe command [{}]", cmd);

        let duration = self
            .runner
            .scan(&cmd, true, parse_duration_line)?
            .ok_or_else(|| Error::DurationNotFound {
                path: input.to_path_buf(),
            })??;

        tracing::debug!("Found duration [{}] for {:?}", duration, input);
        Ok(duration)
    }
}
