//! Conversion between `HH:MM:SS[.mmm]` timestamp strings and seconds.
//!
//! [`to_seconds`] and [`format_time`] are permissive: malformed input never
//! fails, it turns into `NaN` or an odd looking string. [`Timestamp`] is the
//! validating counterpart for callers who want errors instead.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr, time::Duration};

const SECS_PER_HOUR: u64 = 3600;
const SECS_PER_MINUTE: u64 = 60;

/// Total seconds represented by a `H:M:S` string.
///
/// The seconds field may carry a fraction marked by either `.` or `,`. Each
/// field is read as a leading float, so trailing junk is ignored, and a field
/// with no number in front (or a missing field) makes the whole result `NaN`.
pub fn to_seconds(time: &str) -> f64 {
    let normalized = time.replacen(',', ".", 1);
    let mut fields = normalized.split(':').map(parse_leading_float);
    let hours = fields.next().unwrap_or(f64::NAN);
    let minutes = fields.next().unwrap_or(f64::NAN);
    let seconds = fields.next().unwrap_or(f64::NAN);
    hours * SECS_PER_HOUR as f64 + minutes * SECS_PER_MINUTE as f64 + seconds
}

/// Render `seconds` as zero padded `HH:MM:SS`.
///
/// The fraction is truncated, never rounded. Fields are padded to two digits
/// but never cut, so 100 hours comes out as `100:00:00`.
pub fn format_time(seconds: f64) -> String {
    let hours = (seconds / SECS_PER_HOUR as f64).floor();
    let minutes = ((seconds % SECS_PER_HOUR as f64) / SECS_PER_MINUTE as f64).floor();
    let secs = (seconds % SECS_PER_MINUTE as f64).floor();
    format!(
        "{}:{}:{}",
        Component(hours),
        Component(minutes),
        Component(secs)
    )
}

/// A floored time component, padded to at least two characters.
struct Component(f64);

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        if v.is_nan() {
            f.write_str("NaN")
        } else if v.is_infinite() {
            f.write_str(if v > 0.0 { "Infinity" } else { "-Infinity" })
        } else {
            // `as` maps -0.0 to 0, which is what we want printed
            write!(f, "{:02}", v as i64)
        }
    }
}

/// Parse the longest numeric prefix of `s`, after leading whitespace.
///
/// Accepts an optional sign, digits with an optional `.` fraction, an
/// optional exponent, and the literal `Infinity`. Anything else is `NaN`.
fn parse_leading_float(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        return if bytes[0] == b'-' {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse().unwrap_or(f64::NAN)
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Which field of a timestamp an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Hours,
    Minutes,
    Seconds,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Hours => "hours",
            Field::Minutes => "minutes",
            Field::Seconds => "seconds",
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimestampError {
    #[error("expected 3 colon separated fields, found {0}")]
    FieldCount(usize),
    #[error("invalid {field} field: {value:?}")]
    InvalidField { field: Field, value: String },
    #[error("{field} out of range: {value}")]
    OutOfRange { field: Field, value: u64 },
    #[error("not a valid timestamp offset: {0} seconds")]
    InvalidSeconds(f64),
}

/// A validated, non-negative time offset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(Duration);

impl Timestamp {
    pub fn from_duration(duration: Duration) -> Self {
        Timestamp(duration)
    }

    pub fn from_seconds(seconds: f64) -> Result<Self, TimestampError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(TimestampError::InvalidSeconds(seconds));
        }
        Duration::try_from_secs_f64(seconds)
            .map(Timestamp)
            .map_err(|_| TimestampError::InvalidSeconds(seconds))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0.as_secs_f64()
    }

    /// Display adaptor for `HH:MM:SS<separator>mmm`, milliseconds truncated.
    pub fn precise(&self, separator: char) -> Precise {
        Precise {
            duration: self.0,
            separator,
        }
    }
}

impl From<Duration> for Timestamp {
    fn from(duration: Duration) -> Self {
        Timestamp(duration)
    }
}

impl From<Timestamp> for Duration {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

fn parse_digits(field: Field, value: &str) -> Result<u64, TimestampError> {
    let invalid = || TimestampError::InvalidField {
        field,
        value: value.to_string(),
    };
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    value.parse().map_err(|_| invalid())
}

fn parse_sexagesimal(field: Field, value: &str) -> Result<u64, TimestampError> {
    let n = parse_digits(field, value)?;
    if n >= SECS_PER_MINUTE {
        return Err(TimestampError::OutOfRange { field, value: n });
    }
    Ok(n)
}

/// Parse a fraction's digits into nanoseconds, ignoring digits past 1ns.
fn parse_fraction(value: &str) -> Result<u32, TimestampError> {
    parse_digits(Field::Seconds, value)?;
    let nanos = value
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(9)
        .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));
    Ok(nanos)
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s.trim().split(':').collect::<Vec<_>>();
        let [hours, minutes, seconds] = fields.as_slice() else {
            return Err(TimestampError::FieldCount(fields.len()));
        };

        let hours = parse_digits(Field::Hours, hours)?;
        let minutes = parse_sexagesimal(Field::Minutes, minutes)?;
        let (whole, nanos) = match seconds.split_once(['.', ',']) {
            Some((whole, frac)) => (whole, parse_fraction(frac)?),
            None => (*seconds, 0),
        };
        let whole = parse_sexagesimal(Field::Seconds, whole)?;

        let total = hours
            .checked_mul(SECS_PER_HOUR)
            .and_then(|h| h.checked_add(minutes * SECS_PER_MINUTE + whole))
            .ok_or(TimestampError::OutOfRange {
                field: Field::Hours,
                value: hours,
            })?;
        Ok(Timestamp(Duration::new(total, nanos)))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        write!(
            f,
            "{:02}:{:02}:{:02}",
            secs / SECS_PER_HOUR,
            (secs % SECS_PER_HOUR) / SECS_PER_MINUTE,
            secs % SECS_PER_MINUTE
        )
    }
}

pub struct Precise {
    duration: Duration,
    separator: char,
}

impl fmt::Display for Precise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{:03}",
            Timestamp(self.duration),
            self.separator,
            self.duration.subsec_millis()
        )
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.precise('.').to_string())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Timestamp, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(serde::de::Error::custom)
    }
}
