use std::{fmt, time::Duration};

use crate::timestamp::{format_time, to_seconds};

/// A linear timing transform, `t * scale + offset`.
///
/// Scaling happens before the offset is added, so a `Retime` built with
/// both moves the already stretched timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Retime {
    pub offset: f64,
    pub scale: f64,
}

impl Default for Retime {
    fn default() -> Self {
        Retime {
            offset: 0.0,
            scale: 1.0,
        }
    }
}

impl Retime {
    pub fn shift(offset: f64) -> Self {
        Retime {
            offset,
            ..Default::default()
        }
    }

    pub fn scale(factor: f64) -> Self {
        Retime {
            scale: factor,
            ..Default::default()
        }
    }

    /// Timing made for `source_fps` video, played back at `target_fps`.
    pub fn framerate(source_fps: f64, target_fps: f64) -> Self {
        Retime::scale(source_fps / target_fps)
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn is_identity(&self) -> bool {
        self.offset == 0.0 && self.scale == 1.0
    }

    pub fn apply_seconds(&self, seconds: f64) -> f64 {
        seconds * self.scale + self.offset
    }

    /// Like [`Retime::apply_seconds`], but anything that would land before
    /// zero (or is not a number) clamps to zero.
    pub fn apply_duration(&self, duration: Duration) -> Duration {
        let seconds = self.apply_seconds(duration.as_secs_f64());
        if seconds.is_nan() || seconds <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }

    /// Retime a timestamp string with the permissive parse/format pair.
    pub fn apply_str(&self, timestamp: &str) -> String {
        format_time(self.apply_seconds(to_seconds(timestamp)))
    }
}

impl fmt::Display for Retime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scale x{} offset {:+}s", self.scale, self.offset)
    }
}
