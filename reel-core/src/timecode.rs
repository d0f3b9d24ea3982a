//! Frame-rate-aware SMPTE timecode representation and arithmetic.
//!
//! `Timecode` is a value type: constructed from a frame count or a
//! formatted string, never mutated in place. Arithmetic returns new
//! values. Drop-frame rates (29.97/59.94) skip frame numbers `:00` and
//! `:01` (`:00`..`:03` at 59.94) at the start of every minute except
//! minutes divisible by ten, per the SMPTE convention.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ReelError;

// ── FrameRate ────────────────────────────────────────────────────

/// The video frame rates the deck reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameRate {
    /// 29.97 fps (30 fps nominal, drop-frame capable).
    Fps29_97,
    /// 30 fps exact.
    Fps30,
    /// 59.94 fps (60 fps nominal, drop-frame capable).
    Fps59_94,
    /// 60 fps exact.
    Fps60,
}

impl FrameRate {
    /// Integer counting base: 30 for the 29.97/30 family, 60 for 59.94/60.
    pub fn nominal(self) -> u64 {
        match self {
            FrameRate::Fps29_97 | FrameRate::Fps30 => 30,
            FrameRate::Fps59_94 | FrameRate::Fps60 => 60,
        }
    }

    /// Returns `true` for the rates that use drop-frame counting.
    pub fn drop_capable(self) -> bool {
        matches!(self, FrameRate::Fps29_97 | FrameRate::Fps59_94)
    }

    /// Frame numbers skipped per drop minute: 2 at 29.97, 4 at 59.94.
    pub fn drops_per_minute(self) -> u64 {
        self.nominal() / 15
    }

    /// The true rate as a float, for display.
    pub fn as_f64(self) -> f64 {
        match self {
            FrameRate::Fps29_97 => 29.97,
            FrameRate::Fps30 => 30.0,
            FrameRate::Fps59_94 => 59.94,
            FrameRate::Fps60 => 60.0,
        }
    }

    /// Selects a rate from the deck's reported video format string
    /// (e.g. `1080i5994`, `720p60`). Probe order matters: `2997` must
    /// be checked before `30`, and `5994` before `60`.
    pub fn from_video_format(format: &str) -> Option<FrameRate> {
        if format.contains("2997") {
            Some(FrameRate::Fps29_97)
        } else if format.contains("30") {
            Some(FrameRate::Fps30)
        } else if format.contains("5994") {
            Some(FrameRate::Fps59_94)
        } else if format.contains("60") {
            Some(FrameRate::Fps60)
        } else {
            None
        }
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_f64())
    }
}

// ── Timecode ─────────────────────────────────────────────────────

/// An immutable frame-accurate timecode.
///
/// The canonical string form is derived solely from
/// (frames, rate, drop_frame). String and frame-count conversions are
/// inverse of each other except at drop-frame boundary frames, where
/// skipped frame numbers normalize to the nearest valid position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timecode {
    frames: u64,
    rate: FrameRate,
    drop_frame: bool,
}

impl Timecode {
    /// Build a timecode from an absolute frame count.
    pub fn from_frames(frames: u64, rate: FrameRate, drop_frame: bool) -> Self {
        // Drop-frame counting only exists for the fractional rates.
        let drop_frame = drop_frame && rate.drop_capable();
        Self {
            frames,
            rate,
            drop_frame,
        }
    }

    /// Parse a formatted `HH:MM:SS[:;.]FF` string.
    pub fn parse(s: &str, rate: FrameRate, drop_frame: bool) -> Result<Self, ReelError> {
        let (h, m, sec, _, f) = split_components(s.trim()).ok_or_else(|| {
            ReelError::TimecodeParse {
                input: s.to_string(),
                reason: "expected HH:MM:SS[:;.]FF",
            }
        })?;

        let nominal = rate.nominal();
        if h >= 24 {
            return Err(ReelError::TimecodeParse {
                input: s.to_string(),
                reason: "hours out of range",
            });
        }
        if m >= 60 || sec >= 60 {
            return Err(ReelError::TimecodeParse {
                input: s.to_string(),
                reason: "minutes or seconds out of range",
            });
        }
        if f >= nominal {
            return Err(ReelError::TimecodeParse {
                input: s.to_string(),
                reason: "frame number exceeds frame rate",
            });
        }

        let drop_frame = drop_frame && rate.drop_capable();
        let mut frames = (h * 3600 + m * 60 + sec) * nominal + f;
        if drop_frame {
            let total_minutes = h * 60 + m;
            let dropped = rate.drops_per_minute() * (total_minutes - total_minutes / 10);
            // Skipped frame numbers in the first second of a drop minute
            // (an invalid-on-tape position) floor at the minute start.
            frames = frames.saturating_sub(dropped);
        }

        Ok(Self {
            frames,
            rate,
            drop_frame,
        })
    }

    /// The absolute frame count.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// The rate this value was constructed with.
    pub fn rate(&self) -> FrameRate {
        self.rate
    }

    /// Whether this value uses drop-frame counting.
    pub fn is_drop_frame(&self) -> bool {
        self.drop_frame
    }

    /// Returns a new timecode offset by `delta` frames, flooring at zero.
    pub fn add(&self, delta: i64) -> Timecode {
        let frames = if delta < 0 {
            self.frames.saturating_sub(delta.unsigned_abs())
        } else {
            self.frames + delta as u64
        };
        Timecode {
            frames,
            rate: self.rate,
            drop_frame: self.drop_frame,
        }
    }

    /// Signed frame delta `self − other`. Negative deltas are valid and
    /// mean `self` is behind `other`.
    pub fn subtract(&self, other: &Timecode) -> i64 {
        self.frames as i64 - other.frames as i64
    }

    /// Saturating difference as a timecode, for elapsed-time display.
    pub fn difference(&self, other: &Timecode) -> Timecode {
        Timecode {
            frames: self.frames.saturating_sub(other.frames),
            rate: self.rate,
            drop_frame: self.drop_frame,
        }
    }

    /// Wall-clock components (hours, minutes, seconds, frames), with the
    /// drop-frame skip applied.
    fn components(&self) -> (u64, u64, u64, u64) {
        let nominal = self.rate.nominal();
        let mut frames = self.frames;

        if self.drop_frame {
            let d = self.rate.drops_per_minute();
            let per_ten = 600 * nominal - 9 * d;
            let per_minute = 60 * nominal - d;

            let tens = frames / per_ten;
            let rem = frames % per_ten;
            frames += 9 * d * tens;
            if rem > d {
                frames += d * ((rem - d) / per_minute);
            }
        }

        let f = frames % nominal;
        let s = (frames / nominal) % 60;
        let m = (frames / (nominal * 60)) % 60;
        let h = frames / (nominal * 3600);
        (h, m, s, f)
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s, frames) = self.components();
        let sep = if self.drop_frame { ';' } else { ':' };
        write!(f, "{h:02}:{m:02}:{s:02}{sep}{frames:02}")
    }
}

// ── String inference ─────────────────────────────────────────────

/// Parse `HH:MM:SS` + separator + `FF` into raw components.
fn split_components(s: &str) -> Option<(u64, u64, u64, char, u64)> {
    let b = s.as_bytes();
    if b.len() != 11 {
        return None;
    }
    if b[2] != b':' || b[5] != b':' {
        return None;
    }
    let sep = b[8] as char;
    if !matches!(sep, ':' | ';' | '.') {
        return None;
    }

    let pair = |hi: u8, lo: u8| -> Option<u64> {
        if hi.is_ascii_digit() && lo.is_ascii_digit() {
            Some(u64::from(hi - b'0') * 10 + u64::from(lo - b'0'))
        } else {
            None
        }
    };

    let h = pair(b[0], b[1])?;
    let m = pair(b[3], b[4])?;
    let sec = pair(b[6], b[7])?;
    let f = pair(b[9], b[10])?;
    Some((h, m, sec, sep, f))
}

/// Infer drop-frame mode from a reported timecode string: a `;` (or `.`)
/// separator before the frame pair means drop-frame. Malformed strings
/// fall back to a bare `;` search.
pub fn drop_frame_hint(s: &str) -> bool {
    match split_components(s.trim()) {
        Some((_, _, _, sep, _)) => sep != ':',
        None => s.contains(';'),
    }
}

// ── ActiveFormat ─────────────────────────────────────────────────

/// The frame format currently in effect, inferred at runtime from the
/// device's reported video format and timecode syntax.
///
/// Changing the format affects subsequent constructions only; in-flight
/// `Timecode` values keep the rate they were built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveFormat {
    pub rate: FrameRate,
    pub drop_frame: bool,
}

impl Default for ActiveFormat {
    fn default() -> Self {
        // The deck family this controller targets boots in 1080i5994.
        Self {
            rate: FrameRate::Fps59_94,
            drop_frame: true,
        }
    }
}

impl ActiveFormat {
    /// Update drop/non-drop mode from a reported timecode string.
    pub fn apply_timecode_hint(&mut self, timecode: &str) {
        self.drop_frame = drop_frame_hint(timecode);
    }

    /// Update the rate from a reported video format string. Returns
    /// `true` if the string selected a known rate.
    pub fn apply_video_format(&mut self, format: &str) -> bool {
        match FrameRate::from_video_format(format) {
            Some(rate) => {
                self.rate = rate;
                true
            }
            None => false,
        }
    }

    /// Construct a timecode in the active format.
    pub fn timecode_from_frames(&self, frames: u64) -> Timecode {
        Timecode::from_frames(frames, self.rate, self.drop_frame)
    }

    /// Parse a string in the active format.
    pub fn parse(&self, s: &str) -> Result<Timecode, ReelError> {
        Timecode::parse(s, self.rate, self.drop_frame)
    }

    /// Zero timecode in the active format.
    pub fn zero(&self) -> Timecode {
        self.timecode_from_frames(0)
    }
}

// ── Tests ────────────────────────────────────────────────────────
