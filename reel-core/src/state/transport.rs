//! The transport state machine.
//!
//! Derives the transport phase purely from inbound `status` events,
//! tracks the selected clip's timecode bounds, and arbitrates
//! concurrent position updates through a reentrancy guard so a
//! device-driven update cannot trample a user scrub in progress.

use crate::protocol::StatusParams;
use crate::state::clips::ClipSlot;
use crate::timecode::{ActiveFormat, Timecode};

// ── Status classification ────────────────────────────────────────

/// Recognized content of a `status` string, matched by substring (the
/// deck embellishes them, e.g. `play (loop)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Stopped,
    Playing,
    Jogging,
    Recording,
    /// The deck is showing its input; follows a finished recording.
    Preview,
    /// Anything this client does not recognize.
    Other,
}

impl StatusKind {
    pub fn classify(status: &str) -> StatusKind {
        if status.contains("stopped") {
            StatusKind::Stopped
        } else if status.contains("play") {
            StatusKind::Playing
        } else if status.contains("jog") {
            StatusKind::Jogging
        } else if status.contains("record") {
            StatusKind::Recording
        } else if status.contains("preview") {
            StatusKind::Preview
        } else {
            StatusKind::Other
        }
    }
}

/// The derived transport phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No clip selected, no status seen yet.
    #[default]
    Idle,
    Stopped,
    Playing,
    Jogging,
    Recording,
    /// An unrecognized status: active-state affordances are cleared
    /// without asserting a specific phase.
    Unknown,
}

impl Phase {
    /// Transport is moving tape (or writing it).
    pub fn is_rolling(self) -> bool {
        matches!(self, Phase::Playing | Phase::Jogging | Phase::Recording)
    }
}

// ── Effects ──────────────────────────────────────────────────────

/// What a status event asks the surrounding router to do.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEffect {
    /// New transport state line for display.
    StateLine(String),
    /// The in-clip position moved.
    Position {
        current: Timecode,
        duration: Timecode,
    },
    /// A recording was just finalized; re-enumerate the clip list and
    /// select the newest entry once the refreshed count arrives.
    RefreshClips,
}

// ── TransportState ───────────────────────────────────────────────

/// Timecode bounds of the selected clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipBounds {
    pub starting: Timecode,
    pub duration: Timecode,
    pub ending: Timecode,
}

/// The synchronized transport state. Owned by the event router and
/// mutated only from its callback context — the single-threaded event
/// loop is the concurrency discipline.
#[derive(Debug)]
pub struct TransportState {
    phase: Phase,
    format: ActiveFormat,
    position: Timecode,
    bounds: ClipBounds,
    /// Last frame accepted through the guard; -1 after a reset so frame
    /// zero is accepted as a change.
    last_accepted_frame: i64,
    /// Reentrancy guard: held true for the duration of a position
    /// recompute; concurrent updates are rejected, not queued.
    is_updating: bool,
    /// Armed on entering `Recording`; consumed by the `preview` status
    /// that follows the finished recording.
    refresh_after_record: bool,
}

impl TransportState {
    pub fn new() -> Self {
        let format = ActiveFormat::default();
        let zero = format.zero();
        Self {
            phase: Phase::Idle,
            format,
            position: zero.clone(),
            bounds: ClipBounds {
                starting: zero.clone(),
                duration: zero.clone(),
                ending: zero,
            },
            last_accepted_frame: -1,
            is_updating: false,
            refresh_after_record: false,
        }
    }

    /// Session teardown on reconnect: back to idle with zeroed bounds.
    /// The inferred format survives — it describes the device, not the
    /// session.
    pub fn reset(&mut self) {
        let format = self.format;
        *self = Self::new();
        self.format = format;
        self.position = format.zero();
        self.bounds = ClipBounds {
            starting: format.zero(),
            duration: format.zero(),
            ending: format.zero(),
        };
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn format(&self) -> &ActiveFormat {
        &self.format
    }

    pub fn format_mut(&mut self) -> &mut ActiveFormat {
        &mut self.format
    }

    /// Current in-clip position.
    pub fn position(&self) -> &Timecode {
        &self.position
    }

    pub fn bounds(&self) -> &ClipBounds {
        &self.bounds
    }

    /// The current position as an absolute tape timecode.
    pub fn absolute_timecode(&self) -> Timecode {
        self.bounds.starting.add(self.position.frame_count() as i64)
    }

    /// Guarded position update. Rejected — returning `false` with state
    /// unchanged — if a recompute is already in progress, the frame is
    /// negative, or it equals the last accepted frame without `force`.
    /// Rejection is deliberate backpressure: the caller retries on its
    /// own schedule.
    pub fn try_update_position(&mut self, frames: i64, force: bool) -> bool {
        if self.is_updating || frames < 0 || (frames == self.last_accepted_frame && !force) {
            return false;
        }
        self.is_updating = true;
        self.position = self.format.timecode_from_frames(frames as u64);
        self.last_accepted_frame = frames;
        self.is_updating = false;
        true
    }

    /// Install a newly selected clip: bounds from the slot, guard state
    /// reset, position back to zero.
    pub fn select_clip(&mut self, slot: &ClipSlot) {
        let starting = slot.starting.clone().unwrap_or_else(|| self.format.zero());
        let duration = slot.duration.clone().unwrap_or_else(|| self.format.zero());
        let ending = starting.add(duration.frame_count() as i64);
        self.bounds = ClipBounds {
            starting,
            duration,
            ending,
        };
        self.last_accepted_frame = -1;
        self.try_update_position(0, true);
    }

    /// Fold one `status` event into the state machine, returning what
    /// the router should do about it.
    pub fn apply_status(&mut self, params: &StatusParams) -> Vec<StatusEffect> {
        let mut effects = Vec::new();

        let Some(status) = params.status.as_deref() else {
            self.phase = Phase::Unknown;
            self.refresh_after_record = false;
            effects.push(StatusEffect::StateLine("Unknown".to_string()));
            return effects;
        };
        let reported = params.timecode.as_deref().unwrap_or("");

        // Drop/non-drop mode follows whatever the device reports.
        if !reported.is_empty() {
            self.format.apply_timecode_hint(reported);
        }

        let previous = self.phase;
        match StatusKind::classify(status) {
            StatusKind::Recording => {
                self.phase = Phase::Recording;
                self.refresh_after_record = true;
                effects.push(StatusEffect::StateLine(self.recording_line(
                    status,
                    reported,
                    params.display_timecode.as_deref(),
                )));
            }
            StatusKind::Playing | StatusKind::Jogging => {
                self.phase = if StatusKind::classify(status) == StatusKind::Playing {
                    Phase::Playing
                } else {
                    Phase::Jogging
                };
                self.refresh_after_record = false;
                effects.push(StatusEffect::StateLine(format!("{status} [{reported}]")));
                self.track_reported_position(reported, &mut effects);
            }
            StatusKind::Stopped => {
                effects.push(StatusEffect::StateLine(format!("{status} [{reported}]")));
                // Freeze the final in-clip position when playback ends.
                if matches!(previous, Phase::Playing | Phase::Jogging) {
                    self.track_reported_position(reported, &mut effects);
                }
                self.phase = Phase::Stopped;
                self.refresh_after_record = false;
            }
            StatusKind::Preview => {
                effects.push(StatusEffect::StateLine(format!("{status} [{reported}]")));
                self.phase = Phase::Stopped;
                // Preview directly after recording means the deck just
                // finalized a new clip.
                if self.refresh_after_record {
                    self.refresh_after_record = false;
                    effects.push(StatusEffect::RefreshClips);
                }
            }
            StatusKind::Other => {
                self.phase = Phase::Unknown;
                self.refresh_after_record = false;
                effects.push(StatusEffect::StateLine(format!("{status} [{reported}]")));
            }
        }

        effects
    }

    /// Push the device-reported absolute timecode through the guard as
    /// an in-clip position.
    fn track_reported_position(&mut self, reported: &str, effects: &mut Vec<StatusEffect>) {
        let Ok(tc) = self.format.parse(reported) else {
            // Malformed timecode: keep the previous position.
            return;
        };
        let delta = tc.subtract(&self.bounds.starting);
        if self.try_update_position(delta, false) {
            effects.push(StatusEffect::Position {
                current: self.position.clone(),
                duration: self.bounds.duration.clone(),
            });
        }
    }

    /// `record [elapsed]` where elapsed is display − reported; parse
    /// failures fall back to the raw display string.
    fn recording_line(&self, status: &str, reported: &str, display: Option<&str>) -> String {
        let display = display.unwrap_or("");
        match (self.format.parse(display), self.format.parse(reported)) {
            (Ok(display_tc), Ok(reported_tc)) => {
                format!("{status} [{}]", display_tc.difference(&reported_tc))
            }
            _ => format!("{status} [{display}]"),
        }
    }
}

impl Default for TransportState {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────
