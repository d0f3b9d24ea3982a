//! Transcript filtering.
//!
//! The backend forwards every raw command/response pair it exchanges
//! with the deck, including its once-a-second transport poll. Only
//! user-initiated exchanges belong in the visible log, so visibility is
//! gated on a one-shot flag armed by explicit refreshes. Disk-full
//! indicators in either direction raise a single alert per connection.

use crate::protocol::TranscriptParams;

/// First sent line of the backend's periodic transport poll.
pub const TRANSPORT_POLL_PROBE: &str = "transport info";

/// Keep-alive probe, never user-relevant.
pub const PING_PROBE: &str = "ping";

/// Substring that marks a storage-exhausted exchange.
pub const DISK_FULL_MARKER: &str = "disk full";

/// A transcript cleared for display.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptView {
    pub sent: String,
    pub received: String,
}

/// Everything one transcript event produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptOutcome {
    /// The displayable pair, if this transcript passed the filter.
    pub view: Option<TranscriptView>,
    /// One-shot disk-full alert.
    pub disk_full_alert: bool,
    /// A `timecode:` line the deck reported, for drop-mode inference.
    pub timecode_hint: Option<String>,
    /// A `video format:` line the deck reported, for rate inference.
    pub video_format_hint: Option<String>,
}

/// Stateful filter over the transcript stream.
#[derive(Debug)]
pub struct TranscriptFilter {
    /// Show the next transcript even if it is the periodic poll. Armed
    /// by explicit user refreshes, consumed when a transcript is shown.
    show_next: bool,
    /// Latched once the disk-full alert has fired this connection.
    disk_alert_fired: bool,
}

impl TranscriptFilter {
    pub fn new() -> Self {
        Self {
            // The first exchange after a page load is user-relevant.
            show_next: true,
            disk_alert_fired: false,
        }
    }

    /// The user explicitly asked for a status or clip refresh.
    pub fn request_shown(&mut self) {
        self.show_next = true;
    }

    /// New connection: re-arm visibility, un-latch the disk alert.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn apply(&mut self, params: &TranscriptParams) -> TranscriptOutcome {
        let mut outcome = TranscriptOutcome::default();

        // Format hints ride along on transport-info replies; rate
        // inference must not depend on whether the transcript is shown.
        for line in &params.received {
            if let Some(rest) = line.strip_prefix("timecode:") {
                outcome.timecode_hint = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("video format:") {
                outcome.video_format_hint = Some(rest.trim().to_string());
            }
        }

        if !self.disk_alert_fired
            && params
                .sent
                .iter()
                .chain(params.received.iter())
                .any(|line| line.contains(DISK_FULL_MARKER))
        {
            self.disk_alert_fired = true;
            outcome.disk_full_alert = true;
        }

        let is_poll = params
            .sent
            .first()
            .is_some_and(|line| line == TRANSPORT_POLL_PROBE);
        if !self.show_next && is_poll {
            return outcome;
        }

        let sent = params.sent.join("\n").trim().to_string();
        if sent.contains(PING_PROBE) {
            // Keep-alives never consume the visibility flag.
            return outcome;
        }

        outcome.view = Some(TranscriptView {
            sent,
            received: params.received.join("\n").trim().to_string(),
        });
        self.show_next = false;
        outcome
    }
}

impl Default for TranscriptFilter {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────
