//! Wire envelope types for the deck control link.
//!
//! Outbound messages are `{"command": ..., "params": {...}}`; inbound
//! messages are `{"response": ..., "params": {...}}`. There is no
//! sequence-number correlation — commands and their effects are matched
//! by protocol convention (a `clip_refresh` is answered by a
//! `clip_count` plus N `clip_info` events, a `clip_select` by a later
//! `status`, and so on).

use serde::{Deserialize, Serialize};

// ── Outbound commands ────────────────────────────────────────────

/// Everything the client can send to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "params", rename_all = "snake_case")]
pub enum Command {
    /// Session bootstrap: announce a full control surface. Must be the
    /// first message after the link opens so the backend knows which
    /// event subset to stream.
    Control,
    /// Session bootstrap: announce a status-only monitor surface.
    Monitor,
    /// Replay the cached clip list and transport status.
    Refresh,
    /// Ask for the deck's network address.
    #[serde(rename = "getNetwork")]
    GetNetwork,
    /// Point the backend at a different deck.
    #[serde(rename = "updateNetwork")]
    UpdateNetwork { host: String, port: u16 },
    /// Poll the transport status now.
    StateRefresh,
    /// Re-enumerate the clip list.
    ClipRefresh,
    /// Select a clip by zero-based index.
    ClipSelect { id: usize },
    /// Scrub to an absolute timecode within the selected clip's media.
    ClipJog { timecode: String },
    ClipPrevious,
    ClipNext,
    Play {
        r#loop: bool,
        single: bool,
        speed: f64,
    },
    Stop,
    /// Start recording into a new named clip.
    RecordNamed { clip_name: String },
    /// Switch the active storage slot.
    SlotSelect { slot: u32 },
    /// Query slot state; `None` means the active slot.
    SlotInfo {
        #[serde(skip_serializing_if = "Option::is_none")]
        slot: Option<u32>,
    },
}

// ── Inbound events ───────────────────────────────────────────────

/// Everything the backend streams to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "response", content = "params", rename_all = "snake_case")]
pub enum Event {
    /// The clip list is being rebuilt with exactly `count` entries;
    /// `clip_info` events follow, one per clip.
    ClipCount { count: usize },
    /// One clip's metadata. May arrive before the enumeration settles.
    ClipInfo(ClipInfoParams),
    /// Periodic transport status snapshot.
    Status(StatusParams),
    /// Raw command/response text exchanged with the physical deck.
    Transcript(TranscriptParams),
    /// The deck's network address, informational.
    Network(NetworkParams),
    /// Connection-level failure; the client closes the link to force a
    /// clean resynchronization.
    RequestError { message: String },
    /// Command rejected by the deck; surfaced to the user only.
    ResponseError { message: String },
    /// Anything this client version does not recognize.
    #[serde(other, deserialize_with = "ignore_params")]
    Unknown,
}

/// Discards whatever `params` accompany an unrecognized response so the
/// `#[serde(other)]` unit variant tolerates content.
fn ignore_params<'de, D: serde::Deserializer<'de>>(d: D) -> Result<(), D::Error> {
    serde::de::IgnoredAny::deserialize(d).map(|_| ())
}

/// Params of a `clip_info` event. `id` is 1-based on the wire and maps
/// to index `id - 1` in local storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipInfoParams {
    pub id: usize,
    pub name: String,
    /// Starting timecode of the clip on the tape, formatted.
    pub timecode: String,
    /// Clip duration, formatted.
    pub duration: String,
}

/// Params of a `status` event. All fields optional: the backend relays
/// whatever transport properties the deck reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusParams {
    pub status: Option<String>,
    pub timecode: Option<String>,
    #[serde(rename = "display timecode", skip_serializing_if = "Option::is_none")]
    pub display_timecode: Option<String>,
}

/// Params of a `transcript` event: the raw line pairs exchanged with
/// the deck, for diagnostic display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptParams {
    pub sent: Vec<String>,
    pub received: Vec<String>,
}

/// Params of a `network` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub host: String,
    pub port: u16,
}

// ── Tests ────────────────────────────────────────────────────────
