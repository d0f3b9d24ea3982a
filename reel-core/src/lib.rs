//! # reel-core
//!
//! Client-side synchronizer for a networked tape-style media deck.
//!
//! This crate contains:
//! - **Timecode**: `Timecode`, `FrameRate`, `ActiveFormat` — SMPTE
//!   frame arithmetic including drop-frame at 29.97 and 59.94 fps
//! - **Protocol**: `Command` and `Event` — the JSON envelopes the
//!   backend speaks, correlated by convention rather than request ids
//! - **Codec**: `EnvelopeCodec` for newline-delimited JSON framing via
//!   `tokio_util`
//! - **Network**: `Supervisor` — connect/announce/pump/reconnect loop
//!   with exponential backoff — plus the `DeckHandle` command side
//! - **State**: `TransportState` machine and the `ClipTable` mirror of
//!   the deck's clip list
//! - **Transcript**: `TranscriptFilter` for poll suppression and the
//!   one-shot disk-full alert
//! - **Router**: `EventRouter` — applies inbound events to state and
//!   turns user intents into commands
//! - **Error**: `ReelError` — typed, `thiserror`-based error hierarchy

pub mod codec;
pub mod error;
pub mod network;
pub mod protocol;
pub mod router;
pub mod state;
pub mod timecode;
pub mod transcript;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use codec::{EnvelopeCodec, MAX_LINE_LENGTH};
pub use error::ReelError;
pub use network::{
    Backoff, ConnectionInfo, DeckConnection, DeckHandle, LinkEvent, LinkRequest, Supervisor,
};
pub use protocol::{Command, Event};
pub use router::{EventRouter, UiEvent};
pub use state::{ClipSlot, ClipTable, Phase, StatusKind, TransportState};
pub use timecode::{ActiveFormat, FrameRate, Timecode};
pub use transcript::{TranscriptFilter, TranscriptOutcome, TranscriptView};
