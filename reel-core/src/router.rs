//! Event router and command dispatcher.
//!
//! Classifies inbound envelopes by response kind and applies them to
//! the transport state machine, the clip table, and the transcript
//! filter; turns user intents into outbound command envelopes. All
//! state lives here and is mutated only from this router's callback
//! context — one logical thread of control, no locking.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::network::{DeckHandle, LinkEvent};
use crate::protocol::{ClipInfoParams, Command, Event, StatusParams, TranscriptParams};
use crate::state::{ClipTable, StatusEffect, TransportState};
use crate::timecode::{drop_frame_hint, Timecode};
use crate::transcript::TranscriptFilter;

/// Settle delay between a slot change and the follow-up clip refresh.
/// An explicit timer, not a retry — it is never cancelled, and a stale
/// refresh landing after newer state is harmless.
pub const SLOT_SETTLE: Duration = Duration::from_millis(500);

// ── UI events ────────────────────────────────────────────────────

/// Everything the rendering layer consumes. The core pushes these and
/// never looks back; the renderer is a pure sink.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    LinkUp,
    LinkDown {
        reason: String,
    },
    /// Transport state display line, e.g. `play [01:00:10;00]`.
    StateLine(String),
    /// In-clip position moved.
    Position {
        current: Timecode,
        duration: Timecode,
    },
    /// The clip list was rebuilt with `count` placeholder entries.
    ClipListReset {
        count: usize,
        selected: Option<usize>,
    },
    /// One clip entry resolved.
    ClipUpdated {
        index: usize,
        label: String,
    },
    ClipSelected {
        index: usize,
    },
    /// Deck network address, informational passthrough.
    Network {
        host: String,
        port: u16,
    },
    /// A user-visible command/response exchange.
    Transcript {
        sent: String,
        received: String,
    },
    /// The deck's storage is exhausted. At most once per connection.
    DiskFull,
    /// A backend-reported error, user-visible.
    Error {
        message: String,
    },
}

// ── EventRouter ──────────────────────────────────────────────────

/// Owns the synchronized state and the outbound handle.
#[derive(Debug)]
pub struct EventRouter {
    transport: TransportState,
    clips: ClipTable,
    transcript: TranscriptFilter,
    /// Armed by a post-recording refresh: when the rebuilt clip list
    /// arrives, select its newest entry.
    select_newest_on_count: bool,
    deck: DeckHandle,
    ui: mpsc::UnboundedSender<UiEvent>,
}

impl EventRouter {
    pub fn new(deck: DeckHandle) -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (ui, ui_rx) = mpsc::unbounded_channel();
        (
            Self {
                transport: TransportState::new(),
                clips: ClipTable::new(),
                transcript: TranscriptFilter::new(),
                select_newest_on_count: false,
                deck,
                ui,
            },
            ui_rx,
        )
    }

    pub fn transport(&self) -> &TransportState {
        &self.transport
    }

    pub fn clips(&self) -> &ClipTable {
        &self.clips
    }

    fn emit(&self, event: UiEvent) {
        if self.ui.send(event).is_err() {
            // Renderer gone; nothing useful left to do with the event.
            trace!("ui receiver dropped");
        }
    }

    // ── Link lifecycle ───────────────────────────────────────────

    pub fn handle_link(&mut self, link: LinkEvent) {
        match link {
            LinkEvent::Open => {
                // Fresh session: tear down everything the old
                // connection established, then resynchronize.
                self.transport.reset();
                self.transcript.reset();
                self.select_newest_on_count = false;
                self.emit(UiEvent::LinkUp);
                self.deck.send(Command::Refresh);
                self.deck.send(Command::GetNetwork);
            }
            LinkEvent::Inbound(event) => self.handle_event(event),
            LinkEvent::Closed { reason } => {
                self.emit(UiEvent::LinkDown { reason });
            }
        }
    }

    // ── Inbound routing ──────────────────────────────────────────

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::ClipCount { count } => self.on_clip_count(count),
            Event::ClipInfo(params) => self.on_clip_info(params),
            Event::Status(params) => self.on_status(&params),
            Event::Transcript(params) => self.on_transcript(&params),
            Event::Network(params) => self.emit(UiEvent::Network {
                host: params.host,
                port: params.port,
            }),
            Event::RequestError { message } => {
                // Connection-level failure: surface it, then drop the
                // link so the reconnect resynchronizes from scratch.
                self.emit(UiEvent::Error { message });
                self.deck.reset_link();
            }
            Event::ResponseError { message } => {
                self.emit(UiEvent::Error { message });
            }
            Event::Unknown => trace!("ignoring unrecognized response"),
        }
    }

    fn on_clip_count(&mut self, count: usize) {
        self.clips.rebuild(count);

        if self.select_newest_on_count {
            self.select_newest_on_count = false;
            if let Some(newest) = self.clips.newest() {
                self.select_clip(newest);
            }
        }

        self.emit(UiEvent::ClipListReset {
            count,
            selected: self.clips.selected(),
        });
    }

    fn on_clip_info(&mut self, params: ClipInfoParams) {
        // The clip's own strings decide drop mode; the active rate
        // supplies the counting base.
        let format = *self.transport.format();
        let parse = |s: &str| match Timecode::parse(s, format.rate, drop_frame_hint(s)) {
            Ok(tc) => Some(tc),
            Err(e) => {
                debug!("unparseable clip timecode: {e}");
                None
            }
        };

        let starting = parse(&params.timecode);
        let duration = parse(&params.duration);
        match self.clips.fill(params.id, params.name, starting, duration) {
            Some(index) => {
                let label = self
                    .clips
                    .get(index)
                    .map(|slot| slot.label(index))
                    .unwrap_or_default();
                self.emit(UiEvent::ClipUpdated { index, label });
            }
            None => warn!("clip_info with wire id 0 dropped"),
        }
    }

    fn on_status(&mut self, params: &StatusParams) {
        for effect in self.transport.apply_status(params) {
            match effect {
                StatusEffect::StateLine(line) => self.emit(UiEvent::StateLine(line)),
                StatusEffect::Position { current, duration } => {
                    self.emit(UiEvent::Position { current, duration });
                }
                StatusEffect::RefreshClips => {
                    self.select_newest_on_count = true;
                    self.deck.send(Command::ClipRefresh);
                }
            }
        }
    }

    fn on_transcript(&mut self, params: &TranscriptParams) {
        let outcome = self.transcript.apply(params);

        if let Some(hint) = &outcome.timecode_hint {
            self.transport.format_mut().apply_timecode_hint(hint);
        }
        if let Some(format) = &outcome.video_format_hint {
            self.transport.format_mut().apply_video_format(format);
        }
        if outcome.disk_full_alert {
            self.emit(UiEvent::DiskFull);
        }
        if let Some(view) = outcome.view {
            self.emit(UiEvent::Transcript {
                sent: view.sent,
                received: view.received,
            });
        }
    }

    // ── User intents (the dispatcher surface) ────────────────────

    /// Poll the transport status now; the resulting transcript is
    /// user-initiated and therefore visible.
    pub fn refresh_state(&mut self) {
        self.transcript.request_shown();
        self.deck.send(Command::StateRefresh);
    }

    /// Re-enumerate the clip list on the user's behalf.
    pub fn refresh_clips(&mut self) {
        self.transcript.request_shown();
        self.deck.send(Command::ClipRefresh);
    }

    /// Select a clip by local index. Stops the transport first if it is
    /// rolling; resets the jog guard state for the new bounds.
    pub fn select_clip(&mut self, index: usize) {
        if self.transport.phase().is_rolling() {
            self.stop();
        }

        let Some(slot) = self.clips.select(index).cloned() else {
            debug!("clip selection out of range: {index}");
            return;
        };
        self.transport.select_clip(&slot);
        self.deck.send(Command::ClipSelect { id: index });
        self.emit(UiEvent::ClipSelected { index });
        self.emit(UiEvent::Position {
            current: self.transport.position().clone(),
            duration: self.transport.bounds().duration.clone(),
        });
    }

    /// User scrub to an in-clip frame. The update goes through the same
    /// guard as device-driven positions; a rejected update sends
    /// nothing — the input layer retries on its own schedule.
    pub fn jog_to_frame(&mut self, frames: i64) {
        if !self.transport.try_update_position(frames, true) {
            return;
        }
        let timecode = self.transport.absolute_timecode().to_string();
        self.deck.send(Command::ClipJog { timecode });
        self.emit(UiEvent::Position {
            current: self.transport.position().clone(),
            duration: self.transport.bounds().duration.clone(),
        });
    }

    pub fn previous_clip(&mut self) {
        self.deck.send(Command::ClipPrevious);
        if let Some(selected) = self.clips.selected() {
            if selected > 0 {
                self.apply_local_selection(selected - 1);
            }
        }
    }

    pub fn next_clip(&mut self) {
        self.deck.send(Command::ClipNext);
        if let Some(selected) = self.clips.selected() {
            if selected + 1 < self.clips.len() {
                self.apply_local_selection(selected + 1);
            }
        }
    }

    /// Track a selection the deck is making on its own (previous/next
    /// commands move the deck cursor server-side).
    fn apply_local_selection(&mut self, index: usize) {
        if let Some(slot) = self.clips.select(index).cloned() {
            self.transport.select_clip(&slot);
            self.emit(UiEvent::ClipSelected { index });
        }
    }

    pub fn play(&mut self, looped: bool, single: bool, speed: f64) {
        self.deck.send(Command::Play {
            r#loop: looped,
            single,
            speed,
        });
    }

    pub fn stop(&mut self) {
        self.deck.send(Command::Stop);
    }

    pub fn record_named(&mut self, clip_name: String) {
        self.deck.send(Command::RecordNamed { clip_name });
    }

    /// Switch storage slot, then refresh the clip list after the media
    /// settles. The debounce timer is never cancelled; a stale refresh
    /// after newer state is tolerated by design.
    pub fn select_slot(&mut self, slot: u32) {
        self.deck.send(Command::SlotSelect { slot });
        let deck = self.deck.clone();
        tokio::spawn(async move {
            tokio::time::sleep(SLOT_SETTLE).await;
            deck.send(Command::ClipRefresh);
        });
    }

    pub fn slot_info(&mut self, slot: Option<u32>) {
        self.deck.send(Command::SlotInfo { slot });
    }

    pub fn update_network(&mut self, host: String, port: u16) {
        self.deck.send(Command::UpdateNetwork { host, port });
    }
}
