//! Line-oriented JSON framing for the control link.
//!
//! One envelope per `\n`-terminated line. Decodes inbound [`Event`]s
//! and encodes outbound [`Command`]s for use with
//! `tokio_util::codec::Framed`.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ReelError;
use crate::protocol::{Command, Event};

/// Longest line the codec will buffer before giving up on the link.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Codec for the client side of the deck control link.
#[derive(Debug, Default)]
pub struct EnvelopeCodec;

impl Decoder for EnvelopeCodec {
    type Item = Event;
    type Error = ReelError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Event>, ReelError> {
        loop {
            let Some(pos) = src.iter().position(|&b| b == b'\n') else {
                if src.len() > MAX_LINE_LENGTH {
                    return Err(ReelError::FrameTooLarge {
                        size: src.len(),
                        max: MAX_LINE_LENGTH,
                    });
                }
                return Ok(None);
            };

            let line = src.split_to(pos + 1);
            let mut line = &line[..pos];
            if line.ends_with(b"\r") {
                line = &line[..line.len() - 1];
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            return serde_json::from_slice(line).map(Some).map_err(ReelError::from);
        }
    }
}

impl Encoder<Command> for EnvelopeCodec {
    type Error = ReelError;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), ReelError> {
        let json = serde_json::to_vec(&item)?;
        dst.reserve(json.len() + 1);
        dst.extend_from_slice(&json);
        dst.put_u8(b'\n');
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(input: &[u8]) -> Vec<Event> {
        let mut codec = EnvelopeCodec;
        let mut buf = BytesMut::from(input);
        let mut out = Vec::new();
        while let Some(ev) = codec.decode(&mut buf).unwrap() {
            out.push(ev);
        }
        out
    }

    #[test]
    fn decodes_one_event_per_line() {
        let input = concat!(
            "{\"response\":\"clip_count\",\"params\":{\"count\":2}}\n",
            "{\"response\":\"stop\"}\n",
        );
        let events = decode_all(input.as_bytes());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], Event::ClipCount { count: 2 });
        assert_eq!(events[1], Event::Unknown);
    }

    #[test]
    fn buffers_partial_lines() {
        let mut codec = EnvelopeCodec;
        let mut buf = BytesMut::from(&b"{\"response\":\"clip_cou"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"nt\",\"params\":{\"count\":5}}\n");
        let ev = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(ev, Event::ClipCount { count: 5 });
    }

    #[test]
    fn tolerates_crlf_and_blank_lines() {
        let input = "\r\n\n{\"response\":\"clip_count\",\"params\":{\"count\":1}}\r\n";
        let events = decode_all(input.as_bytes());
        assert_eq!(events, vec![Event::ClipCount { count: 1 }]);
    }

    #[test]
    fn rejects_oversize_line() {
        let mut codec = EnvelopeCodec;
        let mut buf = BytesMut::from(vec![b'x'; MAX_LINE_LENGTH + 1].as_slice());
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, ReelError::FrameTooLarge { .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        let mut codec = EnvelopeCodec;
        let mut buf = BytesMut::from(&b"not json\n"[..]);
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, ReelError::Encoding(_)));
    }

    #[test]
    fn encodes_newline_terminated_json() {
        let mut codec = EnvelopeCodec;
        let mut buf = BytesMut::new();
        codec.encode(Command::Stop, &mut buf).unwrap();
        assert_eq!(&buf[..], b"{\"command\":\"stop\"}\n");

        buf.clear();
        codec
            .encode(Command::ClipSelect { id: 0 }, &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"{\"command\":\"clip_select\",\"params\":{\"id\":0}}\n");
    }
}
