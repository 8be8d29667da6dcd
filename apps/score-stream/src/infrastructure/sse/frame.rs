//! Server-Sent Events Framing
//!
//! Wire encoding for session frames. Each frame ends with a blank line:
//!
//! ```text
//! data: {"matchId":"42","version":3,...}\n\n
//! : keep-alive\n\n
//! event: error\ndata: {"error":"..."}\n\n
//! ```

use axum::body::Bytes;
use serde_json::json;

use crate::application::services::session::SessionFrame;

/// Heartbeat comment frame.
pub const KEEP_ALIVE_FRAME: &[u8] = b": keep-alive\n\n";

/// Encode a session frame.
///
/// # Errors
///
/// Returns an error if an event payload cannot be serialized.
pub fn encode(frame: &SessionFrame) -> Result<Bytes, serde_json::Error> {
    match frame {
        SessionFrame::Event(event) => Ok(data_frame(&event.to_json()?)),
        SessionFrame::KeepAlive => Ok(Bytes::from_static(KEEP_ALIVE_FRAME)),
        SessionFrame::Error(message) => Ok(error_frame(message)),
    }
}

/// `data:` frame around an already-serialized single-line JSON document.
#[must_use]
pub fn data_frame(json: &str) -> Bytes {
    Bytes::from(format!("data: {json}\n\n"))
}

/// Named `error` event carrying `{"error": message}`.
#[must_use]
pub fn error_frame(message: &str) -> Bytes {
    Bytes::from(format!(
        "event: error\ndata: {}\n\n",
        json!({ "error": message })
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::domain::scoring::{MatchId, ScoreUpdateEvent};

    #[test]
    fn event_frame_carries_payload() {
        let Value::Object(map) = json!({"matchId": "7", "version": 2}) else {
            unreachable!()
        };
        let frame = SessionFrame::Event(ScoreUpdateEvent::new(MatchId::parse("7").unwrap(), map));

        let bytes = encode(&frame).unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();

        assert!(text.starts_with("data: "));
        assert!(text.ends_with("\n\n"));
        let body: Value = serde_json::from_str(&text["data: ".len()..text.len() - 2]).unwrap();
        assert_eq!(body, json!({"matchId": "7", "version": 2}));
    }

    #[test]
    fn keep_alive_frame() {
        assert_eq!(&encode(&SessionFrame::KeepAlive).unwrap()[..], b": keep-alive\n\n");
    }

    #[test]
    fn error_frame_escapes_message() {
        let bytes = error_frame("bad \"thing\"\nhappened");
        assert_eq!(
            &bytes[..],
            b"event: error\ndata: {\"error\":\"bad \\\"thing\\\"\\nhappened\"}\n\n"
        );
    }

    #[test]
    fn payload_newlines_stay_inside_one_data_line() {
        let Value::Object(map) = json!({"matchId": "1", "note": "line1\nline2"}) else {
            unreachable!()
        };
        let frame = SessionFrame::Event(ScoreUpdateEvent::new(MatchId::parse("1").unwrap(), map));
        let bytes = encode(&frame).unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert_eq!(text.matches('\n').count(), 2);
    }
}
