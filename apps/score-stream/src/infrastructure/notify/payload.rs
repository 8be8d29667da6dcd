//! Notification Payload Decoding
//!
//! Turns the text of one notification into a [`ScoreUpdateEvent`]. The
//! payload must be a JSON object with a `matchId`; a string id is used as
//! is, a numeric id is rendered in decimal. Everything else in the object is
//! carried through untouched.

use serde_json::Value;

use crate::domain::scoring::{MatchId, ScoreUpdateEvent};

/// Why a payload could not be turned into an event.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// Not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON, but not an object.
    #[error("payload is not a JSON object")]
    NotAnObject,

    /// No usable `matchId` field.
    #[error("payload has no matchId")]
    MissingMatchId,
}

/// Decode one notification payload.
///
/// # Errors
///
/// Returns [`PayloadError`] when the payload is not a JSON object with a
/// non-blank `matchId`.
pub fn parse_notification(raw: &str) -> Result<ScoreUpdateEvent, PayloadError> {
    let Value::Object(payload) = serde_json::from_str::<Value>(raw)? else {
        return Err(PayloadError::NotAnObject);
    };

    let match_id = match payload.get("matchId") {
        Some(Value::String(s)) => MatchId::parse(s),
        Some(Value::Number(n)) => MatchId::parse(&n.to_string()),
        _ => None,
    }
    .ok_or(PayloadError::MissingMatchId)?;

    Ok(ScoreUpdateEvent::new(match_id, payload))
}
