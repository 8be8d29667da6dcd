//! Score Update Types
//!
//! The event carried from the notification channel to every viewer of a
//! match. The relay does not own the schema: the store emits whatever object
//! it likes as long as it carries a `matchId`, and viewers receive that
//! object unchanged. Typed accessors read the well-known fields leniently.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Match Identifier
// =============================================================================

/// Identifier of a match, as used for subscription routing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    /// Create a match id, rejecting blank input.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Match Status
// =============================================================================

/// Lifecycle status of a match as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// Fixture created, not started.
    Scheduled,
    /// In play.
    Live,
    /// Finished with a result.
    Completed,
    /// Started but abandoned (weather, light, ...).
    Abandoned,
    /// Called off before the start.
    Cancelled,
    /// Any status this build does not know about.
    #[serde(other)]
    Unknown,
}

impl MatchStatus {
    /// Whether no further score updates are expected.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned | Self::Cancelled)
    }
}

// =============================================================================
// Score Update Event
// =============================================================================

/// A score change for one match.
///
/// Cheap to clone: the payload is shared between every subscriber the event
/// is fanned out to.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreUpdateEvent {
    match_id: MatchId,
    payload: Arc<Map<String, Value>>,
}

impl ScoreUpdateEvent {
    /// Build an event from an already-parsed payload object.
    #[must_use]
    pub fn new(match_id: MatchId, payload: Map<String, Value>) -> Self {
        Self {
            match_id,
            payload: Arc::new(payload),
        }
    }

    /// The match this update belongs to.
    #[must_use]
    pub const fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    /// The raw payload object, exactly as emitted by the store.
    #[must_use]
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Opaque score document.
    #[must_use]
    pub fn score(&self) -> Option<&Value> {
        self.payload.get("score")
    }

    /// Match status, if present and a string.
    #[must_use]
    pub fn status(&self) -> Option<MatchStatus> {
        self.payload
            .get("status")
            .and_then(|v| MatchStatus::deserialize(v).ok())
    }

    /// Per-match version counter, if present.
    #[must_use]
    pub fn version(&self) -> Option<i64> {
        self.payload.get("version").and_then(Value::as_i64)
    }

    /// Time the store recorded the change, if present and RFC 3339.
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.payload
            .get("updatedAt")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Serialize the payload for the wire.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&*self.payload)
    }
}

impl Serialize for ScoreUpdateEvent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.payload.serialize(serializer)
    }
}

// =============================================================================
// Tests
// =============================================================================
