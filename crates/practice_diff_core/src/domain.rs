//! crates/practice_diff_core/src/domain.rs
//!
//! Defines the pure, core records that both read paths are normalized into.
//! These structs are independent of the document store and of the wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ports::PortError;

//=========================================================================================
// Canonical Identifier
//=========================================================================================

/// The canonical key of any entity, whichever backend it came from.
///
/// Twelve raw bytes, rendered as 24 lowercase hex characters. Store-native
/// keys and wire strings are both converted into this before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId([u8; 12]);

impl EntityId {
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for EntityId {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s.trim(), &mut bytes)
            .map_err(|_| PortError::MalformedReference(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for EntityId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

//=========================================================================================
// Records
//=========================================================================================

/// A student as listed by the store. Owned upstream; read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: EntityId,
    pub display_name: Option<String>,
    /// The address exchanged for an API credential.
    pub contact: Option<String>,
}

/// Per-student practice counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingRights {
    pub daily_story_practice: Option<i64>,
}

/// An assignment with its story reference resolved to a title.
///
/// `started` and `deducts_practice_rights` are only projected for incomplete
/// assignments and stay `None` for completed ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub story_id: Option<EntityId>,
    pub story_title: Option<String>,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub started: Option<bool>,
    pub deducts_practice_rights: Option<bool>,
}

/// One entry of a student's suggestion history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedStory {
    pub story_id: Option<EntityId>,
    pub story_title: Option<String>,
}

/// An opaque bearer credential returned by the API's login exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep tokens out of logs.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(..)")
    }
}
