//! services/dashboard/src/adapters/convert.rs
//!
//! Turns store-native and wire representations into canonical values.
//! A value that cannot be converted becomes `None` for that record only.

use bson::{oid::ObjectId, Bson};
use chrono::{DateTime, NaiveDateTime, Utc};
use practice_diff_core::domain::EntityId;
use serde_json::Value;
use tracing::warn;

pub fn entity_id_from_object_id(oid: &ObjectId) -> EntityId {
    EntityId::from_bytes(oid.bytes())
}

pub fn object_id_from_entity_id(id: &EntityId) -> ObjectId {
    ObjectId::from_bytes(id.bytes())
}

/// A store reference: a native ObjectId, or a hex string left by older writers.
pub fn entity_id_from_bson(value: Option<&Bson>) -> Option<EntityId> {
    match value? {
        Bson::ObjectId(oid) => Some(entity_id_from_object_id(oid)),
        Bson::String(raw) => parse_reference(raw),
        Bson::Null => None,
        other => {
            warn!(reference = %other, "Unconvertible store reference");
            None
        }
    }
}

/// A wire reference: a hex string or an extended-JSON `{"$oid": "..."}`.
pub fn entity_id_from_json(value: &Value) -> Option<EntityId> {
    match value {
        Value::String(raw) => parse_reference(raw),
        Value::Object(map) => match map.get("$oid") {
            Some(Value::String(raw)) => parse_reference(raw),
            _ => {
                warn!(reference = %value, "Unconvertible wire reference");
                None
            }
        },
        Value::Null => None,
        other => {
            warn!(reference = %other, "Unconvertible wire reference");
            None
        }
    }
}

fn parse_reference(raw: &str) -> Option<EntityId> {
    match raw.parse() {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(error = %e, "Unconvertible reference");
            None
        }
    }
}

pub fn timestamp_from_bson(value: Option<&Bson>) -> Option<DateTime<Utc>> {
    match value? {
        Bson::DateTime(dt) => Some(dt.to_chrono()),
        Bson::String(raw) => parse_timestamp(raw),
        _ => None,
    }
}

/// RFC 3339, or a naive ISO-8601 timestamp read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .ok()
}
