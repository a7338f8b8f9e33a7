// Record and filter types shared by all store backends
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::geo::GeoPoint;

/// A record as returned by the store, with the store-assigned id and
/// creation timestamp attached
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: Uuid,
    /// Owning disaster, where the table has one (reports, resources)
    pub disaster_id: Option<Uuid>,
    pub location: Option<GeoPoint>,
    /// Entity-specific fields as a JSON object
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

/// Input for an insert; the store assigns id and created_at
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub disaster_id: Option<Uuid>,
    pub location: Option<GeoPoint>,
    pub data: Value,
}

/// A partial update: listed fields overwrite their counterparts in the
/// stored data object, everything else is left untouched. The location is
/// only replaced when one is supplied.
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub fields: Map<String, Value>,
    pub location: Option<GeoPoint>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field to overwrite
    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn with_location(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }
}

/// Query predicate over the data object of a record
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Field equals the given text value
    Eq { field: String, value: String },
    /// Field is an array containing the given text value
    Contains { field: String, value: String },
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Evaluate against a record's data object
    pub fn matches(&self, record: &StoredRecord) -> bool {
        let Some(obj) = record.data.as_object() else {
            return false;
        };
        match self {
            Self::Eq { field, value } => obj.get(field).is_some_and(|v| match v {
                Value::String(s) => s == value,
                other => other.to_string() == *value,
            }),
            Self::Contains { field, value } => obj
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.iter().any(|v| v.as_str() == Some(value))),
        }
    }
}
