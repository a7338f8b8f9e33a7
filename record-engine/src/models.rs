// Entity types and their audit-trail shape
use chrono::{DateTime, Utc};
use error_common::{ReliefError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use store_layer::{GeoPoint, StoredRecord};
use uuid::Uuid;

/// Action recorded by an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

/// One immutable step in an entity's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub actor_id: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(action: AuditAction, actor_id: &str) -> Self {
        Self {
            action,
            actor_id: actor_id.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Moderation state of a citizen report. Only an explicit status change
/// moves it; unrelated field updates leave it alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }
}

/// A disaster record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Disaster {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub owner_id: String,
    #[serde(default)]
    pub audit_trail: Vec<AuditEntry>,
    pub created_at: DateTime<Utc>,
}

/// A citizen or official report tied to a disaster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub disaster_id: Uuid,
    pub reporter_id: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub verification_status: VerificationStatus,
    #[serde(default)]
    pub audit_trail: Vec<AuditEntry>,
    pub created_at: DateTime<Utc>,
}

/// A relief resource (shelter, supply point, ...) tied to a disaster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub disaster_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub audit_trail: Vec<AuditEntry>,
    pub created_at: DateTime<Utc>,
}

/// Create request for a disaster; required fields are checked by the
/// service so a missing title surfaces as a validation error
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDisaster {
    pub title: Option<String>,
    pub location_name: Option<String>,
    pub location: Option<GeoPoint>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update for a disaster; omitted fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisasterPatch {
    pub title: Option<String>,
    pub location_name: Option<String>,
    pub location: Option<GeoPoint>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewReport {
    pub disaster_id: Option<Uuid>,
    pub content: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportPatch {
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub verification_status: Option<VerificationStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewResource {
    pub disaster_id: Option<Uuid>,
    pub name: Option<String>,
    pub location_name: Option<String>,
    pub location: Option<GeoPoint>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourcePatch {
    pub name: Option<String>,
    pub location_name: Option<String>,
    pub location: Option<GeoPoint>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
}

/// Rehydrate a typed entity from a stored record: the store-owned columns
/// (id, location, created_at, owning disaster) are folded back into the
/// data object before deserializing
pub(crate) fn entity_from_record<T: DeserializeOwned>(record: StoredRecord) -> Result<T> {
    let StoredRecord {
        id,
        disaster_id,
        location,
        mut data,
        created_at,
    } = record;
    let obj = data
        .as_object_mut()
        .ok_or_else(|| ReliefError::store("record data is not a JSON object"))?;
    obj.insert("id".to_string(), to_json(&id)?);
    obj.insert("location".to_string(), to_json(&location)?);
    obj.insert("created_at".to_string(), to_json(&created_at)?);
    if let Some(disaster_id) = disaster_id {
        obj.insert("disaster_id".to_string(), to_json(&disaster_id)?);
    }
    serde_json::from_value(data).map_err(|e| ReliefError::store(format!("corrupt record: {e}")))
}

/// Audit trail of a stored record, tolerating records created before the
/// trail field existed
pub(crate) fn trail_of(record: &StoredRecord) -> Vec<AuditEntry> {
    record
        .data
        .get("audit_trail")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| ReliefError::Internal(anyhow::anyhow!(e)))
}

pub(crate) fn json_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
