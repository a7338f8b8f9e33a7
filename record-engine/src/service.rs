// Audited CRUD over disasters, reports, and resources
use std::sync::Arc;

use error_common::{ReliefError, Result};
use event_fanout::{ChangeEvent, ChangeSink, EntityKind, Operation};
use serde_json::json;
use serde_json::{Map, Value};
use store_layer::{tables, DurableStore, GeoPoint, NewRecord, Predicate, RecordPatch, StoredRecord};
use tracing::info;
use uuid::Uuid;

use crate::models::{
    entity_from_record, json_object, to_json, trail_of, AuditAction, AuditEntry, Disaster,
    DisasterPatch, NewDisaster, NewReport, NewResource, Report, ReportPatch, Resource,
    ResourcePatch, VerificationStatus,
};

/// The audited entity store. Validates, appends an audit entry, writes
/// through the durable store, and on success emits a change event.
///
/// Audit-trail appends are read-modify-write: two concurrent updates to
/// the same entity may lose one of the interleaved appends. Payload fields
/// are last-writer-wins; serializing updates per entity is the caller's
/// (or the store's row-locking) job.
pub struct RecordService {
    store: Arc<dyn DurableStore>,
    sink: Arc<dyn ChangeSink>,
}

impl RecordService {
    pub fn new(store: Arc<dyn DurableStore>, sink: Arc<dyn ChangeSink>) -> Self {
        Self { store, sink }
    }

    // ------------------------------------------------------------------
    // Disasters

    pub async fn create_disaster(&self, new: NewDisaster, actor_id: &str) -> Result<Disaster> {
        let title = required(new.title, "title")?;
        if let Some(location) = &new.location {
            location.validate()?;
        }
        let trail = vec![AuditEntry::new(AuditAction::Create, actor_id)];
        let data = json!({
            "title": title,
            "location_name": new.location_name,
            "description": new.description,
            "tags": new.tags,
            "owner_id": actor_id,
            "audit_trail": to_json(&trail)?,
        });

        let stored = self
            .store
            .insert(
                tables::DISASTERS,
                NewRecord {
                    disaster_id: None,
                    location: new.location,
                    data,
                },
            )
            .await?;
        let disaster: Disaster = entity_from_record(stored)?;

        info!(
            title = %disaster.title,
            owner_id = %disaster.owner_id,
            "Disaster created"
        );
        self.publish(EntityKind::Disaster, Operation::Create, to_json(&disaster)?);
        Ok(disaster)
    }

    pub async fn update_disaster(
        &self,
        id: Uuid,
        patch: DisasterPatch,
        actor_id: &str,
    ) -> Result<Disaster> {
        if let Some(location) = &patch.location {
            location.validate()?;
        }
        let mut fields = Map::new();
        set_if_some(&mut fields, "title", patch.title);
        set_if_some(&mut fields, "location_name", patch.location_name);
        set_if_some(&mut fields, "description", patch.description);
        if let Some(tags) = patch.tags {
            fields.insert("tags".to_string(), to_json(&tags)?);
        }

        let stored = self
            .apply_update(tables::DISASTERS, "disaster", id, fields, patch.location, actor_id)
            .await?;
        let disaster: Disaster = entity_from_record(stored)?;

        info!(id = %id, actor_id = actor_id, "Disaster updated");
        self.publish(EntityKind::Disaster, Operation::Update, to_json(&disaster)?);
        Ok(disaster)
    }

    pub async fn delete_disaster(&self, id: Uuid, actor_id: &str) -> Result<()> {
        let last = self
            .apply_delete(tables::DISASTERS, "disaster", id, actor_id)
            .await?;
        let disaster: Disaster = entity_from_record(last)?;
        info!(id = %id, actor_id = actor_id, "Disaster deleted");
        self.publish(EntityKind::Disaster, Operation::Delete, to_json(&disaster)?);
        Ok(())
    }

    /// Disasters newest-first, optionally restricted to a tag
    pub async fn list_disasters(&self, tag: Option<&str>) -> Result<Vec<Disaster>> {
        let mut predicates = Vec::new();
        if let Some(tag) = tag {
            predicates.push(Predicate::contains("tags", tag));
        }
        let records = self.store.query(tables::DISASTERS, &predicates).await?;
        records.into_iter().map(entity_from_record).collect()
    }

    pub async fn get_disaster(&self, id: Uuid) -> Result<Disaster> {
        let record = self
            .store
            .get(tables::DISASTERS, id)
            .await?
            .ok_or_else(|| ReliefError::not_found("disaster"))?;
        entity_from_record(record)
    }

    // ------------------------------------------------------------------
    // Reports

    pub async fn create_report(&self, new: NewReport, actor_id: &str) -> Result<Report> {
        let disaster_id = required_id(new.disaster_id, "disaster_id")?;
        let content = required(new.content, "content")?;
        let trail = vec![AuditEntry::new(AuditAction::Create, actor_id)];
        let data = json!({
            "disaster_id": disaster_id,
            "content": content,
            "image_url": new.image_url,
            "reporter_id": actor_id,
            "verification_status": VerificationStatus::Pending,
            "audit_trail": to_json(&trail)?,
        });

        let stored = self
            .store
            .insert(
                tables::REPORTS,
                NewRecord {
                    disaster_id: Some(disaster_id),
                    location: None,
                    data,
                },
            )
            .await?;
        let report: Report = entity_from_record(stored)?;

        info!(
            disaster_id = %disaster_id,
            reporter_id = actor_id,
            "Report created"
        );
        self.publish(EntityKind::Report, Operation::Create, to_json(&report)?);
        Ok(report)
    }

    pub async fn update_report(
        &self,
        id: Uuid,
        patch: ReportPatch,
        actor_id: &str,
    ) -> Result<Report> {
        let mut fields = Map::new();
        set_if_some(&mut fields, "content", patch.content);
        set_if_some(&mut fields, "image_url", patch.image_url);
        if let Some(status) = patch.verification_status {
            fields.insert("verification_status".to_string(), to_json(&status)?);
        }

        let stored = self
            .apply_update(tables::REPORTS, "report", id, fields, None, actor_id)
            .await?;
        let report: Report = entity_from_record(stored)?;

        info!(id = %id, actor_id = actor_id, "Report updated");
        self.publish(EntityKind::Report, Operation::Update, to_json(&report)?);
        Ok(report)
    }

    pub async fn delete_report(&self, id: Uuid, actor_id: &str) -> Result<()> {
        let last = self
            .apply_delete(tables::REPORTS, "report", id, actor_id)
            .await?;
        let report: Report = entity_from_record(last)?;
        info!(id = %id, actor_id = actor_id, "Report deleted");
        self.publish(EntityKind::Report, Operation::Delete, to_json(&report)?);
        Ok(())
    }

    /// Reports newest-first, optionally filtered by disaster and status
    pub async fn list_reports(
        &self,
        disaster_id: Option<Uuid>,
        status: Option<VerificationStatus>,
    ) -> Result<Vec<Report>> {
        let mut predicates = Vec::new();
        if let Some(disaster_id) = disaster_id {
            predicates.push(Predicate::eq("disaster_id", disaster_id.to_string()));
        }
        if let Some(status) = status {
            predicates.push(Predicate::eq("verification_status", status.as_str()));
        }
        let records = self.store.query(tables::REPORTS, &predicates).await?;
        records.into_iter().map(entity_from_record).collect()
    }

    // ------------------------------------------------------------------
    // Resources

    pub async fn create_resource(&self, new: NewResource, actor_id: &str) -> Result<Resource> {
        let disaster_id = required_id(new.disaster_id, "disaster_id")?;
        let name = required(new.name, "name")?;
        if let Some(location) = &new.location {
            location.validate()?;
        }
        let trail = vec![AuditEntry::new(AuditAction::Create, actor_id)];
        let data = json!({
            "disaster_id": disaster_id,
            "name": name,
            "location_name": new.location_name,
            "type": new.resource_type,
            "audit_trail": to_json(&trail)?,
        });

        let stored = self
            .store
            .insert(
                tables::RESOURCES,
                NewRecord {
                    disaster_id: Some(disaster_id),
                    location: new.location,
                    data,
                },
            )
            .await?;
        let resource: Resource = entity_from_record(stored)?;

        info!(
            disaster_id = %disaster_id,
            name = %resource.name,
            "Resource created"
        );
        self.publish(EntityKind::Resource, Operation::Create, to_json(&resource)?);
        Ok(resource)
    }

    pub async fn update_resource(
        &self,
        id: Uuid,
        patch: ResourcePatch,
        actor_id: &str,
    ) -> Result<Resource> {
        if let Some(location) = &patch.location {
            location.validate()?;
        }
        let mut fields = Map::new();
        set_if_some(&mut fields, "name", patch.name);
        set_if_some(&mut fields, "location_name", patch.location_name);
        set_if_some(&mut fields, "type", patch.resource_type);

        let stored = self
            .apply_update(tables::RESOURCES, "resource", id, fields, patch.location, actor_id)
            .await?;
        let resource: Resource = entity_from_record(stored)?;

        info!(id = %id, actor_id = actor_id, "Resource updated");
        self.publish(EntityKind::Resource, Operation::Update, to_json(&resource)?);
        Ok(resource)
    }

    pub async fn delete_resource(&self, id: Uuid, actor_id: &str) -> Result<()> {
        let last = self
            .apply_delete(tables::RESOURCES, "resource", id, actor_id)
            .await?;
        let resource: Resource = entity_from_record(last)?;
        info!(id = %id, actor_id = actor_id, "Resource deleted");
        self.publish(EntityKind::Resource, Operation::Delete, to_json(&resource)?);
        Ok(())
    }

    /// Resources newest-first, optionally filtered by disaster
    pub async fn list_resources(&self, disaster_id: Option<Uuid>) -> Result<Vec<Resource>> {
        let mut predicates = Vec::new();
        if let Some(disaster_id) = disaster_id {
            predicates.push(Predicate::eq("disaster_id", disaster_id.to_string()));
        }
        let records = self.store.query(tables::RESOURCES, &predicates).await?;
        records.into_iter().map(entity_from_record).collect()
    }

    // ------------------------------------------------------------------
    // Shared mutation plumbing

    /// Fetch, append an `update` entry to the observed trail, merge the
    /// patch fields, and persist
    async fn apply_update(
        &self,
        table: &str,
        kind_name: &str,
        id: Uuid,
        mut fields: Map<String, Value>,
        location: Option<GeoPoint>,
        actor_id: &str,
    ) -> Result<StoredRecord> {
        let current = self
            .store
            .get(table, id)
            .await?
            .ok_or_else(|| ReliefError::not_found(kind_name))?;
        let mut trail = trail_of(&current);
        trail.push(AuditEntry::new(AuditAction::Update, actor_id));
        fields.insert("audit_trail".to_string(), to_json(&trail)?);

        self.store
            .update(table, id, RecordPatch { fields, location })
            .await
    }

    /// Append a `delete` entry and persist it BEFORE the physical delete,
    /// so a failed delete still leaves the attempt on record. Returns the
    /// final record state for the emitted event.
    async fn apply_delete(
        &self,
        table: &str,
        kind_name: &str,
        id: Uuid,
        actor_id: &str,
    ) -> Result<StoredRecord> {
        let current = self
            .store
            .get(table, id)
            .await?
            .ok_or_else(|| ReliefError::not_found(kind_name))?;
        let mut trail = trail_of(&current);
        trail.push(AuditEntry::new(AuditAction::Delete, actor_id));

        let patch = RecordPatch {
            fields: json_object(json!({ "audit_trail": to_json(&trail)? })),
            location: None,
        };
        let last = self.store.update(table, id, patch).await?;
        self.store.delete(table, id).await?;
        Ok(last)
    }

    fn publish(&self, entity_kind: EntityKind, operation: Operation, payload: Value) {
        self.sink.publish(ChangeEvent {
            entity_kind,
            operation,
            payload,
        });
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ReliefError::validation(format!("{field} is required"))),
    }
}

fn required_id(value: Option<Uuid>, field: &str) -> Result<Uuid> {
    value.ok_or_else(|| ReliefError::validation(format!("{field} is required")))
}

fn set_if_some(fields: &mut Map<String, Value>, field: &str, value: Option<String>) {
    if let Some(value) = value {
        fields.insert(field.to_string(), Value::String(value));
    }
}
