// In-process backend for local development and tests
use std::collections::HashMap;

use chrono::Utc;
use error_common::{ReliefError, Result};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::record::{NewRecord, Predicate, RecordPatch, StoredRecord};
use crate::store::{tables, DurableStore};

/// Durable store backed by process memory. Used when no `DATABASE_URL` is
/// configured and by the test suites; the radius search runs haversine over
/// all rows of the table.
#[derive(Default)]
pub struct MemoryStore {
    // Insertion order doubles as creation order, so newest-first scans are
    // reverse iteration.
    tables: RwLock<HashMap<String, Vec<StoredRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_table(table: &str) -> Result<()> {
    if tables::ALL.contains(&table) {
        Ok(())
    } else {
        Err(ReliefError::validation(format!("unknown table: {table}")))
    }
}

#[async_trait::async_trait]
impl DurableStore for MemoryStore {
    async fn insert(&self, table: &str, record: NewRecord) -> Result<StoredRecord> {
        check_table(table)?;
        if !record.data.is_object() {
            return Err(ReliefError::store("record data must be a JSON object"));
        }
        let stored = StoredRecord {
            id: Uuid::new_v4(),
            disaster_id: record.disaster_id,
            location: record.location,
            data: record.data,
            created_at: Utc::now(),
        };
        let mut tables = self.tables.write().await;
        tables
            .entry(table.to_string())
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn get(&self, table: &str, id: Uuid) -> Result<Option<StoredRecord>> {
        check_table(table)?;
        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .and_then(|rows| rows.iter().find(|r| r.id == id))
            .cloned())
    }

    async fn update(&self, table: &str, id: Uuid, patch: RecordPatch) -> Result<StoredRecord> {
        check_table(table)?;
        let mut tables = self.tables.write().await;
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| ReliefError::not_found(table))?;
        let record = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ReliefError::not_found(table))?;

        if let Some(obj) = record.data.as_object_mut() {
            for (field, value) in patch.fields {
                obj.insert(field, value);
            }
        }
        if let Some(location) = patch.location {
            record.location = Some(location);
        }
        Ok(record.clone())
    }

    async fn delete(&self, table: &str, id: Uuid) -> Result<()> {
        check_table(table)?;
        let mut tables = self.tables.write().await;
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| ReliefError::not_found(table))?;
        let before = rows.len();
        rows.retain(|r| r.id != id);
        if rows.len() == before {
            return Err(ReliefError::not_found(table));
        }
        Ok(())
    }

    async fn query(&self, table: &str, predicates: &[Predicate]) -> Result<Vec<StoredRecord>> {
        check_table(table)?;
        let tables = self.tables.read().await;
        let Some(rows) = tables.get(table) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .iter()
            .rev()
            .filter(|r| predicates.iter().all(|p| p.matches(r)))
            .cloned()
            .collect())
    }

    async fn geo_query(
        &self,
        table: &str,
        disaster_id: Uuid,
        center: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<StoredRecord>> {
        check_table(table)?;
        let tables = self.tables.read().await;
        let Some(rows) = tables.get(table) else {
            return Ok(Vec::new());
        };
        let mut matched: Vec<(f64, StoredRecord)> = rows
            .iter()
            .filter(|r| r.disaster_id == Some(disaster_id))
            .filter_map(|r| {
                let distance = r.location.as_ref()?.distance_m(&center);
                (distance <= radius_m).then(|| (distance, r.clone()))
            })
            .collect();
        matched.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(matched.into_iter().map(|(_, r)| r).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(data: Value) -> NewRecord {
        NewRecord {
            disaster_id: None,
            location: None,
            data,
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_round_trips() {
        let store = MemoryStore::new();
        let stored = store
            .insert(tables::DISASTERS, record(json!({"title": "Flood"})))
            .await
            .unwrap();
        let fetched = store.get(tables::DISASTERS, stored.id).await.unwrap();
        assert_eq!(fetched.unwrap().data["title"], "Flood");
    }

    #[tokio::test]
    async fn update_merges_only_listed_fields() {
        let store = MemoryStore::new();
        let stored = store
            .insert(
                tables::DISASTERS,
                record(json!({"title": "Flood", "description": "bad"})),
            )
            .await
            .unwrap();

        let patch = RecordPatch::new().set("title", json!("Flood - Updated"));
        let updated = store
            .update(tables::DISASTERS, stored.id, patch)
            .await
            .unwrap();
        assert_eq!(updated.data["title"], "Flood - Updated");
        assert_eq!(updated.data["description"], "bad");
    }

    #[tokio::test]
    async fn update_missing_id_is_not_found() {
        let store = MemoryStore::new();
        store
            .insert(tables::DISASTERS, record(json!({})))
            .await
            .unwrap();
        let err = store
            .update(tables::DISASTERS, Uuid::new_v4(), RecordPatch::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReliefError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_the_row() {
        let store = MemoryStore::new();
        let stored = store
            .insert(tables::REPORTS, record(json!({"content": "x"})))
            .await
            .unwrap();
        store.delete(tables::REPORTS, stored.id).await.unwrap();
        assert!(store
            .get(tables::REPORTS, stored.id)
            .await
            .unwrap()
            .is_none());
        let err = store.delete(tables::REPORTS, stored.id).await.unwrap_err();
        assert!(matches!(err, ReliefError::NotFound(_)));
    }

    #[tokio::test]
    async fn query_is_newest_first_and_filtered() {
        let store = MemoryStore::new();
        store
            .insert(
                tables::DISASTERS,
                record(json!({"title": "A", "tags": ["flood"]})),
            )
            .await
            .unwrap();
        store
            .insert(
                tables::DISASTERS,
                record(json!({"title": "B", "tags": ["fire"]})),
            )
            .await
            .unwrap();
        store
            .insert(
                tables::DISASTERS,
                record(json!({"title": "C", "tags": ["flood", "urgent"]})),
            )
            .await
            .unwrap();

        let all = store.query(tables::DISASTERS, &[]).await.unwrap();
        let titles: Vec<_> = all.iter().map(|r| r.data["title"].clone()).collect();
        assert_eq!(titles, vec![json!("C"), json!("B"), json!("A")]);

        let floods = store
            .query(tables::DISASTERS, &[Predicate::contains("tags", "flood")])
            .await
            .unwrap();
        assert_eq!(floods.len(), 2);
        assert_eq!(floods[0].data["title"], "C");
    }

    #[tokio::test]
    async fn geo_query_scopes_by_disaster_and_radius() {
        let store = MemoryStore::new();
        let disaster = Uuid::new_v4();
        let other = Uuid::new_v4();
        let center = GeoPoint { lat: 40.7, lng: -74.0 };

        let near = NewRecord {
            disaster_id: Some(disaster),
            location: Some(GeoPoint { lat: 40.71, lng: -74.0 }),
            data: json!({"name": "near"}),
        };
        let far = NewRecord {
            disaster_id: Some(disaster),
            location: Some(GeoPoint { lat: 41.7, lng: -74.0 }),
            data: json!({"name": "far"}),
        };
        let wrong_disaster = NewRecord {
            disaster_id: Some(other),
            location: Some(center),
            data: json!({"name": "other"}),
        };
        let no_location = NewRecord {
            disaster_id: Some(disaster),
            location: None,
            data: json!({"name": "nowhere"}),
        };
        for r in [near, far, wrong_disaster, no_location] {
            store.insert(tables::RESOURCES, r).await.unwrap();
        }

        let hits = store
            .geo_query(tables::RESOURCES, disaster, center, 10_000.0)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].data["name"], "near");
    }
}
