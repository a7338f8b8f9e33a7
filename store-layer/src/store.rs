// The durable storage boundary consumed by the record layer
use async_trait::async_trait;
use error_common::Result;
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::record::{NewRecord, Predicate, RecordPatch, StoredRecord};

/// Table names known to the engine
pub mod tables {
    pub const DISASTERS: &str = "disasters";
    pub const REPORTS: &str = "reports";
    pub const RESOURCES: &str = "resources";

    pub const ALL: [&str; 3] = [DISASTERS, REPORTS, RESOURCES];
}

/// Transactional record storage with point and geospatial queries.
///
/// Ids are assigned by the store at insert time and never reused. Query
/// results come back newest-first by creation time; geo query results come
/// back nearest-first.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Persist a new record, returning it with id and created_at assigned
    async fn insert(&self, table: &str, record: NewRecord) -> Result<StoredRecord>;

    /// Point lookup by id
    async fn get(&self, table: &str, id: Uuid) -> Result<Option<StoredRecord>>;

    /// Merge the patch over the stored record and return the result.
    /// Fails with `NotFound` when the id is absent.
    async fn update(&self, table: &str, id: Uuid, patch: RecordPatch) -> Result<StoredRecord>;

    /// Physically remove a record. Fails with `NotFound` when absent.
    async fn delete(&self, table: &str, id: Uuid) -> Result<()>;

    /// Filtered scan, ordered by creation time, most recent first
    async fn query(&self, table: &str, predicates: &[Predicate]) -> Result<Vec<StoredRecord>>;

    /// Records of `disaster_id` whose point lies within `radius_m` meters
    /// of `center`, nearest first. Records without a location never match.
    async fn geo_query(
        &self,
        table: &str,
        disaster_id: Uuid,
        center: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<StoredRecord>>;
}
