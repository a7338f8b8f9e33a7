// Proximity ranking of a disaster's resources
use std::sync::Arc;

use error_common::{ReliefError, Result};
use store_layer::{tables, DurableStore, GeoPoint};
use tracing::debug;
use uuid::Uuid;

use crate::models::{entity_from_record, Resource};

/// Ranks resources around a point using the store's native radius search.
/// The radius is always explicit here; the HTTP layer supplies its own
/// default.
pub struct GeoMatcher {
    store: Arc<dyn DurableStore>,
}

impl GeoMatcher {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self { store }
    }

    /// Resources of `disaster_id` within `radius_m` meters great-circle
    /// distance of `center`, nearest first
    pub async fn nearby(
        &self,
        disaster_id: Uuid,
        center: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<Resource>> {
        center.validate()?;
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(ReliefError::validation(format!(
                "radius must be a positive number of meters, got {radius_m}"
            )));
        }

        let records = self
            .store
            .geo_query(tables::RESOURCES, disaster_id, center, radius_m)
            .await?;
        debug!(
            disaster_id = %disaster_id,
            matches = records.len(),
            radius_m = radius_m,
            "proximity query"
        );
        records.into_iter().map(entity_from_record).collect()
    }
}
