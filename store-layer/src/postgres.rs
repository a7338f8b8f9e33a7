// Postgres + PostGIS backend
use std::future::Future;
use std::time::Duration;

use error_common::{ReliefError, Result};
use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{info, warn};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::record::{NewRecord, Predicate, RecordPatch, StoredRecord};
use crate::store::{tables, DurableStore};

const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(10);

/// Columns shared by every entity table; the geography column is split back
/// into a lat/lng pair on the way out
const SELECT_COLUMNS: &str = "id, disaster_id, data, \
     ST_Y(location::geometry) AS lat, ST_X(location::geometry) AS lng, created_at";

/// Durable store backed by Postgres with PostGIS for radius search
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    op_timeout: Duration,
}

impl PostgresStore {
    /// Create a connection pool against the given database URL
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(50)
            .min_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(database_url)
            .await
            .map_err(|e| ReliefError::store(format!("connection failed: {e}")))?;

        info!("Database connection pool created");

        Ok(Self {
            pool,
            op_timeout: DEFAULT_OP_TIMEOUT,
        })
    }

    /// Wrap an existing pool, mainly for integration tests
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    /// Override the per-operation deadline
    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check that the database answers a trivial query
    pub async fn is_healthy(&self) -> bool {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Database health check failed: {}", e);
                false
            }
        }
    }

    /// Run a store operation under the configured deadline. A deadline miss
    /// is reported distinctly so callers know the write may have landed.
    async fn bounded<T>(
        &self,
        op: impl Future<Output = std::result::Result<T, sqlx::Error>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.op_timeout, op).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ReliefError::store(e.to_string())),
            Err(_) => Err(ReliefError::StoreTimeout(self.op_timeout)),
        }
    }
}

fn check_table(table: &str) -> Result<()> {
    if tables::ALL.contains(&table) {
        Ok(())
    } else {
        Err(ReliefError::validation(format!("unknown table: {table}")))
    }
}

fn record_from_row(row: &PgRow) -> std::result::Result<StoredRecord, sqlx::Error> {
    let lat: Option<f64> = row.try_get("lat")?;
    let lng: Option<f64> = row.try_get("lng")?;
    let location = match (lat, lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
        _ => None,
    };
    Ok(StoredRecord {
        id: row.try_get("id")?,
        disaster_id: row.try_get("disaster_id")?,
        location,
        data: row.try_get("data")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait::async_trait]
impl DurableStore for PostgresStore {
    async fn insert(&self, table: &str, record: NewRecord) -> Result<StoredRecord> {
        check_table(table)?;
        let sql = format!(
            "INSERT INTO {table} (disaster_id, data, location) \
             VALUES ($1, $2, ST_GeogFromText($3)) \
             RETURNING {SELECT_COLUMNS}"
        );
        let ewkt = record.location.as_ref().map(GeoPoint::to_ewkt);
        let row = self
            .bounded(
                sqlx::query(&sql)
                    .bind(record.disaster_id)
                    .bind(&record.data)
                    .bind(ewkt)
                    .fetch_one(&self.pool),
            )
            .await?;
        record_from_row(&row).map_err(|e| ReliefError::store(e.to_string()))
    }

    async fn get(&self, table: &str, id: Uuid) -> Result<Option<StoredRecord>> {
        check_table(table)?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM {table} WHERE id = $1");
        let row = self
            .bounded(sqlx::query(&sql).bind(id).fetch_optional(&self.pool))
            .await?;
        row.as_ref()
            .map(record_from_row)
            .transpose()
            .map_err(|e| ReliefError::store(e.to_string()))
    }

    async fn update(&self, table: &str, id: Uuid, patch: RecordPatch) -> Result<StoredRecord> {
        check_table(table)?;
        let sql = format!(
            "UPDATE {table} \
             SET data = data || $2, location = COALESCE(ST_GeogFromText($3), location) \
             WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        );
        let ewkt = patch.location.as_ref().map(GeoPoint::to_ewkt);
        let row = self
            .bounded(
                sqlx::query(&sql)
                    .bind(id)
                    .bind(Value::Object(patch.fields))
                    .bind(ewkt)
                    .fetch_optional(&self.pool),
            )
            .await?;
        match row {
            Some(row) => record_from_row(&row).map_err(|e| ReliefError::store(e.to_string())),
            None => Err(ReliefError::not_found(table)),
        }
    }

    async fn delete(&self, table: &str, id: Uuid) -> Result<()> {
        check_table(table)?;
        let sql = format!("DELETE FROM {table} WHERE id = $1");
        let result = self
            .bounded(sqlx::query(&sql).bind(id).execute(&self.pool))
            .await?;
        if result.rows_affected() == 0 {
            Err(ReliefError::not_found(table))
        } else {
            Ok(())
        }
    }

    async fn query(&self, table: &str, predicates: &[Predicate]) -> Result<Vec<StoredRecord>> {
        check_table(table)?;
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {SELECT_COLUMNS} FROM {table} WHERE TRUE"));
        for predicate in predicates {
            match predicate {
                Predicate::Eq { field, value } => {
                    qb.push(" AND data->>");
                    qb.push_bind(field.clone());
                    qb.push(" = ");
                    qb.push_bind(value.clone());
                }
                Predicate::Contains { field, value } => {
                    qb.push(" AND data->");
                    qb.push_bind(field.clone());
                    qb.push(" @> ");
                    qb.push_bind(serde_json::json!([value]));
                }
            }
        }
        qb.push(" ORDER BY created_at DESC");

        let rows = self.bounded(qb.build().fetch_all(&self.pool)).await?;
        rows.iter()
            .map(record_from_row)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ReliefError::store(e.to_string()))
    }

    async fn geo_query(
        &self,
        table: &str,
        disaster_id: Uuid,
        center: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<StoredRecord>> {
        check_table(table)?;
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM {table} \
             WHERE disaster_id = $1 AND location IS NOT NULL \
               AND ST_DWithin(location, ST_GeogFromText($2), $3) \
             ORDER BY ST_Distance(location, ST_GeogFromText($2)) ASC"
        );
        let rows = self
            .bounded(
                sqlx::query(&sql)
                    .bind(disaster_id)
                    .bind(center.to_ewkt())
                    .bind(radius_m)
                    .fetch_all(&self.pool),
            )
            .await?;
        rows.iter()
            .map(record_from_row)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ReliefError::store(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A lazy pool never touches the network, so the deadline logic can be
    // exercised without a database.
    #[tokio::test]
    async fn deadline_miss_surfaces_as_store_timeout() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/unreachable")
            .unwrap();
        let store = PostgresStore::from_pool(pool).with_op_timeout(Duration::from_millis(20));

        let err = store
            .bounded(std::future::pending::<std::result::Result<(), sqlx::Error>>())
            .await
            .unwrap_err();
        assert!(matches!(err, ReliefError::StoreTimeout(_)));
        if let ReliefError::StoreTimeout(timeout) = err {
            assert_eq!(timeout, Duration::from_millis(20));
        }
    }
}
