//! Durable record storage for the ReliefNet engine
//!
//! This crate defines the [`DurableStore`] boundary the rest of the engine
//! writes through: transactional point lookups plus a native radius search
//! over geographic points. Entity payloads travel as JSON objects so the
//! store stays agnostic of entity shapes; the audited record layer owns
//! typing and validation.
//!
//! Two backends are provided:
//!
//! - [`PostgresStore`]: sqlx + PostGIS, the production backend
//!   (see `migrations/0001_schema.sql` for the expected DDL)
//! - [`MemoryStore`]: in-process backend for local development and tests,
//!   with a haversine implementation of the radius search
//!
//! Every Postgres operation is bounded by a timeout; a deadline miss is
//! surfaced as `ReliefError::StoreTimeout`, distinct from other store
//! failures, so callers can decide whether a retry is safe.

pub mod geo;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use geo::GeoPoint;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use record::{NewRecord, Predicate, RecordPatch, StoredRecord};
pub use store::{tables, DurableStore};
