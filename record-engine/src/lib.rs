//! Audited entity store for the ReliefNet engine
//!
//! Owns the mutation path for disasters, reports, and relief resources.
//! Every record embeds its own append-only audit trail: each successful
//! create, update, or delete appends exactly one [`AuditEntry`] before the
//! mutation counts as durable, and a delete persists its trail entry before
//! the row is physically removed so the final history survives into the
//! emitted change event.
//!
//! Successful mutations are published to a [`event_fanout::ChangeSink`];
//! delivery is best-effort and never delays or fails the mutation itself.
//!
//! [`GeoMatcher`] ranks a disaster's resources around a point using the
//! store's native radius search.

pub mod geo;
pub mod models;
pub mod service;

pub use geo::GeoMatcher;
pub use models::{
    AuditAction, AuditEntry, Disaster, DisasterPatch, NewDisaster, NewReport, NewResource, Report,
    ReportPatch, Resource, ResourcePatch, VerificationStatus,
};
pub use service::RecordService;
