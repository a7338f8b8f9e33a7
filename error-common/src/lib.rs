//! Common error handling utilities for the ReliefNet engine
//!
//! This crate defines the shared error taxonomy used across all ReliefNet
//! modules so the HTTP boundary can map each failure class to an appropriate
//! response without inspecting message strings.
//!
//! # Error Categories
//!
//! - **Validation**: malformed or missing required input; never retried,
//!   surfaced to the caller as a client-side fault
//! - **NotFound**: a referenced entity is absent; client-side fault
//! - **Store / StoreTimeout**: durable-store failures; server-side faults.
//!   Reads are safe to retry, writes are not (the remote side may have
//!   partially applied them)
//! - **Provider / ProviderTimeout**: enrichment-provider failures;
//!   server-side faults, never cached

pub mod types;

pub use types::*;
