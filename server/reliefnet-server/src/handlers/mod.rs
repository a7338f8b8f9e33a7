//! HTTP and WebSocket request handlers

pub mod disasters;
pub mod enrichment;
pub mod health;
pub mod reports;
pub mod resources;
pub mod websocket;
