//! # Taskboard Shared Library
//!
//! This crate contains the record gateway, models and session handling used
//! by the Taskboard API server.
//!
//! ## Module Organization
//!
//! - `upstream`: Record service protocol, trait and implementations
//! - `gateway`: Per-entity adapters over the record service
//! - `models`: Typed records and field bag decoding per entity
//! - `fields`: Dual-key field bag and lenient record accessors
//! - `auth`: Session store and post-authentication navigation
//! - `timeout`: Per-call deadlines
//! - `error`: Gateway error types

pub mod auth;
pub mod error;
pub mod fields;
pub mod gateway;
pub mod models;
pub mod timeout;
pub mod upstream;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
