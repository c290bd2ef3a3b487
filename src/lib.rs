//! `elvanto-ext` - `Elvanto` church-management API client.
//!
//! This crate wraps the `Elvanto` REST API: API-key and OAuth authentication
//! with token refresh, paginated retrieval, and reshaping of services, plans,
//! rosters and contacts into plain values with filtering helpers.

pub mod config;
pub mod constants;
pub mod elvanto;
pub mod error;
pub mod filters;
pub mod types;

pub use elvanto::{Connection, Credentials};
pub use error::{Error, Result};
