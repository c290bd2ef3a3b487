//! Elvanto API integration.
//!
//! Provides authentication, the API transport with token refresh, paginated
//! retrieval, and reshaping of service, roster and contact records.

/// API connection and transport
pub mod api;
/// OAuth and API-key authentication
pub mod auth;
/// Pagination over list endpoints
pub mod paging;
/// Contact directory
pub mod people;
/// Service queries
pub mod services;
/// Data types representing Elvanto records
pub mod types;

// Re-export key components
pub use api::Connection;
pub use auth::{AppType, Credentials, OAuthApp, Scope, TokenSet};
pub use services::ServiceQuery;
pub use types::{Contact, PlanItem, Service, Volunteers};
