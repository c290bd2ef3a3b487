//! Client constants.
//!
//! Centralizes endpoint paths, magic numbers and wire formats.

/// Endpoint locations.
pub mod endpoints {
    /// Default API host.
    pub const DEFAULT_BASE_URL: &str = "https://api.elvanto.com";

    /// Browser-facing authorization path.
    pub const OAUTH_PATH: &str = "/oauth";

    /// Token exchange and refresh path.
    pub const TOKEN_PATH: &str = "/oauth/token";

    /// Versioned API prefix.
    pub const API_PATH: &str = "/v1/";
}

/// HTTP client settings.
pub mod http {
    /// Request timeout in seconds.
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Response envelope values.
pub mod envelope {
    /// Status value of a successful call.
    pub const STATUS_OK: &str = "ok";

    /// Error code the API returns for an expired access token.
    pub const TOKEN_EXPIRED_CODE: i64 = 121;

    /// Status returned in place of a response when a token expired and
    /// cannot be refreshed.
    pub const TOKEN_EXPIRED_STATUS: &str = "Token expired please renew";
}

/// Page sizes for list endpoints.
pub mod paging {
    /// Page size used when pulling the full people directory.
    pub const PEOPLE_PAGE_SIZE: u32 = 1000;

    /// Page size for the upcoming services query.
    pub const UPCOMING_SERVICES_PAGE_SIZE: u32 = 20;

    /// Page size for the single-day services query (API minimum is 10).
    pub const DAY_SERVICES_PAGE_SIZE: u32 = 10;
}

/// Service record settings.
pub mod services {
    /// Fields requested with every service query unless overridden.
    pub const DEFAULT_FIELDS: &[&str] = &["plans", "volunteers", "songs"];

    /// Wire format of a service date (UTC).
    pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Default window for upcoming services, in days.
    pub const DEFAULT_DAYS_AHEAD: i64 = 7;
}
