//! Default Configuration Values
//!
//! Defaults used by [`crate::types::HttpConfig`] and the telemetry helpers.

use std::time::Duration;

/// HTTP client default configurations
pub mod http {
    use super::*;

    /// Default request timeout for HTTP requests
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    /// Default connection timeout for establishing HTTP connections
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default User-Agent string for HTTP requests
    pub const USER_AGENT: &str = concat!("wirecall/", env!("CARGO_PKG_VERSION"));
}

/// Logging defaults
pub mod logging {
    /// Environment variable holding the log level (trace, debug, info, warn, error)
    pub const LEVEL_ENV: &str = "WIRECALL_LOG_LEVEL";

    /// Environment variable holding the output format (text, json, json-compact)
    pub const FORMAT_ENV: &str = "WIRECALL_LOG_FORMAT";

    /// Environment variable holding an optional log file path
    pub const FILE_ENV: &str = "WIRECALL_LOG_FILE";
}
