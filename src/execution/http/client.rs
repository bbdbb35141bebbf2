//! HTTP client builder utilities
//!
//! Builds the `reqwest::Client` used as the default transport from an
//! [`HttpConfig`].

use crate::error::EndpointError;
use crate::execution::http::headers::headers_from_pairs;
use crate::types::HttpConfig;

/// Build an HTTP client from HttpConfig
///
/// # Example
/// ```rust,ignore
/// use wirecall::types::HttpConfig;
/// use wirecall::execution::http::client::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default())?;
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<reqwest::Client, EndpointError> {
    let mut builder = reqwest::Client::builder();

    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(connect_timeout) = config.connect_timeout {
        builder = builder.connect_timeout(connect_timeout);
    }

    if let Some(proxy_url) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| EndpointError::ConfigurationError(format!("Invalid proxy URL: {e}")))?;
        builder = builder.proxy(proxy);
    }

    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent);
    }

    if !config.headers.is_empty() {
        builder = builder.default_headers(headers_from_pairs(&config.headers)?);
    }

    builder.build().map_err(|e| {
        EndpointError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_build_http_client_default() {
        let result = build_http_client(&HttpConfig::default());
        assert!(result.is_ok());
    }

    #[test]
    fn test_build_http_client_with_timeout() {
        let config = HttpConfig {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            ..Default::default()
        };
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn test_build_http_client_with_invalid_header_name() {
        let mut config = HttpConfig::default();
        config
            .headers
            .insert("Invalid Header Name".to_string(), "value".to_string());

        let err = build_http_client(&config).unwrap_err();
        assert!(matches!(err, EndpointError::ConfigurationError(_)));
    }

    #[test]
    fn test_build_http_client_with_invalid_proxy() {
        let config = HttpConfig {
            proxy: Some("::not a proxy::".to_string()),
            ..Default::default()
        };
        assert!(build_http_client(&config).is_err());
    }
}
