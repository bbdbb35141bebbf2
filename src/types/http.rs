//! HTTP configuration for the default `reqwest` transport of a client.
//!
//! Durations are (de)serialized as fractional seconds, so `"timeout": 0.25`
//! is a 250ms request timeout and `"timeout": null` disables it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Settings used by [`crate::ClientBuilder::http_config`] to build a dedicated transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    #[serde(with = "secs_f64")]
    pub timeout: Option<Duration>,
    #[serde(with = "secs_f64")]
    pub connect_timeout: Option<Duration>,
    /// Sent with every request unless the request sets the same header.
    pub headers: HashMap<String, String>,
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
}

impl HttpConfig {
    /// A builder seeded with [`HttpConfig::default`].
    pub fn builder() -> HttpConfigBuilder {
        HttpConfigBuilder::default()
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Some(crate::defaults::http::REQUEST_TIMEOUT),
            connect_timeout: Some(crate::defaults::http::CONNECT_TIMEOUT),
            headers: HashMap::new(),
            proxy: None,
            user_agent: Some(crate::defaults::http::USER_AGENT.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpConfigBuilder {
    config: HttpConfig,
}

impl HttpConfigBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Leave request deadlines entirely to the call context.
    pub fn no_timeout(mut self) -> Self {
        self.config.timeout = None;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(name.into(), value.into());
        self
    }

    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.config.proxy = Some(url.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> HttpConfig {
        self.config
    }
}

mod secs_f64 {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&d.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(deserializer)?
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(D::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_partial_config_keeps_defaults() {
        let cfg: HttpConfig =
            serde_json::from_str(r#"{"timeout": 0.25, "headers": {"x-team": "core"}}"#).unwrap();
        assert_eq!(cfg.timeout, Some(Duration::from_millis(250)));
        assert_eq!(
            cfg.connect_timeout,
            Some(crate::defaults::http::CONNECT_TIMEOUT)
        );
        assert_eq!(cfg.headers.get("x-team").map(String::as_str), Some("core"));
    }

    #[test]
    fn null_timeout_disables_it() {
        let cfg: HttpConfig = serde_json::from_str(r#"{"timeout": null}"#).unwrap();
        assert_eq!(cfg.timeout, None);
    }

    #[test]
    fn negative_timeout_is_rejected() {
        let err = serde_json::from_str::<HttpConfig>(r#"{"connect_timeout": -1}"#).unwrap_err();
        assert!(err.to_string().contains("negative"), "{err}");
    }

    #[test]
    fn serializes_fractional_seconds() {
        let cfg = HttpConfig::builder()
            .timeout(Duration::from_millis(1500))
            .build();
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["timeout"], serde_json::json!(1.5));
    }

    #[test]
    fn builder_starts_from_defaults() {
        let cfg = HttpConfig::builder()
            .no_timeout()
            .header("a", "1")
            .user_agent("agent/1")
            .build();
        assert_eq!(cfg.timeout, None);
        assert_eq!(
            cfg.connect_timeout,
            Some(crate::defaults::http::CONNECT_TIMEOUT)
        );
        assert_eq!(cfg.headers.len(), 1);
        assert_eq!(cfg.user_agent.as_deref(), Some("agent/1"));
    }
}
