//! HTTP Headers Utility
//!
//! Header capability for request values and helpers for building header maps
//! from plain string configuration.

use crate::error::EndpointError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;

/// Request values that carry their own headers.
///
/// Encoders that accept `Req: HeaderSource` copy these onto the wire request
/// (see [`crate::codec::encode_json_request_with_headers`]).
pub trait HeaderSource {
    fn headers(&self) -> HeaderMap;
}

/// Copy every header in `extra` into `target`, replacing existing values of
/// the same name. Multi-valued headers keep all their values.
pub fn apply_headers(target: &mut HeaderMap, extra: &HeaderMap) {
    for name in extra.keys() {
        target.remove(name);
        for value in extra.get_all(name) {
            target.append(name.clone(), value.clone());
        }
    }
}

/// Build a `HeaderMap` from name/value strings.
pub fn headers_from_pairs(pairs: &HashMap<String, String>) -> Result<HeaderMap, EndpointError> {
    let mut headers = HeaderMap::with_capacity(pairs.len());
    for (key, value) in pairs {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            EndpointError::ConfigurationError(format!("Invalid header name '{key}': {e}"))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            EndpointError::ConfigurationError(format!("Invalid header value for '{key}': {e}"))
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}
