//! JSON request encoding and response decoding

use crate::context::CallContext;
use crate::error::BoxError;
use crate::execution::http::{HeaderSource, WireRequest, WireResponse, apply_headers};
use crate::execution::response::ResponseDecoder;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use thiserror::Error;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Serialize `value` as the JSON request body.
pub fn encode_json_request<Req: Serialize>(
    _ctx: &CallContext,
    request: &mut WireRequest,
    value: Req,
) -> Result<(), BoxError> {
    request
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    let body = serde_json::to_vec(&value)?;
    *request.body_mut() = Some(body.into());
    Ok(())
}

/// Like [`encode_json_request`], then copies the headers carried by the value.
/// Headers from the value replace headers of the same name, `Content-Type` included.
pub fn encode_json_request_with_headers<Req: Serialize + HeaderSource>(
    ctx: &CallContext,
    request: &mut WireRequest,
    value: Req,
) -> Result<(), BoxError> {
    let extra = value.headers();
    encode_json_request(ctx, request, value)?;
    apply_headers(request.headers_mut(), &extra);
    Ok(())
}

/// Non-success status returned by the server.
#[derive(Debug, Error)]
#[error("unexpected status {status}: {body}")]
pub struct StatusError {
    pub status: u16,
    pub body: String,
}

/// Read the whole body and deserialize it as JSON.
///
/// A non-2xx status yields a [`StatusError`] carrying the body text.
pub async fn decode_json_response<T: DeserializeOwned>(
    _ctx: CallContext,
    response: WireResponse,
) -> Result<T, BoxError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    if !status.is_success() {
        return Err(Box::new(StatusError {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }));
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Decoder for JSON responses into `T`.
pub struct JsonDecoder<T>(PhantomData<fn() -> T>);

impl<T> JsonDecoder<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonDecoder<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for JsonDecoder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JsonDecoder")
    }
}

#[async_trait]
impl<T> ResponseDecoder<T> for JsonDecoder<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn decode(&self, ctx: &CallContext, response: WireResponse) -> Result<T, BoxError> {
        decode_json_response(ctx.clone(), response).await
    }
}
