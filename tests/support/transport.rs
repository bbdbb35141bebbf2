//! Test doubles: a scripted in-memory transport whose response bodies report
//! when they are released.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wirecall::{BoxError, HttpTransport, ResponseBody, WireRequest, WireResponse};

/// What the transport does on every round trip.
#[derive(Clone)]
pub enum Script {
    /// Reply with a status, headers and a chunked body.
    Respond {
        status: u16,
        headers: Vec<(&'static str, &'static str)>,
        chunks: Vec<&'static str>,
    },
    /// Reply 200 with the value of the `x-n` request header as the body.
    Echo,
    /// Reply 200, send the chunks, then never finish the body.
    Stall(Vec<&'static str>),
    /// Fail with `ConnectionRefused`.
    Refuse,
    /// Never complete.
    Hang,
}

pub struct ScriptedTransport {
    script: Script,
    /// Round trips that started executing.
    pub calls: AtomicUsize,
    /// Response body streams dropped so far.
    pub released: Arc<AtomicUsize>,
    /// Hanging round trips that were dropped before completing.
    pub aborted: Arc<AtomicUsize>,
    /// Headers of every request seen.
    pub requests: Mutex<Vec<HeaderMap>>,
}

impl ScriptedTransport {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            released: Arc::new(AtomicUsize::new(0)),
            aborted: Arc::new(AtomicUsize::new(0)),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// 200 with `content-length` set and the given chunks as body.
    pub fn ok(chunks: Vec<&'static str>) -> Arc<Self> {
        Self::new(Script::Respond {
            status: 200,
            headers: vec![("x-server", "scripted")],
            chunks,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn aborted(&self) -> usize {
        self.aborted.load(Ordering::SeqCst)
    }

    fn body(&self, chunks: Vec<Bytes>) -> ResponseBody {
        ResponseBody::new(self.tracked(chunks))
    }

    fn tracked(&self, chunks: Vec<Bytes>) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        let tracker = CountOnDrop(self.released.clone());
        futures::stream::iter(chunks).map(move |chunk| {
            let _keep = &tracker;
            Ok::<_, io::Error>(chunk)
        })
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn round_trip(&self, request: WireRequest) -> Result<WireResponse, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.headers().clone());

        match &self.script {
            Script::Respond {
                status,
                headers,
                chunks,
            } => {
                let mut map = HeaderMap::new();
                for &(name, value) in headers {
                    map.insert(
                        HeaderName::from_static(name),
                        HeaderValue::from_static(value),
                    );
                }
                let len: usize = chunks.iter().map(|c| c.len()).sum();
                map.insert(reqwest::header::CONTENT_LENGTH, HeaderValue::from(len));
                let body = self.body(
                    chunks
                        .iter()
                        .map(|c| Bytes::from_static(c.as_bytes()))
                        .collect(),
                );
                Ok(WireResponse::new(StatusCode::from_u16(*status)?, map, body))
            }
            Script::Echo => {
                let n = request
                    .headers()
                    .get("x-n")
                    .map(|v| Bytes::copy_from_slice(v.as_bytes()))
                    .unwrap_or_default();
                Ok(WireResponse::new(
                    StatusCode::OK,
                    HeaderMap::new(),
                    self.body(vec![n]),
                ))
            }
            Script::Stall(chunks) => {
                let chunks = chunks.iter().map(|c| Bytes::from_static(c.as_bytes())).collect();
                let body = ResponseBody::new(self.tracked(chunks).chain(futures::stream::pending()));
                Ok(WireResponse::new(StatusCode::OK, HeaderMap::new(), body))
            }
            Script::Refuse => Err(Box::new(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
            Script::Hang => {
                let _abort = CountOnDrop(self.aborted.clone());
                std::future::pending::<()>().await;
                Err("unreachable".into())
            }
        }
    }
}

struct CountOnDrop(Arc<AtomicUsize>);

impl Drop for CountOnDrop {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}
