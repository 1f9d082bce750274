#![forbid(unsafe_code)]

//! [`RemoteCollection`] over HTTP + JSON.

use serde::de::DeserializeOwned;
use tracing::{Instrument, debug, debug_span, warn};

use roster_core::{ClientError, ClientResult, Record, RecordId};

use crate::RemoteCollection;
use crate::classify::{classify_response, classify_transport};
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

const COLLECTION_PATH: &str = "/customers";

/// Client for `{base_url}/customers` endpoints.
#[derive(Debug, Clone)]
pub struct HttpCollectionClient<T> {
    base_url: String,
    transport: T,
}

impl<T: Transport> HttpCollectionClient<T> {
    /// `base_url` is the service root, e.g. `http://localhost:8080/api`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, transport: T) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            transport,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn record_path(id: RecordId) -> String {
        format!("{COLLECTION_PATH}/{id}")
    }

    /// One round trip. Non-2xx and transport failures come back classified.
    async fn call(&self, method: Method, path: &str, body: Option<String>) -> ClientResult<HttpResponse> {
        let request = HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            body,
        };
        let span = debug_span!("remote_call", method = method.as_str(), path);
        async {
            let response = match self.transport.send(request).await {
                Ok(response) => response,
                Err(err) => {
                    let classified = classify_transport(&err);
                    warn!(error = %err, kind = classified.label(), "request did not reach service");
                    return Err(classified);
                }
            };
            if !response.is_success() {
                let classified = classify_response(&response);
                warn!(status = response.status, kind = classified.label(), "service rejected request");
                return Err(classified);
            }
            debug!(status = response.status, bytes = response.body.len(), "response received");
            Ok(response)
        }
        .instrument(span)
        .await
    }

    async fn call_json<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> ClientResult<R> {
        let response = self.call(method, path, body).await?;
        serde_json::from_str(&response.body).map_err(|err| {
            warn!(error = %err, path, "undecodable response body");
            ClientError::Unknown
        })
    }
}

fn encode(draft: &Record) -> ClientResult<String> {
    // Ids travel in the path, never in the body.
    serde_json::to_string(&draft.to_draft()).map_err(|_| ClientError::Unknown)
}

impl<T: Transport> RemoteCollection for HttpCollectionClient<T> {
    async fn fetch_all(&self) -> ClientResult<Vec<Record>> {
        self.call_json(Method::Get, COLLECTION_PATH, None).await
    }

    async fn fetch_one(&self, id: RecordId) -> ClientResult<Record> {
        self.call_json(Method::Get, &Self::record_path(id), None).await
    }

    async fn create(&self, draft: &Record) -> ClientResult<Record> {
        let body = encode(draft)?;
        self.call_json(Method::Post, COLLECTION_PATH, Some(body)).await
    }

    async fn update(&self, id: RecordId, draft: &Record) -> ClientResult<Record> {
        let body = encode(draft)?;
        self.call_json(Method::Put, &Self::record_path(id), Some(body))
            .await
    }

    async fn delete(&self, id: RecordId) -> ClientResult<()> {
        self.call(Method::Delete, &Self::record_path(id), None)
            .await
            .map(|_| ())
    }
}
