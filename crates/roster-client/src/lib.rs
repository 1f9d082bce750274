#![forbid(unsafe_code)]

//! Remote collection client for the customer service.
//!
//! [`RemoteCollection`] is the seam the cache coordinator talks to: five
//! operations, one network round trip each, every failure classified into
//! [`ClientError`]. Nothing here touches cached state and nothing retries.
//!
//! [`HttpCollectionClient`] implements the trait over any [`Transport`].
//! On `wasm32` the [`FetchTransport`] sends requests through `window.fetch`;
//! tests plug in scripted transports.
//!
//! All futures are single-threaded (`!Send` is fine): the client runs on the
//! browser's UI thread next to the coordinator.

pub mod classify;
pub mod http;
pub mod transport;

#[cfg(target_arch = "wasm32")]
mod fetch;

#[cfg(target_arch = "wasm32")]
pub use fetch::FetchTransport;

pub use http::HttpCollectionClient;
pub use roster_core::{ClientError, ClientResult, Record, RecordId};
pub use transport::{HttpRequest, HttpResponse, Method, Transport, TransportError};

use std::future::Future;
use std::rc::Rc;

/// CRUD contract of the remote customer collection.
pub trait RemoteCollection {
    /// `GET /customers`.
    fn fetch_all(&self) -> impl Future<Output = ClientResult<Vec<Record>>>;

    /// `GET /customers/{id}`.
    fn fetch_one(&self, id: RecordId) -> impl Future<Output = ClientResult<Record>>;

    /// `POST /customers`. The returned record carries the server-assigned id.
    fn create(&self, draft: &Record) -> impl Future<Output = ClientResult<Record>>;

    /// `PUT /customers/{id}`.
    fn update(&self, id: RecordId, draft: &Record) -> impl Future<Output = ClientResult<Record>>;

    /// `DELETE /customers/{id}`.
    fn delete(&self, id: RecordId) -> impl Future<Output = ClientResult<()>>;
}

impl<C: RemoteCollection> RemoteCollection for Rc<C> {
    fn fetch_all(&self) -> impl Future<Output = ClientResult<Vec<Record>>> {
        (**self).fetch_all()
    }

    fn fetch_one(&self, id: RecordId) -> impl Future<Output = ClientResult<Record>> {
        (**self).fetch_one(id)
    }

    fn create(&self, draft: &Record) -> impl Future<Output = ClientResult<Record>> {
        (**self).create(draft)
    }

    fn update(&self, id: RecordId, draft: &Record) -> impl Future<Output = ClientResult<Record>> {
        (**self).update(id, draft)
    }

    fn delete(&self, id: RecordId) -> impl Future<Output = ClientResult<()>> {
        (**self).delete(id)
    }
}
