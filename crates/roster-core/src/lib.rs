#![forbid(unsafe_code)]

//! Core: customer records, collection snapshots, errors, and configuration.
//!
//! # Role in Roster
//! `roster-core` is the vocabulary layer. It owns the wire-level [`Record`]
//! type, the id-indexed [`Collection`] snapshot, the client error taxonomy,
//! and environment configuration. It performs no I/O of its own.
//!
//! # How it fits in the system
//! `roster-client` maps HTTP exchanges onto these types, `roster-runtime`
//! caches [`Collection`] snapshots and orchestrates writes, and
//! `roster-widgets` windows the ordered collection for rendering. The web
//! shell wires all of them together.

pub mod collection;
pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod validate;

pub use collection::{Collection, CollectionError};
pub use config::{Config, ConfigError};
pub use error::{ClientError, ClientResult};
pub use record::{Record, RecordId};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, error, info, trace, warn};
