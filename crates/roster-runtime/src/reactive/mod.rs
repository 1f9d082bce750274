#![forbid(unsafe_code)]

//! Change listeners for cached data.
//!
//! - [`ListenerSet`]: weakly-held callbacks notified in registration order.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//!
//! # Architecture
//!
//! Everything here is single-threaded (`Rc`, no locks). The set stores
//! `Weak` callbacks; the guard owns the only strong reference, so dropping
//! the guard is all it takes to unsubscribe. Dead entries are pruned lazily
//! whenever the set is walked.

pub mod listeners;

pub use listeners::{ListenerSet, Subscription};
