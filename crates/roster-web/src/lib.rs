#![forbid(unsafe_code)]

//! Browser shell for the Roster customer table.
//!
//! This crate provides [`RosterApp`], a `wasm-bindgen`-exported class that
//! the host page drives: it issues loads and writes (returning Promises),
//! reports scroll and resize, and pulls the rows to draw.
//!
//! The logic lives in the platform-independent `ShellCore`, which the wasm
//! bindings wrap and which is tested natively.

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::RosterApp;

// Shell core is used by the wasm module and by native tests.
#[cfg(any(target_arch = "wasm32", test))]
mod shell_core;
