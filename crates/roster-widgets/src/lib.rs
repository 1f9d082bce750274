#![forbid(unsafe_code)]

//! Widgets: list windowing for the customer table.
//!
//! The table may hold thousands of rows; only the rows intersecting the
//! viewport (plus a small overscan margin) are materialized. [`Virtualizer`]
//! tracks scroll position, viewport size, and item count and answers which
//! rows to draw and where.

pub mod virtualized;

pub use virtualized::{
    Align, Viewport, VirtualItem, Virtualizer, VisibleRange, WindowOptions, visible_range,
};
