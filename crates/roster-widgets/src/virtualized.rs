#![forbid(unsafe_code)]

//! Virtualization primitives for the customer table.
//!
//! Every row is assumed to be `estimated_item_height` pixels tall, so the
//! offset of row `i` is `i * height` and every computation here is O(1) in
//! the number of rows.
//!
//! # Core Types
//!
//! - [`visible_range`] - Pure range computation for one viewport
//! - [`Virtualizer`] - Stateful wrapper that remembers the last range and
//!   reports whether an update changed it
//! - [`VisibleRange`] - Half-open index range (possibly empty)
//!
//! # Example
//!
//! ```
//! use roster_widgets::{Viewport, WindowOptions, visible_range};
//!
//! let range = visible_range(100, Viewport::new(0.0, 600.0), WindowOptions::new(64.0, 5));
//! assert_eq!(range.start_index(), Some(0));
//! assert_eq!(range.end_index(), Some(15));
//! ```

use std::ops::Range;

use roster_core::Config;
use roster_core::config::{DEFAULT_OVERSCAN, DEFAULT_ROW_HEIGHT};
use tracing::trace;

/// Row height and overscan for a list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowOptions {
    /// Uniform row height in pixels. Always finite and positive.
    pub estimated_item_height: f64,
    /// Extra rows materialized above and below the viewport.
    pub overscan: usize,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            estimated_item_height: DEFAULT_ROW_HEIGHT,
            overscan: DEFAULT_OVERSCAN,
        }
    }
}

impl WindowOptions {
    /// Options with the given height; non-finite or non-positive heights
    /// fall back to the default.
    #[must_use]
    pub fn new(estimated_item_height: f64, overscan: usize) -> Self {
        let estimated_item_height = if estimated_item_height.is_finite() && estimated_item_height > 0.0 {
            estimated_item_height
        } else {
            DEFAULT_ROW_HEIGHT
        };
        Self {
            estimated_item_height,
            overscan,
        }
    }
}

impl From<&Config> for WindowOptions {
    fn from(config: &Config) -> Self {
        Self::new(config.row_height, config.overscan)
    }
}

/// Scroll position and visible height of the scroll container, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub scroll_offset: f64,
    pub viewport_height: f64,
}

impl Viewport {
    #[must_use]
    pub const fn new(scroll_offset: f64, viewport_height: f64) -> Self {
        Self {
            scroll_offset,
            viewport_height,
        }
    }
}

/// Indices to materialize: a half-open range, empty when nothing renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VisibleRange {
    range: Range<usize>,
}

impl VisibleRange {
    #[must_use]
    pub const fn empty() -> Self {
        Self { range: 0..0 }
    }

    /// Inclusive bounds `start..=end`. `end` must be a valid row index.
    #[must_use]
    pub(crate) const fn inclusive(start: usize, end: usize) -> Self {
        Self {
            range: start..end.saturating_add(1),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// First materialized index.
    #[must_use]
    pub fn start_index(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.range.start)
    }

    /// Last materialized index (inclusive).
    #[must_use]
    pub fn end_index(&self) -> Option<usize> {
        (!self.is_empty()).then(|| self.range.end - 1)
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.range.contains(&index)
    }

    #[must_use]
    pub fn as_range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn iter(&self) -> Range<usize> {
        self.range.clone()
    }
}

/// One materialized row and its placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualItem {
    pub index: usize,
    /// Offset of the row's top edge from the top of the content.
    pub start: f64,
    pub size: f64,
}

/// Where to place a row when scrolling to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    Start,
    Center,
    End,
    /// Scroll only as far as needed to bring the row fully into view.
    #[default]
    Auto,
}

fn max_scroll(item_count: usize, viewport_height: f64, item_height: f64) -> f64 {
    let total = item_count as f64 * item_height;
    let visible = if viewport_height.is_finite() && viewport_height > 0.0 {
        viewport_height
    } else {
        0.0
    };
    (total - visible).max(0.0)
}

fn clamp_scroll(offset: f64, max: f64) -> f64 {
    if offset.is_nan() {
        return 0.0;
    }
    offset.clamp(0.0, max)
}

/// Compute the rows to materialize for one viewport.
///
/// `start = floor(s / h) - overscan` and `end = ceil((s + vh) / h) + overscan`,
/// both clamped to `[0, item_count - 1]`. `s` is the scroll offset as given,
/// except that offsets past the top of the last row are pulled back to it.
/// Empty iff `item_count == 0` or the viewport height is not positive.
#[must_use]
pub fn visible_range(item_count: usize, viewport: Viewport, options: WindowOptions) -> VisibleRange {
    let vh = viewport.viewport_height;
    if item_count == 0 || vh.is_nan() || vh <= 0.0 {
        return VisibleRange::empty();
    }

    let h = options.estimated_item_height;
    let last = item_count - 1;
    let s = clamp_scroll(viewport.scroll_offset, last as f64 * h);

    // Float-to-int `as` saturates, so an infinite viewport lands on usize::MAX.
    let first_visible = ((s / h).floor() as usize).min(last);
    let last_visible = ((s + vh) / h).ceil() as usize;

    let start = first_visible.saturating_sub(options.overscan);
    let end = last_visible.saturating_add(options.overscan).min(last);
    VisibleRange::inclusive(start, end)
}

/// Stateful window over a list of `item_count` uniform rows.
///
/// Setters return `true` when the materialized range changed, which is the
/// caller's cue to redraw.
#[derive(Debug, Clone)]
pub struct Virtualizer {
    options: WindowOptions,
    item_count: usize,
    viewport: Viewport,
    range: VisibleRange,
}

impl Default for Virtualizer {
    fn default() -> Self {
        Self::new(WindowOptions::default())
    }
}

impl Virtualizer {
    #[must_use]
    pub fn new(options: WindowOptions) -> Self {
        Self {
            options,
            item_count: 0,
            viewport: Viewport::default(),
            range: VisibleRange::empty(),
        }
    }

    /// Set the item count (builder).
    #[must_use]
    pub fn with_item_count(mut self, item_count: usize) -> Self {
        self.set_item_count(item_count);
        self
    }

    /// Set the viewport (builder).
    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.set_viewport(viewport);
        self
    }

    #[must_use]
    pub fn options(&self) -> WindowOptions {
        self.options
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Current viewport. The stored scroll offset never exceeds
    /// [`max_scroll`](Self::max_scroll), the furthest a scroll container
    /// can travel.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn scroll_offset(&self) -> f64 {
        self.viewport.scroll_offset
    }

    /// Last computed range.
    #[must_use]
    pub fn visible_range(&self) -> &VisibleRange {
        &self.range
    }

    pub fn set_scroll_offset(&mut self, offset: f64) -> bool {
        self.viewport.scroll_offset = clamp_scroll(offset, self.max_scroll());
        self.recompute()
    }

    pub fn set_viewport_height(&mut self, height: f64) -> bool {
        self.viewport.viewport_height = height;
        self.viewport.scroll_offset = clamp_scroll(self.viewport.scroll_offset, self.max_scroll());
        self.recompute()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> bool {
        self.viewport.viewport_height = viewport.viewport_height;
        self.viewport.scroll_offset = clamp_scroll(viewport.scroll_offset, self.max_scroll());
        self.recompute()
    }

    /// Update the row count. A shrinking list pulls the scroll offset back
    /// inside the content.
    pub fn set_item_count(&mut self, item_count: usize) -> bool {
        self.item_count = item_count;
        self.viewport.scroll_offset = clamp_scroll(self.viewport.scroll_offset, self.max_scroll());
        self.recompute()
    }

    /// Total scrollable extent in pixels.
    #[must_use]
    pub fn total_size(&self) -> f64 {
        self.item_count as f64 * self.options.estimated_item_height
    }

    /// Largest valid scroll offset.
    #[must_use]
    pub fn max_scroll(&self) -> f64 {
        max_scroll(
            self.item_count,
            self.viewport.viewport_height,
            self.options.estimated_item_height,
        )
    }

    /// Top edge of row `index`.
    #[must_use]
    pub fn offset_of(&self, index: usize) -> f64 {
        index as f64 * self.options.estimated_item_height
    }

    /// Materialized rows with their placement.
    #[must_use]
    pub fn virtual_items(&self) -> Vec<VirtualItem> {
        let size = self.options.estimated_item_height;
        self.range
            .iter()
            .map(|index| VirtualItem {
                index,
                start: self.offset_of(index),
                size,
            })
            .collect()
    }

    /// Row under the content offset `px`, if any.
    #[must_use]
    pub fn item_at_offset(&self, px: f64) -> Option<usize> {
        if self.item_count == 0 || px.is_nan() || px < 0.0 || px >= self.total_size() {
            return None;
        }
        let index = (px / self.options.estimated_item_height).floor() as usize;
        Some(index.min(self.item_count - 1))
    }

    /// Scroll offset that places row `index` according to `align`.
    ///
    /// Out-of-range indices are clamped to the last row; returns `None` for
    /// an empty list.
    #[must_use]
    pub fn scroll_offset_for(&self, index: usize, align: Align) -> Option<f64> {
        if self.item_count == 0 {
            return None;
        }
        let h = self.options.estimated_item_height;
        let vh = self.viewport.viewport_height.max(0.0);
        let start = self.offset_of(index.min(self.item_count - 1));
        let end = start + h;
        let current = self.viewport.scroll_offset;

        let target = match align {
            Align::Start => start,
            Align::End => end - vh,
            Align::Center => start + h / 2.0 - vh / 2.0,
            Align::Auto if start >= current && end <= current + vh => current,
            Align::Auto if start < current => start,
            Align::Auto => end - vh,
        };
        Some(clamp_scroll(target, self.max_scroll()))
    }

    /// Scroll so row `index` is placed according to `align`.
    pub fn scroll_to_index(&mut self, index: usize, align: Align) -> bool {
        match self.scroll_offset_for(index, align) {
            Some(offset) => self.set_scroll_offset(offset),
            None => false,
        }
    }

    fn recompute(&mut self) -> bool {
        let next = visible_range(self.item_count, self.viewport, self.options);
        if next == self.range {
            return false;
        }
        trace!(
            start = ?next.start_index(),
            end = ?next.end_index(),
            items = self.item_count,
            "visible range changed"
        );
        self.range = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> WindowOptions {
        WindowOptions::new(64.0, 5)
    }

    #[test]
    fn first_screen_of_a_hundred_rows() {
        let range = visible_range(100, Viewport::new(0.0, 600.0), opts());
        assert_eq!(range.start_index(), Some(0));
        assert_eq!(range.end_index(), Some(15));
        assert_eq!(range.len(), 16);
    }

    #[test]
    fn scrolled_window_applies_overscan_on_both_sides() {
        // floor(1000/64) = 15, ceil(1600/64) = 25
        let range = visible_range(100, Viewport::new(1000.0, 600.0), opts());
        assert_eq!(range.start_index(), Some(10));
        assert_eq!(range.end_index(), Some(30));
    }

    #[test]
    fn end_is_clamped_to_last_row() {
        let range = visible_range(8, Viewport::new(0.0, 600.0), opts());
        assert_eq!(range.as_range(), 0..8);
    }

    #[test]
    fn empty_list_or_viewport_renders_nothing() {
        assert!(visible_range(0, Viewport::new(0.0, 600.0), opts()).is_empty());
        assert!(visible_range(10, Viewport::new(0.0, 0.0), opts()).is_empty());
        assert!(visible_range(10, Viewport::new(0.0, -5.0), opts()).is_empty());
        assert!(visible_range(10, Viewport::new(0.0, f64::NAN), opts()).is_empty());
        assert_eq!(VisibleRange::empty().end_index(), None);
    }

    #[test]
    fn scroll_past_end_is_clamped() {
        // Pulled back to the last row's top: 19*64.
        let range = visible_range(20, Viewport::new(1.0e9, 640.0), opts());
        assert_eq!(range.start_index(), Some(14));
        assert_eq!(range.end_index(), Some(19));
    }

    #[test]
    fn offsets_near_the_end_use_the_raw_position() {
        // 1000 is past 20*64 - 640 but still inside the content.
        let range = visible_range(20, Viewport::new(1000.0, 640.0), opts());
        assert_eq!(range.start_index(), Some(10));
        assert_eq!(range.end_index(), Some(19));
    }

    #[test]
    fn inclusive_end_saturates() {
        let range = VisibleRange::inclusive(usize::MAX - 1, usize::MAX);
        assert_eq!(range.start_index(), Some(usize::MAX - 1));
        assert_eq!(range.len(), 1);
    }

    #[test]
    fn invalid_height_falls_back_to_default() {
        assert_eq!(WindowOptions::new(0.0, 2).estimated_item_height, 64.0);
        assert_eq!(WindowOptions::new(f64::INFINITY, 2).estimated_item_height, 64.0);
        assert_eq!(WindowOptions::new(32.0, 2).estimated_item_height, 32.0);
    }

    #[test]
    fn options_from_config() {
        let config = Config {
            row_height: 48.0,
            overscan: 2,
            ..Config::default()
        };
        assert_eq!(WindowOptions::from(&config), WindowOptions::new(48.0, 2));
    }

    #[test]
    fn setters_report_range_changes() {
        let mut virt = Virtualizer::new(opts()).with_viewport(Viewport::new(0.0, 600.0));
        assert!(virt.visible_range().is_empty());

        assert!(virt.set_item_count(100));
        assert!(!virt.set_item_count(100));
        // 10px stays inside row 0: same range.
        assert!(!virt.set_scroll_offset(10.0));
        assert!(virt.set_scroll_offset(640.0));
        assert_eq!(virt.visible_range().start_index(), Some(5));
        assert!(virt.set_viewport_height(0.0));
        assert!(virt.visible_range().is_empty());
    }

    #[test]
    fn shrinking_list_pulls_scroll_back() {
        let mut virt = Virtualizer::new(opts())
            .with_viewport(Viewport::new(0.0, 640.0))
            .with_item_count(100);
        virt.set_scroll_offset(5000.0);
        assert_eq!(virt.scroll_offset(), 5000.0);

        virt.set_item_count(20);
        assert_eq!(virt.scroll_offset(), 640.0);
        assert_eq!(virt.visible_range().end_index(), Some(19));

        virt.set_item_count(3);
        assert_eq!(virt.scroll_offset(), 0.0);
        assert_eq!(virt.visible_range().as_range(), 0..3);
    }

    #[test]
    fn total_size_and_items() {
        let virt = Virtualizer::new(WindowOptions::new(50.0, 1))
            .with_item_count(10)
            .with_viewport(Viewport::new(100.0, 100.0));
        assert_eq!(virt.total_size(), 500.0);

        let items = virt.virtual_items();
        let indices: Vec<usize> = items.iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5]);
        assert_eq!(items[0].start, 50.0);
        assert_eq!(items[0].size, 50.0);
    }

    #[test]
    fn item_at_offset_bounds() {
        let virt = Virtualizer::new(opts()).with_item_count(10);
        assert_eq!(virt.item_at_offset(0.0), Some(0));
        assert_eq!(virt.item_at_offset(63.9), Some(0));
        assert_eq!(virt.item_at_offset(64.0), Some(1));
        assert_eq!(virt.item_at_offset(639.0), Some(9));
        assert_eq!(virt.item_at_offset(640.0), None);
        assert_eq!(virt.item_at_offset(-1.0), None);
    }

    #[test]
    fn scroll_offset_alignment() {
        let virt = Virtualizer::new(opts())
            .with_viewport(Viewport::new(0.0, 640.0))
            .with_item_count(100);
        assert_eq!(virt.scroll_offset_for(20, Align::Start), Some(1280.0));
        assert_eq!(virt.scroll_offset_for(20, Align::End), Some(1344.0 - 640.0));
        assert_eq!(virt.scroll_offset_for(20, Align::Center), Some(1280.0 + 32.0 - 320.0));
        // Already visible: no movement.
        assert_eq!(virt.scroll_offset_for(3, Align::Auto), Some(0.0));
        // Below the viewport: align to end.
        assert_eq!(virt.scroll_offset_for(20, Align::Auto), Some(1344.0 - 640.0));
        // Clamped at both ends.
        assert_eq!(virt.scroll_offset_for(0, Align::End), Some(0.0));
        assert_eq!(virt.scroll_offset_for(500, Align::Start), Some(6400.0 - 640.0));
        assert_eq!(Virtualizer::new(opts()).scroll_offset_for(0, Align::Start), None);
    }

    #[test]
    fn auto_alignment_scrolls_up_to_start() {
        let mut virt = Virtualizer::new(opts())
            .with_viewport(Viewport::new(0.0, 640.0))
            .with_item_count(100);
        virt.set_scroll_offset(3200.0);
        assert!(virt.scroll_to_index(10, Align::Auto));
        assert_eq!(virt.scroll_offset(), 640.0);
    }
}
