#![forbid(unsafe_code)]

//! Visible window resolution.
//!
//! Given the dataset size and viewport telemetry, [`WindowResolver`] decides
//! which logical indices are on screen and materializes them from an
//! [`ItemStore`], substituting placeholder markers where the store has no
//! row.
//!
//! Two telemetry shapes are accepted through [`Viewport`]:
//!
//! - **Pixels**: viewport height, row height and scroll offset; the window is
//!   computed with fixed-row-height math.
//! - **Positions**: first/last visible buffer positions reported by an
//!   external virtualization provider; the window is a direct slice.
//!
//! Both produce a [`VisibleSlice`] with the same guarantees: rows ascend by
//! `list_id`, ids are unique, and every id lies in `[0, data_size)`.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::row::Row;
use crate::store::ItemStore;

/// Contiguous logical index range. Derived, never stored by the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    /// First visible list id.
    pub start: usize,
    /// Number of visible rows.
    pub len: usize,
}

impl Window {
    /// The window of an unmeasured or empty list.
    pub const EMPTY: Self = Self { start: 0, len: 0 };

    /// Create a window.
    #[must_use]
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// One past the last visible list id.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start.saturating_add(self.len)
    }

    /// Visible ids as a range.
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Whether nothing is visible.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `list_id` is inside the window.
    #[must_use]
    pub const fn contains(&self, list_id: usize) -> bool {
        list_id >= self.start && list_id < self.end()
    }
}

/// Viewport telemetry from the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Viewport {
    /// Fixed row height math.
    Pixels {
        /// Visible height of the scroll container.
        height: f64,
        /// Measured height of one row. `<= 0` means not measured yet.
        row_height: f64,
        /// Current scroll offset.
        scroll_top: f64,
    },
    /// Visibility reported directly as buffer positions (inclusive).
    Positions {
        /// First visible buffer position.
        first: usize,
        /// Last visible buffer position.
        last: usize,
    },
}

/// Rows of the current window, borrowed from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleSlice<'a, T> {
    window: Window,
    rows: Vec<Row<&'a T>>,
}

impl<'a, T> VisibleSlice<'a, T> {
    /// A slice with nothing visible.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            window: Window::EMPTY,
            rows: Vec::new(),
        }
    }

    /// The window these rows cover.
    #[must_use]
    pub const fn window(&self) -> Window {
        self.window
    }

    /// The rows, in ascending `list_id` order.
    #[must_use]
    pub fn rows(&self) -> &[Row<&'a T>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// List ids still waiting for content, in ascending order.
    pub fn placeholder_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows
            .iter()
            .filter(|row| row.is_placeholder())
            .map(Row::list_id)
    }

    /// Whether any visible row is a placeholder.
    #[must_use]
    pub fn has_placeholders(&self) -> bool {
        self.rows.iter().any(Row::is_placeholder)
    }

    /// Visible row at `list_id`.
    #[must_use = "use the returned row (if any)"]
    pub fn get(&self, list_id: usize) -> Option<&Row<&'a T>> {
        self.rows
            .binary_search_by_key(&list_id, Row::list_id)
            .ok()
            .map(|pos| &self.rows[pos])
    }

    /// Take ownership of the rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row<&'a T>> {
        self.rows
    }
}

/// Visible range for fixed-height rows.
///
/// `len = min(data_size, round(viewport / row))` and
/// `start = clamp(round(scroll_top / row), 0, data_size - len)`.
/// A non-positive (or NaN) row height means the rows have not been measured
/// yet; the empty window is returned and the caller should defer.
#[must_use]
pub fn visible_range(viewport_px: f64, row_px: f64, scroll_top_px: f64, data_size: usize) -> Window {
    if !(row_px > 0.0) || data_size == 0 {
        return Window::EMPTY;
    }
    let len = rows_in(viewport_px, row_px).min(data_size);
    let start = rows_in(scroll_top_px, row_px).min(data_size - len);
    Window::new(start, len)
}

/// `round(px / row)` as a non-negative row count.
#[must_use]
pub fn rows_in(px: f64, row_px: f64) -> usize {
    if !(row_px > 0.0) {
        return 0;
    }
    let rows = (px / row_px).round();
    if rows.is_nan() || rows <= 0.0 {
        0
    } else {
        // Saturates for huge values.
        rows as usize
    }
}

/// Materialize `window` from `store`, one binary search per row.
///
/// Ids past `data_size` are never produced. O(window.len · log n).
#[must_use]
pub fn materialize<'a, T>(store: &'a ItemStore<T>, window: Window) -> VisibleSlice<'a, T> {
    let end = window.end().min(store.data_size());
    let start = window.start.min(end);
    let rows = (start..end)
        .map(|list_id| match store.lookup(list_id) {
            Some(row) => row.as_ref(),
            None => Row::placeholder(list_id),
        })
        .collect();
    VisibleSlice {
        window: Window::new(start, end - start),
        rows,
    }
}

/// Direct slice of buffer positions `first..=last`.
#[must_use]
pub fn slice_positions<T>(store: &ItemStore<T>, first: usize, last: usize) -> VisibleSlice<'_, T> {
    let rows: Vec<Row<&T>> = store.rows_between(first, last).iter().map(Row::as_ref).collect();
    let window = rows
        .first()
        .map_or(Window::EMPTY, |row| Window::new(row.list_id(), rows.len()));
    VisibleSlice { window, rows }
}

/// Resolves viewport telemetry into a [`VisibleSlice`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowResolver {
    /// Extra rows materialized on each side of the visible range.
    overscan: usize,
}

impl WindowResolver {
    /// Resolver without overscan.
    #[must_use]
    pub const fn new() -> Self {
        Self { overscan: 0 }
    }

    /// Set overscan amount.
    #[must_use]
    pub const fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    /// Overscan amount.
    #[must_use]
    pub const fn overscan(&self) -> usize {
        self.overscan
    }

    /// Window for the given telemetry, before overscan.
    #[must_use]
    pub fn window<T>(&self, store: &ItemStore<T>, viewport: &Viewport) -> Window {
        match *viewport {
            Viewport::Pixels {
                height,
                row_height,
                scroll_top,
            } => visible_range(height, row_height, scroll_top, store.data_size()),
            Viewport::Positions { first, last } => slice_positions(store, first, last).window(),
        }
    }

    /// Resolve and materialize the visible rows.
    #[must_use]
    pub fn resolve<'a, T>(&self, store: &'a ItemStore<T>, viewport: &Viewport) -> VisibleSlice<'a, T> {
        let _span = tracing::trace_span!("resolve_window", data_size = store.data_size()).entered();
        match *viewport {
            Viewport::Pixels { .. } => {
                let window = self.window(store, viewport);
                if window.is_empty() {
                    return VisibleSlice::empty();
                }
                materialize(store, self.expand(window, store.data_size()))
            }
            Viewport::Positions { first, last } => {
                let first = first.saturating_sub(self.overscan);
                let last = last.saturating_add(self.overscan);
                slice_positions(store, first, last)
            }
        }
    }

    fn expand(&self, window: Window, data_size: usize) -> Window {
        let start = window.start.saturating_sub(self.overscan);
        let end = window.end().saturating_add(self.overscan).min(data_size);
        Window::new(start, end.saturating_sub(start))
    }
}
