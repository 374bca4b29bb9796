#![forbid(unsafe_code)]

//! The scroller facade.
//!
//! [`VirtualScroller`] owns an [`ItemStore`] and wires the window resolver,
//! fetch trigger and selection navigator around it. The host drives it with
//! data (`set_items`, `append_*`) and telemetry (`report_*`), calls
//! [`VirtualScroller::refresh`] once per visibility-stabilization tick, and
//! drains the resulting [`ScrollerEvent`]s.
//!
//! # Setup phases
//!
//! ```text
//! Loading ──set_loading(false)──▶ Empty ◀── no rows / data_size 0
//!                                   │
//!                               rows arrive
//!                                   ▼
//!                               Measuring ──report_row_height──▶ Settling ──refresh──▶ Ready
//! ```
//!
//! While `Measuring` the host should lay out a single row and report its
//! height. `Settling` is the pass where the host sizes the scroll container
//! (see [`VirtualScroller::layout`]) before any rows are materialized.
//!
//! # Example
//!
//! ```
//! use lazyscroll_core::{ScrollerConfig, ScrollerEvent, VirtualScroller};
//! use lazyscroll_core::scroll::ScrollDirection;
//!
//! let mut scroller: VirtualScroller<String> = VirtualScroller::new(ScrollerConfig::default())
//!     .expect("default config is valid");
//! let rows: Vec<String> = (40..60).map(|i| format!("row {i}")).collect();
//! scroller.set_items(rows, 40, 100);
//! scroller.report_viewport(300.0, 30.0, 1200.0);
//! scroller.refresh(); // settle
//! scroller.report_scroll_sample(1100.0);
//!
//! let request = scroller.refresh().expect("rows 37..40 are missing");
//! assert_eq!(request.direction, ScrollDirection::Up);
//! assert_eq!(request.index, 39);
//! ```

use std::mem;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ScrollerConfig};
use crate::error::{Diagnostics, ScrollerError};
use crate::fetch::{FetchRequest, FetchTrigger};
use crate::present::{PresentContext, RowPresenter};
use crate::row::Keyed;
use crate::scroll::{ScrollDirection, ScrollTracker};
use crate::selection::{Move, ScrollRequest, Selection, SelectionNavigator, SelectionTarget};
use crate::store::{Edge, ItemStore, LoadReport};
use crate::window::{rows_in, VisibleSlice, Viewport, Window, WindowResolver};

/// Where the scroller is in its setup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// The host is loading, or setup was deferred.
    Loading,
    /// Nothing to show.
    Empty,
    /// Waiting for a row height.
    Measuring,
    /// Row height known; the container is being sized.
    Settling,
    /// Rows are materialized on every refresh.
    Ready,
}

/// Payload of selection and activation events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEvent<T> {
    /// Row the item occupies; `None` for the unlisted item.
    pub list_id: Option<usize>,
    /// Value under `id_prop`.
    pub id: Option<String>,
    /// Value under `text_prop`.
    pub name: Option<String>,
    /// The item itself.
    pub item: T,
}

/// Output of the scroller, drained with [`VirtualScroller::drain_events`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "detail", rename_all = "snake_case")]
pub enum ScrollerEvent<T> {
    /// Placeholders are visible; the host should load data.
    FetchNeeded(FetchRequest),
    /// The selection moved to a new item.
    SelectionChanged(ItemEvent<T>),
    /// An item was clicked or confirmed.
    LineActivated(ItemEvent<T>),
    /// The host should set its scroll offset to this many pixels.
    ScrollTo(f64),
}

/// Pixel geometry of the scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollGeometry {
    /// Height of the scroll host.
    pub host_height: f64,
    /// Spacer above the materialized rows.
    pub top_padding: f64,
    /// Spacer below the materialized rows.
    pub bottom_padding: f64,
    /// Fixed width, `None` to fit content.
    pub width: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Telemetry {
    /// Window derived from row height, wrapper height and current row.
    Geometry,
    /// Window reported as buffer positions by the host.
    Positions { first: usize, last: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Geometry {
    row_height: Option<f64>,
    wrapper_height: f64,
    current_row: usize,
}

impl Geometry {
    fn new(wrapper_height: f64) -> Self {
        Self {
            row_height: None,
            wrapper_height,
            current_row: 0,
        }
    }

    fn viewport(&self) -> Option<Viewport> {
        let row_height = self.row_height?;
        Some(Viewport::Pixels {
            height: self.wrapper_height,
            row_height,
            scroll_top: self.current_row as f64 * row_height,
        })
    }
}

/// Last `set_items` input, for change detection.
#[derive(Debug, Clone, PartialEq)]
struct Snapshot<T> {
    items: Vec<T>,
    start_index: usize,
    data_size: usize,
}

/// A lazily populated, virtualized list window.
#[derive(Debug, Clone)]
pub struct VirtualScroller<T> {
    config: ScrollerConfig,
    store: ItemStore<T>,
    snapshot: Option<Snapshot<T>>,
    start_index: usize,
    geometry: Geometry,
    telemetry: Telemetry,
    tracker: ScrollTracker,
    resolver: WindowResolver,
    trigger: FetchTrigger,
    navigator: SelectionNavigator,
    unlisted: Option<T>,
    loading: bool,
    awaiting_setup: bool,
    settled: bool,
    events: Vec<ScrollerEvent<T>>,
    diagnostics: Diagnostics,
}

impl<T> Default for VirtualScroller<T> {
    fn default() -> Self {
        Self::build(ScrollerConfig::default())
    }
}

impl<T> VirtualScroller<T> {
    /// Create a scroller after validating `config`.
    pub fn new(config: ScrollerConfig) -> Result<Self, Vec<ConfigError>> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ScrollerConfig) -> Self {
        Self {
            store: ItemStore::empty(0),
            snapshot: None,
            start_index: 0,
            geometry: Geometry::new(config.effective_height()),
            telemetry: Telemetry::Geometry,
            tracker: ScrollTracker::new(),
            resolver: WindowResolver::new().with_overscan(config.overscan),
            trigger: FetchTrigger::new(),
            navigator: SelectionNavigator::new(),
            unlisted: None,
            loading: false,
            awaiting_setup: config.delay_setup,
            settled: false,
            events: Vec::new(),
            diagnostics: Diagnostics::new(config.diagnostics_capacity),
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ScrollerConfig {
        &self.config
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &ItemStore<T> {
        &self.store
    }

    /// Total rows in the dataset.
    #[must_use]
    pub const fn data_size(&self) -> usize {
        self.store.data_size()
    }

    /// Index the current items were loaded from.
    #[must_use]
    pub const fn start_index(&self) -> usize {
        self.start_index
    }

    /// First row of the window.
    #[must_use]
    pub const fn current_row(&self) -> usize {
        self.geometry.current_row
    }

    /// Measured row height.
    #[must_use]
    pub const fn row_height(&self) -> Option<f64> {
        self.geometry.row_height
    }

    /// Height available for rows.
    #[must_use]
    pub const fn wrapper_height(&self) -> f64 {
        self.geometry.wrapper_height
    }

    /// Direction of the last scroll sample.
    #[must_use]
    pub const fn direction(&self) -> ScrollDirection {
        self.tracker.direction()
    }

    /// Current selection.
    #[must_use]
    pub const fn selection(&self) -> Selection {
        self.navigator.selection()
    }

    /// Setup phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.loading || self.awaiting_setup {
            Phase::Loading
        } else if self.store.data_size() == 0 || self.store.is_empty() {
            Phase::Empty
        } else if self.geometry.row_height.is_none() {
            Phase::Measuring
        } else if !self.settled {
            Phase::Settling
        } else {
            Phase::Ready
        }
    }

    /// Force or clear the loading phase.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Run a deferred setup. Also restarts measurement on a live scroller.
    pub fn setup(&mut self) {
        tracing::debug!(deferred = self.awaiting_setup, "setup");
        self.awaiting_setup = false;
        self.reset_geometry();
    }

    /// Queued events, oldest first.
    pub fn drain_events(&mut self) -> Vec<ScrollerEvent<T>> {
        mem::take(&mut self.events)
    }

    /// Recovered data-shape issues, oldest first.
    pub fn take_diagnostics(&mut self) -> Vec<ScrollerError> {
        self.diagnostics.drain()
    }

    /// Number of diagnostics waiting in [`VirtualScroller::take_diagnostics`].
    #[must_use]
    pub fn pending_diagnostics(&self) -> usize {
        self.diagnostics.len()
    }

    /// Feed a row height measurement.
    ///
    /// Only accepted while [`Phase::Measuring`]. Scrolls to the start index,
    /// derives the current row from it and shrinks the wrapper to the loaded
    /// rows if they do not fill it.
    pub fn report_row_height(&mut self, row_height: f64) -> bool {
        if self.phase() != Phase::Measuring {
            return false;
        }
        if !row_height.is_finite() || row_height <= 0.0 {
            tracing::debug!(row_height, "ignoring unusable row height");
            return false;
        }
        let data_size = self.store.data_size();
        let scroll_top = self.start_index.min(data_size) as f64 * row_height;
        let loaded = self.snapshot.as_ref().map_or(self.store.len(), |s| s.items.len());

        self.geometry.row_height = Some(row_height);
        self.geometry.current_row = rows_in(scroll_top, row_height).min(data_size);
        self.geometry.wrapper_height = (row_height * loaded as f64).min(self.geometry.wrapper_height);
        self.push(ScrollerEvent::ScrollTo(scroll_top));
        tracing::debug!(
            row_height,
            current_row = self.geometry.current_row,
            wrapper_height = self.geometry.wrapper_height,
            "rows measured"
        );
        true
    }

    /// Feed a scroll offset sample. Returns the derived direction.
    pub fn report_scroll_sample(&mut self, scroll_top: f64) -> ScrollDirection {
        let direction = self.tracker.sample(scroll_top);
        if let Some(row_height) = self.geometry.row_height {
            self.geometry.current_row = rows_in(scroll_top, row_height).min(self.store.data_size());
        }
        tracing::trace!(scroll_top, %direction, current_row = self.geometry.current_row, "scroll sample");
        direction
    }

    /// Pixel telemetry: viewport height, row height and scroll offset.
    ///
    /// Measures the rows if they are not measured yet and switches back to
    /// pixel-derived windows.
    pub fn report_viewport(&mut self, height_px: f64, row_height_px: f64, scroll_top_px: f64) {
        self.telemetry = Telemetry::Geometry;
        self.update_height(height_px);
        if self.geometry.row_height.is_none() {
            self.report_row_height(row_height_px);
        }
        self.report_scroll_sample(scroll_top_px);
    }

    /// Provider telemetry: first and last visible buffer positions.
    pub fn report_visible_range(&mut self, first_pos: usize, last_pos: usize) {
        self.telemetry = Telemetry::Positions {
            first: first_pos,
            last: last_pos,
        };
    }

    /// Override the wrapper height.
    pub fn update_height(&mut self, height_px: f64) {
        if height_px.is_finite() && height_px > 0.0 {
            self.geometry.wrapper_height = height_px;
        }
    }

    /// Back to the configured height.
    pub fn refresh_height(&mut self) {
        self.geometry.wrapper_height = self.config.effective_height();
    }

    /// Container geometry for the current phase.
    ///
    /// `None` until rows are measured. While settling the bottom spacer also
    /// covers the wrapper so the host can scroll to the start index before
    /// rows are materialized.
    #[must_use]
    pub fn layout(&self) -> Option<ScrollGeometry> {
        let phase = self.phase();
        if !matches!(phase, Phase::Settling | Phase::Ready) {
            return None;
        }
        let row_height = self.geometry.row_height?;
        let data_size = self.store.data_size();
        let list_size = rows_in(self.geometry.wrapper_height, row_height).min(data_size);
        let current_row = self.geometry.current_row;
        let remaining = data_size as f64 - list_size as f64 - current_row as f64;
        let mut bottom_padding = (remaining * row_height).max(0.0);
        if phase == Phase::Settling {
            bottom_padding += self.geometry.wrapper_height;
        }
        Some(ScrollGeometry {
            host_height: row_height * list_size as f64,
            top_padding: current_row as f64 * row_height,
            bottom_padding,
            width: self.config.width,
        })
    }

    /// Rows to render now. Empty until the scroller is live.
    #[must_use]
    pub fn visible_window(&self) -> VisibleSlice<'_, T> {
        match self.live_viewport() {
            Some(viewport) => self.resolver.resolve(&self.store, &viewport),
            None => VisibleSlice::empty(),
        }
    }

    /// Visible window without overscan.
    #[must_use]
    pub fn window(&self) -> Window {
        self.live_viewport()
            .map_or(Window::EMPTY, |viewport| self.resolver.window(&self.store, &viewport))
    }

    /// Present the visible rows, or the empty state.
    pub fn present_with<P>(&self, presenter: &P) -> Vec<P::Output>
    where
        P: RowPresenter<T>,
    {
        if self.phase() == Phase::Empty {
            return presenter.empty_state().into_iter().collect();
        }
        let selected = self.navigator.selection().list_id();
        self.visible_window()
            .into_rows()
            .into_iter()
            .map(|row| {
                let ctx = PresentContext {
                    selected: selected == Some(row.list_id()),
                    id_prop: &self.config.id_prop,
                    text_prop: &self.config.text_prop,
                    unsafe_render: self.config.unsafe_render,
                };
                presenter.present(row, &ctx)
            })
            .collect()
    }

    /// Grow the dataset, extending the placeholder tail to the new size.
    pub fn grow_data_size(&mut self, data_size: usize) -> bool {
        if !self.store.grow_data_size(data_size) {
            return false;
        }
        self.store.fill_gaps_with_placeholders(data_size);
        true
    }

    /// Scroll offset of row `index`, clamped to the dataset.
    pub fn scroll_to_index(&mut self, index: usize) -> Option<f64> {
        let row_height = self.geometry.row_height?;
        let data_size = self.store.data_size();
        let last = data_size.saturating_sub(1);
        if index > last {
            self.diagnostics.record(ScrollerError::IndexOutOfRange {
                requested: index,
                clamped: last,
                data_size,
            });
        }
        let px = index.min(last) as f64 * row_height;
        self.push(ScrollerEvent::ScrollTo(px));
        Some(px)
    }

    /// Shift the window toward a pending selection target.
    fn follow(&mut self, request: ScrollRequest, window: Window) {
        let start = request.window_start(window);
        if let Some(row_height) = self.geometry.row_height {
            if self.telemetry == Telemetry::Geometry {
                self.geometry.current_row = start;
            }
            self.push(ScrollerEvent::ScrollTo(start as f64 * row_height));
        }
    }

    fn live_viewport(&self) -> Option<Viewport> {
        let positions = match self.telemetry {
            Telemetry::Positions { first, last } => Some(Viewport::Positions { first, last }),
            Telemetry::Geometry => None,
        };
        match self.phase() {
            Phase::Loading | Phase::Empty => None,
            Phase::Measuring | Phase::Settling => positions,
            Phase::Ready => positions.or_else(|| self.geometry.viewport()),
        }
    }

    fn reset_geometry(&mut self) {
        self.geometry = Geometry::new(self.config.effective_height());
        self.tracker.reset();
        self.settled = false;
    }

    fn record_load(&mut self, requested: usize, report: LoadReport) {
        let data_size = self.store.data_size();
        if report.anchor_clamped {
            self.diagnostics.record(ScrollerError::IndexOutOfRange {
                requested,
                clamped: report.anchor,
                data_size,
            });
        }
        if report.dropped > 0 {
            self.diagnostics.record(ScrollerError::InvalidDataSize {
                data_size,
                dropped: report.dropped,
            });
        }
    }

    fn push(&mut self, event: ScrollerEvent<T>) {
        tracing::debug!(event = event.name(), "scroller event");
        self.events.push(event);
    }
}

impl<T: Keyed + Clone + PartialEq> VirtualScroller<T> {
    /// One evaluation pass.
    ///
    /// Clamps the current row, emits at most one [`ScrollerEvent::FetchNeeded`]
    /// and confirms a pending selection move whose row became visible. The
    /// first pass after measurement only settles the container.
    pub fn refresh(&mut self) -> Option<FetchRequest> {
        let _span = tracing::debug_span!("refresh", phase = ?self.phase()).entered();
        if self.phase() == Phase::Settling && self.telemetry == Telemetry::Geometry {
            self.settled = true;
            return None;
        }
        let mut viewport = self.live_viewport()?;
        if matches!(viewport, Viewport::Pixels { .. }) {
            self.geometry.current_row = self.resolver.window(&self.store, &viewport).start;
            viewport = self.geometry.viewport()?;
        }

        let direction = self.tracker.direction();
        let (request, reconciled) = {
            let visible = self.resolver.resolve(&self.store, &viewport);
            let request = self.trigger.evaluate(visible.rows(), direction);
            let base = WindowResolver::new().resolve(&self.store, &viewport);
            (request, self.navigator.reconcile(&base))
        };
        if let Some(request) = request {
            self.push(ScrollerEvent::FetchNeeded(request));
        }
        if let Some(target) = reconciled {
            self.emit_selection(target);
        }
        request
    }

    /// Replace the dataset.
    ///
    /// Rebuilds the store and restarts measurement unless `items`,
    /// `start_index` and `data_size` all equal the previous call. Returns
    /// whether a rebuild happened.
    pub fn set_items(&mut self, items: Vec<T>, start_index: usize, data_size: usize) -> bool {
        let snapshot = Snapshot {
            items,
            start_index,
            data_size,
        };
        if self.snapshot.as_ref() == Some(&snapshot) {
            return false;
        }
        let _span = tracing::debug_span!("set_items", start_index, data_size).entered();

        let slots = self.keyed_slots(snapshot.items.clone());
        let (mut store, report) = ItemStore::initialize_slots(slots, start_index, data_size);
        store.fill_gaps_with_placeholders(data_size);
        self.store = store;
        self.start_index = start_index;
        self.snapshot = Some(snapshot);
        self.navigator.clear();
        self.reset_geometry();
        self.record_load(start_index, report);
        true
    }

    /// Replace the dataset with a fully loaded one.
    pub fn set_all_items(&mut self, items: Vec<T>) -> bool {
        let data_size = items.len();
        self.set_items(items, 0, data_size)
    }

    /// Merge a fetched batch aligned at `anchor`.
    pub fn append_batch(&mut self, items: Vec<T>, anchor: usize, edge: Edge) -> LoadReport {
        let slots = self.keyed_slots(items);
        let report = self
            .store
            .merge_slots(slots, anchor, edge, self.config.merge_policy);
        self.record_load(anchor, report);
        report
    }

    /// Merge a batch fetched before the loaded span.
    pub fn append_beginning(&mut self, index: usize, items: Vec<T>) -> LoadReport {
        let report = self.append_batch(items, index, Edge::Begin);
        self.start_index = report.anchor;
        report
    }

    /// Merge a batch fetched after the loaded span.
    pub fn append_end(&mut self, index: usize, items: Vec<T>) -> LoadReport {
        self.append_batch(items, index, Edge::End)
    }

    /// Scroll to the first loaded item whose identity equals `id`.
    pub fn scroll_to_id(&mut self, id: &str) -> Option<f64> {
        let id_prop = &self.config.id_prop;
        let list_id = self
            .store
            .find_loaded(|item| item.identity(id_prop).as_deref() == Some(id))?
            .list_id();
        self.scroll_to_index(list_id)
    }

    /// Set or clear the out-of-band row past the end of the dataset.
    pub fn set_unlisted(&mut self, item: Option<T>) {
        self.navigator.set_unlisted(item.is_some());
        self.unlisted = item;
    }

    /// Select the first visible loaded row if the selection is not visible.
    pub fn select_default(&mut self) -> Option<SelectionTarget> {
        let viewport = self.live_viewport()?;
        let target = {
            let base = WindowResolver::new().resolve(&self.store, &viewport);
            self.navigator.select_default(&base)
        }?;
        self.emit_selection(target);
        Some(target)
    }

    /// Move the selection toward lower list ids.
    pub fn move_up(&mut self) -> Move {
        self.step(false)
    }

    /// Move the selection toward higher list ids.
    pub fn move_down(&mut self) -> Move {
        self.step(true)
    }

    /// Activate the selected item.
    pub fn confirm(&mut self) -> Option<ItemEvent<T>> {
        let target = self.navigator.selection().target()?;
        let event = self.item_event(target)?;
        self.push(ScrollerEvent::LineActivated(event.clone()));
        Some(event)
    }

    /// A line was clicked. Selects the row and activates it.
    pub fn click(&mut self, list_id: usize) -> Option<ItemEvent<T>> {
        let target = SelectionTarget::Row(list_id);
        let event = self.item_event(target)?;
        self.navigator.select(target);
        self.push(ScrollerEvent::LineActivated(event.clone()));
        Some(event)
    }

    fn step(&mut self, down: bool) -> Move {
        let Some(viewport) = self.live_viewport() else {
            return Move::Held;
        };
        let data_size = self.store.data_size();
        let (outcome, window) = {
            let base = WindowResolver::new().resolve(&self.store, &viewport);
            let outcome = if down {
                self.navigator.move_down(&base, data_size)
            } else {
                self.navigator.move_up(&base, data_size)
            };
            (outcome, base.window())
        };
        match outcome {
            Move::Moved(target) => self.emit_selection(target),
            Move::Pending(request) => self.follow(request, window),
            Move::Held => {}
        }
        outcome
    }

    fn emit_selection(&mut self, target: SelectionTarget) {
        if let Some(event) = self.item_event(target) {
            self.push(ScrollerEvent::SelectionChanged(event));
        }
    }

    fn item_event(&self, target: SelectionTarget) -> Option<ItemEvent<T>> {
        let (list_id, item) = match target {
            SelectionTarget::Row(list_id) => (Some(list_id), self.store.item(list_id)?),
            SelectionTarget::Unlisted => (None, self.unlisted.as_ref()?),
        };
        Some(ItemEvent {
            list_id,
            id: item.identity(&self.config.id_prop).map(|s| s.into_owned()),
            name: item.display(&self.config.text_prop).map(|s| s.into_owned()),
            item: item.clone(),
        })
    }

    /// Vacate entries without an identity, keeping the rest in place.
    fn keyed_slots(&mut self, items: Vec<T>) -> Vec<Option<T>> {
        let id_prop = &self.config.id_prop;
        let mut dropped = 0;
        let slots: Vec<Option<T>> = items
            .into_iter()
            .map(|item| {
                if item.identity(id_prop).is_some() {
                    Some(item)
                } else {
                    dropped += 1;
                    None
                }
            })
            .collect();
        if dropped > 0 {
            self.diagnostics.record(ScrollerError::MalformedBatch {
                id_prop: self.config.id_prop.clone(),
                dropped,
            });
        }
        slots
    }
}

impl<T> ScrollerEvent<T> {
    /// Stable event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FetchNeeded(_) => "fetch_needed",
            Self::SelectionChanged(_) => "selection_changed",
            Self::LineActivated(_) => "line_activated",
            Self::ScrollTo(_) => "scroll_to",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MergePolicy;
    use serde_json::{Value, json};

    fn rows(range: std::ops::Range<usize>) -> Vec<Value> {
        range.map(|i| json!({"id": i, "name": format!("row {i}")})).collect()
    }

    fn ready(items: Vec<Value>, start: usize, data_size: usize) -> VirtualScroller<Value> {
        let mut scroller = VirtualScroller::default();
        scroller.set_items(items, start, data_size);
        scroller.report_viewport(300.0, 30.0, start as f64 * 30.0);
        scroller.refresh();
        scroller.drain_events();
        scroller
    }

    #[test]
    fn phases_follow_setup() {
        let mut scroller: VirtualScroller<Value> = VirtualScroller::default();
        assert_eq!(scroller.phase(), Phase::Empty);
        scroller.set_items(rows(0..5), 0, 5);
        assert_eq!(scroller.phase(), Phase::Measuring);
        assert!(scroller.report_row_height(20.0));
        assert_eq!(scroller.phase(), Phase::Settling);
        assert_eq!(scroller.refresh(), None);
        assert_eq!(scroller.phase(), Phase::Ready);
        scroller.set_loading(true);
        assert_eq!(scroller.phase(), Phase::Loading);
    }

    #[test]
    fn delayed_setup_waits() {
        let config = ScrollerConfig::default().with_delay_setup(true);
        let mut scroller: VirtualScroller<Value> = VirtualScroller::new(config).unwrap();
        scroller.set_items(rows(0..5), 0, 5);
        assert_eq!(scroller.phase(), Phase::Loading);
        assert!(!scroller.report_row_height(20.0));
        scroller.setup();
        assert_eq!(scroller.phase(), Phase::Measuring);
    }

    #[test]
    fn measuring_scrolls_to_start_and_shrinks_wrapper() {
        let mut scroller: VirtualScroller<Value> = VirtualScroller::default();
        scroller.set_items(rows(0..4), 10, 50);
        assert!(scroller.report_row_height(25.0));
        assert_eq!(scroller.drain_events(), vec![ScrollerEvent::ScrollTo(250.0)]);
        assert_eq!(scroller.current_row(), 10);
        assert_eq!(scroller.wrapper_height(), 100.0);
    }

    #[test]
    fn identical_items_do_not_rebuild() {
        let mut scroller: VirtualScroller<Value> = VirtualScroller::default();
        assert!(scroller.set_items(rows(0..5), 0, 5));
        scroller.report_row_height(20.0);
        assert!(!scroller.set_items(rows(0..5), 0, 5));
        assert_eq!(scroller.row_height(), Some(20.0));
        assert!(scroller.set_items(rows(0..5), 0, 6));
        assert_eq!(scroller.row_height(), None);
    }

    #[test]
    fn scrolling_up_into_a_gap_requests_the_nearest_row() {
        let mut scroller = ready(rows(40..60), 40, 100);
        assert_eq!(scroller.refresh(), None);

        scroller.report_scroll_sample(1100.0);
        let request = scroller.refresh();
        assert_eq!(
            request,
            Some(FetchRequest {
                direction: ScrollDirection::Up,
                index: 39
            })
        );
        assert_eq!(
            scroller.drain_events(),
            vec![ScrollerEvent::FetchNeeded(FetchRequest {
                direction: ScrollDirection::Up,
                index: 39
            })]
        );

        scroller.append_beginning(20, rows(20..40));
        assert_eq!(scroller.start_index(), 20);
        assert_eq!(scroller.refresh(), None);
    }

    #[test]
    fn request_repeats_until_data_arrives() {
        let mut scroller = ready(rows(0..10), 0, 100);
        scroller.report_scroll_sample(200.0);
        let first = scroller.refresh();
        assert_eq!(first.map(|r| r.index), Some(10));
        assert_eq!(scroller.refresh(), first);
    }

    #[test]
    fn malformed_entries_become_placeholders() {
        let mut scroller: VirtualScroller<Value> = VirtualScroller::default();
        let items = vec![json!({"id": 1}), json!({"name": "no id"}), json!({"id": 3})];
        scroller.set_items(items, 0, 3);
        assert!(scroller.store().lookup(1).is_some_and(|row| row.is_placeholder()));
        assert_eq!(scroller.store().item(2), Some(&json!({"id": 3})));
        assert_eq!(
            scroller.take_diagnostics(),
            vec![ScrollerError::MalformedBatch {
                id_prop: "id".into(),
                dropped: 1
            }]
        );
    }

    #[test]
    fn out_of_range_anchor_is_recorded() {
        let mut scroller = ready(rows(0..10), 0, 10);
        scroller.append_end(15, rows(10..12));
        assert_eq!(scroller.pending_diagnostics(), 1);
        assert_eq!(
            scroller.take_diagnostics(),
            vec![ScrollerError::IndexOutOfRange {
                requested: 15,
                clamped: 10,
                data_size: 10
            }]
        );
    }

    #[test]
    fn merge_policy_comes_from_config() {
        let config = ScrollerConfig::default().with_merge_policy(MergePolicy::ConcatOrder);
        let mut scroller: VirtualScroller<Value> = VirtualScroller::new(config).unwrap();
        scroller.set_items(vec![json!({"id": "old"})], 3, 10);
        scroller.append_beginning(3, vec![json!({"id": "new"})]);
        assert_eq!(scroller.store().item(3), Some(&json!({"id": "new"})));
    }

    #[test]
    fn layout_matches_container_padding() {
        let mut scroller: VirtualScroller<Value> = VirtualScroller::default();
        scroller.set_items(rows(0..20), 20, 100);
        scroller.report_row_height(30.0);
        let settling = scroller.layout().unwrap();
        assert_eq!(settling.host_height, 300.0);
        assert_eq!(settling.top_padding, 600.0);
        assert_eq!(settling.bottom_padding, 70.0 * 30.0 + 300.0);

        scroller.refresh();
        let ready = scroller.layout().unwrap();
        assert_eq!(ready.bottom_padding, 70.0 * 30.0);
        assert_eq!(ready.width, None);
    }

    #[test]
    fn scroll_to_index_clamps() {
        let mut scroller = ready(rows(0..10), 0, 10);
        assert_eq!(scroller.scroll_to_index(3), Some(90.0));
        assert_eq!(scroller.scroll_to_index(99), Some(270.0));
        assert_eq!(scroller.take_diagnostics().len(), 1);
    }

    #[test]
    fn scroll_to_id_finds_loaded_item() {
        let mut scroller = ready(rows(0..10), 0, 10);
        assert_eq!(scroller.scroll_to_id("7"), Some(210.0));
        assert_eq!(scroller.scroll_to_id("77"), None);
    }

    #[test]
    fn click_activates_and_selects() {
        let mut scroller = ready(rows(0..10), 0, 10);
        let event = scroller.click(4).unwrap();
        assert_eq!(event.id.as_deref(), Some("4"));
        assert_eq!(event.name.as_deref(), Some("row 4"));
        assert_eq!(scroller.selection().list_id(), Some(4));
        assert_eq!(scroller.drain_events().len(), 1);
        assert!(scroller.click(40).is_none());
    }

    #[test]
    fn keyboard_moves_follow_the_window() {
        let mut scroller = ready(rows(0..30), 0, 30);
        assert_eq!(scroller.select_default(), Some(SelectionTarget::Row(0)));
        for _ in 0..9 {
            assert!(matches!(scroller.move_down(), Move::Moved(_)));
        }
        scroller.drain_events();

        assert!(matches!(scroller.move_down(), Move::Pending(_)));
        assert_eq!(scroller.drain_events(), vec![ScrollerEvent::ScrollTo(30.0)]);
        assert_eq!(scroller.current_row(), 1);

        assert_eq!(scroller.refresh(), None);
        assert_eq!(scroller.selection().list_id(), Some(10));
    }

    #[test]
    fn unlisted_item_is_selectable_past_the_end() {
        let mut scroller = ready(rows(0..3), 0, 3);
        scroller.set_unlisted(Some(json!({"id": "new", "name": "Add item"})));
        scroller.click(2);
        assert_eq!(scroller.move_down(), Move::Moved(SelectionTarget::Unlisted));
        let event = scroller.confirm().unwrap();
        assert_eq!(event.list_id, None);
        assert_eq!(event.name.as_deref(), Some("Add item"));
    }

    #[test]
    fn empty_dataset_presents_empty_state() {
        let mut scroller: VirtualScroller<Value> = VirtualScroller::default();
        scroller.set_items(Vec::new(), 0, 0);
        let lines = scroller.present_with(&crate::present::TextPresenter::new());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].content, crate::present::EMPTY_TEXT);
    }

    #[test]
    fn provider_positions_skip_measurement() {
        let mut scroller: VirtualScroller<Value> = VirtualScroller::default();
        scroller.set_items(rows(0..5), 0, 20);
        assert_eq!(scroller.store().span(), Some((0, 19)));
        scroller.report_visible_range(3, 7);
        let request = scroller.refresh();
        assert_eq!(request.map(|r| r.index), Some(5));
        assert_eq!(scroller.visible_window().window(), Window::new(3, 5));
    }

    #[test]
    fn set_items_fills_the_tail_with_placeholders() {
        let mut scroller: VirtualScroller<Value> = VirtualScroller::default();
        scroller.set_items(rows(0..5), 10, 30);
        assert_eq!(scroller.store().span(), Some((10, 29)));
        assert_eq!(scroller.store().loaded_count(), 5);
        assert_eq!(scroller.store().placeholder_count(), 15);
    }

    #[test]
    fn growing_data_size_extends_placeholders() {
        let mut scroller: VirtualScroller<Value> = VirtualScroller::default();
        scroller.set_items(rows(0..5), 0, 8);
        assert!(scroller.grow_data_size(12));
        assert_eq!(scroller.store().span(), Some((0, 11)));
        assert!(!scroller.grow_data_size(10));
        assert_eq!(scroller.data_size(), 12);

        scroller.report_visible_range(8, 11);
        assert_eq!(scroller.refresh().map(|r| r.index), Some(8));
    }

    #[test]
    fn confirmed_move_is_emitted_by_refresh() {
        let mut scroller = ready(rows(0..30), 0, 30);
        scroller.click(9);
        scroller.drain_events();
        assert!(matches!(scroller.move_down(), Move::Pending(_)));
        scroller.drain_events();
        scroller.refresh();
        let events = scroller.drain_events();
        assert!(matches!(
            events.as_slice(),
            [ScrollerEvent::SelectionChanged(ItemEvent { list_id: Some(10), .. })]
        ));
    }

    #[test]
    fn event_json_shape() {
        let event: ScrollerEvent<Value> = ScrollerEvent::FetchNeeded(FetchRequest {
            direction: ScrollDirection::Down,
            index: 60,
        });
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event": "fetch_needed", "detail": {"direction": "down", "index": 60}})
        );
    }
}
