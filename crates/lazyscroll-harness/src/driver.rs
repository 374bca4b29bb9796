#![forbid(unsafe_code)]

//! Scenario driver: plays the host around a [`VirtualScroller`].
//!
//! The driver applies scripted user actions, runs one refresh per step and
//! answers fetch requests from a [`FakeDataset`] after a configurable number
//! of steps. Requests for a page that is already in flight are skipped; the
//! scroller re-emits them every pass until the data lands.

use std::collections::{BTreeSet, VecDeque};

use lazyscroll_core::{
    Edge, FetchRequest, Move, Phase, ScrollDirection, ScrollerEvent, VirtualScroller, Window,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dataset::FakeDataset;

/// Host-side tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Rows per fetched page.
    pub page_size: usize,
    /// Steps between a request and its delivery.
    pub latency: u64,
    /// Height of one row in pixels.
    pub row_height: f64,
    /// Height of the viewport in pixels.
    pub viewport_height: f64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            latency: 1,
            row_height: 30.0,
            viewport_height: 300.0,
        }
    }
}

/// One scripted user action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "arg", rename_all = "snake_case")]
pub enum Action {
    /// Scroll to an absolute offset.
    ScrollTo(f64),
    /// Scroll by a relative offset.
    ScrollBy(f64),
    /// Selection up.
    KeyUp,
    /// Selection down.
    KeyDown,
    /// Activate the selection.
    Confirm,
    /// Click a row.
    Click(usize),
    /// Let time pass.
    Idle,
}

/// A page the host decided to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PagePlan {
    /// First row of the page.
    pub start: usize,
    /// Rows requested.
    pub len: usize,
    /// Merge edge.
    pub edge: Edge,
}

impl PagePlan {
    /// Page covering `request`: ending at its index when scrolling up,
    /// starting at it otherwise.
    #[must_use]
    pub fn for_request(request: FetchRequest, page_size: usize) -> Self {
        match request.direction {
            ScrollDirection::Up => {
                let end = request.index + 1;
                let start = end.saturating_sub(page_size);
                Self {
                    start,
                    len: end - start,
                    edge: Edge::Begin,
                }
            }
            ScrollDirection::Down | ScrollDirection::None => Self {
                start: request.index,
                len: page_size,
                edge: Edge::End,
            },
        }
    }
}

/// Counters over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverStats {
    /// `FetchNeeded` events seen.
    pub requests: u64,
    /// Requests skipped because their page was in flight.
    pub deduplicated: u64,
    /// Pages merged.
    pub delivered: u64,
    /// Rows merged.
    pub rows_delivered: u64,
}

/// What happened in one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step counter, 1-based.
    pub tick: u64,
    /// The action applied.
    pub action: Action,
    /// Scroller phase after the step.
    pub phase: Phase,
    /// Visible window after the step.
    pub window: Window,
    /// Scroll direction after the step.
    pub direction: ScrollDirection,
    /// Pages delivered at the start of the step.
    pub delivered: Vec<PagePlan>,
    /// Events drained during the step.
    pub events: Vec<ScrollerEvent<Value>>,
    /// Pages still in flight.
    pub in_flight: usize,
}

/// Drives a scroller through a scripted session.
#[derive(Debug)]
pub struct ScenarioDriver {
    scroller: VirtualScroller<Value>,
    dataset: FakeDataset,
    config: DriverConfig,
    tick: u64,
    scroll_top: f64,
    queue: VecDeque<(u64, PagePlan)>,
    in_flight: BTreeSet<PagePlan>,
    stats: DriverStats,
}

impl ScenarioDriver {
    /// Wrap `scroller`, serving pages from `dataset`.
    #[must_use]
    pub fn new(scroller: VirtualScroller<Value>, dataset: FakeDataset, config: DriverConfig) -> Self {
        Self {
            scroller,
            dataset,
            config,
            tick: 0,
            scroll_top: 0.0,
            queue: VecDeque::new(),
            in_flight: BTreeSet::new(),
            stats: DriverStats::default(),
        }
    }

    /// The scroller under test.
    #[must_use]
    pub const fn scroller(&self) -> &VirtualScroller<Value> {
        &self.scroller
    }

    /// Mutable access, for draining diagnostics or extra telemetry.
    pub const fn scroller_mut(&mut self) -> &mut VirtualScroller<Value> {
        &mut self.scroller
    }

    /// Counters so far.
    #[must_use]
    pub const fn stats(&self) -> DriverStats {
        self.stats
    }

    /// Current scroll offset of the simulated host.
    #[must_use]
    pub const fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    /// Load the first page at `start_index`, measure and settle.
    pub fn start(&mut self, start_index: usize) -> Phase {
        let _span = tracing::info_span!("start", start_index, size = self.dataset.size()).entered();
        let page = self.dataset.page(start_index, self.config.page_size);
        self.scroller
            .set_items(page, start_index, self.dataset.size());
        self.scroller.report_viewport(
            self.config.viewport_height,
            self.config.row_height,
            self.scroll_top,
        );
        for event in self.scroller.drain_events() {
            if let ScrollerEvent::ScrollTo(px) = event {
                self.scroll_top = px;
                self.scroller.report_scroll_sample(px);
            }
        }
        self.scroller.refresh();
        self.scroller.phase()
    }

    /// Apply one action and run a refresh pass.
    pub fn step(&mut self, action: Action) -> StepRecord {
        self.tick += 1;
        let delivered = self.deliver_due();

        match action {
            Action::ScrollTo(px) => self.scroll(px),
            Action::ScrollBy(delta) => self.scroll(self.scroll_top + delta),
            Action::KeyUp => self.key(false),
            Action::KeyDown => self.key(true),
            Action::Confirm => {
                self.scroller.confirm();
            }
            Action::Click(list_id) => {
                self.scroller.click(list_id);
            }
            Action::Idle => {}
        }

        self.scroller.refresh();
        let events = self.scroller.drain_events();
        for event in &events {
            match *event {
                ScrollerEvent::FetchNeeded(request) => self.schedule(request),
                ScrollerEvent::ScrollTo(px) => {
                    self.scroll_top = px;
                    self.scroller.report_scroll_sample(px);
                }
                _ => {}
            }
        }

        StepRecord {
            tick: self.tick,
            action,
            phase: self.scroller.phase(),
            window: self.scroller.window(),
            direction: self.scroller.direction(),
            delivered,
            events,
            in_flight: self.in_flight.len(),
        }
    }

    /// Run `actions` in order.
    pub fn run<I>(&mut self, actions: I) -> Vec<StepRecord>
    where
        I: IntoIterator<Item = Action>,
    {
        actions.into_iter().map(|action| self.step(action)).collect()
    }

    /// Step with [`Action::Idle`] until nothing is in flight, at most `limit` times.
    pub fn settle(&mut self, limit: usize) -> Vec<StepRecord> {
        let mut records = Vec::new();
        while !self.in_flight.is_empty() && records.len() < limit {
            records.push(self.step(Action::Idle));
        }
        records
    }

    fn scroll(&mut self, px: f64) {
        let content = self.dataset.size() as f64 * self.config.row_height;
        let max = (content - self.config.viewport_height).max(0.0);
        self.scroll_top = px.clamp(0.0, max);
        self.scroller.report_scroll_sample(self.scroll_top);
    }

    fn key(&mut self, down: bool) {
        if self.scroller.selection().target().is_none() {
            self.scroller.select_default();
            return;
        }
        let outcome = if down {
            self.scroller.move_down()
        } else {
            self.scroller.move_up()
        };
        tracing::debug!(?outcome, "key");
        if let Move::Pending(request) = outcome {
            tracing::debug!(list_id = request.list_id, "selection waits for scroll");
        }
    }

    fn schedule(&mut self, request: FetchRequest) {
        self.stats.requests += 1;
        let plan = PagePlan::for_request(request, self.config.page_size);
        if !self.in_flight.insert(plan) {
            self.stats.deduplicated += 1;
            return;
        }
        tracing::debug!(?plan, tick = self.tick, "page requested");
        self.queue.push_back((self.tick + self.config.latency, plan));
    }

    fn deliver_due(&mut self) -> Vec<PagePlan> {
        let mut delivered = Vec::new();
        while let Some(&(due, plan)) = self.queue.front() {
            if due > self.tick {
                break;
            }
            self.queue.pop_front();
            self.in_flight.remove(&plan);
            let page = self.dataset.page(plan.start, plan.len);
            self.stats.rows_delivered += page.len() as u64;
            match plan.edge {
                Edge::Begin => self.scroller.append_beginning(plan.start, page),
                Edge::End => self.scroller.append_end(plan.start, page),
            };
            self.stats.delivered += 1;
            delivered.push(plan);
        }
        delivered
    }
}
