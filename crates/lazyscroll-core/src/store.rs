#![forbid(unsafe_code)]

//! Sparse, index-addressed item buffer.
//!
//! [`ItemStore`] maps global logical indices (`list_id`) to [`Row`]s. Only a
//! fraction of the dataset is usually present; the rest is either a
//! placeholder or absent altogether.
//!
//! # Invariants
//!
//! 1. **Sorted**: rows are strictly ascending by `list_id`.
//! 2. **Unique**: at most one row per `list_id`.
//! 3. **Span-complete**: every id in `[min_loaded, max_loaded]` has a row.
//! 4. **Bounded**: every `list_id < data_size`.
//!
//! Every mutation restores all four before returning.
//!
//! # Operations
//!
//! | Operation | Time |
//! |-----------|------|
//! | [`ItemStore::lookup`] | O(log n) |
//! | [`ItemStore::merge_batch`] | O(n + m + gap) |
//! | [`ItemStore::fill_gaps_with_placeholders`] | O(data_size - min_loaded) |
//!
//! # Example
//!
//! ```
//! use lazyscroll_core::store::{Edge, ItemStore, MergePolicy};
//!
//! let (mut store, _) = ItemStore::initialize(vec!['a', 'b', 'c'], 9, 10);
//! assert_eq!(store.list_ids(), vec![7, 8, 9]);
//!
//! store.merge_batch(vec!['x', 'y'], 5, Edge::Begin, MergePolicy::default());
//! assert_eq!(store.list_ids(), vec![5, 6, 7, 8, 9]);
//! ```

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::row::Row;

/// Which end of the loaded span a batch was fetched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// Backfill before the loaded span. Ids are plain offsets from the anchor.
    Begin,
    /// Extend after the loaded span. The run is shifted left if it would
    /// overflow `data_size`.
    End,
}

/// How two loaded rows competing for the same `list_id` are resolved.
///
/// A loaded row beats a placeholder under every policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// The row that arrived first is kept.
    #[default]
    PreferExisting,
    /// First occurrence in edge concatenation order: the batch goes before
    /// the buffer for [`Edge::Begin`] and after it for [`Edge::End`].
    ConcatOrder,
}

impl MergePolicy {
    /// Parse from a config string.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "prefer_existing" | "prefer-existing" | "existing" => Some(Self::PreferExisting),
            "concat_order" | "concat-order" | "concat" => Some(Self::ConcatOrder),
            _ => None,
        }
    }

    fn incoming_wins<T>(self, edge: Edge, existing: &Row<T>, incoming: &Row<T>) -> bool {
        match (existing.is_placeholder(), incoming.is_placeholder()) {
            (true, false) => true,
            (false, true) | (true, true) => false,
            (false, false) => match self {
                Self::PreferExisting => false,
                Self::ConcatOrder => edge == Edge::Begin,
            },
        }
    }
}

/// What happened to the rows handed to [`ItemStore::initialize`] or
/// [`ItemStore::merge_batch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Input rows now present in the buffer.
    pub placed: usize,
    /// Input rows whose id fell outside `[0, data_size)`.
    pub dropped: usize,
    /// Existing rows replaced by input rows.
    pub superseded: usize,
    /// Placeholders inserted to keep the span contiguous.
    pub gap_filled: usize,
    /// Anchor actually used.
    pub anchor: usize,
    /// Whether the requested anchor had to be clamped.
    pub anchor_clamped: bool,
}

/// Sparse buffer of rows keyed by `list_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemStore<T> {
    rows: Vec<Row<T>>,
    data_size: usize,
}

impl<T> Default for ItemStore<T> {
    fn default() -> Self {
        Self::empty(0)
    }
}

impl<T> ItemStore<T> {
    /// An empty store over a dataset of `data_size` rows.
    #[must_use]
    pub const fn empty(data_size: usize) -> Self {
        Self {
            rows: Vec::new(),
            data_size,
        }
    }

    /// Lay `items` out contiguously from `start_index`.
    ///
    /// `list_id = start + offset + min(data_size - (start + len), 0)`: the run
    /// is shifted left so it never extends past the end of the dataset. Items
    /// that would land below zero (more items than `data_size`) are dropped.
    #[must_use]
    pub fn initialize(items: Vec<T>, start_index: usize, data_size: usize) -> (Self, LoadReport) {
        Self::initialize_slots(items.into_iter().map(Some).collect(), start_index, data_size)
    }

    /// Like [`ItemStore::initialize`], with vacant slots laid out as
    /// placeholders so the ids of the remaining items do not move.
    #[must_use]
    pub fn initialize_slots(
        slots: Vec<Option<T>>,
        start_index: usize,
        data_size: usize,
    ) -> (Self, LoadReport) {
        let mut store = Self::empty(data_size);
        let len = slots.len();
        let anchor = start_index.min(data_size);
        let mut report = LoadReport {
            anchor,
            anchor_clamped: anchor != start_index,
            ..LoadReport::default()
        };
        if data_size == 0 {
            report.dropped = slots.iter().filter(|slot| slot.is_some()).count();
            return (store, report);
        }

        let first = first_list_id(anchor, len, data_size, Edge::End);
        let placement = place(slots, first, data_size);
        report.placed = placement.loaded;
        report.dropped = placement.dropped;
        store.rows = placement.rows;

        tracing::debug!(
            start_index,
            data_size,
            placed = report.placed,
            dropped = report.dropped,
            "store initialized"
        );
        debug_assert!(store.is_consistent());
        (store, report)
    }

    /// Total rows in the dataset.
    #[must_use]
    pub const fn data_size(&self) -> usize {
        self.data_size
    }

    /// Grow the dataset. Shrinking requires a rebuild and is ignored.
    ///
    /// Returns whether the size changed.
    pub fn grow_data_size(&mut self, data_size: usize) -> bool {
        if data_size > self.data_size {
            self.data_size = data_size;
            true
        } else {
            false
        }
    }

    /// Number of rows in the buffer, placeholders included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the buffer holds no rows at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows carrying content.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.rows.iter().filter(|row| !row.is_placeholder()).count()
    }

    /// Rows waiting for content.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.rows.iter().filter(|row| row.is_placeholder()).count()
    }

    /// `(min, max)` list ids present in the buffer.
    #[must_use]
    pub fn span(&self) -> Option<(usize, usize)> {
        let first = self.rows.first()?;
        let last = self.rows.last()?;
        Some((first.list_id(), last.list_id()))
    }

    /// All rows in ascending `list_id` order.
    #[must_use]
    pub fn rows(&self) -> &[Row<T>] {
        &self.rows
    }

    /// Iterate rows in ascending `list_id` order.
    pub fn iter(&self) -> std::slice::Iter<'_, Row<T>> {
        self.rows.iter()
    }

    /// Every list id in the buffer, in order.
    #[must_use]
    pub fn list_ids(&self) -> Vec<usize> {
        self.rows.iter().map(Row::list_id).collect()
    }

    /// Buffer position of `list_id`. O(log n), never mutates.
    #[must_use]
    pub fn position_of(&self, list_id: usize) -> Option<usize> {
        self.search(list_id).0.ok()
    }

    /// Row at `list_id`, if present.
    #[must_use = "use the returned row (if any)"]
    pub fn lookup(&self, list_id: usize) -> Option<&Row<T>> {
        self.position_of(list_id).map(|pos| &self.rows[pos])
    }

    /// Loaded item at `list_id`, if present.
    #[must_use = "use the returned item (if any)"]
    pub fn item(&self, list_id: usize) -> Option<&T> {
        self.lookup(list_id).and_then(Row::item)
    }

    /// Rows between buffer positions `first..=last`, clamped to the buffer.
    #[must_use]
    pub fn rows_between(&self, first: usize, last: usize) -> &[Row<T>] {
        if self.rows.is_empty() || first > last {
            return &[];
        }
        let start = first.min(self.rows.len());
        let end = last.saturating_add(1).min(self.rows.len());
        &self.rows[start..end]
    }

    /// First loaded row whose item satisfies `predicate`.
    pub fn find_loaded<F>(&self, mut predicate: F) -> Option<&Row<T>>
    where
        F: FnMut(&T) -> bool,
    {
        self.rows
            .iter()
            .find(|row| row.item().is_some_and(&mut predicate))
    }

    /// Merge a freshly fetched batch aligned at `anchor`.
    ///
    /// Ids are assigned from `anchor` according to `edge`; the anchor is
    /// clamped to `[0, data_size]` and rows outside the dataset are dropped.
    /// Collisions are settled by `policy`. Interior gaps the batch opens up
    /// are filled with placeholders. An empty batch is a no-op.
    ///
    /// Ids are positional, so a single batch cannot collide with itself.
    pub fn merge_batch(
        &mut self,
        batch: Vec<T>,
        anchor: usize,
        edge: Edge,
        policy: MergePolicy,
    ) -> LoadReport {
        self.merge_slots(batch.into_iter().map(Some).collect(), anchor, edge, policy)
    }

    /// Like [`ItemStore::merge_batch`], with vacant slots merged as
    /// placeholders.
    pub fn merge_slots(
        &mut self,
        slots: Vec<Option<T>>,
        anchor: usize,
        edge: Edge,
        policy: MergePolicy,
    ) -> LoadReport {
        let clamped = anchor.min(self.data_size);
        let mut report = LoadReport {
            anchor: clamped,
            anchor_clamped: clamped != anchor,
            ..LoadReport::default()
        };
        if slots.is_empty() {
            return report;
        }

        let first = first_list_id(clamped, slots.len(), self.data_size, edge);
        let placement = place(slots, first, self.data_size);
        report.placed = placement.loaded;
        report.dropped = placement.dropped;

        let outcome = self.merge_rows(placement.rows, edge, policy);
        report.superseded = outcome.superseded;
        report.placed -= outcome.rejected;
        report.gap_filled = outcome.gap_filled;

        tracing::debug!(
            anchor,
            ?edge,
            placed = report.placed,
            dropped = report.dropped,
            superseded = report.superseded,
            gap_filled = report.gap_filled,
            rows = self.rows.len(),
            "batch merged"
        );
        report
    }

    /// Insert a placeholder for every missing id in `[min_loaded, data_size)`.
    ///
    /// Returns the number of placeholders added. Does nothing on an empty
    /// store since there is no `min_loaded` to start from.
    pub fn fill_gaps_with_placeholders(&mut self, data_size: usize) -> usize {
        self.grow_data_size(data_size);
        let Some((_, max)) = self.span() else {
            return 0;
        };
        let end = data_size.min(self.data_size);
        let tail: Vec<Row<T>> = (max.saturating_add(1)..end).map(Row::placeholder).collect();
        let tail_len = tail.len();
        let outcome = self.merge_rows(tail, Edge::End, MergePolicy::PreferExisting);
        outcome.gap_filled + tail_len
    }

    /// Check all store invariants.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let bounded = self
            .rows
            .last()
            .is_none_or(|row| row.list_id() < self.data_size);
        bounded
            && self
                .rows
                .windows(2)
                .all(|pair| pair[0].list_id() + 1 == pair[1].list_id())
    }

    /// Binary search returning the comparison count alongside the result.
    fn search(&self, list_id: usize) -> (Result<usize, usize>, u32) {
        let mut comparisons = 0u32;
        let mut lo = 0usize;
        let mut hi = self.rows.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            comparisons += 1;
            match self.rows[mid].list_id().cmp(&list_id) {
                Ordering::Equal => return (Ok(mid), comparisons),
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
            }
        }
        (Err(lo), comparisons)
    }

    /// Two-way merge of the buffer with `incoming` (ascending, unique).
    fn merge_rows(&mut self, incoming: Vec<Row<T>>, edge: Edge, policy: MergePolicy) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        let existing = std::mem::take(&mut self.rows);
        let mut merged = Vec::with_capacity(existing.len() + incoming.len());
        let mut old = existing.into_iter().peekable();
        let mut new = incoming.into_iter().peekable();

        loop {
            let next = match (old.peek().map(Row::list_id), new.peek().map(Row::list_id)) {
                (Some(a), Some(b)) => match a.cmp(&b) {
                    Ordering::Less => old.next(),
                    Ordering::Greater => new.next(),
                    Ordering::Equal => {
                        let (Some(kept), Some(fresh)) = (old.next(), new.next()) else {
                            break;
                        };
                        if policy.incoming_wins(edge, &kept, &fresh) {
                            outcome.superseded += 1;
                            Some(fresh)
                        } else {
                            outcome.rejected += usize::from(!fresh.is_placeholder());
                            Some(kept)
                        }
                    }
                },
                (Some(_), None) => old.next(),
                (None, Some(_)) => new.next(),
                (None, None) => None,
            };
            let Some(row) = next else { break };
            outcome.gap_filled += push_contiguous(&mut merged, row);
        }

        self.rows = merged;
        debug_assert!(self.is_consistent());
        outcome
    }
}

#[derive(Debug, Default)]
struct MergeOutcome {
    superseded: usize,
    rejected: usize,
    gap_filled: usize,
}

/// Push `row`, first padding with placeholders up to its id.
fn push_contiguous<T>(rows: &mut Vec<Row<T>>, row: Row<T>) -> usize {
    let mut added = 0;
    if let Some(last) = rows.last().map(Row::list_id) {
        for gap in last + 1..row.list_id() {
            rows.push(Row::placeholder(gap));
            added += 1;
        }
    }
    rows.push(row);
    added
}

/// Id of the first element of a run of `len` rows aligned at `anchor`.
fn first_list_id(anchor: usize, len: usize, data_size: usize, edge: Edge) -> i64 {
    let anchor = to_i64(anchor);
    match edge {
        Edge::Begin => anchor,
        Edge::End => {
            let overflow = to_i64(data_size) - (anchor + to_i64(len));
            anchor + overflow.min(0)
        }
    }
}

/// Rows produced from a run of slots.
struct Placement<T> {
    rows: Vec<Row<T>>,
    loaded: usize,
    dropped: usize,
}

/// Assign positional ids from `first`, dropping those outside the dataset.
/// Vacant slots inside the dataset become placeholders.
fn place<T>(slots: Vec<Option<T>>, first: i64, data_size: usize) -> Placement<T> {
    let bound = to_i64(data_size);
    let mut placement = Placement {
        rows: Vec::with_capacity(slots.len()),
        loaded: 0,
        dropped: 0,
    };
    for (slot, id) in slots.into_iter().zip(first..) {
        let list_id = usize::try_from(id).ok().filter(|_| id < bound);
        match (list_id, slot) {
            (Some(list_id), Some(item)) => {
                placement.rows.push(Row::loaded(list_id, item));
                placement.loaded += 1;
            }
            (Some(list_id), None) => placement.rows.push(Row::placeholder(list_id)),
            (None, Some(_)) => placement.dropped += 1,
            (None, None) => {}
        }
    }
    placement
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
