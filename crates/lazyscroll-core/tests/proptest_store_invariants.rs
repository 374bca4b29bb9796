//! Property-based invariant tests for the sparse store and window math.
//!
//! These hold for **any** sequence of initialize/merge operations and any
//! viewport telemetry:
//!
//! 1. Buffer stays strictly ascending and contiguous by `list_id`.
//! 2. Every `list_id` is below `data_size`.
//! 3. Loaded rows are never lost by a merge.
//! 4. Lookup agrees with a linear scan and never mutates.
//! 5. Merging the same batch twice is the same as merging it once.
//! 6. `visible_range` stays inside `[0, data_size)`.
//! 7. Materialized windows are contiguous and ascending.
//! 8. The trigger fires iff a placeholder is visible, pointing at the right end.

use lazyscroll_core::fetch::FetchTrigger;
use lazyscroll_core::row::Row;
use lazyscroll_core::scroll::ScrollDirection;
use lazyscroll_core::store::{Edge, ItemStore, MergePolicy};
use lazyscroll_core::window::{Window, materialize, rows_in, visible_range};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Batch {
    anchor: usize,
    len: usize,
    edge: Edge,
}

fn edge_strategy() -> impl Strategy<Value = Edge> {
    prop_oneof![Just(Edge::Begin), Just(Edge::End)]
}

fn policy_strategy() -> impl Strategy<Value = MergePolicy> {
    prop_oneof![Just(MergePolicy::PreferExisting), Just(MergePolicy::ConcatOrder)]
}

fn batch_strategy() -> impl Strategy<Value = Batch> {
    (0usize..=220, 0usize..=40, edge_strategy()).prop_map(|(anchor, len, edge)| Batch {
        anchor,
        len,
        edge,
    })
}

fn direction_strategy() -> impl Strategy<Value = ScrollDirection> {
    prop_oneof![
        Just(ScrollDirection::Up),
        Just(ScrollDirection::Down),
        Just(ScrollDirection::None),
    ]
}

/// Items tag their batch so collisions are observable.
fn items(tag: usize, len: usize) -> Vec<(usize, usize)> {
    (0..len).map(|i| (tag, i)).collect()
}

fn build(
    data_size: usize,
    start: usize,
    initial: usize,
    batches: &[Batch],
    policy: MergePolicy,
) -> ItemStore<(usize, usize)> {
    let (mut store, _) = ItemStore::initialize(items(0, initial), start, data_size);
    for (tag, batch) in batches.iter().enumerate() {
        store.merge_batch(items(tag + 1, batch.len), batch.anchor, batch.edge, policy);
    }
    store
}

fn assert_contiguous<T>(rows: &[Row<T>]) -> Result<(), TestCaseError> {
    for pair in rows.windows(2) {
        prop_assert_eq!(pair[0].list_id() + 1, pair[1].list_id());
    }
    Ok(())
}

// ═════════════════════════════════════════════════════════════════════════
// 1-2. Ordering, uniqueness and bounds
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn buffer_is_sorted_unique_and_bounded(
        data_size in 0usize..=200,
        start in 0usize..=220,
        initial in 0usize..=40,
        batches in proptest::collection::vec(batch_strategy(), 0..8),
        policy in policy_strategy(),
    ) {
        let store = build(data_size, start, initial, &batches, policy);
        prop_assert!(store.is_consistent());
        assert_contiguous(store.rows())?;
        for row in store.iter() {
            prop_assert!(row.list_id() < data_size);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Merges never lose loaded rows
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn loaded_rows_survive_merges(
        data_size in 1usize..=200,
        start in 0usize..=200,
        initial in 1usize..=40,
        batches in proptest::collection::vec(batch_strategy(), 1..8),
        policy in policy_strategy(),
    ) {
        let (mut store, _) = ItemStore::initialize(items(0, initial), start, data_size);
        for (tag, batch) in batches.iter().enumerate() {
            let before: Vec<usize> = store
                .iter()
                .filter(|row| !row.is_placeholder())
                .map(Row::list_id)
                .collect();
            store.merge_batch(items(tag + 1, batch.len), batch.anchor, batch.edge, policy);
            for id in before {
                prop_assert!(store.item(id).is_some(), "row {} lost", id);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Lookup agrees with a scan and does not mutate
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn lookup_matches_linear_scan(
        data_size in 1usize..=200,
        start in 0usize..=200,
        initial in 0usize..=40,
        batches in proptest::collection::vec(batch_strategy(), 0..4),
        target in 0usize..=250,
    ) {
        let store = build(data_size, start, initial, &batches, MergePolicy::default());
        let snapshot = store.clone();
        let expected = store.iter().find(|row| row.list_id() == target);
        prop_assert_eq!(store.lookup(target), expected);
        prop_assert_eq!(&store, &snapshot);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Idempotent merge
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn merge_twice_equals_merge_once(
        data_size in 1usize..=200,
        start in 0usize..=200,
        initial in 0usize..=40,
        batch in batch_strategy(),
        policy in policy_strategy(),
    ) {
        let (mut store, _) = ItemStore::initialize(items(0, initial), start, data_size);
        store.merge_batch(items(1, batch.len), batch.anchor, batch.edge, policy);
        let once = store.clone();
        store.merge_batch(items(1, batch.len), batch.anchor, batch.edge, policy);
        prop_assert_eq!(store, once);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Visible range bounds
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn visible_range_within_dataset(
        viewport in 0.0f64..=2000.0,
        row in -10.0f64..=80.0,
        top in -500.0f64..=50_000.0,
        data_size in 0usize..=500,
    ) {
        let window = visible_range(viewport, row, top, data_size);
        prop_assert!(window.end() <= data_size);
        if row <= 0.0 || data_size == 0 {
            prop_assert_eq!(window, Window::EMPTY);
        } else {
            prop_assert_eq!(window.len, rows_in(viewport, row).min(data_size));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Materialized windows
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn materialize_is_contiguous(
        data_size in 1usize..=200,
        start in 0usize..=200,
        initial in 0usize..=40,
        window_start in 0usize..=220,
        window_len in 0usize..=30,
    ) {
        let (store, _) = ItemStore::initialize(items(0, initial), start, data_size);
        let slice = materialize(&store, Window::new(window_start, window_len));
        assert_contiguous(slice.rows())?;
        prop_assert!(slice.window().end() <= data_size);
        prop_assert_eq!(slice.len(), slice.window().len);
        if let Some(first) = slice.rows().first() {
            prop_assert_eq!(first.list_id(), slice.window().start);
        }
        for row in slice.rows() {
            let stored = store.lookup(row.list_id());
            prop_assert_eq!(row.is_placeholder(), stored.is_none_or(Row::is_placeholder));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 8. Trigger fires iff placeholders are visible
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn trigger_iff_placeholders(
        data_size in 1usize..=200,
        start in 0usize..=200,
        initial in 0usize..=40,
        window_start in 0usize..=200,
        window_len in 1usize..=30,
        direction in direction_strategy(),
    ) {
        let (store, _) = ItemStore::initialize(items(0, initial), start, data_size);
        let slice = materialize(&store, Window::new(window_start, window_len));
        let placeholders: Vec<usize> = slice.placeholder_ids().collect();
        let request = FetchTrigger::new().evaluate(slice.rows(), direction);

        match (request, placeholders.first(), placeholders.last()) {
            (None, None, _) => {}
            (Some(request), Some(&first), Some(&last)) => {
                prop_assert_eq!(request.direction, direction);
                let expected = if direction == ScrollDirection::Up { last } else { first };
                prop_assert_eq!(request.index, expected);
            }
            (request, _, _) => {
                prop_assert!(false, "request {:?} for placeholders {:?}", request, placeholders);
            }
        }
    }
}
