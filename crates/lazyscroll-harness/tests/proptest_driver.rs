//! Property tests for simulated sessions.
//!
//! For any dataset shape, page size, latency and scroll script:
//!
//! 1. The store stays consistent after every step.
//! 2. Loaded rows are never lost.
//! 3. A page is never in flight twice.
//! 4. Once nothing is in flight the visible window is fully loaded.
//! 5. Two runs with the same inputs produce the same step records.

use lazyscroll_core::{Phase, ScrollerConfig, VirtualScroller};
use lazyscroll_harness::{Action, DriverConfig, FakeDataset, ScenarioDriver};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Session {
    data_size: usize,
    start: usize,
    page_size: usize,
    latency: u64,
    overscan: usize,
    actions: Vec<Action>,
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        4 => (-900.0f64..=900.0).prop_map(Action::ScrollBy),
        1 => (0.0f64..=20_000.0).prop_map(Action::ScrollTo),
        1 => Just(Action::KeyDown),
        1 => Just(Action::KeyUp),
        1 => Just(Action::Idle),
    ]
}

fn session_strategy() -> impl Strategy<Value = Session> {
    (1usize..=400)
        .prop_flat_map(|data_size| {
            (
                Just(data_size),
                0..data_size,
                5usize..=40,
                0u64..=3,
                0usize..=3,
                proptest::collection::vec(action_strategy(), 0..30),
            )
        })
        .prop_map(
            |(data_size, start, page_size, latency, overscan, actions)| Session {
                data_size,
                start,
                page_size,
                latency,
                overscan,
                actions,
            },
        )
}

fn driver(session: &Session) -> ScenarioDriver {
    let config = ScrollerConfig::default().with_overscan(session.overscan);
    let scroller = VirtualScroller::new(config).expect("valid config");
    ScenarioDriver::new(
        scroller,
        FakeDataset::new(session.data_size, 11),
        DriverConfig {
            page_size: session.page_size,
            latency: session.latency,
            ..DriverConfig::default()
        },
    )
}

// ═════════════════════════════════════════════════════════════════════════
// 1-3. Consistency, no lost rows, no duplicate fetches
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn sessions_keep_store_consistent(session in session_strategy()) {
        let mut driver = driver(&session);
        driver.start(session.start);
        let mut loaded = driver.scroller().store().loaded_count();

        for action in session.actions.iter().copied() {
            let record = driver.step(action);
            let store = driver.scroller().store();
            prop_assert!(store.is_consistent(), "tick {}", record.tick);
            prop_assert!(store.loaded_count() >= loaded, "tick {} lost rows", record.tick);
            loaded = store.loaded_count();
            prop_assert!(record.window.end() <= session.data_size);
        }

        let stats = driver.stats();
        prop_assert!(stats.delivered + stats.deduplicated <= stats.requests);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Settled sessions show no placeholders
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn settled_window_is_loaded(session in session_strategy()) {
        let mut driver = driver(&session);
        prop_assert_eq!(driver.start(session.start), Phase::Ready);
        driver.run(session.actions.iter().copied());
        // One idle step lets the last scroll raise its request.
        driver.step(Action::Idle);
        driver.settle(500);
        prop_assert!(
            !driver.scroller().visible_window().has_placeholders(),
            "window {:?}",
            driver.scroller().window()
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Determinism
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sessions_are_deterministic(session in session_strategy()) {
        let mut a = driver(&session);
        let mut b = driver(&session);
        a.start(session.start);
        b.start(session.start);
        prop_assert_eq!(
            a.run(session.actions.iter().copied()),
            b.run(session.actions.iter().copied())
        );
        prop_assert_eq!(a.stats(), b.stats());
    }
}
