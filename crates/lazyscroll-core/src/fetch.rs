#![forbid(unsafe_code)]

//! Fetch signalling.
//!
//! [`FetchTrigger::evaluate`] inspects a materialized window and, if any row
//! is a placeholder, describes the single load the caller should start. The
//! trigger is stateless: it keeps no record of requests in flight, so the
//! same request comes back on the next pass until the data arrives. Callers
//! de-duplicate.

use serde::{Deserialize, Serialize};

use crate::row::Row;
use crate::scroll::ScrollDirection;

/// Request for more data around `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Scroll direction at evaluation time.
    pub direction: ScrollDirection,
    /// List id of the placeholder the load should start from.
    pub index: usize,
}

/// Emits at most one [`FetchRequest`] per evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchTrigger;

impl FetchTrigger {
    /// Create a trigger.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Scan `rows` for placeholders.
    ///
    /// Returns `None` iff there are none. Otherwise the request points at the
    /// last placeholder when scrolling up (the edge closest to the loaded rows
    /// below it) and at the first placeholder in every other case.
    #[must_use]
    pub fn evaluate<T>(&self, rows: &[Row<T>], direction: ScrollDirection) -> Option<FetchRequest> {
        let mut placeholders = rows.iter().filter(|row| row.is_placeholder());
        let first = placeholders.next()?;
        let index = match direction {
            ScrollDirection::Up => placeholders.last().unwrap_or(first).list_id(),
            ScrollDirection::Down | ScrollDirection::None => first.list_id(),
        };
        let request = FetchRequest { direction, index };
        tracing::debug!(%direction, index, "fetch needed");
        Some(request)
    }
}
