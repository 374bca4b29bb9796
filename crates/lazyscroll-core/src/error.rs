#![forbid(unsafe_code)]

//! Data-shape diagnostics.
//!
//! None of these cross the public boundary as `Err`. The scroller clamps or
//! drops the offending input, logs it, and keeps the value around for
//! [`VirtualScroller::take_diagnostics`](crate::VirtualScroller::take_diagnostics).
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `InvalidDataSize` | dataSize smaller than the loaded span | Overflowing items dropped |
//! | `IndexOutOfRange` | anchor or scroll target outside `[0, dataSize)` | Clamped |
//! | `MalformedBatch` | batch entry without an identity | Slot left as a placeholder |

use std::collections::VecDeque;
use std::fmt;

/// A data-shape problem the engine recovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollerError {
    /// `data_size` cannot hold the rows it was given.
    InvalidDataSize {
        /// The data size in effect.
        data_size: usize,
        /// Number of rows that did not fit.
        dropped: usize,
    },
    /// An index fell outside the dataset and was clamped.
    IndexOutOfRange {
        /// The index as requested.
        requested: usize,
        /// The index actually used.
        clamped: usize,
        /// The data size in effect.
        data_size: usize,
    },
    /// Entries of a batch had no identity under `id_prop`.
    MalformedBatch {
        /// Identity property that was looked up.
        id_prop: String,
        /// Number of entries vacated.
        dropped: usize,
    },
}

impl fmt::Display for ScrollerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDataSize { data_size, dropped } => {
                write!(f, "data size {data_size} too small: dropped {dropped} rows")
            }
            Self::IndexOutOfRange {
                requested,
                clamped,
                data_size,
            } => write!(
                f,
                "index {requested} out of range for data size {data_size}, clamped to {clamped}"
            ),
            Self::MalformedBatch { id_prop, dropped } => {
                write!(f, "dropped {dropped} batch entries without '{id_prop}'")
            }
        }
    }
}

impl std::error::Error for ScrollerError {}

/// Bounded FIFO of recent diagnostics.
#[derive(Debug, Clone)]
pub(crate) struct Diagnostics {
    entries: VecDeque<ScrollerError>,
    capacity: usize,
}

impl Diagnostics {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    pub(crate) fn record(&mut self, error: ScrollerError) {
        tracing::warn!(%error, "recovered from data-shape issue");
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(error);
    }

    pub(crate) fn drain(&mut self) -> Vec<ScrollerError> {
        self.entries.drain(..).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
