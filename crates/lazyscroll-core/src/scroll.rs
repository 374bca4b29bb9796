#![forbid(unsafe_code)]

//! Scroll direction tracking.
//!
//! The direction is a hint only: it decides which end of a placeholder run a
//! fetch request points at. It is derived from the delta between consecutive
//! scroll-position samples and carried explicitly in [`ScrollTracker`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of the last scroll movement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    /// Toward lower list ids.
    Up,
    /// Toward higher list ids.
    Down,
    /// No movement between the last two samples.
    #[default]
    None,
}

impl ScrollDirection {
    /// Classify the move from `previous` to `current`.
    #[must_use]
    pub fn between(previous: f64, current: f64) -> Self {
        if current < previous {
            Self::Up
        } else if current > previous {
            Self::Down
        } else {
            Self::None
        }
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::None => "none",
        }
    }
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last scroll position and the direction derived from it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollTracker {
    last_scroll_top: f64,
    direction: ScrollDirection,
}

impl ScrollTracker {
    /// Tracker starting at the top with no direction.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_scroll_top: 0.0,
            direction: ScrollDirection::None,
        }
    }

    /// Feed a scroll position sample and return the new direction.
    pub fn sample(&mut self, scroll_top: f64) -> ScrollDirection {
        self.direction = ScrollDirection::between(self.last_scroll_top, scroll_top);
        self.last_scroll_top = scroll_top;
        self.direction
    }

    /// Direction from the last sample.
    #[must_use]
    pub const fn direction(&self) -> ScrollDirection {
        self.direction
    }

    /// Position from the last sample.
    #[must_use]
    pub const fn scroll_top(&self) -> f64 {
        self.last_scroll_top
    }

    /// Forget history, e.g. after a rebuild.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_follows_delta() {
        let mut tracker = ScrollTracker::new();
        assert_eq!(tracker.sample(120.0), ScrollDirection::Down);
        assert_eq!(tracker.sample(80.0), ScrollDirection::Up);
        assert_eq!(tracker.sample(80.0), ScrollDirection::None);
        assert_eq!(tracker.scroll_top(), 80.0);
    }

    #[test]
    fn reset_forgets_position() {
        let mut tracker = ScrollTracker::new();
        tracker.sample(500.0);
        tracker.reset();
        assert_eq!(tracker.direction(), ScrollDirection::None);
        assert_eq!(tracker.sample(10.0), ScrollDirection::Down);
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&ScrollDirection::Up).unwrap();
        assert_eq!(json, "\"up\"");
        assert_eq!(ScrollDirection::Down.to_string(), "down");
    }
}
