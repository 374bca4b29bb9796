#![forbid(unsafe_code)]

//! Keyboard-style selection over the materialized window.
//!
//! The navigator is a two-state machine, `Unselected` and `Selected(target)`.
//! Moves only land on rows that are loaded and visible. When the neighbor
//! is a valid index outside the window, the selection holds, the target is
//! remembered as pending, and a [`ScrollRequest`] asks the caller to shift the
//! window one row toward it. The next [`SelectionNavigator::reconcile`] then
//! confirms the move once the row is materialized.
//!
//! An optional out-of-band "unlisted" row acts as a sentinel one past the
//! last dataset row.

use serde::{Deserialize, Serialize};

use crate::row::Row;
use crate::window::{VisibleSlice, Window};

/// What the selection points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "list_id", rename_all = "snake_case")]
pub enum SelectionTarget {
    /// A dataset row.
    Row(usize),
    /// The sentinel row past the end of the dataset.
    Unlisted,
}

/// Navigator state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection {
    /// Nothing selected.
    #[default]
    Unselected,
    /// A target is selected.
    Selected(SelectionTarget),
}

impl Selection {
    /// The selected target, if any.
    #[must_use]
    pub const fn target(&self) -> Option<SelectionTarget> {
        match self {
            Self::Unselected => None,
            Self::Selected(target) => Some(*target),
        }
    }

    /// The selected dataset row, if any.
    #[must_use]
    pub const fn list_id(&self) -> Option<usize> {
        match self {
            Self::Selected(SelectionTarget::Row(id)) => Some(*id),
            _ => None,
        }
    }
}

/// How a scroll target should be aligned in the viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollAlign {
    /// Move the least distance that makes the row visible.
    #[default]
    Nearest,
}

/// Ask the resolver to bring `list_id` into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScrollRequest {
    /// Row that should become visible.
    pub list_id: usize,
    /// Alignment rule.
    pub align: ScrollAlign,
}

impl ScrollRequest {
    /// First visible row after applying this request to `window`.
    ///
    /// With nearest alignment a row just past either edge shifts the window
    /// by exactly one row.
    #[must_use]
    pub const fn window_start(&self, window: Window) -> usize {
        if self.list_id < window.start {
            self.list_id
        } else if window.len > 0 && self.list_id >= window.end() {
            self.list_id + 1 - window.len
        } else {
            window.start
        }
    }
}

/// Result of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// The selection changed.
    Moved(SelectionTarget),
    /// Nothing to move to; the selection holds.
    Held,
    /// The neighbor must be scrolled into view first.
    Pending(ScrollRequest),
}

/// Selection state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionNavigator {
    selection: Selection,
    pending: Option<SelectionTarget>,
    unlisted: bool,
}

impl SelectionNavigator {
    /// Navigator with nothing selected and no unlisted row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            selection: Selection::Unselected,
            pending: None,
            unlisted: false,
        }
    }

    /// Enable the sentinel row past the end.
    #[must_use]
    pub const fn with_unlisted(mut self, unlisted: bool) -> Self {
        self.unlisted = unlisted;
        self
    }

    /// Toggle the sentinel row. Clears a selection that pointed at it.
    pub fn set_unlisted(&mut self, unlisted: bool) {
        self.unlisted = unlisted;
        if !unlisted && self.selection == Selection::Selected(SelectionTarget::Unlisted) {
            self.selection = Selection::Unselected;
        }
    }

    /// Current state.
    #[must_use]
    pub const fn selection(&self) -> Selection {
        self.selection
    }

    /// Target waiting to be scrolled into view.
    #[must_use]
    pub const fn pending(&self) -> Option<SelectionTarget> {
        self.pending
    }

    /// Select `target` directly.
    pub fn select(&mut self, target: SelectionTarget) {
        self.selection = Selection::Selected(target);
        self.pending = None;
    }

    /// Back to `Unselected`.
    pub fn clear(&mut self) {
        self.selection = Selection::Unselected;
        self.pending = None;
    }

    /// Select the first visible loaded row when nothing is selected or the
    /// selected row left the visible set.
    ///
    /// Returns the new target when the selection changed.
    pub fn select_default<T>(&mut self, visible: &VisibleSlice<'_, T>) -> Option<SelectionTarget> {
        let keep = match self.selection {
            Selection::Selected(SelectionTarget::Unlisted) => true,
            Selection::Selected(SelectionTarget::Row(id)) => is_loaded(visible, id),
            Selection::Unselected => false,
        };
        if keep {
            return None;
        }
        let first = visible.rows().iter().find(|row| !row.is_placeholder())?;
        let target = SelectionTarget::Row(first.list_id());
        self.select(target);
        Some(target)
    }

    /// Move toward lower list ids.
    pub fn move_up<T>(&mut self, visible: &VisibleSlice<'_, T>, data_size: usize) -> Move {
        let current = match self.selection {
            Selection::Unselected => return self.start_from(visible),
            Selection::Selected(SelectionTarget::Unlisted) => {
                let Some(last) = data_size.checked_sub(1) else {
                    return Move::Held;
                };
                return self.step_to(visible, last);
            }
            Selection::Selected(SelectionTarget::Row(id)) => id,
        };

        let nearest = visible
            .rows()
            .iter()
            .rev()
            .find(|row| row.list_id() < current && !row.is_placeholder());
        if let Some(row) = nearest {
            let target = SelectionTarget::Row(row.list_id());
            self.select(target);
            return Move::Moved(target);
        }
        match current.checked_sub(1) {
            Some(neighbor) => self.step_to(visible, neighbor),
            None => Move::Held,
        }
    }

    /// Move toward higher list ids, then onto the unlisted row if enabled.
    pub fn move_down<T>(&mut self, visible: &VisibleSlice<'_, T>, data_size: usize) -> Move {
        let current = match self.selection {
            Selection::Unselected => return self.start_from(visible),
            Selection::Selected(SelectionTarget::Unlisted) => return Move::Held,
            Selection::Selected(SelectionTarget::Row(id)) => id,
        };

        let nearest = visible
            .rows()
            .iter()
            .find(|row| row.list_id() > current && !row.is_placeholder());
        if let Some(row) = nearest {
            let target = SelectionTarget::Row(row.list_id());
            self.select(target);
            return Move::Moved(target);
        }
        let neighbor = current + 1;
        if neighbor < data_size {
            self.step_to(visible, neighbor)
        } else if self.unlisted {
            self.select(SelectionTarget::Unlisted);
            Move::Moved(SelectionTarget::Unlisted)
        } else {
            Move::Held
        }
    }

    /// Confirm a pending move once its row is loaded and visible.
    pub fn reconcile<T>(&mut self, visible: &VisibleSlice<'_, T>) -> Option<SelectionTarget> {
        let Some(SelectionTarget::Row(id)) = self.pending else {
            return None;
        };
        if !is_loaded(visible, id) {
            return None;
        }
        let target = SelectionTarget::Row(id);
        self.select(target);
        Some(target)
    }

    fn start_from<T>(&mut self, visible: &VisibleSlice<'_, T>) -> Move {
        match self.select_default(visible) {
            Some(target) => Move::Moved(target),
            None => Move::Held,
        }
    }

    fn step_to<T>(&mut self, visible: &VisibleSlice<'_, T>, neighbor: usize) -> Move {
        if is_loaded(visible, neighbor) {
            let target = SelectionTarget::Row(neighbor);
            self.select(target);
            return Move::Moved(target);
        }
        if visible.window().contains(neighbor) {
            // Visible but still a placeholder; wait for data.
            return Move::Held;
        }
        self.pending = Some(SelectionTarget::Row(neighbor));
        Move::Pending(ScrollRequest {
            list_id: neighbor,
            align: ScrollAlign::Nearest,
        })
    }
}

fn is_loaded<T>(visible: &VisibleSlice<'_, T>, list_id: usize) -> bool {
    visible.get(list_id).is_some_and(|row: &Row<&T>| !row.is_placeholder())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ItemStore;
    use crate::window::materialize;

    fn store(start: usize, len: usize, data_size: usize) -> ItemStore<usize> {
        ItemStore::initialize((start..start + len).collect(), start, data_size).0
    }

    #[test]
    fn default_selects_first_loaded_visible() {
        let store = store(5, 5, 20);
        let slice = materialize(&store, Window::new(3, 6));
        let mut nav = SelectionNavigator::new();
        assert_eq!(nav.select_default(&slice), Some(SelectionTarget::Row(5)));
        // Already visible: no change.
        assert_eq!(nav.select_default(&slice), None);
    }

    #[test]
    fn default_reselects_when_selection_scrolled_away() {
        let store = store(0, 20, 20);
        let mut nav = SelectionNavigator::new();
        nav.select(SelectionTarget::Row(2));
        let slice = materialize(&store, Window::new(10, 5));
        assert_eq!(nav.select_default(&slice), Some(SelectionTarget::Row(10)));
    }

    #[test]
    fn move_within_window() {
        let store = store(0, 10, 10);
        let slice = materialize(&store, Window::new(0, 5));
        let mut nav = SelectionNavigator::new();
        nav.select(SelectionTarget::Row(2));
        assert_eq!(nav.move_down(&slice, 10), Move::Moved(SelectionTarget::Row(3)));
        assert_eq!(nav.move_up(&slice, 10), Move::Moved(SelectionTarget::Row(2)));
    }

    #[test]
    fn move_past_edge_requests_scroll_then_reconciles() {
        let store = store(0, 10, 10);
        let mut nav = SelectionNavigator::new();
        nav.select(SelectionTarget::Row(4));

        let slice = materialize(&store, Window::new(0, 5));
        let request = ScrollRequest {
            list_id: 5,
            align: ScrollAlign::Nearest,
        };
        assert_eq!(nav.move_down(&slice, 10), Move::Pending(request));
        assert_eq!(nav.selection().list_id(), Some(4));
        assert_eq!(request.window_start(slice.window()), 1);

        let shifted = materialize(&store, Window::new(1, 5));
        assert_eq!(nav.reconcile(&shifted), Some(SelectionTarget::Row(5)));
        assert_eq!(nav.pending(), None);
    }

    #[test]
    fn cannot_move_above_zero() {
        let store = store(0, 5, 5);
        let slice = materialize(&store, Window::new(0, 5));
        let mut nav = SelectionNavigator::new();
        nav.select(SelectionTarget::Row(0));
        assert_eq!(nav.move_up(&slice, 5), Move::Held);
    }

    #[test]
    fn cannot_move_past_end_without_unlisted() {
        let store = store(0, 5, 5);
        let slice = materialize(&store, Window::new(0, 5));
        let mut nav = SelectionNavigator::new();
        nav.select(SelectionTarget::Row(4));
        assert_eq!(nav.move_down(&slice, 5), Move::Held);
    }

    #[test]
    fn unlisted_row_is_sentinel_past_end() {
        let store = store(0, 5, 5);
        let slice = materialize(&store, Window::new(0, 5));
        let mut nav = SelectionNavigator::new().with_unlisted(true);
        nav.select(SelectionTarget::Row(4));
        assert_eq!(nav.move_down(&slice, 5), Move::Moved(SelectionTarget::Unlisted));
        assert_eq!(nav.move_down(&slice, 5), Move::Held);
        assert_eq!(nav.move_up(&slice, 5), Move::Moved(SelectionTarget::Row(4)));
    }

    #[test]
    fn skips_placeholders_to_nearest_loaded() {
        let mut store = store(0, 2, 10);
        store.merge_batch(vec![5], 5, crate::store::Edge::End, Default::default());
        let slice = materialize(&store, Window::new(0, 6));
        let mut nav = SelectionNavigator::new();
        nav.select(SelectionTarget::Row(1));
        assert_eq!(nav.move_down(&slice, 10), Move::Moved(SelectionTarget::Row(5)));
    }

    #[test]
    fn visible_placeholder_neighbor_holds() {
        let store = store(0, 3, 10);
        let slice = materialize(&store, Window::new(0, 5));
        let mut nav = SelectionNavigator::new();
        nav.select(SelectionTarget::Row(2));
        assert_eq!(nav.move_down(&slice, 10), Move::Held);
        assert_eq!(nav.pending(), None);
    }

    #[test]
    fn unselected_move_picks_default() {
        let store = store(0, 5, 5);
        let slice = materialize(&store, Window::new(1, 3));
        let mut nav = SelectionNavigator::new();
        assert_eq!(nav.move_down(&slice, 5), Move::Moved(SelectionTarget::Row(1)));
    }

    #[test]
    fn window_start_nearest() {
        let window = Window::new(10, 5);
        let up = ScrollRequest {
            list_id: 9,
            align: ScrollAlign::Nearest,
        };
        assert_eq!(up.window_start(window), 9);
        let inside = ScrollRequest {
            list_id: 12,
            align: ScrollAlign::Nearest,
        };
        assert_eq!(inside.window_start(window), 10);
    }
}
