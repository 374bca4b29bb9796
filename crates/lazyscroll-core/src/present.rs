#![forbid(unsafe_code)]

//! Row presentation hooks.
//!
//! The engine never paints. Consumers turn visible rows into whatever their
//! rendering layer needs by implementing [`RowPresenter`]; any
//! `Fn(Row<&T>, &PresentContext) -> O` closure works too. [`TextPresenter`]
//! is the default: the display field, a loading marker for placeholders, and
//! a "No items" line for the empty state.

use serde::{Deserialize, Serialize};

use crate::row::{Keyed, Row};

/// Placeholder text used by [`TextPresenter`].
pub const PLACEHOLDER_TEXT: &str = "Loading data!";

/// Empty-state text used by [`TextPresenter`].
pub const EMPTY_TEXT: &str = "No items";

/// Per-row information handed to a presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentContext<'a> {
    /// Whether this row is the current selection.
    pub selected: bool,
    /// Identity property name.
    pub id_prop: &'a str,
    /// Display property name.
    pub text_prop: &'a str,
    /// Pass raw markup through instead of display text.
    pub unsafe_render: bool,
}

/// Turns a visible row into a presentation value.
pub trait RowPresenter<T> {
    /// What a presented row looks like.
    type Output;

    /// Present one visible row.
    fn present(&self, row: Row<&T>, ctx: &PresentContext<'_>) -> Self::Output;

    /// Presentation for an empty list, if the presenter has one.
    fn empty_state(&self) -> Option<Self::Output> {
        None
    }
}

impl<T, O, F> RowPresenter<T> for F
where
    F: Fn(Row<&T>, &PresentContext<'_>) -> O,
{
    type Output = O;

    fn present(&self, row: Row<&T>, ctx: &PresentContext<'_>) -> O {
        self(row, ctx)
    }
}

/// What a [`PresentedLine`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Display text of a loaded item.
    Text,
    /// Raw markup of a loaded item (unsafe render mode).
    Markup,
    /// Loading marker.
    Placeholder,
    /// Empty-state message.
    Empty,
}

/// Output of [`TextPresenter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentedLine {
    /// Row this line belongs to; `None` for the empty state.
    pub list_id: Option<usize>,
    /// Content kind.
    pub kind: LineKind,
    /// Text or markup.
    pub content: String,
    /// Selected row highlight.
    pub active: bool,
}

/// Default text presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextPresenter {
    placeholder: Option<String>,
}

impl TextPresenter {
    /// Presenter with the stock placeholder text.
    #[must_use]
    pub const fn new() -> Self {
        Self { placeholder: None }
    }

    /// Override the placeholder text.
    #[must_use]
    pub fn with_placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = Some(text.into());
        self
    }

    fn placeholder_line(&self, list_id: usize, active: bool) -> PresentedLine {
        PresentedLine {
            list_id: Some(list_id),
            kind: LineKind::Placeholder,
            content: self
                .placeholder
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_TEXT.to_owned()),
            active,
        }
    }
}

impl<T: Keyed> RowPresenter<T> for TextPresenter {
    type Output = PresentedLine;

    fn present(&self, row: Row<&T>, ctx: &PresentContext<'_>) -> PresentedLine {
        let list_id = row.list_id();
        let Row::Loaded { item, .. } = row else {
            return self.placeholder_line(list_id, ctx.selected);
        };
        let (kind, content) = if ctx.unsafe_render {
            (LineKind::Markup, item.markup())
        } else {
            (LineKind::Text, item.display(ctx.text_prop))
        };
        match content {
            Some(content) => PresentedLine {
                list_id: Some(list_id),
                kind,
                content: content.into_owned(),
                active: ctx.selected,
            },
            // Loaded but nothing to show: same as still loading.
            None => self.placeholder_line(list_id, ctx.selected),
        }
    }

    fn empty_state(&self) -> Option<PresentedLine> {
        Some(PresentedLine {
            list_id: None,
            kind: LineKind::Empty,
            content: EMPTY_TEXT.to_owned(),
            active: false,
        })
    }
}
