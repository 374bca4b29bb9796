#![forbid(unsafe_code)]

//! Buffer rows and the identity/display accessors consumers read from items.
//!
//! A [`Row`] occupies exactly one logical index (`list_id`) of the dataset.
//! It either carries a loaded item or marks the slot as known-but-unloaded.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// One slot of the logical index space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Row<T> {
    /// Content for this index has arrived.
    Loaded {
        /// Global logical position, 0-based.
        list_id: usize,
        /// Caller payload.
        item: T,
    },
    /// The index is reserved but its content is not loaded yet.
    Placeholder {
        /// Global logical position, 0-based.
        list_id: usize,
    },
}

impl<T> Row<T> {
    /// Create a loaded row.
    #[must_use]
    pub const fn loaded(list_id: usize, item: T) -> Self {
        Self::Loaded { list_id, item }
    }

    /// Create a placeholder row.
    #[must_use]
    pub const fn placeholder(list_id: usize) -> Self {
        Self::Placeholder { list_id }
    }

    /// Logical index of this row.
    #[must_use]
    pub const fn list_id(&self) -> usize {
        match self {
            Self::Loaded { list_id, .. } | Self::Placeholder { list_id } => *list_id,
        }
    }

    /// Whether the slot still waits for content.
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }

    /// The loaded payload, if any.
    #[must_use = "use the returned item (if any)"]
    pub const fn item(&self) -> Option<&T> {
        match self {
            Self::Loaded { item, .. } => Some(item),
            Self::Placeholder { .. } => None,
        }
    }

    /// Consume the row, returning the payload if loaded.
    #[must_use = "use the returned item (if any)"]
    pub fn into_item(self) -> Option<T> {
        match self {
            Self::Loaded { item, .. } => Some(item),
            Self::Placeholder { .. } => None,
        }
    }

    /// Borrowed view of this row.
    #[must_use]
    pub const fn as_ref(&self) -> Row<&T> {
        match self {
            Self::Loaded { list_id, item } => Row::Loaded {
                list_id: *list_id,
                item,
            },
            Self::Placeholder { list_id } => Row::Placeholder { list_id: *list_id },
        }
    }
}

impl<T: Clone> Row<&T> {
    /// Clone a borrowed view into an owned row.
    #[must_use]
    pub fn cloned(&self) -> Row<T> {
        match self {
            Row::Loaded { list_id, item } => Row::Loaded {
                list_id: *list_id,
                item: (*item).clone(),
            },
            Row::Placeholder { list_id } => Row::Placeholder { list_id: *list_id },
        }
    }
}

/// Access to the identity and display fields of an item.
///
/// The field names come from configuration (`id_prop`, `text_prop`) so that
/// loosely-typed payloads such as JSON objects can be addressed by property
/// name. Typed payloads are free to ignore the name.
pub trait Keyed {
    /// Identity value under `prop`, or `None` if the item has none.
    fn identity(&self, prop: &str) -> Option<Cow<'_, str>>;

    /// Display text under `prop`.
    fn display(&self, prop: &str) -> Option<Cow<'_, str>>;

    /// Raw markup to pass through in unsafe render mode.
    fn markup(&self) -> Option<Cow<'_, str>> {
        None
    }
}

impl Keyed for serde_json::Value {
    fn identity(&self, prop: &str) -> Option<Cow<'_, str>> {
        scalar_field(self, prop)
    }

    fn display(&self, prop: &str) -> Option<Cow<'_, str>> {
        scalar_field(self, prop)
    }

    fn markup(&self) -> Option<Cow<'_, str>> {
        self.get("unsafeHTML")
            .and_then(serde_json::Value::as_str)
            .map(Cow::Borrowed)
    }
}

fn scalar_field<'a>(value: &'a serde_json::Value, prop: &str) -> Option<Cow<'a, str>> {
    match value.get(prop)? {
        serde_json::Value::String(s) if !s.is_empty() => Some(Cow::Borrowed(s.as_str())),
        serde_json::Value::Number(n) => Some(Cow::Owned(n.to_string())),
        serde_json::Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

impl Keyed for String {
    fn identity(&self, _prop: &str) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.as_str()))
    }

    fn display(&self, _prop: &str) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.as_str()))
    }
}
