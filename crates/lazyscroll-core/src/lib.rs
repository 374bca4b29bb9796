#![forbid(unsafe_code)]

//! Lazily populated, virtualized list windows.
//!
//! A dataset of known size arrives in batches, out of order. The crate keeps
//! a sparse, index-addressed buffer of the rows seen so far, resolves which
//! rows are on screen, substitutes placeholders for the missing ones, and
//! tells the host which batch to load next.
//!
//! - [`store`]: the sparse buffer and batch merging.
//! - [`window`]: visible range math and materialization.
//! - [`fetch`]: one fetch request per evaluation pass.
//! - [`selection`]: keyboard-style selection over the visible rows.
//! - [`scroller`]: the [`VirtualScroller`] facade tying them together.
//!
//! Painting is left to the host; [`present`] offers a hook and a plain-text
//! default.

pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod present;
pub mod row;
pub mod scroll;
pub mod scroller;
pub mod selection;
pub mod store;
pub mod window;

pub use config::{ConfigError, ConfigParse, ScrollerConfig};
pub use error::ScrollerError;
pub use fetch::{FetchRequest, FetchTrigger};
pub use present::{PresentContext, PresentedLine, RowPresenter, TextPresenter};
pub use row::{Keyed, Row};
pub use scroll::{ScrollDirection, ScrollTracker};
pub use scroller::{ItemEvent, Phase, ScrollGeometry, ScrollerEvent, VirtualScroller};
pub use selection::{Move, Selection, SelectionNavigator, SelectionTarget};
pub use store::{Edge, ItemStore, LoadReport, MergePolicy};
pub use window::{Viewport, VisibleSlice, Window, WindowResolver};
