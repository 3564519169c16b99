//! Editor-side annotation state machines for Glint.
//!
//! Two independent consumers of observed-output facts live here:
//! - [`ExecutionHighlighter`]: transient, fading background highlights with
//!   escalating color tiers, bounded by a configurable pool.
//! - [`LineHistoryDecorator`]: persistent per-line output history rendered as
//!   inline annotations with hover detail.
//!
//! The host editor is reached exclusively through the [`EditorHost`] trait;
//! [`InMemoryHost`] implements it over plain text buffers for tests and
//! headless use.

pub mod config;
pub mod editor;
pub mod highlight;
pub mod history;
pub mod memory;

pub use crate::config::{AnnotateConfig, ConfigSource, HighlightConfig, HistoryConfig};
pub use crate::editor::{DecorationId, DecorationSpan, DecorationStyle, EditorHost, LineInfo};
pub use crate::highlight::{ExecutionHighlighter, Highlighter};
pub use crate::history::{LineHistoryDecorator, CLEAR_LINE_HISTORY_COMMAND};
pub use crate::memory::InMemoryHost;
