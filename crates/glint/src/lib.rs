//! Real-time debug-session annotation.
//!
//! Glint taps a Debug Adapter Protocol session, correlates its interleaved
//! message stream back to source lines, and renders what it learns as two
//! kinds of editor decoration:
//! - transient, fading execution highlights, and
//! - persistent per-line output history with hover detail.
//!
//! Data flow: transport → [`MessageCorrelator`] → `{`execution highlighter,
//! line history`}` → editor host. [`DebugObserver`] is the wiring: it owns
//! one correlation engine and both rendering consumers and receives the
//! transport callbacks.

pub mod observer;
pub mod replay;

pub use crate::observer::DebugObserver;
pub use glint_annotate::{AnnotateConfig, ConfigSource, EditorHost, InMemoryHost};
pub use glint_core::Location;
pub use glint_dap::{MessageCorrelator, Observation, TRACE_TARGET};
