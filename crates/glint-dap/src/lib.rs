//! Debug Adapter Protocol observation for Glint.
//!
//! This crate provides:
//! - A serde model for the small DAP subset Glint watches (requests,
//!   responses and events delivered as already-decoded JSON values).
//! - Logpoint bookkeeping and best-effort template matching.
//! - The message correlation engine that turns an interleaved protocol
//!   stream into normalized "(location, text) observed" facts.
//! - A Content-Length stdio framing codec for transports that tap a live
//!   adapter connection.

pub mod codec;
pub mod correlate;
pub mod logpoints;
pub mod messages;

pub use crate::correlate::{MessageCorrelator, Observation, ObservationSink, TRACE_TARGET};
pub use crate::logpoints::{LogpointDefinition, LogpointTable};
pub use crate::messages::ProtocolMessage;
