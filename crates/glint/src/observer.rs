use std::time::Instant;

use glint_annotate::{ConfigSource, EditorHost, ExecutionHighlighter, LineHistoryDecorator};
use glint_dap::{MessageCorrelator, Observation};
use serde_json::Value;

/// Observes one debug session and drives both rendering consumers.
///
/// The transport collaborator delivers, per active session, the ordered
/// callbacks [`session_will_start`](Self::session_will_start), any number of
/// [`message_to_adapter`](Self::message_to_adapter) /
/// [`message_from_adapter`](Self::message_from_adapter), then
/// [`session_will_stop`](Self::session_will_stop). All state transitions run
/// synchronously on delivery; the host loop additionally drives
/// [`sweep`](Self::sweep) to expire highlight fades, scheduling wakeups off
/// [`next_fade`](Self::next_fade).
#[derive(Debug, Default)]
pub struct DebugObserver {
    correlator: MessageCorrelator,
    highlighter: ExecutionHighlighter,
    history: LineHistoryDecorator,
}

impl DebugObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn correlator(&self) -> &MessageCorrelator {
        &self.correlator
    }

    pub fn history(&self) -> &LineHistoryDecorator {
        &self.history
    }

    /// A session is starting: stale annotations from any previous run are
    /// wiped so the new run starts clean.
    pub fn session_will_start(&mut self, host: &mut dyn EditorHost, config: &dyn ConfigSource) {
        self.history.clear(host, config);
        self.correlator.session_started();
    }

    /// The session ended; correlation state is per-session and is forgotten.
    /// Line history deliberately survives until a document change or an
    /// explicit clear.
    pub fn session_will_stop(&mut self) {
        self.correlator.session_ended();
    }

    /// Observe a message travelling to the adapter.
    pub fn message_to_adapter(&mut self, message: &Value) {
        self.correlator.observe_outbound(message);
    }

    /// Observe a message coming from the adapter, fanning any observed
    /// output facts out to both consumers.
    pub fn message_from_adapter(
        &mut self,
        host: &mut dyn EditorHost,
        config: &dyn ConfigSource,
        message: &Value,
        now: Instant,
    ) {
        let mut observations: Vec<Observation> = Vec::new();
        self.correlator.observe_inbound(message, &mut observations);
        for observation in observations {
            self.highlighter
                .highlight(host, config, &observation.location, now);
            self.history
                .log(host, config, &observation.location, &observation.text);
        }
    }

    /// Release highlights whose fade deadline has passed.
    pub fn sweep(&mut self, host: &mut dyn EditorHost, now: Instant) {
        self.highlighter.sweep(host, now);
    }

    /// Earliest pending fade deadline, for scheduling the next sweep.
    pub fn next_fade(&self) -> Option<Instant> {
        self.highlighter.next_fade()
    }

    /// A document was edited: its history no longer matches its content.
    pub fn document_changed(
        &mut self,
        host: &mut dyn EditorHost,
        config: &dyn ConfigSource,
        resource: &str,
    ) {
        self.history.document_changed(host, config, resource);
    }

    /// The clear-line-history command, scoped to `line` or to the surface's
    /// selection when `line` is absent.
    pub fn clear_line_history(
        &mut self,
        host: &mut dyn EditorHost,
        config: &dyn ConfigSource,
        resource: &str,
        line: Option<u32>,
    ) {
        self.history.clear_command(host, config, resource, line);
    }

    /// Release every rendering resource on teardown.
    pub fn dispose(&mut self, host: &mut dyn EditorHost) {
        self.highlighter.dispose(host);
        self.history.dispose(host);
    }
}
