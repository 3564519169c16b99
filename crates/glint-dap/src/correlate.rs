use std::collections::HashMap;

use glint_core::Location;
use serde_json::Value;

use crate::logpoints::{LogpointDefinition, LogpointTable};
use crate::messages::{
    decode, OutputEventBody, ProtocolMessage, SetBreakpointsArguments, VariablesArguments,
    VariablesResponseBody,
};

/// Tracing target for the full-message diagnostic trace.
///
/// Every observed message is emitted here at TRACE level, direction-tagged
/// and fully serialized. The channel is a side channel for debugging Glint
/// itself; it never affects correlation state, and an absent subscriber makes
/// it a no-op.
pub const TRACE_TARGET: &str = "glint.dap.trace";

/// A normalized observed-output fact: some runtime output `text` was produced
/// by the source line at `location`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub location: Location,
    pub text: String,
}

/// Consumer seam for observed-output facts.
pub trait ObservationSink {
    fn output_observed(&mut self, observation: Observation);
}

impl ObservationSink for Vec<Observation> {
    fn output_observed(&mut self, observation: Observation) {
        self.push(observation);
    }
}

/// A (path, 1-based line) pair as the protocol reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceRef {
    path: String,
    line: i64,
}

#[derive(Debug, Clone)]
struct PendingRequest {
    reference: i64,
    source: SourceRef,
}

/// The message correlation engine.
///
/// Consumes one message at a time, in strict delivery order, for exactly one
/// active session; reconstructs the causal links the protocol leaves
/// implicit and hands normalized [`Observation`]s to a sink. All state is
/// owned by the instance and scoped to the session it observes.
///
/// Correlation is necessarily heuristic: adapters often omit the source of
/// logpoint-generated stdout, and variable-expansion output arrives
/// asynchronously, joined back to its triggering event only through
/// transport-assigned identifiers (`variablesReference`, request `seq`).
/// Attribution failure is expected, not exceptional; unattributable messages
/// are dropped.
#[derive(Debug, Default)]
pub struct MessageCorrelator {
    logpoints: LogpointTable,
    pending_variables: HashMap<i64, SourceRef>,
    pending_requests: HashMap<u64, PendingRequest>,
}

impl MessageCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded logpoint definitions.
    pub fn logpoint_count(&self) -> usize {
        self.logpoints.len()
    }

    /// Number of deferred variable references awaiting expansion.
    pub fn pending_variable_count(&self) -> usize {
        self.pending_variables.len()
    }

    /// Number of in-flight "variables" requests bound to a location.
    pub fn pending_request_count(&self) -> usize {
        self.pending_requests.len()
    }

    /// A session is starting. Correlation tables are per-session and start
    /// empty; this only marks the trace channel.
    pub fn session_started(&mut self) {
        tracing::trace!(target: TRACE_TARGET, "session starting");
    }

    /// The observed session is ending: forget every logpoint definition and
    /// any unconsumed pending lookups.
    pub fn session_ended(&mut self) {
        tracing::trace!(target: TRACE_TARGET, "session stopping");
        self.logpoints.clear();
        self.pending_variables.clear();
        self.pending_requests.clear();
    }

    /// Observe a message travelling towards the adapter (a request).
    pub fn observe_outbound(&mut self, message: &Value) {
        tracing::trace!(target: TRACE_TARGET, direction = "<-", message = %message);

        let Some(ProtocolMessage::Request(request)) = ProtocolMessage::classify(message) else {
            return;
        };

        match request.command.as_str() {
            "setBreakpoints" => {
                let Some(args) = decode::<SetBreakpointsArguments>(&request.arguments) else {
                    return;
                };
                let Some(path) = args.source.and_then(|source| source.path) else {
                    return;
                };
                for breakpoint in args.breakpoints {
                    let Some(template) = breakpoint.log_message else {
                        continue;
                    };
                    match LogpointDefinition::new(path.clone(), breakpoint.line, &template) {
                        Some(definition) => self.logpoints.record(definition),
                        None => {
                            tracing::debug!(template = %template, "skipping uncompilable logpoint template");
                        }
                    }
                }
            }
            "variables" => {
                let Some(args) = decode::<VariablesArguments>(&request.arguments) else {
                    return;
                };
                // The pending entry stays; its removal is driven by response
                // arrival, and several requests may reference it.
                if let Some(source) = self.pending_variables.get(&args.variables_reference) {
                    self.pending_requests.insert(
                        request.seq,
                        PendingRequest {
                            reference: args.variables_reference,
                            source: source.clone(),
                        },
                    );
                }
            }
            _ => {}
        }
    }

    /// Observe a message travelling from the adapter (a response or event).
    pub fn observe_inbound(&mut self, message: &Value, sink: &mut dyn ObservationSink) {
        tracing::trace!(target: TRACE_TARGET, direction = "->", message = %message);

        match ProtocolMessage::classify(message) {
            Some(ProtocolMessage::Response(response)) => {
                if response.command != "variables" || !response.success {
                    return;
                }
                let Some(pending) = self.pending_requests.remove(&response.request_seq) else {
                    return;
                };
                self.pending_variables.remove(&pending.reference);

                let Some(body) = decode::<VariablesResponseBody>(&response.body) else {
                    return;
                };
                let text = body
                    .variables
                    .iter()
                    .map(|variable| variable.value.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
                emit(sink, &pending.source, text);
            }
            Some(ProtocolMessage::Event(event)) => {
                if event.event != "output" {
                    return;
                }
                let Some(body) = decode::<OutputEventBody>(&event.body) else {
                    return;
                };
                if body.category.as_deref() != Some("stdout") {
                    return;
                }

                // Deferred output: no literal text yet, a variables request
                // will fetch it later under this reference.
                if body.output.is_empty() && body.variables_reference != 0 {
                    if let (Some(path), Some(line)) =
                        (body.source.and_then(|source| source.path), body.line)
                    {
                        self.pending_variables
                            .insert(body.variables_reference, SourceRef { path, line });
                    }
                    return;
                }

                let source = match (body.source.and_then(|source| source.path), body.line) {
                    (Some(path), Some(line)) => SourceRef { path, line },
                    // Many adapters omit the source for logpoint output;
                    // impute it from the first matching template.
                    _ => match self.logpoints.attribute(&body.output) {
                        Some(definition) => SourceRef {
                            path: definition.path.clone(),
                            line: definition.line,
                        },
                        None => {
                            tracing::debug!(
                                output = %body.output,
                                "dropping stdout with no source and no matching logpoint"
                            );
                            return;
                        }
                    },
                };
                emit(sink, &source, body.output);
            }
            _ => {}
        }
    }
}

/// Emit a fact, converting the protocol's 1-based line to the zero-based
/// [`Location`] form. Lines that cannot be converted make the message
/// unattributable and it is dropped.
fn emit(sink: &mut dyn ObservationSink, source: &SourceRef, text: String) {
    let Some(line) = source
        .line
        .checked_sub(1)
        .and_then(|line| u32::try_from(line).ok())
    else {
        tracing::debug!(path = %source.path, line = source.line, "dropping fact with unusable line");
        return;
    };
    sink.output_observed(Observation {
        location: Location::new(source.path.clone(), line),
        text,
    });
}
