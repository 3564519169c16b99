use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// An outbound protocol request, as observed on the wire.
///
/// Only the envelope is typed; `arguments` stays an opaque [`Value`] and is
/// decoded per command with [`decode`].
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub seq: u64,
    pub command: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// An inbound response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    pub request_seq: u64,
    pub success: bool,
    pub command: String,
    #[serde(default)]
    pub body: Option<Value>,
}

/// An inbound event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub event: String,
    #[serde(default)]
    pub body: Option<Value>,
}

/// A classified protocol message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProtocolMessage {
    Request(Request),
    Response(Response),
    Event(Event),
}

impl ProtocolMessage {
    /// Classify an already-decoded JSON value.
    ///
    /// Anything that does not carry a request/response/event envelope is
    /// irrelevant protocol traffic and yields `None`.
    pub fn classify(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// Decode a command-specific payload from an envelope's opaque body.
///
/// Absent or mismatched payloads yield `None`; the caller drops the branch it
/// was evaluating.
pub fn decode<T: DeserializeOwned>(body: &Option<Value>) -> Option<T> {
    body.as_ref()
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

/// Source descriptor attached to breakpoints and output events.
#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceBreakpoint {
    pub line: i64,
    #[serde(default)]
    pub log_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointsArguments {
    #[serde(default)]
    pub source: Option<Source>,
    #[serde(default)]
    pub breakpoints: Vec<SourceBreakpoint>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariablesArguments {
    pub variables_reference: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Variable {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariablesResponseBody {
    #[serde(default)]
    pub variables: Vec<Variable>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputEventBody {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub variables_reference: i64,
    #[serde(default)]
    pub line: Option<i64>,
    #[serde(default)]
    pub source: Option<Source>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_requests_responses_and_events() {
        let request = json!({
            "seq": 7,
            "type": "request",
            "command": "variables",
            "arguments": { "variablesReference": 1001 },
        });
        match ProtocolMessage::classify(&request) {
            Some(ProtocolMessage::Request(req)) => {
                assert_eq!(req.seq, 7);
                assert_eq!(req.command, "variables");
                let args: VariablesArguments = decode(&req.arguments).unwrap();
                assert_eq!(args.variables_reference, 1001);
            }
            other => panic!("unexpected classification: {other:?}"),
        }

        let response = json!({
            "seq": 8,
            "type": "response",
            "request_seq": 7,
            "success": true,
            "command": "variables",
        });
        assert!(matches!(
            ProtocolMessage::classify(&response),
            Some(ProtocolMessage::Response(resp)) if resp.request_seq == 7 && resp.success
        ));

        let event = json!({
            "seq": 9,
            "type": "event",
            "event": "output",
            "body": { "category": "stdout", "output": "hi\n" },
        });
        match ProtocolMessage::classify(&event) {
            Some(ProtocolMessage::Event(evt)) => {
                assert_eq!(evt.event, "output");
                let body: OutputEventBody = decode(&evt.body).unwrap();
                assert_eq!(body.category.as_deref(), Some("stdout"));
                assert_eq!(body.output, "hi\n");
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn unrecognized_traffic_is_not_classified() {
        assert!(ProtocolMessage::classify(&json!({ "jsonrpc": "2.0", "id": 1 })).is_none());
        assert!(ProtocolMessage::classify(&json!({ "type": "telemetry" })).is_none());
        // A request missing its `seq` is malformed, not a request.
        assert!(
            ProtocolMessage::classify(&json!({ "type": "request", "command": "variables" }))
                .is_none()
        );
    }

    #[test]
    fn breakpoint_arguments_tolerate_missing_fields() {
        let args: SetBreakpointsArguments = serde_json::from_value(json!({
            "source": {},
            "breakpoints": [
                { "line": 3 },
                { "line": 10, "logMessage": "x is {x}" },
            ],
        }))
        .unwrap();
        assert!(args.source.unwrap().path.is_none());
        assert_eq!(args.breakpoints.len(), 2);
        assert_eq!(args.breakpoints[0].log_message, None);
        assert_eq!(args.breakpoints[1].log_message.as_deref(), Some("x is {x}"));
    }

    #[test]
    fn output_body_defaults_cover_deferred_output() {
        let body: OutputEventBody = serde_json::from_value(json!({
            "category": "stdout",
            "variablesReference": 42,
            "line": 12,
            "source": { "path": "/a.ts" },
        }))
        .unwrap();
        assert_eq!(body.output, "");
        assert_eq!(body.variables_reference, 42);
        assert_eq!(body.line, Some(12));
    }
}
