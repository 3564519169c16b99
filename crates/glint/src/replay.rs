use serde_json::Value;
use thiserror::Error;

/// Direction of a captured message, relative to the debug adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Editor → adapter (requests).
    ToAdapter,
    /// Adapter → editor (responses and events).
    FromAdapter,
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("line {line}: missing direction marker (`->` or `<-`)")]
    MissingMarker { line: usize },
    #[error("line {line}: invalid JSON payload: {source}")]
    InvalidJson {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// One captured message from a trace file.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    pub direction: Direction,
    pub message: Value,
}

/// Parse one line of the capture format the trace channel emits:
/// `-> {json}` for adapter-to-editor traffic, `<- {json}` for
/// editor-to-adapter traffic. Blank lines yield `Ok(None)`.
pub fn parse_trace_line(line_no: usize, line: &str) -> Result<Option<TraceEntry>, ReplayError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let (direction, payload) = if let Some(payload) = trimmed.strip_prefix("->") {
        (Direction::FromAdapter, payload)
    } else if let Some(payload) = trimmed.strip_prefix("<-") {
        (Direction::ToAdapter, payload)
    } else {
        return Err(ReplayError::MissingMarker { line: line_no });
    };

    let message = serde_json::from_str(payload.trim_start())
        .map_err(|source| ReplayError::InvalidJson {
            line: line_no,
            source,
        })?;
    Ok(Some(TraceEntry { direction, message }))
}

/// Parse a whole capture, failing on the first malformed line.
pub fn parse_trace(text: &str) -> Result<Vec<TraceEntry>, ReplayError> {
    let mut entries = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if let Some(entry) = parse_trace_line(index + 1, line)? {
            entries.push(entry);
        }
    }
    Ok(entries)
}
