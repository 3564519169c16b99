use std::io::{self, BufRead, Write};

use thiserror::Error;

/// Maximum allowed payload size for a single framed message (in bytes).
///
/// This caps the incoming `Content-Length` header so a malformed peer cannot
/// force an enormous allocation before the body is even read. Observed DAP
/// traffic is small JSON; 4 MiB leaves ample headroom.
pub const MAX_MESSAGE_BYTES: usize = 4 * 1024 * 1024;

/// Maximum allowed size of a single header line (in bytes).
pub const MAX_HEADER_LINE_BYTES: usize = 8 * 1024;

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("i/o: {0}")]
    Io(#[from] io::Error),
    #[error("header line exceeds {MAX_HEADER_LINE_BYTES} bytes")]
    HeaderLineTooLong,
    #[error("header line is not UTF-8")]
    HeaderNotUtf8,
    #[error("EOF while reading message headers")]
    TruncatedHeaders,
    #[error("message missing Content-Length header")]
    MissingContentLength,
    #[error("invalid Content-Length {0:?}")]
    InvalidContentLength(String),
    #[error("message payload of {0} bytes exceeds {MAX_MESSAGE_BYTES} bytes")]
    PayloadTooLarge(usize),
    #[error("EOF while reading a {0}-byte payload")]
    TruncatedPayload(usize),
}

fn read_line_limited<R: BufRead>(reader: &mut R) -> CodecResult<Option<String>> {
    let mut buf = Vec::<u8>::new();
    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            if buf.is_empty() {
                return Ok(None);
            }
            break;
        }

        let newline = available.iter().position(|&b| b == b'\n');
        let take = newline.map(|pos| pos + 1).unwrap_or(available.len());
        if buf.len() + take > MAX_HEADER_LINE_BYTES {
            return Err(CodecError::HeaderLineTooLong);
        }

        buf.extend_from_slice(&available[..take]);
        reader.consume(take);
        if newline.is_some() {
            break;
        }
    }

    let line = String::from_utf8(buf).map_err(|_| CodecError::HeaderNotUtf8)?;
    Ok(Some(line))
}

/// Read one framed message from `reader`.
///
/// Messages use the DAP/LSP header framing:
///
/// ```text
/// Content-Length: 123\r\n
/// \r\n
/// { ...json... }
/// ```
///
/// Returns `Ok(None)` on a clean EOF between messages.
pub fn read_message<R: BufRead>(reader: &mut R) -> CodecResult<Option<Vec<u8>>> {
    let mut content_length: Option<usize> = None;
    let mut saw_header = false;

    loop {
        let Some(line) = read_line_limited(reader)? else {
            if saw_header {
                return Err(CodecError::TruncatedHeaders);
            }
            return Ok(None);
        };
        saw_header = true;

        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }

        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("Content-Length") {
                let value = value.trim();
                content_length = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| CodecError::InvalidContentLength(value.to_string()))?,
                );
            }
        }
    }

    let Some(content_length) = content_length else {
        return Err(CodecError::MissingContentLength);
    };
    if content_length > MAX_MESSAGE_BYTES {
        return Err(CodecError::PayloadTooLarge(content_length));
    }

    let mut payload = vec![0u8; content_length];
    reader
        .read_exact(&mut payload)
        .map_err(|err| match err.kind() {
            io::ErrorKind::UnexpectedEof => CodecError::TruncatedPayload(content_length),
            _ => CodecError::Io(err),
        })?;
    Ok(Some(payload))
}

/// Write one framed message to `writer`.
pub fn write_message<W: Write>(writer: &mut W, payload: &[u8]) -> CodecResult<()> {
    write!(writer, "Content-Length: {}\r\n\r\n", payload.len())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}
