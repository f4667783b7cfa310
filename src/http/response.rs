//! Response acknowledgment.
//!
//! Only the status line and headers are read. Interim `1xx` responses are
//! skipped; the response body is left on the connection.

use http::header::{HeaderName, HeaderValue};
use http::StatusCode;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::http::Headers;

/// Upper bound on a response head, in bytes.
pub const MAX_HEAD_LEN: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("IO error reading response: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed before a response head was received")]
    Closed,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("response head exceeds {0} bytes")]
    TooLarge(usize),
}

/// Status and headers of the final response.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub headers: Headers,
}

/// Read the final (non-1xx) response head from `conn`.
pub async fn read_response_head<R>(conn: R) -> Result<ResponseHead, ResponseError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(conn);
    let mut consumed = 0usize;

    loop {
        let status = parse_status_line(&read_line(&mut reader, &mut consumed).await?)?;
        let mut headers = Headers::new();
        loop {
            let line = read_line(&mut reader, &mut consumed).await?;
            if line.is_empty() {
                break;
            }
            let (name, value) = parse_header_line(&line)?;
            headers.append(name, value);
        }

        if status.is_informational() {
            tracing::debug!(status = %status, "Skipping interim response");
            continue;
        }
        return Ok(ResponseHead { status, headers });
    }
}

/// One CRLF-terminated line, without the terminator.
async fn read_line<R>(reader: &mut BufReader<R>, consumed: &mut usize) -> Result<Vec<u8>, ResponseError>
where
    R: AsyncRead + Unpin,
{
    let mut line = Vec::new();
    let n = reader.read_until(b'\n', &mut line).await?;
    if n == 0 {
        return Err(ResponseError::Closed);
    }
    *consumed += n;
    if *consumed > MAX_HEAD_LEN {
        return Err(ResponseError::TooLarge(MAX_HEAD_LEN));
    }
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
    Ok(line)
}

fn parse_status_line(line: &[u8]) -> Result<StatusCode, ResponseError> {
    let text = std::str::from_utf8(line)
        .map_err(|_| ResponseError::Malformed("status line is not UTF-8".to_string()))?;
    let mut parts = text.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/1.") {
        return Err(ResponseError::Malformed(format!("bad status line: {}", text)));
    }
    let code = parts
        .next()
        .and_then(|c| c.parse::<u16>().ok())
        .ok_or_else(|| ResponseError::Malformed(format!("bad status line: {}", text)))?;
    StatusCode::from_u16(code)
        .map_err(|_| ResponseError::Malformed(format!("bad status code: {}", code)))
}

fn parse_header_line(line: &[u8]) -> Result<(HeaderName, HeaderValue), ResponseError> {
    let colon = line
        .iter()
        .position(|b| *b == b':')
        .ok_or_else(|| ResponseError::Malformed("header line without ':'".to_string()))?;
    let name = HeaderName::from_bytes(&line[..colon])
        .map_err(|_| ResponseError::Malformed("invalid header name".to_string()))?;
    let value = HeaderValue::from_bytes(line[colon + 1..].trim_ascii())
        .map_err(|_| ResponseError::Malformed("invalid header value".to_string()))?;
    Ok((name, value))
}
