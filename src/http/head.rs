//! HTTP/1.1 request head serialization.

use crate::http::RequestHead;

/// Serialize the request line and headers, including the blank line.
pub fn encode_head(head: &RequestHead) -> Vec<u8> {
    let mut target = head.url.path().to_string();
    if let Some(query) = head.url.query() {
        target.push('?');
        target.push_str(query);
    }

    let mut buf = Vec::with_capacity(128 + head.headers.len() * 32);
    buf.extend_from_slice(head.method.as_str().as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(target.as_bytes());
    buf.extend_from_slice(b" HTTP/1.1\r\n");
    for (name, value) in head.headers.iter() {
        buf.extend_from_slice(name.as_str().as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(value.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }
    buf.extend_from_slice(b"\r\n");
    buf
}
