//! Just enough HTTP/1.1 to serve one request per connection.
//!
//! Requests are read until the blank line, then the body is framed by
//! `Content-Length` or `Transfer-Encoding: chunked`.
//! Every response closes the connection.

use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::matcher::ObservedRequest;

const MAX_HEAD_BYTES: usize = 64 * 1024;
const READ_CHUNK: usize = 8192;
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Response written back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl MockResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Set a header, replacing any existing one with the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Read one request. `Ok(None)` means the peer closed without sending
/// anything, which is what the readiness probe does.
pub(crate) async fn read_request<S>(stream: &mut S) -> io::Result<Option<ObservedRequest>>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(READ_CHUNK);
    let mut chunk = vec![0u8; READ_CHUNK];

    let head_end = loop {
        if let Some(pos) = find_head_end(&buf) {
            break pos;
        }
        if buf.len() > MAX_HEAD_BYTES {
            return Err(invalid("request head too large"));
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed mid-request",
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = std::str::from_utf8(&buf[..head_end]).map_err(|_| invalid("non-UTF-8 head"))?;
    let mut lines = head.split("\r\n");

    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let (method, target) = match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(target), Some(version)) if version.starts_with("HTTP/") => {
            (method.to_string(), target.to_string())
        }
        _ => return Err(invalid("malformed request line")),
    };

    let mut observed = ObservedRequest::from_target(method, origin_form(&target));
    let mut content_length = 0usize;
    let mut chunked = false;

    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            return Err(invalid("malformed header line"));
        };
        let (name, value) = (name.trim(), value.trim());
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value
                .parse()
                .map_err(|_| invalid("invalid Content-Length"))?;
        } else if name.eq_ignore_ascii_case("transfer-encoding") {
            let last = value.rsplit(',').next().unwrap_or_default().trim();
            if !last.eq_ignore_ascii_case("chunked") {
                return Err(invalid("unsupported Transfer-Encoding"));
            }
            chunked = true;
        }
        observed.headers.push((name.to_string(), value.to_string()));
    }

    let pending = buf.split_off(head_end + 4);
    observed.body = if chunked {
        read_chunked_body(stream, pending).await?
    } else {
        read_sized_body(stream, pending, content_length).await?
    };

    Ok(Some(observed))
}

async fn read_sized_body<S>(stream: &mut S, mut body: Vec<u8>, len: usize) -> io::Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    while body.len() < len {
        if fill(stream, &mut body).await? == 0 {
            return Err(mid_body_eof());
        }
    }
    body.truncate(len);
    Ok(body)
}

/// Decode a `Transfer-Encoding: chunked` body. `pending` holds bytes already
/// read past the head. Chunk extensions and trailers are skipped.
async fn read_chunked_body<S>(stream: &mut S, mut pending: Vec<u8>) -> io::Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let mut body = Vec::new();
    loop {
        let line = take_line(stream, &mut pending).await?;
        let size_field = line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_field, 16)
            .map_err(|_| invalid("invalid chunk size"))?;

        if size == 0 {
            // Trailer section ends with an empty line.
            while !take_line(stream, &mut pending).await?.is_empty() {}
            return Ok(body);
        }
        if body.len() + size > MAX_BODY_BYTES {
            return Err(invalid("chunked body too large"));
        }

        while pending.len() < size + 2 {
            if fill(stream, &mut pending).await? == 0 {
                return Err(mid_body_eof());
            }
        }
        if &pending[size..size + 2] != b"\r\n" {
            return Err(invalid("chunk not terminated by CRLF"));
        }
        body.extend_from_slice(&pending[..size]);
        pending.drain(..size + 2);
    }
}

/// Remove and return one CRLF-terminated line from `pending`, reading more
/// from the stream as needed.
async fn take_line<S>(stream: &mut S, pending: &mut Vec<u8>) -> io::Result<String>
where
    S: AsyncRead + Unpin,
{
    loop {
        if let Some(pos) = pending.windows(2).position(|w| w == b"\r\n") {
            let line = String::from_utf8(pending[..pos].to_vec())
                .map_err(|_| invalid("non-UTF-8 chunk line"))?;
            pending.drain(..pos + 2);
            return Ok(line);
        }
        if pending.len() > MAX_HEAD_BYTES {
            return Err(invalid("chunk line too long"));
        }
        if fill(stream, pending).await? == 0 {
            return Err(mid_body_eof());
        }
    }
}

async fn fill<S>(stream: &mut S, buf: &mut Vec<u8>) -> io::Result<usize>
where
    S: AsyncRead + Unpin,
{
    let mut chunk = [0u8; READ_CHUNK];
    let n = stream.read(&mut chunk).await?;
    buf.extend_from_slice(&chunk[..n]);
    Ok(n)
}

fn mid_body_eof() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed mid-body")
}

/// Whether a response may carry a body at all.
fn allows_body(request_method: &str, status: u16) -> bool {
    !(request_method.eq_ignore_ascii_case("HEAD")
        || (100..200).contains(&status)
        || status == 204
        || status == 304)
}

/// Write a full HTTP/1.1 response to the stream. `request_method` is empty
/// when the request could not be parsed. No body or `Content-Length` is sent
/// for HEAD requests or for 1xx, 204 and 304 statuses.
pub(crate) async fn write_response<S>(
    stream: &mut S,
    request_method: &str,
    response: &MockResponse,
) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let reason = reqwest::StatusCode::from_u16(response.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");

    let mut head = format!("HTTP/1.1 {} {}\r\n", response.status, reason);
    for (name, value) in &response.headers {
        if name.eq_ignore_ascii_case("content-length") || name.eq_ignore_ascii_case("connection") {
            continue;
        }
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    let with_body = allows_body(request_method, response.status);
    if with_body {
        head.push_str(&format!("Content-Length: {}\r\n", response.body.len()));
    }
    head.push_str("Connection: close\r\n\r\n");

    stream.write_all(head.as_bytes()).await?;
    if with_body {
        stream.write_all(&response.body).await?;
    }
    stream.flush().await
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Strip scheme and authority from an absolute-form target.
fn origin_form(target: &str) -> &str {
    let Some(rest) = target
        .strip_prefix("http://")
        .or_else(|| target.strip_prefix("https://"))
    else {
        return target;
    };
    match rest.find('/') {
        Some(idx) => &rest[idx..],
        None => "/",
    }
}

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}
