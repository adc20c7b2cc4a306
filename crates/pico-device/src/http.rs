//! Minimal HTTP/1.1 framing for the device API.
//!
//! Only what the device needs: read one request head, look at the request
//! line, write one response and close. Both buffers are allocated once and
//! reused for every connection.

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::error;

use crate::error::{DeviceError, DeviceResult};

/// Buffers owned by the serve loop and reused across connections.
///
/// Held by `&mut` while a request is in flight, so no two requests can
/// ever share them.
#[derive(Debug)]
pub struct ConnectionBuffers {
    request: Vec<u8>,
    filled: usize,
    response: Response,
    head: Vec<u8>,
}

impl ConnectionBuffers {
    /// Allocate buffers for request heads of at most `request_size` bytes.
    pub fn new(request_size: usize) -> Self {
        Self {
            request: vec![0; request_size],
            filled: 0,
            response: Response::default(),
            head: Vec::with_capacity(256),
        }
    }

    /// Prepare for the next connection without releasing memory.
    pub fn reset(&mut self) {
        self.filled = 0;
        self.response.reset();
        self.head.clear();
    }

    /// Read a request head from `stream` and parse its request line.
    ///
    /// Returns the parsed head borrowing the request buffer together with the
    /// response to fill in.
    pub async fn read_request<S>(
        &mut self,
        stream: &mut S,
    ) -> DeviceResult<(RequestHead<'_>, &mut Response)>
    where
        S: AsyncRead + Unpin,
    {
        loop {
            if find_head_end(&self.request[..self.filled]).is_some() {
                break;
            }
            if self.filled == self.request.len() {
                return Err(DeviceError::RequestTooLarge(self.request.len()));
            }
            let n = stream
                .read(&mut self.request[self.filled..])
                .await
                .map_err(DeviceError::Read)?;
            if n == 0 {
                return Err(DeviceError::MalformedRequest(
                    "connection closed before end of headers".to_string(),
                ));
            }
            self.filled += n;
        }

        let head = RequestHead::parse(&self.request[..self.filled])?;
        Ok((head, &mut self.response))
    }

    /// Encode the prepared response and write it to `stream`.
    pub async fn write_response<S>(&mut self, stream: &mut S) -> DeviceResult<()>
    where
        S: AsyncWrite + Unpin,
    {
        self.response.encode_head(&mut self.head);
        stream
            .write_all(&self.head)
            .await
            .map_err(DeviceError::Write)?;
        if !self.response.body.is_empty() {
            stream
                .write_all(&self.response.body)
                .await
                .map_err(DeviceError::Write)?;
        }
        stream.flush().await.map_err(DeviceError::Write)?;
        Ok(())
    }

    /// Response prepared for the current connection.
    pub fn response(&self) -> &Response {
        &self.response
    }
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Request line of an incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHead<'a> {
    pub method: &'a str,
    pub target: &'a str,
}

impl<'a> RequestHead<'a> {
    /// Parse `METHOD SP TARGET SP HTTP/1.x` from the start of `raw`.
    pub fn parse(raw: &'a [u8]) -> DeviceResult<Self> {
        let line_end = raw
            .windows(2)
            .position(|w| w == b"\r\n")
            .ok_or_else(|| DeviceError::MalformedRequest("missing request line".to_string()))?;
        let line = std::str::from_utf8(&raw[..line_end])
            .map_err(|_| DeviceError::MalformedRequest("request line is not UTF-8".to_string()))?;

        let mut parts = line.split(' ');
        let (method, target, version) = match (parts.next(), parts.next(), parts.next(), parts.next())
        {
            (Some(m), Some(t), Some(v), None) if !m.is_empty() && !t.is_empty() => (m, t, v),
            _ => {
                return Err(DeviceError::MalformedRequest(format!(
                    "bad request line: {line:?}"
                )))
            }
        };
        if !version.starts_with("HTTP/1.") {
            return Err(DeviceError::MalformedRequest(format!(
                "unsupported version: {version}"
            )));
        }

        Ok(Self { method, target })
    }
}

/// Response being prepared by a handler. Defaults to an empty 200.
#[derive(Debug)]
pub struct Response {
    status: u16,
    content_type: Option<&'static str>,
    connection_close: bool,
    body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            content_type: None,
            connection_close: false,
            body: Vec::new(),
        }
    }
}

impl Response {
    fn reset(&mut self) {
        self.status = 200;
        self.content_type = None;
        self.connection_close = false;
        self.body.clear();
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    pub fn set_connection_close(&mut self) {
        self.connection_close = true;
    }

    /// Set a static body with its content type.
    pub fn set_body(&mut self, content_type: &'static str, body: &[u8]) {
        self.content_type = Some(content_type);
        self.body.clear();
        self.body.extend_from_slice(body);
    }

    /// Serialize `value` as the JSON body.
    ///
    /// On encoding failure the status becomes 500 and the body stays empty,
    /// but headers already prepared (notably `Connection: close`) are still
    /// sent. The 500 then carries no content type, which differs from what a
    /// successful JSON response would have advertised. Callers always get a
    /// response to write.
    pub fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) {
        self.body.clear();
        match serde_json::to_writer(&mut self.body, value) {
            Ok(()) => self.content_type = Some("application/json"),
            Err(e) => {
                error!(error = %e, "Response JSON encoding failed");
                self.body.clear();
                self.status = 500;
            }
        }
    }

    fn encode_head(&self, out: &mut Vec<u8>) {
        use std::io::Write;

        out.clear();
        // Writes into a Vec cannot fail.
        let _ = write!(
            out,
            "HTTP/1.1 {} {}\r\n",
            self.status,
            reason_phrase(self.status)
        );
        if let Some(content_type) = self.content_type {
            let _ = write!(out, "Content-Type: {content_type}\r\n");
        }
        let _ = write!(out, "Content-Length: {}\r\n", self.body.len());
        if self.connection_close {
            out.extend_from_slice(b"Connection: close\r\n");
        }
        out.extend_from_slice(b"\r\n");
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;

    #[test]
    fn test_parse_request_line() {
        let head = RequestHead::parse(b"GET /panic HTTP/1.1\r\nHost: pico\r\n\r\n").unwrap();
        assert_eq!(head.method, "GET");
        assert_eq!(head.target, "/panic");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(RequestHead::parse(b"HELLO\r\n\r\n").is_err());
        assert!(RequestHead::parse(b"GET /panic SPDY/3\r\n\r\n").is_err());
        assert!(RequestHead::parse(b"GET /panic HTTP/1.1").is_err());
    }

    #[tokio::test]
    async fn test_read_request_across_partial_reads() {
        let mut buffers = ConnectionBuffers::new(1024);
        let mut stream = tokio_test::io::Builder::new()
            .read(b"GET /pul")
            .read(b"se HTTP/1.1\r\nHost: x\r\n")
            .read(b"\r\n")
            .build();

        let (head, _) = buffers.read_request(&mut stream).await.unwrap();
        assert_eq!(head.target, "/pulse");
    }

    #[tokio::test]
    async fn test_read_request_too_large() {
        let mut buffers = ConnectionBuffers::new(16);
        let mut stream = tokio_test::io::Builder::new()
            .read(b"GET /a-very-long")
            .build();

        let err = buffers.read_request(&mut stream).await.unwrap_err();
        assert!(matches!(err, DeviceError::RequestTooLarge(16)));
    }

    #[tokio::test]
    async fn test_read_request_eof_before_head_end() {
        let mut buffers = ConnectionBuffers::new(1024);
        let mut stream = tokio_test::io::Builder::new().read(b"GET / HTTP/1.1\r\n").build();

        let err = buffers.read_request(&mut stream).await.unwrap_err();
        assert!(matches!(err, DeviceError::MalformedRequest(_)));
    }

    #[tokio::test]
    async fn test_write_json_response() {
        let mut buffers = ConnectionBuffers::new(64);
        buffers.reset();
        buffers.response.set_connection_close();
        buffers.response.write_json(&serde_json::json!({"up": true}));

        let mut stream = tokio_test::io::Builder::new()
            .write(
                b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 11\r\nConnection: close\r\n\r\n",
            )
            .write(br#"{"up":true}"#)
            .build();
        buffers.write_response(&mut stream).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_404_response() {
        let mut buffers = ConnectionBuffers::new(64);
        buffers.reset();
        buffers.response.set_connection_close();
        buffers.response.set_status(404);

        let mut stream = tokio_test::io::Builder::new()
            .write(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .build();
        buffers.write_response(&mut stream).await.unwrap();
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("refused"))
        }
    }

    #[test]
    fn test_json_failure_becomes_500_with_empty_body() {
        let mut response = Response::default();
        response.reset();
        response.set_connection_close();
        response.write_json(&Unencodable);

        assert_eq!(response.status(), 500);
        assert!(response.body().is_empty());

        let mut head = Vec::new();
        response.encode_head(&mut head);
        let head = String::from_utf8(head).unwrap();
        assert!(head.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(head.contains("Connection: close\r\n"));
        assert!(!head.contains("Content-Type"));
    }

    #[test]
    fn test_reset_reuses_allocation() {
        let mut buffers = ConnectionBuffers::new(1024);
        buffers.response.set_body("text/html", &[b'x'; 512]);
        let capacity = buffers.response.body.capacity();
        buffers.reset();
        assert!(buffers.response.body().is_empty());
        assert_eq!(buffers.response.body.capacity(), capacity);
        assert_eq!(buffers.request.len(), 1024);
    }
}
