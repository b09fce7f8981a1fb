//! HTTP/1.1 response construction and serialization.

use std::fmt::Write as _;

use bytes::{BufMut, BytesMut};

use super::{Headers, StatusCode};

/// An HTTP/1.1 response under construction.
///
/// Built fluently, then serialized once with [`into_bytes`](Self::into_bytes).
/// Framing headers (`Content-Length`, `Connection`, and a default
/// `Content-Type` for non-empty bodies) are stamped at serialization time,
/// so handlers and middleware only ever set what they care about.
///
/// # Examples
///
/// ```
/// use platter::http::{Response, StatusCode};
///
/// let response = Response::new(StatusCode::Ok)
///     .header("Content-Type", "application/json")
///     .body(r#"{"status":"ok"}"#);
///
/// let bytes = response.into_bytes();
/// let text = std::str::from_utf8(&bytes).unwrap();
/// assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
/// assert!(text.contains("Content-Length: 15\r\n"));
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: Vec<u8>,
    keep_alive: bool,
}

impl Response {
    /// Creates a new response with the given status and an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Vec::new(),
            keep_alive: true,
        }
    }

    /// Appends a response header. Repeating a name folds the values.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Appends a header in-place. Intended for middleware pipelines that receive
    /// a `Response` from downstream and need to decorate it without consuming it.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name, value);
    }

    /// Sets the response body from a string. Its length becomes the
    /// `Content-Length` written by [`into_bytes`](Self::into_bytes).
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into().into_bytes();
        self
    }

    /// Sets the response body from raw bytes.
    #[must_use]
    pub fn body_bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Controls whether the `Connection: keep-alive` or `Connection: close` header is written.
    #[must_use]
    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Returns the status code of this response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The interim response emitted between headers and body during the
    /// `Expect: 100-continue` handshake. No headers, no body.
    pub fn interim_continue() -> &'static [u8] {
        b"HTTP/1.1 100 Continue\r\n\r\n"
    }

    // Stamps the framing headers the connection layer relies on. `Connection`
    // goes through `set`: the keep-alive decision must replace whatever a
    // handler wrote, not fold onto it as a comma list.
    fn finalize_headers(&mut self) {
        if !self.body.is_empty() && !self.headers.contains("content-type") {
            self.headers.set("Content-Type", "text/plain; charset=utf-8");
        }
        self.headers.set(
            "Connection",
            if self.keep_alive { "keep-alive" } else { "close" },
        );
    }

    /// Serializes the response into its HTTP/1.1 wire form:
    /// status line, headers in insertion order, `Content-Length`, blank
    /// line, body.
    pub fn into_bytes(mut self) -> BytesMut {
        self.finalize_headers();

        // Writing into a String cannot fail, so the write! results are ignored.
        let mut head = String::with_capacity(64 + 32 * self.headers.len());
        let _ = write!(head, "HTTP/1.1 {}\r\n", self.status);
        for (name, value) in self.headers.iter() {
            let _ = write!(head, "{name}: {value}\r\n");
        }
        let _ = write!(head, "Content-Length: {}\r\n\r\n", self.body.len());

        let mut buf = BytesMut::with_capacity(head.len() + self.body.len());
        buf.put(head.as_bytes());
        buf.put(self.body.as_slice());
        buf
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_string(bytes: BytesMut) -> String {
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn simple_ok_response() {
        let r = Response::new(StatusCode::Ok).body("Hello");
        let s = to_string(r.into_bytes());
        assert!(s.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(s.contains("Content-Length: 5\r\n"));
        assert!(s.ends_with("\r\n\r\nHello"));
    }

    #[test]
    fn custom_header() {
        let r = Response::new(StatusCode::Ok)
            .header("X-Request-Id", "abc-123")
            .body("ok");
        let s = to_string(r.into_bytes());
        assert!(s.contains("X-Request-Id: abc-123\r\n"));
    }

    #[test]
    fn default_content_type_only_with_body() {
        let with_body = to_string(Response::new(StatusCode::Ok).body("x").into_bytes());
        assert!(with_body.contains("Content-Type: text/plain; charset=utf-8\r\n"));

        let empty = to_string(Response::new(StatusCode::NoContent).into_bytes());
        assert!(!empty.contains("Content-Type"));
        assert!(empty.contains("Content-Length: 0\r\n"));
    }

    #[test]
    fn connection_close() {
        let r = Response::new(StatusCode::Ok).keep_alive(false);
        let s = to_string(r.into_bytes());
        assert!(s.contains("Connection: close\r\n"));
    }

    #[test]
    fn connection_header_is_replaced_not_folded() {
        let r = Response::new(StatusCode::Ok)
            .header("Connection", "upgrade")
            .keep_alive(false);
        let s = to_string(r.into_bytes());
        assert!(s.contains("Connection: close\r\n"));
        assert!(!s.contains("upgrade"));
    }

    #[test]
    fn headers_keep_insertion_order() {
        let r = Response::new(StatusCode::Ok)
            .header("X-First", "1")
            .header("X-Second", "2");
        let s = to_string(r.into_bytes());
        let first = s.find("X-First").unwrap();
        let second = s.find("X-Second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn not_found() {
        let r = Response::new(StatusCode::NotFound).body("Not Found");
        let s = to_string(r.into_bytes());
        assert!(s.starts_with("HTTP/1.1 404 Not Found\r\n"));
    }

    #[test]
    fn interim_continue_wire_format() {
        assert_eq!(
            Response::interim_continue(),
            &b"HTTP/1.1 100 Continue\r\n\r\n"[..]
        );
    }
}
