//! The HTTP request record.

use std::collections::HashMap;

use bytes::BytesMut;

use super::{Headers, Method, Url};
use crate::context::Parameters;

/// A parsed HTTP/1.1 request.
///
/// Constructed empty and populated by a [`RequestParser`](super::RequestParser)
/// feeding on request bytes; handlers then consume it read-only. One parser
/// instance populates exactly one `Request`.
///
/// # Examples
///
/// ```
/// use platter::http::{ParseStatus, Request, RequestParser};
///
/// let mut request = Request::new();
/// let mut parser = RequestParser::new(&mut request);
/// let status = parser.parse(b"GET /hello?name=world HTTP/1.1\r\nHost: localhost\r\n\r\n");
///
/// assert_eq!(status, ParseStatus::Finished);
/// assert_eq!(request.method().as_str(), "GET");
/// assert_eq!(request.url().path(), "/hello");
/// assert_eq!(request.query_param("name"), Some("world"));
/// assert_eq!(request.header("host"), Some("localhost"));
/// ```
#[derive(Debug, Default)]
pub struct Request {
    pub(crate) method: Option<Method>,
    pub(crate) http_version: String,
    pub(crate) url: Url,
    pub(crate) query_params: HashMap<String, String>,
    pub(crate) headers: Headers,
    pub(crate) params: Parameters,
    pub(crate) body: BytesMut,
}

impl Request {
    /// Creates an empty request, ready to be handed to a parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the HTTP method.
    ///
    /// Defaults to `GET` until the request line has been parsed.
    pub fn method(&self) -> Method {
        self.method.unwrap_or(Method::Get)
    }

    /// Returns the textual HTTP version, e.g. `"HTTP/1.1"`.
    pub fn http_version(&self) -> &str {
        &self.http_version
    }

    /// Returns the decomposed request target.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the request path (without the query string).
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Returns a percent-decoded query parameter value by key.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query_params.get(key).map(String::as_str)
    }

    /// Returns the full percent-decoded query parameter map.
    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    /// Returns the REST parameters captured during route matching.
    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub(crate) fn params_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    /// Returns the request body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns `true` if the connection should be kept alive after this request.
    ///
    /// HTTP/1.1 defaults to keep-alive. Other versions default to close unless
    /// `Connection: keep-alive` is explicitly set.
    pub fn is_keep_alive(&self) -> bool {
        match self.headers.get("connection") {
            Some(conn) => conn.eq_ignore_ascii_case("keep-alive"),
            None => self.http_version == "HTTP/1.1",
        }
    }

    /// Returns the value of the `Content-Length` header parsed as a `usize`, if present.
    pub fn content_length(&self) -> Option<usize> {
        self.headers.get("content-length")?.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_request_defaults() {
        let req = Request::new();
        assert_eq!(req.method(), Method::Get);
        assert_eq!(req.http_version(), "");
        assert_eq!(req.path(), "");
        assert!(req.headers().is_empty());
        assert!(req.body().is_empty());
        assert_eq!(req.content_length(), None);
    }

    #[test]
    fn keep_alive_follows_version_and_connection_header() {
        let mut req = Request::new();
        req.http_version = "HTTP/1.1".to_owned();
        assert!(req.is_keep_alive());

        req.headers.insert("Connection", "close");
        assert!(!req.is_keep_alive());

        let mut old = Request::new();
        old.http_version = "HTTP/1.0".to_owned();
        assert!(!old.is_keep_alive());
        old.headers.insert("Connection", "keep-alive");
        assert!(old.is_keep_alive());
    }

    #[test]
    fn content_length_parses_decimal() {
        let mut req = Request::new();
        req.headers.insert("Content-Length", "15");
        assert_eq!(req.content_length(), Some(15));
    }
}
