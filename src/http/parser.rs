//! Incremental HTTP/1.1 request parsing.
//!
//! [`RequestParser`] converts a stream of request bytes into a populated
//! [`Request`] through an explicit state machine. Bytes may arrive in
//! arbitrary chunks: every [`parse`](RequestParser::parse) call picks up
//! exactly where the previous one left off, so tokens and even the CRLF pair
//! can be split across calls and the caller never replays consumed bytes.
//!
//! Each input byte is processed against the current sub-state rather than
//! buffered into a header block first, so requests whose head outgrows any
//! single read buffer are handled the same as small ones.

use std::mem;

use super::request::Request;
use super::uri::{self, Url};
use crate::http::Method;

/// The observable result of a [`RequestParser::parse`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// Request line and/or headers partially consumed; more bytes needed.
    ReadHeader,
    /// All headers received and `Expect: 100-continue` was seen; the caller
    /// must send an interim `100 Continue` response before supplying body bytes.
    ExpectContinue,
    /// Headers fully consumed; body partially consumed; more bytes needed.
    ReadBody,
    /// Request fully parsed. Further input is ignored.
    Finished,
    /// Malformed request. Terminal and sticky.
    Error,
    /// Cumulative input exceeded the configured maximum. Terminal and sticky.
    RejectedRequestSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Method,
    Uri,
    Version,
    RequestLineLf,
    HeaderName,
    HeaderValue,
    HeaderValueLf,
    HeadersEndLf,
    Body,
    Done,
    Failed,
    Rejected,
}

/// A resumable push parser for one HTTP/1.1 request.
///
/// The parser borrows the [`Request`] it populates for its whole lifetime;
/// one parser instance corresponds to one request and cannot be reused.
///
/// # Examples
///
/// ```
/// use platter::http::{ParseStatus, Request, RequestParser};
///
/// let mut request = Request::new();
/// let mut parser = RequestParser::new(&mut request);
///
/// // Bytes can arrive in arbitrary chunks.
/// assert_eq!(parser.parse(b"GET /ping HT"), ParseStatus::ReadHeader);
/// assert_eq!(parser.parse(b"TP/1.1\r\n\r\n"), ParseStatus::Finished);
///
/// drop(parser);
/// assert_eq!(request.url().path(), "/ping");
/// ```
pub struct RequestParser<'a> {
    request: &'a mut Request,
    state: State,
    max_request_size: Option<usize>,
    consumed: usize,
    token: Vec<u8>,
    header_name: Vec<u8>,
    header_value: Vec<u8>,
    body_remaining: usize,
}

impl<'a> RequestParser<'a> {
    /// Creates a parser with no request-size limit.
    pub fn new(request: &'a mut Request) -> Self {
        Self {
            request,
            state: State::Method,
            max_request_size: None,
            consumed: 0,
            token: Vec::new(),
            header_name: Vec::new(),
            header_value: Vec::new(),
            body_remaining: 0,
        }
    }

    /// Creates a parser that rejects the request once the cumulative number
    /// of bytes passed to [`parse`](Self::parse) exceeds `max_request_size`.
    pub fn with_max_size(request: &'a mut Request, max_request_size: usize) -> Self {
        let mut parser = Self::new(request);
        parser.max_request_size = Some(max_request_size);
        parser
    }

    /// Returns the cumulative number of bytes passed to [`parse`](Self::parse).
    pub fn bytes_consumed(&self) -> usize {
        self.consumed
    }

    /// Feeds the next chunk of request bytes to the state machine.
    ///
    /// Resumes from wherever the previous call suspended. Once a terminal
    /// status has been returned ([`Finished`](ParseStatus::Finished),
    /// [`Error`](ParseStatus::Error), or
    /// [`RejectedRequestSize`](ParseStatus::RejectedRequestSize)), every
    /// further call returns the same status without touching the request.
    pub fn parse(&mut self, buf: &[u8]) -> ParseStatus {
        match self.state {
            State::Done => return ParseStatus::Finished,
            State::Failed => return ParseStatus::Error,
            State::Rejected => return ParseStatus::RejectedRequestSize,
            _ => {}
        }

        self.consumed += buf.len();
        if let Some(max) = self.max_request_size {
            if self.consumed > max {
                self.state = State::Rejected;
                return ParseStatus::RejectedRequestSize;
            }
        }

        let mut i = 0;
        while i < buf.len() {
            if self.state == State::Body {
                if self.body_remaining == 0 {
                    self.state = State::Done;
                    return ParseStatus::Finished;
                }
                let take = self.body_remaining.min(buf.len() - i);
                self.request.body.extend_from_slice(&buf[i..i + take]);
                self.body_remaining -= take;
                if self.body_remaining == 0 {
                    // Surplus bytes beyond Content-Length are dropped.
                    self.state = State::Done;
                    return ParseStatus::Finished;
                }
                break;
            }

            let byte = buf[i];
            i += 1;
            if let Some(status) = self.step(byte) {
                return status;
            }
        }

        match self.state {
            State::Body if self.body_remaining == 0 => {
                self.state = State::Done;
                ParseStatus::Finished
            }
            State::Body => ParseStatus::ReadBody,
            State::Done => ParseStatus::Finished,
            _ => ParseStatus::ReadHeader,
        }
    }

    /// Advances the head states by one byte. `Some` forces an early return
    /// from the current `parse` call.
    fn step(&mut self, byte: u8) -> Option<ParseStatus> {
        match self.state {
            State::Method => match byte {
                b' ' => {
                    let token = mem::take(&mut self.token);
                    let Ok(text) = std::str::from_utf8(&token) else {
                        return Some(self.fail());
                    };
                    match text.parse::<Method>() {
                        Ok(method) => {
                            self.request.method = Some(method);
                            self.state = State::Uri;
                            None
                        }
                        Err(_) => Some(self.fail()),
                    }
                }
                b'\r' | b'\n' => Some(self.fail()),
                _ => {
                    self.token.push(byte);
                    None
                }
            },
            State::Uri => match byte {
                b' ' => {
                    self.finish_uri();
                    self.state = State::Version;
                    None
                }
                b'\r' | b'\n' => Some(self.fail()),
                _ => {
                    self.token.push(byte);
                    None
                }
            },
            State::Version => match byte {
                b'\r' => {
                    let token = mem::take(&mut self.token);
                    if is_valid_version(&token) {
                        self.request.http_version = String::from_utf8_lossy(&token).into_owned();
                        self.state = State::RequestLineLf;
                        None
                    } else {
                        Some(self.fail())
                    }
                }
                b'\n' => Some(self.fail()),
                _ => {
                    self.token.push(byte);
                    None
                }
            },
            State::RequestLineLf => {
                if byte == b'\n' {
                    self.state = State::HeaderName;
                    None
                } else {
                    Some(self.fail())
                }
            }
            State::HeaderName => match byte {
                b'\r' if self.header_name.is_empty() => {
                    self.state = State::HeadersEndLf;
                    None
                }
                b':' => {
                    self.state = State::HeaderValue;
                    None
                }
                b'\r' | b'\n' => Some(self.fail()),
                _ => {
                    self.header_name.push(byte);
                    None
                }
            },
            State::HeaderValue => match byte {
                b'\r' => {
                    self.state = State::HeaderValueLf;
                    None
                }
                b'\n' => Some(self.fail()),
                b' ' | b'\t' if self.header_value.is_empty() => None,
                _ => {
                    self.header_value.push(byte);
                    None
                }
            },
            State::HeaderValueLf => {
                if byte == b'\n' {
                    let name = mem::take(&mut self.header_name);
                    let value = mem::take(&mut self.header_value);
                    self.request.headers.insert(
                        String::from_utf8_lossy(&name).into_owned(),
                        String::from_utf8_lossy(&value).into_owned(),
                    );
                    self.state = State::HeaderName;
                    None
                } else {
                    Some(self.fail())
                }
            }
            State::HeadersEndLf => {
                if byte == b'\n' {
                    self.dispatch_headers()
                } else {
                    Some(self.fail())
                }
            }
            State::Body | State::Done | State::Failed | State::Rejected => {
                unreachable!("head step entered in state {:?}", self.state)
            }
        }
    }

    /// Decides where to go once the empty line ending the header section has
    /// been consumed.
    fn dispatch_headers(&mut self) -> Option<ParseStatus> {
        let headers = &self.request.headers;

        let expect_continue = headers
            .get("expect")
            .is_some_and(|v| v.eq_ignore_ascii_case("100-continue"));

        let content_length = match headers.get("content-length") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) => Some(n),
                Err(_) => return Some(self.fail()),
            },
            None => None,
        };

        if expect_continue {
            return match content_length {
                Some(n) => {
                    self.body_remaining = n;
                    self.state = State::Body;
                    Some(ParseStatus::ExpectContinue)
                }
                // An expectation without a known body length cannot be honored.
                None => Some(self.fail()),
            };
        }

        let has_content_type = headers.contains("content-type");
        match content_length {
            Some(n) if n > 0 && has_content_type && self.request.method().allows_body() => {
                self.body_remaining = n;
                self.state = State::Body;
                None
            }
            _ => {
                self.state = State::Done;
                Some(ParseStatus::Finished)
            }
        }
    }

    fn finish_uri(&mut self) {
        let token = mem::take(&mut self.token);
        let raw = String::from_utf8_lossy(&token).into_owned();
        let url = Url::parse(&raw);
        self.request.query_params = uri::parse_query_params(url.query());
        self.request.url = url;
    }

    fn fail(&mut self) -> ParseStatus {
        self.state = State::Failed;
        ParseStatus::Error
    }
}

fn is_valid_version(token: &[u8]) -> bool {
    token.len() == 8
        && &token[..5] == b"HTTP/"
        && token[5].is_ascii_digit()
        && token[6] == b'.'
        && token[7].is_ascii_digit()
}
