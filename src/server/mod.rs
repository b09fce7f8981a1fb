//! Async TCP server using Tokio.
//!
//! Accepts TCP connections and dispatches HTTP/1.1 requests to a handler
//! function. Each request is parsed incrementally by a fresh
//! [`RequestParser`] fed directly from socket reads, so requests of any
//! shape (split headers, split CRLFs, slow bodies) are handled without
//! buffering the whole head. Supports HTTP/1.1 persistent connections
//! (keep-alive) and the `Expect: 100-continue` handshake out of the box.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::http::{ParseStatus, Request, RequestParser, Response, StatusCode};

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Default cap on the cumulative size of a single request (8 MiB).
const DEFAULT_MAX_REQUEST_SIZE: usize = 8 * 1024 * 1024;

/// Scratch read buffer size per connection.
const READ_BUF_SIZE: usize = 4096;

/// The platter HTTP server.
///
/// Binds to a TCP address and dispatches incoming HTTP/1.1 requests to a
/// handler function.
///
/// # Examples
///
/// ```rust,no_run
/// use platter::server::Server;
/// use platter::http::{Request, Response, StatusCode};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = Server::bind("127.0.0.1:8080").await?;
///     server.run(|_req: Request| async {
///         Response::new(StatusCode::Ok).body("Hello!")
///     }).await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    max_request_size: usize,
}

impl Server {
    /// Binds the server to the given TCP address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound
    /// (e.g. port already in use, insufficient permissions).
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        let addr = addr.as_ref();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
        })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Overrides the maximum cumulative request size in bytes.
    ///
    /// Requests exceeding the cap are refused with `413 Payload Too Large`.
    #[must_use]
    pub fn max_request_size(mut self, bytes: usize) -> Self {
        self.max_request_size = bytes;
        self
    }

    /// Starts accepting connections and dispatching requests to `handler`.
    ///
    /// The handler receives a [`Request`] and must return a [`Future`] that
    /// resolves to a [`Response`]. The handler is wrapped in an [`Arc`] and
    /// shared across all spawned Tokio tasks, so it must be `Send + Sync + 'static`.
    ///
    /// This method runs until the process is terminated or an unrecoverable
    /// listener error occurs.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the TCP listener itself fails.
    pub async fn run<H, F>(self, handler: H) -> Result<(), ServerError>
    where
        H: Fn(Request) -> F + Send + Sync + 'static,
        F: Future<Output = Response> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let max_request_size = self.max_request_size;
        info!(address = %self.local_addr, "platter listening");

        loop {
            let (stream, peer_addr) = match self.listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer_addr, "connection accepted");
            let handler = Arc::clone(&handler);

            tokio::spawn(async move {
                if let Err(e) =
                    handle_connection(stream, peer_addr, handler, max_request_size).await
                {
                    warn!(peer = %peer_addr, error = %e, "connection closed with error");
                }
            });
        }
    }
}

// How one request-parse loop ended.
enum Parsed {
    Complete,
    BadRequest,
    TooLarge,
    PeerClosed,
}

/// Handles a single TCP connection over its lifetime.
///
/// HTTP/1.1 connections are persistent by default: we loop, parsing one
/// request per iteration with a fresh parser, until the peer closes the
/// connection or signals `Connection: close`.
async fn handle_connection<H, F>(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    handler: Arc<H>,
    max_request_size: usize,
) -> Result<(), std::io::Error>
where
    H: Fn(Request) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    let mut buf = vec![0u8; READ_BUF_SIZE];

    loop {
        let mut request = Request::new();
        let parsed = {
            let mut parser = RequestParser::with_max_size(&mut request, max_request_size);
            loop {
                let bytes_read = stream.read(&mut buf).await?;
                if bytes_read == 0 {
                    break Parsed::PeerClosed;
                }

                match parser.parse(&buf[..bytes_read]) {
                    ParseStatus::ReadHeader | ParseStatus::ReadBody => continue,
                    ParseStatus::ExpectContinue => {
                        debug!(peer = %peer_addr, "sending 100 Continue interim response");
                        stream.write_all(Response::interim_continue()).await?;
                    }
                    ParseStatus::Finished => break Parsed::Complete,
                    ParseStatus::Error => break Parsed::BadRequest,
                    ParseStatus::RejectedRequestSize => break Parsed::TooLarge,
                }
            }
        };

        match parsed {
            Parsed::PeerClosed => {
                debug!(peer = %peer_addr, "connection closed by peer");
                return Ok(());
            }
            Parsed::BadRequest => {
                warn!(peer = %peer_addr, "bad request — sending 400");
                let response = Response::new(StatusCode::BadRequest)
                    .body("Bad Request")
                    .keep_alive(false);
                stream.write_all(&response.into_bytes()).await?;
                return Ok(());
            }
            Parsed::TooLarge => {
                warn!(peer = %peer_addr, "request too large — sending 413");
                let response = Response::new(StatusCode::PayloadTooLarge)
                    .body("Request entity too large")
                    .keep_alive(false);
                stream.write_all(&response.into_bytes()).await?;
                return Ok(());
            }
            Parsed::Complete => {
                let keep_alive = request.is_keep_alive();

                debug!(
                    peer = %peer_addr,
                    method = %request.method(),
                    path = %request.path(),
                    "dispatching request"
                );

                let response = handler(request).await.keep_alive(keep_alive);
                stream.write_all(&response.into_bytes()).await?;
                stream.flush().await?;

                if !keep_alive {
                    debug!(peer = %peer_addr, "Connection: close — shutting down");
                    return Ok(());
                }
            }
        }
    }
}
