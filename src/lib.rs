//! # platter
//!
//! An embeddable async HTTP/1.1 server library written in Rust.
//!
//! The core of the crate is an incremental request parser
//! ([`http::RequestParser`]) that accepts request bytes in arbitrary chunks
//! and resumes across chunk boundaries, and a segment-matcher router
//! ([`Router`]) that compiles `/users/{id}`-style patterns and extracts REST
//! parameters during dispatch. Around them sit a tokio-based connection
//! layer, a response builder, and a middleware pipeline.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use platter::context::Context;
//! use platter::server::Server;
//! use platter::{Response, Router, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut router = Router::new();
//!     router.get("/hello/{name}", |ctx: Context| async move {
//!         let name = ctx.params().get("name").unwrap_or("world").to_owned();
//!         Response::new(StatusCode::Ok).body(format!("Hello, {name}!"))
//!     });
//!
//!     let router = Arc::new(router);
//!     let server = Server::bind("127.0.0.1:8080").await?;
//!     println!("Listening on http://127.0.0.1:8080");
//!     server
//!         .run(move |req| {
//!             let router = Arc::clone(&router);
//!             async move { router.route(req).await }
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod http;
pub mod middleware;
pub mod router;
pub mod server;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use http::{Headers, Method, ParseStatus, Request, RequestParser, Response, StatusCode};
pub use router::Router;
pub use server::{Server, ServerError};
