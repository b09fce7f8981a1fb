//! Minimal platter server: routing, path parameters, and request logging.
//!
//! Run with `cargo run --example hello_world`, then:
//!
//! ```text
//! curl http://127.0.0.1:8080/hello/world
//! curl -d '{"note":"hi"}' -H 'Content-Type: application/json' http://127.0.0.1:8080/notes
//! ```

use std::sync::Arc;

use platter::context::Context;
use platter::middleware::LoggerMiddleware;
use platter::server::Server;
use platter::{Response, Router, StatusCode};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut router = Router::new();
    router.middleware(LoggerMiddleware);

    router.get("/hello/{name}", |ctx: Context| async move {
        let name = ctx.params().get("name").unwrap_or("world").to_owned();
        Response::new(StatusCode::Ok).body(format!("Hello, {name}!"))
    });

    router.post("/notes", |ctx: Context| async move {
        let body = String::from_utf8_lossy(ctx.request().body()).into_owned();
        Response::new(StatusCode::Created).body(body)
    });

    router.get("/static/", |ctx: Context| async move {
        Response::new(StatusCode::Ok).body(format!("would serve {}", ctx.request().path()))
    });

    let router = Arc::new(router);
    let server = Server::bind("127.0.0.1:8080").await?;
    println!("Listening on http://{}", server.local_addr());

    server
        .run(move |req| {
            let router = Arc::clone(&router);
            async move { router.route(req).await }
        })
        .await?;

    Ok(())
}
