//! Waymark &ndash; an HTTP request router that maps controller types and their handler methods
//! onto a tree of URL path segments.
//!
//! Each request is resolved to exactly one handler, or answered with `404 Not Found` when none
//! accepts it and `409 Conflict` when several accept it equally well. The chosen handler's
//! parameters are bound from the query string, form and multipart bodies, path variables,
//! headers, cookies and session attributes, and its result is rendered as JSON or XML, or
//! through a template.
//!
//! ```rust,no_run
//! use waymark::extractor::Arguments;
//! use waymark::router::builder::build_simple_router;
//! use waymark::router::mapping::parameter;
//!
//! #[derive(Default)]
//! struct EchoController;
//!
//! impl EchoController {
//!     fn echo(&self, mut args: Arguments) -> anyhow::Result<String> {
//!         Ok(args.take::<String>(0).unwrap_or_default())
//!     }
//! }
//!
//! fn main() {
//!     let router = build_simple_router(|route| {
//!         route.class::<EchoController>("/api").restful().methods(|m| {
//!             m.get("/echo/{text}")
//!                 .param(parameter::path::<String>("text"))
//!                 .to(EchoController::echo);
//!         });
//!     })
//!     .unwrap();
//!
//!     waymark::start("127.0.0.1:7878", router).unwrap();
//! }
//! ```
#![warn(missing_docs, deprecated)]
// Stricter requirements once we get to pull request stage, all warnings must be resolved.
#![cfg_attr(feature = "ci", deny(warnings))]
#![doc(test(no_crate_inject))]

pub mod convert;
pub mod extractor;
pub mod handler;
pub mod helpers;
pub mod middleware;
pub mod pipeline;
pub mod prelude;
pub mod router;
mod service;
pub mod state;
pub mod view;

/// Test utilities for applications built on the router.
#[cfg(feature = "testing")]
pub mod test;

/// Re-export anyhow
pub use anyhow;
/// Re-export hyper
pub use hyper;
/// Re-export mime
pub use mime;

use std::io;
use std::net::ToSocketAddrs;

use futures_util::TryFutureExt;
use hyper::server::conn::Http;
use log::{error, info};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::runtime::{self, Runtime};

use crate::handler::NewHandler;
use crate::service::WaymarkService;

/// The error that can occur when starting the server.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StartError {
    /// I/O error.
    #[error("I/O Error: {0}")]
    IoError(#[from] io::Error),
    /// The listener address resolved to nothing.
    #[error("unable to resolve listener address")]
    UnresolvedAddress,
}

/// Starts a server with a `NewHandler`, usually a `Router`, on one worker thread per CPU.
pub fn start<NH, A>(addr: A, new_handler: NH) -> Result<(), StartError>
where
    NH: NewHandler + 'static,
    A: ToSocketAddrs + 'static + Send,
{
    start_with_num_threads(addr, new_handler, num_cpus::get())
}

/// Starts a server with the given number of worker threads.
pub fn start_with_num_threads<NH, A>(
    addr: A,
    new_handler: NH,
    threads: usize,
) -> Result<(), StartError>
where
    NH: NewHandler + 'static,
    A: ToSocketAddrs + 'static + Send,
{
    let runtime = new_runtime(threads)?;
    runtime.block_on(init_server(addr, new_handler))
}

/// Returns a `Future` used to spawn a server.
///
/// This is used internally, but it's exposed for clients that want to set up their own Tokio
/// runtime and use `tokio::spawn` instead of letting `start` set it up.
pub async fn init_server<NH, A>(addr: A, new_handler: NH) -> Result<(), StartError>
where
    NH: NewHandler + 'static,
    A: ToSocketAddrs + 'static + Send,
{
    let listener = tcp_listener(addr).await?;
    let addr = listener.local_addr()?;

    info!(
        target: "waymark::start",
        " Waymark listening on http://{}",
        addr
    );

    bind_server(listener, new_handler).await
}

/// Accepts connections on `listener`, serving each with `new_handler` on its own task. Accept
/// errors are logged and skipped, so the returned future does not complete.
pub async fn bind_server<NH>(listener: TcpListener, new_handler: NH) -> Result<(), StartError>
where
    NH: NewHandler + 'static,
{
    let protocol = Http::new();
    let service = WaymarkService::new(new_handler);

    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Socket Error: {}", e);
                continue;
            }
        };

        let connection = protocol
            .serve_connection(socket, service.connect(addr))
            .with_upgrades()
            .map_err(move |e| error!("[{}] connection error: {}", addr, e));

        tokio::spawn(connection);
    }
}

async fn tcp_listener<A>(addr: A) -> Result<TcpListener, StartError>
where
    A: ToSocketAddrs + 'static,
{
    let addr = addr
        .to_socket_addrs()?
        .next()
        .ok_or(StartError::UnresolvedAddress)?;

    Ok(TcpListener::bind(addr).await?)
}

fn new_runtime(threads: usize) -> io::Result<Runtime> {
    runtime::Builder::new_multi_thread()
        .worker_threads(threads)
        .thread_name("waymark-worker")
        .enable_all()
        .build()
}
