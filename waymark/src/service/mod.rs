//! Defines the `WaymarkService` type which is used to wrap a `NewHandler` and interface with
//! hyper.

use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{self, Poll};

use futures_util::future::FutureExt;
use hyper::service::Service;
use hyper::{Body, Request, Response};

use crate::handler::NewHandler;
use crate::state::State;

mod trap;

/// Wraps a `NewHandler` which will be used to serve requests. Used by `bind_server` to bind
/// incoming connections to `ConnectedWaymarkService` values.
pub(crate) struct WaymarkService<T>
where
    T: NewHandler + 'static,
{
    handler: Arc<T>,
}

impl<T> WaymarkService<T>
where
    T: NewHandler + 'static,
{
    pub(crate) fn new(handler: T) -> WaymarkService<T> {
        WaymarkService {
            handler: Arc::new(handler),
        }
    }

    pub(crate) fn connect(&self, client_addr: SocketAddr) -> ConnectedWaymarkService<T> {
        ConnectedWaymarkService {
            client_addr,
            handler: self.handler.clone(),
        }
    }
}

/// A `WaymarkService` which has been connected to a client. The major difference is that a
/// `client_addr` has been assigned (as this isn't available from hyper).
pub(crate) struct ConnectedWaymarkService<T>
where
    T: NewHandler + 'static,
{
    handler: Arc<T>,
    client_addr: SocketAddr,
}

impl<T> Service<Request<Body>> for ConnectedWaymarkService<T>
where
    T: NewHandler,
{
    type Response = Response<Body>;
    type Error = anyhow::Error;
    type Future =
        Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        _cx: &mut task::Context<'_>,
    ) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let state = State::from_request(req, self.client_addr);
        let handler = self.handler.clone();

        trap::call_handler(handler, AssertUnwindSafe(state))
            .map(Ok)
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures_executor::block_on;
    use hyper::StatusCode;

    use crate::helpers::http::response::create_empty_response;

    fn handler(state: State) -> (State, Response<Body>) {
        let res = create_empty_response(&state, StatusCode::ACCEPTED);
        (state, res)
    }

    #[test]
    fn new_handler_closure() {
        let service = WaymarkService::new(|| Ok(handler));

        let req = Request::get("http://localhost/")
            .body(Body::empty())
            .unwrap();
        let f = service
            .connect("127.0.0.1:10000".parse().unwrap())
            .call(req);
        let response = block_on(f).unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
