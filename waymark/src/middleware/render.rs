//! Renders the `View` left in `State` by dispatch.

use std::pin::Pin;
use std::sync::Arc;

use futures_util::future::FutureExt;
use hyper::{Body, Response};
use log::debug;

use crate::extractor::ResponseHeaders;
use crate::handler::HandlerFuture;
use crate::middleware::Middleware;
use crate::pipeline::Next;
use crate::router::RouterData;
use crate::state::{request_id, State};
use crate::view::View;

/// The outermost stage. Once the rest of the chain has completed, any `View` in `State` replaces
/// the response, and headers recorded through `ResponseHeaders` are copied onto it.
pub struct ViewRender {
    data: Arc<RouterData>,
}

impl ViewRender {
    pub(crate) fn new(data: Arc<RouterData>) -> Self {
        ViewRender { data }
    }
}

impl Middleware for ViewRender {
    fn name(&self) -> &'static str {
        "render"
    }

    fn call(&self, state: State, chain: Next) -> Pin<Box<HandlerFuture>> {
        let data = self.data.clone();

        chain
            .run(state)
            .map(move |result| {
                result.map(|(mut state, response)| match state.try_take::<View>() {
                    Some(view) => {
                        let response = render(&state, view, &data);
                        (state, response)
                    }
                    None => (state, response),
                })
            })
            .boxed()
    }
}

/// Renders `view` with the router's renderer and configuration.
pub(crate) fn render(state: &State, view: View, data: &RouterData) -> Response<Body> {
    debug!(
        "[{}] rendering view with status {}",
        request_id(state),
        view.status()
    );

    let mut response = view.render(state, data.renderer.as_deref(), &data.config);
    if let Some(headers) = state.try_borrow::<ResponseHeaders>() {
        let headers = headers.snapshot();
        for name in headers.keys() {
            response.headers_mut().remove(name);
            for value in headers.get_all(name) {
                response.headers_mut().append(name.clone(), value.clone());
            }
        }
    }
    response
}
