//! Resolves the request path against the mapping trees, once per request.

use std::pin::Pin;
use std::sync::Arc;

use log::debug;

use crate::handler::HandlerFuture;
use crate::helpers::http::request::path::RequestPathSegments;
use crate::middleware::Middleware;
use crate::pipeline::Next;
use crate::router::resolver::ResolvedMapping;
use crate::router::RouterData;
use crate::state::{request_id, State};

/// Puts the `ResolvedMapping` for the request path into `State`.
pub struct MappingResolve {
    data: Arc<RouterData>,
}

impl MappingResolve {
    pub(crate) fn new(data: Arc<RouterData>) -> Self {
        MappingResolve { data }
    }
}

impl Middleware for MappingResolve {
    fn name(&self) -> &'static str {
        "mapping"
    }

    fn call(&self, mut state: State, chain: Next) -> Pin<Box<HandlerFuture>> {
        let candidates = match state.try_borrow::<RequestPathSegments>() {
            Some(path) => self.data.resolver.resolve(path.segments()),
            None => self.data.resolver.resolve(&[]),
        };

        debug!(
            "[{}] resolved {} candidate handler(s)",
            request_id(&state),
            candidates.len()
        );

        state.put(ResolvedMapping::new(candidates));
        chain.run(state)
    }
}
