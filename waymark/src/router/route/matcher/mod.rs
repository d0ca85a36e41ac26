//! Defines the type `RouteMatcher` and the filters applied to each candidate handler.

pub mod accept;
pub mod and;
pub mod content_type;

pub use self::accept::AcceptHeaderRouteMatcher;
pub use self::and::AndRouteMatcher;
pub use self::content_type::ContentTypeHeaderRouteMatcher;

use hyper::{Method, StatusCode};
use log::trace;

use crate::router::non_match::RouteNonMatch;
use crate::state::{request_id, FromState, State};

/// Determines if a candidate handler accepts the request, based on the `Request` properties held
/// in `State`.
pub trait RouteMatcher: Send + Sync {
    /// Accepts the request, or describes why it was rejected.
    fn is_match(&self, state: &State) -> Result<(), RouteNonMatch>;
}

/// A `RouteMatcher` that succeeds when the request method equals the declared verb, ignoring
/// case.
#[derive(Clone)]
pub struct MethodOnlyRouteMatcher {
    methods: Vec<Method>,
}

impl MethodOnlyRouteMatcher {
    /// Creates a new `MethodOnlyRouteMatcher`.
    pub fn new(methods: Vec<Method>) -> Self {
        MethodOnlyRouteMatcher { methods }
    }
}

impl RouteMatcher for MethodOnlyRouteMatcher {
    fn is_match(&self, state: &State) -> Result<(), RouteNonMatch> {
        let method = Method::borrow_from(state);
        if self
            .methods
            .iter()
            .any(|m| m.as_str().eq_ignore_ascii_case(method.as_str()))
        {
            trace!(
                "[{}] matched request method {} to permitted method",
                request_id(state),
                method
            );
            Ok(())
        } else {
            trace!(
                "[{}] did not match request method {}",
                request_id(state),
                method
            );
            Err(RouteNonMatch::new(StatusCode::METHOD_NOT_ALLOWED)
                .with_allow_list(self.methods.as_slice()))
        }
    }
}
