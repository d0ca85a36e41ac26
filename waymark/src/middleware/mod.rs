//! Defines types for `Middleware`, a reusable unit of logic that runs around the dispatch of
//! every request passing through a `Pipeline`.
//!
//! The router assembles its own stages ahead of any application `Middleware`:
//!
//! 1. [`ViewRender`](render/struct.ViewRender.html) renders the `View` left in `State` once the
//!    rest of the chain has completed.
//! 2. [`MappingResolve`](mapping/struct.MappingResolve.html) resolves the request path to its
//!    candidate handlers.
//! 3. [`Encoding`](encoding/struct.Encoding.html) records the request and response charsets.
//! 4. [`Upload`](upload/struct.Upload.html) buffers the body and parses form and multipart
//!    content.

use std::collections::HashSet;
use std::pin::Pin;

use crate::handler::HandlerFuture;
use crate::pipeline::Next;
use crate::state::{State, StateData};

pub mod encoding;
pub mod mapping;
pub mod render;
pub mod upload;

pub use self::encoding::{Encoding, RequestCharset, ResponseCharset};
pub use self::mapping::MappingResolve;
pub use self::render::ViewRender;
pub use self::upload::Upload;

/// `Middleware` has the opportunity to provide additional behaviour to the `Request` / `Response`
/// interaction. For example:
///
/// * The request can be halted due to some unmet precondition;
/// * Processing the request can be delayed until some other action has completed;
/// * Middleware-specific state data can be recorded in the `State` struct for use elsewhere;
/// * The returned future can be manipulated via continuations to provide additional behaviour
///   after the request completes.
///
/// # Examples
///
/// Taking no action, and immediately passing the request through to the rest of the chain:
///
/// ```rust
/// # use std::pin::Pin;
/// # use waymark::handler::HandlerFuture;
/// # use waymark::middleware::Middleware;
/// # use waymark::pipeline::Next;
/// # use waymark::state::State;
/// #
/// struct NoopMiddleware;
///
/// impl Middleware for NoopMiddleware {
///     fn name(&self) -> &'static str {
///         "noop"
///     }
///
///     fn call(&self, state: State, chain: Next) -> Pin<Box<HandlerFuture>> {
///         chain.run(state)
///     }
/// }
/// ```
pub trait Middleware: Send + Sync {
    /// Names the stage in logs. Names need not be unique within a pipeline.
    fn name(&self) -> &'static str;

    /// Entry point to the middleware. To pass the request on to the application, the middleware
    /// invokes `chain.run` with the provided `state`.
    ///
    /// By convention, the middleware should:
    ///
    /// * Not modify any request components added to `State` by the service layer.
    /// * Avoid modifying parts of the `State` that don't strictly need to be modified to perform
    ///   its function.
    fn call(&self, state: State, chain: Next) -> Pin<Box<HandlerFuture>>;
}

/// Identifies one `Middleware` value, independently of its name.
///
/// Two stages built from the same type are distinct; the same shared value added to a pipeline
/// is the same stage wherever it appears.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StageId(usize);

impl StageId {
    /// The identity of `stage`.
    pub fn of(stage: &dyn Middleware) -> Self {
        StageId(stage as *const dyn Middleware as *const () as usize)
    }
}

/// The stages currently running for a request. A stage already running is skipped when the
/// chain reaches it again.
#[derive(Debug, Default)]
pub struct FilteredMarker {
    stages: HashSet<StageId>,
}

impl FilteredMarker {
    /// Whether `stage` is running for the request held in `state`.
    pub fn is_marked(state: &State, stage: StageId) -> bool {
        state
            .try_borrow::<FilteredMarker>()
            .map(|marker| marker.stages.contains(&stage))
            .unwrap_or(false)
    }

    pub(crate) fn mark(state: &mut State, stage: StageId) {
        if !state.has::<FilteredMarker>() {
            state.put(FilteredMarker::default());
        }
        state.borrow_mut::<FilteredMarker>().stages.insert(stage);
    }

    pub(crate) fn unmark(state: &mut State, stage: StageId) {
        if let Some(marker) = state.try_borrow_mut::<FilteredMarker>() {
            marker.stages.remove(&stage);
        }
    }
}

impl StateData for FilteredMarker {}

/// Flags a request that was re-dispatched to render an error. Such requests pass every stage
/// unmodified.
///
/// The flag is read from the request extensions when `State` is created.
#[derive(Clone, Copy, Debug, Default)]
pub struct ErrorDispatch;

impl ErrorDispatch {
    /// Whether the request held in `state` is an error dispatch.
    pub fn is_set(state: &State) -> bool {
        state.has::<ErrorDispatch>()
    }
}

impl StateData for ErrorDispatch {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl Middleware for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn call(&self, state: State, chain: Next) -> Pin<Box<HandlerFuture>> {
            chain.run(state)
        }
    }

    #[test]
    fn markers_are_per_stage() {
        let upload = Named("upload");
        let encoding = Named("encoding");
        let upload_again = Named("upload");

        State::with_new(|state| {
            assert!(!FilteredMarker::is_marked(state, StageId::of(&upload)));

            FilteredMarker::mark(state, StageId::of(&upload));
            FilteredMarker::mark(state, StageId::of(&encoding));
            assert!(FilteredMarker::is_marked(state, StageId::of(&upload)));
            assert!(!FilteredMarker::is_marked(state, StageId::of(&upload_again)));

            FilteredMarker::unmark(state, StageId::of(&upload));
            assert!(!FilteredMarker::is_marked(state, StageId::of(&upload)));
            assert!(FilteredMarker::is_marked(state, StageId::of(&encoding)));
        });
    }

    #[test]
    fn error_dispatch_flag() {
        State::with_new(|state| {
            assert!(!ErrorDispatch::is_set(state));
            state.put(ErrorDispatch);
            assert!(ErrorDispatch::is_set(state));
        });
    }
}
