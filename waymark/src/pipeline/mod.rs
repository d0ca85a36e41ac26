//! Defines types for a middleware pipeline

use std::pin::Pin;
use std::sync::Arc;

use futures_util::future::FutureExt;
use log::trace;

use crate::handler::{Handler, HandlerFuture};
use crate::middleware::{ErrorDispatch, FilteredMarker, Middleware, StageId};
use crate::state::{request_id, State};

/// The innermost handler of a `Pipeline`, invoked once every stage has passed the request on.
pub type Endpoint = Arc<dyn Fn(State) -> Pin<Box<HandlerFuture>> + Send + Sync>;

/// An ordered list of `Middleware` stages wrapped around an `Endpoint`.
///
/// The first stage added is the outermost: it sees the request first and the response last.
///
/// # Examples
///
/// ```rust
/// # use std::pin::Pin;
/// # use waymark::handler::HandlerFuture;
/// # use waymark::middleware::Middleware;
/// # use waymark::pipeline::{new_pipeline, Next};
/// # use waymark::state::{State, StateData};
/// #
/// struct Number(i32);
///
/// impl StateData for Number {}
///
/// struct Double;
///
/// impl Middleware for Double {
///     fn name(&self) -> &'static str {
///         "double"
///     }
///
///     fn call(&self, mut state: State, chain: Next) -> Pin<Box<HandlerFuture>> {
///         let n = state.take::<Number>().0;
///         state.put(Number(n * 2));
///         chain.run(state)
///     }
/// }
///
/// # fn main() {
/// let pipeline = new_pipeline().add(Double).add(Double).build();
/// assert_eq!(pipeline.names(), vec!["double", "double"]);
/// # drop(pipeline);
/// # }
/// ```
#[derive(Clone)]
pub struct Pipeline {
    stages: Arc<Vec<Arc<dyn Middleware>>>,
}

impl Pipeline {
    /// Runs the request through every stage and finally into `endpoint`.
    pub fn call(&self, state: State, endpoint: Endpoint) -> Pin<Box<HandlerFuture>> {
        trace!("[{}] calling middleware", request_id(&state));
        Next {
            stages: self.stages.clone(),
            index: 0,
            endpoint,
        }
        .run(state)
    }

    /// The names of the stages, outermost first.
    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }
}

/// The remainder of a `Pipeline`, handed to each stage to continue the request.
pub struct Next {
    stages: Arc<Vec<Arc<dyn Middleware>>>,
    index: usize,
    endpoint: Endpoint,
}

impl Next {
    /// Continues the request with the next stage, or the endpoint once every stage has run.
    ///
    /// A stage already running for this request, and every stage of a request flagged with
    /// `ErrorDispatch`, is passed over.
    pub fn run(self, mut state: State) -> Pin<Box<HandlerFuture>> {
        let stage = match self.stages.get(self.index) {
            Some(stage) => stage.clone(),
            None => return (self.endpoint)(state),
        };

        let next = Next {
            stages: self.stages,
            index: self.index + 1,
            endpoint: self.endpoint,
        };
        let name = stage.name();
        let id = StageId::of(&*stage);

        if ErrorDispatch::is_set(&state) || FilteredMarker::is_marked(&state, id) {
            trace!("[{}] passing over stage `{}`", request_id(&state), name);
            return next.run(state);
        }

        trace!("[{}] entering stage `{}`", request_id(&state), name);
        FilteredMarker::mark(&mut state, id);

        stage
            .call(state, next)
            .map(move |result| match result {
                Ok((mut state, response)) => {
                    FilteredMarker::unmark(&mut state, id);
                    Ok((state, response))
                }
                Err((mut state, err)) => {
                    FilteredMarker::unmark(&mut state, id);
                    Err((state, err))
                }
            })
            .boxed()
    }
}

impl Handler for Next {
    fn handle(self, state: State) -> Pin<Box<HandlerFuture>> {
        self.run(state)
    }
}

/// Begins defining a new pipeline.
pub fn new_pipeline() -> PipelineBuilder {
    trace!(" starting pipeline construction");
    PipelineBuilder { stages: Vec::new() }
}

/// Allows a pipeline to be defined by adding `Middleware` values, and building a `Pipeline`.
pub struct PipelineBuilder {
    stages: Vec<Arc<dyn Middleware>>,
}

impl PipelineBuilder {
    /// Adds a `Middleware` value to the pipeline, inside every stage added before it.
    pub fn add<M>(self, m: M) -> PipelineBuilder
    where
        M: Middleware + 'static,
    {
        self.add_shared(Arc::new(m))
    }

    /// Adds an already shared `Middleware` value.
    pub fn add_shared(mut self, m: Arc<dyn Middleware>) -> PipelineBuilder {
        trace!(" adding middleware `{}` to pipeline", m.name());
        self.stages.push(m);
        self
    }

    /// Builds a `Pipeline`, which contains all middleware in the order provided via `add`.
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: Arc::new(self.stages),
        }
    }
}

/// An endpoint answering every request with an empty response of `status`.
#[cfg(test)]
pub(crate) fn test_endpoint(status: hyper::StatusCode) -> Endpoint {
    use crate::helpers::http::response::create_empty_response;
    use futures_util::future;

    Arc::new(move |state: State| {
        let response = create_empty_response(&state, status);
        future::ok((state, response)).boxed()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures_executor::block_on;
    use futures_util::future;
    use hyper::body::to_bytes;
    use hyper::{Body, HeaderMap, Response, StatusCode};
    use std::sync::Mutex;

    use crate::state::{set_request_id, StateData};

    struct Number {
        value: i32,
    }

    impl StateData for Number {}

    struct Add(i32);

    impl Middleware for Add {
        fn name(&self) -> &'static str {
            "add"
        }

        fn call(&self, mut state: State, chain: Next) -> Pin<Box<HandlerFuture>> {
            state.borrow_mut::<Number>().value += self.0;
            chain.run(state)
        }
    }

    struct Multiply(i32);

    impl Middleware for Multiply {
        fn name(&self) -> &'static str {
            "multiply"
        }

        fn call(&self, mut state: State, chain: Next) -> Pin<Box<HandlerFuture>> {
            state.borrow_mut::<Number>().value *= self.0;
            chain.run(state)
        }
    }

    struct Record(Arc<Mutex<Vec<bool>>>);

    impl Middleware for Record {
        fn name(&self) -> &'static str {
            "record"
        }

        fn call(&self, state: State, chain: Next) -> Pin<Box<HandlerFuture>> {
            self.0
                .lock()
                .unwrap()
                .push(FilteredMarker::is_marked(&state, StageId::of(self)));
            chain.run(state)
        }
    }

    fn number_endpoint() -> Endpoint {
        Arc::new(|state: State| {
            let body = state.borrow::<Number>().value.to_string();
            future::ok((state, Response::new(Body::from(body)))).boxed()
        })
    }

    fn fresh_state(value: i32) -> State {
        let mut state = State::new();
        state.put(HeaderMap::new());
        set_request_id(&mut state);
        state.put(Number { value });
        state
    }

    fn body_of(pipeline: &Pipeline, state: State, endpoint: Endpoint) -> String {
        let result = block_on(pipeline.call(state, endpoint));
        let (_, response) = result.unwrap_or_else(|_| panic!("pipeline failed"));
        let bytes = block_on(to_bytes(response.into_body())).unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn stages_run_in_order() {
        let pipeline = new_pipeline()
            .add(Add(1))
            .add(Multiply(2))
            .add(Add(3))
            .build();

        // (0 + 1) * 2 + 3
        assert_eq!(body_of(&pipeline, fresh_state(0), number_endpoint()), "5");
    }

    #[test]
    fn stages_sharing_a_name_all_run() {
        let pipeline = new_pipeline().add(Add(1)).add(Add(2)).add(Add(4)).build();
        assert_eq!(pipeline.names(), vec!["add", "add", "add"]);
        assert_eq!(body_of(&pipeline, fresh_state(0), number_endpoint()), "7");
    }

    #[test]
    fn marked_stages_are_passed_over() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let add: Arc<dyn Middleware> = Arc::new(Add(1));
        let pipeline = new_pipeline()
            .add(Record(seen.clone()))
            .add_shared(add.clone())
            .build();

        let mut state = fresh_state(0);
        FilteredMarker::mark(&mut state, StageId::of(&*add));
        assert_eq!(body_of(&pipeline, state, number_endpoint()), "0");

        // The stage sees its own marker while it runs, and the marker is cleared afterwards.
        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }

    #[test]
    fn markers_are_cleared_when_the_chain_completes() {
        let add: Arc<dyn Middleware> = Arc::new(Add(1));
        let pipeline = new_pipeline().add_shared(add.clone()).build();
        let result = block_on(pipeline.call(fresh_state(0), test_endpoint(StatusCode::OK)));
        let (state, _) = result.unwrap_or_else(|_| panic!("pipeline failed"));
        assert!(!FilteredMarker::is_marked(&state, StageId::of(&*add)));
    }

    #[test]
    fn error_dispatch_skips_every_stage() {
        let pipeline = new_pipeline().add(Add(1)).add(Multiply(5)).build();
        let mut state = fresh_state(2);
        state.put(ErrorDispatch);
        assert_eq!(body_of(&pipeline, state, number_endpoint()), "2");
    }
}
