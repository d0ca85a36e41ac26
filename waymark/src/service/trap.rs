//! Defines functionality for processing a request and trapping errors and panics in response
//! generation.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::future::FutureExt;
use hyper::header::HeaderValue;
use hyper::{Body, Response, StatusCode};
use log::{debug, error, info};

use crate::handler::{Handler, HandlerError, IntoResponse, NewHandler};
use crate::helpers::http::header::X_RUNTIME_DURATION;
use crate::helpers::timing::{Timer, Timing};
use crate::state::{request_id, State};

/// Instantiates a `Handler` from the given `NewHandler`, and invokes it with the request. If a
/// panic occurs from `NewHandler::new_handler` or `Handler::handle`, it is trapped and will result
/// in a `500 Internal Server Error` response.
///
/// Timing information is recorded and logged, except in the case of a panic where the `State` is
/// lost along with the response.
pub(super) async fn call_handler<T>(new_handler: Arc<T>, state: AssertUnwindSafe<State>) -> Response<Body>
where
    T: NewHandler + 'static,
{
    let timer = Timer::new();
    let AssertUnwindSafe(state) = state;
    let id = request_id(&state).to_owned();
    debug!("[{}] request started at {}", id, timer.start_time());

    let result = AssertUnwindSafe(async move {
        let handler = match new_handler.new_handler() {
            Ok(handler) => handler,
            Err(e) => return Err((state, HandlerError::from(e))),
        };
        handler.handle(state).await
    })
    .catch_unwind()
    .await;

    match result {
        Ok(Ok((state, response))) => finalize_success_response(timer, &state, response),
        Ok(Err((state, err))) => finalize_error_response(timer, &state, err),
        Err(_) => finalize_panic_response(timer, &id),
    }
}

fn finalize_success_response(timer: Timer, state: &State, response: Response<Body>) -> Response<Body> {
    let timing = timer.elapsed();

    info!(
        "[RESPONSE][{}][{:?}][{}][{}]",
        request_id(state),
        response.version(),
        response.status(),
        timing
    );

    add_timing(response, timing)
}

fn finalize_error_response(timer: Timer, state: &State, err: HandlerError) -> Response<Body> {
    let timing = timer.elapsed();

    error!(
        "[ERROR][{}][Error: {:?}][{}]",
        request_id(state),
        err,
        timing
    );

    add_timing(err.into_response(state), timing)
}

fn finalize_panic_response(timer: Timer, id: &str) -> Response<Body> {
    let timing = timer.elapsed();

    error!(
        "[PANIC][{}][A panic occurred while invoking the handler][{}]",
        id, timing
    );

    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    add_timing(response, timing)
}

fn add_timing(mut response: Response<Body>, timing: Timing) -> Response<Body> {
    if let Ok(value) = HeaderValue::from_str(&timing.to_string()) {
        response.headers_mut().insert(X_RUNTIME_DURATION, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures_executor::block_on;
    use hyper::HeaderMap;

    use crate::helpers::http::response::create_empty_response;
    use crate::state::set_request_id;

    fn fresh_state() -> AssertUnwindSafe<State> {
        let mut state = State::new();
        state.put(HeaderMap::new());
        set_request_id(&mut state);
        AssertUnwindSafe(state)
    }

    #[test]
    fn success() {
        let new_handler = || {
            Ok(|state: State| {
                let res = create_empty_response(&state, StatusCode::ACCEPTED);
                (state, res)
            })
        };

        let response = block_on(call_handler(Arc::new(new_handler), fresh_state()));
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(response.headers().contains_key(X_RUNTIME_DURATION));
    }

    #[test]
    fn error() {
        let new_handler = || {
            Ok(|state: State| {
                let err: HandlerError = anyhow::anyhow!("refused").into();
                (state, Err::<Response<Body>, _>(err.with_status(StatusCode::FORBIDDEN)))
            })
        };

        let response = block_on(call_handler(Arc::new(new_handler), fresh_state()));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn panic() {
        let new_handler = || {
            Ok(|_state: State| -> (State, Response<Body>) {
                panic!("handler panicked");
            })
        };

        let response = block_on(call_handler(Arc::new(new_handler), fresh_state()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn new_handler_panic() {
        let new_handler = || -> anyhow::Result<fn(State) -> (State, Response<Body>)> {
            panic!("unable to create handler");
        };

        let response = block_on(call_handler(Arc::new(new_handler), fresh_state()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn new_handler_failure() {
        let new_handler = || -> anyhow::Result<fn(State) -> (State, Response<Body>)> {
            Err(anyhow::anyhow!("unable to create handler"))
        };

        let response = block_on(call_handler(Arc::new(new_handler), fresh_state()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
