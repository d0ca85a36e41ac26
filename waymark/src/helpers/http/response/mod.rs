//! Helpers for HTTP response generation

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Method, Response, StatusCode};
use mime::Mime;

use crate::helpers::http::header::X_REQUEST_ID;
use crate::state::{request_id, FromState, State};

/// Creates a `Response` with the given status, content type and body, tagged with the request
/// id by `set_headers`.
pub fn create_response<B>(state: &State, status: StatusCode, mime: Mime, body: B) -> Response<Body>
where
    B: Into<Body>,
{
    let mut res = create_empty_response(state, status);
    extend_response(state, &mut res, mime, body);
    res
}

/// Produces a simple empty `Response` with the provided `StatusCode`.
pub fn create_empty_response(state: &State, status: StatusCode) -> Response<Body> {
    let mut res = Response::new(Body::empty());
    *res.status_mut() = status;
    set_headers(state, &mut res);
    res
}

/// Extends a `Response` object with the provided body and content type. The body is skipped
/// for `HEAD` requests.
pub fn extend_response<B>(state: &State, res: &mut Response<Body>, mime: Mime, body: B)
where
    B: Into<Body>,
{
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        res.headers_mut().insert(CONTENT_TYPE, value);
    }

    let is_head = Method::try_borrow_from(state)
        .map(|m| m == Method::HEAD)
        .unwrap_or(false);

    if !is_head {
        *res.body_mut() = body.into();
    }
}

/// Sets the request id on the response. Other headers are left to the view.
///
/// * X-Request-ID: The unique identifier which is attached to the `State` to identify this
///   request.
pub fn set_headers(state: &State, res: &mut Response<Body>) {
    if let Ok(value) = HeaderValue::from_str(request_id(state)) {
        res.headers_mut().insert(X_REQUEST_ID, value);
    }
}
