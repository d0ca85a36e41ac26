//! Defines the `ContentTypeHeaderRouteMatcher`.

use hyper::header::{HeaderMap, CONTENT_TYPE};
use hyper::StatusCode;
use log::trace;
use mime::Mime;

use crate::router::non_match::RouteNonMatch;
use crate::router::route::matcher::RouteMatcher;
use crate::state::{request_id, FromState, State};

/// A `RouteMatcher` that succeeds when the request `Content-Type` contains the media type the
/// candidate consumes.
///
/// A consumed type of `*/*` accepts every request, as does a request without a `Content-Type`.
#[derive(Clone)]
pub struct ContentTypeHeaderRouteMatcher {
    consume: Mime,
}

impl ContentTypeHeaderRouteMatcher {
    /// Creates a new `ContentTypeHeaderRouteMatcher`.
    pub fn new(consume: Mime) -> Self {
        ContentTypeHeaderRouteMatcher { consume }
    }
}

impl RouteMatcher for ContentTypeHeaderRouteMatcher {
    fn is_match(&self, state: &State) -> Result<(), RouteNonMatch> {
        if self.consume.essence_str() == mime::STAR_STAR.essence_str() {
            return Ok(());
        }

        let content_type = match HeaderMap::try_borrow_from(state)
            .and_then(|headers| headers.get(CONTENT_TYPE))
        {
            // The client has not specified a `Content-Type` header.
            None => return Ok(()),
            Some(content_type) => content_type,
        };

        let content_type = String::from_utf8_lossy(content_type.as_bytes()).to_ascii_lowercase();
        if content_type.contains(self.consume.essence_str()) {
            return Ok(());
        }

        trace!(
            "[{}] Content-Type `{}` does not contain `{}`",
            request_id(state),
            content_type,
            self.consume.essence_str()
        );

        Err(RouteNonMatch::new(StatusCode::UNSUPPORTED_MEDIA_TYPE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::set_request_id;

    fn with_content_type<F: FnOnce(&State)>(content_type: Option<&str>, f: F) {
        State::with_new(|state| {
            let mut headers = HeaderMap::new();
            if let Some(value) = content_type {
                headers.insert(CONTENT_TYPE, value.parse().unwrap());
            }
            state.put(headers);
            set_request_id(state);
            f(state)
        })
    }

    #[test]
    fn star_star_accepts_everything() {
        let matcher = ContentTypeHeaderRouteMatcher::new(mime::STAR_STAR);
        with_content_type(Some("text/plain"), |state| assert!(matcher.is_match(state).is_ok()));
    }

    #[test]
    fn missing_content_type_passes() {
        let matcher = ContentTypeHeaderRouteMatcher::new(mime::APPLICATION_JSON);
        with_content_type(None, |state| assert!(matcher.is_match(state).is_ok()));
    }

    #[test]
    fn content_type_must_contain_consumed_type() {
        let matcher = ContentTypeHeaderRouteMatcher::new(mime::APPLICATION_JSON);
        with_content_type(Some("application/json; charset=UTF-8"), |state| {
            assert!(matcher.is_match(state).is_ok())
        });
        with_content_type(Some("text/xml"), |state| {
            let err = matcher.is_match(state).unwrap_err();
            assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        });
    }
}
