//! Defines the `AcceptHeaderRouteMatcher`.

use hyper::header::{HeaderMap, ACCEPT};
use hyper::StatusCode;
use log::trace;
use mime::Mime;

use crate::router::non_match::RouteNonMatch;
use crate::router::route::matcher::RouteMatcher;
use crate::state::{request_id, FromState, State};

/// A `RouteMatcher` that succeeds when the request `Accept` header admits the media type the
/// candidate produces.
///
/// An `Accept` header including `*/*` anywhere in its list admits everything, as does a request
/// without one. Other ranges such as `text/*` are not expanded.
/// Otherwise one of the `;` separated components of the produced type must appear within the
/// `Accept` header, so `application/json` admits a candidate producing
/// `application/json; charset=UTF-8`.
#[derive(Clone)]
pub struct AcceptHeaderRouteMatcher {
    produce: Mime,
}

impl AcceptHeaderRouteMatcher {
    /// Creates a new `AcceptHeaderRouteMatcher`.
    pub fn new(produce: Mime) -> Self {
        AcceptHeaderRouteMatcher { produce }
    }
}

impl RouteMatcher for AcceptHeaderRouteMatcher {
    fn is_match(&self, state: &State) -> Result<(), RouteNonMatch> {
        let accept = match HeaderMap::try_borrow_from(state).and_then(|headers| headers.get(ACCEPT))
        {
            None => return Ok(()),
            Some(accept) => String::from_utf8_lossy(accept.as_bytes()).to_ascii_lowercase(),
        };

        if accept.contains("*/*") {
            return Ok(());
        }

        let produce = self.produce.as_ref().to_ascii_lowercase();
        let admitted = produce
            .split(';')
            .map(str::trim)
            .filter(|component| !component.is_empty())
            .any(|component| accept.contains(component));

        if admitted {
            return Ok(());
        }

        trace!(
            "[{}] Accept `{}` does not admit `{}`",
            request_id(state),
            accept,
            self.produce
        );

        Err(RouteNonMatch::new(StatusCode::NOT_ACCEPTABLE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::set_request_id;

    fn accepts(produce: &str, accept: Option<&str>) -> bool {
        let matcher = AcceptHeaderRouteMatcher::new(produce.parse().unwrap());
        let mut result = false;
        State::with_new(|state| {
            let mut headers = HeaderMap::new();
            if let Some(value) = accept {
                headers.insert(ACCEPT, value.parse().unwrap());
            }
            state.put(headers);
            set_request_id(state);
            result = matcher.is_match(state).is_ok();
        });
        result
    }

    #[test]
    fn star_star_admits_any_produce() {
        assert!(accepts("text/xml", Some("*/*")));
        assert!(accepts("text/xml", Some("text/html, */*;q=0.8")));
    }

    #[test]
    fn missing_accept_passes() {
        assert!(accepts("text/xml", None));
    }

    #[test]
    fn produce_component_must_appear_in_accept() {
        assert!(accepts("application/json; charset=UTF-8", Some("application/json")));
        assert!(accepts("application/json", Some("application/json")));
        assert!(!accepts("text/xml", Some("application/json")));
    }

    #[test]
    fn only_the_full_wildcard_is_expanded() {
        assert!(!accepts("text/xml", Some("text/*")));
        assert!(!accepts("text/xml", Some("application/*, image/png")));
        assert!(accepts("text/xml", Some("application/json;q=0.9, */*;q=0.1")));
    }
}
