//! The identifier attached to every log line written for a request.

use hyper::HeaderMap;
use log::trace;
use uuid::Uuid;

use crate::helpers::http::header::X_REQUEST_ID;
use crate::state::{FromState, State, StateData};

#[derive(Clone)]
pub(super) struct RequestId(String);

impl StateData for RequestId {}

/// Assigns the request its identifier, unless it already has one, and returns it.
///
/// A non-empty `X-Request-ID` header supplied by the client is used as is. Otherwise a v4 UUID
/// is generated.
pub(crate) fn set_request_id(state: &mut State) -> &str {
    if !state.has::<RequestId>() {
        let supplied = HeaderMap::try_borrow_from(state)
            .and_then(|headers| headers.get(X_REQUEST_ID))
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_owned);

        let id = supplied.unwrap_or_else(|| {
            let id = Uuid::new_v4().hyphenated().to_string();
            trace!("[{}] generated request id", id);
            id
        });
        state.put(RequestId(id));
    }

    request_id(state)
}

/// The identifier of the request held in `state`.
///
/// # Panics
///
/// If `State` was not created from a request, so no identifier was assigned.
pub fn request_id(state: &State) -> &str {
    match RequestId::try_borrow_from(state) {
        Some(id) => &id.0,
        None => panic!("RequestId must be populated before application code is invoked"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "RequestId must be populated")]
    fn missing_request_id_panics() {
        request_id(&State::new());
    }

    #[test]
    fn supplied_request_id_is_kept() {
        let mut state = State::new();
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, "1-2-3-4".parse().unwrap());
        state.put(headers);

        assert_eq!(set_request_id(&mut state), "1-2-3-4");
        assert_eq!(request_id(&state), "1-2-3-4");
    }

    #[test]
    fn empty_header_is_ignored() {
        let mut state = State::new();
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, "".parse().unwrap());
        state.put(headers);

        let id = set_request_id(&mut state).to_owned();
        assert_eq!(Uuid::parse_str(&id).unwrap().get_version_num(), 4);
    }

    #[test]
    fn generated_once() {
        let mut state = State::new();
        state.put(HeaderMap::new());

        let first = set_request_id(&mut state).to_owned();
        assert_eq!(Uuid::parse_str(&first).unwrap().get_version_num(), 4);
        assert_eq!(set_request_id(&mut state), first);
    }
}
