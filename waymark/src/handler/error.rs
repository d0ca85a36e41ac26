use std::fmt::{self, Debug, Display, Formatter};

use hyper::{Body, Response, StatusCode};
use log::{debug, trace};

use crate::handler::IntoResponse;
use crate::helpers::http::response::create_empty_response;
use crate::state::{request_id, State};

/// Describes an error which occurred during handler execution, and allows the creation of a HTTP
/// `Response`.
pub struct HandlerError {
    status_code: StatusCode,
    cause: anyhow::Error,
}

/// Convert a generic `anyhow::Error` into a `HandlerError`, similar as you would a concrete error
/// type with `into_handler_error()`.
impl<E> From<E> for HandlerError
where
    E: Into<anyhow::Error> + Display,
{
    fn from(error: E) -> HandlerError {
        trace!(" converting Error to HandlerError: {}", error);

        HandlerError {
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            cause: error.into(),
        }
    }
}

impl HandlerError {
    /// Returns the HTTP status code associated with this `HandlerError`.
    pub fn status(&self) -> StatusCode {
        self.status_code
    }

    /// Sets the HTTP status code of the response which is generated from this `HandlerError`.
    pub fn with_status(self, status_code: StatusCode) -> HandlerError {
        HandlerError {
            status_code,
            ..self
        }
    }

    /// The underlying cause of this error.
    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }
}

impl Debug for HandlerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerError({}): {:?}", self.status_code, self.cause)
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self, state: &State) -> Response<Body> {
        debug!(
            "[{}] HandlerError generating {} {} response: {}",
            request_id(state),
            self.status_code.as_u16(),
            self.status_code
                .canonical_reason()
                .unwrap_or("(unregistered)",),
            self.cause
        );

        create_empty_response(state, self.status_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::set_request_id;

    #[test]
    fn status_is_overridable() {
        let err: HandlerError = anyhow::anyhow!("boom").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = err.with_status(StatusCode::BAD_GATEWAY);
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.cause().to_string(), "boom");
    }

    #[test]
    fn error_into_response_uses_status() {
        State::with_new(|state| {
            state.put(hyper::HeaderMap::new());
            set_request_id(state);

            let err: HandlerError = std::io::Error::new(std::io::ErrorKind::Other, "gone").into();
            let res = err
                .with_status(StatusCode::SERVICE_UNAVAILABLE)
                .into_response(state);
            assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        });
    }
}
