//! Defines the `RouteNonMatch` type, which records why a candidate handler rejected a request.

use std::collections::HashSet;
use std::fmt;

use hyper::{Method, StatusCode};

/// The error type used for a non-matching candidate, as returned by `RouteMatcher::is_match`.
///
/// A request whose candidates all reject it is answered with `404 Not Found`. The rejections are
/// combined with `union` to describe, in the logs, how close the request came to matching.
#[derive(Clone, Debug)]
pub struct RouteNonMatch {
    status: StatusCode,
    allow: HashSet<Method>,
}

impl RouteNonMatch {
    /// Creates a new `RouteNonMatch` value with the given HTTP status.
    pub fn new(status: StatusCode) -> RouteNonMatch {
        RouteNonMatch {
            status,
            allow: HashSet::new(),
        }
    }

    /// Records the methods that would have been accepted.
    pub fn with_allow_list(self, allow: &[Method]) -> RouteNonMatch {
        RouteNonMatch {
            allow: allow.iter().cloned().collect(),
            ..self
        }
    }

    /// Merges two rejections, keeping the status of the candidate that came closer to matching.
    pub fn union(self, other: RouteNonMatch) -> RouteNonMatch {
        let status = higher_precedence_status(self.status, other.status);
        let allow = self.allow.union(&other.allow).cloned().collect();
        RouteNonMatch { status, allow }
    }

    /// The status describing the rejection.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The accepted methods, sorted.
    pub fn allow(&self) -> Vec<Method> {
        let mut allow: Vec<Method> = self.allow.iter().cloned().collect();
        allow.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));
        allow
    }
}

impl fmt::Display for RouteNonMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status)?;
        let allow = self.allow();
        if !allow.is_empty() {
            let names: Vec<&str> = allow.iter().map(Method::as_str).collect();
            write!(f, " (allow: {})", names.join(", "))?;
        }
        Ok(())
    }
}

fn higher_precedence_status(lhs: StatusCode, rhs: StatusCode) -> StatusCode {
    match (lhs, rhs) {
        (StatusCode::NOT_FOUND, _) => rhs,
        (_, StatusCode::NOT_FOUND) => lhs,
        // prefer candidates that matched the verb
        (StatusCode::METHOD_NOT_ALLOWED, _) => rhs,
        (_, StatusCode::METHOD_NOT_ALLOWED) => lhs,
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, _) => rhs,
        (_, StatusCode::UNSUPPORTED_MEDIA_TYPE) => lhs,
        (_, _) if lhs.is_client_error() => lhs,
        (_, _) if rhs.is_client_error() => rhs,
        (_, _) => lhs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_prefers_closer_matches() {
        let verb = RouteNonMatch::new(StatusCode::METHOD_NOT_ALLOWED).with_allow_list(&[Method::POST]);
        let accept = RouteNonMatch::new(StatusCode::NOT_ACCEPTABLE);
        let consume = RouteNonMatch::new(StatusCode::UNSUPPORTED_MEDIA_TYPE)
            .with_allow_list(&[Method::GET]);

        let merged = verb.clone().union(consume.clone());
        assert_eq!(merged.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(merged.allow(), vec![Method::GET, Method::POST]);

        assert_eq!(consume.union(accept).status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(verb.to_string(), "405 Method Not Allowed (allow: POST)");
    }
}
