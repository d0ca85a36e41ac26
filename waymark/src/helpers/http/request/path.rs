//! Defines helper functions for processing the request path

use crate::helpers::http::PercentDecoded;

const EXCLUDED_SEGMENTS: [&str; 1] = [""];

/// Holder for `Request` URI path segments that have been split into individual segments.
///
/// Used internally by the `Resolver` when walking the mapping trees.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestPathSegments {
    segments: Vec<PercentDecoded>,
}

impl RequestPathSegments {
    /// Creates a new RequestPathSegments instance by splitting a `Request` URI path.
    ///
    /// Surrounding spaces and slashes are trimmed and empty segments are skipped when generating
    /// the `RequestPathSegments` value. So, a request path of `/some/path/to//my/handler` will be split into segments:
    ///
    /// ```plain
    /// ["some", "path", "to", "my", "handler"]
    /// ```
    pub(crate) fn new(path: &str) -> Self {
        let segments = path
            .trim_matches(|c| c == ' ' || c == '/')
            .split('/')
            .filter(|s| !EXCLUDED_SEGMENTS.contains(s))
            .filter_map(PercentDecoded::new)
            .collect();

        RequestPathSegments { segments }
    }

    /// Provides the decoded segments of the request path, in order.
    pub fn segments(&self) -> &[PercentDecoded] {
        &self.segments
    }
}
