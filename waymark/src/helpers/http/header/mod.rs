//! Headers recognised by Waymark which do not exist in the standard headers provided by the
//! Hyper library.

/// Marks the identifier of a request to a Waymark server.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Marks the execution time of a Waymark request.
pub const X_RUNTIME_DURATION: &str = "x-runtime-duration";
