//! Helpers for HTTP request handling

pub mod path;
pub mod query_string;
