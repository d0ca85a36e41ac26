use std::any::Any;

use hyper::{Body, HeaderMap, Method, Uri, Version};

use crate::helpers::http::request::path::RequestPathSegments;

/// Marks a type which may be stored in `State`. At most one value of each type is held.
///
/// ```rust
/// # use waymark::state::StateData;
/// struct Tenant(String);
///
/// impl StateData for Tenant {}
/// ```
pub trait StateData: Any + Send {}

impl StateData for Body {}
impl StateData for Method {}
impl StateData for Uri {}
impl StateData for Version {}
impl StateData for HeaderMap {}

impl StateData for RequestPathSegments {}
