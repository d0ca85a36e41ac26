//! A collection of useful traits and functions that should always be imported.

pub use crate::extractor::{Arguments, RequestContext, ResponseHeaders, SessionHandle};
pub use crate::handler::{IntoHandlerFuture, IntoResponse};
pub use crate::router::builder::{build_router, build_simple_router};
pub use crate::router::mapping::parameter;
pub use crate::router::RouterConfig;
pub use crate::state::FromState;
