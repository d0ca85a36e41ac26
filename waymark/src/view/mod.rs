//! Defines `View`, the outcome of dispatching a request, and how each outcome is rendered into
//! a response.

mod error;
mod page;
mod restful;

use std::fmt;

use hyper::{Body, Response, StatusCode};

pub use self::page::{PageView, Renderer};
pub use self::restful::RestfulView;

use crate::extractor::BindingError;
use crate::router::RouterConfig;
use crate::state::{State, StateData};

/// The value produced by a handler, in serialized form.
pub type Model = serde_json::Value;

/// Identifies a handler in diagnostics such as the conflict page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MappingTarget {
    /// The controller type.
    pub class: &'static str,
    /// The handler name.
    pub method: String,
    /// The HTTP verb of the handler.
    pub verb: hyper::Method,
    /// The declared parameter types, in order.
    pub parameters: Vec<&'static str>,
}

impl fmt::Display for MappingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Class: {}, Method: {} {}({})",
            self.class,
            self.verb,
            self.method,
            self.parameters.join(", ")
        )
    }
}

/// The outcome of dispatching a request, rendered by the view render stage once the chain has
/// completed.
#[derive(Debug)]
pub enum View {
    /// A handler result serialized as JSON or XML.
    Restful(RestfulView),
    /// A handler result rendered through a template.
    Page(PageView),
    /// No handler accepts the request.
    NotFound,
    /// More than one handler accepts the request equally well.
    Conflict(Vec<MappingTarget>),
    /// The handler, or the creation of its controller, failed.
    InternalException(anyhow::Error),
    /// A page handler declared no template and returned no template path.
    NoViewTemplate,
    /// The template could not be rendered.
    UnknownViewTemplate(String),
    /// A parameter was rejected under strict binding.
    BadRequest(BindingError),
}

impl View {
    /// The status code of the rendered response.
    pub fn status(&self) -> StatusCode {
        match self {
            View::Restful(_) | View::Page(_) => StatusCode::OK,
            View::NotFound => StatusCode::NOT_FOUND,
            View::Conflict(_) => StatusCode::CONFLICT,
            View::InternalException(_) => StatusCode::INTERNAL_SERVER_ERROR,
            View::NoViewTemplate | View::UnknownViewTemplate(_) => StatusCode::SERVICE_UNAVAILABLE,
            View::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Renders the view into a response.
    pub(crate) fn render(
        self,
        state: &State,
        renderer: Option<&dyn Renderer>,
        config: &RouterConfig,
    ) -> Response<Body> {
        match self {
            View::Restful(view) => match view.render(state) {
                Ok(res) => res,
                Err(e) => View::InternalException(e).render(state, renderer, config),
            },
            View::Page(view) => match view.render(state, renderer) {
                Ok(res) => res,
                Err(template) => {
                    View::UnknownViewTemplate(template).render(state, renderer, config)
                }
            },
            View::NotFound => error::not_found(state),
            View::Conflict(targets) => error::conflict(state, &targets),
            View::InternalException(e) => error::internal(state, &e, config.expose_traces()),
            View::NoViewTemplate => error::no_view_template(state),
            View::UnknownViewTemplate(template) => error::unknown_view_template(state, &template),
            View::BadRequest(e) => error::bad_request(state, &e),
        }
    }
}

impl StateData for View {}
