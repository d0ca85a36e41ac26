use hyper::{Body, Response, StatusCode};
use log::{error, trace};
use mime::Mime;

use crate::extractor::{RequestContext, ResponseHeaders};
use crate::helpers::http::response::create_response;
use crate::middleware::encoding::with_charset;
use crate::state::{request_id, FromState, State};
use crate::view::Model;

/// Renders page templates. Template engines are supplied by the application.
pub trait Renderer: Send + Sync {
    /// Renders `template` into the response body.
    ///
    /// `model` is only supplied when the handler declared its template explicitly. A handler
    /// returning the template path as text has no model.
    fn render(
        &self,
        template: &str,
        request: &RequestContext,
        response: &ResponseHeaders,
        model: Option<&Model>,
    ) -> anyhow::Result<String>;
}

impl<F> Renderer for F
where
    F: Fn(&str, &RequestContext, &ResponseHeaders, Option<&Model>) -> anyhow::Result<String>
        + Send
        + Sync,
{
    fn render(
        &self,
        template: &str,
        request: &RequestContext,
        response: &ResponseHeaders,
        model: Option<&Model>,
    ) -> anyhow::Result<String> {
        self(template, request, response, model)
    }
}

/// A handler result rendered through a template.
#[derive(Debug)]
pub struct PageView {
    produce: Mime,
    template: String,
    model: Option<Model>,
}

impl PageView {
    /// Creates a view rendering `template`, passing `model` to the renderer if supplied.
    pub fn new(produce: Mime, template: String, model: Option<Model>) -> Self {
        PageView {
            produce,
            template,
            model,
        }
    }

    /// The template to render.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The model passed to the renderer.
    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// Renders the page. On failure the template name is returned so that the caller can
    /// report it.
    pub(super) fn render(
        self,
        state: &State,
        renderer: Option<&dyn Renderer>,
    ) -> Result<Response<Body>, String> {
        let renderer = match renderer {
            Some(renderer) => renderer,
            None => {
                error!(
                    "[{}] no renderer is configured for template `{}`",
                    request_id(state),
                    self.template
                );
                return Err(self.template);
            }
        };

        let request = RequestContext::from_state(state);
        let response = ResponseHeaders::try_borrow_from(state)
            .cloned()
            .unwrap_or_default();

        match renderer.render(&self.template, &request, &response, self.model.as_ref()) {
            Ok(body) => {
                trace!("[{}] rendered template `{}`", request_id(state), self.template);
                Ok(create_response(
                    state,
                    StatusCode::OK,
                    with_charset(state, self.produce),
                    body,
                ))
            }
            Err(e) => {
                error!(
                    "[{}] template `{}` cannot be rendered: {:#}",
                    request_id(state),
                    self.template,
                    e
                );
                Err(self.template)
            }
        }
    }
}
