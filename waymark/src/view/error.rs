//! HTML pages for the error outcomes of dispatch.

use hyper::{Body, Response, StatusCode, Uri};
use log::error;

use crate::extractor::BindingError;
use crate::helpers::http::response::create_response;
use crate::middleware::encoding::with_charset;
use crate::state::{request_id, FromState, State};
use crate::view::MappingTarget;

fn page(state: &State, status: StatusCode, content: &str) -> Response<Body> {
    let reason = status.canonical_reason().unwrap_or("Error");
    let body = format!(
        "<!DOCTYPE HTML PUBLIC \"-//IETF//DTD HTML 2.0//EN\">\n\
         <html><head>\n\
         <title>{code} {reason}</title>\n\
         </head><body>\n\
         <h1>{reason}</h1>\n\
         {content}\n\
         </body></html>\n",
        code = status.as_u16(),
        reason = reason,
        content = content,
    );
    create_response(state, status, with_charset(state, mime::TEXT_HTML), body)
}

fn requested_path(state: &State) -> String {
    escape(Uri::try_borrow_from(state).map(Uri::path).unwrap_or("/"))
}

pub(super) fn not_found(state: &State) -> Response<Body> {
    page(
        state,
        StatusCode::NOT_FOUND,
        &format!(
            "<p>The requested URL {} was not found on this server.</p>",
            requested_path(state)
        ),
    )
}

pub(super) fn conflict(state: &State, targets: &[MappingTarget]) -> Response<Body> {
    let items: String = targets
        .iter()
        .map(|t| format!("<li>{}</li>", escape(&t.to_string())))
        .collect();

    page(
        state,
        StatusCode::CONFLICT,
        &format!(
            "<p>The requested URL {} is mapped to more than one handler:</p>\n<ul>{}</ul>",
            requested_path(state),
            items
        ),
    )
}

pub(super) fn internal(state: &State, e: &anyhow::Error, expose_traces: bool) -> Response<Body> {
    error!("[{}] handler failed: {:?}", request_id(state), e);

    let detail = if expose_traces {
        format!("\n<pre>{}</pre>", escape(&format!("{:?}", e)))
    } else {
        String::new()
    };

    page(
        state,
        StatusCode::INTERNAL_SERVER_ERROR,
        &format!(
            "<p>The server failed to handle {}.</p>{}",
            requested_path(state),
            detail
        ),
    )
}

pub(super) fn no_view_template(state: &State) -> Response<Body> {
    page(
        state,
        StatusCode::SERVICE_UNAVAILABLE,
        &format!(
            "<p>No view template is declared for {}.</p>",
            requested_path(state)
        ),
    )
}

pub(super) fn unknown_view_template(state: &State, template: &str) -> Response<Body> {
    page(
        state,
        StatusCode::SERVICE_UNAVAILABLE,
        &format!(
            "<p>The view template {} cannot be parsed.</p>",
            escape(template)
        ),
    )
}

pub(super) fn bad_request(state: &State, e: &BindingError) -> Response<Body> {
    page(
        state,
        StatusCode::BAD_REQUEST,
        &format!("<p>{}.</p>", escape(&e.to_string())),
    )
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
