//! Records the charsets used to read the request and to write the response.
//!
//! Charset names are case-insensitive and are recorded in lower case, the form `mime` gives them
//! when parsing a content type.

use std::pin::Pin;

use log::trace;
use mime::Mime;

use crate::extractor::content_type;
use crate::handler::HandlerFuture;
use crate::middleware::Middleware;
use crate::pipeline::Next;
use crate::state::{request_id, State, StateData};

/// The charset of the request body, from the `Content-Type` header or the router default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestCharset(pub String);

impl StateData for RequestCharset {}

/// The charset appended to textual response content types that carry none.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseCharset(pub String);

impl StateData for ResponseCharset {}

/// Puts `RequestCharset` and `ResponseCharset` into `State`.
pub struct Encoding {
    charset: String,
}

impl Encoding {
    /// Creates the stage with the default charset, used when the request declares none and for
    /// every response.
    pub fn new(charset: &str) -> Self {
        Encoding {
            charset: charset.to_ascii_lowercase(),
        }
    }
}

impl Middleware for Encoding {
    fn name(&self) -> &'static str {
        "encoding"
    }

    fn call(&self, mut state: State, chain: Next) -> Pin<Box<HandlerFuture>> {
        let request_charset = content_type(&state)
            .and_then(|mime| {
                mime.get_param(mime::CHARSET)
                    .map(|c| c.as_str().to_ascii_lowercase())
            })
            .unwrap_or_else(|| self.charset.clone());

        trace!(
            "[{}] request charset {}, response charset {}",
            request_id(&state),
            request_charset,
            self.charset
        );

        state.put(RequestCharset(request_charset));
        state.put(ResponseCharset(self.charset.clone()));
        chain.run(state)
    }
}

/// Appends the response charset to `mime` when it is textual and declares no charset of its own.
/// Without a `ResponseCharset` in `State`, `mime` is returned unchanged.
pub(crate) fn with_charset(state: &State, mime: Mime) -> Mime {
    let charset = match state.try_borrow::<ResponseCharset>() {
        Some(charset) => charset,
        None => return mime,
    };

    if mime.get_param(mime::CHARSET).is_some() || !is_textual(&mime) {
        return mime;
    }

    format!("{}; charset={}", mime, charset.0)
        .parse()
        .unwrap_or(mime)
}

fn is_textual(mime: &Mime) -> bool {
    mime.type_() == mime::TEXT
        || mime.subtype() == mime::JSON
        || mime.subtype() == mime::XML
        || mime.suffix() == Some(mime::JSON)
        || mime.suffix() == Some(mime::XML)
}
