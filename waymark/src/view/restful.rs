use hyper::{Body, Response, StatusCode};
use log::trace;
use mime::Mime;

use crate::helpers::http::response::create_response;
use crate::middleware::encoding::with_charset;
use crate::state::{request_id, State};
use crate::view::Model;

const XML_ROOT: &str = "result";

/// A handler result serialized directly into the response body.
///
/// The body is XML when the produced media type mentions `xml`, and JSON otherwise. A `null`
/// result is written as `{}` whatever the produced media type.
#[derive(Debug)]
pub struct RestfulView {
    produce: Mime,
    model: Model,
}

impl RestfulView {
    /// Creates a view producing `produce`.
    pub fn new(produce: Mime, model: Model) -> Self {
        RestfulView { produce, model }
    }

    /// The produced media type.
    pub fn produce(&self) -> &Mime {
        &self.produce
    }

    /// The serialized handler result.
    pub fn model(&self) -> &Model {
        &self.model
    }

    pub(super) fn render(self, state: &State) -> anyhow::Result<Response<Body>> {
        let body = if self.model.is_null() {
            "{}".to_owned()
        } else if self.produce.as_ref().contains("xml") {
            quick_xml::se::to_string_with_root(XML_ROOT, &self.model)?
        } else {
            serde_json::to_string(&self.model)?
        };

        trace!(
            "[{}] rendering {} bytes as {}",
            request_id(state),
            body.len(),
            self.produce
        );

        Ok(create_response(
            state,
            StatusCode::OK,
            with_charset(state, self.produce),
            body,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::set_request_id;
    use futures_executor::block_on;
    use hyper::body::to_bytes;
    use hyper::header::CONTENT_TYPE;
    use hyper::HeaderMap;
    use serde_json::json;

    fn render(produce: Mime, model: Model) -> (String, String) {
        let mut out = None;
        State::with_new(|state| {
            state.put(HeaderMap::new());
            set_request_id(state);
            let res = RestfulView::new(produce, model).render(state).unwrap();
            let content_type = res.headers()[CONTENT_TYPE].to_str().unwrap().to_owned();
            let body = block_on(to_bytes(res.into_body())).unwrap();
            out = Some((content_type, String::from_utf8(body.to_vec()).unwrap()));
        });
        out.unwrap()
    }

    #[test]
    fn json_by_default() {
        let (content_type, body) = render(mime::APPLICATION_JSON, json!({"a": 1}));
        assert_eq!(content_type, "application/json");
        assert_eq!(body, r#"{"a":1}"#);
    }

    #[test]
    fn null_is_an_empty_object() {
        let (_, body) = render(mime::APPLICATION_JSON, Model::Null);
        assert_eq!(body, "{}");
    }

    #[test]
    fn null_is_an_empty_object_for_xml_too() {
        let (content_type, body) = render(mime::TEXT_XML, Model::Null);
        assert_eq!(content_type, "text/xml");
        assert_eq!(body, "{}");
    }

    #[test]
    fn xml_when_produce_mentions_it() {
        let (content_type, body) = render(mime::TEXT_XML, json!({"name": "waymark"}));
        assert_eq!(content_type, "text/xml");
        assert_eq!(body, "<result><name>waymark</name></result>");
    }
}
