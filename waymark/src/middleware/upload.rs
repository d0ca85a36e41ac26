//! Buffers the request body, and parses form and multipart bodies ahead of parameter binding.

use std::convert::Infallible;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::future::FutureExt;
use futures_util::stream;
use hyper::{Body, StatusCode};
use log::{debug, trace, warn};

use crate::extractor::{content_type, FormFields, MultipartForm, RequestBody, UploadedFile};
use crate::handler::{HandlerError, HandlerFuture};
use crate::middleware::Middleware;
use crate::pipeline::Next;
use crate::state::{request_id, State};

/// Reads the whole request body into `RequestBody`.
///
/// An `application/x-www-form-urlencoded` body is also parsed into `FormFields`, and a
/// `multipart/form-data` body into `MultipartForm`. A multipart body that cannot be parsed is
/// logged and left unparsed.
#[derive(Clone, Copy, Debug, Default)]
pub struct Upload;

impl Middleware for Upload {
    fn name(&self) -> &'static str {
        "upload"
    }

    fn call(&self, mut state: State, chain: Next) -> Pin<Box<HandlerFuture>> {
        async move {
            let body = state.try_take::<Body>().unwrap_or_else(Body::empty);
            let bytes = match hyper::body::to_bytes(body).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    let err: HandlerError = e.into();
                    return Err((state, err.with_status(StatusCode::BAD_REQUEST)));
                }
            };

            trace!("[{}] buffered {} byte body", request_id(&state), bytes.len());

            match content_type(&state) {
                Some(ref mime) if mime.essence_str() == "application/x-www-form-urlencoded" => {
                    state.put(FormFields::parse(&bytes));
                }
                Some(ref mime) if mime.essence_str() == "multipart/form-data" => {
                    match parse_multipart(mime.as_ref(), bytes.clone()).await {
                        Ok(form) => {
                            debug!(
                                "[{}] parsed multipart body with {} field(s) and {} file(s)",
                                request_id(&state),
                                form.fields.len(),
                                form.files.len()
                            );
                            state.put(form);
                        }
                        Err(e) => warn!(
                            "[{}] unable to parse multipart body: {}",
                            request_id(&state),
                            e
                        ),
                    }
                }
                _ => {}
            }

            state.put(RequestBody(bytes));
            chain.run(state).await
        }
        .boxed()
    }
}

async fn parse_multipart(content_type: &str, body: Bytes) -> multer::Result<MultipartForm> {
    let boundary = multer::parse_boundary(content_type)?;
    let mut multipart = multer::Multipart::new(
        stream::once(async move { Ok::<Bytes, Infallible>(body) }),
        boundary,
    );

    let mut form = MultipartForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        match field.file_name().map(str::to_owned) {
            Some(file_name) => {
                let content_type = field.content_type().cloned();
                let data = field.bytes().await?;
                form.files
                    .entry(name.clone())
                    .or_insert_with(Vec::new)
                    .push(UploadedFile::new(name, Some(file_name), content_type, data));
            }
            None => {
                let text = field.text().await?;
                form.fields.entry(name).or_insert_with(Vec::new).push(text);
            }
        }
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{new_pipeline, test_endpoint};
    use crate::state::set_request_id;
    use futures_executor::block_on;
    use hyper::header::{HeaderValue, CONTENT_TYPE};
    use hyper::HeaderMap;

    fn upload(content_type: &'static str, body: &'static str) -> State {
        let mut state = State::new();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        state.put(headers);
        state.put(Body::from(body));
        set_request_id(&mut state);

        let pipeline = new_pipeline().add(Upload).build();
        let result = block_on(pipeline.call(state, test_endpoint(StatusCode::OK)));
        let (state, _) = result.unwrap_or_else(|_| panic!("chain failed"));
        state
    }

    #[test]
    fn buffers_json_bodies() {
        let state = upload("application/json", r#"{"a":1}"#);
        assert_eq!(&state.borrow::<RequestBody>().0[..], br#"{"a":1}"#);
        assert!(!state.has::<FormFields>());
    }

    #[test]
    fn parses_form_bodies() {
        let state = upload("application/x-www-form-urlencoded", "name=waymark&n=1");
        let fields = state.borrow::<FormFields>();
        assert_eq!(fields.first("name"), Some("waymark"));
        assert_eq!(fields.first("n"), Some("1"));
    }

    #[test]
    fn parses_multipart_bodies() {
        let body = "--XyZ\r\n\
                    Content-Disposition: form-data; name=\"title\"\r\n\r\n\
                    report\r\n\
                    --XyZ\r\n\
                    Content-Disposition: form-data; name=\"doc\"; filename=\"a.txt\"\r\n\
                    Content-Type: text/plain\r\n\r\n\
                    contents\r\n\
                    --XyZ--\r\n";
        let state = upload("multipart/form-data; boundary=XyZ", body);
        let form = state.borrow::<MultipartForm>();
        assert_eq!(form.field("title"), Some("report"));

        let file = form.file("doc").unwrap();
        assert_eq!(file.file_name(), Some("a.txt"));
        assert_eq!(file.content_type(), Some(&mime::TEXT_PLAIN));
        assert_eq!(&file.data()[..], b"contents");
    }

    #[test]
    fn malformed_multipart_is_left_unparsed() {
        let state = upload("multipart/form-data", "garbage");
        assert!(!state.has::<MultipartForm>());
        assert_eq!(&state.borrow::<RequestBody>().0[..], b"garbage");
    }
}
