//! Contains helpers for applications to use during testing.
//!
//! See the `TestServer` type for example usage.

use std::convert::TryFrom;
use std::fmt;
use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use futures_util::future::BoxFuture;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::service::Service;
use hyper::{body, http, Body, Method, Request, Response, Uri};
use log::trace;
use tokio::runtime::Runtime;

use crate::extractor::SessionHandle;
use crate::handler::NewHandler;
use crate::middleware::ErrorDispatch;
use crate::service::WaymarkService;

type Dispatch = dyn Fn(Request<Body>) -> BoxFuture<'static, anyhow::Result<Response<Body>>>
    + Send
    + Sync;

/// An in memory server for testing purposes. Requests are handed to the service layer
/// directly, without opening any sockets, and run on a private runtime.
///
/// # Examples
///
/// ```rust
/// # use waymark::helpers::http::response::create_response;
/// # use waymark::hyper::{Body, Response, StatusCode};
/// # use waymark::state::State;
/// #
/// # fn my_handler(state: State) -> (State, Response<Body>) {
/// #   let body = "This is the body content.".to_string();
/// #   let response = create_response(&state,
/// #                                  StatusCode::OK,
/// #                                  waymark::mime::TEXT_PLAIN,
/// #                                  body);
/// #
/// #   (state, response)
/// # }
/// #
/// # fn main() {
/// use waymark::test::TestServer;
///
/// let test_server = TestServer::new(|| Ok(my_handler)).unwrap();
///
/// let response = test_server
///     .client()
///     .get("http://localhost/")
///     .perform()
///     .unwrap();
/// assert_eq!(response.status(), StatusCode::OK);
/// let body = response.read_body().unwrap();
/// assert_eq!(&body[..], b"This is the body content.");
/// # }
/// ```
#[derive(Clone)]
pub struct TestServer {
    data: Arc<TestServerData>,
}

struct TestServerData {
    runtime: Runtime,
    dispatch: Box<Dispatch>,
    timeout: Duration,
}

impl TestServer {
    /// Creates a `TestServer` serving `new_handler`, with requests timing out after ten seconds.
    pub fn new<NH: NewHandler + 'static>(new_handler: NH) -> anyhow::Result<TestServer> {
        TestServer::with_timeout(new_handler, 10)
    }

    /// Creates a `TestServer` whose requests time out after `timeout` seconds.
    pub fn with_timeout<NH: NewHandler + 'static>(
        new_handler: NH,
        timeout: u64,
    ) -> anyhow::Result<TestServer> {
        let runtime = Runtime::new()?;
        let service = WaymarkService::new(new_handler);
        let client_addr: SocketAddr = "127.0.0.1:10000".parse()?;

        let dispatch = move |req: Request<Body>| service.connect(client_addr).call(req);

        Ok(TestServer {
            data: Arc::new(TestServerData {
                runtime,
                dispatch: Box::new(dispatch),
                timeout: Duration::from_secs(timeout),
            }),
        })
    }

    /// Returns a client for issuing requests to this server.
    pub fn client(&self) -> TestClient {
        TestClient {
            server: self.clone(),
        }
    }

    fn perform(&self, req: Request<Body>) -> anyhow::Result<Response<Body>> {
        trace!(" performing {} {}", req.method(), req.uri());
        let future = (self.data.dispatch)(req);
        self.data.runtime.block_on(async {
            match tokio::time::timeout(self.data.timeout, future).await {
                Ok(response) => response,
                Err(_) => Err(anyhow!("timed out")),
            }
        })
    }

    fn read_body(&self, response: Response<Body>) -> anyhow::Result<Vec<u8>> {
        let bytes = self
            .data
            .runtime
            .block_on(body::to_bytes(response.into_body()))?;
        Ok(bytes.to_vec())
    }
}

/// Client interface for issuing requests to a `TestServer`.
pub struct TestClient {
    server: TestServer,
}

impl TestClient {
    /// Begin constructing a HEAD request using this `TestClient`.
    pub fn head<U>(&self, uri: U) -> TestRequest<'_>
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request(Method::HEAD, uri)
    }

    /// Begin constructing a GET request using this `TestClient`.
    pub fn get<U>(&self, uri: U) -> TestRequest<'_>
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request(Method::GET, uri)
    }

    /// Begin constructing an OPTIONS request using this `TestClient`.
    pub fn options<U>(&self, uri: U) -> TestRequest<'_>
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request(Method::OPTIONS, uri)
    }

    /// Begin constructing a POST request using this `TestClient`.
    pub fn post<B, U>(&self, uri: U, body: B, mime: mime::Mime) -> TestRequest<'_>
    where
        B: Into<Body>,
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request_with_body(Method::POST, uri, body, mime)
    }

    /// Begin constructing a PUT request using this `TestClient`.
    pub fn put<B, U>(&self, uri: U, body: B, mime: mime::Mime) -> TestRequest<'_>
    where
        B: Into<Body>,
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request_with_body(Method::PUT, uri, body, mime)
    }

    /// Begin constructing a PATCH request using this `TestClient`.
    pub fn patch<B, U>(&self, uri: U, body: B, mime: mime::Mime) -> TestRequest<'_>
    where
        B: Into<Body>,
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request_with_body(Method::PATCH, uri, body, mime)
    }

    /// Begin constructing a DELETE request using this `TestClient`.
    pub fn delete<U>(&self, uri: U) -> TestRequest<'_>
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request(Method::DELETE, uri)
    }

    /// Begin constructing a request with the given HTTP method and URI.
    pub fn build_request<U>(&self, method: Method, uri: U) -> TestRequest<'_>
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        TestRequest {
            client: self,
            request: Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .map_err(anyhow::Error::from),
        }
    }

    /// Begin constructing a request with the given HTTP method, URI and body.
    pub fn build_request_with_body<B, U>(
        &self,
        method: Method,
        uri: U,
        body: B,
        mime: mime::Mime,
    ) -> TestRequest<'_>
    where
        B: Into<Body>,
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request(method, uri)
            .with_header(CONTENT_TYPE, mime.as_ref())
            .with_body(body)
    }

    /// Send a constructed request using this `TestClient`, and await the response.
    pub fn perform(&self, req: TestRequest<'_>) -> anyhow::Result<TestResponse> {
        let response = self.server.perform(req.request?)?;
        Ok(TestResponse {
            response,
            server: self.server.clone(),
        })
    }
}

/// A request under construction by a `TestClient`.
#[must_use]
pub struct TestRequest<'a> {
    client: &'a TestClient,
    request: anyhow::Result<Request<Body>>,
}

impl<'a> TestRequest<'a> {
    /// Adds a header to the request. An invalid value fails the request when performed.
    pub fn with_header<V>(mut self, name: HeaderName, value: V) -> Self
    where
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.request = self.request.and_then(|mut req| {
            let value = HeaderValue::try_from(value).map_err(|e| {
                let e: http::Error = e.into();
                anyhow::Error::from(e)
            })?;
            req.headers_mut().append(name, value);
            Ok(req)
        });
        self
    }

    /// Replaces the request body.
    pub fn with_body<B: Into<Body>>(mut self, body: B) -> Self {
        if let Ok(req) = self.request.as_mut() {
            *req.body_mut() = body.into();
        }
        self
    }

    /// Attaches a session, as an outer session layer would.
    pub fn with_session(self, session: SessionHandle) -> Self {
        self.with_extension(session)
    }

    /// Flags the request as an error dispatch.
    pub fn as_error_dispatch(self) -> Self {
        self.with_extension(ErrorDispatch)
    }

    fn with_extension<T: Send + Sync + 'static>(mut self, extension: T) -> Self {
        if let Ok(req) = self.request.as_mut() {
            req.extensions_mut().insert(extension);
        }
        self
    }

    /// Send the constructed request, and await the response.
    pub fn perform(self) -> anyhow::Result<TestResponse> {
        self.client.perform(self)
    }
}

/// Wrapping struct for the `Response` returned by a `TestClient`. Provides access to the
/// `Response` value via the `Deref` and `Into` traits, and also provides a function for
/// awaiting a completed response body.
pub struct TestResponse {
    response: Response<Body>,
    server: TestServer,
}

impl Deref for TestResponse {
    type Target = Response<Body>;

    fn deref(&self) -> &Response<Body> {
        &self.response
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TestResponse({})", self.response.status())
    }
}

impl From<TestResponse> for Response<Body> {
    fn from(response: TestResponse) -> Response<Body> {
        response.response
    }
}

impl TestResponse {
    /// Awaits the body of the underlying `Response`, and returns it.
    pub fn read_body(self) -> anyhow::Result<Vec<u8>> {
        self.server.read_body(self.response)
    }

    /// Awaits the UTF-8 encoded body of the underlying `Response`, and returns the `String`.
    pub fn read_utf8_body(self) -> anyhow::Result<String> {
        let buf = self.read_body()?;
        let s = String::from_utf8(buf)?;
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures_util::future::FutureExt;
    use hyper::StatusCode;

    use crate::extractor::MemorySession;
    use crate::helpers::http::response::create_response;
    use crate::state::{FromState, State};

    fn echo_headers(state: State) -> (State, Response<Body>) {
        let method = Method::borrow_from(&state).to_string();
        let session = SessionHandle::try_borrow_from(&state)
            .map(|s| s.id().to_owned())
            .unwrap_or_default();
        let body = format!("{} {}", method, session);
        let res = create_response(&state, StatusCode::OK, mime::TEXT_PLAIN, body);
        (state, res)
    }

    #[test]
    fn serves_requests_in_memory() {
        let server = TestServer::new(|| Ok(echo_headers)).unwrap();
        let response = server
            .client()
            .get("http://localhost/")
            .with_session(SessionHandle::new(MemorySession::new("abc")))
            .perform()
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.read_utf8_body().unwrap(), "GET abc");
    }

    #[test]
    fn invalid_uri_fails_the_request() {
        let server = TestServer::new(|| Ok(echo_headers)).unwrap();
        assert!(server.client().get("not a uri").perform().is_err());
    }

    #[test]
    fn times_out() {
        fn never(_state: State) -> std::pin::Pin<Box<crate::handler::HandlerFuture>> {
            futures_util::future::pending().boxed()
        }

        let server = TestServer::with_timeout(|| Ok(never), 1).unwrap();
        let err = server.client().get("http://localhost/").perform().unwrap_err();
        assert_eq!(err.to_string(), "timed out");
    }
}
