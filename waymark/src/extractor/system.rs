//! Request scoped system objects which handlers can declare as parameters.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, Uri, Version};

use crate::state::{client_addr, request_id, FromState, State, StateData};

/// A read-only view of the request being dispatched.
#[derive(Clone, Debug)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    client_addr: Option<SocketAddr>,
    request_id: String,
}

impl RequestContext {
    /// Captures the request parts held in `state`.
    pub fn from_state(state: &State) -> Self {
        RequestContext {
            method: Method::try_borrow_from(state).cloned().unwrap_or_default(),
            uri: Uri::try_borrow_from(state).cloned().unwrap_or_default(),
            version: Version::try_borrow_from(state).cloned().unwrap_or_default(),
            headers: HeaderMap::try_borrow_from(state).cloned().unwrap_or_default(),
            client_addr: client_addr(state),
            request_id: request_id(state).to_owned(),
        }
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The HTTP version of the request.
    pub fn version(&self) -> Version {
        self.version
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The remote address of the client, when the transport reports one.
    pub fn client_addr(&self) -> Option<SocketAddr> {
        self.client_addr
    }

    /// The unique id of the request.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

/// Headers to be added to the response, shared between the handler and the view.
///
/// Headers set here are merged into the rendered response, replacing any header of the same
/// name which the view produced.
#[derive(Clone, Default)]
pub struct ResponseHeaders {
    headers: Arc<Mutex<HeaderMap>>,
}

impl ResponseHeaders {
    /// Creates an empty set of response headers.
    pub fn new() -> Self {
        ResponseHeaders::default()
    }

    /// Sets a response header, replacing previous values.
    pub fn insert(&self, name: HeaderName, value: HeaderValue) {
        self.lock().insert(name, value);
    }

    /// Adds a response header, keeping previous values.
    pub fn append(&self, name: HeaderName, value: HeaderValue) {
        self.lock().append(name, value);
    }

    /// Returns a copy of the headers set so far.
    pub fn snapshot(&self) -> HeaderMap {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HeaderMap> {
        self.headers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ResponseHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResponseHeaders")
            .field(&self.snapshot())
            .finish()
    }
}

/// A value stored in a session.
pub type SessionValue = Arc<dyn Any + Send + Sync>;

/// Access to the session of the current request. Session storage lives outside the router.
pub trait Session: Send + Sync {
    /// The session identifier.
    fn id(&self) -> &str;

    /// Reads an attribute.
    fn attribute(&self, name: &str) -> Option<SessionValue>;

    /// Writes an attribute.
    fn set_attribute(&self, name: &str, value: SessionValue);

    /// Removes an attribute.
    fn remove_attribute(&self, name: &str);
}

/// A shared handle to the `Session` of the current request.
///
/// Layers in front of the router attach a handle by inserting it into the request extensions.
#[derive(Clone)]
pub struct SessionHandle(Arc<dyn Session>);

impl SessionHandle {
    /// Wraps a session.
    pub fn new<S>(session: S) -> Self
    where
        S: Session + 'static,
    {
        SessionHandle(Arc::new(session))
    }

    /// Reads an attribute as `T`.
    pub fn get<T: Any + Clone>(&self, name: &str) -> Option<T> {
        self.0
            .attribute(name)
            .and_then(|value| value.downcast_ref::<T>().cloned())
    }
}

impl std::ops::Deref for SessionHandle {
    type Target = dyn Session;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionHandle").field(&self.0.id()).finish()
    }
}

impl StateData for ResponseHeaders {}
impl StateData for SessionHandle {}

/// A `Session` kept in memory, suitable for tests and single process deployments.
#[derive(Default)]
pub struct MemorySession {
    id: String,
    attributes: Mutex<HashMap<String, SessionValue>>,
}

impl MemorySession {
    /// Creates an empty session with the given id.
    pub fn new(id: &str) -> Self {
        MemorySession {
            id: id.to_owned(),
            attributes: Mutex::new(HashMap::new()),
        }
    }

    /// Adds an attribute while building the session.
    pub fn with<T: Any + Send + Sync>(self, name: &str, value: T) -> Self {
        self.set_attribute(name, Arc::new(value));
        self
    }

    fn attributes(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionValue>> {
        self.attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Session for MemorySession {
    fn id(&self) -> &str {
        &self.id
    }

    fn attribute(&self, name: &str) -> Option<SessionValue> {
        self.attributes().get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: SessionValue) {
        self.attributes().insert(name.to_owned(), value);
    }

    fn remove_attribute(&self, name: &str) {
        self.attributes().remove(name);
    }
}
