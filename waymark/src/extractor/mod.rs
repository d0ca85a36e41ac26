//! Binds request data into the typed arguments of a handler.
//!
//! Every declared `ParameterSpec` is resolved, in declaration order, from its source and then
//! converted into the declared type through the `ConverterRegistry`. By default binding is
//! lenient: a value that is missing or cannot be converted is bound as `None`. A router built
//! with strict binding rejects such requests instead.

pub mod body;
mod system;

use std::any::{Any, TypeId};
use std::fmt;

use cookie::{Cookie, CookieJar};
use hyper::header::{HeaderValue, CONTENT_TYPE, COOKIE};
use hyper::{HeaderMap, Uri};
use log::trace;
use mime::Mime;

pub use self::body::{FormFields, MultipartForm, RequestBody, UploadedFile};
pub use self::system::{
    MemorySession, RequestContext, ResponseHeaders, Session, SessionHandle, SessionValue,
};

use crate::convert::ConverterRegistry;
use crate::extractor::body::BodyFormat;
use crate::helpers::http::request::query_string::{self, QueryStringMapping};
use crate::router::mapping::{ParameterSource, ParameterSpec};
use crate::router::tree::segment::SegmentMapping;
use crate::state::{request_id, FromState, State};

/// The bound arguments of one handler call, indexed in declaration order.
///
/// ```rust
/// # use waymark::extractor::Arguments;
/// let mut args = Arguments::from_values(vec![Some(Box::new(7i32)), None]);
///
/// assert_eq!(args.get::<i32>(0), Some(&7));
/// assert_eq!(args.take::<i32>(0), Some(7));
/// assert_eq!(args.take::<i32>(0), None);
/// assert!(!args.is_present(1));
/// ```
#[derive(Default)]
pub struct Arguments {
    values: Vec<Option<Box<dyn Any + Send>>>,
}

impl Arguments {
    /// Creates arguments from already bound values.
    pub fn from_values(values: Vec<Option<Box<dyn Any + Send>>>) -> Self {
        Arguments { values }
    }

    /// The number of declared arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no arguments were declared.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the argument at `index` was bound.
    pub fn is_present(&self, index: usize) -> bool {
        matches!(self.values.get(index), Some(Some(_)))
    }

    /// Borrows the argument at `index` as `T`.
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.values
            .get(index)
            .and_then(Option::as_ref)
            .and_then(|v| v.downcast_ref::<T>())
    }

    /// Moves the argument at `index` out as `T`. The argument is left unbound when it has a
    /// different type.
    pub fn take<T: Any>(&mut self, index: usize) -> Option<T> {
        let slot = self.values.get_mut(index)?;
        match slot.take()?.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(other) => {
                *slot = Some(other);
                None
            }
        }
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.values.iter().map(Option::is_some))
            .finish()
    }
}

/// Why a request was rejected under strict binding.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    /// A required parameter had no value.
    #[error("missing required parameter `{0}`")]
    Missing(String),

    /// A value was present but could not be converted into the declared type.
    #[error("parameter `{name}` could not be converted into {target}")]
    Unconvertible {
        /// The parameter name.
        name: String,
        /// The declared type.
        target: &'static str,
    },
}

impl BindingError {
    /// The parameter which failed to bind.
    pub fn parameter(&self) -> &str {
        match self {
            BindingError::Missing(name) => name,
            BindingError::Unconvertible { name, .. } => name,
        }
    }
}

/// Parses the request cookies held in `state`.
pub fn cookies(state: &State) -> CookieJar {
    HeaderMap::try_borrow_from(state)
        .map(|headers| {
            headers
                .get_all(COOKIE)
                .iter()
                .flat_map(HeaderValue::to_str)
                .flat_map(|cs| cs.split(';'))
                .flat_map(|cs| Cookie::parse(cs.trim().to_owned()))
                .fold(CookieJar::new(), |mut jar, cookie| {
                    jar.add_original(cookie);
                    jar
                })
        })
        .unwrap_or_default()
}

/// Parses the `Content-Type` header held in `state`.
pub fn content_type(state: &State) -> Option<Mime> {
    HeaderMap::try_borrow_from(state)
        .and_then(|headers| headers.get(CONTENT_TYPE))
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

enum Raw {
    Text(String),
    Value(SessionValue),
}

/// Resolves parameter values for one request.
pub(crate) struct Binder<'a> {
    state: &'a State,
    variables: &'a SegmentMapping,
    converters: &'a ConverterRegistry,
    strict: bool,
    query: QueryStringMapping,
    cookies: Option<CookieJar>,
}

impl<'a> Binder<'a> {
    pub(crate) fn new(
        state: &'a State,
        variables: &'a SegmentMapping,
        converters: &'a ConverterRegistry,
        strict: bool,
    ) -> Self {
        let query = query_string::split(Uri::try_borrow_from(state).and_then(Uri::query));
        Binder {
            state,
            variables,
            converters,
            strict,
            query,
            cookies: None,
        }
    }

    /// Binds every parameter in declaration order.
    pub(crate) fn bind_all(&mut self, specs: &[ParameterSpec]) -> Result<Arguments, BindingError> {
        let mut values = Vec::with_capacity(specs.len());
        for spec in specs {
            let value = self.bind(spec)?;
            trace!(
                "[{}] bound parameter `{}` as {}: {}",
                request_id(self.state),
                spec.name(),
                spec.declared_type().name(),
                if value.is_some() { "present" } else { "absent" }
            );
            values.push(value);
        }
        Ok(Arguments::from_values(values))
    }

    fn bind(&mut self, spec: &ParameterSpec) -> Result<Option<Box<dyn Any + Send>>, BindingError> {
        let value = if spec.source() == ParameterSource::System {
            self.system(spec)
        } else if let Some(decoder) = spec.body_decoder() {
            self.body(spec, decoder)?
        } else if let Some(file) = self.uploaded_file(spec) {
            Some(file)
        } else {
            let raw = self
                .raw(spec)
                .or_else(|| spec.default_value_str().map(|v| Raw::Text(v.to_owned())));

            match raw {
                Some(raw) => self.convert(spec, raw)?,
                None => None,
            }
        };

        match value {
            None if self.strict && spec.is_required() => {
                Err(BindingError::Missing(spec.name().to_owned()))
            }
            value => Ok(value),
        }
    }

    fn raw(&mut self, spec: &ParameterSpec) -> Option<Raw> {
        let name = spec.name();
        let text = match spec.source() {
            ParameterSource::Path => self.variables.get(name).cloned(),
            ParameterSource::Header => HeaderMap::try_borrow_from(self.state)
                .and_then(|headers| headers.get(name))
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
            ParameterSource::Cookie => {
                let state = self.state;
                self.cookies
                    .get_or_insert_with(|| cookies(state))
                    .get(name)
                    .map(|c| c.value().to_owned())
            }
            ParameterSource::Session => {
                return SessionHandle::try_borrow_from(self.state)
                    .and_then(|session| session.attribute(name))
                    .map(Raw::Value)
            }
            ParameterSource::Parameter if spec.is_multipart() => {
                MultipartForm::try_borrow_from(self.state)
                    .and_then(|form| form.field(name))
                    .map(str::to_owned)
            }
            ParameterSource::Parameter => self.parameter(name),
            ParameterSource::System => None,
        };
        text.map(Raw::Text)
    }

    fn parameter(&self, name: &str) -> Option<String> {
        query_string::first(&self.query, name)
            .or_else(|| FormFields::try_borrow_from(self.state).and_then(|f| f.first(name)))
            .or_else(|| MultipartForm::try_borrow_from(self.state).and_then(|f| f.field(name)))
            .map(str::to_owned)
    }

    fn convert(
        &self,
        spec: &ParameterSpec,
        raw: Raw,
    ) -> Result<Option<Box<dyn Any + Send>>, BindingError> {
        let declared = spec.declared_type();
        let hint = spec.converter_hint();

        let converted = match &raw {
            Raw::Text(text) => self.convert_value(text, declared.id(), hint, |v| {
                declared.clone_from(v)
            }),
            Raw::Value(value) => {
                let value: &dyn Any = &**value;
                self.convert_value(value, declared.id(), hint, |v| declared.clone_from(v))
            }
        };

        match converted {
            Some(value) => Ok(Some(value)),
            None if self.strict => Err(BindingError::Unconvertible {
                name: spec.name().to_owned(),
                target: declared.name(),
            }),
            None => {
                trace!(
                    "[{}] parameter `{}` could not be converted into {}",
                    request_id(self.state),
                    spec.name(),
                    declared.name()
                );
                Ok(None)
            }
        }
    }

    fn convert_value<F>(
        &self,
        value: &dyn Any,
        target: TypeId,
        hint: Option<&str>,
        same_type: F,
    ) -> Option<Box<dyn Any + Send>>
    where
        F: Fn(&dyn Any) -> Option<Box<dyn Any + Send>>,
    {
        if hint.is_none() {
            if let Some(value) = same_type(value) {
                return Some(value);
            }
        }
        self.converters.convert_any(value, target, hint)
    }

    fn body(
        &self,
        spec: &ParameterSpec,
        decoder: body::BodyDecoder,
    ) -> Result<Option<Box<dyn Any + Send>>, BindingError> {
        let body = match RequestBody::try_borrow_from(self.state) {
            Some(body) if !body.0.is_empty() => body,
            _ => return Ok(None),
        };

        let format = BodyFormat::from_content_type(content_type(self.state).as_ref());
        match decoder(&body.0, format) {
            Ok(value) => Ok(Some(value)),
            Err(e) if self.strict => {
                trace!("[{}] body rejected: {}", request_id(self.state), e);
                Err(BindingError::Unconvertible {
                    name: spec.name().to_owned(),
                    target: spec.declared_type().name(),
                })
            }
            Err(e) => {
                trace!("[{}] body ignored: {}", request_id(self.state), e);
                Ok(None)
            }
        }
    }

    fn uploaded_file(&self, spec: &ParameterSpec) -> Option<Box<dyn Any + Send>> {
        if !spec.is_multipart() || spec.declared_type().id() != TypeId::of::<UploadedFile>() {
            return None;
        }
        MultipartForm::try_borrow_from(self.state)
            .and_then(|form| form.file(spec.name()))
            .map(|file| Box::new(file.clone()) as Box<dyn Any + Send>)
    }

    fn system(&self, spec: &ParameterSpec) -> Option<Box<dyn Any + Send>> {
        let id = spec.declared_type().id();
        if id == TypeId::of::<RequestContext>() {
            Some(Box::new(RequestContext::from_state(self.state)))
        } else if id == TypeId::of::<ResponseHeaders>() {
            ResponseHeaders::try_borrow_from(self.state)
                .cloned()
                .map(|h| Box::new(h) as Box<dyn Any + Send>)
        } else if id == TypeId::of::<SessionHandle>() {
            SessionHandle::try_borrow_from(self.state)
                .cloned()
                .map(|s| Box::new(s) as Box<dyn Any + Send>)
        } else {
            trace!(
                "[{}] {} is not a system type",
                request_id(self.state),
                spec.declared_type().name()
            );
            None
        }
    }
}
