//! Defines `ParameterSpec`, the declaration of one handler argument, and the functions used to
//! declare them.
//!
//! ```rust
//! # use waymark::router::mapping::parameter::{self, ParameterSource};
//! let id = parameter::path::<i64>("id");
//! let page = parameter::param::<u32>("page").default_value("1");
//!
//! assert_eq!(id.source(), ParameterSource::Path);
//! assert_eq!(page.default_value_str(), Some("1"));
//! ```

use std::any::{type_name, Any, TypeId};
use std::fmt;

use serde::de::DeserializeOwned;

use crate::extractor::body::{decode_body, BodyDecoder};

/// Where the raw value of a parameter comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterSource {
    /// The query string, then form fields of the body, then multipart text fields.
    Parameter,
    /// An attribute of the request session.
    Session,
    /// A request cookie.
    Cookie,
    /// A request header.
    Header,
    /// A variable captured from the request path.
    Path,
    /// One of the request scoped system objects, chosen by the declared type.
    System,
}

type CloneFn = fn(&dyn Any) -> Option<Box<dyn Any + Send>>;

/// The declared Rust type of a parameter.
#[derive(Clone, Copy)]
pub struct DeclaredType {
    id: TypeId,
    name: &'static str,
    clone_any: Option<CloneFn>,
}

impl DeclaredType {
    fn of<T: Send + 'static>(clone_any: Option<CloneFn>) -> Self {
        DeclaredType {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            clone_any,
        }
    }

    /// The `TypeId` of the declared type.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The name of the declared type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Copies `value` when it already is of the declared type.
    pub(crate) fn clone_from(&self, value: &dyn Any) -> Option<Box<dyn Any + Send>> {
        self.clone_any.and_then(|clone_any| clone_any(value))
    }
}

impl fmt::Debug for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

fn clone_any<T: Clone + Send + 'static>(value: &dyn Any) -> Option<Box<dyn Any + Send>> {
    value
        .downcast_ref::<T>()
        .map(|t| Box::new(t.clone()) as Box<dyn Any + Send>)
}

/// Declaration of one handler argument.
#[derive(Clone)]
pub struct ParameterSpec {
    name: String,
    declared_type: DeclaredType,
    source: ParameterSource,
    default_value: Option<String>,
    converter_hint: Option<String>,
    multipart: bool,
    body: Option<BodyDecoder>,
    required: bool,
}

impl ParameterSpec {
    fn new<T>(name: &str, source: ParameterSource) -> Self
    where
        T: Clone + Send + 'static,
    {
        ParameterSpec {
            name: name.to_owned(),
            declared_type: DeclaredType::of::<T>(Some(clone_any::<T>)),
            source,
            default_value: None,
            converter_hint: None,
            multipart: false,
            body: None,
            required: false,
        }
    }

    /// Uses `value` as the raw value when the request supplies none.
    pub fn default_value(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_owned());
        self
    }

    /// Converts the raw value with the converter registered under `name`.
    pub fn converter(mut self, name: &str) -> Self {
        self.converter_hint = Some(name.to_owned());
        self
    }

    /// Marks the parameter as required. This only has an effect when the router binds strictly.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// The declared name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type.
    pub fn declared_type(&self) -> &DeclaredType {
        &self.declared_type
    }

    /// The source of the raw value.
    pub fn source(&self) -> ParameterSource {
        self.source
    }

    /// The fallback raw value.
    pub fn default_value_str(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    /// The name of the converter to prefer.
    pub fn converter_hint(&self) -> Option<&str> {
        self.converter_hint.as_deref()
    }

    /// Whether the value is bound from a multipart part.
    pub fn is_multipart(&self) -> bool {
        self.multipart
    }

    /// Whether the value is deserialized from the request body.
    pub fn is_body(&self) -> bool {
        self.body.is_some()
    }

    /// Whether the parameter is required under strict binding.
    pub fn is_required(&self) -> bool {
        self.required
    }

    pub(crate) fn body_decoder(&self) -> Option<BodyDecoder> {
        self.body
    }
}

impl fmt::Debug for ParameterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterSpec")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("source", &self.source)
            .field("default_value", &self.default_value)
            .field("converter_hint", &self.converter_hint)
            .field("multipart", &self.multipart)
            .field("body", &self.is_body())
            .field("required", &self.required)
            .finish()
    }
}

/// Declares a parameter read from the query string or form fields.
pub fn param<T>(name: &str) -> ParameterSpec
where
    T: Clone + Send + 'static,
{
    ParameterSpec::new::<T>(name, ParameterSource::Parameter)
}

/// Declares a parameter captured from a `{name}` path segment.
pub fn path<T>(name: &str) -> ParameterSpec
where
    T: Clone + Send + 'static,
{
    ParameterSpec::new::<T>(name, ParameterSource::Path)
}

/// Declares a parameter read from a request header.
pub fn header<T>(name: &str) -> ParameterSpec
where
    T: Clone + Send + 'static,
{
    ParameterSpec::new::<T>(name, ParameterSource::Header)
}

/// Declares a parameter read from a request cookie.
pub fn cookie<T>(name: &str) -> ParameterSpec
where
    T: Clone + Send + 'static,
{
    ParameterSpec::new::<T>(name, ParameterSource::Cookie)
}

/// Declares a parameter read from a session attribute.
pub fn session<T>(name: &str) -> ParameterSpec
where
    T: Clone + Send + 'static,
{
    ParameterSpec::new::<T>(name, ParameterSource::Session)
}

/// Declares a request scoped system object: `RequestContext`, `ResponseHeaders` or
/// `SessionHandle`.
pub fn system<T>() -> ParameterSpec
where
    T: Clone + Send + 'static,
{
    ParameterSpec::new::<T>(type_name::<T>(), ParameterSource::System)
}

/// Declares a multipart part: either an `UploadedFile` or a text field converted to `T`.
pub fn part<T>(name: &str) -> ParameterSpec
where
    T: Clone + Send + 'static,
{
    let mut spec = ParameterSpec::new::<T>(name, ParameterSource::Parameter);
    spec.multipart = true;
    spec
}

/// Declares a parameter deserialized from the whole request body, either JSON or
/// form-urlencoded depending on the request content type.
pub fn body<T>() -> ParameterSpec
where
    T: DeserializeOwned + Send + 'static,
{
    ParameterSpec {
        name: type_name::<T>().to_owned(),
        declared_type: DeclaredType::of::<T>(None),
        source: ParameterSource::Parameter,
        default_value: None,
        converter_hint: None,
        multipart: false,
        body: Some(decode_body::<T>),
        required: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Payload {}

    #[test]
    fn declarations_record_their_source() {
        assert_eq!(param::<i32>("a").source(), ParameterSource::Parameter);
        assert_eq!(header::<String>("a").source(), ParameterSource::Header);
        assert_eq!(cookie::<String>("a").source(), ParameterSource::Cookie);
        assert_eq!(session::<String>("a").source(), ParameterSource::Session);
        assert_eq!(system::<String>().source(), ParameterSource::System);
        assert!(part::<String>("f").is_multipart());
        assert!(body::<Payload>().is_body());
        assert!(!param::<i32>("a").is_body());
    }

    #[test]
    fn declared_type_clones_matching_values() {
        let spec = param::<String>("name").converter("upper").required();
        let value = "x".to_owned();

        assert_eq!(spec.declared_type().id(), TypeId::of::<String>());
        assert_eq!(spec.converter_hint(), Some("upper"));
        assert!(spec.is_required());

        let cloned = spec.declared_type().clone_from(&value).unwrap();
        assert_eq!(cloned.downcast_ref::<String>().unwrap(), "x");
        assert!(spec.declared_type().clone_from(&1i32).is_none());
    }
}
