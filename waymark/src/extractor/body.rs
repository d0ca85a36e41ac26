//! Buffered request bodies, form fields and multipart parts, as prepared by the upload stage.

use std::any::Any;
use std::collections::HashMap;

use bytes::Bytes;
use mime::Mime;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::helpers::http::request::query_string::{self, QueryStringMapping};
use crate::state::StateData;

/// The fully buffered request body.
#[derive(Clone, Debug, Default)]
pub struct RequestBody(pub Bytes);

/// Fields of an `application/x-www-form-urlencoded` request body.
#[derive(Clone, Debug, Default)]
pub struct FormFields(pub(crate) QueryStringMapping);

impl FormFields {
    /// Parses a form-urlencoded body.
    pub fn parse(body: &[u8]) -> Self {
        FormFields(query_string::split(std::str::from_utf8(body).ok()))
    }

    /// The first value of the field `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        query_string::first(&self.0, name)
    }
}

/// A file part of a `multipart/form-data` request body.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    name: String,
    file_name: Option<String>,
    content_type: Option<Mime>,
    data: Bytes,
}

impl UploadedFile {
    pub(crate) fn new(
        name: String,
        file_name: Option<String>,
        content_type: Option<Mime>,
        data: Bytes,
    ) -> Self {
        UploadedFile {
            name,
            file_name,
            content_type,
            data,
        }
    }

    /// The form field name of the part.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file name sent by the client.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// The content type sent by the client.
    pub fn content_type(&self) -> Option<&Mime> {
        self.content_type.as_ref()
    }

    /// The file content.
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// The parts of a `multipart/form-data` request body.
#[derive(Clone, Debug, Default)]
pub struct MultipartForm {
    pub(crate) fields: HashMap<String, Vec<String>>,
    pub(crate) files: HashMap<String, Vec<UploadedFile>>,
}

impl MultipartForm {
    /// The first text value of the part `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// The first file sent as part `name`.
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name).and_then(|files| files.first())
    }
}

impl StateData for RequestBody {}
impl StateData for FormFields {}
impl StateData for MultipartForm {}

/// How a request body is encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyFormat {
    /// `application/json`
    Json,
    /// `application/x-www-form-urlencoded`
    Form,
}

impl BodyFormat {
    /// Chooses the format from a request content type. Anything but a form is read as JSON.
    pub fn from_content_type(content_type: Option<&Mime>) -> Self {
        match content_type {
            Some(m) if m.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() => {
                BodyFormat::Form
            }
            _ => BodyFormat::Json,
        }
    }
}

pub(crate) type BodyDecoder = fn(&[u8], BodyFormat) -> anyhow::Result<Box<dyn Any + Send>>;

/// Deserializes a request body into `T`.
///
/// Form bodies are read as an object of string fields, with repeated fields collected into
/// arrays.
pub(crate) fn decode_body<T>(body: &[u8], format: BodyFormat) -> anyhow::Result<Box<dyn Any + Send>>
where
    T: DeserializeOwned + Send + 'static,
{
    let value: T = match format {
        BodyFormat::Json => serde_json::from_slice(body)?,
        BodyFormat::Form => serde_json::from_value(form_value(&FormFields::parse(body)))?,
    };
    Ok(Box::new(value))
}

fn form_value(fields: &FormFields) -> Value {
    let object = fields
        .0
        .iter()
        .map(|(k, values)| {
            let value = match values.as_slice() {
                [single] => Value::String(single.as_ref().to_owned()),
                many => Value::Array(
                    many.iter()
                        .map(|v| Value::String(v.as_ref().to_owned()))
                        .collect(),
                ),
            };
            (k.clone(), value)
        })
        .collect::<Map<String, Value>>();
    Value::Object(object)
}
