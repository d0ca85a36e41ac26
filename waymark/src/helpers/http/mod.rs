//! Helpers for HTTP request handling and response generation

pub mod header;
pub mod request;
pub mod response;

use std::borrow::Cow;

use log::trace;
use percent_encoding::percent_decode_str;

fn decode(raw: &str) -> Option<String> {
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(_) => {
            trace!(" `{}` does not decode to utf8", raw);
            None
        }
    }
}

/// A path segment after percent decoding. Holding one proves the segment was valid utf8.
#[derive(Clone, PartialEq, Debug)]
pub struct PercentDecoded(String);

impl PercentDecoded {
    pub(crate) fn new(raw: &str) -> Option<Self> {
        decode(raw).map(PercentDecoded)
    }
}

impl AsRef<str> for PercentDecoded {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A query string or form body value after form-urlencoded decoding, where `+` stands for a
/// space.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct FormUrlDecoded(String);

impl FormUrlDecoded {
    pub(crate) fn new(raw: &str) -> Option<Self> {
        let raw: Cow<'_, str> = if raw.contains('+') {
            Cow::Owned(raw.replace('+', " "))
        } else {
            Cow::Borrowed(raw)
        };
        decode(&raw).map(FormUrlDecoded)
    }

    pub(crate) fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for FormUrlDecoded {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
