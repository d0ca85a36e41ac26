//! Defines `RouterConfig`, the defaults and switches applied by a `Router`.

use std::env;

use mime::Mime;
use serde::{Deserialize, Serialize};

/// Environment variable which, when set to `1` or `true`, exposes error traces on 500 pages.
pub const EXPOSE_TRACES_ENV: &str = "WAYMARK_EXPOSE_TRACES";

/// Defaults applied where classes and methods leave an attribute unset, plus router-wide
/// switches.
///
/// ```rust
/// # use waymark::router::RouterConfig;
/// let config = RouterConfig::default()
///     .with_default_restful(true)
///     .with_strict_binding(true);
///
/// assert!(config.default_restful());
/// assert!(config.strict_binding());
/// assert_eq!(config.default_consume(), &mime::STAR_STAR);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    #[serde(with = "mime_string")]
    default_consume: Mime,
    #[serde(with = "mime_string")]
    default_page_produce: Mime,
    #[serde(with = "mime_string")]
    default_restful_produce: Mime,
    default_restful: bool,
    strict_binding: bool,
    expose_traces: bool,
    default_charset: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            default_consume: mime::STAR_STAR,
            default_page_produce: mime::TEXT_HTML,
            default_restful_produce: mime::APPLICATION_JSON,
            default_restful: false,
            strict_binding: false,
            expose_traces: expose_traces_from_env(),
            default_charset: "UTF-8".to_owned(),
        }
    }
}

fn expose_traces_from_env() -> bool {
    env::var(EXPOSE_TRACES_ENV)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

impl RouterConfig {
    /// The media type requests must have when nothing else is declared. `*/*` accepts any.
    pub fn default_consume(&self) -> &Mime {
        &self.default_consume
    }

    /// The media type of page responses when nothing else is declared.
    pub fn default_page_produce(&self) -> &Mime {
        &self.default_page_produce
    }

    /// The media type of restful responses when nothing else is declared.
    pub fn default_restful_produce(&self) -> &Mime {
        &self.default_restful_produce
    }

    /// Whether handlers are restful when neither method nor class says.
    pub fn default_restful(&self) -> bool {
        self.default_restful
    }

    /// Whether missing required parameters and unconvertible values are rejected with
    /// `400 Bad Request`.
    pub fn strict_binding(&self) -> bool {
        self.strict_binding
    }

    /// Whether 500 pages include the error chain.
    pub fn expose_traces(&self) -> bool {
        self.expose_traces
    }

    /// The charset assumed for requests and applied to textual responses.
    pub fn default_charset(&self) -> &str {
        &self.default_charset
    }

    /// Sets the default consume media type.
    pub fn with_default_consume(mut self, consume: Mime) -> Self {
        self.default_consume = consume;
        self
    }

    /// Sets the default page media type.
    pub fn with_default_page_produce(mut self, produce: Mime) -> Self {
        self.default_page_produce = produce;
        self
    }

    /// Sets the default restful media type.
    pub fn with_default_restful_produce(mut self, produce: Mime) -> Self {
        self.default_restful_produce = produce;
        self
    }

    /// Sets whether handlers are restful by default.
    pub fn with_default_restful(mut self, restful: bool) -> Self {
        self.default_restful = restful;
        self
    }

    /// Sets strict binding.
    pub fn with_strict_binding(mut self, strict: bool) -> Self {
        self.strict_binding = strict;
        self
    }

    /// Sets whether 500 pages include the error chain.
    pub fn with_expose_traces(mut self, expose: bool) -> Self {
        self.expose_traces = expose;
        self
    }

    /// Sets the default charset.
    pub fn with_default_charset(mut self, charset: &str) -> Self {
        self.default_charset = charset.to_owned();
        self
    }
}

mod mime_string {
    use mime::Mime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(mime: &Mime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(mime.as_ref())
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Mime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_partial_config() {
        let config: RouterConfig = serde_json::from_str(
            r#"{"default_restful_produce": "text/xml", "strict_binding": true}"#,
        )
        .unwrap();

        assert_eq!(config.default_restful_produce(), &mime::TEXT_XML);
        assert!(config.strict_binding());
        assert_eq!(config.default_consume(), &mime::STAR_STAR);
        assert_eq!(config.default_charset(), "UTF-8");
    }

    #[test]
    fn rejects_invalid_media_types() {
        let result = serde_json::from_str::<RouterConfig>(r#"{"default_consume": "nope"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn setters_round_trip_through_serde() {
        let config = RouterConfig::default()
            .with_default_consume(mime::APPLICATION_JSON)
            .with_default_page_produce(mime::TEXT_PLAIN)
            .with_default_restful_produce(mime::TEXT_XML)
            .with_default_charset("ISO-8859-1");

        let json = serde_json::to_string(&config).unwrap();
        let config: RouterConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.default_consume(), &mime::APPLICATION_JSON);
        assert_eq!(config.default_page_produce(), &mime::TEXT_PLAIN);
        assert_eq!(config.default_restful_produce(), &mime::TEXT_XML);
        assert_eq!(config.default_charset(), "ISO-8859-1");
    }
}
