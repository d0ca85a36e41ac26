//! Defines `MethodMapping`, the mapping held by handleable nodes of a method tree.

use std::fmt;
use std::sync::Arc;

use hyper::Method;
use mime::Mime;

use crate::extractor::Arguments;
use crate::router::mapping::class::Instance;
use crate::router::mapping::{MappingAttributes, ParameterSpec};
use crate::view::Model;

pub(crate) type Invoker =
    Arc<dyn Fn(&Instance, Arguments) -> anyhow::Result<Model> + Send + Sync>;

/// The mapping of one handler function onto a declared path and HTTP verb.
#[derive(Clone)]
pub struct MethodMapping {
    pub(crate) declaration: usize,
    name: String,
    verb: Method,
    template: Option<String>,
    restful: Option<bool>,
    consume: Option<Mime>,
    produce: Option<Mime>,
    parameters: Vec<ParameterSpec>,
    returns_text: bool,
    invoker: Invoker,
}

impl MethodMapping {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        declaration: usize,
        name: String,
        verb: Method,
        template: Option<String>,
        restful: Option<bool>,
        consume: Option<Mime>,
        produce: Option<Mime>,
        parameters: Vec<ParameterSpec>,
        returns_text: bool,
        invoker: Invoker,
    ) -> Self {
        MethodMapping {
            declaration,
            name,
            verb,
            template,
            restful,
            consume,
            produce,
            parameters,
            returns_text,
            invoker,
        }
    }

    /// The handler name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The HTTP verb the handler accepts.
    pub fn verb(&self) -> &Method {
        &self.verb
    }

    /// The explicitly declared template.
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// The declared parameters, in argument order.
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// Whether the handler returns text, which page views treat as a template path.
    pub fn returns_text(&self) -> bool {
        self.returns_text
    }

    /// Calls the handler on `instance`.
    pub(crate) fn invoke(&self, instance: &Instance, arguments: Arguments) -> anyhow::Result<Model> {
        (self.invoker)(instance, arguments)
    }
}

impl MappingAttributes for MethodMapping {
    fn restful(&self) -> Option<bool> {
        self.restful
    }

    fn consume(&self) -> Option<&Mime> {
        self.consume.as_ref()
    }

    fn produce(&self) -> Option<&Mime> {
        self.produce.as_ref()
    }
}

impl fmt::Debug for MethodMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodMapping")
            .field("name", &self.name)
            .field("verb", &self.verb)
            .field("template", &self.template)
            .field("parameters", &self.parameters)
            .finish()
    }
}
