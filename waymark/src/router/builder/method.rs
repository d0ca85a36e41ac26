use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;

use hyper::Method;
use mime::Mime;
use serde::Serialize;

use crate::extractor::Arguments;
use crate::router::builder::returns_text;
use crate::router::mapping::class::Instance;
use crate::router::mapping::method::Invoker;
use crate::router::mapping::{MethodMapping, ParameterSpec};
use crate::view::Model;

#[derive(Clone)]
pub(super) struct MethodDeclaration {
    pub(super) name: String,
    pub(super) verb: Method,
    pub(super) paths: Vec<String>,
    pub(super) template: Option<String>,
    pub(super) restful: Option<bool>,
    pub(super) consume: Option<Mime>,
    pub(super) produce: Option<Mime>,
    pub(super) parameters: Vec<ParameterSpec>,
    pub(super) returns_text: bool,
    pub(super) invoker: Invoker,
}

impl MethodDeclaration {
    pub(super) fn mapping(&self, index: usize) -> MethodMapping {
        MethodMapping::new(
            index,
            self.name.clone(),
            self.verb.clone(),
            self.template.clone(),
            self.restful,
            self.consume.clone(),
            self.produce.clone(),
            self.parameters.clone(),
            self.returns_text,
            self.invoker.clone(),
        )
    }
}

/// Declares the methods of a controller type `C`.
pub struct MethodsBuilder<C> {
    declarations: Vec<MethodDeclaration>,
    phantom: PhantomData<fn() -> C>,
}

impl<C> MethodsBuilder<C>
where
    C: Send + Sync + 'static,
{
    pub(super) fn new() -> Self {
        MethodsBuilder {
            declarations: Vec::new(),
            phantom: PhantomData,
        }
    }

    pub(super) fn into_declarations(self) -> Vec<MethodDeclaration> {
        self.declarations
    }

    /// Declares a method for `verb` requests to `path`, relative to the class path.
    pub fn request(&mut self, verb: Method, path: &str) -> MethodBuilder<'_, C> {
        MethodBuilder {
            declarations: &mut self.declarations,
            verb,
            paths: vec![path.to_owned()],
            name: None,
            template: None,
            restful: None,
            consume: None,
            produce: None,
            parameters: Vec::new(),
            phantom: PhantomData,
        }
    }

    /// Declares a `GET` method.
    pub fn get(&mut self, path: &str) -> MethodBuilder<'_, C> {
        self.request(Method::GET, path)
    }

    /// Declares a `POST` method.
    pub fn post(&mut self, path: &str) -> MethodBuilder<'_, C> {
        self.request(Method::POST, path)
    }

    /// Declares a `PUT` method.
    pub fn put(&mut self, path: &str) -> MethodBuilder<'_, C> {
        self.request(Method::PUT, path)
    }

    /// Declares a `PATCH` method.
    pub fn patch(&mut self, path: &str) -> MethodBuilder<'_, C> {
        self.request(Method::PATCH, path)
    }

    /// Declares a `DELETE` method.
    pub fn delete(&mut self, path: &str) -> MethodBuilder<'_, C> {
        self.request(Method::DELETE, path)
    }

    /// Declares an `OPTIONS` method.
    pub fn options(&mut self, path: &str) -> MethodBuilder<'_, C> {
        self.request(Method::OPTIONS, path)
    }

    /// Declares a restful method. Without an explicit verb it answers `GET`.
    pub fn restful(&mut self, path: &str) -> MethodBuilder<'_, C> {
        self.get(path).restful()
    }
}

/// Declares one method. The method is added when `to` supplies its handler.
pub struct MethodBuilder<'a, C> {
    declarations: &'a mut Vec<MethodDeclaration>,
    verb: Method,
    paths: Vec<String>,
    name: Option<String>,
    template: Option<String>,
    restful: Option<bool>,
    consume: Option<Mime>,
    produce: Option<Mime>,
    parameters: Vec<ParameterSpec>,
    phantom: PhantomData<fn() -> C>,
}

impl<'a, C> MethodBuilder<'a, C>
where
    C: Send + Sync + 'static,
{
    /// Maps the method to an additional path.
    pub fn path(mut self, path: &str) -> Self {
        self.paths.push(path.to_owned());
        self
    }

    /// Names the method in diagnostics. Defaults to the name of the handler function.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    /// Declares the next handler argument.
    pub fn param(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    /// Renders the result through `template`. The result is passed to the renderer as the
    /// model.
    pub fn template(mut self, template: &str) -> Self {
        self.template = Some(template.to_owned());
        self
    }

    /// Serializes the result.
    pub fn restful(mut self) -> Self {
        self.restful = Some(true);
        self
    }

    /// Renders the result through a template.
    pub fn page(mut self) -> Self {
        self.restful = Some(false);
        self
    }

    /// Sets the media type requests must have.
    pub fn consume(mut self, consume: Mime) -> Self {
        self.consume = Some(consume);
        self
    }

    /// Sets the media type of responses.
    pub fn produce(mut self, produce: Mime) -> Self {
        self.produce = Some(produce);
        self
    }

    /// Completes the declaration with the function handling the request.
    ///
    /// The handler receives the controller instance and the bound arguments, in the order the
    /// parameters were declared.
    pub fn to<F, T>(self, handler: F)
    where
        F: Fn(&C, Arguments) -> anyhow::Result<T> + Send + Sync + 'static,
        T: Serialize + 'static,
    {
        let name = self.name.unwrap_or_else(handler_name::<F>);

        let invoker: Invoker = Arc::new(
            move |instance: &Instance, arguments: Arguments| -> anyhow::Result<Model> {
                let controller = instance.downcast_ref::<C>().ok_or_else(|| {
                    anyhow::anyhow!("controller instance is not a {}", type_name::<C>())
                })?;
                let result = handler(controller, arguments)?;
                Ok(serde_json::to_value(&result)?)
            },
        );

        self.declarations.push(MethodDeclaration {
            name,
            verb: self.verb,
            paths: self.paths,
            template: self.template,
            restful: self.restful,
            consume: self.consume,
            produce: self.produce,
            parameters: self.parameters,
            returns_text: returns_text::<T>(),
            invoker,
        });
    }
}

fn handler_name<F>() -> String {
    let full = type_name::<F>();
    full.rsplit("::").next().unwrap_or(full).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Controller;

    impl Controller {
        fn find_user(&self, _: Arguments) -> anyhow::Result<String> {
            Ok(String::new())
        }
    }

    fn name_of<F>(_: F) -> String {
        handler_name::<F>()
    }

    #[test]
    fn handler_names_come_from_the_function() {
        assert_eq!(name_of(Controller::find_user), "find_user");
    }

    #[test]
    fn restful_shorthand_defaults_to_get() {
        let mut methods = MethodsBuilder::<Controller>::new();
        methods.restful("/x").to(Controller::find_user);
        methods.post("/y").page().to(Controller::find_user);

        let declarations = methods.into_declarations();
        assert_eq!(declarations[0].verb, Method::GET);
        assert_eq!(declarations[0].restful, Some(true));
        assert_eq!(declarations[1].verb, Method::POST);
        assert_eq!(declarations[1].restful, Some(false));
        assert!(declarations[1].returns_text);
    }
}
