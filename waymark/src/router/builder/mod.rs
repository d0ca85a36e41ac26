//! Defines a builder API for constructing a `Router`.
//!
//! ```rust
//! # use waymark::extractor::Arguments;
//! # use waymark::router::builder::build_simple_router;
//! # use waymark::router::mapping::parameter;
//! #[derive(Default)]
//! struct EchoController;
//!
//! impl EchoController {
//!     fn echo(&self, mut args: Arguments) -> anyhow::Result<String> {
//!         Ok(args.take::<String>(0).unwrap_or_default())
//!     }
//! }
//!
//! # fn main() {
//! let router = build_simple_router(|route| {
//!     route
//!         .class::<EchoController>("/api")
//!         .restful()
//!         .methods(|m| {
//!             m.get("/echo/{text}")
//!                 .param(parameter::path::<String>("text"))
//!                 .to(EchoController::echo);
//!         });
//! })
//! .unwrap();
//! # drop(router);
//! # }
//! ```

mod class;
mod method;

use std::any::TypeId;
use std::sync::Arc;

use log::{debug, warn};

pub use self::class::ClassBuilder;
pub use self::method::{MethodBuilder, MethodsBuilder};

use self::class::ClassDeclaration;
use crate::convert::ConverterRegistry;
use crate::middleware::Middleware;
use crate::router::instance::{ConstructingRegistry, InstanceRegistry};
use crate::router::mapping::class::{ClassDescriptor, InstanceCell};
use crate::router::mapping::{effective, ClassMapping};
use crate::router::resolver::Resolver;
use crate::router::tree::segment::split_path;
use crate::router::tree::Tree;
use crate::router::{Router, RouterConfig, RouterData};
use crate::view::Renderer;

/// Errors raised while registering classes and methods.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Two differently named variables were declared at the same intermediate position.
    #[error("path `{path}` declares `{declared}` where `{existing}` is already declared")]
    ConflictingVariable {
        /// The declared path.
        path: String,
        /// The variable segment already present.
        existing: String,
        /// The variable segment being declared.
        declared: String,
    },
}

/// Builds a `Router` with the given configuration, using the closure to declare classes and
/// their methods.
pub fn build_router<F>(config: RouterConfig, f: F) -> Result<Router, BuildError>
where
    F: FnOnce(&mut RouterBuilder),
{
    let mut builder = RouterBuilder::new(config);
    f(&mut builder);
    builder.finalize()
}

/// Builds a `Router` with the default configuration.
pub fn build_simple_router<F>(f: F) -> Result<Router, BuildError>
where
    F: FnOnce(&mut RouterBuilder),
{
    build_router(RouterConfig::default(), f)
}

/// Collects class declarations and router collaborators before the `Router` is frozen.
pub struct RouterBuilder {
    config: RouterConfig,
    classes: Vec<ClassDeclaration>,
    converters: ConverterRegistry,
    registry: Arc<dyn InstanceRegistry>,
    renderer: Option<Arc<dyn Renderer>>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl RouterBuilder {
    fn new(config: RouterConfig) -> Self {
        RouterBuilder {
            config,
            classes: Vec::new(),
            converters: ConverterRegistry::new(),
            registry: Arc::new(ConstructingRegistry),
            renderer: None,
            middleware: Vec::new(),
        }
    }

    /// Declares the controller type `C` at `path`. The controller is created with
    /// `Default::default` when first dispatched to.
    pub fn class<C>(&mut self, path: &str) -> ClassBuilder<'_, C>
    where
        C: Default + Send + Sync + 'static,
    {
        self.class_with(path, || Ok(C::default()))
    }

    /// Declares the controller type `C` at `path`, created by `constructor`.
    pub fn class_with<C, F>(&mut self, path: &str, constructor: F) -> ClassBuilder<'_, C>
    where
        C: Send + Sync + 'static,
        F: Fn() -> anyhow::Result<C> + Send + Sync + 'static,
    {
        ClassBuilder::new(self, ClassDescriptor::new(constructor), path)
    }

    /// The converters used when binding parameters, for registering additional ones.
    pub fn converters(&mut self) -> &mut ConverterRegistry {
        &mut self.converters
    }

    /// Replaces the registry that supplies controller instances.
    pub fn instance_registry<R>(&mut self, registry: R)
    where
        R: InstanceRegistry + 'static,
    {
        self.registry = Arc::new(registry);
    }

    /// Sets the template renderer used by page views.
    pub fn renderer<R>(&mut self, renderer: R)
    where
        R: Renderer + 'static,
    {
        self.renderer = Some(Arc::new(renderer));
    }

    /// Adds an application stage to the chain, run after the upload stage and before dispatch.
    pub fn middleware<M>(&mut self, middleware: M)
    where
        M: Middleware + 'static,
    {
        self.middleware.push(Arc::new(middleware));
    }

    fn finalize(self) -> Result<Router, BuildError> {
        let mut tree: Tree<ClassMapping> = Tree::new();

        for class in &self.classes {
            let type_id = class.descriptor.type_id();
            let instance = InstanceCell::default();
            for path in &class.paths {
                let id = tree.register(
                    &split_path(path),
                    |c| c.descriptor().type_id() == type_id,
                    || class.mapping(&instance),
                )?;
                debug!(" mapped {} to `{}`", class.descriptor.type_name(), path);

                if let Some(mapping) = tree.node_mut(id).mapping_mut() {
                    register_methods(class, mapping)?;
                }
            }
        }

        for class in &self.classes {
            warn_on_missing_templates(class, &self.config);
        }

        Ok(Router::new(
            RouterData {
                resolver: Resolver::new(tree),
                config: self.config,
                converters: self.converters,
                registry: self.registry,
                renderer: self.renderer,
            },
            self.middleware,
        ))
    }
}

fn register_methods(class: &ClassDeclaration, mapping: &mut ClassMapping) -> Result<(), BuildError> {
    for (index, method) in class.methods.iter().enumerate() {
        for path in &method.paths {
            mapping.methods_mut().register(
                &split_path(path),
                |m| m.declaration == index && m.verb() == &method.verb,
                || method.mapping(index),
            )?;
            debug!(
                " mapped {} {}::{} to `{}`",
                method.verb,
                class.descriptor.type_name(),
                method.name,
                path
            );
        }
    }
    Ok(())
}

fn warn_on_missing_templates(class: &ClassDeclaration, config: &RouterConfig) {
    for method in &class.methods {
        let restful = effective(method.restful, class.restful, config.default_restful());
        if !restful && method.template.is_none() && !method.returns_text {
            warn!(
                " {}::{} renders a page but declares no template and does not return one",
                class.descriptor.type_name(),
                method.name
            );
        }
    }
}

pub(crate) fn returns_text<T: 'static>() -> bool {
    let id = TypeId::of::<T>();
    id == TypeId::of::<String>() || id == TypeId::of::<&'static str>()
}
