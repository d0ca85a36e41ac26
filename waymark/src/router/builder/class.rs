use std::marker::PhantomData;

use mime::Mime;

use crate::router::builder::method::{MethodDeclaration, MethodsBuilder};
use crate::router::builder::RouterBuilder;
use crate::router::mapping::class::{ClassDescriptor, InstanceCell};
use crate::router::mapping::ClassMapping;

pub(super) struct ClassDeclaration {
    pub(super) descriptor: ClassDescriptor,
    pub(super) paths: Vec<String>,
    pub(super) restful: Option<bool>,
    pub(super) consume: Option<Mime>,
    pub(super) produce: Option<Mime>,
    pub(super) methods: Vec<MethodDeclaration>,
}

impl ClassDeclaration {
    pub(super) fn mapping(&self, instance: &InstanceCell) -> ClassMapping {
        ClassMapping::new(
            self.descriptor.clone(),
            self.restful,
            self.consume.clone(),
            self.produce.clone(),
            instance.clone(),
        )
    }
}

/// Declares the attributes and methods of one controller type.
///
/// The declaration is added to the router when `methods` is called.
pub struct ClassBuilder<'a, C> {
    builder: &'a mut RouterBuilder,
    declaration: ClassDeclaration,
    phantom: PhantomData<fn() -> C>,
}

impl<'a, C> ClassBuilder<'a, C>
where
    C: Send + Sync + 'static,
{
    pub(super) fn new(builder: &'a mut RouterBuilder, descriptor: ClassDescriptor, path: &str) -> Self {
        ClassBuilder {
            builder,
            declaration: ClassDeclaration {
                descriptor,
                paths: vec![path.to_owned()],
                restful: None,
                consume: None,
                produce: None,
                methods: Vec::new(),
            },
            phantom: PhantomData,
        }
    }

    /// Maps the class to an additional path.
    pub fn path(mut self, path: &str) -> Self {
        self.declaration.paths.push(path.to_owned());
        self
    }

    /// Serializes the results of every method that does not say otherwise.
    pub fn restful(mut self) -> Self {
        self.declaration.restful = Some(true);
        self
    }

    /// Renders the results of every method that does not say otherwise through templates.
    pub fn page(mut self) -> Self {
        self.declaration.restful = Some(false);
        self
    }

    /// Sets the media type requests must have.
    pub fn consume(mut self, consume: Mime) -> Self {
        self.declaration.consume = Some(consume);
        self
    }

    /// Sets the media type of responses.
    pub fn produce(mut self, produce: Mime) -> Self {
        self.declaration.produce = Some(produce);
        self
    }

    /// Declares the methods of the class and adds the class to the router.
    pub fn methods<F>(self, f: F)
    where
        F: FnOnce(&mut MethodsBuilder<C>),
    {
        let ClassBuilder {
            builder,
            mut declaration,
            ..
        } = self;

        let mut methods = MethodsBuilder::new();
        f(&mut methods);
        declaration.methods = methods.into_declarations();
        builder.classes.push(declaration);
    }
}
