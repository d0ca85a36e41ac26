//! Defines `ClassMapping`, the mapping held by handleable nodes of the class tree.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use log::debug;
use mime::Mime;
use once_cell::sync::OnceCell;

use crate::router::instance::InstanceRegistry;
use crate::router::mapping::{MappingAttributes, MethodMapping};
use crate::router::tree::Tree;

/// A shared, type-erased controller instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// The cache holding a class's single controller instance, shared by every path of the class.
pub(crate) type InstanceCell = Arc<OnceCell<Instance>>;

type Constructor = Arc<dyn Fn() -> anyhow::Result<Instance> + Send + Sync>;

/// Describes a controller type registered with the router, including how to construct it.
#[derive(Clone)]
pub struct ClassDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    constructor: Constructor,
}

impl ClassDescriptor {
    /// Describes the controller type `C`, which is created by `constructor` when first needed.
    pub fn new<C, F>(constructor: F) -> Self
    where
        C: Send + Sync + 'static,
        F: Fn() -> anyhow::Result<C> + Send + Sync + 'static,
    {
        ClassDescriptor {
            type_id: TypeId::of::<C>(),
            type_name: type_name::<C>(),
            constructor: Arc::new(move || constructor().map(|c| Arc::new(c) as Instance)),
        }
    }

    /// The `TypeId` of the controller type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The name of the controller type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Runs the constructor.
    pub fn construct(&self) -> anyhow::Result<Instance> {
        (self.constructor)()
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClassDescriptor")
            .field(&self.type_name)
            .finish()
    }
}

/// The mapping of a controller type onto one of its declared paths.
///
/// Each class mapping owns the tree of its methods. The controller instance, once obtained from
/// the `InstanceRegistry`, is cached in a cell shared with the class's mappings on other paths.
pub struct ClassMapping {
    descriptor: ClassDescriptor,
    restful: Option<bool>,
    consume: Option<Mime>,
    produce: Option<Mime>,
    instance: InstanceCell,
    methods: Tree<MethodMapping>,
}

impl ClassMapping {
    pub(crate) fn new(
        descriptor: ClassDescriptor,
        restful: Option<bool>,
        consume: Option<Mime>,
        produce: Option<Mime>,
        instance: InstanceCell,
    ) -> Self {
        ClassMapping {
            descriptor,
            restful,
            consume,
            produce,
            instance,
            methods: Tree::new(),
        }
    }

    /// The descriptor of the mapped controller type.
    pub fn descriptor(&self) -> &ClassDescriptor {
        &self.descriptor
    }

    /// The tree of methods declared on this class.
    pub fn methods(&self) -> &Tree<MethodMapping> {
        &self.methods
    }

    pub(crate) fn methods_mut(&mut self) -> &mut Tree<MethodMapping> {
        &mut self.methods
    }

    /// Returns the controller instance, obtaining it from `registry` on first use.
    ///
    /// Concurrent first callers race to initialize and exactly one result is kept. A failed
    /// creation is not cached, so a later request retries.
    pub fn instance(&self, registry: &dyn InstanceRegistry) -> anyhow::Result<&Instance> {
        self.instance.get_or_try_init(|| {
            debug!(" creating instance of {}", self.descriptor.type_name());
            registry.get_or_create(&self.descriptor)
        })
    }
}

impl MappingAttributes for ClassMapping {
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
