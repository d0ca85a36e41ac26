//! Defines the `InstanceRegistry` seam through which the router obtains controller instances.

use crate::router::mapping::class::{ClassDescriptor, Instance};

/// Supplies controller instances to the router.
///
/// The router caches whatever is returned here for the lifetime of the mapping, so a registry is
/// consulted at most once per mapped class path that actually receives traffic.
pub trait InstanceRegistry: Send + Sync {
    /// Returns the instance for the described controller type, creating it if needed.
    fn get_or_create(&self, descriptor: &ClassDescriptor) -> anyhow::Result<Instance>;
}

/// The default `InstanceRegistry`, which runs the constructor given at registration.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConstructingRegistry;

impl InstanceRegistry for ConstructingRegistry {
    fn get_or_create(&self, descriptor: &ClassDescriptor) -> anyhow::Result<Instance> {
        descriptor.construct()
    }
}

impl<F> InstanceRegistry for F
where
    F: Fn(&ClassDescriptor) -> anyhow::Result<Instance> + Send + Sync,
{
    fn get_or_create(&self, descriptor: &ClassDescriptor) -> anyhow::Result<Instance> {
        self(descriptor)
    }
}
