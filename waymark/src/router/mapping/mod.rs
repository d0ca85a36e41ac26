//! Defines the mappings held by handleable nodes of the class and method trees.

pub mod class;
pub mod method;
pub mod parameter;

use mime::Mime;

use crate::router::tree::node::{Node, NodeId};

pub use self::class::{ClassDescriptor, ClassMapping};
pub use self::method::MethodMapping;
pub use self::parameter::{ParameterSource, ParameterSpec};

/// Attributes declared on a class or on a method, each of which may be left unset so that the
/// enclosing declaration or the router configuration decides.
pub trait MappingAttributes {
    /// Whether results are serialized directly instead of rendered through a template.
    fn restful(&self) -> Option<bool>;

    /// Media type the request body must have.
    fn consume(&self) -> Option<&Mime>;

    /// Media type of the response.
    fn produce(&self) -> Option<&Mime>;
}

/// The capability shared by nodes of the class and method trees.
pub trait MappablePath {
    /// The declared segment text.
    fn segment(&self) -> &str;

    /// Whether the segment captures a path variable.
    fn is_variable(&self) -> bool;

    /// Whether requests can be dispatched to this node.
    fn is_handleable(&self) -> bool;

    /// Declared restful flag, if this node is handleable and declares one.
    fn restful(&self) -> Option<bool>;

    /// Declared consume media type.
    fn consume(&self) -> Option<&Mime>;

    /// Declared produce media type.
    fn produce(&self) -> Option<&Mime>;

    /// The enclosing node.
    fn parent(&self) -> Option<NodeId>;
}

impl<T> MappablePath for Node<T>
where
    T: MappingAttributes,
{
    fn segment(&self) -> &str {
        Node::segment(self)
    }

    fn is_variable(&self) -> bool {
        Node::is_variable(self)
    }

    fn is_handleable(&self) -> bool {
        Node::is_handleable(self)
    }

    fn restful(&self) -> Option<bool> {
        self.mapping().and_then(MappingAttributes::restful)
    }

    fn consume(&self) -> Option<&Mime> {
        self.mapping().and_then(MappingAttributes::consume)
    }

    fn produce(&self) -> Option<&Mime> {
        self.mapping().and_then(MappingAttributes::produce)
    }

    fn parent(&self) -> Option<NodeId> {
        Node::parent(self)
    }
}

/// Computes an effective attribute value: the method's declaration wins, then the class's, then
/// the router default.
pub fn effective<T>(method: Option<T>, class: Option<T>, default: T) -> T {
    method.or(class).unwrap_or(default)
}
