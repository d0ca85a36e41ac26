//! Defines `Node` and `NodeId` for `Tree`

use std::collections::HashMap;

use crate::router::tree::segment::{variable_name, SegmentType};

/// Index of a `Node` within the arena of the `Tree` which owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

/// A recursive member of a `Tree` representing one declared path segment.
///
/// Children are keyed by their literal segment text. Several children may share the same text
/// when they are handleable by different elements, so each key maps to a list of nodes. A
/// handleable node carries the mapping `T` that requests ending there are dispatched to.
pub struct Node<T> {
    segment: String,
    segment_type: SegmentType,
    parent: Option<NodeId>,
    children: HashMap<String, Vec<NodeId>>,
    variables: Vec<NodeId>,
    mapping: Option<T>,
}

impl<T> Node<T> {
    pub(crate) fn new(segment: &str, parent: Option<NodeId>) -> Self {
        Node {
            segment: segment.to_owned(),
            segment_type: SegmentType::of(segment),
            parent,
            children: HashMap::new(),
            variables: Vec::new(),
            mapping: None,
        }
    }

    /// Provides the declared segment text of this node.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Provides the `SegmentType` of this node.
    pub fn segment_type(&self) -> SegmentType {
        self.segment_type
    }

    /// Determines if this node captures a path variable.
    pub fn is_variable(&self) -> bool {
        self.segment_type == SegmentType::Variable
    }

    /// The name captured by a variable node.
    pub fn variable_name(&self) -> Option<&str> {
        variable_name(&self.segment)
    }

    /// Determines if this is the empty root marker segment, which matches without consuming a
    /// request segment.
    pub fn is_root_marker(&self) -> bool {
        self.segment.is_empty()
    }

    /// Determines if requests can be dispatched to this node.
    pub fn is_handleable(&self) -> bool {
        self.mapping.is_some()
    }

    /// The enclosing node, if this is not a top level node.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The mapping held by a handleable node.
    pub fn mapping(&self) -> Option<&T> {
        self.mapping.as_ref()
    }

    pub(crate) fn mapping_mut(&mut self) -> Option<&mut T> {
        self.mapping.as_mut()
    }

    pub(crate) fn set_mapping(&mut self, mapping: T) {
        self.mapping = Some(mapping);
    }

    /// Children declared with exactly the given segment text.
    pub(crate) fn children_named(&self, segment: &str) -> &[NodeId] {
        self.children
            .get(segment)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Children which capture path variables.
    pub(crate) fn variable_children(&self) -> &[NodeId] {
        &self.variables
    }

    pub(crate) fn add_child(&mut self, segment: &str, id: NodeId) {
        if SegmentType::of(segment) == SegmentType::Variable {
            self.variables.push(id);
        }
        self.children
            .entry(segment.to_owned())
            .or_insert_with(Vec::new)
            .push(id);
    }
}
