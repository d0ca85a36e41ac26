//! Defines a hierarchial `Tree` of path segment `Node` values, stored as an arena.

use log::trace;

use crate::helpers::http::PercentDecoded;
use crate::router::builder::BuildError;
use crate::router::tree::node::{Node, NodeId};
use crate::router::tree::segment::{SegmentType, Specificity};

pub mod node;
pub mod segment;

/// A hierarchical structure that provides a root `Node` and subtrees of linked nodes that
/// represent declared paths.
///
/// Nodes are owned by the tree and addressed by `NodeId`, each node knowing the id of its
/// parent. The tree is only mutated while a `Router` is being built.
pub struct Tree<T> {
    nodes: Vec<Node<T>>,
}

impl<T> Tree<T> {
    /// Creates a new `Tree` and root `Node`.
    pub fn new() -> Self {
        trace!(" creating new tree");
        Tree {
            nodes: vec![Node::new("/", None)],
        }
    }

    /// The id of the root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Borrows a node of this tree.
    ///
    /// # Panics
    ///
    /// If `id` was not issued by this tree.
    pub fn node(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        &mut self.nodes[id.0]
    }

    /// Iterates over the handleable nodes of this tree, in registration order.
    pub fn handleable(&self) -> impl Iterator<Item = (NodeId, &T)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.mapping().map(|m| (NodeId(i), m)))
    }

    /// Iterates from `id` up to, but excluding, the root.
    pub fn ancestry(&self, id: NodeId) -> impl Iterator<Item = &Node<T>> {
        let mut next = Some(id).filter(|id| *id != self.root());
        std::iter::from_fn(move || {
            let node = self.node(next?);
            next = node.parent().filter(|id| *id != self.root());
            Some(node)
        })
    }

    /// Registers the declared `segments`, returning the terminal node.
    ///
    /// Intermediate segments reuse an existing child with the same text that is not handleable.
    /// The terminal segment reuses a handleable child for which `owns` returns `true`, so the
    /// same element registered twice on one path lands on one node. Otherwise a new sibling is
    /// created. A new terminal node receives the mapping produced by `mapping`.
    pub(crate) fn register<F, M>(
        &mut self,
        segments: &[String],
        owns: F,
        mapping: M,
    ) -> Result<NodeId, BuildError>
    where
        F: Fn(&T) -> bool,
        M: FnOnce() -> T,
    {
        let mut current = self.root();
        let last = segments.len().saturating_sub(1);

        for (i, segment) in segments.iter().enumerate() {
            let terminal = i == last;
            let existing = self
                .node(current)
                .children_named(segment)
                .iter()
                .copied()
                .find(|id| match self.node(*id).mapping() {
                    Some(m) => terminal && owns(m),
                    None => !terminal,
                });

            current = match existing {
                Some(id) => id,
                None => {
                    if !terminal {
                        self.ensure_single_pass_through(current, segment, segments)?;
                    }
                    self.push_child(current, segment)
                }
            };
        }

        if !self.node(current).is_handleable() {
            self.node_mut(current).set_mapping(mapping());
        }

        Ok(current)
    }

    fn ensure_single_pass_through(
        &self,
        parent: NodeId,
        segment: &str,
        segments: &[String],
    ) -> Result<(), BuildError> {
        if SegmentType::of(segment) != SegmentType::Variable {
            return Ok(());
        }

        let clash = self
            .node(parent)
            .variable_children()
            .iter()
            .map(|id| self.node(*id))
            .find(|n| !n.is_handleable() && n.segment() != segment);

        match clash {
            Some(existing) => Err(BuildError::ConflictingVariable {
                path: segments.join("/"),
                existing: existing.segment().to_owned(),
                declared: segment.to_owned(),
            }),
            None => Ok(()),
        }
    }

    fn push_child(&mut self, parent: NodeId, segment: &str) -> NodeId {
        trace!(" adding node `{}` to tree", segment);
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(segment, Some(parent)));
        self.node_mut(parent).add_child(segment, id);
        id
    }

    /// Walks the tree for the given request segments and reports every handleable node that is
    /// reached, together with how many segments were consumed to reach it and the specificity of
    /// that match.
    ///
    /// All matching branches are followed. The empty root marker segment matches without
    /// consuming a request segment.
    pub(crate) fn walk<F>(&self, segments: &[PercentDecoded], mut on_handleable: F)
    where
        F: FnMut(NodeId, usize, &Specificity),
    {
        let mut specificity = Specificity::default();
        self.walk_from(self.root(), segments, 0, &mut specificity, &mut on_handleable);
    }

    fn walk_from<F>(
        &self,
        id: NodeId,
        segments: &[PercentDecoded],
        index: usize,
        specificity: &mut Specificity,
        on_handleable: &mut F,
    ) where
        F: FnMut(NodeId, usize, &Specificity),
    {
        let node = self.node(id);

        for child in node.children_named("") {
            self.visit(*child, segments, index, specificity, on_handleable);
        }

        let segment = match segments.get(index) {
            Some(segment) => segment.as_ref(),
            None => return,
        };

        if !segment.is_empty() {
            let literals = node
                .children_named(segment)
                .iter()
                .filter(|c| !self.node(**c).is_variable());

            for child in literals {
                specificity.push(SegmentType::Static);
                self.visit(*child, segments, index + 1, specificity, on_handleable);
                specificity.pop();
            }
        }

        for child in node.variable_children() {
            specificity.push(SegmentType::Variable);
            self.visit(*child, segments, index + 1, specificity, on_handleable);
            specificity.pop();
        }
    }

    fn visit<F>(
        &self,
        id: NodeId,
        segments: &[PercentDecoded],
        index: usize,
        specificity: &mut Specificity,
        on_handleable: &mut F,
    ) where
        F: FnMut(NodeId, usize, &Specificity),
    {
        if self.node(id).is_handleable() {
            on_handleable(id, index, specificity);
        } else {
            self.walk_from(id, segments, index, specificity, on_handleable);
        }
    }
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Tree::new()
    }
}
