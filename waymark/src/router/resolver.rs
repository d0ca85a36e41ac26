//! Defines the `Resolver`, which finds every handler whose declared path matches a request.

use log::trace;

use crate::helpers::http::PercentDecoded;
use crate::router::mapping::{ClassMapping, MethodMapping};
use crate::router::tree::node::{Node, NodeId};
use crate::router::tree::segment::{SegmentMapping, Specificity};
use crate::router::tree::Tree;
use crate::state::StateData;
use crate::view::MappingTarget;

/// A handler whose declared path matches the request path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    class: NodeId,
    method: NodeId,
    specificity: Specificity,
}

impl Candidate {
    /// The handleable node of the class tree.
    pub fn class(&self) -> NodeId {
        self.class
    }

    /// The handleable node of the class's method tree.
    pub fn method(&self) -> NodeId {
        self.method
    }

    /// Which of the request segments were matched literally.
    pub fn specificity(&self) -> &Specificity {
        &self.specificity
    }
}

/// The candidates found for the current request, stored in `State` by the mapping resolve stage.
#[derive(Clone, Debug, Default)]
pub struct ResolvedMapping {
    candidates: Vec<Candidate>,
}

impl ResolvedMapping {
    pub(crate) fn new(candidates: Vec<Candidate>) -> Self {
        ResolvedMapping { candidates }
    }

    /// The matching candidates, in registration order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }
}

impl StateData for ResolvedMapping {}

/// Owns the class tree, and through it every method tree, once registration has finished.
pub struct Resolver {
    tree: Tree<ClassMapping>,
}

impl Resolver {
    pub(crate) fn new(tree: Tree<ClassMapping>) -> Self {
        Resolver { tree }
    }

    /// The class tree.
    pub fn tree(&self) -> &Tree<ClassMapping> {
        &self.tree
    }

    /// Finds every handler whose declared path matches `segments`.
    ///
    /// The class tree is walked first. Each handleable class node reached passes the remaining
    /// segments to its method tree, where a handleable node is a match only when every segment
    /// has been consumed. All branches are followed and the result is deduplicated.
    pub fn resolve(&self, segments: &[PercentDecoded]) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = Vec::new();

        self.tree.walk(segments, |class, consumed, class_specificity| {
            let mapping = match self.tree.node(class).mapping() {
                Some(mapping) => mapping,
                None => return,
            };

            let remaining = &segments[consumed..];
            mapping
                .methods()
                .walk(remaining, |method, method_consumed, method_specificity| {
                    if method_consumed != remaining.len() {
                        return;
                    }
                    if candidates
                        .iter()
                        .any(|c| c.class == class && c.method == method)
                    {
                        return;
                    }

                    let mut specificity = class_specificity.clone();
                    specificity.extend(method_specificity);
                    candidates.push(Candidate {
                        class,
                        method,
                        specificity,
                    });
                });
        });

        trace!(" resolved {} candidate(s)", candidates.len());
        candidates
    }

    /// The class mapping of a candidate.
    pub fn class(&self, candidate: &Candidate) -> &ClassMapping {
        self.class_node(candidate)
            .mapping()
            .expect("candidates refer to handleable class nodes")
    }

    /// The method mapping of a candidate.
    pub fn method(&self, candidate: &Candidate) -> &MethodMapping {
        self.class(candidate)
            .methods()
            .node(candidate.method)
            .mapping()
            .expect("candidates refer to handleable method nodes")
    }

    fn class_node(&self, candidate: &Candidate) -> &Node<ClassMapping> {
        self.tree.node(candidate.class)
    }

    /// Reconstructs the path variables of a candidate by walking from its method node up through
    /// the class tree, pairing segments with the request path from right to left.
    pub fn path_variables(&self, candidate: &Candidate, segments: &[PercentDecoded]) -> SegmentMapping {
        let methods = self.class(candidate).methods();
        let chain = methods
            .ancestry(candidate.method)
            .map(|n| (n.is_root_marker(), n.variable_name()))
            .chain(
                self.tree
                    .ancestry(candidate.class)
                    .map(|n| (n.is_root_marker(), n.variable_name())),
            );

        let mut variables = SegmentMapping::new();
        let mut index = segments.len();
        for (root_marker, variable) in chain {
            if root_marker {
                continue;
            }
            index = match index.checked_sub(1) {
                Some(index) => index,
                None => break,
            };
            if let Some(name) = variable {
                variables
                    .entry(name.to_owned())
                    .or_insert_with(|| segments[index].as_ref().to_owned());
            }
        }
        variables
    }

    /// Describes a candidate for diagnostics.
    pub fn describe(&self, candidate: &Candidate) -> MappingTarget {
        let class = self.class(candidate);
        let method = self.method(candidate);
        MappingTarget {
            class: class.descriptor().type_name(),
            method: method.name().to_owned(),
            verb: method.verb().clone(),
            parameters: method
                .parameters()
                .iter()
                .map(|p| p.declared_type().name())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::extractor::Arguments;
    use crate::helpers::http::request::path::RequestPathSegments;
    use crate::router::builder::build_simple_router;
    use crate::router::mapping::parameter;
    use crate::router::Router;

    #[derive(Default)]
    struct Users;

    impl Users {
        fn profile(&self, _args: Arguments) -> anyhow::Result<String> {
            Ok(String::new())
        }

        fn post(&self, _args: Arguments) -> anyhow::Result<String> {
            Ok(String::new())
        }

        fn any(&self, _args: Arguments) -> anyhow::Result<String> {
            Ok(String::new())
        }
    }

    fn router() -> Router {
        build_simple_router(|route| {
            route.class::<Users>("/users/{id}").restful().methods(|m| {
                m.get("/profile")
                    .param(parameter::path::<u32>("id"))
                    .to(Users::profile);
                m.get("/posts/{post}")
                    .param(parameter::path::<u32>("id"))
                    .param(parameter::path::<u32>("post"))
                    .to(Users::post);
                m.get("/{tab}").to(Users::any);
            });
        })
        .unwrap()
    }

    fn variables(router: &Router, path: &str) -> Vec<SegmentMapping> {
        let resolver = &router.data.resolver;
        let path = RequestPathSegments::new(path);
        resolver
            .resolve(path.segments())
            .iter()
            .map(|candidate| resolver.path_variables(candidate, path.segments()))
            .collect()
    }

    fn mapping(pairs: &[(&str, &str)]) -> SegmentMapping {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn class_variables_are_bound() {
        let router = router();
        let found = variables(&router, "/users/42/profile");

        assert!(found.contains(&mapping(&[("id", "42")])));
        assert!(found.contains(&mapping(&[("id", "42"), ("tab", "profile")])));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn class_and_method_variables_are_bound_together() {
        let router = router();
        assert_eq!(
            variables(&router, "/users/7/posts/19"),
            vec![mapping(&[("id", "7"), ("post", "19")])]
        );
    }

    #[test]
    fn unmatched_paths_resolve_to_nothing() {
        let router = router();
        let resolver = &router.data.resolver;
        assert!(resolver
            .resolve(RequestPathSegments::new("/users/42").segments())
            .is_empty());
        assert!(resolver
            .resolve(RequestPathSegments::new("/people/42/profile").segments())
            .is_empty());
    }

    #[test]
    fn resolution_is_repeatable() {
        let router = router();
        let resolver = &router.data.resolver;
        let path = RequestPathSegments::new("/users/42/profile");

        let first = resolver.resolve(path.segments());
        for _ in 0..3 {
            assert_eq!(resolver.resolve(path.segments()), first);
        }
        assert_eq!(router.resolve("/users/42/profile"), router.resolve("/users/42/profile"));
    }
}
