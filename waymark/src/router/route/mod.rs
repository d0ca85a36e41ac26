//! Defines the candidate `Route` and the dispatch adapter that selects and invokes one.
//!
//! The mapping resolve stage finds every handler whose path matches the request. Each becomes a
//! `Route` here, carrying its effective attributes, and is asked through `Route::is_match`
//! whether it accepts the request. The dispatch adapter then chooses among the routes that do.

pub mod dispatch;
pub mod matcher;

use mime::Mime;

pub use self::dispatch::DispatchAdapter;

use crate::router::config::RouterConfig;
use crate::router::mapping::{effective, ClassMapping, MappingAttributes, MethodMapping};
use crate::router::non_match::RouteNonMatch;
use crate::router::resolver::{Candidate, Resolver};
use crate::router::route::matcher::{
    AcceptHeaderRouteMatcher, AndRouteMatcher, ContentTypeHeaderRouteMatcher,
    MethodOnlyRouteMatcher, RouteMatcher,
};
use crate::state::State;

/// A candidate handler with its effective attributes resolved against its class and the router
/// configuration.
pub struct Route<'a> {
    candidate: &'a Candidate,
    class: &'a ClassMapping,
    method: &'a MethodMapping,
    restful: bool,
    consume: Mime,
    produce: Mime,
}

impl<'a> Route<'a> {
    pub(crate) fn new(resolver: &'a Resolver, candidate: &'a Candidate, config: &RouterConfig) -> Self {
        let class = resolver.class(candidate);
        let method = resolver.method(candidate);

        let restful = effective(method.restful(), class.restful(), config.default_restful());
        let consume = effective(method.consume(), class.consume(), config.default_consume());
        let default_produce = if restful {
            config.default_restful_produce()
        } else {
            config.default_page_produce()
        };
        let produce = effective(method.produce(), class.produce(), default_produce);

        Route {
            candidate,
            class,
            method,
            restful,
            consume: consume.clone(),
            produce: produce.clone(),
        }
    }

    /// Determines if this route accepts the request: the verb must match, the request body must
    /// have the consumed type, and the client must accept the produced type.
    pub fn is_match(&self, state: &State) -> Result<(), RouteNonMatch> {
        AndRouteMatcher::new(
            AndRouteMatcher::new(
                MethodOnlyRouteMatcher::new(vec![self.method.verb().clone()]),
                ContentTypeHeaderRouteMatcher::new(self.consume.clone()),
            ),
            AcceptHeaderRouteMatcher::new(self.produce.clone()),
        )
        .is_match(state)
    }

    /// The resolved candidate.
    pub fn candidate(&self) -> &'a Candidate {
        self.candidate
    }

    /// The class mapping.
    pub fn class(&self) -> &'a ClassMapping {
        self.class
    }

    /// The method mapping.
    pub fn method(&self) -> &'a MethodMapping {
        self.method
    }

    /// Whether the result is serialized directly.
    pub fn restful(&self) -> bool {
        self.restful
    }

    /// The media type the request body must have.
    pub fn consume(&self) -> &Mime {
        &self.consume
    }

    /// The media type of the response.
    pub fn produce(&self) -> &Mime {
        &self.produce
    }
}
