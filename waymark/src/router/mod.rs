//! Defines the `Router` and supporting types.

pub mod builder;
pub mod config;
pub mod instance;
pub mod mapping;
pub mod non_match;
pub mod resolver;
pub mod route;
pub mod tree;

use std::pin::Pin;
use std::sync::Arc;

use futures_util::future::{self, FutureExt, TryFutureExt};
use log::trace;

pub use self::config::RouterConfig;

use crate::convert::ConverterRegistry;
use crate::handler::{Handler, HandlerError, HandlerFuture, IntoResponse, NewHandler};
use crate::helpers::http::request::path::RequestPathSegments;
use crate::middleware::{Encoding, MappingResolve, Middleware, Upload, ViewRender};
use crate::pipeline::{new_pipeline, Endpoint, Pipeline};
use crate::router::instance::InstanceRegistry;
use crate::router::resolver::Resolver;
use crate::router::route::DispatchAdapter;
use crate::state::{request_id, State};
use crate::view::{MappingTarget, Renderer};

/// Everything a `Router` shares between requests once building has finished.
pub(crate) struct RouterData {
    pub(crate) resolver: Resolver,
    pub(crate) config: RouterConfig,
    pub(crate) converters: ConverterRegistry,
    pub(crate) registry: Arc<dyn InstanceRegistry>,
    pub(crate) renderer: Option<Arc<dyn Renderer>>,
}

/// Responsible for dispatching HTTP requests to the controllers declared when it was built.
///
/// Each request passes through the view render, mapping resolve, encoding and upload stages,
/// then any application `Middleware`, before the dispatch adapter invokes the chosen handler.
///
/// Cloning a `Router` is cheap. Clones share the mapping trees and the controller singletons.
#[derive(Clone)]
pub struct Router {
    data: Arc<RouterData>,
    pipeline: Pipeline,
    endpoint: Endpoint,
}

impl NewHandler for Router {
    type Instance = Router;

    // Creates a new Router instance to route new HTTP requests
    fn new_handler(&self) -> anyhow::Result<Self::Instance> {
        trace!(" cloning instance");
        Ok(self.clone())
    }
}

impl Handler for Router {
    fn handle(self, state: State) -> Pin<Box<HandlerFuture>> {
        trace!("[{}] starting", request_id(&state));

        self.pipeline
            .call(state, self.endpoint.clone())
            .or_else(|(state, err)| {
                trace!(
                    "[{}] converting error into http response \
                     during finalization: {:?}",
                    request_id(&state),
                    err
                );
                let response = err.into_response(&state);
                future::ok::<_, (State, HandlerError)>((state, response))
            })
            .boxed()
    }
}

impl Router {
    pub(crate) fn new(data: RouterData, middleware: Vec<Arc<dyn Middleware>>) -> Router {
        let data = Arc::new(data);

        let mut pipeline = new_pipeline()
            .add(ViewRender::new(data.clone()))
            .add(MappingResolve::new(data.clone()))
            .add(Encoding::new(data.config.default_charset()))
            .add(Upload);
        for m in middleware {
            pipeline = pipeline.add_shared(m);
        }

        Router {
            endpoint: DispatchAdapter::new(data.clone()).into_endpoint(),
            pipeline: pipeline.build(),
            data,
        }
    }

    /// The configuration the router was built with.
    pub fn config(&self) -> &RouterConfig {
        &self.data.config
    }

    /// The names of the stages each request passes through, outermost first.
    pub fn stages(&self) -> Vec<&'static str> {
        self.pipeline.names()
    }

    /// Describes every handler whose declared path matches `path`, regardless of verb and media
    /// types.
    pub fn resolve(&self, path: &str) -> Vec<MappingTarget> {
        let path = RequestPathSegments::new(path);
        self.data
            .resolver
            .resolve(path.segments())
            .iter()
            .map(|candidate| self.data.resolver.describe(candidate))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use hyper::Method;

    use crate::extractor::Arguments;
    use crate::router::builder::build_simple_router;

    #[derive(Default)]
    struct Users;

    impl Users {
        fn list(&self, _args: Arguments) -> anyhow::Result<Vec<String>> {
            Ok(vec![])
        }

        fn show(&self, _args: Arguments) -> anyhow::Result<String> {
            Ok(String::new())
        }

        fn me(&self, _args: Arguments) -> anyhow::Result<String> {
            Ok(String::new())
        }
    }

    fn router() -> Router {
        build_simple_router(|route| {
            route.class::<Users>("/users").restful().methods(|m| {
                m.get("").to(Users::list);
                m.get("/{id}").to(Users::show);
                m.get("/me").to(Users::me);
            });
        })
        .unwrap()
    }

    #[test]
    fn stages_are_ordered() {
        assert_eq!(
            router().stages(),
            vec!["render", "mapping", "encoding", "upload"]
        );
    }

    #[test]
    fn resolve_lists_every_matching_handler() {
        let router = router();

        let targets = router.resolve("/users");
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].method, "list");
        assert_eq!(targets[0].verb, Method::GET);

        let mut names: Vec<String> = router
            .resolve("/users/me")
            .into_iter()
            .map(|t| t.method)
            .collect();
        names.sort();
        assert_eq!(names, vec!["me", "show"]);

        assert!(router.resolve("/accounts").is_empty());
    }

    #[test]
    fn routers_are_new_handlers() {
        fn spawn<T: NewHandler>(factory: &T) -> anyhow::Result<T::Instance> {
            factory.new_handler()
        }

        let router = router();
        let handler = spawn(&router).unwrap();
        assert_eq!(handler.stages(), router.stages());
        assert_eq!(handler.resolve("/users/me").len(), 2);
    }
}
