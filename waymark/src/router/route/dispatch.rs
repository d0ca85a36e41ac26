//! Defines the `DispatchAdapter`, the innermost handler of the router's pipeline.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use futures_util::future::{self, FutureExt};
use hyper::StatusCode;
use log::{debug, error, trace};

use crate::extractor::{Binder, ResponseHeaders};
use crate::helpers::http::request::path::RequestPathSegments;
use crate::helpers::http::response::create_empty_response;
use crate::middleware::render::render;
use crate::middleware::ErrorDispatch;
use crate::pipeline::Endpoint;
use crate::router::non_match::RouteNonMatch;
use crate::router::resolver::ResolvedMapping;
use crate::router::route::Route;
use crate::router::RouterData;
use crate::state::{request_id, State};
use crate::view::{Model, PageView, RestfulView, View};

/// Chooses one of the candidates resolved for a request, binds its parameters, invokes it and
/// turns the outcome into a `View`.
///
/// The `View` is left in `State` for the view render stage. Requests flagged with
/// `ErrorDispatch` bypass that stage, so their `View` is rendered here.
#[derive(Clone)]
pub struct DispatchAdapter {
    data: Arc<RouterData>,
}

impl DispatchAdapter {
    pub(crate) fn new(data: Arc<RouterData>) -> Self {
        DispatchAdapter { data }
    }

    /// Wraps the adapter as the endpoint of a `Pipeline`.
    pub(crate) fn into_endpoint(self) -> Endpoint {
        Arc::new(move |mut state: State| {
            let view = self.dispatch(&mut state);

            let response = if ErrorDispatch::is_set(&state) {
                render(&state, view, &self.data)
            } else {
                state.put(view);
                create_empty_response(&state, StatusCode::OK)
            };

            future::ok((state, response)).boxed()
        })
    }

    /// Produces the `View` for the request held in `state`.
    pub fn dispatch(&self, state: &mut State) -> View {
        let data = &*self.data;
        let resolved = match state.try_take::<ResolvedMapping>() {
            Some(resolved) => resolved,
            None => {
                let segments = state
                    .try_borrow::<RequestPathSegments>()
                    .map(|path| path.segments().to_vec())
                    .unwrap_or_default();
                ResolvedMapping::new(data.resolver.resolve(&segments))
            }
        };

        let mut rejection: Option<RouteNonMatch> = None;
        let mut survivors = Vec::new();
        for candidate in resolved.candidates() {
            let route = Route::new(&data.resolver, candidate, &data.config);
            match route.is_match(state) {
                Ok(()) => survivors.push(route),
                Err(non_match) => {
                    debug!(
                        "[{}] {} rejected the request: {}",
                        request_id(state),
                        data.resolver.describe(candidate),
                        non_match
                    );
                    rejection = Some(match rejection {
                        Some(previous) => previous.union(non_match),
                        None => non_match,
                    });
                }
            }
        }

        let route = match select(survivors) {
            Selection::None => {
                match rejection {
                    Some(rejection) => debug!(
                        "[{}] every candidate rejected the request, closest: {}",
                        request_id(state),
                        rejection
                    ),
                    None => debug!("[{}] no handler is mapped to the path", request_id(state)),
                }
                return View::NotFound;
            }
            Selection::Conflict(routes) => {
                let targets: Vec<_> = routes
                    .iter()
                    .map(|route| data.resolver.describe(route.candidate()))
                    .collect();
                error!(
                    "[{}] {} handlers match the request equally well",
                    request_id(state),
                    targets.len()
                );
                return View::Conflict(targets);
            }
            Selection::One(route) => route,
        };

        let target = data.resolver.describe(route.candidate());
        trace!("[{}] dispatching to {}", request_id(state), target);

        let instance = match route.class().instance(&*data.registry) {
            Ok(instance) => instance,
            Err(e) => {
                error!(
                    "[{}] unable to create {}: {:#}",
                    request_id(state),
                    target.class,
                    e
                );
                return View::InternalException(e);
            }
        };

        let segments = state
            .try_borrow::<RequestPathSegments>()
            .map(|path| path.segments().to_vec())
            .unwrap_or_default();
        let variables = data.resolver.path_variables(route.candidate(), &segments);

        if !state.has::<ResponseHeaders>() {
            state.put(ResponseHeaders::new());
        }

        let arguments = {
            let mut binder = Binder::new(
                state,
                &variables,
                &data.converters,
                data.config.strict_binding(),
            );
            match binder.bind_all(route.method().parameters()) {
                Ok(arguments) => arguments,
                Err(e) => {
                    debug!("[{}] rejecting request: {}", request_id(state), e);
                    return View::BadRequest(e);
                }
            }
        };

        let model = match catch_unwind(AssertUnwindSafe(|| {
            route.method().invoke(instance, arguments)
        })) {
            Ok(Ok(model)) => model,
            Ok(Err(e)) => {
                error!("[{}] {} failed: {:#}", request_id(state), target, e);
                return View::InternalException(e);
            }
            Err(panic) => {
                let message = panic_message(&*panic);
                error!("[{}] {} panicked: {}", request_id(state), target, message);
                return View::InternalException(anyhow::anyhow!(
                    "{} panicked: {}",
                    target,
                    message
                ));
            }
        };

        if route.restful() {
            View::Restful(RestfulView::new(route.produce().clone(), model))
        } else if let Some(template) = route.method().template() {
            View::Page(PageView::new(
                route.produce().clone(),
                template.to_owned(),
                Some(model),
            ))
        } else if let Model::String(template) = model {
            View::Page(PageView::new(route.produce().clone(), template, None))
        } else {
            debug!("[{}] {} named no template", request_id(state), target);
            View::NoViewTemplate
        }
    }
}

enum Selection<'a> {
    None,
    One(Route<'a>),
    Conflict(Vec<Route<'a>>),
}

/// Literal segments are preferred over variables. Routes left tied on specificity conflict.
fn select(mut routes: Vec<Route<'_>>) -> Selection<'_> {
    let most_specific = match routes.iter().map(|r| r.candidate().specificity()).max() {
        Some(specificity) => specificity.clone(),
        None => return Selection::None,
    };
    routes.retain(|r| *r.candidate().specificity() == most_specific);

    if routes.len() == 1 {
        routes.pop().map(Selection::One).unwrap_or(Selection::None)
    } else {
        Selection::Conflict(routes)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "(non-string panic payload)".to_owned()
    }
}
