use crate::router::non_match::RouteNonMatch;
use crate::router::route::matcher::RouteMatcher;
use crate::state::State;

/// Chains two matchers. `second` is consulted only once `first` has accepted the request, so a
/// rejection always comes from the earliest failing filter.
#[derive(Clone)]
pub struct AndRouteMatcher<T, U> {
    first: T,
    second: U,
}

impl<T, U> AndRouteMatcher<T, U>
where
    T: RouteMatcher,
    U: RouteMatcher,
{
    /// Chains `first` and `second`.
    pub fn new(first: T, second: U) -> Self {
        AndRouteMatcher { first, second }
    }
}

impl<T, U> RouteMatcher for AndRouteMatcher<T, U>
where
    T: RouteMatcher,
    U: RouteMatcher,
{
    fn is_match(&self, state: &State) -> Result<(), RouteNonMatch> {
        self.first.is_match(state)?;
        self.second.is_match(state)
    }
}
