//! Route guard: decides whether a requested view renders or redirects.
//!
//! The guard reads exactly one session snapshot per evaluation and uses
//! `Session::is_authenticated` (token presence) as its only predicate. A
//! missing user profile never blocks rendering; it only asks the caller to
//! hydrate.

use std::sync::Arc;

use super::{Access, Route};
use crate::session::SessionStore;

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show the view. `hydrate_user` asks for the profile to be reloaded
    /// from storage in the background.
    Render { route: Route, hydrate_user: bool },
    /// Go elsewhere, replacing the current history entry when `replace`.
    Redirect { to: Route, replace: bool },
    NotFound,
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    session: Arc<SessionStore>,
}

impl RouteGuard {
    #[must_use]
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    /// Evaluate a raw location string.
    #[must_use]
    pub fn evaluate(&self, location: &str) -> GuardDecision {
        match Route::parse(location) {
            Some(route) => self.evaluate_route(route),
            None => GuardDecision::NotFound,
        }
    }

    #[must_use]
    pub fn evaluate_route(&self, route: Route) -> GuardDecision {
        let session = self.session.snapshot();
        let decision = match route.access() {
            Access::Public => GuardDecision::Render { route, hydrate_user: false },
            Access::RedirectOnly => {
                let to = if session.is_authenticated() { Route::HOME } else { Route::LOGIN_ENTRY };
                GuardDecision::Redirect { to, replace: true }
            }
            Access::Protected if session.is_authenticated() => {
                GuardDecision::Render { route, hydrate_user: session.user.is_none() }
            }
            Access::Protected => GuardDecision::Redirect { to: Route::LOGIN_ENTRY, replace: true },
        };
        tracing::debug!(%route, ?decision, "route guard evaluated");
        decision
    }
}
