//! Navigation history driven by guard decisions.
//!
//! DESIGN
//! ======
//! `Navigator` keeps a stack of rendered routes. Redirects never leave an
//! entry behind for the location that was redirected away from, so going
//! back can never land on `/` or on a protected view that was refused.
//! User hydration runs on the blocking pool and is handed back as a
//! `JoinHandle`; rendering does not wait for it.
//!
//! The gateway reports invalid sessions as `GatewayEvent`s; the navigator
//! turns each into a replace-navigation to the login entry point.

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;

use super::{GuardDecision, Route, RouteGuard};
use crate::gateway::GatewayEvent;
use crate::session::{SessionStore, User};

#[cfg(test)]
#[path = "navigator_test.rs"]
mod tests;

/// Upper bound on chained redirects for a single navigation.
const MAX_REDIRECTS: usize = 4;

/// Result of one navigation.
#[derive(Debug)]
pub enum Navigation {
    Rendered {
        route: Route,
        /// Present when the guard asked for the user profile to be reloaded.
        hydration: Option<JoinHandle<Option<User>>>,
    },
    NotFound {
        location: String,
    },
}

impl Navigation {
    #[must_use]
    pub fn route(&self) -> Option<Route> {
        match self {
            Self::Rendered { route, .. } => Some(*route),
            Self::NotFound { .. } => None,
        }
    }
}

#[derive(Debug)]
pub struct Navigator {
    guard: RouteGuard,
    session: Arc<SessionStore>,
    history: Vec<Route>,
    // Set once a server 401 has actually ended a session.
    session_expired: bool,
}

impl Navigator {
    #[must_use]
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { guard: RouteGuard::new(Arc::clone(&session)), session, history: Vec::new(), session_expired: false }
    }

    /// Whether a gateway event reported that the server ended the session.
    /// A rejected login on an exempt path does not count.
    #[must_use]
    pub fn session_expired(&self) -> bool {
        self.session_expired
    }

    #[must_use]
    pub fn current(&self) -> Option<Route> {
        self.history.last().copied()
    }

    #[must_use]
    pub fn history(&self) -> &[Route] {
        &self.history
    }

    /// Navigate to `location`, adding a history entry.
    ///
    /// Must run inside a Tokio runtime: user hydration is spawned on the
    /// blocking pool.
    pub fn navigate(&mut self, location: &str) -> Navigation {
        self.resolve(location, false)
    }

    /// Navigate to `location`, replacing the current history entry.
    pub fn replace(&mut self, location: &str) -> Navigation {
        self.resolve(location, true)
    }

    /// Replace-navigate to the login entry point.
    pub fn force_login(&mut self) -> Navigation {
        tracing::info!("redirecting to login");
        self.replace(Route::LOGIN_ENTRY.path())
    }

    /// Leave the current entry and re-enter the previous one through the
    /// guard. Returns `None` when there is nothing to go back to.
    pub fn back(&mut self) -> Option<Navigation> {
        if self.history.len() < 2 {
            return None;
        }
        self.history.pop();
        let previous = self.current()?;
        Some(self.replace(previous.path()))
    }

    /// Apply one gateway event.
    pub fn handle_event(&mut self, event: &GatewayEvent) -> Navigation {
        match event {
            GatewayEvent::SessionInvalidated { path, cleared } => {
                tracing::warn!(%path, cleared, "session invalidated by server");
                self.session_expired |= *cleared;
                self.force_login()
            }
        }
    }

    /// Drive `navigator` from gateway events until the gateway is dropped.
    pub async fn follow_invalidations(navigator: Arc<Mutex<Self>>, mut events: broadcast::Receiver<GatewayEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    navigator.lock().await.handle_event(&event);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "missed gateway events; forcing login");
                    let mut nav = navigator.lock().await;
                    nav.session_expired |= !nav.session.is_authenticated();
                    nav.force_login();
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    fn resolve(&mut self, location: &str, replace: bool) -> Navigation {
        let mut decision = self.guard.evaluate(location);
        for _ in 0..MAX_REDIRECTS {
            let GuardDecision::Redirect { to, .. } = decision else {
                break;
            };
            tracing::debug!(%location, %to, "redirecting");
            decision = self.guard.evaluate_route(to);
        }

        match decision {
            GuardDecision::Render { route, hydrate_user } => {
                if replace {
                    self.history.pop();
                }
                self.history.push(route);
                let hydration = hydrate_user.then(|| self.spawn_hydration());
                Navigation::Rendered { route, hydration }
            }
            GuardDecision::NotFound | GuardDecision::Redirect { .. } => {
                tracing::warn!(%location, "no view for location");
                Navigation::NotFound { location: location.to_owned() }
            }
        }
    }

    fn spawn_hydration(&self) -> JoinHandle<Option<User>> {
        let session = Arc::clone(&self.session);
        tokio::task::spawn_blocking(move || session.hydrate_user())
    }
}
