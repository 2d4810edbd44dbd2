//! Route table, navigation guard and history.
//!
//! SYSTEM CONTEXT
//! ==============
//! Views are addressed by path. Each route is public, protected (requires a
//! session token) or redirect-only (`/`). The guard turns a requested path
//! into a render or redirect decision; the navigator applies those decisions
//! to a history stack and reacts to gateway invalidation events.

pub mod guard;
pub mod navigator;

pub use guard::{GuardDecision, RouteGuard};
pub use navigator::{Navigation, Navigator};

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

/// Access requirement of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
    RedirectOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    Signup,
    Dashboard,
    Income,
    Expense,
    Category,
    Filter,
}

impl Route {
    pub const ALL: [Self; 8] = [
        Self::Root,
        Self::Login,
        Self::Signup,
        Self::Dashboard,
        Self::Income,
        Self::Expense,
        Self::Category,
        Self::Filter,
    ];

    /// Entry point for unauthenticated users.
    pub const LOGIN_ENTRY: Self = Self::Login;
    /// Main view for authenticated users.
    pub const HOME: Self = Self::Dashboard;

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Root => "/",
            Self::Login => "/login",
            Self::Signup => "/signup",
            Self::Dashboard => "/dashboard",
            Self::Income => "/income",
            Self::Expense => "/expense",
            Self::Category => "/category",
            Self::Filter => "/filter",
        }
    }

    #[must_use]
    pub fn access(self) -> Access {
        match self {
            Self::Root => Access::RedirectOnly,
            Self::Login | Self::Signup => Access::Public,
            Self::Dashboard | Self::Income | Self::Expense | Self::Category | Self::Filter => Access::Protected,
        }
    }

    /// Resolve a location to a route. Matching ignores ASCII case, query
    /// strings, fragments and a trailing slash.
    #[must_use]
    pub fn parse(location: &str) -> Option<Self> {
        let path = location.split(['?', '#']).next().unwrap_or_default().trim();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Self::ALL.into_iter().find(|route| route.path().eq_ignore_ascii_case(path))
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}
