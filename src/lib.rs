//! Client core for the money-manager web API.
//!
//! ARCHITECTURE
//! ============
//! - `session`: the single owner of "who is signed in", backed by durable
//!   key/value storage.
//! - `routes`: the route table, the guard that decides render vs redirect,
//!   and a navigator that keeps history consistent with those decisions.
//! - `gateway`: every HTTP call; attaches the bearer credential and turns a
//!   401 into a session invalidation plus a `GatewayEvent`.
//! - `api`: typed endpoint operations and wire types on top of the gateway.
//! - `config`: environment-driven settings shared by all of the above.
//!
//! The session store is shared as `Arc<SessionStore>`; nothing else reads or
//! writes session storage directly.

pub mod api;
pub mod config;
pub mod gateway;
pub mod routes;
pub mod session;

pub use api::{ApiError, MoneyApi};
pub use config::ClientConfig;
pub use gateway::{Gateway, GatewayError, GatewayEvent};
pub use routes::{GuardDecision, Navigation, Navigator, Route, RouteGuard};
pub use session::{Session, SessionStore, User};
