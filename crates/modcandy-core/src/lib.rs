//! Core library for the Modcandy moderation dashboard client.
//!
//! Provides the session store and its durable token storage, the credential
//! exchange against the Modcandy account API, the route guard that decides
//! redirects between public and protected locations, and the authorized
//! data API used by the dashboard views.

pub mod api;
pub mod auth;
pub mod config;
pub mod controller;
pub mod models;
pub mod router;

pub use api::{ApiClient, ApiError, Endpoints};
pub use auth::{AuthError, Credentials, SessionState, SessionStore, TokenStore};
pub use config::Config;
pub use controller::SessionController;
pub use router::{Navigation, Route, RouteGuard, RouteGuardError};
