//! Dashboard locations and the guard that keeps the session on the right
//! side of the login page.
//!
//! The guard is a pure function of session state and location. It is invoked
//! synchronously on every session transition, and again whenever the
//! location changes, and answers with a `Navigation`.

use std::fmt;

use thiserror::Error;

use crate::auth::SessionState;

/// A location in the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Public landing page hosting the login/registration forms
    Landing,
    Dashboard,
    Incidents,
    Flagged,
    Log,
    Settings,
    Players,
    Player(String),
    Session(String),
    /// Any other path. Treated as protected.
    Other(String),
}

impl Route {
    /// Parse a path such as `/players/42`. Query strings, fragments and
    /// trailing slashes are ignored.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Landing,
            ["dashboard"] => Route::Dashboard,
            ["incidents"] => Route::Incidents,
            ["flagged"] => Route::Flagged,
            ["log"] => Route::Log,
            ["settings"] => Route::Settings,
            ["players"] => Route::Players,
            ["players", id] => Route::Player((*id).to_string()),
            ["sessions", id] => Route::Session((*id).to_string()),
            _ => Route::Other(format!("/{}", segments.join("/"))),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Landing => "/".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Incidents => "/incidents".to_string(),
            Route::Flagged => "/flagged".to_string(),
            Route::Log => "/log".to_string(),
            Route::Settings => "/settings".to_string(),
            Route::Players => "/players".to_string(),
            Route::Player(id) => format!("/players/{}", id),
            Route::Session(id) => format!("/sessions/{}", id),
            Route::Other(path) => path.clone(),
        }
    }

    /// Everything but the landing page requires a session
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Landing)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Outcome of a guard evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Stay,
    Redirect(Route),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RouteGuardError {
    #[error("Landing route {0} must be public")]
    ProtectedLanding(Route),

    #[error("Home route {0} must be protected")]
    PublicHome(Route),
}

/// Redirect policy between the public landing page and the protected views.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    landing: Route,
    home: Route,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self {
            landing: Route::Landing,
            home: Route::Dashboard,
        }
    }
}

impl RouteGuard {
    /// `landing` must be public and `home` protected, otherwise an
    /// authenticated session would be redirected back and forth.
    pub fn new(landing: Route, home: Route) -> Result<Self, RouteGuardError> {
        if landing.is_protected() {
            return Err(RouteGuardError::ProtectedLanding(landing));
        }
        if !home.is_protected() {
            return Err(RouteGuardError::PublicHome(home));
        }
        Ok(Self { landing, home })
    }

    /// Evaluate a session state change at `location`.
    pub fn on_transition(
        &self,
        previous: SessionState,
        current: SessionState,
        location: &Route,
    ) -> Navigation {
        if previous == current {
            return Navigation::Stay;
        }
        self.check(current, location)
    }

    /// Evaluate `location` under a settled session state.
    ///
    /// Nothing is decided while the session is still initializing, so a
    /// returning user is never bounced to the login page on startup.
    pub fn check(&self, state: SessionState, location: &Route) -> Navigation {
        match state {
            SessionState::Initializing => Navigation::Stay,
            SessionState::Authenticated if *location == self.landing => {
                Navigation::Redirect(self.home.clone())
            }
            SessionState::Unauthenticated if location.is_protected() => {
                Navigation::Redirect(self.landing.clone())
            }
            _ => Navigation::Stay,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
