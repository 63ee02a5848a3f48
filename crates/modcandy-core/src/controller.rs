//! The session controller ties the session store, the credential exchange
//! and the route guard together.
//!
//! It is constructed explicitly and handed to the front end. Every change of
//! session state runs the guard synchronously with the previous state, the
//! new state and the current location, and the resulting redirect is applied
//! before the call returns.

use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::auth::{AuthError, Credentials, SessionState, SessionStore, TokenStore};
use crate::router::{Navigation, Route, RouteGuard};

pub struct SessionController {
    session: SessionStore,
    api: ApiClient,
    guard: RouteGuard,
    location: Route,
}

impl SessionController {
    /// Create a controller positioned at `location`. Nothing is read from
    /// storage until `initialize` is called.
    pub fn new(api: ApiClient, store: Box<dyn TokenStore>, location: Route) -> Self {
        Self {
            session: SessionStore::new(store),
            api,
            guard: RouteGuard::default(),
            location,
        }
    }

    pub fn with_guard(mut self, guard: RouteGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Rehydrate the session, then run the first guard evaluation.
    pub fn initialize(&mut self) -> Navigation {
        let previous = self.session.state();
        self.session.initialize();
        if let Some(token) = self.session.token() {
            self.api.set_token(token.to_string());
        }
        self.transition(previous)
    }

    /// Log in and adopt the returned token.
    ///
    /// On failure the session is left exactly as it was.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<Navigation, AuthError> {
        let previous = self.session.state();
        let auth = self.api.login(credentials).await?;
        if let Some(expires_at) = auth.expires_at() {
            debug!(%expires_at, "Token expiry reported by server");
        }
        self.adopt_token(&auth.token)?;
        info!("Login successful");
        Ok(self.transition(previous))
    }

    /// Register a new account and adopt its token.
    ///
    /// The caller must have checked the password confirmation; see
    /// `register_confirmed` for the checked variant.
    pub async fn register(&mut self, credentials: &Credentials) -> Result<Navigation, AuthError> {
        let previous = self.session.state();
        let registered = self.api.register(credentials).await?;
        self.adopt_token(&registered.token)?;
        info!("Registration successful");
        Ok(self.transition(previous))
    }

    /// Register after checking that `confirmation` repeats the password.
    /// A mismatch fails without contacting the server.
    pub async fn register_confirmed(
        &mut self,
        credentials: &Credentials,
        confirmation: &str,
    ) -> Result<Navigation, AuthError> {
        if !credentials.confirms(confirmation) {
            return Err(AuthError::PasswordMismatch);
        }
        self.register(credentials).await
    }

    /// End the session.
    ///
    /// The redirect is applied even if removing the persisted token fails;
    /// that failure is logged.
    pub fn logout(&mut self) -> Navigation {
        let previous = self.session.state();
        if let Err(e) = self.session.clear_session() {
            warn!(error = %e, "Failed to remove persisted session");
        }
        self.api.clear_token();
        self.transition(previous)
    }

    /// Move to `route`, subject to the guard. Returns where we ended up.
    pub fn navigate(&mut self, route: Route) -> &Route {
        self.location = route;
        if let Navigation::Redirect(target) = self.guard.check(self.session.state(), &self.location) {
            debug!(from = %self.location, to = %target, "Navigation redirected");
            self.location = target;
        }
        &self.location
    }

    pub fn location(&self) -> &Route {
        &self.location
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn token(&self) -> Option<&str> {
        self.session.token()
    }

    /// Client carrying the session token, for the protected views
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Store the token in the session and on the API client.
    ///
    /// A persistence failure does not undo the login for this run; the token
    /// just will not survive a restart.
    fn adopt_token(&mut self, token: &str) -> Result<(), AuthError> {
        match self.session.set_session(token) {
            Ok(()) => {}
            Err(AuthError::Storage(e)) => {
                warn!(error = %e, "Failed to persist session token");
            }
            Err(e) => return Err(e),
        }
        self.api.set_token(token.to_string());
        Ok(())
    }

    fn transition(&mut self, previous: SessionState) -> Navigation {
        let current = self.session.state();
        let navigation = self.guard.on_transition(previous, current, &self.location);
        if let Navigation::Redirect(ref target) = navigation {
            info!(?previous, ?current, from = %self.location, to = %target, "Session change redirect");
            self.location = target.clone();
        }
        navigation
    }
}
