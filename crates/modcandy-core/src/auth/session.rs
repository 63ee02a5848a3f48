use tracing::{debug, info, warn};

use super::{AuthError, TokenStore};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed but not yet rehydrated from durable storage
    Initializing,
    Unauthenticated,
    Authenticated,
}

/// Single source of truth for whether this client is logged in, and with
/// which token.
///
/// `authenticated` is derived from the token rather than stored, so it is
/// true exactly when a non-empty token is held.
pub struct SessionStore {
    store: Box<dyn TokenStore>,
    token: Option<String>,
    initialized: bool,
}

impl SessionStore {
    pub fn new(store: Box<dyn TokenStore>) -> Self {
        Self {
            store,
            token: None,
            initialized: false,
        }
    }

    /// Rehydrate from durable storage. Never touches the network.
    ///
    /// A storage read failure is logged and treated as "no token" so a broken
    /// session file cannot stop the client from starting.
    pub fn initialize(&mut self) -> SessionState {
        self.token = match self.store.load() {
            Ok(Some(token)) if !token.is_empty() => Some(token),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session, starting logged out");
                None
            }
        };
        self.initialized = true;
        debug!(authenticated = self.is_authenticated(), "Session initialized");
        self.state()
    }

    /// Adopt a freshly issued token and persist it.
    ///
    /// Empty tokens are rejected and leave the store untouched. If persisting
    /// fails the in-memory session is still set for this run and the storage
    /// error is returned.
    pub fn set_session(&mut self, token: &str) -> Result<(), AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidResponse("empty token".to_string()));
        }
        self.token = Some(token.to_string());
        self.initialized = true;
        info!("Session established");
        self.store.save(token).map_err(AuthError::Storage)
    }

    /// Forget the token in memory and in durable storage.
    ///
    /// The in-memory session is always cleared; a failure to remove the
    /// persisted value is returned afterwards.
    pub fn clear_session(&mut self) -> Result<(), AuthError> {
        self.token = None;
        info!("Session cleared");
        self.store.remove().map_err(AuthError::Storage)
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().map(|t| !t.is_empty()).unwrap_or(false)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn state(&self) -> SessionState {
        if !self.initialized {
            SessionState::Initializing
        } else if self.is_authenticated() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
