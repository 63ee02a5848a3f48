//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `SessionStore`: the in-memory token and authenticated flag, rehydrated
//!   from and persisted to durable storage
//! - `TokenStore`: durable storage backends (file, OS keychain, memory)
//! - `Credentials`: the transient email/password pair
//! - `AuthError`: failures surfaced by login and registration
//!
//! The token lives under the `authToken` key and has no client-side expiry.

pub mod credentials;
pub mod error;
pub mod session;
pub mod store;

pub use credentials::Credentials;
pub use error::AuthError;
pub use session::{SessionState, SessionStore};
pub use store::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
