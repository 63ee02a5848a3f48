//! REST API client module for the Modcandy backend.
//!
//! This module provides the `ApiClient` for the account API (login,
//! registration, API keys, credit) and the analyzer API (incidents,
//! messages, player statistics).
//!
//! Authorized requests present the session token as
//! `Authorization: token <value>`.

pub mod client;
pub mod error;

pub use client::{ApiClient, Endpoints};
pub use error::ApiError;
