//! Data models for the Modcandy API.
//!
//! Only the account exchange types are modelled field by field:
//!
//! - `AuthResponse`, `AuthUser`, `RegisterResponse`: credential exchange
//! - `Page`, `IncidentFilter`: incident listing envelope and query
//! - `CreatedApiKey`: response to API key creation
//!
//! Incidents, messages, player statistics and credit usage are passed
//! through as opaque `serde_json::Value` payloads.

pub mod account;
pub mod incident;

pub use account::{AuthResponse, AuthUser, CreatedApiKey, RegisterResponse};
pub use incident::{IncidentFilter, Page};
