use thiserror::Error;

/// Failures from the credential exchange and session persistence.
///
/// None of these are fatal: the session simply stays unauthenticated and the
/// caller may try again.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Registration failed")]
    RegistrationFailed,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Session storage error: {0:#}")]
    Storage(#[source] anyhow::Error),
}

impl AuthError {
    /// Message suitable for showing next to a login or registration form
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials => "Invalid email or password".to_string(),
            AuthError::RegistrationFailed => "Registration failed. Please try again.".to_string(),
            AuthError::PasswordMismatch => "Passwords do not match".to_string(),
            AuthError::Network(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            AuthError::Network(_) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            other => other.to_string(),
        }
    }
}
