use std::fmt;

/// An email/password pair for a single exchange. Never persisted.
#[derive(Clone)]
pub struct Credentials {
    pub identifier: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into().trim().to_string(),
            secret: secret.into(),
        }
    }

    /// Both fields must be filled before a request is worth sending
    pub fn is_complete(&self) -> bool {
        !self.identifier.is_empty() && !self.secret.is_empty()
    }

    /// Registration precondition: the confirmation must repeat the secret
    pub fn confirms(&self, confirmation: &str) -> bool {
        self.secret == confirmation
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}
