//! Authenticated caller identity.

use serde::{Deserialize, Serialize};

/// The per-request identity attached by the auth stage.
///
/// Read-only to downstream stages and handlers; discarded when the request
/// completes. Its absence after the auth stage means "not authenticated".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Stable subject identifier from the verified token (`sub` claim).
    pub subject_id: String,
    /// Email claim, where the token carried one.
    pub email: Option<String>,
}

impl AuthContext {
    /// Creates an auth context for a subject.
    #[must_use]
    pub fn new(subject_id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            email,
        }
    }

    /// Returns an identifier suitable for logging.
    ///
    /// Never includes tokens or other secrets.
    #[must_use]
    pub fn log_id(&self) -> String {
        format!("user:{}", self.subject_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_id_format() {
        let ctx = AuthContext::new("u-123", Some("alice@example.com".to_string()));
        assert_eq!(ctx.log_id(), "user:u-123");
    }

    #[test]
    fn test_email_optional() {
        let ctx = AuthContext::new("u-123", None);
        assert!(ctx.email.is_none());
    }
}
