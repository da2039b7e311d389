//! User identity model.

use serde::{Deserialize, Serialize};

/// Sign-in provider the identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Auth0,
    Guest,
}

/// Authenticated (or guest) user identity.
///
/// Immutable once created within a session. The raw provider claims
/// (`email`, `subject`, `numeric_id`) feed the deterministic partition-key
/// derivation in the store; the key itself is never stored on the identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub provider: Provider,
    pub created_at: String,
    /// Externally-issued subject claim (e.g. the OIDC `sub`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Legacy provider-numeric id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_id: Option<String>,
}

impl UserIdentity {
    /// Partition key derived from provider claims, in fixed priority order:
    /// email, then subject claim, then legacy numeric id. Guests have none
    /// of these; the store falls back to a persisted random guest id.
    pub fn derived_id(&self) -> Option<String> {
        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            return Some(format!("email_{}", email));
        }
        if let Some(sub) = self.subject.as_deref().filter(|s| !s.is_empty()) {
            return Some(format!("auth0_{}", sub));
        }
        if let Some(id) = self.numeric_id.as_deref().filter(|i| !i.is_empty()) {
            return Some(format!("google_{}", id));
        }
        None
    }

    pub fn is_guest(&self) -> bool {
        self.provider == Provider::Guest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_identity() -> UserIdentity {
        UserIdentity {
            display_name: "Ada".to_string(),
            email: Some("ada@example.com".to_string()),
            avatar_url: None,
            provider: Provider::Auth0,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            subject: Some("auth0|abc123".to_string()),
            numeric_id: Some("42".to_string()),
        }
    }

    #[test]
    fn test_email_wins_derivation() {
        let identity = make_identity();
        assert_eq!(identity.derived_id().as_deref(), Some("email_ada@example.com"));
    }

    #[test]
    fn test_subject_beats_numeric_id() {
        let mut identity = make_identity();
        identity.email = None;
        assert_eq!(identity.derived_id().as_deref(), Some("auth0_auth0|abc123"));

        identity.subject = None;
        assert_eq!(identity.derived_id().as_deref(), Some("google_42"));
    }

    #[test]
    fn test_guest_has_no_derived_id() {
        let identity = UserIdentity {
            display_name: "Guest User".to_string(),
            email: None,
            avatar_url: None,
            provider: Provider::Guest,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            subject: None,
            numeric_id: None,
        };
        assert!(identity.derived_id().is_none());
    }
}
