pub mod email;
pub mod identity;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use email::{MockEmailProvider, SmtpProvider};
pub use identity::{IdentityToolkitProvider, MockIdentityProvider};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not enabled: {0}")]
    NotEnabled(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub provider_id: Option<String>,
    pub success: bool,
    pub message: Option<String>,
}

impl ProviderResponse {
    pub fn success(provider_id: Option<String>) -> Self {
        Self {
            provider_id,
            success: true,
            message: None,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            provider_id: None,
            success: false,
            message: Some(message),
        }
    }
}

/// Custom claims attached to a user record at the identity provider.
///
/// The `usertype` claim is what the mobile app inspects to unlock admin
/// screens after a token refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomClaims {
    pub usertype: String,
}

impl CustomClaims {
    pub fn admin() -> Self {
        Self {
            usertype: "admin".to_string(),
        }
    }
}

/// Verified caller identity derived from a bearer id token.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub uid: String,
    pub usertype: Option<String>,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.usertype.as_deref() == Some("admin")
    }
}

#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Attach `claims` to the user record identified by `uid`, replacing
    /// whatever custom claims the record held before.
    async fn set_custom_claims(&self, uid: &str, claims: &CustomClaims)
        -> Result<(), ProviderError>;

    /// Verify a caller-supplied id token and return the identity it proves.
    async fn verify_id_token(&self, id_token: &str) -> Result<AuthContext, ProviderError>;

    async fn health_check(&self) -> Result<(), ProviderError>;

    fn is_enabled(&self) -> bool;
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<ProviderResponse, ProviderError>;

    async fn health_check(&self) -> Result<(), ProviderError>;

    fn is_enabled(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_claims_serialize_to_the_wire_shape() {
        let rendered = serde_json::to_string(&CustomClaims::admin()).unwrap();
        assert_eq!(rendered, r#"{"usertype":"admin"}"#);
    }

    #[test]
    fn auth_context_admin_check() {
        let admin = AuthContext {
            uid: "u1".to_string(),
            usertype: Some("admin".to_string()),
        };
        assert!(admin.is_admin());

        let plain = AuthContext {
            uid: "u2".to_string(),
            usertype: None,
        };
        assert!(!plain.is_admin());

        let customer = AuthContext {
            uid: "u3".to_string(),
            usertype: Some("customer".to_string()),
        };
        assert!(!customer.is_admin());
    }
}
