use super::{AuthContext, CustomClaims, IdentityProvider, ProviderError};
use crate::config::IdentityConfig;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

pub struct IdentityToolkitProvider {
    config: IdentityConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAccountRequest {
    local_id: String,
    /// JSON-encoded claims object, as the toolkit API expects.
    custom_attributes: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAccountResponse {
    #[serde(default)]
    local_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupAccountRequest {
    id_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupAccountResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    #[serde(default)]
    custom_attributes: Option<String>,
}

impl IdentityToolkitProvider {
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn account_url(&self, action: &str) -> String {
        format!(
            "{}/projects/{}/accounts:{}",
            self.config.endpoint, self.config.project_id, action
        )
    }
}

fn usertype_from_attributes(attributes: Option<&str>) -> Option<String> {
    attributes
        .and_then(|attrs| serde_json::from_str::<CustomClaims>(attrs).ok())
        .map(|claims| claims.usertype)
}

#[async_trait]
impl IdentityProvider for IdentityToolkitProvider {
    async fn set_custom_claims(
        &self,
        uid: &str,
        claims: &CustomClaims,
    ) -> Result<(), ProviderError> {
        if !self.config.enabled {
            return Err(ProviderError::NotEnabled(
                "Identity provider is not enabled".to_string(),
            ));
        }

        if self.config.project_id.is_empty() {
            return Err(ProviderError::Configuration(
                "Identity project_id is not configured".to_string(),
            ));
        }

        let custom_attributes = serde_json::to_string(claims).map_err(|e| {
            ProviderError::RequestFailed(format!("Failed to serialize claims: {}", e))
        })?;

        let request = UpdateAccountRequest {
            local_id: uid.to_string(),
            custom_attributes,
        };

        let response = self
            .client
            .post(self.account_url("update"))
            .bearer_auth(self.config.access_token.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                ProviderError::Connection(format!("Failed to connect to identity provider: {}", e))
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::Authentication(format!(
                "Identity provider rejected the service credential: status {}",
                status
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::RequestFailed(format!(
                "Identity provider returned error status {}: {}",
                status, body
            )));
        }

        let update: UpdateAccountResponse = response.json().await.map_err(|e| {
            ProviderError::RequestFailed(format!("Failed to parse identity response: {}", e))
        })?;

        tracing::info!(
            uid = %uid,
            updated = ?update.local_id,
            "Custom claims written"
        );

        Ok(())
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<AuthContext, ProviderError> {
        if !self.config.enabled {
            return Err(ProviderError::NotEnabled(
                "Identity provider is not enabled".to_string(),
            ));
        }

        let request = LookupAccountRequest {
            id_token: id_token.to_string(),
        };

        let response = self
            .client
            .post(self.account_url("lookup"))
            .bearer_auth(self.config.access_token.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                ProviderError::Connection(format!("Failed to connect to identity provider: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(ProviderError::InvalidToken(format!(
                "Identity provider rejected the token: status {}",
                response.status()
            )));
        }

        let lookup: LookupAccountResponse = response.json().await.map_err(|e| {
            ProviderError::RequestFailed(format!("Failed to parse identity response: {}", e))
        })?;

        let account = lookup.users.into_iter().next().ok_or_else(|| {
            ProviderError::InvalidToken("Token does not match any account".to_string())
        })?;

        Ok(AuthContext {
            usertype: usertype_from_attributes(account.custom_attributes.as_deref()),
            uid: account.local_id,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if !self.config.enabled {
            return Ok(());
        }

        if self.config.project_id.is_empty() {
            return Err(ProviderError::Configuration(
                "Identity project_id is not configured".to_string(),
            ));
        }

        if self.config.access_token.expose_secret().is_empty() {
            return Err(ProviderError::Configuration(
                "Identity access_token is not configured".to_string(),
            ));
        }

        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

/// Mock identity provider for testing; records claim writes and resolves
/// tokens from a canned table.
pub struct MockIdentityProvider {
    enabled: bool,
    write_count: AtomicU64,
    /// When set, claim writes fail after being counted.
    pub fail_writes: AtomicBool,
    /// Claim writes the mock accepted, in order.
    pub claims_written: Mutex<Vec<(String, CustomClaims)>>,
    /// Tokens the mock will verify, mapped to the identity they prove.
    pub tokens: Mutex<HashMap<String, AuthContext>>,
}

impl MockIdentityProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            write_count: AtomicU64::new(0),
            fail_writes: AtomicBool::new(false),
            claims_written: Mutex::new(Vec::new()),
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Number of claim writes attempted, including ones that were made to fail.
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn set_custom_claims(
        &self,
        uid: &str,
        claims: &CustomClaims,
    ) -> Result<(), ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotEnabled(
                "Mock identity provider is not enabled".to_string(),
            ));
        }

        self.write_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ProviderError::RequestFailed(
                "Mock identity provider failed the write".to_string(),
            ));
        }

        self.claims_written
            .lock()
            .map_err(|e| ProviderError::RequestFailed(format!("Mock claim log poisoned: {}", e)))?
            .push((uid.to_string(), claims.clone()));

        tracing::info!(uid = %uid, "[MOCK] Custom claims would be written");

        Ok(())
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<AuthContext, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotEnabled(
                "Mock identity provider is not enabled".to_string(),
            ));
        }

        self.tokens
            .lock()
            .map_err(|e| ProviderError::RequestFailed(format!("Mock token table poisoned: {}", e)))?
            .get(id_token)
            .cloned()
            .ok_or_else(|| {
                ProviderError::InvalidToken("Token does not match any account".to_string())
            })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
