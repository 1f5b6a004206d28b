//! Test helper module for functions-service integration tests.
//!
//! Spawns the service on a random port, wired to recording mock providers
//! the tests keep handles to.

#![allow(dead_code)]

use functions_service::config::{
    Environment, FunctionsConfig, IdentityConfig, SecurityConfig, SmtpConfig,
};
use functions_service::services::{AuthContext, MockEmailProvider, MockIdentityProvider};
use functions_service::startup::{AppState, Application};
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

/// Token the mock identity provider resolves to an admin caller.
pub const ADMIN_TOKEN: &str = "test-admin-token";
/// Token the mock identity provider resolves to an ordinary caller.
pub const USER_TOKEN: &str = "test-user-token";

pub struct TestApp {
    pub address: String,
    pub identity: Arc<MockIdentityProvider>,
    pub mailer: Arc<MockEmailProvider>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        // Use random port for testing (port 0)
        let config = FunctionsConfig {
            common: CoreConfig {
                host: IpAddr::V4(Ipv4Addr::LOCALHOST),
                port: 0,
            },
            environment: Environment::Dev,
            service_name: "functions-service".to_string(),
            service_version: "test".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            identity: IdentityConfig {
                endpoint: "http://identity.test.local".to_string(),
                project_id: "test-project".to_string(),
                access_token: Secret::new("test-token".to_string()),
                enabled: false, // Use mock
            },
            smtp: SmtpConfig {
                host: "smtp.test.local".to_string(),
                port: 587,
                user: "test".to_string(),
                password: Secret::new("test".to_string()),
                from_email: "test@example.com".to_string(),
                from_name: "Test Service".to_string(),
                enabled: false, // Use mock
            },
            security: SecurityConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            },
        };

        let identity = Arc::new(MockIdentityProvider::new(true));
        {
            let mut tokens = identity.tokens.lock().expect("Token table poisoned");
            tokens.insert(
                ADMIN_TOKEN.to_string(),
                AuthContext {
                    uid: "admin-1".to_string(),
                    usertype: Some("admin".to_string()),
                },
            );
            tokens.insert(
                USER_TOKEN.to_string(),
                AuthContext {
                    uid: "user-1".to_string(),
                    usertype: None,
                },
            );
        }

        let mailer = Arc::new(MockEmailProvider::new(true));

        let state = AppState {
            config,
            identity: identity.clone(),
            mailer: mailer.clone(),
        };

        let app = Application::with_state(state)
            .await
            .expect("Failed to build test application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            identity,
            mailer,
        }
    }

    /// Invoke a callable function with the envelope the clients send.
    pub async fn call(
        &self,
        function: &str,
        data: serde_json::Value,
        bearer: Option<&str>,
    ) -> reqwest::Response {
        let client = reqwest::Client::new();
        let mut request = client
            .post(format!("{}/{}", self.address, function))
            .json(&serde_json::json!({ "data": data }));

        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        request.send().await.expect("Failed to execute request")
    }
}
