use super::{EmailProvider, OutboundEmail, ProviderError, ProviderResponse};
use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub struct SmtpProvider {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpProvider {
    pub fn new(config: SmtpConfig) -> Result<Self, ProviderError> {
        if !config.enabled {
            return Ok(Self {
                config,
                transport: None,
            });
        }

        let creds = Credentials::new(
            config.user.clone(),
            config.password.expose_secret().clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to create SMTP relay: {}", e))
            })?
            .port(config.port)
            .credentials(creds)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        Ok(Self {
            config,
            transport: Some(transport),
        })
    }
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    async fn send(&self, email: &OutboundEmail) -> Result<ProviderResponse, ProviderError> {
        if !self.config.enabled {
            return Err(ProviderError::NotEnabled(
                "SMTP email provider is not enabled".to_string(),
            ));
        }

        let transport = self.transport.as_ref().ok_or_else(|| {
            ProviderError::Configuration("SMTP transport not initialized".to_string())
        })?;

        let from_mailbox: Mailbox =
            format!("{} <{}>", self.config.from_name, self.config.from_email)
                .parse()
                .map_err(|e| {
                    ProviderError::Configuration(format!("Invalid from address: {}", e))
                })?;

        let to_mailbox: Mailbox = email
            .to
            .parse()
            .map_err(|e| ProviderError::InvalidRecipient(format!("Invalid recipient: {}", e)))?;

        let message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(&email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to build message: {}", e)))?;

        let response = transport
            .send(message)
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to send email: {}", e)))?;

        let provider_id = response.message().next().map(|s| s.to_string());

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "Email sent successfully"
        );

        Ok(ProviderResponse::success(provider_id))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if !self.config.enabled {
            return Ok(());
        }

        let transport = self.transport.as_ref().ok_or_else(|| {
            ProviderError::Configuration("SMTP transport not initialized".to_string())
        })?;

        transport.test_connection().await.map_err(|e| {
            ProviderError::Connection(format!("SMTP connection test failed: {}", e))
        })?;

        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

/// Mock email provider for testing; keeps every accepted message so tests
/// can assert on recipients, subjects, and bodies.
pub struct MockEmailProvider {
    enabled: bool,
    send_count: AtomicU64,
    /// When set, sends fail like a relay rejection after being counted.
    pub fail_sends: AtomicBool,
    /// Messages the mock accepted, in order.
    pub sent: Mutex<Vec<OutboundEmail>>,
}

impl MockEmailProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            send_count: AtomicU64::new(0),
            fail_sends: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Number of sends attempted, including ones that were made to fail.
    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn send(&self, email: &OutboundEmail) -> Result<ProviderResponse, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotEnabled(
                "Mock email provider is not enabled".to_string(),
            ));
        }

        let count = self.send_count.fetch_add(1, Ordering::SeqCst) + 1;

        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ProviderError::RequestFailed(
                "Mock relay rejected the message".to_string(),
            ));
        }

        self.sent
            .lock()
            .map_err(|e| ProviderError::RequestFailed(format!("Mock mailbox poisoned: {}", e)))?
            .push(email.clone());

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "[MOCK] Email would be sent"
        );

        Ok(ProviderResponse::success(Some(format!(
            "mock-email-{}",
            count
        ))))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn disabled_config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            user: String::new(),
            password: Secret::new(String::new()),
            from_email: "noreply@example.com".to_string(),
            from_name: "Functions Service".to_string(),
            enabled: false,
        }
    }

    #[tokio::test]
    async fn disabled_provider_rejects_sends() {
        let provider = SmtpProvider::new(disabled_config()).expect("Failed to build provider");
        assert!(!provider.is_enabled());

        let email = OutboundEmail {
            to: "user@example.com".to_string(),
            subject: "Hello".to_string(),
            body: "Hi".to_string(),
        };
        let result = provider.send(&email).await;
        assert!(matches!(result, Err(ProviderError::NotEnabled(_))));
    }

    #[tokio::test]
    async fn mock_provider_records_messages() {
        let mock = MockEmailProvider::new(true);
        let email = OutboundEmail {
            to: "user@example.com".to_string(),
            subject: "Hello".to_string(),
            body: "Hi".to_string(),
        };

        mock.send(&email).await.expect("Failed to send");

        assert_eq!(mock.send_count(), 1);
        let sent = mock.sent.lock().expect("Mailbox poisoned");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "user@example.com");
    }

    #[tokio::test]
    async fn mock_provider_failure_switch_counts_the_attempt() {
        let mock = MockEmailProvider::new(true);
        mock.fail_sends.store(true, Ordering::SeqCst);

        let email = OutboundEmail {
            to: "user@example.com".to_string(),
            subject: "Hello".to_string(),
            body: "Hi".to_string(),
        };
        let result = mock.send(&email).await;

        assert!(matches!(result, Err(ProviderError::RequestFailed(_))));
        assert_eq!(mock.send_count(), 1);
        assert!(mock.sent.lock().expect("Mailbox poisoned").is_empty());
    }
}
