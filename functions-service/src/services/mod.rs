pub mod metrics;
pub mod providers;

pub use metrics::{get_metrics, init_metrics, record_function_call, record_provider_call};
pub use providers::{
    AuthContext, CustomClaims, EmailProvider, IdentityProvider, IdentityToolkitProvider,
    MockEmailProvider, MockIdentityProvider, OutboundEmail, ProviderError, ProviderResponse,
    SmtpProvider,
};
