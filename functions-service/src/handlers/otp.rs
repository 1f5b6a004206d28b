use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::callable::{CallableError, CallableRequest, CallableResult};
use crate::services::{metrics, OutboundEmail};
use crate::startup::AppState;

pub const OTP_EMAIL_SUBJECT: &str = "Your OTP Code";

#[derive(Debug, Default, Deserialize)]
pub struct SendOtpEmailRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
}

#[derive(Debug, Serialize)]
pub struct SendOtpEmailResponse {
    pub success: bool,
}

/// Relay a one-time password to its recipient by email.
///
/// The payload is forwarded as-is: the caller generates and verifies the
/// code, and a malformed recipient is the relay's to reject.
#[tracing::instrument(skip(state, body))]
pub async fn send_otp_email(
    State(state): State<AppState>,
    Json(body): Json<CallableRequest<SendOtpEmailRequest>>,
) -> Result<Json<CallableResult<SendOtpEmailResponse>>, CallableError> {
    let request = body.data.unwrap_or_default();

    let email = OutboundEmail {
        to: request.email,
        subject: OTP_EMAIL_SUBJECT.to_string(),
        body: format!("Your OTP code is: {}", request.otp),
    };

    // Never log the code itself - only the recipient
    match state.mailer.send(&email).await {
        Ok(_) => {
            metrics::record_function_call("sendOtpEmail", "ok");
            metrics::record_provider_call("email", "success");
            tracing::info!(to = %email.to, "OTP email sent");
        }
        Err(e) => {
            metrics::record_function_call("sendOtpEmail", "error");
            metrics::record_provider_call("email", "failure");
            tracing::error!(to = %email.to, error = %e, "Failed to send OTP email");
            return Err(e.into());
        }
    }

    Ok(Json(CallableResult {
        result: SendOtpEmailResponse { success: true },
    }))
}
