use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::callable::{CallableError, CallableRequest, CallableResult};
use crate::middleware::AdminCaller;
use crate::services::{metrics, CustomClaims};
use crate::startup::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SetAdminRoleRequest {
    pub uid: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SetAdminRoleResponse {
    pub message: String,
}

/// Grant the admin role to a user account.
///
/// The target is identified by `uid`; the caller must already be an admin,
/// which the route's guard middleware has verified. The claim write replaces
/// any custom claims the account held before, so repeated grants simply
/// reassert the role.
#[tracing::instrument(skip(state, caller, body), fields(granted_by = %caller.0.uid))]
pub async fn set_admin_role(
    State(state): State<AppState>,
    caller: AdminCaller,
    Json(body): Json<CallableRequest<SetAdminRoleRequest>>,
) -> Result<Json<CallableResult<SetAdminRoleResponse>>, CallableError> {
    let request = body.data.unwrap_or_default();

    let uid = match request.uid {
        Some(uid) if !uid.is_empty() => uid,
        _ => {
            metrics::record_function_call("setAdminRole", "error");
            return Err(CallableError::invalid_argument("User ID is required"));
        }
    };

    match state
        .identity
        .set_custom_claims(&uid, &CustomClaims::admin())
        .await
    {
        Ok(()) => {
            metrics::record_function_call("setAdminRole", "ok");
            metrics::record_provider_call("identity", "success");
        }
        Err(e) => {
            metrics::record_function_call("setAdminRole", "error");
            metrics::record_provider_call("identity", "failure");
            tracing::error!(uid = %uid, error = %e, "Failed to set admin claim");
            return Err(e.into());
        }
    }

    tracing::info!(uid = %uid, "Admin role granted");

    Ok(Json(CallableResult {
        result: SetAdminRoleResponse {
            message: format!("✅ Admin role set for UID: {}", uid),
        },
    }))
}
