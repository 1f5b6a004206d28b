use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::callable::CallableError;
use crate::services::AuthContext;
use crate::startup::AppState;

/// Middleware guarding privileged callables.
///
/// The caller must present a bearer id token that the identity provider
/// verifies, and the proven identity must already carry the admin usertype.
/// Nothing downstream runs when either check fails.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, CallableError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let token = match token {
        Some(token) => token,
        None => {
            return Err(CallableError::unauthenticated(
                "Missing or invalid Authorization header",
            ));
        }
    };

    let context = match state.identity.verify_id_token(token).await {
        Ok(context) => context,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected caller token");
            return Err(CallableError::unauthenticated("Invalid or expired token"));
        }
    };

    if !context.is_admin() {
        tracing::warn!(uid = %context.uid, "Caller lacks the admin usertype");
        return Err(CallableError::permission_denied(
            "Caller must already hold the admin role",
        ));
    }

    // Store the verified identity in request extensions so handlers can access it
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}

/// Extractor to easily get the verified admin caller in handlers
#[derive(Debug, Clone)]
pub struct AdminCaller(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminCaller
where
    S: Send + Sync,
{
    type Rejection = CallableError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = parts.extensions.get::<AuthContext>().ok_or_else(|| {
            CallableError::internal("Auth context missing from request extensions")
        })?;

        Ok(AdminCaller(context.clone()))
    }
}
