/// Request authentication context and extractors
///
/// The API's auth middleware validates the Bearer token, loads the account
/// row, and inserts an [`AuthContext`] into request extensions. Handlers
/// declare what they need through extractors instead of reading ambient
/// state:
///
/// - [`AuthContext`]: rejects with 401 when the request is unauthenticated
/// - [`MaybeAuth`]: optional variant for public routes whose response
///   changes when the caller is known (equipment detail)
/// - [`AdminContext`]: rejects with 403 unless the caller is an admin
///
/// Admin status in the context is read from the database per request, never
/// from token claims, so promotions and demotions apply immediately.
///
/// # Example
///
/// ```no_run
/// use agriconnect_shared::auth::middleware::AuthContext;
///
/// async fn protected_handler(auth: AuthContext) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Authentication context for the current request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user id
    pub user_id: i64,

    /// Whether the account currently holds the admin flag
    pub is_admin: bool,
}

/// Error type for authentication extractors
#[derive(Debug)]
pub enum AuthError {
    /// No valid credentials on the request
    MissingCredentials,

    /// Authenticated but not an admin
    AdminRequired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AuthError::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Missing or invalid credentials",
            ),
            AuthError::AdminRequired => (
                StatusCode::FORBIDDEN,
                "forbidden",
                "Admin access required",
            ),
        };

        (status, Json(json!({ "error": error, "message": message }))).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}

/// Optional authentication for public routes
///
/// Resolves to `MaybeAuth(None)` instead of rejecting when the request
/// carries no usable credentials.
#[derive(Debug, Clone)]
pub struct MaybeAuth(pub Option<AuthContext>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuth(parts.extensions.get::<AuthContext>().cloned()))
    }
}

/// Admin-gated authentication
///
/// Wraps the [`AuthContext`] of a caller whose account holds the admin
/// flag. Non-admin callers are rejected with 403; unauthenticated callers
/// with 401.
#[derive(Debug, Clone)]
pub struct AdminContext(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for AdminContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthContext::from_request_parts(parts, state).await?;
        if !auth.is_admin {
            return Err(AuthError::AdminRequired);
        }
        Ok(AdminContext(auth))
    }
}
