/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /register` - Register a new account
/// - `POST /login` - Login and get an access token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use agriconnect_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, User},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Account name
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    /// Optional secondary name field
    #[validate(length(max = 255, message = "First name must be at most 255 characters"))]
    pub first_name: Option<String>,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Public view of an account, safe to return to clients
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub first_name: Option<String>,
    pub email: String,
    pub is_admin: bool,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            first_name: user.first_name,
            email: user.email,
            is_admin: user.is_admin,
        }
    }
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: PublicUser,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: PublicUser,

    /// Access token (24h)
    pub token: String,
}

/// Register a new account
///
/// New accounts never carry the admin flag.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `422 Unprocessable Entity`: Email already exists
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate()?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            first_name: req.first_name,
            email: req.email,
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "Account registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user: user.into() }),
    ))
}

/// Login and obtain an access token
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Invalid credentials (same response for unknown
///   email and wrong password)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| {
            ApiError::Unauthorized("The provided credentials are incorrect.".to_string())
        })?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "The provided credentials are incorrect.".to_string(),
        ));
    }

    let claims = jwt::Claims::new(user.id);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(Json(LoginResponse {
        user: user.into(),
        token,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            name: "Dupont".to_string(),
            first_name: Some("Jean".to_string()),
            email: "jean@example.com".to_string(),
            password: "secret6".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = RegisterRequest {
            name: "Dupont".to_string(),
            first_name: None,
            email: "not-an-email".to_string(),
            password: "secret6".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            name: "Dupont".to_string(),
            first_name: None,
            email: "jean@example.com".to_string(),
            password: "abc".to_string(),
        };
        assert!(short_password.validate().is_err());

        let empty_name = RegisterRequest {
            name: "".to_string(),
            first_name: None,
            email: "jean@example.com".to_string(),
            password: "secret6".to_string(),
        };
        assert!(empty_name.validate().is_err());
    }

    #[test]
    fn test_public_user_from_user_drops_hash() {
        use chrono::Utc;

        let user = User {
            id: 9,
            name: "Dupont".to_string(),
            first_name: None,
            email: "d@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            is_admin: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let public: PublicUser = user.into();
        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("d@example.com"));
    }
}
