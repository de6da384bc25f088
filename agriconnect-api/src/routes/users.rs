/// Account profile endpoints
///
/// # Endpoints
///
/// - `GET /user` - The caller's profile
/// - `PUT /user/update` - Update name/email fields
/// - `PUT /user/password` - Change password

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::auth::PublicUser,
};
use axum::{extract::State, Json};
use agriconnect_shared::{
    auth::{middleware::AuthContext, password},
    models::user::{UpdateProfile, User},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Profile update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[validate(length(max = 255, message = "First name must be at most 255 characters"))]
    pub first_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Password change request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    pub current_password: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,

    pub confirm_password: String,
}

/// Message-only response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Returns the caller's profile
pub async fn me(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Json<PublicUser>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// Updates the caller's profile fields
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `422 Unprocessable Entity`: Email already taken by another account
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    req.validate()?;

    let user = User::update_profile(
        &state.db,
        auth.user_id,
        UpdateProfile {
            name: req.name,
            first_name: req.first_name,
            email: req.email,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(serde_json::json!({
        "message": "Profile updated successfully",
        "user": PublicUser::from(user),
    })))
}

/// Changes the caller's password
///
/// The current password must verify before the new one is stored.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or confirmation mismatch
/// - `401 Unauthorized`: Current password is incorrect
pub async fn update_password(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<UpdatePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    if req.new_password != req.confirm_password {
        return Err(ApiError::validation(
            "confirm_password",
            "Password confirmation does not match",
        ));
    }

    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let valid = password::verify_password(&req.current_password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = password::hash_password(&req.new_password)?;
    User::update_password_hash(&state.db, auth.user_id, &new_hash).await?;

    Ok(Json(MessageResponse {
        message: "Password updated successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_password_request_validation() {
        let valid = UpdatePasswordRequest {
            current_password: "old-secret".to_string(),
            new_password: "new-secret".to_string(),
            confirm_password: "new-secret".to_string(),
        };
        assert!(valid.validate().is_ok());

        let short = UpdatePasswordRequest {
            current_password: "old-secret".to_string(),
            new_password: "new".to_string(),
            confirm_password: "new".to_string(),
        };
        assert!(short.validate().is_err());
    }
}
