/// Admin endpoints
///
/// All routes here require the admin flag (the `AdminContext` extractor
/// rejects everyone else with 403). Promote, demote, and delete go further:
/// they are reserved for the super admin — the admin account with the
/// smallest id, re-derived by query on every call rather than cached, so
/// the title moves automatically when the current holder is deleted.
///
/// # Endpoints
///
/// - `GET /admin/users` - Paginated user list
/// - `POST /admin/promote/{id}` - Grant the admin flag (super admin only)
/// - `POST /admin/demote/{id}` - Revoke the admin flag (super admin only,
///   never on yourself)
/// - `DELETE /admin/users/{id}` - Delete an account (super admin only,
///   never on yourself)
/// - `GET /admin/dashboard` - Live marketplace counts
/// - `GET /admin/equipment` - Moderation list with owner summaries
/// - `DELETE /admin/equipment/{id}` - Remove a listing

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::auth::PublicUser,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use agriconnect_shared::auth::middleware::AdminContext;
use agriconnect_shared::models::{
    equipment::{Equipment, EquipmentStatus},
    reservation::Reservation,
    user::User,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_USERS_PER_PAGE: u32 = 10;
const EQUIPMENT_PER_PAGE: u32 = 20;

/// Pagination query for the user list
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Query for the equipment moderation list
#[derive(Debug, Default, Deserialize)]
pub struct ListEquipmentQuery {
    /// Optional status filter (draft/published/active/inactive)
    pub status: Option<String>,
    pub page: Option<u32>,
}

/// Paginated user list, newest accounts first
pub async fn list_users(
    State(state): State<AppState>,
    AdminContext(_admin): AdminContext,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<Value>> {
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_USERS_PER_PAGE)
        .clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = i64::from(page - 1) * i64::from(per_page);

    let total = User::count(&state.db).await?;
    let users = User::list(&state.db, i64::from(per_page), offset).await?;

    let data: Vec<PublicUser> = users.into_iter().map(PublicUser::from).collect();
    let last_page = ((total + i64::from(per_page) - 1) / i64::from(per_page)).max(1);

    Ok(Json(json!({
        "data": data,
        "total": total,
        "current_page": page,
        "last_page": last_page,
    })))
}

/// Rejects callers who are not the current super admin
async fn require_super_admin(
    state: &AppState,
    user_id: i64,
    action: &str,
) -> ApiResult<()> {
    if !User::is_super_admin(&state.db, user_id).await? {
        return Err(ApiError::Forbidden(format!(
            "Forbidden: Only super admin can {action}"
        )));
    }
    Ok(())
}

/// Grants the admin flag to a user
///
/// # Errors
///
/// - `400 Bad Request`: Target is already an admin
/// - `403 Forbidden`: Caller is not the super admin
/// - `404 Not Found`: Unknown target
pub async fn promote(
    State(state): State<AppState>,
    AdminContext(admin): AdminContext,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    require_super_admin(&state, admin.user_id, "promote admins").await?;

    let target = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if target.is_admin {
        return Err(ApiError::BadRequest("User is already an admin".to_string()));
    }

    let updated = User::set_admin(&state.db, user_id, true)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(target_id = user_id, by = admin.user_id, "User promoted to admin");

    Ok(Json(json!({
        "message": "User promoted to admin",
        "user": PublicUser::from(updated),
    })))
}

/// Revokes the admin flag from a user
///
/// Self-demotion is forbidden even for the super admin.
///
/// # Errors
///
/// - `400 Bad Request`: Target is not an admin, or target is the caller
/// - `403 Forbidden`: Caller is not the super admin
/// - `404 Not Found`: Unknown target
pub async fn demote(
    State(state): State<AppState>,
    AdminContext(admin): AdminContext,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    require_super_admin(&state, admin.user_id, "demote admins").await?;

    let target = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !target.is_admin {
        return Err(ApiError::BadRequest("User is not an admin".to_string()));
    }

    if target.id == admin.user_id {
        return Err(ApiError::BadRequest(
            "Super admin cannot demote self".to_string(),
        ));
    }

    let updated = User::set_admin(&state.db, user_id, false)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(target_id = user_id, by = admin.user_id, "Admin demoted to user");

    Ok(Json(json!({
        "message": "Admin demoted to user",
        "user": PublicUser::from(updated),
    })))
}

/// Deletes an account
///
/// The target's equipment and reservations go with it (cascade).
/// Self-deletion is forbidden even for the super admin.
///
/// # Errors
///
/// - `400 Bad Request`: Target is the caller
/// - `403 Forbidden`: Caller is not the super admin
/// - `404 Not Found`: Unknown target
pub async fn delete_user(
    State(state): State<AppState>,
    AdminContext(admin): AdminContext,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    require_super_admin(&state, admin.user_id, "delete users").await?;

    let target = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if target.id == admin.user_id {
        return Err(ApiError::BadRequest(
            "Super admin cannot delete self".to_string(),
        ));
    }

    User::delete(&state.db, user_id).await?;

    tracing::info!(target_id = user_id, by = admin.user_id, "User deleted");

    Ok(Json(json!({ "message": "User deleted successfully" })))
}

/// Live marketplace counts for the admin dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    AdminContext(_admin): AdminContext,
) -> ApiResult<Json<Value>> {
    let today = Utc::now().date_naive();

    let total_users = User::count(&state.db).await?;
    let total_equipment = Equipment::count(&state.db).await?;
    let total_bookings = Reservation::count(&state.db).await?;
    let active_rentals = Reservation::count_active_on(&state.db, today).await?;

    Ok(Json(json!({
        "stats": {
            "total_users": total_users,
            "total_equipment": total_equipment,
            "active_rentals": active_rentals,
            "total_bookings": total_bookings,
        }
    })))
}

/// Equipment moderation list
///
/// Optionally filtered by status; each row carries an owner summary and a
/// display price (daily rate falling back to minimum price).
pub async fn list_equipment(
    State(state): State<AppState>,
    AdminContext(_admin): AdminContext,
    Query(query): Query<ListEquipmentQuery>,
) -> ApiResult<Json<Value>> {
    let status = match query.status.as_deref() {
        Some(s) => Some(
            EquipmentStatus::parse(s)
                .ok_or_else(|| ApiError::validation("status", "Unknown status value"))?,
        ),
        None => None,
    };

    let page = query.page.unwrap_or(1).max(1);
    let per_page = EQUIPMENT_PER_PAGE;
    let offset = i64::from(page - 1) * i64::from(per_page);

    let total = Equipment::count_for_admin(&state.db, status).await?;
    let rows = Equipment::list_for_admin(&state.db, status, i64::from(per_page), offset).await?;

    let data: Vec<Value> = rows
        .iter()
        .map(|row| {
            json!({
                "id": row.id,
                "name": row.name,
                "type": row.equipment_type,
                "status": row.status,
                "price": row.display_price(),
                "created_at": row.created_at,
                "user": {
                    "id": row.owner_id,
                    "name": row.owner_display_name(),
                },
            })
        })
        .collect();

    let last_page = ((total + i64::from(per_page) - 1) / i64::from(per_page)).max(1);

    Ok(Json(json!({
        "data": data,
        "total": total,
        "current_page": page,
        "last_page": last_page,
    })))
}

/// Removes a listing (any admin)
///
/// Same cascade semantics as the owner delete.
pub async fn delete_equipment(
    State(state): State<AppState>,
    AdminContext(admin): AdminContext,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let deleted = Equipment::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Equipment not found".to_string()));
    }

    tracing::info!(equipment_id = id, by = admin.user_id, "Equipment removed by admin");

    Ok(Json(json!({ "message": "Equipment deleted" })))
}
