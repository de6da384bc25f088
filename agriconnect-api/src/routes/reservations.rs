/// Reservation endpoints
///
/// # Endpoints
///
/// - `POST /equipment/{id}/reserve` - Book an equipment item for a date
///   range
/// - `GET /user/reservations` - The caller's reservations with equipment
///   summaries
/// - `GET /reservations/{id}` - Single reservation; renter or admin only

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use agriconnect_shared::auth::middleware::AuthContext;
use agriconnect_shared::models::{
    equipment::{normalize_image_path, Equipment},
    reservation::Reservation,
    user::User,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

/// Booking request body
#[derive(Debug, Deserialize)]
pub struct ReserveRequest {
    /// First rental day (ISO date)
    pub start_date: NaiveDate,

    /// Last rental day (ISO date), inclusive
    pub end_date: NaiveDate,
}

/// Books an equipment item for a date range
///
/// The engine validates the dates, checks the equipment is active, and
/// rejects ranges that overlap an existing active reservation — all inside
/// one transaction, so concurrent requests for the same item cannot both
/// succeed.
///
/// # Errors
///
/// - `400 Bad Request`: Start date in the past, end date not after start,
///   or equipment missing/not active
/// - `401 Unauthorized`: Missing credentials
/// - `422 Unprocessable Entity`: Range conflicts with an existing active
///   reservation
pub async fn reserve(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(equipment_id): Path<i64>,
    Json(req): Json<ReserveRequest>,
) -> ApiResult<Json<Value>> {
    let today = Utc::now().date_naive();

    let reservation = Reservation::create_checked(
        &state.db,
        equipment_id,
        auth.user_id,
        req.start_date,
        req.end_date,
        today,
    )
    .await?;

    tracing::info!(
        reservation_id = reservation.id,
        equipment_id,
        user_id = auth.user_id,
        "Reservation created"
    );

    Ok(Json(json!({
        "message": "Reservation created successfully",
        "reservation": reservation,
    })))
}

/// The caller's reservations, newest start date first
///
/// Each entry carries a summary of its equipment. Unpaginated by design.
pub async fn user_reservations(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Value>> {
    let rows = Reservation::list_for_user_with_equipment(&state.db, auth.user_id).await?;

    let data: Vec<Value> = rows
        .iter()
        .map(|row| {
            let images: Vec<String> =
                row.images.0.iter().map(|s| normalize_image_path(s)).collect();
            json!({
                "id": row.id,
                "equipment_id": row.equipment_id,
                "user_id": row.user_id,
                "start_date": row.start_date,
                "end_date": row.end_date,
                "status": row.status,
                "created_at": row.created_at,
                "equipment": {
                    "id": row.equipment_id,
                    "name": row.equipment_name,
                    "type": row.equipment_type,
                    "status": row.equipment_status,
                    "daily_rate": row.daily_rate,
                    "images": images,
                },
            })
        })
        .collect();

    Ok(Json(json!({ "data": data })))
}

/// Single reservation detail
///
/// Visible only to the renter or an admin.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is neither the renter nor an admin
/// - `404 Not Found`: Unknown reservation id
pub async fn show(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let reservation = Reservation::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Reservation not found".to_string()))?;

    if reservation.user_id != auth.user_id && !auth.is_admin {
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }

    let equipment = Equipment::find_by_id(&state.db, reservation.equipment_id).await?;
    let renter = User::find_by_id(&state.db, reservation.user_id).await?;

    let mut payload = serde_json::to_value(&reservation)
        .map_err(|e| ApiError::Internal(format!("Serialization failed: {}", e)))?;
    payload["equipment"] = equipment
        .map(|e| {
            json!({
                "id": e.id,
                "name": e.name,
                "type": e.equipment_type,
                "status": e.status,
                "daily_rate": e.daily_rate,
                "images": e.normalized_images(),
            })
        })
        .unwrap_or(Value::Null);
    payload["user"] = renter
        .map(|u| {
            json!({
                "id": u.id,
                "name": u.name,
                "first_name": u.first_name,
                "email": u.email,
            })
        })
        .unwrap_or(Value::Null);

    Ok(Json(json!({ "reservation": payload })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_request_parses_iso_dates() {
        let req: ReserveRequest = serde_json::from_value(json!({
            "start_date": "2025-06-01",
            "end_date": "2025-06-05"
        }))
        .unwrap();

        assert_eq!(
            req.start_date,
            NaiveDate::parse_from_str("2025-06-01", "%Y-%m-%d").unwrap()
        );
        assert!(req.end_date > req.start_date);
    }

    #[test]
    fn test_reserve_request_rejects_garbage_dates() {
        let result: Result<ReserveRequest, _> = serde_json::from_value(json!({
            "start_date": "June first",
            "end_date": "2025-06-05"
        }));
        assert!(result.is_err());
    }
}
