/// Equipment endpoints
///
/// # Endpoints
///
/// - `GET /equipment` - Public browse with filters, sort, pagination
/// - `GET /equipment/types` - Public category list
/// - `GET /equipment/{id}` - Detail; owners and admins also get the
///   reservation list
/// - `POST /equipment` - Create a listing (authenticated)
/// - `PUT /equipment/{id}` - Update a listing (owner or admin)
/// - `DELETE /equipment/{id}` - Delete a listing (owner or admin)
/// - `GET /user/equipment` - The caller's own listings

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use agriconnect_shared::auth::middleware::{AuthContext, MaybeAuth};
use agriconnect_shared::models::{
    equipment::{
        CreateEquipment, Equipment, EquipmentFilter, EquipmentSort, EquipmentStatus, PriceBand,
        UpdateEquipment, EQUIPMENT_TYPES,
    },
    reservation::Reservation,
    user::User,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

const DEFAULT_PER_PAGE: u32 = 10;

/// Browse query parameters
#[derive(Debug, Default, Deserialize)]
pub struct EquipmentListQuery {
    /// Exact category match
    #[serde(rename = "type")]
    pub equipment_type: Option<String>,

    /// "under-300" | "300-350" | "over-350"
    pub price_range: Option<String>,

    /// "now" restricts to active equipment
    pub availability: Option<String>,

    /// "price-low" | "price-high"; anything else sorts by recency
    pub sort_by: Option<String>,

    /// 1-indexed page
    pub page: Option<u32>,

    /// Page size (default 10)
    pub per_page: Option<u32>,
}

/// Paginated listing response
#[derive(Debug, Serialize)]
pub struct EquipmentListResponse {
    pub data: Vec<Value>,
    pub total: i64,
    pub current_page: u32,
    pub last_page: i64,
}

/// Serializes a listing with its image paths rewritten to the canonical
/// prefix form
fn equipment_json(equipment: &Equipment) -> ApiResult<Value> {
    let images = equipment.normalized_images();
    let mut value = serde_json::to_value(equipment)
        .map_err(|e| ApiError::Internal(format!("Serialization failed: {}", e)))?;
    value["images"] = json!(images);
    Ok(value)
}

/// Public browse listing
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<EquipmentListQuery>,
) -> ApiResult<Json<EquipmentListResponse>> {
    let filter = EquipmentFilter {
        equipment_type: query.equipment_type,
        price_band: query.price_range.as_deref().and_then(PriceBand::parse),
        available_now: query.availability.as_deref() == Some("now"),
    };
    let sort = query
        .sort_by
        .as_deref()
        .map(EquipmentSort::parse)
        .unwrap_or_default();

    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = i64::from(page - 1) * i64::from(per_page);

    let total = Equipment::count_filtered(&state.db, &filter).await?;
    let items =
        Equipment::list_filtered(&state.db, &filter, sort, i64::from(per_page), offset).await?;

    let data = items
        .iter()
        .map(equipment_json)
        .collect::<ApiResult<Vec<_>>>()?;

    let last_page = ((total + i64::from(per_page) - 1) / i64::from(per_page)).max(1);

    Ok(Json(EquipmentListResponse {
        data,
        total,
        current_page: page,
        last_page,
    }))
}

/// Public category list
pub async fn types() -> Json<Value> {
    Json(json!({ "data": EQUIPMENT_TYPES }))
}

/// Equipment detail
///
/// `is_owner` is true when the requester is the listing's owner or an
/// admin; only then is the reservation list included. Everyone else gets an
/// empty list rather than an error, hiding the existence of reservations
/// without blocking the detail fetch.
pub async fn show(
    State(state): State<AppState>,
    MaybeAuth(auth): MaybeAuth,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let equipment = Equipment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Equipment not found".to_string()))?;

    let is_owner = auth
        .as_ref()
        .map(|a| a.user_id == equipment.owner_id || a.is_admin)
        .unwrap_or(false);

    let reservations = if is_owner {
        Reservation::list_for_equipment(&state.db, equipment.id).await?
    } else {
        Vec::new()
    };

    let owner = User::find_by_id(&state.db, equipment.owner_id).await?;
    let owner_summary = owner.map(|u| {
        json!({
            "id": u.id,
            "name": u.name,
            "first_name": u.first_name,
        })
    });

    let mut payload = equipment_json(&equipment)?;
    payload["user"] = owner_summary.unwrap_or(Value::Null);

    Ok(Json(json!({
        "equipment": payload,
        "isOwner": is_owner,
        "reservations": reservations,
    })))
}

/// Create listing request
///
/// Field names are normalized to snake_case; the listing wizard's terms
/// checkbox must be accepted.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEquipmentRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 255, message = "Type is required"))]
    pub equipment_type: String,

    pub description: Option<String>,

    /// Stored image paths or URLs, at most 5
    #[serde(default)]
    #[validate(length(max = 5, message = "At most 5 images are allowed"))]
    pub images: Vec<String>,

    pub daily_rate: Option<f64>,

    #[validate(length(max = 32, message = "Pricing type must be at most 32 characters"))]
    pub pricing_type: Option<String>,
    pub min_price: Option<f64>,
    pub price_low: Option<f64>,
    pub price_medium: Option<f64>,
    pub price_high: Option<f64>,
    pub price_very_high: Option<f64>,
    pub deposit: Option<f64>,
    pub min_rental_days: Option<i32>,

    pub year: Option<i32>,

    #[serde(default)]
    pub is_business: bool,

    #[validate(length(max = 255))]
    pub contact_name: Option<String>,
    #[validate(length(max = 32))]
    pub contact_phone: Option<String>,

    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 255))]
    pub city: Option<String>,
    #[validate(length(max = 255))]
    pub state: Option<String>,
    #[validate(length(max = 32))]
    pub zip: Option<String>,
    #[validate(length(max = 255))]
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,

    pub terms_accepted: bool,

    pub available_seasons: Option<Vec<String>>,

    /// "draft" or "published" from the wizard; the stored row is forced to
    /// active regardless
    pub status: Option<String>,
}

/// Creates a new listing owned by the caller
///
/// The wizard may submit a `draft`/`published` status, but the stored row
/// always comes out `active`.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed (including unaccepted terms)
pub async fn create(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateEquipmentRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    req.validate()?;

    if !req.terms_accepted {
        return Err(ApiError::validation(
            "terms_accepted",
            "The terms must be accepted",
        ));
    }

    if let Some(ref status) = req.status {
        if !matches!(status.as_str(), "draft" | "published") {
            return Err(ApiError::validation(
                "status",
                "Status must be draft or published",
            ));
        }
    }

    let equipment = Equipment::create(
        &state.db,
        CreateEquipment {
            name: req.name,
            equipment_type: req.equipment_type,
            description: req.description,
            images: req.images,
            daily_rate: req.daily_rate,
            pricing_type: req.pricing_type,
            min_price: req.min_price,
            price_low: req.price_low,
            price_medium: req.price_medium,
            price_high: req.price_high,
            price_very_high: req.price_very_high,
            deposit: req.deposit,
            min_rental_days: req.min_rental_days,
            year: req.year,
            is_business: req.is_business,
            contact_name: req.contact_name,
            contact_phone: req.contact_phone,
            address: req.address,
            city: req.city,
            state: req.state,
            zip: req.zip,
            country: req.country,
            latitude: req.lat,
            longitude: req.lng,
            terms_accepted: req.terms_accepted,
            available_seasons: req.available_seasons,
            status: EquipmentStatus::Active,
            owner_id: auth.user_id,
        },
    )
    .await?;

    tracing::info!(
        equipment_id = equipment.id,
        owner_id = auth.user_id,
        "Equipment listing created"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Equipment created",
            "equipment": equipment_json(&equipment)?,
        })),
    ))
}

/// Update listing request; only present fields are written
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateEquipmentRequest {
    #[validate(length(min = 1, max = 255, message = "Name must not be empty"))]
    pub name: Option<String>,

    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 255, message = "Type must not be empty"))]
    pub equipment_type: Option<String>,

    pub description: Option<String>,
    pub daily_rate: Option<f64>,

    #[validate(length(max = 32))]
    pub pricing_type: Option<String>,
    pub min_price: Option<f64>,
    pub deposit: Option<f64>,
    pub min_rental_days: Option<i32>,

    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 255))]
    pub city: Option<String>,
    #[validate(length(max = 255))]
    pub state: Option<String>,
    #[validate(length(max = 32))]
    pub zip: Option<String>,
    #[validate(length(max = 255))]
    pub country: Option<String>,

    /// Any of draft/published/active/inactive; status changes are
    /// owner/admin-triggered only
    pub status: Option<String>,
}

/// Updates a listing
///
/// # Errors
///
/// - `403 Forbidden`: Caller is neither the owner nor an admin
/// - `404 Not Found`: Unknown equipment id
pub async fn update(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(req): Json<UpdateEquipmentRequest>,
) -> ApiResult<Json<Value>> {
    req.validate()?;

    let status = match req.status.as_deref() {
        Some(s) => Some(
            EquipmentStatus::parse(s)
                .ok_or_else(|| ApiError::validation("status", "Unknown status value"))?,
        ),
        None => None,
    };

    let equipment = Equipment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Equipment not found".to_string()))?;

    if equipment.owner_id != auth.user_id && !auth.is_admin {
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }

    let updated = Equipment::update(
        &state.db,
        id,
        UpdateEquipment {
            name: req.name,
            equipment_type: req.equipment_type,
            description: req.description,
            daily_rate: req.daily_rate,
            pricing_type: req.pricing_type,
            min_price: req.min_price,
            deposit: req.deposit,
            min_rental_days: req.min_rental_days,
            address: req.address,
            city: req.city,
            state: req.state,
            zip: req.zip,
            country: req.country,
            status,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Equipment not found".to_string()))?;

    Ok(Json(json!({
        "message": "Equipment updated",
        "equipment": equipment_json(&updated)?,
    })))
}

/// Deletes a listing
///
/// Reservations cascade with the row; stored image paths go with it
/// (binary image storage is external).
///
/// # Errors
///
/// - `403 Forbidden`: Caller is neither the owner nor an admin
/// - `404 Not Found`: Unknown equipment id
pub async fn destroy(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let equipment = Equipment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Equipment not found".to_string()))?;

    if equipment.owner_id != auth.user_id && !auth.is_admin {
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }

    Equipment::delete(&state.db, id).await?;

    tracing::info!(equipment_id = id, user_id = auth.user_id, "Equipment deleted");

    Ok(Json(json!({ "message": "Equipment deleted" })))
}

/// The caller's own listings
pub async fn my_equipment(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Value>> {
    let listings = Equipment::list_by_owner(&state.db, auth.user_id).await?;

    let data = listings
        .iter()
        .map(equipment_json)
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(Json(json!({ "data": data })))
}
