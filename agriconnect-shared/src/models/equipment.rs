/// Equipment model and database operations
///
/// Listings are owned by exactly one user and gated by status: only rows
/// with status `active` are visible for reservation. Status changes are
/// owner/admin-triggered only; a successful reservation never flips the
/// status.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE equipment_status AS ENUM ('draft', 'published', 'active', 'inactive');
///
/// CREATE TABLE equipment (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     equipment_type VARCHAR(255) NOT NULL,
///     description TEXT,
///     images JSONB NOT NULL DEFAULT '[]',
///     daily_rate DOUBLE PRECISION,
///     -- pricing, location, and listing fields elided
///     status equipment_status NOT NULL DEFAULT 'draft',
///     owner_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;

const EQUIPMENT_COLUMNS: &str = "id, name, equipment_type, description, images, daily_rate, \
     pricing_type, min_price, price_low, price_medium, price_high, price_very_high, \
     deposit, min_rental_days, year, is_business, contact_name, contact_phone, \
     address, city, state, zip, country, latitude, longitude, terms_accepted, \
     available_seasons, status, owner_id, created_at, updated_at";

/// The fixed category list exposed to clients
pub const EQUIPMENT_TYPES: [&str; 6] = [
    "Tractors",
    "Harvesters",
    "Planters",
    "Irrigation",
    "Seeders",
    "Sprayers",
];

/// Price band boundaries for the browse filter, compared against
/// `daily_rate`
const PRICE_BAND_LOW: f64 = 300.0;
const PRICE_BAND_HIGH: f64 = 350.0;

/// Canonical prefix for stored image paths
const IMAGE_PREFIX: &str = "storage/equipment/";

/// Equipment listing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "equipment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EquipmentStatus {
    /// Listing saved mid-wizard, not publicly visible
    Draft,

    /// Listing submitted but not yet reservable
    Published,

    /// Publicly visible and open for reservation
    Active,

    /// Withdrawn by the owner or an admin
    Inactive,
}

impl EquipmentStatus {
    /// Converts status to its database/wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentStatus::Draft => "draft",
            EquipmentStatus::Published => "published",
            EquipmentStatus::Active => "active",
            EquipmentStatus::Inactive => "inactive",
        }
    }

    /// Only active equipment can be reserved or browsed as available
    pub fn is_active(&self) -> bool {
        matches!(self, EquipmentStatus::Active)
    }

    /// Parses a status string, rejecting unknown values
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(EquipmentStatus::Draft),
            "published" => Some(EquipmentStatus::Published),
            "active" => Some(EquipmentStatus::Active),
            "inactive" => Some(EquipmentStatus::Inactive),
            _ => None,
        }
    }
}

/// Price band filter over `daily_rate`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBand {
    /// daily_rate < 300
    Under300,

    /// 300 <= daily_rate <= 350
    Between300And350,

    /// daily_rate > 350
    Over350,
}

impl PriceBand {
    /// Parses the browse filter's wire value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "under-300" => Some(PriceBand::Under300),
            "300-350" => Some(PriceBand::Between300And350),
            "over-350" => Some(PriceBand::Over350),
            _ => None,
        }
    }

    fn sql_condition(&self) -> String {
        match self {
            PriceBand::Under300 => format!("daily_rate < {PRICE_BAND_LOW}"),
            PriceBand::Between300And350 => {
                format!("daily_rate BETWEEN {PRICE_BAND_LOW} AND {PRICE_BAND_HIGH}")
            }
            PriceBand::Over350 => format!("daily_rate > {PRICE_BAND_HIGH}"),
        }
    }
}

/// Sort order for the public listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EquipmentSort {
    /// Price ascending
    PriceAsc,

    /// Price descending
    PriceDesc,

    /// Most recent listings first
    #[default]
    Newest,
}

impl EquipmentSort {
    /// Parses the browse sort's wire value; unknown values fall back to
    /// recency
    pub fn parse(s: &str) -> Self {
        match s {
            "price-low" => EquipmentSort::PriceAsc,
            "price-high" => EquipmentSort::PriceDesc,
            _ => EquipmentSort::Newest,
        }
    }

    fn order_clause(&self) -> &'static str {
        match self {
            EquipmentSort::PriceAsc => "ORDER BY daily_rate ASC",
            EquipmentSort::PriceDesc => "ORDER BY daily_rate DESC",
            EquipmentSort::Newest => "ORDER BY id DESC",
        }
    }
}

/// Browse filters for the public listing
#[derive(Debug, Clone, Default)]
pub struct EquipmentFilter {
    /// Exact match on the category string
    pub equipment_type: Option<String>,

    /// Price band over `daily_rate`
    pub price_band: Option<PriceBand>,

    /// Restrict to equipment available right now (status = active)
    pub available_now: bool,
}

impl EquipmentFilter {
    /// Builds the WHERE clause and returns it along with the number of
    /// bind parameters it consumes
    fn where_clause(&self) -> (String, usize) {
        let mut clause = String::from("WHERE 1=1");
        let mut binds = 0;

        if self.equipment_type.is_some() {
            binds += 1;
            clause.push_str(&format!(" AND equipment_type = ${binds}"));
        }
        if let Some(band) = self.price_band {
            clause.push_str(&format!(" AND {}", band.sql_condition()));
        }
        if self.available_now {
            clause.push_str(" AND status = 'active'");
        }

        (clause, binds)
    }
}

/// Equipment model representing a listing
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Equipment {
    /// Unique equipment id
    pub id: i64,

    /// Listing title
    pub name: String,

    /// Free-form category string
    pub equipment_type: String,

    /// Long description
    pub description: Option<String>,

    /// Stored image paths (binary storage is external)
    pub images: Json<Vec<String>>,

    /// The price the browse filters compare against
    pub daily_rate: Option<f64>,

    /// "minimum" or "tiered"
    pub pricing_type: Option<String>,

    /// Single minimum price (when pricing_type = "minimum")
    pub min_price: Option<f64>,

    /// Tiered demand pricing (when pricing_type = "tiered")
    pub price_low: Option<f64>,
    pub price_medium: Option<f64>,
    pub price_high: Option<f64>,
    pub price_very_high: Option<f64>,

    /// Security deposit
    pub deposit: Option<f64>,

    /// Minimum rental period in days
    pub min_rental_days: Option<i32>,

    /// Manufacturing year
    pub year: Option<i32>,

    /// Whether the lister is a business
    pub is_business: bool,

    /// Listing contact fields
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,

    /// Location fields
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Whether the lister accepted the terms
    pub terms_accepted: bool,

    /// Seasons the equipment is offered for
    pub available_seasons: Option<Json<Vec<String>>>,

    /// Listing status; only `active` rows are reservable
    pub status: EquipmentStatus,

    /// Owning user
    pub owner_id: i64,

    /// When the listing was created
    pub created_at: DateTime<Utc>,

    /// When the listing was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new listing
#[derive(Debug, Clone)]
pub struct CreateEquipment {
    pub name: String,
    pub equipment_type: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub daily_rate: Option<f64>,
    pub pricing_type: Option<String>,
    pub min_price: Option<f64>,
    pub price_low: Option<f64>,
    pub price_medium: Option<f64>,
    pub price_high: Option<f64>,
    pub price_very_high: Option<f64>,
    pub deposit: Option<f64>,
    pub min_rental_days: Option<i32>,
    pub year: Option<i32>,
    pub is_business: bool,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub terms_accepted: bool,
    pub available_seasons: Option<Vec<String>>,
    pub status: EquipmentStatus,
    pub owner_id: i64,
}

/// A listing row for the admin moderation view, joined with its owner's
/// name fields
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminEquipmentRow {
    pub id: i64,
    pub name: String,
    pub equipment_type: String,
    pub daily_rate: Option<f64>,
    pub min_price: Option<f64>,
    pub status: EquipmentStatus,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub owner_name: String,
    pub owner_first_name: Option<String>,
}

impl AdminEquipmentRow {
    /// Display price: the filterable daily rate, falling back to the
    /// listing's minimum price
    pub fn display_price(&self) -> Option<f64> {
        self.daily_rate.or(self.min_price)
    }

    /// Owner's full display name
    pub fn owner_display_name(&self) -> String {
        match &self.owner_first_name {
            Some(first_name) => format!("{} {}", self.owner_name, first_name),
            None => self.owner_name.clone(),
        }
    }
}

/// Input for updating a listing; only non-None fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateEquipment {
    pub name: Option<String>,
    pub equipment_type: Option<String>,
    pub description: Option<String>,
    pub daily_rate: Option<f64>,
    pub pricing_type: Option<String>,
    pub min_price: Option<f64>,
    pub deposit: Option<f64>,
    pub min_rental_days: Option<i32>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub status: Option<EquipmentStatus>,
}

impl Equipment {
    /// Creates a new listing
    pub async fn create(pool: &PgPool, data: CreateEquipment) -> Result<Self, sqlx::Error> {
        let equipment = sqlx::query_as::<_, Equipment>(&format!(
            r#"
            INSERT INTO equipment (
                name, equipment_type, description, images, daily_rate,
                pricing_type, min_price, price_low, price_medium, price_high,
                price_very_high, deposit, min_rental_days, year, is_business,
                contact_name, contact_phone, address, city, state, zip,
                country, latitude, longitude, terms_accepted,
                available_seasons, status, owner_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24,
                    $25, $26, $27, $28)
            RETURNING {EQUIPMENT_COLUMNS}
            "#,
        ))
        .bind(data.name)
        .bind(data.equipment_type)
        .bind(data.description)
        .bind(Json(data.images))
        .bind(data.daily_rate)
        .bind(data.pricing_type)
        .bind(data.min_price)
        .bind(data.price_low)
        .bind(data.price_medium)
        .bind(data.price_high)
        .bind(data.price_very_high)
        .bind(data.deposit)
        .bind(data.min_rental_days)
        .bind(data.year)
        .bind(data.is_business)
        .bind(data.contact_name)
        .bind(data.contact_phone)
        .bind(data.address)
        .bind(data.city)
        .bind(data.state)
        .bind(data.zip)
        .bind(data.country)
        .bind(data.latitude)
        .bind(data.longitude)
        .bind(data.terms_accepted)
        .bind(data.available_seasons.map(Json))
        .bind(data.status)
        .bind(data.owner_id)
        .fetch_one(pool)
        .await?;

        Ok(equipment)
    }

    /// Finds a listing by id
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let equipment = sqlx::query_as::<_, Equipment>(&format!(
            "SELECT {EQUIPMENT_COLUMNS} FROM equipment WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(equipment)
    }

    /// Lists filtered, sorted, paginated listings for the public browse page
    pub async fn list_filtered(
        pool: &PgPool,
        filter: &EquipmentFilter,
        sort: EquipmentSort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let (where_clause, binds) = filter.where_clause();
        let query = format!(
            "SELECT {EQUIPMENT_COLUMNS} FROM equipment {where_clause} {} LIMIT ${} OFFSET ${}",
            sort.order_clause(),
            binds + 1,
            binds + 2,
        );

        let mut q = sqlx::query_as::<_, Equipment>(&query);
        if let Some(ref equipment_type) = filter.equipment_type {
            q = q.bind(equipment_type);
        }
        q = q.bind(limit).bind(offset);

        let equipment = q.fetch_all(pool).await?;

        Ok(equipment)
    }

    /// Counts listings matching the browse filters (pagination metadata)
    pub async fn count_filtered(
        pool: &PgPool,
        filter: &EquipmentFilter,
    ) -> Result<i64, sqlx::Error> {
        let (where_clause, _) = filter.where_clause();
        let query = format!("SELECT COUNT(*) FROM equipment {where_clause}");

        let mut q = sqlx::query_as::<_, (i64,)>(&query);
        if let Some(ref equipment_type) = filter.equipment_type {
            q = q.bind(equipment_type);
        }

        let (count,) = q.fetch_one(pool).await?;

        Ok(count)
    }

    /// Lists all listings owned by a user, newest first
    pub async fn list_by_owner(pool: &PgPool, owner_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let equipment = sqlx::query_as::<_, Equipment>(&format!(
            r#"
            SELECT {EQUIPMENT_COLUMNS}
            FROM equipment
            WHERE owner_id = $1
            ORDER BY id DESC
            "#,
        ))
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(equipment)
    }

    /// Updates a listing; only non-None fields are written
    ///
    /// # Returns
    ///
    /// The updated listing if found, None otherwise
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateEquipment,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE equipment SET updated_at = NOW()");
        let mut bind_count = 1;

        let mut push_field = |field: &str, present: bool| {
            if present {
                bind_count += 1;
                query.push_str(&format!(", {field} = ${bind_count}"));
            }
        };

        push_field("name", data.name.is_some());
        push_field("equipment_type", data.equipment_type.is_some());
        push_field("description", data.description.is_some());
        push_field("daily_rate", data.daily_rate.is_some());
        push_field("pricing_type", data.pricing_type.is_some());
        push_field("min_price", data.min_price.is_some());
        push_field("deposit", data.deposit.is_some());
        push_field("min_rental_days", data.min_rental_days.is_some());
        push_field("address", data.address.is_some());
        push_field("city", data.city.is_some());
        push_field("state", data.state.is_some());
        push_field("zip", data.zip.is_some());
        push_field("country", data.country.is_some());
        push_field("status", data.status.is_some());

        query.push_str(&format!(" WHERE id = $1 RETURNING {EQUIPMENT_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Equipment>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(equipment_type) = data.equipment_type {
            q = q.bind(equipment_type);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(daily_rate) = data.daily_rate {
            q = q.bind(daily_rate);
        }
        if let Some(pricing_type) = data.pricing_type {
            q = q.bind(pricing_type);
        }
        if let Some(min_price) = data.min_price {
            q = q.bind(min_price);
        }
        if let Some(deposit) = data.deposit {
            q = q.bind(deposit);
        }
        if let Some(min_rental_days) = data.min_rental_days {
            q = q.bind(min_rental_days);
        }
        if let Some(address) = data.address {
            q = q.bind(address);
        }
        if let Some(city) = data.city {
            q = q.bind(city);
        }
        if let Some(state) = data.state {
            q = q.bind(state);
        }
        if let Some(zip) = data.zip {
            q = q.bind(zip);
        }
        if let Some(country) = data.country {
            q = q.bind(country);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }

        let equipment = q.fetch_optional(pool).await?;

        Ok(equipment)
    }

    /// Lists listings for the admin moderation view, optionally filtered
    /// by status, newest first, each row joined with its owner's name
    /// fields
    pub async fn list_for_admin(
        pool: &PgPool,
        status: Option<EquipmentStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AdminEquipmentRow>, sqlx::Error> {
        let mut query = String::from(
            "SELECT e.id, e.name, e.equipment_type, e.daily_rate, e.min_price, \
             e.status, e.owner_id, e.created_at, \
             u.name AS owner_name, u.first_name AS owner_first_name \
             FROM equipment e \
             JOIN users u ON u.id = e.owner_id",
        );
        let mut bind_count = 0;
        if status.is_some() {
            bind_count += 1;
            query.push_str(&format!(" WHERE e.status = ${bind_count}"));
        }
        query.push_str(&format!(
            " ORDER BY e.id DESC LIMIT ${} OFFSET ${}",
            bind_count + 1,
            bind_count + 2,
        ));

        let mut q = sqlx::query_as::<_, AdminEquipmentRow>(&query);
        if let Some(status) = status {
            q = q.bind(status);
        }
        q = q.bind(limit).bind(offset);

        let rows = q.fetch_all(pool).await?;

        Ok(rows)
    }

    /// Counts listings for the admin moderation view
    pub async fn count_for_admin(
        pool: &PgPool,
        status: Option<EquipmentStatus>,
    ) -> Result<i64, sqlx::Error> {
        let count = if let Some(status) = status {
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM equipment WHERE status = $1")
                    .bind(status)
                    .fetch_one(pool)
                    .await?;
            count
        } else {
            Self::count(pool).await?
        };

        Ok(count)
    }

    /// Deletes a listing
    ///
    /// Its reservations are removed by the database's cascade rules; stored
    /// image paths go with the row.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts total number of listings
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM equipment")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Returns the listing's image paths rewritten to the canonical prefix
    /// form
    pub fn normalized_images(&self) -> Vec<String> {
        self.images.0.iter().map(|s| normalize_image_path(s)).collect()
    }
}

/// Rewrites an image path to the canonical `storage/equipment/` prefix form
///
/// Stored paths arrive in three shapes (bare file names, `equipment/…`, and
/// already-canonical `storage/equipment/…`, any of them with a leading
/// slash); all collapse to the same prefix on the way out.
pub fn normalize_image_path(img: &str) -> String {
    let img = img.trim_start_matches('/');
    if img.starts_with(IMAGE_PREFIX) {
        img.to_string()
    } else if img.starts_with("equipment/") {
        format!("storage/{img}")
    } else {
        format!("{IMAGE_PREFIX}{img}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(EquipmentStatus::Draft.as_str(), "draft");
        assert_eq!(EquipmentStatus::Published.as_str(), "published");
        assert_eq!(EquipmentStatus::Active.as_str(), "active");
        assert_eq!(EquipmentStatus::Inactive.as_str(), "inactive");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(EquipmentStatus::parse("active"), Some(EquipmentStatus::Active));
        assert_eq!(EquipmentStatus::parse("draft"), Some(EquipmentStatus::Draft));
        assert_eq!(EquipmentStatus::parse("bogus"), None);
    }

    #[test]
    fn test_only_active_is_reservable() {
        assert!(EquipmentStatus::Active.is_active());
        assert!(!EquipmentStatus::Draft.is_active());
        assert!(!EquipmentStatus::Published.is_active());
        assert!(!EquipmentStatus::Inactive.is_active());
    }

    #[test]
    fn test_price_band_parse() {
        assert_eq!(PriceBand::parse("under-300"), Some(PriceBand::Under300));
        assert_eq!(PriceBand::parse("300-350"), Some(PriceBand::Between300And350));
        assert_eq!(PriceBand::parse("over-350"), Some(PriceBand::Over350));
        assert_eq!(PriceBand::parse("free"), None);
    }

    #[test]
    fn test_sort_parse_falls_back_to_newest() {
        assert_eq!(EquipmentSort::parse("price-low"), EquipmentSort::PriceAsc);
        assert_eq!(EquipmentSort::parse("price-high"), EquipmentSort::PriceDesc);
        assert_eq!(EquipmentSort::parse("anything"), EquipmentSort::Newest);
    }

    #[test]
    fn test_normalize_image_path() {
        assert_eq!(
            normalize_image_path("tractor.jpg"),
            "storage/equipment/tractor.jpg"
        );
        assert_eq!(
            normalize_image_path("/tractor.jpg"),
            "storage/equipment/tractor.jpg"
        );
        assert_eq!(
            normalize_image_path("equipment/tractor.jpg"),
            "storage/equipment/tractor.jpg"
        );
        assert_eq!(
            normalize_image_path("/storage/equipment/tractor.jpg"),
            "storage/equipment/tractor.jpg"
        );
        assert_eq!(
            normalize_image_path("storage/equipment/tractor.jpg"),
            "storage/equipment/tractor.jpg"
        );
    }

    #[test]
    fn test_filter_where_clause() {
        let filter = EquipmentFilter {
            equipment_type: Some("Tractors".to_string()),
            price_band: Some(PriceBand::Under300),
            available_now: true,
        };
        let (clause, binds) = filter.where_clause();
        assert_eq!(binds, 1);
        assert!(clause.contains("equipment_type = $1"));
        assert!(clause.contains("daily_rate < 300"));
        assert!(clause.contains("status = 'active'"));

        let (clause, binds) = EquipmentFilter::default().where_clause();
        assert_eq!(binds, 0);
        assert_eq!(clause, "WHERE 1=1");
    }
}
