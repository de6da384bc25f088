/// Reservation model and the overlap-checked booking path
///
/// The one real invariant in the system lives here: no two reservations
/// with status `active` for the same equipment item may have overlapping
/// `[start_date, end_date]` intervals, bounds inclusive. Two calendar
/// ranges that merely touch on a boundary day therefore conflict.
///
/// [`Reservation::create_checked`] enforces the invariant by locking the
/// equipment row and running the conflict check and the insert inside one
/// transaction, so two concurrent booking requests for the same item
/// serialize instead of racing between check and insert. The
/// `no_overlapping_active_reservations` exclusion constraint in the schema
/// backstops anything that writes to the table outside this path.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE reservation_status AS ENUM ('pending', 'active', 'cancelled', 'completed');
///
/// CREATE TABLE equipment_reservations (
///     id BIGSERIAL PRIMARY KEY,
///     equipment_id BIGINT NOT NULL REFERENCES equipment(id) ON DELETE CASCADE,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     start_date DATE NOT NULL,
///     end_date DATE,
///     status reservation_status NOT NULL DEFAULT 'active',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;

use super::equipment::EquipmentStatus;

const RESERVATION_COLUMNS: &str =
    "id, equipment_id, user_id, start_date, end_date, status, created_at, updated_at";

/// Reservation status
///
/// Only `active` rows participate in conflict detection. No automatic
/// transitions are driven anywhere; the enum exists to validate assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reservation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Requested but not confirmed; does not block other bookings
    Pending,

    /// Confirmed booking; blocks overlapping requests
    Active,

    /// Cancelled by either party
    Cancelled,

    /// Rental period finished
    Completed,
}

impl ReservationStatus {
    /// Converts status to its database/wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Active => "active",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
        }
    }

    /// Whether a reservation in this status blocks overlapping bookings
    pub fn is_blocking(&self) -> bool {
        matches!(self, ReservationStatus::Active)
    }

    /// Parses a status string, rejecting unknown values
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReservationStatus::Pending),
            "active" => Some(ReservationStatus::Active),
            "cancelled" => Some(ReservationStatus::Cancelled),
            "completed" => Some(ReservationStatus::Completed),
            _ => None,
        }
    }
}

/// Error type for the booking path
///
/// Each variant maps onto one category of the API error taxonomy; the date
/// variants identify which constraint failed.
#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    /// The start date is before today
    #[error("The start date must be today or later")]
    StartDateInPast,

    /// The end date is not strictly after the start date
    #[error("The end date must be after the start date")]
    EndDateNotAfterStart,

    /// The equipment is missing or its status is not active
    #[error("Equipment not available for reservation")]
    NotAvailable,

    /// The requested range conflicts with an existing active reservation
    #[error("Equipment is already reserved for the selected period.")]
    Overlap,

    /// Underlying database failure
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Inclusive interval overlap test
///
/// Two calendar ranges overlap when they share at least one day:
/// `a.start <= b.end && a.end >= b.start`. This canonical form covers the
/// boundary-touch and full-containment cases the three-clause variant
/// spells out separately.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

/// Reservation model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reservation {
    /// Unique reservation id
    pub id: i64,

    /// Reserved equipment item
    pub equipment_id: i64,

    /// Renting user
    pub user_id: i64,

    /// First rental day (inclusive)
    pub start_date: NaiveDate,

    /// Last rental day (inclusive); nullable in the schema, required by the
    /// booking path
    pub end_date: Option<NaiveDate>,

    /// Current status
    pub status: ReservationStatus,

    /// When the reservation was created
    pub created_at: DateTime<Utc>,

    /// When the reservation was last updated
    pub updated_at: DateTime<Utc>,
}

/// A reservation joined with a summary of its equipment, for the renter's
/// own listing
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReservationWithEquipment {
    pub id: i64,
    pub equipment_id: i64,
    pub user_id: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,

    /// Equipment summary columns
    pub equipment_name: String,
    pub equipment_type: String,
    pub equipment_status: EquipmentStatus,
    pub daily_rate: Option<f64>,
    pub images: Json<Vec<String>>,
}

impl Reservation {
    /// Books an equipment item for a date range, enforcing the overlap
    /// invariant
    ///
    /// Validation order mirrors the severity of the failure:
    /// 1. `start_date >= today` and `end_date > start_date`
    /// 2. the equipment exists and its status is `active`
    /// 3. no existing `active` reservation for the item overlaps the range
    ///
    /// Steps 2 and 3 and the insert run inside one transaction holding a
    /// row lock on the equipment item, so concurrent requests for the same
    /// item cannot both pass the check.
    ///
    /// The new reservation is created with status `active` so it
    /// immediately participates in conflict detection. A successful booking
    /// inserts exactly one row; equipment status is never touched.
    ///
    /// # Errors
    ///
    /// - [`ReservationError::StartDateInPast`] / [`ReservationError::EndDateNotAfterStart`]
    ///   on date validation failure
    /// - [`ReservationError::NotAvailable`] when the equipment is missing
    ///   or not active
    /// - [`ReservationError::Overlap`] when the range conflicts with an
    ///   existing active reservation
    pub async fn create_checked(
        pool: &PgPool,
        equipment_id: i64,
        user_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Self, ReservationError> {
        if start_date < today {
            return Err(ReservationError::StartDateInPast);
        }
        if end_date <= start_date {
            return Err(ReservationError::EndDateNotAfterStart);
        }

        let mut tx = pool.begin().await?;

        // Lock the equipment row: concurrent bookings for the same item
        // queue up here instead of racing the conflict check.
        let equipment: Option<(i64, EquipmentStatus)> =
            sqlx::query_as("SELECT id, status FROM equipment WHERE id = $1 FOR UPDATE")
                .bind(equipment_id)
                .fetch_optional(&mut *tx)
                .await?;

        match equipment {
            Some((_, status)) if status.is_active() => {}
            _ => return Err(ReservationError::NotAvailable),
        }

        let existing: Vec<(NaiveDate, Option<NaiveDate>)> = sqlx::query_as(
            r#"
            SELECT start_date, end_date
            FROM equipment_reservations
            WHERE equipment_id = $1 AND status = 'active'
            "#,
        )
        .bind(equipment_id)
        .fetch_all(&mut *tx)
        .await?;

        let conflict = existing.iter().any(|(existing_start, existing_end)| {
            // A row with no end date occupies its start day only.
            let existing_end = existing_end.unwrap_or(*existing_start);
            ranges_overlap(start_date, end_date, *existing_start, existing_end)
        });
        if conflict {
            return Err(ReservationError::Overlap);
        }

        let reservation = sqlx::query_as::<_, Reservation>(&format!(
            r#"
            INSERT INTO equipment_reservations (equipment_id, user_id, start_date, end_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {RESERVATION_COLUMNS}
            "#,
        ))
        .bind(equipment_id)
        .bind(user_id)
        .bind(start_date)
        .bind(end_date)
        .bind(ReservationStatus::Active)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(reservation)
    }

    /// Finds a reservation by id
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let reservation = sqlx::query_as::<_, Reservation>(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM equipment_reservations WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(reservation)
    }

    /// Lists all reservations for an equipment item, newest start date
    /// first
    ///
    /// Callers gate this on ownership: the list is only exposed to the
    /// equipment's owner or an admin.
    pub async fn list_for_equipment(
        pool: &PgPool,
        equipment_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let reservations = sqlx::query_as::<_, Reservation>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM equipment_reservations
            WHERE equipment_id = $1
            ORDER BY start_date DESC
            "#,
        ))
        .bind(equipment_id)
        .fetch_all(pool)
        .await?;

        Ok(reservations)
    }

    /// Lists a renter's reservations, newest start date first, each joined
    /// with its equipment summary
    ///
    /// Unbounded by design: the per-user reservation count stays small at
    /// present scale.
    pub async fn list_for_user_with_equipment(
        pool: &PgPool,
        user_id: i64,
    ) -> Result<Vec<ReservationWithEquipment>, sqlx::Error> {
        let reservations = sqlx::query_as::<_, ReservationWithEquipment>(
            r#"
            SELECT r.id, r.equipment_id, r.user_id, r.start_date, r.end_date,
                   r.status, r.created_at,
                   e.name AS equipment_name,
                   e.equipment_type,
                   e.status AS equipment_status,
                   e.daily_rate,
                   e.images
            FROM equipment_reservations r
            JOIN equipment e ON e.id = r.equipment_id
            WHERE r.user_id = $1
            ORDER BY r.start_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(reservations)
    }

    /// Counts all reservations
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM equipment_reservations")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Counts rentals that are active and in progress on the given day
    pub async fn count_active_on(pool: &PgPool, day: NaiveDate) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM equipment_reservations
            WHERE status = 'active'
              AND start_date <= $1
              AND (end_date IS NULL OR end_date >= $1)
            "#,
        )
        .bind(day)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_status_as_str() {
        assert_eq!(ReservationStatus::Pending.as_str(), "pending");
        assert_eq!(ReservationStatus::Active.as_str(), "active");
        assert_eq!(ReservationStatus::Cancelled.as_str(), "cancelled");
        assert_eq!(ReservationStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_only_active_blocks() {
        assert!(ReservationStatus::Active.is_blocking());
        assert!(!ReservationStatus::Pending.is_blocking());
        assert!(!ReservationStatus::Cancelled.is_blocking());
        assert!(!ReservationStatus::Completed.is_blocking());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            ReservationStatus::parse("active"),
            Some(ReservationStatus::Active)
        );
        assert_eq!(ReservationStatus::parse("done"), None);
    }

    #[test]
    fn test_disjoint_ranges_do_not_overlap() {
        assert!(!ranges_overlap(
            date("2025-06-01"),
            date("2025-06-05"),
            date("2025-06-06"),
            date("2025-06-10"),
        ));
        assert!(!ranges_overlap(
            date("2025-06-06"),
            date("2025-06-10"),
            date("2025-06-01"),
            date("2025-06-05"),
        ));
    }

    #[test]
    fn test_partial_overlap() {
        // The booking scenario: [06-01, 06-05] already held, [06-03, 06-07]
        // requested.
        assert!(ranges_overlap(
            date("2025-06-03"),
            date("2025-06-07"),
            date("2025-06-01"),
            date("2025-06-05"),
        ));
    }

    #[test]
    fn test_boundary_day_counts_as_overlap() {
        // Inclusive bounds: sharing a single calendar day conflicts.
        assert!(ranges_overlap(
            date("2025-06-05"),
            date("2025-06-08"),
            date("2025-06-01"),
            date("2025-06-05"),
        ));
        assert!(ranges_overlap(
            date("2025-06-01"),
            date("2025-06-03"),
            date("2025-06-03"),
            date("2025-06-09"),
        ));
    }

    #[test]
    fn test_containment_both_directions() {
        // Candidate fully contains the existing range
        assert!(ranges_overlap(
            date("2025-06-01"),
            date("2025-06-30"),
            date("2025-06-10"),
            date("2025-06-12"),
        ));
        // Existing range fully contains the candidate
        assert!(ranges_overlap(
            date("2025-06-10"),
            date("2025-06-12"),
            date("2025-06-01"),
            date("2025-06-30"),
        ));
    }

    #[test]
    fn test_identical_ranges_overlap() {
        assert!(ranges_overlap(
            date("2025-06-01"),
            date("2025-06-05"),
            date("2025-06-01"),
            date("2025-06-05"),
        ));
    }
}
