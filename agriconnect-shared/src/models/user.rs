/// User model and database operations
///
/// Accounts carry a binary role flag (`is_admin`). The "super admin" is not
/// a stored attribute: it is the admin row with the smallest id, re-derived
/// by query at every authorization check so it survives deletions without
/// going stale.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     first_name VARCHAR(255),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     is_admin BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use agriconnect_shared::models::user::{User, CreateUser};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(
///     &pool,
///     CreateUser {
///         name: "Dupont".to_string(),
///         first_name: None,
///         email: "dupont@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     },
/// )
/// .await?;
///
/// let found = User::find_by_email(&pool, "dupont@example.com").await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

const USER_COLUMNS: &str =
    "id, name, first_name, email, password_hash, is_admin, created_at, updated_at";

/// User model representing a marketplace account
///
/// Passwords are stored as Argon2id hashes, never in plaintext, and the
/// hash is never serialized into responses.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user id
    pub id: i64,

    /// Account name (family name in the original data)
    pub name: String,

    /// Optional secondary name field
    pub first_name: Option<String>,

    /// Email address, unique across all users
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Admin flag; mutated only by an existing admin acting on another user
    pub is_admin: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Account name
    pub name: String,

    /// Optional secondary name field
    pub first_name: Option<String>,

    /// Email address (must be unique)
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,
}

/// Input for updating profile fields
#[derive(Debug, Clone)]
pub struct UpdateProfile {
    /// New account name
    pub name: String,

    /// New secondary name field (None clears it)
    pub first_name: Option<String>,

    /// New email address (must remain unique)
    pub email: String,
}

impl User {
    /// Creates a new user
    ///
    /// New accounts never carry the admin flag; promotion is a separate
    /// admin-gated operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint) or
    /// the database operation fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, first_name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(data.name)
        .bind(data.first_name)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by id
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1",
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates the profile fields of an account
    ///
    /// # Returns
    ///
    /// The updated user if found, None if the account doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if the new email is already taken by another
    /// account.
    pub async fn update_profile(
        pool: &PgPool,
        id: i64,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = $2, first_name = $3, email = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.first_name)
        .bind(data.email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Replaces the stored password hash
    pub async fn update_password_hash(
        pool: &PgPool,
        id: i64,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sets or clears the admin flag
    ///
    /// # Returns
    ///
    /// The updated user if found, None otherwise
    pub async fn set_admin(
        pool: &PgPool,
        id: i64,
        is_admin: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET is_admin = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(is_admin)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Deletes a user by id
    ///
    /// The account's equipment and reservations are removed by the
    /// database's cascade rules.
    ///
    /// # Returns
    ///
    /// True if a row was deleted, false if the account didn't exist
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users with pagination, newest accounts first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            ORDER BY id DESC
            LIMIT $1 OFFSET $2
            "#,
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Counts total number of users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Finds the super admin: the admin account with the smallest id
    ///
    /// Re-derived on every call rather than cached, so deleting the current
    /// super admin immediately promotes the next-lowest admin id.
    pub async fn find_super_admin(pool: &PgPool) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE is_admin = TRUE
            ORDER BY id ASC
            LIMIT 1
            "#,
        ))
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Checks whether the given user is the current super admin
    pub async fn is_super_admin(pool: &PgPool, user_id: i64) -> Result<bool, sqlx::Error> {
        let super_admin = Self::find_super_admin(pool).await?;
        Ok(super_admin.map(|u| u.id == user_id).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_struct() {
        let create_user = CreateUser {
            name: "Dupont".to_string(),
            first_name: Some("Jean".to_string()),
            email: "test@example.com".to_string(),
            password_hash: "hash".to_string(),
        };

        assert_eq!(create_user.email, "test@example.com");
        assert_eq!(create_user.first_name.as_deref(), Some("Jean"));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: 1,
            name: "Dupont".to_string(),
            first_name: None,
            email: "test@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            is_admin: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("test@example.com"));
    }

    // Integration tests for database operations are in the api crate's
    // tests/ directory.
}
