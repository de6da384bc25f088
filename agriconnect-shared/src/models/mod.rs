/// Database models for AgriConnect
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: Marketplace accounts, the admin flag, and the derived
///   super-admin rule
/// - `equipment`: Listings with pricing, location, and status gating
/// - `reservation`: Booking records and the overlap-checked create path
///
/// # Example
///
/// ```no_run
/// use agriconnect_shared::models::user::{User, CreateUser};
/// use agriconnect_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(
///     &pool,
///     CreateUser {
///         name: "Dupont".to_string(),
///         first_name: Some("Jean".to_string()),
///         email: "jean@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod equipment;
pub mod reservation;
pub mod user;
