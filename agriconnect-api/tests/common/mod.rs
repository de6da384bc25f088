/// Common test utilities for integration tests
///
/// Provides shared infrastructure:
/// - Test database setup (migrate + truncate)
/// - Test user/equipment creation
/// - JWT token generation
/// - Request helpers driving the router as a tower service
///
/// The super-admin rule is global (MIN(id) over admins), so tests share one
/// database and serialize on [`DB_LOCK`] while each test starts from
/// truncated tables.

use agriconnect_api::app::{build_router, AppState};
use agriconnect_api::config::Config;
use agriconnect_shared::auth::jwt::{create_token, Claims};
use agriconnect_shared::models::equipment::{CreateEquipment, Equipment, EquipmentStatus};
use agriconnect_shared::models::user::{CreateUser, User};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Days, NaiveDate, Utc};
use serde_json::Value;
use sqlx::PgPool;
use tower::Service as _;
use uuid::Uuid;

/// Serializes integration tests: the super-admin derivation and the
/// dashboard counts are global, so concurrent tests would observe each
/// other's rows.
pub static DB_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
}

impl TestContext {
    /// Creates a new test context against a clean database
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Path relative to the crate's Cargo.toml
        sqlx::migrate!("../migrations").run(&db).await?;

        sqlx::query(
            "TRUNCATE TABLE equipment_reservations, equipment, users RESTART IDENTITY CASCADE",
        )
        .execute(&db)
        .await?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext { db, app, config })
    }

    /// Creates a user directly in the database
    ///
    /// The stored password hash is a placeholder; tests that exercise the
    /// login flow register through the API instead.
    pub async fn create_user(&self, name: &str) -> anyhow::Result<User> {
        let user = User::create(
            &self.db,
            CreateUser {
                name: name.to_string(),
                first_name: None,
                email: format!("{}-{}@example.com", name, Uuid::new_v4()),
                password_hash: "test_hash".to_string(),
            },
        )
        .await?;
        Ok(user)
    }

    /// Creates a user and grants the admin flag
    pub async fn create_admin(&self, name: &str) -> anyhow::Result<User> {
        let user = self.create_user(name).await?;
        let admin = User::set_admin(&self.db, user.id, true)
            .await?
            .expect("user just created");
        Ok(admin)
    }

    /// Creates an equipment listing owned by the given user
    pub async fn create_equipment(
        &self,
        owner_id: i64,
        status: EquipmentStatus,
        daily_rate: Option<f64>,
    ) -> anyhow::Result<Equipment> {
        let equipment = Equipment::create(
            &self.db,
            CreateEquipment {
                name: "Test Tractor".to_string(),
                equipment_type: "Tractors".to_string(),
                description: Some("A tractor for tests".to_string()),
                images: vec!["tractor.jpg".to_string()],
                daily_rate,
                pricing_type: None,
                min_price: None,
                price_low: None,
                price_medium: None,
                price_high: None,
                price_very_high: None,
                deposit: None,
                min_rental_days: None,
                year: Some(2020),
                is_business: false,
                contact_name: None,
                contact_phone: None,
                address: None,
                city: None,
                state: None,
                zip: None,
                country: None,
                latitude: None,
                longitude: None,
                terms_accepted: true,
                available_seasons: None,
                status,
                owner_id,
            },
        )
        .await?;
        Ok(equipment)
    }

    /// Returns a Bearer token for the given user id
    pub fn token_for(&self, user_id: i64) -> String {
        let claims = Claims::new(user_id);
        create_token(&claims, &self.config.jwt.secret).expect("token creation")
    }

    /// Sends a request through the router and returns status + JSON body
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request build"),
            None => builder.body(Body::empty()).expect("request build"),
        };

        let response = self.app.clone().call(request).await.expect("request send");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }
}

/// A date `n` days from today
pub fn days_from_today(n: u64) -> NaiveDate {
    Utc::now()
        .date_naive()
        .checked_add_days(Days::new(n))
        .expect("date in range")
}

/// A date `n` days before today
pub fn days_before_today(n: u64) -> NaiveDate {
    Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(n))
        .expect("date in range")
}
