/// Application state and router builder
///
/// This module defines the shared application state and provides a function
/// to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use agriconnect_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = agriconnect_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use agriconnect_shared::auth::{jwt, middleware::AuthContext};
use agriconnect_shared::models::user::User;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Uses Arc
/// internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// /
/// ├── GET  /health                       # Health check (public)
/// ├── POST /register, POST /login        # Unauthenticated
/// ├── GET  /equipment                    # Public browse
/// ├── GET  /equipment/types              # Public category list
/// ├── GET  /equipment/:id                # Public detail (more for owners)
/// ├── POST /equipment                    # Authenticated
/// ├── PUT/DELETE /equipment/:id          # Owner or admin
/// ├── POST /equipment/:id/reserve        # Authenticated, non-owner flow
/// ├── GET  /user, /user/equipment, /user/reservations
/// ├── PUT  /user/update, /user/password
/// ├── GET  /reservations/:id             # Renter or admin
/// └── /admin/...                         # Admin-gated, super-admin inside
/// ```
///
/// # Auth
///
/// One middleware resolves the Bearer token (when present) into an
/// [`AuthContext`] holding the user id and a fresh admin flag read from the
/// database. Handlers then declare their requirement through extractors:
/// `AuthContext` (401 when absent), `MaybeAuth`, or `AdminContext` (403).
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let api_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        // Auth (unauthenticated)
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        // Account
        .route("/user", get(routes::users::me))
        .route("/user/update", put(routes::users::update_profile))
        .route("/user/password", put(routes::users::update_password))
        .route("/user/equipment", get(routes::equipment::my_equipment))
        .route(
            "/user/reservations",
            get(routes::reservations::user_reservations),
        )
        // Equipment
        .route(
            "/equipment",
            get(routes::equipment::list).post(routes::equipment::create),
        )
        .route("/equipment/types", get(routes::equipment::types))
        .route(
            "/equipment/:id",
            get(routes::equipment::show)
                .put(routes::equipment::update)
                .delete(routes::equipment::destroy),
        )
        .route("/equipment/:id/reserve", post(routes::reservations::reserve))
        // Reservations
        .route("/reservations/:id", get(routes::reservations::show))
        // Admin
        .route("/admin/users", get(routes::admin::list_users))
        .route("/admin/users/:id", delete(routes::admin::delete_user))
        .route("/admin/promote/:id", post(routes::admin::promote))
        .route("/admin/demote/:id", post(routes::admin::demote))
        .route("/admin/dashboard", get(routes::admin::dashboard))
        .route("/admin/equipment", get(routes::admin::list_equipment))
        .route(
            "/admin/equipment/:id",
            delete(routes::admin::delete_equipment),
        );

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    api_routes
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_context_layer,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Resolves the Bearer token into an [`AuthContext`] request extension
///
/// Public routes stay reachable without credentials, so this layer never
/// rejects: it only inserts the context when a valid token resolves to an
/// existing account. The admin flag is read from the database here, not
/// from token claims, so role changes take effect on the next request.
async fn auth_context_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if let Some(token) = token {
        if let Ok(claims) = jwt::validate_token(token, state.jwt_secret()) {
            match User::find_by_id(&state.db, claims.sub).await {
                Ok(Some(user)) => {
                    req.extensions_mut().insert(AuthContext {
                        user_id: user.id,
                        is_admin: user.is_admin,
                    });
                }
                Ok(None) => {
                    // Token for a deleted account; treat as unauthenticated.
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to load user for auth context");
                }
            }
        }
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    // AppState and build_router are exercised end-to-end by the
    // integration tests in tests/.
}
