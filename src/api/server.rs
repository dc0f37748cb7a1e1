//! HTTP API server

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{require_auth, require_manager, TokenCodec};
use crate::config::Config;
use crate::error::Result;
use crate::store::{self, SharedStore};

use super::routes::{self, expenses, export, session, users, vacations, work_hours};

/// Application state shared across handlers. Read-only once built.
pub struct AppState {
    pub store: SharedStore,
    pub tokens: TokenCodec,
    pub bcrypt_cost: u32,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: SharedStore, tokens: TokenCodec, bcrypt_cost: u32) -> Self {
        Self {
            store,
            tokens,
            bcrypt_cost,
        }
    }

    /// Connect the configured store and load the signing secret
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = store::connect(&config.database).await?;
        let tokens = TokenCodec::new(config.auth.secret());
        if !tokens.is_configured() {
            tracing::warn!("JWT_SECRET is not set, every authenticated request will be refused");
        }
        Ok(Self::new(store, tokens, config.auth.bcrypt_cost))
    }
}

/// Run the HTTP API server
pub async fn run_server(config: Config, host: &str, port: u16) -> Result<()> {
    let state = Arc::new(AppState::from_config(&config).await?);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    serve(listener, state).await
}

/// Serve the API on an already bound listener
pub async fn serve(listener: TcpListener, state: SharedState) -> Result<()> {
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: SharedState) -> Router {
    let public = Router::new()
        .route("/login", post(session::login))
        .route("/welcome", post(session::login));

    // Any authenticated user, acting on their own records
    let own = Router::new()
        .route("/me", get(session::me))
        .route(
            "/work-hours",
            get(work_hours::list_own)
                .post(work_hours::upsert_own)
                .delete(work_hours::delete_own),
        )
        .route(
            "/vacations",
            get(vacations::list_own)
                .post(vacations::create_own)
                .delete(vacations::delete_own),
        )
        .route(
            "/expenses",
            get(expenses::list_own)
                .post(expenses::create_own)
                .delete(expenses::delete_own),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Layers run bottom-up: authentication first, then the role check
    let manager = Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/by-username/{username}", delete(users::delete_by_username))
        .route("/work-hours/manager", post(work_hours::upsert_for_user))
        .route("/work-hours/all", get(work_hours::list_all))
        .route(
            "/vacations/manager",
            post(vacations::set_for_user).delete(vacations::delete_for_user),
        )
        .route("/vacations/all", get(vacations::list_all))
        .route("/expenses/all", get(expenses::list_all))
        .route("/export", get(export::export))
        .route_layer(middleware::from_fn(require_manager))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(routes::health))
        .nest("/api", public.merge(own).merge(manager))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
