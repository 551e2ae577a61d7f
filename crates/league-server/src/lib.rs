//! League Portal API
//!
//! REST API for the league administration site and the team portal.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          LEAGUE PORTAL API                              │
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌───────────────┐   │
//! │  │   Forms &   │  │   Designs   │  │  Settings & │  │ Teams, Ledger │   │
//! │  │ Submissions │  │   Library   │  │   Emails    │  │   & Payouts   │   │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  └───────┬───────┘   │
//! │         │                │                │                 │           │
//! │  ┌──────▼────────────────▼────────────────▼─────────────────▼───────┐   │
//! │  │                          AppState                                │   │
//! │  │   in-memory stores  |  JSON documents on disk  |  Mailer port    │   │
//! │  └──────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//!
//!  Orders: commit ─► team commission ─► customer + supplier emails
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, MailConfig, ServerConfig};
pub use error::ApiError;
pub use models::*;
pub use state::AppState;

/// Build the API router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Form builder
        .nest("/forms", routes::forms::router())
        .nest("/submissions", routes::submissions::router())
        .route("/export/submissions", get(routes::submissions::export_submissions))
        .nest("/designs", routes::designs::router())
        // Administration
        .nest("/settings", routes::settings::router())
        // Team portal
        .nest("/teams", routes::teams::router())
        .route("/auth/team-login", post(routes::teams::team_login))
        .route("/stats/teams", get(routes::teams::team_stats))
        .route(
            "/revenue/player-registrations/:submission_id",
            post(routes::teams::credit_player_registration),
        )
        .nest("/kit-pricing", routes::teams::kit_pricing_router())
        .nest("/payouts", routes::payouts::router())
        // Shop
        .nest("/orders", routes::orders::router())
}
