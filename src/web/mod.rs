use std::sync::Arc;

use axum::{
    response::Json,
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::core::{CycleTrigger, RuleStore, StateStore};

pub mod handlers;
pub mod responses;

pub use handlers::{
    api_list_rules, api_run, api_state, delete_rule, results_page, run_now, save_rule,
    settings_page,
};
pub use responses::*;

/// Shared by every handler. The dashboard only talks to the watch cycle
/// through the rule and state files plus `runner`.
#[derive(Clone)]
pub struct AppState {
    pub rules: RuleStore,
    pub state: StateStore,
    pub runner: Arc<dyn CycleTrigger>,
    /// Held for the whole of a manual run so two runs never overlap.
    pub run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(rules: RuleStore, state: StateStore, runner: Arc<dyn CycleTrigger>) -> Self {
        Self {
            rules,
            state,
            runner,
            run_lock: Arc::new(Mutex::new(())),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .route("/", get(results_page))
        .route("/run", post(run_now))
        .route("/settings", get(settings_page))
        .route("/settings/rules", post(save_rule))
        .route("/settings/rules/delete", post(delete_rule))
        .layer(
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            ),
        )
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/rules", get(api_list_rules))
        .route("/state", get(api_state))
        .route("/run", post(api_run))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "price-watcher"
    }))
}
