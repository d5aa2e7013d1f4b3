use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::scheduler::SessionReminderScheduler;

pub const SERVICE_NAME: &str = "gridscout-cron";

async fn health(State(scheduler): State<Arc<SessionReminderScheduler>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "job_running": scheduler.is_running(),
        "last_tick": scheduler.last_tick(),
    }))
}

pub fn router(scheduler: Arc<SessionReminderScheduler>) -> Router {
    Router::new()
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CorsLayer::permissive()),
        )
        .with_state(scheduler)
}
