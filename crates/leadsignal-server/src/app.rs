use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Permissive CORS unless `LEADSIGNAL_CORS_ORIGINS` lists explicit origins.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if allowed.is_empty() {
        return permissive_cors();
    }
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `TraceLayer` logs every request/response via `tracing`.
/// 2. `CorsLayer` answers every OPTIONS request with an empty 200 and
///    decorates responses. The evaluate endpoint is always permissive since
///    it is called from browsers on other origins; the remaining routes
///    honour `LEADSIGNAL_CORS_ORIGINS`.
pub fn build_app(state: Arc<AppState>) -> Router {
    let evaluate = Router::new()
        .route(
            "/api/decision-triggers/evaluate",
            get(routes::evaluate::evaluate_triggers).post(routes::evaluate::evaluate_triggers),
        )
        .layer(permissive_cors());

    let api = Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/api/decision-triggers",
            get(routes::triggers::list_triggers).post(routes::triggers::create_trigger),
        )
        .route(
            "/api/decision-triggers/{id}",
            get(routes::triggers::get_trigger)
                .put(routes::triggers::update_trigger)
                .delete(routes::triggers::delete_trigger),
        )
        .route("/api/alerts", get(routes::alerts::list_alerts))
        .route(
            "/api/alerts/{id}/acknowledge",
            post(routes::alerts::acknowledge_alert),
        )
        .route(
            "/api/alerts/{id}/resolve",
            post(routes::alerts::resolve_alert),
        )
        .route("/api/leads", post(routes::leads::create_lead))
        .route(
            "/api/leads/{id}/quality",
            axum::routing::put(routes::leads::update_lead_quality),
        )
        .route(
            "/api/performance",
            post(routes::performance::ingest_performance),
        )
        .route(
            "/api/performance/import",
            post(routes::performance::import_performance_csv),
        )
        .route(
            "/api/dashboard/adsets",
            get(routes::dashboard::adset_metrics),
        )
        .route(
            "/api/dashboard/lead-quality",
            get(routes::dashboard::lead_quality),
        )
        .layer(cors_layer(&state.config.cors_origins));

    Router::new()
        .merge(evaluate)
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
