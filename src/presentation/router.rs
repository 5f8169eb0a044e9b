// Route table for the fleet API
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::*;
use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    // JSON responses are compressed by hand in `json_response`; only the
    // long-lived NDJSON feed goes through CompressionLayer.
    let stream = Router::new()
        .route("/fleet/stream", get(stream_fleet_updates))
        .layer(CompressionLayer::new());

    Router::new()
        .route("/healthz", get(health_check))
        .route("/robots", get(list_robots))
        .route("/robots/:id", get(get_robot))
        .route("/fleet/kpi", get(fleet_kpi))
        .route("/fleet/kpi/history", get(kpi_history))
        .route("/fleet/distributions", get(fleet_distributions))
        .route("/fleet/filters", get(filter_options))
        .route("/fleet/updates", get(recent_updates))
        .route("/fleet/connection", get(connection_status))
        .route("/view", get(table_view))
        .route("/view/filter", post(set_view_filter))
        .route("/view/sort", post(set_view_sort))
        .route("/view/page", post(set_view_page))
        .route("/view/reset", post(reset_view))
        .route("/alerts", get(list_alerts).post(raise_alert))
        .route("/alerts/ack-all", post(acknowledge_all_alerts))
        .route("/alerts/clear-acknowledged", post(clear_acknowledged))
        .route("/alerts/:id/ack", post(acknowledge_alert))
        .route("/alerts/:id", delete(dismiss_alert))
        .route(
            "/robots/:id/session",
            get(get_session).post(start_session).delete(stop_session),
        )
        .route("/robots/:id/firmware", get(firmware_status))
        .route("/robots/:id/firmware/file", post(select_firmware_file))
        .route("/robots/:id/firmware/start", post(start_firmware_update))
        .route("/robots/:id/firmware/reset", post(reset_firmware_update))
        .merge(stream)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
