// HTTP request handlers
use crate::application::filtering::{AlertFilter, RobotFilter, SortKey};
use crate::domain::alert::{Alert, AlertDraft, AlertSummary};
use crate::domain::error::FleetError;
use crate::domain::firmware::FirmwareFile;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::infrastructure::ndjson_stream::stream_updates;
use crate::presentation::app_state::AppState;
use async_trait::async_trait;
use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Path, Query, Request, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

const DEFAULT_ACKNOWLEDGER: &str = "operator";

/// Maps domain failures onto status codes with a `{"error": ...}` body.
pub struct ApiError(FleetError);

impl From<FleetError> for ApiError {
    fn from(err: FleetError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            FleetError::RobotNotFound(_)
            | FleetError::AlertNotFound(_)
            | FleetError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            FleetError::UpdateInProgress(_) => StatusCode::CONFLICT,
            FleetError::NoFirmwareSelected | FleetError::InvalidValue { .. } => StatusCode::BAD_REQUEST,
        };
        tracing::warn!(status = status.as_u16(), error = %self.0, "request rejected");
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult = Result<Response, ApiError>;

/// `Query` whose rejection is reported like every other `FleetError`.
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| FleetError::InvalidValue {
                field: "query",
                value: rejection.body_text(),
            })?;
        Ok(Self(value))
    }
}

/// `Json` body with the same error shape.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| FleetError::InvalidValue {
                field: "body",
                value: rejection.body_text(),
            })?;
        Ok(Self(value))
    }
}

async fn respond<T: Serialize>(headers: &HeaderMap, status: StatusCode, data: &T) -> Response {
    match json_response(status, data, accepts_brotli(headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TableQuery {
    pub sort: Option<SortKey>,
    pub page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SortRequest {
    pub sort: SortKey,
}

#[derive(Debug, Deserialize)]
pub struct PageRequest {
    pub page: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct AckRequest {
    pub by: Option<String>,
}

impl AckRequest {
    fn acknowledger(body: Option<Json<AckRequest>>) -> String {
        body.and_then(|Json(req)| req.by)
            .filter(|by| !by.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ACKNOWLEDGER.to_string())
    }
}

#[derive(Serialize)]
struct AlertList {
    summary: AlertSummary,
    alerts: Vec<Alert>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Filtered, sorted and paginated robots. Stateless: the shared table
/// view lives under `/view`.
pub async fn list_robots(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    ApiQuery(filter): ApiQuery<RobotFilter>,
    ApiQuery(table): ApiQuery<TableQuery>,
) -> Response {
    let view = state
        .fleet
        .query_robots(filter, table.sort.unwrap_or_default(), table.page.unwrap_or(1))
        .await;
    respond(&headers, StatusCode::OK, &view).await
}

pub async fn get_robot(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let robot = state.fleet.robot(&id).await?;
    Ok(respond(&headers, StatusCode::OK, &robot).await)
}

pub async fn fleet_kpi(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    respond(&headers, StatusCode::OK, &state.fleet.kpi().await).await
}

pub async fn kpi_history(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    respond(&headers, StatusCode::OK, &state.fleet.kpi_history().await).await
}

pub async fn fleet_distributions(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    respond(&headers, StatusCode::OK, &state.fleet.distributions().await).await
}

pub async fn filter_options(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    respond(&headers, StatusCode::OK, &state.fleet.filter_options().await).await
}

/// Recent change log, newest first.
pub async fn recent_updates(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    respond(&headers, StatusCode::OK, &state.fleet.recent_updates().await).await
}

pub async fn connection_status(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    respond(&headers, StatusCode::OK, &state.fleet.connection().await).await
}

/// Live feed: the recent log replayed oldest first, then every new update
/// until the client goes away or the server shuts down.
pub async fn stream_fleet_updates(State(state): State<Arc<AppState>>) -> Response {
    if state.shutdown.is_triggered() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "server is shutting down" })),
        )
            .into_response();
    }
    let (backlog, rx) = state.fleet.follow_updates().await;
    let shutdown = state.shutdown.clone();
    stream_updates(backlog, rx, async move { shutdown.triggered().await }).into_response()
}

pub async fn table_view(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    respond(&headers, StatusCode::OK, &state.fleet.table_view().await).await
}

pub async fn set_view_filter(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    ApiJson(filter): ApiJson<RobotFilter>,
) -> Response {
    respond(&headers, StatusCode::OK, &state.fleet.set_table_filter(filter).await).await
}

pub async fn set_view_sort(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SortRequest>,
) -> Response {
    respond(&headers, StatusCode::OK, &state.fleet.set_table_sort(req.sort).await).await
}

pub async fn set_view_page(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<PageRequest>,
) -> Response {
    respond(&headers, StatusCode::OK, &state.fleet.set_table_page(req.page).await).await
}

pub async fn reset_view(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    respond(&headers, StatusCode::OK, &state.fleet.reset_table().await).await
}

pub async fn list_alerts(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    ApiQuery(filter): ApiQuery<AlertFilter>,
) -> Response {
    let list = AlertList {
        summary: state.fleet.alert_summary().await,
        alerts: state.fleet.alerts(&filter).await,
    };
    respond(&headers, StatusCode::OK, &list).await
}

pub async fn raise_alert(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    ApiJson(draft): ApiJson<AlertDraft>,
) -> ApiResult {
    let alert = state.fleet.raise_alert(draft).await?;
    Ok(respond(&headers, StatusCode::CREATED, &alert).await)
}

pub async fn acknowledge_alert(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<AckRequest>>,
) -> ApiResult {
    let by = AckRequest::acknowledger(body);
    let alert = state.fleet.acknowledge_alert(&id, &by).await?;
    Ok(respond(&headers, StatusCode::OK, &alert).await)
}

pub async fn acknowledge_all_alerts(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    body: Option<Json<AckRequest>>,
) -> Response {
    let by = AckRequest::acknowledger(body);
    let count = state.fleet.acknowledge_all(&by).await;
    respond(&headers, StatusCode::OK, &json!({ "acknowledged": count })).await
}

pub async fn dismiss_alert(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let alert = state.fleet.dismiss_alert(&id).await?;
    Ok(respond(&headers, StatusCode::OK, &alert).await)
}

pub async fn clear_acknowledged(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let count = state.fleet.clear_acknowledged().await;
    respond(&headers, StatusCode::OK, &json!({ "removed": count })).await
}

/// Open (or rejoin) the detail telemetry session for a known robot.
pub async fn start_session(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    state.fleet.robot(&id).await?;
    let snapshot = state.sessions.start(&id).await;
    Ok(respond(&headers, StatusCode::CREATED, &snapshot).await)
}

pub async fn get_session(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let snapshot = state.sessions.snapshot(&id).await?;
    Ok(respond(&headers, StatusCode::OK, &snapshot).await)
}

pub async fn stop_session(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult {
    state.sessions.stop(&id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn firmware_status(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    state.fleet.robot(&id).await?;
    let update = state.firmware.status(&id).await;
    Ok(respond(&headers, StatusCode::OK, &update).await)
}

pub async fn select_firmware_file(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(file): ApiJson<FirmwareFile>,
) -> ApiResult {
    state.fleet.robot(&id).await?;
    let update = state.firmware.select_file(&id, file).await?;
    Ok(respond(&headers, StatusCode::OK, &update).await)
}

pub async fn start_firmware_update(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    state.fleet.robot(&id).await?;
    let update = state.firmware.start(&id).await?;
    Ok(respond(&headers, StatusCode::ACCEPTED, &update).await)
}

pub async fn reset_firmware_update(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    state.fleet.robot(&id).await?;
    let update = state.firmware.reset(&id).await?;
    Ok(respond(&headers, StatusCode::OK, &update).await)
}
