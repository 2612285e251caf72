use crate::assistant::AssistantClient;
use crate::cadastre::CadastreClient;
use crate::geo::catalog;
use crate::recognition::RecognitionClient;
use crate::service::{ConversionOutput, ConversionService};
use crate::session::OutputMode;
use crate::usage::UsageStore;
use crate::utils::GeoAssistError;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppContext {
    pub service: ConversionService,
    pub assistant: Arc<AssistantClient>,
    pub recognition: Arc<RecognitionClient>,
    pub cadastre: Arc<CadastreClient>,
    pub usage: Arc<UsageStore>,
}

struct ApiFailure(GeoAssistError);

impl From<GeoAssistError> for ApiFailure {
    fn from(e: GeoAssistError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GeoAssistError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GeoAssistError::DailyLimitReached { .. } => StatusCode::TOO_MANY_REQUESTS,
            GeoAssistError::ApiError(_) => StatusCode::BAD_GATEWAY,
            GeoAssistError::SetupIncomplete { .. }
            | GeoAssistError::ValidationError(_)
            | GeoAssistError::UnknownCrs(_)
            | GeoAssistError::InvalidZone(_)
            | GeoAssistError::ZoneNotResolved(_)
            | GeoAssistError::NoCoordinatesRecognized
            | GeoAssistError::RecognitionUncertain
            | GeoAssistError::InvalidCadastralNumber(_)
            | GeoAssistError::TransformFailed { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({
            "error": self.0.to_string(),
            "retryable": self.0.is_retryable(),
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiFailure>;

#[derive(Deserialize)]
struct CrsKeyBody {
    key: String,
}

#[derive(Deserialize)]
struct ZoneBody {
    zone: u32,
}

#[derive(Deserialize)]
struct OutputBody {
    mode: OutputMode,
}

#[derive(Deserialize)]
struct ConvertTextBody {
    text: String,
}

#[derive(Deserialize)]
struct AskBody {
    user_id: i64,
    question: String,
    mode_hint: Option<String>,
}

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/crs", get(list_crs))
        .route("/sessions/:user_id", get(session_state))
        .route("/sessions/:user_id/open", post(open_session))
        .route("/sessions/:user_id/source", post(select_source))
        .route("/sessions/:user_id/destination", post(select_dest))
        .route("/sessions/:user_id/zone", post(select_zone))
        .route("/sessions/:user_id/output", post(select_output))
        .route("/sessions/:user_id/ready", post(confirm_ready))
        .route("/sessions/:user_id/reset", post(reset_session))
        .route("/sessions/:user_id/convert/text", post(convert_text))
        .route("/sessions/:user_id/convert/file", post(convert_file))
        .route("/sessions/:user_id/convert/photo", post(convert_photo))
        .route("/ask", post(ask))
        .route("/cadastre/:number", get(cadastre_lookup))
        .route("/usage/report", get(usage_report))
        .with_state(ctx)
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "geoassist",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_crs() -> impl IntoResponse {
    let systems: Vec<_> = catalog::entries()
        .iter()
        .map(|e| {
            json!({
                "key": e.key,
                "label": e.label,
                "family": e.family,
            })
        })
        .collect();
    Json(json!({
        "systems": systems,
        "zone_pages": [catalog::zone_page(0), catalog::zone_page(1)],
    }))
}

async fn session_state(
    State(ctx): State<AppContext>,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    let (step, summary) = ctx.service.setup_summary(user_id).await;
    Json(json!({ "step": step, "setup": summary }))
}

async fn open_session(
    State(ctx): State<AppContext>,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    let step = ctx.service.open(user_id).await;
    Json(json!({ "step": step }))
}

async fn select_source(
    State(ctx): State<AppContext>,
    Path(user_id): Path<i64>,
    Json(body): Json<CrsKeyBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let step = ctx.service.select_source(user_id, &body.key).await?;
    Ok(Json(json!({ "step": step })))
}

async fn select_dest(
    State(ctx): State<AppContext>,
    Path(user_id): Path<i64>,
    Json(body): Json<CrsKeyBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let step = ctx.service.select_dest(user_id, &body.key).await?;
    Ok(Json(json!({ "step": step })))
}

async fn select_zone(
    State(ctx): State<AppContext>,
    Path(user_id): Path<i64>,
    Json(body): Json<ZoneBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let step = ctx.service.select_zone(user_id, body.zone).await?;
    Ok(Json(json!({ "step": step })))
}

async fn select_output(
    State(ctx): State<AppContext>,
    Path(user_id): Path<i64>,
    Json(body): Json<OutputBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let step = ctx.service.select_output(user_id, body.mode).await?;
    Ok(Json(json!({ "step": step })))
}

async fn confirm_ready(
    State(ctx): State<AppContext>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    let step = ctx.service.confirm_ready(user_id).await?;
    Ok(Json(json!({ "step": step })))
}

async fn reset_session(
    State(ctx): State<AppContext>,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    ctx.service.reset(user_id).await;
    Json(json!({ "step": "unconfigured" }))
}

async fn convert_text(
    State(ctx): State<AppContext>,
    Path(user_id): Path<i64>,
    Json(body): Json<ConvertTextBody>,
) -> ApiResult<Response> {
    let output = ctx.service.convert_text(user_id, &body.text).await?;
    Ok(conversion_response(output))
}

async fn convert_file(
    State(ctx): State<AppContext>,
    Path(user_id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> ApiResult<Response> {
    let name = params
        .get("name")
        .map(|s| s.as_str())
        .unwrap_or("upload.txt");
    let output = ctx.service.convert_file(user_id, name, &body).await?;
    Ok(conversion_response(output))
}

async fn convert_photo(
    State(ctx): State<AppContext>,
    Path(user_id): Path<i64>,
    body: Bytes,
) -> ApiResult<Response> {
    let recognized = ctx.recognition.recognize(body.to_vec()).await?;
    let output = ctx.service.convert_recognized(user_id, &recognized).await?;
    Ok(conversion_response(output))
}

fn conversion_response(output: ConversionOutput) -> Response {
    match output {
        ConversionOutput::Inline(table) => {
            Json(json!({ "mode": "inline", "table": table })).into_response()
        }
        ConversionOutput::File(file) => {
            let mut headers = HeaderMap::new();
            headers.insert(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("text/csv; charset=utf-8"),
            );
            if let Ok(disposition) =
                format!("attachment; filename=\"{}\"", file.filename).parse()
            {
                headers.insert(header::CONTENT_DISPOSITION, disposition);
            }
            (headers, file.bytes).into_response()
        }
    }
}

async fn ask(
    State(ctx): State<AppContext>,
    Json(body): Json<AskBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let usage = ctx.usage.record_request(body.user_id)?;
    let answer = ctx
        .assistant
        .ask(&body.question, body.mode_hint.as_deref())
        .await?;
    Ok(Json(json!({
        "answer": answer,
        "requests_today": usage.count_today,
    })))
}

async fn cadastre_lookup(
    State(ctx): State<AppContext>,
    Path(number): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let record = ctx.cadastre.lookup(&number).await?;
    Ok(Json(json!({
        "number": number.trim(),
        "found": !record.is_empty(),
        "record": record,
    })))
}

async fn usage_report(State(ctx): State<AppContext>) -> ApiResult<Json<serde_json::Value>> {
    let report = ctx.usage.report()?;
    Ok(Json(serde_json::to_value(report).map_err(GeoAssistError::from)?))
}
