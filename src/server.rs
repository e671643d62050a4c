//! JSON API over the dashboard, dataset previews and the chatbot.

use crate::dashboard::{preview, DashboardSummary, DatasetView, EXPLORER_ROWS, ORDERS_PREVIEW_ROWS};
use crate::data::text::to_json_rows;
use crate::data::CoffeeData;
use crate::error::AssistantError;
use crate::llm::{Explanation, ExplanationAdapter};
use crate::resolver::{is_blank_query, resolve, QueryAnswer, QueryKind};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

pub struct AppState {
    pub data: Arc<CoffeeData>,
    pub adapter: ExplanationAdapter,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::Query(message) => Self {
                status: StatusCode::NOT_FOUND,
                message,
            },
            other => {
                error!("Internal error: {}", other);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "An unexpected error occurred.".to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    pub rows: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    pub question: String,
    #[serde(default)]
    pub ai: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatResponseBody {
    pub kind: QueryKind,
    pub result: serde_json::Value,
    pub ai_enabled: bool,
    pub explanation: Option<String>,
    pub explanation_failed: bool,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/dashboard", get(dashboard))
        .route("/api/orders", get(orders_preview))
        .route("/api/tables/{name}", get(table_preview))
        .route("/api/chat", post(chat))
        .with_state(state)
}

pub async fn serve(addr: &str, state: Arc<AppState>) -> crate::error::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "coffee-assistant",
        "ai_enabled": state.adapter.is_enabled(),
    }))
}

pub async fn dashboard(State(state): State<Arc<AppState>>) -> ApiResult<DashboardSummary> {
    Ok(Json(DashboardSummary::build(&state.data)?))
}

pub async fn orders_preview(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PreviewParams>,
) -> ApiResult<serde_json::Value> {
    let rows = params.rows.unwrap_or(ORDERS_PREVIEW_ROWS);
    Ok(Json(to_json_rows(&preview(state.data.merged(), rows))?))
}

pub async fn table_preview(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<PreviewParams>,
) -> ApiResult<serde_json::Value> {
    let view: DatasetView = name.parse()?;
    let rows = params.rows.unwrap_or(EXPLORER_ROWS);
    Ok(Json(to_json_rows(&preview(view.frame(&state.data), rows))?))
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequestBody>,
) -> ApiResult<ChatResponseBody> {
    if is_blank_query(&body.question) {
        return Err(ApiError::bad_request("Question is required"));
    }

    let merged = state.data.merged();
    let resolution = resolve(&body.question, merged)?;
    let result = match &resolution.answer {
        QueryAnswer::Rows(df) => {
            let mut table = to_json_rows(df)?;
            table["type"] = json!("rows");
            table
        }
        QueryAnswer::Message(message) => json!({ "type": "message", "message": message }),
    };

    let explanation = state.adapter.explain(merged, &body.question, body.ai).await;

    Ok(Json(ChatResponseBody {
        kind: resolution.kind,
        result,
        ai_enabled: state.adapter.is_active(body.ai),
        explanation: explanation.message().map(str::to_string),
        explanation_failed: explanation == Explanation::Failed,
    }))
}
