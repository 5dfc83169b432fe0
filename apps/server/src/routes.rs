//! HTTP 路由
//!
//! - `POST /rpc`: 表单字段 `rpc` 携带 JSON 请求信封
//! - `POST /rpc/json`: 请求体即 JSON 信封
//! - 其余路径回退到静态资源目录
//!
//! 查询可能因同步门已满而阻塞，因此统一在阻塞线程池中处理。

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use saxis_motion::{QueryError, QueryResponse, QueryService};
use serde::Deserialize;
use std::path::Path;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// 表单请求
#[derive(Debug, Deserialize)]
pub struct RpcForm {
    /// JSON 请求信封（缺失时按空串处理，交给 JSON 解析报错）
    #[serde(default)]
    pub rpc: String,
}

/// 接口错误
#[derive(Debug)]
pub enum ApiError {
    /// 查询层错误
    Query(QueryError),
    /// 处理任务异常终止
    Internal(String),
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::Query(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Query(err @ QueryError::BadRequest(_)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            },
            ApiError::Query(err @ QueryError::Unavailable) => {
                (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            },
            ApiError::Internal(message) => {
                warn!("Query handler failed: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            },
        };
        (status, message).into_response()
    }
}

/// 构建路由
pub fn router(query: QueryService, dir: &Path) -> Router {
    Router::new()
        .route("/rpc", post(rpc_form))
        .route("/rpc/json", post(rpc_json))
        .fallback_service(ServeDir::new(dir))
        .layer(TraceLayer::new_for_http())
        .with_state(query)
}

async fn rpc_form(
    State(query): State<QueryService>,
    Form(form): Form<RpcForm>,
) -> Result<Json<QueryResponse>, ApiError> {
    dispatch(query, form.rpc).await
}

async fn rpc_json(
    State(query): State<QueryService>,
    body: String,
) -> Result<Json<QueryResponse>, ApiError> {
    dispatch(query, body).await
}

async fn dispatch(query: QueryService, body: String) -> Result<Json<QueryResponse>, ApiError> {
    let response = tokio::task::spawn_blocking(move || query.handle_json(&body))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(response))
}
