// Local JSON API mirroring the upstream operations for a browser UI
use crate::error::{CentralError, Result};
use crate::models::{Credentials, NewLocalSite};
use crate::session::SessionManager;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct LoginRequest {
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    all: Option<bool>,
    page: Option<u64>,
    #[serde(rename = "pageTotal")]
    page_total: Option<bool>,
}

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = std::result::Result<T, ApiError>;

/// Map the error taxonomy onto local HTTP statuses; the upstream status and
/// body stay verbatim inside the error text for diagnostic display
fn api_error(err: CentralError) -> ApiError {
    let status = match &err {
        CentralError::MissingCredentials | CentralError::TokenRequestFailed { .. } => {
            StatusCode::UNAUTHORIZED
        }
        CentralError::MissingSession
        | CentralError::IdentityResolutionFailed
        | CentralError::InvalidSite(_) => StatusCode::BAD_REQUEST,
        CentralError::UpstreamRequestFailed { .. } => StatusCode::BAD_GATEWAY,
        CentralError::Transport(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "ok": false, "error": err.to_string() })))
}

async fn api_login(
    State(manager): State<Arc<SessionManager>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let client_id = request.client_id.trim().to_string();
    let client_secret = request.client_secret.trim().to_string();
    // Missing fields are a malformed request, not an auth failure
    if client_id.is_empty() || client_secret.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "client_id and client_secret are required" })),
        ));
    }

    let facts = manager
        .login(Credentials {
            client_id,
            client_secret,
        })
        .await
        .map_err(api_error)?;

    Ok(Json(json!({
        "ok": true,
        "tenantId": facts.tenant_id,
        "dataRegion": facts.data_region,
        "apiBase": facts.api_base,
    })))
}

async fn api_list(
    State(manager): State<Arc<SessionManager>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Value>> {
    // All pages by default, like the original proxy
    if query.all.unwrap_or(true) {
        let listing = manager.list_local_sites().await.map_err(api_error)?;
        return Ok(Json(json!({
            "ok": true,
            "items": listing.items,
            "pages": { "total": listing.total_pages },
        })));
    }

    let page = query.page.unwrap_or(1);
    let body = manager
        .fetch_page(page, query.page_total.unwrap_or(true))
        .await
        .map_err(api_error)?;
    let items = crate::sites::page_items(&body).to_vec();
    Ok(Json(json!({ "ok": true, "items": items })))
}

async fn api_add(
    State(manager): State<Arc<SessionManager>>,
    Json(site): Json<NewLocalSite>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    site.validate().map_err(api_error)?;
    let created = manager.add_local_site(site).await.map_err(api_error)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "ok": true, "item": created })),
    ))
}

async fn api_delete(
    State(manager): State<Arc<SessionManager>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    manager.delete_local_site(&id).await.map_err(api_error)?;
    Ok(Json(json!({ "ok": true })))
}

pub fn router(manager: Arc<SessionManager>) -> Router {
    Router::new()
        .route("/api/login", post(api_login))
        .route("/api/local-sites", get(api_list).post(api_add))
        .route("/api/local-sites/{id}", axum::routing::delete(api_delete))
        .with_state(manager)
}

/// Run the proxy until the process is terminated
pub async fn serve(listen: SocketAddr, manager: Arc<SessionManager>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!("Proxy listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(manager)).await?;
    Ok(())
}
