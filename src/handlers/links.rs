use crate::{
    error::{ApiError, ApiResult},
    models::ShortLink,
    shortid::ShortId,
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use url::Url;

// ── Request / response types ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ShortenRequest {
    url: String,
}

#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    short_id: String,
    short_url: String,
}

#[derive(Debug, Serialize)]
pub struct LinkView {
    short_id: String,
    full_url: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    short_id: String,
    full_url: String,
    created_at: NaiveDateTime,
}

/// Listing of every short link. `message` is only present when there are none.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    count: usize,
    links: Vec<LinkView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

impl From<ShortLink> for LinkView {
    fn from(link: ShortLink) -> Self {
        Self {
            short_id: link.short_id,
            full_url: link.target_url,
        }
    }
}

const NOT_FOUND: &str = "Short link not found";

// ── Handlers ───────────────────────────────────────────────────────────────

/// GET /
pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "URL shortener and task tracker.",
        "endpoints": [
            { "method": "GET", "path": "/", "description": "Service information" },
            { "method": "POST", "path": "/shorten", "description": "Create a short link",
              "request_body": { "url": "Absolute http(s) URL to shorten" } },
            { "method": "GET", "path": "/{short_id}", "description": "Redirect to the full URL" },
            { "method": "GET", "path": "/stats/{short_id}", "description": "Short link details" },
            { "method": "GET", "path": "/urls/all", "description": "List every short link" },
            { "method": "DELETE", "path": "/delete/{short_id}", "description": "Delete a short link" },
            { "method": "GET", "path": "/todo/items", "description": "List every task" },
            { "method": "POST", "path": "/todo/item", "description": "Create a task" }
        ]
    }))
}

/// POST /shorten
///
/// Returns 201 when a new short link is created and 200 when the URL had
/// already been shortened.
pub async fn shorten(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ShortenResponse>)> {
    let Json(request) = payload?;
    let target = normalize_target(&request.url)?;

    let allocation = state.allocator.allocate(&target).await?;
    cache_link(&state, allocation.link()).await?;

    let status = if allocation.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let short_id = allocation.into_link().short_id;

    Ok((
        status,
        Json(ShortenResponse {
            short_url: state.config.short_url(&short_id),
            short_id,
        }),
    ))
}

/// GET /stats/:short_id
pub async fn stats(
    State(state): State<Arc<AppState>>,
    Path(short_id): Path<String>,
) -> ApiResult<Json<StatsResponse>> {
    let link = find(&state, &short_id).await?;

    Ok(Json(StatsResponse {
        short_id: link.short_id,
        full_url: link.target_url,
        created_at: link.created_at,
    }))
}

/// GET /urls/all
pub async fn list_all(State(state): State<Arc<AppState>>) -> ApiResult<Json<ListResponse>> {
    let links: Vec<LinkView> = state
        .links
        .list_all()
        .await?
        .into_iter()
        .map(LinkView::from)
        .collect();

    let message = links.is_empty().then_some("No short links have been created");

    Ok(Json(ListResponse {
        count: links.len(),
        links,
        message,
    }))
}

/// DELETE /delete/:short_id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(short_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let short_id = ShortId::parse(&short_id).ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))?;

    if !state.links.delete_by_id(short_id.as_str()).await? {
        return Err(ApiError::NotFound(NOT_FOUND.into()));
    }

    // Row before cache entry; `cache_link` depends on this order.
    state.cache.remove(short_id.as_str());
    tracing::info!(%short_id, "Short link deleted");

    Ok(Json(json!({
        "message": format!("Short link {short_id} deleted")
    })))
}

// ── Helpers ────────────────────────────────────────────────────────────────

/// Look up a short link, treating malformed ids as absent.
pub(crate) async fn find(state: &AppState, short_id: &str) -> ApiResult<ShortLink> {
    let Some(short_id) = ShortId::parse(short_id) else {
        return Err(ApiError::NotFound(NOT_FOUND.into()));
    };

    state
        .links
        .find_by_id(short_id.as_str())
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))
}

/// Put a mapping in the resolve cache. If a delete removed the row while the
/// caller held it, the entry is dropped again so the link stays gone.
pub(crate) async fn cache_link(state: &AppState, link: &ShortLink) -> ApiResult<()> {
    state.cache.set(&link.short_id, &link.target_url);

    if state.links.find_by_id(&link.short_id).await?.is_none() {
        tracing::debug!(short_id = %link.short_id, "Link deleted while caching, evicted");
        state.cache.remove(&link.short_id);
    }
    Ok(())
}

/// Parse and re-serialise a target URL so equivalent spellings dedupe to the
/// same record. Only absolute http(s) URLs with a host are accepted.
fn normalize_target(raw: &str) -> ApiResult<String> {
    let parsed = Url::parse(raw.trim())
        .map_err(|e| ApiError::Unprocessable(format!("Invalid URL: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::Unprocessable(
            "URL must start with http:// or https://".into(),
        ));
    }
    if parsed.host().is_none() {
        return Err(ApiError::Unprocessable("URL must have a host".into()));
    }

    Ok(parsed.into())
}
