use crate::{error::ApiResult, handlers::links, AppState};
use axum::{
    extract::{Path, State},
    response::Redirect,
};
use std::sync::Arc;

/// GET /:short_id
///
/// 1. Check the in-memory cache for the short id (fast path, no store hit).
/// 2. On a cache miss, fall back to the link store and backfill the cache,
///    unless the link was deleted in the meantime.
/// 3. Return a 307 redirect to the target URL, or 404.
pub async fn redirect(
    State(state): State<Arc<AppState>>,
    Path(short_id): Path<String>,
) -> ApiResult<Redirect> {
    if let Some(target) = state.cache.get(&short_id) {
        return Ok(Redirect::temporary(&target));
    }

    let link = links::find(&state, &short_id).await?;
    links::cache_link(&state, &link).await?;

    Ok(Redirect::temporary(&link.target_url))
}
