// Anime catalog endpoints
// Pass-through lookups against Jikan, upstream JSON is returned unchanged

use axum::{extract::State, routing::get, Json, Router};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::error::ApiError;
use super::extract::{ApiPath, ApiQuery};
use crate::AppState;

/// Shortest search term we forward upstream
const MIN_QUERY_LEN: usize = 3;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    pub limit: Option<u32>,
    /// airing, upcoming, bypopularity or favorite
    pub filter: Option<String>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", get(search_anime))
        .route("/popular", get(get_popular_anime))
        .route("/:mal_id", get(get_anime_details))
}

/// GET /anime/search?q=...&limit=10
async fn search_anime(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let q = query
        .q
        .ok_or_else(|| ApiError::Validation("Query parameter 'q' is required".to_string()))?;

    if q.chars().count() < MIN_QUERY_LEN {
        return Err(ApiError::Validation(format!(
            "Query parameter 'q' must be at least {} characters",
            MIN_QUERY_LEN
        )));
    }

    let limit = query.limit.unwrap_or(state.config.jikan.default_limit);

    state
        .jikan
        .search_anime(&q, limit)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::warn!("Anime search for '{}' failed: {:#}", q, e);
            ApiError::Upstream(format!("{:#}", e))
        })
}

/// GET /anime/popular?limit=10&filter=airing
async fn get_popular_anime(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<PopularQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = query.limit.unwrap_or(state.config.jikan.default_limit);

    state
        .jikan
        .get_top_anime(limit, query.filter.as_deref())
        .await
        .map(Json)
        .map_err(|e| {
            tracing::warn!("Popular anime lookup failed: {:#}", e);
            ApiError::Upstream(format!("{:#}", e))
        })
}

/// GET /anime/{mal_id}
/// Any upstream failure is reported as not found
async fn get_anime_details(
    State(state): State<Arc<AppState>>,
    ApiPath(mal_id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    state.jikan.get_anime_by_id(mal_id).await.map(Json).map_err(|e| {
        tracing::debug!("Anime {} lookup failed: {:#}", mal_id, e);
        ApiError::NotFound("Anime not found".to_string())
    })
}
