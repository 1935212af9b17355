// Jikan API client - Unofficial MyAnimeList API
// API Documentation: https://docs.api.jikan.moe/
// Responses are passed through untouched, callers get the upstream JSON as-is

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

pub const JIKAN_API_BASE: &str = "https://api.jikan.moe/v4";

/// Upstream answered, but not with a success status
#[derive(Debug, thiserror::Error)]
#[error("Jikan returned {status} for {url}")]
pub struct JikanStatusError {
    pub status: StatusCode,
    pub url: String,
}

/// Thin Jikan client, no retries and no caching
#[derive(Debug, Clone)]
pub struct JikanClient {
    client: Client,
    base_url: String,
}

impl JikanClient {
    /// Create a client against the public Jikan API
    pub fn new() -> Self {
        Self::with_base_url(JIKAN_API_BASE, Duration::from_secs(30))
    }

    /// Create a client against a custom base URL (mirrors, tests)
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search anime by title
    pub async fn search_anime(&self, query: &str, limit: u32) -> Result<Value> {
        let url = format!(
            "{}/anime?q={}&limit={}",
            self.base_url,
            urlencoding::encode(query),
            limit
        );

        tracing::debug!("Jikan search: {}", query);

        self.get_json(&url)
            .await
            .context("Failed to search Jikan")
    }

    /// Get anime by MAL ID
    pub async fn get_anime_by_id(&self, mal_id: i64) -> Result<Value> {
        let url = format!("{}/anime/{}", self.base_url, mal_id);

        tracing::debug!("Jikan get anime: {}", mal_id);

        self.get_json(&url)
            .await
            .context("Failed to fetch anime from Jikan")
    }

    /// Get top anime, optionally narrowed by a Jikan filter
    /// (airing, upcoming, bypopularity, favorite)
    pub async fn get_top_anime(&self, limit: u32, filter: Option<&str>) -> Result<Value> {
        let mut url = format!("{}/top/anime?limit={}", self.base_url, limit);

        if let Some(f) = filter.filter(|f| !f.is_empty()) {
            url.push_str(&format!("&filter={}", urlencoding::encode(f)));
        }

        tracing::debug!("Jikan top anime: limit={} filter={:?}", limit, filter);

        self.get_json(&url)
            .await
            .context("Failed to fetch top anime from Jikan")
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Jikan request failed: {} - {}", status, url);
            return Err(JikanStatusError {
                status,
                url: url.to_string(),
            }
            .into());
        }

        response
            .json()
            .await
            .context("Failed to parse Jikan response")
    }
}

impl Default for JikanClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query},
        http::StatusCode as AxumStatus,
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;

    /// Start a local stand-in for Jikan and return its base URL.
    /// Query parameters are echoed back under "params" so tests can check them.
    pub(crate) async fn spawn_stub_jikan() -> String {
        async fn search(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
            Json(json!({
                "data": [{ "mal_id": 52991, "title": "Sousou no Frieren" }],
                "params": params,
            }))
        }

        async fn top(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
            Json(json!({
                "data": [{ "mal_id": 5114, "title": "Fullmetal Alchemist: Brotherhood" }],
                "params": params,
            }))
        }

        async fn by_id(Path(mal_id): Path<i64>) -> Result<Json<Value>, AxumStatus> {
            if mal_id == 52991 {
                Ok(Json(json!({
                    "data": { "mal_id": 52991, "title": "Sousou no Frieren", "episodes": 28 }
                })))
            } else {
                Err(AxumStatus::NOT_FOUND)
            }
        }

        let app = Router::new()
            .route("/anime", get(search))
            .route("/anime/:mal_id", get(by_id))
            .route("/top/anime", get(top));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    fn client(base_url: &str) -> JikanClient {
        JikanClient::with_base_url(base_url, Duration::from_secs(5))
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = client("http://localhost:1234/v4/");
        assert_eq!(client.base_url(), "http://localhost:1234/v4");
        assert_eq!(JikanClient::new().base_url(), JIKAN_API_BASE);
    }

    #[tokio::test]
    async fn test_search_passes_query_and_limit() {
        let base = spawn_stub_jikan().await;
        let result = client(&base).search_anime("Frieren & friends", 5).await.unwrap();

        assert_eq!(result["data"][0]["mal_id"], 52991);
        assert_eq!(result["params"]["q"], "Frieren & friends");
        assert_eq!(result["params"]["limit"], "5");
    }

    #[tokio::test]
    async fn test_top_anime_filter_is_optional() {
        let base = spawn_stub_jikan().await;
        let client = client(&base);

        let result = client.get_top_anime(10, None).await.unwrap();
        assert_eq!(result["params"]["limit"], "10");
        assert!(result["params"].get("filter").is_none());

        let result = client.get_top_anime(3, Some("airing")).await.unwrap();
        assert_eq!(result["params"]["filter"], "airing");
        assert_eq!(result["params"]["limit"], "3");
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let base = spawn_stub_jikan().await;
        let result = client(&base).get_anime_by_id(52991).await.unwrap();
        assert_eq!(result["data"]["episodes"], 28);
    }

    #[tokio::test]
    async fn test_upstream_status_is_an_error() {
        let base = spawn_stub_jikan().await;
        let err = client(&base).get_anime_by_id(1).await.unwrap_err();

        let status = err
            .downcast_ref::<JikanStatusError>()
            .map(|e| e.status)
            .unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_an_error() {
        // Nothing listens on the discard port
        let result = client("http://127.0.0.1:9").search_anime("Frieren", 5).await;
        assert!(result.is_err());
    }
}
