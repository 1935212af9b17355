// Watch-time calculation endpoint

use axum::{routing::post, Json, Router};
use serde::Deserialize;
use std::sync::Arc;

use super::error::ApiError;
use super::extract::ApiJson;
use crate::services::watch_time::{
    self, CalculationError, CalculationRequest, CalculationResult, PacingMode,
    DEFAULT_EPISODE_DURATION,
};
use crate::AppState;

/// Request body as sent by clients: three optional pacing selectors
#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    pub total_episodes: i64,
    #[serde(default = "default_episode_duration")]
    pub episode_duration: i64,
    pub episodes_per_day: Option<i64>,
    pub minutes_per_day: Option<i64>,
    /// YYYY-MM-DD
    pub target_date: Option<String>,
}

fn default_episode_duration() -> i64 {
    DEFAULT_EPISODE_DURATION
}

impl TryFrom<CalculateRequest> for CalculationRequest {
    type Error = CalculationError;

    fn try_from(body: CalculateRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            total_episodes: body.total_episodes,
            episode_duration: body.episode_duration,
            mode: PacingMode::from_selectors(
                body.episodes_per_day,
                body.minutes_per_day,
                body.target_date,
            )?,
        })
    }
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/calculate", post(calculate_watch_time))
        .route("/calculate/", post(calculate_watch_time))
}

/// POST /calculate
async fn calculate_watch_time(
    ApiJson(body): ApiJson<CalculateRequest>,
) -> Result<Json<CalculationResult>, ApiError> {
    let request = CalculationRequest::try_from(body)?;

    let result = watch_time::calculate(&request, watch_time::local_today()).map_err(|e| {
        tracing::debug!(
            "Rejected calculation ({}): {}",
            e.field().unwrap_or("pacing selector"),
            e
        );
        e
    })?;

    tracing::debug!(
        "Calculated {} episodes: {} days, finish {}",
        request.total_episodes,
        result.days_required,
        result.finish_date
    );

    Ok(Json(result))
}
