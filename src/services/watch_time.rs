// Watch-time calculator
// Turns an episode count and a pacing choice into total time, day count and finish date.

use chrono::{Days, Local, NaiveDate};
use serde::Serialize;

/// Minutes per episode when the caller does not say otherwise
pub const DEFAULT_EPISODE_DURATION: i64 = 24;

/// Calendar date format used on the wire (no time-of-day component)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// How the viewer wants to pace the series
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacingMode {
    /// Fixed number of episodes each day
    EpisodesPerDay(i64),
    /// Fixed viewing budget in minutes each day
    MinutesPerDay(i64),
    /// Finish by a given `YYYY-MM-DD` date
    TargetDate(String),
}

impl PacingMode {
    /// Resolve the three optional selectors into a single mode.
    ///
    /// When several are given the first one wins, in the order
    /// episodes_per_day, minutes_per_day, target_date.
    pub fn from_selectors(
        episodes_per_day: Option<i64>,
        minutes_per_day: Option<i64>,
        target_date: Option<String>,
    ) -> Result<Self, CalculationError> {
        episodes_per_day
            .map(Self::EpisodesPerDay)
            .or_else(|| minutes_per_day.map(Self::MinutesPerDay))
            .or_else(|| target_date.map(Self::TargetDate))
            .ok_or(CalculationError::MissingSelector)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationRequest {
    pub total_episodes: i64,
    pub episode_duration: i64,
    pub mode: PacingMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationResult {
    pub total_minutes: i64,
    pub total_hours: f64,
    pub days_required: i64,
    pub finish_date: String,
    pub episodes_per_day: Option<f64>,
    pub minutes_per_day: Option<i64>,
}

/// Every variant is a caller-correctable input problem
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalculationError {
    #[error("Total episodes must be positive")]
    NonPositiveEpisodes,

    #[error("Episode duration must be positive")]
    NonPositiveDuration,

    #[error("Episodes per day must be positive")]
    NonPositiveEpisodesPerDay,

    #[error("Minutes per day must be positive")]
    NonPositiveMinutesPerDay,

    #[error("Invalid date format. Use YYYY-MM-DD")]
    InvalidDateFormat,

    #[error("Target date must be in the future")]
    TargetDateNotInFuture,

    #[error("Must provide episodes_per_day, minutes_per_day, or target_date")]
    MissingSelector,

    #[error("Watch time is too large to schedule")]
    OutOfRange,
}

impl CalculationError {
    /// Request field the error refers to, `None` when no single field is at fault
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::NonPositiveEpisodes | Self::OutOfRange => Some("total_episodes"),
            Self::NonPositiveDuration => Some("episode_duration"),
            Self::NonPositiveEpisodesPerDay => Some("episodes_per_day"),
            Self::NonPositiveMinutesPerDay => Some("minutes_per_day"),
            Self::InvalidDateFormat | Self::TargetDateNotInFuture => Some("target_date"),
            Self::MissingSelector => None,
        }
    }
}

/// Current local calendar date
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Compute the schedule for `request` as seen from `today`
pub fn calculate(
    request: &CalculationRequest,
    today: NaiveDate,
) -> Result<CalculationResult, CalculationError> {
    if request.total_episodes <= 0 {
        return Err(CalculationError::NonPositiveEpisodes);
    }
    if request.episode_duration <= 0 {
        return Err(CalculationError::NonPositiveDuration);
    }

    let total_minutes = request
        .total_episodes
        .checked_mul(request.episode_duration)
        .ok_or(CalculationError::OutOfRange)?;
    let total_hours = round_one_decimal(total_minutes as f64 / 60.0);

    match &request.mode {
        PacingMode::EpisodesPerDay(episodes_per_day) => {
            let episodes_per_day = *episodes_per_day;
            if episodes_per_day <= 0 {
                return Err(CalculationError::NonPositiveEpisodesPerDay);
            }

            let days_required = ceil_div(request.total_episodes, episodes_per_day);

            Ok(CalculationResult {
                total_minutes,
                total_hours,
                days_required,
                finish_date: finish_after(today, days_required)?,
                episodes_per_day: Some(episodes_per_day as f64),
                minutes_per_day: None,
            })
        }
        PacingMode::MinutesPerDay(minutes_per_day) => {
            let minutes_per_day = *minutes_per_day;
            if minutes_per_day <= 0 {
                return Err(CalculationError::NonPositiveMinutesPerDay);
            }

            let days_required = ceil_div(total_minutes, minutes_per_day);

            // Reference figure only, the day count above is minute based
            let average_episodes =
                round_one_decimal(minutes_per_day as f64 / request.episode_duration as f64);

            Ok(CalculationResult {
                total_minutes,
                total_hours,
                days_required,
                finish_date: finish_after(today, days_required)?,
                episodes_per_day: Some(average_episodes),
                minutes_per_day: Some(minutes_per_day),
            })
        }
        PacingMode::TargetDate(raw) => {
            let target = parse_target_date(raw)?;

            if target <= today {
                return Err(CalculationError::TargetDateNotInFuture);
            }

            // Unreachable after the check above, kept to rule out a zero divisor
            let days_available = (target - today).num_days().max(1);
            let episodes_needed = ceil_div(request.total_episodes, days_available);

            Ok(CalculationResult {
                total_minutes,
                total_hours,
                days_required: days_available,
                finish_date: raw.clone(),
                episodes_per_day: Some(episodes_needed as f64),
                minutes_per_day: None,
            })
        }
    }
}

/// Strict `YYYY-MM-DD`: four-digit year, no sign, no whitespace.
/// Month and day may be one or two digits.
fn parse_target_date(raw: &str) -> Result<NaiveDate, CalculationError> {
    let bytes = raw.as_bytes();
    let well_formed = bytes.len() > 5
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes.iter().all(|b| b.is_ascii_digit() || *b == b'-');

    if !well_formed {
        return Err(CalculationError::InvalidDateFormat);
    }

    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| CalculationError::InvalidDateFormat)
}

/// Integer division rounded up, for positive operands
fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    numerator / denominator + i64::from(numerator % denominator != 0)
}

/// Round half away from zero to one decimal place
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn finish_after(today: NaiveDate, days: i64) -> Result<String, CalculationError> {
    u64::try_from(days)
        .ok()
        .and_then(|days| today.checked_add_days(Days::new(days)))
        .map(|date| date.format(DATE_FORMAT).to_string())
        .ok_or(CalculationError::OutOfRange)
}
