use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::cache::HttpError;

/// Normalized current conditions for one city.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSummary {
    pub city: String,
    pub temperature: i64,
    pub feels_like: i64,
    pub humidity: u8,
    pub description: String,
    pub wind_speed: i64,
    /// Present only when gusts exceed the sustained wind speed.
    pub wind_gust: Option<i64>,
    pub pressure_mmhg: i64,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub from_cache: bool,
}

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("City not found: {}", .message.as_deref().unwrap_or("no details"))]
    NotFound { message: Option<String> },
    #[error("Network error: {0}")]
    Network(#[from] HttpError),
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for WeatherError {
    fn from(e: serde_json::Error) -> Self {
        WeatherError::Parse(e.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWeatherResponse {
    pub main: CurrentMain,
    pub weather: Vec<CurrentCondition>,
    pub wind: CurrentWind,
    pub sys: CurrentSys,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentMain {
    pub temp: f64,
    pub feels_like: f64,
    pub pressure: f64,
    pub humidity: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentCondition {
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWind {
    #[serde(default)]
    pub speed: f64,
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentSys {
    pub sunrise: i64,
    pub sunset: i64,
}

/// Body of a non-200 reply, e.g. `{"cod":"404","message":"city not found"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: Option<String>,
}
