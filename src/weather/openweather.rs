use super::types::*;
use crate::cache::HttpCache;
use crate::config::Config;
use crate::utils::{capitalize, hpa_to_mmhg, round_to_int, title_case};
use chrono::{DateTime, Utc};
use std::sync::Arc;

const CURRENT_WEATHER_PATH: &str = "/data/2.5/weather";
const STATUS_OK: u16 = 200;

pub struct OpenWeatherClient {
    http: Arc<HttpCache>,
    config: Config,
}

impl OpenWeatherClient {
    pub fn new(http: Arc<HttpCache>, config: Config) -> Self {
        Self { http, config }
    }

    /// Request URL for `city`. Doubles as the cache key.
    pub fn current_weather_url(&self, city: &str) -> String {
        format!(
            "{}{}?q={}&units=metric&lang={}&appid={}",
            self.config.openweather_base_url.trim_end_matches('/'),
            CURRENT_WEATHER_PATH,
            urlencoding::encode(city),
            urlencoding::encode(&self.config.weather_lang),
            urlencoding::encode(&self.config.weather_api_key),
        )
    }

    pub async fn fetch_weather(&self, city: &str) -> Result<WeatherSummary, WeatherError> {
        let url = self.current_weather_url(city);
        let response = self.http.get(&url).await?;

        if response.status != STATUS_OK {
            let message = serde_json::from_str::<ApiErrorBody>(&response.body)
                .ok()
                .and_then(|body| body.message);
            tracing::info!(
                "OpenWeather returned HTTP {} for {:?}: {:?}",
                response.status,
                city,
                message
            );
            return Err(WeatherError::NotFound { message });
        }

        let current: CurrentWeatherResponse = serde_json::from_str(&response.body)?;
        WeatherSummary::from_response(city, &current, response.from_cache)
    }
}

impl WeatherSummary {
    pub fn from_response(
        city: &str,
        current: &CurrentWeatherResponse,
        from_cache: bool,
    ) -> Result<Self, WeatherError> {
        let condition = current
            .weather
            .first()
            .ok_or_else(|| WeatherError::Parse("weather list is empty".to_string()))?;

        let wind_speed = round_to_int(current.wind.speed);
        let wind_gust = current
            .wind
            .gust
            .map(round_to_int)
            .filter(|gust| *gust > wind_speed);

        Ok(Self {
            city: title_case(city),
            temperature: round_to_int(current.main.temp),
            feels_like: round_to_int(current.main.feels_like),
            humidity: current.main.humidity,
            description: capitalize(&condition.description),
            wind_speed,
            wind_gust,
            pressure_mmhg: round_to_int(hpa_to_mmhg(current.main.pressure)),
            sunrise: timestamp(current.sys.sunrise, "sunrise")?,
            sunset: timestamp(current.sys.sunset, "sunset")?,
            from_cache,
        })
    }
}

fn timestamp(secs: i64, field: &str) -> Result<DateTime<Utc>, WeatherError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| WeatherError::Parse(format!("{} out of range: {}", field, secs)))
}
