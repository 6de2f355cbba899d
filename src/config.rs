use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_CACHE_EXPIRE_SECS: u64 = 600;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} not set")]
    MissingVar(&'static str),
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: String,
    pub weather_api_key: String,
    pub cache_ttl: Duration,
    pub openweather_base_url: String,
    pub weather_lang: String,
    pub timezone: chrono_tz::Tz,
    pub cache_path: PathBuf,
    pub log_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };

        let bot_token = required("BOT_TOKEN")?;
        let weather_api_key = required("WEATHER_API_KEY")?;

        let cache_expire = match lookup("CACHE_EXPIRE") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: "CACHE_EXPIRE",
                    value: raw.clone(),
                })?,
            None => DEFAULT_CACHE_EXPIRE_SECS,
        };

        let app_timezone =
            lookup("APP_TIMEZONE").unwrap_or_else(|| "Europe/Moscow".to_string());
        let timezone = app_timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| ConfigError::InvalidValue {
                name: "APP_TIMEZONE",
                value: app_timezone.clone(),
            })?;

        Ok(Config {
            bot_token,
            weather_api_key,
            cache_ttl: Duration::from_secs(cache_expire),
            openweather_base_url: lookup("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|| "https://api.openweathermap.org".to_string()),
            weather_lang: lookup("WEATHER_LANG").unwrap_or_else(|| "ru".to_string()),
            timezone,
            cache_path: lookup("CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("weather_cache.json")),
            log_file: lookup("LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("bot.log")),
        })
    }

    /// Cache lifetime in minutes, as shown to users.
    pub fn cache_minutes(&self) -> f64 {
        self.cache_ttl.as_secs_f64() / 60.0
    }
}
