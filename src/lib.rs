//! Telegram bot answering city names with current weather from OpenWeatherMap.

pub mod bot;
pub mod cache;
pub mod config;
pub mod format;
pub mod logging;
pub mod utils;
pub mod weather;
