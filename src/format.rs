//! Reply templates. All output is HTML parse mode; anything derived from
//! user input or the upstream API is escaped.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use teloxide::utils::html::escape;

use crate::weather::{WeatherError, WeatherSummary};

pub fn start_text() -> String {
    "🌤️ <b>Прогноз погоды</b>\n\nОтправьте название города.".to_string()
}

pub fn help_text(cache_minutes: f64) -> String {
    format!(
        "• /start - запуск бота\n\
         • /help - справка\n\
         \n\
         Для получения информации о погоде напишите название города.\n\
         \n\
         Данные предоставлены OpenWeatherMap API. Запросы кэшируются на {:.0} мин.",
        cache_minutes
    )
}

pub fn searching_text(city: &str) -> String {
    format!("🔍 Ищу погоду для <b>{}</b>...", escape(city))
}

pub fn format_weather(summary: &WeatherSummary, now: DateTime<Utc>, tz: &Tz) -> String {
    let cache_status = if summary.from_cache {
        "📁 (из кэша)"
    } else {
        "🌐 (обновлено)"
    };
    let gust_text = summary
        .wind_gust
        .map(|gust| format!(" (порывы до {} м/с)", gust))
        .unwrap_or_default();
    let clock = |at: DateTime<Utc>| at.with_timezone(tz).format("%H:%M").to_string();

    format!(
        "🌤️ <b>Погода в {city}</b> {cache_status}\n\
         \n\
         🌡️ <b>{temp}°C</b> (ощущается как {feels}°C) — {description}\n\
         \n\
         💧 Влажность: {humidity}%\n\
         🌪 Ветер: {wind} м/с{gust_text}\n\
         📊 Давление: {pressure} мм рт. ст.\n\
         \n\
         🌅 Рассвет: {sunrise}\n\
         🌇 Закат: {sunset}\n\
         \n\
         <b>Обновлено:</b> {updated}",
        city = escape(&summary.city),
        cache_status = cache_status,
        temp = summary.temperature,
        feels = summary.feels_like,
        description = escape(&summary.description),
        humidity = summary.humidity,
        wind = summary.wind_speed,
        gust_text = gust_text,
        pressure = summary.pressure_mmhg,
        sunrise = clock(summary.sunrise),
        sunset = clock(summary.sunset),
        updated = now.with_timezone(tz).format("%H:%M %d.%m.%Y"),
    )
}

pub fn format_error(error: &WeatherError) -> String {
    match error {
        WeatherError::NotFound { message } => {
            let mut text = "Город не найден!".to_string();
            if let Some(message) = message {
                text.push_str(&format!("\n💡 {}", escape(message)));
            }
            text
        }
        WeatherError::Network(_) => {
            "Нет интернета (используется кэш). Попробуйте позже.".to_string()
        }
        WeatherError::Parse(_) => "Произошла ошибка. Попробуйте другой город.".to_string(),
    }
}
