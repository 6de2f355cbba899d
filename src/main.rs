use std::process;
use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use city_weather_bot::bot::{self, BotContext, POLL_RETRY_DELAY};
use city_weather_bot::cache::{HttpCache, ReqwestTransport};
use city_weather_bot::config::Config;
use city_weather_bot::logging;
use city_weather_bot::weather::OpenWeatherClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Создайте .env с BOT_TOKEN и WEATHER_API_KEY!");
            process::exit(1);
        }
    };

    let log_guard = logging::init(&config.log_file)?;

    // Initialize the caching HTTP client
    let transport = Arc::new(ReqwestTransport::new()?);
    let http = Arc::new(HttpCache::open(transport, config.cache_ttl, &config.cache_path).await);

    let weather = Arc::new(OpenWeatherClient::new(http, config.clone()));
    let config = Arc::new(config);

    let bot = Bot::new(config.bot_token.clone()).parse_mode(ParseMode::Html);

    match bot::validate_token(&bot).await {
        Ok(me) => tracing::info!(
            "Bot @{} ready, cache {:.0} min",
            me.username(),
            config.cache_minutes()
        ),
        Err(e) => {
            tracing::error!("Token validation failed: {}", e);
            eprintln!("Проверьте BOT_TOKEN в .env!");
            drop(log_guard);
            process::exit(1);
        }
    }

    let ctx = BotContext { config, weather };

    tracing::info!(
        "Bot starting with {:.0} min cache",
        ctx.config.cache_minutes()
    );
    bot::supervise(|| bot::poll(bot.clone(), ctx.clone()), POLL_RETRY_DELAY).await;

    Ok(())
}
