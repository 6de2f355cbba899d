use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use teloxide::adaptors::DefaultParseMode;
use teloxide::dispatching::UpdateHandler;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::types::Me;
use teloxide::update_listeners::Polling;
use teloxide::utils::command::BotCommands;
use teloxide::RequestError;
use thiserror::Error;

use crate::config::Config;
use crate::format;
use crate::weather::{OpenWeatherClient, WeatherError};

/// Delay between polling restarts.
pub const POLL_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Bot with HTML set as the default parse mode for every send and edit.
pub type WeatherBot = DefaultParseMode<Bot>;

type HandlerResult = anyhow::Result<()>;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Bot token rejected: {0}")]
    TokenValidation(#[from] RequestError),
}

// Shared handler state
#[derive(Clone)]
pub struct BotContext {
    pub config: Arc<Config>,
    pub weather: Arc<OpenWeatherClient>,
}

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "запуск бота")]
    Start,
    #[command(description = "справка")]
    Help,
}

/// Extracts the city name from a free-text message.
///
/// Blank text and the bare words "start"/"help" are not city names.
pub fn city_query(text: &str) -> Option<&str> {
    let city = text.trim();
    if city.is_empty() {
        return None;
    }
    let lowered = city.to_lowercase();
    if lowered == "start" || lowered == "help" {
        return None;
    }
    Some(city)
}

pub fn schema() -> UpdateHandler<anyhow::Error> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(on_command),
        )
        .branch(
            dptree::filter_map(|msg: Message| msg.text().map(ToOwned::to_owned))
                .endpoint(on_text),
        )
}

async fn on_command(
    bot: WeatherBot,
    msg: Message,
    cmd: Command,
    ctx: BotContext,
) -> HandlerResult {
    let text = match cmd {
        Command::Start => format::start_text(),
        Command::Help => format::help_text(ctx.config.cache_minutes()),
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn on_text(
    bot: WeatherBot,
    msg: Message,
    text: String,
    ctx: BotContext,
) -> HandlerResult {
    let Some(city) = city_query(&text) else {
        return Ok(());
    };

    let placeholder = bot
        .send_message(msg.chat.id, format::searching_text(city))
        .await?;
    let reply = weather_reply(&ctx.weather, city, &ctx.config.timezone).await;
    bot.edit_message_text(msg.chat.id, placeholder.id, reply).await?;
    Ok(())
}

/// Looks up `city` and renders the reply, success or failure.
pub async fn weather_reply(
    weather: &OpenWeatherClient,
    city: &str,
    tz: &chrono_tz::Tz,
) -> String {
    match weather.fetch_weather(city).await {
        Ok(summary) => format::format_weather(&summary, Utc::now(), tz),
        Err(e) => {
            match &e {
                WeatherError::NotFound { .. } => {
                    tracing::info!("No weather for {:?}: {}", city, e)
                }
                WeatherError::Network(_) => {
                    tracing::warn!("Weather lookup for {:?} failed: {}", city, e)
                }
                WeatherError::Parse(_) => {
                    tracing::error!("Weather handler error for {:?}: {}", city, e)
                }
            }
            format::format_error(&e)
        }
    }
}

pub async fn validate_token(bot: &WeatherBot) -> Result<Me, BotError> {
    Ok(bot.get_me().await?)
}

/// Delay before the next `getUpdates` after a failed one. Fixed, however
/// many failures came before.
pub fn polling_backoff(_failures: u32) -> Duration {
    POLL_RETRY_DELAY
}

/// One polling session. Returns only when the connection check fails or the
/// dispatcher stops.
pub async fn poll(bot: WeatherBot, ctx: BotContext) -> anyhow::Result<()> {
    bot.get_me().await?;

    let listener = Polling::builder(bot.clone())
        .backoff_strategy(polling_backoff)
        .build();

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![ctx])
        .default_handler(|_| async {})
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("Polling failed"),
        )
        .await;

    Ok(())
}

/// Runs `poll` forever, sleeping `delay` after every exit.
pub async fn supervise<F, Fut>(mut poll: F, delay: Duration)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    loop {
        match poll().await {
            Ok(()) => tracing::warn!("Polling stopped, restarting in {:?}", delay),
            Err(e) => tracing::error!("Polling failed: {:#}", e),
        }
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Log sink shared between the test and the subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_city_query_trims() {
        assert_eq!(city_query("  Москва \n"), Some("Москва"));
        assert_eq!(city_query("New York"), Some("New York"));
    }

    #[test]
    fn test_reserved_words_are_not_cities() {
        assert_eq!(city_query("start"), None);
        assert_eq!(city_query("HELP"), None);
        assert_eq!(city_query(" Start "), None);
        assert_eq!(city_query("   "), None);
        assert_eq!(city_query("helper"), Some("helper"));
    }

    #[test]
    fn test_commands_parse() {
        assert_eq!(Command::parse("/start", "weather_bot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/help", "weather_bot").unwrap(), Command::Help);
        assert!(Command::parse("/weather", "weather_bot").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_supervise_restarts_after_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let run = supervise(
            move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        anyhow::bail!("connection reset");
                    }
                    std::future::pending::<()>().await;
                    Ok::<(), anyhow::Error>(())
                }
            },
            POLL_RETRY_DELAY,
        );

        let outcome = tokio::time::timeout(Duration::from_secs(15), run).await;
        assert!(outcome.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_supervise_waits_fixed_delay() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let run = supervise(
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(anyhow::anyhow!("still down"))
                }
            },
            POLL_RETRY_DELAY,
        );

        // Attempts at 0s, 10s, 20s; the timeout fires before the fourth.
        let _ = tokio::time::timeout(Duration::from_secs(25), run).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_supervise_logs_one_error_per_failure() {
        let logs = CapturedLogs::default();
        let sink = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        let _default = tracing::subscriber::set_default(subscriber);

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let run = supervise(
            move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        anyhow::bail!("connection reset");
                    }
                    std::future::pending::<()>().await;
                    Ok::<(), anyhow::Error>(())
                }
            },
            POLL_RETRY_DELAY,
        );

        let started = tokio::time::Instant::now();
        let _ = tokio::time::timeout(Duration::from_secs(15), run).await;

        let text = logs.text();
        assert_eq!(text.matches("Polling failed").count(), 1, "{}", text);
        assert!(text.contains("connection reset"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_secs(15));
    }

    #[test]
    fn test_polling_backoff_is_fixed() {
        assert_eq!(polling_backoff(0), POLL_RETRY_DELAY);
        assert_eq!(polling_backoff(1), POLL_RETRY_DELAY);
        assert_eq!(polling_backoff(50), POLL_RETRY_DELAY);
    }
}
