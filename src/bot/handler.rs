//! Telegram update loop and message dispatch

use crate::bot::pipeline::Pipeline;
use crate::config::BotConfig;
use crate::delivery::telegram::{Message, TelegramApi};
use crate::delivery::{DeliveryChannel, TelegramChannel};
use crate::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Delay before polling again after a failed `getUpdates`
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Reply to `/start` and `/help`
pub const USAGE: &str = "Hi! I check IP addresses for IP information and proxy status.\n\n\
How to use:\n\
Send a single IP or a list of IPs separated by commas, spaces or new lines.\n\n\
Examples:\n\
1.1.1.1\n\
2.2.2.2\n\
3.3.3.3\n\
1.1.1.1 2.2.2.2 3.3.3.3\n\
1.1.1.1,2.2.2.2,3.3.3.3";

/// Whether `text` is the bot command `name`, with or without a `@botname` suffix
pub fn is_command(text: &str, name: &str) -> bool {
    text.split_whitespace()
        .next()
        .and_then(|token| token.strip_prefix('/'))
        .and_then(|token| token.split('@').next())
        .map_or(false, |command| command == name)
}

/// Access line sent to the owner
pub fn access_line(message: &Message) -> String {
    let (user_id, username) = match &message.from {
        Some(user) => (
            user.id.to_string(),
            user.username.clone().unwrap_or_else(|| "N/A".to_string()),
        ),
        None => ("N/A".to_string(), "N/A".to_string()),
    };
    let timestamp = DateTime::<Utc>::from_timestamp(message.date, 0)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "User ID: {}, Username: {}, Timestamp: {}",
        user_id, username, timestamp
    )
}

/// Long-polling bot dispatching messages to the pipeline
#[derive(Clone)]
pub struct Bot {
    api: Arc<TelegramApi>,
    pipeline: Arc<Pipeline>,
    owner_id: Option<i64>,
}

impl Bot {
    pub fn new(config: &BotConfig, pipeline: Pipeline) -> Result<Self> {
        Ok(Self {
            api: Arc::new(TelegramApi::with_config(config)?),
            pipeline: Arc::new(pipeline),
            owner_id: config.owner_id,
        })
    }

    /// Poll for updates until Ctrl+C, handling each message on its own task
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// Poll for updates until `shutdown` resolves
    ///
    /// Messages already being handled run to completion before this returns,
    /// so no placeholder is left behind.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if self.pipeline.variant_count() < 2 {
            info!("proxy check disabled, set PROXY_CHECK_URL to enable it");
        }
        info!("Bot is running. Press Ctrl+C to stop.");

        tokio::pin!(shutdown);
        let mut tasks = JoinSet::new();
        let mut offset = None;

        loop {
            while let Some(finished) = tasks.try_join_next() {
                if let Err(e) = finished {
                    error!(error = %e, "message task failed");
                }
            }

            let updates = tokio::select! {
                _ = &mut shutdown => break,
                updates = self.api.get_updates(offset) => updates,
            };

            let updates = match updates {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, "failed to fetch updates");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = Some(update.update_id + 1);
                if let Some(message) = update.message {
                    let bot = self.clone();
                    tasks.spawn(async move { bot.handle_message(message).await });
                }
            }
        }

        info!(in_flight = tasks.len(), "shutting down, waiting for messages in flight");
        while let Some(finished) = tasks.join_next().await {
            if let Err(e) = finished {
                error!(error = %e, "message task failed");
            }
        }
        Ok(())
    }

    /// Handle one incoming message
    pub async fn handle_message(&self, message: Message) {
        let Some(text) = message.text.as_deref() else {
            return;
        };
        let chat_id = message.chat.id;
        let channel = TelegramChannel::new(Arc::clone(&self.api), chat_id);

        if is_command(text, "start") || is_command(text, "help") {
            if let Err(e) = channel.send_text(USAGE).await {
                error!(chat_id, error = %e, "failed to send usage");
            }
            self.notify_owner(&message).await;
            return;
        }

        let addresses = self.pipeline.parse(text);
        if !addresses.is_empty() {
            self.notify_owner(&message).await;
        }

        let summary = self.pipeline.deliver(&addresses, &channel).await;
        debug!(chat_id, ?summary, "message handled");
    }

    /// Tell the owner who used the bot; failures are only logged
    async fn notify_owner(&self, message: &Message) {
        let Some(owner_id) = self.owner_id else {
            return;
        };

        if let Err(e) = self
            .api
            .send_message(owner_id, &access_line(message), None)
            .await
        {
            error!(owner_id, error = %e, "failed to log user access");
        }
    }
}
