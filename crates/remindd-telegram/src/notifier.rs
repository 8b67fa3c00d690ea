use async_trait::async_trait;
use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use tracing::{debug, info};

use remindd_core::config::TelegramConfig;
use remindd_core::{Category, DeliveryFailure, Notifier, Reminder};

use crate::error::{classify, TelegramError};
use crate::format::{render_markdown, render_plain};

/// Telegram implementation of the engine's delivery seam.
pub struct TelegramNotifier {
    bot: Bot,
    alert_sticker: Option<String>,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self, TelegramError> {
        if config.bot_token.is_empty() {
            return Err(TelegramError::NoToken);
        }
        Ok(Self {
            bot: Bot::new(&config.bot_token),
            alert_sticker: config.alert_sticker.clone(),
        })
    }

    /// Follow-up sticker for high-urgency categories. Best effort only —
    /// a failure here never touches the primary delivery result.
    async fn send_alert_sticker(&self, chat_id: ChatId, category: Category) {
        if !matches!(
            category,
            Category::Deadline | Category::Appointment | Category::Meeting
        ) {
            return;
        }
        let Some(file_id) = &self.alert_sticker else {
            return;
        };
        if let Err(e) = self
            .bot
            .send_sticker(chat_id, InputFile::file_id(file_id.clone()))
            .await
        {
            debug!(error = %e, "alert sticker send failed — ignored");
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, reminder: &Reminder) -> Result<(), DeliveryFailure> {
        let chat_id = ChatId(reminder.user_id);
        let now = Utc::now();

        // MarkdownV2 first; if Telegram rejects it (usually entity parsing),
        // retry the same content as plain text and classify that outcome.
        let markdown = self
            .bot
            .send_message(chat_id, render_markdown(reminder, now))
            .parse_mode(ParseMode::MarkdownV2)
            .await;
        if let Err(first) = markdown {
            debug!(reminder_id = %reminder.id, error = %first, "MarkdownV2 send failed — retrying plain");
            self.bot
                .send_message(chat_id, render_plain(reminder, now))
                .await
                .map_err(|e| classify(&e))?;
        }

        self.send_alert_sticker(chat_id, reminder.category).await;

        info!(reminder_id = %reminder.id, user_id = reminder.user_id, "reminder delivered");
        Ok(())
    }
}
