//! Telegram bot client - long polling.

use std::sync::Arc;
use std::time::Duration;

use teloxide::prelude::{Requester, ResponseResult};
use teloxide::types::{BotCommand, Message};
use teloxide::Bot;

use crate::config::Settings;
use crate::core::{Caller, CallerRole, ChatKind, Command, ConversationId, Gate, QueueEngine};
use crate::dispatch::{Dispatcher, Request};
use crate::error::Error;
use crate::store::open_store;

use super::admins::{RoleResolver, TelegramRoleResolver};

const INTERNAL_ERROR_TEXT: &str = "Failed to process the command. Please try again.";

/// Split a message into a recognized command and its whitespace-delimited arguments.
///
/// Returns `None` for plain messages, unknown commands and commands addressed
/// to a bot other than `bot_username`.
pub fn parse_command_text(text: &str, bot_username: &str) -> Option<(Command, Vec<String>)> {
    let mut parts = text.split_whitespace();
    let head = parts.next()?;
    if !head.starts_with('/') {
        return None;
    }
    match Command::parse(head, bot_username) {
        Some(command) => Some((command, parts.map(str::to_string).collect())),
        None => {
            tracing::debug!("Ignoring command {}", head);
            None
        }
    }
}

struct App {
    username: String,
    dispatcher: Dispatcher,
    roles: Box<dyn RoleResolver>,
}

impl App {
    async fn handle_message(&self, bot: Bot, msg: Message) -> ResponseResult<()> {
        let Some((command, args)) = msg
            .text()
            .and_then(|text| parse_command_text(text, &self.username))
        else {
            return Ok(());
        };
        let Some(user) = msg.from.as_ref() else {
            return Ok(());
        };

        let conversation = ConversationId(msg.chat.id.0);
        let kind = if msg.chat.is_private() {
            ChatKind::Private
        } else {
            ChatKind::Group
        };

        // Open commands never need an admin lookup.
        let role = if command.gate() == Gate::Open {
            CallerRole::RegularMember
        } else {
            match self.roles.resolve_role(conversation, kind, user.id.0).await {
                Ok(role) => role,
                Err(e) => {
                    tracing::warn!(
                        "Could not resolve role of {} in {}: {}",
                        user.id.0,
                        conversation,
                        e
                    );
                    bot.send_message(msg.chat.id, INTERNAL_ERROR_TEXT).await?;
                    return Ok(());
                }
            }
        };

        let request = Request {
            conversation,
            kind,
            command,
            args,
            role,
            caller: Caller::from_user(user.username.as_deref(), &user.full_name()),
        };

        match self.dispatcher.dispatch(&request).await {
            Ok((response, _)) => {
                for text in response.messages() {
                    bot.send_message(msg.chat.id, text).await?;
                }
            }
            Err(e) => {
                tracing::error!("Failed to run /{} in {}: {}", command, conversation, e);
                bot.send_message(msg.chat.id, INTERNAL_ERROR_TEXT).await?;
            }
        }

        Ok(())
    }
}

/// Run the telegram bot using long polling until interrupted.
pub async fn run_telegram_daemon(settings: Settings, token: String) -> Result<(), Error> {
    tracing::info!("Starting Telegram bot...");

    let bot = Bot::new(token);
    let me = bot.get_me().await?;
    tracing::info!("Logged in as @{}", me.username());

    let store = open_store(&settings.store)?;
    let app = Arc::new(App {
        username: me.username().to_string(),
        dispatcher: Dispatcher::new(QueueEngine::new(settings.queue.clone()), store),
        roles: Box::new(TelegramRoleResolver::new(
            bot.clone(),
            Duration::from_secs(settings.admins.cache_ttl_secs),
        )),
    });

    let commands: Vec<BotCommand> = Command::ALL
        .iter()
        .map(|c| BotCommand::new(c.name(), c.description()))
        .collect();
    if let Err(e) = bot.set_my_commands(commands).await {
        tracing::warn!("Failed to set commands: {}", e);
    } else {
        tracing::info!("Telegram bot commands set");
    }

    teloxide::repl(bot, move |bot: Bot, msg: Message| {
        let app = Arc::clone(&app);
        async move { app.handle_message(bot, msg).await }
    })
    .await;

    tracing::info!("Telegram bot stopped");
    Ok(())
}
