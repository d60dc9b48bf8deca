//! CLI commands for qbot using clap.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{load_settings, load_settings_from, Settings, StoreBackend};
use crate::core::{
    Caller, CallerRole, ChatKind, Command as QueueCommand, ConversationId, QueueEngine,
};
use crate::dispatch::{Dispatcher, Request};
use crate::store::open_store;

#[derive(Parser)]
#[command(name = "qbot")]
#[command(version)]
#[command(about = "qBot - the bot to organize your queues", long_about = None)]
pub struct Commands {
    /// Settings file (default: ~/.qbot/settings.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the Telegram bot
    Telegram {
        /// Bot token (falls back to settings, then ./.token)
        #[arg(long, env = "QBOT_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Run one queue command against the configured store
    Exec {
        /// Conversation id
        #[arg(long, allow_hyphen_values = true)]
        chat: ConversationId,

        /// Treat the conversation as a group chat
        #[arg(long)]
        group: bool,

        /// Run as a regular member instead of an administrator
        #[arg(long)]
        member: bool,

        /// Caller username
        #[arg(long, default_value = "cli")]
        name: String,

        /// Command name, e.g. add or /add
        command: String,

        /// Command arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Forget a conversation's queue and flags
    Reset {
        /// Conversation id
        #[arg(long, allow_hyphen_values = true)]
        chat: ConversationId,
    },

    /// List stored conversations
    List,
}

impl Commands {
    /// Settings from `--config`, or the default location.
    pub fn settings(&self) -> Result<Settings> {
        let settings = match &self.config {
            Some(path) => load_settings_from(path)?,
            None => load_settings()?,
        };
        Ok(settings)
    }

    /// Run the command.
    pub async fn run(&self, settings: Settings) -> Result<()> {
        match &self.command {
            Command::Telegram { token } => cmd_telegram(settings, token.as_deref()).await,
            Command::Exec {
                chat,
                group,
                member,
                name,
                command,
                args,
            } => {
                let kind = if *group {
                    ChatKind::Group
                } else {
                    ChatKind::Private
                };
                let role = if *member {
                    CallerRole::RegularMember
                } else {
                    CallerRole::Administrator
                };
                cmd_exec(&settings, *chat, kind, role, name, command, args).await
            }
            Command::Reset { chat } => cmd_reset(&settings, *chat).await,
            Command::List => cmd_list(&settings),
        }
    }
}

// Command implementations

async fn cmd_telegram(settings: Settings, token: Option<&str>) -> Result<()> {
    use crate::telegram::run_telegram_daemon;

    let token = settings.resolve_token(token)?;
    println!("Starting Telegram bot...");
    run_telegram_daemon(settings, token).await?;
    Ok(())
}

fn dispatcher(settings: &Settings) -> Result<Dispatcher> {
    if settings.store.backend == StoreBackend::Memory {
        tracing::warn!("Memory store selected: state is discarded when this command exits");
    }
    let store = open_store(&settings.store)?;
    Ok(Dispatcher::new(QueueEngine::new(settings.queue.clone()), store))
}

async fn cmd_exec(
    settings: &Settings,
    chat: ConversationId,
    kind: ChatKind,
    role: CallerRole,
    name: &str,
    command: &str,
    args: &[String],
) -> Result<()> {
    let Ok(command) = command.trim_start_matches('/').parse::<QueueCommand>() else {
        bail!("Unknown command '{}'. Send 'help' for available commands.", command);
    };

    let request = Request {
        conversation: chat,
        kind,
        command,
        args: args.to_vec(),
        role,
        caller: Caller::from_user(Some(name), name),
    };
    let (response, state) = dispatcher(settings)?.dispatch(&request).await?;
    tracing::debug!("Conversation {} now holds {}", chat, state.queue);

    for message in response.messages() {
        println!("{}", message);
    }
    Ok(())
}

async fn cmd_reset(settings: &Settings, chat: ConversationId) -> Result<()> {
    if dispatcher(settings)?.reset(chat).await? {
        println!("Reset conversation {}", chat);
    } else {
        println!("Conversation {} has no stored state", chat);
    }
    Ok(())
}

fn cmd_list(settings: &Settings) -> Result<()> {
    let store = open_store(&settings.store)?;
    let ids = store.list()?;

    println!("Conversations ({}):", ids.len());
    for id in ids {
        if let Some(state) = store.load(id)? {
            println!(
                "  {}: {} queued, frozen={}, protected={}",
                id,
                state.queue.len(),
                state.frozen,
                state.protected
            );
        }
    }
    Ok(())
}
