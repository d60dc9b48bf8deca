//! Telegram bot integration.

pub mod admins;
pub mod client;

pub use admins::{AdminCache, RoleResolver, TelegramRoleResolver};
pub use client::{parse_command_text, run_telegram_daemon};
