//! qBot library root.

pub mod cli;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod store;
pub mod telegram;

pub use cli::Commands;
pub use config::{load_settings, Settings};
pub use crate::core::{
    CallerRole, ChatKind, Command, ConversationId, ConversationState, EntryList, QueueEngine,
    Reply,
};
pub use dispatch::{Dispatcher, Request, ResponseSet};
pub use error::{Error, Result};
pub use store::{JsonFileStore, MemoryStore, StateStore};
pub use telegram::run_telegram_daemon;
