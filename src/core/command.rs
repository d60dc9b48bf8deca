//! Recognized chat commands and the permission gate guarding each one.

use std::fmt;
use std::str::FromStr;

use super::conversation::{CallerRole, ConversationState};

/// A command users can send as `/<name> [arguments...]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Help,
    Start,
    Queue,
    Add,
    Insert,
    Remove,
    Next,
    Clear,
    Freeze,
    Unfreeze,
    EnableProtection,
    DisableProtection,
}

impl Command {
    pub const ALL: [Command; 12] = [
        Command::Help,
        Command::Start,
        Command::Queue,
        Command::Add,
        Command::Insert,
        Command::Remove,
        Command::Next,
        Command::Clear,
        Command::Freeze,
        Command::Unfreeze,
        Command::EnableProtection,
        Command::DisableProtection,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::Start => "start",
            Command::Queue => "queue",
            Command::Add => "add",
            Command::Insert => "insert",
            Command::Remove => "rm",
            Command::Next => "next",
            Command::Clear => "clear",
            Command::Freeze => "freeze",
            Command::Unfreeze => "unfreeze",
            Command::EnableProtection => "enable_protection",
            Command::DisableProtection => "disable_protection",
        }
    }

    /// Short description shown in the Telegram command menu.
    pub fn description(self) -> &'static str {
        match self {
            Command::Help => "Show the help menu",
            Command::Start => "Start talking with the bot",
            Command::Queue => "Show the queue",
            Command::Add => "Add yourself or an item to the queue",
            Command::Insert => "Insert an item at a given row",
            Command::Remove => "Remove the item at a given row",
            Command::Next => "Call the first in line",
            Command::Clear => "Clear the queue",
            Command::Freeze => "Only admins may add to the queue",
            Command::Unfreeze => "Everyone may add to the queue",
            Command::EnableProtection => "Only admins may edit the queue",
            Command::DisableProtection => "Everyone may edit the queue",
        }
    }

    pub fn gate(self) -> Gate {
        match self {
            Command::Help | Command::Start | Command::Queue => Gate::Open,
            Command::Add | Command::Insert => Gate::Frozen,
            Command::Next | Command::Remove | Command::Clear => Gate::Protected,
            Command::Freeze
            | Command::Unfreeze
            | Command::EnableProtection
            | Command::DisableProtection => Gate::AdminOnly,
        }
    }

    /// Parse the first token of a chat message, e.g. `/add` or `/add@qbot`.
    ///
    /// A command addressed to another bot is not ours and yields `None`.
    pub fn parse(token: &str, bot_username: &str) -> Option<Command> {
        let name = token.strip_prefix('/')?;
        let name = match name.split_once('@') {
            Some((name, target)) if target.eq_ignore_ascii_case(bot_username) => name,
            Some(_) => return None,
            None => name,
        };
        name.parse().ok()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("Unknown command: {}", s))
    }
}

/// Access rule a command must pass before its handler runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    /// Anyone.
    Open,
    /// Anyone while the queue is not frozen, otherwise administrators.
    Frozen,
    /// Anyone while the queue is not protected, otherwise administrators.
    Protected,
    /// Administrators only, whatever the flags say.
    AdminOnly,
}

impl Gate {
    pub fn permits(self, state: &ConversationState, role: CallerRole) -> bool {
        match self {
            Gate::Open => true,
            Gate::Frozen => !state.frozen || role.is_admin(),
            Gate::Protected => !state.protected || role.is_admin(),
            Gate::AdminOnly => role.is_admin(),
        }
    }
}
