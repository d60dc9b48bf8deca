//! Per-chat queue state and the identities of who is asking.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::queue::EntryList;

/// Opaque conversation identifier (a Telegram chat id).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConversationId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(ConversationId)
    }
}

impl From<i64> for ConversationId {
    fn from(id: i64) -> Self {
        ConversationId(id)
    }
}

/// Whether a conversation is one-to-one or multi-party.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
}

/// Permission level of the caller within a conversation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CallerRole {
    Administrator,
    RegularMember,
}

impl CallerRole {
    pub fn is_admin(self) -> bool {
        matches!(self, CallerRole::Administrator)
    }
}

/// Who issued a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    /// Identity string queued by a bare `/add` (the username).
    pub handle: String,

    /// Name used in group replies, e.g. `jdoe (John Doe)`.
    pub display: String,
}

impl Caller {
    pub fn new(handle: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            display: display.into(),
        }
    }

    /// Build a caller from a chat user's username and full name.
    ///
    /// Users without a username are identified by their full name.
    pub fn from_user(username: Option<&str>, full_name: &str) -> Self {
        match username {
            Some(username) => Self::new(username, format!("{} ({})", username, full_name)),
            None => Self::new(full_name, full_name),
        }
    }
}

/// The queue and access flags of one conversation.
///
/// Fresh conversations start frozen and protected, so only administrators
/// can change the queue until they open it up.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ConversationState {
    #[serde(default)]
    pub queue: EntryList,

    #[serde(default = "default_flag")]
    pub frozen: bool,

    #[serde(default = "default_flag")]
    pub protected: bool,
}

fn default_flag() -> bool {
    true
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            queue: EntryList::new(),
            frozen: default_flag(),
            protected: default_flag(),
        }
    }
}
