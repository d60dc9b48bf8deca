//! Queue command handlers.
//!
//! The engine is a pure state machine: it takes a conversation's state, the
//! command with its tokenized arguments and the resolved caller role, and
//! returns the replies to send. Every handler validates before it mutates, so
//! a rejected command leaves the state untouched.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::config::QueueSettings;

use super::command::Command;
use super::conversation::{Caller, CallerRole, ChatKind, ConversationState};
use super::messages::{Reply, NEXT_TEMPLATES};
use super::queue::{EntryMeta, MetaFormat};

/// One command addressed to one conversation.
#[derive(Clone, Debug)]
pub struct Invocation<'a> {
    pub command: Command,
    pub args: &'a [String],
    pub role: CallerRole,
    pub kind: ChatKind,
    pub caller: &'a Caller,
    /// When the command was received; stored as item metadata.
    pub at: DateTime<Utc>,
}

impl Invocation<'_> {
    /// The sole participant of a private chat is always its administrator.
    pub fn effective_role(&self) -> CallerRole {
        match self.kind {
            ChatKind::Private => CallerRole::Administrator,
            ChatKind::Group => self.role,
        }
    }
}

/// Replies of a command and whether the state changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub replies: Vec<Reply>,
    pub mutated: bool,
}

impl Outcome {
    fn read(reply: Reply) -> Self {
        Self {
            replies: vec![reply],
            mutated: false,
        }
    }

    fn changed(reply: Reply) -> Self {
        Self {
            replies: vec![reply],
            mutated: true,
        }
    }

    /// The first reply, which is the only one for every command but `/queue`.
    pub fn reply(&self) -> Option<&Reply> {
        self.replies.first()
    }
}

/// Why a user-supplied row number was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PositionError {
    NotNumeric,
    OutOfRange,
}

/// Parse a 1-based row number that must fall within `1..=len`.
///
/// Only plain digit strings are numeric; signs and decimals are not.
fn parse_position(raw: &str, len: usize) -> Result<usize, PositionError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PositionError::NotNumeric);
    }
    match raw.parse::<usize>() {
        Ok(position) if (1..=len).contains(&position) => Ok(position),
        // Too many digits for usize is still a number, just not a row.
        _ => Err(PositionError::OutOfRange),
    }
}

pub struct QueueEngine {
    settings: QueueSettings,
    meta_format: MetaFormat,
}

impl QueueEngine {
    pub fn new(settings: QueueSettings) -> Self {
        let meta_format = MetaFormat::default()
            .with_added_at(|at| format!("(since {})", at.format("%H:%M")))
            .with_added_by(|by| format!("(added by {})", by));
        Self {
            settings,
            meta_format,
        }
    }

    pub fn settings(&self) -> &QueueSettings {
        &self.settings
    }

    /// Run one command against a conversation's state.
    pub fn execute<R: Rng + ?Sized>(
        &self,
        state: &mut ConversationState,
        inv: &Invocation<'_>,
        rng: &mut R,
    ) -> Outcome {
        if !inv.command.gate().permits(state, inv.effective_role()) {
            tracing::debug!("Denied /{} to {}", inv.command, inv.caller.handle);
            return Outcome::read(Reply::PermissionDenied {
                user: inv.caller.handle.clone(),
                command: format!("/{}", inv.command),
            });
        }

        match inv.command {
            Command::Help => Outcome::read(Reply::Help),
            Command::Start => Outcome::read(Reply::Welcome),
            Command::Queue => self.list(state),
            Command::Add => self.add(state, inv),
            Command::Insert => self.insert(state, inv),
            Command::Next => self.next(state, inv, rng),
            Command::Remove => self.remove(state, inv),
            Command::Clear => self.clear(state),
            Command::Freeze => {
                state.frozen = true;
                Outcome::changed(Reply::Frozen)
            }
            Command::Unfreeze => {
                state.frozen = false;
                Outcome::changed(Reply::Unfrozen)
            }
            Command::EnableProtection => {
                state.protected = true;
                Outcome::changed(Reply::ProtectionEnabled)
            }
            Command::DisableProtection => {
                state.protected = false;
                Outcome::changed(Reply::ProtectionDisabled)
            }
        }
    }

    fn list(&self, state: &ConversationState) -> Outcome {
        if state.queue.is_empty() {
            return Outcome::read(Reply::QueueEmpty);
        }

        let format = self.settings.show_added_time.then_some(&self.meta_format);
        let text = state.queue.render(format);
        let lines: Vec<&str> = text.lines().collect();
        let page_size = self.settings.page_size.max(1);

        Outcome {
            replies: lines
                .chunks(page_size)
                .map(|page| Reply::QueuePage(page.join("\n")))
                .collect(),
            mutated: false,
        }
    }

    fn add(&self, state: &mut ConversationState, inv: &Invocation<'_>) -> Outcome {
        let item = if inv.args.is_empty() {
            inv.caller.handle.clone()
        } else {
            let item = inv.args.join(" ");
            if let Some(rejection) = self.check_item(&item) {
                return Outcome::read(rejection);
            }
            item
        };

        if let Some(index) = state.queue.index_of(&item) {
            return Outcome::read(Reply::AlreadyQueued {
                item,
                position: index + 1,
            });
        }

        let meta = self.meta_for(&item, inv);
        state.queue.append(item.clone(), Some(meta));
        let position = state.queue.len();

        Outcome::changed(match inv.kind {
            ChatKind::Private => Reply::Added { item, position },
            ChatKind::Group => Reply::AddedInGroup {
                user: inv.caller.display.clone(),
                item,
                position,
            },
        })
    }

    fn insert(&self, state: &mut ConversationState, inv: &Invocation<'_>) -> Outcome {
        if state.queue.is_empty() {
            return Outcome::read(Reply::InsertQueueEmpty);
        }
        let Some((raw_index, words)) = inv.args.split_last() else {
            return Outcome::read(Reply::InsertNotEnoughArguments);
        };
        if words.is_empty() {
            return Outcome::read(Reply::InsertNotEnoughArguments);
        }

        let item = words.join(" ");
        if let Some(rejection) = self.check_item(&item) {
            return Outcome::read(rejection);
        }
        if let Some(index) = state.queue.index_of(&item) {
            return Outcome::read(Reply::AlreadyQueued {
                item,
                position: index + 1,
            });
        }

        let position = match parse_position(raw_index, state.queue.len()) {
            Ok(position) => position,
            Err(PositionError::NotNumeric) => {
                return Outcome::read(Reply::IndexNotNumeric {
                    index: raw_index.clone(),
                })
            }
            Err(PositionError::OutOfRange) => {
                return Outcome::read(Reply::InsertIndexOutOfBounds {
                    index: raw_index.clone(),
                })
            }
        };

        let meta = self.meta_for(&item, inv);
        if let Err(e) = state.queue.insert(position - 1, item.clone(), Some(meta)) {
            tracing::error!("Insert at checked position failed: {}", e);
            return Outcome::read(Reply::InsertIndexOutOfBounds {
                index: raw_index.clone(),
            });
        }

        Outcome::changed(match inv.kind {
            ChatKind::Private => Reply::Inserted { item, position },
            ChatKind::Group => Reply::InsertedInGroup {
                user: inv.caller.display.clone(),
                item,
                position,
            },
        })
    }

    fn next<R: Rng + ?Sized>(
        &self,
        state: &mut ConversationState,
        inv: &Invocation<'_>,
        rng: &mut R,
    ) -> Outcome {
        let item = match state.queue.pop_front() {
            Ok((item, _)) => item,
            Err(_) => return Outcome::read(Reply::NothingQueued),
        };

        Outcome::changed(if inv.args.is_empty() {
            Reply::Called {
                item,
                template: rng.gen_range(0..NEXT_TEMPLATES.len()),
            }
        } else {
            Reply::CalledWithMessage {
                item,
                message: inv.args.join(" "),
            }
        })
    }

    fn remove(&self, state: &mut ConversationState, inv: &Invocation<'_>) -> Outcome {
        if state.queue.is_empty() {
            return Outcome::read(Reply::NothingQueued);
        }
        let raw_index = match inv.args {
            [] => return Outcome::read(Reply::RemoveIndexNotProvided),
            [raw] => raw,
            _ => return Outcome::read(Reply::RemoveTooManyArguments),
        };

        let position = match parse_position(raw_index, state.queue.len()) {
            Ok(position) => position,
            Err(PositionError::NotNumeric) => {
                return Outcome::read(Reply::IndexNotNumeric {
                    index: raw_index.clone(),
                })
            }
            Err(PositionError::OutOfRange) => {
                return Outcome::read(Reply::RemoveIndexOutOfRange {
                    index: raw_index.clone(),
                })
            }
        };

        match state.queue.remove_at(position - 1) {
            Ok((item, _)) => Outcome::changed(Reply::Removed { item }),
            Err(e) => {
                tracing::error!("Remove at checked position failed: {}", e);
                Outcome::read(Reply::RemoveIndexOutOfRange {
                    index: raw_index.clone(),
                })
            }
        }
    }

    fn clear(&self, state: &mut ConversationState) -> Outcome {
        if state.queue.is_empty() {
            return Outcome::read(Reply::NothingQueued);
        }
        state.queue.clear();
        Outcome::changed(Reply::Cleared)
    }

    /// Reject items with forbidden characters or over the length limit.
    fn check_item(&self, item: &str) -> Option<Reply> {
        if item
            .chars()
            .any(|c| self.settings.forbidden_characters.contains(&c))
        {
            return Some(Reply::ForbiddenCharacter);
        }
        if item.chars().count() > self.settings.max_item_length {
            return Some(Reply::ItemTooLong {
                item: item.to_string(),
                max_len: self.settings.max_item_length,
            });
        }
        None
    }

    fn meta_for(&self, item: &str, inv: &Invocation<'_>) -> EntryMeta {
        EntryMeta {
            added_at: Some(inv.at),
            added_by: (item != inv.caller.handle).then(|| inv.caller.handle.clone()),
        }
    }
}

impl Default for QueueEngine {
    fn default() -> Self {
        Self::new(QueueSettings::default())
    }
}
