//! Replies produced by the queue engine.
//!
//! A [`Reply`] is a message key plus its substitution values. Rendering to
//! text happens here so the engine never deals with wording.

use std::fmt;

const RED_CROSS: &str = "\u{274C}";
const CHECK_MARK: &str = "\u{2714}";

pub const START_TEXT: &str = "I am a bot! \u{1F916}\n\
Please give me a command. I won't rebel. For now.";

pub const HELP_TEXT: &str = "This is the qBot, the bot to organize your queues. Here is a list of commands:
Basic:
    /help: show this help menu
    /start: start your conversation with the bot
Queueing:
    /queue: show queue
    /add [element]: add an element in the line. If no element
        is provided, your username is added in the queue.
    /next [message]: pick the first element in line and attach
        an optional message
    /clear: clear queue
Queue editing:
    /rm <row>: remove the element on the provided row number
    /insert <element> <row>: insert the element in the
        specified row
Administration:
    /freeze, /unfreeze: only admins may add to the queue while frozen
    /enable_protection, /disable_protection: only admins may call,
        remove or clear while protected";

/// Celebratory announcements for `/next`; `{item}` is replaced by the called item.
pub const NEXT_TEMPLATES: [&str; 5] = [
    "{item}, it's your time to shine! \u{2728}",
    "{item}'s turn has finally arrived \u{1F389}",
    "{item}: your wait is over! \u{231B}",
    "{item} has waited for long enough \u{23F0}",
    "It's {item}'s turn \u{1F514}",
];

/// Outcome class of a reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyKind {
    Success,
    /// Malformed arguments.
    Validation,
    /// Item already queued.
    Conflict,
    /// Position outside the queue.
    Range,
    /// Command needs a non-empty queue.
    EmptyState,
    /// Gate denied.
    Permission,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Help,
    Welcome,
    QueueEmpty,
    QueuePage(String),
    Added { item: String, position: usize },
    AddedInGroup { user: String, item: String, position: usize },
    Inserted { item: String, position: usize },
    InsertedInGroup { user: String, item: String, position: usize },
    Called { item: String, template: usize },
    CalledWithMessage { item: String, message: String },
    Removed { item: String },
    Cleared,
    Frozen,
    Unfrozen,
    ProtectionEnabled,
    ProtectionDisabled,

    PermissionDenied { user: String, command: String },
    ForbiddenCharacter,
    ItemTooLong { item: String, max_len: usize },
    AlreadyQueued { item: String, position: usize },
    NothingQueued,
    InsertQueueEmpty,
    InsertNotEnoughArguments,
    IndexNotNumeric { index: String },
    InsertIndexOutOfBounds { index: String },
    RemoveIndexNotProvided,
    RemoveTooManyArguments,
    RemoveIndexOutOfRange { index: String },
}

impl Reply {
    pub fn kind(&self) -> ReplyKind {
        match self {
            Reply::PermissionDenied { .. } => ReplyKind::Permission,
            Reply::ForbiddenCharacter
            | Reply::ItemTooLong { .. }
            | Reply::InsertNotEnoughArguments
            | Reply::IndexNotNumeric { .. }
            | Reply::RemoveIndexNotProvided
            | Reply::RemoveTooManyArguments => ReplyKind::Validation,
            Reply::AlreadyQueued { .. } => ReplyKind::Conflict,
            Reply::InsertIndexOutOfBounds { .. } | Reply::RemoveIndexOutOfRange { .. } => {
                ReplyKind::Range
            }
            Reply::NothingQueued | Reply::InsertQueueEmpty => ReplyKind::EmptyState,
            _ => ReplyKind::Success,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind() != ReplyKind::Success
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Help => f.write_str(HELP_TEXT),
            Reply::Welcome => f.write_str(START_TEXT),
            Reply::QueueEmpty | Reply::NothingQueued => f.write_str("The queue is currently empty"),
            Reply::QueuePage(text) => f.write_str(text),
            Reply::Added { item, position } => {
                write!(f, "{} {} added to the queue at position {}", CHECK_MARK, item, position)
            }
            Reply::AddedInGroup { user, item, position } => write!(
                f,
                "{} {} added {} to the queue at position {}",
                CHECK_MARK, user, item, position
            ),
            Reply::Inserted { item, position } => {
                write!(f, "{} {} inserted at position {}", CHECK_MARK, item, position)
            }
            Reply::InsertedInGroup { user, item, position } => write!(
                f,
                "{} {} inserted {} at position {}",
                CHECK_MARK, user, item, position
            ),
            Reply::Called { item, template } => {
                let template = NEXT_TEMPLATES[template % NEXT_TEMPLATES.len()];
                f.write_str(&template.replace("{item}", item))
            }
            Reply::CalledWithMessage { item, message } => write!(f, "{}: {}", item, message),
            Reply::Removed { item } => write!(f, "{} Removed {} from the queue", CHECK_MARK, item),
            Reply::Cleared => write!(f, "{} The queue has been cleared", CHECK_MARK),
            Reply::Frozen => write!(
                f,
                "{} The queue is frozen: only admins can add new items",
                CHECK_MARK
            ),
            Reply::Unfrozen => write!(
                f,
                "{} The queue is unfrozen: everyone can add new items",
                CHECK_MARK
            ),
            Reply::ProtectionEnabled => write!(
                f,
                "{} Protection enabled: only admins can call, remove or clear",
                CHECK_MARK
            ),
            Reply::ProtectionDisabled => write!(
                f,
                "{} Protection disabled: everyone can call, remove or clear",
                CHECK_MARK
            ),
            Reply::PermissionDenied { user, command } => write!(
                f,
                "{} Sorry {}, you are not allowed to run '{}' here",
                RED_CROSS, user, command
            ),
            Reply::ForbiddenCharacter => write!(
                f,
                "{} Sorry, I can't add your item to the list: there is a forbidden character in your message.",
                RED_CROSS
            ),
            Reply::ItemTooLong { item, max_len } => write!(
                f,
                "{} '{}' is too long: items can be at most {} characters",
                RED_CROSS, item, max_len
            ),
            Reply::AlreadyQueued { item, position } => write!(
                f,
                "{} {} is already in the queue at position {}!",
                RED_CROSS, item, position
            ),
            Reply::InsertQueueEmpty => write!(
                f,
                "{} The queue is empty: use '/add <item>' to start it",
                RED_CROSS
            ),
            Reply::InsertNotEnoughArguments => write!(
                f,
                "{} Please provide the item and the row where you want it inserted, as in '/insert <item> <row>'",
                RED_CROSS
            ),
            Reply::IndexNotNumeric { index } => {
                write!(f, "{} I did not recognize '{}' as a row number", RED_CROSS, index)
            }
            Reply::InsertIndexOutOfBounds { index } => write!(
                f,
                "{} Row '{}' is outside of the queue. Please insert a valid row number.",
                RED_CROSS, index
            ),
            Reply::RemoveIndexNotProvided => write!(
                f,
                "{} Please provide the row of the item to remove, as in '/rm <row>'!",
                RED_CROSS
            ),
            Reply::RemoveTooManyArguments => write!(
                f,
                "{} TMI! Please only provide the row number of the item you want to remove.",
                RED_CROSS
            ),
            Reply::RemoveIndexOutOfRange { index } => write!(
                f,
                "{} There's nothing under row {}. Consult the queue with the command '/queue'",
                RED_CROSS, index
            ),
        }
    }
}
