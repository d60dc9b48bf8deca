//! Core module - per-chat queues and the commands that drive them.
//!
//! - Ordered waiting list with item metadata
//! - Conversation state and caller identity
//! - Command table with permission gates
//! - Command engine and its replies

pub mod command;
pub mod conversation;
pub mod engine;
pub mod messages;
pub mod queue;

pub use command::{Command, Gate};
pub use conversation::{Caller, CallerRole, ChatKind, ConversationId, ConversationState};
pub use engine::{Invocation, Outcome, QueueEngine};
pub use messages::{Reply, ReplyKind};
pub use queue::{EntryList, EntryMeta, ListError, MetaFormat};
