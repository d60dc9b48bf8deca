//! Conversation state storage.
//!
//! The dispatcher loads a conversation's state before each command and saves
//! it back after commands that changed it. Stores only persist; they do not
//! serialize access to a conversation, the dispatcher does.

pub mod json;
pub mod memory;

use std::sync::Arc;

use crate::config::{StoreBackend, StoreSettings};
use crate::core::{ConversationId, ConversationState};
use crate::error::Result;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

/// Keyed storage of conversation states.
pub trait StateStore: Send + Sync {
    /// Load a conversation, `None` if it was never saved.
    fn load(&self, id: ConversationId) -> Result<Option<ConversationState>>;

    fn save(&self, id: ConversationId, state: &ConversationState) -> Result<()>;

    /// Forget a conversation. Returns whether anything was stored.
    fn delete(&self, id: ConversationId) -> Result<bool>;

    /// Ids of every stored conversation, in ascending order.
    fn list(&self) -> Result<Vec<ConversationId>>;
}

/// Open the store selected in settings.
pub fn open_store(settings: &StoreSettings) -> Result<Arc<dyn StateStore>> {
    match settings.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory conversation store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Json => {
            let dir = settings.resolved_path()?;
            tracing::info!("Using JSON conversation store at {}", dir.display());
            Ok(Arc::new(JsonFileStore::open(dir)?))
        }
    }
}
