//! Volatile store kept in process memory.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::core::{ConversationId, ConversationState};
use crate::error::{Error, Result};

use super::StateStore;

#[derive(Default)]
pub struct MemoryStore {
    chats: RwLock<HashMap<ConversationId, ConversationState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::Store("memory store lock poisoned".to_string())
}

impl StateStore for MemoryStore {
    fn load(&self, id: ConversationId) -> Result<Option<ConversationState>> {
        let chats = self.chats.read().map_err(poisoned)?;
        Ok(chats.get(&id).cloned())
    }

    fn save(&self, id: ConversationId, state: &ConversationState) -> Result<()> {
        let mut chats = self.chats.write().map_err(poisoned)?;
        chats.insert(id, state.clone());
        Ok(())
    }

    fn delete(&self, id: ConversationId) -> Result<bool> {
        let mut chats = self.chats.write().map_err(poisoned)?;
        Ok(chats.remove(&id).is_some())
    }

    fn list(&self) -> Result<Vec<ConversationId>> {
        let chats = self.chats.read().map_err(poisoned)?;
        let mut ids: Vec<ConversationId> = chats.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        let id = ConversationId(-42);
        assert_eq!(store.load(id).unwrap(), None);

        let mut state = ConversationState::default();
        state.queue.append("alice", None);
        state.frozen = false;
        store.save(id, &state).unwrap();
        store.save(ConversationId(7), &ConversationState::default()).unwrap();

        assert_eq!(store.load(id).unwrap(), Some(state));
        assert_eq!(store.list().unwrap(), vec![ConversationId(-42), ConversationId(7)]);

        assert!(store.delete(id).unwrap());
        assert!(!store.delete(id).unwrap());
        assert_eq!(store.load(id).unwrap(), None);
    }
}
