//! Dispatching commands to conversations.
//!
//! Each conversation's state is guarded by its own async mutex, so commands
//! for one chat run one at a time while different chats proceed concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::core::{
    Caller, CallerRole, ChatKind, Command, ConversationId, ConversationState, Invocation, Outcome,
    QueueEngine, Reply, ReplyKind,
};
use crate::error::Result;
use crate::store::StateStore;

/// A resolved command, ready for the engine.
#[derive(Clone, Debug)]
pub struct Request {
    pub conversation: ConversationId,
    pub kind: ChatKind,
    pub command: Command,
    pub args: Vec<String>,
    pub role: CallerRole,
    pub caller: Caller,
}

/// Ordered replies to deliver to the conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseSet {
    replies: Vec<Reply>,
    mutated: bool,
}

impl ResponseSet {
    fn from_outcome(outcome: Outcome) -> Self {
        Self {
            replies: outcome.replies,
            mutated: outcome.mutated,
        }
    }

    pub fn replies(&self) -> &[Reply] {
        &self.replies
    }

    /// Rendered message bodies, in delivery order.
    pub fn messages(&self) -> Vec<String> {
        self.replies.iter().map(Reply::to_string).collect()
    }

    /// Outcome class of the command.
    pub fn kind(&self) -> ReplyKind {
        self.replies
            .first()
            .map_or(ReplyKind::Success, Reply::kind)
    }

    pub fn mutated(&self) -> bool {
        self.mutated
    }
}

pub struct Dispatcher {
    engine: QueueEngine,
    store: Arc<dyn StateStore>,
    locks: Mutex<HashMap<ConversationId, Arc<Mutex<()>>>>,
}

impl Dispatcher {
    pub fn new(engine: QueueEngine, store: Arc<dyn StateStore>) -> Self {
        Self {
            engine,
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    async fn lock_for(&self, id: ConversationId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(id).or_default())
    }

    /// Drop a conversation's lock entry once no other command holds or awaits it.
    async fn release(&self, id: ConversationId, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        drop(lock);
        if locks.get(&id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&id);
        }
    }

    /// Run one command: load the state, execute, save if it changed.
    ///
    /// Store faults abort the command; the engine never sees partial input.
    /// Returns the replies together with the conversation state after the command.
    pub async fn dispatch(&self, request: &Request) -> Result<(ResponseSet, ConversationState)> {
        let lock = self.lock_for(request.conversation).await;
        let result = {
            let _guard = lock.lock().await;
            self.run_locked(request)
        };
        self.release(request.conversation, lock).await;
        result
    }

    fn run_locked(&self, request: &Request) -> Result<(ResponseSet, ConversationState)> {
        let mut state = match self.store.load(request.conversation)? {
            Some(state) => state,
            None => {
                tracing::debug!("New conversation {}", request.conversation);
                ConversationState::default()
            }
        };

        let invocation = Invocation {
            command: request.command,
            args: &request.args,
            role: request.role,
            kind: request.kind,
            caller: &request.caller,
            at: Utc::now(),
        };
        let outcome = {
            let mut rng = rand::thread_rng();
            self.engine.execute(&mut state, &invocation, &mut rng)
        };

        let response = ResponseSet::from_outcome(outcome);
        tracing::debug!(
            "/{} in {} by {}: {:?}",
            request.command,
            request.conversation,
            request.caller.handle,
            response.kind()
        );

        if response.mutated() {
            self.store.save(request.conversation, &state)?;
        }

        Ok((response, state))
    }

    /// Drop a conversation's state entirely.
    pub async fn reset(&self, id: ConversationId) -> Result<bool> {
        let lock = self.lock_for(id).await;
        let result = {
            let _guard = lock.lock().await;
            self.store.delete(id)
        };
        self.release(id, lock).await;

        let removed = result?;
        if removed {
            tracing::info!("Reset conversation {}", id);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::MemoryStore;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(QueueEngine::default(), Arc::new(MemoryStore::new()))
    }

    fn request(command: Command, args: &[&str], role: CallerRole) -> Request {
        Request {
            conversation: ConversationId(-100),
            kind: ChatKind::Group,
            command,
            args: args.iter().map(|a| a.to_string()).collect(),
            role,
            caller: Caller::from_user(Some("bob"), "Bob B"),
        }
    }

    struct BrokenStore;

    impl StateStore for BrokenStore {
        fn load(&self, _: ConversationId) -> Result<Option<ConversationState>> {
            Err(Error::Store("offline".to_string()))
        }

        fn save(&self, _: ConversationId, _: &ConversationState) -> Result<()> {
            Err(Error::Store("offline".to_string()))
        }

        fn delete(&self, _: ConversationId) -> Result<bool> {
            Err(Error::Store("offline".to_string()))
        }

        fn list(&self) -> Result<Vec<ConversationId>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_dispatch_saves_only_mutations() {
        let d = dispatcher();

        let (response, _) = d
            .dispatch(&request(Command::Queue, &[], CallerRole::RegularMember))
            .await
            .unwrap();
        assert_eq!(response.messages(), vec!["The queue is currently empty"]);
        assert!(d.store().list().unwrap().is_empty());

        let (response, returned) = d
            .dispatch(&request(Command::Add, &[], CallerRole::Administrator))
            .await
            .unwrap();
        assert!(response.mutated());
        assert_eq!(response.messages().len(), 1);
        assert!(response.messages()[0].contains("bob (Bob B)"));

        let state = d.store().load(ConversationId(-100)).unwrap().unwrap();
        assert_eq!(state.queue.iter().collect::<Vec<_>>(), vec!["bob"]);
        assert!(state.frozen);
        assert_eq!(returned, state);
    }

    #[tokio::test]
    async fn test_denied_command_leaves_store_untouched() {
        let d = dispatcher();
        let (response, state) = d
            .dispatch(&request(Command::Add, &["x"], CallerRole::RegularMember))
            .await
            .unwrap();
        assert_eq!(response.kind(), ReplyKind::Permission);
        assert!(state.queue.is_empty());
        assert!(d.store().load(ConversationId(-100)).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_flags_persist_between_commands() {
        let d = dispatcher();
        d.dispatch(&request(Command::Unfreeze, &[], CallerRole::Administrator))
            .await
            .unwrap();
        let (response, _) = d
            .dispatch(&request(Command::Add, &["carol"], CallerRole::RegularMember))
            .await
            .unwrap();
        assert_eq!(response.kind(), ReplyKind::Success);
    }

    #[tokio::test]
    async fn test_concurrent_commands_are_serialized() {
        let d = Arc::new(dispatcher());
        let mut handles = Vec::new();
        for i in 0..32 {
            let d = Arc::clone(&d);
            handles.push(tokio::spawn(async move {
                let name = format!("user{}", i);
                d.dispatch(&request(Command::Add, &[name.as_str()], CallerRole::Administrator))
                    .await
                    .unwrap()
                    .0
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().mutated());
        }

        let state = d.store().load(ConversationId(-100)).unwrap().unwrap();
        assert_eq!(state.queue.len(), 32);
        assert!(d.locks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_reset_forgets_conversation() {
        let d = dispatcher();
        d.dispatch(&request(Command::Add, &["x"], CallerRole::Administrator))
            .await
            .unwrap();
        assert!(d.reset(ConversationId(-100)).await.unwrap());
        assert!(!d.reset(ConversationId(-100)).await.unwrap());

        // Fresh conversations start frozen again.
        let (response, _) = d
            .dispatch(&request(Command::Add, &["y"], CallerRole::RegularMember))
            .await
            .unwrap();
        assert_eq!(response.kind(), ReplyKind::Permission);
    }

    #[tokio::test]
    async fn test_lock_entries_are_released() {
        let d = dispatcher();
        d.dispatch(&request(Command::Add, &["x"], CallerRole::Administrator))
            .await
            .unwrap();
        assert!(d.locks.lock().await.is_empty());

        let held = d.lock_for(ConversationId(-100)).await;
        d.reset(ConversationId(-100)).await.unwrap();
        assert!(d.locks.lock().await.contains_key(&ConversationId(-100)));

        d.release(ConversationId(-100), held).await;
        assert!(d.locks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_store_fault_aborts_dispatch() {
        let d = Dispatcher::new(QueueEngine::default(), Arc::new(BrokenStore));
        let result = d
            .dispatch(&request(Command::Help, &[], CallerRole::Administrator))
            .await;
        assert!(matches!(result, Err(Error::Store(_))));
        assert!(d.locks.lock().await.is_empty());
    }
}
