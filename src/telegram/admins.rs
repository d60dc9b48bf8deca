//! Caller role resolution for Telegram chats.
//!
//! Group administrator lists are fetched from Telegram and kept for a bounded
//! time. A stale entry can only outlive an admin change by the TTL.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use teloxide::prelude::Requester;
use teloxide::types::ChatId;
use teloxide::Bot;
use tokio::sync::RwLock;

use crate::core::{CallerRole, ChatKind, ConversationId};
use crate::error::{Error, Result};

/// Decides whether a user administers a conversation.
#[async_trait]
pub trait RoleResolver: Send + Sync {
    async fn resolve_role(
        &self,
        conversation: ConversationId,
        kind: ChatKind,
        user_id: u64,
    ) -> Result<CallerRole>;
}

struct CachedAdmins {
    fetched_at: Instant,
    admins: Vec<u64>,
}

/// Time-bounded cache of administrator ids per conversation.
pub struct AdminCache {
    ttl: Duration,
    entries: RwLock<HashMap<ConversationId, CachedAdmins>>,
}

impl AdminCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cached admins, if fetched less than one TTL ago.
    pub async fn get(&self, conversation: ConversationId) -> Option<Vec<u64>> {
        let entries = self.entries.read().await;
        entries
            .get(&conversation)
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| cached.admins.clone())
    }

    /// Store a fresh admin list, dropping entries that have expired.
    pub async fn insert(&self, conversation: ConversationId, admins: Vec<u64>) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, cached| cached.fetched_at.elapsed() < self.ttl);
        entries.insert(
            conversation,
            CachedAdmins {
                fetched_at: Instant::now(),
                admins,
            },
        );
    }

    /// Return cached admins or fetch and cache them.
    ///
    /// Concurrent misses may both fetch; the later write wins. Failed fetches
    /// are not cached.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        conversation: ConversationId,
        fetch: F,
    ) -> Result<Vec<u64>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u64>>>,
    {
        if let Some(admins) = self.get(conversation).await {
            return Ok(admins);
        }

        let admins = fetch().await?;
        tracing::debug!(
            "Fetched {} admins for conversation {}",
            admins.len(),
            conversation
        );
        self.insert(conversation, admins.clone()).await;
        Ok(admins)
    }
}

/// Resolves roles through `getChatAdministrators`.
pub struct TelegramRoleResolver {
    bot: Bot,
    cache: AdminCache,
}

impl TelegramRoleResolver {
    pub fn new(bot: Bot, ttl: Duration) -> Self {
        Self {
            bot,
            cache: AdminCache::new(ttl),
        }
    }
}

#[async_trait]
impl RoleResolver for TelegramRoleResolver {
    async fn resolve_role(
        &self,
        conversation: ConversationId,
        kind: ChatKind,
        user_id: u64,
    ) -> Result<CallerRole> {
        if kind == ChatKind::Private {
            return Ok(CallerRole::Administrator);
        }

        let admins = self
            .cache
            .get_or_fetch(conversation, || async {
                let members = self
                    .bot
                    .get_chat_administrators(ChatId(conversation.0))
                    .await?;
                Ok::<_, Error>(members.into_iter().map(|m| m.user.id.0).collect())
            })
            .await?;

        Ok(role_from_admins(&admins, user_id))
    }
}

pub fn role_from_admins(admins: &[u64], user_id: u64) -> CallerRole {
    if admins.contains(&user_id) {
        CallerRole::Administrator
    } else {
        CallerRole::RegularMember
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CHAT: ConversationId = ConversationId(-500);

    async fn fetch_counted(calls: &AtomicUsize, admins: Vec<u64>) -> Result<Vec<u64>> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(admins)
    }

    #[tokio::test]
    async fn test_cache_hit_within_ttl() {
        let cache = AdminCache::new(Duration::from_secs(3600));
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_fetch(CHAT, || fetch_counted(&calls, vec![1, 2]))
            .await
            .unwrap();
        let second = cache
            .get_or_fetch(CHAT, || fetch_counted(&calls, vec![3]))
            .await
            .unwrap();

        assert_eq!(first, vec![1, 2]);
        assert_eq!(second, vec![1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refetches() {
        let cache = AdminCache::new(Duration::ZERO);
        let calls = AtomicUsize::new(0);

        cache
            .get_or_fetch(CHAT, || fetch_counted(&calls, vec![1]))
            .await
            .unwrap();
        let admins = cache
            .get_or_fetch(CHAT, || fetch_counted(&calls, vec![9]))
            .await
            .unwrap();

        assert_eq!(admins, vec![9]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.get(CHAT).await, None);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache = AdminCache::new(Duration::from_secs(3600));
        let result = cache
            .get_or_fetch(CHAT, || async { Err(Error::Telegram("timeout".to_string())) })
            .await;
        assert!(result.is_err());
        assert_eq!(cache.get(CHAT).await, None);
    }

    #[tokio::test]
    async fn test_conversations_cached_independently() {
        let cache = AdminCache::new(Duration::from_secs(3600));
        cache.insert(CHAT, vec![1]).await;
        cache.insert(ConversationId(-600), vec![2]).await;
        assert_eq!(cache.get(CHAT).await, Some(vec![1]));
        assert_eq!(cache.get(ConversationId(-600)).await, Some(vec![2]));
    }

    #[tokio::test]
    async fn test_expired_entries_are_pruned() {
        let cache = AdminCache::new(Duration::ZERO);
        for id in 0..10 {
            cache.insert(ConversationId(id), vec![1]).await;
        }
        assert_eq!(cache.entries.read().await.len(), 1);
    }

    #[test]
    fn test_role_from_admins() {
        assert_eq!(role_from_admins(&[1, 2], 2), CallerRole::Administrator);
        assert_eq!(role_from_admins(&[1, 2], 3), CallerRole::RegularMember);
        assert_eq!(role_from_admins(&[], 1), CallerRole::RegularMember);
    }
}
