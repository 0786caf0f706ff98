//! Durable, deduplicated set of subscribers.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::subscriber::store::SubscriberStore;
use crate::subscriber::types::ChatId;
use crate::Result;

/// Registry of subscribed chats.
///
/// Mutations go through a single writer lock and are persisted before the
/// in-memory set is replaced, so the visible membership never runs ahead of
/// what is on disk. Readers get a copy of the current set and are never
/// blocked by file I/O.
pub struct SubscriberRegistry {
    store: SubscriberStore,
    members: RwLock<Arc<BTreeSet<ChatId>>>,
    writer: Mutex<()>,
}

impl SubscriberRegistry {
    /// Open the registry, loading whatever the store holds.
    pub async fn open(store: SubscriberStore) -> Result<Self> {
        let members = store.load().await?;
        info!(
            "Loaded {} subscriber(s) from {}",
            members.len(),
            store.path().display()
        );

        Ok(Self {
            store,
            members: RwLock::new(Arc::new(members)),
            writer: Mutex::new(()),
        })
    }

    /// Add a subscriber.
    ///
    /// Returns `true` if the chat was new. Adding an existing member is a
    /// no-op and does not touch the store.
    pub async fn add(&self, id: ChatId) -> Result<bool> {
        let _guard = self.writer.lock().await;
        let current = self.snapshot().await;
        if current.contains(&id) {
            debug!("Chat {} is already subscribed", id);
            return Ok(false);
        }

        let mut next = (*current).clone();
        next.insert(id);
        self.commit(next).await?;

        info!("Chat {} subscribed", id);
        Ok(true)
    }

    /// All current subscribers.
    pub async fn all(&self) -> BTreeSet<ChatId> {
        (*self.snapshot().await).clone()
    }

    /// Whether the chat is subscribed.
    pub async fn contains(&self, id: ChatId) -> bool {
        self.members.read().await.contains(&id)
    }

    /// Number of subscribers.
    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    /// Whether there are no subscribers.
    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }

    /// Remove the given chats and persist the result.
    ///
    /// Returns how many were actually removed. Only called for explicit
    /// pruning; delivery never removes anyone on its own.
    pub async fn remove<I>(&self, ids: I) -> Result<usize>
    where
        I: IntoIterator<Item = ChatId>,
    {
        let _guard = self.writer.lock().await;
        let current = self.snapshot().await;

        let mut next = (*current).clone();
        let removed: Vec<ChatId> = ids.into_iter().filter(|id| next.remove(id)).collect();
        if removed.is_empty() {
            return Ok(0);
        }

        self.commit(next).await?;
        info!("Removed {} subscriber(s): {:?}", removed.len(), removed);
        Ok(removed.len())
    }

    async fn snapshot(&self) -> Arc<BTreeSet<ChatId>> {
        Arc::clone(&*self.members.read().await)
    }

    /// Persist first; memory is only updated once the write succeeded.
    async fn commit(&self, next: BTreeSet<ChatId>) -> Result<()> {
        self.store.save(&next).await?;
        *self.members.write().await = Arc::new(next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RelayError;

    async fn open_in(dir: &tempfile::TempDir) -> SubscriberRegistry {
        SubscriberRegistry::open(SubscriberStore::new(dir.path().join("users_database.db")))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open_in(&dir).await;

        assert!(registry.add(ChatId(111)).await.unwrap());
        assert!(!registry.add(ChatId(111)).await.unwrap());

        let all = registry.all().await;
        assert_eq!(all.len(), 1);
        assert!(all.contains(&ChatId(111)));
    }

    #[tokio::test]
    async fn test_add_is_write_through() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open_in(&dir).await;
        registry.add(ChatId(5)).await.unwrap();
        drop(registry);

        let reopened = open_in(&dir).await;
        assert!(reopened.contains(ChatId(5)).await);
    }

    #[tokio::test]
    async fn test_remove_only_existing() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open_in(&dir).await;
        registry.add(ChatId(1)).await.unwrap();
        registry.add(ChatId(2)).await.unwrap();

        let removed = registry.remove([ChatId(2), ChatId(3)]).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(registry.all().await, BTreeSet::from([ChatId(1)]));
        assert_eq!(registry.remove([ChatId(9)]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_membership_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let registry = SubscriberRegistry::open(SubscriberStore::new(blocker.join("db")))
            .await
            .unwrap();

        let result = registry.add(ChatId(1)).await;
        assert!(matches!(result, Err(RelayError::Persistence(_))));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_remove_leaves_membership_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let users = dir.path().join("users");
        let registry = SubscriberRegistry::open(SubscriberStore::new(users.join("db")))
            .await
            .unwrap();
        registry.add(ChatId(1)).await.unwrap();
        registry.add(ChatId(2)).await.unwrap();

        // Replace the store's directory with a plain file so the next write fails.
        std::fs::remove_dir_all(&users).unwrap();
        std::fs::write(&users, "x").unwrap();

        let result = registry.remove([ChatId(2)]).await;
        assert!(matches!(result, Err(RelayError::Persistence(_))));
        assert_eq!(registry.all().await, BTreeSet::from([ChatId(1), ChatId(2)]));
    }
}
