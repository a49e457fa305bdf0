use std::collections::HashSet;

use crate::AtomicSet;

/// Set of identifiers already claimed by a crawl.
///
/// Cloning is cheap and every clone shares the same underlying set, so a
/// registry can be handed to several crawlers that must not fetch the same
/// page twice.
#[derive(Clone, Debug, Default)]
pub struct VisitedRegistry {
    claimed: AtomicSet,
}

impl VisitedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `id` if nobody has yet. Returns `false` without touching the
    /// set when it was already claimed.
    ///
    /// The check and the insert happen under one write guard.
    pub async fn try_claim(&self, id: &str) -> bool {
        let mut claimed = self.claimed.write().await;
        if claimed.contains(id) {
            return false;
        }
        claimed.insert(id.to_owned())
    }

    pub async fn is_claimed(&self, id: &str) -> bool {
        self.claimed.read().await.contains(id)
    }

    pub async fn len(&self) -> usize {
        self.claimed.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.claimed.read().await.is_empty()
    }

    pub async fn snapshot(&self) -> HashSet<String> {
        self.claimed.read().await.clone()
    }
}
