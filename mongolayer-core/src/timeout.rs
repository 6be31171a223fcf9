//! The per-query time limit shared by every operation of a handle.

use std::{fmt, time::Duration};

use mea::rwlock::RwLock;

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// A query time limit that many tasks read and one task may replace.
pub struct QueryTimeout {
    value: RwLock<Duration>,
}

impl fmt::Debug for QueryTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryTimeout").finish_non_exhaustive()
    }
}

impl Default for QueryTimeout {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY_TIMEOUT)
    }
}

impl QueryTimeout {
    pub fn new(timeout: Duration) -> Self {
        Self { value: RwLock::new(timeout) }
    }

    /// Returns the current limit.
    pub async fn get(&self) -> Duration {
        *self.value.read().await
    }

    /// Replaces the limit. Operations already in flight keep the value they
    /// started with.
    pub async fn set(&self, timeout: Duration) {
        *self.value.write().await = timeout;
    }

    /// Twice the current limit, for operations that issue two server
    /// round trips under one bound.
    pub async fn doubled(&self) -> Duration {
        self.get().await.saturating_mul(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_default_is_thirty_seconds() {
        let timeout = QueryTimeout::default();
        assert_eq!(timeout.get().await, Duration::from_secs(30));
        assert_eq!(timeout.doubled().await, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_set_replaces_value() {
        let timeout = QueryTimeout::new(Duration::from_secs(1));
        timeout.set(Duration::from_millis(250)).await;
        assert_eq!(timeout.get().await, Duration::from_millis(250));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_readers_never_see_torn_values() {
        let old = Duration::new(1, 111_111_111);
        let new = Duration::new(9, 999_999_999);
        let timeout = Arc::new(QueryTimeout::new(old));

        let readers = (0..8)
            .map(|_| {
                let timeout = Arc::clone(&timeout);
                tokio::spawn(async move {
                    for _ in 0..1_000 {
                        let seen = timeout.get().await;
                        assert!(seen == old || seen == new, "observed {seen:?}");
                    }
                })
            })
            .collect::<Vec<_>>();

        let writer = {
            let timeout = Arc::clone(&timeout);
            tokio::spawn(async move {
                for i in 0..1_000 {
                    timeout.set(if i % 2 == 0 { new } else { old }).await;
                }
                timeout.set(new).await;
            })
        };

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
        assert_eq!(timeout.get().await, new);
    }
}
