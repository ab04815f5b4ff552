use tokio::sync::watch;

use crate::types::{LogError, Ordinal};

/// Sentinel published when the log handle closes, so every pending waiter
/// resolves with a cancellation instead of hanging.
const CLOSED: u64 = u64::MAX;

/// Process-local publish/subscribe point for "record N now exists".
///
/// Built on a [`watch`] channel carrying the published record count. Watchers
/// re-check the count on every wake, so a publish that jumps several records
/// ahead (e.g. an external appender batching) still wakes a waiter parked on
/// an earlier ordinal exactly once.
#[derive(Debug)]
pub(crate) struct Notifier {
    tx: watch::Sender<u64>,
}

impl Notifier {
    pub(crate) fn new(initial_count: u64) -> Self {
        let (tx, _rx) = watch::channel(initial_count);
        Notifier { tx }
    }

    /// Announce that the record count reached `count`. Monotonic; stale or
    /// duplicate publishes are dropped without waking anyone. A publish with
    /// zero subscribers is a no-op.
    pub(crate) fn publish(&self, count: u64) {
        self.tx.send_if_modified(|current| {
            if count > *current && *current != CLOSED {
                *current = count;
                true
            } else {
                false
            }
        });
    }

    /// Resolve every pending and future wait with [`LogError::Closed`].
    pub(crate) fn close(&self) {
        self.tx.send_if_modified(|current| {
            if *current != CLOSED {
                *current = CLOSED;
                true
            } else {
                false
            }
        });
    }

    pub(crate) fn subscribe(&self) -> OrdinalWatcher {
        OrdinalWatcher {
            rx: self.tx.subscribe(),
        }
    }
}

/// One subscription to the [`Notifier`]. Dropping the watcher cancels it
/// immediately; no wakeup is delivered afterwards and nothing leaks.
#[derive(Debug, Clone)]
pub struct OrdinalWatcher {
    rx: watch::Receiver<u64>,
}

impl OrdinalWatcher {
    /// Suspend until the published record count exceeds `ordinal`, i.e. the
    /// record at `ordinal` exists. Returns the count observed at wake, which
    /// may be several records past the target.
    pub async fn wait_for(&mut self, ordinal: Ordinal) -> Result<u64, LogError> {
        let count = *self
            .rx
            .wait_for(|count| *count == CLOSED || *count > ordinal)
            .await
            .map_err(|_| LogError::Closed)?;
        if count == CLOSED {
            return Err(LogError::Closed);
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn publish_wakes_waiter() {
        let notifier = Notifier::new(0);
        let mut watcher = notifier.subscribe();

        let wait = tokio::spawn(async move { watcher.wait_for(0).await });
        notifier.publish(1);
        assert_eq!(wait.await.unwrap().unwrap(), 1);
    }

    #[tokio::test]
    async fn batched_publish_wakes_earlier_target() {
        let notifier = Notifier::new(5);
        let mut watcher = notifier.subscribe();

        // waiting on ordinal 5; count jumping straight to 8 must wake it
        notifier.publish(8);
        assert_eq!(watcher.wait_for(5).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn stale_publish_does_not_wake() {
        let notifier = Notifier::new(3);
        let mut watcher = notifier.subscribe();
        notifier.publish(2);

        let res = timeout(Duration::from_millis(50), watcher.wait_for(3)).await;
        assert!(res.is_err(), "stale publish must not satisfy the wait");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_noop() {
        let notifier = Notifier::new(0);
        notifier.publish(1);
        notifier.publish(2);

        // a late subscriber still observes the current count
        let mut watcher = notifier.subscribe();
        assert_eq!(watcher.wait_for(1).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn close_resolves_pending_waits() {
        let notifier = Notifier::new(0);
        let mut watcher = notifier.subscribe();

        let wait = tokio::spawn(async move { watcher.wait_for(0).await });
        notifier.close();
        assert!(matches!(wait.await.unwrap(), Err(LogError::Closed)));

        let mut late = notifier.subscribe();
        assert!(matches!(late.wait_for(0).await, Err(LogError::Closed)));
    }

    #[tokio::test]
    async fn dropped_watcher_ignores_later_publish() {
        let notifier = Notifier::new(0);
        let watcher = notifier.subscribe();
        drop(watcher);
        // no subscriber left; must not panic or deliver anywhere
        notifier.publish(1);
    }

    #[tokio::test]
    async fn all_subscribers_wake_on_one_publish() {
        let notifier = Notifier::new(0);
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();

        notifier.publish(1);
        assert_eq!(a.wait_for(0).await.unwrap(), 1);
        assert_eq!(b.wait_for(0).await.unwrap(), 1);
    }
}
