//! Subscription Registry
//!
//! Process-wide directory from match id to the viewers watching that match.
//!
//! # Design
//!
//! Every subscriber gets its own bounded single-receiver queue. `publish`
//! pushes into each queue without blocking; a full queue overwrites its
//! oldest entry, so a stalled viewer loses stale updates instead of holding
//! up everyone else. The map, `subscribe`, `unsubscribe` and `publish` all
//! serialize on one mutex, which is what guarantees that nothing is queued
//! for a subscriber once its `unsubscribe` has returned.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::application::ports::{BridgeError, UpstreamSource};
use crate::domain::scoring::{MatchId, ScoreUpdateEvent};
use crate::infrastructure::metrics;

// =============================================================================
// Types
// =============================================================================

/// Unique identifier for one subscription.
pub type SubscriberId = u64;

/// Default per-subscriber queue depth.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The upstream source could not be started.
    #[error("live updates unavailable: {0}")]
    Upstream(#[from] BridgeError),
}

/// Snapshot of registry occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Match ids with at least one subscriber.
    pub matches: usize,
    /// Total subscriptions across all matches.
    pub subscribers: usize,
}

type SubscriberMap = HashMap<SubscriberId, broadcast::Sender<ScoreUpdateEvent>>;

// =============================================================================
// Registry
// =============================================================================

/// Fan-out directory of live subscriptions keyed by match id.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use score_stream::application::services::SubscriptionRegistry;
/// use score_stream::domain::scoring::MatchId;
///
/// # async fn example() {
/// let registry = Arc::new(SubscriptionRegistry::new(16));
/// let match_id = MatchId::parse("42").unwrap();
///
/// let mut subscription = registry.subscribe(match_id.clone()).await.unwrap();
/// assert_eq!(registry.subscriber_count(&match_id), 1);
///
/// subscription.unsubscribe();
/// assert_eq!(registry.subscriber_count(&match_id), 0);
/// # }
/// ```
pub struct SubscriptionRegistry {
    matches: Mutex<HashMap<MatchId, SubscriberMap>>,
    upstream: OnceLock<Weak<dyn UpstreamSource>>,
    next_id: AtomicU64,
    queue_capacity: usize,
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl SubscriptionRegistry {
    /// Create an empty registry with the given per-subscriber queue depth.
    #[must_use]
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            matches: Mutex::new(HashMap::new()),
            upstream: OnceLock::new(),
            next_id: AtomicU64::new(1),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Attach the source that is started on first subscribe.
    ///
    /// Only the first call has an effect. The registry keeps a weak
    /// reference; the owner of the source controls its lifetime.
    pub fn attach_upstream(&self, upstream: &Arc<dyn UpstreamSource>) {
        if self.upstream.set(Arc::downgrade(upstream)).is_err() {
            tracing::warn!("Upstream source already attached, ignoring");
        }
    }

    /// Register a new subscriber for `match_id`.
    ///
    /// Starts the upstream source if it is not running yet. Nothing is
    /// registered when that fails.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Upstream`] if the source cannot be started.
    pub async fn subscribe(self: &Arc<Self>, match_id: MatchId) -> Result<Subscription, RegistryError> {
        self.ensure_upstream().await?;

        let (tx, rx) = broadcast::channel(self.queue_capacity);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let total = {
            let mut matches = self.matches.lock();
            matches.entry(match_id.clone()).or_default().insert(id, tx);
            total_subscribers(&matches)
        };
        metrics::set_active_subscriptions(total);

        tracing::debug!(match_id = %match_id, subscriber_id = id, "Subscriber registered");

        Ok(Subscription {
            registry: Arc::clone(self),
            match_id,
            id,
            rx,
            active: true,
        })
    }

    /// Remove one subscriber. Returns whether it was registered.
    ///
    /// The match entry is pruned once its last subscriber leaves.
    pub fn unsubscribe(&self, match_id: &MatchId, id: SubscriberId) -> bool {
        let (removed, total) = {
            let mut matches = self.matches.lock();
            let removed = match matches.get_mut(match_id) {
                Some(subscribers) => {
                    let removed = subscribers.remove(&id).is_some();
                    if subscribers.is_empty() {
                        matches.remove(match_id);
                    }
                    removed
                }
                None => false,
            };
            (removed, total_subscribers(&matches))
        };

        if removed {
            metrics::set_active_subscriptions(total);
            tracing::debug!(match_id = %match_id, subscriber_id = id, "Subscriber removed");
        }
        removed
    }

    /// Deliver `event` to every subscriber of `match_id`.
    ///
    /// Never blocks on a subscriber. A subscriber whose receiving side is gone
    /// is logged and pruned; delivery to the rest continues. Returns the
    /// number of subscribers the event was queued for.
    pub fn publish(&self, match_id: &MatchId, event: &ScoreUpdateEvent) -> usize {
        let mut delivered = 0;
        let mut pruned = 0;

        let total = {
            let mut matches = self.matches.lock();
            let Some(subscribers) = matches.get_mut(match_id) else {
                tracing::trace!(match_id = %match_id, "No subscribers for match");
                return 0;
            };

            subscribers.retain(|id, tx| {
                if tx.send(event.clone()).is_ok() {
                    delivered += 1;
                    true
                } else {
                    tracing::warn!(
                        match_id = %match_id,
                        subscriber_id = id,
                        "Subscriber receiver dropped, pruning"
                    );
                    pruned += 1;
                    false
                }
            });

            if subscribers.is_empty() {
                matches.remove(match_id);
            }
            total_subscribers(&matches)
        };

        if pruned > 0 {
            metrics::set_active_subscriptions(total);
        }
        metrics::record_event_published(delivered as u64);
        delivered
    }

    /// Subscribers currently registered for `match_id`.
    #[must_use]
    pub fn subscriber_count(&self, match_id: &MatchId) -> usize {
        self.matches.lock().get(match_id).map_or(0, HashMap::len)
    }

    /// Occupancy snapshot.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let matches = self.matches.lock();
        RegistryStats {
            matches: matches.len(),
            subscribers: total_subscribers(&matches),
        }
    }

    async fn ensure_upstream(&self) -> Result<(), RegistryError> {
        let Some(weak) = self.upstream.get() else {
            return Ok(());
        };
        let upstream = weak.upgrade().ok_or(BridgeError::Stopped)?;
        upstream.ensure_started().await?;
        Ok(())
    }
}

fn total_subscribers(matches: &HashMap<MatchId, SubscriberMap>) -> usize {
    matches.values().map(HashMap::len).sum()
}

/// Shared registry reference.
pub type SharedRegistry = Arc<SubscriptionRegistry>;

// =============================================================================
// Subscription
// =============================================================================

/// A live registration in the [`SubscriptionRegistry`].
///
/// Events arrive in the order they were published. Dropping the subscription
/// unsubscribes it.
pub struct Subscription {
    registry: Arc<SubscriptionRegistry>,
    match_id: MatchId,
    id: SubscriberId,
    rx: broadcast::Receiver<ScoreUpdateEvent>,
    active: bool,
}

impl Subscription {
    /// Match this subscription follows.
    #[must_use]
    pub const fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    /// Registry-assigned id.
    #[must_use]
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Whether [`Subscription::unsubscribe`] has not run yet.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once unsubscribed, including for events that were
    /// queued before the unsubscribe. If the queue overflowed, the skipped
    /// count is logged and delivery resumes with the oldest retained event.
    pub async fn recv(&mut self) -> Option<ScoreUpdateEvent> {
        loop {
            if !self.active {
                return None;
            }
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        match_id = %self.match_id,
                        subscriber_id = self.id,
                        skipped,
                        "Subscriber lagged, oldest updates dropped"
                    );
                    metrics::record_events_lagged(skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.active = false;
                    return None;
                }
            }
        }
    }

    /// Remove this subscription from the registry. Idempotent.
    pub fn unsubscribe(&mut self) {
        if std::mem::replace(&mut self.active, false) {
            self.registry.unsubscribe(&self.match_id, self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("match_id", &self.match_id)
            .field("id", &self.id)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::application::ports::MockUpstreamSource;

    fn id(raw: &str) -> MatchId {
        MatchId::parse(raw).unwrap()
    }

    fn event(match_id: &str, version: i64) -> ScoreUpdateEvent {
        let serde_json::Value::Object(map) = json!({
            "matchId": match_id,
            "score": {"runs": version * 10},
            "status": "live",
            "version": version,
        }) else {
            unreachable!()
        };
        ScoreUpdateEvent::new(id(match_id), map)
    }

    #[tokio::test]
    async fn publish_reaches_every_subscriber_of_the_match_only() {
        let registry = Arc::new(SubscriptionRegistry::default());
        let mut a1 = registry.subscribe(id("a")).await.unwrap();
        let mut a2 = registry.subscribe(id("a")).await.unwrap();
        let mut b = registry.subscribe(id("b")).await.unwrap();

        assert_eq!(registry.publish(&id("a"), &event("a", 1)), 2);

        assert_eq!(a1.recv().await.unwrap().version(), Some(1));
        assert_eq!(a2.recv().await.unwrap().version(), Some(1));
        assert!(
            tokio::time::timeout(Duration::from_millis(20), b.recv())
                .await
                .is_err(),
            "other match must not receive the event"
        );
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_no_op() {
        let registry = SubscriptionRegistry::default();
        assert_eq!(registry.publish(&id("none"), &event("none", 1)), 0);
        assert_eq!(registry.stats(), RegistryStats::default());
    }

    #[tokio::test]
    async fn unsubscribe_prunes_empty_match() {
        let registry = Arc::new(SubscriptionRegistry::default());
        let mut s1 = registry.subscribe(id("a")).await.unwrap();
        let s2 = registry.subscribe(id("a")).await.unwrap();
        assert_eq!(
            registry.stats(),
            RegistryStats {
                matches: 1,
                subscribers: 2
            }
        );

        s1.unsubscribe();
        assert_eq!(registry.subscriber_count(&id("a")), 1);

        drop(s2);
        assert_eq!(registry.stats(), RegistryStats::default());
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent() {
        let registry = Arc::new(SubscriptionRegistry::default());
        let mut keep = registry.subscribe(id("a")).await.unwrap();
        let mut sub = registry.subscribe(id("a")).await.unwrap();

        sub.unsubscribe();
        sub.unsubscribe();
        drop(sub);

        assert_eq!(registry.subscriber_count(&id("a")), 1);
        assert!(keep.is_active());
        keep.unsubscribe();
    }

    #[tokio::test]
    async fn nothing_is_delivered_after_unsubscribe() {
        let registry = Arc::new(SubscriptionRegistry::default());
        let mut sub = registry.subscribe(id("a")).await.unwrap();

        // Queued before the unsubscribe, must still not surface afterwards.
        registry.publish(&id("a"), &event("a", 1));
        sub.unsubscribe();
        assert_eq!(registry.publish(&id("a"), &event("a", 2)), 0);

        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn dropped_receiver_is_pruned_without_affecting_others() {
        let registry = Arc::new(SubscriptionRegistry::default());
        let mut healthy = registry.subscribe(id("a")).await.unwrap();

        // Register a raw sender whose receiver is immediately gone.
        {
            let (tx, _) = broadcast::channel(1);
            registry.matches.lock().get_mut(&id("a")).unwrap().insert(999, tx);
        }

        assert_eq!(registry.publish(&id("a"), &event("a", 1)), 1);
        assert_eq!(registry.subscriber_count(&id("a")), 1);
        assert_eq!(healthy.recv().await.unwrap().version(), Some(1));
    }

    #[tokio::test]
    async fn slow_subscriber_keeps_newest_updates() {
        let registry = Arc::new(SubscriptionRegistry::new(2));
        let mut sub = registry.subscribe(id("a")).await.unwrap();

        for v in 1..=5 {
            registry.publish(&id("a"), &event("a", v));
        }

        assert_eq!(sub.recv().await.unwrap().version(), Some(4));
        assert_eq!(sub.recv().await.unwrap().version(), Some(5));
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let registry = Arc::new(SubscriptionRegistry::default());
        let mut sub = registry.subscribe(id("a")).await.unwrap();

        for v in 1..=10 {
            registry.publish(&id("a"), &event("a", v));
        }
        for v in 1..=10 {
            assert_eq!(sub.recv().await.unwrap().version(), Some(v));
        }
    }

    #[tokio::test]
    async fn first_subscribe_starts_upstream() {
        let mut mock = MockUpstreamSource::new();
        mock.expect_ensure_started().times(2).returning(|| Ok(()));
        let upstream: Arc<dyn UpstreamSource> = Arc::new(mock);

        let registry = Arc::new(SubscriptionRegistry::default());
        registry.attach_upstream(&upstream);

        let _s1 = registry.subscribe(id("a")).await.unwrap();
        let _s2 = registry.subscribe(id("b")).await.unwrap();
    }

    #[tokio::test]
    async fn upstream_failure_registers_nothing() {
        let mut mock = MockUpstreamSource::new();
        mock.expect_ensure_started()
            .returning(|| Err(BridgeError::ConnectFailed("refused".to_string())));
        let upstream: Arc<dyn UpstreamSource> = Arc::new(mock);

        let registry = Arc::new(SubscriptionRegistry::default());
        registry.attach_upstream(&upstream);

        let err = registry.subscribe(id("a")).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Upstream(BridgeError::ConnectFailed(_))
        ));
        assert_eq!(registry.stats(), RegistryStats::default());
    }

    #[tokio::test]
    async fn dropped_upstream_reports_stopped() {
        let upstream: Arc<dyn UpstreamSource> = Arc::new(MockUpstreamSource::new());
        let registry = Arc::new(SubscriptionRegistry::default());
        registry.attach_upstream(&upstream);
        drop(upstream);

        let err = registry.subscribe(id("a")).await.unwrap_err();
        assert_eq!(err, RegistryError::Upstream(BridgeError::Stopped));
    }

    #[tokio::test]
    async fn concurrent_subscribe_and_unsubscribe_leave_registry_consistent() {
        let registry = Arc::new(SubscriptionRegistry::default());
        let mut handles = Vec::new();

        for i in 0..32 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let match_id = id(if i % 2 == 0 { "even" } else { "odd" });
                for _ in 0..20 {
                    let sub = registry.subscribe(match_id.clone()).await.unwrap();
                    registry.publish(&match_id, &event(match_id.as_str(), 1));
                    drop(sub);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(registry.stats(), RegistryStats::default());
    }
}
