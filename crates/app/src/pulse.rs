//! Pulse scheduler — de-asserts momentary facts after a fixed window.
//!
//! The caller publishes the asserted value itself and then [`arm`]s the topic;
//! the scheduler writes `"0"` on that topic from a spawned timer task once the
//! window elapses. The caller is never suspended by a pulse.
//!
//! [`arm`]: PulseScheduler::arm

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Deserialize;
use tokio::task::JoinHandle;

use protectbridge_domain::topic::{OFF, PublishOptions, TopicPath};

use crate::ports::TopicPublisher;

/// How long a detection stays asserted.
pub const PULSE_WINDOW: Duration = Duration::from_secs(5);

/// What happens when a topic is pulsed again before its previous pulse ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PulsePolicy {
    /// Every armed de-assert fires, even if a newer pulse is still running.
    #[default]
    Independent,
    /// Only the most recently armed de-assert of a topic fires, so a repeated
    /// detection extends the pulse.
    Coalesce,
}

/// Schedules deferred de-assert writes.
pub struct PulseScheduler<P> {
    publisher: P,
    options: PublishOptions,
    window: Duration,
    policy: PulsePolicy,
    generations: Arc<Mutex<HashMap<TopicPath, u64>>>,
}

impl<P: TopicPublisher + Clone + 'static> PulseScheduler<P> {
    /// Create a scheduler with the standard [`PULSE_WINDOW`].
    pub fn new(publisher: P, options: PublishOptions, policy: PulsePolicy) -> Self {
        Self {
            publisher,
            options,
            window: PULSE_WINDOW,
            policy,
            generations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Override the pulse window.
    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Schedule the de-assert of `topic` one window from now.
    ///
    /// A failed de-assert is logged and not retried; it does not affect any
    /// other pulse.
    pub fn arm(&self, topic: TopicPath) -> JoinHandle<()> {
        let generation = match self.policy {
            PulsePolicy::Independent => 0,
            PulsePolicy::Coalesce => self.bump(&topic),
        };

        let publisher = self.publisher.clone();
        let generations = Arc::clone(&self.generations);
        let options = self.options;
        let window = self.window;
        let policy = self.policy;

        tokio::spawn(async move {
            tokio::time::sleep(window).await;

            if policy == PulsePolicy::Coalesce && !take_if_latest(&generations, &topic, generation)
            {
                tracing::trace!(%topic, "pulse superseded, skipping de-assert");
                return;
            }

            if let Err(err) = publisher.publish(&topic, OFF, options).await {
                tracing::warn!(%err, %topic, "failed to de-assert pulse");
            }
        })
    }

    fn bump(&self, topic: &TopicPath) -> u64 {
        let mut generations = self
            .generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let generation = generations.entry(topic.clone()).or_insert(0);
        *generation += 1;
        *generation
    }
}

/// Drop the entry of `topic` if `generation` is still its latest pulse, so the
/// map only holds topics with a pulse in flight.
fn take_if_latest(
    generations: &Mutex<HashMap<TopicPath, u64>>,
    topic: &TopicPath,
    generation: u64,
) -> bool {
    let mut generations = generations.lock().unwrap_or_else(PoisonError::into_inner);
    if generations.get(topic).copied() == Some(generation) {
        generations.remove(topic);
        true
    } else {
        false
    }
}
