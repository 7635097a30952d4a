//! Publisher port — writes values to the output bus.

use std::future::Future;
use std::sync::Arc;

use protectbridge_domain::error::PublishError;
use protectbridge_domain::topic::{PublishOptions, TopicPath};

/// Writes `(topic, value)` pairs to the output bus.
///
/// Implementations suppress a write whose value is identical to the last one
/// written on the same topic; the core relies on that for publish-on-change
/// and keeps no value cache of its own.
pub trait TopicPublisher: Send + Sync {
    /// Publish `value` on `topic`.
    fn publish(
        &self,
        topic: &TopicPath,
        value: &str,
        options: PublishOptions,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;
}

impl<T: TopicPublisher> TopicPublisher for Arc<T> {
    fn publish(
        &self,
        topic: &TopicPath,
        value: &str,
        options: PublishOptions,
    ) -> impl Future<Output = Result<(), PublishError>> + Send {
        (**self).publish(topic, value, options)
    }
}
