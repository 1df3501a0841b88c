//! Publish/subscribe fan-out for committed ride mutations.
//!
//! Two topic kinds: a per-ride topic carrying the updated record, and the
//! available-rides collection topic carrying a refetch signal. Delivery is
//! at-least-once: a slow subscriber that lags simply skips to newer
//! notifications and converges by refetching authoritative state.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::Ride;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    Ride(Uuid),
    AvailableRides,
}

#[derive(Debug, Clone)]
pub enum Notification {
    /// The ride's authoritative state after a committed mutation.
    RideUpdated(Box<Ride>),
    /// The available-rides collection changed; re-fetch the list.
    AvailableRidesChanged,
}

#[derive(Default)]
pub struct NotificationBus {
    topics: Mutex<HashMap<Topic, broadcast::Sender<Notification>>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Topic, broadcast::Sender<Notification>>> {
        match self.topics.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Returns a live handle; callbacks stop when the handle unsubscribes or
    /// is dropped.
    pub fn subscribe(&self, topic: Topic) -> Subscription {
        let mut topics = self.lock();
        let tx = topics
            .entry(topic.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        Subscription {
            topic,
            rx: Some(tx.subscribe()),
        }
    }

    /// Publishes to a topic, returning the number of live subscribers
    /// reached. Topics with no remaining subscribers are pruned.
    pub fn publish(&self, topic: &Topic, notification: Notification) -> usize {
        let mut topics = self.lock();
        match topics.get(topic) {
            Some(tx) => match tx.send(notification) {
                Ok(reached) => reached,
                Err(_) => {
                    topics.remove(topic);
                    0
                }
            },
            None => 0,
        }
    }

    pub fn ride_updated(&self, ride: &Ride) {
        self.publish(
            &Topic::Ride(ride.id),
            Notification::RideUpdated(Box::new(ride.clone())),
        );
    }

    pub fn available_rides_changed(&self) {
        self.publish(&Topic::AvailableRides, Notification::AvailableRidesChanged);
    }
}

pub struct Subscription {
    topic: Topic,
    rx: Option<broadcast::Receiver<Notification>>,
}

impl Subscription {
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Next notification, or `None` once unsubscribed or the topic closed.
    /// Lag skips straight to the newest pending notification.
    pub async fn recv(&mut self) -> Option<Notification> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(notification) => return Some(notification),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Stops delivery immediately. Idempotent.
    pub fn unsubscribe(&mut self) {
        self.rx = None;
    }

    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }
}
