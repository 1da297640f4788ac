//! Headless, typed, topic-based state bus with latched topics.
//!
//! Uses [`tokio::sync::broadcast`] channels so every subscriber receives every
//! publication without any single subscriber blocking the publisher.  Each
//! topic also keeps its most recent event in a [`tokio::sync::watch`] slot, so
//! an observer that attaches late can synchronize with [`StateBus::latest`].
//!
//! # Topics
//!
//! | Topic | Name | Payload |
//! |---|---|---|
//! | [`Topic::EStop`] | `hardware/e_stop` | [`EventPayload::EStop`] |
//! | [`Topic::IoState`] | `hardware/io_state` | [`EventPayload::IoState`] |

use std::sync::Arc;

use panther_types::{Event, EventPayload, PowerError, names};
use tokio::sync::{broadcast, watch};
use tracing::warn;

/// Default channel capacity (number of buffered events before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 64;

/// Routing topics on the state bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// E-Stop state changes and trigger confirmations.
    EStop,
    /// Digital IO snapshot.
    IoState,
}

impl Topic {
    /// Wire name of the topic in the deployed system.
    pub fn name(self) -> &'static str {
        match self {
            Topic::EStop => names::E_STOP_TOPIC,
            Topic::IoState => names::IO_STATE_TOPIC,
        }
    }
}

#[derive(Debug)]
struct Lane {
    sender: broadcast::Sender<Event>,
    latest: watch::Sender<Option<Event>>,
}

impl Lane {
    fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        let (latest, _) = watch::channel(None);
        Self { sender, latest }
    }
}

/// Shared state bus.  Clone it cheaply – all clones share the same underlying
/// channels.
#[derive(Clone, Debug)]
pub struct StateBus {
    e_stop: Arc<Lane>,
    io_state: Arc<Lane>,
}

impl StateBus {
    /// Create a new bus with the given per-topic channel capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero (a [`broadcast`] channel requirement).
    pub fn new(capacity: usize) -> Self {
        Self {
            e_stop: Arc::new(Lane::new(capacity)),
            io_state: Arc::new(Lane::new(capacity)),
        }
    }

    /// Publish `payload` on `topic`, wrapped in a fresh [`Event`].
    ///
    /// The event always becomes the topic's latched value.  Returns the number
    /// of live subscribers handed the event, or [`PowerError::Channel`] when
    /// nobody is subscribed.  Never blocks.
    pub fn publish(&self, topic: Topic, payload: EventPayload) -> Result<usize, PowerError> {
        let event = Event::new(topic.name(), payload);
        let lane = self.lane(topic);
        lane.latest.send_replace(Some(event.clone()));
        lane.sender
            .send(event)
            .map_err(|_| PowerError::Channel(format!("no subscribers for topic {}", topic.name())))
    }

    /// Subscribe to every event published on `topic` from now on.
    pub fn subscribe(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.lane(topic).sender.subscribe(),
        }
    }

    /// Most recent event published on `topic`, if any.
    pub fn latest(&self, topic: Topic) -> Option<Event> {
        self.lane(topic).latest.borrow().clone()
    }

    fn lane(&self, topic: Topic) -> &Lane {
        match topic {
            Topic::EStop => &self.e_stop,
            Topic::IoState => &self.io_state,
        }
    }
}

impl Default for StateBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Receiver
// ---------------------------------------------------------------------------

/// A receiver bound to a single [`Topic`].
///
/// Obtained via [`StateBus::subscribe`].
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Wait for the next event on this topic.
    ///
    /// Returns:
    /// * `Ok(event)` – a successfully received event.
    /// * `Err(broadcast::error::RecvError::Lagged(n))` – the subscriber fell
    ///   behind and `n` events were dropped.
    /// * `Err(broadcast::error::RecvError::Closed)` – the bus has shut down.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Take the next buffered event without waiting.
    pub fn try_recv(&mut self) -> Result<Event, broadcast::error::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Drain every buffered event, oldest first.
    pub fn drain(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!(topic = self.topic.name(), lagged_by = n, "TopicReceiver lagged");
                    continue;
                }
                Err(_) => return events,
            }
        }
    }

    /// The [`Topic`] this receiver is bound to.
    pub fn topic(&self) -> Topic {
        self.topic
    }
}
