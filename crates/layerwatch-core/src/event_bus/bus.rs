//! Notification bus
//!
//! One bus per collector, shared by `Arc` with every component that
//! reports something. Two ways to listen: a synchronous callback run on the
//! publishing thread, or a tokio broadcast receiver polled elsewhere.

use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::time::Instant;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::events::{AppEvent, EventCategory};

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Which events a callback wants
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    /// Everything
    #[default]
    All,
    /// Only events in one of these categories
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    /// Whether `event` passes the filter
    pub fn matches(&self, event: &AppEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
        }
    }
}

/// Bus sizing
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Slots in the broadcast channel; slow receivers lag past this
    pub channel_capacity: usize,
    /// Keep the most recent events for late readers; `None` keeps nothing
    pub history_limit: Option<usize>,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            history_limit: None,
        }
    }
}

struct Subscriber {
    id: SubscriptionId,
    filter: EventFilter,
    callback: Box<dyn Fn(AppEvent) + Send + Sync>,
}

/// Publish/subscribe hub for object, telemetry and upload notifications
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
    subscribers: RwLock<Vec<Subscriber>>,
    history: Mutex<VecDeque<(Instant, AppEvent)>>,
    config: EventBusConfig,
}

impl EventBus {
    /// Bus with the default sizing and no history
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// Bus with explicit sizing
    pub fn with_config(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            sender,
            subscribers: RwLock::new(Vec::new()),
            history: Mutex::new(VecDeque::new()),
            config,
        }
    }

    /// Deliver `event` to callbacks, receivers and the history
    ///
    /// Returns how many broadcast receivers were live. Nobody listening is
    /// fine; notifications are best effort.
    pub fn publish(&self, event: AppEvent) -> usize {
        tracing::trace!("Publishing {}", event.description());

        if let Some(limit) = self.config.history_limit {
            let mut history = self.history.lock();
            history.push_back((Instant::now(), event.clone()));
            while history.len() > limit {
                history.pop_front();
            }
        }

        for subscriber in self.subscribers.read().iter() {
            if subscriber.filter.matches(&event) {
                (subscriber.callback)(event.clone());
            }
        }

        self.sender.send(event).unwrap_or(0)
    }

    /// Register a callback
    ///
    /// Callbacks run on the publishing thread, which can be the command
    /// emission path, so they must not block.
    pub fn subscribe<F>(&self, filter: EventFilter, callback: F) -> SubscriptionId
    where
        F: Fn(AppEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(Uuid::new_v4());
        self.subscribers.write().push(Subscriber {
            id,
            filter,
            callback: Box::new(callback),
        });
        tracing::debug!("Subscription {} added", id);
        id
    }

    /// Drop a callback; false if it was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        before != subscribers.len()
    }

    /// Receiver seeing every event published from now on
    pub fn receiver(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Number of registered callbacks
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Retained events, optionally only those published at or after `since`
    pub fn history(&self, since: Option<Instant>) -> Vec<AppEvent> {
        self.history
            .lock()
            .iter()
            .filter(|(at, _)| since.is_none_or(|since| *at >= since))
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Forget retained events
    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("config", &self.config)
            .finish()
    }
}
