//! # Event Bus Module
//!
//! Publish/subscribe notifications from the tracking and telemetry
//! components to the dashboard layer.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use layerwatch_core::event_bus::{AppEvent, EventBus, EventCategory, EventFilter, ObjectEvent};
//!
//! let bus = Arc::new(EventBus::new());
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Objects]),
//!     |event| {
//!         if let AppEvent::Objects(ObjectEvent::ListUpdated { objects, .. }) = event {
//!             println!("{} objects", objects.len());
//!         }
//!     },
//! );
//!
//! bus.publish(AppEvent::Objects(ObjectEvent::NextObject));
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
