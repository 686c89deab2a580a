//! # Layerwatch Core
//!
//! Core types, collaborator traits and utilities for Layerwatch.
//! Provides the error taxonomy, the printer host interface, the shared
//! data models and the notification event bus.

pub mod data;
pub mod error;
pub mod event_bus;
pub mod host;

pub use data::{ObjectEntry, UploadRecord};

pub use error::{Error, GcodeError, Result, TelemetryError, TrackingError, UploadError};

pub use event_bus::{
    AppEvent, EventBus, EventBusConfig, EventCategory, EventFilter, ObjectEvent, SubscriptionId,
    TelemetryEvent, UploadEvent,
};

pub use host::{HostEvent, PrinterHost, PrinterStateId};
