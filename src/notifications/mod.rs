//! Notifications module
//!
//! In-process pub/sub for reservation changes. Services publish after a
//! successful write; hosts subscribe to drive e-mail, push or UI refresh.
//!
//! # Usage
//! ```ignore
//! use booking_engine::notifications::create_event_bus;
//!
//! let event_bus = create_event_bus();
//! let mut subscriber = event_bus.subscribe();
//! while let Some(msg) = subscriber.recv().await {
//!     println!("{} for {}", msg.event.event_type(), msg.event.customer_id());
//! }
//! ```

pub mod event_bus;
pub mod events;

pub use event_bus::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use events::*;
