//! `panther-middleware` – State publication
//!
//! Carries the power controller's externally observable outputs to whoever
//! is listening, without caring about the transport behind them.
//!
//! # Modules
//!
//! - [`bus`] – Typed, topic-based, latched publish/subscribe bus built on
//!   Tokio broadcast and watch channels.

pub mod bus;

pub use bus::{StateBus, Topic, TopicReceiver};
