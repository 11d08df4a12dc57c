//! # MQTT Integration Module
//!
//! Connects to the broker, subscribes to the device namespace and hands every
//! inbound publish to the [`crate::device::router::Router`].
//!
//! ```text
//! mqtt/
//! ├── config.rs           - Broker options derived from the config file
//! ├── message_manager.rs  - Decoded inbound message and its console echo
//! ├── mqtt_handler.rs     - Event loop driver and connection status
//! └── topics.rs           - Topic namespace of one device
//! ```
//!
//! The `rumqttc` event loop owns the wire protocol, keep-alive and reconnects. This
//! module only interprets its events.

pub mod config;
pub mod message_manager;
pub mod mqtt_handler;
pub mod topics;
