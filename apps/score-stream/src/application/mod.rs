//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the application services and port interfaces
//! that define how the fan-out core talks to the notification source
//! and to connected viewers.

/// Port interfaces for the notification source.
pub mod ports;

/// Subscription registry and per-viewer stream sessions.
pub mod services;
