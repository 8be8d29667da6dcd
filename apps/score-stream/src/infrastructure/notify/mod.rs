//! Store Change Notifications
//!
//! The notification bridge, its payload decoding and the Postgres
//! `LISTEN/NOTIFY` adapter behind the connector port.

pub mod bridge;
pub mod payload;
pub mod postgres;

pub use bridge::{BridgeConfig, BridgeStatus, ConnectionState, NotificationBridge};
pub use payload::{PayloadError, parse_notification};
pub use postgres::PgNotificationConnector;
