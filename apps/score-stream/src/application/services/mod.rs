//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `SubscriptionRegistry`: match id to live subscribers, non-blocking fan-out
//! - `StreamSession`: one viewer's outbound stream with heartbeats

pub mod registry;
pub mod session;

pub use registry::{
    DEFAULT_QUEUE_CAPACITY, RegistryError, RegistryStats, SharedRegistry, SubscriberId,
    Subscription, SubscriptionRegistry,
};
pub use session::{CloseReason, SessionConfig, SessionFrame, StreamSession};
