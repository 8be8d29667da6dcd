//! Server-Sent Events Transport
//!
//! HTTP surface for viewers: route handlers, response headers and frame
//! encoding for [`StreamSession`](crate::application::services::StreamSession).

pub mod frame;
pub mod server;

pub use server::{SseServer, SseServerError, SseState, router};
