//! Domain Layer - Score events and cricket rules.
//!
//! Pure types with serialization support. Nothing here performs I/O.

/// Score update events and match identifiers.
pub mod scoring;

/// Limited-overs scoring arithmetic.
pub mod cricket;

/// Player-of-the-match heuristic.
pub mod ranking;
