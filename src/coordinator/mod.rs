//! Authoritative turn coordination
//!
//! `turn` holds the pure flip and timeout rules; `session` wraps them with
//! locking, timers, and event delivery.

pub mod session;
pub mod turn;

pub use session::{SessionSnapshot, SessionStats, TurnCoordinator};
pub use turn::{IgnoredFlip, NextTurn, TurnStep};
