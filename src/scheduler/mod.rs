//! Delayed task scheduling for turn timeouts and the start grace period

pub mod timer;

pub use timer::{spawn_after, TurnTimer};
