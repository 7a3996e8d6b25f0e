//! Lobby admission and game start policy

pub mod admission;

pub use admission::{Admission, AdmissionPolicy, Lobby, StartTrigger};
