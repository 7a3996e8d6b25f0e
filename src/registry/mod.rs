//! Connection registry and the broadcast seam used by the coordinator

pub mod broadcaster;
pub mod connections;

pub use broadcaster::{Broadcaster, Delivery, RecordingBroadcaster};
pub use connections::{ConnectionRegistry, EventReceiver};
