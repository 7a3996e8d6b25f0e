//! Single-shot turn timer
//!
//! At most one timeout is armed at a time. Arming replaces the previous
//! timeout, and the callback runs on its own task so it may re-arm the
//! timer that fired it.

use crate::types::TurnId;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Run `fut` on a fresh task once `delay` has elapsed
pub fn spawn_after<F>(delay: Duration, fut: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        fut.await;
    })
}

/// Holder for the one pending turn timeout
#[derive(Debug, Default)]
pub struct TurnTimer {
    handle: Option<JoinHandle<()>>,
    armed: Option<TurnId>,
}

impl TurnTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any pending timeout and schedule `fire` for `turn` after `delay`
    pub fn arm<F>(&mut self, turn: TurnId, delay: Duration, fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        debug!("Arming timeout for {} in {:?}", turn, delay);
        // The sleeper hands `fire` to a separate task, so aborting this
        // handle from inside `fire` cannot cancel the callback itself.
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(fire);
        }));
        self.armed = Some(turn);
    }

    /// Cancel the pending timeout, if any
    pub fn cancel(&mut self) {
        let turn = self.armed.take();
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
                if let Some(turn) = turn {
                    debug!("Cancelled timeout for {}", turn);
                }
            }
        }
    }

    /// Turn the pending timeout belongs to
    pub fn armed_turn(&self) -> Option<TurnId> {
        self.armed
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }
}

impl Drop for TurnTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
