//! Graceful-shutdown fan-out.
//!
//! The supervisor holds the [`ShutdownHandle`]; every long-lived task holds a
//! [`Shutdown`] and selects on [`Shutdown::recv`] alongside its normal input.
//! Dropping the handle counts as shutdown, so a crashed supervisor still
//! tears the task tree down.

use tokio::sync::watch;

/// Sender half, owned by the engine supervisor.
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

/// Receiver half, cloned into every task.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Create a linked shutdown pair.
pub fn channel() -> (ShutdownHandle, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, Shutdown { rx })
}

impl ShutdownHandle {
    /// Notify every task to stop.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

impl Shutdown {
    /// Resolve once shutdown has been requested (or the handle is gone).
    pub async fn recv(&mut self) {
        while !*self.rx.borrow() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }

    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }
}
