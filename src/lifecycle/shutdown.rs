//! Graceful shutdown coordination.
//!
//! One [`Shutdown`] is created at startup. The server's accept loop holds a
//! [`ShutdownSignal`] and drains once shutdown begins, whether from Ctrl+C
//! or an explicit trigger (tests drive it directly).

use tokio::sync::watch;

/// Coordinates graceful shutdown of the gateway.
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a coordinator. Nothing is wired to it yet; call
    /// [`Shutdown::on_ctrl_c`] to tie it to the process signal.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Hand out a signal for a task that must drain on shutdown.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Begin shutdown; every outstanding signal resolves.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    /// Begin shutdown when the process receives Ctrl+C.
    pub fn on_ctrl_c(&self) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl+C received, shutting down");
                let _ = tx.send(true);
            }
        });
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver half handed to draining tasks.
///
/// A signal observes a shutdown that was triggered before anyone started
/// waiting.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Wait until shutdown begins. Resolves immediately if it already has;
    /// a dropped coordinator counts as shutdown.
    pub async fn triggered(mut self) {
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }
}
