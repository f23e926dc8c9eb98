use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

/// Installs a SIGINT handler and exposes the shutdown state both as an async
/// waitpoint (control/main threads) and as a lock-free flag (audio thread).
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
    tx: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct ShutdownToken {
    flag: Arc<AtomicBool>,
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandler {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            tx,
        }
    }

    /// Spawn the signal listener. Must be called from within a tokio runtime.
    pub fn install(self) -> ShutdownToken {
        let tx = Arc::new(self.tx);
        let token = ShutdownToken {
            flag: self.flag.clone(),
            tx: tx.clone(),
            rx: tx.subscribe(),
        };

        let flag = self.flag;
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                }
                Err(e) => {
                    tracing::error!("Failed to listen for SIGINT: {}", e);
                }
            }
            flag.store(true, Ordering::SeqCst);
            let _ = tx.send(true);
        });

        token
    }
}

impl ShutdownToken {
    /// Request shutdown programmatically (tests, fatal wiring errors).
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
        let _ = self.tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn flag(&self) -> Arc<AtomicBool> {
        self.flag.clone()
    }

    /// Wait asynchronously until shutdown is requested.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        if *rx.borrow() || self.is_shutdown() {
            return;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow() {
                return;
            }
        }
    }
}
