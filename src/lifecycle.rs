//! Process lifecycle: shutdown and restart requests.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::{RelayError, Result};

/// Why the bot is stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Stop and exit.
    Shutdown,
    /// Stop, then re-execute the current binary.
    Restart,
}

/// Shared handle used to request and observe the end of the run.
///
/// The first request wins; later ones are ignored.
#[derive(Clone)]
pub struct Lifecycle {
    tx: Arc<watch::Sender<Option<Exit>>>,
    rx: watch::Receiver<Option<Exit>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn request_shutdown(&self) {
        self.request(Exit::Shutdown);
    }

    pub fn request_restart(&self) {
        self.request(Exit::Restart);
    }

    /// The pending request, if any.
    pub fn requested(&self) -> Option<Exit> {
        *self.rx.borrow()
    }

    /// Resolve once a shutdown or restart has been requested.
    pub async fn stopped(&self) -> Exit {
        let mut rx = self.rx.clone();
        loop {
            if let Some(exit) = *rx.borrow_and_update() {
                return exit;
            }
            if rx.changed().await.is_err() {
                return Exit::Shutdown;
            }
        }
    }

    /// Request a shutdown when the process receives Ctrl-C.
    pub fn shutdown_on_ctrl_c(&self) {
        let lifecycle = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C received, shutting down");
                lifecycle.request_shutdown();
            }
        });
    }

    fn request(&self, exit: Exit) {
        let accepted = self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(exit);
                true
            } else {
                false
            }
        });
        if accepted {
            info!("{:?} requested", exit);
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace the current process with a fresh copy of itself.
///
/// On Unix this only returns if `exec` failed.
#[cfg(unix)]
pub fn restart_process() -> Result<()> {
    use std::os::unix::process::CommandExt;

    let exe = std::env::current_exe()?;
    info!("Restarting {}", exe.display());
    let err = std::process::Command::new(&exe)
        .args(std::env::args_os().skip(1))
        .exec();
    Err(RelayError::Restart(format!("exec {}: {err}", exe.display())))
}

/// Start a fresh copy of the current process; the caller exits afterwards.
#[cfg(not(unix))]
pub fn restart_process() -> Result<()> {
    let exe = std::env::current_exe()?;
    info!("Restarting {}", exe.display());
    std::process::Command::new(&exe)
        .args(std::env::args_os().skip(1))
        .spawn()
        .map_err(|e| RelayError::Restart(format!("spawn {}: {e}", exe.display())))?;
    Ok(())
}
