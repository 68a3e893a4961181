use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::warn;
use tokio::sync::Notify;

/// Exit code used when a second interrupt aborts the process.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cooperative cancellation shared between a signal listener and the prune loop.
///
/// Setting the flag never interrupts a delete already in flight; the loop
/// observes it before starting the next one. Waiting phases such as the
/// initial fetch can race against [`CancelFlag::cancelled`] instead.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<Inner>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::SeqCst);
        self.0.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once the flag is set.
    pub async fn cancelled(&self) {
        // Registered before the check so a concurrent cancel is not missed.
        let notified = self.0.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }

    /// Sets the flag on the first Ctrl-C and exits the process on the second.
    pub fn cancel_on_ctrl_c(&self) {
        let flag = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            warn!("Interrupt received, stopping after the current request (press Ctrl-C again to abort)");
            flag.cancel();

            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Second interrupt received, aborting");
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
        });
    }
}
