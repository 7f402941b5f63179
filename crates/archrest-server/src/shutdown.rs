//! Graceful shutdown.
//!
//! A [`ShutdownSignal`] stops the accept loop and asks open connections to
//! finish their current request. [`ConnectionTracker`] tells the server when
//! the last one has gone.
//!
//! ```rust
//! use archrest_server::ShutdownSignal;
//!
//! let signal = ShutdownSignal::new();
//! let handle = signal.clone();
//!
//! handle.trigger();
//! assert!(signal.is_shutdown());
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, Notify};

/// Fires once, observed by every clone.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    fired: Arc<AtomicBool>,
    notify: broadcast::Sender<()>,
}

impl ShutdownSignal {
    /// A signal that has not fired.
    #[must_use]
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(1);
        Self {
            fired: Arc::new(AtomicBool::new(false)),
            notify,
        }
    }

    /// Fires the signal. Only the first call wakes waiters.
    pub fn trigger(&self) {
        if !self.fired.swap(true, Ordering::AcqRel) {
            // Nobody listening yet is fine; late waiters see the flag.
            let _ = self.notify.send(());
        }
    }

    /// Whether the signal has fired.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Resolves once the signal fires, immediately if it already has.
    pub async fn recv(&self) {
        // Subscribe before reading the flag so a concurrent trigger is seen
        // by one of the two.
        let mut waiter = self.notify.subscribe();
        if self.is_shutdown() {
            return;
        }
        let _ = waiter.recv().await;
    }

    /// A signal fired by SIGTERM or SIGINT, or Ctrl+C off Unix.
    ///
    /// Spawns a listener task, so it must be called inside a Tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let handle = signal.clone();

        tokio::spawn(async move {
            if os_signal().await {
                handle.trigger();
            }
        });

        signal
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for the process to be asked to stop. `false` means no handler could
/// be installed and only [`ShutdownSignal::trigger`] will stop the server.
async fn os_signal() -> bool {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let terminate = signal(SignalKind::terminate());
        let interrupt = signal(SignalKind::interrupt());
        let (mut terminate, mut interrupt) = match (terminate, interrupt) {
            (Ok(terminate), Ok(interrupt)) => (terminate, interrupt),
            (Err(error), _) | (_, Err(error)) => {
                tracing::error!(error = %error, "Cannot install shutdown signal handlers");
                return false;
            }
        };

        let name = tokio::select! {
            _ = terminate.recv() => "SIGTERM",
            _ = interrupt.recv() => "SIGINT",
        };
        tracing::info!(signal = name, "Stopping server");
        true
    }

    #[cfg(not(unix))]
    {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %error, "Cannot listen for Ctrl+C");
            return false;
        }
        tracing::info!(signal = "ctrl-c", "Stopping server");
        true
    }
}

/// Counts connections that are still being served.
///
/// ```rust
/// use archrest_server::ConnectionTracker;
///
/// let tracker = ConnectionTracker::new();
/// let guard = tracker.acquire();
/// assert_eq!(tracker.active_connections(), 1);
/// drop(guard);
/// assert_eq!(tracker.active_connections(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    open: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl ConnectionTracker {
    /// A tracker with nothing open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one connection until the returned token drops.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.open.fetch_add(1, Ordering::AcqRel);
        ConnectionToken {
            tracker: self.clone(),
        }
    }

    /// Connections currently open.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.open.load(Ordering::Acquire)
    }

    /// Resolves when no connection is open.
    pub async fn wait_for_shutdown(&self) {
        loop {
            let idle = self.idle.notified();
            if self.active_connections() == 0 {
                return;
            }
            idle.await;
        }
    }
}

/// Held for the lifetime of one connection.
#[derive(Debug)]
pub struct ConnectionToken {
    tracker: ConnectionTracker,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        if self.tracker.open.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.tracker.idle.notify_waiters();
        }
    }
}
