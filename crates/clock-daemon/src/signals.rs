//! Signal handling for graceful daemon shutdown.
//!
//! SIGTERM and SIGINT request shutdown; SIGHUP requests a resync with the
//! wall clock. Flags are atomics so the tick loop can check them without
//! blocking, and a [`Notify`] wakes a loop that is waiting for its next tick.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, info};

/// Signal types that the daemon handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// SIGTERM - Graceful termination request.
    Terminate,
    /// SIGINT - Interrupt (Ctrl+C).
    Interrupt,
    /// SIGHUP - Resynchronize with the wall clock.
    Hangup,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalKind::Terminate => write!(f, "SIGTERM"),
            SignalKind::Interrupt => write!(f, "SIGINT"),
            SignalKind::Hangup => write!(f, "SIGHUP"),
        }
    }
}

/// Shared state for signal handling.
///
/// This struct is shared between the signal listener tasks and the tick loop.
#[derive(Debug, Default)]
pub struct SignalState {
    /// Set to true when a shutdown signal is received.
    shutdown_requested: AtomicBool,
    /// Set to true when a resync signal is received.
    resync_requested: AtomicBool,
    /// Count of signals received (for diagnostics).
    signal_count: AtomicU32,
    /// Wakes tasks waiting for shutdown.
    shutdown_notify: Notify,
}

impl SignalState {
    /// Create a new signal state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if shutdown has been requested.
    #[inline]
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Relaxed)
    }

    /// Check if a resync has been requested (and clear the flag).
    #[inline]
    pub fn take_resync_request(&self) -> bool {
        self.resync_requested.swap(false, Ordering::Relaxed)
    }

    /// Request shutdown (can be called from any thread).
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Relaxed);
        self.shutdown_notify.notify_waiters();
    }

    /// Request resync (can be called from any thread).
    pub fn request_resync(&self) {
        self.resync_requested.store(true, Ordering::Relaxed);
    }

    /// Record a signal and act on it.
    fn record_signal(&self, kind: SignalKind) {
        self.signal_count.fetch_add(1, Ordering::Relaxed);
        info!(signal = %kind, "Signal received");
        match kind {
            SignalKind::Terminate | SignalKind::Interrupt => self.request_shutdown(),
            SignalKind::Hangup => self.request_resync(),
        }
    }

    /// Get the total number of signals received.
    pub fn signal_count(&self) -> u32 {
        self.signal_count.load(Ordering::Relaxed)
    }

    /// Wait until shutdown is requested.
    pub async fn wait_for_shutdown(&self) {
        // Register interest before checking the flag so a request between
        // the check and the await is not lost.
        let notified = self.shutdown_notify.notified();
        if self.shutdown_requested() {
            return;
        }
        notified.await;
    }
}

/// Handle for signal management.
#[derive(Clone)]
pub struct SignalHandler {
    state: Arc<SignalState>,
}

impl SignalHandler {
    /// Create a handler and spawn listener tasks on the current tokio runtime.
    ///
    /// On Unix this listens for SIGTERM, SIGINT, and SIGHUP; elsewhere only Ctrl+C.
    pub fn new() -> std::io::Result<Self> {
        let handler = Self::detached();

        #[cfg(unix)]
        handler.register_unix_handlers()?;
        #[cfg(not(unix))]
        handler.register_ctrl_c();

        Ok(handler)
    }

    /// Create a handler with no OS signal listeners (manual requests only).
    pub fn detached() -> Self {
        Self {
            state: Arc::new(SignalState::new()),
        }
    }

    #[cfg(unix)]
    fn register_unix_handlers(&self) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind as UnixSignal};

        let listeners = [
            (signal(UnixSignal::terminate())?, SignalKind::Terminate),
            (signal(UnixSignal::interrupt())?, SignalKind::Interrupt),
            (signal(UnixSignal::hangup())?, SignalKind::Hangup),
        ];

        for (mut stream, kind) in listeners {
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                while stream.recv().await.is_some() {
                    state.record_signal(kind);
                }
            });
        }

        debug!("Unix signal handlers registered");
        Ok(())
    }

    #[cfg(not(unix))]
    fn register_ctrl_c(&self) {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                state.record_signal(SignalKind::Interrupt);
            }
        });
    }

    /// Check if shutdown has been requested.
    #[inline]
    pub fn shutdown_requested(&self) -> bool {
        self.state.shutdown_requested()
    }

    /// Check if a resync has been requested (clears the flag).
    #[inline]
    pub fn take_resync_request(&self) -> bool {
        self.state.take_resync_request()
    }

    /// Manually request shutdown.
    pub fn request_shutdown(&self) {
        info!("Manual shutdown requested");
        self.state.request_shutdown();
    }

    /// Wait until shutdown is requested.
    pub async fn wait_for_shutdown(&self) {
        self.state.wait_for_shutdown().await;
    }

    /// Get the signal state for inspection.
    pub fn state(&self) -> &SignalState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_signal_state_default() {
        let state = SignalState::new();
        assert!(!state.shutdown_requested());
        assert!(!state.take_resync_request());
        assert_eq!(state.signal_count(), 0);
    }

    #[test]
    fn test_shutdown_request() {
        let state = SignalState::new();
        state.request_shutdown();
        assert!(state.shutdown_requested());
    }

    #[test]
    fn test_resync_request() {
        let state = SignalState::new();
        state.request_resync();
        assert!(state.take_resync_request());
        // Flag should be cleared after take
        assert!(!state.take_resync_request());
    }

    #[test]
    fn test_hangup_requests_resync() {
        let state = SignalState::new();
        state.record_signal(SignalKind::Hangup);
        assert!(state.take_resync_request());
        assert!(!state.shutdown_requested());
        assert_eq!(state.signal_count(), 1);

        state.record_signal(SignalKind::Terminate);
        assert!(state.shutdown_requested());
    }

    #[tokio::test]
    async fn test_wait_returns_after_request() {
        let handler = SignalHandler::detached();
        let waiter = handler.clone();
        let task = tokio::spawn(async move { waiter.wait_for_shutdown().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        handler.request_shutdown();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_after_request_returns_immediately() {
        let handler = SignalHandler::detached();
        handler.request_shutdown();
        tokio::time::timeout(Duration::from_millis(100), handler.wait_for_shutdown())
            .await
            .expect("already requested");
    }

    #[tokio::test]
    async fn test_signal_handler_manual_shutdown() {
        let handler = SignalHandler::new().unwrap();
        assert!(!handler.shutdown_requested());

        handler.request_shutdown();
        assert!(handler.shutdown_requested());
    }
}
