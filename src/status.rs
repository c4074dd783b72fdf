use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

/// Coarse last-known reachability of the card service.
///
/// Advisory UI state only: writes are last-write-wins between an in-flight
/// call and the heartbeat, and nothing correctness-critical may read it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Connectivity {
    Connected,
    Disconnected,
}

type Notifier = dyn Fn(&str) + Send + Sync;

/// Shared connectivity flag plus the user-notification hook.
///
/// One instance is created per [`crate::CampusCardClient`] and handed to
/// every collaborator that needs it. All writes go through [`set`], keeping
/// a single code path for the flag; presentation code subscribes with
/// [`subscribe`] to drive a "reconnecting" indicator.
///
/// Starts out [`Connectivity::Connected`]; the flag is not persisted.
///
/// [`set`]: ConnectivityState::set
/// [`subscribe`]: ConnectivityState::subscribe
#[derive(Clone)]
pub struct ConnectivityState {
    tx: Arc<watch::Sender<Connectivity>>,
    notifier: Option<Arc<Notifier>>,
}

impl fmt::Debug for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectivityState")
            .field("current", &self.current())
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Connectivity::Connected);
        Self {
            tx: Arc::new(tx),
            notifier: None,
        }
    }

    /// Installs the callback invoked when a call exhausts its retries.
    ///
    /// Without one, failures are reported through a `tracing` error event.
    pub fn with_notifier(mut self, notifier: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    pub fn current(&self) -> Connectivity {
        *self.tx.borrow()
    }

    /// Updates the flag. Safe to call from any task; readers observe the
    /// latest value only.
    pub fn set(&self, status: Connectivity) {
        let previous = self.tx.send_replace(status);

        #[cfg(feature = "tracing")]
        if previous != status && status == Connectivity::Disconnected {
            tracing::warn!("connection to the card service lost, waiting to reconnect");
        }
        #[cfg(not(feature = "tracing"))]
        let _ = previous;
    }

    /// Subscribes to status changes. The receiver always starts with the
    /// current value.
    pub fn subscribe(&self) -> watch::Receiver<Connectivity> {
        self.tx.subscribe()
    }

    /// Surfaces a user-visible failure message through the registered
    /// notifier.
    pub fn notify_failure(&self, message: &str) {
        match &self.notifier {
            Some(notifier) => notifier(message),
            None => {
                #[cfg(feature = "tracing")]
                tracing::error!("{message}");
                #[cfg(not(feature = "tracing"))]
                let _ = message;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{Connectivity, ConnectivityState};

    #[test]
    fn starts_connected() {
        let state = ConnectivityState::new();
        assert_eq!(state.current(), Connectivity::Connected);
    }

    #[test]
    fn set_is_visible_to_subscribers() {
        let state = ConnectivityState::new();
        let rx = state.subscribe();
        state.set(Connectivity::Disconnected);
        assert_eq!(*rx.borrow(), Connectivity::Disconnected);
    }

    #[test]
    fn notifier_receives_failure_message() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let state = ConnectivityState::new()
            .with_notifier(move |message| sink.lock().unwrap().push(message.to_owned()));

        state.notify_failure("operation failed: boom");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), ["operation failed: boom"]);
    }
}
