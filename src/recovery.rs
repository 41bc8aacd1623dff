//! Runtime fault delivery and the cancel-or-restart recovery flow
//!
//! Runtime capture faults are recoverable: they are surfaced to the caller
//! with exactly two choices and are never retried silently. Observers register
//! explicitly and receive a subscription handle that is cancelled at session
//! stop, so a stopped session never holds a dangling observer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Category of a runtime capture fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// A device disappeared mid-session
    DeviceDisconnected,
    /// The capture hardware reported an error after a successful start
    HardwareFault,
    /// The direct-file strategy failed to write its output
    MediaWrite,
}

/// An asynchronous, recoverable failure signaled after session start
#[derive(Debug, Clone)]
pub struct CaptureFault {
    pub kind: FaultKind,
    pub message: String,
}

impl CaptureFault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CaptureFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// The two recovery options presented for a runtime fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryChoice {
    /// Stop any active recording and the capture session, land in idle
    Cancel,
    /// Restart the capture session and resume an in-progress recording
    Restart,
}

/// Collaborator that picks a recovery option for a fault
///
/// In an application this is the alert UI; tests script the answer.
pub trait RecoveryDelegate: Send + Sync {
    fn choose(&self, fault: &CaptureFault) -> RecoveryChoice;
}

type FaultObserver = Arc<dyn Fn(&CaptureFault) + Send + Sync>;

/// Registry of runtime fault observers
pub struct FaultHub {
    observers: Mutex<HashMap<u64, FaultObserver>>,
    next_id: AtomicU64,
}

impl FaultHub {
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register an observer; the returned subscription must be kept alive and
    /// cancelled when the session stops
    pub fn observe<F>(self: &Arc<Self>, observer: F) -> FaultSubscription
    where
        F: Fn(&CaptureFault) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.observers
            .lock()
            .expect("fault observer lock poisoned")
            .insert(id, Arc::new(observer));
        FaultSubscription {
            id,
            hub: Arc::downgrade(self),
        }
    }

    /// Deliver a fault to every registered observer
    pub fn report(&self, fault: &CaptureFault) {
        let observers: Vec<FaultObserver> = self
            .observers
            .lock()
            .expect("fault observer lock poisoned")
            .values()
            .cloned()
            .collect();
        log::warn!("runtime capture fault: {}", fault);
        for observer in observers {
            observer(fault);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers
            .lock()
            .expect("fault observer lock poisoned")
            .len()
    }

    fn remove(&self, id: u64) {
        self.observers
            .lock()
            .expect("fault observer lock poisoned")
            .remove(&id);
    }
}

impl Default for FaultHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a registered fault observer
///
/// Cancelling (or dropping) removes the observer from the hub.
#[derive(Debug)]
pub struct FaultSubscription {
    id: u64,
    hub: Weak<FaultHub>,
}

impl FaultSubscription {
    /// Remove the observer from the hub
    pub fn cancel(self) {
        // Removal happens in Drop.
    }
}

impl Drop for FaultSubscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.remove(self.id);
        }
    }
}

impl std::fmt::Debug for FaultHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultHub")
            .field("observers", &self.observer_count())
            .finish()
    }
}
