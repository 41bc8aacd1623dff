//! Device authorization gate
//!
//! Capture requires both the camera and the microphone to be granted. Grant
//! callbacks may arrive on arbitrary threads, more than once, and in any order
//! across the two media kinds; the gate counts grants and releases session
//! setup exactly once, only after both kinds have been granted.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::CaptureError;
use crate::types::MediaKind;

/// Number of media kinds that must be granted before capture may start
pub const REQUIRED_GRANTS: usize = 2;

/// Asynchronous permission prompt for one media kind
///
/// Implementations wrap the platform permission subsystem; tests substitute a
/// scripted requester. The callback may be invoked on any thread.
pub trait PermissionRequester: Send + Sync {
    fn request_access(&self, kind: MediaKind, callback: Box<dyn FnOnce(bool) + Send>);
}

/// Progress of the authorization handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationProgress {
    /// Some grants are still outstanding; carries the count so far
    Pending(usize),
    /// Both media kinds have been granted
    Complete,
}

/// Process-wide grant counter with an exactly-once setup latch
///
/// The counter only ever increments; permissions are not re-requested after a
/// session has started.
#[derive(Debug)]
pub struct AuthorizationGate {
    granted: AtomicUsize,
    setup_done: AtomicBool,
}

impl AuthorizationGate {
    pub fn new() -> Self {
        Self {
            granted: AtomicUsize::new(0),
            setup_done: AtomicBool::new(false),
        }
    }

    /// Record the outcome of one grant callback
    ///
    /// A denial is fatal for the session: the system cannot usefully run
    /// without both devices, so the caller must halt before capture setup.
    pub fn record_grant(&self, granted: bool) -> Result<AuthorizationProgress, CaptureError> {
        if !granted {
            return Err(CaptureError::PermissionDenied(
                "video and audio capture must both be granted".to_string(),
            ));
        }
        let count = self.granted.fetch_add(1, Ordering::SeqCst) + 1;
        if count >= REQUIRED_GRANTS {
            Ok(AuthorizationProgress::Complete)
        } else {
            Ok(AuthorizationProgress::Pending(count))
        }
    }

    /// Number of grants recorded so far
    pub fn grant_count(&self) -> usize {
        self.granted.load(Ordering::SeqCst)
    }

    /// True once both media kinds have been granted at least once
    pub fn is_satisfied(&self) -> bool {
        self.grant_count() >= REQUIRED_GRANTS
    }

    /// Run `f` if the grant count has reached the required count
    ///
    /// Triggers at most once for the lifetime of the gate; later calls are
    /// no-ops and return false.
    pub fn try_setup<F: FnOnce()>(&self, f: F) -> bool {
        if !self.is_satisfied() {
            return false;
        }
        if self
            .setup_done
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            f();
            true
        } else {
            false
        }
    }

    /// True once `try_setup` has fired
    pub fn setup_triggered(&self) -> bool {
        self.setup_done.load(Ordering::SeqCst)
    }
}

impl Default for AuthorizationGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Issue one permission request per required media kind
///
/// The handler runs once per kind with the grant outcome, mirroring the
/// platform convention of a shared completion handler for both prompts.
pub fn request_device_authorization<H>(requester: &dyn PermissionRequester, handler: H)
where
    H: Fn(bool) + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    for kind in [MediaKind::Video, MediaKind::Audio] {
        let handler = handler.clone();
        requester.request_access(kind, Box::new(move |granted| handler(granted)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_setup_fires_only_after_both_grants() {
        let gate = AuthorizationGate::new();
        assert_eq!(
            gate.record_grant(true).unwrap(),
            AuthorizationProgress::Pending(1)
        );
        assert!(!gate.try_setup(|| panic!("setup must not fire after one grant")));

        assert_eq!(
            gate.record_grant(true).unwrap(),
            AuthorizationProgress::Complete
        );
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        assert!(gate.try_setup(move || {
            f.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_setup_fires_exactly_once() {
        let gate = AuthorizationGate::new();
        gate.record_grant(true).unwrap();
        gate.record_grant(true).unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        for _ in 0..10 {
            let f = fired.clone();
            gate.try_setup(move || {
                f.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_denial_is_fatal() {
        let gate = AuthorizationGate::new();
        gate.record_grant(true).unwrap();
        let err = gate.record_grant(false).unwrap_err();
        assert!(matches!(err, CaptureError::PermissionDenied(_)));
        // The counter never decrements on denial.
        assert_eq!(gate.grant_count(), 1);
    }

    #[test]
    fn test_extra_grants_do_not_retrigger() {
        let gate = AuthorizationGate::new();
        for _ in 0..5 {
            gate.record_grant(true).unwrap();
        }
        assert!(gate.try_setup(|| {}));
        assert!(!gate.try_setup(|| panic!("second trigger")));
        assert!(gate.setup_triggered());
    }

    #[test]
    fn test_request_issues_one_prompt_per_kind() {
        struct CountingRequester(AtomicUsize);
        impl PermissionRequester for CountingRequester {
            fn request_access(&self, _kind: MediaKind, callback: Box<dyn FnOnce(bool) + Send>) {
                self.0.fetch_add(1, Ordering::SeqCst);
                callback(true);
            }
        }

        let requester = CountingRequester(AtomicUsize::new(0));
        let grants = Arc::new(AtomicUsize::new(0));
        let g = grants.clone();
        request_device_authorization(&requester, move |granted| {
            if granted {
                g.fetch_add(1, Ordering::SeqCst);
            }
        });
        assert_eq!(requester.0.load(Ordering::SeqCst), 2);
        assert_eq!(grants.load(Ordering::SeqCst), 2);
    }
}
