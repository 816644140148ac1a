use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::sdk::{DispatchError, MeetingServiceListener, ZoomSdk};

/// Host UI lifecycle transitions forwarded by the native shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostLifecycle {
    Resume,
    Pause,
    Destroy,
}

/// Registration of the meeting-status listener with the SDK's meeting service.
///
/// Attached once initialization succeeds, detached by whoever owns the
/// adapter's lifetime. Both directions are idempotent.
pub struct MeetingListenerBinding {
    sdk: Arc<dyn ZoomSdk>,
    listener: Arc<dyn MeetingServiceListener>,
    attached: Mutex<bool>,
}

impl MeetingListenerBinding {
    pub fn new(sdk: Arc<dyn ZoomSdk>, listener: Arc<dyn MeetingServiceListener>) -> Self {
        Self {
            sdk,
            listener,
            attached: Mutex::new(false),
        }
    }

    /// Locks are released before the SDK is called, so the SDK may report a
    /// status back synchronously from inside the registration.
    pub fn attach(&self) -> Result<(), DispatchError> {
        if mem::replace(&mut *self.lock(), true) {
            tracing::debug!("meeting listener already attached");
            return Ok(());
        }
        tracing::info!("registering meeting listener");
        if let Err(e) = self.sdk.add_meeting_listener(self.listener.clone()) {
            *self.lock() = false;
            return Err(e);
        }
        Ok(())
    }

    /// Safe to call at any time, including before the SDK was ever initialized.
    pub fn detach(&self) {
        if !mem::replace(&mut *self.lock(), false) {
            return;
        }
        if !self.sdk.is_initialized() {
            tracing::debug!("sdk not initialized, nothing to unregister");
            return;
        }
        tracing::info!("unregistering meeting listener");
        if let Err(e) = self.sdk.remove_meeting_listener(&self.listener) {
            tracing::warn!("failed to unregister meeting listener: {e}");
        }
    }

    pub fn is_attached(&self) -> bool {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.attached.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeSdk, SdkCall};
    use crate::sdk::MeetingStatus;

    struct NoopListener;

    impl MeetingServiceListener for NoopListener {
        fn on_meeting_status_changed(&self, _: MeetingStatus, _: i32, _: i32) {}
    }

    fn make_binding(sdk: &Arc<FakeSdk>) -> MeetingListenerBinding {
        MeetingListenerBinding::new(sdk.clone(), Arc::new(NoopListener))
    }

    #[test]
    fn attach_is_idempotent() {
        let sdk = FakeSdk::new();
        sdk.mark_initialized();
        let binding = make_binding(&sdk);

        binding.attach().unwrap();
        binding.attach().unwrap();

        assert!(binding.is_attached());
        assert_eq!(sdk.meeting_listener_count(), 1);
    }

    #[test]
    fn detach_unregisters_once() {
        let sdk = FakeSdk::new();
        sdk.mark_initialized();
        let binding = make_binding(&sdk);
        binding.attach().unwrap();

        binding.detach();
        binding.detach();

        assert!(!binding.is_attached());
        assert_eq!(sdk.meeting_listener_count(), 0);
        let removals = sdk
            .calls()
            .into_iter()
            .filter(|c| *c == SdkCall::RemoveMeetingListener)
            .count();
        assert_eq!(removals, 1);
    }

    #[test]
    fn detach_without_initialized_sdk_is_noop() {
        let sdk = FakeSdk::new();
        let binding = make_binding(&sdk);

        binding.detach();

        assert!(sdk.calls().is_empty());
    }

    #[test]
    fn failed_attach_stays_detached() {
        let sdk = FakeSdk::new();
        sdk.mark_initialized();
        sdk.fail_listener_registration(DispatchError::NoMeetingService);
        let binding = make_binding(&sdk);

        assert_eq!(binding.attach(), Err(DispatchError::NoMeetingService));
        assert!(!binding.is_attached());
    }

    #[test]
    fn sdk_may_reenter_during_registration() {
        let sdk = FakeSdk::new();
        sdk.mark_initialized();
        let binding = Arc::new(make_binding(&sdk));
        let weak = Arc::downgrade(&binding);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let hook_seen = seen.clone();
        sdk.on_listener_added(move || {
            let binding = weak.upgrade().unwrap();
            hook_seen.lock().unwrap().push(binding.is_attached());
        });

        binding.attach().unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![true]);
        assert!(binding.is_attached());
        binding.detach();
        assert!(!binding.is_attached());
    }
}
