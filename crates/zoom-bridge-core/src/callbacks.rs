use std::sync::{Arc, Mutex, PoisonError};

use crate::errors::BridgeError;
use crate::events::{EventEmitter, MeetingEvent};
use crate::lifecycle::MeetingListenerBinding;
use crate::pending::RequestSlot;
use crate::sdk::{
    InitializeListener, MeetingServiceListener, MeetingStatus, NON_FAILURE_MEETING_ERRORS,
    ZOOM_ERROR_SUCCESS,
};

const INITIALIZED: &str = "Initialize Zoom SDK successfully.";
const CONNECTED: &str = "Connected to zoom meeting";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    Initializing,
    Initialized,
}

/// State shared between request methods and SDK callback relays.
pub(crate) struct BridgeState {
    init_state: Mutex<InitState>,
    pub(crate) init_slot: RequestSlot,
    pub(crate) meeting_slot: RequestSlot,
    pub(crate) emitter: EventEmitter,
}

impl BridgeState {
    pub(crate) fn new() -> Self {
        Self {
            init_state: Mutex::new(InitState::Uninitialized),
            init_slot: RequestSlot::new("initialize"),
            meeting_slot: RequestSlot::new("meeting"),
            emitter: EventEmitter::new(),
        }
    }

    pub(crate) fn init_state(&self) -> InitState {
        *self.init_state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_init_state(&self, state: InitState) {
        *self.init_state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Move to `Initializing` unless already past `Uninitialized`.
    /// Returns the state that blocked the transition.
    pub(crate) fn begin_initialize(&self) -> Result<(), InitState> {
        let mut state = self.init_state.lock().unwrap_or_else(PoisonError::into_inner);
        match *state {
            InitState::Uninitialized => {
                *state = InitState::Initializing;
                Ok(())
            }
            other => Err(other),
        }
    }
}

/// Handles `onZoomSDKInitializeResult`.
pub(crate) struct InitRelay {
    pub(crate) state: Arc<BridgeState>,
    pub(crate) binding: Arc<MeetingListenerBinding>,
}

impl InitializeListener for InitRelay {
    fn on_initialize_result(&self, error_code: i32, internal_error_code: i32) {
        tracing::info!(error_code, internal_error_code, "initialize result");

        if error_code != ZOOM_ERROR_SUCCESS {
            self.state.set_init_state(InitState::Uninitialized);
            self.state.init_slot.reject(BridgeError::Initialization {
                error_code,
                internal_error_code,
            });
            return;
        }

        self.state.set_init_state(InitState::Initialized);
        if let Err(e) = self.binding.attach() {
            tracing::error!("meeting listener registration failed: {e}");
        }
        self.state.init_slot.resolve(INITIALIZED);
    }

    fn on_auth_identity_expired(&self) {
        tracing::debug!("auth identity expired");
    }
}

/// Handles `onMeetingStatusChanged`.
pub(crate) struct MeetingStatusRelay {
    pub(crate) state: Arc<BridgeState>,
}

impl MeetingServiceListener for MeetingStatusRelay {
    fn on_meeting_status_changed(
        &self,
        status: MeetingStatus,
        error_code: i32,
        internal_error_code: i32,
    ) {
        tracing::info!(?status, error_code, internal_error_code, "meeting status changed");

        match status {
            MeetingStatus::Connecting => self.state.emitter.emit(MeetingEvent::MeetingStarted),
            MeetingStatus::Failed | MeetingStatus::Disconnecting => {
                self.state.emitter.emit(MeetingEvent::MeetingEnded)
            }
            _ => {}
        }

        if status == MeetingStatus::Failed && !NON_FAILURE_MEETING_ERRORS.contains(&error_code) {
            self.state.meeting_slot.reject(BridgeError::Meeting {
                error_code,
                internal_error_code,
            });
        } else if matches!(status, MeetingStatus::InMeeting | MeetingStatus::Idle) {
            self.state.meeting_slot.resolve(CONNECTED);
        }
    }
}
