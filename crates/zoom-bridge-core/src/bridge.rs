use std::sync::Arc;

use crate::callbacks::{BridgeState, InitRelay, InitState, MeetingStatusRelay};
use crate::errors::BridgeError;
use crate::events::MeetingEventListener;
use crate::lifecycle::{HostLifecycle, MeetingListenerBinding};
use crate::pending::{PendingResult, ResultHandle, Ticket};
use crate::sdk::{
    DispatchError, JoinMeetingOptions, JoinMeetingParams, MEETING_ERROR_SUCCESS, MeetingStatus,
    MeetingViewOptions, SdkCredentials, StartMeetingOptions, StartMeetingParams, UiThread, ZoomSdk,
};

/// Name the host runtime registers this module under.
pub const MODULE_NAME: &str = "RNZoomBridge";

const ALREADY_INITIALIZED: &str = "Already initialize Zoom SDK successfully.";
const ALREADY_JOINED: &str = "Already joined zoom meeting";
const NOT_INITIALIZED: &str = "ZoomSDK has not been initialized successfully";
const MEETING_PENDING: &str = "a meeting request is already pending";

/// UI elements hidden when joining with a password.
pub const RESTRICTED_MEETING_VIEWS: MeetingViewOptions = MeetingViewOptions::NONE
    .union(MeetingViewOptions::NO_BUTTON_MORE)
    .union(MeetingViewOptions::NO_BUTTON_SHARE)
    .union(MeetingViewOptions::NO_BUTTON_PARTICIPANTS)
    .union(MeetingViewOptions::NO_BUTTON_VIDEO)
    .union(MeetingViewOptions::NO_BUTTON_SWITCH_CAMERA)
    .union(MeetingViewOptions::NO_BUTTON_AUDIO)
    .union(MeetingViewOptions::NO_TEXT_MEETING_ID)
    .union(MeetingViewOptions::NO_TEXT_PASSWORD);

#[derive(Debug, Clone, Copy)]
enum MeetingRequest {
    Start,
    Join,
}

impl MeetingRequest {
    fn label(self) -> &'static str {
        match self {
            Self::Start => "startMeeting",
            Self::Join => "joinMeeting",
        }
    }

    fn error(self, message: impl Into<String>, error_code: Option<i32>) -> BridgeError {
        let message = message.into();
        match self {
            Self::Start => BridgeError::Start { message, error_code },
            Self::Join => BridgeError::Join { message, error_code },
        }
    }
}

/// Adapter between the host runtime and the Zoom SDK.
///
/// Tracks at most one initialize request and one meeting request. Requests
/// return a [`PendingResult`] that settles either immediately (validation
/// and synchronous SDK failures) or when the SDK reports a terminal status.
pub struct ZoomBridge {
    sdk: Arc<dyn ZoomSdk>,
    ui: Arc<dyn UiThread>,
    state: Arc<BridgeState>,
    binding: Arc<MeetingListenerBinding>,
    init_relay: Arc<InitRelay>,
}

impl ZoomBridge {
    pub fn new(sdk: Arc<dyn ZoomSdk>, ui: Arc<dyn UiThread>) -> Self {
        let state = Arc::new(BridgeState::new());
        let status_relay = Arc::new(MeetingStatusRelay {
            state: state.clone(),
        });
        let binding = Arc::new(MeetingListenerBinding::new(sdk.clone(), status_relay));
        let init_relay = Arc::new(InitRelay {
            state: state.clone(),
            binding: binding.clone(),
        });
        Self {
            sdk,
            ui,
            state,
            binding,
            init_relay,
        }
    }

    /// Register a listener for meeting-started / meeting-ended events.
    pub fn add_listener(&self, listener: Arc<dyn MeetingEventListener>) {
        self.state.emitter.add_listener(listener);
    }

    pub fn init_state(&self) -> InitState {
        self.state.init_state()
    }

    pub fn has_pending_meeting(&self) -> bool {
        self.state.meeting_slot.is_pending()
    }

    pub fn is_listener_attached(&self) -> bool {
        self.binding.is_attached()
    }

    /// Initialize the SDK on the UI thread.
    ///
    /// Settles when the SDK delivers its initialize result. Once initialized,
    /// later calls resolve at once. A call made while an initialize is still
    /// in flight is rejected with `ERR_ZOOM_INITIALIZATION` rather than
    /// resolved, so hosts that initialize twice at startup should await the
    /// first call.
    pub fn initialize(&self, credentials: SdkCredentials) -> PendingResult {
        match self.state.begin_initialize() {
            Ok(()) => {}
            Err(InitState::Initialized) => return PendingResult::resolved(ALREADY_INITIALIZED),
            Err(_) => return PendingResult::rejected(BridgeError::InitializationInProgress),
        }

        let (handle, pending) = ResultHandle::channel();
        let ticket = match self.state.init_slot.claim(handle) {
            Ok(ticket) => ticket,
            Err(handle) => {
                handle.reject(BridgeError::InitializationInProgress);
                return pending;
            }
        };

        tracing::info!(web_domain = %credentials.web_domain, "initializing sdk");

        let sdk = self.sdk.clone();
        let state = self.state.clone();
        let relay = self.init_relay.clone();
        let dispatched = self.ui.run_on_ui_thread(Box::new(move || {
            if let Err(e) = sdk.initialize(&credentials, relay) {
                abort_initialize(&state, ticket, e);
            }
        }));

        if let Err(e) = dispatched {
            abort_initialize(&self.state, ticket, e);
        }
        pending
    }

    /// Start a meeting as host (without login).
    pub fn start_meeting(&self, params: StartMeetingParams) -> PendingResult {
        let request = MeetingRequest::Start;
        if !self.sdk.is_initialized() {
            return PendingResult::rejected(request.error(NOT_INITIALIZED, None));
        }

        let Some(meeting_no) = parse_meeting_number(&params.meeting_no) else {
            return PendingResult::rejected(request.error(
                format!("Invalid meeting number: {}", params.meeting_no),
                None,
            ));
        };

        if self.sdk.meeting_status() != MeetingStatus::Idle
            && self.sdk.current_meeting_number() == meeting_no
        {
            tracing::info!(meeting_no, "meeting already active, returning to it");
            return match self.sdk.return_to_meeting() {
                Ok(()) => PendingResult::resolved(ALREADY_JOINED),
                Err(e) => PendingResult::rejected(BridgeError::Unexpected(e.to_string())),
            };
        }

        let (ticket, pending) = match self.claim_meeting(request) {
            Ok(claimed) => claimed,
            Err(rejected) => return rejected,
        };

        let result = self
            .sdk
            .start_meeting(&params, &StartMeetingOptions::default());
        self.check_immediate(request, ticket, result);
        pending
    }

    pub fn join_meeting(&self, display_name: String, meeting_no: String) -> PendingResult {
        let params = JoinMeetingParams {
            display_name,
            meeting_no,
            password: None,
        };
        self.join(params, audio_join_options())
    }

    /// Join with a password, auto-connecting audio and hiding most meeting controls.
    pub fn join_meeting_with_password(
        &self,
        display_name: String,
        meeting_no: String,
        password: String,
    ) -> PendingResult {
        let params = JoinMeetingParams {
            display_name,
            meeting_no,
            password: Some(password),
        };
        let options = JoinMeetingOptions {
            meeting_views: RESTRICTED_MEETING_VIEWS,
            ..audio_join_options()
        };
        self.join(params, options)
    }

    /// React to the hosting UI context's lifecycle.
    pub fn on_host_lifecycle(&self, event: HostLifecycle) {
        match event {
            HostLifecycle::Destroy => self.binding.detach(),
            HostLifecycle::Resume | HostLifecycle::Pause => {
                tracing::debug!(?event, "host lifecycle");
            }
        }
    }

    /// Tear down: unregister from the SDK. Safe if never initialized.
    pub fn shutdown(&self) {
        self.binding.detach();
    }

    fn join(&self, params: JoinMeetingParams, options: JoinMeetingOptions) -> PendingResult {
        let request = MeetingRequest::Join;
        if !self.sdk.is_initialized() {
            return PendingResult::rejected(request.error(NOT_INITIALIZED, None));
        }

        let (ticket, pending) = match self.claim_meeting(request) {
            Ok(claimed) => claimed,
            Err(rejected) => return rejected,
        };

        if params.password.is_some() {
            if let Err(e) = self.sdk.set_auto_connect_voip_when_join(true) {
                self.check_immediate(request, ticket, Err(e));
                return pending;
            }
        }

        let result = self.sdk.join_meeting(&params, &options);
        self.check_immediate(request, ticket, result);
        pending
    }

    fn claim_meeting(&self, request: MeetingRequest) -> Result<(Ticket, PendingResult), PendingResult> {
        let (handle, pending) = ResultHandle::channel();
        match self.state.meeting_slot.claim(handle) {
            Ok(ticket) => Ok((ticket, pending)),
            Err(handle) => {
                handle.reject(request.error(MEETING_PENDING, None));
                Err(pending)
            }
        }
    }

    /// Settle the request now if the SDK refused it synchronously.
    fn check_immediate(
        &self,
        request: MeetingRequest,
        ticket: Ticket,
        result: Result<i32, DispatchError>,
    ) {
        let error = match result {
            Ok(MEETING_ERROR_SUCCESS) => {
                tracing::info!("{} accepted, waiting for meeting status", request.label());
                return;
            }
            Ok(code) => {
                tracing::info!("{}, result={code}", request.label());
                request.error(format!("{}, errorCode={code}", request.label()), Some(code))
            }
            Err(e) => BridgeError::Unexpected(e.to_string()),
        };
        match self.state.meeting_slot.release(ticket) {
            Some(handle) => handle.reject(error),
            None => tracing::warn!("{} settled before its immediate failure", request.label()),
        }
    }
}

fn abort_initialize(state: &BridgeState, ticket: Ticket, error: DispatchError) {
    tracing::error!("initialize dispatch failed: {error}");
    state.set_init_state(InitState::Uninitialized);
    if let Some(handle) = state.init_slot.release(ticket) {
        handle.reject(BridgeError::Unexpected(error.to_string()));
    }
}

fn audio_join_options() -> JoinMeetingOptions {
    JoinMeetingOptions {
        no_audio: false,
        no_driving_mode: true,
        no_disconnect_audio: true,
        meeting_views: MeetingViewOptions::NONE,
    }
}

/// Accepts non-empty ASCII digit strings that fit in a `u64`.
pub fn parse_meeting_number(input: &str) -> Option<u64> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    input.parse().ok()
}
