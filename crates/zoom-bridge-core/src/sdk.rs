//! Capabilities the adapter needs from the vendor SDK and the host.
//!
//! The real Zoom SDK lives behind these traits; native shells implement
//! them on top of the vendor library, tests implement them with fakes.

use std::ops::BitOr;
use std::sync::Arc;

use thiserror::Error;

/// `ZoomError.ZOOM_ERROR_SUCCESS`
pub const ZOOM_ERROR_SUCCESS: i32 = 0;

/// `MeetingError.MEETING_ERROR_SUCCESS`
pub const MEETING_ERROR_SUCCESS: i32 = 0;
/// `MeetingError.MEETING_ERROR_MEETING_OVER`
pub const MEETING_ERROR_MEETING_OVER: i32 = 8;
/// `MeetingError.MEETING_ERROR_EXIT_WHEN_WAITING_HOST_START`
pub const MEETING_ERROR_EXIT_WHEN_WAITING_HOST_START: i32 = 21;

/// Error codes that accompany a `Failed` status without failing the request.
pub const NON_FAILURE_MEETING_ERRORS: [i32; 3] = [
    MEETING_ERROR_EXIT_WHEN_WAITING_HOST_START,
    MEETING_ERROR_MEETING_OVER,
    MEETING_ERROR_SUCCESS,
];

/// Raised when a call could not be handed to the SDK or the host at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no current activity")]
    NoActivity,
    #[error("meeting service unavailable")]
    NoMeetingService,
    #[error("sdk call failed: {0}")]
    Sdk(String),
}

/// Session status as reported by the SDK's meeting service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingStatus {
    Idle,
    Connecting,
    WaitingForHost,
    InMeeting,
    Disconnecting,
    Reconnecting,
    Failed,
    InWaitingRoom,
    WebinarPromote,
    WebinarDepromote,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkCredentials {
    pub app_key: String,
    pub app_secret: String,
    pub web_domain: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartMeetingParams {
    pub display_name: String,
    pub meeting_no: String,
    pub user_id: String,
    pub user_type: i32,
    pub zoom_access_token: String,
    pub zoom_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartMeetingOptions {
    pub meeting_views: MeetingViewOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinMeetingParams {
    pub display_name: String,
    pub meeting_no: String,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinMeetingOptions {
    pub no_audio: bool,
    pub no_driving_mode: bool,
    pub no_disconnect_audio: bool,
    pub meeting_views: MeetingViewOptions,
}

/// Bit set of meeting UI elements to hide (`MeetingViewsOptions`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MeetingViewOptions(u32);

impl MeetingViewOptions {
    pub const NONE: Self = Self(0);
    pub const NO_BUTTON_SHARE: Self = Self(1 << 1);
    pub const NO_BUTTON_VIDEO: Self = Self(1 << 2);
    pub const NO_BUTTON_AUDIO: Self = Self(1 << 3);
    pub const NO_BUTTON_PARTICIPANTS: Self = Self(1 << 4);
    pub const NO_BUTTON_MORE: Self = Self(1 << 5);
    pub const NO_TEXT_MEETING_ID: Self = Self(1 << 6);
    pub const NO_TEXT_PASSWORD: Self = Self(1 << 7);
    pub const NO_BUTTON_LEAVE: Self = Self(1 << 8);
    pub const NO_BUTTON_SWITCH_CAMERA: Self = Self(1 << 9);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for MeetingViewOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Receives the outcome of `ZoomSdk::initialize`.
pub trait InitializeListener: Send + Sync {
    fn on_initialize_result(&self, error_code: i32, internal_error_code: i32);
    fn on_auth_identity_expired(&self);
}

/// Receives meeting service status transitions.
pub trait MeetingServiceListener: Send + Sync {
    fn on_meeting_status_changed(
        &self,
        status: MeetingStatus,
        error_code: i32,
        internal_error_code: i32,
    );
}

/// The subset of the vendor SDK the adapter drives.
///
/// Methods returning `i32` yield the SDK's immediate `MeetingError` code.
/// `Err` means the call never reached the SDK.
pub trait ZoomSdk: Send + Sync {
    /// Must be called on the UI thread.
    fn initialize(
        &self,
        credentials: &SdkCredentials,
        listener: Arc<dyn InitializeListener>,
    ) -> Result<(), DispatchError>;

    fn is_initialized(&self) -> bool;

    fn meeting_status(&self) -> MeetingStatus;

    /// Numeric id of the current session, 0 when none.
    fn current_meeting_number(&self) -> u64;

    /// Brings the running meeting UI back to the foreground.
    fn return_to_meeting(&self) -> Result<(), DispatchError>;

    fn start_meeting(
        &self,
        params: &StartMeetingParams,
        options: &StartMeetingOptions,
    ) -> Result<i32, DispatchError>;

    fn join_meeting(
        &self,
        params: &JoinMeetingParams,
        options: &JoinMeetingOptions,
    ) -> Result<i32, DispatchError>;

    fn set_auto_connect_voip_when_join(&self, enabled: bool) -> Result<(), DispatchError>;

    fn add_meeting_listener(
        &self,
        listener: Arc<dyn MeetingServiceListener>,
    ) -> Result<(), DispatchError>;

    fn remove_meeting_listener(
        &self,
        listener: &Arc<dyn MeetingServiceListener>,
    ) -> Result<(), DispatchError>;
}

pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Host main-thread executor. The vendor SDK requires `initialize` to
/// originate from the UI thread.
pub trait UiThread: Send + Sync {
    fn run_on_ui_thread(&self, task: UiTask) -> Result<(), DispatchError>;
}
