//! UniFFI bindings for zoom-bridge-core.
//!
//! Provides a ZoomBridgeClient object that wraps the core ZoomBridge in a
//! single FFI-safe interface. The native shell
//! implements ZoomSdkDelegate on top of the vendor SDK and forwards the
//! SDK's callbacks back through the client.

use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use zoom_bridge_core::{
    self, PendingResult,
    events::MeetingEvent as CoreMeetingEvent,
    sdk::{
        DispatchError, InitializeListener, JoinMeetingOptions, JoinMeetingParams,
        MeetingServiceListener, MeetingStatus as CoreMeetingStatus, SdkCredentials,
        StartMeetingOptions, StartMeetingParams, UiThread, ZoomSdk,
    },
};

uniffi::include_scaffolding!("zoom_bridge");

// ── Platform log helper ──────────────────────────────────────────────

/// Write a message to logcat on Android, or stderr on other platforms.
fn bridge_log(msg: &str) {
    #[cfg(target_os = "android")]
    {
        use std::ffi::CString;
        unsafe extern "C" {
            fn __android_log_write(prio: i32, tag: *const std::ffi::c_char, text: *const std::ffi::c_char) -> i32;
        }
        let tag = c"RNZoomBridge";
        if let Ok(text) = CString::new(msg) {
            unsafe { __android_log_write(4 /* INFO */, tag.as_ptr(), text.as_ptr()); }
        }
    }
    #[cfg(target_os = "ios")]
    {
        use std::ffi::CString;
        unsafe extern "C" {
            fn syslog(priority: i32, message: *const std::ffi::c_char, ...);
        }
        if let Ok(text) = CString::new(msg) {
            unsafe { syslog(6 /* LOG_INFO */, text.as_ptr()); }
        }
    }
    #[cfg(not(any(target_os = "android", target_os = "ios")))]
    eprintln!("{msg}");
}

// ── Namespace functions ──────────────────────────────────────────────

const DEFAULT_LOG_FILTER: &str = "zoom_bridge_core=debug,zoom_bridge_ffi=debug";

/// Initialize tracing/logging. Call once from the host before creating the client.
fn init_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .try_init();
        if installed.is_err() {
            bridge_log("ZOOM FFI: a tracing subscriber was already installed");
        }
    });
}

fn module_name() -> String {
    zoom_bridge_core::MODULE_NAME.to_string()
}

fn meeting_event_channel() -> String {
    zoom_bridge_core::MEETING_EVENT_CHANNEL.to_string()
}

fn meeting_event_payload(event: MeetingEvent) -> String {
    CoreMeetingEvent::from(event).payload().to_json()
}

// ── FFI-safe type conversions ──────────────────────────────────────────

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

impl From<MeetingStatus> for CoreMeetingStatus {
    fn from(s: MeetingStatus) -> Self {
        match s {
            MeetingStatus::Idle => Self::Idle,
            MeetingStatus::Connecting => Self::Connecting,
            MeetingStatus::WaitingForHost => Self::WaitingForHost,
            MeetingStatus::InMeeting => Self::InMeeting,
            MeetingStatus::Disconnecting => Self::Disconnecting,
            MeetingStatus::Reconnecting => Self::Reconnecting,
            MeetingStatus::Failed => Self::Failed,
            MeetingStatus::InWaitingRoom => Self::InWaitingRoom,
            MeetingStatus::WebinarPromote => Self::WebinarPromote,
            MeetingStatus::WebinarDepromote => Self::WebinarDepromote,
            MeetingStatus::Unknown => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingEvent {
    MeetingStarted,
    MeetingEnded,
}

impl From<CoreMeetingEvent> for MeetingEvent {
    fn from(e: CoreMeetingEvent) -> Self {
        match e {
            CoreMeetingEvent::MeetingStarted => Self::MeetingStarted,
            CoreMeetingEvent::MeetingEnded => Self::MeetingEnded,
        }
    }
}

impl From<MeetingEvent> for CoreMeetingEvent {
    fn from(e: MeetingEvent) -> Self {
        match e {
            MeetingEvent::MeetingStarted => Self::MeetingStarted,
            MeetingEvent::MeetingEnded => Self::MeetingEnded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartMeetingRequest {
    pub display_name: String,
    pub meeting_no: String,
    pub user_id: String,
    pub user_type: i32,
    pub zoom_access_token: String,
    pub zoom_token: String,
}

impl From<&StartMeetingParams> for StartMeetingRequest {
    fn from(p: &StartMeetingParams) -> Self {
        Self {
            display_name: p.display_name.clone(),
            meeting_no: p.meeting_no.clone(),
            user_id: p.user_id.clone(),
            user_type: p.user_type,
            zoom_access_token: p.zoom_access_token.clone(),
            zoom_token: p.zoom_token.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinMeetingRequest {
    pub display_name: String,
    pub meeting_no: String,
    pub password: Option<String>,
    pub no_audio: bool,
    pub no_driving_mode: bool,
    pub no_disconnect_audio: bool,
    pub meeting_views_options: u32,
}

impl JoinMeetingRequest {
    fn new(params: &JoinMeetingParams, options: &JoinMeetingOptions) -> Self {
        Self {
            display_name: params.display_name.clone(),
            meeting_no: params.meeting_no.clone(),
            password: params.password.clone(),
            no_audio: options.no_audio,
            no_driving_mode: options.no_driving_mode,
            no_disconnect_audio: options.no_disconnect_audio,
            meeting_views_options: options.meeting_views.bits(),
        }
    }
}

// ── Error conversion ──────────────────────────────────────────────────

/// Raised when the client itself cannot be built.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Runtime error: {msg}")]
    Runtime { msg: String },
}

/// Failures raised by host-implemented callback interfaces.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("no current activity")]
    NoActivity,
    #[error("meeting service unavailable")]
    NoMeetingService,
    #[error("host call failed: {msg}")]
    CallFailed { msg: String },
}

impl From<uniffi::UnexpectedUniFFICallbackError> for HostError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::CallFailed { msg: e.reason }
    }
}

impl From<HostError> for DispatchError {
    fn from(e: HostError) -> Self {
        match e {
            HostError::NoActivity => Self::NoActivity,
            HostError::NoMeetingService => Self::NoMeetingService,
            HostError::CallFailed { msg } => Self::Sdk(msg),
        }
    }
}

// ── Callback interfaces ───────────────────────────────────────────────

pub trait ZoomEventListener: Send + Sync {
    fn on_event(&self, event: MeetingEvent);
}

/// Host promise, settled exactly once per request.
pub trait BridgePromise: Send + Sync {
    fn resolve(&self, value: String);
    fn reject(
        &self,
        code: String,
        message: String,
        error_code: Option<i32>,
        internal_error_code: Option<i32>,
    );
}

pub trait MainThreadExecutor: Send + Sync {
    fn post(&self, task: Arc<UiTask>) -> Result<(), HostError>;
}

/// Vendor SDK calls, implemented by the native shell.
pub trait ZoomSdkDelegate: Send + Sync {
    fn initialize(&self, app_key: String, app_secret: String, web_domain: String) -> Result<(), HostError>;
    fn is_initialized(&self) -> bool;
    fn meeting_status(&self) -> MeetingStatus;
    fn current_meeting_number(&self) -> u64;
    fn return_to_meeting(&self) -> Result<(), HostError>;
    fn start_meeting(&self, request: StartMeetingRequest) -> Result<i32, HostError>;
    fn join_meeting(&self, request: JoinMeetingRequest) -> Result<i32, HostError>;
    fn set_auto_connect_voip_when_join(&self, enabled: bool) -> Result<(), HostError>;
    /// Start or stop forwarding `onMeetingStatusChanged` to the client.
    fn set_meeting_listener_registered(&self, registered: bool) -> Result<(), HostError>;
}

// ── Bridge listener: core event → FFI callback ────────────────────────

struct BridgeListener {
    ffi_listener: Arc<dyn ZoomEventListener>,
}

impl zoom_bridge_core::MeetingEventListener for BridgeListener {
    fn on_event(&self, event: CoreMeetingEvent) {
        self.ffi_listener.on_event(event.into());
    }
}

// ── UI task handed to the host main thread ────────────────────────────

pub struct UiTask {
    task: StdMutex<Option<zoom_bridge_core::sdk::UiTask>>,
}

impl UiTask {
    fn new(task: zoom_bridge_core::sdk::UiTask) -> Self {
        Self {
            task: StdMutex::new(Some(task)),
        }
    }

    /// Runs the task. Later calls do nothing.
    pub fn run(&self) {
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        match task {
            Some(task) => task(),
            None => tracing::warn!("ui task already ran"),
        }
    }
}

struct HostMainThread {
    executor: Box<dyn MainThreadExecutor>,
}

impl UiThread for HostMainThread {
    fn run_on_ui_thread(&self, task: zoom_bridge_core::sdk::UiTask) -> Result<(), DispatchError> {
        self.executor
            .post(Arc::new(UiTask::new(task)))
            .map_err(DispatchError::from)
    }
}

// ── Host SDK: delegate calls out, route SDK callbacks in ──────────────

struct HostSdk {
    delegate: Box<dyn ZoomSdkDelegate>,
    init_listener: StdMutex<Option<Arc<dyn InitializeListener>>>,
    meeting_listeners: StdMutex<Vec<Arc<dyn MeetingServiceListener>>>,
}

impl HostSdk {
    fn new(delegate: Box<dyn ZoomSdkDelegate>) -> Self {
        Self {
            delegate,
            init_listener: StdMutex::new(None),
            meeting_listeners: StdMutex::new(Vec::new()),
        }
    }

    fn init_listener(&self) -> Option<Arc<dyn InitializeListener>> {
        self.init_listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<Arc<dyn MeetingServiceListener>>> {
        self.meeting_listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver_initialize_result(&self, error_code: i32, internal_error_code: i32) {
        match self.init_listener() {
            Some(listener) => listener.on_initialize_result(error_code, internal_error_code),
            None => tracing::warn!(error_code, "initialize result without a pending initialize"),
        }
    }

    fn deliver_auth_identity_expired(&self) {
        if let Some(listener) = self.init_listener() {
            listener.on_auth_identity_expired();
        }
    }

    fn deliver_meeting_status(&self, status: CoreMeetingStatus, error_code: i32, internal_error_code: i32) {
        let listeners = self.listeners().clone();
        if listeners.is_empty() {
            tracing::debug!(?status, "meeting status with no registered listener");
        }
        for listener in listeners {
            listener.on_meeting_status_changed(status, error_code, internal_error_code);
        }
    }
}

impl ZoomSdk for HostSdk {
    fn initialize(
        &self,
        credentials: &SdkCredentials,
        listener: Arc<dyn InitializeListener>,
    ) -> Result<(), DispatchError> {
        *self.init_listener.lock().unwrap_or_else(PoisonError::into_inner) = Some(listener);
        self.delegate
            .initialize(
                credentials.app_key.clone(),
                credentials.app_secret.clone(),
                credentials.web_domain.clone(),
            )
            .map_err(DispatchError::from)
    }

    fn is_initialized(&self) -> bool {
        self.delegate.is_initialized()
    }

    fn meeting_status(&self) -> CoreMeetingStatus {
        self.delegate.meeting_status().into()
    }

    fn current_meeting_number(&self) -> u64 {
        self.delegate.current_meeting_number()
    }

    fn return_to_meeting(&self) -> Result<(), DispatchError> {
        self.delegate.return_to_meeting().map_err(DispatchError::from)
    }

    fn start_meeting(
        &self,
        params: &StartMeetingParams,
        _options: &StartMeetingOptions,
    ) -> Result<i32, DispatchError> {
        self.delegate
            .start_meeting(params.into())
            .map_err(DispatchError::from)
    }

    fn join_meeting(
        &self,
        params: &JoinMeetingParams,
        options: &JoinMeetingOptions,
    ) -> Result<i32, DispatchError> {
        self.delegate
            .join_meeting(JoinMeetingRequest::new(params, options))
            .map_err(DispatchError::from)
    }

    fn set_auto_connect_voip_when_join(&self, enabled: bool) -> Result<(), DispatchError> {
        self.delegate
            .set_auto_connect_voip_when_join(enabled)
            .map_err(DispatchError::from)
    }

    fn add_meeting_listener(
        &self,
        listener: Arc<dyn MeetingServiceListener>,
    ) -> Result<(), DispatchError> {
        // Listed first: the host may report a status from inside registration.
        let first = {
            let mut listeners = self.listeners();
            listeners.push(listener.clone());
            listeners.len() == 1
        };
        if !first {
            return Ok(());
        }
        if let Err(e) = self.delegate.set_meeting_listener_registered(true) {
            self.listeners().retain(|l| !same_listener(l, &listener));
            return Err(e.into());
        }
        Ok(())
    }

    fn remove_meeting_listener(
        &self,
        listener: &Arc<dyn MeetingServiceListener>,
    ) -> Result<(), DispatchError> {
        let last = {
            let mut listeners = self.listeners();
            listeners.retain(|l| !same_listener(l, listener));
            listeners.is_empty()
        };
        if last {
            self.delegate.set_meeting_listener_registered(false)?;
        }
        Ok(())
    }
}

fn same_listener(a: &Arc<dyn MeetingServiceListener>, b: &Arc<dyn MeetingServiceListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

// ── ZoomBridgeClient: main FFI object ─────────────────────────────────

pub struct ZoomBridgeClient {
    bridge: zoom_bridge_core::ZoomBridge,
    sdk: Arc<HostSdk>,
    rt: tokio::runtime::Runtime,
}

impl ZoomBridgeClient {
    pub fn new(
        sdk: Box<dyn ZoomSdkDelegate>,
        main_thread: Box<dyn MainThreadExecutor>,
    ) -> Result<Self, BridgeError> {
        bridge_log("ZOOM FFI: ZoomBridgeClient::new() called");
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("zoom-bridge")
            .enable_all()
            .build()
            .map_err(|e| BridgeError::Runtime {
                msg: format!("failed to create tokio runtime: {e}"),
            })?;
        let sdk = Arc::new(HostSdk::new(sdk));
        let bridge = zoom_bridge_core::ZoomBridge::new(
            sdk.clone(),
            Arc::new(HostMainThread { executor: main_thread }),
        );
        bridge_log("ZOOM FFI: ZoomBridgeClient::new() completed");
        Ok(Self { bridge, sdk, rt })
    }

    pub fn initialize(
        &self,
        app_key: String,
        app_secret: String,
        web_domain: String,
        promise: Box<dyn BridgePromise>,
    ) {
        let credentials = SdkCredentials {
            app_key,
            app_secret,
            web_domain,
        };
        let pending = self.guarded("initialize", || self.bridge.initialize(credentials));
        self.settle(pending, promise);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn start_meeting(
        &self,
        display_name: String,
        meeting_no: String,
        user_id: String,
        user_type: i32,
        zoom_access_token: String,
        zoom_token: String,
        promise: Box<dyn BridgePromise>,
    ) {
        let params = StartMeetingParams {
            display_name,
            meeting_no,
            user_id,
            user_type,
            zoom_access_token,
            zoom_token,
        };
        let pending = self.guarded("startMeeting", || self.bridge.start_meeting(params));
        self.settle(pending, promise);
    }

    pub fn join_meeting(&self, display_name: String, meeting_no: String, promise: Box<dyn BridgePromise>) {
        let pending = self.guarded("joinMeeting", || {
            self.bridge.join_meeting(display_name, meeting_no)
        });
        self.settle(pending, promise);
    }

    pub fn join_meeting_with_password(
        &self,
        display_name: String,
        meeting_no: String,
        password: String,
        promise: Box<dyn BridgePromise>,
    ) {
        let pending = self.guarded("joinMeetingWithPassword", || {
            self.bridge
                .join_meeting_with_password(display_name, meeting_no, password)
        });
        self.settle(pending, promise);
    }

    pub fn on_initialize_result(&self, error_code: i32, internal_error_code: i32) {
        bridge_log(&format!(
            "ZOOM FFI: onZoomSDKInitializeResult, errorCode={error_code}, internalErrorCode={internal_error_code}"
        ));
        self.sdk.deliver_initialize_result(error_code, internal_error_code);
    }

    pub fn on_meeting_status_changed(&self, status: MeetingStatus, error_code: i32, internal_error_code: i32) {
        bridge_log(&format!(
            "ZOOM FFI: onMeetingStatusChanged, meetingStatus={status:?}, errorCode={error_code}, internalErrorCode={internal_error_code}"
        ));
        self.sdk
            .deliver_meeting_status(status.into(), error_code, internal_error_code);
    }

    pub fn on_auth_identity_expired(&self) {
        self.sdk.deliver_auth_identity_expired();
    }

    pub fn on_host_resume(&self) {
        self.bridge.on_host_lifecycle(zoom_bridge_core::HostLifecycle::Resume);
    }

    pub fn on_host_pause(&self) {
        self.bridge.on_host_lifecycle(zoom_bridge_core::HostLifecycle::Pause);
    }

    pub fn on_host_destroy(&self) {
        self.bridge.on_host_lifecycle(zoom_bridge_core::HostLifecycle::Destroy);
    }

    pub fn shutdown(&self) {
        bridge_log("ZOOM FFI: shutdown()");
        self.bridge.shutdown();
    }

    pub fn add_listener(&self, listener: Box<dyn ZoomEventListener>) {
        let bridge = Arc::new(BridgeListener {
            ffi_listener: Arc::from(listener),
        });
        self.bridge.add_listener(bridge);
    }

    pub fn is_initialized(&self) -> bool {
        self.bridge.init_state() == zoom_bridge_core::InitState::Initialized
    }

    /// Run a request, keeping panics from crossing the FFI boundary.
    fn guarded(&self, label: &str, request: impl FnOnce() -> PendingResult) -> PendingResult {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(request)) {
            Ok(pending) => pending,
            Err(panic_info) => {
                let msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };
                bridge_log(&format!("ZOOM FFI: {label}() PANIC caught: {msg}"));
                PendingResult::rejected(zoom_bridge_core::BridgeError::Unexpected(format!(
                    "panic in {label}: {msg}"
                )))
            }
        }
    }

    /// Settle the host promise once the request completes.
    fn settle(&self, pending: PendingResult, promise: Box<dyn BridgePromise>) {
        self.rt.spawn(async move {
            match pending.await {
                Ok(value) => promise.resolve(value),
                Err(e) => {
                    let code = e.code().to_string();
                    let (error_code, internal_error_code) = (e.error_code(), e.internal_error_code());
                    let message = e.to_string();
                    tracing::error!("{code}: {message}");
                    promise.reject(code, message, error_code, internal_error_code);
                }
            }
        });
    }
}
