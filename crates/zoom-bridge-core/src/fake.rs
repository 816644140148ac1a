//! In-memory SDK and UI executors for tests.

use std::sync::{Arc, Mutex};

use crate::sdk::{
    DispatchError, InitializeListener, JoinMeetingOptions, JoinMeetingParams,
    MEETING_ERROR_SUCCESS, MeetingServiceListener, MeetingStatus, SdkCredentials,
    StartMeetingOptions, StartMeetingParams, UiTask, UiThread, ZOOM_ERROR_SUCCESS, ZoomSdk,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkCall {
    Initialize(SdkCredentials),
    ReturnToMeeting,
    StartMeeting(StartMeetingParams),
    JoinMeeting(JoinMeetingParams, JoinMeetingOptions),
    AutoConnectVoip(bool),
    AddMeetingListener,
    RemoveMeetingListener,
}

struct FakeState {
    initialized: bool,
    status: MeetingStatus,
    current_meeting: u64,
    start_result: Result<i32, DispatchError>,
    join_result: Result<i32, DispatchError>,
    initialize_error: Option<DispatchError>,
    listener_error: Option<DispatchError>,
    calls: Vec<SdkCall>,
    init_listener: Option<Arc<dyn InitializeListener>>,
    meeting_listeners: Vec<Arc<dyn MeetingServiceListener>>,
    listener_added_hook: Option<Arc<dyn Fn() + Send + Sync>>,
}

pub struct FakeSdk {
    state: Mutex<FakeState>,
}

impl FakeSdk {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                initialized: false,
                status: MeetingStatus::Idle,
                current_meeting: 0,
                start_result: Ok(MEETING_ERROR_SUCCESS),
                join_result: Ok(MEETING_ERROR_SUCCESS),
                initialize_error: None,
                listener_error: None,
                calls: Vec::new(),
                init_listener: None,
                meeting_listeners: Vec::new(),
                listener_added_hook: None,
            }),
        })
    }

    pub fn calls(&self) -> Vec<SdkCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mark_initialized(&self) {
        self.state.lock().unwrap().initialized = true;
    }

    pub fn set_start_result(&self, result: Result<i32, DispatchError>) {
        self.state.lock().unwrap().start_result = result;
    }

    pub fn set_join_result(&self, result: Result<i32, DispatchError>) {
        self.state.lock().unwrap().join_result = result;
    }

    pub fn fail_initialize(&self, error: DispatchError) {
        self.state.lock().unwrap().initialize_error = Some(error);
    }

    pub fn fail_listener_registration(&self, error: DispatchError) {
        self.state.lock().unwrap().listener_error = Some(error);
    }

    pub fn set_active_meeting(&self, status: MeetingStatus, meeting_no: u64) {
        let mut state = self.state.lock().unwrap();
        state.status = status;
        state.current_meeting = meeting_no;
    }

    /// Run `hook` right after a meeting listener registers, with no fake lock held.
    pub fn on_listener_added(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.state.lock().unwrap().listener_added_hook = Some(Arc::new(hook));
    }

    pub fn meeting_listener_count(&self) -> usize {
        self.state.lock().unwrap().meeting_listeners.len()
    }

    /// Deliver the initialize callback like the SDK would.
    pub fn complete_initialize(&self, error_code: i32, internal_error_code: i32) {
        let listener = {
            let mut state = self.state.lock().unwrap();
            state.initialized = error_code == ZOOM_ERROR_SUCCESS;
            state.init_listener.clone()
        };
        if let Some(listener) = listener {
            listener.on_initialize_result(error_code, internal_error_code);
        }
    }

    /// Deliver the auth-identity-expired callback.
    pub fn expire_auth(&self) {
        let listener = self.state.lock().unwrap().init_listener.clone();
        if let Some(listener) = listener {
            listener.on_auth_identity_expired();
        }
    }

    /// Move to `status` and notify every registered meeting listener.
    pub fn report_status(&self, status: MeetingStatus, error_code: i32, internal_error_code: i32) {
        let listeners = {
            let mut state = self.state.lock().unwrap();
            state.status = status;
            state.meeting_listeners.clone()
        };
        for listener in listeners {
            listener.on_meeting_status_changed(status, error_code, internal_error_code);
        }
    }

    fn record(&self, call: SdkCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl ZoomSdk for FakeSdk {
    fn initialize(
        &self,
        credentials: &SdkCredentials,
        listener: Arc<dyn InitializeListener>,
    ) -> Result<(), DispatchError> {
        self.record(SdkCall::Initialize(credentials.clone()));
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.initialize_error.take() {
            return Err(err);
        }
        state.init_listener = Some(listener);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.state.lock().unwrap().initialized
    }

    fn meeting_status(&self) -> MeetingStatus {
        self.state.lock().unwrap().status
    }

    fn current_meeting_number(&self) -> u64 {
        self.state.lock().unwrap().current_meeting
    }

    fn return_to_meeting(&self) -> Result<(), DispatchError> {
        self.record(SdkCall::ReturnToMeeting);
        Ok(())
    }

    fn start_meeting(
        &self,
        params: &StartMeetingParams,
        _options: &StartMeetingOptions,
    ) -> Result<i32, DispatchError> {
        self.record(SdkCall::StartMeeting(params.clone()));
        self.state.lock().unwrap().start_result.clone()
    }

    fn join_meeting(
        &self,
        params: &JoinMeetingParams,
        options: &JoinMeetingOptions,
    ) -> Result<i32, DispatchError> {
        self.record(SdkCall::JoinMeeting(params.clone(), options.clone()));
        self.state.lock().unwrap().join_result.clone()
    }

    fn set_auto_connect_voip_when_join(&self, enabled: bool) -> Result<(), DispatchError> {
        self.record(SdkCall::AutoConnectVoip(enabled));
        Ok(())
    }

    fn add_meeting_listener(
        &self,
        listener: Arc<dyn MeetingServiceListener>,
    ) -> Result<(), DispatchError> {
        self.record(SdkCall::AddMeetingListener);
        let hook = {
            let mut state = self.state.lock().unwrap();
            if let Some(err) = state.listener_error.take() {
                return Err(err);
            }
            state.meeting_listeners.push(listener);
            state.listener_added_hook.clone()
        };
        if let Some(hook) = hook {
            hook();
        }
        Ok(())
    }

    fn remove_meeting_listener(
        &self,
        listener: &Arc<dyn MeetingServiceListener>,
    ) -> Result<(), DispatchError> {
        self.record(SdkCall::RemoveMeetingListener);
        self.state
            .lock()
            .unwrap()
            .meeting_listeners
            .retain(|l| !std::ptr::addr_eq(Arc::as_ptr(l), Arc::as_ptr(listener)));
        Ok(())
    }
}

/// Runs UI tasks immediately on the calling thread.
pub struct InlineUi;

impl UiThread for InlineUi {
    fn run_on_ui_thread(&self, task: UiTask) -> Result<(), DispatchError> {
        task();
        Ok(())
    }
}

/// Queues UI tasks until the test drains them.
#[derive(Default)]
pub struct QueuedUi {
    tasks: Mutex<Vec<UiTask>>,
}

impl QueuedUi {
    pub fn run_all(&self) {
        let tasks: Vec<UiTask> = self.tasks.lock().unwrap().drain(..).collect();
        for task in tasks {
            task();
        }
    }

    pub fn queued(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }
}

impl UiThread for QueuedUi {
    fn run_on_ui_thread(&self, task: UiTask) -> Result<(), DispatchError> {
        self.tasks.lock().unwrap().push(task);
        Ok(())
    }
}

/// Host without a current activity.
pub struct DetachedUi;

impl UiThread for DetachedUi {
    fn run_on_ui_thread(&self, _task: UiTask) -> Result<(), DispatchError> {
        Err(DispatchError::NoActivity)
    }
}
