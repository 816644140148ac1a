use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("unexpected exception: {0}")]
    Unexpected(String),
    #[error("{message}")]
    Start {
        message: String,
        error_code: Option<i32>,
    },
    #[error("{message}")]
    Join {
        message: String,
        error_code: Option<i32>,
    },
    #[error("Error: {error_code}, internalErrorCode={internal_error_code}")]
    Initialization {
        error_code: i32,
        internal_error_code: i32,
    },
    #[error("initialization already in progress")]
    InitializationInProgress,
    #[error("Error: {error_code}, internalErrorCode={internal_error_code}")]
    Meeting {
        error_code: i32,
        internal_error_code: i32,
    },
}

impl BridgeError {
    /// Error kind reported to the host runtime alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unexpected(_) => "ERR_UNEXPECTED_EXCEPTION",
            Self::Start { .. } => "ERR_ZOOM_START",
            Self::Join { .. } => "ERR_ZOOM_JOIN",
            Self::Initialization { .. } | Self::InitializationInProgress => {
                "ERR_ZOOM_INITIALIZATION"
            }
            Self::Meeting { .. } => "ERR_ZOOM_MEETING",
        }
    }

    pub fn error_code(&self) -> Option<i32> {
        match self {
            Self::Start { error_code, .. } | Self::Join { error_code, .. } => *error_code,
            Self::Initialization { error_code, .. } | Self::Meeting { error_code, .. } => {
                Some(*error_code)
            }
            Self::Unexpected(_) | Self::InitializationInProgress => None,
        }
    }

    pub fn internal_error_code(&self) -> Option<i32> {
        match self {
            Self::Initialization {
                internal_error_code,
                ..
            }
            | Self::Meeting {
                internal_error_code,
                ..
            } => Some(*internal_error_code),
            _ => None,
        }
    }

    pub(crate) fn start(message: impl Into<String>) -> Self {
        Self::Start {
            message: message.into(),
            error_code: None,
        }
    }

    pub(crate) fn join(message: impl Into<String>) -> Self {
        Self::Join {
            message: message.into(),
            error_code: None,
        }
    }
}
