use serde::Serialize;
use std::fmt;

pub const NO_FILE_SELECTED_MESSAGE: &str = "No file selected.";
pub const MATERIALIZE_FAILED_MESSAGE: &str = "Failed to process selected file or file is empty.";
pub const UNKNOWN_API_ERROR_MESSAGE: &str = "Prediction failed: Unknown API error.";

/// Observable state of the prediction workflow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowState {
    #[default]
    Idle,
    Processing,
    Success {
        predicted_language: String,
        file_name: String,
    },
    Error {
        message: String,
    },
}

impl WorkflowState {
    pub fn success(predicted_language: impl Into<String>, file_name: impl Into<String>) -> Self {
        WorkflowState::Success {
            predicted_language: predicted_language.into(),
            file_name: file_name.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        WorkflowState::Error {
            message: message.into(),
        }
    }

    /// Success or Error; only an explicit reset leaves these.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Success { .. } | WorkflowState::Error { .. })
    }

    /// States in which a presentation layer offers the file picker
    pub fn accepts_selection(&self) -> bool {
        matches!(self, WorkflowState::Idle | WorkflowState::Error { .. })
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowState::Idle => write!(f, "Select an MP3 audio file to predict its language"),
            WorkflowState::Processing => write!(f, "Identifying language..."),
            WorkflowState::Success {
                predicted_language,
                file_name,
            } => write!(f, "Predicted language: {} (file: {})", predicted_language, file_name),
            WorkflowState::Error { message } => write!(f, "Error: {}", message),
        }
    }
}
