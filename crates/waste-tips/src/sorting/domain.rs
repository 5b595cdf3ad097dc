use serde::{Deserialize, Serialize};

use super::localization::ErrorKind;

/// Photo uploaded with a sorting request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    /// `Content-Type` of the multipart file part as sent by the client.
    pub declared_content_type: Option<String>,
    pub file_name: Option<String>,
}

/// Raw form input for one sorting call, before language normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortingRequest {
    pub postal_code: String,
    pub verification_token: String,
    pub language_code: String,
    pub image: Option<ImageUpload>,
}

/// Terminal state of the pipeline for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortingOutcome {
    Sorted {
        html: String,
    },
    Rejected {
        kind: ErrorKind,
        /// Normalized language the message was rendered in.
        language: &'static str,
        message: String,
    },
}

impl SortingOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SortingOutcome::Sorted { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            SortingOutcome::Sorted { .. } => None,
            SortingOutcome::Rejected { kind, .. } => Some(*kind),
        }
    }

    pub fn into_result(self) -> SortingResult {
        match self {
            SortingOutcome::Sorted { html } => SortingResult {
                success: true,
                html: Some(html),
                error: None,
            },
            SortingOutcome::Rejected { message, .. } => SortingResult::failure(message),
        }
    }
}

/// Wire shape returned to the browser: `{success, html?, error?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortingResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SortingResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            html: None,
            error: Some(message.into()),
        }
    }
}
