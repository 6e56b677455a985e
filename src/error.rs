use thiserror::Error;

/// Why a model response could not be turned into JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// No `{ ... }` span anywhere in the text
    NoJsonPattern,
    /// A brace span was found but it is not valid JSON
    InvalidJson,
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MalformedReason::NoJsonPattern => "no JSON pattern found in response",
            MalformedReason::InvalidJson => "could not extract valid JSON from response",
        };
        write!(f, "{}", s)
    }
}

/// Everything that can go wrong while analyzing a food image.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    #[error("Invalid image input: {0}")]
    Input(String),

    #[error("Image file not found: {0}")]
    NotFound(String),

    #[error("Failed to read image {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("API key rejected by the model service: {0}")]
    Authentication(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(MalformedReason),

    #[error("Model response is missing required field(s): {}", .0.join(", "))]
    MissingField(Vec<String>),

    #[error("Model service request failed: {0}")]
    Transport(String),
}

impl AnalysisError {
    pub fn missing(field: &str) -> Self {
        AnalysisError::MissingField(vec![field.to_string()])
    }

    /// Message suitable for showing to the person who submitted the photo.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::Authentication(_) => {
                "The AI service rejected the API key. Check that a valid API key is configured."
                    .to_string()
            }
            AnalysisError::NotFound(_) | AnalysisError::Read { .. } | AnalysisError::Input(_) => {
                "The image could not be accessed. Make sure the file exists and is readable."
                    .to_string()
            }
            AnalysisError::MalformedResponse(_) | AnalysisError::MissingField(_) => {
                "The food analysis failed: the AI response could not be understood. Try another photo."
                    .to_string()
            }
            AnalysisError::Transport(msg) => classify_transport_message(msg),
        }
    }
}

// Providers sometimes report credential problems as generic failures.
fn classify_transport_message(msg: &str) -> String {
    let lower = msg.to_lowercase();
    if lower.contains("api key") {
        "The AI service rejected the API key. Check that a valid API key is configured."
            .to_string()
    } else if lower.contains("no such file") || lower.contains("file not found") {
        "The image could not be accessed. Make sure the file exists and is readable.".to_string()
    } else if lower.contains("json") {
        "The food analysis failed: the AI response could not be understood. Try another photo."
            .to_string()
    } else {
        format!("Failed to analyze the image: {}", msg)
    }
}

/// Whether a failure should consume a retry attempt.
pub trait Retryable {
    fn is_retryable(&self) -> bool;

    /// Structural failures (bad or incomplete JSON) as opposed to transport failures.
    fn is_structural(&self) -> bool {
        false
    }
}

impl Retryable for AnalysisError {
    fn is_retryable(&self) -> bool {
        match self {
            AnalysisError::Input(_) | AnalysisError::NotFound(_) | AnalysisError::Read { .. } => {
                false
            }
            AnalysisError::Authentication(_)
            | AnalysisError::MalformedResponse(_)
            | AnalysisError::MissingField(_)
            | AnalysisError::Transport(_) => true,
        }
    }

    fn is_structural(&self) -> bool {
        matches!(
            self,
            AnalysisError::MalformedResponse(_) | AnalysisError::MissingField(_)
        )
    }
}
