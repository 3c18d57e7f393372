use std::fmt;

/// Reasons an advisory could not be built from a forecast
///
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    /// The series is absent, or its timestamps or temperatures are empty
    IncompleteData,
    /// The series is present but could not be processed, e.g. a malformed timestamp
    ProcessingError(String),
}

impl FormatError {
    /// The fixed message a user gets instead of an advisory
    pub fn user_message(&self) -> &'static str {
        match self {
            FormatError::IncompleteData => "❌ Incomplete weather data received.",
            FormatError::ProcessingError(_) => "❌ Error processing weather data. Please try again.",
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FormatError::IncompleteData => write!(f, "FormatError::IncompleteData"),
            FormatError::ProcessingError(e) => write!(f, "FormatError::ProcessingError: {}", e),
        }
    }
}
