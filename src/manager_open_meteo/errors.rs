use std::fmt;

#[derive(Debug)]
pub enum OpenMeteoError {
    OpenMeteo(String),
    Document(String),
}

impl fmt::Display for OpenMeteoError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OpenMeteoError::OpenMeteo(e) => write!(f, "OpenMeteoError::OpenMeteo: {}", e),
            OpenMeteoError::Document(e) => write!(f, "OpenMeteoError::Document: {}", e),
        }
    }
}
impl From<reqwest::Error> for OpenMeteoError {
    fn from(e: reqwest::Error) -> Self {
        OpenMeteoError::OpenMeteo(e.to_string())
    }
}
impl From<serde_json::Error> for OpenMeteoError {
    fn from(e: serde_json::Error) -> Self {
        OpenMeteoError::Document(e.to_string())
    }
}
