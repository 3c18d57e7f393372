use std::fmt;

pub struct NominatimError(pub String);

impl fmt::Display for NominatimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "NominatimError: {}", self.0)
    }
}
impl From<reqwest::Error> for NominatimError {
    fn from(e: reqwest::Error) -> Self { NominatimError(e.to_string()) }
}
impl From<serde_json::Error> for NominatimError {
    fn from(e: serde_json::Error) -> Self { NominatimError(e.to_string()) }
}
