//! Errors that can stop (or partially degrade) an agenda run

use thiserror::Error;

/// Every failure an agenda run can report
#[derive(Debug, Error)]
pub enum AgendaError {
    /// Required settings are missing or unreadable. Raised before any network call.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The CalDAV server rejected the credentials
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The CalDAV server could not be reached, or did not answer in time
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// The CalDAV server answered something we could not make sense of
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Not a single calendar could be queried
    #[error("No calendars available: {0}")]
    NoCalendars(String),

    /// The agenda could not be handed to the mail server
    #[error("Delivery error: {0}")]
    Delivery(String),
}

impl AgendaError {
    /// Classify an HTTP-level failure coming from `reqwest`
    pub fn from_http(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN => {
                AgendaError::Authentication(err.to_string())
            },
            _ => AgendaError::Connectivity(err.to_string()),
        }
    }
}

impl From<lettre::error::Error> for AgendaError {
    fn from(err: lettre::error::Error) -> Self {
        AgendaError::Delivery(format!("unable to build the message: {}", err))
    }
}

impl From<lettre::address::AddressError> for AgendaError {
    fn from(err: lettre::address::AddressError) -> Self {
        AgendaError::Delivery(format!("invalid mail address: {}", err))
    }
}

impl From<lettre::transport::smtp::Error> for AgendaError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        AgendaError::Delivery(err.to_string())
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_messages_name_the_kind() {
        let err = AgendaError::Configuration("missing FASTMAIL_USERNAME".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing FASTMAIL_USERNAME");

        let err = AgendaError::NoCalendars("every calendar failed".to_string());
        assert!(err.to_string().starts_with("No calendars available"));
    }
}
