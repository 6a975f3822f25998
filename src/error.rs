//! Defines the client error type and the conversion from transport errors.
//!
//! Errors carrying a backend-provided message are produced in one place, the
//! response adapter in [crate::api], so call sites never inspect response
//! bodies themselves.

/// The errors that may occur in the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The backend rejected the credentials or the bearer token (HTTP 401).
    ///
    /// Carries the backend's message, e.g. "Invalid credentials".
    #[error("{0}")]
    Unauthorized(String),

    /// The saved session could not be verified against the backend.
    ///
    /// The only remedy is logging in again, so the session manager demotes
    /// to anonymous instead of surfacing the underlying cause.
    #[error("the saved session is no longer valid, log in again")]
    StaleSession,

    /// The backend rejected the submitted data (HTTP 4xx other than 401).
    ///
    /// Carries the backend's human-readable `detail` message verbatim, e.g.
    /// "Email already registered" or "Category type mismatch".
    #[error("{0}")]
    Rejected(String),

    /// The request could not complete, e.g. the backend is unreachable.
    #[error("could not reach the server: {0}")]
    Network(String),

    /// The backend answered with a body or status the client cannot
    /// interpret.
    #[error("the server returned an unexpected response: {0}")]
    UnexpectedResponse(String),

    /// An empty string was used where a name is required.
    ///
    /// The inner string names the offending field, e.g. "category name".
    #[error("an empty string is not a valid {0}")]
    EmptyName(&'static str),

    /// A zero or negative amount was used for a money field that must be
    /// positive.
    #[error("amounts must be greater than zero")]
    AmountNotPositive,

    /// A string could not be parsed as a decimal amount.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// A string could not be parsed as an email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// A string could not be parsed as a calendar date.
    #[error("\"{0}\" is not a date in YYYY-MM-DD format")]
    InvalidDate(String),

    /// A string could not be parsed as a year-month.
    #[error("\"{0}\" is not a month in YYYY-MM format")]
    InvalidMonth(String),

    /// The configured base URL could not be parsed.
    #[error("\"{0}\" is not a valid base URL")]
    InvalidBaseUrl(String),
}

impl Error {
    /// The backend-provided message, if this error carries one.
    ///
    /// Screens surface this verbatim when present and fall back to a generic
    /// per-action message otherwise.
    pub fn backend_detail(&self) -> Option<&str> {
        match self {
            Error::Unauthorized(message) | Error::Rejected(message) => Some(message),
            _ => None,
        }
    }

    /// The message to show the user for a failed action.
    pub fn surface_message(&self, fallback: &str) -> String {
        match self.backend_detail() {
            Some(detail) => detail.to_owned(),
            None => fallback.to_owned(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Error::UnexpectedResponse(value.to_string())
        } else {
            Error::Network(value.to_string())
        }
    }
}

#[cfg(test)]
mod surface_message_tests {
    use super::Error;

    #[test]
    fn backend_detail_is_surfaced_verbatim() {
        let error = Error::Rejected("Email already registered".to_owned());

        let message = error.surface_message("Failed to register.");

        assert_eq!(message, "Email already registered");
    }

    #[test]
    fn fallback_is_used_when_no_detail_is_available() {
        let error = Error::Network("connection refused".to_owned());

        let message = error.surface_message("Failed to create transaction.");

        assert_eq!(message, "Failed to create transaction.");
    }
}
