//! This file defines a user of the application and its supporting types.

use std::fmt::Display;

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};

use crate::Error;

/// A newtype wrapper for integer user IDs.
/// This helps disambiguate user IDs from the other ID types, leading to
/// better compile time errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    /// Create a user ID from its integer form.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The integer form of the ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// Users are created through [crate::Session::register]; the client never
/// modifies a profile, it only displays what `GET /auth/me` returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the backend database.
    pub id: UserId,
    /// The user's display name.
    pub full_name: String,
    /// The email address the user signs in with.
    pub email: String,
    /// Whether the user accepted the terms and conditions at registration.
    pub agreed_terms: bool,
}

/// The payload for registering a new account.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    /// The user's display name.
    pub full_name: String,
    /// The email address the user will sign in with.
    pub email: String,
    /// The password in plain text. Hashing is the backend's job.
    pub password: String,
    /// Whether the user accepted the terms and conditions.
    pub agreed_terms: bool,
}

impl NewUser {
    /// Create a registration payload.
    ///
    /// # Errors
    ///
    /// Returns an error if `full_name` is empty or `email` is not a valid
    /// email address. The backend performs its own validation on top, e.g.
    /// rejecting duplicate emails and unaccepted terms.
    pub fn new(
        full_name: &str,
        email: &str,
        password: &str,
        agreed_terms: bool,
    ) -> Result<Self, Error> {
        if full_name.trim().is_empty() {
            return Err(Error::EmptyName("full name"));
        }

        if email.parse::<EmailAddress>().is_err() {
            return Err(Error::InvalidEmail(email.to_owned()));
        }

        Ok(Self {
            full_name: full_name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
            agreed_terms,
        })
    }
}

#[cfg(test)]
mod new_user_tests {
    use crate::Error;

    use super::NewUser;

    #[test]
    fn new_fails_on_empty_full_name() {
        let result = NewUser::new("  ", "jane@example.com", "hunter22", true);

        assert_eq!(result.unwrap_err(), Error::EmptyName("full name"));
    }

    #[test]
    fn new_fails_on_malformed_email() {
        let result = NewUser::new("Jane Doe", "not-an-email", "hunter22", true);

        assert_eq!(
            result.unwrap_err(),
            Error::InvalidEmail("not-an-email".to_owned())
        );
    }

    #[test]
    fn new_succeeds_on_valid_input() {
        let result = NewUser::new("Jane Doe", "jane@example.com", "hunter22", true);

        assert!(result.is_ok());
    }

    #[test]
    fn serializes_with_the_wire_field_names() {
        let new_user = NewUser::new("Jane Doe", "jane@example.com", "hunter22", true).unwrap();

        let json = serde_json::to_value(&new_user).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "full_name": "Jane Doe",
                "email": "jane@example.com",
                "password": "hunter22",
                "agreed_terms": true,
            })
        );
    }
}
