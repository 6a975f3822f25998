//! Defines the traits that make up the backend API boundary, and the
//! [RestClient] that implements them over HTTP.
//!
//! Consumers (the session manager, the list screens) depend on the traits,
//! so tests can stand in a fake backend without a network.

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    Error,
    models::{NewUser, User},
};

pub use http::RestClient;

mod http;

/// The outcome of asking the backend to start a password reset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PasswordReset {
    /// A human-readable message to show the user.
    pub message: String,
    /// The reset token. Only present when the backend runs in a
    /// non-production configuration; production backends deliver the token
    /// out of band.
    #[serde(default)]
    pub reset_token: Option<String>,
}

/// The authentication endpoints of the backend.
#[async_trait]
pub trait AuthApi {
    /// Create an account. The new user is not logged in by this call alone.
    async fn register(&self, new_user: &NewUser) -> Result<User, Error>;

    /// Exchange credentials for a bearer token.
    async fn log_in(&self, email: &str, password: &str) -> Result<String, Error>;

    /// Fetch the profile of the user `token` belongs to.
    ///
    /// Takes the token explicitly rather than using ambient state so the
    /// session manager can verify exactly the token it is installing.
    async fn me(&self, token: &str) -> Result<User, Error>;

    /// Ask the backend to start a password reset for `email`.
    async fn forgot_password(&self, email: &str) -> Result<PasswordReset, Error>;

    /// Exchange a reset token for a password change.
    ///
    /// Returns the backend's confirmation message.
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<String, Error>;
}

/// The uniform list/create/delete endpoints one entity type exposes.
///
/// Implemented by [RestClient] once per entity (transaction, category,
/// budget, goal); [crate::ListPane] drives any implementation the same way.
#[async_trait]
pub trait ResourceClient<T> {
    /// The payload for creating one entity.
    type Draft: Send + Sync;

    /// The entity's ID newtype.
    type Id: Send + std::fmt::Display;

    /// The entity noun used in fallback error messages, e.g. "transaction".
    const NOUN: &'static str;

    /// The plural form, e.g. "transactions".
    const NOUN_PLURAL: &'static str;

    /// Fetch the current user's full list.
    async fn list(&self) -> Result<Vec<T>, Error>;

    /// Create a new entity from `draft`.
    async fn create(&self, draft: &Self::Draft) -> Result<T, Error>;

    /// Delete the entity with `id`.
    async fn remove(&self, id: Self::Id) -> Result<(), Error>;
}
