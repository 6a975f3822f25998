//! Defines the session manager, the single source of truth for "is there an
//! authenticated user, and who are they".
//!
//! The session is an explicit object with controlled mutation methods and a
//! subscription channel, not ambient global state. Every token installation
//! bumps a generation counter, and an identity fetch may only apply its
//! result while its generation is still the latest. This keeps fetch results
//! applied in token-issue order even when responses arrive out of order.

use std::sync::Mutex;

use tokio::sync::watch;

use crate::{
    Error,
    api::{AuthApi, PasswordReset},
    models::{NewUser, User},
    token_store::TokenStore,
};

/// Where the session currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    /// No token. Only the auth endpoints are usable.
    Anonymous,
    /// A token exists but the backend has not confirmed who it belongs to.
    Verifying {
        /// The unverified bearer token.
        token: String,
    },
    /// The backend confirmed the token and returned the user's profile.
    Authenticated {
        /// The verified bearer token.
        token: String,
        /// The profile returned by the identity fetch.
        user: User,
    },
}

impl SessionPhase {
    /// The bearer token, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            SessionPhase::Anonymous => None,
            SessionPhase::Verifying { token } | SessionPhase::Authenticated { token, .. } => {
                Some(token)
            }
        }
    }

    /// The verified user, if the session is authenticated.
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionPhase::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }
}

/// The client-side record of the current authentication token and user.
///
/// `A` is the auth API, `S` the durable token store. The session starts
/// `Verifying` if the store holds a token from an earlier run; call
/// [Session::bootstrap] to resolve it.
pub struct Session<A, S> {
    api: A,
    store: S,
    generation: Mutex<u64>,
    phase: watch::Sender<SessionPhase>,
}

impl<A, S> Session<A, S>
where
    A: AuthApi,
    S: TokenStore,
{
    /// Create a session over `api`, restoring any token saved in `store`.
    pub fn new(api: A, store: S) -> Self {
        let initial_phase = match store.read() {
            Some(token) => SessionPhase::Verifying { token },
            None => SessionPhase::Anonymous,
        };
        let (phase, _) = watch::channel(initial_phase);

        Self {
            api,
            store,
            generation: Mutex::new(0),
            phase,
        }
    }

    /// Resolve a token restored from the durable store.
    ///
    /// A saved token the backend no longer accepts is discarded, the same
    /// as any other failed identity fetch. Does nothing when the session is
    /// not in the `Verifying` phase.
    pub async fn bootstrap(&self) -> SessionPhase {
        let pending = {
            let generation = *self.generation.lock().unwrap();
            match &*self.phase.borrow() {
                SessionPhase::Verifying { token } => Some((token.clone(), generation)),
                _ => None,
            }
        };

        if let Some((token, generation)) = pending {
            let _ = self.resolve_identity(token, generation).await;
        }

        self.phase()
    }

    /// Exchange credentials for a token and verify it.
    ///
    /// # Errors
    ///
    /// Returns [Error::Unauthorized] when the backend rejects the
    /// credentials, leaving the session unchanged, or [Error::StaleSession]
    /// when the follow-up identity fetch fails.
    pub async fn log_in(&self, email: &str, password: &str) -> Result<User, Error> {
        let token = self.api.log_in(email, password).await?;
        self.install_token(token).await
    }

    /// Create an account, then log in with the same credentials.
    ///
    /// # Errors
    ///
    /// Propagates the backend's rejection (e.g. a duplicate email) without
    /// touching the session.
    pub async fn register(&self, new_user: &NewUser) -> Result<User, Error> {
        self.api.register(new_user).await?;
        self.log_in(&new_user.email, &new_user.password).await
    }

    /// Ask the backend to start a password reset. Does not affect the
    /// session.
    pub async fn request_password_reset(&self, email: &str) -> Result<PasswordReset, Error> {
        self.api.forgot_password(email).await
    }

    /// Exchange a reset token for a password change. Does not affect the
    /// session.
    ///
    /// # Errors
    ///
    /// Returns [Error::Rejected] with the backend's message when the reset
    /// token is invalid or expired.
    pub async fn complete_password_reset(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<String, Error> {
        self.api.reset_password(reset_token, new_password).await
    }

    /// Drop the token and user and clear the durable store.
    ///
    /// Always succeeds and may be called in any phase. An identity fetch
    /// still in flight when the user logs out is discarded when it lands.
    pub fn log_out(&self) {
        let mut generation = self.generation.lock().unwrap();
        *generation += 1;

        if let Err(error) = self.store.clear() {
            tracing::warn!("could not clear the saved token: {error}");
        }

        self.phase.send_replace(SessionPhase::Anonymous);
    }

    /// The current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase.borrow().clone()
    }

    /// The current bearer token, if any.
    pub fn token(&self) -> Option<String> {
        self.phase.borrow().token().map(str::to_owned)
    }

    /// The verified user, if the session is authenticated.
    pub fn user(&self) -> Option<User> {
        self.phase.borrow().user().cloned()
    }

    /// A channel that yields every phase change.
    ///
    /// Consumers hold a receiver instead of polling shared state.
    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }

    /// Persist `token`, mark the session `Verifying`, and run the identity
    /// fetch under a fresh generation.
    async fn install_token(&self, token: String) -> Result<User, Error> {
        let generation = {
            let mut generation = self.generation.lock().unwrap();
            *generation += 1;

            if let Err(error) = self.store.write(&token) {
                tracing::warn!("could not save the token: {error}");
            }

            self.phase.send_replace(SessionPhase::Verifying {
                token: token.clone(),
            });

            *generation
        };

        self.resolve_identity(token, generation).await
    }

    /// Run the identity fetch for `token` and apply the result if
    /// `generation` is still the latest.
    async fn resolve_identity(&self, token: String, generation: u64) -> Result<User, Error> {
        match self.api.me(&token).await {
            Ok(user) => {
                let current = self.generation.lock().unwrap();
                if *current == generation {
                    self.phase.send_replace(SessionPhase::Authenticated {
                        token,
                        user: user.clone(),
                    });
                } else {
                    tracing::debug!("discarding the identity fetch for a superseded token");
                }

                Ok(user)
            }
            Err(error) => {
                let current = self.generation.lock().unwrap();
                if *current == generation {
                    tracing::warn!("identity fetch failed, discarding the token: {error}");

                    if let Err(error) = self.store.clear() {
                        tracing::warn!("could not clear the saved token: {error}");
                    }

                    self.phase.send_replace(SessionPhase::Anonymous);
                } else {
                    tracing::debug!("ignoring a failed identity fetch for a superseded token");
                }

                Err(Error::StaleSession)
            }
        }
    }
}

#[cfg(test)]
mod session_tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::{
        Error,
        api::{AuthApi, PasswordReset},
        models::{NewUser, User, UserId},
        token_store::{MemoryTokenStore, TokenStore},
    };

    use super::{Session, SessionPhase};

    /// Lets a test hold an identity fetch open until it says otherwise.
    struct MeGate {
        entered: Notify,
        release: Notify,
    }

    #[derive(Default)]
    struct FakeAuthApi {
        register_results: Mutex<HashMap<String, Result<User, Error>>>,
        log_in_results: Mutex<HashMap<String, Result<String, Error>>>,
        me_results: Mutex<HashMap<String, Result<User, Error>>>,
        me_gates: Mutex<HashMap<String, Arc<MeGate>>>,
    }

    impl FakeAuthApi {
        fn new() -> Self {
            Self::default()
        }

        /// Wire up an account so `email` logs in to `token` which verifies
        /// as `user`.
        fn with_account(&self, email: &str, token: &str, user: User) {
            self.log_in_results
                .lock()
                .unwrap()
                .insert(email.to_owned(), Ok(token.to_owned()));
            self.me_results
                .lock()
                .unwrap()
                .insert(token.to_owned(), Ok(user));
        }

        fn reject_log_in(&self, email: &str) {
            self.log_in_results.lock().unwrap().insert(
                email.to_owned(),
                Err(Error::Unauthorized("Invalid credentials".to_owned())),
            );
        }

        fn fail_me(&self, token: &str) {
            self.me_results.lock().unwrap().insert(
                token.to_owned(),
                Err(Error::Unauthorized("Could not validate credentials".to_owned())),
            );
        }

        /// Make identity fetches for `token` block until the test releases
        /// the returned gate.
        fn gate_me(&self, token: &str) -> Arc<MeGate> {
            let gate = Arc::new(MeGate {
                entered: Notify::new(),
                release: Notify::new(),
            });
            self.me_gates
                .lock()
                .unwrap()
                .insert(token.to_owned(), Arc::clone(&gate));
            gate
        }
    }

    #[async_trait]
    impl AuthApi for FakeAuthApi {
        async fn register(&self, new_user: &NewUser) -> Result<User, Error> {
            self.register_results
                .lock()
                .unwrap()
                .get(&new_user.email)
                .cloned()
                .unwrap_or_else(|| Err(Error::Rejected("no such account".to_owned())))
        }

        async fn log_in(&self, email: &str, _password: &str) -> Result<String, Error> {
            self.log_in_results
                .lock()
                .unwrap()
                .get(email)
                .cloned()
                .unwrap_or_else(|| Err(Error::Unauthorized("Invalid credentials".to_owned())))
        }

        async fn me(&self, token: &str) -> Result<User, Error> {
            let gate = self.me_gates.lock().unwrap().get(token).cloned();
            if let Some(gate) = gate {
                gate.entered.notify_one();
                gate.release.notified().await;
            }

            self.me_results
                .lock()
                .unwrap()
                .get(token)
                .cloned()
                .unwrap_or_else(|| {
                    Err(Error::Unauthorized("Could not validate credentials".to_owned()))
                })
        }

        async fn forgot_password(&self, _email: &str) -> Result<PasswordReset, Error> {
            Ok(PasswordReset {
                message: "Reset token created. Use it in the reset password form.".to_owned(),
                reset_token: Some("reset-token".to_owned()),
            })
        }

        async fn reset_password(&self, _token: &str, _new_password: &str) -> Result<String, Error> {
            Ok("Password reset successful".to_owned())
        }
    }

    fn user(id: i64, full_name: &str) -> User {
        User {
            id: UserId::new(id),
            full_name: full_name.to_owned(),
            email: format!("{}@example.com", full_name.to_lowercase()),
            agreed_terms: true,
        }
    }

    #[tokio::test]
    async fn starts_anonymous_with_an_empty_store() {
        let session = Session::new(FakeAuthApi::new(), MemoryTokenStore::new());

        assert_eq!(session.phase(), SessionPhase::Anonymous);
    }

    #[tokio::test]
    async fn starts_verifying_with_a_saved_token() {
        let session = Session::new(FakeAuthApi::new(), MemoryTokenStore::holding("token-1"));

        assert_eq!(
            session.phase(),
            SessionPhase::Verifying {
                token: "token-1".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn bootstrap_resolves_a_valid_saved_token() {
        let api = FakeAuthApi::new();
        api.with_account("jane@example.com", "token-1", user(1, "Jane"));
        let session = Session::new(api, MemoryTokenStore::holding("token-1"));

        let phase = session.bootstrap().await;

        assert_eq!(phase.user(), Some(&user(1, "Jane")));
        assert_eq!(session.token(), Some("token-1".to_owned()));
    }

    #[tokio::test]
    async fn bootstrap_demotes_and_clears_a_stale_token() {
        let api = FakeAuthApi::new();
        api.fail_me("token-old");
        let store = Arc::new(MemoryTokenStore::holding("token-old"));
        let session = Session::new(api, Arc::clone(&store));

        let phase = session.bootstrap().await;

        assert_eq!(phase, SessionPhase::Anonymous);
        assert_eq!(store.read(), None);
    }

    #[tokio::test]
    async fn log_in_authenticates_and_persists_the_token() {
        let api = FakeAuthApi::new();
        api.with_account("jane@example.com", "token-1", user(1, "Jane"));
        let store = Arc::new(MemoryTokenStore::new());
        let session = Session::new(api, Arc::clone(&store));

        let logged_in = session.log_in("jane@example.com", "hunter22").await.unwrap();

        assert_eq!(logged_in, user(1, "Jane"));
        assert_eq!(session.user(), Some(user(1, "Jane")));
        assert_eq!(store.read(), Some("token-1".to_owned()));
    }

    #[tokio::test]
    async fn log_in_with_bad_credentials_leaves_the_session_anonymous() {
        let api = FakeAuthApi::new();
        api.reject_log_in("jane@example.com");
        let store = Arc::new(MemoryTokenStore::new());
        let session = Session::new(api, Arc::clone(&store));

        let result = session.log_in("jane@example.com", "wrong").await;

        assert_eq!(
            result,
            Err(Error::Unauthorized("Invalid credentials".to_owned()))
        );
        assert_eq!(session.phase(), SessionPhase::Anonymous);
        assert_eq!(store.read(), None);
    }

    #[tokio::test]
    async fn identity_fetch_failure_after_log_in_demotes_to_anonymous() {
        let api = FakeAuthApi::new();
        api.log_in_results
            .lock()
            .unwrap()
            .insert("jane@example.com".to_owned(), Ok("token-1".to_owned()));
        api.fail_me("token-1");
        let store = Arc::new(MemoryTokenStore::new());
        let session = Session::new(api, Arc::clone(&store));

        let result = session.log_in("jane@example.com", "hunter22").await;

        assert_eq!(result, Err(Error::StaleSession));
        assert_eq!(session.phase(), SessionPhase::Anonymous);
        assert_eq!(store.read(), None);
    }

    #[tokio::test]
    async fn later_log_in_wins_even_if_the_earlier_fetch_resolves_last() {
        let api = FakeAuthApi::new();
        api.with_account("first@example.com", "token-a", user(1, "First"));
        api.with_account("second@example.com", "token-b", user(2, "Second"));
        let gate = api.gate_me("token-a");
        let store = Arc::new(MemoryTokenStore::new());
        let session = Arc::new(Session::new(api, Arc::clone(&store)));

        let earlier = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.log_in("first@example.com", "hunter22").await }
        });
        gate.entered.notified().await;

        session
            .log_in("second@example.com", "hunter22")
            .await
            .unwrap();

        gate.release.notify_one();
        let earlier_result = earlier.await.unwrap();

        // The earlier call still resolved, but its late result must not
        // overwrite the newer session state.
        assert_eq!(earlier_result, Ok(user(1, "First")));
        assert_eq!(session.user(), Some(user(2, "Second")));
        assert_eq!(session.token(), Some("token-b".to_owned()));
    }

    #[tokio::test]
    async fn log_out_discards_an_in_flight_identity_fetch() {
        let api = FakeAuthApi::new();
        api.with_account("jane@example.com", "token-1", user(1, "Jane"));
        let gate = api.gate_me("token-1");
        let store = Arc::new(MemoryTokenStore::new());
        let session = Arc::new(Session::new(api, Arc::clone(&store)));

        let log_in = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.log_in("jane@example.com", "hunter22").await }
        });
        gate.entered.notified().await;

        session.log_out();
        gate.release.notify_one();
        log_in.await.unwrap().unwrap();

        assert_eq!(session.phase(), SessionPhase::Anonymous);
        assert_eq!(store.read(), None);
    }

    #[tokio::test]
    async fn register_success_logs_the_new_user_in() {
        let api = FakeAuthApi::new();
        api.register_results
            .lock()
            .unwrap()
            .insert("jane@example.com".to_owned(), Ok(user(1, "Jane")));
        api.with_account("jane@example.com", "token-1", user(1, "Jane"));
        let session = Session::new(api, MemoryTokenStore::new());
        let new_user = NewUser::new("Jane Doe", "jane@example.com", "hunter22", true).unwrap();

        let registered = session.register(&new_user).await.unwrap();

        assert_eq!(registered, user(1, "Jane"));
        assert_eq!(session.user(), Some(user(1, "Jane")));
    }

    #[tokio::test]
    async fn register_rejection_leaves_the_session_anonymous() {
        let api = FakeAuthApi::new();
        api.register_results.lock().unwrap().insert(
            "jane@example.com".to_owned(),
            Err(Error::Rejected("Email already registered".to_owned())),
        );
        let session = Session::new(api, MemoryTokenStore::new());
        let new_user = NewUser::new("Jane Doe", "jane@example.com", "hunter22", true).unwrap();

        let result = session.register(&new_user).await;

        assert_eq!(
            result,
            Err(Error::Rejected("Email already registered".to_owned()))
        );
        assert_eq!(session.phase(), SessionPhase::Anonymous);
    }

    #[tokio::test]
    async fn log_out_is_idempotent() {
        let api = FakeAuthApi::new();
        api.with_account("jane@example.com", "token-1", user(1, "Jane"));
        let store = Arc::new(MemoryTokenStore::new());
        let session = Session::new(api, Arc::clone(&store));
        session.log_in("jane@example.com", "hunter22").await.unwrap();

        session.log_out();
        session.log_out();

        assert_eq!(session.phase(), SessionPhase::Anonymous);
        assert_eq!(store.read(), None);
    }

    #[tokio::test]
    async fn password_reset_requests_do_not_touch_the_session() {
        let session = Session::new(FakeAuthApi::new(), MemoryTokenStore::new());

        let reset = session
            .request_password_reset("jane@example.com")
            .await
            .unwrap();
        let message = session
            .complete_password_reset(reset.reset_token.as_deref().unwrap(), "new-password")
            .await
            .unwrap();

        assert_eq!(message, "Password reset successful");
        assert_eq!(session.phase(), SessionPhase::Anonymous);
    }

    #[tokio::test]
    async fn subscribers_see_phase_changes() {
        let api = FakeAuthApi::new();
        api.with_account("jane@example.com", "token-1", user(1, "Jane"));
        let session = Session::new(api, MemoryTokenStore::new());
        let mut phases = session.subscribe();

        session.log_in("jane@example.com", "hunter22").await.unwrap();

        assert!(phases.has_changed().unwrap());
        assert_eq!(phases.borrow_and_update().user(), Some(&user(1, "Jane")));
    }
}
