//! Implements the API traits over HTTP with `reqwest`.
//!
//! Every response passes through [error_from_response], the single place
//! where backend failures become typed [Error] values. The backend reports
//! failures as a JSON body `{"detail": ...}`; the detail is carried verbatim
//! so screens can show it to the user.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    Error,
    api::{AuthApi, PasswordReset, ResourceClient},
    config::ClientConfig,
    models::{
        Budget, BudgetId, Category, CategoryId, Goal, GoalId, NewBudget, NewCategory, NewGoal,
        NewTransaction, NewUser, Transaction, TransactionChanges, TransactionId, TransactionQuery,
        User,
    },
};

/// The HTTP implementation of the backend API.
///
/// Cloning is cheap and clones share the bearer slot, so one log-in makes
/// every clone authenticated.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    bearer: Arc<RwLock<Option<String>>>,
}

impl RestClient {
    /// Create a client for the backend at `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidBaseUrl] if the base URL does not parse.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let base_url = config.base_url.trim_end_matches('/').to_owned();
        reqwest::Url::parse(&base_url)
            .map_err(|_| Error::InvalidBaseUrl(config.base_url.clone()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            bearer: Arc::new(RwLock::new(None)),
        })
    }

    /// Attach `token` to every subsequent request.
    pub fn set_bearer(&self, token: &str) {
        *self.bearer.write().unwrap() = Some(token.to_owned());
    }

    /// Stop sending a bearer token.
    pub fn clear_bearer(&self) {
        *self.bearer.write().unwrap() = None;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.bearer.read().unwrap().as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
        let status = response.status();
        if status.is_success() {
            response.json().await.map_err(Error::from)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(error_from_response(status, &body))
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, Error> {
        let response = self
            .authorize(self.http.get(self.url(path)))
            .query(query)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .authorize(self.http.post(self.url(path)))
            .json(body)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .authorize(self.http.put(self.url(path)))
            .json(body)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let response = self.authorize(self.http.delete(self.url(path))).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(error_from_response(status, &body))
        }
    }

    /// Fetch transactions matching server-side `query` filters.
    ///
    /// The plain [ResourceClient::list] fetches everything; this is for
    /// narrower views such as a date-bounded dashboard.
    pub async fn transactions_matching(
        &self,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, Error> {
        self.get_json("/transactions", &query.to_query_pairs()).await
    }

    /// Apply a partial update to an existing transaction.
    pub async fn update_transaction(
        &self,
        id: TransactionId,
        changes: &TransactionChanges,
    ) -> Result<Transaction, Error> {
        self.put_json(&format!("/transactions/{id}"), changes).await
    }
}

#[async_trait]
impl AuthApi for RestClient {
    async fn register(&self, new_user: &NewUser) -> Result<User, Error> {
        self.post_json("/auth/register", new_user).await
    }

    async fn log_in(&self, email: &str, password: &str) -> Result<String, Error> {
        #[derive(Serialize)]
        struct Credentials<'a> {
            email: &'a str,
            password: &'a str,
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let response: TokenResponse = self
            .post_json("/auth/login", &Credentials { email, password })
            .await?;

        Ok(response.access_token)
    }

    async fn me(&self, token: &str) -> Result<User, Error> {
        let response = self
            .http
            .get(self.url("/auth/me"))
            .bearer_auth(token)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn forgot_password(&self, email: &str) -> Result<PasswordReset, Error> {
        #[derive(Serialize)]
        struct ForgotPasswordRequest<'a> {
            email: &'a str,
        }

        self.post_json("/auth/forgot-password", &ForgotPasswordRequest { email })
            .await
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<String, Error> {
        #[derive(Serialize)]
        struct ResetPasswordRequest<'a> {
            token: &'a str,
            new_password: &'a str,
        }

        #[derive(Deserialize)]
        struct ResetPasswordResponse {
            message: String,
        }

        let response: ResetPasswordResponse = self
            .post_json(
                "/auth/reset-password",
                &ResetPasswordRequest {
                    token,
                    new_password,
                },
            )
            .await?;

        Ok(response.message)
    }
}

#[async_trait]
impl ResourceClient<Transaction> for RestClient {
    type Draft = NewTransaction;
    type Id = TransactionId;

    const NOUN: &'static str = "transaction";
    const NOUN_PLURAL: &'static str = "transactions";

    async fn list(&self) -> Result<Vec<Transaction>, Error> {
        self.get_json("/transactions", &[]).await
    }

    async fn create(&self, draft: &NewTransaction) -> Result<Transaction, Error> {
        self.post_json("/transactions", draft).await
    }

    async fn remove(&self, id: TransactionId) -> Result<(), Error> {
        self.delete(&format!("/transactions/{id}")).await
    }
}

#[async_trait]
impl ResourceClient<Category> for RestClient {
    type Draft = NewCategory;
    type Id = CategoryId;

    const NOUN: &'static str = "category";
    const NOUN_PLURAL: &'static str = "categories";

    async fn list(&self) -> Result<Vec<Category>, Error> {
        self.get_json("/categories", &[]).await
    }

    async fn create(&self, draft: &NewCategory) -> Result<Category, Error> {
        self.post_json("/categories", draft).await
    }

    async fn remove(&self, id: CategoryId) -> Result<(), Error> {
        self.delete(&format!("/categories/{id}")).await
    }
}

#[async_trait]
impl ResourceClient<Budget> for RestClient {
    type Draft = NewBudget;
    type Id = BudgetId;

    const NOUN: &'static str = "budget";
    const NOUN_PLURAL: &'static str = "budgets";

    async fn list(&self) -> Result<Vec<Budget>, Error> {
        self.get_json("/budgets", &[]).await
    }

    async fn create(&self, draft: &NewBudget) -> Result<Budget, Error> {
        self.post_json("/budgets", draft).await
    }

    async fn remove(&self, id: BudgetId) -> Result<(), Error> {
        self.delete(&format!("/budgets/{id}")).await
    }
}

#[async_trait]
impl ResourceClient<Goal> for RestClient {
    type Draft = NewGoal;
    type Id = GoalId;

    const NOUN: &'static str = "goal";
    const NOUN_PLURAL: &'static str = "goals";

    async fn list(&self) -> Result<Vec<Goal>, Error> {
        self.get_json("/goals", &[]).await
    }

    async fn create(&self, draft: &NewGoal) -> Result<Goal, Error> {
        self.post_json("/goals", draft).await
    }

    async fn remove(&self, id: GoalId) -> Result<(), Error> {
        self.delete(&format!("/goals/{id}")).await
    }
}

/// The backend's error body, e.g. `{"detail": "Invalid credentials"}`.
///
/// Validation failures may carry a structured payload instead of a string;
/// those are flattened to their JSON text so the user still sees something.
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    match value.get("detail")? {
        serde_json::Value::String(detail) => Some(detail.clone()),
        structured => Some(structured.to_string()),
    }
}

/// Map a failed response to the error taxonomy.
///
/// 401 means the credentials or token were rejected, any other client error
/// means the backend rejected the submitted data, and everything else is
/// unexpected. The backend's `detail` message is carried verbatim when
/// present.
fn error_from_response(status: StatusCode, body: &str) -> Error {
    let detail = extract_detail(body);
    tracing::debug!("request rejected with {status}: {body:?}");

    match status {
        StatusCode::UNAUTHORIZED => {
            Error::Unauthorized(detail.unwrap_or_else(|| "authorization required".to_owned()))
        }
        status if status.is_client_error() => Error::Rejected(
            detail.unwrap_or_else(|| format!("the server rejected the request ({status})")),
        ),
        status => Error::UnexpectedResponse(
            detail.unwrap_or_else(|| format!("server error ({status})")),
        ),
    }
}

#[cfg(test)]
mod error_mapping_tests {
    use reqwest::StatusCode;

    use crate::Error;

    use super::error_from_response;

    #[test]
    fn unauthorized_carries_the_backend_detail() {
        let error = error_from_response(
            StatusCode::UNAUTHORIZED,
            r#"{"detail": "Invalid credentials"}"#,
        );

        assert_eq!(error, Error::Unauthorized("Invalid credentials".to_owned()));
    }

    #[test]
    fn client_errors_carry_the_backend_detail_verbatim() {
        let error = error_from_response(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Email already registered"}"#,
        );

        assert_eq!(error, Error::Rejected("Email already registered".to_owned()));
    }

    #[test]
    fn structured_validation_details_are_flattened_to_text() {
        let error = error_from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail": [{"loc": ["body", "amount"], "msg": "Input should be greater than 0"}]}"#,
        );

        match error {
            Error::Rejected(message) => assert!(message.contains("Input should be greater than 0")),
            other => panic!("expected Error::Rejected, got {other:?}"),
        }
    }

    #[test]
    fn non_json_bodies_fall_back_to_a_generic_message() {
        let error = error_from_response(StatusCode::BAD_REQUEST, "<html>nope</html>");

        assert_eq!(
            error,
            Error::Rejected("the server rejected the request (400 Bad Request)".to_owned())
        );
    }

    #[test]
    fn server_errors_are_unexpected_responses() {
        let error = error_from_response(StatusCode::INTERNAL_SERVER_ERROR, "");

        assert_eq!(
            error,
            Error::UnexpectedResponse("server error (500 Internal Server Error)".to_owned())
        );
    }
}
