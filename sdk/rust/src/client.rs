use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Partial profile update; `None` fields are not sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub created_at: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub activated: bool,
    pub version: i32,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Debug, Deserialize)]
struct TokenEnvelope {
    token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned {status}: {body}")]
    Api { status: StatusCode, body: Value },
}

impl SdkError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SdkError::Http(e) => e.status(),
            SdkError::Api { status, .. } => Some(*status),
        }
    }

    /// The `error` member of the response body, if any.
    pub fn error_body(&self) -> Option<&Value> {
        match self {
            SdkError::Api { body, .. } => body.get("error"),
            SdkError::Http(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UsersClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl UsersClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// A copy of this client that sends `token` as a bearer credential.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..self.clone()
        }
    }

    /// Start a request against `path`, carrying the bearer token if one is set.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn health(&self) -> Result<Value, SdkError> {
        self.send(self.request(Method::GET, "/service/users/health")).await
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<User, SdkError> {
        let envelope: UserEnvelope = self
            .send(self.request(Method::POST, "/service/users").json(req))
            .await?;
        Ok(envelope.user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, SdkError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let envelope: TokenEnvelope = self
            .send(self.request(Method::POST, "/service/users/authentication").json(&body))
            .await?;
        Ok(envelope.token)
    }

    pub async fn me(&self) -> Result<User, SdkError> {
        let envelope: UserEnvelope = self.send(self.request(Method::GET, "/service/users/me")).await?;
        Ok(envelope.user)
    }

    pub async fn update(&self, id: &str, req: &UpdateRequest) -> Result<User, SdkError> {
        let envelope: UserEnvelope = self
            .send(self.request(Method::PATCH, &format!("/service/users/{id}")).json(req))
            .await?;
        Ok(envelope.user)
    }

    pub async fn vars(&self) -> Result<Value, SdkError> {
        self.send(self.request(Method::GET, "/debug/vars")).await
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, SdkError> {
        let resp = builder.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let text = resp.text().await?;
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            return Err(SdkError::Api { status, body });
        }

        Ok(resp.json::<T>().await?)
    }
}
