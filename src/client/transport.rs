use super::error::ClientError;
use crate::domain_model::AccessToken;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, RwLock};

pub const REFRESH_PATH: &str = "/api/refresh";

/// One outbound call. The bearer credential is attached at send time, never stored here.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Whether a 401 should go through the refresh coordinator.
    pub intercept: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        ApiRequest {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            intercept: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Opt out of refresh handling (login, register, the refresh call itself).
    pub fn public(mut self) -> Self {
        self.intercept = false;
        self
    }

    pub fn refresh() -> Self {
        Self::post(REFRESH_PATH).public()
    }

    pub fn is_refresh(&self) -> bool {
        self.path == REFRESH_PATH
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// The `message` field of an error body, or the raw body.
    pub fn message(&self) -> String {
        match self.body.get("message").and_then(Value::as_str) {
            Some(message) => message.to_string(),
            None => self.body.to_string(),
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_value(self.body.clone()).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Decode a 2xx body, or turn anything else into [`ClientError::Api`].
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        if !self.is_success() {
            return Err(ClientError::Api {
                status: self.status,
                message: self.message(),
            });
        }
        self.json()
    }
}

#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&AccessToken>,
    ) -> Result<ApiResponse, ClientError>;

    /// Drop any ambient credentials (cookies) the transport holds.
    fn forget_credentials(&self) {}
}

/// reqwest-backed transport. The cookie jar carries the HTTP-only refresh
/// cookie between calls; client code never reads it.
pub struct ReqwestTransport {
    http: RwLock<reqwest::Client>,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http: RwLock::new(Self::build_client()?),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn build_client() -> Result<reqwest::Client, ClientError> {
        reqwest::Client::builder()
            .cookie_provider(Arc::new(reqwest::cookie::Jar::default()))
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))
    }

    fn client(&self) -> reqwest::Client {
        self.http.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&AccessToken>,
    ) -> Result<ApiResponse, ClientError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut req = self.client().request(request.method.clone(), url);
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(token) = bearer {
            req = req.bearer_auth(&token.0);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok(ApiResponse { status, body })
    }

    fn forget_credentials(&self) {
        match Self::build_client() {
            Ok(client) => *self.http.write().unwrap_or_else(|e| e.into_inner()) = client,
            Err(e) => tracing::warn!("could not reset http client: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn refresh_request_is_public() {
        let refresh = ApiRequest::refresh();
        assert!(refresh.is_refresh());
        assert!(!refresh.intercept);
        assert_eq!(refresh.method, Method::POST);
        assert!(ApiRequest::get("/api/feed").intercept);
    }

    #[test]
    fn error_bodies_become_api_errors() {
        let response = ApiResponse {
            status: 409,
            body: json!({ "message": "Username already exists" }),
        };
        match response.into_result::<Value>() {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 409);
                assert_eq!(message, "Username already exists");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
