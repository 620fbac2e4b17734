use std::sync::Arc;
use std::time::{Duration, Instant};

use http::{Method, StatusCode, header};
use serde_json::Value;
use uuid::Uuid;

use crate::config::normalize_api_base;
use crate::core::auth::AuthStore;
use crate::errors::Error;

/// Thin REST helper shared by every endpoint: bearer auth, request ids,
/// central 401 handling and lenient body decoding.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth: Arc<AuthStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, auth: Arc<AuthStore>) -> Result<Self, Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: normalize_api_base(base_url),
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, endpoint: &str) -> Result<Option<Value>, Error> {
        self.request(Method::GET, endpoint, None).await
    }

    pub async fn post(&self, endpoint: &str, body: Option<&Value>) -> Result<Option<Value>, Error> {
        self.request(Method::POST, endpoint, body).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Option<Value>, Error> {
        self.request(Method::DELETE, endpoint, None).await
    }

    /// Returns `None` for empty bodies (204 and friends).
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, Error> {
        let token = self.auth.token().await;
        if token.is_none() && !endpoint.contains("/auth/") {
            return Err(Error::NotAuthenticated);
        }

        let x_request_id = Uuid::new_v4().to_string();
        let url = format!("{}{}", self.base_url, endpoint);

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header("x-request-id", &x_request_id);
        if let Some(token) = &token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        } else {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }

        let start_time = Instant::now();
        let response = builder.send().await.map_err(|e| {
            tracing::warn!(
                method = ?method,
                path = endpoint,
                x_request_id = x_request_id,
                "Request failed before a response: {e}"
            );
            Error::Request(e)
        })?;
        let status = response.status();
        let latency = start_time.elapsed();

        tracing::debug!(
            method = ?method,
            path = endpoint,
            x_request_id = x_request_id,
            status = ?status,
            latency = ?latency,
            latency_micros = latency.as_micros(),
        );

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Session rejected by the server, clearing stored credentials");
            self.auth.clear().await;
            return Err(Error::SessionExpired);
        }

        let text = response.text().await?;
        let data = if text.trim().is_empty() {
            None
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(json) => Some(json),
                Err(_) if !status.is_success() => {
                    return Err(Error::api(
                        status,
                        &format!("Request failed with status {}", status.as_u16()),
                    ));
                }
                Err(_) => None,
            }
        };

        if !status.is_success() {
            let message = data
                .as_ref()
                .and_then(|d| d.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
            return Err(Error::api(status, &message));
        }

        Ok(data)
    }
}
