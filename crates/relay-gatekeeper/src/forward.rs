//! Forwarding to the router's `/query` endpoint.

use crate::error::GatekeeperError;
use axum::body::Bytes;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use relay_core::QueryRequest;
use std::time::Duration;

/// A router response, relayed to the caller unchanged.
#[derive(Debug, Clone)]
pub struct Relayed {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl IntoResponse for Relayed {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        if let Some(content_type) = self.content_type {
            response.headers_mut().insert(header::CONTENT_TYPE, content_type);
        }
        response
    }
}

/// HTTP client for the router. One instance is shared by all requests.
#[derive(Debug, Clone)]
pub struct RouterClient {
    client: reqwest::Client,
    url: String,
}

impl RouterClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, GatekeeperError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GatekeeperError::Client)?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send `{sql, mode, request_id}` and collect status and body as-is.
    ///
    /// One attempt only: a failure is reported, never retried.
    pub async fn forward(&self, request: &QueryRequest) -> Result<Relayed, GatekeeperError> {
        let request_id = request.request_id.clone().unwrap_or_default();
        let unavailable = |e: reqwest::Error| GatekeeperError::UpstreamUnavailable {
            request_id: request_id.clone(),
            message: e.without_url().to_string(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(unavailable)?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| HeaderValue::from_bytes(v.as_bytes()).ok());
        let body = response.bytes().await.map_err(unavailable)?;

        Ok(Relayed {
            status,
            content_type,
            body,
        })
    }
}
