//! The filtering relay.

use crate::auth::ApiKey;
use crate::error::GatekeeperError;
use crate::forward::{Relayed, RouterClient};
use axum::http::HeaderMap;
use relay_core::QueryRequest;
use relay_policy::{DenyList, PolicyDecision};

/// Authenticates, filters and forwards. Holds no per-request state.
#[derive(Debug)]
pub struct Gatekeeper {
    api_key: ApiKey,
    deny_list: DenyList,
    client: RouterClient,
}

impl Gatekeeper {
    pub fn new(api_key: ApiKey, deny_list: DenyList, client: RouterClient) -> Self {
        Self {
            api_key,
            deny_list,
            client,
        }
    }

    /// Handle one `/query` call.
    ///
    /// Authentication is checked before the body is looked at; rejected
    /// requests never reach the router.
    pub async fn handle(
        &self,
        headers: &HeaderMap,
        payload: Result<QueryRequest, String>,
    ) -> Result<Relayed, GatekeeperError> {
        if let Err(e) = self.api_key.verify(headers) {
            tracing::warn!("Rejected request with missing or invalid API key");
            return Err(e);
        }

        let mut request = payload.map_err(GatekeeperError::InvalidRequest)?;

        if let PolicyDecision::Block { reason, .. } = self.deny_list.evaluate(&request.sql) {
            tracing::warn!(
                request_id = request.request_id.as_deref().unwrap_or("-"),
                mode = %request.mode,
                reason = %reason,
                "Statement blocked by policy"
            );
            return Err(GatekeeperError::PolicyViolation { reason });
        }

        let request_id = request.assign_request_id().to_string();
        tracing::debug!(request_id = %request_id, mode = %request.mode, router = %self.client.url(), "Forwarding to router");

        let relayed = self.client.forward(&request).await.inspect_err(|e| {
            tracing::warn!(request_id = %request_id, error = %e, "Router call failed");
        })?;

        tracing::info!(request_id = %request_id, status = relayed.status.as_u16(), "Relayed router response");
        Ok(relayed)
    }
}
