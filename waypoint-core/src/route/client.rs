use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use super::error::{PlanFailure, RouteResult};
use super::models::{PlanOutcome, PlanRequest, WirePlanResponse};

/// Longest server-reported error body surfaced to the user.
const BODY_PREVIEW_LIMIT: usize = 200;

/// Seam to the external route optimizer. Implementations are stateless
/// per call and never touch the place store or the anchor; reconciling
/// the result back into local state is the caller's job, which keeps the
/// client independently testable with canned results.
#[async_trait]
pub trait RoutePlanner: Send + Sync {
    async fn submit(&self, request: &PlanRequest) -> RouteResult<PlanOutcome>;
}

/// HTTP planner client: probes `GET /health`, then posts the request to
/// `POST /plan` and normalizes the response at the boundary.
#[derive(Debug, Clone)]
pub struct HttpRoutePlanner {
    client: Client,
    base: Url,
}

impl HttpRoutePlanner {
    pub fn new(base: Url) -> Self {
        Self {
            client: Client::new(),
            base,
        }
    }

    /// Uses a caller-provided client (shared pools, custom TLS).
    pub fn with_client(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    fn endpoint(&self, segment: &str) -> Url {
        let mut url = self.base.clone();
        let path = format!("{}/{}", self.base.path().trim_end_matches('/'), segment);
        url.set_path(&path);
        url
    }

    /// Non-2xx from the health probe aborts the flow with the probe's
    /// status and body.
    async fn probe_health(&self) -> RouteResult<()> {
        let response = self.client.get(self.endpoint("health")).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(target: "route", status = status.as_u16(), "planner health probe failed");
            return Err(PlanFailure::ServerRejected {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RoutePlanner for HttpRoutePlanner {
    async fn submit(&self, request: &PlanRequest) -> RouteResult<PlanOutcome> {
        if request.places.len() < 2 {
            return Err(PlanFailure::TooFewPlaces {
                count: request.places.len(),
            });
        }

        self.probe_health().await?;

        let response = self
            .client
            .post(self.endpoint("plan"))
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(target: "route", status = status.as_u16(), "planner rejected request");
            return Err(PlanFailure::ServerRejected {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        debug!(target: "route", bytes = body.len(), "planner response received");
        let wire: WirePlanResponse = serde_json::from_str(&body)
            .map_err(|err| PlanFailure::MalformedResponse(err.to_string()))?;
        wire.normalize()
    }
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= BODY_PREVIEW_LIMIT {
        return trimmed.to_string();
    }
    let mut end = BODY_PREVIEW_LIMIT;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}
