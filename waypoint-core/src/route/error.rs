use thiserror::Error;

/// Why a planning request failed. Every failure is terminal for that
/// request; there are no automatic retries.
#[derive(Debug, Error)]
pub enum PlanFailure {
    #[error("at least 2 places are required, got {count}")]
    TooFewPlaces { count: usize },
    #[error("no start anchor selected")]
    MissingAnchor,
    #[error("planner unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),
    #[error("planner rejected the request (status {status}): {body}")]
    ServerRejected { status: u16, body: String },
    #[error("malformed planner response: {0}")]
    MalformedResponse(String),
}

pub type RouteResult<T> = std::result::Result<T, PlanFailure>;
