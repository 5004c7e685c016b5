pub mod client;
pub mod error;
pub mod models;
pub mod reconcile;

pub use client::{HttpRoutePlanner, RoutePlanner};
pub use error::{PlanFailure, RouteResult};
pub use models::{PlanOutcome, PlanRequest, RouteOrdering, RouteSummary, WirePlanResponse};
pub use reconcile::{reconcile, Reconciliation, SkipReason};
