use serde::{Deserialize, Serialize};

use crate::place::GeoPoint;

use super::error::PlanFailure;

/// Body of `POST /plan`. Immutable once built; field names follow the
/// planner's wire contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub places: Vec<GeoPoint>,
    pub time_budget_min: u32,
    pub anchor: Option<GeoPoint>,
}

/// Raw planner response. The planner is loose about shape: ordering may
/// arrive as an index permutation (`order`), as reordered coordinates
/// (`placesOrdered`) or not at all, and duration/distance field names vary
/// by deployment. `normalize` is the only place that inspects field
/// presence; everything downstream works on [`PlanOutcome`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePlanResponse {
    #[serde(default)]
    pub order: Option<Vec<usize>>,
    #[serde(default)]
    pub places_ordered: Option<Vec<GeoPoint>>,
    #[serde(default)]
    pub geometry: Option<WireGeometry>,
    #[serde(default, alias = "duration")]
    pub duration_sec: Option<f64>,
    #[serde(default, alias = "distance")]
    pub distance_meters: Option<f64>,
    #[serde(default)]
    pub within_budget: bool,
}

/// GeoJSON-style line geometry: `[lng, lat]` pairs.
#[derive(Debug, Clone, Deserialize)]
pub struct WireGeometry {
    #[serde(default)]
    pub coordinates: Vec<[f64; 2]>,
}

impl WirePlanResponse {
    /// Collapses the duck-typed wire shape into the discriminated result.
    /// A response without geometry is unusable and rejected here.
    pub fn normalize(self) -> Result<PlanOutcome, PlanFailure> {
        let coordinates = self
            .geometry
            .map(|geometry| geometry.coordinates)
            .unwrap_or_default();
        if coordinates.is_empty() {
            return Err(PlanFailure::MalformedResponse(
                "response carries no route geometry".into(),
            ));
        }
        let geometry = coordinates
            .iter()
            .map(|pair| GeoPoint::new(pair[1], pair[0]))
            .collect();

        let ordering = if let Some(order) = self.order.filter(|order| !order.is_empty()) {
            RouteOrdering::Explicit(order)
        } else if let Some(points) = self
            .places_ordered
            .filter(|points| !points.is_empty())
        {
            RouteOrdering::Points(points)
        } else {
            RouteOrdering::GeometryOnly
        };

        Ok(PlanOutcome {
            ordering,
            geometry,
            summary: RouteSummary {
                distance_meters: self.distance_meters.unwrap_or(0.0),
                duration_seconds: self.duration_sec.unwrap_or(0.0),
                within_budget: self.within_budget,
            },
        })
    }
}

/// Ordering information the planner returned, already shape-checked.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOrdering {
    /// Index permutation over the request's places array.
    Explicit(Vec<usize>),
    /// Reordered coordinates with no index linkage back to the request.
    Points(Vec<GeoPoint>),
    /// No correspondence at all; any ordering must be inferred from the
    /// polyline.
    GeometryOnly,
}

/// Stats shared by every planner result. `within_budget = false` is a
/// flagged success, not a failure: the route is shown with a warning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub within_budget: bool,
}

impl RouteSummary {
    pub fn distance_km(&self) -> f64 {
        (self.distance_meters / 1000.0 * 100.0).round() / 100.0
    }

    pub fn duration_minutes(&self) -> u64 {
        (self.duration_seconds / 60.0).round().max(1.0) as u64
    }
}

/// Normalized planner result: geometry plus whatever ordering information
/// came with it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    pub ordering: RouteOrdering,
    pub geometry: Vec<GeoPoint>,
    pub summary: RouteSummary,
}
