use std::cmp::Ordering;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::place::{AnchorSelector, GeoPoint, PlaceId, PlaceSnapshot, PlaceStore};

use super::models::{PlanOutcome, RouteOrdering, RouteSummary};

/// Why the reordering step of a reconciliation was skipped. Skips are
/// non-fatal: geometry and stats still apply, only the order is left
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Explicit order length differs from the snapshot length.
    LengthMismatch,
    /// Explicit order is not a permutation of `[0, N)`.
    NotAPermutation,
    /// Ordered point list does not match the snapshot cardinality.
    CardinalityMismatch,
    /// Polyline was empty, nothing to project onto.
    EmptyGeometry,
    /// The live place set changed while the request was in flight.
    StaleIdSet,
    /// A newer request superseded this one before its result arrived.
    StaleGeneration,
}

/// Report of one reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// The id order that was applied to the store, when any.
    pub applied_order: Option<Vec<PlaceId>>,
    /// Place promoted to the anchor because none was set.
    pub promoted_anchor: Option<PlaceId>,
    pub skipped: Option<SkipReason>,
    /// Route polyline, drawn regardless of whether reordering succeeded.
    pub geometry: Vec<GeoPoint>,
    pub summary: RouteSummary,
}

impl Reconciliation {
    pub(crate) fn skipped(
        reason: SkipReason,
        geometry: Vec<GeoPoint>,
        summary: RouteSummary,
    ) -> Self {
        Self {
            applied_order: None,
            promoted_anchor: None,
            skipped: Some(reason),
            geometry,
            summary,
        }
    }

    pub fn reordered(&self) -> bool {
        self.applied_order.is_some()
    }
}

/// Merges a planner result back into the live store. The result is
/// interpreted against the snapshot taken at submit time; it is applied
/// to the live store only when the live id set still equals the
/// snapshot's, otherwise the reordering is dropped as stale.
pub fn reconcile(
    snapshot: &PlaceSnapshot,
    store: &mut PlaceStore,
    selector: &mut AnchorSelector,
    outcome: PlanOutcome,
) -> Reconciliation {
    let PlanOutcome {
        ordering,
        geometry,
        summary,
    } = outcome;

    let ordered = match &ordering {
        RouteOrdering::Explicit(order) => order_from_permutation(snapshot, order),
        RouteOrdering::Points(points) => order_from_points(snapshot, points),
        RouteOrdering::GeometryOnly => order_from_geometry(snapshot, &geometry),
    };

    let ordered_ids = match ordered {
        Ok(ids) => ids,
        Err(reason) => {
            debug!(target: "reconcile", reason = ?reason, "reordering skipped");
            return Reconciliation::skipped(reason, geometry, summary);
        }
    };

    if store.id_set() != snapshot.id_set() {
        warn!(
            target: "reconcile",
            "place set changed while the request was in flight, dropping reordering"
        );
        return Reconciliation::skipped(SkipReason::StaleIdSet, geometry, summary);
    }
    if store.reorder(&ordered_ids).is_err() {
        return Reconciliation::skipped(SkipReason::StaleIdSet, geometry, summary);
    }

    let mut promoted = None;
    if !selector.is_set() {
        if let Some(&first) = ordered_ids.first() {
            if selector.set_place(first, store).is_ok() {
                promoted = Some(first);
            }
        }
    }

    info!(
        target: "reconcile",
        places = ordered_ids.len(),
        promoted = promoted.is_some(),
        "applied planner ordering"
    );
    Reconciliation {
        applied_order: Some(ordered_ids),
        promoted_anchor: promoted,
        skipped: None,
        geometry,
        summary,
    }
}

/// Maps an index permutation over the request's places array to the
/// snapshot's ids.
fn order_from_permutation(
    snapshot: &PlaceSnapshot,
    order: &[usize],
) -> Result<Vec<PlaceId>, SkipReason> {
    if order.len() != snapshot.len() {
        return Err(SkipReason::LengthMismatch);
    }
    let mut seen = vec![false; snapshot.len()];
    for &index in order {
        if index >= snapshot.len() || seen[index] {
            return Err(SkipReason::NotAPermutation);
        }
        seen[index] = true;
    }
    Ok(order
        .iter()
        .map(|&index| snapshot.places()[index].id)
        .collect())
}

/// Greedy nearest-neighbor assignment of returned points to snapshot
/// places. Each place is consumed exactly once, so the result is always a
/// bijection; ties go to the lowest remaining snapshot index. Greedy, not
/// globally optimal: the points are expected to already correspond
/// closely to the places they came from.
fn order_from_points(
    snapshot: &PlaceSnapshot,
    points: &[GeoPoint],
) -> Result<Vec<PlaceId>, SkipReason> {
    if points.is_empty() || points.len() != snapshot.len() {
        return Err(SkipReason::CardinalityMismatch);
    }
    let mut remaining: Vec<&crate::place::Place> = snapshot.places().iter().collect();
    let mut ordered = Vec::with_capacity(points.len());
    for point in points {
        let mut best = 0usize;
        let mut best_distance = f64::INFINITY;
        for (index, place) in remaining.iter().enumerate() {
            let distance = place.position.squared_distance(point);
            if distance < best_distance {
                best_distance = distance;
                best = index;
            }
        }
        ordered.push(remaining.remove(best).id);
    }
    Ok(ordered)
}

/// Heuristic ordering for geometry-only results: each snapshot place
/// binds to its nearest polyline index by squared distance, and places
/// are sorted by (index, distance). This is a re-ordering heuristic, not
/// an assignment: two places may bind to the same polyline index, in
/// which case the distance tie-break decides between them.
fn order_from_geometry(
    snapshot: &PlaceSnapshot,
    geometry: &[GeoPoint],
) -> Result<Vec<PlaceId>, SkipReason> {
    if geometry.is_empty() {
        return Err(SkipReason::EmptyGeometry);
    }
    let mut scored: Vec<(usize, f64, PlaceId)> = snapshot
        .places()
        .iter()
        .map(|place| {
            let mut best_index = 0usize;
            let mut best_distance = f64::INFINITY;
            for (index, vertex) in geometry.iter().enumerate() {
                let distance = place.position.squared_distance(vertex);
                if distance < best_distance {
                    best_distance = distance;
                    best_index = index;
                }
            }
            (best_index, best_distance, place.id)
        })
        .collect();
    scored.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then(a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
    });
    Ok(scored.into_iter().map(|(_, _, id)| id).collect())
}

#[cfg(test)]
mod tests {
    use crate::place::PlaceStore;

    use super::*;

    fn snapshot_of(coords: &[(f64, f64)]) -> (PlaceStore, PlaceSnapshot) {
        let mut store = PlaceStore::new();
        for (index, (lat, lng)) in coords.iter().enumerate() {
            store.add(format!("p{index}"), GeoPoint::new(*lat, *lng));
        }
        let snapshot = store.snapshot();
        (store, snapshot)
    }

    #[test]
    fn permutation_maps_indices_to_snapshot_ids() {
        let (store, snapshot) = snapshot_of(&[(41.0, 29.0), (41.01, 29.01), (41.02, 29.02)]);
        let ids = order_from_permutation(&snapshot, &[2, 0, 1]).unwrap();
        let order = store.order();
        assert_eq!(ids, vec![order[2], order[0], order[1]]);
    }

    #[test]
    fn permutation_rejects_out_of_range_and_duplicates() {
        let (_, snapshot) = snapshot_of(&[(41.0, 29.0), (41.01, 29.01)]);
        assert_eq!(
            order_from_permutation(&snapshot, &[0, 2]),
            Err(SkipReason::NotAPermutation)
        );
        assert_eq!(
            order_from_permutation(&snapshot, &[1, 1]),
            Err(SkipReason::NotAPermutation)
        );
        assert_eq!(
            order_from_permutation(&snapshot, &[0]),
            Err(SkipReason::LengthMismatch)
        );
    }

    #[test]
    fn greedy_matching_is_a_bijection_even_with_close_points() {
        let (store, snapshot) = snapshot_of(&[(41.0, 29.0), (41.0001, 29.0001), (41.5, 29.5)]);
        // Two points near the first two places, both closest to place 0.
        let points = vec![
            GeoPoint::new(41.00001, 29.00001),
            GeoPoint::new(41.00002, 29.00002),
            GeoPoint::new(41.5, 29.5),
        ];
        let ids = order_from_points(&snapshot, &points).unwrap();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 3, "every place assigned exactly once");
        // First point grabs place 0; the second must fall back to place 1.
        let order = store.order();
        assert_eq!(ids[0], order[0]);
        assert_eq!(ids[1], order[1]);
        assert_eq!(ids[2], order[2]);
    }

    #[test]
    fn geometry_ordering_follows_polyline_indices() {
        let (store, snapshot) = snapshot_of(&[(41.02, 29.02), (41.0, 29.0), (41.01, 29.01)]);
        // Polyline visits the places in ascending coordinate order.
        let geometry = vec![
            GeoPoint::new(41.0, 29.0),
            GeoPoint::new(41.01, 29.01),
            GeoPoint::new(41.02, 29.02),
        ];
        let ids = order_from_geometry(&snapshot, &geometry).unwrap();
        let order = store.order();
        assert_eq!(ids, vec![order[1], order[2], order[0]]);
    }

    #[test]
    fn geometry_ordering_breaks_duplicate_bindings_by_distance() {
        // Both places bind to the single polyline vertex; the closer one
        // comes first.
        let (store, snapshot) = snapshot_of(&[(41.1, 29.1), (41.01, 29.01)]);
        let geometry = vec![GeoPoint::new(41.0, 29.0)];
        let ids = order_from_geometry(&snapshot, &geometry).unwrap();
        let order = store.order();
        assert_eq!(ids, vec![order[1], order[0]]);
    }
}
