use chrono::Utc;
use tracing::{debug, warn};

use crate::markers::{self, MarkerLayout};
use crate::persist::{PersistedState, STATE_VERSION};
use crate::place::{
    Anchor, AnchorSelector, GeoPoint, PlaceId, PlaceResult, PlaceSnapshot, PlaceStore,
    PlaceUpdate, TimeBudget,
};
use crate::route::reconcile::{reconcile, Reconciliation, SkipReason};
use crate::route::{PlanFailure, PlanOutcome, PlanRequest};

/// Everything a planning session owns: the place collection, the start
/// designation, the active time budget and the in-flight request
/// bookkeeping. The engine keeps no state outside this object; the
/// composing application owns it and passes collaborators in.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteWorkspace {
    places: PlaceStore,
    anchor: AnchorSelector,
    time_budget: TimeBudget,
    require_anchor: bool,
    generation: u64,
}

impl Default for RouteWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Frozen request context handed out by [`RouteWorkspace::begin_plan`].
/// The snapshot is what the planner's answer is interpreted against; the
/// generation lets a superseded answer be detected and dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanTicket {
    pub generation: u64,
    pub snapshot: PlaceSnapshot,
    pub request: PlanRequest,
}

impl RouteWorkspace {
    pub fn new() -> Self {
        Self {
            places: PlaceStore::new(),
            anchor: AnchorSelector::new(),
            time_budget: TimeBudget::default(),
            require_anchor: true,
            generation: 0,
        }
    }

    /// Permits planning without a start designation; the first place of
    /// the planner's ordering is promoted to the anchor afterwards.
    pub fn allow_missing_anchor(mut self) -> Self {
        self.require_anchor = false;
        self
    }

    pub fn places(&self) -> &PlaceStore {
        &self.places
    }

    pub fn anchor(&self) -> Option<Anchor> {
        self.anchor.current()
    }

    pub fn time_budget(&self) -> TimeBudget {
        self.time_budget
    }

    pub fn set_time_budget(&mut self, budget: TimeBudget) {
        self.time_budget = budget;
    }

    pub fn add_place(&mut self, name: impl Into<String>, position: GeoPoint) -> PlaceId {
        self.places.add(name, position)
    }

    /// Removes a place and, in the same transaction, clears an anchor
    /// that referenced it. No dangling anchor reference survives a
    /// removal.
    pub fn remove_place(&mut self, id: PlaceId) -> PlaceResult<()> {
        self.places.remove(id)?;
        if self.anchor.prune(&self.places) {
            debug!(target: "workspace", %id, "cleared anchor referencing removed place");
        }
        Ok(())
    }

    pub fn update_place(&mut self, id: PlaceId, update: PlaceUpdate) -> PlaceResult<()> {
        self.places.update(id, update)?;
        Ok(())
    }

    pub fn reorder_places(&mut self, sequence: &[PlaceId]) -> PlaceResult<()> {
        self.places.reorder(sequence)
    }

    pub fn move_place_to_front(&mut self, id: PlaceId) -> PlaceResult<()> {
        self.places.move_to_front(id)
    }

    pub fn clear(&mut self) {
        self.places.clear();
        self.anchor.clear();
    }

    pub fn set_place_anchor(&mut self, id: PlaceId) -> PlaceResult<()> {
        self.anchor.set_place(id, &self.places)
    }

    pub fn set_free_anchor(&mut self, position: GeoPoint) {
        self.anchor.set_free(position);
    }

    pub fn clear_anchor(&mut self) {
        self.anchor.clear();
    }

    /// Validates the current state and freezes it for one planning
    /// request. Each call supersedes any ticket handed out before.
    pub fn begin_plan(&mut self) -> Result<PlanTicket, PlanFailure> {
        if self.places.len() < 2 {
            return Err(PlanFailure::TooFewPlaces {
                count: self.places.len(),
            });
        }
        let anchor = self.anchor.resolve(&self.places);
        if self.require_anchor && anchor.is_none() {
            return Err(PlanFailure::MissingAnchor);
        }
        self.generation += 1;
        let snapshot = self.places.snapshot();
        let request = PlanRequest {
            places: snapshot.positions(),
            time_budget_min: self.time_budget.minutes.max(1),
            anchor,
        };
        Ok(PlanTicket {
            generation: self.generation,
            snapshot,
            request,
        })
    }

    /// Reconciles a planner result against the live state. A result from
    /// a superseded ticket is dropped wholesale, even when the place set
    /// did not change in the meantime.
    pub fn apply_outcome(&mut self, ticket: &PlanTicket, outcome: PlanOutcome) -> Reconciliation {
        if ticket.generation != self.generation {
            warn!(
                target: "workspace",
                ticket = ticket.generation,
                current = self.generation,
                "dropping planner result from superseded request"
            );
            let PlanOutcome {
                geometry, summary, ..
            } = outcome;
            return Reconciliation::skipped(SkipReason::StaleGeneration, geometry, summary);
        }
        reconcile(&ticket.snapshot, &mut self.places, &mut self.anchor, outcome)
    }

    /// Derives the marker presentation for the current state.
    pub fn marker_layout(&self) -> MarkerLayout {
        markers::project(self.places.places(), self.anchor.current())
    }

    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            version: STATE_VERSION,
            places: self.places.places().to_vec(),
            anchor: self.anchor.current(),
            time_budget: self.time_budget,
            saved_at: Utc::now(),
        }
    }

    /// Full-replace restore. A persisted place anchor pointing outside
    /// the restored set is dropped.
    pub fn restore(&mut self, state: PersistedState) {
        self.places = PlaceStore::from_places(state.places);
        self.anchor = AnchorSelector::new();
        match state.anchor {
            Some(Anchor::Free { position }) => self.anchor.set_free(position),
            Some(Anchor::Place { id }) => {
                if self.anchor.set_place(id, &self.places).is_err() {
                    warn!(target: "workspace", %id, "persisted anchor references unknown place, dropping");
                }
            }
            None => {}
        }
        self.time_budget = state.time_budget;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace_with(count: usize) -> RouteWorkspace {
        let mut workspace = RouteWorkspace::new();
        for index in 0..count {
            workspace.add_place(
                format!("p{index}"),
                GeoPoint::new(41.0 + index as f64 * 0.01, 29.0 + index as f64 * 0.01),
            );
        }
        workspace
    }

    #[test]
    fn begin_plan_requires_two_places() {
        let mut workspace = workspace_with(1);
        assert!(matches!(
            workspace.begin_plan(),
            Err(PlanFailure::TooFewPlaces { count: 1 })
        ));
    }

    #[test]
    fn begin_plan_requires_anchor_by_default() {
        let mut workspace = workspace_with(2);
        assert!(matches!(
            workspace.begin_plan(),
            Err(PlanFailure::MissingAnchor)
        ));

        let mut relaxed = workspace_with(2).allow_missing_anchor();
        let ticket = relaxed.begin_plan().unwrap();
        assert!(ticket.request.anchor.is_none());
        assert_eq!(ticket.request.places.len(), 2);
    }

    #[test]
    fn place_anchor_resolves_to_live_coordinates() {
        let mut workspace = workspace_with(2);
        let first = workspace.places().order()[0];
        workspace.set_place_anchor(first).unwrap();
        workspace
            .update_place(first, PlaceUpdate::position(GeoPoint::new(40.5, 28.5)))
            .unwrap();
        let ticket = workspace.begin_plan().unwrap();
        assert_eq!(ticket.request.anchor, Some(GeoPoint::new(40.5, 28.5)));
    }

    #[test]
    fn removing_anchored_place_clears_anchor() {
        let mut workspace = workspace_with(3);
        let first = workspace.places().order()[0];
        workspace.set_place_anchor(first).unwrap();
        workspace.remove_place(first).unwrap();
        assert_eq!(workspace.anchor(), None);
        assert!(workspace.marker_layout().start().is_none());
    }

    #[test]
    fn free_anchor_survives_place_removal() {
        let mut workspace = workspace_with(2);
        workspace.set_free_anchor(GeoPoint::new(41.0, 29.0));
        let first = workspace.places().order()[0];
        workspace.remove_place(first).unwrap();
        assert!(matches!(workspace.anchor(), Some(Anchor::Free { .. })));
    }

    #[test]
    fn restore_drops_dangling_place_anchor() {
        let mut source = workspace_with(2);
        let first = source.places().order()[0];
        source.set_place_anchor(first).unwrap();
        let mut state = source.persisted_state();
        state.places.retain(|place| place.id != first);

        let mut restored = RouteWorkspace::new();
        restored.restore(state);
        assert_eq!(restored.anchor(), None);
        assert_eq!(restored.places().len(), 1);
    }
}
