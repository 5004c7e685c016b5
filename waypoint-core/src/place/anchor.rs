use super::error::{PlaceError, PlaceResult};
use super::models::{Anchor, GeoPoint, PlaceId};
use super::store::PlaceStore;

/// Holds the start designation. At most one anchor is active at a time;
/// setting either variant replaces the other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnchorSelector {
    current: Option<Anchor>,
}

impl AnchorSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Designates an existing place as the start.
    pub fn set_place(&mut self, id: PlaceId, store: &PlaceStore) -> PlaceResult<()> {
        if !store.contains(id) {
            return Err(PlaceError::InvalidReference { id });
        }
        self.current = Some(Anchor::Place { id });
        Ok(())
    }

    /// Designates a coordinate not backed by any place. Survives place
    /// removals and edits.
    pub fn set_free(&mut self, position: GeoPoint) {
        self.current = Some(Anchor::Free { position });
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<Anchor> {
        self.current
    }

    pub fn is_set(&self) -> bool {
        self.current.is_some()
    }

    /// The referenced place id, when the anchor is place-backed.
    pub fn place_id(&self) -> Option<PlaceId> {
        match self.current {
            Some(Anchor::Place { id }) => Some(id),
            _ => None,
        }
    }

    /// Resolves the anchor to coordinates at request time. A place anchor
    /// reads the live place, so drags are picked up.
    pub fn resolve(&self, store: &PlaceStore) -> Option<GeoPoint> {
        match self.current? {
            Anchor::Free { position } => Some(position),
            Anchor::Place { id } => store.get(id).map(|place| place.position),
        }
    }

    /// Drops a place anchor whose target no longer exists in the store.
    /// Returns whether anything was cleared.
    pub fn prune(&mut self, store: &PlaceStore) -> bool {
        if let Some(Anchor::Place { id }) = self.current {
            if !store.contains(id) {
                self.current = None;
                return true;
            }
        }
        false
    }
}
