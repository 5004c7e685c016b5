use std::collections::{HashMap, HashSet};

use super::error::{PlaceError, PlaceResult};
use super::models::{GeoPoint, Place, PlaceId, PlaceUpdate};

/// Ordered collection of user places. The order is part of the state: it
/// is what the marker projector numbers and what reconciliation rewrites.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceStore {
    places: Vec<Place>,
}

impl PlaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from persisted places, keeping their order and ids.
    pub fn from_places(places: Vec<Place>) -> Self {
        Self { places }
    }

    /// Appends a place at the end and assigns it a fresh id.
    pub fn add(&mut self, name: impl Into<String>, position: GeoPoint) -> PlaceId {
        let place = Place {
            id: PlaceId::generate(),
            name: name.into(),
            position,
        };
        let id = place.id;
        self.places.push(place);
        id
    }

    pub fn remove(&mut self, id: PlaceId) -> PlaceResult<Place> {
        let index = self
            .index_of(id)
            .ok_or(PlaceError::UnknownPlace { id })?;
        Ok(self.places.remove(index))
    }

    pub fn update(&mut self, id: PlaceId, update: PlaceUpdate) -> PlaceResult<&Place> {
        let index = self
            .index_of(id)
            .ok_or(PlaceError::UnknownPlace { id })?;
        let place = &mut self.places[index];
        if let Some(name) = update.name {
            place.name = name;
        }
        if let Some(position) = update.position {
            place.position = position;
        }
        Ok(&self.places[index])
    }

    /// Replaces the order with a caller-supplied permutation of the same
    /// id set. Anything short of a bijection leaves the store untouched.
    pub fn reorder(&mut self, sequence: &[PlaceId]) -> PlaceResult<()> {
        if sequence.len() != self.places.len() {
            return Err(PlaceError::OrderMismatch);
        }
        let requested: HashSet<PlaceId> = sequence.iter().copied().collect();
        if requested.len() != sequence.len() || requested != self.id_set() {
            return Err(PlaceError::OrderMismatch);
        }
        let mut by_id: HashMap<PlaceId, Place> =
            self.places.drain(..).map(|place| (place.id, place)).collect();
        for id in sequence {
            if let Some(place) = by_id.remove(id) {
                self.places.push(place);
            }
        }
        Ok(())
    }

    /// Moves a place to position 0, keeping the relative order of the rest.
    pub fn move_to_front(&mut self, id: PlaceId) -> PlaceResult<()> {
        let index = self
            .index_of(id)
            .ok_or(PlaceError::UnknownPlace { id })?;
        if index > 0 {
            let place = self.places.remove(index);
            self.places.insert(0, place);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.places.clear();
    }

    /// Immutable copy used as the basis for a planning request. Results
    /// are interpreted against this copy, not the live store.
    pub fn snapshot(&self) -> PlaceSnapshot {
        PlaceSnapshot {
            places: self.places.clone(),
        }
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn get(&self, id: PlaceId) -> Option<&Place> {
        self.places.iter().find(|place| place.id == id)
    }

    pub fn contains(&self, id: PlaceId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn id_set(&self) -> HashSet<PlaceId> {
        self.places.iter().map(|place| place.id).collect()
    }

    pub fn order(&self) -> Vec<PlaceId> {
        self.places.iter().map(|place| place.id).collect()
    }

    fn index_of(&self, id: PlaceId) -> Option<usize> {
        self.places.iter().position(|place| place.id == id)
    }
}

/// Frozen copy of the store taken before a planning request was issued.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceSnapshot {
    places: Vec<Place>,
}

impl PlaceSnapshot {
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn id_set(&self) -> HashSet<PlaceId> {
        self.places.iter().map(|place| place.id).collect()
    }

    pub fn positions(&self) -> Vec<GeoPoint> {
        self.places.iter().map(|place| place.position).collect()
    }
}
