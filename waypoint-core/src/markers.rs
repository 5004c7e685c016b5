use serde::Serialize;

use crate::place::{Anchor, GeoPoint, Place, PlaceId};

/// Marker slot derived for one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkerAssignment {
    pub place_id: PlaceId,
    pub number: u32,
    pub is_start: bool,
}

/// Synthetic slot-1 marker for a free-floating anchor. It is not backed
/// by any place and survives place removals and edits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FreeStartMarker {
    pub position: GeoPoint,
    pub number: u32,
}

/// Complete derived marker presentation. Re-derived in full after every
/// mutation of the store or the anchor; never patched incrementally.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarkerLayout {
    pub free_start: Option<FreeStartMarker>,
    /// One assignment per place, in stored order.
    pub markers: Vec<MarkerAssignment>,
}

impl MarkerLayout {
    pub fn assignment(&self, id: PlaceId) -> Option<MarkerAssignment> {
        self.markers
            .iter()
            .copied()
            .find(|marker| marker.place_id == id)
    }

    /// The place-backed start marker, if any.
    pub fn start(&self) -> Option<MarkerAssignment> {
        self.markers.iter().copied().find(|marker| marker.is_start)
    }
}

/// Pure projection of (ordered places, anchor) to numbered markers.
///
/// A place anchor is relabeled, not rotated: the anchored place keeps its
/// stored position and takes number 1 with the start flag, while the
/// remaining places take 2..N in stored relative order. Callers that want
/// storage order to match display order use [`PlaceStore::move_to_front`]
/// before projecting.
///
/// [`PlaceStore::move_to_front`]: crate::place::PlaceStore::move_to_front
pub fn project(places: &[Place], anchor: Option<Anchor>) -> MarkerLayout {
    match anchor {
        Some(Anchor::Free { position }) => MarkerLayout {
            free_start: Some(FreeStartMarker {
                position,
                number: 1,
            }),
            markers: places
                .iter()
                .enumerate()
                .map(|(index, place)| MarkerAssignment {
                    place_id: place.id,
                    number: index as u32 + 2,
                    is_start: false,
                })
                .collect(),
        },
        Some(Anchor::Place { id }) if places.iter().any(|place| place.id == id) => {
            let mut next = 2u32;
            let markers = places
                .iter()
                .map(|place| {
                    if place.id == id {
                        MarkerAssignment {
                            place_id: place.id,
                            number: 1,
                            is_start: true,
                        }
                    } else {
                        let number = next;
                        next += 1;
                        MarkerAssignment {
                            place_id: place.id,
                            number,
                            is_start: false,
                        }
                    }
                })
                .collect();
            MarkerLayout {
                free_start: None,
                markers,
            }
        }
        // A dangling place anchor degrades to plain numbering.
        _ => MarkerLayout {
            free_start: None,
            markers: places
                .iter()
                .enumerate()
                .map(|(index, place)| MarkerAssignment {
                    place_id: place.id,
                    number: index as u32 + 1,
                    is_start: false,
                })
                .collect(),
        },
    }
}

/// Handle the rendering layer uses to address markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerHandle {
    Place(PlaceId),
    FreeStart,
}

/// Rendering-layer collaborator (a mapping widget). The engine computes
/// what should be drawn and pushes it through this seam; it never draws
/// pixels itself.
pub trait MarkerSink {
    fn add_marker(&mut self, handle: MarkerHandle, position: GeoPoint);
    fn set_icon(&mut self, handle: MarkerHandle, number: u32, is_start: bool);
    fn remove_marker(&mut self, handle: MarkerHandle);
    fn draw_polyline(&mut self, points: &[GeoPoint]);
    fn fit_bounds(&mut self, points: &[GeoPoint]);
}

/// Pushes a freshly derived layout, and optionally route geometry, into
/// the rendering layer. Markers for places no longer present must be
/// removed by the caller; this only draws the current state.
pub fn render_layout(
    sink: &mut dyn MarkerSink,
    places: &[Place],
    layout: &MarkerLayout,
    geometry: Option<&[GeoPoint]>,
) {
    match &layout.free_start {
        Some(free) => {
            sink.add_marker(MarkerHandle::FreeStart, free.position);
            sink.set_icon(MarkerHandle::FreeStart, free.number, true);
        }
        None => sink.remove_marker(MarkerHandle::FreeStart),
    }
    for assignment in &layout.markers {
        if let Some(place) = places.iter().find(|place| place.id == assignment.place_id) {
            let handle = MarkerHandle::Place(place.id);
            sink.add_marker(handle, place.position);
            sink.set_icon(handle, assignment.number, assignment.is_start);
        }
    }
    if let Some(points) = geometry {
        sink.draw_polyline(points);
        sink.fit_bounds(points);
    }
}
