use waypoint_core::{GeoPoint, PlaceError, PlaceStore, PlaceUpdate};

fn store_with(count: usize) -> PlaceStore {
    let mut store = PlaceStore::new();
    for index in 0..count {
        store.add(
            format!("p{index}"),
            GeoPoint::new(41.0 + index as f64 * 0.01, 29.0 + index as f64 * 0.01),
        );
    }
    store
}

#[test]
fn add_appends_and_assigns_unique_ids() {
    let store = store_with(3);
    assert_eq!(store.len(), 3);
    let order = store.order();
    assert_eq!(order.len(), 3);
    assert_ne!(order[0], order[1]);
    assert_eq!(store.places()[0].name, "p0");
    assert_eq!(store.places()[2].name, "p2");
}

#[test]
fn remove_unknown_id_fails() {
    let mut store = store_with(1);
    let gone = store.order()[0];
    store.remove(gone).unwrap();
    assert_eq!(
        store.remove(gone),
        Err(PlaceError::UnknownPlace { id: gone })
    );
}

#[test]
fn update_applies_partial_changes() {
    let mut store = store_with(1);
    let id = store.order()[0];

    store.update(id, PlaceUpdate::name("renamed")).unwrap();
    assert_eq!(store.get(id).unwrap().name, "renamed");
    let original_position = store.get(id).unwrap().position;

    store
        .update(id, PlaceUpdate::position(GeoPoint::new(40.0, 28.0)))
        .unwrap();
    let place = store.get(id).unwrap();
    assert_eq!(place.name, "renamed");
    assert_ne!(place.position, original_position);
}

#[test]
fn reorder_applies_a_valid_permutation() {
    let mut store = store_with(3);
    let order = store.order();
    let reversed = vec![order[2], order[1], order[0]];
    store.reorder(&reversed).unwrap();
    assert_eq!(store.order(), reversed);
    assert_eq!(store.places()[0].name, "p2");
}

#[test]
fn reorder_rejects_non_bijections_and_leaves_store_untouched() {
    let mut store = store_with(3);
    let before = store.order();

    // Wrong length.
    assert_eq!(
        store.reorder(&before[..2]),
        Err(PlaceError::OrderMismatch)
    );
    // Duplicate id.
    assert_eq!(
        store.reorder(&[before[0], before[0], before[1]]),
        Err(PlaceError::OrderMismatch)
    );
    // Foreign id.
    let mut other = PlaceStore::new();
    let foreign = other.add("x", GeoPoint::new(0.0, 0.0));
    assert_eq!(
        store.reorder(&[before[0], before[1], foreign]),
        Err(PlaceError::OrderMismatch)
    );

    assert_eq!(store.order(), before);
}

#[test]
fn snapshot_is_isolated_from_later_edits() {
    let mut store = store_with(2);
    let snapshot = store.snapshot();
    let first = store.order()[0];

    store.add("late", GeoPoint::new(42.0, 30.0));
    store.update(first, PlaceUpdate::name("changed")).unwrap();

    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.places()[0].name, "p0");
    assert_ne!(snapshot.id_set(), store.id_set());
}

#[test]
fn move_to_front_keeps_relative_order_of_the_rest() {
    let mut store = store_with(4);
    let order = store.order();
    store.move_to_front(order[2]).unwrap();
    assert_eq!(
        store.order(),
        vec![order[2], order[0], order[1], order[3]]
    );
}

#[test]
fn clear_empties_the_store() {
    let mut store = store_with(3);
    store.clear();
    assert!(store.is_empty());
    assert!(store.snapshot().is_empty());
}
