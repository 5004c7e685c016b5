use waypoint_core::{
    GeoPoint, JsonFileStore, PersistenceAdapter, RouteWorkspace, SqliteStateStore, StateStore,
    TimeBudget,
};

fn populated_workspace() -> RouteWorkspace {
    let mut workspace = RouteWorkspace::new();
    workspace.add_place("Galata", GeoPoint::new(41.0256, 28.9744));
    let anchor = workspace.add_place("Taksim", GeoPoint::new(41.0369, 28.9861));
    workspace.set_place_anchor(anchor).unwrap();
    workspace.set_time_budget(TimeBudget::from_clock("13:00", "15:00").unwrap());
    workspace
}

#[test]
fn json_store_round_trips_session_state() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = PersistenceAdapter::new(JsonFileStore::new(dir.path().join("session.json")));

    let workspace = populated_workspace();
    adapter.save(&workspace.persisted_state()).unwrap();

    let loaded = adapter.load().expect("state should load");
    let mut restored = RouteWorkspace::new();
    restored.restore(loaded);

    assert_eq!(restored.places().len(), 2);
    assert_eq!(restored.places().places()[1].name, "Taksim");
    assert_eq!(restored.anchor(), workspace.anchor());
    assert_eq!(restored.time_budget().minutes, 120);
}

#[test]
fn load_is_full_replace_not_merge() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = PersistenceAdapter::new(JsonFileStore::new(dir.path().join("session.json")));
    adapter.save(&populated_workspace().persisted_state()).unwrap();

    let mut target = RouteWorkspace::new();
    target.add_place("stale local place", GeoPoint::new(0.0, 0.0));
    target.restore(adapter.load().unwrap());

    assert_eq!(target.places().len(), 2);
    assert!(target
        .places()
        .places()
        .iter()
        .all(|place| place.name != "stale local place"));
}

#[test]
fn missing_state_loads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = PersistenceAdapter::new(JsonFileStore::new(dir.path().join("absent.json")));
    assert!(adapter.load().is_none());
}

#[test]
fn corrupt_blob_loads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let store = JsonFileStore::new(&path);
    store
        .set("waypoint.session.v1", "{this is not json")
        .unwrap();

    let adapter = PersistenceAdapter::new(store);
    assert!(adapter.load().is_none());
}

#[test]
fn version_mismatch_loads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("session.json"));
    let adapter = PersistenceAdapter::new(store);

    let mut state = populated_workspace().persisted_state();
    state.version = 99;
    adapter.save(&state).unwrap();

    assert!(adapter.load().is_none());
}

#[test]
fn sqlite_store_round_trips_and_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStateStore::new(dir.path().join("session.sqlite"));
    let adapter = PersistenceAdapter::new(store);

    let mut workspace = populated_workspace();
    adapter.save(&workspace.persisted_state()).unwrap();

    workspace.add_place("Kadıköy", GeoPoint::new(40.9905, 29.0250));
    adapter.save(&workspace.persisted_state()).unwrap();

    let loaded = adapter.load().unwrap();
    assert_eq!(loaded.places.len(), 3);
}

#[test]
fn stores_keep_unrelated_keys_separate() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStateStore::new(dir.path().join("kv.sqlite"));
    store.set("a", "1").unwrap();
    store.set("b", "2").unwrap();
    store.set("a", "3").unwrap();
    assert_eq!(store.get("a").unwrap().as_deref(), Some("3"));
    assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    assert_eq!(store.get("c").unwrap(), None);
}
