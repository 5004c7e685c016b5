pub mod config;
pub mod error;
pub mod markers;
pub mod persist;
pub mod place;
pub mod route;
pub mod workspace;

pub use config::{
    load_waypoint_config, DefaultsSection, PlannerSection, StorageBackend, StorageSection,
    WaypointConfig,
};
pub use error::{ConfigError, Result};
pub use markers::{
    project, render_layout, FreeStartMarker, MarkerAssignment, MarkerHandle, MarkerLayout,
    MarkerSink,
};
pub use persist::{
    JsonFileStore, PersistError, PersistedState, PersistenceAdapter, SqliteStateStore,
    StateStore, STATE_KEY, STATE_VERSION,
};
pub use place::{
    Anchor, AnchorSelector, GeoPoint, Place, PlaceError, PlaceId, PlaceResult, PlaceSnapshot,
    PlaceStore, PlaceUpdate, TimeBudget, TimeBudgetMode,
};
pub use route::{
    reconcile, HttpRoutePlanner, PlanFailure, PlanOutcome, PlanRequest, Reconciliation,
    RouteOrdering, RoutePlanner, RouteResult, RouteSummary, SkipReason, WirePlanResponse,
};
pub use workspace::{PlanTicket, RouteWorkspace};
