pub mod anchor;
pub mod error;
pub mod models;
pub mod store;

pub use anchor::AnchorSelector;
pub use error::{PlaceError, PlaceResult};
pub use models::{Anchor, GeoPoint, Place, PlaceId, PlaceUpdate, TimeBudget, TimeBudgetMode};
pub use store::{PlaceSnapshot, PlaceStore};
