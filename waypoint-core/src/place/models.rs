use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{PlaceError, PlaceResult};

/// Geographic coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Squared distance in coordinate space. Only ever compared against
    /// other squared distances over nearby points; never reported as a
    /// real-world length.
    pub fn squared_distance(&self, other: &GeoPoint) -> f64 {
        let dlat = self.lat - other.lat;
        let dlng = self.lng - other.lng;
        dlat * dlat + dlng * dlng
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// Opaque stable identifier of a place. The id never changes and is the
/// only join key that survives reorderings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlaceId(Uuid);

impl PlaceId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_simple())
    }
}

impl FromStr for PlaceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A user-added point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    pub position: GeoPoint,
}

/// Partial mutation applied to an existing place (rename, drag).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceUpdate {
    pub name: Option<String>,
    pub position: Option<GeoPoint>,
}

impl PlaceUpdate {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            position: None,
        }
    }

    pub fn position(position: GeoPoint) -> Self {
        Self {
            name: None,
            position: Some(position),
        }
    }
}

/// The start designation of a route: either an existing place or a
/// free-floating coordinate with its own lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Anchor {
    Place { id: PlaceId },
    Free { position: GeoPoint },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBudgetMode {
    Quick,
    Slider,
    Clock,
}

impl TimeBudgetMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeBudgetMode::Quick => "quick",
            TimeBudgetMode::Slider => "slider",
            TimeBudgetMode::Clock => "clock",
        }
    }
}

impl fmt::Display for TimeBudgetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeBudgetMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quick" => Ok(TimeBudgetMode::Quick),
            "slider" => Ok(TimeBudgetMode::Slider),
            "clock" => Ok(TimeBudgetMode::Clock),
            other => Err(format!("unknown time budget mode: {other}")),
        }
    }
}

/// Time constraint for a planning request, together with the input mode
/// the user picked it with (the mode is persisted so the UI restores the
/// same control).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeBudget {
    pub minutes: u32,
    pub mode: TimeBudgetMode,
}

impl Default for TimeBudget {
    fn default() -> Self {
        Self {
            minutes: 120,
            mode: TimeBudgetMode::Quick,
        }
    }
}

impl TimeBudget {
    pub fn quick(minutes: u32) -> Self {
        Self {
            minutes,
            mode: TimeBudgetMode::Quick,
        }
    }

    pub fn slider(minutes: u32) -> Self {
        Self {
            minutes,
            mode: TimeBudgetMode::Slider,
        }
    }

    /// Derives the budget from a wall-clock interval in `HH:MM` notation.
    /// An end before the start wraps past midnight.
    pub fn from_clock(start: &str, end: &str) -> PlaceResult<Self> {
        let start_min = parse_clock(start)?;
        let end_min = parse_clock(end)?;
        let mut minutes = end_min as i64 - start_min as i64;
        if minutes < 0 {
            minutes += 24 * 60;
        }
        Ok(Self {
            minutes: minutes as u32,
            mode: TimeBudgetMode::Clock,
        })
    }
}

fn parse_clock(value: &str) -> PlaceResult<u32> {
    let invalid = || PlaceError::InvalidClock {
        value: value.to_string(),
    };
    let (hours, minutes) = value.split_once(':').ok_or_else(invalid)?;
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    Ok(hours * 60 + minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_budget_computes_span() {
        let budget = TimeBudget::from_clock("13:00", "15:30").unwrap();
        assert_eq!(budget.minutes, 150);
        assert_eq!(budget.mode, TimeBudgetMode::Clock);
    }

    #[test]
    fn clock_budget_wraps_past_midnight() {
        let budget = TimeBudget::from_clock("23:30", "01:00").unwrap();
        assert_eq!(budget.minutes, 90);
    }

    #[test]
    fn clock_budget_rejects_garbage() {
        assert!(TimeBudget::from_clock("25:00", "26:00").is_err());
        assert!(TimeBudget::from_clock("noon", "14:00").is_err());
        assert!(TimeBudget::from_clock("12:61", "14:00").is_err());
    }

    #[test]
    fn place_id_round_trips_through_display() {
        let id = PlaceId::generate();
        let parsed: PlaceId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
