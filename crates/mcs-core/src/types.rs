//! Core types shared across the simulation components

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{McsError, Result};

/// Movement mode of a synthetic user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocomotionType {
    #[default]
    Walk,
    Bike,
    Drive,
}

impl LocomotionType {
    /// Speed range in meters per second, inclusive on both ends
    pub fn speed_range(&self) -> (f64, f64) {
        match self {
            LocomotionType::Walk => (1.0, 1.5),
            LocomotionType::Bike => (2.7, 5.5),
            LocomotionType::Drive => (5.5, 13.9),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LocomotionType::Walk => "walk",
            LocomotionType::Bike => "bike",
            LocomotionType::Drive => "drive",
        }
    }

    /// Parse a locomotion name, falling back to walking for unknown names
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for LocomotionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LocomotionType {
    type Err = McsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "walk" => Ok(LocomotionType::Walk),
            "bike" => Ok(LocomotionType::Bike),
            "drive" => Ok(LocomotionType::Drive),
            other => Err(McsError::invalid(format!("unknown locomotion type '{}'", other))),
        }
    }
}

/// Sensing platform the scenario targets.
///
/// Carried through runs and persisted, but candidate matching does not
/// depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlatformType {
    #[default]
    #[serde(rename = "MCS")]
    Mcs,
    #[serde(rename = "FOG-MCS")]
    FogMcs,
    #[serde(rename = "MEC-MCS")]
    MecMcs,
}

impl PlatformType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformType::Mcs => "MCS",
            PlatformType::FogMcs => "FOG-MCS",
            PlatformType::MecMcs => "MEC-MCS",
        }
    }
}

impl fmt::Display for PlatformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlatformType {
    type Err = McsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().replace('_', "-").as_str() {
            "MCS" => Ok(PlatformType::Mcs),
            "FOG-MCS" | "FOGMCS" => Ok(PlatformType::FogMcs),
            "MEC-MCS" | "MECMCS" => Ok(PlatformType::MecMcs),
            other => Err(McsError::invalid(format!("unknown platform type '{}'", other))),
        }
    }
}

/// Parameters of a single simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Length of the simulated window in days
    pub days: u32,
    pub number_of_users: u32,
    pub locomotion_type: LocomotionType,
    pub number_of_tasks: u32,
    /// Task catchment radius in meters
    pub execution_range: f64,
    /// Task duration in minutes
    pub task_duration: u32,
    /// Timeslot duration in minutes
    pub timeslot_duration: u32,
    pub platform_type: PlatformType,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        SimulationParameters {
            days: 1,
            number_of_users: 50,
            locomotion_type: LocomotionType::Walk,
            number_of_tasks: 20,
            execution_range: 500.0,
            task_duration: 60,
            timeslot_duration: 15,
            platform_type: PlatformType::Mcs,
        }
    }
}

impl SimulationParameters {
    /// Check that every count and duration is strictly positive
    pub fn validate(&self) -> Result<()> {
        if self.days == 0 {
            return Err(McsError::invalid("days must be greater than zero"));
        }
        if self.number_of_users == 0 {
            return Err(McsError::invalid("number_of_users must be greater than zero"));
        }
        if self.number_of_tasks == 0 {
            return Err(McsError::invalid("number_of_tasks must be greater than zero"));
        }
        if !self.execution_range.is_finite() || self.execution_range <= 0.0 {
            return Err(McsError::invalid(format!(
                "execution_range must be a positive number of meters, got {}",
                self.execution_range
            )));
        }
        if self.task_duration == 0 {
            return Err(McsError::invalid("task_duration must be greater than zero"));
        }
        if self.timeslot_duration == 0 {
            return Err(McsError::invalid("timeslot_duration must be greater than zero"));
        }
        Ok(())
    }

    /// Length of the simulated window in seconds
    pub fn window_seconds(&self) -> f64 {
        self.days as f64 * 86_400.0
    }
}

/// A point in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        GeoPoint { latitude, longitude }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Latitude/longitude extent, bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    /// Box spanning `half_span` degrees on each side of `center`
    pub fn around(center: GeoPoint, half_span: f64) -> Self {
        BoundingBox {
            min_latitude: center.latitude - half_span,
            max_latitude: center.latitude + half_span,
            min_longitude: center.longitude - half_span,
            max_longitude: center.longitude + half_span,
        }
    }

    /// Smallest box enclosing every point; `None` for an empty input
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = GeoPoint>,
    {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => BoundingBox {
                    min_latitude: p.latitude,
                    max_latitude: p.latitude,
                    min_longitude: p.longitude,
                    max_longitude: p.longitude,
                },
                Some(b) => BoundingBox {
                    min_latitude: b.min_latitude.min(p.latitude),
                    max_latitude: b.max_latitude.max(p.latitude),
                    min_longitude: b.min_longitude.min(p.longitude),
                    max_longitude: b.max_longitude.max(p.longitude),
                },
            })
        })
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&point.latitude)
            && (self.min_longitude..=self.max_longitude).contains(&point.longitude)
    }
}

/// One stop along a synthetic user's random walk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMovementEvent {
    pub user_id: u32,
    pub latitude: f64,
    pub longitude: f64,
    /// Epoch seconds
    pub timestamp: f64,
    /// Whole days elapsed since the start of the simulated window
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl UserMovementEvent {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// A sensing task placed in space and time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: u32,
    pub latitude: f64,
    pub longitude: f64,
    /// Epoch seconds
    pub timestamp: f64,
    /// Minutes
    pub duration: u32,
    /// Execution range in meters
    pub distance: f64,
    /// Timeslot duration in minutes
    pub timeslots: u32,
}

impl Task {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Candidate count for one task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub task_id: u32,
    pub candidates: u32,
}
