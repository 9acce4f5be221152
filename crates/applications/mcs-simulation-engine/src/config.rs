//! Generator configuration and the simulated time window

use std::path::Path;

use mcs_core::{BoundingBox, GeoPoint, McsError, Result, SimulationParameters};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// Reference center used when none is configured (Thessaloniki city center)
pub const DEFAULT_CENTER: GeoPoint = GeoPoint {
    latitude: 40.6401,
    longitude: 22.9444,
};

/// Radius of the disk user start positions are drawn from (degrees, ≈5 km)
pub const DEFAULT_SEED_RADIUS_DEG: f64 = 0.05;

/// Half-span of the task box when there are no movements to bound (degrees)
pub const DEFAULT_BOX_HALF_SPAN_DEG: f64 = 0.05;

/// Spatial settings shared by the mobility and task generators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub center: GeoPoint,
    pub seed_radius_deg: f64,
    pub default_box_half_span_deg: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            center: DEFAULT_CENTER,
            seed_radius_deg: DEFAULT_SEED_RADIUS_DEG,
            default_box_half_span_deg: DEFAULT_BOX_HALF_SPAN_DEG,
        }
    }
}

impl GeneratorConfig {
    /// Task box used when no movement events exist
    pub fn default_box(&self) -> BoundingBox {
        BoundingBox::around(self.center, self.default_box_half_span_deg)
    }
}

/// Half-open interval `[start, end)` in epoch seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationWindow {
    pub start: f64,
    pub end: f64,
}

impl SimulationWindow {
    /// Window of `days` whole days ending at `end`
    pub fn ending_at(end: f64, days: u32) -> Result<Self> {
        if days == 0 {
            return Err(McsError::invalid("simulation window needs at least one day"));
        }
        if !end.is_finite() {
            return Err(McsError::invalid(format!("window end {} is not finite", end)));
        }
        Ok(SimulationWindow {
            start: end - days as f64 * 86_400.0,
            end,
        })
    }

    /// Window of `days` whole days ending now
    pub fn ending_now(days: u32) -> Result<Self> {
        Self::ending_at(now_epoch_seconds(), days)
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, timestamp: f64) -> bool {
        timestamp >= self.start && timestamp < self.end
    }
}

/// Current wall-clock time in epoch seconds
pub fn now_epoch_seconds() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Load simulation parameters from a JSON file; missing fields take defaults
pub fn load_parameters(path: &Path) -> StoreResult<SimulationParameters> {
    let text = std::fs::read_to_string(path)?;
    let params = serde_json::from_str(&text)?;
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcs_core::LocomotionType;
    use std::io::Write;

    #[test]
    fn test_window_length() {
        let window = SimulationWindow::ending_at(1_000_000.0, 2).unwrap();
        assert_eq!(window.end, 1_000_000.0);
        assert_eq!(window.duration(), 172_800.0);
        assert!(window.contains(window.start));
        assert!(!window.contains(window.end));
    }

    #[test]
    fn test_window_rejects_zero_days() {
        assert!(SimulationWindow::ending_at(1_000.0, 0).is_err());
        assert!(SimulationWindow::ending_at(f64::NAN, 1).is_err());
    }

    #[test]
    fn test_default_box_is_centered() {
        let config = GeneratorConfig::default();
        let bbox = config.default_box();
        assert!(bbox.contains(config.center));
        assert!((bbox.max_latitude - bbox.min_latitude - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_load_parameters_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"days": 2, "number_of_users": 7, "locomotion_type": "bike", "platform_type": "FOG-MCS"}}"#
        )
        .unwrap();

        let params = load_parameters(file.path()).unwrap();
        assert_eq!(params.days, 2);
        assert_eq!(params.number_of_users, 7);
        assert_eq!(params.locomotion_type, LocomotionType::Bike);
        assert_eq!(params.platform_type, mcs_core::PlatformType::FogMcs);
    }

    #[test]
    fn test_load_parameters_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "days = 2").unwrap();
        assert!(load_parameters(file.path()).is_err());
    }
}
