use serde::{Deserialize, Serialize};

use crate::geom::{CurveTessellationOptions, DEFAULT_ANGLE_TOLERANCE_DEGREES, DEFAULT_MERGE_DISTANCE};

/// Builder-wide configuration shared by every branch of a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BarkSettings {
    /// Maximum turning angle between ring samples, degrees.
    pub angle_tolerance_degrees: f64,
    /// Merge ring samples closer than `merge_distance`.
    pub merge_by_distance: bool,
    /// Measured on the registered profile, whose radius is the skin girth
    /// at registration. Rings sampled with a different girth or scale keep
    /// the same point count, so the threshold is not rescaled with them.
    pub merge_distance: f64,
    /// Bisection limit per bezier segment.
    pub max_depth: usize,
    /// Seed for the jitter generator; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for BarkSettings {
    fn default() -> Self {
        Self {
            angle_tolerance_degrees: DEFAULT_ANGLE_TOLERANCE_DEGREES,
            merge_by_distance: false,
            merge_distance: DEFAULT_MERGE_DISTANCE,
            max_depth: 12,
            seed: None,
        }
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum SettingsError {
    #[error("angle tolerance must be finite and > 0 degrees, got {0}")]
    InvalidAngleTolerance(f64),
    #[error("merge distance must be finite and >= 0, got {0}")]
    InvalidMergeDistance(f64),
    #[error("max depth must be at least 1")]
    ZeroMaxDepth,
}

impl BarkSettings {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.angle_tolerance_degrees.is_finite() || self.angle_tolerance_degrees <= 0.0 {
            return Err(SettingsError::InvalidAngleTolerance(self.angle_tolerance_degrees));
        }
        if !self.merge_distance.is_finite() || self.merge_distance < 0.0 {
            return Err(SettingsError::InvalidMergeDistance(self.merge_distance));
        }
        if self.max_depth == 0 {
            return Err(SettingsError::ZeroMaxDepth);
        }
        Ok(())
    }

    #[must_use]
    pub fn tessellation_options(&self) -> CurveTessellationOptions {
        CurveTessellationOptions {
            angle_tolerance: self.angle_tolerance_degrees.to_radians(),
            merge_by_distance: self.merge_by_distance,
            merge_distance: self.merge_distance,
            max_depth: self.max_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = BarkSettings::default();
        assert!(settings.validate().is_ok());
        assert!((settings.tessellation_options().angle_tolerance - 10f64.to_radians()).abs() < 1e-15);
        assert_eq!(settings.merge_distance, 0.05);
    }

    #[test]
    fn rejects_bad_values() {
        let settings = BarkSettings {
            angle_tolerance_degrees: 0.0,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(SettingsError::InvalidAngleTolerance(0.0)));

        let settings = BarkSettings {
            merge_distance: -1.0,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(SettingsError::InvalidMergeDistance(-1.0)));

        let settings = BarkSettings {
            max_depth: 0,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(SettingsError::ZeroMaxDepth));
    }
}
