//! Diagnostics reported alongside every cross section.
//!
//! Sampling never fails across the builder boundary. Problems with a branch
//! are recorded here (and logged) while the caller receives an empty ring,
//! leaving it to the mesh stage to skip or abort that branch.
//!
//! ```ignore
//! let (section, diagnostics) = builder.sample_cross_section(id, &segment, 8, 1.0, 1.0);
//! if let Some(err) = &diagnostics.error {
//!     eprintln!("branch {id} skipped: {err}");
//! }
//! ```

use std::fmt;

use super::section::SectionError;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SectionDiagnostics {
    /// Number of ring points returned.
    pub point_count: usize,

    /// Samples removed by merge-by-distance.
    pub merged_point_count: usize,

    /// Whether some bezier segment hit the bisection limit before meeting
    /// the angle tolerance.
    pub depth_limited: bool,

    /// Base/top blend factor used for the ring (0 = base curve, 1 = top curve).
    pub blend: f64,

    /// Twirl rotation applied to the ring, radians.
    pub twirl_angle: f64,

    /// The reason the ring is empty, if it is.
    pub error: Option<SectionError>,

    /// Human-readable notes about non-fatal issues.
    ///
    /// Examples:
    /// - "normal parallel to direction; using an arbitrary ring orientation"
    /// - "ring has 2 points, fewer than 3"
    pub warnings: Vec<String>,
}

impl SectionDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics for a ring that could not be produced.
    #[must_use]
    pub fn from_error(error: SectionError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Returns `true` if the ring was produced.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Returns `true` if the ring was produced without warnings or depth limiting.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.error.is_none() && self.warnings.is_empty() && !self.depth_limited
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Folds the diagnostics of another ring into this one, e.g. when
    /// aggregating a whole branch. Counts are summed, flags OR'd, warnings
    /// appended, and the first error is kept.
    pub fn merge(&mut self, other: &SectionDiagnostics) {
        self.point_count += other.point_count;
        self.merged_point_count += other.merged_point_count;
        self.depth_limited = self.depth_limited || other.depth_limited;
        if self.error.is_none() {
            self.error.clone_from(&other.error);
        }
        self.warnings.extend(other.warnings.iter().cloned());
    }

    /// Short summary suitable for logging.
    ///
    /// Format: `"P:{points} [issues...]"`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("P:{}", self.point_count)];
        if self.merged_point_count > 0 {
            parts.push(format!("merged:{}", self.merged_point_count));
        }
        if self.depth_limited {
            parts.push("depth-limited".to_string());
        }
        if !self.warnings.is_empty() {
            parts.push(format!("warnings:{}", self.warnings.len()));
        }
        if let Some(error) = &self.error {
            parts.push(format!("error: {error}"));
        }
        parts.join(" ")
    }
}

impl fmt::Display for SectionDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Section Diagnostics:")?;
        writeln!(f, "  Points: {}", self.point_count)?;
        writeln!(f, "  Blend: {:.4}", self.blend)?;
        writeln!(f, "  Twirl: {:.4} rad", self.twirl_angle)?;
        if self.merged_point_count > 0 {
            writeln!(f, "  Merged points: {}", self.merged_point_count)?;
        }
        if self.depth_limited {
            writeln!(f, "  Tessellation hit the depth limit")?;
        }
        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }
        let status = match &self.error {
            Some(error) => format!("FAILED ({error})"),
            None if self.is_clean() => "CLEAN".to_string(),
            None => "OK (with warnings)".to_string(),
        };
        writeln!(f, "  Status: {status}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_first_error_and_sums_counts() {
        let mut total = SectionDiagnostics {
            point_count: 8,
            ..Default::default()
        };
        let failed = SectionDiagnostics::from_error(SectionError::NotEnoughPolygonSides { sides: 2 });
        let second = SectionDiagnostics::from_error(SectionError::UnregisteredBranch { branch_id: 3 });

        total.merge(&failed);
        total.merge(&second);

        assert_eq!(total.point_count, 8);
        assert_eq!(total.error, Some(SectionError::NotEnoughPolygonSides { sides: 2 }));
        assert!(!total.succeeded());
    }

    #[test]
    fn summary_lists_issues() {
        let mut diag = SectionDiagnostics {
            point_count: 12,
            merged_point_count: 2,
            ..Default::default()
        };
        diag.add_warning("ring has fewer than 3 points after merging");
        assert_eq!(diag.summary(), "P:12 merged:2 warnings:1");
        assert!(diag.to_string().contains("OK (with warnings)"));
    }
}
