//! Bark cross-section builder.
//!
//! A [`BarkSectionBuilder`] owns the branch registry for one generation run.
//! Branches are registered once (baking all randomness into a base and a top
//! profile curve) and then sampled ring by ring as the mesh stage walks the
//! branch skin:
//!
//! ```ignore
//! use bark_engine::bark::{BarkSectionBuilder, BarkSettings, BranchRegistration, SampledBranchSkin};
//!
//! let mut builder = BarkSectionBuilder::new(BarkSettings::seeded(7))?;
//! let skin = SampledBranchSkin::tapered(4.0, 0.5, 0.2);
//! builder.register_branch(1, &skin, &BranchRegistration { valid_range: 4.0, ..Default::default() })?;
//!
//! for segment in skin.straight_segments(origin, Vec3::Y, Vec3::Z, 4.0, 8) {
//!     let count = builder.segment_count_at(1, segment.position);
//!     let (ring, _) = builder.sample_cross_section(1, &segment, 8, 1.0, 1.0);
//!     assert_eq!(ring.points.len(), count);
//! }
//! ```

use std::f64::consts::TAU;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::geom::{
    BezierCurve, BezierError, CurvePoint, CurveTessellationOptions, Point3, TessellationDiagnostics,
    Tolerance, Transform, Vec3, inverse_lerp,
};

use super::circle::{apply_base_displacement, build_circle};
use super::diagnostics::SectionDiagnostics;
use super::jitter::JitterSource;
use super::registry::{BranchEntry, BranchId, BranchInfo, BranchRegistration, BranchRegistry};
use super::settings::{BarkSettings, SettingsError};
use super::skin::{BranchSkin, SkinSegment};

/// Smallest polygon a ring may be requested with.
pub const MIN_POLYGON_SIDES: usize = 3;

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum SectionError {
    #[error("cross section requires at least 3 polygon sides, got {sides}")]
    NotEnoughPolygonSides { sides: usize },
    #[error("branch {branch_id} is not registered")]
    UnregisteredBranch { branch_id: BranchId },
    #[error("profile tessellated to {point_count} points; at least 2 are required")]
    DegenerateCurve { point_count: usize },
    #[error("cross section inputs must be finite")]
    NonFiniteInput,
    #[error(transparent)]
    Bezier(BezierError),
}

impl From<BezierError> for SectionError {
    fn from(err: BezierError) -> Self {
        match err {
            BezierError::DegenerateCurve { node_count } => Self::DegenerateCurve {
                point_count: node_count,
            },
            BezierError::NonFiniteInput => Self::NonFiniteInput,
            other => Self::Bezier(other),
        }
    }
}

/// One ring of a branch: world-space points plus the arc-length fraction of
/// each point around the ring (for UV mapping).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CrossSection {
    pub points: Vec<Point3>,
    pub relative_positions: Vec<f64>,
}

impl CrossSection {
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Interpolated, tessellated profile with the closing duplicate removed.
struct Ring<'a> {
    info: &'a BranchInfo,
    blend: f64,
    points: Vec<CurvePoint>,
    tessellation: TessellationDiagnostics,
}

pub struct BarkSectionBuilder<J = StdRng> {
    settings: BarkSettings,
    tessellation: CurveTessellationOptions,
    registry: BranchRegistry,
    jitter: J,
}

impl BarkSectionBuilder<StdRng> {
    /// Builder with a `StdRng` seeded from `settings.seed`, or from OS
    /// entropy when no seed is set.
    pub fn new(settings: BarkSettings) -> Result<Self, SettingsError> {
        let jitter = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_jitter(settings, jitter)
    }
}

impl<J: JitterSource> BarkSectionBuilder<J> {
    pub fn with_jitter(settings: BarkSettings, jitter: J) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            tessellation: settings.tessellation_options(),
            settings,
            registry: BranchRegistry::new(),
            jitter,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &BarkSettings {
        &self.settings
    }

    #[must_use]
    pub const fn tessellation_options(&self) -> CurveTessellationOptions {
        self.tessellation
    }

    #[must_use]
    pub fn registry(&self) -> &BranchRegistry {
        &self.registry
    }

    pub fn jitter_mut(&mut self) -> &mut J {
        &mut self.jitter
    }

    /// Drops every registered branch.
    pub fn clear(&mut self) {
        self.registry.clear();
    }

    /// Registers a branch's base and top profiles.
    ///
    /// Girths are read from `skin` at position 0 and at `valid_range`. The
    /// top profile is a jittered circle; the base profile is a jittered
    /// circle with every other node displaced. Everything is built before
    /// the entry is published, so a failed registration leaves no trace.
    ///
    /// Returns `Ok(false)` without drawing any randomness if `branch_id` is
    /// already registered: the first registration wins.
    pub fn register_branch<S: BranchSkin + ?Sized>(
        &mut self,
        branch_id: BranchId,
        skin: &S,
        registration: &BranchRegistration,
    ) -> Result<bool, SectionError> {
        if self.registry.contains(branch_id) {
            log::debug!("branch {branch_id} already registered; keeping first registration");
            return Ok(false);
        }
        if !registration.is_finite() {
            return Err(SectionError::NonFiniteInput);
        }

        let base_girth = skin.girth_at(0.0);
        let top_girth = skin.girth_at(registration.valid_range);
        if !base_girth.is_finite() || !top_girth.is_finite() {
            return Err(SectionError::NonFiniteInput);
        }

        let top_curve = build_circle(
            registration.jitter_points,
            top_girth,
            registration.min_angle_jitter,
            registration.max_angle_jitter,
            &mut self.jitter,
        )?;
        let mut base_curve = build_circle(
            registration.jitter_points,
            base_girth,
            registration.min_angle_jitter,
            registration.max_angle_jitter,
            &mut self.jitter,
        )?;
        apply_base_displacement(
            &mut base_curve,
            registration.min_base_scale,
            registration.max_base_scale,
            &mut self.jitter,
        );

        let entry = BranchEntry {
            info: BranchInfo::from_registration(registration, base_girth, top_girth),
            base_curve,
            top_curve,
        };
        let published = self.registry.publish(branch_id, entry);
        log::debug!(
            "registered branch {branch_id}: base girth {base_girth:.4}, top girth {top_girth:.4}, {} nodes",
            registration.jitter_points.saturating_mul(2)
        );
        Ok(published)
    }

    /// Number of points [`Self::sample_cross_section`] returns for this
    /// branch at `position`, or 0 if no ring can be produced.
    #[must_use]
    pub fn segment_count_at(&self, branch_id: BranchId, position: f64) -> usize {
        self.try_segment_count_at(branch_id, position)
            .unwrap_or_else(|err| {
                report(branch_id, &err);
                0
            })
    }

    pub fn try_segment_count_at(&self, branch_id: BranchId, position: f64) -> Result<usize, SectionError> {
        Ok(self.interpolated_ring(branch_id, position)?.points.len())
    }

    /// Builds the ring for one skin segment.
    ///
    /// Never fails: problems are logged and returned in the diagnostics
    /// next to an empty cross section.
    #[must_use]
    pub fn sample_cross_section(
        &self,
        branch_id: BranchId,
        segment: &SkinSegment,
        polygon_sides: usize,
        scale: f64,
        radius_scale: f64,
    ) -> (CrossSection, SectionDiagnostics) {
        match self.try_sample_cross_section(branch_id, segment, polygon_sides, scale, radius_scale) {
            Ok(result) => result,
            Err(err) => {
                report(branch_id, &err);
                (CrossSection::default(), SectionDiagnostics::from_error(err))
            }
        }
    }

    /// Builds the ring for one skin segment.
    ///
    /// The profile is the base/top blend at `segment.position`, twirled by
    /// the branch twirl (fading to zero toward the top), rescaled from the
    /// profile's own girth to `segment.girth * scale * radius_scale`,
    /// oriented so the ring is perpendicular to `segment.direction` with its
    /// local +Y toward `segment.normal`, and moved to `segment.center * scale`.
    ///
    /// # Errors
    /// - [`SectionError::UnregisteredBranch`] if `branch_id` was never registered.
    /// - [`SectionError::NotEnoughPolygonSides`] if `polygon_sides < 3`.
    /// - [`SectionError::NonFiniteInput`] for non-finite segment data or scales.
    /// - [`SectionError::DegenerateCurve`] if the profile cannot be tessellated.
    pub fn try_sample_cross_section(
        &self,
        branch_id: BranchId,
        segment: &SkinSegment,
        polygon_sides: usize,
        scale: f64,
        radius_scale: f64,
    ) -> Result<(CrossSection, SectionDiagnostics), SectionError> {
        if !self.registry.contains(branch_id) {
            return Err(SectionError::UnregisteredBranch { branch_id });
        }
        if polygon_sides < MIN_POLYGON_SIDES {
            return Err(SectionError::NotEnoughPolygonSides { sides: polygon_sides });
        }
        if !segment.is_finite() || !scale.is_finite() || !radius_scale.is_finite() {
            return Err(SectionError::NonFiniteInput);
        }

        let ring = self.interpolated_ring(branch_id, segment.position)?;
        let mut diagnostics = SectionDiagnostics::new();

        let twirl_angle = lerp(ring.info.twirl * TAU, 0.0, ring.blend);
        let target_radius = segment.girth * scale * radius_scale;
        let reference_girth = ring.info.reference_girth(ring.blend);
        let radial = if Tolerance::ZERO_LENGTH.is_zero_length(reference_girth) {
            diagnostics.add_warning("profile girth is zero; ring keeps the profile size");
            1.0
        } else {
            target_radius / reference_girth
        };

        let (orientation, orientation_warning) = ring_orientation(segment.direction, segment.normal);
        if let Some(warning) = orientation_warning {
            diagnostics.add_warning(warning);
        }
        let center = segment.center.scaled(scale);
        let placement = Transform::translate(center.to_vec3())
            * orientation
            * Transform::uniform_scale(radial)
            * Transform::rotate_z(twirl_angle);

        let mut section = CrossSection {
            points: Vec::with_capacity(ring.points.len()),
            relative_positions: Vec::with_capacity(ring.points.len()),
        };
        for point in &ring.points {
            section.points.push(placement.apply_point(point.position));
            section.relative_positions.push(point.relative_position);
        }

        if section.points.len() < MIN_POLYGON_SIDES {
            diagnostics.add_warning(format!(
                "ring has {} points, fewer than {MIN_POLYGON_SIDES}",
                section.points.len()
            ));
        }

        diagnostics.point_count = section.points.len();
        diagnostics.merged_point_count = ring.tessellation.merged_point_count;
        diagnostics.depth_limited = ring.tessellation.depth_limited;
        diagnostics.blend = ring.blend;
        diagnostics.twirl_angle = twirl_angle;
        Ok((section, diagnostics))
    }

    /// Samples every segment of a branch, aggregating diagnostics.
    #[must_use]
    pub fn sample_branch(
        &self,
        branch_id: BranchId,
        segments: &[SkinSegment],
        polygon_sides: usize,
        scale: f64,
        radius_scale: f64,
    ) -> (Vec<CrossSection>, SectionDiagnostics) {
        let mut total = SectionDiagnostics::new();
        let sections = segments
            .iter()
            .map(|segment| {
                let (section, diagnostics) =
                    self.sample_cross_section(branch_id, segment, polygon_sides, scale, radius_scale);
                total.merge(&diagnostics);
                section
            })
            .collect();
        (sections, total)
    }

    fn interpolated_ring(&self, branch_id: BranchId, position: f64) -> Result<Ring<'_>, SectionError> {
        let entry = self
            .registry
            .get(branch_id)
            .ok_or(SectionError::UnregisteredBranch { branch_id })?;
        if !position.is_finite() {
            return Err(SectionError::NonFiniteInput);
        }

        let blend = blend_at(&entry.info, position);
        let curve = BezierCurve::lerp(&entry.base_curve, &entry.top_curve, blend)?;
        let (mut points, tessellation) = curve.tessellate(self.tessellation)?;
        if points.len() < 2 {
            return Err(SectionError::DegenerateCurve {
                point_count: points.len(),
            });
        }
        points.pop();

        Ok(Ring {
            info: &entry.info,
            blend,
            points,
            tessellation,
        })
    }
}

/// Base/top blend factor for a skin position, remapped by the branch scale curve.
fn blend_at(info: &BranchInfo, position: f64) -> f64 {
    let relative = inverse_lerp(0.0, info.valid_range, position);
    let blend = info.scale_curve.evaluate(relative);
    if blend.is_finite() { blend.clamp(0.0, 1.0) } else { 0.0 }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Look rotation for a ring, falling back to an arbitrary up vector when
/// `normal` is parallel to `direction` and to the identity when `direction`
/// is degenerate.
fn ring_orientation(direction: Vec3, normal: Vec3) -> (Transform, Option<&'static str>) {
    if let Some(rotation) = Transform::look_rotation(direction, normal) {
        return (rotation, None);
    }
    match Transform::look_rotation(direction, direction.any_orthogonal()) {
        Some(rotation) => (
            rotation,
            Some("normal parallel to direction; using an arbitrary ring orientation"),
        ),
        None => (
            Transform::identity(),
            Some("ring direction is degenerate; ring left in the XY plane"),
        ),
    }
}

fn report(branch_id: BranchId, err: &SectionError) {
    match err {
        SectionError::UnregisteredBranch { .. } => {
            log::warn!("cross section for branch {branch_id} skipped: {err}");
        }
        _ => log::error!("cross section for branch {branch_id} failed: {err}"),
    }
}
