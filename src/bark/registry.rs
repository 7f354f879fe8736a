//! Per-branch profile storage.
//!
//! Each registered branch owns a [`BranchInfo`] snapshot plus a base and a
//! top cross-section curve. The three are stored together in one
//! [`BranchEntry`] so a lookup never sees a partially registered branch.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::{Deserialize, Serialize};

use crate::geom::{BezierCurve, ScaleCurve};

pub type BranchId = i32;

/// Parameters for registering one branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BranchRegistration {
    /// Jitter points per circle; each circle gets twice this many nodes.
    pub jitter_points: usize,
    /// Skin position considered the top of the branch.
    pub valid_range: f64,
    pub min_base_scale: f64,
    pub max_base_scale: f64,
    /// Angular jitter bounds, radians.
    pub min_angle_jitter: f64,
    pub max_angle_jitter: f64,
    /// Twist at the base, in full turns; fades to zero at the top.
    pub twirl: f64,
    pub strength: f64,
    /// Remaps the relative position along the branch to the base/top blend.
    pub scale_curve: ScaleCurve,
}

impl Default for BranchRegistration {
    fn default() -> Self {
        Self {
            jitter_points: 4,
            valid_range: 1.0,
            min_base_scale: 1.0,
            max_base_scale: 1.0,
            min_angle_jitter: 0.0,
            max_angle_jitter: 0.0,
            twirl: 0.0,
            strength: 1.0,
            scale_curve: ScaleCurve::default(),
        }
    }
}

impl BranchRegistration {
    /// True when every numeric field and scale-curve key is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        [
            self.valid_range,
            self.min_base_scale,
            self.max_base_scale,
            self.min_angle_jitter,
            self.max_angle_jitter,
            self.twirl,
            self.strength,
        ]
        .iter()
        .all(|value| value.is_finite())
            && self.scale_curve.is_finite()
    }
}

/// Immutable per-branch record captured at registration.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchInfo {
    pub base_girth: f64,
    pub top_girth: f64,
    pub min_base_scale: f64,
    pub max_base_scale: f64,
    pub min_angle_jitter: f64,
    pub max_angle_jitter: f64,
    pub twirl: f64,
    pub valid_range: f64,
    pub strength: f64,
    pub scale_curve: ScaleCurve,
}

impl BranchInfo {
    /// Snapshot of `registration` with the measured girths. The scale curve is cloned.
    #[must_use]
    pub fn from_registration(registration: &BranchRegistration, base_girth: f64, top_girth: f64) -> Self {
        Self {
            base_girth,
            top_girth,
            min_base_scale: registration.min_base_scale,
            max_base_scale: registration.max_base_scale,
            min_angle_jitter: registration.min_angle_jitter,
            max_angle_jitter: registration.max_angle_jitter,
            twirl: registration.twirl,
            valid_range: registration.valid_range,
            strength: registration.strength,
            scale_curve: registration.scale_curve.clone(),
        }
    }

    /// Girth the interpolated profile has at blend factor `t`.
    #[must_use]
    pub fn reference_girth(&self, t: f64) -> f64 {
        self.base_girth + (self.top_girth - self.base_girth) * t
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchEntry {
    pub info: BranchInfo,
    pub base_curve: BezierCurve,
    pub top_curve: BezierCurve,
}

/// Branch profiles owned by one builder for the duration of a generation run.
#[derive(Debug, Clone, Default)]
pub struct BranchRegistry {
    entries: HashMap<BranchId, BranchEntry>,
}

impl BranchRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a fully built entry. Returns `false` and leaves the existing
    /// entry untouched if `id` is already registered.
    pub fn publish(&mut self, id: BranchId, entry: BranchEntry) -> bool {
        match self.entries.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        }
    }

    #[must_use]
    pub fn contains(&self, id: BranchId) -> bool {
        self.entries.contains_key(&id)
    }

    #[must_use]
    pub fn get(&self, id: BranchId) -> Option<&BranchEntry> {
        self.entries.get(&id)
    }

    #[must_use]
    pub fn info(&self, id: BranchId) -> Option<&BranchInfo> {
        self.entries.get(&id).map(|entry| &entry.info)
    }

    #[must_use]
    pub fn base_curve(&self, id: BranchId) -> Option<&BezierCurve> {
        self.entries.get(&id).map(|entry| &entry.base_curve)
    }

    #[must_use]
    pub fn top_curve(&self, id: BranchId) -> Option<&BezierCurve> {
        self.entries.get(&id).map(|entry| &entry.top_curve)
    }

    pub fn remove(&mut self, id: BranchId) -> Option<BranchEntry> {
        self.entries.remove(&id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<BranchId> {
        let mut ids: Vec<BranchId> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
