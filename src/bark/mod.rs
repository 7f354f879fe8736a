//! Procedural bark cross sections.
//!
//! Branches are registered once with a [`BarkSectionBuilder`], which bakes a
//! jittered base profile (with root-flare displacement) and a jittered top
//! profile. Each ring along the branch is the blend of the two, tessellated
//! adaptively and placed in the skin segment's frame.

mod circle;
mod diagnostics;
mod jitter;
mod registry;
mod section;
mod settings;
mod skin;

pub use circle::{apply_base_displacement, build_circle};
pub use diagnostics::SectionDiagnostics;
pub use jitter::{JitterSource, SequenceJitter};
pub use registry::{BranchEntry, BranchId, BranchInfo, BranchRegistration, BranchRegistry};
pub use section::{BarkSectionBuilder, CrossSection, MIN_POLYGON_SIDES, SectionError};
pub use settings::{BarkSettings, SettingsError};
pub use skin::{BranchSkin, SampledBranchSkin, SkinSegment};

#[cfg(test)]
mod tests;
