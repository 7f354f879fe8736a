#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bark;
pub mod geom;

use std::fmt;

use bark::{
    BarkSectionBuilder, BarkSettings, BranchId, BranchRegistration, SampledBranchSkin, SettingsError, SkinSegment,
};
use geom::{Point3, Vec3};
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// Girth table as sent from JS: `positions[i]` pairs with `girths[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkinInput {
    pub positions: Vec<f64>,
    pub girths: Vec<f64>,
}

impl SkinInput {
    pub fn to_skin(&self) -> Result<SampledBranchSkin, String> {
        if self.positions.len() != self.girths.len() {
            return Err(format!(
                "skin heeft {} posities maar {} diktes",
                self.positions.len(),
                self.girths.len()
            ));
        }
        if self.positions.is_empty() {
            return Err("skin bevat geen samples".to_string());
        }
        Ok(SampledBranchSkin::new(
            self.positions.iter().copied().zip(self.girths.iter().copied()),
        ))
    }
}

/// Skin segment as sent from JS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentInput {
    pub center: [f64; 3],
    pub direction: [f64; 3],
    pub normal: [f64; 3],
    pub girth: f64,
    pub position: f64,
}

impl From<SegmentInput> for SkinSegment {
    fn from(input: SegmentInput) -> Self {
        SkinSegment::new(
            Point3::from_array(input.center),
            Vec3::from_array(input.direction),
            Vec3::from_array(input.normal),
            input.girth,
            input.position,
        )
    }
}

/// Ring returned to JS. `error` is set when the ring is empty because
/// sampling failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionOutput {
    pub points: Vec<[f64; 3]>,
    pub relative_positions: Vec<f64>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Public entry point for consumers.
#[wasm_bindgen]
pub struct BarkEngine {
    builder: BarkSectionBuilder,
}

#[wasm_bindgen]
impl BarkEngine {
    /// Maak een engine aan. `settings` mag `undefined` zijn voor de standaardinstellingen.
    #[wasm_bindgen(constructor)]
    pub fn new(settings: JsValue) -> Result<BarkEngine, JsValue> {
        let settings: BarkSettings = if settings.is_undefined() || settings.is_null() {
            BarkSettings::default()
        } else {
            serde_wasm_bindgen::from_value(settings).map_err(to_js_error)?
        };
        Self::from_settings(settings).map_err(to_js_error)
    }

    /// Registreer een tak. Geeft `false` terug als het id al geregistreerd is.
    #[wasm_bindgen]
    pub fn register_branch(&mut self, branch_id: i32, skin: JsValue, registration: JsValue) -> Result<bool, JsValue> {
        let skin: SkinInput = serde_wasm_bindgen::from_value(skin).map_err(to_js_error)?;
        let registration: BranchRegistration = if registration.is_undefined() || registration.is_null() {
            BranchRegistration::default()
        } else {
            serde_wasm_bindgen::from_value(registration).map_err(to_js_error)?
        };
        self.register_skin(branch_id, &skin, &registration).map_err(|err| js_error(&err))
    }

    /// Bouw de doorsnede voor een segment van de tak.
    #[wasm_bindgen]
    pub fn sample_cross_section(
        &self,
        branch_id: i32,
        segment: JsValue,
        polygon_sides: usize,
        scale: f64,
        radius_scale: f64,
    ) -> Result<JsValue, JsValue> {
        let segment: SegmentInput = serde_wasm_bindgen::from_value(segment).map_err(to_js_error)?;
        let output = self.section_output(branch_id, segment, polygon_sides, scale, radius_scale);
        serde_wasm_bindgen::to_value(&output).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Aantal punten dat `sample_cross_section` op deze positie oplevert.
    #[wasm_bindgen]
    pub fn segment_count_at(&self, branch_id: i32, position: f64) -> usize {
        self.builder.segment_count_at(branch_id, position)
    }

    /// Aantal geregistreerde takken.
    #[wasm_bindgen]
    pub fn branch_count(&self) -> usize {
        self.builder.registry().len()
    }

    /// Vergeet alle geregistreerde takken.
    #[wasm_bindgen]
    pub fn clear(&mut self) {
        self.builder.clear();
    }
}

impl BarkEngine {
    pub fn from_settings(settings: BarkSettings) -> Result<Self, SettingsError> {
        Ok(Self {
            builder: BarkSectionBuilder::new(settings)?,
        })
    }

    #[must_use]
    pub fn builder(&self) -> &BarkSectionBuilder {
        &self.builder
    }

    pub fn register_skin(
        &mut self,
        branch_id: BranchId,
        skin: &SkinInput,
        registration: &BranchRegistration,
    ) -> Result<bool, String> {
        let skin = skin.to_skin()?;
        let registered = self
            .builder
            .register_branch(branch_id, &skin, registration)
            .map_err(|err| err.to_string())?;
        debug_log!("tak {branch_id} geregistreerd: {registered}");
        Ok(registered)
    }

    #[must_use]
    pub fn section_output(
        &self,
        branch_id: BranchId,
        segment: SegmentInput,
        polygon_sides: usize,
        scale: f64,
        radius_scale: f64,
    ) -> SectionOutput {
        let (section, diagnostics) =
            self.builder
                .sample_cross_section(branch_id, &segment.into(), polygon_sides, scale, radius_scale);
        debug_log!("doorsnede tak {branch_id}: {}", diagnostics.summary());
        SectionOutput {
            points: section.points.iter().map(|p| p.to_array()).collect(),
            relative_positions: section.relative_positions,
            warnings: diagnostics.warnings,
            error: diagnostics.error.map(|err| err.to_string()),
        }
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
