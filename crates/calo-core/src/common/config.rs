//! Apparatus configuration.
//!
//! Every field defaults to the standard apparatus, so an empty JSON object is
//! a complete configuration.

use super::constants::{
    LINING_CLEARANCE, LINING_THICKNESS, MAX_STEP, RING_HALF_THICKNESS, RING_INNER_UNITS,
    RING_SPAN_UNITS, RING_UNIT, RING_UPSTREAM_OFFSET, STANDARD_APERTURE_CELLS,
    STANDARD_CRYSTAL_LENGTH, STANDARD_ELEMENT_PITCH, STANDARD_SIDE, TARGET_FACE, TARGET_LENGTH,
    TARGET_TO_CALORIMETER,
};
use super::materials::{CAESIUM_IODIDE, LEAD_LINING, LIQUID_HYDROGEN, VACUUM};
use crate::domain::{CaloError, CaloResult};
use crate::geometry::{BoundaryMask, ChannelRange, GridParameters, LiningParameters};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApparatusConfig {
    pub side: usize,
    pub element_pitch_mm: f64,
    pub crystal_length_mm: f64,
    pub aperture_cells: usize,
    pub lining_thickness_mm: f64,
    pub lining_clearance_mm: f64,
    pub target_length_mm: f64,
    pub target_face_mm: f64,
    pub target_to_calorimeter_mm: f64,
    pub ring_inner_units: f64,
    pub ring_span_units: f64,
    pub ring_unit_mm: f64,
    pub ring_half_thickness_mm: f64,
    pub ring_upstream_offset_mm: f64,
    pub max_step_mm: f64,
    /// Replaces the standard beam-aperture exclusion table when present.
    pub excluded_ranges: Option<Vec<[usize; 2]>>,
    pub materials: MaterialSelection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MaterialSelection {
    pub world: String,
    pub target: String,
    pub calorimeter: String,
    pub lining: String,
}

impl Default for MaterialSelection {
    fn default() -> Self {
        Self {
            world: VACUUM.to_string(),
            target: LIQUID_HYDROGEN.to_string(),
            calorimeter: CAESIUM_IODIDE.to_string(),
            lining: LEAD_LINING.to_string(),
        }
    }
}

impl Default for ApparatusConfig {
    fn default() -> Self {
        Self {
            side: STANDARD_SIDE,
            element_pitch_mm: STANDARD_ELEMENT_PITCH,
            crystal_length_mm: STANDARD_CRYSTAL_LENGTH,
            aperture_cells: STANDARD_APERTURE_CELLS,
            lining_thickness_mm: LINING_THICKNESS,
            lining_clearance_mm: LINING_CLEARANCE,
            target_length_mm: TARGET_LENGTH,
            target_face_mm: TARGET_FACE,
            target_to_calorimeter_mm: TARGET_TO_CALORIMETER,
            ring_inner_units: RING_INNER_UNITS,
            ring_span_units: RING_SPAN_UNITS,
            ring_unit_mm: RING_UNIT,
            ring_half_thickness_mm: RING_HALF_THICKNESS,
            ring_upstream_offset_mm: RING_UPSTREAM_OFFSET,
            max_step_mm: MAX_STEP,
            excluded_ranges: None,
            materials: MaterialSelection::default(),
        }
    }
}

impl ApparatusConfig {
    pub fn validate(&self) -> CaloResult<()> {
        if self.side == 0 {
            return Err(CaloError::input_validation(
                "INPUT.CONFIG_SIDE",
                "grid side must be at least 1",
            ));
        }

        if self.aperture_cells > self.side {
            return Err(CaloError::input_validation(
                "INPUT.CONFIG_APERTURE",
                format!(
                    "aperture of {} cells does not fit in a grid of side {}",
                    self.aperture_cells, self.side
                ),
            ));
        }

        for (name, value) in [
            ("elementPitchMm", self.element_pitch_mm),
            ("crystalLengthMm", self.crystal_length_mm),
            ("liningThicknessMm", self.lining_thickness_mm),
            ("liningClearanceMm", self.lining_clearance_mm),
            ("targetLengthMm", self.target_length_mm),
            ("targetFaceMm", self.target_face_mm),
            ("targetToCalorimeterMm", self.target_to_calorimeter_mm),
            ("ringUnitMm", self.ring_unit_mm),
            ("ringSpanUnits", self.ring_span_units),
            ("ringHalfThicknessMm", self.ring_half_thickness_mm),
            ("maxStepMm", self.max_step_mm),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CaloError::input_validation(
                    "INPUT.CONFIG_LENGTH",
                    format!("'{}' must be a positive finite value, got {}", name, value),
                ));
            }
        }

        if !self.ring_inner_units.is_finite() || self.ring_inner_units < 0.0 {
            return Err(CaloError::input_validation(
                "INPUT.CONFIG_LENGTH",
                format!(
                    "'ringInnerUnits' must be finite and non-negative, got {}",
                    self.ring_inner_units
                ),
            ));
        }

        if self.lining_clearance_mm >= self.lining_thickness_mm {
            return Err(CaloError::input_validation(
                "INPUT.CONFIG_LINING",
                format!(
                    "lining clearance {} mm must be smaller than the lining thickness {} mm",
                    self.lining_clearance_mm, self.lining_thickness_mm
                ),
            ));
        }

        let aperture_half = self.aperture_cells as f64 * self.element_pitch_mm / 2.0;
        if self.aperture_cells > 0 && aperture_half <= self.lining_thickness_mm {
            return Err(CaloError::input_validation(
                "INPUT.CONFIG_LINING",
                format!(
                    "aperture half-width {} mm leaves no opening inside a {} mm lining",
                    aperture_half, self.lining_thickness_mm
                ),
            ));
        }

        Ok(())
    }

    pub fn grid(&self) -> CaloResult<GridParameters> {
        GridParameters::new(self.side, self.element_pitch_mm)
    }

    /// Exclusion mask for the configured grid: the override when given,
    /// otherwise the standard beam-aperture table. Non-standard grids without
    /// an override are left unmasked.
    pub fn boundary_mask(&self) -> CaloResult<BoundaryMask> {
        let grid = self.grid()?;
        match &self.excluded_ranges {
            Some(ranges) => {
                let ranges = ranges
                    .iter()
                    .map(|[first, last]| ChannelRange::new(*first, *last))
                    .collect::<Vec<_>>();
                BoundaryMask::new(&grid, ranges)
            }
            None if grid.side() == STANDARD_SIDE => BoundaryMask::beam_aperture(&grid),
            None => {
                tracing::warn!(
                    side = grid.side(),
                    "no exclusion table for a non-standard grid; every cell is instantiated and the aperture lining is omitted"
                );
                Ok(BoundaryMask::none())
            }
        }
    }

    fn is_unmasked_fallback(&self) -> bool {
        self.excluded_ranges.is_none() && self.side != STANDARD_SIDE
    }

    /// Lining dimensions for the configured apparatus. A grid with no
    /// exclusion mask has no aperture to line.
    pub fn lining_parameters(&self) -> LiningParameters {
        LiningParameters {
            clearance: self.lining_clearance_mm,
            thickness: self.lining_thickness_mm,
            aperture_cells: if self.is_unmasked_fallback() {
                0
            } else {
                self.aperture_cells
            },
            half_depth: self.crystal_length_mm / 2.0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApparatusConfigError {
    #[error("failed to read apparatus config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse apparatus config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl From<ApparatusConfigError> for CaloError {
    fn from(error: ApparatusConfigError) -> Self {
        match &error {
            ApparatusConfigError::Read { .. } => {
                CaloError::io_system("IO.CONFIG_READ", error.to_string())
            }
            ApparatusConfigError::Parse { .. } => {
                CaloError::input_validation("INPUT.CONFIG_PARSE", error.to_string())
            }
        }
    }
}

pub fn load_apparatus_config(
    config_path: impl AsRef<Path>,
) -> Result<ApparatusConfig, ApparatusConfigError> {
    let config_path = config_path.as_ref();
    let source = fs::read_to_string(config_path).map_err(|source| ApparatusConfigError::Read {
        path: config_path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| ApparatusConfigError::Parse {
        path: config_path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{ApparatusConfig, ApparatusConfigError, load_apparatus_config};
    use crate::domain::{CaloError, CaloErrorCategory};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn empty_object_yields_standard_apparatus() {
        let config: ApparatusConfig = serde_json::from_str("{}").expect("config should parse");
        assert_eq!(config, ApparatusConfig::default());
        assert_eq!(config.side, 35);
        assert_eq!(config.element_pitch_mm, 50.0);
        assert_eq!(config.materials.calorimeter, "Cesium Iodide");
        config.validate().expect("standard apparatus should validate");
    }

    #[test]
    fn partial_config_overrides_only_named_fields() {
        let config: ApparatusConfig = serde_json::from_str(
            r#"{ "side": 7, "apertureCells": 3, "materials": { "lining": "Aluminum" } }"#,
        )
        .expect("config should parse");
        assert_eq!(config.side, 7);
        assert_eq!(config.aperture_cells, 3);
        assert_eq!(config.materials.lining, "Aluminum");
        assert_eq!(config.materials.target, "Liquid Hydrogen");
    }

    #[test]
    fn validation_rejects_degenerate_geometry() {
        let mut config = ApparatusConfig {
            side: 0,
            ..ApparatusConfig::default()
        };
        assert_eq!(
            config.validate().expect_err("zero side").placeholder(),
            "INPUT.CONFIG_SIDE"
        );

        config.side = 35;
        config.element_pitch_mm = -5.0;
        assert_eq!(
            config.validate().expect_err("negative pitch").placeholder(),
            "INPUT.CONFIG_LENGTH"
        );

        config.element_pitch_mm = 50.0;
        config.lining_clearance_mm = 60.0;
        assert_eq!(
            config.validate().expect_err("clearance wider than lining").placeholder(),
            "INPUT.CONFIG_LINING"
        );

        config.lining_clearance_mm = 0.5;
        config.aperture_cells = 40;
        assert_eq!(
            config.validate().expect_err("aperture wider than grid").placeholder(),
            "INPUT.CONFIG_APERTURE"
        );
    }

    #[test]
    fn excluded_range_override_replaces_standard_table() {
        let config = ApparatusConfig {
            side: 4,
            aperture_cells: 0,
            excluded_ranges: Some(vec![[5, 6], [9, 10]]),
            ..ApparatusConfig::default()
        };
        let mask = config.boundary_mask().expect("override mask should build");
        assert_eq!(mask.excluded_count(), 4);
        assert!(mask.is_excluded(6));
        assert!(!mask.is_excluded(7));

        let unmasked = ApparatusConfig {
            side: 5,
            aperture_cells: 0,
            ..ApparatusConfig::default()
        };
        assert_eq!(
            unmasked.boundary_mask().expect("plain grid").excluded_count(),
            0
        );
        assert_eq!(
            ApparatusConfig::default()
                .boundary_mask()
                .expect("standard mask")
                .excluded_count(),
            225
        );
    }

    #[test]
    fn unmasked_grid_drops_the_aperture_lining() {
        let config = ApparatusConfig {
            side: 33,
            ..ApparatusConfig::default()
        };
        config.validate().expect("side 33 should validate");
        let parameters = config.lining_parameters();
        assert_eq!(parameters.aperture_cells, 0);
        assert_eq!(parameters.clearance, 0.5);
        assert_eq!(parameters.thickness, 50.0);

        assert_eq!(ApparatusConfig::default().lining_parameters().aperture_cells, 15);

        let overridden = ApparatusConfig {
            side: 4,
            aperture_cells: 2,
            excluded_ranges: Some(vec![[5, 6], [9, 10]]),
            ..ApparatusConfig::default()
        };
        assert_eq!(overridden.lining_parameters().aperture_cells, 2);
    }

    #[test]
    fn loader_reports_read_and_parse_failures() {
        let temp = TempDir::new().expect("tempdir should be created");
        let missing = temp.path().join("missing.json");
        let error = load_apparatus_config(&missing).expect_err("missing file should fail");
        assert!(matches!(error, ApparatusConfigError::Read { .. }));
        let error = CaloError::from(error);
        assert_eq!(error.category(), CaloErrorCategory::IoSystemError);

        let broken = temp.path().join("broken.json");
        fs::write(&broken, "{ \"side\": ").expect("fixture should be written");
        let error = load_apparatus_config(&broken).expect_err("broken json should fail");
        assert!(error.to_string().contains("broken.json"));
        assert_eq!(
            CaloError::from(error).placeholder(),
            "INPUT.CONFIG_PARSE"
        );

        let valid = temp.path().join("apparatus.json");
        fs::write(&valid, r#"{ "maxStepMm": 5.0 }"#).expect("fixture should be written");
        let config = load_apparatus_config(&valid).expect("valid config should load");
        assert_eq!(config.max_step_mm, 5.0);
    }
}
