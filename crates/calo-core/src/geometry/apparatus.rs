use super::{ChannelPlacement, GeometryLayoutBuilder, LayoutTable, LiningShapes};
use crate::common::config::ApparatusConfig;
use crate::common::constants::RING_FACE_GAP;
use crate::common::materials::{Material, resolve_material};
use crate::domain::{CaloResult, MaterialRole};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxSolid {
    pub half_x: f64,
    pub half_y: f64,
    pub half_z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TubeSolid {
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub half_z: f64,
}

impl TubeSolid {
    pub fn contains_radius(&self, radius: f64) -> bool {
        radius >= self.inner_radius && radius <= self.outer_radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedVolume<S> {
    pub name: &'static str,
    pub solid: S,
    pub z: f64,
    pub material: &'static Material,
}

/// One instantiated crystal: its channel placement plus the shared crystal
/// material. Energy deposits are tracked per event by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalorimeterElement {
    pub placement: ChannelPlacement,
    pub material: &'static Material,
}

/// Everything the transport engine needs to place the apparatus volumes.
#[derive(Debug, Clone)]
pub struct ApparatusLayout {
    pub world_half_extent: f64,
    pub world_material: &'static Material,
    pub target: PlacedVolume<BoxSolid>,
    pub crystal: BoxSolid,
    pub calorimeter_z: f64,
    pub elements: Vec<CalorimeterElement>,
    pub lining: LiningShapes,
    pub lining_material: &'static Material,
    pub ring: PlacedVolume<TubeSolid>,
    pub max_step: f64,
    pub layout: LayoutTable,
}

impl ApparatusLayout {
    pub fn build(config: &ApparatusConfig) -> CaloResult<Self> {
        config.validate()?;
        let grid = config.grid()?;
        let builder = GeometryLayoutBuilder::new(grid, config.boundary_mask()?);

        let world_material = resolve_material(MaterialRole::World, &config.materials.world)?;
        let target_material = resolve_material(MaterialRole::Target, &config.materials.target)?;
        let crystal_material =
            resolve_material(MaterialRole::Calorimeter, &config.materials.calorimeter)?;
        let lining_material = resolve_material(MaterialRole::Lining, &config.materials.lining)?;

        let target_z = -0.5 * config.target_to_calorimeter_mm;
        let calorimeter_z = 0.5 * config.target_to_calorimeter_mm + 0.5 * config.target_length_mm;
        let world_length = 3.0
            * (calorimeter_z + config.crystal_length_mm + config.target_length_mm - target_z);

        let layout = builder.build();
        let elements = layout
            .placements()
            .into_iter()
            .map(|placement| CalorimeterElement {
                placement,
                material: crystal_material,
            })
            .collect();

        let lining = builder.lining(&config.lining_parameters())?;

        let ring = PlacedVolume {
            name: "Omni",
            solid: TubeSolid {
                inner_radius: config.ring_inner_units * config.ring_unit_mm,
                outer_radius: (config.ring_inner_units + config.ring_span_units)
                    * config.ring_unit_mm,
                half_z: config.ring_half_thickness_mm,
            },
            z: calorimeter_z
                - config.crystal_length_mm / 2.0
                - RING_FACE_GAP
                - config.ring_upstream_offset_mm,
            material: world_material,
        };

        let target = PlacedVolume {
            name: "Target",
            solid: BoxSolid {
                half_x: config.target_face_mm / 2.0,
                half_y: config.target_face_mm / 2.0,
                half_z: config.target_length_mm / 2.0,
            },
            z: target_z,
            material: target_material,
        };

        let pitch = grid.element_pitch();
        let apparatus = Self {
            world_half_extent: world_length / 2.0,
            world_material,
            target,
            crystal: BoxSolid {
                half_x: pitch / 2.0,
                half_y: pitch / 2.0,
                half_z: config.crystal_length_mm / 2.0,
            },
            calorimeter_z,
            elements,
            lining,
            lining_material,
            ring,
            max_step: config.max_step_mm,
            layout,
        };
        tracing::info!(
            crystals = apparatus.elements.len(),
            calorimeter_z = apparatus.calorimeter_z,
            ring_z = apparatus.ring.z,
            "apparatus layout built"
        );
        Ok(apparatus)
    }

    pub fn element(&self, index: usize) -> Option<&CalorimeterElement> {
        self.elements
            .binary_search_by_key(&index, |element| element.placement.index)
            .ok()
            .map(|position| &self.elements[position])
    }

    pub fn calorimeter_mass_kg(&self) -> f64 {
        // half-extents in mm -> full volume in cm3
        let crystal_volume_cm3 =
            8.0 * self.crystal.half_x * self.crystal.half_y * self.crystal.half_z / 1_000.0;
        self.elements
            .iter()
            .map(|element| element.material.density * crystal_volume_cm3 / 1_000.0)
            .sum()
    }
}
