use super::GridParameters;
use crate::common::constants::{
    LINING_CLEARANCE, LINING_THICKNESS, STANDARD_APERTURE_CELLS, STANDARD_CRYSTAL_LENGTH,
};
use serde::Serialize;

/// Square box with a concentric square opening removed, both extruded along
/// the beam axis. `centre` is the transverse offset of the frame axis, shared
/// by x and y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxFrame {
    pub centre: f64,
    pub outer_half_extent: f64,
    pub inner_half_extent: f64,
    pub half_depth: f64,
}

impl BoxFrame {
    pub fn wall_thickness(&self) -> f64 {
        self.outer_half_extent - self.inner_half_extent
    }

    pub fn cross_section_area(&self) -> f64 {
        4.0 * (self.outer_half_extent.powi(2) - self.inner_half_extent.powi(2))
    }

    /// Chebyshev distance of a transverse point from the frame axis.
    pub fn reach(&self, x: f64, y: f64) -> f64 {
        (x - self.centre).abs().max((y - self.centre).abs())
    }

    /// True when the transverse point lies in the frame material.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let reach = self.reach(x, y);
        reach <= self.outer_half_extent && reach >= self.inner_half_extent
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiningParameters {
    pub clearance: f64,
    pub thickness: f64,
    /// Width of the beam aperture in cells; 0 means no aperture lining.
    pub aperture_cells: usize,
    pub half_depth: f64,
}

impl Default for LiningParameters {
    fn default() -> Self {
        Self {
            clearance: LINING_CLEARANCE,
            thickness: LINING_THICKNESS,
            aperture_cells: STANDARD_APERTURE_CELLS,
            half_depth: STANDARD_CRYSTAL_LENGTH / 2.0,
        }
    }
}

/// The outer lining around the crystal array and the inner lining of the
/// beam aperture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiningShapes {
    pub outer: BoxFrame,
    pub aperture: Option<BoxFrame>,
}

impl LiningShapes {
    /// Frames around the full grid and around the centred aperture block.
    ///
    /// Both follow the truncated centre column: a block with an even number
    /// of cells sits half a pitch towards +x/+y.
    pub fn derive(grid: &GridParameters, parameters: &LiningParameters) -> Self {
        let pitch = grid.element_pitch();
        let footprint_half = grid.side() as f64 * pitch / 2.0;
        let outer = BoxFrame {
            centre: block_centre(grid.side(), pitch),
            outer_half_extent: footprint_half + parameters.thickness,
            inner_half_extent: footprint_half + parameters.clearance,
            half_depth: parameters.half_depth,
        };

        let aperture = (parameters.aperture_cells > 0).then(|| {
            let opening_half = parameters.aperture_cells as f64 * pitch / 2.0;
            BoxFrame {
                centre: block_centre(parameters.aperture_cells, pitch),
                outer_half_extent: opening_half - parameters.clearance,
                inner_half_extent: opening_half - parameters.thickness,
                half_depth: parameters.half_depth,
            }
        });

        Self { outer, aperture }
    }
}

/// Offset from the beam axis to the middle of `cells` consecutive cells that
/// start `(cells - 1) / 2` cells before the centre column.
fn block_centre(cells: usize, pitch: f64) -> f64 {
    let span = cells.saturating_sub(1);
    (span as f64 / 2.0 - (span / 2) as f64) * pitch
}

#[cfg(test)]
mod tests {
    use super::{LiningParameters, LiningShapes};
    use crate::domain::CaloErrorCategory;
    use crate::geometry::{BoundaryMask, ChannelRange, GeometryLayoutBuilder, GridParameters};

    fn even_builder() -> GeometryLayoutBuilder {
        let grid = GridParameters::new(4, 10.0).expect("even grid");
        let mask = BoundaryMask::new(
            &grid,
            vec![ChannelRange::new(5, 6), ChannelRange::new(9, 10)],
        )
        .expect("centre block mask");
        GeometryLayoutBuilder::new(grid, mask)
    }

    fn even_parameters() -> LiningParameters {
        LiningParameters {
            clearance: 0.5,
            thickness: 4.0,
            aperture_cells: 2,
            half_depth: 10.0,
        }
    }

    /// Smallest gap between each lining frame and the crystal faces facing it.
    fn nearest_gaps(builder: &GeometryLayoutBuilder, parameters: &LiningParameters) -> (f64, f64) {
        let shapes = builder.lining(parameters).expect("lining");
        let aperture = shapes.aperture.expect("aperture lining");
        let half_pitch = builder.grid().element_pitch() / 2.0;

        let mut nearest_outer = f64::INFINITY;
        let mut nearest_aperture = f64::INFINITY;
        for entry in builder.build().included() {
            let reach_out = shapes.outer.reach(entry.x, entry.y) + half_pitch;
            nearest_outer = nearest_outer.min(shapes.outer.inner_half_extent - reach_out);

            let reach_in = aperture.reach(entry.x, entry.y) - half_pitch;
            nearest_aperture = nearest_aperture.min(reach_in - aperture.outer_half_extent);
        }
        (nearest_outer, nearest_aperture)
    }

    #[test]
    fn standard_lining_matches_apparatus_dimensions() {
        let shapes = LiningShapes::derive(&GridParameters::standard(), &LiningParameters::default());

        assert_eq!(shapes.outer.centre, 0.0);
        assert_eq!(shapes.outer.outer_half_extent, 925.0);
        assert_eq!(shapes.outer.inner_half_extent, 875.5);
        assert!((shapes.outer.half_depth - 152.4).abs() <= 1.0e-9);

        let aperture = shapes.aperture.expect("standard apparatus has an aperture");
        assert_eq!(aperture.centre, 0.0);
        assert_eq!(aperture.outer_half_extent, 374.5);
        assert_eq!(aperture.inner_half_extent, 325.0);
        assert_eq!(aperture.wall_thickness(), 49.5);
    }

    #[test]
    fn lining_clears_every_crystal_by_the_same_margin() {
        let builder = GeometryLayoutBuilder::standard().expect("standard layout");
        let parameters = LiningParameters::default();
        let (outer, aperture) = nearest_gaps(&builder, &parameters);
        assert!((outer - parameters.clearance).abs() <= 1.0e-9);
        assert!((aperture - parameters.clearance).abs() <= 1.0e-9);

        let builder = even_builder();
        let parameters = even_parameters();
        let (outer, aperture) = nearest_gaps(&builder, &parameters);
        assert!((outer - parameters.clearance).abs() <= 1.0e-9);
        assert!((aperture - parameters.clearance).abs() <= 1.0e-9);
    }

    #[test]
    fn even_grid_frames_follow_the_crystal_footprint() {
        let builder = even_builder();
        let shapes = builder.lining(&even_parameters()).expect("lining");
        let placements = builder.build().placements();
        let xs = placements.iter().map(|placement| placement.x);
        let (low, high) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), x| {
            (low.min(x), high.max(x))
        });
        assert_eq!((low, high), (-10.0, 20.0));

        assert_eq!(shapes.outer.centre, 5.0);
        assert_eq!(shapes.outer.inner_half_extent, 20.5);
        assert_eq!(shapes.outer.outer_half_extent, 24.0);
        let aperture = shapes.aperture.expect("aperture lining");
        assert_eq!(aperture.centre, 5.0);
        assert_eq!(aperture.outer_half_extent, 9.5);
        assert_eq!(aperture.inner_half_extent, 6.0);

        assert!(shapes.outer.contains(-15.8, 5.0));
        assert!(!shapes.outer.contains(25.2, 5.0));
        assert!(aperture.contains(12.0, 5.0));
        assert!(!aperture.contains(5.0, 5.0));
    }

    #[test]
    fn aperture_over_crystals_is_rejected() {
        let grid = GridParameters::new(4, 10.0).expect("even grid");
        let builder = GeometryLayoutBuilder::new(grid, BoundaryMask::none());
        let error = builder.lining(&even_parameters()).expect_err("unmasked aperture");
        assert_eq!(error.category(), CaloErrorCategory::InputValidationError);
        assert_eq!(error.placeholder(), "INPUT.CONFIG_APERTURE");

        let parameters = LiningParameters {
            aperture_cells: 0,
            ..even_parameters()
        };
        let shapes = builder.lining(&parameters).expect("no aperture");
        assert!(shapes.aperture.is_none());
    }

    #[test]
    fn frame_membership_and_area() {
        let shapes = LiningShapes::derive(&GridParameters::standard(), &LiningParameters::default());
        assert!(shapes.outer.contains(900.0, 0.0));
        assert!(!shapes.outer.contains(0.0, 0.0));
        assert!(!shapes.outer.contains(930.0, 10.0));
        assert_eq!(
            shapes.outer.cross_section_area(),
            4.0 * (925.0_f64.powi(2) - 875.5_f64.powi(2))
        );
    }

    #[test]
    fn aperture_lining_is_optional() {
        let parameters = LiningParameters {
            aperture_cells: 0,
            ..LiningParameters::default()
        };
        let grid = GridParameters::new(5, 20.0).expect("small grid");
        let shapes = LiningShapes::derive(&grid, &parameters);
        assert!(shapes.aperture.is_none());
        assert_eq!(shapes.outer.centre, 0.0);
        assert_eq!(shapes.outer.inner_half_extent, 50.5);
    }
}
