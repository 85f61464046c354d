//! Crystal-array layout.
//!
//! A channel index maps row-major onto a square grid centred on the beam
//! axis. Whether a grid cell holds a crystal is decided by a [`BoundaryMask`],
//! and the lining solids in [`lining`] are sized from the same parameters.

pub mod apparatus;
pub mod lining;
pub mod mask;

pub use apparatus::{ApparatusLayout, BoxSolid, CalorimeterElement, PlacedVolume, TubeSolid};
pub use lining::{BoxFrame, LiningParameters, LiningShapes};
pub use mask::{BEAM_APERTURE_EXCLUSIONS, BoundaryMask, ChannelRange};

use crate::common::constants::{STANDARD_ELEMENT_PITCH, STANDARD_SIDE};
use crate::domain::{CaloError, CaloResult};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridParameters {
    side: usize,
    element_pitch: f64,
}

impl GridParameters {
    pub fn new(side: usize, element_pitch: f64) -> CaloResult<Self> {
        if side == 0 {
            return Err(CaloError::input_validation(
                "INPUT.GRID_SIDE",
                "grid side must be at least 1",
            ));
        }
        if !element_pitch.is_finite() || element_pitch <= 0.0 {
            return Err(CaloError::input_validation(
                "INPUT.GRID_PITCH",
                format!("element pitch must be positive and finite, got {element_pitch}"),
            ));
        }
        Ok(Self {
            side,
            element_pitch,
        })
    }

    pub fn standard() -> Self {
        Self {
            side: STANDARD_SIDE,
            element_pitch: STANDARD_ELEMENT_PITCH,
        }
    }

    pub const fn side(&self) -> usize {
        self.side
    }

    pub const fn element_pitch(&self) -> f64 {
        self.element_pitch
    }

    pub const fn total_elements(&self) -> usize {
        self.side * self.side
    }

    /// Column (and row) that sits on the beam axis.
    ///
    /// `(side - 1) / 2` truncated: 17 for the standard grid. Even grids end up
    /// half a pitch off centre, which downstream geometry depends on.
    pub const fn center_offset(&self) -> usize {
        (self.side - 1) / 2
    }

    pub const fn contains(&self, index: usize) -> bool {
        index < self.total_elements()
    }

    pub fn check_index(&self, index: usize) -> CaloResult<()> {
        if self.contains(index) {
            Ok(())
        } else {
            Err(CaloError::input_validation(
                "INPUT.CHANNEL_INDEX",
                format!(
                    "channel index {} is outside [0, {})",
                    index,
                    self.total_elements()
                ),
            ))
        }
    }

    fn axis_position(&self, cell: usize) -> f64 {
        (cell as i64 - self.center_offset() as i64) as f64 * self.element_pitch
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelLayout {
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub x: f64,
    pub y: f64,
    pub included: bool,
}

/// Transverse position of one instantiated crystal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelPlacement {
    pub index: usize,
    pub x: f64,
    pub y: f64,
}

impl From<&ChannelLayout> for ChannelPlacement {
    fn from(layout: &ChannelLayout) -> Self {
        Self {
            index: layout.index,
            x: layout.x,
            y: layout.y,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryLayoutBuilder {
    grid: GridParameters,
    mask: BoundaryMask,
}

impl GeometryLayoutBuilder {
    pub fn new(grid: GridParameters, mask: BoundaryMask) -> Self {
        Self { grid, mask }
    }

    pub fn standard() -> CaloResult<Self> {
        let grid = GridParameters::standard();
        let mask = BoundaryMask::beam_aperture(&grid)?;
        Ok(Self::new(grid, mask))
    }

    pub fn grid(&self) -> &GridParameters {
        &self.grid
    }

    pub fn mask(&self) -> &BoundaryMask {
        &self.mask
    }

    pub fn channel(&self, index: usize) -> CaloResult<ChannelLayout> {
        self.grid.check_index(index)?;
        Ok(self.channel_unchecked(index))
    }

    pub fn position(&self, index: usize) -> CaloResult<(f64, f64)> {
        let layout = self.channel(index)?;
        Ok((layout.x, layout.y))
    }

    pub fn is_included(&self, index: usize) -> CaloResult<bool> {
        self.grid.check_index(index)?;
        Ok(!self.mask.is_excluded(index))
    }

    /// Lining frames for this layout. An aperture lining needs the mask to
    /// leave its whole block of cells empty.
    pub fn lining(&self, parameters: &LiningParameters) -> CaloResult<LiningShapes> {
        if !self
            .mask
            .excludes_centred_block(&self.grid, parameters.aperture_cells)
        {
            return Err(CaloError::input_validation(
                "INPUT.CONFIG_APERTURE",
                format!(
                    "a {}-cell aperture lining needs the central {}x{} cells excluded from a side-{} grid",
                    parameters.aperture_cells,
                    parameters.aperture_cells,
                    parameters.aperture_cells,
                    self.grid.side()
                ),
            ));
        }
        Ok(LiningShapes::derive(&self.grid, parameters))
    }

    pub fn build(&self) -> LayoutTable {
        let entries = (0..self.grid.total_elements())
            .map(|index| self.channel_unchecked(index))
            .collect::<Vec<_>>();
        let table = LayoutTable {
            grid: self.grid,
            entries,
        };
        tracing::info!(
            side = self.grid.side(),
            total = self.grid.total_elements(),
            included = table.included_count(),
            "channel layout built"
        );
        table
    }

    fn channel_unchecked(&self, index: usize) -> ChannelLayout {
        let side = self.grid.side();
        let row = index / side;
        let col = index % side;
        ChannelLayout {
            index,
            row,
            col,
            x: self.grid.axis_position(col),
            y: self.grid.axis_position(row),
            included: !self.mask.is_excluded(index),
        }
    }
}

/// Fully derived layout. Read-only once built; share it by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutTable {
    grid: GridParameters,
    entries: Vec<ChannelLayout>,
}

impl LayoutTable {
    pub fn grid(&self) -> &GridParameters {
        &self.grid
    }

    pub fn total_elements(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[ChannelLayout] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&ChannelLayout> {
        self.entries.get(index)
    }

    pub fn included(&self) -> impl Iterator<Item = &ChannelLayout> {
        self.entries.iter().filter(|entry| entry.included)
    }

    pub fn included_count(&self) -> usize {
        self.included().count()
    }

    pub fn placements(&self) -> Vec<ChannelPlacement> {
        self.included().map(ChannelPlacement::from).collect()
    }

    /// Outer edges `(min_x, max_x, min_y, max_y)` of the included crystals.
    pub fn footprint(&self) -> Option<(f64, f64, f64, f64)> {
        let half = self.grid.element_pitch() / 2.0;
        self.included().fold(None, |bounds, entry| {
            let (min_x, max_x, min_y, max_y) = bounds.unwrap_or((
                f64::INFINITY,
                f64::NEG_INFINITY,
                f64::INFINITY,
                f64::NEG_INFINITY,
            ));
            Some((
                min_x.min(entry.x - half),
                max_x.max(entry.x + half),
                min_y.min(entry.y - half),
                max_y.max(entry.y + half),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{BoundaryMask, GeometryLayoutBuilder, GridParameters};

    #[test]
    fn standard_grid_positions_follow_row_major_offsets() {
        let builder = GeometryLayoutBuilder::standard().expect("standard layout");

        let first = builder.channel(0).expect("index 0");
        assert_eq!((first.row, first.col), (0, 0));
        assert_eq!((first.x, first.y), (-850.0, -850.0));

        let centre = builder.channel(612).expect("index 612");
        assert_eq!((centre.row, centre.col), (17, 17));
        assert_eq!((centre.x, centre.y), (0.0, 0.0));
        assert!(!centre.included);

        let last = builder.channel(1224).expect("index 1224");
        assert_eq!((last.x, last.y), (850.0, 850.0));
        assert!(last.included);

        assert_eq!(builder.position(36).expect("index 36"), (-800.0, -800.0));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let builder = GeometryLayoutBuilder::standard().expect("standard layout");
        let error = builder.channel(1225).expect_err("1225 is past the grid");
        assert_eq!(error.placeholder(), "INPUT.CHANNEL_INDEX");
        assert!(builder.is_included(5000).is_err());
    }

    #[test]
    fn even_grid_keeps_truncated_offset() {
        let grid = GridParameters::new(4, 10.0).expect("even grid");
        assert_eq!(grid.center_offset(), 1);
        let builder = GeometryLayoutBuilder::new(grid, BoundaryMask::none());
        assert_eq!(builder.position(0).expect("index 0"), (-10.0, -10.0));
        assert_eq!(builder.position(15).expect("index 15"), (20.0, 20.0));
    }

    #[test]
    fn grid_parameters_reject_degenerate_values() {
        assert_eq!(
            GridParameters::new(0, 50.0).expect_err("zero side").placeholder(),
            "INPUT.GRID_SIDE"
        );
        assert_eq!(
            GridParameters::new(3, f64::NAN).expect_err("nan pitch").placeholder(),
            "INPUT.GRID_PITCH"
        );
    }

    #[test]
    fn layout_table_exposes_included_placements() {
        let table = GeometryLayoutBuilder::standard()
            .expect("standard layout")
            .build();
        assert_eq!(table.total_elements(), 1225);
        assert_eq!(table.included_count(), 1000);

        let placements = table.placements();
        assert_eq!(placements.len(), 1000);
        assert_eq!(placements[0].index, 0);
        assert!(placements.iter().all(|placement| placement.index != 400));
        assert_eq!(
            table.footprint(),
            Some((-875.0, 875.0, -875.0, 875.0))
        );
    }
}
