use super::GridParameters;
use crate::common::constants::STANDARD_SIDE;
use crate::domain::{CaloError, CaloResult};
use serde::Serialize;

/// Inclusive range of channel indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChannelRange {
    pub first: usize,
    pub last: usize,
}

impl ChannelRange {
    pub const fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }

    pub const fn contains(&self, index: usize) -> bool {
        index >= self.first && index <= self.last
    }

    pub const fn width(&self) -> usize {
        self.last - self.first + 1
    }
}

/// Cells left out of the standard 35x35 crystal array. Each entry is the
/// strip of one grid row (rows 10 through 24, columns 10 through 24) that
/// together open the square beam aperture. Reference data: keep it literal.
pub const BEAM_APERTURE_EXCLUSIONS: [ChannelRange; 15] = [
    ChannelRange::new(360, 374),
    ChannelRange::new(395, 409),
    ChannelRange::new(430, 444),
    ChannelRange::new(465, 479),
    ChannelRange::new(500, 514),
    ChannelRange::new(535, 549),
    ChannelRange::new(570, 584),
    ChannelRange::new(605, 619),
    ChannelRange::new(640, 654),
    ChannelRange::new(675, 689),
    ChannelRange::new(710, 724),
    ChannelRange::new(745, 759),
    ChannelRange::new(780, 794),
    ChannelRange::new(815, 829),
    ChannelRange::new(850, 864),
];

/// Sorted, disjoint set of excluded index ranges for one grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryMask {
    ranges: Vec<ChannelRange>,
}

impl BoundaryMask {
    pub fn new(grid: &GridParameters, mut ranges: Vec<ChannelRange>) -> CaloResult<Self> {
        ranges.sort_by_key(|range| range.first);

        for range in &ranges {
            if range.first > range.last {
                return Err(CaloError::input_validation(
                    "INPUT.MASK_RANGE",
                    format!(
                        "excluded range {}..={} is reversed",
                        range.first, range.last
                    ),
                ));
            }
            if range.last >= grid.total_elements() {
                return Err(CaloError::input_validation(
                    "INPUT.MASK_RANGE",
                    format!(
                        "excluded range {}..={} exceeds the {} channels of a side-{} grid",
                        range.first,
                        range.last,
                        grid.total_elements(),
                        grid.side()
                    ),
                ));
            }
        }

        if let Some(pair) = ranges
            .windows(2)
            .find(|pair| pair[0].last >= pair[1].first)
        {
            return Err(CaloError::input_validation(
                "INPUT.MASK_OVERLAP",
                format!(
                    "excluded ranges {}..={} and {}..={} overlap",
                    pair[0].first, pair[0].last, pair[1].first, pair[1].last
                ),
            ));
        }

        Ok(Self { ranges })
    }

    /// The standard aperture table. Only defined for the 35-wide grid.
    pub fn beam_aperture(grid: &GridParameters) -> CaloResult<Self> {
        if grid.side() != STANDARD_SIDE {
            return Err(CaloError::input_validation(
                "INPUT.MASK_GRID",
                format!(
                    "the beam-aperture table is defined for side {}, not side {}",
                    STANDARD_SIDE,
                    grid.side()
                ),
            ));
        }
        Self::new(grid, BEAM_APERTURE_EXCLUSIONS.to_vec())
    }

    pub fn none() -> Self {
        Self { ranges: Vec::new() }
    }

    pub fn ranges(&self) -> &[ChannelRange] {
        &self.ranges
    }

    pub fn excluded_count(&self) -> usize {
        self.ranges.iter().map(ChannelRange::width).sum()
    }

    pub fn is_excluded(&self, index: usize) -> bool {
        let candidate = self.ranges.partition_point(|range| range.last < index);
        self.ranges
            .get(candidate)
            .is_some_and(|range| range.contains(index))
    }

    /// True when every cell of the `cells` x `cells` block around the centre
    /// column and row of `grid` is excluded.
    pub fn excludes_centred_block(&self, grid: &GridParameters, cells: usize) -> bool {
        if cells == 0 {
            return true;
        }
        if cells > grid.side() {
            return false;
        }
        let start = grid.center_offset() - (cells - 1) / 2;
        (start..start + cells).all(|row| {
            (start..start + cells).all(|col| self.is_excluded(row * grid.side() + col))
        })
    }
}
