//! Units and standard apparatus dimensions.
//!
//! Lengths are stored in millimetres, matching the internal unit system of
//! the transport engine that consumes the layout.

pub const MM: f64 = 1.0;
pub const CM: f64 = 10.0 * MM;
pub const M: f64 = 1_000.0 * MM;
pub const INCH: f64 = 2.54 * CM;

pub const STANDARD_SIDE: usize = 35;
pub const STANDARD_TOTAL_ELEMENTS: usize = STANDARD_SIDE * STANDARD_SIDE;
pub const STANDARD_ELEMENT_PITCH: f64 = 5.0 * CM;
pub const STANDARD_CRYSTAL_LENGTH: f64 = 12.0 * INCH;

/// Width, in cells, of the square beam aperture left open in the crystal array.
pub const STANDARD_APERTURE_CELLS: usize = 15;

pub const LINING_CLEARANCE: f64 = 0.5 * MM;
pub const LINING_THICKNESS: f64 = 5.0 * CM;

pub const TARGET_LENGTH: f64 = 10.0 * CM;
pub const TARGET_FACE: f64 = 10.0 * CM;
pub const TARGET_TO_CALORIMETER: f64 = 10.0 * M;

/// Ring detector radii expressed in units of [`RING_UNIT`].
pub const RING_INNER_UNITS: f64 = 7.5;
pub const RING_SPAN_UNITS: f64 = 15.0;
pub const RING_UNIT: f64 = 5.0 * CM;
pub const RING_HALF_THICKNESS: f64 = 0.01 * CM;
pub const RING_UPSTREAM_OFFSET: f64 = 6.0 * M;
/// Gap between the ring detector and the upstream face of the crystals.
pub const RING_FACE_GAP: f64 = 0.5 * MM;

pub const MAX_STEP: f64 = 1.0 * CM;

#[cfg(test)]
mod tests {
    use super::{
        CM, INCH, M, MM, STANDARD_CRYSTAL_LENGTH, STANDARD_ELEMENT_PITCH, STANDARD_SIDE,
        STANDARD_TOTAL_ELEMENTS,
    };

    #[test]
    fn unit_relationships_hold() {
        assert_eq!(MM, 1.0);
        assert_eq!(CM, 10.0);
        assert_eq!(M, 1_000.0);
        assert!((INCH - 25.4).abs() <= 1.0e-12);
    }

    #[test]
    fn standard_grid_dimensions_are_consistent() {
        assert_eq!(STANDARD_TOTAL_ELEMENTS, 1225);
        assert_eq!(STANDARD_SIDE * STANDARD_SIDE, STANDARD_TOTAL_ELEMENTS);
        assert_eq!(STANDARD_ELEMENT_PITCH, 50.0);
        assert!((STANDARD_CRYSTAL_LENGTH - 304.8).abs() <= 1.0e-9);
    }
}
