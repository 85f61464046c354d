//! Material table for the apparatus volumes.
//!
//! Only bulk composition and density are carried; cross sections and optical
//! properties stay with the transport engine.

use crate::domain::{CaloError, CaloResult, MaterialRole};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub name: &'static str,
    pub symbol: &'static str,
    pub atomic_number: u32,
    /// g/mole
    pub molar_mass: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialState {
    Solid,
    Liquid,
    Gas,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialComponent {
    pub element: Element,
    pub atoms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub name: &'static str,
    /// g/cm3
    pub density: f64,
    pub state: MaterialState,
    pub components: &'static [MaterialComponent],
}

impl Material {
    /// Molar mass of one formula unit in g/mole.
    pub fn formula_mass(&self) -> f64 {
        self.components
            .iter()
            .map(|component| component.element.molar_mass * f64::from(component.atoms))
            .sum()
    }

    pub fn mass_fraction(&self, symbol: &str) -> Option<f64> {
        let total = self.formula_mass();
        self.components
            .iter()
            .find(|component| component.element.symbol.eq_ignore_ascii_case(symbol))
            .map(|component| component.element.molar_mass * f64::from(component.atoms) / total)
    }
}

const HYDROGEN: Element = Element {
    name: "Hydrogen",
    symbol: "H",
    atomic_number: 1,
    molar_mass: 1.01,
};

const ALUMINIUM: Element = Element {
    name: "Aluminum",
    symbol: "Al",
    atomic_number: 13,
    molar_mass: 26.98,
};

const IODINE: Element = Element {
    name: "Iodine",
    symbol: "I",
    atomic_number: 53,
    molar_mass: 126.9,
};

const CAESIUM: Element = Element {
    name: "Cesium",
    symbol: "Cs",
    atomic_number: 55,
    molar_mass: 132.9,
};

const LEAD: Element = Element {
    name: "Lead",
    symbol: "Pb",
    atomic_number: 82,
    molar_mass: 207.2,
};

pub const VACUUM: &str = "Vacuum";
pub const LIQUID_HYDROGEN: &str = "Liquid Hydrogen";
pub const CAESIUM_IODIDE: &str = "Cesium Iodide";
pub const ALUMINUM: &str = "Aluminum";
pub const LEAD_LINING: &str = "Lead";

/// 100x the natural 0.07085 g/cm3 of liquid hydrogen.
const LIQUID_HYDROGEN_DENSITY: f64 = 0.070_85 * 100.0;
const UNIVERSE_MEAN_DENSITY: f64 = 1.0e-25;

pub static MATERIALS: [Material; 5] = [
    Material {
        name: VACUUM,
        density: UNIVERSE_MEAN_DENSITY,
        state: MaterialState::Gas,
        components: &[MaterialComponent {
            element: HYDROGEN,
            atoms: 1,
        }],
    },
    Material {
        name: LIQUID_HYDROGEN,
        density: LIQUID_HYDROGEN_DENSITY,
        state: MaterialState::Liquid,
        components: &[MaterialComponent {
            element: HYDROGEN,
            atoms: 2,
        }],
    },
    Material {
        name: CAESIUM_IODIDE,
        density: 4.51,
        state: MaterialState::Solid,
        components: &[
            MaterialComponent {
                element: CAESIUM,
                atoms: 1,
            },
            MaterialComponent {
                element: IODINE,
                atoms: 1,
            },
        ],
    },
    Material {
        name: ALUMINUM,
        density: 2.7,
        state: MaterialState::Solid,
        components: &[MaterialComponent {
            element: ALUMINIUM,
            atoms: 1,
        }],
    },
    Material {
        name: LEAD_LINING,
        density: 11.34,
        state: MaterialState::Solid,
        components: &[MaterialComponent {
            element: LEAD,
            atoms: 1,
        }],
    },
];

pub fn material_by_name(name: &str) -> Option<&'static Material> {
    let normalized = name.trim();
    if normalized.is_empty() {
        return None;
    }

    MATERIALS
        .iter()
        .find(|material| material.name.eq_ignore_ascii_case(normalized))
}

pub fn resolve_material(role: MaterialRole, name: &str) -> CaloResult<&'static Material> {
    material_by_name(name).ok_or_else(|| {
        CaloError::input_validation(
            "INPUT.MATERIAL",
            format!("unknown {} material '{}'", role, name),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::{
        CAESIUM_IODIDE, LEAD_LINING, LIQUID_HYDROGEN, MATERIALS, MaterialState, material_by_name,
        resolve_material,
    };
    use crate::domain::{CaloErrorCategory, MaterialRole};

    #[test]
    fn lookup_is_case_insensitive_and_trims() {
        let csi = material_by_name(" cesium iodide ").expect("CsI should resolve");
        assert_eq!(csi.name, CAESIUM_IODIDE);
        assert_eq!(csi.density, 4.51);
        assert!(material_by_name("").is_none());
        assert!(material_by_name("Unobtainium").is_none());
    }

    #[test]
    fn caesium_iodide_mass_fractions_sum_to_one() {
        let csi = material_by_name(CAESIUM_IODIDE).expect("CsI should resolve");
        let cs = csi.mass_fraction("Cs").expect("Cs fraction");
        let i = csi.mass_fraction("i").expect("I fraction");
        assert!((cs + i - 1.0).abs() <= 1.0e-12);
        assert!((csi.formula_mass() - 259.8).abs() <= 1.0e-9);
        assert!(csi.mass_fraction("Pb").is_none());
    }

    #[test]
    fn every_material_has_positive_density_and_components() {
        for material in &MATERIALS {
            assert!(material.density > 0.0, "{} density", material.name);
            assert!(!material.components.is_empty(), "{} components", material.name);
        }
        let hydrogen = material_by_name(LIQUID_HYDROGEN).expect("LH2 should resolve");
        assert_eq!(hydrogen.state, MaterialState::Liquid);
        assert!((hydrogen.density - 7.085).abs() <= 1.0e-12);
    }

    #[test]
    fn unknown_role_material_is_an_input_error() {
        assert_eq!(
            resolve_material(MaterialRole::Lining, LEAD_LINING)
                .expect("lead should resolve")
                .name,
            LEAD_LINING
        );

        let error = resolve_material(MaterialRole::Calorimeter, "G4_PbWO4")
            .expect_err("unknown material should fail");
        assert_eq!(error.category(), CaloErrorCategory::InputValidationError);
        assert_eq!(error.placeholder(), "INPUT.MATERIAL");
        assert!(error.message().contains("calorimeter"));
    }
}
