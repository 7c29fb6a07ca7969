use phf::phf_map;
use thiserror::Error;

/// Grams per atomic mass unit.
pub const ATOMIC_MASS_UNIT_G: f64 = 1.66054e-24;

/// Natural-abundance molar masses in g/mol.
static ATOMIC_MASSES: phf::Map<&'static str, f64> = phf_map! {
    "H" => 1.008,
    "He" => 4.002602,
    "Li" => 6.94,
    "Be" => 9.0121831,
    "B" => 10.81,
    "C" => 12.011,
    "N" => 14.007,
    "O" => 15.999,
    "Na" => 22.98976928,
    "Mg" => 24.305,
    "Al" => 26.9815385,
    "Si" => 28.085,
    "Ti" => 47.867,
    "V" => 50.9415,
    "Cr" => 51.9961,
    "Mn" => 54.938044,
    "Fe" => 55.845,
    "Co" => 58.933194,
    "Ni" => 58.6934,
    "Cu" => 63.546,
    "Zr" => 91.224,
    "Nb" => 92.90637,
    "Mo" => 95.95,
    "Sn" => 118.71,
    "Ta" => 180.94788,
    "W" => 183.84,
    "Pb" => 207.2,
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MaterialError {
    #[error("Material {field} must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("Unknown element symbol '{0}'")]
    UnknownElement(String),
    #[error("Material composition is empty")]
    EmptyComposition,
}

/// Bulk material properties needed to count atoms in a region.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: Option<String>,
    pub density_g_per_cm3: f64,
    /// Mean molar mass in g/mol (equivalently, mean atomic mass in u).
    pub average_molar_mass: f64,
}

fn check_positive(field: &'static str, value: f64) -> Result<f64, MaterialError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(MaterialError::NonPositive { field, value })
    }
}

impl Material {
    pub fn new(density_g_per_cm3: f64, average_molar_mass: f64) -> Result<Self, MaterialError> {
        Ok(Self {
            name: None,
            density_g_per_cm3: check_positive("density", density_g_per_cm3)?,
            average_molar_mass: check_positive("average molar mass", average_molar_mass)?,
        })
    }

    pub fn from_element(symbol: &str, density_g_per_cm3: f64) -> Result<Self, MaterialError> {
        Self::from_composition(&[(symbol, 1.0)], density_g_per_cm3)
    }

    /// Builds a material from `(element symbol, atom fraction)` pairs. Fractions
    /// are normalized, so they need not sum to one.
    pub fn from_composition(
        composition: &[(&str, f64)],
        density_g_per_cm3: f64,
    ) -> Result<Self, MaterialError> {
        if composition.is_empty() {
            return Err(MaterialError::EmptyComposition);
        }
        let mut total_fraction = 0.0;
        let mut weighted_mass = 0.0;
        for &(symbol, fraction) in composition {
            let mass = atomic_mass(symbol)
                .ok_or_else(|| MaterialError::UnknownElement(symbol.to_string()))?;
            let fraction = check_positive("atom fraction", fraction)?;
            total_fraction += fraction;
            weighted_mass += fraction * mass;
        }
        let mut material = Self::new(density_g_per_cm3, weighted_mass / total_fraction)?;
        if let [(symbol, _)] = composition {
            material.name = Some(symbol.to_string());
        }
        Ok(material)
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn atoms_per_cm3(&self) -> f64 {
        self.density_g_per_cm3 / (self.average_molar_mass * ATOMIC_MASS_UNIT_G)
    }
}

pub fn atomic_mass(symbol: &str) -> Option<f64> {
    ATOMIC_MASSES.get(symbol).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atoms_per_cm3_divides_density_by_atomic_mass() {
        let iron = Material::from_element("Fe", 7.874).unwrap();
        let expected = 7.874 / (55.845 * 1.66054e-24);
        assert!((iron.atoms_per_cm3() - expected).abs() / expected < 1e-12);
        assert_eq!(iron.name.as_deref(), Some("Fe"));
    }

    #[test]
    fn from_composition_uses_atom_fraction_weighted_mass() {
        let water = Material::from_composition(&[("H", 2.0), ("O", 1.0)], 1.0)
            .unwrap()
            .with_name("water");
        let expected = (2.0 * 1.008 + 15.999) / 3.0;
        assert!((water.average_molar_mass - expected).abs() < 1e-12);
        assert_eq!(water.name.as_deref(), Some("water"));
    }

    #[test]
    fn new_rejects_non_positive_properties() {
        assert_eq!(
            Material::new(0.0, 55.845),
            Err(MaterialError::NonPositive {
                field: "density",
                value: 0.0
            })
        );
        assert!(Material::new(1.0, f64::NAN).is_err());
    }

    #[test]
    fn unknown_elements_and_empty_compositions_are_rejected() {
        assert_eq!(
            Material::from_element("Xx", 1.0),
            Err(MaterialError::UnknownElement("Xx".into()))
        );
        assert_eq!(
            Material::from_composition(&[], 1.0),
            Err(MaterialError::EmptyComposition)
        );
    }

    #[test]
    fn atomic_mass_looks_up_known_symbols() {
        assert_eq!(atomic_mass("W"), Some(183.84));
        assert_eq!(atomic_mass("w"), None);
    }
}
