use super::dimension::{Dimension, Dimensionality};
use super::error::UnitError;
use std::collections::BTreeMap;
use std::fmt;

/// Largest exponent magnitude a unit factor or dimension may carry.
pub const MAX_EXPONENT: i32 = 64;

/// A product of named units raised to integer powers.
///
/// Factors are keyed by canonical name (prefix included, e.g.
/// `megaelectron_volt`), so two units compare equal only when they are spelled
/// the same after normalisation. Use [`Unit::is_compatible_with`] to compare
/// dimensionality instead.
#[derive(Debug, Clone)]
pub struct Unit {
    factors: BTreeMap<String, i32>,
    scale: f64,
    dimensionality: Dimensionality,
}

impl Unit {
    pub fn dimensionless() -> Self {
        Self {
            factors: BTreeMap::new(),
            scale: 1.0,
            dimensionality: Dimensionality::DIMENSIONLESS,
        }
    }

    /// A single named unit. `scale` is its size in coherent SI base units.
    pub(crate) fn named(
        name: impl Into<String>,
        scale: f64,
        dimensionality: Dimensionality,
    ) -> Self {
        let mut factors = BTreeMap::new();
        factors.insert(name.into(), 1);
        Self {
            factors,
            scale,
            dimensionality,
        }
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[inline]
    pub fn dimensionality(&self) -> Dimensionality {
        self.dimensionality
    }

    #[inline]
    pub fn exponent(&self, dimension: Dimension) -> i32 {
        self.dimensionality.get(dimension)
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimensionality.is_dimensionless()
    }

    pub fn is_compatible_with(&self, other: &Unit) -> bool {
        self.dimensionality == other.dimensionality
    }

    /// Multiplier taking a magnitude in `self` to a magnitude in `target`.
    pub fn conversion_factor_to(&self, target: &Unit) -> Result<f64, UnitError> {
        if !self.is_compatible_with(target) {
            return Err(UnitError::Incompatible {
                from: self.to_string(),
                from_dims: self.dimensionality.to_string(),
                to: target.to_string(),
                to_dims: target.dimensionality.to_string(),
            });
        }
        Ok(self.scale / target.scale)
    }

    /// Raises every factor to `exponent`.
    ///
    /// # Errors
    ///
    /// [`UnitError::ExponentOverflow`] when a factor or dimension exponent
    /// would exceed [`MAX_EXPONENT`] in magnitude.
    pub fn try_powi(&self, exponent: i32) -> Result<Self, UnitError> {
        if exponent == 0 {
            return Ok(Self::dimensionless());
        }
        let overflow = || UnitError::ExponentOverflow {
            expression: format!("({}) ** {}", self, exponent),
            max: MAX_EXPONENT,
        };
        let mut factors = BTreeMap::new();
        for (name, exp) in &self.factors {
            let raised = i64::from(*exp) * i64::from(exponent);
            factors.insert(name.clone(), bounded(raised).ok_or_else(overflow)?);
        }
        let dimensionality = self
            .dimensionality
            .checked_powi(exponent)
            .filter(within_limit)
            .ok_or_else(overflow)?;
        Ok(Self {
            factors,
            scale: self.scale.powi(exponent),
            dimensionality,
        })
    }

    pub fn try_mul(&self, rhs: &Unit) -> Result<Self, UnitError> {
        self.combine(rhs, 1)
    }

    pub fn try_div(&self, rhs: &Unit) -> Result<Self, UnitError> {
        self.combine(rhs, -1)
    }

    fn combine(&self, rhs: &Unit, sign: i32) -> Result<Self, UnitError> {
        let overflow = || UnitError::ExponentOverflow {
            expression: format!(
                "{} {} {}",
                self,
                if sign > 0 { "*" } else { "/" },
                rhs
            ),
            max: MAX_EXPONENT,
        };
        let mut factors = self.factors.clone();
        for (name, exp) in &rhs.factors {
            let current = factors.get(name).copied().unwrap_or(0);
            let combined = i64::from(current) + i64::from(sign) * i64::from(*exp);
            match bounded(combined).ok_or_else(overflow)? {
                0 => {
                    factors.remove(name);
                }
                exp => {
                    factors.insert(name.clone(), exp);
                }
            }
        }
        let dimensionality = rhs
            .dimensionality
            .checked_powi(sign)
            .and_then(|rhs| self.dimensionality.checked_add(rhs))
            .filter(within_limit)
            .ok_or_else(overflow)?;
        Ok(Self {
            factors,
            scale: self.scale * rhs.scale.powi(sign),
            dimensionality,
        })
    }
}

fn bounded(exponent: i64) -> Option<i32> {
    if exponent.abs() <= i64::from(MAX_EXPONENT) {
        i32::try_from(exponent).ok()
    } else {
        None
    }
}

fn within_limit(dimensionality: &Dimensionality) -> bool {
    dimensionality.max_abs_exponent() <= MAX_EXPONENT
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.factors == other.factors
    }
}

fn write_factor(name: &str, exponent: i32) -> String {
    if exponent == 1 {
        name.to_string()
    } else {
        format!("{} ** {}", name, exponent)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.factors.is_empty() {
            return write!(f, "dimensionless");
        }
        let numerator: Vec<String> = self
            .factors
            .iter()
            .filter(|(_, exp)| **exp > 0)
            .map(|(name, exp)| write_factor(name, *exp))
            .collect();
        let denominator: Vec<String> = self
            .factors
            .iter()
            .filter(|(_, exp)| **exp < 0)
            .map(|(name, exp)| write_factor(name, -exp))
            .collect();

        if numerator.is_empty() {
            write!(f, "1")?;
        } else {
            write!(f, "{}", numerator.join(" * "))?;
        }
        for term in denominator {
            write!(f, " / {}", term)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centimeter() -> Unit {
        Unit::named("centimeter", 1e-2, Dimensionality::of(Dimension::Length))
    }

    fn second() -> Unit {
        Unit::named("second", 1.0, Dimensionality::of(Dimension::Time))
    }

    fn neutron() -> Unit {
        Unit::named("neutron", 1.0, Dimensionality::DIMENSIONLESS)
    }

    #[test]
    fn display_orders_numerator_then_denominators_alphabetically() {
        let unit = centimeter()
            .try_powi(2)
            .and_then(|u| u.try_mul(&neutron()))
            .and_then(|u| u.try_div(&second()))
            .unwrap();
        assert_eq!(unit.to_string(), "centimeter ** 2 * neutron / second");
    }

    #[test]
    fn display_uses_one_for_pure_denominators() {
        let unit = Unit::dimensionless()
            .try_div(&centimeter().try_powi(2).unwrap())
            .unwrap();
        assert_eq!(unit.to_string(), "1 / centimeter ** 2");
    }

    #[test]
    fn display_of_empty_unit_is_dimensionless() {
        assert_eq!(Unit::dimensionless().to_string(), "dimensionless");
    }

    #[test]
    fn factors_cancel_when_exponents_reach_zero() {
        let unit = centimeter()
            .try_mul(&second())
            .and_then(|u| u.try_div(&second()))
            .unwrap();
        assert_eq!(unit, centimeter());
        assert_eq!(unit.to_string(), "centimeter");
    }

    #[test]
    fn counting_units_do_not_change_dimensionality() {
        let flux = centimeter().try_mul(&neutron()).unwrap();
        assert!(flux.is_compatible_with(&centimeter()));
        assert_ne!(flux, centimeter());
    }

    #[test]
    fn scale_composes_through_powers() {
        let volume = centimeter().try_powi(3).unwrap();
        assert!((volume.scale() - 1e-6).abs() < 1e-18);
        assert_eq!(volume.exponent(Dimension::Length), 3);
    }

    #[test]
    fn try_powi_rejects_exponents_beyond_limit() {
        let result = centimeter().try_powi(2).unwrap().try_powi(2_000_000_000);
        assert!(matches!(
            result,
            Err(UnitError::ExponentOverflow {
                max: MAX_EXPONENT,
                ..
            })
        ));
        assert!(centimeter().try_powi(MAX_EXPONENT).is_ok());
        assert!(centimeter().try_powi(-MAX_EXPONENT - 1).is_err());
    }

    #[test]
    fn try_mul_rejects_exponents_beyond_limit() {
        let big = centimeter().try_powi(40).unwrap();
        assert!(matches!(
            big.try_mul(&big),
            Err(UnitError::ExponentOverflow { .. })
        ));
        let meter = Unit::named("meter", 1.0, Dimensionality::of(Dimension::Length));
        let mixed = meter.try_powi(40).unwrap();
        assert!(matches!(
            big.try_mul(&mixed),
            Err(UnitError::ExponentOverflow { .. })
        ));
        assert!(big.try_div(&big).unwrap().is_dimensionless());
    }

    #[test]
    fn conversion_factor_rejects_incompatible_units() {
        let result = centimeter().conversion_factor_to(&second());
        assert!(matches!(result, Err(UnitError::Incompatible { .. })));
    }

    #[test]
    fn conversion_factor_is_ratio_of_scales() {
        let meter = Unit::named("meter", 1.0, Dimensionality::of(Dimension::Length));
        let factor = centimeter().conversion_factor_to(&meter).unwrap();
        assert!((factor - 0.01).abs() < 1e-15);
    }
}
