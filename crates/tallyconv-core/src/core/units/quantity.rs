use super::error::UnitError;
use super::unit::Unit;
use std::fmt;
use std::ops::Mul;

/// A magnitude (scalar or N-dimensional array) tagged with a [`Unit`].
///
/// Values are stored flat in row-major order; `shape` is empty for scalars.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    values: Vec<f64>,
    shape: Vec<usize>,
    units: Unit,
}

impl Quantity {
    /// A one-dimensional quantity.
    pub fn new(values: Vec<f64>, units: Unit) -> Self {
        let shape = vec![values.len()];
        Self {
            values,
            shape,
            units,
        }
    }

    pub fn scalar(value: f64, units: Unit) -> Self {
        Self {
            values: vec![value],
            shape: Vec::new(),
            units,
        }
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn units(&self) -> &Unit {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// Gives the same values a new shape; the element count must not change.
    pub fn reshape(self, shape: Vec<usize>) -> Result<Self, UnitError> {
        if shape.iter().product::<usize>() != self.values.len() {
            return Err(UnitError::InvalidShape {
                len: self.values.len(),
                shape,
            });
        }
        Ok(Self { shape, ..self })
    }

    /// Converts into `target`, which must have the same dimensionality.
    pub fn to(&self, target: &Unit) -> Result<Quantity, UnitError> {
        let factor = self.units.conversion_factor_to(target)?;
        Ok(Self {
            values: self.values.iter().map(|v| v * factor).collect(),
            shape: self.shape.clone(),
            units: target.clone(),
        })
    }

    fn zip_with(
        &self,
        rhs: &Quantity,
        units: Unit,
        op: impl Fn(f64, f64) -> f64,
    ) -> Result<Quantity, UnitError> {
        let (values, shape) = if rhs.values.len() == 1 {
            let r = rhs.values[0];
            (
                self.values.iter().map(|&l| op(l, r)).collect(),
                self.shape.clone(),
            )
        } else if self.values.len() == 1 {
            let l = self.values[0];
            (
                rhs.values.iter().map(|&r| op(l, r)).collect(),
                rhs.shape.clone(),
            )
        } else if self.shape == rhs.shape {
            (
                self.values
                    .iter()
                    .zip(&rhs.values)
                    .map(|(&l, &r)| op(l, r))
                    .collect(),
                self.shape.clone(),
            )
        } else {
            return Err(UnitError::ShapeMismatch {
                left: self.shape.clone(),
                right: rhs.shape.clone(),
            });
        };
        Ok(Quantity {
            values,
            shape,
            units,
        })
    }

    /// Element-wise product; a single-valued operand is broadcast.
    pub fn multiply(&self, rhs: &Quantity) -> Result<Quantity, UnitError> {
        self.zip_with(rhs, self.units.try_mul(&rhs.units)?, |l, r| l * r)
    }

    /// Element-wise quotient; a single-valued operand is broadcast.
    pub fn divide(&self, rhs: &Quantity) -> Result<Quantity, UnitError> {
        self.zip_with(rhs, self.units.try_div(&rhs.units)?, |l, r| l / r)
    }

    /// Element-wise sum in the units of `self`. Fails when `rhs` has a
    /// different dimensionality.
    pub fn try_add(&self, rhs: &Quantity) -> Result<Quantity, UnitError> {
        let rhs = rhs.to(&self.units)?;
        self.zip_with(&rhs, self.units.clone(), |l, r| l + r)
    }

    pub fn try_sub(&self, rhs: &Quantity) -> Result<Quantity, UnitError> {
        let rhs = rhs.to(&self.units)?;
        self.zip_with(&rhs, self.units.clone(), |l, r| l - r)
    }
}

impl Mul<f64> for Quantity {
    type Output = Quantity;

    fn mul(mut self, rhs: f64) -> Quantity {
        self.values.iter_mut().for_each(|v| *v *= rhs);
        self
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_scalar() {
            write!(f, "{} {}", self.values[0], self.units)
        } else {
            write!(f, "{:?} {}", self.values, self.units)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::units::registry::UnitRegistry;

    fn units(expression: &str) -> Unit {
        UnitRegistry::default().parse_units(expression).unwrap()
    }

    fn assert_close(a: f64, b: f64) {
        assert!(
            (a - b).abs() <= 1e-12 * a.abs().max(b.abs()),
            "{} != {}",
            a,
            b
        );
    }

    #[test]
    fn to_rescales_values_and_replaces_units() {
        let q = Quantity::new(vec![1.0, 2.0], units("MeV"));
        let joules = q.to(&units("J")).unwrap();
        assert_eq!(joules.units().to_string(), "joule");
        assert_close(joules.values()[1], 2.0 * 1.602_176_634e-13);
    }

    #[test]
    fn to_fails_for_incompatible_dimensions() {
        let q = Quantity::scalar(1.0, units("cm"));
        assert!(matches!(q.to(&units("g")), Err(UnitError::Incompatible { .. })));
    }

    #[test]
    fn round_trip_conversion_restores_values() {
        let original = Quantity::new(vec![3.5, 1e-7, 42.0], units("eV / simulated_particle"));
        let back = original
            .to(&units("kilojoule / simulated_particle"))
            .and_then(|q| q.to(original.units()))
            .unwrap();
        for (a, b) in original.values().iter().zip(back.values()) {
            assert_close(*a, *b);
        }
        assert_eq!(back.units(), original.units());
    }

    #[test]
    fn multiply_broadcasts_scalars_and_combines_units() {
        let flux = Quantity::new(vec![1.0, 2.0, 3.0], units("cm / simulated_particle"));
        let rate = Quantity::scalar(10.0, units("1 / s"));
        let product = flux.multiply(&rate).unwrap();
        assert_eq!(product.values(), &[10.0, 20.0, 30.0]);
        assert_eq!(product.shape(), &[3]);
        assert_eq!(
            product.units().to_string(),
            "centimeter / second / simulated_particle"
        );
    }

    #[test]
    fn divide_by_scalar_on_the_left_broadcasts_too() {
        let volume = Quantity::scalar(100.0, units("cm ** 3"));
        let counts = Quantity::new(vec![1.0, 4.0], units("atom"));
        let density = counts.divide(&volume).unwrap();
        assert_eq!(density.values(), &[0.01, 0.04]);
        let inverse = volume.divide(&counts).unwrap();
        assert_eq!(inverse.values(), &[100.0, 25.0]);
    }

    #[test]
    fn elementwise_ops_reject_mismatched_shapes() {
        let a = Quantity::new(vec![1.0, 2.0], units("cm"));
        let b = Quantity::new(vec![1.0, 2.0, 3.0], units("cm"));
        assert!(matches!(a.multiply(&b), Err(UnitError::ShapeMismatch { .. })));
    }

    #[test]
    fn try_add_converts_compatible_units_and_rejects_others() {
        let a = Quantity::scalar(1.0, units("m"));
        let b = Quantity::scalar(50.0, units("cm"));
        assert_close(a.try_add(&b).unwrap().values()[0], 1.5);
        assert_close(a.try_sub(&b).unwrap().values()[0], 0.5);
        let c = Quantity::scalar(1.0, units("s"));
        assert!(matches!(a.try_add(&c), Err(UnitError::Incompatible { .. })));
    }

    #[test]
    fn reshape_requires_matching_element_count() {
        let q = Quantity::new((0..6).map(f64::from).collect(), units("W"));
        let grid = q.clone().reshape(vec![2, 3]).unwrap();
        assert_eq!(grid.shape(), &[2, 3]);
        assert!(matches!(
            q.reshape(vec![4, 2]),
            Err(UnitError::InvalidShape { len: 6, .. })
        ));
    }

    #[test]
    fn scalar_multiplication_keeps_units() {
        let q = Quantity::new(vec![2.0, 4.0], units("eV")) * 0.5;
        assert_eq!(q.values(), &[1.0, 2.0]);
        assert_eq!(q.units().to_string(), "electron_volt");
    }
}
