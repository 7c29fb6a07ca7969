use std::fmt;
use std::ops::{Add, Neg, Sub};

/// A base physical axis tracked by the unit algebra.
///
/// Besides the mechanical SI axes, three neutronics pseudo-dimensions are real
/// base dimensions: a quantity "per pulse" can never be converted into one
/// "per second" (or "per atom", "per displacement") without an explicit factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    Length,
    Mass,
    Time,
    Pulse,
    Atom,
    Displacement,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::Length,
        Dimension::Mass,
        Dimension::Time,
        Dimension::Pulse,
        Dimension::Atom,
        Dimension::Displacement,
    ];

    #[inline]
    const fn index(self) -> usize {
        match self {
            Dimension::Length => 0,
            Dimension::Mass => 1,
            Dimension::Time => 2,
            Dimension::Pulse => 3,
            Dimension::Atom => 4,
            Dimension::Displacement => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dimension::Length => "length",
            Dimension::Mass => "mass",
            Dimension::Time => "time",
            Dimension::Pulse => "pulse",
            Dimension::Atom => "atom",
            Dimension::Displacement => "displacement",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.name())
    }
}

/// Integer exponents over every [`Dimension`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimensionality([i32; 6]);

impl Dimensionality {
    pub const DIMENSIONLESS: Dimensionality = Dimensionality([0; 6]);

    pub const fn new(
        length: i32,
        mass: i32,
        time: i32,
        pulse: i32,
        atom: i32,
        displacement: i32,
    ) -> Self {
        Self([length, mass, time, pulse, atom, displacement])
    }

    pub const fn of(dimension: Dimension) -> Self {
        let mut exponents = [0; 6];
        exponents[dimension.index()] = 1;
        Self(exponents)
    }

    #[inline]
    pub fn get(&self, dimension: Dimension) -> i32 {
        self.0[dimension.index()]
    }

    pub fn is_dimensionless(&self) -> bool {
        self.0.iter().all(|&e| e == 0)
    }

    pub fn checked_powi(&self, exponent: i32) -> Option<Self> {
        let mut out = [0; 6];
        for (o, e) in out.iter_mut().zip(self.0) {
            *o = e.checked_mul(exponent)?;
        }
        Some(Self(out))
    }

    pub fn checked_add(&self, rhs: Self) -> Option<Self> {
        let mut out = [0; 6];
        for ((o, l), r) in out.iter_mut().zip(self.0).zip(rhs.0) {
            *o = l.checked_add(r)?;
        }
        Some(Self(out))
    }

    /// Largest exponent magnitude over all axes.
    pub fn max_abs_exponent(&self) -> i32 {
        self.0.iter().map(|e| e.saturating_abs()).max().unwrap_or(0)
    }

    /// True when the exponents contain at least one power of energy
    /// (mass · length² · time⁻²).
    pub fn carries_energy(&self) -> bool {
        self.get(Dimension::Mass) >= 1
            && self.get(Dimension::Length) >= 2
            && self.get(Dimension::Time) <= -2
    }
}

impl Add for Dimensionality {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        let mut out = self.0;
        for (o, r) in out.iter_mut().zip(rhs.0) {
            *o += r;
        }
        Self(out)
    }
}

impl Sub for Dimensionality {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self + (-rhs)
    }
}

impl Neg for Dimensionality {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(self.0.map(|e| -e))
    }
}

impl fmt::Display for Dimensionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = Dimension::ALL
            .iter()
            .filter(|d| self.get(**d) != 0)
            .map(|d| match self.get(*d) {
                1 => d.to_string(),
                e => format!("{} ** {}", d, e),
            })
            .collect();
        if parts.is_empty() {
            write!(f, "dimensionless")
        } else {
            write!(f, "{}", parts.join(" * "))
        }
    }
}
