use derive_more::Display;
use num_traits::One;
use num_traits::SaturatingAdd;
use num_traits::Zero;
use num_traits::bounds::UpperBounded;
use ordered_float::OrderedFloat;

use crate::cost::Cost;

/// The canonical [`Cost`]: an `f64` wrapped in [`OrderedFloat`] so IEEE
/// infinity is a totally ordered `max_value()`.
///
/// NaN never arises from the operations the search performs (no ∞ − ∞, no
/// 0 · ∞ since ε and h are finite), so `OrderedFloat`'s NaN ordering never
/// decides a comparison.
#[derive(Copy, Clone, Default, Debug, Display, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
#[display("{_0}")]
pub struct FloatCost(pub OrderedFloat<f64>);

impl Cost for FloatCost {}

impl FloatCost {
    #[inline(always)]
    pub fn new(f: f64) -> Self {
        Self(OrderedFloat(f))
    }

    #[inline(always)]
    pub fn infinity() -> Self {
        Self(OrderedFloat(f64::INFINITY))
    }

    #[inline(always)]
    pub fn get(&self) -> f64 {
        self.0.0
    }
}

impl std::ops::Add for FloatCost {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}
impl std::ops::Sub for FloatCost {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}
impl std::ops::Mul for FloatCost {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}
impl std::ops::AddAssign for FloatCost {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SaturatingAdd for FloatCost {
    fn saturating_add(&self, rhs: &Self) -> Self {
        // Floats already saturate at infinity.
        Self(self.0 + rhs.0)
    }
}

impl Zero for FloatCost {
    #[inline(always)]
    fn is_zero(&self) -> bool {
        self.0 == OrderedFloat(0.0)
    }
    #[inline(always)]
    fn zero() -> Self {
        Self(OrderedFloat(0.0))
    }
}
impl One for FloatCost {
    #[inline(always)]
    fn one() -> Self {
        Self(OrderedFloat(1.0))
    }
}
impl UpperBounded for FloatCost {
    fn max_value() -> Self {
        Self::infinity()
    }
}

impl From<f64> for FloatCost {
    fn from(f: f64) -> Self {
        Self::new(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero() {
        assert!(FloatCost::new(0.0).is_zero());
        assert!(!FloatCost::new(0.5).is_zero());
    }

    #[test]
    fn order() {
        assert!(FloatCost::new(0.0) <= FloatCost::new(0.0));
        assert!(FloatCost::new(1.0) < FloatCost::infinity());
    }

    #[test]
    fn infinity_is_invalid() {
        assert!(FloatCost::new(3.5).valid());
        assert!(!FloatCost::infinity().valid());
        assert_eq!(FloatCost::infinity(), FloatCost::max_value());
    }

    #[test]
    fn sum() {
        let mut f = FloatCost::new(0.0);
        f += FloatCost::new(1.0);
        f += FloatCost::new(1.0);
        assert!(f == FloatCost::new(2.0));
        f += FloatCost::infinity();
        assert!(f == FloatCost::max_value());
    }

    #[test]
    fn saturating_sum_stays_at_infinity() {
        let inf = FloatCost::infinity();
        assert_eq!(inf.saturating_add(&FloatCost::new(1.0)), inf);
        assert_eq!(inf.saturating_add(&inf), inf);
    }
}
