/// Edge and path costs.
///
/// A totally ordered additive cost with an upper bound that doubles as the
/// "unreachable" value. `max_value()` plays the role of +∞: blocked edges
/// carry it, fresh nodes start at it, and `saturating_add` keeps sums from
/// wrapping past it. `Mul` is required for heuristic inflation (ε · h).
pub trait Cost:
    Copy
    + std::fmt::Debug
    + std::fmt::Display
    + PartialEq
    + core::cmp::Eq
    + PartialOrd
    + Ord
    + num_traits::SaturatingAdd
    + num_traits::bounds::UpperBounded
    + num_traits::Zero
    + num_traits::One
    + std::ops::Add<Self, Output = Self>
    + std::ops::Sub<Self, Output = Self>
    + std::ops::Mul<Self, Output = Self>
    + std::ops::AddAssign
{
    #[inline(always)]
    fn valid(&self) -> bool {
        *self != num_traits::bounds::UpperBounded::max_value()
    }
}
