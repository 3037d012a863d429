use std::fmt::Debug;
use std::hash::Hash;

use crate::cost::Cost;

/// Opaque identifier of a discretized state.
///
/// The search only hashes and compares keys; what goes into the tuple
/// (position, velocity, time, yaw, ...) is the environment's business.
pub trait Key: Copy + Clone + Debug + PartialEq + Eq + Hash {}

/// The continuous state behind a [`Key`].
pub trait Coord: Copy + Clone + Debug {
    /// Time component. Non-decreasing along any edge, which is what makes the
    /// `max_t` horizon cap meaningful.
    fn t(&self) -> f64;
}

/// Identifier of a motion primitive out of a state.
pub trait Action: Copy + Clone + Debug + PartialEq + Eq {}

/// Successor set of one expansion, as four parallel columns.
///
/// A `max_value()` cost marks an edge that is dynamically feasible but
/// obstacle-blocked; it is listed so incremental replans can later revisit it.
#[derive(Debug, Clone)]
pub struct Successors<K, Crd, A, C>
where
    K: Key,
    Crd: Coord,
    A: Action,
    C: Cost,
{
    pub coords: Vec<Crd>,
    pub keys: Vec<K>,
    pub costs: Vec<C>,
    pub actions: Vec<A>,
}

impl<K, Crd, A, C> Successors<K, Crd, A, C>
where
    K: Key,
    Crd: Coord,
    A: Action,
    C: Cost,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            coords: vec![],
            keys: vec![],
            costs: vec![],
            actions: vec![],
        }
    }

    #[must_use]
    pub fn with_capacity(n: usize) -> Self {
        Self {
            coords: Vec::with_capacity(n),
            keys: Vec::with_capacity(n),
            costs: Vec::with_capacity(n),
            actions: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, coord: Crd, key: K, cost: C, action: A) {
        self.coords.push(coord);
        self.keys.push(key);
        self.costs.push(cost);
        self.actions.push(action);
    }

    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.coords.len(), self.keys.len());
        debug_assert_eq!(self.coords.len(), self.costs.len());
        debug_assert_eq!(self.coords.len(), self.actions.len());
        self.coords.len()
    }

    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Crd, K, C, A)> + '_ {
        debug_assert_eq!(self.coords.len(), self.keys.len());
        debug_assert_eq!(self.coords.len(), self.costs.len());
        debug_assert_eq!(self.coords.len(), self.actions.len());
        (0..self.len()).map(|i| (self.coords[i], self.keys[i], self.costs[i], self.actions[i]))
    }
}

impl<K, Crd, A, C> Default for Successors<K, Crd, A, C>
where
    K: Key,
    Crd: Coord,
    A: Action,
    C: Cost,
{
    fn default() -> Self {
        Self::new()
    }
}

/// The world the search plans in.
///
/// Implementations are read-only for the duration of a planning call and may
/// change between calls; in incremental mode the caller re-opens the affected
/// nodes before the next call (see `StateSpace::set_edge_cost`).
pub trait Environment<K, Crd, A, C>
where
    K: Key,
    Crd: Coord,
    A: Action,
    C: Cost,
{
    /// One dynamically feasible motion segment.
    type Primitive: Clone + Debug;

    fn is_goal(&self, coord: &Crd) -> bool;

    /// Cost-to-go estimate, ≥ 0. Admissible for optimality, consistent for
    /// single-expansion behavior.
    fn get_heur(&self, coord: &Crd) -> C;

    /// Expands a state into its successor columns.
    fn get_succ(&self, coord: &Crd) -> Successors<K, Crd, A, C>;

    /// Reproduces the primitive that derived a successor from `coord` via
    /// `action` during expansion.
    fn forward_action(&self, coord: &Crd, action: A) -> Self::Primitive;
}

/// An ordered concatenation of motion primitives, start to goal.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory<P> {
    segments: Vec<P>,
}

impl<P> Trajectory<P> {
    #[must_use]
    pub fn new(segments: Vec<P>) -> Self {
        Self { segments }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self { segments: vec![] }
    }

    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn segments(&self) -> &[P] {
        &self.segments
    }
}

impl<P> IntoIterator for Trajectory<P> {
    type Item = P;
    type IntoIter = std::vec::IntoIter<P>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.into_iter()
    }
}
