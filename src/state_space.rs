use std::cmp::min;

use crate::cost::Cost;
use crate::data_structures::indexed_heap::IndexedHeap;
use crate::env::Action;
use crate::env::Coord;
use crate::env::Environment;
use crate::env::Key;
use crate::node::Node;
use crate::node::NodeId;
use crate::node::NodeTable;

/// Queue priority shared by both search modes.
///
/// The pair is `(min(g, rhs) + ε·h, min(g, rhs))` with lexicographic order.
/// Plain A* never touches `rhs` (it stays +∞), so the first component
/// collapses to the classic `g + ε·h` and the second is a deterministic
/// tie-break on `g`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rank<C: Cost> {
    f: C,
    k: C,
}

impl<C> Rank<C>
where
    C: Cost,
{
    #[inline(always)]
    #[must_use]
    pub(crate) fn new(f: C, k: C) -> Self {
        Self { f, k }
    }

    /// The rank of anything unreached. Sorts after every finite rank.
    #[inline(always)]
    #[must_use]
    pub fn infinite() -> Self {
        Self {
            f: C::max_value(),
            k: C::max_value(),
        }
    }

    #[inline(always)]
    #[must_use]
    pub fn f(&self) -> C {
        self.f
    }
}

/// Heuristic weighting policy.
///
/// `Inflated(ε)` with admissible `h` gives the usual ε-suboptimality bound;
/// `None` disables the heuristic entirely (the historical `ε = 0` sentinel)
/// and degrades the search to uniform-cost.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Heuristic<C: Cost> {
    None,
    Inflated(C),
}

impl<C> Heuristic<C>
where
    C: Cost,
{
    /// Maps the historical scalar encoding: `0` means disabled, anything else
    /// is an inflation weight.
    #[must_use]
    pub fn from_eps(eps: C) -> Self {
        if eps.is_zero() {
            Self::None
        } else {
            Self::Inflated(eps)
        }
    }

    /// What to store as a node's `h` at creation time.
    #[inline(always)]
    pub(crate) fn evaluate<K, Crd, A, E>(&self, env: &E, coord: &Crd) -> C
    where
        K: Key,
        Crd: Coord,
        A: Action,
        E: Environment<K, Crd, A, C> + ?Sized,
    {
        match self {
            Self::None => C::zero(),
            Self::Inflated(_) => env.get_heur(coord),
        }
    }

    /// The weighted contribution of a stored `h` to a priority.
    #[inline(always)]
    pub(crate) fn weigh(&self, h: C) -> C {
        match self {
            Self::None => C::zero(),
            Self::Inflated(eps) => *eps * h,
        }
    }
}

/// The persistent workspace of the search.
///
/// Owns the open queue, the node table, and the search parameters, and
/// survives across planning calls: a warm `StateSpace` is what turns the
/// incremental mode into a cheap replan instead of a cold start. Discard it
/// to reclaim memory or to force a from-scratch search.
#[derive(Debug)]
pub struct StateSpace<K, Crd, A, C>
where
    K: Key,
    Crd: Coord,
    A: Action,
    C: Cost,
{
    pub(crate) queue: IndexedHeap<Rank<C>, NodeId>,
    pub(crate) table: NodeTable<K, Crd, A, C>,
    eps: Heuristic<C>,
    /// Primitive time step; only used when reporting the trace-back.
    dt: f64,
    /// Horizon on the time coordinate of queued nodes. `f64::INFINITY`
    /// disables it.
    max_t: f64,
    /// Set when an incremental run initializes; the start's `rhs` is pinned
    /// at 0 and never recomputed from predecessors.
    start_key: Option<K>,
    expand_iteration: usize,
    /// Node chain of the last trace-back, start to goal.
    pub(crate) best_child: Vec<NodeId>,
}

impl<K, Crd, A, C> StateSpace<K, Crd, A, C>
where
    K: Key,
    Crd: Coord,
    A: Action,
    C: Cost,
{
    #[must_use]
    pub fn new(eps: Heuristic<C>, dt: f64) -> Self {
        Self {
            queue: IndexedHeap::new(),
            table: NodeTable::new(),
            eps,
            dt,
            max_t: f64::INFINITY,
            start_key: None,
            expand_iteration: 0,
            best_child: vec![],
        }
    }

    #[inline(always)]
    #[must_use]
    pub fn eps(&self) -> Heuristic<C> {
        self.eps
    }
    /// ε is fixed within a planning call; changing it between calls is fine
    /// and takes effect as priorities are recomputed.
    pub fn set_eps(&mut self, eps: Heuristic<C>) {
        self.eps = eps;
    }

    #[inline(always)]
    #[must_use]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    #[inline(always)]
    #[must_use]
    pub fn max_t(&self) -> f64 {
        self.max_t
    }
    pub(crate) fn set_max_t(&mut self, max_t: f64) {
        self.max_t = max_t;
    }

    pub(crate) fn set_start_key(&mut self, key: K) {
        self.start_key = Some(key);
    }

    /// Expansions performed by the last planning call, including calls that
    /// ended at a cap.
    #[inline(always)]
    #[must_use]
    pub fn expansions(&self) -> usize {
        self.expand_iteration
    }
    pub(crate) fn set_expansions(&mut self, n: usize) {
        self.expand_iteration = n;
    }

    /// Node chain of the last trace-back, start to goal.
    #[must_use]
    pub fn best_child(&self) -> &[NodeId] {
        &self.best_child
    }

    #[must_use]
    pub fn node(&self, key: &K) -> Option<&Node<K, Crd, A, C>> {
        self.table.id(key).map(|id| &self.table[id])
    }

    #[inline(always)]
    #[must_use]
    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of nodes discovered so far.
    #[inline(always)]
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.table.len()
    }

    /// Discards every cached node and queue entry, keeping the parameters.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.table.clear();
        self.best_child.clear();
        self.start_key = None;
        self.expand_iteration = 0;
        self.max_t = f64::INFINITY;
    }

    /// The queue priority of a node under the current ε.
    #[must_use]
    pub fn priority(&self, id: NodeId) -> Rank<C> {
        let node = &self.table[id];
        let k = min(node.g, node.rhs);
        Rank::new(k.saturating_add(&self.eps.weigh(node.h)), k)
    }

    pub(crate) fn get_or_create<E>(&mut self, env: &E, key: K, coord: Crd) -> NodeId
    where
        E: Environment<K, Crd, A, C>,
    {
        let eps = self.eps;
        self.table.get_or_create(key, coord, || eps.evaluate(env, &coord))
    }

    /// Queues a node at its current priority, (re-)opening it.
    pub(crate) fn enqueue(&mut self, id: NodeId) {
        debug_assert!(self.table[id].heap_handle.is_none());
        let rank = self.priority(id);
        let handle = self.queue.push(rank, id);
        let node = &mut self.table[id];
        node.heap_handle = Some(handle);
        node.opened = true;
        node.closed = false;
    }

    /// Pops the best node, closing it.
    pub(crate) fn pop_min_node(&mut self) -> Option<NodeId> {
        let (_, id) = self.queue.pop_min()?;
        let node = &mut self.table[id];
        debug_assert!(node.heap_handle.is_some());
        node.heap_handle = None;
        node.closed = true;
        Some(id)
    }

    pub(crate) fn top_rank(&self) -> Option<Rank<C>> {
        self.queue.top().map(|(rank, _)| *rank)
    }

    /// The incremental consistency-repair step.
    ///
    /// Recomputes `rhs` from the recorded predecessors (unless `id` is the
    /// start, whose `rhs` is pinned), drops any live queue entry, and
    /// requeues the node iff it is inconsistent and inside the time horizon.
    pub fn update_node(&mut self, id: NodeId) {
        let key = self.table[id].key;
        if self.start_key != Some(key) {
            let mut rhs = C::max_value();
            {
                let node = &self.table[id];
                for e in &node.pred_edges {
                    // +∞ edges never contribute.
                    if !e.cost.valid() {
                        continue;
                    }
                    if let Some(pid) = self.table.id(&e.key) {
                        rhs = min(rhs, self.table[pid].g.saturating_add(&e.cost));
                    }
                }
            }
            self.table[id].rhs = rhs;
        }

        if let Some(handle) = self.table[id].heap_handle.take() {
            self.queue.remove(handle);
        }

        let node = &self.table[id];
        if node.g != node.rhs && node.coord.t() <= self.max_t {
            let rank = self.priority(id);
            let handle = self.queue.push(rank, id);
            self.table[id].heap_handle = Some(handle);
        }

        let node = &mut self.table[id];
        node.opened = true;
        node.closed = false;
    }

    /// [`StateSpace::update_node`] addressed by key. Returns `false` for a
    /// key the search has never touched.
    pub fn update_node_key(&mut self, key: &K) -> bool {
        match self.table.id(key) {
            Some(id) => {
                self.update_node(id);
                true
            }
            None => false,
        }
    }

    /// Rewrites the cost of the recorded edge `from → to` on both sides
    /// (successor list of `from`, predecessor list of `to`), so the caches
    /// stay reciprocal. Returns whether any recorded edge matched.
    ///
    /// This is how a changed map reaches a warm state space: rewrite the
    /// affected edges, `update_node_key` their targets, replan.
    pub fn set_edge_cost(&mut self, from: &K, to: &K, cost: C) -> bool {
        let mut found = false;
        if let Some(fid) = self.table.id(from) {
            for e in &mut self.table[fid].succ_edges {
                if e.key == *to {
                    e.cost = cost;
                    found = true;
                }
            }
        }
        if let Some(tid) = self.table.id(to) {
            for e in &mut self.table[tid].pred_edges {
                if e.key == *from {
                    e.cost = cost;
                    found = true;
                }
            }
        }
        found
    }

    #[inline(always)]
    #[cfg(not(feature = "verify"))]
    pub(crate) fn verify(&self) {
        // All good... (hopefully)
    }
    /// Queue/table synchronization invariants.
    #[inline(always)]
    #[cfg(feature = "verify")]
    pub(crate) fn verify(&self) {
        // Every queued entry,
        for (handle, rank, id) in self.queue.iter() {
            // - Is the entry its node's handle names.
            debug_assert_eq!(self.table[*id].heap_handle, Some(handle));
            // - Ranks at the node's current priority.
            debug_assert_eq!(*rank, self.priority(*id));
        }
    }

    #[inline(always)]
    #[cfg(not(feature = "verify"))]
    pub(crate) fn verify_incremental(&self) {
        // All good... (hopefully)
    }
    /// Incremental-mode invariants, on top of [`StateSpace::verify`].
    /// Assumes the space has only ever been driven in incremental mode.
    #[inline(always)]
    #[cfg(feature = "verify")]
    pub(crate) fn verify_incremental(&self) {
        self.verify();

        for node in self.table.iter() {
            // Every inconsistent node inside the horizon is queued.
            if !node.is_consistent() && node.coord.t() <= self.max_t {
                debug_assert!(
                    node.heap_handle.is_some(),
                    "Inconsistent node {:?} is missing from the queue",
                    node.key,
                );
            }

            // Every cached successor edge has its reciprocal predecessor.
            for e in &node.succ_edges {
                let Some(tid) = self.table.id(&e.key) else {
                    continue;
                };
                debug_assert!(
                    self.table[tid]
                        .pred_edges
                        .iter()
                        .any(|p| p.key == node.key && p.action == e.action),
                    "Edge {:?} -> {:?} has no reciprocal",
                    node.key,
                    e.key,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::float_cost::FloatCost;
    use crate::node::PredEdge;

    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    struct Id(u32);
    impl Key for Id {}

    #[derive(Copy, Clone, Debug)]
    struct At {
        t: f64,
    }
    impl Coord for At {
        fn t(&self) -> f64 {
            self.t
        }
    }

    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    struct Move(u8);
    impl Action for Move {}

    type Space = StateSpace<Id, At, Move, FloatCost>;

    fn cost(f: f64) -> FloatCost {
        FloatCost::new(f)
    }

    #[test]
    fn rank_orders_lexicographically() {
        let a = Rank::new(cost(3.0), cost(1.0));
        let b = Rank::new(cost(3.0), cost(2.0));
        let c = Rank::new(cost(4.0), cost(0.0));
        assert!(a < b);
        assert!(b < c);
        assert!(Rank::<FloatCost>::infinite() > c);
    }

    #[test]
    fn eps_zero_is_the_disabled_policy() {
        assert_eq!(Heuristic::from_eps(cost(0.0)), Heuristic::None);
        assert_eq!(
            Heuristic::from_eps(cost(2.0)),
            Heuristic::Inflated(cost(2.0))
        );
        assert_eq!(Heuristic::None.weigh(cost(7.0)), cost(0.0));
        assert_eq!(Heuristic::Inflated(cost(2.0)).weigh(cost(3.0)), cost(6.0));
    }

    #[test]
    fn update_node_recomputes_rhs_from_preds() {
        let mut ss = Space::new(Heuristic::from_eps(cost(1.0)), 1.0);
        let s = ss.table.get_or_create(Id(0), At { t: 0.0 }, || cost(0.0));
        let v = ss.table.get_or_create(Id(1), At { t: 1.0 }, || cost(0.0));
        ss.set_start_key(Id(0));
        ss.table[s].g = cost(0.0);

        ss.table[v].pred_edges.push(PredEdge {
            key: Id(0),
            action: Move(0),
            cost: cost(2.0),
        });
        ss.update_node(v);

        assert_eq!(ss.table[v].rhs, cost(2.0));
        // g (+∞) ≠ rhs, so the node must now be queued.
        assert!(ss.table[v].heap_handle.is_some());
        assert_eq!(ss.top_rank(), Some(Rank::new(cost(2.0), cost(2.0))));
    }

    #[test]
    fn update_node_ignores_blocked_edges() {
        let mut ss = Space::new(Heuristic::from_eps(cost(1.0)), 1.0);
        let s = ss.table.get_or_create(Id(0), At { t: 0.0 }, || cost(0.0));
        let v = ss.table.get_or_create(Id(1), At { t: 1.0 }, || cost(0.0));
        ss.set_start_key(Id(0));
        ss.table[s].g = cost(0.0);

        ss.table[v].pred_edges.push(PredEdge {
            key: Id(0),
            action: Move(0),
            cost: FloatCost::infinity(),
        });
        ss.update_node(v);

        assert_eq!(ss.table[v].rhs, FloatCost::infinity());
        // Consistent at +∞: stays out of the queue.
        assert!(ss.table[v].heap_handle.is_none());
        assert!(ss.queue_is_empty());
    }

    #[test]
    fn update_node_respects_the_horizon() {
        let mut ss = Space::new(Heuristic::from_eps(cost(1.0)), 1.0);
        ss.set_max_t(5.0);
        let s = ss.table.get_or_create(Id(0), At { t: 0.0 }, || cost(0.0));
        let v = ss.table.get_or_create(Id(1), At { t: 9.0 }, || cost(0.0));
        ss.set_start_key(Id(0));
        ss.table[s].g = cost(0.0);

        ss.table[v].pred_edges.push(PredEdge {
            key: Id(0),
            action: Move(0),
            cost: cost(1.0),
        });
        ss.update_node(v);

        // Inconsistent, but past the horizon: not queued.
        assert_eq!(ss.table[v].rhs, cost(1.0));
        assert!(ss.table[v].heap_handle.is_none());
    }

    #[test]
    fn set_edge_cost_rewrites_both_sides() {
        let mut ss = Space::new(Heuristic::from_eps(cost(1.0)), 1.0);
        let u = ss.table.get_or_create(Id(0), At { t: 0.0 }, || cost(0.0));
        let v = ss.table.get_or_create(Id(1), At { t: 1.0 }, || cost(0.0));
        ss.table[u].succ_edges.push(crate::node::SuccEdge {
            key: Id(1),
            coord: At { t: 1.0 },
            action: Move(0),
            cost: cost(1.0),
        });
        ss.table[v].pred_edges.push(PredEdge {
            key: Id(0),
            action: Move(0),
            cost: cost(1.0),
        });

        assert!(ss.set_edge_cost(&Id(0), &Id(1), FloatCost::infinity()));
        assert_eq!(ss.table[u].succ_edges[0].cost, FloatCost::infinity());
        assert_eq!(ss.table[v].pred_edges[0].cost, FloatCost::infinity());

        assert!(!ss.set_edge_cost(&Id(7), &Id(8), cost(1.0)));
    }
}
