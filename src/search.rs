use std::marker::PhantomData;

use thiserror::Error;
use tracing::debug;
use tracing::trace;

use crate::cost::Cost;
use crate::env::Action;
use crate::env::Coord;
use crate::env::Environment;
use crate::env::Key;
use crate::env::Trajectory;
use crate::node::NodeId;
use crate::node::PredEdge;
use crate::node::SuccEdge;
use crate::state_space::Rank;
use crate::state_space::StateSpace;

/// How an incremental run with a time horizon picks its terminal node.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum HorizonRule {
    /// A node becomes the terminal candidate once its time coordinate
    /// reaches the horizon.
    #[default]
    AtHorizon,
    /// Every expanded node becomes the candidate while a horizon is set,
    /// even far below it. Compatibility behavior of the original planner;
    /// terminates the incremental search at the first settled expansion.
    EveryExpansion,
}

/// Advisory caps on a planning call.
#[derive(Copy, Clone, Debug, Default)]
pub struct Termination {
    /// Stop after this many expansions. `None` disables the cap.
    pub max_expand: Option<usize>,
    /// Treat nodes at or past this time coordinate as terminal. `None`
    /// disables the horizon.
    pub max_t: Option<f64>,
    pub horizon_rule: HorizonRule,
}

impl Termination {
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Maps the historical scalar encoding: values ≤ 0 disable a cap.
    #[must_use]
    pub fn from_limits(max_expand: i64, max_t: f64) -> Self {
        Self {
            max_expand: (max_expand > 0).then_some(max_expand as usize),
            max_t: (max_t > 0.0).then_some(max_t),
            horizon_rule: HorizonRule::default(),
        }
    }

    #[must_use]
    pub fn with_max_expand(mut self, n: usize) -> Self {
        self.max_expand = Some(n);
        self
    }
    #[must_use]
    pub fn with_max_t(mut self, t: f64) -> Self {
        self.max_t = Some(t);
        self
    }
    #[must_use]
    pub fn with_horizon_rule(mut self, rule: HorizonRule) -> Self {
        self.horizon_rule = rule;
        self
    }
}

/// Terminal failures of a planning call.
///
/// Everything else reports through the return value; there is no panicking
/// control flow in the engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    /// The expansion cap fired. The state space keeps its partial frontier
    /// and remains queryable.
    #[error("expansion cap of {0} reached")]
    ExpansionCapReached(usize),
    /// The open queue drained before any terminal condition held.
    #[error("open queue exhausted before reaching a goal")]
    QueueExhausted,
}

/// The A* / Lifelong Planning A* engine.
///
/// Borrows the environment for its lifetime and a [`StateSpace`] per call;
/// the state space carries everything that persists between calls. Both
/// modes share the queue, the table, and the priority function — a warm
/// state space handed back to [`GraphSearch::lpastar`] after edge-cost
/// repairs is what makes replanning incremental.
pub struct GraphSearch<'e, E, K, Crd, A, C>
where
    E: Environment<K, Crd, A, C>,
    K: Key,
    Crd: Coord,
    A: Action,
    C: Cost,
{
    env: &'e E,
    _phantom: PhantomData<(K, Crd, A, C)>,
}

impl<'e, E, K, Crd, A, C> GraphSearch<'e, E, K, Crd, A, C>
where
    E: Environment<K, Crd, A, C>,
    K: Key,
    Crd: Coord,
    A: Action,
    C: Cost,
{
    #[must_use]
    pub fn new(env: &'e E) -> Self {
        Self {
            env,
            _phantom: PhantomData,
        }
    }

    /// Weighted A* with lazy successor discovery.
    ///
    /// Resumes on a non-empty frontier, so a run stopped by
    /// [`SearchError::ExpansionCapReached`] can be continued by calling
    /// again with the same state space.
    pub fn astar(
        &self,
        ss: &mut StateSpace<K, Crd, A, C>,
        start_coord: Crd,
        start_key: K,
        caps: &Termination,
    ) -> Result<Trajectory<E::Primitive>, SearchError> {
        if self.env.is_goal(&start_coord) {
            debug!("start is inside the goal region");
            ss.set_expansions(0);
            return Ok(Trajectory::empty());
        }

        if ss.queue_is_empty() {
            trace!("starting from a fresh frontier");
            let id = ss.get_or_create(self.env, start_key, start_coord);
            ss.table[id].g = C::zero();
            ss.enqueue(id);
        }

        let max_t = caps.max_t.unwrap_or(f64::INFINITY);

        let mut expand_iteration = 0usize;
        let outcome = loop {
            // Non-empty here: checked on entry and at the bottom of every
            // iteration.
            let Some(uid) = ss.pop_min_node() else {
                break Err(SearchError::QueueExhausted);
            };
            expand_iteration += 1;
            let (u_key, u_coord, u_g) = {
                let u = &ss.table[uid];
                (u.key, u.coord, u.g)
            };

            // Successors all satisfy the dynamics; obstacle-blocked ones
            // carry +∞ and are skipped outright.
            let succ = self.env.get_succ(&u_coord);
            for (coord, key, cost, action) in succ.iter() {
                if !cost.valid() {
                    continue;
                }

                let vid = ss.get_or_create(self.env, key, coord);
                // Multi-parent bookkeeping: always append, duplicates and
                // all. The trace-back tie-break wants every discovery.
                ss.table[vid].pred_edges.push(PredEdge {
                    key: u_key,
                    action,
                    cost,
                });

                let tentative = u_g.saturating_add(&cost);
                if tentative < ss.table[vid].g {
                    ss.table[vid].g = tentative;
                    let rank = ss.priority(vid);
                    match ss.table[vid].heap_handle {
                        // Still open: re-rank in place. The name promises an
                        // increase but the key may move either way.
                        Some(handle) => ss.queue.increase(handle, rank),
                        // New, or closed and now reached better: (re-)open.
                        None => ss.enqueue(vid),
                    }
                }
            }

            ss.verify();

            if self.env.is_goal(&u_coord) {
                debug!(expansions = expand_iteration, "goal reached");
                break Ok(uid);
            }
            if u_coord.t() >= max_t && u_g.valid() {
                debug!(t = u_coord.t(), "time horizon reached");
                break Ok(uid);
            }
            if let Some(cap) = caps.max_expand {
                if expand_iteration >= cap {
                    debug!(cap, "expansion cap reached");
                    break Err(SearchError::ExpansionCapReached(cap));
                }
            }
            if ss.queue_is_empty() {
                debug!("open queue exhausted");
                break Err(SearchError::QueueExhausted);
            }
        };

        ss.set_expansions(expand_iteration);
        let goal = outcome?;
        trace!(f = %ss.priority(goal).f(), g = %ss.table[goal].g, "recovering trajectory");
        Ok(self.trace_back(ss, goal, &start_key))
    }

    /// Lifelong Planning A*.
    ///
    /// Returns the goal's `g` and the traced trajectory; `max_value()` with
    /// an empty trajectory denotes failure. Call again on the same state
    /// space after [`StateSpace::set_edge_cost`] /
    /// [`StateSpace::update_node_key`] repairs to replan incrementally; with
    /// no repairs in between, the second call settles in zero expansions.
    pub fn lpastar(
        &self,
        ss: &mut StateSpace<K, Crd, A, C>,
        start_coord: Crd,
        start_key: K,
        caps: &Termination,
    ) -> (C, Trajectory<E::Primitive>) {
        if self.env.is_goal(&start_coord) {
            debug!("start is inside the goal region");
            ss.set_expansions(0);
            return (C::zero(), Trajectory::empty());
        }

        ss.set_max_t(caps.max_t.unwrap_or(f64::INFINITY));
        ss.set_start_key(start_key);

        // The start is seeded once per state space: g = +∞, rhs = 0.
        if ss.table.id(&start_key).is_none() {
            trace!("starting from a fresh state space");
            let id = ss.get_or_create(self.env, start_key, start_coord);
            ss.table[id].rhs = C::zero();
            ss.enqueue(id);
        }

        // Reuse the previous run's terminal if it was a genuine goal;
        // otherwise an unreached sentinel ranking after everything.
        let mut goal: Option<NodeId> = ss
            .best_child
            .last()
            .copied()
            .filter(|id| self.env.is_goal(&ss.table[*id].coord));

        let mut expand_iteration = 0usize;
        loop {
            let goal_rank = goal.map_or(Rank::infinite(), |gid| ss.priority(gid));
            let goal_consistent = goal.map_or(true, |gid| ss.table[gid].is_consistent());
            // A drained queue means the frontier is settled; what we have is
            // what there is.
            let Some(top_rank) = ss.top_rank() else {
                break;
            };
            if top_rank >= goal_rank && goal_consistent {
                break;
            }

            let Some(uid) = ss.pop_min_node() else {
                break;
            };
            expand_iteration += 1;

            // Consistency repair.
            if ss.table[uid].g > ss.table[uid].rhs {
                // Overconsistent: commit the lookahead and propagate.
                let rhs = ss.table[uid].rhs;
                ss.table[uid].g = rhs;
            } else {
                // Underconsistent: give the value up and re-evaluate; this
                // may requeue the node itself.
                ss.table[uid].g = C::max_value();
                ss.update_node(uid);
            }

            // First expansion discovers the outgoing edges; replans reuse
            // the cache and never consult the environment again.
            if ss.table[uid].succ_edges.is_empty() {
                let u_coord = ss.table[uid].coord;
                let succ = self.env.get_succ(&u_coord);
                trace!(t = u_coord.t(), degree = succ.len(), "exploring");
                for (coord, key, cost, action) in succ.iter() {
                    ss.table[uid].succ_edges.push(SuccEdge {
                        key,
                        coord,
                        action,
                        cost,
                    });
                }
            }

            let u_key = ss.table[uid].key;
            for s in 0..ss.table[uid].succ_edges.len() {
                let e = ss.table[uid].succ_edges[s];
                let vid = ss.get_or_create(self.env, e.key, e.coord);
                // Deduplicated here, unlike the best-first mode: repairs
                // re-expand nodes and must not stack duplicate back-edges.
                if !ss.table[vid].pred_edges.iter().any(|p| p.key == u_key) {
                    ss.table[vid].pred_edges.push(PredEdge {
                        key: u_key,
                        action: e.action,
                        cost: e.cost,
                    });
                }
                ss.update_node(vid);
            }

            ss.verify_incremental();

            let u_coord = ss.table[uid].coord;
            if self.env.is_goal(&u_coord) {
                goal = Some(uid);
            } else if ss.max_t().is_finite() {
                match caps.horizon_rule {
                    HorizonRule::AtHorizon if u_coord.t() >= ss.max_t() => goal = Some(uid),
                    HorizonRule::AtHorizon => {}
                    HorizonRule::EveryExpansion => goal = Some(uid),
                }
            }

            if let Some(cap) = caps.max_expand {
                if expand_iteration >= cap {
                    debug!(cap, "expansion cap reached");
                    ss.set_expansions(expand_iteration);
                    return (C::max_value(), Trajectory::empty());
                }
            }
        }

        ss.set_expansions(expand_iteration);

        match goal {
            Some(gid) => {
                let g = ss.table[gid].g;
                debug!(
                    expansions = expand_iteration,
                    g = %g,
                    rhs = %ss.table[gid].rhs,
                    "frontier settled"
                );
                let traj = self.trace_back(ss, gid, &start_key);
                (g, traj)
            }
            None => {
                debug!(expansions = expand_iteration, "no terminal candidate");
                (C::max_value(), Trajectory::empty())
            }
        }
    }

    /// Walks predecessor edges from `from` back to the start, rebuilding the
    /// primitive sequence.
    ///
    /// Among predecessors tying on `p.g + cost`, the one with the larger
    /// `p.g` wins: the latest equivalently-optimal parent, which keeps the
    /// reconstructed sequence off redundant early expansions. Also rewrites
    /// `best_child` with the node chain in start-to-goal order.
    fn trace_back(
        &self,
        ss: &mut StateSpace<K, Crd, A, C>,
        from: NodeId,
        start_key: &K,
    ) -> Trajectory<E::Primitive> {
        ss.best_child.clear();

        let dt = ss.dt();
        let mut prs: Vec<E::Primitive> = vec![];
        let mut curr = from;
        while !ss.table[curr].pred_edges.is_empty() {
            {
                let node = &ss.table[curr];
                trace!(
                    t = node.coord.t(),
                    prev_t = node.coord.t() - dt,
                    g = %node.g,
                    rhs = %node.rhs,
                    h = %node.h,
                    "trace step"
                );
            }
            ss.best_child.push(curr);

            let mut choice: Option<(NodeId, A)> = None;
            let mut min_rhs = C::max_value();
            let mut min_g = C::max_value();
            {
                let node = &ss.table[curr];
                for e in &node.pred_edges {
                    let Some(pid) = ss.table.id(&e.key) else {
                        continue;
                    };
                    let p_g = ss.table[pid].g;
                    let val = p_g.saturating_add(&e.cost);
                    if min_rhs > val {
                        min_rhs = val;
                        min_g = p_g;
                        choice = Some((pid, e.action));
                    } else if e.cost.valid() && min_rhs == val && min_g < p_g {
                        min_g = p_g;
                        choice = Some((pid, e.action));
                    }
                }
            }

            match choice {
                Some((pid, action)) => {
                    curr = pid;
                    prs.push(self.env.forward_action(&ss.table[pid].coord, action));
                }
                None => {
                    // No finite-cost chain reaches further back; hand out the
                    // prefix recovered so far.
                    debug!(
                        preds = ss.table[curr].pred_edges.len(),
                        "trace back failed to reach the start"
                    );
                    break;
                }
            }

            if ss.table[curr].key == *start_key {
                ss.best_child.push(curr);
                break;
            }
        }

        prs.reverse();
        ss.best_child.reverse();
        Trajectory::new(prs)
    }
}
