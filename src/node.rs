use nonmax::NonMaxU32;
use rustc_hash::FxHashMap;

use crate::cost::Cost;
use crate::data_structures::indexed_heap::Handle;
use crate::env::Action;
use crate::env::Coord;
use crate::env::Key;

/// Arena slot of a [`Node`] in the [`NodeTable`].
///
/// Ids are stable for the lifetime of the table (nodes are never removed),
/// but they are transient search-local references: persisted edges name their
/// endpoints by [`Key`], never by id.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NodeId(NonMaxU32);

impl NodeId {
    #[inline(always)]
    #[must_use]
    fn from_usize(i: usize) -> Self {
        debug_assert!(i < u32::MAX as usize);
        Self(NonMaxU32::new(i as u32).unwrap())
    }
    #[inline(always)]
    #[must_use]
    pub fn as_usize(&self) -> usize {
        self.0.get() as usize
    }
}

/// An incoming edge recorded on its target node.
#[derive(Copy, Clone, Debug)]
pub struct PredEdge<K, A, C>
where
    K: Key,
    A: Action,
    C: Cost,
{
    pub key: K,
    pub action: A,
    pub cost: C,
}

/// An outgoing edge cached on its source node after first expansion.
///
/// Carries the successor coordinate so incremental re-expansions skip the
/// environment entirely.
#[derive(Copy, Clone, Debug)]
pub struct SuccEdge<K, Crd, A, C>
where
    K: Key,
    Crd: Coord,
    A: Action,
    C: Cost,
{
    pub key: K,
    pub coord: Crd,
    pub action: A,
    pub cost: C,
}

/// Per-state search record.
///
/// `g` is the best known cost-to-come, `rhs` the one-step lookahead used by
/// the incremental mode (it stays at +∞ in plain A*). `h` is computed once at
/// creation and never changes; the inflation weight may change between
/// planning calls without invalidating it.
#[derive(Debug)]
pub struct Node<K, Crd, A, C>
where
    K: Key,
    Crd: Coord,
    A: Action,
    C: Cost,
{
    pub key: K,
    pub coord: Crd,
    pub g: C,
    pub rhs: C,
    pub h: C,
    /// Live queue entry, if currently queued.
    pub heap_handle: Option<Handle>,
    pub opened: bool,
    pub closed: bool,
    pub pred_edges: Vec<PredEdge<K, A, C>>,
    pub succ_edges: Vec<SuccEdge<K, Crd, A, C>>,
}

impl<K, Crd, A, C> Node<K, Crd, A, C>
where
    K: Key,
    Crd: Coord,
    A: Action,
    C: Cost,
{
    #[must_use]
    pub fn new(key: K, coord: Crd, h: C) -> Self {
        Self {
            key,
            coord,
            g: C::max_value(),
            rhs: C::max_value(),
            h,
            heap_handle: None,
            opened: false,
            closed: false,
            pred_edges: vec![],
            succ_edges: vec![],
        }
    }

    /// `g = rhs`. Inconsistent nodes are the incremental mode's work list.
    #[inline(always)]
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.g == self.rhs
    }
}

/// Monotone-growing map from [`Key`] to [`Node`].
///
/// An arena owns the nodes; a hash index finds them by key. Nodes are created
/// on first reference and never evicted, so ids handed out earlier stay valid
/// across planning calls until the whole table is discarded.
#[derive(Debug)]
pub struct NodeTable<K, Crd, A, C>
where
    K: Key,
    Crd: Coord,
    A: Action,
    C: Cost,
{
    nodes: Vec<Node<K, Crd, A, C>>,
    index: FxHashMap<K, NodeId>,
}

impl<K, Crd, A, C> NodeTable<K, Crd, A, C>
where
    K: Key,
    Crd: Coord,
    A: Action,
    C: Cost,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![],
            index: FxHashMap::default(),
        }
    }

    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline(always)]
    #[must_use]
    pub fn id(&self, key: &K) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    /// Finds the node for `key`, creating it on first reference.
    ///
    /// `h` runs only on creation; the heuristic is fixed for the node's
    /// lifetime.
    pub fn get_or_create(&mut self, key: K, coord: Crd, h: impl FnOnce() -> C) -> NodeId {
        if let Some(id) = self.index.get(&key) {
            debug_assert!(self.nodes[id.as_usize()].key == key);
            return *id;
        }

        let id = NodeId::from_usize(self.nodes.len());
        self.nodes.push(Node::new(key, coord, h()));
        self.index.insert(key, id);
        id
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node<K, Crd, A, C>> + '_ {
        self.nodes.iter()
    }
}

impl<K, Crd, A, C> Default for NodeTable<K, Crd, A, C>
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

impl<K, Crd, A, C> std::ops::Index<NodeId> for NodeTable<K, Crd, A, C>
where
    K: Key,
    Crd: Coord,
    A: Action,
    C: Cost,
{
    type Output = Node<K, Crd, A, C>;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.as_usize()]
    }
}

impl<K, Crd, A, C> std::ops::IndexMut<NodeId> for NodeTable<K, Crd, A, C>
where
    K: Key,
    Crd: Coord,
    A: Action,
    C: Cost,
{
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        &mut self.nodes[id.as_usize()]
    }
}
