// Heap index arithmetic implemented externally.
//
// A heap is a tree-like structure where every subtree's root has a better
// score than all the other nodes in the subtree, flattened into an array
// that's traversed in a non-linear way. These are the indices we assign to
// each node:
//
// ```text
//                           0
//              1                         2
//       3            4            5             6
//   7      8      9     10    11     12     13     14
// 15 16  17 18  19 20  21 22 23 24  25
// ```
//
// The last level will often be incomplete.
//
// You can go up and down from any index with,
//   - Up:          `(i-1)/2`
//   - Left child:  `(2*i) + 1`
//   - Right child: `(2*i) + 2`, the slot right after its sibling

/// The parent node
///
/// ```
/// use kinosearch::heap_primitives::index_parent;
/// assert_eq!(index_parent(1), 0);
/// assert_eq!(index_parent(2), 0);
/// assert_eq!(index_parent(3), 1);
/// assert_eq!(index_parent(4), 1);
/// assert_eq!(index_parent(5), 2);
/// assert_eq!(index_parent(6), 2);
/// assert_eq!(index_parent(25), 12);
/// ```
#[inline(always)]
#[must_use]
pub fn index_parent(i: usize) -> usize {
    (i - 1) / 2
}

/// The left child
///
/// ```
/// use kinosearch::heap_primitives::index_left_child;
/// assert_eq!(index_left_child(0), 1);
/// assert_eq!(index_left_child(1), 3);
/// assert_eq!(index_left_child(3), 7);
/// assert_eq!(index_left_child(11), 23);
/// ```
#[inline(always)]
#[must_use]
pub fn index_left_child(i: usize) -> usize {
    (2 * i) + 1
}
