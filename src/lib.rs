/*! # About
A library of handle-indexed forests and the mergeable/positional heaps built on top of them.
Every structure here shares one representation discipline: nodes are addressed by a plain
`usize` handle in `1..=n` (see [`top::Index`]), `0` is the universal null sentinel, and the
structure itself is a set of parallel `Vec`s rather than a pointer graph. Higher layers are
built by embedding lower ones and calling back into their public structural operations —
there's no inheritance to reach for, so a `BalancedForest` owns a `BinaryForest`, an
`OrderedHeaps` owns a `BalancedForest`, and so on.

# Forests
- [`forest::BinaryForest`]: an unbalanced forest of binary trees with infix-order `first`/
  `next`, `insert_after`, `delete`, `split`, and `join`. The base layer everything else in
  this module builds on.
- [`forest::BalancedForest`]: the same binary-tree ADT, kept at logarithmic height by
  rank-balanced (weak-AVL) rebalancing on insertion (`rerank_up`) and deletion
  (`rerank_down`).
- [`forest::KeySets`] / [`forest::DualKeySets`]: ordered sets over `BalancedForest`, keyed by
  one or two totally-ordered keys respectively, with `find`, `insert`, `delete`, and range
  queries.
- [`forest::Forest`]: an unbalanced n-ary forest using a sibling-list representation
  (`firstChild`/`nextSibling`), used as the grove structure under [`heaps::FibHeaps`].

# Heaps
- [`heaps::LeftistHeaps`]: classic leftist heaps over `BinaryForest`, merge-based.
- [`heaps::LazyHeaps`]: leftist heaps with lazy deletion via a free list.
- [`heaps::FibHeaps`]: a Fibonacci-heap grove over [`forest::Forest`], amortized O(1)
  `insert`/`meld`, amortized O(log n) `deletemin`.
- [`heaps::ArrayHeap`]: a plain d-ary array heap, used internally by
  [`heaps::PartitionedHeap`] to track active-group minimums.
- [`heaps::OrderedHeaps`]: a [`forest::BalancedForest`] that is simultaneously a min-heap and
  a positional list, with O(1) bulk `add2keys` via a per-tree offset.
- [`heaps::PartitionedHeap`]: a two-level heap of named `OrderedHeaps` groups, with O(1) bulk
  `add2keys` across every active group via a deferred per-group offset.

# Conventions
Every structure panics on a malformed handle or other precondition violation (the caller
broke the contract), returns a `bool` from `from_string` (malformed input, not a caller
bug — the structure is left empty on failure), and exposes a `verify() -> String` that
walks its own invariants and returns a description of the first violation found, or an
empty string if none (see the individual `verify` methods for what each one checks).
*/

pub mod forest;
pub mod heaps;
pub mod top;

pub use top::{Index, Top, NULL};
