//! Handle-indexed forests: the plain binary-tree layer, the rank-balanced layer built on
//! top of it, the ordered-set ADTs built on that, and the n-ary sibling-list forest used
//! by the grove-based heap.

pub mod balanced_forest;
pub mod binary_forest;
pub mod key_sets;
pub mod sibling_forest;

pub use balanced_forest::BalancedForest;
pub use binary_forest::BinaryForest;
pub use key_sets::{DualKeySets, KeySets};
pub use sibling_forest::Forest;
