//! Mergeable and positional priority queues, layered over the forests in
//! [`crate::forest`]: plain leftist and lazy heaps on `BinaryForest`, a Fibonacci grove on
//! `Forest`, a `d`-ary array heap, and the two-level ordered/partitioned heap pair built on
//! `BalancedForest`.

pub mod array_heap;
pub mod fib_heap;
pub mod lazy_heap;
pub mod leftist_heap;
pub mod ordered_heap;
pub mod partitioned_heap;

pub use array_heap::ArrayHeap;
pub use fib_heap::FibHeaps;
pub use lazy_heap::LazyHeaps;
pub use leftist_heap::LeftistHeaps;
pub use ordered_heap::OrderedHeaps;
pub use partitioned_heap::PartitionedHeap;
