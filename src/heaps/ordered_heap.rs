/*! Ordered heaps: a [`BalancedForest`] that is simultaneously a min-heap and a list

# About
Each tree of an `OrderedHeaps` instance doubles as (a) a min-heap ordered by `key` and (b)
a client-visible ordered list by infix position. Every node caches `min_key[u]`, the
minimum `key` over its own subtree; every tree root carries an additive `offset` so that
bulk "add delta to every key in this tree" is O(1) (`add2keys`) instead of O(size).

As with [`DualKeySets`](crate::forest::key_sets::DualKeySets), the cache is kept current
by a `refresh` walk up to the root rather than by hooking every individual rotation inside
`BalancedForest` (which has no knowledge of `key`/`min_key` and exposes no rotation
callback). Any single rotation only ever changes the children of the two nodes it swaps
positions, and — since a rotation keeps the rotated nodes on one vertical chain — climbing
from a node below the rotation site up to the root via live parent pointers visits both of
them. `insertAfter` and `changekey` only ever trigger `rerank_up`'s single-chain rotations,
so walking up from the touched node is exactly enough; `delete`'s `rerank_down` can trigger
a rotation rooted one level below the deleted node's old parent, so it starts the walk from
`BalancedForest::delete_anchor` instead. `divide` delegates to `BalancedForest::split`,
whose ancestor-chain rejoins touch both resulting trees broadly enough that tracking a
single anchor isn't worth it, so it falls back to a full post-order rescan of each half.
*/

use crate::forest::balanced_forest::BalancedForest;
use crate::top::Index;

#[derive(Debug, Clone)]
pub struct OrderedHeaps {
    bf: BalancedForest,
    key: Vec<f64>,
    min_key: Vec<f64>,
    offset: Vec<f64>,
}

impl OrderedHeaps {
    pub fn new(n: usize) -> Self {
        OrderedHeaps {
            bf: BalancedForest::new(n),
            key: vec![0.0; n + 1],
            min_key: vec![f64::INFINITY; n + 1],
            offset: vec![0.0; n + 1],
        }
    }

    pub fn n(&self) -> usize {
        self.bf.n()
    }

    pub fn find(&self, u: Index) -> Index {
        self.bf.find(u)
    }

    pub fn left(&self, u: Index) -> Index {
        self.bf.left(u)
    }
    pub fn right(&self, u: Index) -> Index {
        self.bf.right(u)
    }

    /// Leftmost node of `t`'s infix order.
    pub fn first(&self, t: Index) -> Index {
        self.bf.first(t)
    }
    /// Infix successor of `u` within `t` (`0` once `t` is exhausted).
    pub fn next(&self, u: Index, t: Index) -> Index {
        self.bf.next(u, t)
    }

    fn offset_of(&self, h: Index) -> f64 {
        if h == 0 {
            0.0
        } else {
            self.offset[h]
        }
    }

    /// The observable key of `u` within the tree rooted at `h`: the raw stored key plus
    /// that tree's offset.
    pub fn key(&self, u: Index, h: Index) -> f64 {
        self.key[u] + self.offset_of(h)
    }

    fn refresh_one(&mut self, u: Index) {
        if u == 0 {
            return;
        }
        let l = self.bf.left(u);
        let r = self.bf.right(u);
        let mut best = self.key[u];
        if l != 0 {
            best = best.min(self.min_key[l]);
        }
        if r != 0 {
            best = best.min(self.min_key[r]);
        }
        self.min_key[u] = best;
    }

    /// Walks `u` up to the root of its tree, recomputing `min_key` at each ancestor.
    fn refresh(&mut self, mut u: Index) {
        while u != 0 {
            self.refresh_one(u);
            if self.bf.isroot(u) {
                break;
            }
            u = self.bf.parent(u);
        }
    }

    /// Recomputes `min_key` for every node of the tree `t` from the bottom up. Used only
    /// where a single touched-node-to-root walk isn't guaranteed to cover every node whose
    /// subtree changed (`delete`'s root-with-two-children case, `divide`).
    fn refresh_subtree_full(&mut self, t: Index) {
        if t == 0 {
            return;
        }
        let mut stack = vec![t];
        let mut order = Vec::new();
        while let Some(x) = stack.pop() {
            order.push(x);
            let l = self.bf.left(x);
            let r = self.bf.right(x);
            if l != 0 {
                stack.push(l);
            }
            if r != 0 {
                stack.push(r);
            }
        }
        for &x in order.iter().rev() {
            self.refresh_one(x);
        }
    }

    /// Descends from `h` choosing the child whose cached minimum matches the current
    /// node's, stopping once `u`'s own key realizes its subtree's minimum.
    pub fn findmin(&self, h: Index) -> Index {
        if h == 0 {
            return 0;
        }
        let mut u = h;
        loop {
            if self.key[u] == self.min_key[u] {
                return u;
            }
            let l = self.bf.left(u);
            if l != 0 && self.min_key[l] == self.min_key[u] {
                u = l;
                continue;
            }
            u = self.bf.right(u);
        }
    }

    /// Shifts every observable key in tree `h` by `delta` in O(1).
    pub fn add2keys(&mut self, delta: f64, h: Index) {
        if h != 0 {
            self.offset[h] += delta;
        }
    }

    /// Sets `u`'s observable key (within tree `h`) to `k`, then restores the `min_key`
    /// invariant from `u` up to the root.
    pub fn changekey(&mut self, u: Index, k: f64, h: Index) {
        self.key[u] = k - self.offset_of(h);
        self.refresh(u);
    }

    /// Inserts fresh singleton `u` immediately after `j` in the infix order of tree `h`
    /// (at the very front if `j == 0`), with observable key `k`. Returns the new root.
    pub fn insert_after(&mut self, u: Index, j: Index, k: f64, h: Index) -> Index {
        let old_offset = self.offset_of(h);
        self.key[u] = k - old_offset;
        self.min_key[u] = self.key[u];
        let root = self.bf.insert_after(u, j, h);
        self.refresh(u);
        if root != 0 {
            self.offset[root] = old_offset;
        }
        root
    }

    /// Removes `u` from the tree rooted at `h`, returning the new root.
    pub fn delete(&mut self, u: Index, h: Index) -> Index {
        let old_offset = self.offset_of(h);
        let anchor = self.bf.delete_anchor(u);
        let root = self.bf.delete(u, h);
        self.key[u] += old_offset;
        self.min_key[u] = self.key[u];
        self.offset[u] = 0.0;
        if anchor != 0 {
            self.refresh(anchor);
        }
        if root != 0 {
            self.offset[root] = old_offset;
        }
        root
    }

    /// Splits tree `h` at `u`, returning `(h1, h2)`: `h1` holds everything strictly before
    /// `u` in infix order, `h2` starts with `u` followed by everything after it.
    pub fn divide(&mut self, u: Index, h: Index) -> (Index, Index) {
        let old_offset = self.offset_of(h);
        let (before, after) = self.bf.split(u);
        // u keeps its raw key: it stays in a tree (h2) that inherits the same offset, so
        // unlike `delete` there's no need to fold the offset into it
        self.min_key[u] = self.key[u];
        let h2 = self.bf.insert_after(u, 0, after);
        self.refresh_subtree_full(before);
        self.refresh_subtree_full(h2);
        if before != 0 {
            self.offset[before] = old_offset;
        }
        if h2 != 0 {
            self.offset[h2] = old_offset;
        }
        (before, h2)
    }

    pub fn clear(&mut self) {
        self.bf.clear();
        self.key.iter_mut().for_each(|k| *k = 0.0);
        self.min_key.iter_mut().for_each(|k| *k = f64::INFINITY);
        self.offset.iter_mut().for_each(|o| *o = 0.0);
    }

    pub fn expand(&mut self, n_prime: usize) {
        self.bf.expand(n_prime);
        let cap = self.bf.capacity() + 1;
        self.key.resize(cap, 0.0);
        self.min_key.resize(cap, f64::INFINITY);
        self.offset.resize(cap, 0.0);
    }

    /// Checks the rank invariant and that `min_key[u]` matches the actual subtree minimum
    /// of the raw (unoffset) key — offsets are per-tree constants so they don't affect
    /// whether the cache is internally consistent.
    pub fn verify(&self) -> String {
        let base = self.bf.verify();
        if !base.is_empty() {
            return base;
        }
        for u in 1..=self.n() {
            let l = self.bf.left(u);
            let r = self.bf.right(u);
            let mut expect = self.key[u];
            if l != 0 {
                expect = expect.min(self.min_key[l]);
            }
            if r != 0 {
                expect = expect.min(self.min_key[r]);
            }
            if (expect - self.min_key[u]).abs() > f64::EPSILON {
                return format!("node {u}: min_key cache stale");
            }
        }
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(h: &mut OrderedHeaps, items: &[(Index, f64)]) -> Index {
        let mut root = 0;
        let mut prev = 0;
        for &(u, k) in items {
            root = h.insert_after(u, prev, k, root);
            prev = u;
        }
        root
    }

    #[test]
    fn findmin_tracks_subtree_minimum() {
        let mut h = OrderedHeaps::new(6);
        let root = build(&mut h, &[(1, 3.0), (2, 1.0), (3, 4.0), (4, 1.0), (5, 5.0), (6, 9.0)]);
        assert_eq!(h.verify(), "");
        let m = h.findmin(root);
        assert!(h.key(m, root) == 1.0);
    }

    #[test]
    fn divide_scenario() {
        // mirrors the concrete scenario in SPEC_FULL.md §8
        let mut h = OrderedHeaps::new(6);
        let root = build(&mut h, &[(1, 3.0), (2, 1.0), (3, 4.0), (4, 1.0), (5, 5.0), (6, 9.0)]);
        assert_eq!(h.verify(), "");
        let (h1, h2) = h.divide(3, root);
        assert_eq!(h.verify(), "");
        // h1 lists a, b (items 1, 2); h2 starts with c (item 3)
        assert!(h1 != 0);
        assert_eq!(h.findmin(h1), 2);
        assert_eq!(h.findmin(h2), 4);
        h.add2keys(10.0, h2);
        assert_eq!(h.findmin(h2), 4);
        assert_eq!(h.key(4, h2), 11.0);
    }

    #[test]
    fn changekey_then_delete() {
        let mut h = OrderedHeaps::new(4);
        let root = build(&mut h, &[(1, 5.0), (2, 2.0), (3, 8.0), (4, 1.0)]);
        assert_eq!(h.findmin(root), 4);
        h.changekey(1, 0.0, root);
        assert_eq!(h.findmin(root), 1);
        assert_eq!(h.verify(), "");
        let root = h.delete(4, root);
        assert_eq!(h.verify(), "");
        assert_eq!(h.findmin(root), 1);
    }
}
