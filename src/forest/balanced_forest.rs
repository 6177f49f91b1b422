/*! A rank-balanced (weak-AVL) layer over [`BinaryForest`]

# About
`BalancedForest` embeds a plain [`BinaryForest`] and adds a `rank` array, keeping every
tree within `O(log n)` height by rebalancing on insertion (`rerank_up`) and deletion
(`rerank_down`). Rust has no subclassing, so rather than generalizing `BinaryForest`
with virtual hooks, this type owns one by value and calls back into its public
structural primitives (`rotate`, `rotate2`, `cut`, `join`, `split`, ...), layering its own
rank bookkeeping on top. A handful of short walks (`join`, `split`) are re-implemented
here against the embedded forest's fields rather than factored into a shared generic,
because the rank-aware and plain versions diverge just enough that a cross-type
abstraction would cost more than it saves.

The rank of the null handle is defined as `-1` throughout (one below any real leaf's
starting rank of `0`), matching the usual convention for rank-balanced trees.
*/

use crate::forest::binary_forest::{BinaryForest, Side};
use crate::top::Index;
use std::cmp::Ordering;

/// A forest of rank-balanced binary search trees.
#[derive(Debug, Clone)]
pub struct BalancedForest {
    bf: BinaryForest,
    rank: Vec<i32>,
}

impl BalancedForest {
    pub fn new(n: usize) -> Self {
        BalancedForest {
            bf: BinaryForest::new(n),
            rank: vec![0; n + 1],
        }
    }

    pub fn n(&self) -> usize {
        self.bf.n()
    }

    pub fn capacity(&self) -> usize {
        self.bf.capacity()
    }

    /// The rank of `u`, or `-1` for the null handle.
    pub fn rank(&self, u: Index) -> i32 {
        if u == 0 {
            -1
        } else {
            self.rank[u]
        }
    }

    // --- delegated accessors ------------------------------------------------

    pub fn left(&self, u: Index) -> Index {
        self.bf.left(u)
    }
    pub fn right(&self, u: Index) -> Index {
        self.bf.right(u)
    }
    pub fn parent(&self, u: Index) -> Index {
        self.bf.parent(u)
    }
    pub fn isroot(&self, u: Index) -> bool {
        self.bf.isroot(u)
    }
    pub fn singleton(&self, u: Index) -> bool {
        self.bf.singleton(u)
    }
    pub fn sibling(&self, u: Index) -> Index {
        self.bf.sibling(u)
    }
    pub fn find(&self, u: Index) -> Index {
        self.bf.find(u)
    }
    pub fn first(&self, u: Index) -> Index {
        self.bf.first(u)
    }
    pub fn last(&self, u: Index) -> Index {
        self.bf.last(u)
    }
    pub fn next(&self, u: Index, root: Index) -> Index {
        self.bf.next(u, root)
    }
    pub fn prev(&self, u: Index, root: Index) -> Index {
        self.bf.prev(u, root)
    }
    pub fn search<F: Fn(Index) -> Ordering>(&self, t: Index, cmp: F) -> Index {
        self.bf.search(t, cmp)
    }
    pub fn property(&self, u: Index) -> usize {
        self.bf.property(u)
    }
    pub fn set_property(&mut self, u: Index, p: usize) {
        self.bf.set_property(u, p)
    }

    /// The underlying [`BinaryForest`], for callers (e.g. `OrderedHeaps`) that need the
    /// plain structural primitives directly alongside the rank layer.
    pub fn binary_forest(&self) -> &BinaryForest {
        &self.bf
    }
    pub fn binary_forest_mut(&mut self) -> &mut BinaryForest {
        &mut self.bf
    }

    // --- rank-aware operations -----------------------------------------------

    /// Standard BST insertion (delegated to the embedded forest), followed by
    /// `rerank_up` to restore the rank invariant.
    pub fn insert_by_key<F: Fn(Index, Index) -> Ordering>(
        &mut self,
        u: Index,
        t: Index,
        cmp: F,
    ) -> Index {
        self.rank[u] = 0;
        let root = self.bf.insert_by_key(u, t, cmp);
        if self.bf.parent(u) != 0 {
            self.rerank_up(u);
        }
        self.bf.find(root)
    }

    /// Positional insertion (delegated to the embedded forest), followed by `rerank_up`.
    /// Used by callers that address by infix position rather than by key (e.g. inserting
    /// a fresh element immediately after a known one).
    pub fn insert_after(&mut self, u: Index, v: Index, t: Index) -> Index {
        self.rank[u] = 0;
        let root = self.bf.insert_after(u, v, t);
        if self.bf.parent(u) != 0 {
            self.rerank_up(u);
        }
        self.bf.find(root)
    }

    /// The node anchoring `delete(u)`'s rerank walk: `u`'s parent in the common case, or
    /// `prev(u)` itself when it's `u`'s own direct left child with no right subtree of its
    /// own. `BinaryForest::delete` swaps `u` with `prev(u)` first when `u` has two
    /// children; in that adjacent case (`swap_adjacent`) `prev(u)` is promoted straight
    /// into `u`'s old slot rather than `u`'s old parent taking `prev(u)`'s place, so the
    /// real post-delete splice site is `prev(u)` itself, not `prev(u)`'s pre-swap parent
    /// (which would be `u` — a handle no longer meaningfully "there" after the splice).
    /// `0` if deleting `u` touches no other node's rank. Exposed so client layers that
    /// cache their own per-node data (e.g. `OrderedHeaps`) can find where to restart their
    /// own bottom-up recomputation after a `delete`.
    pub fn delete_anchor(&self, u: Index) -> Index {
        let two_children = self.bf.left(u) != 0 && self.bf.right(u) != 0;
        let spliced = if two_children { self.bf.prev(u, 0) } else { u };
        if two_children && self.bf.parent(spliced) == u {
            spliced
        } else {
            self.bf.parent(spliced)
        }
    }

    /// Removes `u`, then `rerank_down`s from the child that replaced it.
    pub fn delete(&mut self, u: Index, t: Index) -> Index {
        let two_children = self.bf.left(u) != 0 && self.bf.right(u) != 0;
        let spliced = if two_children { self.bf.prev(u, 0) } else { u };
        let adjacent = two_children && self.bf.parent(spliced) == u;
        let px = self.delete_anchor(u);
        let side = if adjacent {
            Side::Left
        } else if px != 0 {
            self.bf.side_of(spliced)
        } else {
            Side::Left
        };
        let root_after = self.bf.delete(u, t);
        self.rank[u] = 0;
        if px != 0 {
            let x = self.bf.child(px, side);
            self.rerank_down(x, px);
            self.bf.find(px)
        } else {
            root_after
        }
    }

    /// `rank`-aware join: `t1`/`t2` are tree roots (possibly `0`), `u` a singleton.
    /// Equal-rank subtrees join directly under `u`; otherwise `u` is spliced into the
    /// spine of the taller tree at the first node matching the shorter tree's rank.
    pub fn join(&mut self, t1: Index, u: Index, t2: Index) -> Index {
        let r1 = self.rank(t1);
        let r2 = self.rank(t2);
        match r1.cmp(&r2) {
            Ordering::Equal => {
                let root = self.bf.join(t1, u, t2);
                self.rank[u] = r1 + 1;
                root
            }
            Ordering::Greater => {
                // walk the right spine of t1 to the first node with rank r2 (or the
                // bottom of the spine, whichever comes first)
                let mut v = t1;
                while v != 0 && self.rank(v) > r2 {
                    v = self.bf.right(v);
                }
                let pv = if v != 0 { self.bf.parent(v) } else { 0 };
                if v != 0 {
                    self.bf.cut(v);
                }
                self.bf.link(v, u, -1);
                self.bf.link(t2, u, 1);
                self.rank[u] = r2 + 1;
                if pv != 0 {
                    self.bf.link(u, pv, 1);
                }
                self.rerank_up(u);
                self.bf.find(t1)
            }
            Ordering::Less => {
                let mut v = t2;
                while v != 0 && self.rank(v) > r1 {
                    v = self.bf.left(v);
                }
                let pv = if v != 0 { self.bf.parent(v) } else { 0 };
                if v != 0 {
                    self.bf.cut(v);
                }
                self.bf.link(t1, u, -1);
                self.bf.link(v, u, 1);
                self.rank[u] = r1 + 1;
                if pv != 0 {
                    self.bf.link(u, pv, -1);
                }
                self.rerank_up(u);
                self.bf.find(t2)
            }
        }
    }

    /// `rank`-aware split: walks `u` up to the root the same way `BinaryForest::split`
    /// does, but folds ancestors with the rank-aware `join` above instead of a plain one.
    pub fn split(&mut self, u: Index) -> (Index, Index) {
        let mut chain: Vec<(Index, Side)> = Vec::new();
        let mut x = u;
        while !self.bf.isroot(x) {
            let p = self.bf.parent(x);
            let s = self.bf.side_of(x);
            chain.push((p, s));
            x = p;
        }

        let mut before = self.bf.left(u);
        let mut after = self.bf.right(u);
        if before != 0 {
            self.bf.cut(before);
        }
        if after != 0 {
            self.bf.cut(after);
        }
        self.bf.cut(u);
        self.rank[u] = 0;

        for (anc, s) in chain {
            let other = match s {
                Side::Left => self.bf.right(anc),
                Side::Right => self.bf.left(anc),
            };
            if other != 0 {
                self.bf.cut(other);
            }
            self.bf.cut(anc);
            self.rank[anc] = 0;
            match s {
                Side::Left => after = self.join(after, anc, other),
                Side::Right => before = self.join(other, anc, before),
            }
        }
        (before, after)
    }

    // --- rebalancing ----------------------------------------------------------

    /// Restores the rank invariant after inserting or splicing `x` in at rank `0`
    /// (`SPEC_FULL.md` §4.2). Promotes ancestors while both of a grandparent's children
    /// match `x`'s rank, then performs a terminal single or double rotation if needed.
    fn rerank_up(&mut self, mut x: Index) {
        loop {
            let gp = self.bf.grandparent(x);
            if gp == 0 {
                return;
            }
            let p = self.bf.parent(x);
            let aunt = self.bf.sibling(p);
            if self.rank(gp) == self.rank(x) && self.rank(aunt) == self.rank(x) {
                x = gp;
                self.rank[x] += 1;
                continue;
            }
            break;
        }
        let gp = self.bf.grandparent(x);
        if gp == 0 || self.rank(gp) != self.rank(x) {
            return;
        }
        let p = self.bf.parent(x);
        let outer = self.bf.is_outer_grandchild(x);
        self.bf.rotate2(x);
        if outer {
            self.rank[p] -= 1;
        } else {
            self.rank[p] -= 1;
            self.rank[gp] -= 1;
            self.rank[x] += 1;
        }
    }

    /// Restores the rank invariant after `x` (possibly `0`) replaces a deleted node
    /// under `px` (`SPEC_FULL.md` §4.2).
    fn rerank_down(&mut self, mut x: Index, mut px: Index) {
        if px == 0 {
            return;
        }
        let mut side = if self.bf.left(px) == x {
            Side::Left
        } else {
            Side::Right
        };
        loop {
            if px == 0 {
                return;
            }
            let rx = self.rank(x);
            if self.rank(px) != rx + 2 {
                return;
            }
            let s_side = side.opposite();
            let s = self.bf.child(px, s_side);
            let rs = self.rank(s);
            let nephew = if s == 0 { 0 } else { self.bf.child(s, s_side) };
            let niece = if s == 0 { 0 } else { self.bf.child(s, side) };

            if rs == rx + 2 {
                self.bf.rotate(s);
                self.rank[px] -= 1;
                self.rank[s] += 1;
                px = self.bf.parent(x);
                side = if self.bf.left(px) == x {
                    Side::Left
                } else {
                    Side::Right
                };
                continue;
            }
            if rs == rx + 1 && self.rank(nephew) == rx && self.rank(niece) == rx {
                self.rank[px] -= 1;
                x = px;
                px = self.bf.parent(x);
                if px == 0 {
                    return;
                }
                side = if self.bf.left(px) == x {
                    Side::Left
                } else {
                    Side::Right
                };
                continue;
            }
            if self.rank(nephew) == rx + 1 {
                self.bf.rotate(s);
                self.rank[s] += 1;
                self.rank[px] -= 1;
            } else {
                self.bf.rotate2(s);
                self.rank[s] += 2;
                self.rank[px] -= 2;
                self.rank[niece] += 1;
            }
            return;
        }
    }

    // --- lifecycle --------------------------------------------------------

    pub fn reset(&mut self, n_prime: usize) {
        self.bf.reset(n_prime);
        self.rank = vec![0; self.bf.capacity() + 1];
    }

    pub fn expand(&mut self, n_prime: usize) {
        self.bf.expand(n_prime);
        self.rank.resize(self.bf.capacity() + 1, 0);
    }

    pub fn clear(&mut self) {
        self.bf.clear();
        self.rank.iter_mut().for_each(|r| *r = 0);
    }

    pub fn assign(&mut self, other: &BalancedForest) {
        self.bf.assign(&other.bf);
        self.rank = other.rank.clone();
    }

    pub fn transfer(&mut self, other: &mut BalancedForest) {
        std::mem::swap(self, other);
        *other = BalancedForest::new(0);
    }

    /// Checks both the structural invariants of the embedded forest and the rank
    /// invariant of `SPEC_FULL.md` §8: every non-root's parent rank is its own rank or
    /// one more; every grandchild's rank is strictly less than its grandparent's.
    pub fn verify(&self) -> String {
        let structural = self.bf.verify();
        if !structural.is_empty() {
            return structural;
        }
        for u in 1..=self.n() {
            if !self.bf.isroot(u) {
                let p = self.bf.parent(u);
                let d = self.rank(p) - self.rank(u);
                if d != 0 && d != 1 {
                    return format!(
                        "node {u}: rank {} vs parent {} rank {} (gap {d})",
                        self.rank(u),
                        p,
                        self.rank(p)
                    );
                }
            }
            let gp = self.bf.grandparent(u);
            if gp != 0 && self.rank(gp) <= self.rank(u) {
                return format!(
                    "node {u}: rank {} not strictly less than grandparent {} rank {}",
                    self.rank(u),
                    gp,
                    self.rank(gp)
                );
            }
        }
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::top::label;

    #[test]
    fn singletons_start_rank_zero() {
        let f = BalancedForest::new(4);
        for i in 1..=4 {
            assert_eq!(f.rank(i), 0);
        }
        assert_eq!(f.verify(), "");
    }

    #[test]
    fn insert_by_key_preserves_order_and_rank_invariant() {
        let mut f = BalancedForest::new(10);
        let keys = [5, 2, 8, 1, 9, 3, 7, 4, 6, 10];
        let mut root = 0;
        for &k in &keys {
            root = f.insert_by_key(k, root, |a, b| {
                // compare by handle value itself (handle == key here)
                a.cmp(&b)
            });
        }
        assert_eq!(f.verify(), "");
        // in-order traversal must be ascending by handle/key
        let mut x = f.first(root);
        let mut order = Vec::new();
        while x != 0 {
            order.push(x);
            x = f.next(x, root);
        }
        let mut sorted = keys.to_vec();
        sorted.sort_unstable();
        assert_eq!(order, sorted);
        let _ = label(1, 10);
    }

    #[test]
    fn delete_preserves_rank_invariant() {
        let mut f = BalancedForest::new(7);
        let mut root = 0;
        for k in 1..=7 {
            root = f.insert_by_key(k, root, |a, b| a.cmp(&b));
        }
        root = f.delete(4, root);
        assert_eq!(f.verify(), "");
        let mut x = f.first(root);
        let mut order = Vec::new();
        while x != 0 {
            order.push(x);
            x = f.next(x, root);
        }
        assert_eq!(order, vec![1, 2, 3, 5, 6, 7]);
    }

    #[test]
    fn random_insert_delete_preserves_rank_invariant() {
        use rand::Rng;
        let n = 200;
        let mut rng = rand::rng();
        let mut f = BalancedForest::new(n);
        let mut root = 0;
        let mut present: Vec<Index> = Vec::new();
        let mut free: Vec<Index> = (1..=n).collect();
        for _ in 0..2000 {
            let insert = free.is_empty() || (!present.is_empty() && rng.random_bool(0.5));
            if insert && !free.is_empty() {
                let idx = rng.random_range(0..free.len());
                let u = free.remove(idx);
                root = f.insert_by_key(u, root, |a, b| a.cmp(&b));
                present.push(u);
            } else if !present.is_empty() {
                let idx = rng.random_range(0..present.len());
                let u = present.remove(idx);
                root = f.delete(u, root);
                free.push(u);
            }
            assert_eq!(f.verify(), "");
        }
    }
}
