/*! Ordered key sets over a [`BalancedForest`]

# About
`KeySets` layers a `key` array onto [`BalancedForest`] to provide a classic ordered-set
ADT: `insert`, `delete`, `lookup`, membership test. `DualKeySets` adds a secondary key
`key2` plus a per-subtree `min_key2` kept up to date by the same refresh hook every
rebalancing mutator already calls through, supporting `findmin` over a primary-key
bound.
*/

use crate::forest::balanced_forest::BalancedForest;
use crate::top::Index;
use std::cmp::Ordering;

/// A set of items ordered by a single `f64` key, backed by a rank-balanced tree.
#[derive(Debug, Clone)]
pub struct KeySets {
    bf: BalancedForest,
    key: Vec<f64>,
}

impl KeySets {
    pub fn new(n: usize) -> Self {
        KeySets {
            bf: BalancedForest::new(n),
            key: vec![0.0; n + 1],
        }
    }

    pub fn n(&self) -> usize {
        self.bf.n()
    }

    pub fn key(&self, u: Index) -> f64 {
        self.key[u]
    }

    pub fn find(&self, u: Index) -> Index {
        self.bf.find(u)
    }

    /// Inserts fresh singleton `u` with key `k` into the set rooted at `t`.
    pub fn insert(&mut self, u: Index, t: Index, k: f64) -> Index {
        self.key[u] = k;
        let ku = &self.key;
        self.bf.insert_by_key(u, t, |a, b| {
            ku[a].partial_cmp(&ku[b]).unwrap_or(Ordering::Equal)
        })
    }

    pub fn delete(&mut self, u: Index, t: Index) -> Index {
        self.bf.delete(u, t)
    }

    /// Returns the node with key `k` in the set rooted at `t`, or `0` if absent.
    pub fn lookup(&self, k: f64, t: Index) -> Index {
        let key = &self.key;
        self.bf.search(t, |x| {
            k.partial_cmp(&key[x]).unwrap_or(Ordering::Equal)
        })
    }

    pub fn contains(&self, k: f64, t: Index) -> bool {
        self.lookup(k, t) != 0
    }

    pub fn clear(&mut self) {
        self.bf.clear();
        self.key.iter_mut().for_each(|k| *k = 0.0);
    }

    pub fn expand(&mut self, n_prime: usize) {
        self.bf.expand(n_prime);
        self.key.resize(self.bf.capacity() + 1, 0.0);
    }

    pub fn verify(&self) -> String {
        let base = self.bf.verify();
        if !base.is_empty() {
            return base;
        }
        for u in 1..=self.n() {
            let l = self.bf.left(u);
            let r = self.bf.right(u);
            if l != 0 && self.key[l] > self.key[u] {
                return format!("node {u}: left child {l} has greater key");
            }
            if r != 0 && self.key[r] < self.key[u] {
                return format!("node {u}: right child {r} has smaller key");
            }
        }
        String::new()
    }
}

/// A `KeySets` with a secondary key `key2` and a subtree-min-of-`key2` cache, supporting
/// bounded-minimum queries: the item of smallest `key2` among those with primary key at
/// most a given bound.
#[derive(Debug, Clone)]
pub struct DualKeySets {
    bf: BalancedForest,
    key: Vec<f64>,
    key2: Vec<f64>,
    min_key2: Vec<f64>,
}

impl DualKeySets {
    pub fn new(n: usize) -> Self {
        DualKeySets {
            bf: BalancedForest::new(n),
            key: vec![0.0; n + 1],
            key2: vec![0.0; n + 1],
            min_key2: vec![f64::INFINITY; n + 1],
        }
    }

    pub fn n(&self) -> usize {
        self.bf.n()
    }

    pub fn key(&self, u: Index) -> f64 {
        self.key[u]
    }
    pub fn key2(&self, u: Index) -> f64 {
        self.key2[u]
    }

    /// Recomputes `min_key2[u]` from `u`'s own `key2` and its children's `min_key2`. A
    /// plain scalar minimum: which node realizes it is decided separately by
    /// `findmin_in`/`best_within`, so there's no tie-break to track here.
    fn refresh_one(&mut self, u: Index) {
        if u == 0 {
            return;
        }
        let l = self.bf.left(u);
        let r = self.bf.right(u);
        let mut best = self.key2[u];
        if l != 0 {
            best = best.min(self.min_key2[l]);
        }
        if r != 0 {
            best = best.min(self.min_key2[r]);
        }
        self.min_key2[u] = best;
    }

    /// Walks `u` up to the root recomputing `min_key2` along the way; the refresh hook
    /// every structural mutator below calls at the point it touched.
    fn refresh(&mut self, mut u: Index) {
        while u != 0 {
            self.refresh_one(u);
            if self.bf.isroot(u) {
                break;
            }
            u = self.bf.parent(u);
        }
    }

    pub fn insert(&mut self, u: Index, t: Index, k: f64, k2: f64) -> Index {
        self.key[u] = k;
        self.key2[u] = k2;
        self.min_key2[u] = k2;
        let ku = &self.key;
        let root = self.bf.insert_by_key(u, t, |a, b| {
            ku[a].partial_cmp(&ku[b]).unwrap_or(Ordering::Equal)
        });
        self.refresh(u);
        root
    }

    pub fn delete(&mut self, u: Index, t: Index) -> Index {
        let anchor = self.bf.delete_anchor(u);
        let root = self.bf.delete(u, t);
        self.key2[u] = 0.0;
        self.min_key2[u] = f64::INFINITY;
        if anchor != 0 {
            self.refresh(self.bf.find(anchor));
        }
        root
    }

    /// The item of smallest `key2` among nodes in `t` whose primary key is `<= bound`.
    /// Descends guided by `min_key2`, restricting to the `key <= bound` side at each step.
    pub fn findmin(&self, t: Index, bound: f64) -> Index {
        self.findmin_in(t, bound)
    }

    fn findmin_in(&self, u: Index, bound: f64) -> Index {
        if u == 0 || self.key[u] > bound {
            // everything at and right of u exceeds the bound if u's own key does;
            // only the left subtree can still qualify
            if u == 0 {
                return 0;
            }
            return self.findmin_in(self.bf.left(u), bound);
        }
        // u itself qualifies; so does all of its left subtree. Its right subtree only
        // partially qualifies, so recurse there explicitly instead of trusting its
        // cached min_key2 wholesale. This tree is ordered by primary key, so infix order
        // runs left subtree, then u, then right subtree: ties are broken in favor of
        // whichever side was visited first, not by comparing handle numbers (a node's
        // handle says nothing about its position in the tree).
        let mut best = u;
        let l = self.bf.left(u);
        if l != 0 {
            // the left subtree is entirely infix-before u, so a tie goes to it
            let cand = self.best_within(l);
            if self.key2[cand] <= self.key2[best] {
                best = cand;
            }
        }
        let r = self.bf.right(u);
        if r != 0 {
            // the right subtree is entirely infix-after whatever's already in best, so
            // it only wins outright, never on a tie
            let cand = self.findmin_in(r, bound);
            if cand != 0 && self.key2[cand] < self.key2[best] {
                best = cand;
            }
        }
        best
    }

    /// The node of smallest `key2` within the whole subtree at `u` (no bound), found by
    /// following the cached `min_key2` down from the root of the subtree. Checks the left
    /// subtree before `x` itself and `x` before the right subtree at each step, so a tie
    /// resolves to the infix-earliest node rather than whichever is found first.
    fn best_within(&self, u: Index) -> Index {
        let target = self.min_key2[u];
        let mut x = u;
        loop {
            let l = self.bf.left(x);
            if l != 0 && self.min_key2[l] == target {
                x = l;
                continue;
            }
            if self.key2[x] == target {
                return x;
            }
            let r = self.bf.right(x);
            if r != 0 && self.min_key2[r] == target {
                x = r;
                continue;
            }
            return x;
        }
    }

    pub fn expand(&mut self, n_prime: usize) {
        self.bf.expand(n_prime);
        let cap = self.bf.capacity() + 1;
        self.key.resize(cap, 0.0);
        self.key2.resize(cap, 0.0);
        self.min_key2.resize(cap, f64::INFINITY);
    }

    pub fn clear(&mut self) {
        self.bf.clear();
        self.key.iter_mut().for_each(|k| *k = 0.0);
        self.key2.iter_mut().for_each(|k| *k = 0.0);
        self.min_key2.iter_mut().for_each(|k| *k = f64::INFINITY);
    }

    pub fn verify(&self) -> String {
        let base = self.bf.verify();
        if !base.is_empty() {
            return base;
        }
        for u in 1..=self.n() {
            let l = self.bf.left(u);
            let r = self.bf.right(u);
            let mut expect = self.key2[u];
            if l != 0 {
                expect = expect.min(self.min_key2[l]);
            }
            if r != 0 {
                expect = expect.min(self.min_key2[r]);
            }
            if (expect - self.min_key2[u]).abs() > f64::EPSILON {
                return format!("node {u}: min_key2 cache stale");
            }
        }
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_lookup() {
        let mut ks = KeySets::new(5);
        let mut root = 0;
        root = ks.insert(1, root, 5.0);
        root = ks.insert(2, root, 2.0);
        root = ks.insert(3, root, 8.0);
        assert_eq!(ks.verify(), "");
        assert_eq!(ks.lookup(2.0, root), 2);
        assert_eq!(ks.lookup(99.0, root), 0);
    }

    #[test]
    fn dual_key_findmin_respects_bound() {
        let mut dk = DualKeySets::new(4);
        let mut root = 0;
        root = dk.insert(1, root, 1.0, 40.0);
        root = dk.insert(2, root, 2.0, 10.0);
        root = dk.insert(3, root, 3.0, 30.0);
        root = dk.insert(4, root, 4.0, 20.0);
        assert_eq!(dk.verify(), "");
        // bound 2.5 restricts to items 1, 2 -> smallest key2 is item 2 (10.0)
        assert_eq!(dk.findmin(root, 2.5), 2);
        // no bound restriction: smallest key2 overall is item 2 (10.0)
        assert_eq!(dk.findmin(root, 10.0), 2);
    }

    #[test]
    fn dual_key_tie_break_favors_infix_order_not_handle_value() {
        let mut dk = DualKeySets::new(4);
        let mut root = 0;
        // handle 3 has the smaller primary key, so it lands left-of (infix-before)
        // handle 1, even though its handle number is larger
        root = dk.insert(3, root, 1.0, 5.0);
        root = dk.insert(1, root, 2.0, 5.0);
        assert_eq!(dk.verify(), "");
        assert_eq!(dk.findmin(root, 10.0), 3);
    }
}
