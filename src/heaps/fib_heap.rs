/*! Fibonacci heaps as a grove of min-rooted trees over [`Forest`]

# About
A `FibHeaps` heap is a *grove*: a circular sibling list of min-heap-ordered trees whose
first sibling holds the heap-wide minimum. The sibling-list plumbing — linking a tree
under another, cutting a subtree out, walking siblings — is delegated entirely to
[`Forest`] rather than re-implemented here; this module owns only `key`/`mark` and the
heap algorithms (`meld`, `changekey`'s cascading cut, `deletemin`'s rank-indexed
consolidation).
*/

use crate::forest::sibling_forest::Forest;
use crate::top::Index;

#[derive(Debug, Clone)]
pub struct FibHeaps {
    f: Forest,
    key: Vec<f64>,
    mark: Vec<bool>,
}

impl FibHeaps {
    pub fn new(n: usize) -> Self {
        FibHeaps {
            f: Forest::new(n),
            key: vec![0.0; n + 1],
            mark: vec![false; n + 1],
        }
    }

    pub fn n(&self) -> usize {
        self.f.n()
    }

    pub fn key(&self, u: Index) -> f64 {
        self.key[u]
    }

    pub fn is_marked(&self, u: Index) -> bool {
        self.mark[u]
    }

    pub fn findmin(&self, h: Index) -> Index {
        h
    }

    /// Concatenates two groves and rotates so the smaller-keyed first sibling leads.
    pub fn meld(&mut self, h1: Index, h2: Index) -> Index {
        if h1 == 0 {
            return h2;
        }
        if h2 == 0 {
            return h1;
        }
        self.f.combine_groves(h1, h2);
        if self.key[h1] <= self.key[h2] {
            h1
        } else {
            h2
        }
    }

    /// Precondition: `u` is a fresh singleton.
    pub fn insert(&mut self, u: Index, h: Index, k: f64) -> Index {
        self.key[u] = k;
        self.mark[u] = false;
        self.f.set_rank(u, 0);
        self.meld(u, h)
    }

    /// Decreases (or, if `k > key(u)`, effectively increases via delete+insert) `u`'s
    /// key within grove `h`, returning the resulting grove head.
    pub fn changekey(&mut self, u: Index, h: Index, k: f64) -> Index {
        if k > self.key[u] {
            let (_, after_delete) = self.deletemin_specific(u, h);
            return self.insert(u, after_delete, k);
        }
        self.key[u] = k;
        if self.f.is_root(u) {
            return self.rotate_min_first(u);
        }
        if self.key[u] < self.key[self.f.parent(u)] {
            self.cut_and_cascade(u, h)
        } else {
            h
        }
    }

    /// Detaches `u` from its parent, reducing the parent's rank, clears `u`'s mark, and
    /// melds `u`'s subtree back into the grove. Then walks up performing a cascading
    /// cut: any already-marked ancestor is cut in turn; the first unmarked non-root
    /// ancestor encountered gets marked and the cascade stops.
    fn cut_and_cascade(&mut self, u: Index, h: Index) -> Index {
        let mut x = u;
        let mut grove = h;
        loop {
            let p = self.f.parent(x);
            if p == 0 {
                break;
            }
            self.f.cut(x);
            self.f.set_rank(p, self.f.rank(p).saturating_sub(1));
            self.mark[x] = false;
            grove = self.meld(x, grove);
            if self.f.parent(p) == 0 {
                // p is itself a grove root: cascade stops, nothing to mark
                break;
            }
            if self.mark[p] {
                x = p;
                continue;
            }
            self.mark[p] = true;
            break;
        }
        self.rotate_min_first(grove)
    }

    fn rotate_min_first(&mut self, h: Index) -> Index {
        let min = self.min_sibling(h);
        min
    }

    fn min_sibling(&self, h: Index) -> Index {
        let mut best = h;
        let mut x = self.f.next_sibling(h);
        while x != h {
            if self.key[x] < self.key[best] {
                best = x;
            }
            x = self.f.next_sibling(x);
        }
        best
    }

    /// Internal helper for the `changekey` increase-key path: removes `u` specifically
    /// (not necessarily the grove minimum) from its grove, returning `(u, remaining)`.
    fn deletemin_specific(&mut self, u: Index, h: Index) -> (Index, Index) {
        let fc = self.f.first_child(u);
        // if u is nested under another grove member, cutting it doesn't touch the
        // top-level sibling list at all; only a top-level u needs `remove` to excise it
        // from `h`'s own sibling list.
        let mut grove = if self.f.parent(u) != 0 {
            self.f.cut(u);
            h
        } else {
            self.f.remove(u, h)
        };
        if fc != 0 {
            let mut child = fc;
            loop {
                let next = self.f.next_sibling(child);
                self.f.cut(child);
                self.mark[child] = false;
                grove = self.meld(child, grove);
                if next == fc {
                    break;
                }
                child = next;
            }
        }
        (u, grove)
    }

    /// Moves all children of the grove head `h` into the grove as new roots, removes
    /// `h`, then consolidates by rank until every surviving root has a distinct rank.
    /// Returns `(h, new_head)`.
    pub fn deletemin(&mut self, h: Index) -> (Index, Index) {
        let (_, mut grove) = self.deletemin_specific(h, h);
        grove = self.consolidate(grove);
        (h, grove)
    }

    fn consolidate(&mut self, grove: Index) -> Index {
        if grove == 0 {
            return 0;
        }
        let mut roots = Vec::new();
        let mut x = grove;
        loop {
            roots.push(x);
            x = self.f.next_sibling(x);
            if x == grove {
                break;
            }
        }
        // rank never exceeds roughly log_phi(n); n+2 is a loose but always-safe bound
        let max_rank = self.n() + 2;
        let mut slots: Vec<Index> = vec![0; max_rank + 1];
        for r in roots {
            self.f.cut(r);
            // `cut` only clears the parent link for a root; make it a lone sibling too
            let mut cur = r;
            loop {
                let rank = self.f.rank(cur);
                if slots[rank] == 0 {
                    slots[rank] = cur;
                    break;
                }
                let other = slots[rank];
                slots[rank] = 0;
                let (winner, loser) = if self.key[cur] <= self.key[other] {
                    (cur, other)
                } else {
                    (other, cur)
                };
                self.f.link(loser, winner);
                self.mark[loser] = false;
                self.f.set_rank(winner, self.f.rank(winner) + 1);
                cur = winner;
            }
        }
        let mut head = 0;
        for &s in slots.iter() {
            if s != 0 {
                head = if head == 0 {
                    s
                } else {
                    self.f.combine_groves(head, s)
                };
            }
        }
        self.min_sibling(head)
    }

    pub fn clear(&mut self) {
        self.key.iter_mut().for_each(|k| *k = 0.0);
        self.mark.iter_mut().for_each(|m| *m = false);
        self.f = Forest::new(self.n());
    }

    pub fn expand(&mut self, n_prime: usize) {
        self.f.expand(n_prime);
        let cap = self.f.capacity() + 1;
        self.key.resize(cap, 0.0);
        self.mark.resize(cap, false);
    }

    /// Checks min-heap order (parent key <= child key) and, informatively, that no
    /// structural cycle exists (delegated to `Forest::verify`).
    pub fn verify(&self) -> String {
        let structural = self.f.verify();
        if !structural.is_empty() {
            return structural;
        }
        for u in 1..=self.n() {
            let p = self.f.parent(u);
            if p != 0 && self.key[p] > self.key[u] {
                return format!("node {u}: key less than parent {p}'s key");
            }
        }
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_findmin() {
        let mut h = FibHeaps::new(5);
        let mut root = h.insert(1, 0, 5.0);
        root = h.insert(2, root, 2.0);
        root = h.insert(3, root, 8.0);
        assert_eq!(h.key(h.findmin(root)), 2.0);
        assert_eq!(h.verify(), "");
    }

    #[test]
    fn deletemin_scenario() {
        // mirrors the concrete scenario in SPEC_FULL.md §8: insert 5,2,8,1,9,3,7,4,6
        let mut h = FibHeaps::new(9);
        let keys = [5.0, 2.0, 8.0, 1.0, 9.0, 3.0, 7.0, 4.0, 6.0];
        let mut root = 0;
        for (i, &k) in keys.iter().enumerate() {
            root = h.insert(i + 1, root, k);
        }
        assert_eq!(h.key(h.findmin(root)), 1.0);
        let (old, new_root) = h.deletemin(root);
        assert_eq!(h.key(old), 1.0);
        assert_eq!(h.key(h.findmin(new_root)), 2.0);
        assert_eq!(h.verify(), "");
        // all grove roots must have distinct ranks
        let mut ranks = Vec::new();
        let mut x = new_root;
        loop {
            ranks.push(h.f.rank(x));
            x = h.f.next_sibling(x);
            if x == new_root {
                break;
            }
        }
        let mut sorted = ranks.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ranks.len(), sorted.len());
    }

    #[test]
    fn random_keys_deletemin_in_sorted_order() {
        use rand::Rng;
        let n = 150;
        let mut rng = rand::rng();
        let mut h = FibHeaps::new(n);
        let mut root = 0;
        for u in 1..=n {
            let k = rng.random_range(0..1_000_000) as f64;
            root = h.insert(u, root, k);
        }
        assert_eq!(h.verify(), "");
        let mut last = f64::NEG_INFINITY;
        for _ in 0..n {
            let (min, new_root) = h.deletemin(root);
            let k = h.key(min);
            assert!(k >= last);
            last = k;
            root = new_root;
            if root != 0 {
                assert_eq!(h.verify(), "");
            }
        }
        assert_eq!(root, 0);
    }
}
