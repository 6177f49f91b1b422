/*! Leftist heaps over a [`BinaryForest`]

# About
A classic leftist heap: each node carries a `key` and a `rank` (null-path length), and
min-heap order is maintained by the shape invariant `rank[left] >= rank[right]`. `meld`
is the one operation that matters; everything else (`insert`, `deletemin`, `heapify`) is
a small wrapper around it.

`meld` is written iteratively with an explicit stack rather than recursively, following
the teacher's arena-traversal discipline: a recursive meld would recurse to the depth of
the right spine being descended, which is unbounded by construction. The descent detaches
each right child as it passes through it, so by the time the stack is unwound every
popped node is a bare root ready to be re-linked.
*/

use crate::forest::binary_forest::{fmt_flags, BinaryForest};
use crate::top::{label, parse_label, Index};
use std::fmt::Write as _;

#[derive(Debug, Clone)]
pub struct LeftistHeaps {
    bf: BinaryForest,
    key: Vec<f64>,
    rank: Vec<i32>,
}

impl LeftistHeaps {
    pub fn new(n: usize) -> Self {
        LeftistHeaps {
            bf: BinaryForest::new(n),
            key: vec![0.0; n + 1],
            rank: vec![0; n + 1],
        }
    }

    pub fn n(&self) -> usize {
        self.bf.n()
    }

    pub fn key(&self, u: Index) -> f64 {
        self.key[u]
    }

    /// Null-path length; `0` for the null handle, matching the leaf case `1 + rank(0)`.
    pub fn rank(&self, u: Index) -> i32 {
        if u == 0 {
            0
        } else {
            self.rank[u]
        }
    }

    pub fn findmin(&self, h: Index) -> Index {
        h
    }

    fn swap_children(&mut self, u: Index) {
        let l = self.bf.left(u);
        let r = self.bf.right(u);
        if l != 0 {
            self.bf.cut(l);
        }
        if r != 0 {
            self.bf.cut(r);
        }
        if r != 0 {
            self.bf.link(r, u, -1);
        }
        if l != 0 {
            self.bf.link(l, u, 1);
        }
    }

    /// Melds two heaps (each identified by its root, `0` for empty) into one, returning
    /// the new root.
    pub fn meld(&mut self, h1: Index, h2: Index) -> Index {
        if h1 == 0 {
            return h2;
        }
        if h2 == 0 {
            return h1;
        }
        let mut a = h1;
        let mut b = h2;
        let mut chain: Vec<Index> = Vec::new();
        loop {
            if self.key[a] > self.key[b] {
                std::mem::swap(&mut a, &mut b);
            }
            chain.push(a);
            let ra = self.bf.right(a);
            if ra == 0 {
                break;
            }
            self.bf.cut(ra);
            a = ra;
        }
        let mut below = b;
        while let Some(u) = chain.pop() {
            if below != 0 {
                self.bf.link(below, u, 1);
            }
            let l = self.bf.left(u);
            let r = self.bf.right(u);
            if self.rank(l) < self.rank(r) {
                self.swap_children(u);
            }
            self.rank[u] = self.rank(self.bf.right(u)) + 1;
            below = u;
        }
        below
    }

    /// Precondition: `u` is a fresh singleton.
    pub fn insert(&mut self, u: Index, h: Index, k: f64) -> Index {
        self.key[u] = k;
        self.rank[u] = 1;
        self.meld(u, h)
    }

    /// Removes the root of `h`, returning `(old_root, new_root)`.
    pub fn deletemin(&mut self, h: Index) -> (Index, Index) {
        let l = self.bf.left(h);
        let r = self.bf.right(h);
        if l != 0 {
            self.bf.cut(l);
        }
        if r != 0 {
            self.bf.cut(r);
        }
        self.rank[h] = 1;
        let new_root = self.meld(l, r);
        (h, new_root)
    }

    /// Repeatedly melds pairs from the front of `items` until one heap remains.
    pub fn heapify(&mut self, items: &[Index]) -> Index {
        let mut queue: std::collections::VecDeque<Index> = items.iter().copied().collect();
        if queue.is_empty() {
            return 0;
        }
        while queue.len() > 1 {
            let a = queue.pop_front().unwrap();
            let b = queue.pop_front().unwrap();
            queue.push_back(self.meld(a, b));
        }
        queue.pop_front().unwrap()
    }

    pub fn clear(&mut self) {
        self.bf.clear();
        self.key.iter_mut().for_each(|k| *k = 0.0);
        self.rank.iter_mut().for_each(|r| *r = 0);
    }

    pub fn expand(&mut self, n_prime: usize) {
        self.bf.expand(n_prime);
        let cap = self.bf.capacity() + 1;
        self.key.resize(cap, 0.0);
        self.rank.resize(cap, 0);
    }

    /// `label:key` per node, with `:rank` appended when `show_rank` is set.
    pub fn to_string(&self, show_rank: bool) -> String {
        let n = self.n();
        let key = &self.key;
        let rank = &self.rank;
        self.bf.to_string_fmt(
            fmt_flags::SHOW_STRUCTURE | fmt_flags::SHOW_SINGLETONS,
            |u| {
                let mut s = format!("{}:{}", label(u, n), key[u]);
                if show_rank {
                    let _ = write!(s, ":{}", rank[u]);
                }
                s
            },
            |_| None,
        )
    }

    pub fn from_string(&mut self, s: &str) -> bool {
        let n = self.n();
        let key = &mut self.key;
        let rank = &mut self.rank;
        let mut parsed: Vec<(Index, f64, Option<i32>)> = Vec::new();
        let ok = self.bf.from_string_fmt(s, |tok| {
            let mut parts = tok.split(':');
            let lbl = parts.next()?;
            let k: f64 = parts.next()?.parse().ok()?;
            let r: Option<i32> = parts.next().and_then(|t| t.parse().ok());
            let u = parse_label(lbl, n)?;
            parsed.push((u, k, r));
            Some(u)
        });
        if ok {
            for (u, k, r) in parsed {
                key[u] = k;
                if let Some(r) = r {
                    rank[u] = r;
                }
            }
        }
        ok
    }

    /// Checks min-heap order and the leftist shape invariant (`SPEC_FULL.md` §8).
    pub fn verify(&self) -> String {
        let structural = self.bf.verify();
        if !structural.is_empty() {
            return structural;
        }
        for u in 1..=self.n() {
            if !self.bf.isroot(u) {
                let p = self.bf.parent(u);
                if self.key[p] > self.key[u] {
                    return format!("node {u}: key less than parent {p}'s key");
                }
            }
            let l = self.bf.left(u);
            let r = self.bf.right(u);
            if self.rank(l) < self.rank(r) {
                return format!("node {u}: left rank {} less than right rank {}", self.rank(l), self.rank(r));
            }
            if self.rank[u] != self.rank(r) + 1 {
                return format!("node {u}: rank {} != 1 + right-rank {}", self.rank[u], self.rank(r));
            }
        }
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meld_preserves_heap_order() {
        let mut h = LeftistHeaps::new(6);
        let mut root = h.insert(1, 0, 5.0);
        root = h.insert(2, root, 2.0);
        root = h.insert(3, root, 8.0);
        root = h.insert(4, root, 1.0);
        assert_eq!(h.findmin(root), 4);
        assert_eq!(h.verify(), "");
    }

    #[test]
    fn deletemin_returns_next_smallest() {
        let mut h = LeftistHeaps::new(4);
        let mut root = h.insert(1, 0, 5.0);
        root = h.insert(2, root, 2.0);
        root = h.insert(3, root, 8.0);
        root = h.insert(4, root, 1.0);
        let (old, new_root) = h.deletemin(root);
        assert_eq!(old, 4);
        assert_eq!(h.findmin(new_root), 2);
        assert_eq!(h.verify(), "");
    }

    #[test]
    fn heapify_then_deletemin_scenario() {
        // mirrors the concrete scenario in SPEC_FULL.md §8
        let mut h = LeftistHeaps::new(10);
        for (i, k) in [(1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0)] {
            h.key[i] = k;
            h.rank[i] = 1;
        }
        let left_root = h.heapify(&[1, 2, 3, 4]);
        assert_eq!(h.findmin(left_root), 1);
        for (i, k) in [(5, 5.0), (6, 6.0), (7, 7.0), (8, 8.0), (9, 9.0), (10, 10.0)] {
            h.key[i] = k;
            h.rank[i] = 1;
        }
        let right_root = h.heapify(&[5, 6, 7, 8, 9, 10]);
        assert_eq!(h.findmin(right_root), 5);
        let (old, new_root) = h.deletemin(right_root);
        assert_eq!(old, 5);
        assert_eq!(h.findmin(new_root), 6);
        assert_eq!(h.verify(), "");
        let _ = left_root;
    }
}
