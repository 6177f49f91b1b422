/*! A forest of plain binary search trees over a handle range `1..=n`

# About
`BinaryForest` partitions `1..=n` into zero or more binary trees. Every relation —
`left`, `right`, `parent` — lives in a flat `Vec` indexed directly by handle, in the
arena style used throughout this crate: no `Option<usize>`, no boxed nodes, a `0` entry
*is* the absence of a child or parent. This keeps traversal branch-free and keeps the
whole forest copy-free to reallocate, split, or join.

A root's `parent` slot is repurposed (`§3`, "packed field") to also carry a small
non-negative **tree property**: `parent[u] <= 0` means `u` is a root and `-parent[u]` is
its property; `parent[u] > 0` is the parent handle. This lets a client like `KeySets`
tag a root with (say) a group id without a parallel array.

# Design
Every structural mutator (`cut`, `link`, `join`, `split`, `rotate`, `delete`, `insertAfter`)
preserves infix order except where explicitly stated (`insertByKey` creates new order;
`delete`/`split` remove a node from it). Traversal (`first`/`last`/`next`/`prev`) is
iterative, following the teacher's arena-traversal discipline of using an explicit loop
over `parent` chains rather than recursion, so there's no stack depth tied to tree height.

`BalancedForest` (`forest::balanced_forest`) does not subclass this type (Rust has no
inheritance) — it **embeds** a `BinaryForest` and layers a `rank` array plus
rebalancing on top, calling back into the plain structural operations here.
*/

use crate::top::{Index, Top};
use std::cmp::Ordering;
use std::fmt::Write as _;

/// Which child slot a node occupies under its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Serialization format flags for [`BinaryForest::to_string`] (`SPEC_FULL.md` §6).
pub mod fmt_flags {
    pub const NEWLINES: u8 = 0x1;
    pub const SHOW_SINGLETONS: u8 = 0x2;
    pub const SHOW_STRUCTURE: u8 = 0x4;
}

/// Running operation counters, read via [`BinaryForest::stats`] (`SPEC_FULL.md` §5/§10).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub steps: u64,
    pub rotations: u64,
}

/// A forest of plain (unbalanced) binary trees over handles `1..=n`.
#[derive(Debug, Clone)]
pub struct BinaryForest {
    top: Top,
    left: Vec<Index>,
    right: Vec<Index>,
    // parent[u] <= 0: u is a root, property = -parent[u]
    // parent[u] >  0: u's parent handle
    parent: Vec<isize>,
    stats: Stats,
}

impl BinaryForest {
    /// Creates a forest of `n` singleton trees (handles `1..=n`, each its own root).
    pub fn new(n: usize) -> Self {
        BinaryForest {
            top: Top::new(n),
            left: vec![0; n + 1],
            right: vec![0; n + 1],
            parent: vec![0; n + 1],
            stats: Stats::default(),
        }
    }

    /// The active size `n` of the index range.
    pub fn n(&self) -> usize {
        self.top.n()
    }

    /// The number of handles the backing arrays can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.left.len() - 1
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    fn valid(&self, u: Index, what: &str) {
        self.top.assert_valid(u, what);
    }

    // --- accessors -----------------------------------------------------

    pub fn left(&self, u: Index) -> Index {
        self.left[u]
    }

    pub fn right(&self, u: Index) -> Index {
        self.right[u]
    }

    /// Returns `0` for a root.
    pub fn parent(&self, u: Index) -> Index {
        let p = self.parent[u];
        if p > 0 {
            p as Index
        } else {
            0
        }
    }

    pub fn isroot(&self, u: Index) -> bool {
        self.parent[u] <= 0
    }

    pub fn singleton(&self, u: Index) -> bool {
        self.isroot(u) && self.left[u] == 0 && self.right[u] == 0
    }

    /// The non-negative tree property packed into a root's `parent` slot. `0` by default.
    ///
    /// # Panics
    /// Panics if `u` is not a root.
    pub fn property(&self, u: Index) -> usize {
        assert!(self.isroot(u), "Error: property({u}) requires a root");
        (-self.parent[u]) as usize
    }

    /// Sets the tree property of a root.
    ///
    /// # Panics
    /// Panics if `u` is not a root.
    pub fn set_property(&mut self, u: Index, p: usize) {
        assert!(self.isroot(u), "Error: set_property({u}) requires a root");
        self.parent[u] = -(p as isize);
    }

    /// The child of `u`'s parent that isn't `u`; `0` if `u` is a root.
    pub fn sibling(&self, u: Index) -> Index {
        let p = self.parent(u);
        if p == 0 {
            return 0;
        }
        if self.left[p] == u {
            self.right[p]
        } else {
            self.left[p]
        }
    }

    pub fn grandparent(&self, u: Index) -> Index {
        let p = self.parent(u);
        if p == 0 {
            0
        } else {
            self.parent(p)
        }
    }

    pub fn child(&self, u: Index, side: Side) -> Index {
        match side {
            Side::Left => self.left[u],
            Side::Right => self.right[u],
        }
    }

    fn set_child(&mut self, u: Index, side: Side, v: Index) {
        match side {
            Side::Left => self.left[u] = v,
            Side::Right => self.right[u] = v,
        }
    }

    /// Which side `u` occupies under its parent.
    ///
    /// # Panics
    /// Panics if `u` is a root.
    pub fn side_of(&self, u: Index) -> Side {
        let p = self.parent(u);
        assert!(p != 0, "Error: side_of({u}) requires a non-root");
        if self.left[p] == u {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// `u`'s child on the same side `u` itself hangs from its parent. Used by
    /// `BalancedForest::rerank_down` to locate a sibling's "nephew".
    ///
    /// # Panics
    /// Panics if `u` is a root.
    pub fn outer_child(&self, u: Index) -> Index {
        self.child(u, self.side_of(u))
    }

    /// `u`'s child on the side opposite the one `u` hangs from its parent ("niece").
    ///
    /// # Panics
    /// Panics if `u` is a root.
    pub fn inner_child(&self, u: Index) -> Index {
        self.child(u, self.side_of(u).opposite())
    }

    /// True if `x` is the "outer" grandchild of `grandparent(x)` — `x` and `parent(x)`
    /// hang on the same side (a zig-zig configuration); false means "inner" (zig-zag).
    ///
    /// # Panics
    /// Panics unless `x` has both a parent and a grandparent.
    pub fn is_outer_grandchild(&self, x: Index) -> bool {
        let p = self.parent(x);
        assert!(p != 0, "Error: is_outer_grandchild({x}) requires a parent");
        assert!(
            self.parent(p) != 0,
            "Error: is_outer_grandchild({x}) requires a grandparent"
        );
        self.side_of(x) == self.side_of(p)
    }

    // --- traversal -------------------------------------------------------

    /// Leftmost descendant of the subtree rooted at `u` (`u` itself if it has no left
    /// child).
    pub fn first(&self, u: Index) -> Index {
        if u == 0 {
            return 0;
        }
        let mut x = u;
        while self.left[x] != 0 {
            x = self.left[x];
        }
        x
    }

    /// Rightmost descendant of the subtree rooted at `u`.
    pub fn last(&self, u: Index) -> Index {
        if u == 0 {
            return 0;
        }
        let mut x = u;
        while self.right[x] != 0 {
            x = self.right[x];
        }
        x
    }

    /// Infix successor of `u`. With `root = 0` the walk may climb to the top of `u`'s
    /// tree; with an explicit `root` the walk stops (returning `0`) at the boundary of
    /// `root`'s subtree.
    pub fn next(&self, u: Index, root: Index) -> Index {
        if self.right[u] != 0 {
            return self.first(self.right[u]);
        }
        let mut x = u;
        loop {
            if x == root {
                return 0;
            }
            let p = self.parent(x);
            if p == 0 {
                return 0;
            }
            if self.left[p] == x {
                return p;
            }
            x = p;
        }
    }

    /// Infix predecessor of `u`, mirroring [`Self::next`].
    pub fn prev(&self, u: Index, root: Index) -> Index {
        if self.left[u] != 0 {
            return self.last(self.left[u]);
        }
        let mut x = u;
        loop {
            if x == root {
                return 0;
            }
            let p = self.parent(x);
            if p == 0 {
                return 0;
            }
            if self.right[p] == x {
                return p;
            }
            x = p;
        }
    }

    /// The root of `u`'s tree.
    pub fn find(&self, u: Index) -> Index {
        let mut x = u;
        while !self.isroot(x) {
            x = self.parent(x);
        }
        x
    }

    /// Standard BST lookup in the tree rooted at `t`. `cmp(x)` must compare the sought
    /// key against node `x`'s key, in the sense of [`Ordering`] from the key's point of
    /// view (`Less` means the key is less than `x`, so search continues left). Returns
    /// `0` if no node compares equal.
    pub fn search<F: Fn(Index) -> Ordering>(&self, t: Index, cmp: F) -> Index {
        let mut x = t;
        while x != 0 {
            match cmp(x) {
                Ordering::Less => x = self.left[x],
                Ordering::Greater => x = self.right[x],
                Ordering::Equal => return x,
            }
        }
        0
    }

    // --- structural mutators --------------------------------------------

    /// Detaches `u` from its parent (its own subtree comes along); `u` becomes a root
    /// with property `0`. A no-op (returns `u` unchanged) if `u` is already a root.
    pub fn cut(&mut self, u: Index) -> Index {
        self.valid(u, "cut");
        let p = self.parent(u);
        if p == 0 {
            return u;
        }
        if self.left[p] == u {
            self.left[p] = 0;
        } else {
            self.right[p] = 0;
        }
        self.parent[u] = 0;
        self.stats.steps += 1;
        u
    }

    /// Makes root `u` (or `0`, meaning "attach nothing") a child of `v`.
    /// `side`: `-1` left, `1` right, `0` implementation's choice (an empty side if
    /// exactly one is empty; a coin flip via `rand::Rng` if both are empty).
    ///
    /// # Panics
    /// Panics if `u` isn't `0` or a root, if `v` is invalid, or if the resolved side of
    /// `v` is already occupied.
    pub fn link(&mut self, u: Index, v: Index, side: i32) {
        self.valid(v, "link");
        if u != 0 {
            self.valid(u, "link");
            assert!(self.isroot(u), "Error: link({u}, ..) requires a root");
        }
        let s = match side {
            -1 => Side::Left,
            1 => Side::Right,
            0 => {
                let left_empty = self.left[v] == 0;
                let right_empty = self.right[v] == 0;
                match (left_empty, right_empty) {
                    (true, false) => Side::Left,
                    (false, true) => Side::Right,
                    (false, false) => panic!("Error: link: both sides of {v} occupied"),
                    (true, true) => {
                        use rand::Rng;
                        let mut rng = rand::rng();
                        if rng.random_bool(0.5) {
                            Side::Left
                        } else {
                            Side::Right
                        }
                    }
                }
            }
            _ => panic!("Error: link: invalid side {side}"),
        };
        assert!(
            self.child(v, s) == 0,
            "Error: link: side of {v} already occupied"
        );
        self.set_child(v, s, u);
        if u != 0 {
            self.parent[u] = v as isize;
        }
        self.stats.steps += 1;
    }

    /// Exchanges the positions of `u` and `v` within their (shared) tree, preserving
    /// the tree's shape — every other node keeps its relative place. Handles the case
    /// where one of `u`, `v` is the other's parent.
    pub fn swap(&mut self, u: Index, v: Index) {
        self.valid(u, "swap");
        self.valid(v, "swap");
        if u == v {
            return;
        }
        if self.parent(v) == u {
            self.swap_adjacent(u, v);
            return;
        }
        if self.parent(u) == v {
            self.swap_adjacent(v, u);
            return;
        }

        let pu = self.parent(u);
        let pv = self.parent(v);
        let u_is_root = pu == 0;
        let v_is_root = pv == 0;
        let propu = if u_is_root { self.property(u) } else { 0 };
        let propv = if v_is_root { self.property(v) } else { 0 };
        let (lu, ru) = (self.left[u], self.right[u]);
        let (lv, rv) = (self.left[v], self.right[v]);

        if !u_is_root {
            if self.left[pu] == u {
                self.left[pu] = v;
            } else {
                self.right[pu] = v;
            }
        }
        if !v_is_root {
            if self.left[pv] == v {
                self.left[pv] = u;
            } else {
                self.right[pv] = u;
            }
        }
        self.parent[v] = if u_is_root { -(propu as isize) } else { pu as isize };
        self.parent[u] = if v_is_root { -(propv as isize) } else { pv as isize };

        self.left[v] = lu;
        self.right[v] = ru;
        self.left[u] = lv;
        self.right[u] = rv;
        if lu != 0 {
            self.parent[lu] = v as isize;
        }
        if ru != 0 {
            self.parent[ru] = v as isize;
        }
        if lv != 0 {
            self.parent[lv] = u as isize;
        }
        if rv != 0 {
            self.parent[rv] = u as isize;
        }
        self.stats.steps += 1;
    }

    /// `swap` for the adjacent case: `p` is the direct parent of `c`.
    fn swap_adjacent(&mut self, p: Index, c: Index) {
        let s = self.side_of(c);
        let other = self.child(p, s.opposite());
        let pp = self.parent(p);
        let p_is_root = pp == 0;
        let propp = if p_is_root { self.property(p) } else { 0 };
        let (lc, rc) = (self.left[c], self.right[c]);

        if p_is_root {
            self.parent[c] = -(propp as isize);
        } else {
            self.parent[c] = pp as isize;
            if self.left[pp] == p {
                self.left[pp] = c;
            } else {
                self.right[pp] = c;
            }
        }
        self.set_child(c, s, p);
        self.set_child(c, s.opposite(), other);
        if other != 0 {
            self.parent[other] = c as isize;
        }

        self.parent[p] = c as isize;
        self.left[p] = lc;
        self.right[p] = rc;
        if lc != 0 {
            self.parent[lc] = p as isize;
        }
        if rc != 0 {
            self.parent[rc] = p as isize;
        }
    }

    /// Joins two (possibly empty) trees `t1`, `t2` under singleton root `u`: `u` becomes
    /// a root with `t1` as its left subtree and `t2` as its right.
    ///
    /// # Panics
    /// Panics unless `u` is a singleton and `t1`/`t2` (when nonzero) are roots.
    pub fn join(&mut self, t1: Index, u: Index, t2: Index) -> Index {
        self.valid(u, "join");
        assert!(self.singleton(u), "Error: join: {u} must be a singleton");
        if t1 != 0 {
            assert!(self.isroot(t1), "Error: join: t1={t1} must be a root");
            self.parent[t1] = u as isize;
        }
        if t2 != 0 {
            assert!(self.isroot(t2), "Error: join: t2={t2} must be a root");
            self.parent[t2] = u as isize;
        }
        self.left[u] = t1;
        self.right[u] = t2;
        self.parent[u] = 0;
        self.stats.steps += 1;
        u
    }

    /// Splits `u`'s tree into `(before, after)` by `u`'s infix position: `before` holds
    /// every node that preceded `u`, `after` every node that followed it. `u` itself
    /// becomes a singleton, belonging to neither piece.
    pub fn split(&mut self, u: Index) -> (Index, Index) {
        self.valid(u, "split");
        self.split_with(u, |f, t1, root, t2| f.join(t1, root, t2))
    }

    /// Shared walk-up-to-root algorithm behind `split`: detaches `u`, then folds each
    /// ancestor (plus the subtree hanging off its far side) into the accumulating
    /// `before`/`after` trees using `join_fn`. Exposed so `BalancedForest::split` can
    /// reuse the walk while folding with its own rank-aware join.
    pub(crate) fn split_with<F>(&mut self, u: Index, mut join_fn: F) -> (Index, Index)
    where
        F: FnMut(&mut Self, Index, Index, Index) -> Index,
    {
        // Collect the path to the root before mutating anything: each step records the
        // ancestor and which side the descendant hung from.
        let mut chain: Vec<(Index, Side)> = Vec::new();
        let mut x = u;
        while !self.isroot(x) {
            let p = self.parent(x);
            let s = self.side_of(x);
            chain.push((p, s));
            x = p;
        }

        let mut before = self.left[u];
        let mut after = self.right[u];
        if before != 0 {
            self.parent[before] = 0;
        }
        if after != 0 {
            self.parent[after] = 0;
        }
        self.left[u] = 0;
        self.right[u] = 0;
        self.parent[u] = 0;

        for (anc, s) in chain {
            let other = match s {
                Side::Left => self.right[anc],
                Side::Right => self.left[anc],
            };
            if other != 0 {
                self.parent[other] = 0;
            }
            self.left[anc] = 0;
            self.right[anc] = 0;
            self.parent[anc] = 0;
            match s {
                // `anc` was reached by climbing from its left child: anc and its right
                // subtree all follow u.
                Side::Left => after = join_fn(self, after, anc, other),
                // `anc` was reached from its right child: anc and its left subtree all
                // precede u.
                Side::Right => before = join_fn(self, other, anc, before),
            }
        }
        (before, after)
    }

    /// Concatenates `u`'s tree followed by `v`'s tree, preserving each one's internal
    /// infix order.
    pub fn append(&mut self, u: Index, v: Index) -> Index {
        if u == 0 {
            return v;
        }
        if v == 0 {
            return u;
        }
        let last_of_u = self.last(u);
        let (before, _empty_after) = self.split(last_of_u);
        self.join(before, last_of_u, v)
    }

    /// Inserts singleton `u` immediately after `v` in the infix order of `t` (or at the
    /// very start of `t` if `v == 0`). Implemented by descending to the leftmost empty
    /// slot of `v`'s right subtree (or the leftmost position of `t` when `v == 0`).
    pub fn insert_after(&mut self, u: Index, v: Index, t: Index) -> Index {
        self.valid(u, "insert_after");
        assert!(self.singleton(u), "Error: insert_after: {u} must be a singleton");
        if v == 0 {
            if t == 0 {
                return u;
            }
            let leftmost = self.first(t);
            self.left[leftmost] = u;
            self.parent[u] = leftmost as isize;
            return self.find(leftmost);
        }
        self.valid(v, "insert_after");
        if self.right[v] == 0 {
            self.right[v] = u;
            self.parent[u] = v as isize;
        } else {
            let spot = self.first(self.right[v]);
            self.left[spot] = u;
            self.parent[u] = spot as isize;
        }
        self.find(v)
    }

    /// Standard BST insertion of singleton `u` into the tree rooted at `t` (`0` for "new
    /// tree"), using `cmp(x)` to compare `u`'s key against node `x`. Returns the new
    /// root.
    pub fn insert_by_key<F: Fn(Index, Index) -> Ordering>(
        &mut self,
        u: Index,
        t: Index,
        cmp: F,
    ) -> Index {
        self.valid(u, "insert_by_key");
        assert!(self.singleton(u), "Error: insert_by_key: {u} must be a singleton");
        if t == 0 {
            return u;
        }
        let mut x = t;
        loop {
            self.stats.steps += 1;
            match cmp(u, x) {
                Ordering::Less | Ordering::Equal => {
                    if self.left[x] == 0 {
                        self.left[x] = u;
                        self.parent[u] = x as isize;
                        return self.find(x);
                    }
                    x = self.left[x];
                }
                Ordering::Greater => {
                    if self.right[x] == 0 {
                        self.right[x] = u;
                        self.parent[u] = x as isize;
                        return self.find(x);
                    }
                    x = self.right[x];
                }
            }
        }
    }

    /// Removes `u` from the tree rooted at `t` (defaulting to `find(u)` if `t == 0`).
    /// If `u` has two children it is first swapped with `prev(u)`, which — since it's
    /// the rightmost node of `u`'s left subtree — can only ever have a left child. That
    /// swap moves `u` into `prev(u)`'s old slot, so after it `u` always has at most one
    /// child and the physical splice below is uniform across both cases. `u` is left as
    /// a clean singleton. Returns the resulting root (which may no longer be reachable
    /// through the original `t`/`u` handles if one of them was the root).
    pub fn delete(&mut self, u: Index, t: Index) -> Index {
        self.valid(u, "delete");
        let _ = t;
        if self.left[u] != 0 && self.right[u] != 0 {
            let victim = self.prev(u, 0);
            self.swap(u, victim);
        }
        let child = if self.left[u] != 0 { self.left[u] } else { self.right[u] };
        let pu = self.parent(u);
        if child != 0 {
            self.parent[child] = if pu == 0 { 0 } else { pu as isize };
        }
        if pu != 0 {
            if self.left[pu] == u {
                self.left[pu] = child;
            } else {
                self.right[pu] = child;
            }
        }
        self.left[u] = 0;
        self.right[u] = 0;
        self.parent[u] = 0;
        self.stats.steps += 1;

        if pu != 0 {
            self.find(pu)
        } else {
            child
        }
    }

    /// Single rotation moving `x` into its parent's slot, preserving infix order.
    ///
    /// # Panics
    /// Panics if `x` is a root.
    pub fn rotate(&mut self, x: Index) -> Index {
        let p = self.parent(x);
        assert!(p != 0, "Error: rotate({x}) requires a non-root");
        let gp = self.parent(p);
        let gp_is_root = gp == 0;
        let prop = if gp_is_root { self.property(p) } else { 0 };
        let s = self.side_of(x);

        let middle = self.child(x, s.opposite());
        self.set_child(p, s, middle);
        if middle != 0 {
            self.parent[middle] = p as isize;
        }
        self.set_child(x, s.opposite(), p);
        self.parent[p] = x as isize;

        if gp_is_root {
            self.parent[x] = -(prop as isize);
        } else {
            self.parent[x] = gp as isize;
            if self.left[gp] == p {
                self.left[gp] = x;
            } else {
                self.right[gp] = x;
            }
        }
        self.stats.steps += 1;
        self.stats.rotations += 1;
        x
    }

    /// Double rotation: if `x` is an outer grandchild of its grandparent, rotates
    /// `parent(x)` then `x` (zig-zig); if inner, rotates `x` twice (zig-zag). Either
    /// way `x` ends up in its former grandparent's slot.
    ///
    /// # Panics
    /// Panics unless `x` has both a parent and a grandparent.
    pub fn rotate2(&mut self, x: Index) -> Index {
        if self.is_outer_grandchild(x) {
            self.rotate(self.parent(x));
            self.rotate(x)
        } else {
            self.rotate(x);
            self.rotate(x)
        }
    }

    // --- lifecycle -------------------------------------------------------

    /// Reallocates to a new size `n_prime`, following the growth policy of
    /// `SPEC_FULL.md` §11 (`Top::new_capacity`); all nodes become singletons.
    pub fn reset(&mut self, n_prime: usize) {
        let new_cap = Top::new_capacity(self.capacity(), n_prime).max(n_prime);
        self.top.reset(n_prime);
        self.left = vec![0; new_cap + 1];
        self.right = vec![0; new_cap + 1];
        self.parent = vec![0; new_cap + 1];
        self.stats = Stats::default();
    }

    /// Grows the forest to `n_prime`, preserving all existing content. New handles
    /// `n()+1..=n_prime` are added as singletons.
    pub fn expand(&mut self, n_prime: usize) {
        if n_prime <= self.n() {
            return;
        }
        let new_cap = Top::new_capacity(self.capacity(), n_prime).max(n_prime);
        self.left.resize(new_cap + 1, 0);
        self.right.resize(new_cap + 1, 0);
        self.parent.resize(new_cap + 1, 0);
        self.top.reset(n_prime);
    }

    /// Returns every node to the singleton/root state, preserving `n` and capacity.
    pub fn clear(&mut self) {
        self.left.iter_mut().for_each(|v| *v = 0);
        self.right.iter_mut().for_each(|v| *v = 0);
        self.parent.iter_mut().for_each(|v| *v = 0);
        self.stats = Stats::default();
    }

    /// Deep-copies `other`'s content into `self`, reallocating if necessary.
    pub fn assign(&mut self, other: &BinaryForest) {
        self.top = other.top;
        self.left = other.left.clone();
        self.right = other.right.clone();
        self.parent = other.parent.clone();
        self.stats = other.stats;
    }

    /// Steals `other`'s storage; `other` is left as an empty (`n=0`) forest.
    pub fn transfer(&mut self, other: &mut BinaryForest) {
        std::mem::swap(self, other);
        *other = BinaryForest::new(0);
    }

    // --- serialization -----------------------------------------------------

    /// Renders the forest per `SPEC_FULL.md` §6: `{ T1 T2 ... }`, each tree as `[ ... ]`.
    /// `node_label(u)` supplies the text for handle `u`; `tree_prop(root)` optionally
    /// supplies a tree-property prefix (only emitted when `Some` and nonzero).
    pub fn to_string_fmt<L, P>(&self, flags: u8, node_label: L, tree_prop: P) -> String
    where
        L: Fn(Index) -> String,
        P: Fn(Index) -> Option<usize>,
    {
        let show_structure = flags & fmt_flags::SHOW_STRUCTURE != 0;
        let show_singletons = flags & fmt_flags::SHOW_SINGLETONS != 0;
        let newlines = flags & fmt_flags::NEWLINES != 0;

        let mut out = String::from("{ ");
        let mut first = true;
        for r in 1..=self.n() {
            if !self.isroot(r) {
                continue;
            }
            if self.singleton(r) && !show_singletons {
                continue;
            }
            if !first {
                out.push(if newlines { '\n' } else { ' ' });
            }
            first = false;
            if let Some(p) = tree_prop(r) {
                if p > 0 {
                    write!(out, "{p}").unwrap();
                }
            }
            out.push_str("[ ");
            self.write_subtree(&mut out, r, true, show_structure, &node_label);
            out.push_str(" ]");
        }
        out.push_str(" }");
        out
    }

    fn write_subtree<L: Fn(Index) -> String>(
        &self,
        out: &mut String,
        u: Index,
        is_root: bool,
        show_structure: bool,
        node_label: &L,
    ) {
        if u == 0 {
            if show_structure {
                out.push('-');
            }
            return;
        }
        let wrap = show_structure && !is_root;
        if wrap {
            out.push('(');
        }
        if show_structure && is_root {
            out.push('*');
        }
        if self.left[u] == 0 && self.right[u] == 0 {
            out.push_str(&node_label(u));
        } else if show_structure {
            self.write_subtree(out, self.left[u], false, show_structure, node_label);
            out.push(' ');
            out.push_str(&node_label(u));
            out.push(' ');
            self.write_subtree(out, self.right[u], false, show_structure, node_label);
        } else {
            // Infix traversal without structural parens: emit children in order, self
            // in the middle, separated by spaces, omitting empty children entirely.
            if self.left[u] != 0 {
                self.write_subtree(out, self.left[u], false, show_structure, node_label);
                out.push(' ');
            }
            out.push_str(&node_label(u));
            if self.right[u] != 0 {
                out.push(' ');
                self.write_subtree(out, self.right[u], false, show_structure, node_label);
            }
        }
        if wrap {
            out.push(')');
        }
    }

    /// Parses the grammar emitted by `to_string_fmt`'s `SHOW_STRUCTURE` form, rebuilding
    /// parent/child relations. `parse_label` maps text back to a handle. Returns `false`
    /// (leaving `self` unchanged apart from `clear()`) on any syntax or duplicate-handle
    /// error.
    pub fn from_string_fmt<P: FnMut(&str) -> Option<Index>>(&mut self, s: &str, mut parse_label: P) -> bool {
        let mut toks = Tokenizer::new(s);
        if toks.expect("{").is_none() {
            return false;
        }
        self.clear();
        let mut seen = vec![false; self.capacity() + 1];
        loop {
            match toks.peek() {
                Some("}") => {
                    toks.next();
                    return true;
                }
                None => return self.fail(),
                _ => {}
            }
            if toks.expect("[").is_none() {
                return self.fail();
            }
            if toks.peek() == Some("*") {
                toks.next();
            }
            if self.parse_inner(&mut toks, &mut parse_label, &mut seen).is_none() {
                return self.fail();
            }
            if toks.expect("]").is_none() {
                return self.fail();
            }
        }
    }

    fn fail(&mut self) -> bool {
        self.clear();
        false
    }

    /// Parses one non-root subtree position: either the empty token `-` or a
    /// parenthesized `( ... )` wrapping [`parse_inner`].
    fn parse_body<P: FnMut(&str) -> Option<Index>>(
        &mut self,
        toks: &mut Tokenizer,
        parse_label: &mut P,
        seen: &mut [bool],
    ) -> Option<Index> {
        if toks.peek() == Some("-") {
            toks.next();
            return Some(0);
        }
        toks.expect("(")?;
        let u = self.parse_inner(toks, parse_label, seen)?;
        toks.expect(")")?;
        Some(u)
    }

    /// Parses the content of a non-null subtree position: a bare leaf `LABEL`, or the
    /// `S1 LABEL S2` form written by `write_subtree` for an internal node. The two are
    /// disambiguated by peeking whether the next token opens a subtree (`-` or `(`).
    fn parse_inner<P: FnMut(&str) -> Option<Index>>(
        &mut self,
        toks: &mut Tokenizer,
        parse_label: &mut P,
        seen: &mut [bool],
    ) -> Option<Index> {
        let has_left = matches!(toks.peek(), Some("-") | Some("("));
        let l = if has_left {
            self.parse_body(toks, parse_label, seen)?
        } else {
            0
        };
        let tok = toks.next()?;
        let u = parse_label(tok)?;
        if u == 0 || u > self.capacity() || seen[u] {
            return None;
        }
        seen[u] = true;
        let r = if has_left {
            self.parse_body(toks, parse_label, seen)?
        } else {
            0
        };
        if l != 0 {
            self.left[u] = l;
            self.parent[l] = u as isize;
        }
        if r != 0 {
            self.right[u] = r;
            self.parent[r] = u as isize;
        }
        Some(u)
    }

    // --- verification ------------------------------------------------------

    /// Checks the structural invariants of `SPEC_FULL.md` §8 (BinaryForest) over the
    /// whole forest. Returns a human-readable description of the first violation found,
    /// or an empty string if the forest is consistent.
    pub fn verify(&self) -> String {
        for u in 1..=self.n() {
            let l = self.left[u];
            let r = self.right[u];
            if l != 0 && self.parent(l) != u {
                return format!("node {u}: left child {l} does not point back via parent");
            }
            if r != 0 && self.parent(r) != u {
                return format!("node {u}: right child {r} does not point back via parent");
            }
            if l != 0 && l == r {
                return format!("node {u}: left and right child are both {l}");
            }
        }
        for u in 1..=self.n() {
            let mut x = u;
            let mut steps = 0usize;
            while !self.isroot(x) {
                x = self.parent(x);
                steps += 1;
                if steps > self.n() {
                    return format!("node {u}: cycle detected while climbing to root");
                }
            }
        }
        String::new()
    }
}

/// A minimal hand-rolled tokenizer for the bracket/label grammar of `SPEC_FULL.md` §6.
/// Deliberately not a general scanner (out of scope per `§1`) or a parser-combinator
/// crate dependency — the grammar is a handful of single-character delimiters plus bare
/// labels, better served by a direct split-on-whitespace-and-punctuation pass.
struct Tokenizer<'a> {
    toks: std::iter::Peekable<std::vec::IntoIter<&'a str>>,
}

impl<'a> Tokenizer<'a> {
    fn new(s: &'a str) -> Self {
        let mut toks = Vec::new();
        let mut chars = s.char_indices().peekable();
        let bytes = s.as_bytes();
        let mut start: Option<usize> = None;
        let flush = |toks: &mut Vec<&'a str>, start: &mut Option<usize>, end: usize| {
            if let Some(st) = start.take() {
                if end > st {
                    toks.push(&s[st..end]);
                }
            }
        };
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() {
                flush(&mut toks, &mut start, i);
                chars.next();
            } else if "{}[]()-*".contains(c) {
                flush(&mut toks, &mut start, i);
                toks.push(&s[i..i + c.len_utf8()]);
                chars.next();
            } else {
                if start.is_none() {
                    start = Some(i);
                }
                chars.next();
            }
        }
        flush(&mut toks, &mut start, bytes.len());
        Tokenizer {
            toks: toks.into_iter().peekable(),
        }
    }

    fn peek(&mut self) -> Option<&'a str> {
        self.toks.peek().copied()
    }

    fn next(&mut self) -> Option<&'a str> {
        self.toks.next()
    }

    fn expect(&mut self, want: &str) -> Option<()> {
        if self.peek() == Some(want) {
            self.toks.next();
            Some(())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::top::label;

    fn lbl(f: &BinaryForest) -> impl Fn(Index) -> String + '_ {
        let n = f.n();
        move |i| label(i, n)
    }

    #[test]
    fn singletons_start_empty() {
        let f = BinaryForest::new(5);
        for i in 1..=5 {
            assert!(f.singleton(i));
        }
        assert_eq!(f.verify(), "");
    }

    #[test]
    fn join_and_infix_order() {
        let mut f = BinaryForest::new(3);
        // join(1, 2, 3): 2 is root, left=1, right=3 -> infix order 1,2,3
        let root = f.join(1, 2, 3);
        assert_eq!(root, 2);
        assert_eq!(f.first(root), 1);
        assert_eq!(f.last(root), 3);
        assert_eq!(f.next(1, 0), 2);
        assert_eq!(f.next(2, 0), 3);
        assert_eq!(f.next(3, 0), 0);
        assert_eq!(f.prev(3, 0), 2);
        assert_eq!(f.verify(), "");
    }

    #[test]
    fn rotate_preserves_infix_order() {
        let mut f = BinaryForest::new(3);
        let root = f.join(1, 2, 3);
        // rotate the right child up: infix order must stay 1,2,3
        f.rotate(3);
        let new_root = f.find(1);
        assert_eq!(f.first(new_root), 1);
        assert_eq!(f.last(new_root), 3);
        let mut order = Vec::new();
        let mut x = f.first(new_root);
        while x != 0 {
            order.push(x);
            x = f.next(x, 0);
        }
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(f.verify(), "");
        let _ = root;
    }

    #[test]
    fn split_and_rejoin() {
        let mut f = BinaryForest::new(5);
        let t1 = f.join(1, 2, 0);
        let root = f.join(t1, 3, 0);
        let root = f.join(root, 4, 5);
        // infix order: 1 2 3 4 5
        let mut order = Vec::new();
        let mut x = f.first(root);
        while x != 0 {
            order.push(x);
            x = f.next(x, 0);
        }
        assert_eq!(order, vec![1, 2, 3, 4, 5]);

        let (before, after) = f.split(3);
        assert!(f.singleton(3));
        let mut b = Vec::new();
        let mut x = if before != 0 { f.first(before) } else { 0 };
        while x != 0 {
            b.push(x);
            x = f.next(x, 0);
        }
        assert_eq!(b, vec![1, 2]);
        let mut a = Vec::new();
        let mut x = if after != 0 { f.first(after) } else { 0 };
        while x != 0 {
            a.push(x);
            x = f.next(x, 0);
        }
        assert_eq!(a, vec![4, 5]);
        assert_eq!(f.verify(), "");
    }

    #[test]
    fn delete_two_child_node() {
        let mut f = BinaryForest::new(5);
        let t1 = f.join(1, 2, 3);
        let root = f.join(t1, 4, 5);
        let new_root = f.delete(4, root);
        let mut order = Vec::new();
        let mut x = f.first(new_root);
        while x != 0 {
            order.push(x);
            x = f.next(x, 0);
        }
        assert_eq!(order, vec![1, 2, 3, 5]);
        assert!(f.singleton(4));
        assert_eq!(f.verify(), "");
    }

    #[test]
    fn to_string_round_trip_structure() {
        let mut f = BinaryForest::new(3);
        f.join(1, 2, 3);
        let s = f.to_string_fmt(fmt_flags::SHOW_STRUCTURE, lbl(&f), |_| None);
        let mut g = BinaryForest::new(3);
        assert!(g.from_string_fmt(&s, |t| crate::top::parse_label(t, 3)));
        assert_eq!(g.find(1), g.find(2));
        assert_eq!(g.left(2), 1);
        assert_eq!(g.right(2), 3);
        assert_eq!(g.verify(), "");
    }

    #[test]
    fn from_string_rejects_duplicate_handle() {
        let mut g = BinaryForest::new(3);
        let ok = g.from_string_fmt("{ [ *( a ) b ( a ) ] }", |t| crate::top::parse_label(t, 3));
        assert!(!ok);
        assert!(g.singleton(1));
    }

    #[test]
    fn expand_preserves_content() {
        let mut f = BinaryForest::new(2);
        f.join(1, 2, 0);
        f.expand(4);
        assert_eq!(f.n(), 4);
        assert_eq!(f.find(1), 2);
        assert!(f.singleton(3));
        assert!(f.singleton(4));
    }

    #[test]
    fn transfer_empties_source() {
        let mut f = BinaryForest::new(2);
        f.join(1, 2, 0);
        let mut g = BinaryForest::new(0);
        g.transfer(&mut f);
        assert_eq!(g.find(1), 2);
        assert_eq!(f.n(), 0);
    }
}
