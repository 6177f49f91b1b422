/*! Two-level partitioned heap: groups of [`OrderedHeaps`] subheaps, tracked by [`ArrayHeap`]

# About
A `PartitionedHeap` splits its items into `hn` named groups, each a standalone
`OrderedHeaps` subheap (`top[g]`). Only *active* groups compete for the global minimum;
their current minimum keys live in a small `ArrayHeap` so that `findmin` across active
groups is `O(log hn)` rather than `O(hn)`. Bulk `add2keys` across every active group is
O(1): it only bumps the `ArrayHeap`'s own offset, and each group's subheap catches up
lazily (`updateKeys`) the next time that group is actually touched — the same deferred-delta
trick `ArrayHeap` itself uses internally, one level up.
*/

use crate::heaps::array_heap::ArrayHeap;
use crate::heaps::ordered_heap::OrderedHeaps;
use crate::top::{label, parse_label, Index};
use std::fmt::Write as _;

#[derive(Debug, Clone)]
pub struct PartitionedHeap {
    oh: OrderedHeaps,
    ah: ArrayHeap,
    top: Vec<Index>,
    active: Vec<bool>,
    last_offset: Vec<f64>,
    hn: usize,
}

impl PartitionedHeap {
    /// `n` node handles across all groups' subheaps; `hn` groups (`1..=hn`); `d`-ary the
    /// internal `ArrayHeap` of active groups.
    pub fn new(n: usize, hn: usize, d: usize) -> Self {
        PartitionedHeap {
            oh: OrderedHeaps::new(n),
            ah: ArrayHeap::new(hn, d),
            top: vec![0; hn + 1],
            active: vec![false; hn + 1],
            last_offset: vec![0.0; hn + 1],
            hn,
        }
    }

    pub fn hn(&self) -> usize {
        self.hn
    }

    pub fn top(&self, g: Index) -> Index {
        self.top[g]
    }

    pub fn is_active(&self, g: Index) -> bool {
        self.active[g]
    }

    /// Observable key of item `i`, assumed to currently live in group `g`.
    pub fn key(&self, i: Index, g: Index) -> f64 {
        self.oh.key(i, self.top[g])
    }

    /// Applies group `g`'s deferred `ArrayHeap`-offset delta to its subheap, if active.
    fn update_keys(&mut self, g: Index) {
        if self.active[g] {
            let delta = self.ah.offset() - self.last_offset[g];
            self.oh.add2keys(delta, self.top[g]);
            self.last_offset[g] = self.ah.offset();
        }
    }

    /// Activates group `g`: requires a nonempty subheap. Inserts `g` into the `ArrayHeap`
    /// keyed by the group's current minimum.
    pub fn activate(&mut self, g: Index) {
        assert!(self.top[g] != 0, "Error: PartitionedHeap::activate: group {g} is empty");
        assert!(!self.active[g], "Error: PartitionedHeap::activate: group {g} already active");
        self.last_offset[g] = self.ah.offset();
        let m = self.oh.key(self.oh.findmin(self.top[g]), self.top[g]);
        self.ah.insert(g, m);
        self.active[g] = true;
    }

    /// Deactivates group `g` after propagating its deferred delta one last time.
    pub fn deactivate(&mut self, g: Index) {
        assert!(self.active[g], "Error: PartitionedHeap::deactivate: group {g} not active");
        self.update_keys(g);
        self.ah.delete(g);
        self.active[g] = false;
    }

    /// The globally minimum item across active groups, or `0` if none are active.
    pub fn findmin(&mut self) -> Index {
        let g = self.ah.findmin();
        if g == 0 {
            return 0;
        }
        self.update_keys(g);
        self.oh.findmin(self.top[g])
    }

    /// Shifts every active group's observable keys by `delta`, in O(1).
    pub fn add2keys(&mut self, delta: f64) {
        self.ah.add2keys(delta);
    }

    /// Inserts fresh singleton `i` immediately after `j` in group `g`'s list, with
    /// observable key `k`.
    pub fn insert_after(&mut self, i: Index, g: Index, k: f64, j: Index) {
        self.update_keys(g);
        self.top[g] = self.oh.insert_after(i, j, k, self.top[g]);
        if self.active[g] && k < self.ah.key(g) {
            self.ah.changekey(g, k);
        }
    }

    /// Removes item `i` from group `g`.
    pub fn delete(&mut self, i: Index, g: Index) {
        self.update_keys(g);
        self.top[g] = self.oh.delete(i, self.top[g]);
        if self.active[g] {
            if self.top[g] == 0 {
                self.deactivate(g);
            } else {
                let m = self.oh.key(self.oh.findmin(self.top[g]), self.top[g]);
                if m != self.ah.key(g) {
                    self.ah.changekey(g, m);
                }
            }
        }
    }

    /// Splits group `g` at item `i` into `g` (everything before `i`) and fresh group `g0`
    /// (`i` onward). `g0` must currently be empty and inactive. If `g` was active, both
    /// surviving non-empty halves are reactivated — a divide shouldn't silently drop a
    /// group's items out of global-minimum consideration, and a fresh group id carries no
    /// independent activation state of its own to preserve instead.
    pub fn divide(&mut self, g: Index, i: Index, g0: Index) {
        assert!(
            self.top[g0] == 0 && !self.active[g0],
            "Error: PartitionedHeap::divide: target group {g0} is not empty"
        );
        let was_active = self.active[g];
        if was_active {
            self.update_keys(g);
            self.deactivate(g);
        }
        let (before, after) = self.oh.divide(i, self.top[g]);
        self.top[g] = before;
        self.top[g0] = after;
        if was_active {
            if self.top[g] != 0 {
                self.activate(g);
            }
            if self.top[g0] != 0 {
                self.activate(g0);
            }
        }
    }

    pub fn clear(&mut self) {
        self.oh.clear();
        self.ah = ArrayHeap::new(self.hn, 2);
        self.top.iter_mut().for_each(|t| *t = 0);
        self.active.iter_mut().for_each(|a| *a = false);
        self.last_offset.iter_mut().for_each(|o| *o = 0.0);
    }

    /// `{ G1 G2 … }`, each `Gi` rendered `gid[@][!][ label:key … ]` (`SPEC_FULL.md` §6):
    /// `@` marks an active group, `!` marks whichever currently holds the global minimum.
    pub fn to_string(&mut self) -> String {
        let min_group = self.ah.findmin();
        let mut s = String::from("{");
        for g in 1..=self.hn {
            s.push(' ');
            s.push_str(&label(g, self.hn));
            if self.active[g] {
                s.push('@');
            }
            if g == min_group {
                s.push('!');
            }
            s.push_str(" [");
            let mut x = self.oh.first(self.top[g]);
            while x != 0 {
                s.push(' ');
                let _ = write!(s, "{}:{}", label(x, self.oh.n()), self.oh.key(x, self.top[g]));
                x = self.oh.next(x, self.top[g]);
            }
            s.push_str(" ]");
        }
        s.push_str(" }");
        s
    }

    /// Parses the format `to_string` emits. The `!` (global-minimum) flag is accepted but
    /// not independently verified — it's derivable from the active groups' keys, so a
    /// stale flag doesn't make the text malformed, only redundant.
    pub fn from_string(&mut self, s: &str) -> bool {
        let words: Vec<&str> = s.split_whitespace().collect();
        if words.first() != Some(&"{") || words.last() != Some(&"}") {
            self.clear();
            return false;
        }
        let mut groups: Vec<(Index, bool, Vec<(Index, f64)>)> = Vec::new();
        let mut seen = vec![false; self.hn + 1];
        let mut i = 1;
        let end = words.len() - 1;
        while i < end {
            let mut head = words[i];
            i += 1;
            head = head.strip_suffix('!').unwrap_or(head);
            let (gid_tok, active) = match head.strip_suffix('@') {
                Some(rest) => (rest, true),
                None => (head, false),
            };
            let g = match parse_label(gid_tok, self.hn) {
                Some(g) if g != 0 && g <= self.hn && !seen[g] => g,
                _ => {
                    self.clear();
                    return false;
                }
            };
            seen[g] = true;
            if words.get(i) != Some(&"[") {
                self.clear();
                return false;
            }
            i += 1;
            let mut items = Vec::new();
            loop {
                match words.get(i) {
                    Some(&"]") => {
                        i += 1;
                        break;
                    }
                    Some(tok) => {
                        i += 1;
                        let mut parts = tok.splitn(2, ':');
                        let lbl = match parts.next() {
                            Some(l) => l,
                            None => {
                                self.clear();
                                return false;
                            }
                        };
                        let k: f64 = match parts.next().and_then(|v| v.parse().ok()) {
                            Some(k) => k,
                            None => {
                                self.clear();
                                return false;
                            }
                        };
                        let u = match parse_label(lbl, self.oh.n()) {
                            Some(u) if u != 0 => u,
                            _ => {
                                self.clear();
                                return false;
                            }
                        };
                        items.push((u, k));
                    }
                    None => {
                        self.clear();
                        return false;
                    }
                }
            }
            groups.push((g, active, items));
        }

        self.clear();
        for (g, active, items) in groups {
            let mut root = 0;
            let mut prev = 0;
            for (u, k) in items {
                root = self.oh.insert_after(u, prev, k, root);
                prev = u;
            }
            self.top[g] = root;
            if active {
                if root == 0 {
                    self.clear();
                    return false;
                }
                self.activate(g);
            }
        }
        true
    }

    pub fn verify(&self) -> String {
        let base = self.oh.verify();
        if !base.is_empty() {
            return base;
        }
        let base2 = self.ah.verify();
        if !base2.is_empty() {
            return base2;
        }
        for g in 1..=self.hn {
            if self.active[g] {
                let m = self.oh.findmin(self.top[g]);
                if m == 0 {
                    return format!("group {g}: active but empty");
                }
                let deferred = self.ah.offset() - self.last_offset[g];
                let observable = self.oh.key(m, self.top[g]) + deferred;
                if (observable - self.ah.key(g)).abs() > f64::EPSILON {
                    return format!("group {g}: ArrayHeap key stale");
                }
            } else if self.ah.contains(g) {
                return format!("group {g}: inactive but present in the active-group heap");
            }
        }
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_scenario() {
        // mirrors the concrete scenario in SPEC_FULL.md §8
        let mut ph = PartitionedHeap::new(10, 4, 2);
        // group 1: min 5; group 2: min 3; group 3: min 7
        ph.top[1] = ph.oh.insert_after(1, 0, 5.0, 0);
        ph.top[2] = ph.oh.insert_after(2, 0, 3.0, 0);
        ph.top[3] = ph.oh.insert_after(3, 0, 7.0, 0);
        ph.activate(1);
        ph.activate(2);
        ph.activate(3);
        assert_eq!(ph.verify(), "");
        assert_eq!(ph.findmin(), 2);
        assert_eq!(ph.key(2, 2), 3.0);

        ph.add2keys(4.0);
        assert_eq!(ph.verify(), "");
        let m = ph.findmin();
        assert_eq!(m, 2);
        assert_eq!(ph.key(2, 2), 7.0);

        ph.deactivate(2);
        assert_eq!(ph.verify(), "");
        let m = ph.findmin();
        assert_eq!(m, 1);
        assert_eq!(ph.key(1, 1), 9.0);

        // divide group 1 before its minimum item (1) into group 4: group 1 is now empty
        // of everything preceding item 1 (nothing), so item 1 itself moves wholesale
        ph.divide(1, 1, 4);
        assert_eq!(ph.verify(), "");
        let m = ph.findmin();
        assert_eq!(m, 1);
        assert_eq!(ph.key(1, 4), 9.0);
    }

    #[test]
    fn round_trip_through_text_format() {
        let mut ph = PartitionedHeap::new(6, 2, 2);
        ph.top[1] = ph.oh.insert_after(1, 0, 5.0, 0);
        ph.top[1] = ph.oh.insert_after(2, 1, 2.0, ph.top[1]);
        ph.top[2] = ph.oh.insert_after(3, 0, 8.0, 0);
        ph.activate(1);
        let text = ph.to_string();
        let mut ph2 = PartitionedHeap::new(6, 2, 2);
        assert!(ph2.from_string(&text));
        assert_eq!(ph2.verify(), "");
        assert!(ph2.is_active(1));
        assert!(!ph2.is_active(2));
        assert_eq!(ph2.findmin(), ph.findmin());
    }
}
