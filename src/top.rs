/*! The handle-range base shared by every structure in this crate

# About
Every structure in this crate (forests, balanced trees, the heap family) indexes its
nodes by a plain, non-zero `usize` handle drawn from `1..=n`. `0` is the universal null
sentinel: "no parent", "no child", "empty tree". `Top` is the small, copyable value that
owns `n` and knows how to validate a handle and format it for the textual serialization
grammar shared by every component (`§6` of the spec).

# Design
Handles are deliberately plain `usize`, not `Option<usize>`: the packed-array
representation used throughout this crate (`§3`, "parallel fixed-width integer arrays")
relies on `0` being a cheap, `memset`-friendly default, and on arithmetic like
`parent[u] > 0` reading directly as "is a non-root". Wrapping every handle in `Option`
would cost a discriminant per slot for no benefit: the sentinel already *is* the
discriminant.
*/

/// A non-zero handle in `1..=n`. `0` is reserved as the null sentinel and is never a
/// valid `Index`.
pub type Index = usize;

/// The null handle.
pub const NULL: Index = 0;

/// Owns the active size `n` of an index range `1..=n` and validates handles against it.
///
/// `Top` does not own any arrays itself — every structure built on top of it embeds a
/// `Top` (or just an `n: usize` field with the same contract) alongside its own parallel
/// arrays, sized to some capacity `>= n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Top {
    n: usize,
}

impl Top {
    /// Creates a new range `1..=n`.
    pub fn new(n: usize) -> Self {
        Top { n }
    }

    /// The current size of the index range.
    pub fn n(&self) -> usize {
        self.n
    }

    /// True for any handle in `1..=n`. `0` (the null sentinel) is never valid.
    pub fn valid(&self, i: Index) -> bool {
        i >= 1 && i <= self.n
    }

    /// Precondition check used throughout the crate: panics with a message naming the
    /// offending handle if it is not in `1..=n`. Mirrors the teacher idiom of a
    /// descriptive `.expect(...)` at the one point where a corrupted index would
    /// otherwise panic obscurely deep inside a `Vec` index operation.
    pub fn assert_valid(&self, i: Index, what: &str) {
        assert!(
            self.valid(i),
            "Error: invalid handle {i} for {what} (n={})",
            self.n
        );
    }

    /// Grows the range to `n_prime`, following the capacity growth policy of `SPEC_FULL.md`
    /// §11: callers that actually need new array storage should grow their backing `Vec`s to
    /// `new_capacity`, not just `n_prime`.
    pub fn new_capacity(current_capacity: usize, requested: usize) -> usize {
        const GROWTH_FACTOR: f64 = 1.5;
        let grown = (current_capacity as f64 * GROWTH_FACTOR) as usize;
        requested.max(grown).max(requested)
    }

    /// Resets the range to a new size, discarding no information about `n` itself (callers
    /// own the arrays and must truncate/reinitialize them separately).
    pub fn reset(&mut self, n: usize) {
        self.n = n;
    }
}

/// Formats a handle as the node label used by every `to_string` implementation in this
/// crate (`§6`): lower-case letters `a..=z` when `n <= 26`, decimal digits otherwise.
/// `0` formats as `-` (the "empty subtree" token) only where the caller explicitly wants
/// that; most call sites special-case `0` themselves, so this function is not called
/// with `0` in the common path.
pub fn label(i: Index, n: usize) -> String {
    if i == 0 {
        return "-".to_string();
    }
    if n <= 26 && i <= 26 {
        let c = (b'a' + (i - 1) as u8) as char;
        c.to_string()
    } else {
        i.to_string()
    }
}

/// Parses a node label produced by [`label`] back into a handle, given the same `n` used
/// to format it. Returns `None` on anything that isn't a valid label for that `n`.
pub fn parse_label(s: &str, n: usize) -> Option<Index> {
    if s.is_empty() {
        return None;
    }
    if n <= 26 {
        let mut chars = s.chars();
        let c = chars.next()?;
        if chars.next().is_some() || !c.is_ascii_lowercase() {
            return None;
        }
        let i = (c as u8 - b'a' + 1) as usize;
        if i >= 1 && i <= n {
            return Some(i);
        }
        None
    } else {
        let i: usize = s.parse().ok()?;
        if i >= 1 && i <= n {
            Some(i)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_range() {
        let top = Top::new(5);
        assert!(!top.valid(0));
        assert!(top.valid(1));
        assert!(top.valid(5));
        assert!(!top.valid(6));
    }

    #[test]
    fn label_round_trip_letters() {
        for i in 1..=26 {
            let s = label(i, 26);
            assert_eq!(parse_label(&s, 26), Some(i));
        }
    }

    #[test]
    fn label_round_trip_numbers() {
        for i in [1, 27, 100, 999] {
            let s = label(i, 1000);
            assert_eq!(parse_label(&s, 1000), Some(i));
        }
    }

    #[test]
    #[should_panic]
    fn assert_valid_panics_on_zero() {
        Top::new(5).assert_valid(0, "test");
    }
}
