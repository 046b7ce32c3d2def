//! Disjoint-set (union-find) partitions over integer node ids.
//!
//! The minimizer leans on one specific behavior here: when two classes
//! merge, the **smaller** root id becomes the representative of the merged
//! class. Output labeling (which id names a class in the minimized
//! automaton) depends on that tie-break, so it is part of the contract, not
//! an implementation detail.

use std::collections::BTreeMap;

/// A partition of `0..n` into disjoint equivalence classes.
///
/// Freshly constructed, every node is its own class. Classes are combined
/// with [`merge`](UnionFind::merge) and queried through
/// [`root`](UnionFind::root); the representative of a class is always the
/// smallest id ever merged into it.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    /// Create the discrete partition over `0..n`.
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    /// Number of nodes in the partition (not the number of classes).
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Whether the partition covers zero nodes.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Representative of the class containing `i`.
    ///
    /// Iterative find with full path compression: a first pass walks to the
    /// root, a second pass repoints every node on the walk directly at it.
    pub fn root(&mut self, i: usize) -> usize {
        let mut r = i;
        while self.parent[r] != r {
            r = self.parent[r];
        }
        let mut j = i;
        while self.parent[j] != r {
            let next = self.parent[j];
            self.parent[j] = r;
            j = next;
        }
        r
    }

    /// Merge the classes containing `i` and `j`.
    ///
    /// Returns `false` if they were already the same class. The smaller of
    /// the two roots becomes the representative of the merged class.
    pub fn merge(&mut self, i: usize, j: usize) -> bool {
        let ri = self.root(i);
        let rj = self.root(j);
        if ri == rj {
            return false;
        }
        let (keep, absorb) = if ri < rj { (ri, rj) } else { (rj, ri) };
        self.parent[absorb] = keep;
        true
    }

    /// Whether `i` and `j` are currently in the same class.
    pub fn same(&mut self, i: usize, j: usize) -> bool {
        self.root(i) == self.root(j)
    }

    /// Materialize the partition as representative -> sorted members.
    pub fn to_map(&mut self) -> BTreeMap<usize, Vec<usize>> {
        let mut map: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..self.parent.len() {
            let r = self.root(i);
            map.entry(r).or_default().push(i);
        }
        map
    }

    /// Sorted list of class representatives.
    pub fn roots(&mut self) -> Vec<usize> {
        self.to_map().into_keys().collect()
    }
}
