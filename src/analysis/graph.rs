//! Directed graphs over integer node ids, with Tarjan's SCC decomposition.
//!
//! Transition graphs in this crate are tiny (16 to 512 nodes) and built
//! fresh for every analysis call, so the representation favors clarity:
//! a plain adjacency list with ordered successor lists. Duplicate edges are
//! allowed until [`DirectedGraph::dedup_edges`] is called explicitly, and
//! self-loops are legal.

use crate::analysis::union_find::UnionFind;

/// An adjacency-list digraph over nodes `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectedGraph {
    n: usize,
    links: Vec<Vec<usize>>,
}

impl DirectedGraph {
    /// Create a graph with `n` nodes and no edges.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            links: vec![Vec::new(); n],
        }
    }

    /// Number of nodes.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Successor list of `node`, in insertion order.
    pub fn successors(&self, node: usize) -> &[usize] {
        &self.links[node]
    }

    /// Add the edge `from -> to`.
    ///
    /// # Panics
    /// Panics if either endpoint is out of range; edges are only ever added
    /// by code that enumerates valid state ids, so an invalid index is a
    /// programming error.
    pub fn add_edge(&mut self, from: usize, to: usize) {
        assert!(
            from < self.n && to < self.n,
            "invalid edge: {} -> {}",
            from,
            to
        );
        self.links[from].push(to);
    }

    /// Whether the edge `from -> to` is present.
    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.links[from].contains(&to)
    }

    /// Total number of edges, duplicates included.
    pub fn edge_count(&self) -> usize {
        self.links.iter().map(Vec::len).sum()
    }

    /// Drop duplicate successors, keeping first occurrences in order.
    pub fn dedup_edges(&mut self) {
        for succs in &mut self.links {
            let mut seen = vec![false; self.n];
            succs.retain(|&t| {
                let keep = !seen[t];
                seen[t] = true;
                keep
            });
        }
    }

    /// Visit every edge as `(from, to)`, in node order then insertion order.
    pub fn for_each_edge<F: FnMut(usize, usize)>(&self, mut f: F) {
        for from in 0..self.n {
            for &to in &self.links[from] {
                f(from, to);
            }
        }
    }

    /// Nodes having an edge into `node`.
    pub fn predecessors(&self, node: usize) -> Vec<usize> {
        let mut ans = Vec::new();
        self.for_each_edge(|i, j| {
            if j == node {
                ans.push(i);
            }
        });
        ans
    }

    /// Depth-first traversal from `start`, visiting each reachable node
    /// once in discovery order.
    pub fn dfs<F: FnMut(usize)>(&self, start: usize, mut visit: F) {
        let mut seen = vec![false; self.n];
        self.dfs_impl(start, &mut seen, &mut visit);
    }

    fn dfs_impl<F: FnMut(usize)>(&self, v: usize, seen: &mut [bool], visit: &mut F) {
        visit(v);
        seen[v] = true;
        for &w in &self.links[v] {
            if !seen[w] {
                self.dfs_impl(w, seen, visit);
            }
        }
    }

    /// Whether `to` is reachable from `from`. A node trivially reaches
    /// itself.
    pub fn is_reachable(&self, from: usize, to: usize) -> bool {
        let mut found = false;
        self.dfs(from, |v| {
            if v == to {
                found = true;
            }
        });
        found
    }

    /// The recurrent components: strongly connected components of size two
    /// or more, plus size-one components that carry a self-loop.
    ///
    /// These are exactly the node sets a trajectory can stay in forever;
    /// a singleton without a self-loop is only ever passed through.
    pub fn recurrent_components(&self) -> Vec<Vec<usize>> {
        let sccs = SccFinder::new(self).strongly_connected_components();
        let mut out: Vec<Vec<usize>> = Vec::new();
        let mut loners: Vec<usize> = Vec::new();
        for scc in sccs {
            if scc.len() > 1 {
                out.push(scc);
            } else if self.has_edge(scc[0], scc[0]) {
                loners.push(scc[0]);
            }
        }
        out.extend(loners.into_iter().map(|v| vec![v]));
        out
    }

    /// Nodes belonging to no recurrent component.
    pub fn transient_nodes(&self) -> Vec<usize> {
        let mut recurrent = vec![false; self.n];
        for comp in self.recurrent_components() {
            for v in comp {
                recurrent[v] = true;
            }
        }
        (0..self.n).filter(|&v| !recurrent[v]).collect()
    }

    /// Nodes belonging to some recurrent component.
    pub fn recurrent_nodes(&self) -> Vec<usize> {
        self.recurrent_components().into_iter().flatten().collect()
    }

    /// The graph containing exactly the edges present in both inputs.
    ///
    /// # Panics
    /// Panics if the node counts differ.
    pub fn common_subgraph(g1: &DirectedGraph, g2: &DirectedGraph) -> DirectedGraph {
        assert_eq!(g1.n, g2.n, "graphs must have the same node count");
        let mut g = DirectedGraph::new(g1.n);
        g1.for_each_edge(|i, j| {
            if g2.has_edge(i, j) {
                g.add_edge(i, j);
            }
        });
        g
    }

    /// Quotient of this graph under a partition: every edge is projected
    /// onto the class representatives and duplicates are removed.
    pub fn quotient(&self, partition: &mut UnionFind) -> DirectedGraph {
        let mut g = DirectedGraph::new(self.n);
        for from in 0..self.n {
            for idx in 0..self.links[from].len() {
                let to = self.links[from][idx];
                let (ri, rj) = (partition.root(from), partition.root(to));
                g.add_edge(ri, rj);
            }
        }
        g.dedup_edges();
        g
    }
}

/// Tarjan's strongly-connected-component finder.
///
/// A single depth-first traversal maintains a discovery index, a low-link
/// value, and an explicit stack with an on-stack flag per node. A node
/// whose low-link equals its own discovery index closes a component: the
/// stack is popped down to and including it. Runs in `O(V + E)` and returns
/// every component, singletons included.
pub struct SccFinder<'a> {
    g: &'a DirectedGraph,
    t: usize,
    desc: Vec<Option<usize>>,
    low: Vec<usize>,
    stack: Vec<usize>,
    on_stack: Vec<bool>,
    sccs: Vec<Vec<usize>>,
}

impl<'a> SccFinder<'a> {
    /// Prepare a finder for `graph`.
    pub fn new(graph: &'a DirectedGraph) -> Self {
        Self {
            g: graph,
            t: 0,
            desc: vec![None; graph.n()],
            low: vec![0; graph.n()],
            stack: Vec::new(),
            on_stack: vec![false; graph.n()],
            sccs: Vec::new(),
        }
    }

    /// Decompose the graph into its strongly connected components.
    ///
    /// Deterministic: components are emitted in the order they close
    /// during the traversal, members in pop order.
    pub fn strongly_connected_components(mut self) -> Vec<Vec<usize>> {
        for v in 0..self.g.n() {
            if self.desc[v].is_none() {
                self.strong_connect(v);
            }
        }
        self.sccs
    }

    fn strong_connect(&mut self, v: usize) {
        self.desc[v] = Some(self.t);
        self.low[v] = self.t;
        self.t += 1;

        self.stack.push(v);
        self.on_stack[v] = true;

        for idx in 0..self.g.successors(v).len() {
            let w = self.g.successors(v)[idx];
            match self.desc[w] {
                None => {
                    self.strong_connect(w);
                    if self.low[w] < self.low[v] {
                        self.low[v] = self.low[w];
                    }
                }
                Some(dw) => {
                    if self.on_stack[w] && dw < self.low[v] {
                        self.low[v] = dw;
                    }
                }
            }
        }

        // v is a component root: pop the stack down to it
        if self.low[v] == self.desc[v].unwrap() {
            let mut scc = Vec::new();
            loop {
                let w = self.stack.pop().unwrap();
                self.on_stack[w] = false;
                scc.push(w);
                if w == v {
                    break;
                }
            }
            self.sccs.push(scc);
        }
    }
}
