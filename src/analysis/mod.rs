//! The automaton analysis engine.
//!
//! Everything in this module is independent of the player-count/memory
//! configuration: algorithms operate on plain integer node ids, and any
//! domain knowledge (which action a node carries, which nodes a one-bit
//! error reaches) comes in through closures or pre-built graphs supplied by
//! the caller.
//!
//! # Components
//!
//! - [`UnionFind`]: disjoint sets with path compression; the partition
//!   representation used by the minimizer.
//! - [`DirectedGraph`] / [`SccFinder`]: adjacency-list digraph with
//!   Tarjan's strongly-connected-component decomposition and depth-first
//!   reachability.
//! - [`PayoffMatrix`]: min-plus (tropical) all-pairs relaxation used to
//!   detect exploitable negative cycles.
//! - [`NoiseClosure`]: the fixed-point loop that repeatedly injects
//!   one-bit "noise" edges out of sink components and re-tests
//!   reachability of full cooperation.
//! - [`minimize_dfa`] / [`coarsen_greedy`]: partition-refinement automaton
//!   minimization and its bottom-up greedy formulation, plus the
//!   renderer-facing [`MinimizedAutomaton`] export.
//!
//! Each analysis entry point owns its graph for the duration of one call;
//! nothing here shares mutable state across calls.

pub mod graph;
pub mod minimize;
pub mod noise;
pub mod payoff;
pub mod union_find;

// Re-export main types for convenient access
pub use graph::{DirectedGraph, SccFinder};
pub use minimize::{
    coarsen_greedy, minimize_dfa, minimize_dfa_with_noise, LabeledEdge, MinimizedAutomaton,
    StateClass,
};
pub use noise::{NoiseClosure, NoiseOutcome};
pub use payoff::PayoffMatrix;
pub use union_find::UnionFind;
