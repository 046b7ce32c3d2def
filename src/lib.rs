//! # Strategy Automata
//!
//! Analysis of deterministic finite-state strategies for repeated
//! multi-player games with binary actions (cooperate/defect).
//!
//! A strategy is a total function from a bounded action history to the next
//! action. This crate answers the classic questions about such a strategy:
//!
//! - **Defensible**: can a defecting co-player ever build an unbounded
//!   payoff advantage against it?
//! - **Efficient**: does self-play recover full cooperation after any
//!   single implementation error?
//! - **Distinguishable**: can a one-bit perturbation eventually tell the
//!   strategy apart from an unconditional cooperator?
//! - **Minimal form**: what is the smallest automaton with identical
//!   action/transition behavior?
//!
//! ## Quick Start
//!
//! ```
//! use strategy_automata::games::n2m2::Strategy;
//!
//! // Win-stay lose-shift, encoded over the 16 memory-2 histories
//! let wsls: Strategy = "cdcddcdccdcddcdc".parse().unwrap();
//!
//! assert!(!wsls.is_defensible());
//! assert!(wsls.is_efficient());
//! assert!(wsls.is_distinguishable());
//!
//! let (mut partition, _) = wsls.minimize_dfa();
//! assert_eq!(partition.roots(), vec![0, 1]);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                  Analysis Engine (generic)                │
//! │  - Tarjan SCC            - min-plus shortest paths        │
//! │  - noise-closure loop    - partition-refinement minimizer │
//! └───────────────────────────────────────────────────────────┘
//!                             │
//!                             │ consumes node ids + labelers
//!                             ▼
//!         ┌───────────────────┼───────────────────┐
//!         ▼                   ▼                   ▼
//!    ┌─────────┐         ┌─────────┐         ┌─────────┐
//!    │  n2m2   │         │  n3m2   │         │  n3m3   │
//!    │ 16 st.  │         │ 64 st.  │         │ 512 st. │
//!    └─────────┘         └─────────┘         └─────────┘
//! ```
//!
//! The engine in [`analysis`] works on integer node ids and caller-supplied
//! label closures; the configuration modules in [`games`] own the state
//! codecs and strategy tables and drive the engine.
//!
//! The core performs no I/O. Diagnostics (the co-player asymmetry caveat,
//! shortest-path progress) go through the [`log`] facade; install a logger
//! to observe them.

#![warn(missing_docs)]

/// Configuration-independent analysis algorithms.
///
/// Graphs, strongly connected components, union-find partitions, the
/// min-plus payoff relaxation, the noise-closure fixed point, and DFA
/// minimization.
pub mod analysis;

/// Concrete player/memory configurations.
///
/// State codecs and strategy tables for the supported configurations,
/// together with the per-configuration analysis entry points.
pub mod games;

// Re-export the types every caller touches at the crate root
pub use analysis::{DirectedGraph, MinimizedAutomaton, UnionFind};
pub use games::{Action, StrategyError};
