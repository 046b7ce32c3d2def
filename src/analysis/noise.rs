//! The noise-closure fixed point behind efficiency and distinguishability.
//!
//! Both questions share one loop over a transition graph whose node 0 is
//! the fully-cooperative state:
//!
//! 1. Judge every state that can reach node 0 in the current graph. If all
//!    states are judged, stop: every trajectory funnels back to
//!    cooperation.
//! 2. Otherwise inject "noise" edges (one-bit flips of some player's most
//!    recent action), but only out of **sink** recurrent components, the
//!    places a trajectory can actually be sitting when an implementation
//!    error strikes.
//! 3. If node 0 can now reach a still-unjudged state, stop: a single error
//!    diverges from cooperation permanently. Otherwise repeat from 1.
//!
//! The loop terminates because step 2 only ever adds edges to a graph on a
//! fixed, finite node set: either new states become judged, or the noise
//! injection saturates and one of the two exits fires.
//!
//! Efficiency and distinguishability differ only in the base graph they
//! hand in (self-play vs. play against an unconditional cooperator) and in
//! which exit they read as success.

use log::debug;

use crate::analysis::graph::DirectedGraph;

/// How the noise-closure loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseOutcome {
    /// Every state eventually funnels back to full cooperation, even as
    /// noise edges accumulate. (An *efficient* strategy; an
    /// *indistinguishable* one.)
    FullyRecovers,
    /// A noise edge lets full cooperation reach a state that never returns
    /// to it. (An *inefficient* strategy; a *distinguishable* one.)
    Escapes,
}

/// The fixed-point engine. Owns its graph; one instance per analysis call.
#[derive(Debug)]
pub struct NoiseClosure {
    graph: DirectedGraph,
    masks: Vec<usize>,
}

impl NoiseClosure {
    /// Wrap a base transition graph and the XOR masks describing which
    /// single bits a noise event may flip (one mask per player's most
    /// recent action bit).
    pub fn new(graph: DirectedGraph, masks: &[usize]) -> Self {
        Self {
            graph,
            masks: masks.to_vec(),
        }
    }

    /// Run the loop to one of its two exits.
    pub fn run(mut self) -> NoiseOutcome {
        let n = self.graph.n();
        let mut judged = vec![false; n];
        judged[0] = true;

        loop {
            for l in 0..n {
                if !judged[l] && self.graph.is_reachable(l, 0) {
                    judged[l] = true;
                }
            }
            if judged.iter().all(|&b| b) {
                return NoiseOutcome::FullyRecovers;
            }

            self.inject_noise();

            for l in 0..n {
                if !judged[l] && self.graph.is_reachable(0, l) {
                    return NoiseOutcome::Escapes;
                }
            }
        }
    }

    /// Add the missing noise edges out of every sink recurrent component.
    ///
    /// A component is a sink when no member has a successor outside the
    /// component. Each member gains an edge to each of its one-bit flips,
    /// skipping edges already present.
    fn inject_noise(&mut self) {
        let sinks: Vec<Vec<usize>> = self
            .graph
            .recurrent_components()
            .into_iter()
            .filter(|comp| {
                comp.iter()
                    .all(|&v| self.graph.successors(v).iter().all(|d| comp.contains(d)))
            })
            .collect();
        debug!("injecting noise edges out of {} sink component(s)", sinks.len());

        for sink in sinks {
            for &from in &sink {
                for &mask in &self.masks {
                    let to = from ^ mask;
                    if !self.graph.has_edge(from, to) {
                        self.graph.add_edge(from, to);
                    }
                }
            }
        }
    }
}
