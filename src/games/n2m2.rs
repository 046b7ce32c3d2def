//! Two players, memory two: the 16-state configuration.
//!
//! A state is the joint history `(a₂ a₁ b₂ b₁)`: the focal player's and
//! the co-player's actions two rounds ago and one round ago. Ids pack the
//! bits big-endian with the oldest lag of the focal player highest, so
//! `"cccc"` is 0 and `"dddd"` is 15. A strategy assigns one action to each
//! of the 16 states and is written as a 16-character `c`/`d` string in id
//! order.

use std::fmt;
use std::str::FromStr;

use crate::analysis::graph::DirectedGraph;
use crate::analysis::minimize;
use crate::analysis::minimize::MinimizedAutomaton;
use crate::analysis::noise::{NoiseClosure, NoiseOutcome};
use crate::analysis::payoff::PayoffMatrix;
use crate::analysis::union_find::UnionFind;
use crate::games::{parse_actions, Action, StrategyError};

/// Number of states: 2^(2 players × 2 rounds).
pub const NUM_STATES: usize = 16;

/// XOR masks flipping each player's most recent action bit (a₁, b₁).
const NOISE_MASKS: [usize; 2] = [4, 1];

/// Joint last-round action profile of a state, `"{a₁}{b₁}"`.
///
/// This is the label the minimizer compares: its first character is the
/// action the focal player took entering the state.
pub fn last_round_profile(id: usize) -> String {
    format!(
        "{}{}",
        Action::from_bit(id >> 2),
        Action::from_bit(id)
    )
}

/// One of the 16 joint histories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct State {
    /// Focal player's action two rounds ago.
    pub a_2: Action,
    /// Focal player's action last round.
    pub a_1: Action,
    /// Co-player's action two rounds ago.
    pub b_2: Action,
    /// Co-player's action last round.
    pub b_1: Action,
}

impl State {
    /// Assemble a state from its four actions.
    pub fn new(a_2: Action, a_1: Action, b_2: Action, b_1: Action) -> State {
        State { a_2, a_1, b_2, b_1 }
    }

    /// Decode a canonical id; fails for ids outside `[0, 16)`.
    pub fn from_id(id: usize) -> Result<State, StrategyError> {
        if id >= NUM_STATES {
            return Err(StrategyError::StateOutOfRange {
                id,
                num_states: NUM_STATES,
            });
        }
        Ok(Self::decode(id))
    }

    /// Decode an id known to be in range.
    pub(crate) fn decode(id: usize) -> State {
        debug_assert!(id < NUM_STATES);
        State {
            a_2: Action::from_bit(id >> 3),
            a_1: Action::from_bit(id >> 2),
            b_2: Action::from_bit(id >> 1),
            b_1: Action::from_bit(id),
        }
    }

    /// Canonical id: big-endian bit packing, `a₂` highest.
    pub fn id(&self) -> usize {
        (self.a_2.bit() << 3) | (self.a_1.bit() << 2) | (self.b_2.bit() << 1) | self.b_1.bit()
    }

    /// The state after both players act: lags shift forward by one round.
    pub fn next_state(&self, act_a: Action, act_b: Action) -> State {
        State::new(self.a_1, act_a, self.b_1, act_b)
    }

    /// The state one round earlier, given the actions that were dropped
    /// from memory.
    pub fn prev_state(&self, act_a: Action, act_b: Action) -> State {
        State::new(act_a, self.a_2, act_b, self.b_2)
    }

    /// All four states that could have preceded this one.
    pub fn possible_prev_states(&self) -> [State; 4] {
        [
            self.prev_state(Action::C, Action::C),
            self.prev_state(Action::C, Action::D),
            self.prev_state(Action::D, Action::C),
            self.prev_state(Action::D, Action::D),
        ]
    }

    /// The same history as the co-player sees it (roles swapped).
    pub fn coplayer_view(&self) -> State {
        State::new(self.b_2, self.b_1, self.a_2, self.a_1)
    }

    /// Focal player's last-round payoff relative to the co-player:
    /// 0 on agreement, −1 when exploited, +1 when exploiting.
    pub fn relative_payoff(&self) -> i32 {
        match (self.a_1, self.b_1) {
            (Action::C, Action::D) => -1,
            (Action::D, Action::C) => 1,
            _ => 0,
        }
    }
}

impl FromStr for State {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let acts = parse_actions(s, 4)?;
        Ok(State::new(acts[0], acts[1], acts[2], acts[3]))
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}{}", self.a_2, self.a_1, self.b_2, self.b_1)
    }
}

/// A lookup key for a strategy, one variant per accepted input shape.
///
/// Conversion to the canonical state happens here, at the boundary, so the
/// lookup itself never inspects argument shapes.
#[derive(Debug, Clone, Copy)]
pub enum StateKey<'a> {
    /// A canonical state id.
    Id(usize),
    /// A 4-character `c`/`d` history string.
    Bits(&'a str),
    /// An already-decoded state.
    State(State),
}

impl StateKey<'_> {
    fn canonical(self) -> Result<State, StrategyError> {
        match self {
            StateKey::Id(id) => State::from_id(id),
            StateKey::Bits(s) => s.parse(),
            StateKey::State(s) => Ok(s),
        }
    }
}

/// A deterministic memory-two strategy for the two-player game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    actions: [Action; NUM_STATES],
}

impl Strategy {
    /// Build a strategy from its full action table, indexed by state id.
    pub fn new(actions: [Action; NUM_STATES]) -> Strategy {
        Strategy { actions }
    }

    /// The strategy playing `act` in every state.
    pub fn always(act: Action) -> Strategy {
        Strategy {
            actions: [act; NUM_STATES],
        }
    }

    /// The action prescribed in `state`.
    pub fn action(&self, state: State) -> Action {
        self.actions[state.id()]
    }

    /// The action for any accepted key shape; fails at the boundary if the
    /// key does not name a state.
    pub fn action_for(&self, key: StateKey<'_>) -> Result<Action, StrategyError> {
        Ok(self.action(key.canonical()?))
    }

    /// Overwrite the action in one state (for hand-patched variants).
    pub fn modify_action(&mut self, state: State, act: Action) {
        self.actions[state.id()] = act;
    }

    /// The strategy table packed into a 16-bit integer, state 0 lowest.
    pub fn packed(&self) -> u64 {
        self.actions
            .iter()
            .enumerate()
            .map(|(idx, act)| (act.bit() as u64) << idx)
            .sum()
    }

    /// Both successors consistent with the strategy's own action and a
    /// free co-player choice.
    pub fn possible_next_states(&self, state: State) -> [State; 2] {
        let act_a = self.action(state);
        [
            state.next_state(act_a, Action::C),
            state.next_state(act_a, Action::D),
        ]
    }

    /// The successor when the co-player follows `coplayer`.
    pub fn next_state_with(&self, state: State, coplayer: &Strategy) -> State {
        let act_a = self.action(state);
        let act_b = coplayer.action(state.coplayer_view());
        state.next_state(act_a, act_b)
    }

    /// The successor under self-play.
    pub fn next_state_with_self(&self, state: State) -> State {
        self.next_state_with(state, self)
    }

    /// The nondeterministic transition graph: own action fixed, co-player
    /// free; two edges per node.
    pub fn transition_graph(&self) -> DirectedGraph {
        let mut g = DirectedGraph::new(NUM_STATES);
        for i in 0..NUM_STATES {
            for next in self.possible_next_states(State::decode(i)) {
                g.add_edge(i, next.id());
            }
        }
        g
    }

    /// As [`transition_graph`](Strategy::transition_graph), but with the
    /// focal player's prescribed action mis-executed in every state. Input
    /// to the noise-tolerant minimizer.
    pub fn transition_graph_with_flipped_action(&self) -> DirectedGraph {
        let mut g = DirectedGraph::new(NUM_STATES);
        for i in 0..NUM_STATES {
            let s = State::decode(i);
            let act_a = self.action(s).flipped();
            g.add_edge(i, s.next_state(act_a, Action::C).id());
            g.add_edge(i, s.next_state(act_a, Action::D).id());
        }
        g
    }

    /// The deterministic graph of this strategy against `coplayer`.
    pub fn transition_graph_with(&self, coplayer: &Strategy) -> DirectedGraph {
        let mut g = DirectedGraph::new(NUM_STATES);
        for i in 0..NUM_STATES {
            let next = self.next_state_with(State::decode(i), coplayer);
            g.add_edge(i, next.id());
        }
        g
    }

    /// The deterministic self-play graph: one edge per node.
    pub fn transition_graph_with_self(&self) -> DirectedGraph {
        self.transition_graph_with(self)
    }

    /// Whether no state lets a defecting co-player build an unbounded
    /// payoff advantage: the one-step relative-payoff graph has no
    /// negative cycle.
    pub fn is_defensible(&self) -> bool {
        let mut m = PayoffMatrix::new(NUM_STATES);
        for i in 0..NUM_STATES {
            for next in self.possible_next_states(State::decode(i)) {
                m.set(i, next.id(), next.relative_payoff() as f64);
            }
        }
        !m.has_negative_cycle()
    }

    /// Whether self-play recovers full cooperation after any single
    /// implementation error.
    pub fn is_efficient(&self) -> bool {
        let closure = NoiseClosure::new(self.transition_graph_with_self(), &NOISE_MASKS);
        closure.run() == NoiseOutcome::FullyRecovers
    }

    /// Whether a one-bit perturbation eventually tells this strategy apart
    /// from an unconditional cooperator.
    pub fn is_distinguishable(&self) -> bool {
        let against_allc = self.transition_graph_with(&Strategy::always(Action::C));
        NoiseClosure::new(against_allc, &NOISE_MASKS).run() == NoiseOutcome::Escapes
    }

    /// Minimize the transition automaton; returns the state partition and
    /// the quotient graph.
    pub fn minimize_dfa(&self) -> (UnionFind, DirectedGraph) {
        minimize::minimize_dfa(&self.transition_graph(), last_round_profile)
    }

    /// Noise-tolerant minimization: states must stay equivalent when the
    /// focal action is mis-executed. Refines-or-equals
    /// [`minimize_dfa`](Strategy::minimize_dfa).
    pub fn minimize_dfa_with_noise(&self) -> (UnionFind, DirectedGraph) {
        minimize::minimize_dfa_with_noise(
            &self.transition_graph(),
            &self.transition_graph_with_flipped_action(),
            last_round_profile,
        )
    }

    /// The renderer-facing export of the minimized automaton.
    pub fn minimized_automaton(&self) -> MinimizedAutomaton {
        let g = self.transition_graph();
        let (mut partition, _) = minimize::minimize_dfa(&g, last_round_profile);
        MinimizedAutomaton::project(&g, &mut partition, last_round_profile)
    }

    /// Follow self-play from `start` until a state repeats; the repeated
    /// state closes the trace.
    pub fn trace_until_cycle(&self, start: State) -> Vec<State> {
        let mut trace = vec![start];
        loop {
            let next = self.next_state_with_self(*trace.last().unwrap());
            let seen = trace.contains(&next);
            trace.push(next);
            if seen {
                return trace;
            }
        }
    }
}

impl FromStr for Strategy {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let acts = parse_actions(s, NUM_STATES)?;
        let mut actions = [Action::C; NUM_STATES];
        actions.copy_from_slice(&acts);
        Ok(Strategy { actions })
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for act in &self.actions {
            write!(f, "{}", act)?;
        }
        Ok(())
    }
}
