//! Three players, memory three: the 512-state configuration.
//!
//! The joint history `(a₃a₂a₁ b₃b₂b₁ c₃c₂c₁)` keeps three rounds per
//! player, so the strategy table has one entry per full state id and is
//! written as a 512-character `c`/`d` string. States print with dashes
//! between the players (`"ccd-ccc-ccc"`) but parse from the bare nine
//! characters.
//!
//! This configuration also carries the trajectory features: tracing
//! self-play to its cycle and enumerating the states visited while
//! recovering from up to `k` accumulated one-bit errors.

use std::fmt;
use std::str::FromStr;

use log::warn;

use crate::analysis::graph::DirectedGraph;
use crate::analysis::minimize;
use crate::analysis::minimize::MinimizedAutomaton;
use crate::analysis::noise::{NoiseClosure, NoiseOutcome};
use crate::analysis::payoff::PayoffMatrix;
use crate::analysis::union_find::UnionFind;
use crate::games::{n3m2, parse_actions, Action, Coplayer, Role, StrategyError};

/// Number of states: 2^(3 players × 3 rounds).
pub const NUM_STATES: usize = 512;

/// XOR masks flipping each player's most recent action bit (a₁, b₁, c₁).
const NOISE_MASKS: [usize; 3] = [64, 8, 1];

/// Joint last-round action profile of a state, `"{a₁}{b₁}{c₁}"`.
pub fn last_round_profile(id: usize) -> String {
    format!(
        "{}{}{}",
        Action::from_bit(id >> 6),
        Action::from_bit(id >> 3),
        Action::from_bit(id)
    )
}

/// One of the 512 joint histories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FullState {
    /// Focal player's action three rounds ago.
    pub a_3: Action,
    /// Focal player's action two rounds ago.
    pub a_2: Action,
    /// Focal player's action last round.
    pub a_1: Action,
    /// First co-player's action three rounds ago.
    pub b_3: Action,
    /// First co-player's action two rounds ago.
    pub b_2: Action,
    /// First co-player's action last round.
    pub b_1: Action,
    /// Second co-player's action three rounds ago.
    pub c_3: Action,
    /// Second co-player's action two rounds ago.
    pub c_2: Action,
    /// Second co-player's action last round.
    pub c_1: Action,
}

impl FullState {
    /// Assemble a state from its nine actions, player-major, oldest lag
    /// first.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        a_3: Action,
        a_2: Action,
        a_1: Action,
        b_3: Action,
        b_2: Action,
        b_1: Action,
        c_3: Action,
        c_2: Action,
        c_1: Action,
    ) -> FullState {
        FullState {
            a_3,
            a_2,
            a_1,
            b_3,
            b_2,
            b_1,
            c_3,
            c_2,
            c_1,
        }
    }

    /// Decode a canonical id; fails for ids outside `[0, 512)`.
    pub fn from_id(id: usize) -> Result<FullState, StrategyError> {
        if id >= NUM_STATES {
            return Err(StrategyError::StateOutOfRange {
                id,
                num_states: NUM_STATES,
            });
        }
        Ok(Self::decode(id))
    }

    /// Decode an id known to be in range.
    pub(crate) fn decode(id: usize) -> FullState {
        debug_assert!(id < NUM_STATES);
        FullState {
            a_3: Action::from_bit(id >> 8),
            a_2: Action::from_bit(id >> 7),
            a_1: Action::from_bit(id >> 6),
            b_3: Action::from_bit(id >> 5),
            b_2: Action::from_bit(id >> 4),
            b_1: Action::from_bit(id >> 3),
            c_3: Action::from_bit(id >> 2),
            c_2: Action::from_bit(id >> 1),
            c_1: Action::from_bit(id),
        }
    }

    /// Canonical id: big-endian packing, `a₃` highest, `c₁` lowest.
    pub fn id(&self) -> usize {
        (self.a_3.bit() << 8)
            | (self.a_2.bit() << 7)
            | (self.a_1.bit() << 6)
            | (self.b_3.bit() << 5)
            | (self.b_2.bit() << 4)
            | (self.b_1.bit() << 3)
            | (self.c_3.bit() << 2)
            | (self.c_2.bit() << 1)
            | self.c_1.bit()
    }

    /// The two overlapping memory-two windows of this history, oldest
    /// first.
    pub fn to_m2_states(&self) -> (n3m2::FullState, n3m2::FullState) {
        (
            n3m2::FullState::new(self.a_3, self.a_2, self.b_3, self.b_2, self.c_3, self.c_2),
            n3m2::FullState::new(self.a_2, self.a_1, self.b_2, self.b_1, self.c_2, self.c_1),
        )
    }

    /// The same history as seen from `role`'s seat (co-players rotated
    /// forward, as in the memory-two configuration).
    pub fn seen_by(&self, role: Role) -> FullState {
        match role {
            Role::A => *self,
            Role::B => FullState::new(
                self.b_3, self.b_2, self.b_1, self.c_3, self.c_2, self.c_1, self.a_3, self.a_2,
                self.a_1,
            ),
            Role::C => FullState::new(
                self.c_3, self.c_2, self.c_1, self.a_3, self.a_2, self.a_1, self.b_3, self.b_2,
                self.b_1,
            ),
        }
    }

    /// The state after all three players act.
    pub fn next_state(&self, act_a: Action, act_b: Action, act_c: Action) -> FullState {
        FullState::new(
            self.a_2, self.a_1, act_a, self.b_2, self.b_1, act_b, self.c_2, self.c_1, act_c,
        )
    }

    /// The three states reached by flipping exactly one player's most
    /// recent action.
    pub fn neighbor_states(&self) -> [FullState; 3] {
        let mut flip_a = *self;
        flip_a.a_1 = self.a_1.flipped();
        let mut flip_b = *self;
        flip_b.b_1 = self.b_1.flipped();
        let mut flip_c = *self;
        flip_c.c_1 = self.c_1.flipped();
        [flip_a, flip_b, flip_c]
    }

    /// Focal player's last-round payoff relative to one co-player.
    pub fn relative_payoff_against(&self, coplayer: Coplayer) -> i32 {
        let act = match coplayer {
            Coplayer::B => self.b_1,
            Coplayer::C => self.c_1,
        };
        match (self.a_1, act) {
            (Action::C, Action::D) => -1,
            (Action::D, Action::C) => 1,
            _ => 0,
        }
    }
}

impl FromStr for FullState {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let a = parse_actions(s, 9)?;
        Ok(FullState::new(
            a[0], a[1], a[2], a[3], a[4], a[5], a[6], a[7], a[8],
        ))
    }
}

impl fmt::Display for FullState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}-{}{}{}-{}{}{}",
            self.a_3,
            self.a_2,
            self.a_1,
            self.b_3,
            self.b_2,
            self.b_1,
            self.c_3,
            self.c_2,
            self.c_1
        )
    }
}

/// A lookup key for a strategy, one variant per accepted input shape.
#[derive(Debug, Clone, Copy)]
pub enum StateKey<'a> {
    /// A canonical state id.
    Id(usize),
    /// A 9-character `c`/`d` history string (no dashes).
    Bits(&'a str),
    /// An already-decoded state.
    State(FullState),
}

impl StateKey<'_> {
    fn canonical(self) -> Result<FullState, StrategyError> {
        match self {
            StateKey::Id(id) => FullState::from_id(id),
            StateKey::Bits(s) => s.parse(),
            StateKey::State(s) => Ok(s),
        }
    }
}

/// A deterministic memory-three strategy for the three-player game.
#[derive(Clone, PartialEq, Eq)]
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

    /// Parse the 512-character table form.
    pub fn from_bits(bits: &str) -> Result<Strategy, StrategyError> {
        let acts = parse_actions(bits, NUM_STATES)?;
        let mut actions = [Action::C; NUM_STATES];
        actions.copy_from_slice(&acts);
        Ok(Strategy { actions })
    }

    /// The 512-character table form.
    pub fn to_bits(&self) -> String {
        self.actions.iter().map(Action::to_string).collect()
    }

    /// Lift a memory-two strategy to memory three by reading only the
    /// later of the two overlapping windows.
    pub fn from_m2_strategy(m2: &n3m2::Strategy) -> Strategy {
        let mut actions = [Action::C; NUM_STATES];
        for (i, entry) in actions.iter_mut().enumerate() {
            let (_, later) = FullState::decode(i).to_m2_states();
            *entry = m2.action(&later);
        }
        Strategy { actions }
    }

    /// The action prescribed in a state.
    pub fn action(&self, state: &FullState) -> Action {
        self.actions[state.id()]
    }

    /// The action for any accepted key shape; fails at the boundary if the
    /// key does not name a state.
    pub fn action_for(&self, key: StateKey<'_>) -> Result<Action, StrategyError> {
        Ok(self.action(&key.canonical()?))
    }

    /// Overwrite the action in one state (for hand-patched variants).
    pub fn modify_action(&mut self, key: StateKey<'_>, act: Action) -> Result<(), StrategyError> {
        let state = key.canonical()?;
        self.actions[state.id()] = act;
        Ok(())
    }

    /// The four successors consistent with the strategy's own action and
    /// free co-player choices.
    pub fn possible_next_states(&self, state: &FullState) -> [FullState; 4] {
        let act_a = self.action(state);
        [
            state.next_state(act_a, Action::C, Action::C),
            state.next_state(act_a, Action::C, Action::D),
            state.next_state(act_a, Action::D, Action::C),
            state.next_state(act_a, Action::D, Action::D),
        ]
    }

    /// The successor when B and C follow the given strategies.
    pub fn next_state_with(
        &self,
        state: &FullState,
        b_strategy: &Strategy,
        c_strategy: &Strategy,
    ) -> FullState {
        let act_a = self.action(state);
        let act_b = b_strategy.action(&state.seen_by(Role::B));
        let act_c = c_strategy.action(&state.seen_by(Role::C));
        state.next_state(act_a, act_b, act_c)
    }

    /// The successor under self-play.
    pub fn next_state_with_self(&self, state: &FullState) -> FullState {
        self.next_state_with(state, self, self)
    }

    /// The nondeterministic transition graph: four edges per node.
    pub fn transition_graph(&self) -> DirectedGraph {
        let mut g = DirectedGraph::new(NUM_STATES);
        for i in 0..NUM_STATES {
            for next in self.possible_next_states(&FullState::decode(i)) {
                g.add_edge(i, next.id());
            }
        }
        g
    }

    /// As [`transition_graph`](Strategy::transition_graph), but with the
    /// focal player's prescribed action mis-executed in every state.
    pub fn transition_graph_with_flipped_action(&self) -> DirectedGraph {
        let mut g = DirectedGraph::new(NUM_STATES);
        for i in 0..NUM_STATES {
            let s = FullState::decode(i);
            let act_a = self.action(&s).flipped();
            for (act_b, act_c) in [
                (Action::C, Action::C),
                (Action::C, Action::D),
                (Action::D, Action::C),
                (Action::D, Action::D),
            ] {
                g.add_edge(i, s.next_state(act_a, act_b, act_c).id());
            }
        }
        g
    }

    /// The deterministic graph of this strategy against B and C.
    pub fn transition_graph_with(
        &self,
        b_strategy: &Strategy,
        c_strategy: &Strategy,
    ) -> DirectedGraph {
        let mut g = DirectedGraph::new(NUM_STATES);
        for i in 0..NUM_STATES {
            let next = self.next_state_with(&FullState::decode(i), b_strategy, c_strategy);
            g.add_edge(i, next.id());
        }
        g
    }

    /// The deterministic self-play graph.
    pub fn transition_graph_with_self(&self) -> DirectedGraph {
        self.transition_graph_with(self, self)
    }

    /// Whether the strategy prescribes the same action when the two
    /// co-players' histories are exchanged.
    pub fn is_symmetric_under_coplayer_swap(&self) -> bool {
        for i in 0..NUM_STATES {
            let s = FullState::decode(i);
            let swapped = FullState::new(
                s.a_3, s.a_2, s.a_1, s.c_3, s.c_2, s.c_1, s.b_3, s.b_2, s.b_1,
            );
            if self.actions[i] != self.actions[swapped.id()] {
                return false;
            }
        }
        true
    }

    /// Whether the named co-player can never build an unbounded payoff
    /// advantage.
    pub fn is_defensible_against(&self, coplayer: Coplayer) -> bool {
        let mut m = PayoffMatrix::new(NUM_STATES);
        for i in 0..NUM_STATES {
            let s = FullState::decode(i);
            let w = s.relative_payoff_against(coplayer) as f64;
            for next in self.possible_next_states(&s) {
                m.set(i, next.id(), w);
            }
        }
        !m.has_negative_cycle()
    }

    /// Whether no co-player seat can exploit the strategy.
    ///
    /// A strategy symmetric under co-player swap only needs the B seat
    /// checked. An asymmetric one is checked against both seats; that
    /// costs a second full relaxation, which is worth a caveat in the log
    /// but is not an error.
    pub fn is_defensible(&self) -> bool {
        if self.is_symmetric_under_coplayer_swap() {
            self.is_defensible_against(Coplayer::B)
        } else {
            warn!("strategy is not symmetric under co-player swap; checking both seats");
            self.is_defensible_against(Coplayer::B) && self.is_defensible_against(Coplayer::C)
        }
    }

    /// Whether self-play recovers full cooperation after any single
    /// implementation error.
    pub fn is_efficient(&self) -> bool {
        let closure = NoiseClosure::new(self.transition_graph_with_self(), &NOISE_MASKS);
        closure.run() == NoiseOutcome::FullyRecovers
    }

    /// Whether a one-bit perturbation eventually tells this strategy apart
    /// from unconditional cooperators.
    pub fn is_distinguishable(&self) -> bool {
        let allc = Strategy::always(Action::C);
        let g = self.transition_graph_with(&allc, &allc);
        NoiseClosure::new(g, &NOISE_MASKS).run() == NoiseOutcome::Escapes
    }

    /// Minimize the transition automaton over the 512 states.
    pub fn minimize_dfa(&self) -> (UnionFind, DirectedGraph) {
        minimize::minimize_dfa(&self.transition_graph(), last_round_profile)
    }

    /// Noise-tolerant minimization; refines-or-equals
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
    pub fn trace_until_cycle(&self, start: FullState) -> Vec<FullState> {
        let mut trace = vec![start];
        loop {
            let next = self.next_state_with_self(trace.last().unwrap());
            let seen = trace.contains(&next);
            trace.push(next);
            if seen {
                return trace;
            }
        }
    }

    /// Every state visited while recovering from up to `num_errors`
    /// accumulated one-bit errors, or `None` if some error trajectory
    /// fails to return to full cooperation.
    ///
    /// With zero errors the answer is full cooperation itself, provided
    /// the strategy actually stays there, otherwise the question is
    /// ill-posed and an error is returned. For `k+1` errors, every state
    /// reachable with `k` errors is perturbed one bit in each of the three
    /// seats, and each perturbed state's self-play trace must come back to
    /// full cooperation; the union of the perturbed states and their
    /// traces is the answer.
    pub fn recovery_paths(
        &self,
        num_errors: usize,
    ) -> Result<Option<Vec<FullState>>, StrategyError> {
        if num_errors == 0 {
            if self.actions[0] == Action::D {
                return Err(StrategyError::UnstableCooperation);
            }
            return Ok(Some(vec![FullState::decode(0)]));
        }

        let states = match self.recovery_paths(num_errors - 1)? {
            Some(states) => states,
            None => return Ok(None),
        };

        let mut neighbors: Vec<FullState> = Vec::new();
        for s in &states {
            for n in s.neighbor_states() {
                if !neighbors.contains(&n) {
                    neighbors.push(n);
                }
            }
        }

        let mut nodes = neighbors.clone();
        for n in &neighbors {
            let trace = self.trace_until_cycle(*n);
            if trace.last().unwrap().id() != 0 {
                return Ok(None);
            }
            for t in trace {
                if !nodes.contains(&t) {
                    nodes.push(t);
                }
            }
        }
        Ok(Some(nodes))
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy").field("bits", &self.to_bits()).finish()
    }
}
