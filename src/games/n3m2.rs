//! Three players, memory two: 64 full states, 40-entry reduced table.
//!
//! The full joint history `(a₂ a₁ b₂ b₁ c₂ c₁)` distinguishes the two
//! co-players, but a symmetric strategy does not need to: the reduced
//! [`ShortState`] collapses the co-players' actions at each lag into the
//! *count* of defectors, with one wrinkle. When exactly one co-player
//! defected at each of the two lags, the count pair `(1, 1)` is ambiguous
//! between "the same co-player defected twice" and "they alternated"; the
//! former is marked by recording the last lag as −1. That leaves 10 valid
//! co-player count pairs, so a strategy is a 40-entry table (4 own-history
//! pairs × 10 count pairs) written as a 40-character `c`/`d` string.

use std::fmt;
use std::str::FromStr;

use crate::analysis::graph::DirectedGraph;
use crate::analysis::minimize;
use crate::analysis::minimize::MinimizedAutomaton;
use crate::analysis::noise::{NoiseClosure, NoiseOutcome};
use crate::analysis::payoff::PayoffMatrix;
use crate::analysis::union_find::UnionFind;
use crate::games::{parse_actions, Action, Coplayer, Role, StrategyError};

/// Number of full states: 2^(3 players × 2 rounds).
pub const NUM_STATES: usize = 64;

/// Number of reduced states, the strategy table length.
pub const NUM_SHORT_STATES: usize = 40;

/// XOR masks flipping each player's most recent action bit (a₁, b₁, c₁).
const NOISE_MASKS: [usize; 3] = [16, 4, 1];

/// The canonical ordering of co-player count pairs `(bc₂, bc₁)`.
const BC_STATES: [(i8, i8); 10] = [
    (0, 0),
    (0, 1),
    (0, 2),
    (1, 0),
    (1, 1),
    (1, -1),
    (1, 2),
    (2, 0),
    (2, 1),
    (2, 2),
];

/// Joint last-round action profile of a full state, `"{a₁}{b₁}{c₁}"`.
pub fn last_round_profile(id: usize) -> String {
    format!(
        "{}{}{}",
        Action::from_bit(id >> 4),
        Action::from_bit(id >> 2),
        Action::from_bit(id)
    )
}

/// One of the 64 full joint histories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FullState {
    /// Focal player's action two rounds ago.
    pub a_2: Action,
    /// Focal player's action last round.
    pub a_1: Action,
    /// First co-player's action two rounds ago.
    pub b_2: Action,
    /// First co-player's action last round.
    pub b_1: Action,
    /// Second co-player's action two rounds ago.
    pub c_2: Action,
    /// Second co-player's action last round.
    pub c_1: Action,
}

impl FullState {
    /// Assemble a state from its six actions.
    pub fn new(
        a_2: Action,
        a_1: Action,
        b_2: Action,
        b_1: Action,
        c_2: Action,
        c_1: Action,
    ) -> FullState {
        FullState {
            a_2,
            a_1,
            b_2,
            b_1,
            c_2,
            c_1,
        }
    }

    /// Decode a canonical id; fails for ids outside `[0, 64)`.
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
            a_2: Action::from_bit(id >> 5),
            a_1: Action::from_bit(id >> 4),
            b_2: Action::from_bit(id >> 3),
            b_1: Action::from_bit(id >> 2),
            c_2: Action::from_bit(id >> 1),
            c_1: Action::from_bit(id),
        }
    }

    /// Canonical id: big-endian packing, `a₂` highest, `c₁` lowest.
    pub fn id(&self) -> usize {
        (self.a_2.bit() << 5)
            | (self.a_1.bit() << 4)
            | (self.b_2.bit() << 3)
            | (self.b_1.bit() << 2)
            | (self.c_2.bit() << 1)
            | self.c_1.bit()
    }

    /// The same history as seen from `role`'s seat. Co-player order is
    /// rotated forward (B sees C first, C sees A first), not reflected.
    pub fn seen_by(&self, role: Role) -> FullState {
        match role {
            Role::A => *self,
            Role::B => FullState::new(self.b_2, self.b_1, self.c_2, self.c_1, self.a_2, self.a_1),
            Role::C => FullState::new(self.c_2, self.c_1, self.a_2, self.a_1, self.b_2, self.b_1),
        }
    }

    /// Collapse the co-players into defection counts per lag.
    pub fn reduce(&self) -> ShortState {
        let bc_2 = (self.b_2.bit() + self.c_2.bit()) as i8;
        let defects_1 = self.b_1.bit() + self.c_1.bit();
        let bc_1 = match defects_1 {
            2 => 2,
            0 => 0,
            // exactly one defector last round: mark the ambiguous repeat
            // (same co-player defected at both lags) with -1
            _ => {
                if bc_2 == 1 && self.b_2 == self.b_1 {
                    -1
                } else {
                    1
                }
            }
        };
        ShortState {
            a_2: self.a_2,
            a_1: self.a_1,
            bc_2,
            bc_1,
        }
    }

    /// The state after all three players act.
    pub fn next_state(&self, act_a: Action, act_b: Action, act_c: Action) -> FullState {
        FullState::new(self.a_1, act_a, self.b_1, act_b, self.c_1, act_c)
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
        let a = parse_actions(s, 6)?;
        Ok(FullState::new(a[0], a[1], a[2], a[3], a[4], a[5]))
    }
}

impl fmt::Display for FullState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}{}",
            self.a_2, self.a_1, self.b_2, self.b_1, self.c_2, self.c_1
        )
    }
}

/// A reduced state: own history plus co-player defection counts per lag.
///
/// `bc_1 == -1` encodes the disambiguated repeat described in the module
/// docs. Only the 10 pairs listed in the canonical ordering are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShortState {
    /// Focal player's action two rounds ago.
    pub a_2: Action,
    /// Focal player's action last round.
    pub a_1: Action,
    /// Co-player defections two rounds ago: 0, 1 or 2.
    pub bc_2: i8,
    /// Co-player defections last round: 0, 1, 2, or -1 for the marked
    /// single-defector repeat.
    pub bc_1: i8,
}

impl ShortState {
    /// Build a reduced state, rejecting count pairs outside the canonical
    /// ten.
    pub fn new(a_2: Action, a_1: Action, bc_2: i8, bc_1: i8) -> Result<ShortState, StrategyError> {
        if !BC_STATES.contains(&(bc_2, bc_1)) {
            return Err(StrategyError::KeyOutsideDomain(format!(
                "({},{},{},{})",
                a_2, a_1, bc_2, bc_1
            )));
        }
        Ok(ShortState { a_2, a_1, bc_2, bc_1 })
    }

    /// Position of this state in the canonical 40-entry ordering.
    ///
    /// # Panics
    /// Panics if the count pair was forged outside the canonical ten
    /// (possible only by mutating the public fields directly).
    pub fn index(&self) -> usize {
        let a_idx = self.a_2.bit() * 2 + self.a_1.bit();
        let bc_idx = BC_STATES
            .iter()
            .position(|&bc| bc == (self.bc_2, self.bc_1))
            .unwrap();
        a_idx * 10 + bc_idx
    }

    /// All 40 reduced states in canonical order.
    pub fn all() -> Vec<ShortState> {
        let a_states = [
            (Action::C, Action::C),
            (Action::C, Action::D),
            (Action::D, Action::C),
            (Action::D, Action::D),
        ];
        let mut out = Vec::with_capacity(NUM_SHORT_STATES);
        for (a_2, a_1) in a_states {
            for (bc_2, bc_1) in BC_STATES {
                out.push(ShortState { a_2, a_1, bc_2, bc_1 });
            }
        }
        out
    }
}

impl fmt::Display for ShortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{},{},{})",
            self.a_2, self.a_1, self.bc_2, self.bc_1
        )
    }
}

/// A lookup key for a strategy, one variant per accepted input shape.
#[derive(Debug, Clone, Copy)]
pub enum StateKey<'a> {
    /// A canonical full-state id.
    Id(usize),
    /// A 6-character `c`/`d` history string.
    Bits(&'a str),
    /// An already-decoded full state.
    Full(FullState),
    /// A reduced state.
    Short(ShortState),
}

impl StateKey<'_> {
    fn canonical(self) -> Result<ShortState, StrategyError> {
        match self {
            StateKey::Id(id) => Ok(FullState::from_id(id)?.reduce()),
            StateKey::Bits(s) => Ok(s.parse::<FullState>()?.reduce()),
            StateKey::Full(fs) => Ok(fs.reduce()),
            StateKey::Short(ss) => Ok(ss),
        }
    }
}

/// A deterministic memory-two strategy over the reduced encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    actions: [Action; NUM_SHORT_STATES],
}

impl Strategy {
    /// Build a strategy from its reduced-table actions in canonical order.
    pub fn new(actions: [Action; NUM_SHORT_STATES]) -> Strategy {
        Strategy { actions }
    }

    /// The strategy playing `act` in every state.
    pub fn always(act: Action) -> Strategy {
        Strategy {
            actions: [act; NUM_SHORT_STATES],
        }
    }

    /// Parse the 40-character table form.
    pub fn from_bits(bits: &str) -> Result<Strategy, StrategyError> {
        let acts = parse_actions(bits, NUM_SHORT_STATES)?;
        let mut actions = [Action::C; NUM_SHORT_STATES];
        actions.copy_from_slice(&acts);
        Ok(Strategy { actions })
    }

    /// The 40-character table form.
    pub fn to_bits(&self) -> String {
        self.actions.iter().map(Action::to_string).collect()
    }

    /// The action prescribed in a full state.
    pub fn action(&self, state: &FullState) -> Action {
        self.actions[state.reduce().index()]
    }

    /// The action prescribed in a reduced state.
    pub fn action_short(&self, state: &ShortState) -> Action {
        self.actions[state.index()]
    }

    /// The action for any accepted key shape; fails at the boundary if the
    /// key does not name a state.
    pub fn action_for(&self, key: StateKey<'_>) -> Result<Action, StrategyError> {
        Ok(self.action_short(&key.canonical()?))
    }

    /// Expand the reduced table to one action per full state id.
    pub fn to_full_table(&self) -> [Action; NUM_STATES] {
        let mut table = [Action::C; NUM_STATES];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = self.action(&FullState::decode(i));
        }
        table
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
    pub fn transition_graph_with(&self, b_strategy: &Strategy, c_strategy: &Strategy) -> DirectedGraph {
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

    /// Whether neither co-player seat can exploit the strategy.
    pub fn is_defensible(&self) -> bool {
        self.is_defensible_against(Coplayer::B) && self.is_defensible_against(Coplayer::C)
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

    /// Minimize the transition automaton over the 64 full states.
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

    /// Follow self-play from `start` until a state repeats.
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
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short(a_2: Action, a_1: Action, bc_2: i8, bc_1: i8) -> ShortState {
        ShortState::new(a_2, a_1, bc_2, bc_1).unwrap()
    }

    #[test]
    fn test_state_alld() {
        let fs = FullState::from_id(63).unwrap();
        assert_eq!(fs.to_string(), "dddddd");
        let ss = fs.reduce();
        assert_eq!(ss, short(Action::D, Action::D, 2, 2));
        assert_eq!(fs.relative_payoff_against(Coplayer::B), 0);
        assert_eq!(fs.relative_payoff_against(Coplayer::C), 0);
    }

    #[test]
    fn test_state_allc() {
        let fs = FullState::from_id(0).unwrap();
        assert_eq!(fs.to_string(), "cccccc");
        assert_eq!(fs.reduce(), short(Action::C, Action::C, 0, 0));
        assert_eq!(fs.relative_payoff_against(Coplayer::B), 0);
        assert_eq!(fs.relative_payoff_against(Coplayer::C), 0);
    }

    #[test]
    fn test_state43() {
        let fs = FullState::from_id(43).unwrap();
        assert_eq!(fs.to_string(), "dcdcdd");
        assert_eq!(fs.reduce(), short(Action::D, Action::C, 2, 1));
        assert_eq!(fs.relative_payoff_against(Coplayer::B), 0);
        assert_eq!(fs.relative_payoff_against(Coplayer::C), -1);
        assert_eq!(
            fs.next_state(Action::C, Action::D, Action::D).to_string(),
            "cccddd"
        );
    }

    #[test]
    fn test_state44() {
        let fs = FullState::from_id(44).unwrap();
        assert_eq!(fs.to_string(), "dcddcc");
        assert_eq!(fs.reduce(), short(Action::D, Action::C, 1, -1));
        assert_eq!(fs.relative_payoff_against(Coplayer::B), -1);
        assert_eq!(fs.relative_payoff_against(Coplayer::C), 0);
        assert_eq!(
            fs.next_state(Action::D, Action::D, Action::D).to_string(),
            "cdddcd"
        );
    }

    #[test]
    fn test_state_equality() {
        let fs1 = FullState::from_id(15).unwrap();
        let fs2: FullState = "ccdddd".parse().unwrap();
        assert_eq!(fs1, fs2);
    }

    #[test]
    fn test_state_round_trip() {
        for id in 0..NUM_STATES {
            let fs = FullState::from_id(id).unwrap();
            assert_eq!(fs.id(), id);
            assert_eq!(fs.to_string().parse::<FullState>().unwrap(), fs);
        }
    }

    #[test]
    fn test_short_state_indexing() {
        for (idx, ss) in ShortState::all().into_iter().enumerate() {
            assert_eq!(ss.index(), idx);
        }
        assert!(ShortState::new(Action::C, Action::C, 0, -1).is_err());
        assert!(ShortState::new(Action::C, Action::C, 2, -1).is_err());
        assert!(ShortState::new(Action::C, Action::C, 3, 0).is_err());
    }

    #[test]
    fn test_seat_rotation() {
        let fs: FullState = "cdccdd".parse().unwrap();
        assert_eq!(fs.seen_by(Role::A), fs);
        assert_eq!(fs.seen_by(Role::B).to_string(), "ccddcd");
        assert_eq!(fs.seen_by(Role::C).to_string(), "ddcdcc");
    }

    #[test]
    fn test_alld() {
        let bits = "d".repeat(40);
        let strategy = Strategy::from_bits(&bits).unwrap();
        assert_eq!(strategy.to_bits(), bits);
        assert_eq!(
            strategy.action_short(&short(Action::C, Action::C, 0, 0)),
            Action::D
        );
        assert_eq!(
            strategy.action_short(&short(Action::D, Action::D, 2, 2)),
            Action::D
        );

        let s: FullState = "ccdccd".parse().unwrap();
        let nexts: Vec<String> = strategy
            .possible_next_states(&s)
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(nexts, vec!["cdccdc", "cdccdd", "cdcddc", "cdcddd"]);
        assert_eq!(strategy.next_state_with_self(&s).to_string(), "cdcddd");

        assert!(strategy.is_defensible());
        assert!(!strategy.is_efficient());
        assert!(strategy.is_distinguishable());
    }

    #[test]
    fn test_allc() {
        let bits = "c".repeat(40);
        let strategy = Strategy::from_bits(&bits).unwrap();
        assert_eq!(strategy.to_bits(), bits);
        assert_eq!(
            strategy.action_short(&short(Action::C, Action::C, 0, 0)),
            Action::C
        );
        assert_eq!(
            strategy.action_short(&short(Action::D, Action::D, 2, 2)),
            Action::C
        );

        let s: FullState = "ccdccd".parse().unwrap();
        let nexts: Vec<String> = strategy
            .possible_next_states(&s)
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(nexts, vec!["ccccdc", "ccccdd", "cccddc", "cccddd"]);
        assert_eq!(strategy.next_state_with_self(&s).to_string(), "ccccdc");

        assert!(!strategy.is_defensible());
        assert!(strategy.is_efficient());
        assert!(!strategy.is_distinguishable());
    }

    #[test]
    fn test_sample_strategy() {
        let bits = "ccccdddcdddccccddcdddccccddcddcccccddddd";
        let strategy = Strategy::from_bits(bits).unwrap();
        assert_eq!(strategy.to_bits(), bits);
        assert_eq!(
            strategy.action_short(&short(Action::C, Action::C, 0, 0)),
            Action::C
        );
        assert_eq!(
            strategy.action_short(&short(Action::D, Action::D, 2, 2)),
            Action::D
        );

        let s: FullState = "ccdccd".parse().unwrap();
        let move_a = strategy.action_short(&short(Action::C, Action::C, 1, 1));
        let nexts: Vec<String> = strategy
            .possible_next_states(&s)
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(nexts, vec!["cdccdc", "cdccdd", "cdcddc", "cdcddd"]);

        let next = strategy.next_state_with_self(&s);
        let move_b = strategy.action_short(&short(Action::D, Action::C, 0, 1));
        let move_c = strategy.action_short(&short(Action::C, Action::D, 1, 0));
        assert_eq!(next.to_string(), format!("c{}c{}d{}", move_a, move_b, move_c));

        assert!(!strategy.is_defensible());
        assert!(!strategy.is_efficient());
        assert!(strategy.is_distinguishable());
    }

    #[test]
    fn test_all_or_none_2() {
        // cooperate iff every player took the same action at both lags
        let mut bits = ['x'; NUM_SHORT_STATES];
        for i in 0..NUM_STATES {
            let s = FullState::decode(i);
            let unanimous = s.a_2 == s.b_2 && s.a_2 == s.c_2 && s.a_1 == s.b_1 && s.a_1 == s.c_1;
            bits[s.reduce().index()] = if unanimous { 'c' } else { 'd' };
        }
        let bits: String = bits.iter().collect();
        let strategy = Strategy::from_bits(&bits).unwrap();
        assert_eq!(
            strategy.to_bits(),
            "cdddddddddddcddddddddddddddcdddddddddddc"
        );

        assert_eq!(
            strategy.action_short(&short(Action::C, Action::C, 0, 0)),
            Action::C
        );
        assert_eq!(
            strategy.action_short(&short(Action::D, Action::D, 2, 2)),
            Action::C
        );
        assert_eq!(
            strategy.action_short(&short(Action::D, Action::C, 2, 2)),
            Action::D
        );

        assert!(!strategy.is_defensible());
        assert!(strategy.is_efficient());
        assert!(strategy.is_distinguishable());
    }

    #[test]
    fn test_most_generous_ps2() {
        let bits = "cddcdddcddcccdcddddddcccdddcccccddcddddd";
        let strategy = Strategy::from_bits(bits).unwrap();
        assert_eq!(strategy.to_bits(), bits);
        assert_eq!(
            strategy.action_short(&short(Action::C, Action::C, 0, 0)),
            Action::C
        );
        assert_eq!(
            strategy.action_short(&short(Action::D, Action::D, 2, 2)),
            Action::D
        );

        let s: FullState = "ccdccd".parse().unwrap();
        let move_a = strategy.action_short(&short(Action::C, Action::C, 1, 1));
        let nexts: Vec<String> = strategy
            .possible_next_states(&s)
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(nexts, vec!["cdccdc", "cdccdd", "cdcddc", "cdcddd"]);

        let next = strategy.next_state_with_self(&s);
        let move_b = strategy.action_short(&short(Action::D, Action::C, 0, 1));
        let move_c = strategy.action_short(&short(Action::C, Action::D, 1, 0));
        assert_eq!(next.to_string(), format!("c{}c{}d{}", move_a, move_b, move_c));

        assert!(strategy.is_defensible());
        assert!(!strategy.is_efficient());
        assert!(strategy.is_distinguishable());
    }

    #[test]
    fn test_action_keys() {
        let strategy = Strategy::from_bits("ccccdddcdddccccddcdddccccddcddcccccddddd").unwrap();
        let fs = FullState::decode(43);
        assert_eq!(
            strategy.action_for(StateKey::Id(43)).unwrap(),
            strategy.action(&fs)
        );
        assert_eq!(
            strategy.action_for(StateKey::Bits("dcdcdd")).unwrap(),
            strategy.action(&fs)
        );
        assert_eq!(
            strategy.action_for(StateKey::Full(fs)).unwrap(),
            strategy.action(&fs)
        );
        assert_eq!(
            strategy
                .action_for(StateKey::Short(fs.reduce()))
                .unwrap(),
            strategy.action(&fs)
        );
        assert!(strategy.action_for(StateKey::Id(64)).is_err());
    }

    #[test]
    fn test_full_table_matches_reduced_lookup() {
        let strategy = Strategy::from_bits("cddcdddcddcccdcddddddcccdddcccccddcddddd").unwrap();
        let table = strategy.to_full_table();
        for (i, &act) in table.iter().enumerate() {
            assert_eq!(act, strategy.action(&FullState::decode(i)));
        }
    }

    #[test]
    fn test_minimize_alld_collapses_everything() {
        let strategy = Strategy::from_bits(&"d".repeat(40)).unwrap();
        let (mut partition, quotient) = strategy.minimize_dfa();
        let map = partition.to_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map[&0], (0..NUM_STATES).collect::<Vec<_>>());
        assert_eq!(quotient.successors(0), &[0]);
    }

    #[test]
    fn test_greedy_matches_refinement() {
        for bits in [
            "ccccdddcdddccccddcdddccccddcddcccccddddd",
            "cddcdddcddcccdcddddddcccdddcccccddcddddd",
        ] {
            let strategy = Strategy::from_bits(bits).unwrap();
            let g = strategy.transition_graph();
            let (mut a, _) = minimize::minimize_dfa(&g, last_round_profile);
            let (mut b, _) = minimize::coarsen_greedy(&g, last_round_profile);
            assert_eq!(a.to_map(), b.to_map(), "strategy {}", bits);
        }
    }

    #[test]
    fn test_noisy_minimization_refines_plain() {
        let strategy = Strategy::from_bits("cddcdddcddcccdcddddddcccdddcccccddcddddd").unwrap();
        let (mut plain, _) = strategy.minimize_dfa();
        let (mut noisy, _) = strategy.minimize_dfa_with_noise();
        assert!(noisy.to_map().len() >= plain.to_map().len());
        for members in noisy.to_map().values() {
            let r = plain.root(members[0]);
            assert!(members.iter().all(|&m| plain.root(m) == r));
        }
    }

    #[test]
    fn test_trace_until_cycle_reaches_repeat() {
        let strategy = Strategy::from_bits("cddcdddcddcccdcddddddcccdddcccccddcddddd").unwrap();
        let trace = strategy.trace_until_cycle("cccdcc".parse().unwrap());
        let last = trace.last().unwrap();
        assert!(trace[..trace.len() - 1].contains(last));
    }
}
