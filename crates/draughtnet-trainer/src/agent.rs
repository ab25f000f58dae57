//! Trained agents: network, identity, move selection, match statistics.

use std::{collections::HashSet, fmt};

use sha3::{Digest as _, Keccak256};

use draughtnet_model::{ModelError, Network};
use draughtnet_rules::{CELL_COUNT, GameState, Move, Player};

/// Anything that can take a side in a match.
///
/// Implemented by the trained agent here; heuristic or interactive agent
/// kinds live outside the trainer and implement the same contract.
pub trait Agent {
    /// Binds the side this agent plays for the coming game.
    fn set_player(&mut self, player: Player);

    /// Picks one of the legal moves for the given position, or `None` when
    /// no move is playable. The simulator treats `None` as this agent's
    /// loss.
    fn choose_move(&mut self, state: &GameState, legal: &[Move]) -> Option<Move>;
}

/// Content-hash identity of a trained agent.
///
/// Derived deterministically as the Keccak-256 digest of the agent's full
/// serialized model buffer, so identical weights always mean identical
/// identity, across processes and runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub struct AgentId(String);

impl AgentId {
    /// Hashes a serialized model buffer.
    #[must_use]
    pub fn from_model_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(Keccak256::digest(bytes)))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A network-driven player with running per-epoch statistics.
///
/// The agent exclusively owns its [`Network`]; dropping the agent drops the
/// network. Identity is fixed at construction, statistics reset every epoch,
/// and the move history resets every game.
#[derive(Debug, Clone)]
pub struct TrainedAgent {
    id: AgentId,
    network: Network,
    /// Sliding window of prior board snapshots, newest first, 50 cells each.
    history: Vec<f32>,
    player: Player,
    games: u32,
    wins: u32,
    score: i32,
    min_score: i32,
    max_score: i32,
    age: u32,
    opponents: HashSet<AgentId>,
}

impl TrainedAgent {
    /// Restores an agent from a serialized model buffer.
    ///
    /// The network's input width fixes the history window: `inputs / 50 - 1`
    /// prior snapshots. Widths that are not a positive multiple of the board
    /// size cannot encode a board and are rejected.
    pub fn from_model_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
        let network = Network::from_bytes(bytes)?;
        let inputs = network.inputs();
        if inputs < CELL_COUNT || !inputs.is_multiple_of(CELL_COUNT) {
            return Err(ModelError::MalformedBuffer {
                reason: "input width is not a positive multiple of the board size",
            });
        }
        Ok(Self {
            id: AgentId::from_model_bytes(bytes),
            history: vec![0.0; inputs - CELL_COUNT],
            network,
            player: Player::White,
            games: 0,
            wins: 0,
            score: 0,
            min_score: i32::MAX,
            max_score: i32::MIN,
            age: 0,
            opponents: HashSet::new(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &AgentId {
        &self.id
    }

    #[must_use]
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Flattened weight vector, the genetic operators' view of this agent.
    #[must_use]
    pub fn weights(&self) -> Vec<f32> {
        self.network.weights()
    }

    /// Serialized model buffer; bit-identical to the buffer this agent was
    /// restored from.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        self.network.to_bytes()
    }

    #[must_use]
    pub fn games(&self) -> u32 {
        self.games
    }

    #[must_use]
    pub fn wins(&self) -> u32 {
        self.wins
    }

    #[must_use]
    pub fn score(&self) -> i32 {
        self.score
    }

    #[must_use]
    pub fn min_score(&self) -> i32 {
        self.min_score
    }

    #[must_use]
    pub fn max_score(&self) -> i32 {
        self.max_score
    }

    /// Number of epochs this agent has survived, starting at 0.
    #[must_use]
    pub fn age(&self) -> u32 {
        self.age
    }

    /// Overrides the age; used when seeding previously persisted elites.
    pub fn set_age(&mut self, age: u32) {
        self.age = age;
    }

    /// Mean score per game this epoch.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn average_score(&self) -> f32 {
        if self.games == 0 {
            0.0
        } else {
            self.score as f32 / self.games as f32
        }
    }

    /// Starts a fresh epoch: statistics, opponent set, and move history are
    /// cleared, age advances, the network keeps its weights.
    pub fn on_new_epoch(&mut self) {
        self.age += 1;
        self.games = 0;
        self.wins = 0;
        self.score = 0;
        self.min_score = i32::MAX;
        self.max_score = i32::MIN;
        self.opponents.clear();
        self.reset_history();
    }

    /// Clears the transient move history (between games, not epochs).
    pub fn reset_history(&mut self) {
        self.history.fill(0.0);
    }

    /// Whether this agent already faced `opponent` in the current epoch.
    /// Always `false` for a self-comparison.
    #[must_use]
    pub fn has_played_before(&self, opponent: &AgentId) -> bool {
        if self.id == *opponent {
            return false;
        }
        self.opponents.contains(opponent)
    }

    /// Accumulates one symmetrized match result against `opponent`.
    pub fn record_result(&mut self, score: i32, opponent: &AgentId) {
        self.opponents.insert(opponent.clone());
        self.games += 1;
        self.score += score;
        self.min_score = self.min_score.min(score);
        self.max_score = self.max_score.max(score);
        if score > 0 {
            self.wins += 1;
        }
    }

    /// Encodes the position from this agent's perspective and slides it onto
    /// the history window.
    fn push_snapshot(&mut self, state: &GameState) {
        let own_sign = match self.player {
            Player::White => 1.0,
            Player::Black => -1.0,
        };
        let mut board = [0.0f32; CELL_COUNT];
        for piece in &state.white {
            board[usize::from(piece.cell) - 1] = own_sign * if piece.king { 2.0 } else { 1.0 };
        }
        for piece in &state.black {
            board[usize::from(piece.cell) - 1] = -own_sign * if piece.king { 2.0 } else { 1.0 };
        }
        if !self.history.is_empty() {
            let keep = self.history.len() - CELL_COUNT;
            self.history.copy_within(0..keep, CELL_COUNT);
            self.history[..CELL_COUNT].copy_from_slice(&board);
        }
    }
}

impl Agent for TrainedAgent {
    fn set_player(&mut self, player: Player) {
        self.player = player;
    }

    /// One-ply lookahead: every legal move is written into a copy of the
    /// feature vector (`from` cell as −1, `to` cell as +1 in the zeroed
    /// current-move slot) and scored by the network's first output. The
    /// maximal score wins; ties keep the earliest-seen move.
    fn choose_move(&mut self, state: &GameState, legal: &[Move]) -> Option<Move> {
        self.push_snapshot(state);

        let mut features = vec![0.0f32; self.network.inputs()];
        features[CELL_COUNT..].copy_from_slice(&self.history);

        let mut best: Option<(Move, f32)> = None;
        for &mv in legal {
            let mut input = features.clone();
            input[usize::from(mv.from) - 1] = -1.0;
            input[usize::from(mv.to) - 1] = 1.0;
            // input length equals the network's width by construction
            let output = self.network.predict(&input).ok()?;
            let value = *output.first()?;
            if best.is_none_or(|(_, best_value)| value > best_value) {
                best = Some((mv, value));
            }
        }
        best.map(|(mv, _)| mv)
    }
}

impl fmt::Display for TrainedAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let win_rate = if self.games == 0 {
            0.0
        } else {
            f64::from(self.wins) * 100.0 / f64::from(self.games)
        };
        write!(
            f,
            "{} with {:>6} points min: {:>6} max: {:>6} avg: {:>9.2} {:>6.2}%",
            self.id,
            self.score,
            self.min_score,
            self.max_score,
            self.average_score(),
            win_rate,
        )
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use draughtnet_model::{Activation, Layer};
    use draughtnet_rules::PiecePos;

    use super::*;

    fn agent_from_network(network: &Network) -> TrainedAgent {
        TrainedAgent::from_model_bytes(&network.to_bytes()).unwrap()
    }

    fn random_agent(seed: u64) -> TrainedAgent {
        let mut rng = Pcg32::seed_from_u64(seed);
        agent_from_network(&Network::random(100, &[4], &mut rng).unwrap())
    }

    /// Single identity layer over a 50-wide input (no history window): a
    /// move scores `w[to - 1] - w[from - 1]`.
    fn linear_agent(cell_weights: Vec<f32>) -> TrainedAgent {
        let layer = Layer::new(CELL_COUNT, 1, Activation::Identity, cell_weights, vec![0.0])
            .unwrap();
        agent_from_network(&Network::new(vec![layer]).unwrap())
    }

    fn state(fen: &str) -> GameState {
        fen.parse().unwrap()
    }

    mod identity {
        use super::*;

        #[test]
        fn id_is_stable_over_the_serialized_buffer() {
            let agent = random_agent(7);
            let twin = TrainedAgent::from_model_bytes(&agent.serialize()).unwrap();
            assert_eq!(agent.id(), twin.id());
            // Keccak-256 hex digest
            assert_eq!(agent.id().as_str().len(), 64);
        }

        #[test]
        fn different_weights_mean_different_ids() {
            assert_ne!(random_agent(1).id(), random_agent(2).id());
        }

        #[test]
        fn rejects_input_widths_that_cannot_encode_a_board() {
            let mut rng = Pcg32::seed_from_u64(0);
            let network = Network::random(40, &[1], &mut rng).unwrap();
            assert!(TrainedAgent::from_model_bytes(&network.to_bytes()).is_err());
        }

        #[test]
        fn window_size_follows_the_input_width() {
            let agent = random_agent(3);
            // inputs = 100 -> one prior snapshot
            assert_eq!(agent.history.len(), CELL_COUNT);
        }
    }

    mod statistics {
        use super::*;

        #[test]
        fn record_result_accumulates() {
            let mut agent = random_agent(5);
            let opponent = random_agent(6);
            agent.record_result(120, opponent.id());
            agent.record_result(-40, opponent.id());
            assert_eq!(agent.games(), 2);
            assert_eq!(agent.wins(), 1);
            assert_eq!(agent.score(), 80);
            assert_eq!(agent.min_score(), -40);
            assert_eq!(agent.max_score(), 120);
            assert!((agent.average_score() - 40.0).abs() < f32::EPSILON);
        }

        #[test]
        fn zero_score_is_not_a_win() {
            let mut agent = random_agent(5);
            agent.record_result(0, random_agent(6).id());
            assert_eq!(agent.wins(), 0);
        }

        #[test]
        fn new_epoch_resets_everything_but_age_and_weights() {
            let mut agent = random_agent(5);
            let weights = agent.weights();
            agent.record_result(10, random_agent(6).id());
            agent.on_new_epoch();
            assert_eq!(agent.age(), 1);
            assert_eq!(agent.games(), 0);
            assert_eq!(agent.score(), 0);
            assert_eq!(agent.min_score(), i32::MAX);
            assert!(agent.opponents.is_empty());
            assert_eq!(agent.weights(), weights);
        }

        #[test]
        fn has_played_before_tracks_the_epoch() {
            let mut agent = random_agent(5);
            let opponent = random_agent(6);
            assert!(!agent.has_played_before(opponent.id()));
            agent.record_result(1, opponent.id());
            assert!(agent.has_played_before(opponent.id()));
            agent.on_new_epoch();
            assert!(!agent.has_played_before(opponent.id()));
        }

        #[test]
        fn self_comparison_is_never_a_rematch() {
            let mut agent = random_agent(5);
            let own_id = agent.id().clone();
            agent.record_result(1, &own_id);
            assert!(!agent.has_played_before(&own_id));
        }
    }

    mod move_selection {
        use super::*;

        #[test]
        fn picks_the_move_the_network_scores_highest() {
            let mut weights = vec![0.0; CELL_COUNT];
            weights[9] = 5.0; // favor landing on cell 10
            let mut agent = linear_agent(weights);
            agent.set_player(Player::White);

            let legal = [Move::new(31, 27), Move::new(31, 10), Move::new(32, 28)];
            let chosen = agent.choose_move(&state("W:W31,32:B19"), &legal);
            assert_eq!(chosen, Some(Move::new(31, 10)));
        }

        #[test]
        fn ties_keep_the_earliest_move() {
            let mut agent = linear_agent(vec![0.0; CELL_COUNT]);
            agent.set_player(Player::White);
            let legal = [Move::new(31, 27), Move::new(32, 28)];
            let chosen = agent.choose_move(&state("W:W31,32:B19"), &legal);
            assert_eq!(chosen, Some(Move::new(31, 27)));
        }

        #[test]
        fn no_legal_moves_yields_none() {
            let mut agent = linear_agent(vec![0.0; CELL_COUNT]);
            assert_eq!(agent.choose_move(&state("W:W31:B19"), &[]), None);
        }

        #[test]
        fn snapshots_are_signed_from_the_agents_perspective() {
            let mut agent = random_agent(9);
            let position = GameState {
                turn: Player::White,
                white: vec![PiecePos { cell: 1, king: false }],
                black: vec![PiecePos { cell: 47, king: true }],
            };

            agent.set_player(Player::White);
            agent.push_snapshot(&position);
            assert!((agent.history[0] - 1.0).abs() < f32::EPSILON);
            assert!((agent.history[46] - -2.0).abs() < f32::EPSILON);

            agent.reset_history();
            agent.set_player(Player::Black);
            agent.push_snapshot(&position);
            assert!((agent.history[0] - -1.0).abs() < f32::EPSILON);
            assert!((agent.history[46] - 2.0).abs() < f32::EPSILON);
        }

        #[test]
        fn the_window_slides_newest_first() {
            let mut agent = random_agent(9); // window of exactly one snapshot
            agent.set_player(Player::White);
            agent.push_snapshot(&state("W:W1:B"));
            agent.push_snapshot(&state("W:W2:B"));
            // only the newest snapshot survives in a one-deep window
            assert!((agent.history[0] - 0.0).abs() < f32::EPSILON);
            assert!((agent.history[1] - 1.0).abs() < f32::EPSILON);
        }
    }
}
