//! Shared test doubles: a scripted rules engine and stock agents.

use rand::SeedableRng as _;
use rand_pcg::Pcg32;

use draughtnet_model::{Activation, Layer, Network};
use draughtnet_rules::{CELL_COUNT, Cell, Move, Player, RulesEngine};

use crate::agent::TrainedAgent;

/// A rules engine whose game runs on rails: it lasts a fixed number of
/// plies, accepts any move (unless told to reject one), and ends with a
/// predetermined winner and material count.
#[derive(Debug, Clone)]
pub(crate) struct ScriptedRules {
    total_plies: usize,
    winner: Player,
    men: usize,
    kings: usize,
    reject_at: Option<usize>,
    score_first_move: bool,
    first_move: Option<String>,
    ply: usize,
}

impl ScriptedRules {
    pub(crate) fn forced_game(total_plies: usize, winner: Player) -> Self {
        Self {
            total_plies,
            winner,
            men: 0,
            kings: 0,
            reject_at: None,
            score_first_move: false,
            first_move: None,
            ply: 0,
        }
    }

    /// Decides the winner by the opening move instead of the fixed one:
    /// White wins exactly when its first move lands on cell 27. This gives
    /// matches an outcome that actually depends on the agents' choices.
    pub(crate) fn scoring_first_move(mut self) -> Self {
        self.score_first_move = true;
        self
    }

    /// Material left on the board once the game ends.
    pub(crate) fn with_material(mut self, men: usize, kings: usize) -> Self {
        self.men = men;
        self.kings = kings;
        self
    }

    /// Makes the engine refuse whatever move arrives at the given ply.
    pub(crate) fn rejecting_at_ply(mut self, ply: usize) -> Self {
        self.reject_at = Some(ply);
        self
    }
}

impl RulesEngine for ScriptedRules {
    fn load(&mut self, _position: &str) -> bool {
        true
    }

    fn legal_moves(&self) -> Vec<Move> {
        match self.turn() {
            Player::White => vec![Move::new(31, 27), Move::new(32, 28)],
            Player::Black => vec![Move::new(19, 23), Move::new(20, 24)],
        }
    }

    fn apply_move(&mut self, mv: &str) -> bool {
        if self.reject_at == Some(self.ply) {
            return false;
        }
        if self.first_move.is_none() {
            self.first_move = Some(mv.to_owned());
        }
        self.ply += 1;
        true
    }

    fn fen(&self) -> String {
        format!("{}:W31,32:B19,20", self.turn().as_char())
    }

    fn turn(&self) -> Player {
        if self.ply % 2 == 0 {
            Player::White
        } else {
            Player::Black
        }
    }

    fn cells(&self) -> [Cell; CELL_COUNT] {
        let mut cells = [Cell::Empty; CELL_COUNT];
        for cell in cells.iter_mut().take(self.men) {
            *cell = Cell::Man(Player::White);
        }
        for cell in cells.iter_mut().skip(self.men).take(self.kings) {
            *cell = Cell::King(Player::White);
        }
        cells
    }

    fn game_over(&self) -> bool {
        self.ply >= self.total_plies
    }

    fn winner(&self) -> Option<Player> {
        if !self.game_over() {
            return None;
        }
        if self.score_first_move {
            let white_won = self
                .first_move
                .as_deref()
                .is_some_and(|mv| mv.ends_with("-27"));
            return Some(if white_won { Player::White } else { Player::Black });
        }
        Some(self.winner)
    }

    fn ply_count(&self) -> usize {
        self.ply
    }
}

/// A deterministic agent over a seeded random network (100 inputs, one
/// hidden layer), distinct per seed.
pub(crate) fn uniform_agent(seed: u64) -> TrainedAgent {
    let mut rng = Pcg32::seed_from_u64(seed);
    let network = Network::random(2 * CELL_COUNT, &[4], &mut rng).unwrap();
    TrainedAgent::from_model_bytes(&network.to_bytes()).unwrap()
}

/// A windowless linear agent that always steers toward `favored_cell`: a
/// single identity layer scoring a move as `w[to - 1] - w[from - 1]`.
pub(crate) fn linear_agent(favored_cell: u8) -> TrainedAgent {
    let mut weights = vec![0.0; CELL_COUNT];
    weights[usize::from(favored_cell) - 1] = 5.0;
    let layer = Layer::new(CELL_COUNT, 1, Activation::Identity, weights, vec![0.0]).unwrap();
    let network = Network::new(vec![layer]).unwrap();
    TrainedAgent::from_model_bytes(&network.to_bytes()).unwrap()
}
