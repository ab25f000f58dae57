//! Contract for the external rules engine.

use crate::{CELL_COUNT, Cell, Move, Player};

/// The game-rules collaborator the trainer drives.
///
/// Implementations own all rules knowledge: legal-move generation (including
/// forced capture chains), move application, turn tracking, and game-over
/// detection. A fresh engine starts at the initial position; one engine
/// instance serves exactly one game at a time.
pub trait RulesEngine {
    /// Restores the engine to the given position string. Returns `false`
    /// when the position is rejected.
    fn load(&mut self, position: &str) -> bool;

    /// Legal moves for the side to move. Empty once the game is over.
    fn legal_moves(&self) -> Vec<Move>;

    /// Applies a move in `from-to` form. Returns `false` when the engine
    /// rejects it as illegal.
    fn apply_move(&mut self, mv: &str) -> bool;

    /// Current position string.
    fn fen(&self) -> String;

    /// Side to move.
    fn turn(&self) -> Player;

    /// Per-cell occupancy for cells 1 through [`CELL_COUNT`].
    fn cells(&self) -> [Cell; CELL_COUNT];

    /// Whether the game has reached a terminal state.
    fn game_over(&self) -> bool;

    /// The declared winner, once the game is over.
    fn winner(&self) -> Option<Player>;

    /// Number of plies played so far.
    fn ply_count(&self) -> usize;
}
