//! Game-side contracts shared between the trainer and any rules-engine
//! binding.
//!
//! The actual rules engine (legal-move generation, capture chains, game-over
//! detection) is an external collaborator. This crate pins down the boundary:
//! the [`RulesEngine`] trait, the position-string codec ([`GameState`]), and
//! the small value types both sides exchange.

pub use self::{
    engine::RulesEngine,
    fen::{FenError, GameState, PiecePos},
};

pub mod engine;
pub mod fen;

/// Number of playable cells on the 10x10 board, numbered 1 through 50.
pub const CELL_COUNT: usize = 50;

/// One side of the game.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    derive_more::Display,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum Player {
    White,
    Black,
}

impl Player {
    /// Returns the other side.
    #[must_use]
    pub fn opponent(self) -> Self {
        match self {
            Player::White => Player::Black,
            Player::Black => Player::White,
        }
    }

    /// Single-character form used by the position string (`'W'` / `'B'`).
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Player::White => 'W',
            Player::Black => 'B',
        }
    }

    /// Parses the single-character position-string form.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'W' => Some(Player::White),
            'B' => Some(Player::Black),
            _ => None,
        }
    }
}

/// Occupant of a single board cell, as reported by the rules engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Cell {
    Empty,
    Man(Player),
    King(Player),
}

impl Cell {
    /// Character form used by the rules-engine position dump
    /// (`'0'`, `'w'`, `'W'`, `'b'`, `'B'`).
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Cell::Empty => '0',
            Cell::Man(Player::White) => 'w',
            Cell::King(Player::White) => 'W',
            Cell::Man(Player::Black) => 'b',
            Cell::King(Player::Black) => 'B',
        }
    }

    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Cell::Empty),
            'w' => Some(Cell::Man(Player::White)),
            'W' => Some(Cell::King(Player::White)),
            'b' => Some(Cell::Man(Player::Black)),
            'B' => Some(Cell::King(Player::Black)),
            _ => None,
        }
    }
}

/// A single move between two cells, in the rules engine's 1-based numbering.
///
/// The `Display` form (`from-to`) is the move-string format the rules engine
/// accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("{from}-{to}")]
pub struct Move {
    pub from: u8,
    pub to: u8,
}

impl Move {
    #[must_use]
    pub fn new(from: u8, to: u8) -> Self {
        Self { from, to }
    }
}
