//! Position-string codec.
//!
//! The rules engine exchanges positions as
//! `<turn>:W<white cells>:B<black cells>` where each cell list is
//! comma-separated 1-based cell numbers, kings prefixed with `K`, e.g.
//! `W:W31,32,K5:B1,2,19`. An empty side list is legal.

use std::{fmt, str::FromStr};

use crate::{CELL_COUNT, Player};

/// A piece of one side: the cell it stands on and whether it is a king.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PiecePos {
    pub cell: u8,
    pub king: bool,
}

/// A parsed position string: side to move plus both sides' piece lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub turn: Player,
    pub white: Vec<PiecePos>,
    pub black: Vec<PiecePos>,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum FenError {
    #[display("position string does not have the <turn>:W<cells>:B<cells> layout")]
    BadLayout,
    #[display("unknown side to move: {turn:?}")]
    BadTurn { turn: String },
    #[display("unreadable cell token: {token:?}")]
    BadCell { token: String },
}

fn parse_side(list: &str) -> Result<Vec<PiecePos>, FenError> {
    if list.is_empty() {
        return Ok(Vec::new());
    }
    list.split(',')
        .map(|token| {
            let (king, number) = match token.strip_prefix('K') {
                Some(rest) => (true, rest),
                None => (false, token),
            };
            let cell = number.parse::<u8>().ok().filter(|&c| {
                (1..=u8::try_from(CELL_COUNT).unwrap_or(u8::MAX)).contains(&c)
            });
            match cell {
                Some(cell) => Ok(PiecePos { cell, king }),
                None => Err(FenError::BadCell {
                    token: token.to_owned(),
                }),
            }
        })
        .collect()
}

impl FromStr for GameState {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut sections = s.splitn(3, ':');
        let (Some(turn), Some(white), Some(black)) =
            (sections.next(), sections.next(), sections.next())
        else {
            return Err(FenError::BadLayout);
        };

        let turn = match turn {
            "W" => Player::White,
            "B" => Player::Black,
            other => {
                return Err(FenError::BadTurn {
                    turn: other.to_owned(),
                });
            }
        };

        let (Some(white), Some(black)) = (white.strip_prefix('W'), black.strip_prefix('B')) else {
            return Err(FenError::BadLayout);
        };

        Ok(GameState {
            turn,
            white: parse_side(white)?,
            black: parse_side(black)?,
        })
    }
}

fn write_side(f: &mut fmt::Formatter<'_>, pieces: &[PiecePos]) -> fmt::Result {
    for (i, piece) in pieces.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        if piece.king {
            write!(f, "K")?;
        }
        write!(f, "{}", piece.cell)?;
    }
    Ok(())
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:W", self.turn.as_char())?;
        write_side(f, &self.white)?;
        write!(f, ":B")?;
        write_side(f, &self.black)
    }
}
