//! Plays single games between two agents through the rules engine.

use draughtnet_rules::{Cell, FenError, GameState, Player, RulesEngine};

use crate::agent::Agent;

/// Fixed base of every final score, and the score a forfeited game settles
/// at.
pub const BASE_SCORE: i32 = 250;

const MAN_VALUE: i32 = 3;
const KING_VALUE: i32 = 7;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum MatchError {
    /// The rules engine refused the acting agent's move (or the agent had
    /// none to offer). This is the candidate network's authoritative loss,
    /// not a transient fault; it is surfaced, never retried.
    #[display("{offender} had its move rejected by the rules engine")]
    MoveRejected { offender: Player },
    /// The rules engine produced a position string the trainer cannot read.
    /// Fatal: the collaborator broke its own contract.
    #[display("rules engine produced an unreadable position: {source}")]
    MalformedPosition { source: FenError },
}

/// Runs complete games, creating one isolated rules engine per game.
#[derive(Debug, Clone)]
pub struct MatchRunner<F> {
    new_engine: F,
}

impl<F, E> MatchRunner<F>
where
    F: Fn() -> E,
    E: RulesEngine,
{
    /// `new_engine` must yield a fresh engine at the initial position; each
    /// game gets its own instance, so games never share board state.
    pub fn new(new_engine: F) -> Self {
        Self { new_engine }
    }

    /// Plays one game to conclusion and returns the signed score: positive
    /// favors White, negative favors Black, magnitude is remaining material
    /// minus game length.
    pub fn play_match(
        &self,
        white: &mut dyn Agent,
        black: &mut dyn Agent,
    ) -> Result<i32, MatchError> {
        let mut engine = (self.new_engine)();
        white.set_player(Player::White);
        black.set_player(Player::Black);

        while !engine.game_over() {
            let turn = engine.turn();
            let state: GameState = engine
                .fen()
                .parse()
                .map_err(|source| MatchError::MalformedPosition { source })?;
            let legal = engine.legal_moves();
            let agent: &mut dyn Agent = match turn {
                Player::White => white,
                Player::Black => black,
            };
            let Some(mv) = agent.choose_move(&state, &legal) else {
                return Err(MatchError::MoveRejected { offender: turn });
            };
            if !engine.apply_move(&mv.to_string()) {
                return Err(MatchError::MoveRejected { offender: turn });
            }
        }

        Ok(final_score(&engine))
    }

    /// Plays the symmetrized pairing: one game per color assignment, second
    /// result negated, both summed. The color swap cancels the first-move
    /// advantage.
    ///
    /// A rejected move settles that game as a [`BASE_SCORE`] forfeit against
    /// the offender instead of failing the pairing; contract breaches still
    /// propagate.
    pub fn play(&self, a: &mut dyn Agent, b: &mut dyn Agent) -> Result<i32, MatchError> {
        let first = self.leg(a, b)?;
        let second = self.leg(b, a)?;
        Ok(first - second)
    }

    fn leg(&self, white: &mut dyn Agent, black: &mut dyn Agent) -> Result<i32, MatchError> {
        match self.play_match(white, black) {
            Ok(score) => Ok(score),
            Err(MatchError::MoveRejected { offender }) => Ok(forfeit(offender)),
            Err(err) => Err(err),
        }
    }
}

fn forfeit(offender: Player) -> i32 {
    match offender {
        Player::White => -BASE_SCORE,
        Player::Black => BASE_SCORE,
    }
}

/// `250 + 3 per man + 7 per king (both colors) − plies played`, negated
/// when Black is the declared winner.
fn final_score<E: RulesEngine>(engine: &E) -> i32 {
    let material: i32 = engine
        .cells()
        .iter()
        .map(|cell| match cell {
            Cell::Empty => 0,
            Cell::Man(_) => MAN_VALUE,
            Cell::King(_) => KING_VALUE,
        })
        .sum();
    let plies = i32::try_from(engine.ply_count()).unwrap_or(i32::MAX);
    let score = BASE_SCORE + material - plies;
    match engine.winner() {
        Some(Player::Black) => -score,
        _ => score,
    }
}

#[cfg(test)]
mod tests {
    use draughtnet_rules::Player;

    use crate::testutil::{ScriptedRules, uniform_agent};

    use super::*;

    #[test]
    fn score_formula_matches_the_worked_example() {
        // 4 men and 1 king left after 37 plies, White declared winner
        let script = ScriptedRules::forced_game(37, Player::White)
            .with_material(4, 1);
        let runner = MatchRunner::new(move || script.clone());
        let mut a = uniform_agent(1);
        let mut b = uniform_agent(2);
        assert_eq!(runner.play_match(&mut a, &mut b).unwrap(), 232);
    }

    #[test]
    fn black_victory_negates_the_score() {
        let script = ScriptedRules::forced_game(10, Player::Black).with_material(2, 0);
        let runner = MatchRunner::new(move || script.clone());
        let mut a = uniform_agent(1);
        let mut b = uniform_agent(2);
        assert_eq!(runner.play_match(&mut a, &mut b).unwrap(), -(250 + 6 - 10));
    }

    #[test]
    fn color_swap_makes_play_antisymmetric() {
        let script = ScriptedRules::forced_game(8, Player::White).with_material(3, 1);
        let runner = MatchRunner::new(move || script.clone());
        let mut a = uniform_agent(5);
        let mut b = uniform_agent(6);

        a.reset_history();
        b.reset_history();
        let forward = runner.play(&mut a, &mut b).unwrap();

        a.reset_history();
        b.reset_history();
        let backward = runner.play(&mut b, &mut a).unwrap();

        assert_eq!(forward, -backward);
    }

    #[test]
    fn rejected_move_names_the_offender() {
        let script = ScriptedRules::forced_game(6, Player::White)
            .with_material(1, 0)
            .rejecting_at_ply(1);
        let runner = MatchRunner::new(move || script.clone());
        let mut a = uniform_agent(1);
        let mut b = uniform_agent(2);
        // ply 1 is Black's move
        match runner.play_match(&mut a, &mut b) {
            Err(MatchError::MoveRejected { offender }) => assert_eq!(offender, Player::Black),
            other => panic!("expected a rejection, got {other:?}"),
        }
    }

    #[test]
    fn play_absorbs_forfeits_symmetrically() {
        // both legs forfeit at ply 0, so the White seat loses each game and
        // the symmetrized total cancels out
        let script = ScriptedRules::forced_game(6, Player::White)
            .with_material(1, 0)
            .rejecting_at_ply(0);
        let runner = MatchRunner::new(move || script.clone());
        let mut a = uniform_agent(1);
        let mut b = uniform_agent(2);
        assert_eq!(runner.play(&mut a, &mut b).unwrap(), 0);
    }

    #[test]
    fn every_game_gets_a_fresh_engine() {
        let script = ScriptedRules::forced_game(4, Player::White).with_material(1, 0);
        let runner = MatchRunner::new(move || script.clone());
        let mut a = uniform_agent(1);
        let mut b = uniform_agent(2);
        let first = runner.play_match(&mut a, &mut b).unwrap();
        let second = runner.play_match(&mut a, &mut b).unwrap();
        assert_eq!(first, second);
    }
}
