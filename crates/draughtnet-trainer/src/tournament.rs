//! Swiss-style bounded-round pairing over a ranked population.

use draughtnet_rules::RulesEngine;

use crate::{
    agent::TrainedAgent,
    sim::{MatchError, MatchRunner},
};

/// Runs `ceil(log2(n)) + 2` pairing rounds and leaves the population sorted
/// by accumulated score, best first.
///
/// Each round pairs every agent in the top half with the first agent at or
/// past the midpoint that (a) has not faced it this epoch and (b) has not
/// already played more games than the current round index. The forward scan
/// bounds the search per agent while the games guard keeps any single agent
/// from soaking up a round's matches. A slot with no eligible opponent is
/// skipped; an agent can finish a round without playing.
///
/// Scores accumulate through [`TrainedAgent::record_result`] on both sides
/// of every pairing; the re-sort after each round is stable, so exact ties
/// keep their relative order.
pub fn play_tournament<F, E>(
    players: &mut [TrainedAgent],
    runner: &MatchRunner<F>,
) -> Result<(), MatchError>
where
    F: Fn() -> E,
    E: RulesEngine,
{
    if players.len() < 2 {
        return Ok(());
    }

    let half = players.len() / 2;
    let rounds = players.len().next_power_of_two().ilog2() + 2;

    for round in 0..rounds {
        for player in players.iter_mut() {
            player.reset_history();
        }

        for j in 0..half {
            let opponent = (half..players.len()).find(|&dj| {
                !players[dj].has_played_before(players[j].id()) && players[dj].games() <= round
            });
            let Some(dj) = opponent else {
                eprintln!(
                    "round {round}: no eligible opponent for {}",
                    players[j].id()
                );
                continue;
            };

            let (top, bottom) = players.split_at_mut(half);
            let contender = &mut top[j];
            let challenger = &mut bottom[dj - half];
            let score = runner.play(contender, challenger)?;
            let (contender_id, challenger_id) =
                (contender.id().clone(), challenger.id().clone());
            contender.record_result(score, &challenger_id);
            challenger.record_result(-score, &contender_id);
        }

        players.sort_by(|a, b| b.score().cmp(&a.score()));
        eprintln!(
            "round {round}: leader {} with {} points",
            players[0].id(),
            players[0].score()
        );
    }

    Ok(())
}
