//! Exhaustive round-robin among archived elites.

use draughtnet_rules::RulesEngine;

use crate::{
    agent::TrainedAgent,
    sim::{MatchError, MatchRunner},
};

/// Plays every unordered pair once (the symmetrized two-game match), records
/// the results on both sides, and leaves the list sorted by accumulated
/// score, best first.
pub fn play_battle<F, E>(
    players: &mut [TrainedAgent],
    runner: &MatchRunner<F>,
) -> Result<(), MatchError>
where
    F: Fn() -> E,
    E: RulesEngine,
{
    for i in 0..players.len().saturating_sub(1) {
        for j in i + 1..players.len() {
            let (head, tail) = players.split_at_mut(j);
            let earlier = &mut head[i];
            let later = &mut tail[0];
            let score = runner.play(later, earlier)?;
            let (earlier_id, later_id) = (earlier.id().clone(), later.id().clone());
            later.record_result(score, &earlier_id);
            earlier.record_result(-score, &later_id);
        }
    }

    players.sort_by(|a, b| b.score().cmp(&a.score()));
    Ok(())
}
