//! Multi-epoch evolution: elitist selection, breeding, tournaments, the
//! top-player archive, and champion persistence.

use std::{collections::HashSet, path::PathBuf};

use rand::Rng;

use draughtnet_model::{ModelError, Network, genetic, network::INITIAL_WEIGHT_SPREAD};
use draughtnet_rules::{CELL_COUNT, RulesEngine};

use crate::{
    agent::{AgentId, TrainedAgent},
    battle::play_battle,
    sim::{MatchError, MatchRunner},
    store::{ModelStore, StoreError},
    tournament::play_tournament,
};

/// Per-gene probability that crossover takes the second parent's value.
const CROSSOVER_PROB: f32 = 0.25;
/// Per-gene mutation probability.
const MUTATION_PROB: f32 = 0.25;
/// Width of the uniform mutation perturbation.
const MUTATION_DELTA: f32 = 0.5;

/// Training run parameters, handed over by the CLI collaborator as-is.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrainerConfig {
    /// Number of prior board snapshots the agents see.
    pub history_size: usize,
    /// Successive hidden-layer widths; must not be empty or contain zeros.
    pub hidden_layers: Vec<usize>,
    /// Select/breed/tournament cycles per iteration.
    pub epochs: usize,
    /// Population size each tournament runs over.
    pub population: usize,
    /// Independent training runs sharing one model directory.
    pub iterations: usize,
    /// Bootstrap the population from previously persisted champions.
    pub seed_from_best: bool,
    /// Root under which per-topology model directories live.
    pub model_root: PathBuf,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            history_size: 1,
            hidden_layers: vec![16],
            epochs: 64,
            population: 32,
            iterations: 1,
            seed_from_best: false,
            model_root: PathBuf::from("models"),
        }
    }
}

impl TrainerConfig {
    /// Network input width: one 50-cell slot for the move under evaluation
    /// plus one per history snapshot.
    #[must_use]
    pub fn network_inputs(&self) -> usize {
        (self.history_size + 1) * CELL_COUNT
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TrainError {
    #[display("hidden layer widths must be non-empty and positive")]
    EmptyTopology,
    #[display("{source}")]
    Model { source: ModelError },
    #[display("{source}")]
    Match { source: MatchError },
    #[display("{source}")]
    Store { source: StoreError },
}

impl From<ModelError> for TrainError {
    fn from(source: ModelError) -> Self {
        Self::Model { source }
    }
}

impl From<MatchError> for TrainError {
    fn from(source: MatchError) -> Self {
        Self::Match { source }
    }
}

impl From<StoreError> for TrainError {
    fn from(source: StoreError) -> Self {
        Self::Store { source }
    }
}

/// The epoch state machine.
///
/// Owns the run parameters, the match runner, and the model store; the
/// random source is threaded through [`Evolution::run`] so a seeded
/// generator reproduces a whole run.
#[derive(Debug)]
pub struct Evolution<F> {
    config: TrainerConfig,
    runner: MatchRunner<F>,
    store: ModelStore,
}

impl<F, E> Evolution<F>
where
    F: Fn() -> E,
    E: RulesEngine,
{
    pub fn new(config: TrainerConfig, runner: MatchRunner<F>) -> Result<Self, TrainError> {
        if config.hidden_layers.is_empty() || config.hidden_layers.contains(&0) {
            return Err(TrainError::EmptyTopology);
        }
        let store = ModelStore::open(
            &config.model_root,
            config.network_inputs(),
            &config.hidden_layers,
        )?;
        Ok(Self {
            config,
            runner,
            store,
        })
    }

    #[must_use]
    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Runs the configured number of training iterations and returns the
    /// champions persisted along the way (at most one per iteration).
    pub fn run<R>(&self, rng: &mut R) -> Result<Vec<AgentId>, TrainError>
    where
        R: Rng + ?Sized,
    {
        let mut champions = Vec::new();
        for iteration in 0..self.config.iterations {
            eprintln!("iteration {iteration}");
            if let Some(id) = self.run_once(rng)? {
                champions.push(id);
            }
        }
        Ok(champions)
    }

    /// One full training run: bootstrap, epochs, final battle, persistence.
    fn run_once<R>(&self, rng: &mut R) -> Result<Option<AgentId>, TrainError>
    where
        R: Rng + ?Sized,
    {
        // every member of a run shares this topology; only weights differ
        let base = Network::random(self.config.network_inputs(), &self.config.hidden_layers, rng)?;
        let topology = base.topology();
        let parameter_count = base.parameter_count();

        let mut archive: Vec<TrainedAgent> = Vec::new();
        let mut archived: HashSet<AgentId> = HashSet::new();
        let mut known_best: HashSet<AgentId> = HashSet::new();
        let mut players: Vec<TrainedAgent> = Vec::new();

        if self.config.seed_from_best {
            for bytes in self.store.load_all()? {
                let mut elite = TrainedAgent::from_model_bytes(&bytes)?;
                elite.set_age(1);
                known_best.insert(elite.id().clone());
                archived.insert(elite.id().clone());
                archive.push(elite.clone());
                players.push(elite);
            }
            eprintln!("seeded {} persisted models", players.len());

            // breed a wider first generation out of the loaded elites so
            // later generations have diversity to draw from
            let loaded = players.len();
            if loaded > 1 {
                let target = self.config.population.max(2 * loaded);
                breed_into(rng, &mut players, loaded, target, &topology)?;
            }
        }

        while players.len() < self.config.population {
            let weights = genetic::create_new(rng, parameter_count, INITIAL_WEIGHT_SPREAD);
            let fresh = TrainedAgent::from_model_bytes(&model_bytes(&topology, &weights))?;
            if players.iter().any(|p| p.id() == fresh.id()) {
                continue;
            }
            players.push(fresh);
        }

        play_tournament(&mut players, &self.runner)?;
        report_epoch(0, &players);

        for epoch in 1..=self.config.epochs + 1 {
            // keep the best quarter, start their next epoch, archive the
            // ones that have now survived a full tournament as elites
            players.truncate(self.config.population / 4);
            for player in &mut players {
                player.on_new_epoch();
            }
            archive_elites(&players, &mut archived, &mut archive);

            let survivors = players.len();
            breed_into(rng, &mut players, survivors, self.config.population, &topology)?;

            play_tournament(&mut players, &self.runner)?;
            report_epoch(epoch, &players);
        }

        archive_elites(&players, &mut archived, &mut archive);

        eprintln!("{} archived elites enter the final battle", archive.len());
        for player in &mut archive {
            player.on_new_epoch();
        }
        play_battle(&mut archive, &self.runner)?;
        for (rank, player) in archive.iter().enumerate() {
            let marker = if known_best.contains(player.id()) { '*' } else { ' ' };
            eprintln!("{:>4}{marker} {player}", rank + 1);
        }

        // only ever persist a strictly new champion
        let mut ranked = archive;
        while ranked.first().is_some_and(|p| known_best.contains(p.id())) {
            eprintln!("dropping already persisted {}", ranked[0].id());
            ranked.remove(0);
        }
        let Some(champion) = ranked.first() else {
            return Ok(None);
        };
        let path = self.store.save(champion.id(), &champion.serialize())?;
        eprintln!(
            "persisted champion {} ({} points) to {}",
            champion.id(),
            champion.score(),
            path.display()
        );
        Ok(Some(champion.id().clone()))
    }
}

/// Moves every tournament-proven elite (`age > 1`) into the append-only
/// archive, at most once per identity.
fn archive_elites(
    players: &[TrainedAgent],
    archived: &mut HashSet<AgentId>,
    archive: &mut Vec<TrainedAgent>,
) {
    for player in players {
        if player.age() > 1 && !archived.contains(player.id()) {
            archived.insert(player.id().clone());
            archive.push(player.clone());
            eprintln!("new top player {} ({} archived)", player.id(), archive.len());
        }
    }
}

/// Refills `players` up to `target` by breeding within the first
/// `parent_count` entries: parent A cycles deterministically, parent B is
/// drawn uniformly, offspring weights are `mutate(crossover(A, B))` wrapped
/// behind the shared topology header.
///
/// Self-pairings and offspring whose identity already exists in the
/// population are rejected; the attempt budget keeps a degenerate
/// population (fewer than two distinct identities) from spinning forever.
fn breed_into<R>(
    rng: &mut R,
    players: &mut Vec<TrainedAgent>,
    parent_count: usize,
    target: usize,
    topology: &[f32],
) -> Result<(), ModelError>
where
    R: Rng + ?Sized,
{
    if parent_count < 2 {
        return Ok(());
    }

    let mut cursor = 0;
    let mut attempts = 0usize;
    while players.len() < target {
        attempts += 1;
        if attempts > target.saturating_mul(64) {
            eprintln!(
                "breeding stalled after {attempts} attempts; population stays at {}",
                players.len()
            );
            break;
        }

        let a = cursor % parent_count;
        let b = rng.random_range(0..parent_count);
        if players[a].id() == players[b].id() {
            continue;
        }

        let crossed =
            genetic::crossover(rng, &players[a].weights(), &players[b].weights(), CROSSOVER_PROB)?;
        let child = genetic::mutate(rng, &crossed, MUTATION_PROB, MUTATION_DELTA);
        let offspring = TrainedAgent::from_model_bytes(&model_bytes(topology, &child))?;
        if players.iter().any(|p| p.id() == offspring.id()) {
            continue;
        }
        players.push(offspring);
        cursor += 1;
    }
    Ok(())
}

/// Assembles a serialized model buffer from a topology header and a
/// flattened weight vector.
fn model_bytes(topology: &[f32], weights: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity((topology.len() + weights.len()) * 4);
    for value in topology.iter().chain(weights) {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn report_epoch(epoch: usize, players: &[TrainedAgent]) {
    if let Some(leader) = players.first() {
        eprintln!(
            "epoch {epoch}: {} (age {}) with {} points",
            leader.id(),
            leader.age(),
            leader.score()
        );
    }
}
