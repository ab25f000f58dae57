//! Self-play evolutionary trainer for network-driven draughts agents.
//!
//! The training pipeline, leaf-first:
//!
//! 1. [`agent`] binds a network to a content-hash identity, a one-ply
//!    move-selection policy, and running match statistics.
//! 2. [`sim`] plays one complete game between two agents through the
//!    external rules engine and scores it.
//! 3. [`tournament`] runs bounded rounds of paired matches under
//!    anti-rematch and per-round games caps, re-ranking after each round.
//! 4. [`evolution`] orchestrates epochs: elitist retention, breeding,
//!    repeated tournaments, a top-player archive, and a final round-robin
//!    [`battle`] that picks the champion persisted through [`store`].
//!
//! The rules engine itself lives behind
//! [`draughtnet_rules::RulesEngine`]; the trainer only ever drives it.

pub use self::{
    agent::{Agent, AgentId, TrainedAgent},
    battle::play_battle,
    evolution::{Evolution, TrainError, TrainerConfig},
    sim::{MatchError, MatchRunner},
    store::{ModelStore, StoreError},
    tournament::play_tournament,
};

pub mod agent;
pub mod battle;
pub mod evolution;
pub mod sim;
pub mod store;
pub mod tournament;

#[cfg(test)]
pub(crate) mod testutil;
