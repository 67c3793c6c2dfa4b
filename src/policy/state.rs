//! Mutable learning state threaded through every policy call.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::algorithms::qlearning::QLearner;
use crate::index::{AgentIdx, AgentRegistry, StationIdx, StationIndex};
use crate::statistics::VisitStatistics;
use crate::Time;

use super::config::PolicyConfig;

/// A communicated choice awaiting its reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDecision {
    pub source: StationIdx,
    pub target: StationIdx,
    pub decision_time: Time,
    /// Absolute time the target was expected to be reached.
    pub target_eta: Time,
}

/// Tables, statistics and bookkeeping shared by all agents of a policy.
///
/// Owned by the caller. A host calling from several threads wraps it in a
/// `Mutex`.
#[derive(Debug, Clone)]
pub struct PolicyState {
    pub(crate) stations: Option<StationIndex>,
    pub(crate) agents: AgentRegistry,
    pub(crate) learner: QLearner,
    pub(crate) statistics: VisitStatistics,
    pub(crate) rng: StdRng,
    pub(crate) run: u32,
    /// Latest host time seen in the current run.
    pub(crate) latest_time: Option<Time>,
    pub(crate) others_recorded: bool,
    pub(crate) last_stations: HashMap<AgentIdx, StationIdx>,
    pub(crate) pending: HashMap<AgentIdx, PendingDecision>,
}

impl PolicyState {
    pub fn new(config: &PolicyConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            stations: None,
            agents: AgentRegistry::new(),
            learner: QLearner::new(config.learner),
            statistics: VisitStatistics::new(config.statistics_window),
            rng,
            run: 0,
            latest_time: None,
            others_recorded: false,
            last_stations: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    /// Number of completed runs.
    pub fn run(&self) -> u32 {
        self.run
    }

    pub fn learner(&self) -> &QLearner {
        &self.learner
    }

    pub fn statistics(&self) -> &VisitStatistics {
        &self.statistics
    }

    /// The canonical station ordering, once the first station list was seen.
    pub fn stations(&self) -> Option<&StationIndex> {
        self.stations.as_ref()
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    /// Station `agent` was last known to be at in this run.
    pub fn last_station(&self, agent: AgentIdx) -> Option<StationIdx> {
        self.last_stations.get(&agent).copied()
    }

    pub fn pending_decision(&self, agent: AgentIdx) -> Option<&PendingDecision> {
        self.pending.get(&agent)
    }

    /// Forgets everything that only holds within one run.
    pub(crate) fn clear_run(&mut self) {
        self.latest_time = None;
        self.others_recorded = false;
        self.last_stations.clear();
        self.pending.clear();
        self.learner.clear_rounds();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_empty() {
        let state = PolicyState::new(&PolicyConfig::default());
        assert_eq!(state.run(), 0);
        assert!(state.stations().is_none());
        assert!(state.agents().is_empty());
        assert!(state.last_station(AgentIdx(0)).is_none());
    }

    #[test]
    fn clear_run_keeps_learning() {
        let mut state = PolicyState::new(&PolicyConfig {
            seed: Some(1),
            ..PolicyConfig::default()
        });
        state.last_stations.insert(AgentIdx(0), StationIdx(1));
        state.latest_time = Some(9);
        state.statistics
            .record_transition(AgentIdx(0), StationIdx(0), StationIdx(1));

        state.clear_run();
        assert!(state.last_station(AgentIdx(0)).is_none());
        assert!(state.latest_time.is_none());
        assert!(state.statistics().knows(AgentIdx(0)));
    }
}
