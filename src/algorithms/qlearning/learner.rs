//! The learner: owns the value tables and the replay buffer.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use rand::Rng;

use crate::algorithms::simulation::TargetScorer;
use crate::index::{AgentIdx, AgentRegistry, StationIdx};
use crate::world::World;
use crate::Time;

use super::config::LearnerConfig;
use super::export::{prepare_directory, write_table, ExportError};
use super::replay::{ReplayBuffer, Transition};
use super::tables::{EvaluationMode, ValueTables};

/// Whose tables a lookup resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableOwner {
    Shared,
    Agent(AgentIdx),
}

/// Scores of every target from one source, computed once per decision round.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRound {
    pub time: Time,
    pub source: StationIdx,
    pub mode: EvaluationMode,
    /// Absolute time of reaching each target, `None` when unreachable.
    pub etas: Vec<Option<Time>>,
    pub scores: Vec<f64>,
}

/// Interval Q-learner for all agents.
///
/// Tables are created lazily on first use. In interval mode the upper-bound
/// tables start at `1 / (1 - γ)` for every pair the owner can visit and
/// reach, and at zero elsewhere.
#[derive(Debug, Clone)]
pub struct QLearner {
    config: LearnerConfig,
    tables: BTreeMap<TableOwner, ValueTables>,
    replay: ReplayBuffer,
    rounds: HashMap<AgentIdx, ScoreRound>,
}

impl QLearner {
    pub fn new(config: LearnerConfig) -> Self {
        Self {
            config,
            tables: BTreeMap::new(),
            replay: ReplayBuffer::new(),
            rounds: HashMap::new(),
        }
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    pub fn owner(&self, agent: AgentIdx) -> TableOwner {
        if self.config.shared_tables {
            TableOwner::Shared
        } else {
            TableOwner::Agent(agent)
        }
    }

    pub fn tables_for(&self, agent: AgentIdx) -> Option<&ValueTables> {
        self.tables.get(&self.owner(agent))
    }

    /// Mutable access for seeding tables, e.g. from pretrained values.
    pub fn tables_mut(&mut self, world: &World<'_>, agent: AgentIdx) -> &mut ValueTables {
        self.ensure_tables(world, agent)
    }

    pub fn replay(&self) -> &ReplayBuffer {
        &self.replay
    }

    fn ensure_tables(&mut self, world: &World<'_>, agent: AgentIdx) -> &mut ValueTables {
        let owner = self.owner(agent);
        let size = world.station_count();
        let interval = self.config.interval;
        let bound = self.config.upper_bound();

        self.tables.entry(owner).or_insert_with(|| {
            log::debug!("creating value tables for {owner:?} ({size} stations)");
            if interval {
                ValueTables::with_upper_bounds(size, |s, t| {
                    let feasible = world.can_visit(agent, s)
                        && world.can_visit(agent, t)
                        && world.stations.reachable(s, t);
                    if feasible {
                        bound
                    } else {
                        0.0
                    }
                })
            } else {
                ValueTables::new(size)
            }
        })
    }

    /// The cached round of `agent`, if it was computed for this time and source.
    pub fn round(&self, agent: AgentIdx, time: Time, source: StationIdx) -> Option<&ScoreRound> {
        self.rounds
            .get(&agent)
            .filter(|r| r.time == time && r.source == source)
    }

    /// Scores every target from `source` and caches the result for this round.
    ///
    /// `queue_scales[t]` is the forecast pressure at target `t` at the time
    /// the agent would reach it.
    #[allow(clippy::too_many_arguments)]
    pub fn begin_round(
        &mut self,
        world: &World<'_>,
        agent: AgentIdx,
        time: Time,
        source: StationIdx,
        mode: EvaluationMode,
        etas: Vec<Option<Time>>,
        queue_scales: &[f64],
    ) -> &ScoreRound {
        let scores = self.ensure_tables(world, agent).score_row(source, mode, queue_scales);
        log::trace!("{agent} at t={time} from {source} ({mode:?}): {scores:?}");
        let round = ScoreRound {
            time,
            source,
            mode,
            etas,
            scores,
        };
        self.rounds.insert(agent, round);
        &self.rounds[&agent]
    }

    /// Score of `target` in the agent's current round.
    pub fn evaluate(&self, agent: AgentIdx, time: Time, source: StationIdx, target: StationIdx) -> Option<f64> {
        self.round(agent, time, source)
            .and_then(|r| r.scores.get(target.0).copied())
    }

    /// Target ETA captured in the agent's current round.
    pub fn target_eta(&self, agent: AgentIdx, time: Time, source: StationIdx, target: StationIdx) -> Option<Time> {
        self.round(agent, time, source)
            .and_then(|r| r.etas.get(target.0).copied().flatten())
    }

    /// Learns from the outcome of `source → target` decided at `decision_time`.
    ///
    /// The transition counts as queued when the reward arrives after the ETA
    /// predicted at decision time. With replay enabled the transition is
    /// buffered and a batch is replayed whenever the cadence allows.
    #[allow(clippy::too_many_arguments)]
    pub fn reward<R: Rng + ?Sized>(
        &mut self,
        world: &World<'_>,
        agent: AgentIdx,
        source: StationIdx,
        target: StationIdx,
        value: f64,
        time: Time,
        target_eta: Time,
        decision_time: Time,
        rng: &mut R,
    ) {
        let queued = time > target_eta;
        let transition = Transition {
            source,
            target,
            queued,
            reward: value,
        };

        let replay = self.config.replay;
        if !replay.is_enabled() {
            self.apply(world, agent, &[transition]);
            return;
        }

        self.replay
            .add(agent, source, target, queued, value, decision_time);
        if self.replay.ready(agent, &replay) {
            let batch = self.replay.sample(agent, replay.sample_size, rng);
            log::debug!("replaying {} transitions for {agent}", batch.len());
            self.apply(world, agent, &batch);
            self.replay.mark_sampled(agent);
        }
    }

    /// Drains the agent's buffered transitions into the tables and forgets them.
    pub fn update_iteration<R: Rng + ?Sized>(&mut self, world: &World<'_>, agent: AgentIdx, rng: &mut R) {
        let count = self.replay.count_for(agent);
        if count > 0 {
            let batch = self.replay.sample(agent, count, rng);
            log::debug!("draining {count} buffered transitions for {agent}");
            self.apply(world, agent, &batch);
        }
        self.replay.clear_agent(agent);
    }

    /// Forgets every cached score round.
    pub fn clear_rounds(&mut self) {
        self.rounds.clear();
    }

    fn apply(&mut self, world: &World<'_>, agent: AgentIdx, batch: &[Transition]) {
        let (alpha, gamma) = (self.config.alpha, self.config.gamma);
        let tables = self.ensure_tables(world, agent);
        for t in batch {
            tables.update(t.source, t.target, t.queued, t.reward, alpha, gamma);
        }
    }

    /// Writes every table to `dir` as `<owner>_free.txt`, `<owner>_queued.txt`
    /// and, in interval mode, `<owner>_upper_free.txt` and
    /// `<owner>_upper_queued.txt`. Returns the number of files written.
    pub fn export_tables(&self, dir: &Path, agents: &AgentRegistry) -> Result<usize, ExportError> {
        prepare_directory(dir)?;
        let mut written = 0;
        for (owner, tables) in &self.tables {
            let prefix = match owner {
                TableOwner::Shared => "shared".to_string(),
                TableOwner::Agent(agent) => agents.name(*agent).to_string(),
            };
            write_table(&dir.join(format!("{prefix}_free.txt")), &tables.free)?;
            write_table(&dir.join(format!("{prefix}_queued.txt")), &tables.queued)?;
            written += 2;
            if let Some(upper) = &tables.upper {
                write_table(&dir.join(format!("{prefix}_upper_free.txt")), &upper.free)?;
                write_table(&dir.join(format!("{prefix}_upper_queued.txt")), &upper.queued)?;
                written += 2;
            }
        }
        log::debug!("exported {written} tables to {}", dir.display());
        Ok(written)
    }
}

impl TargetScorer for QLearner {
    fn has_model(&self, agent: AgentIdx) -> bool {
        self.tables_for(agent).is_some()
    }

    fn score(&self, agent: AgentIdx, source: StationIdx, target: StationIdx, queue_scale: f64) -> f64 {
        self.tables_for(agent)
            .map(|t| t.evaluate_without_prediction(source, target, queue_scale))
            .unwrap_or(0.0)
    }
}
