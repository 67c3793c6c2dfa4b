//! The interval Q-learning station policy.

use rand::Rng;

use crate::algorithms::qlearning::{ConfigError, EvaluationMode, QLearner, ValueTables};
use crate::index::{AgentIdx, StationIdx, StationIndex};
use crate::scenario::{Agent, Intention, Scenario, Station};
use crate::statistics::VisitStatistics;
use crate::world::{AgentSnapshot, World};
use crate::Time;

use super::config::PolicyConfig;
use super::error::PolicyError;
use super::forecast::forecast_queue_scales;
use super::state::{PendingDecision, PolicyState};
use super::trait_::{DecisionInput, StationStrategy};

/// Score that rules a candidate out.
pub const NEVER: f64 = -1.0;

/// Station selection by learned free/queued values under hard constraints.
///
/// For every candidate the learned value is computed first, so the tables
/// see every offered action, and then the first matching rule decides:
///
/// 1. the agent still owes a visit somewhere but not at the candidate: [`NEVER`]
/// 2. the agent has no previous station yet: a uniform random score
/// 3. the current station type still has an obligation and the candidate
///    cannot lead back to it: the learned value for a station of the same
///    type, [`NEVER`] otherwise
/// 4. the candidate is not reachable without skipping unrecoverable types:
///    [`NEVER`]
/// 5. with the scheduled exploration probability: a uniform random score
/// 6. the learned value
///
/// In interval mode each decision round additionally makes its own draw from
/// the schedule; a round that explores is scored with the configured
/// explore mode instead of `Exploit`.
#[derive(Debug, Clone)]
pub struct StationPolicy {
    scenario: Scenario,
    config: PolicyConfig,
}

impl StationPolicy {
    /// # Errors
    ///
    /// Returns the first invalid setting of `config`.
    pub fn new(scenario: Scenario, config: PolicyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { scenario, config })
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Fresh state configured for this policy.
    pub fn new_state(&self) -> PolicyState {
        PolicyState::new(&self.config)
    }

    /// Fixes the canonical station ordering, unless it already is.
    pub fn prepare(&self, state: &mut PolicyState, stations: &[Station]) -> Result<(), PolicyError> {
        if state.stations.is_none() {
            let index = StationIndex::new(stations, &self.scenario)?;
            log::debug!("indexed {} stations", index.len());
            state.stations = Some(index);
        }
        Ok(())
    }

    /// Runs `f` on the tables `agent` learns into, creating them if needed.
    ///
    /// Useful to seed pretrained values. Requires [`prepare`](Self::prepare).
    pub fn with_tables<T>(
        &self,
        state: &mut PolicyState,
        agent: &Agent,
        f: impl FnOnce(&StationIndex, &mut ValueTables) -> T,
    ) -> Result<T, PolicyError> {
        let idx = state.agents.register(agent, &self.scenario)?;
        let PolicyState {
            stations,
            agents,
            learner,
            ..
        } = state;
        let stations = stations.as_ref().ok_or(PolicyError::StationsNotIndexed)?;
        let world = World::new(&self.scenario, stations, agents);
        Ok(f(stations, learner.tables_mut(&world, idx)))
    }

    /// Starts a new run when host time went back to 1.
    fn observe_time(&self, state: &mut PolicyState, time: Time) {
        match state.latest_time {
            Some(latest) if time == 1 && latest > 1 => {
                self.end_run(state);
                state.latest_time = Some(time);
            }
            Some(latest) => state.latest_time = Some(latest.max(time)),
            None => state.latest_time = Some(time),
        }
    }

    fn end_run(&self, state: &mut PolicyState) {
        let PolicyState {
            stations,
            agents,
            learner,
            statistics,
            rng,
            run,
            ..
        } = state;

        if let Some(stations) = stations.as_ref() {
            let world = World::new(&self.scenario, stations, agents);
            for agent in agents.iter() {
                learner.update_iteration(&world, agent, rng);
            }
        }
        statistics.end_iteration();
        *run += 1;
        log::debug!("run {} finished", *run);

        if let (true, Some(export)) = (self.config.learner.interval, &self.config.export) {
            if *run % export.every_runs == 0 {
                match learner.export_tables(&export.directory, agents) {
                    Ok(n) => log::debug!("run {}: exported {n} tables", *run),
                    Err(e) => log::warn!("run {}: table export failed: {e}", *run),
                }
            }
        }

        state.clear_run();
    }

    fn register_all(&self, state: &mut PolicyState, input: &DecisionInput<'_>) -> Result<AgentIdx, PolicyError> {
        for other in input.others {
            state.agents.register(other.agent, &self.scenario)?;
        }
        Ok(state.agents.register(input.agent, &self.scenario)?)
    }

    fn try_evaluate(
        &self,
        state: &mut PolicyState,
        input: &DecisionInput<'_>,
        candidate: &Station,
    ) -> Result<f64, PolicyError> {
        self.prepare(state, input.stations)?;
        self.observe_time(state, input.time);
        let agent = self.register_all(state, input)?;

        let PolicyState {
            stations,
            agents,
            learner,
            statistics,
            rng,
            run,
            others_recorded,
            last_stations,
            ..
        } = state;
        let stations = stations.as_ref().ok_or(PolicyError::StationsNotIndexed)?;
        let world = World::new(&self.scenario, stations, agents);
        let me = input.agent;

        let target = stations.require(&candidate.name)?;
        let current = me
            .previous_target
            .as_deref()
            .map(|name| stations.require(name))
            .transpose()?;
        if let Some(current) = current {
            last_stations.insert(agent, current);
        }
        if !*others_recorded {
            for other in input.others {
                let previous = other.agent.previous_target.as_deref();
                if let (Some(idx), Some(station)) = (
                    agents.idx(&other.agent.name),
                    previous.and_then(|name| stations.idx(name)),
                ) {
                    last_stations.insert(idx, station);
                }
            }
            *others_recorded = true;
        }

        let owes_anywhere = input.stations.iter().any(|s| me.has_necessity_at(s));
        let owes_candidate = me.has_necessity_at(candidate);
        let owes_current_type = current.is_some_and(|c| {
            let ty = stations.station_type(c);
            input
                .stations
                .iter()
                .filter(|s| s.station_type == ty)
                .any(|s| me.has_necessity_at(s))
        });

        let learned = match current {
            Some(source) => {
                let others: Vec<AgentSnapshot> = input
                    .others
                    .iter()
                    .filter(|c| c.agent.name != me.name)
                    .filter_map(|c| {
                        let idx = agents.idx(&c.agent.name)?;
                        Some(AgentSnapshot {
                            agent: idx,
                            visiting: c.agent.visiting,
                            last_station: last_stations.get(&idx).copied(),
                            intention: c
                                .intention
                                .and_then(|i| stations.idx(&i.target).map(|t| (t, i.eta))),
                        })
                    })
                    .collect();
                let round = Round {
                    world,
                    agent,
                    source,
                    now: input.time,
                    run: *run,
                };
                Some(self.learned_score(&round, learner, statistics, &others, target, rng))
            }
            None => None,
        };

        if owes_anywhere && !owes_candidate {
            return Ok(NEVER);
        }
        let (Some(current), Some(learned)) = (current, learned) else {
            return Ok(rng.gen::<f64>());
        };
        if owes_current_type && !stations.reachable(target, current) {
            let same_type = stations.station_type(target) == stations.station_type(current);
            return Ok(if same_type { learned } else { NEVER });
        }
        if !stations.reachable_without_skip(current, target) {
            return Ok(NEVER);
        }
        if self.config.exploration.schedule.explore(*run, rng) {
            return Ok(rng.gen::<f64>());
        }
        Ok(learned)
    }

    /// Learned score of `target`, computing the agent's round on first use.
    fn learned_score<R: Rng + ?Sized>(
        &self,
        round: &Round<'_>,
        learner: &mut QLearner,
        statistics: &VisitStatistics,
        others: &[AgentSnapshot],
        target: StationIdx,
        rng: &mut R,
    ) -> f64 {
        let Round {
            world,
            agent,
            source,
            now,
            run,
        } = *round;

        if learner.round(agent, now, source).is_none() {
            let exploring = self.config.learner.interval && self.config.exploration.schedule.explore(run, rng);
            let mode = if exploring {
                self.config.exploration.explore_mode
            } else {
                EvaluationMode::Exploit
            };
            let etas: Vec<Option<Time>> = world
                .stations
                .iter()
                .map(|t| world.eta(agent, source, t).map(|e| now.saturating_add(e)))
                .collect();
            let scales = forecast_queue_scales(world, &*learner, statistics, others, now, &etas, rng);
            learner.begin_round(&world, agent, now, source, mode, etas, &scales);
        }
        learner.evaluate(agent, now, source, target).unwrap_or(0.0)
    }

    fn try_communicate(
        &self,
        state: &mut PolicyState,
        input: &DecisionInput<'_>,
        default: &Intention,
    ) -> Result<(), PolicyError> {
        let agent = state.agents.register(input.agent, &self.scenario)?;
        let stations = state.stations.as_ref().ok_or(PolicyError::StationsNotIndexed)?;
        let target = stations.require(&default.target)?;
        let Some(source) = input
            .agent
            .previous_target
            .as_deref()
            .map(|name| stations.require(name))
            .transpose()?
        else {
            return Ok(());
        };

        // Re-announcing the same move keeps the original decision.
        if let Some(pending) = state.pending.get(&agent) {
            if pending.source == source && pending.target == target {
                return Ok(());
            }
        }

        let target_eta = state
            .learner
            .target_eta(agent, input.time, source, target)
            .unwrap_or(default.eta);
        state.pending.insert(
            agent,
            PendingDecision {
                source,
                target,
                decision_time: input.time,
                target_eta,
            },
        );
        Ok(())
    }

    fn try_reward(&self, state: &mut PolicyState, input: &DecisionInput<'_>, value: f64) -> Result<(), PolicyError> {
        let agent = state.agents.register(input.agent, &self.scenario)?;
        let Some(decision) = state.pending.remove(&agent) else {
            log::debug!("reward for `{}` without a communicated decision", input.agent.name);
            return Ok(());
        };

        let PolicyState {
            stations,
            agents,
            learner,
            statistics,
            rng,
            ..
        } = state;
        let stations = stations.as_ref().ok_or(PolicyError::StationsNotIndexed)?;
        let world = World::new(&self.scenario, stations, agents);

        learner.reward(
            &world,
            agent,
            decision.source,
            decision.target,
            value,
            input.time,
            decision.target_eta,
            decision.decision_time,
            rng,
        );
        statistics.record_transition(agent, decision.source, decision.target);
        Ok(())
    }
}

/// Who decides where, and when.
#[derive(Clone, Copy)]
struct Round<'a> {
    world: World<'a>,
    agent: AgentIdx,
    source: StationIdx,
    now: Time,
    run: u32,
}

impl StationStrategy for StationPolicy {
    fn evaluate(&self, state: &mut PolicyState, input: &DecisionInput<'_>, candidate: &Station) -> f64 {
        match self.try_evaluate(state, input, candidate) {
            Ok(score) => score,
            Err(e) => {
                log::error!(
                    "evaluate `{}` for `{}` at t={}: {e}",
                    candidate.name,
                    input.agent.name,
                    input.time
                );
                NEVER
            }
        }
    }

    fn communicate(&self, state: &mut PolicyState, input: &DecisionInput<'_>, default: Intention) -> Intention {
        if let Err(e) = self.try_communicate(state, input, &default) {
            log::error!("communicate for `{}` at t={}: {e}", input.agent.name, input.time);
        }
        default
    }

    fn reward(&self, state: &mut PolicyState, input: &DecisionInput<'_>, value: f64) {
        if let Err(e) = self.try_reward(state, input, value) {
            log::error!("reward for `{}` at t={}: {e}", input.agent.name, input.time);
        }
    }

    fn name(&self) -> &str {
        if self.config.learner.interval {
            "interval-q-learning"
        } else {
            "q-learning"
        }
    }
}
