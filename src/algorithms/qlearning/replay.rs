//! Per-agent experience replay.

use std::collections::{BTreeMap, HashMap};

use rand::Rng;

use crate::index::{AgentIdx, StationIdx};
use crate::Time;

use super::config::ReplayConfig;

/// Identity of a buffered transition. Re-adding the same key overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplayKey {
    pub agent: AgentIdx,
    pub decision_time: Time,
    pub source: StationIdx,
    pub target: StationIdx,
}

/// A transition ready to be applied to the tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub source: StationIdx,
    pub target: StationIdx,
    pub queued: bool,
    pub reward: f64,
}

/// Buffered transitions of all agents.
///
/// Stored in a `BTreeMap` so that, for a given seed, sampling draws the
/// same entries regardless of insertion history.
#[derive(Debug, Clone, Default)]
pub struct ReplayBuffer {
    entries: BTreeMap<ReplayKey, (bool, f64)>,
    added_since_sample: HashMap<AgentIdx, usize>,
}

impl ReplayBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        agent: AgentIdx,
        source: StationIdx,
        target: StationIdx,
        queued: bool,
        reward: f64,
        decision_time: Time,
    ) {
        let key = ReplayKey {
            agent,
            decision_time,
            source,
            target,
        };
        self.entries.insert(key, (queued, reward));
        *self.added_since_sample.entry(agent).or_insert(0) += 1;
    }

    /// Draws `count` of the agent's transitions uniformly, with replacement.
    ///
    /// Empty when the agent has no buffered transitions.
    pub fn sample<R: Rng + ?Sized>(&self, agent: AgentIdx, count: usize, rng: &mut R) -> Vec<Transition> {
        let own: Vec<Transition> = self
            .entries
            .range(Self::agent_range(agent))
            .map(|(key, &(queued, reward))| Transition {
                source: key.source,
                target: key.target,
                queued,
                reward,
            })
            .collect();
        if own.is_empty() {
            return Vec::new();
        }
        (0..count)
            .map(|_| own[rng.gen_range(0..own.len())])
            .collect()
    }

    pub fn count_for(&self, agent: AgentIdx) -> usize {
        self.entries.range(Self::agent_range(agent)).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a batch should be drawn for `agent` now.
    pub fn ready(&self, agent: AgentIdx, config: &ReplayConfig) -> bool {
        let added = self.added_since_sample.get(&agent).copied().unwrap_or(0);
        self.count_for(agent) >= config.threshold && added >= config.interval.max(1)
    }

    /// Restarts the sampling interval of `agent`.
    pub fn mark_sampled(&mut self, agent: AgentIdx) {
        self.added_since_sample.insert(agent, 0);
    }

    pub fn clear_agent(&mut self, agent: AgentIdx) {
        self.entries.retain(|key, _| key.agent != agent);
        self.added_since_sample.remove(&agent);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.added_since_sample.clear();
    }

    fn agent_range(agent: AgentIdx) -> std::ops::RangeInclusive<ReplayKey> {
        let lo = ReplayKey {
            agent,
            decision_time: Time::MIN,
            source: StationIdx(usize::MIN),
            target: StationIdx(usize::MIN),
        };
        let hi = ReplayKey {
            agent,
            decision_time: Time::MAX,
            source: StationIdx(usize::MAX),
            target: StationIdx(usize::MAX),
        };
        lo..=hi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const A0: AgentIdx = AgentIdx(0);
    const A1: AgentIdx = AgentIdx(1);

    fn filled() -> ReplayBuffer {
        let mut buffer = ReplayBuffer::new();
        buffer.add(A0, StationIdx(0), StationIdx(1), false, 0.5, 1);
        buffer.add(A0, StationIdx(1), StationIdx(0), true, 0.25, 4);
        buffer.add(A0, StationIdx(0), StationIdx(2), false, 1.0, 9);
        buffer.add(A1, StationIdx(2), StationIdx(2), true, 0.0, 2);
        buffer
    }

    #[test]
    fn counts_are_per_agent() {
        let buffer = filled();
        assert_eq!(buffer.count_for(A0), 3);
        assert_eq!(buffer.count_for(A1), 1);
        assert_eq!(buffer.count_for(AgentIdx(7)), 0);
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn duplicate_key_overwrites() {
        let mut buffer = ReplayBuffer::new();
        buffer.add(A0, StationIdx(0), StationIdx(1), false, 0.5, 3);
        buffer.add(A0, StationIdx(0), StationIdx(1), true, 0.75, 3);
        assert_eq!(buffer.count_for(A0), 1);
        let mut rng = StdRng::seed_from_u64(0);
        let sample = buffer.sample(A0, 1, &mut rng);
        assert_eq!(
            sample,
            vec![Transition {
                source: StationIdx(0),
                target: StationIdx(1),
                queued: true,
                reward: 0.75,
            }]
        );
    }

    #[test]
    fn samples_come_from_inserted_set() {
        let buffer = filled();
        let mut rng = StdRng::seed_from_u64(42);
        let sample = buffer.sample(A0, 50, &mut rng);
        assert_eq!(sample.len(), 50);
        let inserted = [
            (StationIdx(0), StationIdx(1), false, 0.5),
            (StationIdx(1), StationIdx(0), true, 0.25),
            (StationIdx(0), StationIdx(2), false, 1.0),
        ];
        for t in sample {
            assert!(inserted.contains(&(t.source, t.target, t.queued, t.reward)));
        }
    }

    #[test]
    fn sampling_is_deterministic_under_seed() {
        let buffer = filled();
        let a = buffer.sample(A0, 10, &mut StdRng::seed_from_u64(5));
        let b = buffer.sample(A0, 10, &mut StdRng::seed_from_u64(5));
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_agent_samples_nothing() {
        let buffer = filled();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(buffer.sample(AgentIdx(9), 10, &mut rng).is_empty());
    }

    #[test]
    fn cadence_waits_for_threshold_and_interval() {
        let config = ReplayConfig {
            sample_size: 2,
            threshold: 3,
            interval: 2,
        };
        let mut buffer = ReplayBuffer::new();
        buffer.add(A0, StationIdx(0), StationIdx(1), false, 0.5, 1);
        buffer.add(A0, StationIdx(0), StationIdx(1), false, 0.5, 2);
        assert!(!buffer.ready(A0, &config));
        buffer.add(A0, StationIdx(0), StationIdx(1), false, 0.5, 3);
        assert!(buffer.ready(A0, &config));
        buffer.mark_sampled(A0);
        buffer.add(A0, StationIdx(0), StationIdx(1), false, 0.5, 4);
        assert!(!buffer.ready(A0, &config));
        buffer.add(A0, StationIdx(0), StationIdx(1), false, 0.5, 5);
        assert!(buffer.ready(A0, &config));
    }

    #[test]
    fn clear_agent_keeps_others() {
        let mut buffer = filled();
        buffer.clear_agent(A0);
        assert_eq!(buffer.count_for(A0), 0);
        assert_eq!(buffer.count_for(A1), 1);
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
