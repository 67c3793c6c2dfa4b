//! Empirical histograms of chosen next targets.

use std::collections::{BTreeMap, HashMap, VecDeque};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::index::{AgentIdx, StationIdx};
use crate::world::World;
use crate::Time;

type Histograms = HashMap<(AgentIdx, StationIdx), BTreeMap<StationIdx, u32>>;

/// Per-agent, per-source histograms of chosen targets.
///
/// Counts are kept per iteration (run). With `window = Some(w)` queries
/// aggregate the most recent `w` iterations, the current one included; with
/// `None` the whole history is aggregated.
#[derive(Debug, Clone)]
pub struct VisitStatistics {
    window: Option<usize>,
    iterations: VecDeque<Histograms>,
}

impl Default for VisitStatistics {
    fn default() -> Self {
        Self::new(None)
    }
}

impl VisitStatistics {
    pub fn new(window: Option<usize>) -> Self {
        let mut iterations = VecDeque::new();
        iterations.push_back(Histograms::new());
        Self { window, iterations }
    }

    /// Counts one realised `source → target` transition of `agent`.
    pub fn record_transition(&mut self, agent: AgentIdx, source: StationIdx, target: StationIdx) {
        if let Some(current) = self.iterations.back_mut() {
            *current
                .entry((agent, source))
                .or_default()
                .entry(target)
                .or_insert(0) += 1;
        }
    }

    /// Closes the current iteration and drops iterations that left the window.
    pub fn end_iteration(&mut self) {
        self.iterations.push_back(Histograms::new());
        if let Some(w) = self.window {
            while self.iterations.len() > w.max(1) {
                self.iterations.pop_front();
            }
        }
    }

    pub fn clear(&mut self) {
        self.iterations.clear();
        self.iterations.push_back(Histograms::new());
    }

    /// Aggregated histogram over the window, or `None` if nothing was recorded.
    pub fn histogram(&self, agent: AgentIdx, source: StationIdx) -> Option<BTreeMap<StationIdx, u32>> {
        let mut total: Option<BTreeMap<StationIdx, u32>> = None;
        for iteration in &self.iterations {
            if let Some(counts) = iteration.get(&(agent, source)) {
                let acc = total.get_or_insert_with(BTreeMap::new);
                for (&target, &count) in counts {
                    *acc.entry(target).or_insert(0) += count;
                }
            }
        }
        total
    }

    /// Whether any transition of `agent` is inside the window.
    pub fn knows(&self, agent: AgentIdx) -> bool {
        self.iterations
            .iter()
            .any(|it| it.keys().any(|&(a, _)| a == agent))
    }

    /// Most frequent target from `source`, lowest station index on ties.
    ///
    /// Without a histogram the target is drawn uniformly among the stations
    /// the agent can visit and reach; `None` when there are none.
    pub fn predict_next_target<R: Rng + ?Sized>(
        &self,
        world: &World<'_>,
        agent: AgentIdx,
        source: StationIdx,
        rng: &mut R,
    ) -> Option<StationIdx> {
        if let Some(counts) = self.histogram(agent, source) {
            let mut best: Option<(StationIdx, u32)> = None;
            for (&target, &count) in &counts {
                if best.map_or(true, |(_, c)| count > c) {
                    best = Some((target, count));
                }
            }
            if let Some((target, _)) = best {
                return Some(target);
            }
        }
        world
            .reachable_targets(agent, source)
            .choose(rng)
            .copied()
    }

    /// Station `agent` is heading to or being served at when `horizon` is reached.
    ///
    /// Starting from `start_station` with `start_target` reached at
    /// `start_eta`, the agent is advanced hop by hop along its predicted
    /// targets. A hop whose ETA is zero still advances one time unit.
    #[allow(clippy::too_many_arguments)]
    pub fn predict_station_at<R: Rng + ?Sized>(
        &self,
        world: &World<'_>,
        agent: AgentIdx,
        start_station: StationIdx,
        start_target: StationIdx,
        start_eta: Time,
        horizon: Time,
        rng: &mut R,
    ) -> StationIdx {
        let mut station = start_station;
        let mut target = start_target;
        let mut eta = start_eta;

        while eta < horizon {
            station = target;
            let Some(next) = self.predict_next_target(world, agent, station, rng) else {
                break;
            };
            let Some(step) = world.eta(agent, station, next) else {
                break;
            };
            target = next;
            eta = eta.saturating_add(step.max(1));
        }

        log::trace!("{agent} bound for {target} after {station} at horizon {horizon}");
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::fixtures::{one_way_line, two_stations};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const A0: AgentIdx = AgentIdx(0);
    const S1: StationIdx = StationIdx(0);
    const S2: StationIdx = StationIdx(1);

    #[test]
    fn modal_target_wins() {
        let fx = two_stations(1);
        let mut stats = VisitStatistics::new(None);
        stats.record_transition(A0, S1, S2);
        stats.record_transition(A0, S1, S2);
        stats.record_transition(A0, S1, S1);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(stats.predict_next_target(&fx.world(), A0, S1, &mut rng), Some(S2));
    }

    #[test]
    fn ties_break_by_lowest_index() {
        let fx = two_stations(1);
        let mut stats = VisitStatistics::new(None);
        stats.record_transition(A0, S1, S2);
        stats.record_transition(A0, S1, S1);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            assert_eq!(stats.predict_next_target(&fx.world(), A0, S1, &mut rng), Some(S1));
        }
    }

    #[test]
    fn fallback_samples_reachable_stations() {
        let fx = one_way_line(1);
        let stats = VisitStatistics::new(None);
        let mut rng = StdRng::seed_from_u64(7);
        // From `c` only `c` itself is reachable.
        for _ in 0..10 {
            assert_eq!(
                stats.predict_next_target(&fx.world(), A0, StationIdx(2), &mut rng),
                Some(StationIdx(2))
            );
        }
        for _ in 0..20 {
            let t = stats
                .predict_next_target(&fx.world(), A0, StationIdx(1), &mut rng)
                .unwrap();
            assert!(t == StationIdx(1) || t == StationIdx(2));
        }
    }

    #[test]
    fn window_drops_old_iterations() {
        let mut stats = VisitStatistics::new(Some(2));
        stats.record_transition(A0, S1, S2);
        stats.end_iteration();
        assert!(stats.knows(A0));
        stats.end_iteration();
        assert!(!stats.knows(A0));
        assert!(stats.histogram(A0, S1).is_none());
    }

    #[test]
    fn unbounded_window_aggregates_everything() {
        let mut stats = VisitStatistics::new(None);
        for _ in 0..5 {
            stats.record_transition(A0, S1, S2);
            stats.end_iteration();
        }
        assert_eq!(stats.histogram(A0, S1).unwrap().get(&S2), Some(&5));
    }

    #[test]
    fn predict_station_follows_histogram_until_horizon() {
        let fx = two_stations(1);
        let mut stats = VisitStatistics::new(None);
        stats.record_transition(A0, S1, S2);
        stats.record_transition(A0, S2, S1);
        let mut rng = StdRng::seed_from_u64(3);
        let world = fx.world();

        // Heading to S2, reached at 7: before that the agent is still bound for S2.
        assert_eq!(stats.predict_station_at(&world, A0, S1, S2, 7, 5, &mut rng), S2);
        // S2 -> S1 takes 3 + 2 = 5, so by 10 it is bound for S1.
        assert_eq!(stats.predict_station_at(&world, A0, S1, S2, 7, 10, &mut rng), S1);
        // S1 -> S2 takes 3 + 4 = 7 more, so at 13 it is bound for S2 again.
        assert_eq!(stats.predict_station_at(&world, A0, S1, S2, 7, 13, &mut rng), S2);
    }
}
