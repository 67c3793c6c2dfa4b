//! Per-target queue pressure at each target's own arrival time.

use std::collections::BTreeMap;

use rand::Rng;

use crate::algorithms::simulation::{QueueSimulator, TargetScorer};
use crate::statistics::{covers, statistics_queue_scales, VisitStatistics};
use crate::world::{AgentSnapshot, World};
use crate::Time;

/// Queue scale of every target `t` at time `etas[t]`; zero where `etas[t]` is `None`.
///
/// Visit statistics are used when they know every agent in `others`;
/// otherwise a single simulation is advanced through the horizons in
/// ascending order.
pub fn forecast_queue_scales<S, R>(
    world: World<'_>,
    scorer: &S,
    statistics: &VisitStatistics,
    others: &[AgentSnapshot],
    now: Time,
    etas: &[Option<Time>],
    rng: &mut R,
) -> Vec<f64>
where
    S: TargetScorer + ?Sized,
    R: Rng + ?Sized,
{
    let mut horizons: Vec<Time> = etas.iter().flatten().copied().collect();
    horizons.sort_unstable();
    horizons.dedup();

    let mut at: BTreeMap<Time, Vec<f64>> = BTreeMap::new();
    if covers(statistics, others) {
        for h in horizons {
            at.insert(
                h,
                statistics_queue_scales(&world, statistics, others, now, h, rng),
            );
        }
    } else {
        log::trace!("simulating {} agents for {} horizons", others.len(), horizons.len());
        let mut sim = QueueSimulator::new(world, scorer, others, now, rng);
        for h in horizons {
            sim.simulate_until(h, rng);
            at.insert(h, sim.get_queue_scales());
        }
    }

    etas.iter()
        .enumerate()
        .map(|(t, eta)| {
            eta.and_then(|h| at.get(&h))
                .and_then(|scales| scales.get(t).copied())
                .unwrap_or(0.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{AgentIdx, StationIdx};
    use crate::world::fixtures::one_way_line;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Stay;

    impl TargetScorer for Stay {
        fn has_model(&self, _agent: AgentIdx) -> bool {
            true
        }

        fn score(&self, _agent: AgentIdx, source: StationIdx, target: StationIdx, _scale: f64) -> f64 {
            if source == target {
                1.0
            } else {
                0.0
            }
        }
    }

    fn heading(agent: usize, target: usize, eta: Time) -> AgentSnapshot {
        AgentSnapshot {
            agent: AgentIdx(agent),
            visiting: false,
            last_station: None,
            intention: Some((StationIdx(target), eta)),
        }
    }

    #[test]
    fn simulator_fills_in_for_unknown_agents() {
        let fx = one_way_line(3);
        let stats = VisitStatistics::new(None);
        let others = [heading(1, 1, 3), heading(2, 1, 3)];
        let mut rng = StdRng::seed_from_u64(1);

        // `b` queues one agent from 3 onwards; `a` and `c` stay empty.
        let etas = [None, Some(4), Some(2)];
        let scales = forecast_queue_scales(fx.world(), &Stay, &stats, &others, 1, &etas, &mut rng);
        assert_eq!(scales, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn statistics_are_used_once_everyone_is_known() {
        let fx = one_way_line(2);
        let mut stats = VisitStatistics::new(None);
        stats.record_transition(AgentIdx(1), StationIdx(0), StationIdx(2));
        let others = [AgentSnapshot {
            agent: AgentIdx(1),
            visiting: false,
            last_station: Some(StationIdx(0)),
            intention: Some((StationIdx(1), 3)),
        }];
        let mut rng = StdRng::seed_from_u64(2);

        let etas = [Some(2), Some(2), Some(2)];
        let scales = forecast_queue_scales(fx.world(), &Stay, &stats, &others, 1, &etas, &mut rng);
        assert_eq!(scales, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn no_other_agents_means_no_pressure() {
        let fx = one_way_line(1);
        let stats = VisitStatistics::new(None);
        let mut rng = StdRng::seed_from_u64(3);
        let scales =
            forecast_queue_scales(fx.world(), &Stay, &stats, &[], 1, &[Some(3), None, Some(9)], &mut rng);
        assert_eq!(scales, vec![0.0; 3]);
    }
}
