//! Visit statistics and queue-pressure normalisation.
//!
//! The statistics forecast where other agents will be at a future instant
//! from their empirical choices. When every forecast agent is known to the
//! statistics, [`statistics_queue_scales`] turns those predictions into the
//! same normalised queue-pressure vector the simulator produces.

mod visits;

pub use visits::VisitStatistics;

use rand::Rng;

use crate::world::{AgentSnapshot, World};
use crate::Time;

/// Normalises queue lengths by their maximum.
///
/// Every value lands in `[0, 1]`; the longest queue maps to exactly `1.0`.
/// All zeros when no station has any queued length.
pub fn queue_scales(lengths: &[u64]) -> Vec<f64> {
    let max = lengths.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return vec![0.0; lengths.len()];
    }
    lengths
        .iter()
        .map(|&len| len as f64 / max as f64)
        .collect()
}

/// Whether the statistics can stand in for the simulator for these agents.
pub fn covers(stats: &VisitStatistics, agents: &[AgentSnapshot]) -> bool {
    agents.iter().all(|a| stats.knows(a.agent))
}

/// Queue pressure at `horizon`, predicted from visit statistics.
///
/// Each agent is advanced along its most likely targets; the station it is
/// bound for at the horizon accumulates `visit_time * fill` for that agent.
pub fn statistics_queue_scales<R: Rng + ?Sized>(
    world: &World<'_>,
    stats: &VisitStatistics,
    agents: &[AgentSnapshot],
    now: Time,
    horizon: Time,
    rng: &mut R,
) -> Vec<f64> {
    let mut lengths = vec![0u64; world.station_count()];

    for snapshot in agents {
        let agent = snapshot.agent;
        let station = match (snapshot.intention, snapshot.last_station) {
            (Some((target, eta)), last) => {
                let start = last.unwrap_or(target);
                stats.predict_station_at(world, agent, start, target, eta, horizon, rng)
            }
            (None, Some(last)) => match stats.predict_next_target(world, agent, last, rng) {
                Some(next) => match world.eta(agent, last, next) {
                    Some(step) => stats.predict_station_at(
                        world,
                        agent,
                        last,
                        next,
                        now.saturating_add(step),
                        horizon,
                        rng,
                    ),
                    None => last,
                },
                None => last,
            },
            (None, None) => continue,
        };

        let load = world
            .visit_time(agent, station)
            .saturating_mul(world.fill(agent, station));
        lengths[station.0] = lengths[station.0].saturating_add(load);
    }

    queue_scales(&lengths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{AgentIdx, StationIdx};
    use crate::world::fixtures::two_stations;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn scales_are_normalised() {
        let scales = queue_scales(&[4, 0, 2, 8]);
        assert_eq!(scales, vec![0.5, 0.0, 0.25, 1.0]);
        assert!(scales.iter().all(|&s| (0.0..=1.0).contains(&s)));
    }

    #[test]
    fn zero_lengths_give_zero_scales() {
        assert_eq!(queue_scales(&[0, 0, 0]), vec![0.0; 3]);
        assert!(queue_scales(&[]).is_empty());
    }

    #[test]
    fn statistics_forecast_places_agent_on_predicted_station() {
        let fx = two_stations(2);
        let world = fx.world();
        let mut stats = VisitStatistics::new(None);
        stats.record_transition(AgentIdx(1), StationIdx(1), StationIdx(0));

        let others = [AgentSnapshot {
            agent: AgentIdx(1),
            visiting: false,
            last_station: Some(StationIdx(0)),
            intention: Some((StationIdx(1), 7)),
        }];
        assert!(covers(&stats, &others));

        let mut rng = StdRng::seed_from_u64(11);
        let early = statistics_queue_scales(&world, &stats, &others, 1, 5, &mut rng);
        assert_eq!(early, vec![0.0, 1.0]);
        let later = statistics_queue_scales(&world, &stats, &others, 1, 9, &mut rng);
        assert_eq!(later, vec![1.0, 0.0]);
    }

    #[test]
    fn unknown_agents_are_not_covered() {
        let stats = VisitStatistics::new(None);
        let others = [AgentSnapshot {
            agent: AgentIdx(0),
            visiting: false,
            last_station: None,
            intention: None,
        }];
        assert!(!covers(&stats, &others));
        assert!(covers(&stats, &[]));
    }
}
