//! Forward discrete-event simulation of station occupancy.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;

use crate::index::{AgentIdx, StationIdx};
use crate::statistics::queue_scales;
use crate::world::{AgentSnapshot, World};
use crate::Time;

use super::event::{Event, EventKind, EventQueue};

/// Picks the next target of a simulated agent.
pub trait TargetScorer {
    /// Whether learned values exist for `agent`. Without them the simulator
    /// scores candidates uniformly at random.
    fn has_model(&self, agent: AgentIdx) -> bool;

    /// Value of going `source → target` when `target` has queue pressure `queue_scale`.
    fn score(&self, agent: AgentIdx, source: StationIdx, target: StationIdx, queue_scale: f64) -> f64;
}

/// Simulates every agent forward from the host's current state to forecast
/// how busy each station will be.
///
/// Construction seeds one event per agent: an arrival at its communicated
/// target, or else an immediate departure from its last known station.
/// Events before the current time are then replayed to reconcile the model
/// with what the host reports:
///
/// - an agent the host marks as visiting is admitted at its target no matter
///   the capacity, and leaves at `max(arrival + visit_time, now)`
/// - any other agent that already arrived is queued at its target
///
/// Agents with neither a target nor a last station are not simulated.
pub struct QueueSimulator<'a, S: TargetScorer + ?Sized> {
    world: World<'a>,
    scorer: &'a S,
    events: EventQueue,
    now: Time,
    clock: Time,
    occupancy: Vec<u64>,
    visiting: BTreeMap<AgentIdx, StationIdx>,
    waiting: BTreeMap<AgentIdx, StationIdx>,
    forced: BTreeSet<AgentIdx>,
}

impl<'a, S: TargetScorer + ?Sized> QueueSimulator<'a, S> {
    pub fn new<R: Rng + ?Sized>(
        world: World<'a>,
        scorer: &'a S,
        agents: &[AgentSnapshot],
        now: Time,
        rng: &mut R,
    ) -> Self {
        let mut sim = Self {
            world,
            scorer,
            events: EventQueue::new(),
            now,
            clock: 0,
            occupancy: vec![0; world.station_count()],
            visiting: BTreeMap::new(),
            waiting: BTreeMap::new(),
            forced: BTreeSet::new(),
        };

        for snapshot in agents {
            match (snapshot.intention, snapshot.last_station) {
                (Some((target, eta)), _) => {
                    if snapshot.visiting {
                        sim.forced.insert(snapshot.agent);
                    }
                    sim.events
                        .push(eta, EventKind::Arrival, snapshot.agent, target);
                }
                (None, Some(last)) => {
                    sim.events
                        .push(now, EventKind::Departure, snapshot.agent, last);
                }
                (None, None) => {}
            }
        }

        sim.run_until(now, true, rng);
        sim
    }

    /// Processes every event strictly before `time`.
    pub fn simulate_until<R: Rng + ?Sized>(&mut self, time: Time, rng: &mut R) {
        self.run_until(time, false, rng);
    }

    fn run_until<R: Rng + ?Sized>(&mut self, time: Time, bootstrap: bool, rng: &mut R) {
        while let Some(next) = self.events.peek_time() {
            if next >= time {
                break;
            }
            let Some(event) = self.events.pop() else {
                break;
            };
            self.clock = event.time;
            match event.kind {
                EventKind::Arrival => self.handle_arrival(event, bootstrap),
                EventKind::Departure => self.handle_departure(event, rng),
            }
        }
    }

    fn handle_arrival(&mut self, event: Event, bootstrap: bool) {
        let Event {
            time,
            agent,
            station,
            ..
        } = event;

        if self.forced.remove(&agent) {
            let departure = time
                .saturating_add(self.world.visit_time(agent, station))
                .max(self.now);
            self.admit(agent, station, departure);
            return;
        }

        if !bootstrap && self.can_visit(agent, station) {
            let departure = time.saturating_add(self.world.visit_time(agent, station));
            self.admit(agent, station, departure);
            return;
        }

        self.waiting.insert(agent, station);
        if !self.fits(agent, station) {
            log::trace!("{agent} never fits {station}, parked");
            return;
        }
        let retry = self
            .events
            .earliest_departure_from(station)
            .filter(|&t| t >= time)
            .unwrap_or(time.saturating_add(1));
        self.events.push(retry, EventKind::Arrival, agent, station);
    }

    fn admit(&mut self, agent: AgentIdx, station: StationIdx, departure: Time) {
        self.waiting.remove(&agent);
        self.visiting.insert(agent, station);
        let fill = self.world.fill(agent, station);
        self.occupancy[station.0] = self.occupancy[station.0].saturating_add(fill);
        self.events
            .push(departure, EventKind::Departure, agent, station);
    }

    fn handle_departure<R: Rng + ?Sized>(&mut self, event: Event, rng: &mut R) {
        let Event {
            time,
            agent,
            station,
            ..
        } = event;

        if let Some(left) = self.visiting.remove(&agent) {
            let fill = self.world.fill(agent, left);
            self.occupancy[left.0] = self.occupancy[left.0].saturating_sub(fill);
        }

        let candidates = self.world.reachable_targets(agent, station);
        let scales = self.get_queue_scales();
        let learned = self.scorer.has_model(agent);

        let mut best: Option<(StationIdx, f64)> = None;
        for target in candidates {
            let score = if learned {
                let scale = scales.get(target.0).copied().unwrap_or(0.0);
                self.scorer.score(agent, station, target, scale)
            } else {
                rng.gen::<f64>()
            };
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((target, score));
            }
        }

        let Some((target, _)) = best else {
            log::trace!("{agent} idles at {station} from t={time}");
            return;
        };
        let Some(eta) = self.world.eta(agent, station, target) else {
            return;
        };
        self.events
            .push(time.saturating_add(eta.max(1)), EventKind::Arrival, agent, target);
    }

    /// Whether the station has room for `agent`. Stations without a declared
    /// space admit everyone.
    pub fn can_visit(&self, agent: AgentIdx, station: StationIdx) -> bool {
        match self.world.stations.space(station) {
            None => true,
            Some(space) => {
                self.occupancy[station.0].saturating_add(self.world.fill(agent, station))
                    <= u64::from(space)
            }
        }
    }

    /// Whether `agent` fits `station` when it is empty.
    fn fits(&self, agent: AgentIdx, station: StationIdx) -> bool {
        self.world
            .stations
            .space(station)
            .map_or(true, |space| self.world.fill(agent, station) <= u64::from(space))
    }

    /// Station-time the waiting agents will consume once served.
    pub fn get_queue_lengths(&self) -> Vec<u64> {
        let mut lengths = vec![0u64; self.world.station_count()];
        for (&agent, &station) in &self.waiting {
            let load = self
                .world
                .visit_time(agent, station)
                .saturating_mul(self.world.fill(agent, station));
            lengths[station.0] = lengths[station.0].saturating_add(load);
        }
        lengths
    }

    /// Queue lengths normalised by their maximum.
    pub fn get_queue_scales(&self) -> Vec<f64> {
        queue_scales(&self.get_queue_lengths())
    }

    /// Time of the last processed event.
    pub fn clock(&self) -> Time {
        self.clock
    }

    pub fn visiting_station(&self, agent: AgentIdx) -> Option<StationIdx> {
        self.visiting.get(&agent).copied()
    }

    pub fn waiting_station(&self, agent: AgentIdx) -> Option<StationIdx> {
        self.waiting.get(&agent).copied()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}

/// Runs a fresh simulation from `now` to `horizon` and returns the queue
/// scales there.
pub fn predict_queue_scales<S, R>(
    world: World<'_>,
    scorer: &S,
    agents: &[AgentSnapshot],
    now: Time,
    horizon: Time,
    rng: &mut R,
) -> Vec<f64>
where
    S: TargetScorer + ?Sized,
    R: Rng + ?Sized,
{
    let mut sim = QueueSimulator::new(world, scorer, agents, now, rng);
    sim.simulate_until(horizon, rng);
    sim.get_queue_scales()
}
