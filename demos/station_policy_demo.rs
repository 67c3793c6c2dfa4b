// Demonstration: a toy host drives four trucks between two docks and a yard.
//
// Build/run from this repo root:
//   RUST_LOG=info cargo run --example station_policy_demo -- --runs 30 --steps 60 --seed 42

use std::env;
use std::error::Error;

use qstation::algorithms::qlearning::LearnerConfig;
use qstation::policy::{
    DecisionInput, ExplorationConfig, ExplorationSchedule, PolicyConfig, StationPolicy,
    StationStrategy,
};
use qstation::routing::{eta, visit_time};
use qstation::scenario::{
    Agent, AgentType, Communication, EdgeDirection, Intention, PlaceEdge, Scenario, Station,
    StationType,
};
use qstation::Time;

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Travelling { arrival: Time },
    Waiting { expected: Time },
    Visiting { until: Time },
}

struct Truck {
    agent: Agent,
    intention: Option<Intention>,
    phase: Phase,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let runs: u32 = arg_value(&args, "--runs")
        .and_then(|s| s.parse().ok())
        .unwrap_or(30);
    let steps: Time = arg_value(&args, "--steps")
        .and_then(|s| s.parse().ok())
        .unwrap_or(60);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let scenario = Scenario::new(
        vec![
            StationType::new("Dock")
                .with_space(1)
                .with_time(3)
                .with_place_edge(PlaceEdge::new("Yard", 2, EdgeDirection::UNDIRECTED)),
            StationType::new("Yard").with_time(1),
        ],
        vec![AgentType::new("Truck")
            .with_size(1)
            .visiting("Dock")
            .visiting("Yard")],
    )?;
    let stations = vec![
        Station::new("dock-1", "Dock"),
        Station::new("dock-2", "Dock"),
        Station::new("yard", "Yard"),
    ];

    let config = PolicyConfig {
        learner: LearnerConfig {
            interval: true,
            ..LearnerConfig::default()
        },
        exploration: ExplorationConfig {
            schedule: ExplorationSchedule::EpsilonDecay {
                start: 1.0,
                end: 0.05,
                rate: 0.15,
            },
            ..ExplorationConfig::default()
        },
        seed: Some(seed),
        ..PolicyConfig::default()
    };
    let policy = StationPolicy::new(scenario.clone(), config)?;
    let mut state = policy.new_state();

    for run in 0..runs {
        let mut trucks: Vec<Truck> = (0..4)
            .map(|i| {
                let mut agent = Agent::new(format!("truck-{i}"), "Truck");
                agent.previous_target = Some("yard".to_string());
                Truck {
                    agent,
                    intention: None,
                    phase: Phase::Idle,
                }
            })
            .collect();
        let (mut visits, mut late) = (0u32, 0u32);

        for t in 1..=steps {
            for i in 0..trucks.len() {
                let agents: Vec<Agent> = trucks.iter().map(|k| k.agent.clone()).collect();
                let intentions: Vec<Option<Intention>> =
                    trucks.iter().map(|k| k.intention.clone()).collect();
                let others: Vec<Communication<'_>> = agents
                    .iter()
                    .zip(&intentions)
                    .map(|(agent, intention)| Communication {
                        agent,
                        intention: intention.as_ref(),
                    })
                    .collect();
                let input = DecisionInput {
                    agent: &agents[i],
                    others: &others,
                    stations: &stations,
                    time: t,
                };

                match trucks[i].phase {
                    Phase::Idle => {
                        let (best, score) = stations
                            .iter()
                            .map(|s| (s, policy.evaluate(&mut state, &input, s)))
                            .fold(None, |acc: Option<(&Station, f64)>, (s, v)| match acc {
                                Some((_, best)) if best >= v => acc,
                                _ => Some((s, v)),
                            })
                            .ok_or("no stations")?;

                        let arrival = t + travel_eta(&scenario, &stations, &agents[i], best).unwrap_or(1);
                        let intention =
                            policy.communicate(&mut state, &input, Intention::new(&best.name, arrival, score));
                        let truck = &mut trucks[i];
                        truck.agent.target = Some(best.name.clone());
                        truck.phase = Phase::Travelling {
                            arrival: arrival.saturating_sub(service_time(&scenario, best)),
                        };
                        truck.intention = Some(intention);
                    }
                    Phase::Travelling { arrival } if t >= arrival => {
                        let expected = trucks[i].intention.as_ref().map_or(t, |i| i.eta);
                        trucks[i].phase = Phase::Waiting { expected };
                    }
                    Phase::Waiting { expected } => {
                        let Some(target) = trucks[i].agent.target.clone() else {
                            continue;
                        };
                        let Some(station) = stations.iter().find(|s| s.name == target) else {
                            continue;
                        };
                        if has_room(&scenario, &trucks, station) {
                            let end = t + service_time(&scenario, station);
                            let value = if end <= expected {
                                1.0
                            } else {
                                late += 1;
                                (1.0 - (end - expected) as f64 / 10.0).max(0.0)
                            };
                            policy.reward(&mut state, &input, value);
                            visits += 1;
                            let truck = &mut trucks[i];
                            truck.agent.visiting = true;
                            truck.phase = Phase::Visiting { until: end };
                        }
                    }
                    Phase::Visiting { until } if t >= until => {
                        let truck = &mut trucks[i];
                        truck.agent.visiting = false;
                        truck.agent.previous_target = truck.agent.target.take();
                        truck.intention = None;
                        truck.phase = Phase::Idle;
                    }
                    Phase::Travelling { .. } | Phase::Visiting { .. } => {}
                }
            }
        }

        log::info!("run {run}: {visits} visits, {late} late");
    }

    println!("Policy: {}", policy.name());
    println!("Completed runs: {}", state.run());
    Ok(())
}

fn service_time(scenario: &Scenario, station: &Station) -> Time {
    match (
        scenario.agent_type("Truck"),
        scenario.station_type(&station.station_type),
    ) {
        (Some(agent), Some(st)) => visit_time(agent, st),
        _ => 1,
    }
}

fn travel_eta(scenario: &Scenario, stations: &[Station], agent: &Agent, target: &Station) -> Option<Time> {
    let source = agent
        .previous_target
        .as_deref()
        .and_then(|name| stations.iter().find(|s| s.name == name))?;
    eta(
        scenario.graph(),
        scenario.agent_type(&agent.agent_type)?,
        scenario.station_type(&source.station_type)?,
        scenario.station_type(&target.station_type)?,
    )
}

fn has_room(scenario: &Scenario, trucks: &[Truck], station: &Station) -> bool {
    let Some(space) = scenario
        .station_type(&station.station_type)
        .and_then(|st| st.attributes.space)
    else {
        return true;
    };
    let occupied = trucks
        .iter()
        .filter(|k| matches!(k.phase, Phase::Visiting { .. }))
        .filter(|k| k.agent.target.as_deref() == Some(station.name.as_str()))
        .count();
    (occupied as u32) < space
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
