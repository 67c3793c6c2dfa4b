//! Simulation-scoped instances owned and mutated by the host.
//!
//! The policy only ever reads these.

use std::collections::BTreeMap;

use crate::Time;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A concrete station of some [`StationType`](super::StationType).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Station {
    pub name: String,
    pub station_type: String,
    /// Remaining frequency, if the type declares one.
    pub frequency: Option<u32>,
    /// Remaining required visits per agent name.
    pub necessities: BTreeMap<String, u32>,
}

impl Station {
    pub fn new(name: impl Into<String>, station_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            station_type: station_type.into(),
            frequency: None,
            necessities: BTreeMap::new(),
        }
    }

    /// Remaining visits this station requires from `agent`.
    pub fn necessity_for(&self, agent: &str) -> u32 {
        self.necessities.get(agent).copied().unwrap_or(0)
    }
}

/// A concrete agent of some [`AgentType`](super::AgentType).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Agent {
    pub name: String,
    pub agent_type: String,
    /// Remaining required visits per station name.
    pub necessities: BTreeMap<String, u32>,
    pub target: Option<String>,
    pub previous_target: Option<String>,
    /// Whether the agent is currently being served at its target.
    pub visiting: bool,
    /// Remaining on-station time while visiting.
    pub remaining_time: Option<u32>,
}

impl Agent {
    pub fn new(name: impl Into<String>, agent_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            agent_type: agent_type.into(),
            necessities: BTreeMap::new(),
            target: None,
            previous_target: None,
            visiting: false,
            remaining_time: None,
        }
    }

    /// Remaining visits this agent owes `station`.
    pub fn necessity_for(&self, station: &str) -> u32 {
        self.necessities.get(station).copied().unwrap_or(0)
    }

    /// Whether an obligation exists between this agent and `station`, in either direction.
    pub fn has_necessity_at(&self, station: &Station) -> bool {
        self.necessity_for(&station.name) > 0 || station.necessity_for(&self.name) > 0
    }
}

/// An agent's broadcast for the current time unit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Intention {
    /// Name of the target station.
    pub target: String,
    /// Predicted time of reaching the target.
    pub eta: Time,
    /// Evaluation score of the choice.
    pub score: f64,
}

impl Intention {
    pub fn new(target: impl Into<String>, eta: Time, score: f64) -> Self {
        Self {
            target: target.into(),
            eta,
            score,
        }
    }
}

/// One agent together with its current intention.
///
/// `intention == None` means the agent departs its current station this step.
#[derive(Debug, Clone, Copy)]
pub struct Communication<'a> {
    pub agent: &'a Agent,
    pub intention: Option<&'a Intention>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn necessity_defaults_to_zero() {
        let station = Station::new("S1", "Dock");
        let agent = Agent::new("a1", "Truck");
        assert_eq!(station.necessity_for("a1"), 0);
        assert_eq!(agent.necessity_for("S1"), 0);
        assert!(!agent.has_necessity_at(&station));
    }

    #[test]
    fn necessity_is_checked_both_ways() {
        let mut station = Station::new("S1", "Dock");
        let mut agent = Agent::new("a1", "Truck");

        agent.necessities.insert("S1".into(), 1);
        assert!(agent.has_necessity_at(&station));

        agent.necessities.clear();
        station.necessities.insert("a1".into(), 2);
        assert!(agent.has_necessity_at(&station));
    }
}
