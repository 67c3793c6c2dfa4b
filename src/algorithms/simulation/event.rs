//! Simulation events and their processing order.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::index::{AgentIdx, StationIdx};
use crate::Time;

/// What happens to an agent at an event.
///
/// The declaration order is the processing order at equal timestamps:
/// capacity freed by a departure is visible to an arrival at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    /// The agent leaves `station` and picks its next target.
    Departure = 1,
    /// The agent reaches `station` and asks to be served.
    Arrival = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub time: Time,
    pub kind: EventKind,
    pub agent: AgentIdx,
    pub station: StationIdx,
    /// Insertion sequence, the last tie-breaker.
    pub seq: u64,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.time, self.kind, self.agent, self.seq).cmp(&(other.time, other.kind, other.agent, other.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-queue of pending events.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<Event>>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time: Time, kind: EventKind, agent: AgentIdx, station: StationIdx) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Event {
            time,
            kind,
            agent,
            station,
            seq,
        }));
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.heap.pop().map(|Reverse(e)| e)
    }

    /// Timestamp of the earliest pending event.
    pub fn peek_time(&self) -> Option<Time> {
        self.heap.peek().map(|Reverse(e)| e.time)
    }

    /// Earliest pending departure from `station`.
    pub fn earliest_departure_from(&self, station: StationIdx) -> Option<Time> {
        self.heap
            .iter()
            .filter(|Reverse(e)| e.kind == EventKind::Departure && e.station == station)
            .map(|Reverse(e)| e.time)
            .min()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
