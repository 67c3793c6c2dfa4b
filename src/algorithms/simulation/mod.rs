//! Discrete-event forecast of station queues.
//!
//! Used when visit statistics cannot yet predict every other agent: all
//! agents are rolled forward from their communicated intentions, each picking
//! its next target with the learned values, and the queued load per station
//! is read off at the requested horizon.

mod event;
mod simulator;

pub use event::{Event, EventKind, EventQueue};
pub use simulator::{predict_queue_scales, QueueSimulator, TargetScorer};
