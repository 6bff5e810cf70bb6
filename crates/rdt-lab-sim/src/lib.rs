//! In-memory simulated links for exercising the RDT engine.
//!
//! This crate stands in for the excluded link-layer simulation: it provides
//! [`ChannelPort`](rdt_lab_engine::ChannelPort) pairs connected by in-memory
//! queues, with scripted and probabilistic fault injection (loss, bit
//! corruption, duplication, frame splitting). Tests and demos use it; the
//! engine itself never depends on it.

pub mod fault;
pub mod link;
pub mod scenario;

pub use fault::{FaultAction, FaultPlan, SimProfile};
pub use link::{link_pair, LinkEnd};
pub use scenario::{FaultScenario, ProfileOverride};
