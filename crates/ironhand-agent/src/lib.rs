//! Behavior core for the Ironhand agent: state machine, targeting,
//! aggression, possession, and the capture sequence.
//!
//! Navigation, spatial queries, presentation, and replication transport
//! are consumed through the traits in [`hooks`]; the core never reaches
//! into engine machinery directly.

pub mod aggression;
pub mod brain;
pub mod capture;
pub mod comms;
pub mod config;
pub mod gesture;
pub mod hooks;
pub mod item;
pub mod math;
pub mod participant;
pub mod possession;
pub mod session;
pub mod targeting;

#[cfg(test)]
pub(crate) mod testutil;

pub use ironhand_sync::ParticipantId;
