//! Replication primitives: event wire model, local broadcast bus,
//! authority transfer, and the observer-side mirror.

pub mod authority;
pub mod bus;
pub mod events;
pub mod mirror;
pub mod replicator;

pub use authority::{AuthorityCell, AuthorityError, PendingTransfer};
pub use bus::{EventBus, ObserverId};
pub use events::{state_code, AgentEvent, ParticipantId};
pub use mirror::AgentMirror;
pub use replicator::LocalReplicator;
