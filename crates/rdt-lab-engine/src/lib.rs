//! The reliable-data-transfer engine.
//!
//! One protocol state machine, parameterized by an [`RdtLevel`] capability
//! profile, provides exactly-once in-order message delivery over a channel
//! that may corrupt, lose, duplicate or reorder bytes. The channel itself is
//! an external collaborator reached through the [`ChannelPort`] trait.

pub mod channel;
pub mod config;
pub mod error;
pub mod level;
pub mod session;

pub use channel::{ChannelClosed, ChannelPort, Deadline};
pub use config::RdtConfig;
pub use error::RdtError;
pub use level::{Capabilities, RdtLevel};
pub use session::RdtSession;
