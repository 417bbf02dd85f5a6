//! The conversation core: per-user authoring state machine, comment tree
//! assembly, reaction toggling and the comment-count synchronizer. All
//! channel I/O goes through the ports in [`ports`]; storage goes through
//! `sotto-db`.

pub mod counter;
pub mod engine;
pub mod ports;
pub mod reactions;
pub mod render;
pub mod session;
pub mod tally;
pub mod tree;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{Engine, EngineConfig};
pub use ports::{ChannelPort, MemberStatus, MembershipGate, SentMessage};
pub use session::{DraftBody, SessionMap, Step};
pub use tree::CommentNode;
