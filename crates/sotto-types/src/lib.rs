pub mod callback;
pub mod keyboard;
pub mod models;
pub mod topic;

pub use callback::CallbackAction;
pub use models::{
    Comment, MediaAttachment, MediaKind, Post, ReactionKind, ReactionTally,
};
pub use topic::{Topic, TopicSet};
