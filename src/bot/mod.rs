//! Automated participant for ChatZone.
//!
//! The bot answers in shared rooms. Replies are produced off the request
//! path by [`ReplyWorker`].

mod generator;
mod worker;

pub use generator::{
    format_history, GeminiReplyGenerator, ReplyGenerator, FALLBACK_REPLY, HISTORY_LIMIT,
    OFFLINE_REPLY,
};
pub use worker::{ReplyJob, ReplyWorker};
