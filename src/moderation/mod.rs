//! Moderation workflow for ChatZone.
//!
//! Users flag messages; moderators dismiss the report or delete the
//! message.

mod queue;
mod report;

pub use queue::ReportQueue;
pub use report::{ModerationError, Report, ReportStatus, ResolveAction};
