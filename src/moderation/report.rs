//! Report model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Identity;
use crate::chat::Message;

/// Reasons a moderation request is refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModerationError {
    /// The report is unknown or already resolved.
    #[error("report not found")]
    NotFound,

    /// Nobody may report their own message.
    #[error("you cannot report your own message")]
    OwnMessage,

    /// Messages from the automated participant cannot be reported.
    #[error("automated messages cannot be reported")]
    AutomatedMessage,
}

/// Report lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReportStatus {
    /// Awaiting a moderator.
    Pending,
    /// Handled. Terminal.
    Resolved,
}

/// How a moderator settles a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveAction {
    /// Close the report and leave the message alone.
    Dismiss,
    /// Close the report and delete the message.
    Delete,
}

impl fmt::Display for ResolveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveAction::Dismiss => write!(f, "dismiss"),
            ResolveAction::Delete => write!(f, "delete"),
        }
    }
}

/// A user-submitted flag on a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Report ID.
    pub id: String,
    /// Snapshot of the reported message.
    pub message: Message,
    /// Who filed the report.
    pub reported_by: Identity,
    /// When the report was filed.
    pub created_at: DateTime<Utc>,
    /// Current state.
    pub status: ReportStatus,
}

impl Report {
    /// Create a pending report.
    pub fn new(message: Message, reported_by: Identity, created_at: DateTime<Utc>) -> Self {
        Self {
            id: format!("report-{}", Uuid::new_v4()),
            message,
            reported_by,
            created_at,
            status: ReportStatus::Pending,
        }
    }

    /// Whether the report still awaits a moderator.
    pub fn is_pending(&self) -> bool {
        self.status == ReportStatus::Pending
    }
}
