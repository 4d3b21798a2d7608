//! Report queue persisted under [`keys::REPORTS`].

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use super::report::{ModerationError, Report, ReportStatus, ResolveAction};
use crate::auth::Identity;
use crate::chat::{Message, MessageStore};
use crate::clock::Clock;
use crate::db::{keys, Database};
use crate::Result;

/// Append-only list of reports.
///
/// Resolved reports stay in storage with status `RESOLVED`.
pub struct ReportQueue {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    reports: Mutex<Vec<Report>>,
}

impl ReportQueue {
    /// Load stored reports.
    pub async fn load(db: Arc<Database>, clock: Arc<dyn Clock>) -> Result<Self> {
        let reports = db.kv().get_json(keys::REPORTS).await?.unwrap_or_default();
        Ok(Self {
            db,
            clock,
            reports: Mutex::new(reports),
        })
    }

    /// File a report against `message`.
    pub async fn report(&self, message: &Message, reporter: &Identity) -> Result<Report> {
        if message.author.is_bot() {
            return Err(ModerationError::AutomatedMessage.into());
        }
        if message.author.id == reporter.id {
            return Err(ModerationError::OwnMessage.into());
        }

        let report = Report::new(message.clone(), reporter.clone(), self.clock.now());
        let mut reports = self.reports.lock().await;
        let mut next = reports.clone();
        next.push(report.clone());
        self.db.kv().put_json(keys::REPORTS, &next).await?;
        *reports = next;

        info!(
            report_id = %report.id,
            message_id = %message.id,
            reporter = %reporter.nickname,
            "Message reported"
        );
        Ok(report)
    }

    /// Resolve a pending report.
    ///
    /// A report resolves exactly once; unknown or already resolved reports
    /// yield [`ModerationError::NotFound`]. On delete, the message is looked
    /// up across all rooms, and if it is gone the report is still resolved.
    pub async fn resolve(
        &self,
        report_id: &str,
        action: ResolveAction,
        store: &MessageStore,
    ) -> Result<()> {
        let mut reports = self.reports.lock().await;
        let index = reports
            .iter()
            .position(|r| r.id == report_id && r.is_pending())
            .ok_or(ModerationError::NotFound)?;
        let message_id = reports[index].message.id.clone();

        // The report stays pending in memory unless the write succeeds
        let mut next = reports.clone();
        next[index].status = ReportStatus::Resolved;
        self.db.kv().put_json(keys::REPORTS, &next).await?;
        *reports = next;

        if action == ResolveAction::Delete {
            match store.locate(&message_id).await {
                Some(room_id) => {
                    store.delete(&room_id, &message_id).await?;
                }
                None => debug!(message_id = %message_id, "Reported message already gone"),
            }
        }

        info!(report_id = %report_id, action = %action, "Report resolved");
        Ok(())
    }

    /// The pending report with `report_id`, if any.
    pub async fn pending(&self, report_id: &str) -> Option<Report> {
        self.reports
            .lock()
            .await
            .iter()
            .find(|r| r.id == report_id && r.is_pending())
            .cloned()
    }

    /// Pending reports in the order they were filed.
    pub async fn list_pending(&self) -> Vec<Report> {
        self.reports
            .lock()
            .await
            .iter()
            .filter(|r| r.is_pending())
            .cloned()
            .collect()
    }
}
