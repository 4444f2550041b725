//! Data-access seams.
//!
//! Handlers and sessions only talk to these traits. `PgStore` implements all
//! of them against PostgreSQL; `MemoryStore` keeps everything in process.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::announcement::Announcement;
use crate::models::notification::{Notification, NotificationType};
use crate::models::report::WeeklyUsageReport;
use crate::models::user::User;

/// The two join tables recording which (user, entity) pairs were acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadTable {
    Notifications,
    Announcements,
}

impl ReadTable {
    pub fn table(&self) -> &'static str {
        match self {
            ReadTable::Notifications => "read_notifications",
            ReadTable::Announcements => "read_announcements",
        }
    }

    pub fn id_column(&self) -> &'static str {
        match self {
            ReadTable::Notifications => "notification_id",
            ReadTable::Announcements => "announcement_id",
        }
    }

    /// Announcement reads are upserts; notification reads are plain inserts
    /// and fail on an existing row.
    pub fn upserts(&self) -> bool {
        matches!(self, ReadTable::Announcements)
    }
}

/// Read-state, announcements and user lookup.
#[async_trait]
pub trait InboxStore: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> anyhow::Result<Option<User>>;

    /// Ids the user has acknowledged in `table`.
    async fn read_ids(&self, table: ReadTable, user_id: Uuid) -> anyhow::Result<Vec<Uuid>>;

    /// Write one read row per id in a single statement.
    async fn insert_reads(
        &self,
        table: ReadTable,
        user_id: Uuid,
        ids: &[Uuid],
    ) -> anyhow::Result<()>;

    /// All announcements, newest first.
    async fn list_announcements(&self) -> anyhow::Result<Vec<Announcement>>;

    async fn create_announcement(&self, title: &str, content: &str)
        -> anyhow::Result<Announcement>;
}

/// Supplies the live list of system notifications for a user.
#[async_trait]
pub trait NotificationProvider: Send + Sync {
    /// Notifications addressed to the user or to everyone, newest first.
    async fn notifications_for(&self, user_id: Uuid) -> anyhow::Result<Vec<Notification>>;

    async fn mark_as_read(&self, user_id: Uuid, notification_id: Uuid) -> anyhow::Result<()>;

    async fn mark_all_as_read(&self, user_id: Uuid) -> anyhow::Result<()>;

    async fn create_notification(
        &self,
        user_id: Option<Uuid>,
        r#type: NotificationType,
        message: &str,
    ) -> anyhow::Result<Notification>;
}

/// Produces pre-aggregated gear activity over an inclusive date range.
#[async_trait]
pub trait UsageReportSource: Send + Sync {
    async fn generate_usage_report_for_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<WeeklyUsageReport>;
}

/// Half-open UTC bounds `[from 00:00, to+1 00:00)` covering both whole days.
pub fn day_bounds(
    from: NaiveDate,
    to: NaiveDate,
) -> anyhow::Result<(chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)> {
    let end = to
        .checked_add_days(chrono::Days::new(1))
        .ok_or_else(|| anyhow::anyhow!("end date {} is out of range", to))?;
    Ok((
        from.and_time(chrono::NaiveTime::MIN).and_utc(),
        end.and_time(chrono::NaiveTime::MIN).and_utc(),
    ))
}
