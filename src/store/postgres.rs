use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use super::{day_bounds, InboxStore, NotificationProvider, ReadTable, UsageReportSource};
use crate::models::announcement::Announcement;
use crate::models::notification::{Notification, NotificationType};
use crate::models::report::{GearUsage, WeeklyUsageReport};
use crate::models::user::User;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

// -- Inbox Operations --

#[async_trait]
impl InboxStore for PgStore {
    async fn find_user(&self, user_id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            "SELECT id, email, full_name, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn read_ids(&self, table: ReadTable, user_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = $1",
            table.id_column(),
            table.table()
        );
        let ids = sqlx::query_scalar::<_, Uuid>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn insert_reads(
        &self,
        table: ReadTable,
        user_id: Uuid,
        ids: &[Uuid],
    ) -> anyhow::Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let conflict = if table.upserts() {
            " ON CONFLICT DO NOTHING"
        } else {
            ""
        };
        let sql = format!(
            "INSERT INTO {} (user_id, {}) SELECT $1, UNNEST($2::uuid[]){}",
            table.table(),
            table.id_column(),
            conflict
        );
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(ids)
            .execute(&self.pool)
            .await?;
        tracing::debug!(
            table = table.table(),
            %user_id,
            rows = result.rows_affected(),
            "recorded read state"
        );
        Ok(())
    }

    async fn list_announcements(&self) -> anyhow::Result<Vec<Announcement>> {
        let rows = sqlx::query_as::<_, Announcement>(
            "SELECT id, title, content, created_at FROM announcements ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_announcement(
        &self,
        title: &str,
        content: &str,
    ) -> anyhow::Result<Announcement> {
        let row = sqlx::query_as::<_, Announcement>(
            r#"INSERT INTO announcements (title, content)
               VALUES ($1, $2)
               RETURNING id, title, content, created_at"#,
        )
        .bind(title)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}

// -- Notification Operations --

#[async_trait]
impl NotificationProvider for PgStore {
    async fn notifications_for(&self, user_id: Uuid) -> anyhow::Result<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            r#"SELECT id, user_id, type, message, created_at
               FROM notifications
               WHERE user_id = $1 OR user_id IS NULL
               ORDER BY created_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // Read state lives in read_notifications, written before these are called.
    async fn mark_as_read(&self, _user_id: Uuid, _notification_id: Uuid) -> anyhow::Result<()> {
        Ok(())
    }

    async fn mark_all_as_read(&self, _user_id: Uuid) -> anyhow::Result<()> {
        Ok(())
    }

    async fn create_notification(
        &self,
        user_id: Option<Uuid>,
        r#type: NotificationType,
        message: &str,
    ) -> anyhow::Result<Notification> {
        let row = sqlx::query_as::<_, Notification>(
            r#"INSERT INTO notifications (user_id, type, message)
               VALUES ($1, $2, $3)
               RETURNING id, user_id, type, message, created_at"#,
        )
        .bind(user_id)
        .bind(r#type.as_str())
        .bind(message)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}

// -- Report Operations --

#[async_trait]
impl UsageReportSource for PgStore {
    async fn generate_usage_report_for_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<WeeklyUsageReport> {
        let (start, end) = day_bounds(from, to)?;

        let gear_usage = sqlx::query_as::<_, GearUsage>(
            r#"
            WITH activity AS (
                SELECT gear_id, 1 AS requests, 0 AS checkouts, 0 AS checkins, 0 AS bookings, 0 AS damages
                FROM gear_requests WHERE created_at >= $1 AND created_at < $2
                UNION ALL
                SELECT gear_id, 0, 1, 0, 0, 0
                FROM gear_checkouts WHERE created_at >= $1 AND created_at < $2
                UNION ALL
                SELECT gear_id, 0, 0, 1, 0, 0
                FROM gear_checkins WHERE created_at >= $1 AND created_at < $2
                UNION ALL
                SELECT gear_id, 0, 0, 0, 1, 0
                FROM gear_bookings WHERE created_at >= $1 AND created_at < $2
                UNION ALL
                SELECT gear_id, 0, 0, 0, 0, 1
                FROM gear_damage_reports WHERE created_at >= $1 AND created_at < $2
            )
            SELECT
                g.id,
                g.name AS gear_name,
                SUM(a.requests)::BIGINT  AS request_count,
                SUM(a.checkouts)::BIGINT AS checkout_count,
                SUM(a.checkins)::BIGINT  AS checkin_count,
                SUM(a.bookings)::BIGINT  AS booking_count,
                SUM(a.damages)::BIGINT   AS damage_count
            FROM activity a
            JOIN gear g ON g.id = a.gear_id
            GROUP BY g.id, g.name
            ORDER BY COUNT(*) DESC, g.name ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(%from, %to, rows = gear_usage.len(), "aggregated gear usage");

        Ok(WeeklyUsageReport {
            start_date: from,
            end_date: to,
            gear_usage,
        })
    }
}
