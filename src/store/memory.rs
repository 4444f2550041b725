//! In-process store backing `serve --in-memory` and the test suites.
//!
//! Mirrors the PostgreSQL semantics: notification reads reject duplicates,
//! announcement reads upsert, and the usage report counts activity inside the
//! inclusive day range, ordered by total activity then gear name.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{day_bounds, InboxStore, NotificationProvider, ReadTable, UsageReportSource};
use crate::models::announcement::Announcement;
use crate::models::notification::{Notification, NotificationType};
use crate::models::report::{GearUsage, WeeklyUsageReport};
use crate::models::user::User;

/// The five kinds of gear activity counted by the usage report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    Request,
    Checkout,
    Checkin,
    Booking,
    Damage,
}

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    notifications: Vec<Notification>,
    announcements: Vec<Announcement>,
    reads: HashMap<ReadTable, Vec<(Uuid, Uuid)>>,
    acknowledged: HashSet<(Uuid, Uuid)>,
    gear: HashMap<Uuid, String>,
    activity: Vec<(Uuid, ActivityKind, DateTime<Utc>)>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, email: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: None,
            created_at: Utc::now(),
        };
        self.state.write().await.users.insert(user.id, user.clone());
        user
    }

    pub async fn add_gear(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state.write().await.gear.insert(id, name.to_string());
        id
    }

    pub async fn record_activity(&self, gear_id: Uuid, kind: ActivityKind, at: DateTime<Utc>) {
        self.state.write().await.activity.push((gear_id, kind, at));
    }

    /// Ids the provider was told about through `mark_as_read`/`mark_all_as_read`.
    pub async fn acknowledged(&self, user_id: Uuid) -> Vec<Uuid> {
        let state = self.state.read().await;
        let mut ids: Vec<Uuid> = state
            .acknowledged
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, id)| *id)
            .collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl InboxStore for MemoryStore {
    async fn find_user(&self, user_id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn read_ids(&self, table: ReadTable, user_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
        let state = self.state.read().await;
        Ok(state
            .reads
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|(u, _)| *u == user_id)
                    .map(|(_, id)| *id)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert_reads(
        &self,
        table: ReadTable,
        user_id: Uuid,
        ids: &[Uuid],
    ) -> anyhow::Result<()> {
        let mut state = self.state.write().await;
        let rows = state.reads.entry(table).or_default();
        let existing: HashSet<Uuid> = rows
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, id)| *id)
            .collect();

        if !table.upserts() {
            if let Some(dup) = ids.iter().find(|id| existing.contains(id)) {
                anyhow::bail!(
                    "duplicate key value violates unique constraint on {} ({}, {})",
                    table.table(),
                    user_id,
                    dup
                );
            }
        }

        let mut seen = existing;
        for id in ids {
            if seen.insert(*id) {
                rows.push((user_id, *id));
            }
        }
        Ok(())
    }

    async fn list_announcements(&self) -> anyhow::Result<Vec<Announcement>> {
        let mut rows = self.state.read().await.announcements.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn create_announcement(
        &self,
        title: &str,
        content: &str,
    ) -> anyhow::Result<Announcement> {
        let row = Announcement {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.state.write().await.announcements.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl NotificationProvider for MemoryStore {
    async fn notifications_for(&self, user_id: Uuid) -> anyhow::Result<Vec<Notification>> {
        let state = self.state.read().await;
        let mut rows: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|n| n.user_id.map_or(true, |u| u == user_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn mark_as_read(&self, user_id: Uuid, notification_id: Uuid) -> anyhow::Result<()> {
        self.state
            .write()
            .await
            .acknowledged
            .insert((user_id, notification_id));
        Ok(())
    }

    async fn mark_all_as_read(&self, user_id: Uuid) -> anyhow::Result<()> {
        let mut state = self.state.write().await;
        let ids: Vec<Uuid> = state
            .notifications
            .iter()
            .filter(|n| n.user_id.map_or(true, |u| u == user_id))
            .map(|n| n.id)
            .collect();
        state
            .acknowledged
            .extend(ids.into_iter().map(|id| (user_id, id)));
        Ok(())
    }

    async fn create_notification(
        &self,
        user_id: Option<Uuid>,
        r#type: NotificationType,
        message: &str,
    ) -> anyhow::Result<Notification> {
        let row = Notification {
            id: Uuid::new_v4(),
            user_id,
            r#type,
            message: message.to_string(),
            created_at: Utc::now(),
        };
        self.state.write().await.notifications.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl UsageReportSource for MemoryStore {
    async fn generate_usage_report_for_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<WeeklyUsageReport> {
        let (start, end) = day_bounds(from, to)?;
        let state = self.state.read().await;

        let mut by_gear: HashMap<Uuid, GearUsage> = HashMap::new();
        for (gear_id, kind, at) in &state.activity {
            if *at < start || *at >= end {
                continue;
            }
            let Some(name) = state.gear.get(gear_id) else {
                continue;
            };
            let row = by_gear.entry(*gear_id).or_insert_with(|| GearUsage {
                id: *gear_id,
                gear_name: name.clone(),
                request_count: 0,
                checkout_count: 0,
                checkin_count: 0,
                booking_count: 0,
                damage_count: 0,
            });
            match kind {
                ActivityKind::Request => row.request_count += 1,
                ActivityKind::Checkout => row.checkout_count += 1,
                ActivityKind::Checkin => row.checkin_count += 1,
                ActivityKind::Booking => row.booking_count += 1,
                ActivityKind::Damage => row.damage_count += 1,
            }
        }

        let mut gear_usage: Vec<GearUsage> = by_gear.into_values().collect();
        gear_usage.sort_by(|a, b| {
            b.total_activity()
                .cmp(&a.total_activity())
                .then_with(|| a.gear_name.cmp(&b.gear_name))
        });

        Ok(WeeklyUsageReport {
            start_date: from,
            end_date: to,
            gear_usage,
        })
    }
}
