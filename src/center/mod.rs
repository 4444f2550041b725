//! Per-user notification center.
//!
//! Merges provider notifications with admin announcements, tracks read state
//! for both through [`ReadTracker`], and builds filtered inbox views. Fetch and
//! write failures are logged and leave the affected local state untouched.

pub mod filter;
pub mod read_tracker;
pub mod refresh;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::announcement::Announcement;
use crate::models::notification::{Notification, NotificationType, Severity};
use crate::store::{InboxStore, NotificationProvider, ReadTable};
use filter::{InboxQuery, Tab};
use read_tracker::{ReadTracker, TableReadTracker};

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NotificationEntry {
    pub id: Uuid,
    pub r#type: NotificationType,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    pub icon: &'static str,
    pub severity: Severity,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct AnnouncementEntry {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnreadCounts {
    pub notifications: usize,
    pub announcements: usize,
    pub total: usize,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct InboxView {
    pub notifications: Vec<NotificationEntry>,
    pub announcements: Vec<AnnouncementEntry>,
    pub unread: UnreadCounts,
}

pub struct NotificationCenter {
    user_id: Uuid,
    store: Arc<dyn InboxStore>,
    provider: Arc<dyn NotificationProvider>,
    notifications: Vec<Notification>,
    announcements: Vec<Announcement>,
    notification_reads: TableReadTracker,
    announcement_reads: TableReadTracker,
    loading: bool,
}

impl NotificationCenter {
    pub fn new(
        user_id: Uuid,
        store: Arc<dyn InboxStore>,
        provider: Arc<dyn NotificationProvider>,
    ) -> Self {
        Self {
            user_id,
            notification_reads: TableReadTracker::new(
                store.clone(),
                ReadTable::Notifications,
                user_id,
            ),
            announcement_reads: TableReadTracker::new(
                store.clone(),
                ReadTable::Announcements,
                user_id,
            ),
            store,
            provider,
            notifications: Vec::new(),
            announcements: Vec::new(),
            loading: false,
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn announcements(&self) -> &[Announcement] {
        &self.announcements
    }

    /// Refetch the user, notifications, announcements and both read lists.
    /// Each fetch fails independently; a failed fetch keeps the previous state.
    pub async fn load(&mut self) {
        self.loading = true;
        self.fetch_all().await;
        self.loading = false;
    }

    async fn fetch_all(&mut self) {
        let user_id = self.user_id;
        match self.store.find_user(user_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::error!(%user_id, "No user found");
                return;
            }
            Err(e) => {
                tracing::error!(%user_id, "Error fetching user: {:#}", e);
                return;
            }
        }

        match self.provider.notifications_for(user_id).await {
            Ok(rows) => self.notifications = rows,
            Err(e) => tracing::error!(%user_id, "Error fetching notifications: {:#}", e),
        }

        if let Err(e) = self.notification_reads.reload().await {
            tracing::error!(%user_id, "Error fetching read notifications: {:#}", e);
        }

        match self.store.list_announcements().await {
            Ok(rows) => self.announcements = rows,
            Err(e) => tracing::error!(%user_id, "Error fetching announcements: {:#}", e),
        }

        if let Err(e) = self.announcement_reads.reload().await {
            tracing::error!(%user_id, "Error fetching read announcements: {:#}", e);
        }
    }

    pub fn is_notification_read(&self, id: Uuid) -> bool {
        self.notification_reads.is_read(id)
    }

    pub fn is_announcement_read(&self, id: Uuid) -> bool {
        self.announcement_reads.is_read(id)
    }

    /// Returns whether the read row was written. On failure the notification
    /// stays unread locally.
    pub async fn mark_notification_read(&mut self, id: Uuid) -> bool {
        let user_id = self.user_id;
        tracing::debug!(%user_id, notification_id = %id, "marking notification as read");
        if let Err(e) = self.notification_reads.mark_read(id).await {
            tracing::error!(%user_id, notification_id = %id, "Error inserting into read_notifications: {:#}", e);
            return false;
        }
        if let Err(e) = self.provider.mark_as_read(user_id, id).await {
            tracing::warn!(%user_id, notification_id = %id, "provider mark_as_read failed: {:#}", e);
        }
        tracing::info!(%user_id, notification_id = %id, "marked notification as read");
        true
    }

    pub async fn mark_announcement_read(&mut self, id: Uuid) -> bool {
        let user_id = self.user_id;
        match self.announcement_reads.mark_read(id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(%user_id, announcement_id = %id, "Error marking announcement as read: {:#}", e);
                false
            }
        }
    }

    /// Acknowledge every unread item of the tab's feed: notifications for
    /// `all`/`system`, announcements for `announcements`. Returns how many
    /// were marked; zero when nothing was unread or the write failed.
    pub async fn mark_all_read(&mut self, tab: Tab) -> usize {
        let user_id = self.user_id;
        match tab {
            Tab::All | Tab::System => {
                let ids: Vec<Uuid> = self.notifications.iter().map(|n| n.id).collect();
                match self.notification_reads.mark_all_read(&ids).await {
                    Ok(marked) if marked.is_empty() => 0,
                    Ok(marked) => {
                        if let Err(e) = self.provider.mark_all_as_read(user_id).await {
                            tracing::warn!(%user_id, "provider mark_all_as_read failed: {:#}", e);
                        }
                        tracing::info!(%user_id, count = marked.len(), "marked all notifications as read");
                        marked.len()
                    }
                    Err(e) => {
                        tracing::error!(%user_id, "Error marking all notifications as read: {:#}", e);
                        0
                    }
                }
            }
            Tab::Announcements => {
                let ids: Vec<Uuid> = self.announcements.iter().map(|a| a.id).collect();
                match self.announcement_reads.mark_all_read(&ids).await {
                    Ok(marked) => marked.len(),
                    Err(e) => {
                        tracing::error!(%user_id, "Error marking all announcements as read: {:#}", e);
                        0
                    }
                }
            }
        }
    }

    pub fn unread_counts(&self) -> UnreadCounts {
        let notifications = self
            .notifications
            .iter()
            .filter(|n| !self.notification_reads.is_read(n.id))
            .count();
        let announcements = self
            .announcements
            .iter()
            .filter(|a| !self.announcement_reads.is_read(a.id))
            .count();
        UnreadCounts {
            notifications,
            announcements,
            total: notifications + announcements,
        }
    }

    pub fn view(&self, query: &InboxQuery) -> InboxView {
        let notifications = self
            .notifications
            .iter()
            .filter_map(|n| {
                let read = self.notification_reads.is_read(n.id);
                query.admits_notification(n, read).then(|| NotificationEntry {
                    id: n.id,
                    r#type: n.r#type,
                    message: n.message.clone(),
                    created_at: n.created_at,
                    read,
                    icon: n.r#type.icon(),
                    severity: n.r#type.severity(),
                })
            })
            .collect();

        let announcements = self
            .announcements
            .iter()
            .filter_map(|a| {
                let read = self.announcement_reads.is_read(a.id);
                query.admits_announcement(read).then(|| AnnouncementEntry {
                    id: a.id,
                    title: a.title.clone(),
                    content: a.content.clone(),
                    created_at: a.created_at,
                    read,
                })
            })
            .collect();

        InboxView {
            notifications,
            announcements,
            unread: self.unread_counts(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::center::filter::ReadFilter;
    use crate::models::user::User;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps a MemoryStore, counting writes and optionally failing one call.
    struct Flaky {
        inner: MemoryStore,
        fail_writes: bool,
        fail_announcements: bool,
        writes: AtomicUsize,
    }

    impl Flaky {
        fn new(inner: MemoryStore) -> Self {
            Self {
                inner,
                fail_writes: false,
                fail_announcements: false,
                writes: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl InboxStore for Flaky {
        async fn find_user(&self, user_id: Uuid) -> anyhow::Result<Option<User>> {
            self.inner.find_user(user_id).await
        }

        async fn read_ids(&self, table: ReadTable, user_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
            self.inner.read_ids(table, user_id).await
        }

        async fn insert_reads(
            &self,
            table: ReadTable,
            user_id: Uuid,
            ids: &[Uuid],
        ) -> anyhow::Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes {
                anyhow::bail!("connection reset");
            }
            self.inner.insert_reads(table, user_id, ids).await
        }

        async fn list_announcements(&self) -> anyhow::Result<Vec<Announcement>> {
            if self.fail_announcements {
                anyhow::bail!("announcements unavailable");
            }
            self.inner.list_announcements().await
        }

        async fn create_announcement(
            &self,
            title: &str,
            content: &str,
        ) -> anyhow::Result<Announcement> {
            self.inner.create_announcement(title, content).await
        }
    }

    struct Fixture {
        store: Arc<Flaky>,
        provider: Arc<MemoryStore>,
        user: Uuid,
    }

    async fn fixture(fail_writes: bool, fail_announcements: bool) -> Fixture {
        let inner = MemoryStore::new();
        let user = inner.add_user("ada@example.com").await.id;
        inner.create_announcement("Studio closed", "Closed Friday").await.unwrap();

        let mut flaky = Flaky::new(inner);
        flaky.fail_writes = fail_writes;
        flaky.fail_announcements = fail_announcements;

        let provider = Arc::new(MemoryStore::new());
        provider
            .create_notification(Some(user), NotificationType::RequestApproved, "Your request was approved")
            .await
            .unwrap();
        provider
            .create_notification(None, NotificationType::System, "Maintenance tonight")
            .await
            .unwrap();

        Fixture {
            store: Arc::new(flaky),
            provider,
            user,
        }
    }

    fn center(f: &Fixture) -> NotificationCenter {
        NotificationCenter::new(f.user, f.store.clone(), f.provider.clone())
    }

    #[tokio::test]
    async fn test_items_are_unread_until_marked() {
        let f = fixture(false, false).await;
        let mut c = center(&f);
        c.load().await;
        assert!(!c.is_loading());
        assert_eq!(c.unread_counts().total, 3);

        let id = c.notifications()[0].id;
        assert!(!c.is_notification_read(id));
        assert!(c.mark_notification_read(id).await);
        assert!(c.is_notification_read(id));
        assert_eq!(f.provider.acknowledged(f.user).await, vec![id]);

        // A fresh session sees the persisted row.
        let mut again = center(&f);
        again.load().await;
        assert!(again.is_notification_read(id));
        assert_eq!(again.unread_counts().notifications, 1);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_item_unread() {
        let f = fixture(true, false).await;
        let mut c = center(&f);
        c.load().await;

        let id = c.announcements()[0].id;
        assert!(!c.mark_announcement_read(id).await);
        assert!(!c.is_announcement_read(id));
        assert_eq!(c.unread_counts().announcements, 1);
    }

    #[tokio::test]
    async fn test_failed_bulk_write_marks_nothing() {
        let f = fixture(true, false).await;
        let mut c = center(&f);
        c.load().await;

        assert_eq!(c.mark_all_read(Tab::All).await, 0);
        assert_eq!(f.store.writes.load(Ordering::SeqCst), 1);
        assert!(c.notifications().iter().all(|n| !c.is_notification_read(n.id)));
        assert_eq!(c.unread_counts().notifications, 2);
        assert!(f.provider.acknowledged(f.user).await.is_empty());

        assert_eq!(c.mark_all_read(Tab::Announcements).await, 0);
        assert_eq!(c.unread_counts().total, 3);
    }

    #[tokio::test]
    async fn test_mark_all_with_nothing_unread_skips_write() {
        let f = fixture(false, false).await;
        let mut c = center(&f);
        c.load().await;

        assert_eq!(c.mark_all_read(Tab::All).await, 2);
        assert_eq!(f.store.writes.load(Ordering::SeqCst), 1);

        let before = c.view(&InboxQuery::default());
        assert_eq!(c.mark_all_read(Tab::System).await, 0);
        assert_eq!(f.store.writes.load(Ordering::SeqCst), 1);
        assert_eq!(c.view(&InboxQuery::default()), before);
    }

    #[tokio::test]
    async fn test_mark_all_follows_active_tab() {
        let f = fixture(false, false).await;
        let mut c = center(&f);
        c.load().await;

        assert_eq!(c.mark_all_read(Tab::Announcements).await, 1);
        let counts = c.unread_counts();
        assert_eq!(counts.announcements, 0);
        assert_eq!(counts.notifications, 2);
    }

    #[tokio::test]
    async fn test_one_failed_fetch_does_not_abort_load() {
        let f = fixture(false, true).await;
        let mut c = center(&f);
        c.load().await;

        assert_eq!(c.notifications().len(), 2);
        assert!(c.announcements().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user_loads_nothing() {
        let f = fixture(false, false).await;
        let mut c = NotificationCenter::new(Uuid::new_v4(), f.store.clone(), f.provider.clone());
        c.load().await;
        assert!(c.notifications().is_empty());
        assert!(!c.is_loading());
    }

    #[tokio::test]
    async fn test_unread_view_hides_read_items() {
        let f = fixture(false, false).await;
        let mut c = center(&f);
        c.load().await;
        let id = c.notifications()[0].id;
        c.mark_notification_read(id).await;

        let view = c.view(&InboxQuery {
            filter: ReadFilter::Unread,
            ..Default::default()
        });
        assert_eq!(view.notifications.len(), 1);
        assert!(view.notifications.iter().all(|n| !n.read && n.id != id));
        assert_eq!(view.announcements.len(), 1);
        assert_eq!(view.unread.total, 2);
    }
}
