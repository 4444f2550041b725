//! Periodic inbox refresh.
//!
//! Loads immediately, then on every tick. The task is aborted when the
//! returned handle is stopped or dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time;

use super::NotificationCenter;

pub struct RefreshHandle {
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn the refresh loop. `on_refresh` runs after every completed load.
pub fn spawn<F>(
    center: Arc<Mutex<NotificationCenter>>,
    every: Duration,
    on_refresh: F,
) -> RefreshHandle
where
    F: Fn(&NotificationCenter) + Send + Sync + 'static,
{
    let task = tokio::spawn(async move {
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let mut guard = center.lock().await;
            guard.load().await;
            tracing::debug!(user_id = %guard.user_id(), "inbox refreshed");
            on_refresh(&*guard);
        }
    });
    RefreshHandle { task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notification::NotificationType;
    use crate::store::memory::MemoryStore;
    use crate::store::NotificationProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_refresh_picks_up_new_notifications_until_stopped() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("ada@example.com").await.id;
        let center = Arc::new(Mutex::new(NotificationCenter::new(
            user,
            store.clone(),
            store.clone(),
        )));

        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let handle = spawn(center.clone(), Duration::from_secs(30), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // Initial load happens right away.
        time::sleep(Duration::from_millis(10)).await;
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        store
            .create_notification(Some(user), NotificationType::GearOverdue, "Tripod is overdue")
            .await
            .unwrap();
        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert_eq!(center.lock().await.notifications().len(), 1);

        handle.stop();
        time::sleep(Duration::from_secs(90)).await;
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }
}
