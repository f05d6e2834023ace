/// Deadline sweep
///
/// Periodically scans active tasks for deadlines that are approaching or
/// have passed, notifies the assignee and the creator, and deletes old read
/// notifications.
///
/// # Idempotency
///
/// A task is alerted at most once per kind within a 24 hour window: the
/// candidate query skips tasks that already have a notification of that kind
/// for the window. Re-running the sweep on unchanged data sends nothing.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskdesk_shared::clock::SystemClock;
/// use taskdesk_shared::notify::{NoopPublisher, NotificationDispatcher};
/// use taskdesk_shared::repository::InMemoryStore;
/// use taskdesk_worker::config::SweepConfig;
/// use taskdesk_worker::sweep::DeadlineSweep;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() {
/// let store = Arc::new(InMemoryStore::new());
/// let clock = Arc::new(SystemClock);
/// let dispatcher = NotificationDispatcher::new(store.clone(), Arc::new(NoopPublisher), clock.clone());
/// let sweep = DeadlineSweep::new(store.clone(), store, dispatcher, clock, SweepConfig::default());
///
/// let shutdown = CancellationToken::new();
/// sweep.run(shutdown).await;
/// # }
/// ```

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use taskdesk_shared::clock::Clock;
use taskdesk_shared::models::task::{DeadlineAlert, Task};
use taskdesk_shared::notify::NotificationDispatcher;
use taskdesk_shared::repository::{NotificationRepository, RepositoryError, TaskRepository};

use crate::config::SweepConfig;

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("A sweep is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Counts from one sweep run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Tasks whose deadline is approaching
    pub approaching: usize,

    /// Tasks past their deadline
    pub overdue: usize,

    /// Notifications persisted
    pub sent: usize,

    /// Read notifications deleted by retention
    pub purged: u64,
}

pub struct DeadlineSweep {
    tasks: Arc<dyn TaskRepository>,
    notifications: Arc<dyn NotificationRepository>,
    dispatcher: NotificationDispatcher,
    clock: Arc<dyn Clock>,
    config: SweepConfig,
    running: Mutex<()>,
}

impl DeadlineSweep {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        notifications: Arc<dyn NotificationRepository>,
        dispatcher: NotificationDispatcher,
        clock: Arc<dyn Clock>,
        config: SweepConfig,
    ) -> Self {
        Self {
            tasks,
            notifications,
            dispatcher,
            clock,
            config,
            running: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Runs a single sweep
    ///
    /// # Errors
    ///
    /// - `AlreadyRunning` if another run holds the guard
    /// - `Repository` if a candidate query or the purge fails; alerts already
    ///   sent in this run stay sent
    pub async fn run_once(&self) -> Result<SweepReport, SweepError> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| SweepError::AlreadyRunning)?;

        let now = self.clock.now();
        let mut report = SweepReport::default();

        for alert in [DeadlineAlert::Approaching, DeadlineAlert::Overdue] {
            let candidates = self.tasks.deadline_candidates(alert, now).await?;
            for task in &candidates {
                report.sent += self.alert(alert, task).await;
            }
            match alert {
                DeadlineAlert::Approaching => report.approaching = candidates.len(),
                DeadlineAlert::Overdue => report.overdue = candidates.len(),
            }
        }

        report.purged = self
            .notifications
            .purge_read_before(now - self.config.retention())
            .await?;

        info!(
            approaching = report.approaching,
            overdue = report.overdue,
            sent = report.sent,
            purged = report.purged,
            "Deadline sweep finished"
        );

        Ok(report)
    }

    /// Notifies the assignee and, when distinct, the creator
    async fn alert(&self, alert: DeadlineAlert, task: &Task) -> usize {
        let mut recipients = vec![task.employee_id];
        if let Some(creator) = task.creator_id.filter(|c| *c != task.employee_id) {
            recipients.push(creator);
        }

        let mut sent = 0;
        for recipient in recipients {
            let delivered = match alert {
                DeadlineAlert::Approaching => {
                    self.dispatcher.deadline_approaching(task, recipient).await
                }
                DeadlineAlert::Overdue => self.dispatcher.task_overdue(task, recipient).await,
            };
            if delivered.is_some() {
                sent += 1;
            }
        }
        sent
    }

    /// Runs the sweep on a timer until `shutdown` is cancelled
    ///
    /// Waits for the startup delay, runs immediately, then once per interval.
    /// Ticks missed while a run was slow are skipped, not replayed.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.config.interval_secs,
            startup_delay_secs = self.config.startup_delay_secs,
            "Deadline sweep scheduled"
        );

        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Deadline sweep stopped before first run");
                return;
            }
            _ = sleep(self.config.startup_delay()) => {}
        }

        let mut ticker = interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Deadline sweep stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match self.run_once().await {
                        Ok(_) => {}
                        Err(SweepError::AlreadyRunning) => {
                            debug!("Previous sweep still running, skipping");
                        }
                        Err(e) => error!(error = %e, "Deadline sweep failed"),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use taskdesk_shared::clock::ManualClock;
    use taskdesk_shared::models::notification::{
        NewNotification, NotificationPriority, NotificationQuery, NotificationType,
    };
    use taskdesk_shared::models::task::{NewTask, TaskStatus};
    use taskdesk_shared::models::user::{CreateUser, UserRole};
    use taskdesk_shared::notify::NoopPublisher;
    use taskdesk_shared::repository::{InMemoryStore, UserRepository};

    struct Fixture {
        sweep: Arc<DeadlineSweep>,
        store: InMemoryStore,
        clock: Arc<ManualClock>,
        manager: i64,
        employee: i64,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
        ));
        let dispatcher = NotificationDispatcher::new(
            Arc::new(store.clone()),
            Arc::new(NoopPublisher),
            clock.clone(),
        );
        let sweep = Arc::new(DeadlineSweep::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            dispatcher,
            clock.clone(),
            SweepConfig::default(),
        ));

        let mut ids = Vec::new();
        for (name, role) in [("manager", UserRole::Manager), ("alice", UserRole::Employee)] {
            let user = UserRepository::create(
                &store,
                CreateUser {
                    full_name: name.to_string(),
                    username: name.to_string(),
                    password_hash: "x".to_string(),
                    role,
                },
                clock.now(),
            )
            .await
            .unwrap();
            ids.push(user.id);
        }

        Fixture {
            sweep,
            store,
            clock,
            manager: ids[0],
            employee: ids[1],
        }
    }

    async fn task_due(f: &Fixture, deadline: NaiveDate) -> Task {
        TaskRepository::create(
            &f.store,
            NewTask {
                title: "Replace toner".to_string(),
                deadline: Some(deadline),
                employee_id: f.employee,
                creator_id: Some(f.manager),
                ..Default::default()
            },
            f.clock.now(),
        )
        .await
        .unwrap()
    }

    async fn kinds(store: &InMemoryStore, user_id: i64) -> Vec<NotificationType> {
        store
            .list_for_user(user_id, NotificationQuery::default())
            .await
            .unwrap()
            .notifications
            .into_iter()
            .map(|n| n.kind)
            .collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_overdue_alerts_assignee_and_creator_once() {
        let f = fixture().await;
        task_due(&f, date(2025, 3, 8)).await;

        let first = f.sweep.run_once().await.unwrap();
        assert_eq!(first.overdue, 1);
        assert_eq!(first.sent, 2);
        assert_eq!(kinds(&f.store, f.employee).await, vec![NotificationType::TaskOverdue]);
        assert_eq!(kinds(&f.store, f.manager).await, vec![NotificationType::TaskOverdue]);

        f.clock.advance(Duration::minutes(30));
        let second = f.sweep.run_once().await.unwrap();
        assert_eq!(second, SweepReport::default());

        f.clock.advance(Duration::hours(24));
        let next_day = f.sweep.run_once().await.unwrap();
        assert_eq!(next_day.overdue, 1);
        assert_eq!(kinds(&f.store, f.employee).await.len(), 2);
    }

    #[tokio::test]
    async fn test_approaching_window() {
        let f = fixture().await;
        task_due(&f, date(2025, 3, 10)).await;
        task_due(&f, date(2025, 3, 11)).await;
        task_due(&f, date(2025, 3, 12)).await;

        let report = f.sweep.run_once().await.unwrap();
        assert_eq!(report.approaching, 2);
        assert_eq!(report.overdue, 0);

        let notifications = f
            .store
            .list_for_user(f.employee, NotificationQuery::default())
            .await
            .unwrap()
            .notifications;
        assert!(notifications
            .iter()
            .all(|n| n.kind == NotificationType::DeadlineApproaching
                && n.priority == NotificationPriority::High));
    }

    #[tokio::test]
    async fn test_inactive_tasks_are_ignored() {
        let f = fixture().await;
        let done = task_due(&f, date(2025, 3, 1)).await;
        let cancelled = task_due(&f, date(2025, 3, 1)).await;
        TaskRepository::update_status(&f.store, done.id, TaskStatus::Completed, f.clock.now())
            .await
            .unwrap();
        TaskRepository::cancel(
            &f.store,
            cancelled.id,
            "duplicate".to_string(),
            f.clock.now(),
        )
        .await
        .unwrap();

        let report = f.sweep.run_once().await.unwrap();
        assert_eq!(report.overdue, 0);
        assert_eq!(report.sent, 0);
    }

    #[tokio::test]
    async fn test_creator_assignee_same_person_gets_one() {
        let f = fixture().await;
        TaskRepository::create(
            &f.store,
            NewTask {
                title: "Self-assigned".to_string(),
                deadline: Some(date(2025, 3, 1)),
                employee_id: f.employee,
                creator_id: Some(f.employee),
                ..Default::default()
            },
            f.clock.now(),
        )
        .await
        .unwrap();

        let report = f.sweep.run_once().await.unwrap();
        assert_eq!(report.sent, 1);
    }

    #[tokio::test]
    async fn test_retention_purges_old_read_notifications() {
        let f = fixture().await;
        let old = NotificationRepository::create(
            &f.store,
            NewNotification {
                user_id: f.employee,
                kind: NotificationType::TaskAssigned,
                title: "Old".to_string(),
                message: "old".to_string(),
                task_id: None,
                priority: NotificationPriority::Normal,
            },
            f.clock.now(),
        )
        .await
        .unwrap();
        f.store
            .mark_read(old.id, f.employee, f.clock.now())
            .await
            .unwrap();
        NotificationRepository::create(
            &f.store,
            NewNotification {
                user_id: f.employee,
                kind: NotificationType::TaskAssigned,
                title: "Unread".to_string(),
                message: "unread".to_string(),
                task_id: None,
                priority: NotificationPriority::Normal,
            },
            f.clock.now(),
        )
        .await
        .unwrap();

        f.clock.advance(Duration::days(31));
        let report = f.sweep.run_once().await.unwrap();
        assert_eq!(report.purged, 1);
        assert_eq!(kinds(&f.store, f.employee).await.len(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_run_is_skipped() {
        let f = fixture().await;
        let _held = f.sweep.running.lock().await;

        assert!(matches!(
            f.sweep.run_once().await,
            Err(SweepError::AlreadyRunning)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_shutdown() {
        let f = fixture().await;
        task_due(&f, date(2025, 3, 8)).await;

        let shutdown = CancellationToken::new();
        let sweep = f.sweep.clone();
        let token = shutdown.clone();
        let handle = tokio::spawn(async move { sweep.run(token).await });

        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        assert!(kinds(&f.store, f.employee).await.is_empty());

        tokio::time::sleep(std::time::Duration::from_secs(10)).await;
        assert_eq!(kinds(&f.store, f.employee).await.len(), 1);

        shutdown.cancel();
        handle.await.unwrap();
    }
}
