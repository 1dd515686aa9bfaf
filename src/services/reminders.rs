//! Reminder sweep
//!
//! A background task that nudges users who went quiet. It only talks to
//! storage and the transport; conversational state is never touched.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::RemindersConfig;
use crate::database::DatabaseService;
use crate::handlers::keyboards::reminder_keyboard;
use crate::services::notification::NotificationRelay;
use crate::utils::errors::Result;

pub const REMINDER_TEXT: &str = "👋 We still have great places to stay. Take a look at the catalog \
     whenever you are ready.";

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub selected: usize,
    pub reminded: usize,
    pub blocked: usize,
}

#[derive(Debug, Clone)]
pub struct ReminderSweep {
    db: DatabaseService,
    relay: NotificationRelay,
    config: RemindersConfig,
}

impl ReminderSweep {
    pub fn new(db: DatabaseService, relay: NotificationRelay, config: RemindersConfig) -> Self {
        Self { db, relay, config }
    }

    /// Remind one batch of due users.
    pub async fn run_once(&self) -> Result<SweepReport> {
        let due = self
            .db
            .users
            .due_for_reminder(
                self.config.inactive_days,
                self.config.cooldown_days,
                self.config.batch_size,
            )
            .await?;

        let mut report = SweepReport {
            selected: due.len(),
            ..SweepReport::default()
        };

        for user_id in due {
            if self
                .relay
                .send_to_user_with(user_id, REMINDER_TEXT, Some(reminder_keyboard()))
                .await
            {
                self.db.users.mark_reminded(user_id).await?;
                report.reminded += 1;
            } else {
                self.db.users.mark_blocked(&[user_id]).await?;
                report.blocked += 1;
            }
        }

        if report.selected > 0 {
            info!(
                selected = report.selected,
                reminded = report.reminded,
                blocked = report.blocked,
                "Reminder sweep finished"
            );
        }
        Ok(report)
    }
}

/// Owns the background task running [`ReminderSweep`] on an interval.
pub struct ReminderScheduler {
    sweep: ReminderSweep,
    interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl ReminderScheduler {
    pub fn new(sweep: ReminderSweep, interval: Duration) -> Self {
        Self {
            sweep,
            interval,
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(&mut self) {
        if self.handle.is_some() {
            warn!("Reminder sweep is already running");
            return;
        }

        let sweep = self.sweep.clone();
        let period = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; wait a full period before the first sweep.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(e) = sweep.run_once().await {
                    error!(error = %e, "Reminder sweep failed");
                }
            }
        });

        self.handle = Some(handle);
        info!("Started reminder sweep with interval {:?}", self.interval);
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("Stopped reminder sweep");
        }
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
