//! Upcoming-event reminders.
//!
//! ## Summary
//! A periodic scan finds pending rows and pending series occurrences that
//! start within the next few hours and writes one `EVENT_REMINDER`
//! notification per event to its owner. A reminder is not repeated for the
//! same event within [`REMINDER_DEDUP_WINDOW_HOURS`].

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDateTime};
use tracing_futures::Instrument;
use uuid::Uuid;

use almanac_core::constants::REMINDER_DEDUP_WINDOW_HOURS;
use almanac_db::db::enums::NotificationKind;
use almanac_recur::{DateWindow, EventHandle, Occurrences};

use crate::error::ServiceResult;
use crate::notify::{NewNotice, Notifier};
use crate::schedule::store::{ReminderCandidates, ScheduleStore};
use crate::schedule::service::local_now;

/// One event due for a reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Due {
    owner_id: Uuid,
    title: String,
    start_at: NaiveDateTime,
    handle: EventHandle,
    dedup_key: String,
}

impl Due {
    fn into_notice(self) -> NewNotice {
        NewNotice {
            owner_id: self.owner_id,
            kind: NotificationKind::EventReminder,
            message: format!(
                "Event \"{}\" starts at {}.",
                self.title,
                self.start_at.format("%Y-%m-%d %H:%M")
            ),
            title: self.title,
            related_event_id: Some(self.handle.to_string()),
            dedup_key: Some(self.dedup_key),
        }
    }
}

/// Collects everything in `candidates` starting in `[from, until)`.
fn due_between(
    candidates: &ReminderCandidates,
    from: NaiveDateTime,
    until: NaiveDateTime,
    horizon_days: u32,
) -> Vec<Due> {
    let mut due: Vec<Due> = candidates
        .events
        .iter()
        .filter(|row| from <= row.start_at && row.start_at < until)
        .map(|row| Due {
            owner_id: row.creator_id,
            title: row.title.clone(),
            start_at: row.start_at,
            handle: EventHandle::standalone(row.id),
            dedup_key: row.id.to_string(),
        })
        .collect();

    let window = DateWindow::new(from.date(), until.date());
    for series in &candidates.series {
        let rule = match series.rule() {
            Ok(rule) => rule,
            Err(e) => {
                tracing::warn!(series_id = %series.id, error = %e, "Skipping unreadable series");
                continue;
            }
        };
        let exceptions = candidates.exceptions.dates(&series.id);
        due.extend(
            Occurrences::new(&rule, window, exceptions, horizon_days)
                .filter(|occurrence| from <= occurrence.start_at && occurrence.start_at < until)
                .map(|occurrence| Due {
                    owner_id: series.creator_id,
                    title: series.title.clone(),
                    start_at: occurrence.start_at,
                    handle: EventHandle::occurrence(series.id, occurrence.date),
                    dedup_key: format!("{}:{}", series.id, occurrence.date),
                }),
        );
    }

    due.sort_by_key(|item| item.start_at);
    due
}

pub struct ReminderScanner {
    store: Arc<dyn ScheduleStore>,
    notifier: Arc<dyn Notifier>,
    hours_ahead: u32,
    horizon_days: u32,
}

impl ReminderScanner {
    #[must_use]
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        notifier: Arc<dyn Notifier>,
        hours_ahead: u32,
        horizon_days: u32,
    ) -> Self {
        Self {
            store,
            notifier,
            hours_ahead,
            horizon_days,
        }
    }

    /// ## Summary
    /// Runs one scan as of `now` and returns the number of reminders written.
    ///
    /// A reminder that fails to write is logged and skipped; the rest of the
    /// scan continues.
    ///
    /// ## Errors
    /// Returns an error if the candidates or the dedup state cannot be read.
    #[tracing::instrument(skip(self), fields(hours_ahead = self.hours_ahead))]
    pub async fn scan_once(&self, now: NaiveDateTime) -> ServiceResult<usize> {
        let until = now + Duration::hours(i64::from(self.hours_ahead));
        let since = now - Duration::hours(REMINDER_DEDUP_WINDOW_HOURS);

        let candidates = self.store.load_reminder_candidates(now, until).await?;
        let due = due_between(&candidates, now, until, self.horizon_days);
        tracing::debug!(due = due.len(), "Reminder candidates collected");

        let mut sent = 0;
        for item in due {
            if self.notifier.sent_since(&item.dedup_key, since).await? {
                tracing::trace!(key = %item.dedup_key, "Reminder already sent");
                continue;
            }
            let key = item.dedup_key.clone();
            match self.notifier.notify(item.into_notice(), now).await {
                Ok(()) => sent += 1,
                Err(e) => tracing::warn!(%key, error = %e, "Reminder could not be written"),
            }
        }

        tracing::info!(sent, "Reminder scan finished");
        Ok(sent)
    }

    /// ## Summary
    /// Runs [`Self::scan_once`] every `period` on the tokio runtime until the
    /// returned task is aborted.
    #[must_use]
    pub fn spawn(self: Arc<Self>, period: StdDuration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(
            async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if let Err(e) = self.scan_once(local_now()).await {
                        tracing::warn!(error = %e, "Reminder scan failed");
                    }
                }
            }
            .instrument(tracing::info_span!("reminder_scanner", period_secs = period.as_secs())),
        )
    }
}
