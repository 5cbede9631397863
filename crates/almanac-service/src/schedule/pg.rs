//! PostgreSQL implementation of [`ScheduleStore`].

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use diesel_async::scoped_futures::ScopedFutureExt;
use uuid::Uuid;

use almanac_db::db::DbProvider;
use almanac_db::db::connection::DbConnection;
use almanac_db::db::query::{event, exception, series};
use almanac_db::db::transaction::with_transaction;
use almanac_db::error::{DbError, DbResult};
use almanac_db::model::event::Event;
use almanac_db::model::exception::{EventException, NewEventException};
use almanac_db::model::series::EventSeries;
use almanac_recur::{DateWindow, ExceptionOverlay};

use crate::error::ServiceError;
use crate::schedule::protocol::{WriteOp, WritePlan};
use crate::schedule::store::{
    ReminderCandidates, ScheduleStore, StoreFuture, WindowSnapshot, window_bounds,
};

pub struct PgScheduleStore {
    provider: Arc<dyn DbProvider>,
}

impl PgScheduleStore {
    #[must_use]
    pub fn new(provider: Arc<dyn DbProvider>) -> Self {
        Self { provider }
    }
}

fn overlay(rows: Vec<EventException>) -> ExceptionOverlay<Uuid> {
    rows.into_iter()
        .map(|row| (row.series_id, row.exception_date))
        .collect()
}

/// Loads the exceptions of `rows` in a single query.
async fn exceptions_of(
    conn: &mut DbConnection<'_>,
    rows: &[EventSeries],
) -> DbResult<ExceptionOverlay<Uuid>> {
    let ids: Vec<Uuid> = rows.iter().map(|s| s.id).collect();
    Ok(overlay(exception::load_for_series(conn, &ids).await?))
}

async fn apply_op(conn: &mut DbConnection<'_>, op: &WriteOp, now: NaiveDateTime) -> DbResult<()> {
    match op {
        WriteOp::InsertSeries(row) => series::insert(conn, row).await?,
        WriteOp::UpdateSeries(row) => series::update(conn, row).await?,
        WriteOp::SetSeriesStatus {
            series_id,
            status,
            completed_at,
        } => series::set_status(conn, *series_id, *status, *completed_at, now).await?,
        WriteOp::DeleteSeries(id) => {
            series::delete(conn, *id).await?;
        }
        WriteOp::InsertEvent(row) => event::insert(conn, row).await?,
        WriteOp::UpdateEvent(row) => event::update(conn, row).await?,
        WriteOp::DeleteEvent(id) => {
            event::delete(conn, *id).await?;
        }
        WriteOp::AddException { series_id, date } => {
            let row = NewEventException {
                id: Uuid::now_v7(),
                series_id: *series_id,
                exception_date: *date,
                created_at: now,
            };
            exception::insert_ignore(conn, &row).await?;
        }
        WriteOp::RemoveException { series_id, date } => {
            exception::delete(conn, *series_id, *date).await?;
        }
        WriteOp::SetDetachedStatus {
            series_id,
            status,
            completed_at,
        } => {
            let moved =
                event::set_detached_status(conn, *series_id, *status, *completed_at, now).await?;
            tracing::debug!(%series_id, %status, moved, "Detached rows moved");
        }
    }
    Ok(())
}

impl ScheduleStore for PgScheduleStore {
    #[tracing::instrument(skip(self))]
    fn load_window<'a>(
        &'a self,
        owner: Uuid,
        window: DateWindow,
    ) -> StoreFuture<'a, WindowSnapshot> {
        Box::pin(async move {
            let mut conn = self.provider.get_connection().await?;
            let (from, until) = window_bounds(window);

            let standalone = event::load_standalone_between(&mut conn, owner, from, until).await?;
            let detached = event::load_detached_between(&mut conn, owner, from, until).await?;
            let series =
                series::load_overlapping_for_owner(&mut conn, owner, window.start, window.end)
                    .await?;
            let exceptions = exceptions_of(&mut conn, &series).await?;

            tracing::debug!(
                standalone = standalone.len(),
                detached = detached.len(),
                series = series.len(),
                exceptions = exceptions.len(),
                "Window loaded"
            );

            Ok(WindowSnapshot {
                standalone,
                detached,
                series,
                exceptions,
            })
        })
    }

    fn find_event<'a>(&'a self, owner: Uuid, id: Uuid) -> StoreFuture<'a, Option<Event>> {
        Box::pin(async move {
            let mut conn = self.provider.get_connection().await?;
            Ok(event::find_for_owner(&mut conn, id, owner).await?)
        })
    }

    fn find_series<'a>(&'a self, owner: Uuid, id: Uuid) -> StoreFuture<'a, Option<EventSeries>> {
        Box::pin(async move {
            let mut conn = self.provider.get_connection().await?;
            Ok(series::find_for_owner(&mut conn, id, owner).await?)
        })
    }

    fn find_detached<'a>(
        &'a self,
        series_id: Uuid,
        date: NaiveDate,
    ) -> StoreFuture<'a, Option<Event>> {
        Box::pin(async move {
            let mut conn = self.provider.get_connection().await?;
            Ok(event::find_detached(&mut conn, series_id, date).await?)
        })
    }

    #[tracing::instrument(skip(self, plan), fields(ops = plan.ops.len(), subject = ?plan.subject))]
    fn apply<'a>(&'a self, plan: &'a WritePlan) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            if plan.is_noop() {
                tracing::debug!("Nothing to write");
                return Ok(());
            }

            let mut conn = self.provider.get_connection().await?;
            let ops = plan.ops.clone();
            let now = plan.now;

            with_transaction(&mut conn, move |tx| {
                async move {
                    for op in &ops {
                        apply_op(tx, op, now).await?;
                    }
                    Ok::<_, DbError>(())
                }
                .scope_boxed()
            })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Write plan rolled back");
                ServiceError::TransactionFailure(e.to_string())
            })?;

            tracing::debug!("Write plan committed");
            Ok(())
        })
    }

    #[tracing::instrument(skip(self))]
    fn load_reminder_candidates<'a>(
        &'a self,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> StoreFuture<'a, ReminderCandidates> {
        Box::pin(async move {
            let mut conn = self.provider.get_connection().await?;

            let events = event::load_pending_starting_between(&mut conn, from, until).await?;
            let series =
                series::load_pending_overlapping(&mut conn, from.date(), until.date()).await?;
            let exceptions = exceptions_of(&mut conn, &series).await?;

            Ok(ReminderCandidates {
                events,
                series,
                exceptions,
            })
        })
    }
}
