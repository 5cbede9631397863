//! Series mutation protocol.
//!
//! ## Summary
//! Every mutation is planned in memory against already-loaded records and
//! produces a [`WritePlan`]: the ordered writes that keep series, exceptions
//! and detached rows consistent. Planning never touches storage, so all
//! validation happens before the first write and a store can commit the plan
//! in a single transaction.
//!
//! A detached row whose series no longer exists (or is not visible to the
//! caller) is treated as a plain standalone row.

#![allow(clippy::too_many_lines)] // One match arm per mutation case

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use almanac_core::constants::DEFAULT_ALERT;
use almanac_core::types::Owner;
use almanac_db::db::enums::EventStatus;
use almanac_db::model::event::Event;
use almanac_db::model::series::EventSeries;
use almanac_recur::{EventHandle, Frequency, RecurrenceRule};

use crate::error::{ServiceError, ServiceResult};
use crate::schedule::request::{DeleteScope, EventPatch, NewEvent, OccurrenceScope, SeriesPatch};

/// The owned records a handle resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A stored row, with its series when it references one that still exists.
    Standalone {
        row: Event,
        series: Option<EventSeries>,
    },
    /// One virtual occurrence, with the row that replaced it if there is one.
    Occurrence {
        series: EventSeries,
        date: NaiveDate,
        detached: Option<Event>,
    },
}

impl Target {
    #[must_use]
    pub fn handle(&self) -> EventHandle {
        match self {
            Self::Standalone { row, .. } => EventHandle::standalone(row.id),
            Self::Occurrence { series, date, .. } => EventHandle::occurrence(series.id, *date),
        }
    }
}

/// A single storage write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    InsertSeries(EventSeries),
    UpdateSeries(EventSeries),
    SetSeriesStatus {
        series_id: Uuid,
        status: EventStatus,
        completed_at: Option<NaiveDateTime>,
    },
    DeleteSeries(Uuid),
    InsertEvent(Event),
    UpdateEvent(Event),
    DeleteEvent(Uuid),
    /// Idempotent: an existing exception for the date is kept.
    AddException {
        series_id: Uuid,
        date: NaiveDate,
    },
    RemoveException {
        series_id: Uuid,
        date: NaiveDate,
    },
    /// Moves every detached row of the series not already in `status`.
    SetDetachedStatus {
        series_id: Uuid,
        status: EventStatus,
        completed_at: Option<NaiveDateTime>,
    },
}

/// The writes of one mutation, applied atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePlan {
    pub ops: Vec<WriteOp>,
    /// What the caller should see afterwards; `None` once the target is gone.
    pub subject: Option<EventHandle>,
    /// Title of the affected event, for notifications.
    pub title: String,
    pub now: NaiveDateTime,
}

impl WritePlan {
    fn new(title: impl Into<String>, subject: Option<EventHandle>, now: NaiveDateTime) -> Self {
        Self {
            ops: Vec::new(),
            subject,
            title: title.into(),
            now,
        }
    }

    fn push(mut self, op: WriteOp) -> Self {
        self.ops.push(op);
        self
    }

    /// Whether applying the plan would change nothing.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.ops.is_empty()
    }
}

fn validate_range(start_at: NaiveDateTime, end_at: NaiveDateTime) -> ServiceResult<()> {
    if end_at <= start_at {
        return Err(ServiceError::InvalidTimeRange(format!(
            "end {end_at} must be after start {start_at}"
        )));
    }
    Ok(())
}

fn duration_days(start_at: NaiveDateTime, end_at: NaiveDateTime) -> ServiceResult<i32> {
    let days = (end_at.date() - start_at.date()).num_days();
    i32::try_from(days)
        .map_err(|_| ServiceError::InvalidTimeRange(format!("event spans {days} days")))
}

fn stored_interval(rule: RecurrenceRule) -> ServiceResult<i32> {
    i32::try_from(rule.interval.get()).map_err(|_| {
        ServiceError::InvalidRecurrenceRule(format!("interval {} is too large", rule.interval))
    })
}

/// An occurrence must end after it starts once date, duration and times are
/// combined.
fn validate_series_times(series: &EventSeries) -> ServiceResult<()> {
    if series.duration_days < 0
        || (series.duration_days == 0 && series.end_time <= series.start_time)
    {
        return Err(ServiceError::InvalidTimeRange(format!(
            "occurrences would end at {} (+{} days) before starting at {}",
            series.end_time, series.duration_days, series.start_time
        )));
    }
    if let Some(until) = series.recurrence_end_date
        && until < series.first_occurrence_date
    {
        return Err(ServiceError::InvalidRecurrenceRule(format!(
            "recurrence ends on {until}, before the first occurrence on {}",
            series.first_occurrence_date
        )));
    }
    Ok(())
}

/// A stored row replacing the occurrence of `series` on `date`, at the
/// series' times and in the series' completion state.
fn detached_copy(series: &EventSeries, date: NaiveDate, now: NaiveDateTime) -> ServiceResult<Event> {
    let occurrence = series.rule()?.occurrence_on(date);
    Ok(Event {
        id: Uuid::now_v7(),
        title: series.title.clone(),
        content: series.content.clone(),
        start_at: occurrence.start_at,
        end_at: occurrence.end_at,
        status: series.status,
        completed_at: series.completed_at,
        alert: series.alert.clone(),
        series_id: Some(series.id),
        occurrence_date: Some(date),
        is_exception: true,
        creator_id: series.creator_id,
        department_id: series.department_id,
        office_id: series.office_id,
        division_id: series.division_id,
        created_at: now,
        updated_at: now,
    })
}

/// Applies a partial update to a copy of `series`.
///
/// Completion state is not part of a series update; it only changes through
/// [`plan_complete`] and [`plan_uncomplete`].
fn patched_series(
    series: &EventSeries,
    patch: &SeriesPatch,
    now: NaiveDateTime,
) -> ServiceResult<EventSeries> {
    let fields = &patch.fields;
    let mut next = series.clone();

    if let Some(title) = &fields.title {
        next.title.clone_from(title);
    }
    if let Some(content) = &fields.content {
        next.content.clone_from(content);
    }
    if let Some(alert) = &fields.alert {
        next.alert.clone_from(alert);
    }
    if let Some(frequency) = &patch.frequency {
        next.frequency = frequency.parse::<Frequency>()?.into();
    }
    if let Some(interval) = patch.interval {
        let rule = RecurrenceRule::new(next.frequency.into(), interval)?;
        next.repeat_interval = stored_interval(rule)?;
    }
    if let Some(until) = patch.recurrence_end_date {
        next.recurrence_end_date = until;
    }
    if let Some(start_at) = fields.start_at {
        next.start_time = start_at.time();
    }
    if let Some(end_at) = fields.end_at {
        next.end_time = end_at.time();
    }
    if let (Some(start_at), Some(end_at)) = (fields.start_at, fields.end_at) {
        validate_range(start_at, end_at)?;
        next.duration_days = duration_days(start_at, end_at)?;
    }

    validate_series_times(&next)?;
    next.updated_at = now;
    Ok(next)
}

fn series_update_plan(
    series: &EventSeries,
    patch: &SeriesPatch,
    now: NaiveDateTime,
) -> ServiceResult<WritePlan> {
    let next = patched_series(series, patch, now)?;
    let subject = EventHandle::occurrence(next.id, next.first_occurrence_date);
    Ok(WritePlan::new(next.title.clone(), Some(subject), now).push(WriteOp::UpdateSeries(next)))
}

fn row_update_plan(row: &Event, patch: &EventPatch, now: NaiveDateTime) -> ServiceResult<Event> {
    let mut next = row.clone();
    patch.apply_to(&mut next, now);
    validate_range(next.start_at, next.end_at)?;
    Ok(next)
}

fn complete_all_plan(series: &EventSeries, now: NaiveDateTime) -> WritePlan {
    let subject = EventHandle::occurrence(series.id, series.first_occurrence_date);
    WritePlan::new(series.title.clone(), Some(subject), now)
        .push(WriteOp::SetSeriesStatus {
            series_id: series.id,
            status: EventStatus::Done,
            completed_at: Some(now),
        })
        .push(WriteOp::SetDetachedStatus {
            series_id: series.id,
            status: EventStatus::Done,
            completed_at: Some(now),
        })
}

/// ## Summary
/// Plans the creation of a standalone event, or of a series when recurrence
/// settings are present.
///
/// A series takes its first occurrence date and times of day from the start
/// and end instants; the calendar-date difference between them becomes the
/// duration of every occurrence.
///
/// ## Errors
/// - `InvalidTimeRange` if the end is not after the start.
/// - `InvalidRecurrenceRule` if the frequency is missing or unknown, the
///   interval is not positive, or the recurrence ends before it starts.
/// - `ValidationError` if the title is blank.
pub fn plan_create(owner: &Owner, input: &NewEvent, now: NaiveDateTime) -> ServiceResult<WritePlan> {
    validate_range(input.start_at, input.end_at)?;

    let title = input.title.trim();
    if title.is_empty() {
        return Err(ServiceError::ValidationError("title is required".to_owned()));
    }
    let alert = input
        .alert
        .clone()
        .unwrap_or_else(|| DEFAULT_ALERT.to_owned());
    let attribution = owner.attribution;

    if let Some(recurrence) = &input.recurrence {
        let frequency = recurrence.frequency.as_deref().ok_or_else(|| {
            ServiceError::InvalidRecurrenceRule(
                "frequency is required for a recurring event".to_owned(),
            )
        })?;
        let rule = RecurrenceRule::parse(frequency, recurrence.interval.unwrap_or(1))?;

        let series = EventSeries {
            id: Uuid::now_v7(),
            title: title.to_owned(),
            content: input.content.clone(),
            frequency: rule.frequency.into(),
            repeat_interval: stored_interval(rule)?,
            first_occurrence_date: input.start_at.date(),
            start_time: input.start_at.time(),
            end_time: input.end_at.time(),
            duration_days: duration_days(input.start_at, input.end_at)?,
            recurrence_end_date: recurrence.end_date,
            alert,
            status: EventStatus::Pending,
            completed_at: None,
            creator_id: owner.id,
            department_id: attribution.department_id,
            office_id: attribution.office_id,
            division_id: attribution.division_id,
            created_at: now,
            updated_at: now,
        };
        validate_series_times(&series)?;

        let subject = EventHandle::occurrence(series.id, series.first_occurrence_date);
        return Ok(WritePlan::new(title, Some(subject), now).push(WriteOp::InsertSeries(series)));
    }

    let status = input.status.unwrap_or_default();
    let row = Event {
        id: Uuid::now_v7(),
        title: title.to_owned(),
        content: input.content.clone(),
        start_at: input.start_at,
        end_at: input.end_at,
        status,
        completed_at: status.is_done().then_some(now),
        alert,
        series_id: None,
        occurrence_date: None,
        is_exception: false,
        creator_id: owner.id,
        department_id: attribution.department_id,
        office_id: attribution.office_id,
        division_id: attribution.division_id,
        created_at: now,
        updated_at: now,
    };

    let subject = EventHandle::standalone(row.id);
    Ok(WritePlan::new(title, Some(subject), now).push(WriteOp::InsertEvent(row)))
}

/// ## Summary
/// Plans an update.
///
/// - Occurrence, `this`: a detached row with the edits applied replaces the
///   date, which gets an exception. A date that already has a detached row
///   edits that row instead.
/// - Occurrence or detached row, `all`: partial update of the series.
/// - Detached row, `this`: edited in place; its exception is ensured.
/// - Row referencing a series without being detached: detached into a new
///   row for its start date plus an exception.
/// - Plain row: edited in place whatever the scope.
///
/// ## Errors
/// `InvalidTimeRange` or `InvalidRecurrenceRule` if the result would be
/// invalid; no writes are planned in that case.
pub fn plan_update(
    target: &Target,
    scope: OccurrenceScope,
    patch: &SeriesPatch,
    now: NaiveDateTime,
) -> ServiceResult<WritePlan> {
    match (target, scope) {
        (Target::Occurrence { series, .. }, OccurrenceScope::All)
        | (
            Target::Standalone {
                series: Some(series),
                ..
            },
            OccurrenceScope::All,
        ) => series_update_plan(series, patch, now),

        (
            Target::Occurrence {
                series,
                date,
                detached: Some(row),
            },
            OccurrenceScope::This,
        ) => {
            let next = row_update_plan(row, &patch.fields, now)?;
            Ok(
                WritePlan::new(next.title.clone(), Some(EventHandle::standalone(next.id)), now)
                    .push(WriteOp::UpdateEvent(next))
                    .push(WriteOp::AddException {
                        series_id: series.id,
                        date: *date,
                    }),
            )
        }

        (
            Target::Occurrence {
                series,
                date,
                detached: None,
            },
            OccurrenceScope::This,
        ) => {
            let base = detached_copy(series, *date, now)?;
            let next = row_update_plan(&base, &patch.fields, now)?;
            Ok(
                WritePlan::new(next.title.clone(), Some(EventHandle::standalone(next.id)), now)
                    .push(WriteOp::InsertEvent(next))
                    .push(WriteOp::AddException {
                        series_id: series.id,
                        date: *date,
                    }),
            )
        }

        (
            Target::Standalone {
                row,
                series: Some(series),
            },
            OccurrenceScope::This,
        ) if row.is_exception => {
            let next = row_update_plan(row, &patch.fields, now)?;
            Ok(
                WritePlan::new(next.title.clone(), Some(EventHandle::standalone(next.id)), now)
                    .push(WriteOp::UpdateEvent(next))
                    .push(WriteOp::AddException {
                        series_id: series.id,
                        date: row.replaced_date(),
                    }),
            )
        }

        (
            Target::Standalone {
                row,
                series: Some(series),
            },
            OccurrenceScope::This,
        ) => {
            let date = row.replaced_date();
            let mut base = row.clone();
            base.id = Uuid::now_v7();
            base.series_id = Some(series.id);
            base.occurrence_date = Some(date);
            base.is_exception = true;
            base.created_at = now;
            let next = row_update_plan(&base, &patch.fields, now)?;
            Ok(
                WritePlan::new(next.title.clone(), Some(EventHandle::standalone(next.id)), now)
                    .push(WriteOp::InsertEvent(next))
                    .push(WriteOp::AddException {
                        series_id: series.id,
                        date,
                    }),
            )
        }

        (Target::Standalone { row, series: None }, _) => {
            let next = row_update_plan(row, &patch.fields, now)?;
            Ok(
                WritePlan::new(next.title.clone(), Some(EventHandle::standalone(next.id)), now)
                    .push(WriteOp::UpdateEvent(next)),
            )
        }
    }
}

/// ## Summary
/// Plans a delete.
///
/// - Occurrence, `single`: the date gets an exception (and loses its
///   detached row, if any).
/// - Occurrence or detached row, `series`: the series is deleted; its
///   exceptions go with it while detached rows stay.
/// - Detached row, `single`: the row is deleted and its date stays excluded.
/// - Plain row: deleted.
#[must_use]
pub fn plan_delete(target: &Target, scope: DeleteScope, now: NaiveDateTime) -> WritePlan {
    match (target, scope) {
        (Target::Occurrence { series, .. }, DeleteScope::Series)
        | (
            Target::Standalone {
                series: Some(series),
                ..
            },
            DeleteScope::Series,
        ) => WritePlan::new(series.title.clone(), None, now).push(WriteOp::DeleteSeries(series.id)),

        (
            Target::Occurrence {
                series,
                date,
                detached,
            },
            DeleteScope::Single,
        ) => {
            let mut plan = WritePlan::new(series.title.clone(), None, now);
            if let Some(row) = detached {
                plan = plan.push(WriteOp::DeleteEvent(row.id));
            }
            plan.push(WriteOp::AddException {
                series_id: series.id,
                date: *date,
            })
        }

        (
            Target::Standalone {
                row,
                series: Some(series),
            },
            DeleteScope::Single,
        ) => WritePlan::new(row.title.clone(), None, now)
            .push(WriteOp::DeleteEvent(row.id))
            .push(WriteOp::AddException {
                series_id: series.id,
                date: row.replaced_date(),
            }),

        (Target::Standalone { row, series: None }, _) => {
            WritePlan::new(row.title.clone(), None, now).push(WriteOp::DeleteEvent(row.id))
        }
    }
}

/// ## Summary
/// Plans a completion.
///
/// - Occurrence, `this`: a DONE detached row records the date, which gets an
///   exception. A date that already has a detached row completes that row.
/// - Occurrence or detached row, `all`: the series and every detached row
///   not yet DONE become DONE.
/// - Any row, `this`: the row becomes DONE. Completing a DONE row is a no-op.
///
/// ## Errors
/// Returns an error if the stored series rule is invalid.
pub fn plan_complete(
    target: &Target,
    scope: OccurrenceScope,
    now: NaiveDateTime,
) -> ServiceResult<WritePlan> {
    match (target, scope) {
        (Target::Occurrence { series, .. }, OccurrenceScope::All)
        | (
            Target::Standalone {
                series: Some(series),
                ..
            },
            OccurrenceScope::All,
        ) => Ok(complete_all_plan(series, now)),

        (
            Target::Occurrence {
                series,
                date,
                detached,
            },
            OccurrenceScope::This,
        ) => {
            let (mut row, insert) = match detached {
                Some(row) => (row.clone(), false),
                None => (detached_copy(series, *date, now)?, true),
            };
            let mut plan = WritePlan::new(
                series.title.clone(),
                Some(EventHandle::standalone(row.id)),
                now,
            );
            if insert || !row.status.is_done() {
                row.status = EventStatus::Done;
                row.completed_at = Some(now);
                row.updated_at = now;
                plan = plan.push(if insert {
                    WriteOp::InsertEvent(row)
                } else {
                    WriteOp::UpdateEvent(row)
                });
            }
            Ok(plan.push(WriteOp::AddException {
                series_id: series.id,
                date: *date,
            }))
        }

        (Target::Standalone { row, .. }, _) => {
            let plan = WritePlan::new(
                row.title.clone(),
                Some(EventHandle::standalone(row.id)),
                now,
            );
            if row.status.is_done() {
                return Ok(plan);
            }
            let mut next = row.clone();
            next.status = EventStatus::Done;
            next.completed_at = Some(now);
            next.updated_at = now;
            Ok(plan.push(WriteOp::UpdateEvent(next)))
        }
    }
}

/// ## Summary
/// Plans an uncompletion, inferring its reach from the current state.
///
/// - Occurrence of a DONE series: the series and its DONE detached rows go
///   back to PENDING.
/// - Occurrence of a PENDING series: the DONE detached row for the date is
///   deleted and the exception removed, making the date virtual again. A date
///   without such a row is left alone.
/// - Row: back to PENDING. A PENDING row is left alone.
#[must_use]
pub fn plan_uncomplete(target: &Target, now: NaiveDateTime) -> WritePlan {
    match target {
        Target::Occurrence { series, .. } if series.status.is_done() => {
            WritePlan::new(series.title.clone(), Some(target.handle()), now)
                .push(WriteOp::SetSeriesStatus {
                    series_id: series.id,
                    status: EventStatus::Pending,
                    completed_at: None,
                })
                .push(WriteOp::SetDetachedStatus {
                    series_id: series.id,
                    status: EventStatus::Pending,
                    completed_at: None,
                })
        }

        Target::Occurrence {
            series,
            date,
            detached,
        } => {
            let plan = WritePlan::new(series.title.clone(), Some(target.handle()), now);
            match detached {
                Some(row) if row.status.is_done() => plan
                    .push(WriteOp::DeleteEvent(row.id))
                    .push(WriteOp::RemoveException {
                        series_id: series.id,
                        date: *date,
                    }),
                _ => plan,
            }
        }

        Target::Standalone { row, .. } => {
            let plan = WritePlan::new(row.title.clone(), Some(target.handle()), now);
            if !row.status.is_done() {
                return plan;
            }
            let mut next = row.clone();
            next.status = EventStatus::Pending;
            next.completed_at = None;
            next.updated_at = now;
            plan.push(WriteOp::UpdateEvent(next))
        }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
