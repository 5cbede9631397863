#![allow(clippy::expect_used)]
//! Service-level scenarios: listing, detaching, completion and deletion.

use almanac_db::db::enums::{EventStatus, NotificationKind};
use almanac_recur::EventHandle;
use almanac_service::error::ServiceError;
use almanac_service::schedule::{DeleteScope, EventPatch, OccurrenceScope, SeriesPatch};

use super::helpers::*;

// ============================================================================
// Listing
// ============================================================================

#[test_log::test(tokio::test)]
async fn monthly_series_lists_only_dates_inside_window() {
    let h = Harness::new();
    h.service
        .create(
            &h.owner,
            recurring("Report", at(2024, 1, 1, 9, 0), "month", 1, None),
        )
        .await
        .expect("series created");

    let views = h
        .service
        .list(&h.owner, window(date(2024, 3, 15), date(2024, 5, 15)))
        .await
        .expect("listed");

    assert_eq!(dates_of(&views), vec![date(2024, 4, 1), date(2024, 5, 1)]);
    assert!(views.iter().all(|v| v.is_generated && v.is_recurring));
}

#[test_log::test(tokio::test)]
async fn end_date_bounds_a_daily_series() {
    let h = Harness::new();
    h.service
        .create(
            &h.owner,
            recurring(
                "Inventory",
                at(2024, 1, 30, 8, 0),
                "daily",
                1,
                Some(date(2024, 2, 1)),
            ),
        )
        .await
        .expect("series created");

    let views = h
        .service
        .list(&h.owner, window(date(2024, 1, 1), date(2024, 12, 31)))
        .await
        .expect("listed");

    assert_eq!(
        dates_of(&views),
        vec![date(2024, 1, 30), date(2024, 1, 31), date(2024, 2, 1)]
    );
}

#[test_log::test(tokio::test)]
async fn month_end_overflows_into_next_month() {
    let h = Harness::new();
    h.service
        .create(
            &h.owner,
            recurring("Close books", at(2024, 1, 31, 16, 0), "monthly", 1, None),
        )
        .await
        .expect("series created");

    let views = h
        .service
        .list(&h.owner, window(date(2024, 1, 1), date(2024, 4, 30)))
        .await
        .expect("listed");

    assert_eq!(
        dates_of(&views),
        vec![date(2024, 1, 31), date(2024, 3, 2), date(2024, 4, 2)]
    );
}

#[test_log::test(tokio::test)]
async fn listing_merges_rows_and_occurrences_by_start() {
    let h = Harness::new();
    let series = h
        .service
        .create(
            &h.owner,
            recurring("Standup", at(2024, 1, 1, 9, 0), "week", 1, None),
        )
        .await
        .expect("series created");
    h.service
        .create(&h.owner, single("Audit", at(2024, 1, 8, 8, 0)))
        .await
        .expect("row created");

    let views = h
        .service
        .list(&h.owner, window(date(2024, 1, 1), date(2024, 1, 14)))
        .await
        .expect("listed");

    let titles: Vec<&str> = views.iter().map(|v| v.title.as_str()).collect();
    assert_eq!(titles, ["Standup", "Audit", "Standup"]);
    assert_eq!(views[0].id, occurrence(series_of(&series), date(2024, 1, 1)).to_string());
    assert!(!views[1].is_recurring);
}

#[test_log::test(tokio::test)]
async fn inverted_window_is_rejected() {
    let h = Harness::new();
    let err = h
        .service
        .list(&h.owner, window(date(2024, 2, 1), date(2024, 1, 1)))
        .await
        .expect_err("inverted window");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[test_log::test(tokio::test)]
async fn window_longer_than_limit_is_rejected() {
    let h = Harness::new();
    h.service
        .list(&h.owner, window(date(2024, 1, 1), date(2024, 12, 31)))
        .await
        .expect("a leap year fits the default limit");

    let err = h
        .service
        .list(&h.owner, window(date(2024, 1, 1), date(2025, 1, 1)))
        .await
        .expect_err("367 days");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[test_log::test(tokio::test)]
async fn ended_series_queried_far_in_the_future() {
    let h = Harness::new();
    let series = h
        .service
        .create(
            &h.owner,
            recurring(
                "Onboarding",
                at(2024, 1, 1, 9, 0),
                "daily",
                1,
                Some(date(2024, 1, 10)),
            ),
        )
        .await
        .expect("series created");
    let far = date(192_102, 6, 7);

    let views = h
        .service
        .list(&h.owner, window(far, far))
        .await
        .expect("listed");
    assert!(views.is_empty());

    let err = h
        .service
        .get(&h.owner, occurrence(series_of(&series), far))
        .await
        .expect_err("past the end date");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

// ============================================================================
// Creation
// ============================================================================

#[test_log::test(tokio::test)]
async fn unknown_frequency_creates_nothing() {
    let h = Harness::new();
    let err = h
        .service
        .create(
            &h.owner,
            recurring("Sync", at(2024, 1, 1, 9, 0), "fortnightly", 1, None),
        )
        .await
        .expect_err("unknown frequency");

    assert!(matches!(err, ServiceError::InvalidRecurrenceRule(_)));
    assert_eq!(h.store.series_count(), 0);
    assert!(h.store.events().is_empty());
    assert!(h.recorder.sent().is_empty());
}

#[test_log::test(tokio::test)]
async fn end_before_start_creates_nothing() {
    let h = Harness::new();
    let mut input = single("Backwards", at(2024, 1, 1, 9, 0));
    input.end_at = at(2024, 1, 1, 8, 0);

    let err = h
        .service
        .create(&h.owner, input)
        .await
        .expect_err("inverted range");

    assert!(matches!(err, ServiceError::InvalidTimeRange(_)));
    assert!(h.store.events().is_empty());
}

#[test_log::test(tokio::test)]
async fn creation_is_attributed_and_notified() {
    let h = Harness::new();
    let view = h
        .service
        .create(&h.owner, single("Audit", at(2024, 1, 8, 8, 0)))
        .await
        .expect("row created");

    assert_eq!(view.creator, h.owner.id);
    assert_eq!(view.status, EventStatus::Pending);

    let sent = h.recorder.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, NotificationKind::EventCreated);
    assert_eq!(sent[0].owner_id, h.owner.id);
    assert_eq!(sent[0].related_event_id.as_deref(), Some(view.id.as_str()));
}

// ============================================================================
// Completion
// ============================================================================

#[test_log::test(tokio::test)]
async fn completing_one_occurrence_detaches_it() {
    let h = Harness::new();
    let created = h
        .service
        .create(
            &h.owner,
            recurring("Standup", at(2024, 1, 1, 9, 0), "weekly", 1, None),
        )
        .await
        .expect("series created");
    let series_id = series_of(&created);

    let done = h
        .service
        .complete(
            &h.owner,
            occurrence(series_id, date(2024, 1, 15)),
            OccurrenceScope::This,
        )
        .await
        .expect("completed");

    assert!(done.is_exception);
    assert_eq!(done.status, EventStatus::Done);
    assert_eq!(done.occurrence_date, Some(date(2024, 1, 15)));
    assert_eq!(done.start_at, at(2024, 1, 15, 9, 0));

    assert_eq!(h.store.exception_dates(series_id), vec![date(2024, 1, 15)]);
    let rows = h.store.events();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, EventStatus::Done);
    assert_eq!(
        h.store.series(series_id).expect("series kept").status,
        EventStatus::Pending
    );

    let views = h
        .service
        .list(&h.owner, window(date(2024, 1, 1), date(2024, 1, 31)))
        .await
        .expect("listed");
    assert_eq!(views.len(), 5);
    let replaced: Vec<_> = views.iter().filter(|v| v.is_exception).collect();
    assert_eq!(replaced.len(), 1);
    assert_eq!(replaced[0].start_at.date(), date(2024, 1, 15));
    assert!(
        views
            .iter()
            .filter(|v| v.is_generated)
            .all(|v| v.status == EventStatus::Pending)
    );
}

#[test_log::test(tokio::test)]
async fn completing_all_flips_series_and_detached_rows() {
    let h = Harness::new();
    let created = h
        .service
        .create(
            &h.owner,
            recurring("Standup", at(2024, 1, 1, 9, 0), "weekly", 1, None),
        )
        .await
        .expect("series created");
    let series_id = series_of(&created);

    for (day, title) in [(8, "Moved standup"), (22, "Long standup")] {
        let patch = SeriesPatch::from(EventPatch {
            title: Some(title.to_owned()),
            ..EventPatch::default()
        });
        let view = h
            .service
            .update(
                &h.owner,
                occurrence(series_id, date(2024, 1, day)),
                OccurrenceScope::This,
                patch,
            )
            .await
            .expect("detached");
        assert_eq!(view.status, EventStatus::Pending);
    }

    h.service
        .complete(
            &h.owner,
            occurrence(series_id, date(2024, 1, 1)),
            OccurrenceScope::All,
        )
        .await
        .expect("completed");

    let series = h.store.series(series_id).expect("series kept");
    assert_eq!(series.status, EventStatus::Done);
    assert!(series.completed_at.is_some());
    let rows = h.store.events();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.status == EventStatus::Done));

    let views = h
        .service
        .list(&h.owner, window(date(2024, 1, 1), date(2024, 1, 31)))
        .await
        .expect("listed");
    assert!(views.iter().all(|v| v.status == EventStatus::Done));

    let last = h.recorder.sent().pop().expect("notified");
    assert_eq!(last.kind, NotificationKind::EventCompleted);
}

#[test_log::test(tokio::test)]
async fn uncompleting_an_occurrence_restores_it_once() {
    let h = Harness::new();
    let created = h
        .service
        .create(
            &h.owner,
            recurring("Standup", at(2024, 1, 1, 9, 0), "weekly", 1, None),
        )
        .await
        .expect("series created");
    let series_id = series_of(&created);
    let handle = occurrence(series_id, date(2024, 1, 15));

    h.service
        .complete(&h.owner, handle, OccurrenceScope::This)
        .await
        .expect("completed");

    let restored = h
        .service
        .uncomplete(&h.owner, handle)
        .await
        .expect("uncompleted");
    assert!(restored.is_generated);
    assert_eq!(restored.status, EventStatus::Pending);
    assert!(h.store.events().is_empty());
    assert!(h.store.exception_dates(series_id).is_empty());

    let notified = h.recorder.sent().len();
    let again = h
        .service
        .uncomplete(&h.owner, handle)
        .await
        .expect("repeat is harmless");
    assert_eq!(again, restored);
    assert_eq!(h.recorder.sent().len(), notified);
}

#[test_log::test(tokio::test)]
async fn uncompleting_a_done_series_reopens_everything() {
    let h = Harness::new();
    let created = h
        .service
        .create(
            &h.owner,
            recurring("Standup", at(2024, 1, 1, 9, 0), "weekly", 1, None),
        )
        .await
        .expect("series created");
    let series_id = series_of(&created);
    let first = occurrence(series_id, date(2024, 1, 1));

    h.service
        .complete(
            &h.owner,
            occurrence(series_id, date(2024, 1, 8)),
            OccurrenceScope::This,
        )
        .await
        .expect("completed one");
    h.service
        .complete(&h.owner, first, OccurrenceScope::All)
        .await
        .expect("completed all");

    let view = h
        .service
        .uncomplete(&h.owner, first)
        .await
        .expect("uncompleted");

    assert_eq!(view.status, EventStatus::Pending);
    let series = h.store.series(series_id).expect("series kept");
    assert_eq!(series.status, EventStatus::Pending);
    assert_eq!(series.completed_at, None);
    assert!(h.store.events().iter().all(|r| r.status == EventStatus::Pending));
}

// ============================================================================
// Updates
// ============================================================================

#[test_log::test(tokio::test)]
async fn editing_one_occurrence_leaves_the_rest() {
    let h = Harness::new();
    let created = h
        .service
        .create(
            &h.owner,
            recurring("Standup", at(2024, 1, 1, 9, 0), "weekly", 1, None),
        )
        .await
        .expect("series created");
    let series_id = series_of(&created);

    let patch = SeriesPatch::from(EventPatch {
        title: Some("Standup (moved)".to_owned()),
        start_at: Some(at(2024, 1, 9, 14, 0)),
        end_at: Some(at(2024, 1, 9, 15, 0)),
        ..EventPatch::default()
    });
    let moved = h
        .service
        .update(
            &h.owner,
            occurrence(series_id, date(2024, 1, 8)),
            OccurrenceScope::This,
            patch,
        )
        .await
        .expect("detached");
    assert!(matches!(moved.handle, EventHandle::Standalone { .. }));

    let views = h
        .service
        .list(&h.owner, window(date(2024, 1, 1), date(2024, 1, 21)))
        .await
        .expect("listed");
    assert_eq!(
        dates_of(&views),
        vec![date(2024, 1, 1), date(2024, 1, 9), date(2024, 1, 15)]
    );
    assert_eq!(views[1].title, "Standup (moved)");
    assert_eq!(views[0].title, "Standup");
    assert_eq!(views[2].title, "Standup");

    // Editing the detached row again keeps a single replacement.
    let again = h
        .service
        .update(
            &h.owner,
            moved.handle,
            OccurrenceScope::This,
            SeriesPatch::from(EventPatch {
                content: Some("room 4".to_owned()),
                ..EventPatch::default()
            }),
        )
        .await
        .expect("edited in place");
    assert_eq!(again.id, moved.id);
    assert_eq!(h.store.events().len(), 1);
    assert_eq!(h.store.exception_dates(series_id), vec![date(2024, 1, 8)]);
}

#[test_log::test(tokio::test)]
async fn editing_all_changes_the_rule() {
    let h = Harness::new();
    let created = h
        .service
        .create(
            &h.owner,
            recurring("Standup", at(2024, 1, 1, 9, 0), "weekly", 1, None),
        )
        .await
        .expect("series created");
    let series_id = series_of(&created);

    let patch = SeriesPatch {
        frequency: Some("daily".to_owned()),
        fields: EventPatch {
            title: Some("Daily standup".to_owned()),
            ..EventPatch::default()
        },
        ..SeriesPatch::default()
    };
    let view = h
        .service
        .update(
            &h.owner,
            occurrence(series_id, date(2024, 1, 15)),
            OccurrenceScope::All,
            patch,
        )
        .await
        .expect("series updated");
    assert_eq!(view.occurrence_date, Some(date(2024, 1, 1)));
    assert_eq!(view.title, "Daily standup");

    let views = h
        .service
        .list(&h.owner, window(date(2024, 1, 1), date(2024, 1, 7)))
        .await
        .expect("listed");
    assert_eq!(views.len(), 7);
    assert!(views.iter().all(|v| v.title == "Daily standup"));
}

#[test_log::test(tokio::test)]
async fn invalid_series_update_writes_nothing() {
    let h = Harness::new();
    let created = h
        .service
        .create(
            &h.owner,
            recurring("Standup", at(2024, 1, 1, 9, 0), "weekly", 1, None),
        )
        .await
        .expect("series created");
    let series_id = series_of(&created);
    let before = h.store.series(series_id).expect("series");

    let err = h
        .service
        .update(
            &h.owner,
            created.handle,
            OccurrenceScope::All,
            SeriesPatch {
                interval: Some(0),
                ..SeriesPatch::default()
            },
        )
        .await
        .expect_err("zero interval");

    assert!(matches!(err, ServiceError::InvalidRecurrenceRule(_)));
    assert_eq!(h.store.series(series_id), Some(before));
}

// ============================================================================
// Deletion
// ============================================================================

#[test_log::test(tokio::test)]
async fn deleting_one_occurrence_excludes_its_date() {
    let h = Harness::new();
    let created = h
        .service
        .create(
            &h.owner,
            recurring("Standup", at(2024, 1, 1, 9, 0), "weekly", 1, None),
        )
        .await
        .expect("series created");
    let series_id = series_of(&created);

    h.service
        .delete(
            &h.owner,
            occurrence(series_id, date(2024, 1, 8)),
            DeleteScope::Single,
        )
        .await
        .expect("deleted");

    let views = h
        .service
        .list(&h.owner, window(date(2024, 1, 1), date(2024, 1, 21)))
        .await
        .expect("listed");
    assert_eq!(dates_of(&views), vec![date(2024, 1, 1), date(2024, 1, 15)]);

    let last = h.recorder.sent().pop().expect("notified");
    assert_eq!(last.kind, NotificationKind::EventDeleted);
    assert_eq!(
        last.related_event_id,
        Some(occurrence(series_id, date(2024, 1, 8)).to_string())
    );
}

#[test_log::test(tokio::test)]
async fn deleting_a_detached_row_keeps_its_date_excluded() {
    let h = Harness::new();
    let created = h
        .service
        .create(
            &h.owner,
            recurring("Standup", at(2024, 1, 1, 9, 0), "weekly", 1, None),
        )
        .await
        .expect("series created");
    let series_id = series_of(&created);
    let detached = h
        .service
        .complete(
            &h.owner,
            occurrence(series_id, date(2024, 1, 8)),
            OccurrenceScope::This,
        )
        .await
        .expect("completed");

    h.service
        .delete(&h.owner, detached.handle, DeleteScope::Single)
        .await
        .expect("deleted");

    assert!(h.store.events().is_empty());
    assert_eq!(h.store.exception_dates(series_id), vec![date(2024, 1, 8)]);
    let views = h
        .service
        .list(&h.owner, window(date(2024, 1, 1), date(2024, 1, 14)))
        .await
        .expect("listed");
    assert_eq!(dates_of(&views), vec![date(2024, 1, 1)]);
}

#[test_log::test(tokio::test)]
async fn deleting_the_series_keeps_detached_rows() {
    let h = Harness::new();
    let created = h
        .service
        .create(
            &h.owner,
            recurring("Standup", at(2024, 1, 1, 9, 0), "weekly", 1, None),
        )
        .await
        .expect("series created");
    let series_id = series_of(&created);
    h.service
        .complete(
            &h.owner,
            occurrence(series_id, date(2024, 1, 8)),
            OccurrenceScope::This,
        )
        .await
        .expect("completed");

    h.service
        .delete(&h.owner, created.handle, DeleteScope::Series)
        .await
        .expect("deleted");

    assert_eq!(h.store.series(series_id), None);
    assert!(h.store.exception_dates(series_id).is_empty());
    let views = h
        .service
        .list(&h.owner, window(date(2024, 1, 1), date(2024, 1, 31)))
        .await
        .expect("listed");
    assert_eq!(dates_of(&views), vec![date(2024, 1, 8)]);
    assert_eq!(views[0].status, EventStatus::Done);

    let gone = h
        .service
        .get(&h.owner, created.handle)
        .await
        .expect_err("series gone");
    assert!(matches!(gone, ServiceError::NotFound(_)));
}

// ============================================================================
// Ownership and failures
// ============================================================================

#[test_log::test(tokio::test)]
async fn other_owners_see_nothing() {
    let h = Harness::new();
    let created = h
        .service
        .create(
            &h.owner,
            recurring("Standup", at(2024, 1, 1, 9, 0), "weekly", 1, None),
        )
        .await
        .expect("series created");
    let row = h
        .service
        .create(&h.owner, single("Audit", at(2024, 1, 2, 9, 0)))
        .await
        .expect("row created");
    let stranger = almanac_core::types::Owner::new(uuid::Uuid::now_v7());

    for handle in [created.handle, row.handle] {
        let err = h
            .service
            .get(&stranger, handle)
            .await
            .expect_err("hidden");
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = h
            .service
            .delete(&stranger, handle, DeleteScope::Series)
            .await
            .expect_err("hidden");
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    let views = h
        .service
        .list(&stranger, window(date(2024, 1, 1), date(2024, 1, 31)))
        .await
        .expect("listed");
    assert!(views.is_empty());
    assert_eq!(h.store.series_count(), 1);
}

#[test_log::test(tokio::test)]
async fn dates_off_the_rule_are_not_found() {
    let h = Harness::new();
    let created = h
        .service
        .create(
            &h.owner,
            recurring("Standup", at(2024, 1, 1, 9, 0), "weekly", 1, None),
        )
        .await
        .expect("series created");

    let err = h
        .service
        .complete(
            &h.owner,
            occurrence(series_of(&created), date(2024, 1, 3)),
            OccurrenceScope::This,
        )
        .await
        .expect_err("not an occurrence");
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert!(h.store.events().is_empty());
}

#[test_log::test(tokio::test)]
async fn failed_notification_does_not_fail_the_mutation() {
    let h = Harness::with_failing_notifier();
    let view = h
        .service
        .create(&h.owner, single("Audit", at(2024, 1, 2, 9, 0)))
        .await
        .expect("created despite notification failure");

    assert_eq!(h.store.events().len(), 1);
    assert_eq!(h.store.events()[0].title, view.title);
    let listed = h
        .service
        .notifications(&h.owner, None, 10)
        .await
        .expect("readable");
    assert!(listed.is_empty());
}

#[test_log::test(tokio::test)]
async fn failed_write_leaves_no_partial_state() {
    let h = Harness::new();
    let created = h
        .service
        .create(
            &h.owner,
            recurring("Standup", at(2024, 1, 1, 9, 0), "weekly", 1, None),
        )
        .await
        .expect("series created");
    let series_id = series_of(&created);
    let notified = h.recorder.sent().len();

    h.store.fail_next_apply();
    let err = h
        .service
        .complete(
            &h.owner,
            occurrence(series_id, date(2024, 1, 8)),
            OccurrenceScope::This,
        )
        .await
        .expect_err("write fails");

    assert!(matches!(err, ServiceError::TransactionFailure(_)));
    assert!(h.store.events().is_empty());
    assert!(h.store.exception_dates(series_id).is_empty());
    assert_eq!(h.recorder.sent().len(), notified);
}

#[test_log::test(tokio::test)]
async fn concurrent_single_deletes_converge() {
    let h = Harness::new();
    let created = h
        .service
        .create(
            &h.owner,
            recurring("Standup", at(2024, 1, 1, 9, 0), "weekly", 1, None),
        )
        .await
        .expect("series created");
    let handle = occurrence(series_of(&created), date(2024, 1, 8));

    let results = futures::future::join_all(
        (0..4).map(|_| h.service.delete(&h.owner, handle, DeleteScope::Single)),
    )
    .await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(
        h.store.exception_dates(series_of(&created)),
        vec![date(2024, 1, 8)]
    );
}
