#![allow(clippy::expect_used)]
//! Reminder scans over the in-memory store.

use std::sync::Arc;

use almanac_db::db::enums::NotificationKind;
use almanac_service::reminder::ReminderScanner;
use almanac_service::schedule::OccurrenceScope;

use super::helpers::*;

fn scanner(h: &Harness) -> ReminderScanner {
    ReminderScanner::new(
        Arc::clone(&h.store) as _,
        Arc::clone(&h.recorder) as _,
        24,
        almanac_core::constants::DEFAULT_RECURRENCE_HORIZON_DAYS,
    )
}

fn reminders(h: &Harness) -> Vec<almanac_db::model::notification::Notification> {
    h.recorder
        .sent()
        .into_iter()
        .filter(|n| n.kind == NotificationKind::EventReminder)
        .collect()
}

#[test_log::test(tokio::test)]
async fn scan_reminds_rows_and_occurrences_once() {
    let h = Harness::new();
    let series = h
        .service
        .create(
            &h.owner,
            recurring("Standup", at(2024, 3, 1, 9, 0), "daily", 1, None),
        )
        .await
        .expect("series created");
    h.service
        .create(&h.owner, single("Inspection", at(2024, 3, 10, 14, 0)))
        .await
        .expect("row created");
    let scanner = scanner(&h);

    let sent = scanner
        .scan_once(at(2024, 3, 10, 8, 0))
        .await
        .expect("scan runs");
    assert_eq!(sent, 2);

    let written = reminders(&h);
    assert_eq!(written[0].message, "Event \"Standup\" starts at 2024-03-10 09:00.");
    assert_eq!(
        written[0].dedup_key,
        Some(format!("{}:2024-03-10", series_of(&series)))
    );
    assert!(written.iter().all(|n| n.owner_id == h.owner.id));

    let repeated = scanner
        .scan_once(at(2024, 3, 10, 8, 30))
        .await
        .expect("scan runs");
    assert_eq!(repeated, 0);
    assert_eq!(reminders(&h).len(), 2);
}

#[test_log::test(tokio::test)]
async fn completed_occurrences_are_not_reminded() {
    let h = Harness::new();
    let series = h
        .service
        .create(
            &h.owner,
            recurring("Standup", at(2024, 3, 1, 9, 0), "daily", 1, None),
        )
        .await
        .expect("series created");
    h.service
        .complete(
            &h.owner,
            occurrence(series_of(&series), date(2024, 3, 11)),
            OccurrenceScope::This,
        )
        .await
        .expect("completed");

    let sent = scanner(&h)
        .scan_once(at(2024, 3, 11, 8, 0))
        .await
        .expect("scan runs");

    assert_eq!(sent, 0);
    assert!(reminders(&h).is_empty());
}
