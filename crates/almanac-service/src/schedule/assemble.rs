//! Date-window event listing.
//!
//! ## Summary
//! Merges one-off rows, detached rows and the expanded occurrences of every
//! relevant series into a single list ordered by start instant. Detached rows
//! are listed as themselves; the exception they come with keeps the series
//! from producing a duplicate for the same date.

use chrono::NaiveDate;

use almanac_db::model::series::EventSeries;
use almanac_recur::{DateWindow, Occurrences};

use crate::error::ServiceResult;
use crate::schedule::store::WindowSnapshot;
use crate::schedule::view::EventView;

#[derive(Debug, Clone, Copy)]
pub struct EventQueryAssembler {
    horizon_days: u32,
}

impl EventQueryAssembler {
    #[must_use]
    pub const fn new(horizon_days: u32) -> Self {
        Self { horizon_days }
    }

    /// ## Summary
    /// Builds the ordered view of `snapshot` for `window`.
    ///
    /// Ties on the start instant keep the order standalone, detached, then
    /// series occurrences in series order.
    ///
    /// ## Errors
    /// Returns `InvalidRecurrenceRule` if a stored series cannot be expanded.
    pub fn assemble(
        &self,
        snapshot: &WindowSnapshot,
        window: DateWindow,
    ) -> ServiceResult<Vec<EventView>> {
        let mut views: Vec<EventView> = snapshot
            .standalone
            .iter()
            .chain(&snapshot.detached)
            .map(EventView::from_event)
            .collect();

        for series in &snapshot.series {
            let rule = series.rule()?;
            let exceptions = snapshot.exceptions.dates(&series.id);
            let before = views.len();
            views.extend(
                Occurrences::new(&rule, window, exceptions, self.horizon_days)
                    .map(|occurrence| EventView::from_occurrence(series, &occurrence)),
            );
            tracing::trace!(
                series_id = %series.id,
                occurrences = views.len() - before,
                "Series expanded"
            );
        }

        views.sort_by_key(|view| view.start_at);
        Ok(views)
    }

    /// ## Summary
    /// Returns the view of the occurrence of `series` on `date`, or `None` if
    /// the rule does not produce that date.
    ///
    /// Exceptions are not consulted: an excluded date still names a valid
    /// occurrence, which the caller may overlay with its detached row.
    ///
    /// ## Errors
    /// Returns `InvalidRecurrenceRule` if the stored series is invalid.
    pub fn occurrence_view(
        &self,
        series: &EventSeries,
        date: NaiveDate,
    ) -> ServiceResult<Option<EventView>> {
        let rule = series.rule()?;
        let no_exceptions = std::collections::BTreeSet::new();
        Ok(
            Occurrences::new(&rule, DateWindow::new(date, date), &no_exceptions, self.horizon_days)
                .next()
                .map(|occurrence| EventView::from_occurrence(series, &occurrence)),
        )
    }
}
