use chrono::{Datelike, NaiveDate, NaiveDateTime};
use crewdeck_roster::month_span;

/// Query window for the assignment endpoint: a start date and a number of
/// days to read forward from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// First day covered, queried at midnight portal time.
    pub start: NaiveDate,

    /// Days to cover, including `start`.
    pub days: i64,
}

impl Window {
    /// The window that covers (`year`, `month`) when browsing from `today`.
    ///
    /// For the current month and past months the window opens on the first
    /// of the month and runs one day longer than the month itself, so the
    /// last day cannot fall off the edge. The spare day is deliberate, not
    /// an off-by-one.
    ///
    /// Future months cannot be asked for directly: the endpoint returns an
    /// empty result for windows that open beyond the data it has published.
    /// Their windows therefore open on the last day of the current month
    /// and run forward to the end of the target month.
    ///
    /// `None` if (`year`, `month`) is not a valid calendar month.
    #[must_use]
    pub fn for_month(year: i32, month: u32, today: NaiveDate) -> Option<Self> {
        let (first, last) = month_span(year, month)?;

        if (year, month) > (today.year(), today.month()) {
            let (_, anchor) = month_span(today.year(), today.month())?;

            Some(Self {
                start: anchor,
                days: (last - anchor).num_days() + 1,
            })
        } else {
            let days_in_month = (last - first).num_days() + 1;

            Some(Self {
                start: first,
                days: days_in_month + 1,
            })
        }
    }

    /// Window start in the timestamp format the endpoint expects.
    #[must_use]
    pub fn start_param(&self) -> String {
        self.start_instant().format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    fn start_instant(&self) -> NaiveDateTime {
        // midnight always exists
        self.start.and_hms_opt(0, 0, 0).unwrap()
    }
}
