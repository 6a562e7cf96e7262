use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Assignment;

/// First and last day of a calendar month.
#[must_use]
pub fn month_span(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };

    Some((first, next.pred_opt()?))
}

/// One calendar day and everything scheduled on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub assignments: Vec<Assignment>,
    /// Summed assignment time in minutes. `None` on days without
    /// assignments, which is not the same as an explicit zero.
    pub duty_minutes: Option<i64>,
}

impl DayBucket {
    fn new(date: NaiveDate, mut assignments: Vec<Assignment>) -> Self {
        assignments.sort_by_key(|a| (a.start, a.id));

        let duty_minutes = if assignments.is_empty() {
            None
        } else {
            Some(
                assignments
                    .iter()
                    .map(|a| a.duration().num_minutes())
                    .sum(),
            )
        };

        Self {
            date,
            assignments,
            duty_minutes,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// A crew member's roster for one calendar month: one bucket per day, first
/// to last, no gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSchedule {
    pub year: i32,
    pub month: u32,
    pub days: Vec<DayBucket>,
}

impl MonthSchedule {
    /// Bucket `records` into the days of (`year`, `month`).
    ///
    /// Records outside the month are dropped; the portal overshoots the
    /// query window on both ends, so raw responses regularly carry spillover
    /// from neighboring months. Days the portal said nothing about come out
    /// as empty buckets. A record belongs to the date of its start instant
    /// in portal time, regardless of when it ends.
    ///
    /// `None` if (`year`, `month`) is not a valid calendar month.
    #[must_use]
    pub fn build(year: i32, month: u32, records: Vec<Assignment>) -> Option<Self> {
        let (first, last) = month_span(year, month)?;

        let mut by_date: BTreeMap<NaiveDate, Vec<Assignment>> = BTreeMap::new();

        for record in records {
            let date = record.local_date();
            if date < first || date > last {
                continue;
            }
            by_date.entry(date).or_default().push(record);
        }

        let days = first
            .iter_days()
            .take_while(|date| *date <= last)
            .map(|date| DayBucket::new(date, by_date.remove(&date).unwrap_or_default()))
            .collect();

        Some(Self { year, month, days })
    }

    /// Total duty time over the month, in minutes.
    #[must_use]
    pub fn duty_minutes(&self) -> i64 {
        self.days.iter().filter_map(|d| d.duty_minutes).sum()
    }

    #[must_use]
    pub fn assignment_count(&self) -> usize {
        self.days.iter().map(|d| d.assignments.len()).sum()
    }
}
