use chrono::{DateTime, Datelike, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    month::{DayBucket, MonthSchedule},
    Assignment, PORTAL_TZ,
};

/// Cells in the fixed six-week grid.
pub const GRID_CELLS: usize = 42;

/// One cell of the 6x7 month grid, Monday first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalendarCell {
    /// Padding outside the month.
    Blank,
    Day(CalendarDay),
}

/// A day cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    /// Day of month, starting at 1.
    pub day: u32,
    /// Saturday or Sunday.
    pub weekend: bool,
    pub duty_minutes: Option<i64>,
    pub entries: Vec<Entry>,
}

impl CalendarDay {
    fn new(bucket: &DayBucket) -> Self {
        Self {
            day: bucket.date.day(),
            weekend: bucket.date.weekday().num_days_from_monday() >= 5,
            duty_minutes: bucket.duty_minutes,
            entries: bucket
                .assignments
                .iter()
                .map(Entry::from_assignment)
                .collect(),
        }
    }
}

/// How one assignment shows up in a calendar cell. Times are portal-local.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entry {
    /// A leg with a commercial flight number.
    Flight {
        airline: String,
        number: String,
        origin: String,
        destination: String,
        departs: NaiveTime,
        arrives: NaiveTime,
    },
    /// Everything else: office duty, training, standby, days off and legs
    /// without a commercial flight number.
    Ground {
        code: String,
        description: Option<String>,
        category: GroundKind,
        starts: NaiveTime,
        ends: NaiveTime,
    },
}

impl Entry {
    fn from_assignment(assignment: &Assignment) -> Self {
        if let Some(flight) = &assignment.flight {
            if let Some(number) = &flight.number {
                return Self::Flight {
                    airline: flight.airline.clone(),
                    number: number.clone(),
                    origin: flight.origin.clone(),
                    destination: flight.destination.clone(),
                    departs: local_time(assignment.start),
                    arrives: local_time(assignment.end),
                };
            }
        }

        Self::Ground {
            code: assignment.code.clone(),
            description: assignment.description.clone(),
            category: GroundKind::classify(&assignment.code, assignment.description.as_deref()),
            starts: local_time(assignment.start),
            ends: local_time(assignment.end),
        }
    }
}

/// Coarse ground-duty category, used for badges in calendar UIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundKind {
    DayOff,
    Standby,
    Duty,
}

impl GroundKind {
    // Codes come numbered (RSV1, DES2) and whitespace-padded; tokens match
    // as substrings. The short code tokens are not applied to the free-text
    // description.
    fn classify(code: &str, description: Option<&str>) -> Self {
        let code = code.trim().to_uppercase();
        let description = description.unwrap_or_default().to_uppercase();

        if code.contains("DES")
            || code.contains("OFF")
            || description.contains("DESCANSO")
            || description.contains("DAY OFF")
        {
            return Self::DayOff;
        }

        if code.contains("RSV")
            || code.contains("STBY")
            || description.contains("RESERVA")
            || description.contains("STANDBY")
        {
            return Self::Standby;
        }

        Self::Duty
    }
}

fn local_time(instant: DateTime<Utc>) -> NaiveTime {
    instant.with_timezone(&PORTAL_TZ).time()
}

/// Lay a month out as a wall calendar: a fixed 6x7 grid, Monday first.
///
/// Always exactly [`GRID_CELLS`] cells. Leading blanks align the first of
/// the month with its weekday, trailing blanks fill the remainder. The
/// longest case (a 31-day month starting on a Sunday) occupies 37 cells, so
/// every month fits.
#[must_use]
pub fn build_grid(schedule: &MonthSchedule) -> Vec<CalendarCell> {
    let mut cells = Vec::with_capacity(GRID_CELLS);

    if let Some(first) = schedule.days.first() {
        let offset = first.date.weekday().num_days_from_monday() as usize;
        cells.resize(offset, CalendarCell::Blank);
    }

    for bucket in &schedule.days {
        cells.push(CalendarCell::Day(CalendarDay::new(bucket)));
    }

    cells.resize(GRID_CELLS, CalendarCell::Blank);
    cells
}
