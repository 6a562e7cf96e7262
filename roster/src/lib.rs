use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::{America::Bogota, Tz};
use icalendar::{Calendar, Component, Event, EventLike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod grid;
pub mod month;

pub use grid::{build_grid, CalendarCell, CalendarDay, Entry, GroundKind, GRID_CELLS};
pub use month::{month_span, DayBucket, MonthSchedule};

/// Timezone the portal reports local times in. Fixed UTC-5, no DST.
pub const PORTAL_TZ: Tz = Bogota;

/// A single duty unit on a crew member's roster: a flight leg, a standby
/// block, training, a day off and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Activity code as reported by the portal (`VU`, `DES`, ...).
    pub code: String,
    pub description: Option<String>,
    /// Fleet note, e.g. `A320`.
    pub fleet: Option<String>,
    pub flight: Option<Flight>,
}

/// Details of a flight leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub airline: String,
    /// Commercial flight number. `None` for non-commercial legs (ferries,
    /// repositioning), which the portal marks with a placeholder number.
    pub number: Option<String>,
    pub origin: String,
    pub destination: String,
    pub scheduled_departure: Option<DateTime<Utc>>,
    pub scheduled_arrival: Option<DateTime<Utc>>,
    pub actual_departure: Option<DateTime<Utc>>,
    pub actual_arrival: Option<DateTime<Utc>>,
    pub delayed: bool,
    pub advanced: bool,
    pub tail_number: Option<String>,
}

impl Assignment {
    /// Calendar date this assignment belongs to, in portal time.
    #[must_use]
    pub fn local_date(&self) -> NaiveDate {
        self.start.with_timezone(&PORTAL_TZ).date_naive()
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether this is an actual flight leg. Legs without a commercial
    /// flight number count as ground duty.
    #[must_use]
    pub fn is_flight(&self) -> bool {
        matches!(&self.flight, Some(flight) if flight.number.is_some())
    }

    pub fn to_event(&self) -> Event {
        let mut event = Event::new();

        event
            .starts(self.start)
            .ends(self.end)
            .uid(&self.id.to_string())
            .summary(&self.summary());

        if let Some(flight) = &self.flight {
            event.location(&format!("{} → {}", flight.origin, flight.destination));
        }

        if let Some(description) = &self.description {
            event.description(description);
        }

        event.done()
    }

    fn summary(&self) -> String {
        match &self.flight {
            Some(flight) => match &flight.number {
                Some(number) => format!("{} {}", flight.airline, number),
                None => format!("{} {} → {}", self.code, flight.origin, flight.destination),
            },
            None => self
                .description
                .clone()
                .unwrap_or_else(|| self.code.clone()),
        }
    }
}

pub fn build_calendar<'a>(assignments: impl Iterator<Item = &'a Assignment>) -> Calendar {
    Calendar::from_iter(assignments.map(Assignment::to_event))
}
