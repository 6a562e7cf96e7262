//! Assignment download and conversion into roster types.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use crewdeck_roster::{Assignment, Flight, PORTAL_TZ};
use reqwest::{header, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::{token::AuthError, window::Window, Client};

/// Fixed offset the frontend sends with every assignment query, minutes
/// east of UTC. The endpoint localizes `...Local` fields with it.
const TIMEZONE_OFFSET_MINUTES: i32 = -300;

/// What the portal puts where a leg has no commercial flight number.
const FLIGHT_NUMBER_PLACEHOLDER: &str = "XXX";

// with or without fractional seconds, depending on the field
const LOCAL_TIME_FMT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A fetch failure.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No token could be obtained. The assignment query was never sent.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The assignment endpoint answered with an unexpected status.
    #[error("assignment endpoint returned {0}")]
    Rejected(StatusCode),

    /// Some HTTP request failed.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireDay {
    start_date: Option<String>,
    #[serde(rename = "AssignementList", default)] // sic
    assignments: Vec<WireAssignment>,
    // dem: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireAssignment {
    activity_code: Option<String>,
    activity_desc: Option<String>,
    start_date_local: Option<String>,
    end_date_local: Option<String>,
    fleet: Option<String>,
    #[serde(rename = "FlighAssignement")] // sic
    flight: Option<WireFlight>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireFlight {
    airline: Option<String>,
    commercial_flight_number: Option<String>,
    #[serde(rename = "OriginAirportIATACode")]
    origin: Option<String>,
    #[serde(rename = "FinalAirportIATACode")]
    destination: Option<String>,
    scheduled_departure_date: Option<String>,
    scheduled_arrival_date: Option<String>,
    actual_departure_date: Option<String>,
    actual_arrival_date: Option<String>,
    #[serde(default)]
    is_delayed: bool,
    #[serde(default)]
    is_advanced: bool,
    tail_number: Option<String>,
    // duration: i64,
}

fn parse_local(s: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, LOCAL_TIME_FMT).ok()?;

    // Bogota has no DST, so every local time maps to exactly one instant
    PORTAL_TZ
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

/// Records carry no id of their own, so one is derived from the fields
/// that identify a duty: who, when, what.
fn assignment_id(crew_id: &str, start: DateTime<Utc>, code: &str) -> Uuid {
    let key = format!("{crew_id}:{}:{code}", start.to_rfc3339());
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
}

fn try_into_assignment(
    wire: WireAssignment,
    crew_id: &str,
    day_start: Option<&str>,
) -> Option<Assignment> {
    // all-day activities sometimes omit StartDateLocal and only date the
    // surrounding day object
    let start = wire
        .start_date_local
        .as_deref()
        .or(day_start)
        .and_then(parse_local)?;
    let end = wire
        .end_date_local
        .as_deref()
        .and_then(parse_local)
        .unwrap_or(start);

    let code = wire
        .activity_code
        .map(|s| s.trim().to_owned())
        .unwrap_or_default();

    Some(Assignment {
        id: assignment_id(crew_id, start, &code),
        start,
        end,
        code,
        description: non_empty(wire.activity_desc),
        fleet: non_empty(wire.fleet),
        flight: wire.flight.and_then(try_into_flight),
    })
}

fn try_into_flight(wire: WireFlight) -> Option<Flight> {
    let origin = non_empty(wire.origin)?;
    let destination = non_empty(wire.destination)?;

    let number = non_empty(wire.commercial_flight_number)
        .filter(|number| number != FLIGHT_NUMBER_PLACEHOLDER);

    Some(Flight {
        airline: non_empty(wire.airline).unwrap_or_default(),
        number,
        origin,
        destination,
        scheduled_departure: wire
            .scheduled_departure_date
            .as_deref()
            .and_then(parse_local),
        scheduled_arrival: wire.scheduled_arrival_date.as_deref().and_then(parse_local),
        actual_departure: wire.actual_departure_date.as_deref().and_then(parse_local),
        actual_arrival: wire.actual_arrival_date.as_deref().and_then(parse_local),
        delayed: wire.is_delayed,
        advanced: wire.is_advanced,
        tail_number: non_empty(wire.tail_number),
    })
}

impl Client {
    /// Download the flat assignment list for one crew member over `window`.
    ///
    /// Exactly one query, no retries, and the result comes back in whatever
    /// order the portal feels like; callers group and sort. An empty list
    /// is a normal outcome, not an error: windows that reach beyond
    /// published data simply have nothing in them. Records the endpoint
    /// mangles too badly to date are skipped rather than fatal.
    ///
    /// # Errors
    ///
    /// [`FetchError::Auth`] if no token could be obtained (the query is
    /// never sent in that case), [`FetchError::Rejected`] or
    /// [`FetchError::Http`] if the query itself fails.
    #[instrument(skip(self))]
    pub async fn assignments(
        &self,
        crew_id: &str,
        window: Window,
    ) -> Result<Vec<Assignment>, FetchError> {
        let token = self.ensure_token(false).await?;

        let res = self
            .http
            .get(format!(
                "{}/Assignements/AssignmentsComplete",
                self.portal.base_url
            ))
            .query(&[
                ("crewId", crew_id.to_owned()),
                ("startDate", window.start_param()),
                ("days", window.days.to_string()),
                ("timeZoneOffset", TIMEZONE_OFFSET_MINUTES.to_string()),
            ])
            .header(header::AUTHORIZATION, token.bearer())
            .header(header::ACCEPT, "application/json")
            .header(
                "Ocp-Apim-Subscription-Key",
                self.portal.subscription_key.as_str(),
            )
            .header(header::ORIGIN, self.portal.origin.as_str())
            .header(header::REFERER, self.portal.referer())
            .send()
            .await?;

        if !res.status().is_success() {
            warn!(status = %res.status(), "assignment query rejected");
            return Err(FetchError::Rejected(res.status()));
        }

        // the response nests days inside months; both layers are noise
        let months: Vec<Vec<WireDay>> = res.json().await?;

        let mut records = Vec::new();

        for day in months.into_iter().flatten() {
            let WireDay {
                start_date,
                assignments,
            } = day;

            for wire in assignments {
                if let Some(record) = try_into_assignment(wire, crew_id, start_date.as_deref()) {
                    records.push(record);
                }
            }
        }

        debug!(records = records.len(), "fetched assignments");

        Ok(records)
    }
}
