//! End-to-end tests against a fake portal.

use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use mycrew::{schedule::FetchError, AuthError, Client, Credentials, Portal, Window};
use secrecy::SecretString;
use serde_json::json;

#[derive(Clone)]
struct PortalState {
    auth_hits: Arc<AtomicUsize>,
    query_hits: Arc<AtomicUsize>,
    /// Logins that succeed before the identity endpoint starts rejecting.
    logins_allowed: usize,
    queries_fail: bool,
}

async fn token(State(state): State<PortalState>) -> Response {
    let hit = state.auth_hits.fetch_add(1, Ordering::SeqCst);

    if hit < state.logins_allowed {
        Json(json!({
            "access_token": format!("token-{hit}"),
            "expires_in": 18000,
            "token_type": "Bearer"
        }))
        .into_response()
    } else {
        StatusCode::BAD_REQUEST.into_response()
    }
}

async fn assignments(State(state): State<PortalState>) -> Response {
    state.query_hits.fetch_add(1, Ordering::SeqCst);

    if state.queries_fail {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    Json(json!([
        [
            {
                "StartDate": "2025-09-01T00:00:00",
                "Dem": 120,
                "AssignementList": [
                    {
                        "ActivityCode": "VU ",
                        "ActivityDesc": "VUELO",
                        "StartDateLocal": "2025-09-01T08:30:00",
                        "EndDateLocal": "2025-09-01T10:30:00",
                        "Fleet": "A320",
                        "FlighAssignement": {
                            "Airline": "AV",
                            "CommercialFlightNumber": "9345",
                            "OriginAirportIATACode": "BOG",
                            "FinalAirportIATACode": "MDE"
                        }
                    }
                ]
            }
        ]
    ]))
    .into_response()
}

struct MockPortal {
    addr: SocketAddr,
    auth_hits: Arc<AtomicUsize>,
    query_hits: Arc<AtomicUsize>,
}

impl MockPortal {
    fn spawn(logins_allowed: usize) -> Self {
        Self::spawn_with(logins_allowed, false)
    }

    fn spawn_with(logins_allowed: usize, queries_fail: bool) -> Self {
        let auth_hits = Arc::new(AtomicUsize::new(0));
        let query_hits = Arc::new(AtomicUsize::new(0));

        let state = PortalState {
            auth_hits: auth_hits.clone(),
            query_hits: query_hits.clone(),
            logins_allowed,
            queries_fail,
        };

        let app = Router::new()
            .route("/connect/token", post(token))
            .route("/api/Assignements/AssignmentsComplete", get(assignments))
            .with_state(state);

        let server =
            axum::Server::bind(&"127.0.0.1:0".parse().unwrap()).serve(app.into_make_service());
        let addr = server.local_addr();

        tokio::spawn(server);

        Self {
            addr,
            auth_hits,
            query_hits,
        }
    }

    fn client(&self) -> Client {
        let portal = Portal {
            base_url: format!("http://{}/api", self.addr),
            auth_url: format!("http://{}/connect/token", self.addr),
            ..Portal::default()
        };

        let credentials = Credentials {
            username: "crew@example.com".to_owned(),
            password: SecretString::new("hunter2".to_owned()),
        };

        Client::new(portal, credentials).unwrap()
    }

    fn auth_hits(&self) -> usize {
        self.auth_hits.load(Ordering::SeqCst)
    }

    fn query_hits(&self) -> usize {
        self.query_hits.load(Ordering::SeqCst)
    }
}

fn september() -> Window {
    Window {
        start: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
        days: 31,
    }
}

#[tokio::test]
async fn tokens_are_reused_while_fresh() {
    let portal = MockPortal::spawn(usize::MAX);
    let client = portal.client();

    let first = client.ensure_token(false).await.unwrap();
    let second = client.ensure_token(false).await.unwrap();

    assert_eq!(portal.auth_hits(), 1);
    assert_eq!(first.bearer(), second.bearer());
}

#[tokio::test]
async fn force_renewal_always_logs_in() {
    let portal = MockPortal::spawn(usize::MAX);
    let client = portal.client();

    client.ensure_token(false).await.unwrap();
    let renewed = client.ensure_token(true).await.unwrap();

    assert_eq!(portal.auth_hits(), 2);
    assert_eq!(renewed.bearer(), "Bearer token-1");
}

#[tokio::test]
async fn bad_credentials_are_reported() {
    let portal = MockPortal::spawn(0);
    let client = portal.client();

    let err = client.ensure_token(false).await.unwrap_err();

    assert!(matches!(err, AuthError::BadCredentials));
}

#[tokio::test]
async fn failed_renewal_drops_the_cached_token() {
    let portal = MockPortal::spawn(1);
    let client = portal.client();

    client.ensure_token(false).await.unwrap();
    client.ensure_token(true).await.unwrap_err();

    // the cache is empty now, so this has to go back to the network
    // instead of serving the (still young) old token
    client.ensure_token(false).await.unwrap_err();

    assert_eq!(portal.auth_hits(), 3);
}

#[tokio::test]
async fn auth_failure_short_circuits_the_fetch() {
    let portal = MockPortal::spawn(0);
    let client = portal.client();

    let err = client
        .assignments("32385184", september())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Auth(AuthError::BadCredentials)));
    assert_eq!(portal.query_hits(), 0);
}

#[tokio::test]
async fn fetch_flattens_the_response() {
    let portal = MockPortal::spawn(usize::MAX);
    let client = portal.client();

    let records = client.assignments("32385184", september()).await.unwrap();

    assert_eq!(portal.auth_hits(), 1);
    assert_eq!(portal.query_hits(), 1);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].code, "VU");
    assert!(records[0].is_flight());
}

#[tokio::test]
async fn fetch_reuses_the_token() {
    let portal = MockPortal::spawn(usize::MAX);
    let client = portal.client();

    client.assignments("32385184", september()).await.unwrap();
    client.assignments("32385184", september()).await.unwrap();

    assert_eq!(portal.auth_hits(), 1);
    assert_eq!(portal.query_hits(), 2);
}

#[tokio::test]
async fn upstream_rejection_is_surfaced() {
    let portal = MockPortal::spawn_with(usize::MAX, true);
    let client = portal.client();

    let err = client
        .assignments("32385184", september())
        .await
        .unwrap_err();

    assert!(
        matches!(err, FetchError::Rejected(status) if status == StatusCode::SERVICE_UNAVAILABLE)
    );
    assert_eq!(portal.query_hits(), 1);
}
