use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::RwLock;

use crate::token::Token;

/// Endpoints and client identifiers of a MyCrew deployment.
///
/// The portal frontend ships all of these as constants, and revisions of it
/// have rotated the scope and the gateway key more than once, so they are
/// configuration here rather than literals in request code.
#[derive(Debug, Clone)]
pub struct Portal {
    /// Base URL of the assignment API.
    pub base_url: String,

    /// OAuth token endpoint.
    pub auth_url: String,

    /// API gateway product key, sent as `Ocp-Apim-Subscription-Key` with
    /// every request.
    pub subscription_key: String,

    /// OAuth client id of the frontend. A public client.
    pub client_id: String,

    /// OAuth client secret. Public, like the client id.
    pub client_secret: String,

    /// Scopes requested with each token.
    pub scope: String,

    /// `Origin` the gateway expects to see.
    pub origin: String,
}

impl Default for Portal {
    fn default() -> Self {
        Self {
            base_url: "https://api-avianca.avianca.com/MycreWFlights/api".to_owned(),
            auth_url: "https://api-avianca.avianca.com/MyCrewSecurity/connect/token".to_owned(),
            subscription_key: "9d32877073ce403795da2254ae9c2de7".to_owned(),
            client_id: "angularclient".to_owned(),
            client_secret: "angularclient".to_owned(),
            scope: "email openid profile CrewApp offline_access".to_owned(),
            origin: "https://mycrew.avianca.com".to_owned(),
        }
    }
}

impl Portal {
    pub(crate) fn referer(&self) -> String {
        format!("{}/", self.origin)
    }
}

/// Portal login of one crew member.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Email used to sign in.
    pub username: String,

    /// Portal password.
    pub password: SecretString,
}

/// Asynchronous MyCrew client.
///
/// Cheap to clone; clones share the connection pool and the cached access
/// token.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) http: reqwest::Client,
    pub(crate) portal: Portal,
    pub(crate) credentials: Credentials,
    pub(crate) token: Arc<RwLock<Option<Token>>>,
}

impl Client {
    /// Initialize a client for one crew member. No network traffic happens
    /// until the first request.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying [`reqwest::Client`] initialization fails.
    pub fn new(portal: Portal, credentials: Credentials) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            portal,
            credentials,
            token: Arc::new(RwLock::new(None)),
        })
    }
}

/// User agent presented to the portal 🥸
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:109.0) Gecko/20100101 Firefox/115.0";

// the portal is slow on cold caches, but a month-sized query normally
// completes within seconds
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
