pub mod error;
pub mod routes;

use clap::Parser;
use secrecy::SecretString;

pub use error::AppError;

pub type Result<T, E = AppError> = core::result::Result<T, E>;

#[derive(Debug, Parser)]
pub struct Config {
    #[clap(long, env, default_value = "0.0.0.0:8000")]
    pub listen_addr: std::net::SocketAddr,

    /// Portal account every request is served with.
    #[clap(long, env)]
    pub portal_username: String,

    #[clap(long, env, hide_env_values = true, parse(from_str = into_secret))]
    pub portal_password: SecretString,

    /// Crew member id used when a request doesn't name one.
    #[clap(long, env)]
    pub default_crew: Option<String>,

    /// Overrides the OAuth scope. Portal revisions disagree on the exact string,
    /// so it stays configurable.
    #[clap(long, env)]
    pub portal_scope: Option<String>,
}

fn into_secret(s: &str) -> SecretString {
    SecretString::new(s.to_owned())
}

impl Config {
    pub fn portal(&self) -> mycrew::Portal {
        let mut portal = mycrew::Portal::default();

        if let Some(scope) = &self.portal_scope {
            portal.scope = scope.clone();
        }

        portal
    }

    pub fn credentials(&self) -> mycrew::Credentials {
        mycrew::Credentials {
            username: self.portal_username.clone(),
            password: self.portal_password.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub portal: mycrew::Client,
    pub default_crew: Option<String>,
}
