use clap::Parser;
use crewdeck::{routes, AppState, Config};
use dotenv::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::parse();

    let portal = mycrew::Client::new(config.portal(), config.credentials())?;

    let app = routes::routes()
        .layer(CorsLayer::permissive())
        .with_state(AppState {
            portal,
            default_crew: config.default_crew.clone(),
        });

    info!("listening on {}", config.listen_addr);

    axum::Server::bind(&config.listen_addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
