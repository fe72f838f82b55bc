use atheneum_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atheneum=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (store, storage, services, routes)
    let (_state, router) = atheneum_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    atheneum_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
