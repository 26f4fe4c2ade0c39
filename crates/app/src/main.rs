//! Application entry point.

use app::config::Config;
use app::error::AppError;
use domain::Repository;
use event_store::InMemoryEventBus;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Load configuration
    let config = Config::from_env()?;

    // 2. Initialize tracing
    app::init_tracing(&config)?;

    // 3. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 4. Open the event store and build the repository
    let store = app::connect_store(&config).await?;
    let bus = InMemoryEventBus::new();
    let repo = Repository::with_bus(store, bus.clone());
    tracing::info!(store = ?config.store, "Event store ready");

    // 5. Run the user scenario
    let user = app::run_user_scenario(&repo, "a@x.com", "b@x.com").await?;
    let published = bus.published_count().await;
    tracing::info!(email = user.email(), published, "Scenario complete");

    tracing::info!(metrics = %metrics_handle.render(), "Shutting down");
    Ok(())
}
