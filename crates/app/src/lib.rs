//! Wiring for the event-sourcing system.
//!
//! Reads configuration from the environment, installs structured logging,
//! and selects the event store that backs the repository.

pub mod config;
pub mod error;

use async_trait::async_trait;
use common::AggregateId;
use domain::{Aggregate, Repository, User};
use event_store::{
    EventBus, EventEnvelope, EventStore, InMemoryEventStore, PostgresEventStore, Result,
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::{Config, ConfigError, LogFormat, StoreBackend};
use error::AppError;

/// Event store selected at startup.
#[derive(Clone)]
pub enum AnyEventStore {
    Memory(InMemoryEventStore),
    Postgres(PostgresEventStore),
}

#[async_trait]
impl EventStore for AnyEventStore {
    async fn read_events(&self, aggregate_id: &AggregateId) -> Result<Vec<EventEnvelope>> {
        match self {
            Self::Memory(store) => store.read_events(aggregate_id).await,
            Self::Postgres(store) => store.read_events(aggregate_id).await,
        }
    }

    async fn append_event(
        &self,
        event: EventEnvelope,
        performed_by: Option<&AggregateId>,
    ) -> Result<()> {
        match self {
            Self::Memory(store) => store.append_event(event, performed_by).await,
            Self::Postgres(store) => store.append_event(event, performed_by).await,
        }
    }
}

/// Installs the global tracing subscriber.
///
/// `config.log_level` is an `EnvFilter` directive; an unparsable directive
/// falls back to `info`.
pub fn init_tracing(config: &Config) -> std::result::Result<(), AppError> {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?,
    }

    Ok(())
}

/// Opens the configured event store.
///
/// For PostgreSQL this connects the pool and creates the events table if
/// it does not exist yet.
pub async fn connect_store(config: &Config) -> std::result::Result<AnyEventStore, AppError> {
    match config.store {
        StoreBackend::Memory => Ok(AnyEventStore::Memory(InMemoryEventStore::new())),
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(ConfigError::Missing("DATABASE_URL"))?;

            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(url)
                .await
                .map_err(|e| AppError::Connect(e.into()))?;

            let store = PostgresEventStore::with_table(pool, config.events_table.clone())
                .map_err(AppError::Connect)?;
            store.setup_table().await.map_err(AppError::Connect)?;

            tracing::info!(table = store.table(), "Connected to PostgreSQL event store");
            Ok(AnyEventStore::Postgres(store))
        }
    }
}

/// Registers a user, changes their email, saves, and reads them back.
pub async fn run_user_scenario<S: EventStore, B: EventBus>(
    repo: &Repository<S, B>,
    email: &str,
    new_email: &str,
) -> std::result::Result<User, AppError> {
    let id = User::new_id();

    let mut user = User::register(id.clone(), email, "local|demo")?;
    user.change_email(new_email)?;
    tracing::info!(
        user = %id,
        pending = user.uncommitted_events().len(),
        "Issued user events"
    );

    repo.save(&mut user, Some(&id)).await?;

    let loaded = repo
        .get_by_id::<User>(&id)
        .await?
        .ok_or_else(|| AppError::Missing(id.to_string()))?;

    tracing::info!(
        user = %id,
        email = loaded.email(),
        version = %loaded.version(),
        "Reloaded user"
    );

    Ok(loaded)
}
