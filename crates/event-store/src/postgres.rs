use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    AggregateId, EventEnvelope, EventId, EventStoreError, Result, Version,
    store::{EventStore, validate_event_for_append},
};

/// Default table holding the event log.
pub const DEFAULT_TABLE: &str = "events";

const VERSION_KEY_SUFFIX: &str = "_aggregate_version_key";

// PostgreSQL truncates identifiers beyond 63 bytes.
const MAX_TABLE_NAME_LEN: usize = 63 - VERSION_KEY_SUFFIX.len();

/// PostgreSQL-backed event store implementation.
///
/// One row per event. The `(aggregate_id_type, aggregate_id, aggregate_version)`
/// unique constraint enforces optimistic concurrency; violations are
/// translated into [`EventStoreError::ConcurrencyConflict`].
#[derive(Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
    table: String,
}

impl PostgresEventStore {
    /// Creates a new PostgreSQL event store using the default table.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            table: DEFAULT_TABLE.to_string(),
        }
    }

    /// Creates a store writing to `table`.
    ///
    /// The name is interpolated into SQL, so only ASCII letters, digits and
    /// underscores are accepted. It is lowercased the way PostgreSQL folds
    /// unquoted identifiers, and must leave room for the derived constraint
    /// names within the 63-byte identifier limit.
    pub fn with_table(pool: PgPool, table: impl Into<String>) -> Result<Self> {
        let table = table.into().to_ascii_lowercase();
        let valid = !table.is_empty()
            && table.len() <= MAX_TABLE_NAME_LEN
            && !table.starts_with(|c: char| c.is_ascii_digit())
            && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(EventStoreError::InvalidTableName(table));
        }
        Ok(Self { pool, table })
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Creates the event table and its read index if they do not exist.
    pub async fn setup_table(&self) -> Result<()> {
        let table = &self.table;
        sqlx::raw_sql(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                aggregate_id UUID NOT NULL,
                aggregate_id_type VARCHAR(256) NOT NULL,
                aggregate_version BIGINT NOT NULL,
                created TIMESTAMPTZ NOT NULL,
                event_id UUID NOT NULL,
                event_type VARCHAR(1024) NOT NULL,
                event_data JSONB NOT NULL,
                performed_by UUID NULL,
                CONSTRAINT {table}_event_id_key UNIQUE (event_id),
                CONSTRAINT {table}{VERSION_KEY_SUFFIX}
                    UNIQUE (aggregate_id_type, aggregate_id, aggregate_version)
            );

            CREATE INDEX IF NOT EXISTS {table}_aggregate_idx
                ON {table} (aggregate_id_type, aggregate_id);
            "#
        ))
        .execute(&self.pool)
        .await?;

        tracing::debug!(table = %self.table, "event table ready");
        Ok(())
    }

    fn row_to_event(row: PgRow) -> Result<EventEnvelope> {
        let kind: String = row.try_get("aggregate_id_type")?;

        Ok(EventEnvelope {
            event_id: EventId::from_uuid(row.try_get::<Uuid, _>("event_id")?),
            event_type: row.try_get("event_type")?,
            aggregate_id: AggregateId::new(kind, row.try_get::<Uuid, _>("aggregate_id")?),
            version: Version::new(row.try_get("aggregate_version")?),
            created: row.try_get("created")?,
            payload: row.try_get("event_data")?,
        })
    }

    fn event_id_key(&self) -> String {
        format!("{}_event_id_key", self.table)
    }

    fn map_insert_error(&self, e: sqlx::Error, event: &EventEnvelope) -> EventStoreError {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            if db_err.constraint() == Some(self.event_id_key().as_str()) {
                return EventStoreError::DuplicateEvent(event.event_id);
            }
            return EventStoreError::ConcurrencyConflict {
                aggregate_id: event.aggregate_id.clone(),
                version: event.version,
            };
        }
        EventStoreError::Database(e)
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn read_events(&self, aggregate_id: &AggregateId) -> Result<Vec<EventEnvelope>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT aggregate_id, aggregate_id_type, aggregate_version, created, event_id, event_type, event_data
            FROM {}
            WHERE aggregate_id_type = $1 AND aggregate_id = $2
            ORDER BY aggregate_version ASC
            "#,
            self.table
        ))
        .bind(aggregate_id.kind())
        .bind(aggregate_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_event).collect()
    }

    async fn append_event(
        &self,
        event: EventEnvelope,
        performed_by: Option<&AggregateId>,
    ) -> Result<()> {
        validate_event_for_append(&event)?;

        sqlx::query(&format!(
            r#"
            INSERT INTO {} (aggregate_id, aggregate_id_type, aggregate_version, created, event_id, event_type, event_data, performed_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
            self.table
        ))
        .bind(event.aggregate_id.as_uuid())
        .bind(event.aggregate_id.kind())
        .bind(event.version.as_i64())
        .bind(event.created)
        .bind(event.event_id.as_uuid())
        .bind(&event.event_type)
        .bind(&event.payload)
        .bind(performed_by.map(AggregateId::as_uuid))
        .execute(&self.pool)
        .await
        .map_err(|e| self.map_insert_error(e, &event))?;

        Ok(())
    }
}
