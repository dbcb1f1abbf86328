use crate::errors::Result;
use crate::model::{AirQualityRecord, NewAirQuality};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

/// Append-only storage for snapshot records.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn insert(&self, record: NewAirQuality) -> Result<AirQualityRecord>;

    /// Record with the highest AQI, or `None` when nothing has been stored.
    async fn most_polluted(&self) -> Result<Option<AirQualityRecord>>;
}

pub async fn make_pool(options: PgConnectOptions) -> Result<PgPool> {
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await?;

    info!("Database connection established");
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations completed");

    Ok(pool)
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotStore for PgStore {
    async fn insert(&self, record: NewAirQuality) -> Result<AirQualityRecord> {
        // NUMERIC columns are read back as float8 so no decimal crate is needed
        let query = r#"
            INSERT INTO air_quality (aqi, latitude, longitude)
            VALUES ($1, $2, $3)
            RETURNING id, aqi, latitude::float8 AS latitude, longitude::float8 AS longitude, created_at
            "#;

        let saved = sqlx::query_as::<_, AirQualityRecord>(query)
            .bind(record.aqi)
            .bind(record.latitude)
            .bind(record.longitude)
            .fetch_one(&self.pool)
            .await?;

        debug!("Inserted air_quality row {}", saved.id);
        Ok(saved)
    }

    async fn most_polluted(&self) -> Result<Option<AirQualityRecord>> {
        // Ties on aqi resolve to the earliest row.
        let query = r#"
            SELECT id, aqi, latitude::float8 AS latitude, longitude::float8 AS longitude, created_at
            FROM air_quality
            ORDER BY aqi DESC, id ASC
            LIMIT 1
            "#;

        let record = sqlx::query_as::<_, AirQualityRecord>(query)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }
}
