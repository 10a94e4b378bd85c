use async_trait::async_trait;
use log::{error, info};
use pws_history_core::ensure_parent_dir;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::{future::Future, str::FromStr, time::Duration};
use tokio::sync::{mpsc, oneshot};

use super::{Error, ObservationStore};
use crate::{NewObservation, StoredObservation};

type WriteOperation = std::pin::Pin<Box<dyn Future<Output = ()> + Send>>;

/// Runs every write on one task so concurrent ingestion never fights over
/// the sqlite write lock.
pub struct DatabaseWriter {
    write_tx: mpsc::UnboundedSender<WriteOperation>,
    _handle: tokio::task::JoinHandle<()>,
}

impl Default for DatabaseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseWriter {
    pub fn new() -> Self {
        let (write_tx, mut write_rx) = mpsc::unbounded_channel::<WriteOperation>();

        let handle = tokio::spawn(async move {
            while let Some(future) = write_rx.recv().await {
                future.await;
            }
        });

        Self {
            write_tx,
            _handle: handle,
        }
    }

    pub async fn execute<T, F, Fut>(&self, pool: SqlitePool, operation: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(SqlitePool) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel::<Result<T, Error>>();

        let write_op = Box::pin(async move {
            let result = operation(pool).await;
            let _ = result_tx.send(result);
        });

        self.write_tx
            .send(write_op)
            .map_err(|_| Error::Writer(String::from("writer channel closed")))?;

        result_rx
            .await
            .map_err(|_| Error::Writer(String::from("failed to receive write result")))?
    }
}

pub struct Database {
    pool: SqlitePool,
    writer: DatabaseWriter,
}

impl Database {
    /// Opens (creating if missing) the sqlite file and brings the schema up
    /// to date. Any failure here should stop the process from serving.
    pub async fn new(db_path: &str) -> Result<Self, Error> {
        ensure_parent_dir(db_path)?;

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))?
            .create_if_missing(true)
            .pragma("journal_mode", "WAL")
            .pragma("synchronous", "NORMAL")
            .pragma("busy_timeout", "5000")
            .pragma("temp_store", "MEMORY");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        let db = Self {
            pool,
            writer: DatabaseWriter::new(),
        };

        db.run_migrations().await?;
        info!("SQLite database initialized at: {}", db_path);

        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Checkpoint WAL to the main database file before shutdown.
    pub async fn checkpoint(&self) {
        match sqlx::query("PRAGMA wal_checkpoint(TRUNCATE);")
            .execute(&self.pool)
            .await
        {
            Ok(_) => info!("WAL checkpoint completed successfully"),
            Err(e) => error!("WAL checkpoint failed: {}", e),
        }
    }
}

#[async_trait]
impl ObservationStore for Database {
    async fn insert_observations(&self, rows: Vec<NewObservation>) -> Result<usize, Error> {
        if rows.is_empty() {
            return Ok(0);
        }
        let pool = self.pool.clone();

        self.writer
            .execute(pool, move |pool| async move {
                let mut tx = pool.begin().await?;
                let mut count = 0;

                for row in rows {
                    sqlx::query(
                        "INSERT INTO weather_data (
                            station_id, date, temp, dewpt, humidity, pressure,
                            wind_speed, wind_gust, wind_dir, precip_rate, precip_total,
                            solar_radiation, uv, obs_time_utc, obs_time_local
                        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    )
                    .bind(&row.station_id)
                    .bind(&row.date)
                    .bind(row.temp)
                    .bind(row.dewpt)
                    .bind(row.humidity)
                    .bind(row.pressure)
                    .bind(row.wind_speed)
                    .bind(row.wind_gust)
                    .bind(row.wind_dir)
                    .bind(row.precip_rate)
                    .bind(row.precip_total)
                    .bind(row.solar_radiation)
                    .bind(row.uv)
                    .bind(&row.obs_time_utc)
                    .bind(&row.obs_time_local)
                    .execute(&mut *tx)
                    .await?;
                    count += 1;
                }

                tx.commit().await?;
                Ok(count)
            })
            .await
    }

    async fn latest_observations(&self, limit: u32) -> Result<Vec<StoredObservation>, Error> {
        let rows = sqlx::query_as::<_, StoredObservation>(
            "SELECT id, station_id, date, temp, dewpt, humidity, pressure,
                    wind_speed, wind_gust, wind_dir, precip_rate, precip_total,
                    solar_radiation, uv, obs_time_utc, obs_time_local,
                    CAST(created_at AS TEXT) AS created_at
             FROM weather_data
             ORDER BY obs_time_local DESC
             LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
