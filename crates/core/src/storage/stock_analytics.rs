use crate::config::Settings;
use crate::domain::analytics::AnalyticsRecord;
use crate::storage::{WarehouseConnector, WarehouseSession};
use anyhow::Context;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::{Acquire, Postgres, Transaction};

pub const TABLE: &str = "STOCK_ANALYTICS";

// Raw-data namespace used when `snowflake_schema` is unset.
const DEFAULT_SCHEMA: &str = "raw";

pub(crate) const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS STOCK_ANALYTICS (
        symbol TEXT,
        price DOUBLE PRECISION,
        target_high DOUBLE PRECISION,
        target_low DOUBLE PRECISION,
        target_mean DOUBLE PRECISION,
        recommendation TEXT,
        analyst_count BIGINT,
        fetched_at TIMESTAMPTZ
    )
";

pub(crate) const INSERT_RECORD: &str = "
    INSERT INTO STOCK_ANALYTICS (
        symbol, price, target_high, target_low,
        target_mean, recommendation, analyst_count, fetched_at
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
";

/// Warehouse connection parameters taken from the `snowflake_*` settings.
///
/// Nothing is validated until [`WarehouseConnector::connect`] runs, so an empty
/// batch never trips over missing credentials.
#[derive(Debug, Clone)]
pub struct PgWarehouse {
    settings: Settings,
}

impl PgWarehouse {
    pub fn new(settings: &Settings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }

    pub fn schema(&self) -> &str {
        self.settings
            .snowflake_schema
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SCHEMA)
    }

    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        let account = self.settings.require_snowflake_account()?;
        let user = self.settings.require_snowflake_username()?;

        let (host, port) = split_host_port(account)?;
        let mut opts = PgConnectOptions::new().host(host).username(user);
        if let Some(port) = port {
            opts = opts.port(port);
        }
        if let Some(password) = self.settings.snowflake_password.as_deref() {
            opts = opts.password(password);
        }
        if let Some(database) = self.settings.snowflake_database.as_deref() {
            opts = opts.database(database);
        }
        if let Some(warehouse) = self.settings.snowflake_warehouse.as_deref() {
            opts = opts.application_name(warehouse);
        }

        Ok(opts.options([("search_path", self.schema())]))
    }
}

fn split_host_port(account: &str) -> anyhow::Result<(&str, Option<u16>)> {
    let account = account.trim();
    anyhow::ensure!(!account.is_empty(), "snowflake_account must be non-empty");

    match account.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => {
            let port = port
                .parse::<u16>()
                .with_context(|| format!("invalid port in snowflake_account: {account}"))?;
            Ok((host, Some(port)))
        }
        _ => Ok((account, None)),
    }
}

#[async_trait::async_trait]
impl WarehouseConnector for PgWarehouse {
    type Session = PgSession;

    fn target(&self) -> String {
        format!("{}.{TABLE}", self.schema())
    }

    async fn connect(&self) -> anyhow::Result<PgSession> {
        let options = self.connect_options()?;

        // One exclusive connection, owned by this load only.
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("connect warehouse failed")?;

        let tx = pool.begin().await.context("begin transaction failed")?;
        tracing::debug!(schema = self.schema(), "warehouse session opened");

        Ok(PgSession { pool, tx })
    }
}

pub struct PgSession {
    pool: PgPool,
    tx: Transaction<'static, Postgres>,
}

#[async_trait::async_trait]
impl WarehouseSession for PgSession {
    async fn ensure_table(&mut self) -> anyhow::Result<()> {
        sqlx::query(CREATE_TABLE)
            .persistent(false)
            .execute(&mut *self.tx)
            .await
            .context("create STOCK_ANALYTICS failed")?;
        Ok(())
    }

    async fn insert_record(&mut self, record: &AnalyticsRecord) -> anyhow::Result<()> {
        // Savepoint per row: a failed insert must not abort the outer transaction.
        let mut row = self
            .tx
            .begin()
            .await
            .context("begin row savepoint failed")?;

        let res = sqlx::query(INSERT_RECORD)
            .persistent(false)
            .bind(&record.symbol)
            .bind(record.price)
            .bind(record.target_high)
            .bind(record.target_low)
            .bind(record.target_mean)
            .bind(&record.recommendation)
            .bind(record.analyst_count)
            .bind(record.fetched_at)
            .execute(&mut *row)
            .await;

        match res {
            Ok(_) => {
                row.commit().await.context("release row savepoint failed")?;
                Ok(())
            }
            Err(err) => {
                row.rollback()
                    .await
                    .context("rollback row savepoint failed")?;
                Err(err).context("insert STOCK_ANALYTICS failed")
            }
        }
    }

    async fn commit(self) -> anyhow::Result<()> {
        self.tx.commit().await.context("commit transaction failed")?;
        self.pool.close().await;
        Ok(())
    }
}
