pub mod stock_analytics;

use crate::domain::analytics::AnalyticsRecord;

pub use stock_analytics::{PgSession, PgWarehouse};

/// Opens one exclusive warehouse session per load.
#[async_trait::async_trait]
pub trait WarehouseConnector: Send + Sync {
    type Session: WarehouseSession;

    /// Fully qualified target table, for status lines.
    fn target(&self) -> String;

    async fn connect(&self) -> anyhow::Result<Self::Session>;
}

#[async_trait::async_trait]
pub trait WarehouseSession: Send {
    async fn ensure_table(&mut self) -> anyhow::Result<()>;

    /// Inserts one row. A failure here leaves the session usable for the next row.
    async fn insert_record(&mut self, record: &AnalyticsRecord) -> anyhow::Result<()>;

    /// Commits everything inserted so far and closes the connection.
    async fn commit(self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub attempted: usize,
    pub inserted: usize,
    pub failed: usize,
}

pub async fn load_batch<C>(connector: &C, records: &[AnalyticsRecord]) -> anyhow::Result<LoadSummary>
where
    C: WarehouseConnector + ?Sized,
{
    if records.is_empty() {
        tracing::warn!("no analytics data to load");
        return Ok(LoadSummary::default());
    }

    let mut session = connector.connect().await?;
    session.ensure_table().await?;

    let mut summary = LoadSummary {
        attempted: records.len(),
        ..Default::default()
    };

    for record in records {
        match session.insert_record(record).await {
            Ok(()) => summary.inserted += 1,
            Err(err) => {
                summary.failed += 1;
                tracing::error!(symbol = %record.symbol, error = %format!("{err:#}"), "insert failed; skipping row");
            }
        }
    }

    session.commit().await?;

    tracing::info!(
        attempted = summary.attempted,
        inserted = summary.inserted,
        failed = summary.failed,
        "Inserted {} records into {}",
        summary.attempted,
        connector.target()
    );

    Ok(summary)
}
