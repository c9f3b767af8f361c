// Runs against a scratch Postgres described by the usual `snowflake_*` variables:
//
//   snowflake_account=localhost:5432 snowflake_username=postgres snowflake_password=... \
//   snowflake_database=postgres snowflake_schema=public \
//   cargo test -p stockfeed_core --test warehouse_pg -- --ignored
//
// `CREATE TABLE IF NOT EXISTS` idempotence against a real server is only checked here;
// the default test run covers the same load sequence through the in-memory session in
// `storage::tests`.

use chrono::Utc;
use sqlx::Connection;
use stockfeed_core::config::Settings;
use stockfeed_core::domain::analytics::AnalyticsRecord;
use stockfeed_core::storage::{load_batch, PgWarehouse, WarehouseConnector, WarehouseSession};

fn record(symbol: &str, recommendation: &str) -> AnalyticsRecord {
    AnalyticsRecord {
        symbol: symbol.to_string(),
        price: Some(250.5),
        target_high: Some(300.0),
        target_low: None,
        target_mean: Some(275.25),
        recommendation: Some(recommendation.to_string()),
        analyst_count: Some(12),
        fetched_at: Utc::now(),
    }
}

async fn count_rows(wh: &PgWarehouse, symbol: &str) -> i64 {
    let mut conn = sqlx::PgConnection::connect_with(&wh.connect_options().unwrap())
        .await
        .unwrap();
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM STOCK_ANALYTICS WHERE symbol = $1")
        .bind(symbol)
        .fetch_one(&mut conn)
        .await
        .unwrap();
    n
}

#[tokio::test]
#[ignore = "requires a Postgres warehouse"]
async fn ensure_table_twice_is_a_no_op() {
    let wh = PgWarehouse::new(&Settings::from_env().unwrap());

    let mut session = wh.connect().await.unwrap();
    session.ensure_table().await.unwrap();
    session.ensure_table().await.unwrap();
    session.commit().await.unwrap();

    let mut session = wh.connect().await.unwrap();
    session.ensure_table().await.unwrap();
    session.commit().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a Postgres warehouse"]
async fn invalid_row_is_rolled_back_alone() {
    let wh = PgWarehouse::new(&Settings::from_env().unwrap());
    let symbol = format!("T{}", Utc::now().timestamp_micros());

    // Create the table up front so the NUL-byte row below fails at insert time only.
    let mut session = wh.connect().await.unwrap();
    session.ensure_table().await.unwrap();
    session.commit().await.unwrap();

    let batch = [
        record(&symbol, "buy"),
        // Postgres rejects NUL bytes in TEXT.
        record(&symbol, "bad\0value"),
        record(&symbol, "hold"),
    ];

    let summary = load_batch(&wh, &batch).await.unwrap();
    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.failed, 1);

    assert_eq!(count_rows(&wh, &symbol).await, 2);
}
