pub mod error;
pub mod provider;
pub mod types;

use crate::domain::analytics::{AnalyticsRecord, Symbol};
use provider::AnalyticsProvider;

/// Fetches every symbol in order and keeps the successes.
///
/// A failed symbol is logged and skipped; it never aborts the run.
pub async fn collect_batch<P>(
    provider: &P,
    symbols: &[Symbol],
    api_key: Option<&str>,
) -> Vec<AnalyticsRecord>
where
    P: AnalyticsProvider + ?Sized,
{
    let total = symbols.len();
    let mut records = Vec::with_capacity(total);
    let mut failures: usize = 0;

    for (idx, symbol) in symbols.iter().enumerate() {
        match provider.fetch_analytics(symbol, api_key).await {
            Ok(record) => {
                tracing::info!(%symbol, processed = idx + 1, total, "fetched analytics");
                records.push(record);
            }
            Err(err) if err.is_shape_mismatch() => {
                failures += 1;
                tracing::debug!(%symbol, reason = %err, "no analytics object; skipping symbol");
            }
            Err(err) => {
                failures += 1;
                tracing::warn!(
                    %symbol,
                    processed = idx + 1,
                    total,
                    error = %err,
                    "analytics fetch failed; skipping symbol"
                );
            }
        }
    }

    tracing::info!(
        provider = provider.provider_name(),
        fetched = records.len(),
        failures,
        total,
        "analytics fetch complete"
    );

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::error::FetchError;
    use crate::ingest::provider::parse_analytics_body;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned bodies per lower-case symbol; unknown symbols fail like an API error.
    struct CannedProvider {
        bodies: HashMap<&'static str, &'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl CannedProvider {
        fn new(bodies: &[(&'static str, &'static str)]) -> Self {
            Self {
                bodies: bodies.iter().copied().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl AnalyticsProvider for CannedProvider {
        fn provider_name(&self) -> &'static str {
            "canned"
        }

        async fn fetch_analytics(
            &self,
            symbol: &Symbol,
            api_key: Option<&str>,
        ) -> Result<AnalyticsRecord, FetchError> {
            self.calls.lock().unwrap().push(symbol.path_segment());
            api_key.ok_or(FetchError::MissingApiKey)?;

            match self.bodies.get(symbol.path_segment().as_str()) {
                Some(body) => parse_analytics_body(symbol, body.as_bytes(), Utc::now()),
                None => Err(FetchError::Status {
                    status: reqwest::StatusCode::TOO_MANY_REQUESTS,
                    body: r#"{"message":"quota exceeded"}"#.to_string(),
                }),
            }
        }
    }

    fn symbols(list: &[&str]) -> Vec<Symbol> {
        list.iter().map(|s| Symbol::parse(s).unwrap()).collect()
    }

    #[tokio::test]
    async fn failed_symbol_is_skipped_and_batch_keeps_the_rest() {
        let provider = CannedProvider::new(&[(
            "tsla",
            r#"{"currentPrice": {"raw": 250.5}, "recommendationKey": "buy", "numberOfAnalystOpinions": {"raw": 12}}"#,
        )]);

        let batch = collect_batch(&provider, &symbols(&["tsla", "aapl"]), Some("key")).await;

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].symbol, "TSLA");
        assert_eq!(batch[0].price, Some(250.5));
        assert_eq!(*provider.calls.lock().unwrap(), ["tsla", "aapl"]);
    }

    #[tokio::test]
    async fn array_and_malformed_payloads_produce_no_record() {
        let provider = CannedProvider::new(&[
            ("tsla", "[]"),
            ("aapl", "not json"),
            ("msft", r#"{"recommendationKey": "hold"}"#),
            ("nvda", r#"{"currentPrice": {"raw": 900.0}}"#),
        ]);

        let batch = collect_batch(
            &provider,
            &symbols(&["tsla", "aapl", "msft", "nvda"]),
            Some("key"),
        )
        .await;

        let got: Vec<&str> = batch.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(got, ["MSFT", "NVDA"]);
        assert_eq!(batch[0].recommendation.as_deref(), Some("hold"));
        assert_eq!(batch[0].price, None);
    }

    #[tokio::test]
    async fn missing_api_key_skips_every_symbol_without_aborting() {
        let provider = CannedProvider::new(&[("tsla", r#"{"currentPrice": {"raw": 1.0}}"#)]);

        let batch = collect_batch(&provider, &symbols(&["tsla", "aapl"]), None).await;

        assert!(batch.is_empty());
        assert_eq!(provider.calls.lock().unwrap().len(), 2);
    }
}
