//! Concurrent enrichment of one batch of addresses

use crate::config::LookupConfig;
use crate::lookup::client::{build_http_client, EnrichmentClient, PrimaryInfoClient, ProxyStatusClient};
use crate::lookup::models::{Address, EnrichedEntry};
use crate::Result;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Fans a batch out to every configured client and joins the results
#[derive(Clone)]
pub struct BatchEnricher {
    primary: Arc<dyn EnrichmentClient>,
    supplements: Vec<Arc<dyn EnrichmentClient>>,
}

impl BatchEnricher {
    pub fn new(primary: Arc<dyn EnrichmentClient>) -> Self {
        Self {
            primary,
            supplements: Vec::new(),
        }
    }

    /// Add a client whose successful records are laid over the primary one
    pub fn with_supplement(mut self, client: Arc<dyn EnrichmentClient>) -> Self {
        self.supplements.push(client);
        self
    }

    /// Build the information client and, if configured, the proxy check client
    pub fn from_config(config: &LookupConfig) -> Result<Self> {
        let http = build_http_client(config)?;
        let mut enricher = Self::new(Arc::new(PrimaryInfoClient::new(http.clone(), config)));

        if let Some(url) = &config.proxy_check_url {
            enricher = enricher.with_supplement(Arc::new(ProxyStatusClient::new(
                http,
                url.clone(),
                config,
            )));
        }

        Ok(enricher)
    }

    /// Number of clients queried per address
    pub fn variant_count(&self) -> usize {
        1 + self.supplements.len()
    }

    /// Resolve every address of the batch
    ///
    /// All lookups run concurrently and every one of them is awaited. The
    /// result holds exactly one entry per input address, in input order.
    pub async fn resolve_all(&self, batch: &[Address]) -> Vec<EnrichedEntry> {
        let start = Instant::now();
        let width = batch.len().max(1);

        let lookups: Vec<_> = batch.iter().map(|address| self.resolve_one(address)).collect();
        let entries = stream::iter(lookups)
            .buffered(width)
            .collect::<Vec<_>>()
            .await;

        debug!(
            addresses = batch.len(),
            variants = self.variant_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "batch resolved"
        );

        entries
    }

    async fn resolve_one(&self, address: &Address) -> EnrichedEntry {
        let primary = self.primary.resolve(address);
        let supplements = join_all(self.supplements.iter().map(|c| c.resolve(address)));
        let (primary, supplements) = futures::join!(primary, supplements);

        EnrichedEntry::new(address.clone(), primary, supplements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationPolicy;
    use crate::lookup::models::{EnrichmentRecord, LookupOutcome, ProxyStatus};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Fails for the listed addresses, sleeps longer for earlier ones
    struct StubClient {
        failing: Vec<&'static str>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl StubClient {
        fn new(failing: Vec<&'static str>) -> Self {
            Self {
                failing,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EnrichmentClient for StubClient {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn resolve(&self, ip: &Address) -> LookupOutcome {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let last_octet: u64 = ip.as_str().rsplit('.').next().unwrap().parse().unwrap();
            tokio::time::sleep(Duration::from_millis(50 - last_octet.min(50))).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.failing.contains(&ip.as_str()) {
                LookupOutcome::failure("Failed to fetch IP information")
            } else {
                LookupOutcome::success(EnrichmentRecord {
                    ip: Some(ip.to_string()),
                    ..Default::default()
                })
            }
        }
    }

    struct ActiveProxy;

    #[async_trait]
    impl EnrichmentClient for ActiveProxy {
        fn name(&self) -> &'static str {
            "active"
        }

        async fn resolve(&self, _ip: &Address) -> LookupOutcome {
            LookupOutcome::success(EnrichmentRecord::with_proxy_status(ProxyStatus::Active))
        }
    }

    fn batch(ips: &[&str]) -> Vec<Address> {
        ips.iter()
            .map(|ip| Address::parse(ip, ValidationPolicy::Permissive).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_resolve_all_keeps_order_and_count() {
        let stub = Arc::new(StubClient::new(vec!["10.0.0.2"]));
        let enricher = BatchEnricher::new(stub.clone());
        let input = batch(&["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4"]);

        let entries = enricher.resolve_all(&input).await;

        assert_eq!(entries.len(), input.len());
        for (entry, address) in entries.iter().zip(&input) {
            assert_eq!(&entry.address, address);
        }
        assert!(entries[0].primary.is_success());
        assert!(!entries[1].primary.is_success());
        assert!(entries[2].primary.is_success());
        assert!(entries[3].primary.is_success());
    }

    #[tokio::test]
    async fn test_resolve_all_runs_concurrently() {
        let stub = Arc::new(StubClient::new(vec![]));
        let enricher = BatchEnricher::new(stub.clone());
        let input = batch(&["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4", "10.0.0.5"]);

        enricher.resolve_all(&input).await;

        assert_eq!(stub.peak.load(Ordering::SeqCst), input.len());
    }

    #[tokio::test]
    async fn test_resolve_all_collects_supplements() {
        let enricher = BatchEnricher::new(Arc::new(StubClient::new(vec![])))
            .with_supplement(Arc::new(ActiveProxy));
        assert_eq!(enricher.variant_count(), 2);

        let entries = enricher.resolve_all(&batch(&["1.1.1.1"])).await;

        assert_eq!(entries[0].supplements.len(), 1);
        match entries[0].merged() {
            LookupOutcome::Success(record) => {
                assert_eq!(record.ip.as_deref(), Some("1.1.1.1"));
                assert_eq!(record.proxy_status.as_deref(), Some("ACTIVE"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_all_empty_batch() {
        let enricher = BatchEnricher::new(Arc::new(StubClient::new(vec![])));
        assert!(enricher.resolve_all(&[]).await.is_empty());
    }
}
