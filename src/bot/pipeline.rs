//! Parse, batch, enrich and deliver one incoming message

use crate::config::PipelineConfig;
use crate::delivery::DeliveryChannel;
use crate::lookup::{chunk, Address, AddressParser, BatchEnricher, ReportFormatter};
use crate::Result;
use anyhow::ensure;
use tracing::{error, info};

/// Reply sent when a message contains no usable address
pub const NO_VALID_INPUT: &str = "No valid IP addresses found.";

/// Counters describing one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Valid addresses found in the input
    pub addresses: usize,
    /// Batches processed
    pub batches: usize,
    /// Batches whose report reached the channel
    pub delivered: usize,
    /// Batches whose report could not be delivered
    pub failed_deliveries: usize,
}

impl PipelineSummary {
    pub fn is_empty_input(&self) -> bool {
        self.addresses == 0
    }
}

/// Batch enrichment pipeline
#[derive(Clone)]
pub struct Pipeline {
    parser: AddressParser,
    batch_size: usize,
    enricher: BatchEnricher,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig, enricher: BatchEnricher) -> Result<Self> {
        ensure!(
            config.max_batch_size > 0,
            "max batch size must be positive, got {}",
            config.max_batch_size
        );

        Ok(Self {
            parser: AddressParser::new(config.validation),
            batch_size: config.max_batch_size,
            enricher,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of lookup sources queried per address
    pub fn variant_count(&self) -> usize {
        self.enricher.variant_count()
    }

    /// Extract the addresses a message asks about
    pub fn parse(&self, text: &str) -> Vec<Address> {
        self.parser.parse(text)
    }

    /// Parse `text` and deliver reports for every address it contains
    pub async fn run(&self, text: &str, channel: &dyn DeliveryChannel) -> PipelineSummary {
        let addresses = self.parse(text);
        self.deliver(&addresses, channel).await
    }

    /// Look up `addresses` batch by batch, reporting each batch through
    /// a placeholder that is replaced once the whole batch has resolved.
    ///
    /// Batches run strictly one after another. Delivery failures are logged
    /// and never stop the remaining batches.
    pub async fn deliver(
        &self,
        addresses: &[Address],
        channel: &dyn DeliveryChannel,
    ) -> PipelineSummary {
        let mut summary = PipelineSummary {
            addresses: addresses.len(),
            ..Default::default()
        };

        if addresses.is_empty() {
            if let Err(e) = channel.send_text(NO_VALID_INPUT).await {
                error!(error = %e, "failed to send no-input reply");
            }
            return summary;
        }

        let formatter = ReportFormatter::new(channel.report_style());
        let batches = chunk(addresses, self.batch_size);
        info!(
            addresses = addresses.len(),
            batches = batches.len(),
            "processing lookup request"
        );

        for (index, batch) in batches.iter().enumerate() {
            summary.batches += 1;

            let placeholder = match channel.post_placeholder().await {
                Ok(id) => Some(id),
                Err(e) => {
                    error!(batch = index, error = %e, "failed to post placeholder");
                    None
                }
            };

            let entries = self.enricher.resolve_all(batch).await;
            let report = formatter.render(&entries);

            let delivered = match placeholder {
                Some(id) => channel.replace(id, &report).await,
                None => channel.send(&report).await.map(|_| ()),
            };

            match delivered {
                Ok(()) => summary.delivered += 1,
                Err(e) => {
                    error!(batch = index, error = %e, "failed to update message");
                    summary.failed_deliveries += 1;
                }
            }
        }

        summary
    }
}
