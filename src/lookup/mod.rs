//! Lookup module for enriching IPv4 addresses
//!
//! This module provides functionality for:
//! - Extracting IPv4 addresses from free-form text
//! - Splitting address lists into fixed-size batches
//! - Querying IP information and proxy check services concurrently
//! - Rendering the results as a fixed-column report

pub mod batcher;
pub mod client;
pub mod enricher;
pub mod models;
pub mod parser;
pub mod report;

pub use batcher::{chunk, Batch};
pub use client::{EnrichmentClient, PrimaryInfoClient, ProxyStatusClient};
pub use enricher::BatchEnricher;
pub use models::{Address, EnrichedEntry, EnrichmentRecord, LookupOutcome, ProxyStatus};
pub use parser::AddressParser;
pub use report::{ReportFormatter, ReportStyle};
