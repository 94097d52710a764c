//! IP Check Bot - batch IP information and proxy status lookups
//!
//! Accepts free-form text containing IPv4 addresses, looks each address up
//! against external IP-information services in bounded batches and delivers a
//! tabular report back over a chat channel.

pub mod bot;
pub mod config;
pub mod delivery;
pub mod error;
pub mod lookup;

pub use config::{BotConfig, LookupConfig, PipelineConfig, ValidationPolicy};
pub use error::{DeliveryError, LookupError};
pub use lookup::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
