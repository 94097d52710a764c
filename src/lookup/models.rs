//! Lookup data models

use crate::config::ValidationPolicy;
use crate::lookup::parser::AddressParser;
use std::fmt;

/// Sentinel rendered for fields a source did not supply
pub const NOT_AVAILABLE: &str = "N/A";

/// A syntactically valid IPv4 address as typed by the user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Validate a single token under the given policy
    pub fn parse(token: &str, policy: ValidationPolicy) -> Option<Self> {
        AddressParser::is_valid(token, policy).then(|| Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether an address answers as a working relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyStatus {
    Active,
    Dead,
}

impl From<bool> for ProxyStatus {
    fn from(active: bool) -> Self {
        if active {
            ProxyStatus::Active
        } else {
            ProxyStatus::Dead
        }
    }
}

impl fmt::Display for ProxyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyStatus::Active => write!(f, "ACTIVE"),
            ProxyStatus::Dead => write!(f, "DEAD"),
        }
    }
}

/// Normalized information about one address, whichever source produced it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnrichmentRecord {
    pub ip: Option<String>,
    pub origin_ip: Option<String>,
    pub isp: Option<String>,
    pub country: Option<String>,
    /// ISO 3166-1 alpha-2 country code
    pub country_code: Option<String>,
    pub city: Option<String>,
    pub proxy_status: Option<String>,
}

impl EnrichmentRecord {
    /// Record carrying only a proxy status
    pub fn with_proxy_status(status: ProxyStatus) -> Self {
        Self {
            proxy_status: Some(status.to_string()),
            ..Default::default()
        }
    }

    /// Copy every field present in `other` over this record
    pub fn overlay(&mut self, other: &EnrichmentRecord) {
        fn take(dst: &mut Option<String>, src: &Option<String>) {
            if src.is_some() {
                dst.clone_from(src);
            }
        }

        take(&mut self.ip, &other.ip);
        take(&mut self.origin_ip, &other.origin_ip);
        take(&mut self.isp, &other.isp);
        take(&mut self.country, &other.country);
        take(&mut self.country_code, &other.country_code);
        take(&mut self.city, &other.city);
        take(&mut self.proxy_status, &other.proxy_status);
    }

    /// Country name with its code, e.g. `Australia (AU)`
    pub fn country_display(&self) -> Option<String> {
        match (&self.country, &self.country_code) {
            (Some(name), Some(code)) => Some(format!("{} ({})", name, code)),
            (Some(name), None) => Some(name.clone()),
            (None, Some(code)) => Some(code.clone()),
            (None, None) => None,
        }
    }
}

/// Result of one lookup against one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Success(EnrichmentRecord),
    Failure(String),
}

impl LookupOutcome {
    pub fn success(record: EnrichmentRecord) -> Self {
        LookupOutcome::Success(record)
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        LookupOutcome::Failure(reason.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LookupOutcome::Success(_))
    }
}

/// All outcomes gathered for one address of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedEntry {
    pub address: Address,
    /// Outcome from the primary information source
    pub primary: LookupOutcome,
    /// Outcomes from supplementary sources, in client order
    pub supplements: Vec<LookupOutcome>,
}

impl EnrichedEntry {
    pub fn new(address: Address, primary: LookupOutcome, supplements: Vec<LookupOutcome>) -> Self {
        Self {
            address,
            primary,
            supplements,
        }
    }

    /// The outcome to display: the primary record with successful
    /// supplementary records laid over it, or the primary failure.
    pub fn merged(&self) -> LookupOutcome {
        match &self.primary {
            LookupOutcome::Success(record) => {
                let mut record = record.clone();
                for supplement in &self.supplements {
                    if let LookupOutcome::Success(extra) = supplement {
                        record.overlay(extra);
                    }
                }
                LookupOutcome::Success(record)
            }
            LookupOutcome::Failure(reason) => LookupOutcome::Failure(reason.clone()),
        }
    }
}
