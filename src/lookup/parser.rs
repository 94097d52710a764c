//! Address parser for extracting IPv4 addresses from free-form text

use crate::config::ValidationPolicy;
use crate::lookup::models::Address;
use once_cell::sync::Lazy;
use regex::Regex;

/// Four dot-separated groups of one to three ASCII digits
static IPV4_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}$").expect("Invalid IPv4 regex")
});

/// Token separators: any run of whitespace (including newlines) or commas
static SEPARATOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s,]+").expect("Invalid separator regex"));

/// Parser for user-submitted address lists
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressParser {
    policy: ValidationPolicy,
}

impl AddressParser {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    /// Extract every valid address from `text`
    ///
    /// Invalid tokens are dropped. Input order and duplicates are kept.
    /// An empty result means the user sent nothing usable.
    pub fn parse(&self, text: &str) -> Vec<Address> {
        SEPARATOR_REGEX
            .split(text)
            .filter(|token| !token.is_empty())
            .filter_map(|token| Address::parse(token, self.policy))
            .collect()
    }

    /// Purely syntactic IPv4 check; octet magnitude is not enforced
    pub fn is_valid_ipv4_syntax(token: &str) -> bool {
        IPV4_REGEX.is_match(token)
    }

    /// Check a token under the given policy
    pub fn is_valid(token: &str, policy: ValidationPolicy) -> bool {
        if !Self::is_valid_ipv4_syntax(token) {
            return false;
        }

        match policy {
            ValidationPolicy::Permissive => true,
            ValidationPolicy::Strict => token
                .split('.')
                .all(|octet| octet.parse::<u16>().map_or(false, |n| n <= 255)),
        }
    }
}
