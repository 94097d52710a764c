//! Configuration for lookups, the batch pipeline and the Telegram bot

use std::time::Duration;

/// Default timeout for each outbound lookup in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default maximum number of addresses looked up concurrently
pub const DEFAULT_MAX_BATCH_SIZE: usize = 10;

/// Default IP information endpoint
const DEFAULT_INFO_URL: &str = "http://api.xsmnet.buzz/api";

/// Default key for the IP information endpoint
const DEFAULT_INFO_KEY: &str = "xsm";

/// Default host the proxy check connects through the candidate to
const DEFAULT_PROXY_TARGET_HOST: &str = "speed.cloudflare.com";

const DEFAULT_PROXY_TARGET_PORT: u16 = 443;

const DEFAULT_USER_AGENT: &str = concat!("ipcheck-bot/", env!("CARGO_PKG_VERSION"));

const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Long-poll timeout passed to `getUpdates`, in seconds
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// How strictly candidate tokens are checked before being looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationPolicy {
    /// Four dot-separated groups of one to three digits, any magnitude
    #[default]
    Permissive,
    /// Like `Permissive`, and every octet must be at most 255
    Strict,
}

/// Configuration for the enrichment clients
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Base URL of the IP information service
    pub info_url: String,
    /// API key sent as the `key` query parameter
    pub info_key: String,
    /// Base URL of the proxy check service; the proxy lookup is disabled when unset
    pub proxy_check_url: Option<String>,
    /// Host the proxy check should reach through the candidate address
    pub proxy_target_host: String,
    /// Port on the target host
    pub proxy_target_port: u16,
    /// Whether the proxy check should use TLS towards the target
    pub proxy_target_tls: bool,
    /// Timeout for each outbound request
    pub timeout: Duration,
    /// User agent for outbound requests
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            info_url: DEFAULT_INFO_URL.to_string(),
            info_key: DEFAULT_INFO_KEY.to_string(),
            proxy_check_url: None,
            proxy_target_host: DEFAULT_PROXY_TARGET_HOST.to_string(),
            proxy_target_port: DEFAULT_PROXY_TARGET_PORT,
            proxy_target_tls: true,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl LookupConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_info_url(mut self, url: String) -> Self {
        self.info_url = url;
        self
    }

    pub fn with_info_key(mut self, key: String) -> Self {
        self.info_key = key;
        self
    }

    pub fn with_proxy_check_url(mut self, url: String) -> Self {
        self.proxy_check_url = Some(url);
        self
    }

    pub fn with_proxy_target(mut self, host: String, port: u16, tls: bool) -> Self {
        self.proxy_target_host = host;
        self.proxy_target_port = port;
        self.proxy_target_tls = tls;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Configuration for the parse/batch/deliver pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum number of addresses per batch
    pub max_batch_size: usize,
    /// Address validation policy
    pub validation: ValidationPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            validation: ValidationPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    pub fn with_validation(mut self, validation: ValidationPolicy) -> Self {
        self.validation = validation;
        self
    }
}

/// Configuration for the Telegram bot
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Bot token issued by BotFather
    pub token: String,
    /// Chat that receives access notifications
    pub owner_id: Option<i64>,
    /// Telegram Bot API base URL
    pub api_url: String,
    /// Long-poll timeout for `getUpdates`
    pub poll_timeout: Duration,
}

impl BotConfig {
    pub fn new(token: String) -> Self {
        Self {
            token,
            owner_id: None,
            api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
            poll_timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
        }
    }

    pub fn with_owner_id(mut self, owner_id: i64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn with_api_url(mut self, url: String) -> Self {
        self.api_url = url;
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }
}
