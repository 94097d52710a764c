use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use ipcheck_bot::{
    bot::{Bot, Pipeline},
    delivery::ConsoleChannel,
    BatchEnricher, BotConfig, LookupConfig, PipelineConfig, ValidationPolicy,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A Telegram bot that checks IP information and proxy status
#[derive(Parser)]
#[command(name = "ipcheck-bot")]
#[command(about = "A Telegram bot that checks IP information and proxy status")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    lookup: LookupArgs,

    #[command(flatten)]
    bot: BotArgs,

    /// Print debug logs
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Args)]
struct LookupArgs {
    /// IP information endpoint
    #[arg(long, env = "IP_INFO_URL", global = true)]
    info_url: Option<String>,

    /// IP information API key
    #[arg(long, env = "IP_INFO_KEY", global = true)]
    info_key: Option<String>,

    /// Proxy check endpoint; proxy checks are skipped when unset
    #[arg(long, env = "PROXY_CHECK_URL", global = true)]
    proxy_check_url: Option<String>,

    /// Host the proxy check connects to through each address
    #[arg(long, env = "PROXY_TARGET_HOST", default_value = "speed.cloudflare.com", global = true)]
    proxy_target_host: String,

    /// Port on the proxy check target host
    #[arg(long, env = "PROXY_TARGET_PORT", default_value = "443", global = true)]
    proxy_target_port: u16,

    /// Whether the proxy check uses TLS towards the target
    #[arg(long, env = "PROXY_TARGET_TLS", default_value = "true", action = clap::ArgAction::Set, global = true)]
    proxy_target_tls: bool,

    /// Maximum number of addresses looked up concurrently
    #[arg(short = 'n', long, env = "MAX_BATCH_SIZE", default_value = "10", global = true)]
    max_batch_size: usize,

    /// Timeout in seconds for each lookup
    #[arg(long, env = "LOOKUP_TIMEOUT_SECS", default_value = "10", global = true)]
    timeout: u64,

    /// Reject addresses with octets above 255
    #[arg(long, env = "STRICT_IPV4", global = true)]
    strict_ipv4: bool,
}

#[derive(Args)]
struct BotArgs {
    /// Bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Chat ID that receives access notifications
    #[arg(long, env = "OWNER_ID", global = true)]
    owner_id: Option<i64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Telegram bot (default)
    Run,
    /// Check addresses once and print the report
    Check {
        /// Addresses, separated by spaces or commas
        inputs: Vec<String>,
        /// File containing addresses
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

impl LookupArgs {
    fn lookup_config(&self) -> LookupConfig {
        let mut config = LookupConfig::new()
            .with_proxy_target(
                self.proxy_target_host.clone(),
                self.proxy_target_port,
                self.proxy_target_tls,
            )
            .with_timeout(Duration::from_secs(self.timeout));

        if let Some(url) = &self.info_url {
            config = config.with_info_url(url.clone());
        }
        if let Some(key) = &self.info_key {
            config = config.with_info_key(key.clone());
        }
        if let Some(url) = &self.proxy_check_url {
            config = config.with_proxy_check_url(url.clone());
        }
        config
    }

    fn pipeline_config(&self) -> PipelineConfig {
        let validation = if self.strict_ipv4 {
            ValidationPolicy::Strict
        } else {
            ValidationPolicy::Permissive
        };

        PipelineConfig::new()
            .with_max_batch_size(self.max_batch_size)
            .with_validation(validation)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let enricher = BatchEnricher::from_config(&cli.lookup.lookup_config())?;
    let pipeline = Pipeline::new(&cli.lookup.pipeline_config(), enricher)?;

    match cli.command {
        Some(Commands::Run) | None => run_bot(pipeline, cli.bot.token, cli.bot.owner_id).await?,
        Some(Commands::Check { inputs, file }) => {
            let mut text = inputs.join(" ");
            if let Some(path) = file {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {:?}", path))?;
                text.push('\n');
                text.push_str(&content);
            }

            let channel = ConsoleChannel::new();
            let summary = pipeline.run(&text, &channel).await;
            if summary.failed_deliveries > 0 {
                return Err(anyhow!(
                    "{} of {} batches could not be printed",
                    summary.failed_deliveries,
                    summary.batches
                ));
            }
        }
    }

    Ok(())
}

async fn run_bot(pipeline: Pipeline, token: Option<String>, owner_id: Option<i64>) -> Result<()> {
    let token = token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| anyhow!("TELEGRAM_BOT_TOKEN is not set"))?;

    let mut config = BotConfig::new(token);
    if let Some(owner_id) = owner_id {
        config = config.with_owner_id(owner_id);
    }

    Bot::new(&config, pipeline)?.run().await
}
