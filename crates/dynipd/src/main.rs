// # dynipd - Dynamic DNS Daemon
//
// Thin integration layer: reads configuration, wires up the registry,
// provider, sources and engine, and runs the update loop. All DDNS logic
// lives in dynip-core.
//
// ## Configuration
//
// Value-carrying flags have environment fallbacks so the daemon runs
// unchanged in containers:
//
// - `--provider` / `PROVIDER`: DNS provider (arvan)
// - `--key` / `API_KEY`: API key for the provider
// - `--domain` / `DOMAIN`: zone the records belong to
// - `--records` / `RECORDS`: comma-separated record names
// - `-4` / `-6` / `--dual-stack`: address families (mutually exclusive)
// - `--sources` / `SOURCES`: IP sources to use, or "all"
// - `--exclude-sources` / `EXCLUDE_SOURCES`: IP sources to skip
// - `--source-timeout` / `SOURCE_TIMEOUT`: per-source timeout in seconds
// - `--interval` / `INTERVAL`: seconds between checks
// - `--timeout` / `TIMEOUT`: overall request timeout in seconds
// - `--validate-only`: validate configuration and exit
// - `--list-sources`: list available IP sources and exit
//
// ## Example
//
// ```bash
// dynipd --provider arvan --key "$API_KEY" \
//        --domain example.com --records www,home --dual-stack
// ```

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

use dynip_core::config::{DynipConfig, FamilyMode, ProviderConfig, SourceFilter};
use dynip_core::{ProviderRegistry, UpdateEngine};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Dynamic DNS client with multi-source public-IP detection
#[derive(Debug, Parser)]
#[command(name = "dynipd", version, about)]
struct Cli {
    /// DNS provider
    #[arg(long, env = "PROVIDER", default_value = "arvan")]
    provider: String,

    /// API key for the DNS provider
    #[arg(long = "key", env = "API_KEY")]
    key: Option<String>,

    /// Domain name
    #[arg(long, env = "DOMAIN")]
    domain: Option<String>,

    /// Comma-separated list of record names (subdomains)
    #[arg(long, env = "RECORDS")]
    records: Option<String>,

    /// Use IPv4 only
    #[arg(short = '4', long = "ipv4", group = "family")]
    ipv4: bool,

    /// Use IPv6 only
    #[arg(short = '6', long = "ipv6", group = "family")]
    ipv6: bool,

    /// Use both IPv4 and IPv6 (dual-stack)
    #[arg(long = "dual-stack", group = "family")]
    dual_stack: bool,

    /// Comma-separated list of IP sources to use, or "all"
    #[arg(long, env = "SOURCES", default_value = "all")]
    sources: String,

    /// Comma-separated list of IP sources to exclude
    #[arg(long, env = "EXCLUDE_SOURCES", default_value = "")]
    exclude_sources: String,

    /// Timeout for IP source checking in seconds
    #[arg(long, env = "SOURCE_TIMEOUT", default_value_t = 10)]
    source_timeout: u64,

    /// Interval in seconds between checks
    #[arg(long, env = "INTERVAL", default_value_t = 60)]
    interval: u64,

    /// Request timeout in seconds for DNS operations
    #[arg(long, env = "TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Only validate configuration without starting the update loop
    #[arg(long)]
    validate_only: bool,

    /// List all available IP sources and exit
    #[arg(long)]
    list_sources: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Parse a comma-separated source list; "all" or empty means no filter
    fn parse_source_list(raw: &str) -> Vec<String> {
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return Vec::new();
        }

        raw.split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Build the core configuration, failing on missing required arguments
    fn into_config(self) -> Result<DynipConfig> {
        let key = self
            .key
            .ok_or_else(|| anyhow::anyhow!("--key (or API_KEY) is required"))?;
        let domain = self
            .domain
            .ok_or_else(|| anyhow::anyhow!("--domain (or DOMAIN) is required"))?;
        let records: Vec<String> = self
            .records
            .ok_or_else(|| anyhow::anyhow!("--records (or RECORDS) is required"))?
            .split(',')
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();

        let provider = match self.provider.as_str() {
            "arvan" => ProviderConfig::Arvan { api_key: key },
            other => anyhow::bail!(
                "Provider '{}' is not supported. Supported providers: arvan",
                other
            ),
        };

        let family = if self.dual_stack {
            FamilyMode::Dual
        } else if self.ipv6 {
            FamilyMode::V6
        } else {
            FamilyMode::V4
        };

        Ok(DynipConfig {
            provider,
            domain,
            records,
            family,
            sources: SourceFilter {
                include: Self::parse_source_list(&self.sources),
                exclude: Self::parse_source_list(&self.exclude_sources),
            },
            source_timeout_secs: self.source_timeout,
            poll_interval_secs: self.interval,
            request_timeout_secs: self.timeout,
            engine: Default::default(),
        })
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => anyhow::bail!(
            "Log level '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            other
        ),
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // list-sources needs no provider credentials
    if cli.list_sources {
        println!("Available IP sources:");
        println!("=====================");
        for entry in dynip_sources::REGISTRY {
            let source = (entry.build)();
            println!("{} (priority: {})", source.name(), source.priority());
        }
        return DaemonExitCode::CleanShutdown.into();
    }

    if let Err(e) = init_tracing(&cli.log_level) {
        eprintln!("Configuration error: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    let validate_only = cli.validate_only;
    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    info!("Starting dynipd daemon");
    info!(
        domain = %config.domain,
        records = config.records.len(),
        "Configuration loaded"
    );

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_daemon(config, validate_only).await {
            Ok(code) => code,
            Err(e) => {
                error!("Daemon error: {}", e);
                DaemonExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Run the daemon
async fn run_daemon(config: DynipConfig, validate_only: bool) -> Result<DaemonExitCode> {
    // Register built-in providers
    let registry = ProviderRegistry::new();
    dynip_provider_arvan::register(&registry);

    let provider = match registry.create_provider(&config.provider) {
        Ok(provider) => provider,
        Err(e) => {
            error!("Provider setup failed: {}", e);
            return Ok(DaemonExitCode::ConfigError);
        }
    };

    // One shared HTTP client for sources; the engine never builds its own
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;

    let domain = config.domain.clone();
    let sources = dynip_sources::builtin_sources();
    let (mut engine, mut events) = match UpdateEngine::new(provider, client, sources, config) {
        Ok(pair) => pair,
        Err(e) => {
            error!("Engine setup failed: {}", e);
            return Ok(DaemonExitCode::ConfigError);
        }
    };

    // Startup validation is the only fatal provider interaction
    if let Err(e) = engine.validate().await {
        error!(domain = %domain, "Domain validation failed: {}", e);
        return Ok(DaemonExitCode::ConfigError);
    }

    if validate_only {
        info!("Configuration validated successfully. Exiting.");
        return Ok(DaemonExitCode::CleanShutdown);
    }

    // Drain engine events so the channel never fills
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!(?event, "engine event");
        }
    });

    info!("Starting update loop");
    engine.run().await?;

    info!("Daemon stopped");
    Ok(DaemonExitCode::CleanShutdown)
}
