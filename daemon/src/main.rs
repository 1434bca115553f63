//! Diploma approval daemon.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use diploma_service::{init_logging, DiplomaService, ServiceConfig};
use diploma_types::IdentityScheme;

#[derive(Parser, Debug)]
#[command(name = "diploma-daemon", about = "Diploma request approval and anchoring service")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "DIPLOMA_CONFIG")]
    config: Option<PathBuf>,

    /// Address the HTTP API binds to.
    #[arg(long, env = "DIPLOMA_LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// HTTP port.
    #[arg(long, env = "DIPLOMA_PORT")]
    port: Option<u16>,

    /// Data directory for the LMDB environment.
    #[arg(long, env = "DIPLOMA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// LMDB map size in MiB.
    #[arg(long, env = "DIPLOMA_MAP_SIZE_MB")]
    map_size_mb: Option<usize>,

    /// Base URL of the auth service.
    #[arg(long, env = "DIPLOMA_AUTH_SERVICE_URL")]
    auth_service_url: Option<String>,

    /// Canonical identity scheme: "wallet" or "user_id".
    #[arg(long, env = "DIPLOMA_IDENTITY_SCHEME")]
    identity_scheme: Option<IdentityScheme>,

    /// Timeout for auth service calls, in seconds.
    #[arg(long, env = "DIPLOMA_IDENTITY_TIMEOUT_SECS")]
    identity_timeout_secs: Option<u64>,

    /// KPI cache lifetime, in seconds.
    #[arg(long, env = "DIPLOMA_KPI_TTL_SECS")]
    kpi_ttl_secs: Option<u64>,

    /// Credential the anchoring process presents on anchor-confirm.
    #[arg(long, env = "DIPLOMA_ANCHOR_CALLBACK_TOKEN", hide_env_values = true)]
    anchor_callback_token: Option<String>,

    /// Enable or disable the Prometheus endpoint.
    #[arg(long, env = "DIPLOMA_ENABLE_METRICS")]
    enable_metrics: Option<bool>,

    /// Log format: "human" or "json".
    #[arg(long, env = "DIPLOMA_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "DIPLOMA_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Run the service.
    Run,
    /// Print the effective configuration as TOML and exit.
    Config,
}

impl Cli {
    /// Layer CLI flags and env vars over `base`.
    fn merge_into(self, base: ServiceConfig) -> ServiceConfig {
        ServiceConfig {
            listen_addr: self.listen_addr.unwrap_or(base.listen_addr),
            port: self.port.unwrap_or(base.port),
            data_dir: self.data_dir.unwrap_or(base.data_dir),
            map_size_mb: self.map_size_mb.unwrap_or(base.map_size_mb),
            auth_service_url: self.auth_service_url.unwrap_or(base.auth_service_url),
            identity_scheme: self.identity_scheme.unwrap_or(base.identity_scheme),
            identity_timeout_secs: self
                .identity_timeout_secs
                .unwrap_or(base.identity_timeout_secs),
            kpi_ttl_secs: self.kpi_ttl_secs.unwrap_or(base.kpi_ttl_secs),
            anchor_callback_token: self.anchor_callback_token.or(base.anchor_callback_token),
            enable_metrics: self.enable_metrics.unwrap_or(base.enable_metrics),
            log_format: self.log_format.unwrap_or(base.log_format),
            log_level: self.log_level.unwrap_or(base.log_level),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => ServiceConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ServiceConfig::default(),
    };
    let config_path = cli.config.clone();
    let print_only = matches!(cli.command, Command::Config);
    let config = cli.merge_into(base);

    if print_only {
        let mut redacted = config.clone();
        if redacted.anchor_callback_token.is_some() {
            redacted.anchor_callback_token = Some("<redacted>".into());
        }
        print!("{}", redacted.to_toml_string()?);
        return Ok(());
    }

    config.validate().context("invalid configuration")?;
    init_logging(config.log_format()?, &config.log_level);
    if let Some(path) = config_path {
        tracing::info!(path = %path.display(), "loaded config file");
    }

    let service = DiplomaService::new(config).context("failed to initialise service")?;
    service.start().await?;
    service.stop()?;

    tracing::info!("diploma daemon exited cleanly");
    Ok(())
}
