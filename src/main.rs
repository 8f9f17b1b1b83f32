use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use allowdns::logging;
use allowdns::proxy::{self, DEFAULT_ALLOWLIST_PATH, Proxy, ProxyConfig};
use allowdns::transport::upstream::{self, DEFAULT_UPSTREAM, Upstream};

#[derive(Parser)]
#[command(name = "allowdns")]
#[command(about = "Allow-list filtering DNS proxy", long_about = None)]
struct Args {
    /// Local port to listen on
    #[arg(short, long, default_value = "53")]
    port: u16,

    /// Bind address
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Upstream DNS server (ip or ip:port)
    #[arg(short, long, default_value = DEFAULT_UPSTREAM)]
    upstream: String,

    /// Allow-list file, one domain per line
    #[arg(short, long, default_value = DEFAULT_ALLOWLIST_PATH)]
    allowlist: PathBuf,

    /// Upstream timeout in seconds
    #[arg(short, long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Log level (trace, debug, info, warn, error), overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable verbose logging (same as --log-level debug)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn log_level(&self) -> &str {
        if self.verbose { "debug" } else { &self.log_level }
    }

    fn into_config(self) -> anyhow::Result<ProxyConfig> {
        let bind_addr = proxy::parse_bind_addr(&self.bind, self.port)?;
        let upstream_addr = upstream::parse_upstream(&self.upstream)?;

        Ok(ProxyConfig {
            bind_addr,
            upstream: Upstream::new(upstream_addr).with_timeout(Duration::from_secs(self.timeout)),
            allowlist_path: self.allowlist,
        })
    }
}

async fn run(config: ProxyConfig) -> anyhow::Result<()> {
    let proxy = Proxy::bind(config)
        .await
        .context("failed to start DNS server")?;

    let shutdown = CancellationToken::new();
    let server = tokio::spawn(proxy.run(shutdown.clone()));

    wait_for_signal().await?;
    info!("DNS server shutting down");
    shutdown.cancel();

    server.await.context("DNS server task failed")?;
    info!("DNS server stopped");

    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.context("failed to listen for Ctrl-C")?,
        _ = terminate.recv() => {}
    }

    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> anyhow::Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.log_level());

    let config = args.into_config()?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(run(config))
}
