use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use tunnel_relay::args::{CommonArgs, UpstreamArgs};
use tunnel_relay::console::{self, Dashboard};
use tunnel_relay::logging::{self, LogOutput};
use tunnel_relay::runtime::{self, load_and_apply_config};
use tunnel_relay::types::Port;
use tunnel_relay::{
    Config, MetricsCollector, RelayListener, RuntimeConfig, Shutdown, StatusServer, StatusState,
    TunnelSession,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Expose a local HTTP service on a public port", long_about = None)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    upstream: UpstreamArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (config, source) = load_and_apply_config(&args.common, Port::RELAY_CONSOLE, |config| {
        args.upstream.apply_to(config);
    })?;
    let console_enabled = args.common.console_enabled(&config);

    logging::init_logging(LogOutput::for_console(console_enabled));
    info!("Loaded configuration from {}", source.description());

    let rt = RuntimeConfig::from_args(args.common.threads).build_runtime()?;
    rt.block_on(run_relay(config, console_enabled))
}

async fn run_relay(config: Config, console_enabled: bool) -> Result<()> {
    let console_port = config.console.port.unwrap_or(Port::RELAY_CONSOLE);
    let metrics = MetricsCollector::new();
    let session = Arc::new(TunnelSession::for_relay(&config, console_port));

    let relay = RelayListener::bind(&config.relay, metrics.clone())
        .await
        .context("Cannot start the relay")?;
    let status = StatusServer::bind(
        &config.console.host,
        console_port,
        StatusState {
            session: Arc::clone(&session),
            metrics: metrics.clone(),
        },
    )
    .await
    .context("Cannot start the status page")?;

    info!("Forwarding {}", session.forwarding());
    info!("Status page at {}", session.console_url());

    let shutdown = Arc::new(Shutdown::new());
    runtime::spawn_signal_handler(Arc::clone(&shutdown));

    let relay_task = tokio::spawn(relay.run(shutdown.subscribe()));
    let mut status_task = tokio::spawn(status.run(shutdown.subscribe()));
    let console_task =
        console::spawn_dashboard(Dashboard::new(session, metrics), &shutdown, console_enabled);

    let mut stopped = shutdown.subscribe();
    let status_result = tokio::select! {
        () = stopped.wait() => status_task.await?,
        result = &mut status_task => {
            shutdown.trigger();
            result?
        }
    };

    relay_task.await?;
    if let Err(e) = console_task.await {
        error!("Console task failed: {}", e);
    }

    status_result?;
    info!("Relay shutdown complete");
    Ok(())
}
