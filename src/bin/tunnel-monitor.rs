use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use tunnel_relay::args::CommonArgs;
use tunnel_relay::console::{self, Dashboard};
use tunnel_relay::logging::{self, LogOutput};
use tunnel_relay::runtime::{self, load_and_apply_config};
use tunnel_relay::types::Port;
use tunnel_relay::{
    Config, MetricsCollector, RuntimeConfig, Shutdown, StatusServer, StatusState, TunnelSession,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Console and status page without the relay",
    long_about = None
)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (config, source) = load_and_apply_config(&args.common, Port::MONITOR_CONSOLE, |_| {})?;
    let console_enabled = args.common.console_enabled(&config);

    logging::init_logging(LogOutput::for_console(console_enabled));
    info!("Loaded configuration from {}", source.description());

    let rt = RuntimeConfig::from_args(args.common.threads).build_runtime()?;
    rt.block_on(run_monitor(config, console_enabled))
}

async fn run_monitor(config: Config, console_enabled: bool) -> Result<()> {
    let console_port = config.console.port.unwrap_or(Port::MONITOR_CONSOLE);
    let metrics = MetricsCollector::new();
    let session = Arc::new(TunnelSession::for_monitor(&config, console_port));

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

    info!("Status page at {}", session.console_url());

    let shutdown = Arc::new(Shutdown::new());
    runtime::spawn_signal_handler(Arc::clone(&shutdown));

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

    if let Err(e) = console_task.await {
        error!("Console task failed: {}", e);
    }

    status_result?;
    info!("Monitor shutdown complete");
    Ok(())
}
