use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use storefront_core::{Storefront, StorefrontConfig};
use tokio::sync::mpsc::unbounded_channel;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::info;

mod app;
mod ui;

use app::StorefrontApp;

#[derive(Clone)]
struct ChannelWriter {
    sender: Sender<String>,
}

impl std::io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(text) = String::from_utf8(buf.to_vec()) {
            let _ = self.sender.send(text);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Greenflwr storefront terminal client", long_about = None)]
struct Cli {
    /// Storefront config JSON; defaults to STOREFRONT_CONFIG_PATH or the builtin config.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Fixed seed for the simulated greenhouse sensors.
    #[arg(long)]
    seed: Option<u64>,
    /// Clock resolution in milliseconds.
    #[arg(long, default_value_t = 100)]
    frame_ms: u64,
}

fn load_config(cli: &Cli) -> Result<Arc<StorefrontConfig>> {
    let config = match &cli.config {
        Some(path) => Arc::new(StorefrontConfig::from_file(path)?),
        None => StorefrontConfig::from_env()?,
    };
    let Some(seed) = cli.seed else {
        return Ok(config);
    };
    let mut config = (*config).clone();
    config.telemetry.seed = Some(seed);
    Ok(Arc::new(config))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let (log_tx, log_rx) = mpsc::channel::<String>();
    let log_writer_tx = log_tx.clone();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .with_writer(move || ChannelWriter {
            sender: log_writer_tx.clone(),
        })
        .init();

    let cli = Cli::parse();
    let store = Storefront::from_config(load_config(&cli)?)?;
    info!(items = store.catalog().len(), "storefront.loaded");

    let (clock_tx, clock_rx) = unbounded_channel::<Duration>();
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    let ui_handle = std::thread::spawn(move || -> Result<()> {
        let app = StorefrontApp::new(store, clock_rx, shutdown_tx, log_rx)?;
        app.run()
    });

    let mut ticker = interval(Duration::from_millis(cli.frame_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();
    loop {
        ticker.tick().await;
        if shutdown_rx.try_recv().is_ok() {
            info!("Storefront requested shutdown");
            break;
        }
        let now = Instant::now();
        if clock_tx.send(now - last).is_err() {
            break;
        }
        last = now;
    }

    ui_handle
        .join()
        .map_err(|_| eyre!("storefront UI thread panicked"))?
}
