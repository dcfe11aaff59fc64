//! isovd - host ISOV meter
//!
//! Runs the meter against simulated converters and prints one snapshot per
//! report interval until interrupted.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use isov_posix::{PortConfig, PosixPort};
use log::info;

#[derive(Parser, Debug)]
#[command(name = "isovd", version, about = "Five channel isolated voltage meter (host port)")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Delay between snapshots, overrides the configuration
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Exit after this many snapshots
    #[arg(long)]
    reports: Option<usize>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PortConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => PortConfig::default(),
    };
    if let Some(ms) = args.interval_ms {
        config.simulation.report_interval = Duration::from_millis(ms.max(1));
    }
    let interval = config.simulation.report_interval;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("installing Ctrl-C handler")?;
    }

    let port = PosixPort::start(config).context("starting meter")?;

    let mut reports = 0usize;
    while running.load(Ordering::SeqCst) && args.reports.map_or(true, |max| reports < max) {
        thread::sleep(interval);
        let record = port.read_record().context("reading snapshot")?;
        println!("{}", record.trim_end());
        reports += 1;
    }

    info!("ISOV: shutting down after {} snapshots", reports);
    port.shutdown();
    Ok(())
}
