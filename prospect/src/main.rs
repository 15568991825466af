use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use klib::balance::{BalanceClient, DEFAULT_ENDPOINT};
use klib::pipeline::{self, RunConfig};
use klib::sink::ResultSink;
use klib::tunnel::{Tunnel, TunnelConfig};
use log::info;

/// Generates random Bitcoin key pairs and looks up the balance of every
/// derived address.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of key pairs to generate and check
    #[arg(short, long, default_value_t = 32)]
    count: usize,

    /// Maximum number of checks in flight at once (defaults to the core count)
    #[arg(short, long)]
    parallel: Option<usize>,

    /// Balance API base URL
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Directory the output log is written into
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// OpenVPN config to route requests through
    #[arg(long, requires = "vpn_user", requires = "vpn_pass")]
    vpn_config: Option<PathBuf>,

    /// VPN username
    #[arg(long, requires = "vpn_config")]
    vpn_user: Option<String>,

    /// VPN password
    #[arg(long, requires = "vpn_config")]
    vpn_pass: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let cores = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    let parallel = args.parallel.unwrap_or(cores);

    let filename = format!("output_{}.txt", Local::now().format("%Y%m%d_%H%M%S"));
    let path = args.output_dir.join(filename);
    let sink = Arc::new(
        ResultSink::create(&path, "BTC")
            .with_context(|| format!("could not create output log {}", path.display()))?,
    );

    // held for the lifetime of the run; dropping it tears the tunnel down
    let _tunnel = match (&args.vpn_config, &args.vpn_user, &args.vpn_pass) {
        (Some(config), Some(user), Some(pass)) => Some(
            Tunnel::acquire(&TunnelConfig {
                config_path: config.clone(),
                username: user.clone(),
                password: pass.clone(),
            })
            .context("could not bring up the VPN tunnel")?,
        ),
        _ => None,
    };

    let client =
        BalanceClient::new(&args.endpoint).context("could not build the balance client")?;

    sink.note(&format!("Running on {cores} CPU cores")).await?;
    sink.note("--------------------------------------------------")
        .await?;

    let summary = pipeline::run(
        &RunConfig {
            batch: args.count,
            parallel,
        },
        &client,
        Arc::clone(&sink),
    )
    .await;

    info!(
        "checked {} addresses ({} failed), log written to {}",
        summary.completed,
        summary.failed,
        path.display()
    );

    Ok(())
}
