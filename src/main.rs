use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use snmp_table::config::AppConfig;
use snmp_table::formatter::{CounterState, PluginFormatter, render_table};
use snmp_table::metrics;
use snmp_table::pipeline;

/// Poll one SNMP table and print metrics in the agent plugin format.
#[derive(Debug, Parser)]
#[command(name = "snmp-table", version, about)]
struct Args {
    /// Configuration file
    #[arg(long = "conf", value_name = "FILE", default_value = "config.yml")]
    conf: PathBuf,

    /// Print the reconstructed table before the metrics
    #[arg(long)]
    preview: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "snmp_table=debug",
        _ => "snmp_table=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the plugin protocol
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let transient = e
                .downcast_ref::<snmp_table::Error>()
                .is_some_and(snmp_table::Error::is_transient);
            if transient {
                warn!(target: "snmp_table", "poll did not complete, nothing emitted");
            }
            eprintln!("snmp-table: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = AppConfig::load(&args.conf)?;
    let prefix = config.metric_prefix().to_string();
    let stdout = io::stdout();

    if PluginFormatter::meta_requested() {
        let graphs = metrics::graph_definitions(&config.metrics)?;
        PluginFormatter::write_meta(&mut stdout.lock(), &prefix, &graphs)?;
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(cancel_on_interrupt(cancel.clone()));

    let result = pipeline::poll(&config, &cancel).await;
    watcher.abort();
    let output = result.with_context(|| format!("Опрос {} не удался", config.target.address()))?;

    let now = chrono::Utc::now().timestamp();
    let state_path = CounterState::path_for(&prefix);
    let previous = CounterState::load(&state_path);
    CounterState::capture(&output.metrics, now).save(&state_path)?;

    let mut out = stdout.lock();
    if args.preview {
        writeln!(out, "{}", render_table(&output.table)?)?;
    }
    PluginFormatter::write_metrics(&mut out, &prefix, &output.metrics, now, previous.as_ref())
        .context("Не удалось вывести метрики")?;
    out.flush()?;

    info!(
        target: "snmp_table",
        rows = output.table.rows().len(),
        metrics = output.metrics.metrics.len(),
        "cycle complete"
    );
    Ok(())
}

async fn cancel_on_interrupt(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            warn!(target: "snmp_table", "interrupted, cancelling poll");
            cancel.cancel();
        }
        Err(e) => warn!(target: "snmp_table", error = %e, "cannot listen for interrupt"),
    }
}
