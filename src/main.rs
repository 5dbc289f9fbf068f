use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use llm_scan_rs::config::ScanConfig;
use llm_scan_rs::scanner::ScanSession;
use llm_scan_rs::target::TargetMode;
use llm_scan_rs::types::{LogLevel, ResultRecord, ScanEvent};
use llm_scan_rs::{logging, netdetect, ports};

use anyhow::{bail, Context, Result};
use clap::Parser;

/// llm-scan-rs — find LLM inference servers (Ollama, vLLM, llama.cpp, ...) reachable without authentication.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "llm-scan-rs",
    version,
    about = "Find LLM inference servers (Ollama, vLLM, llama.cpp, ...) reachable without authentication.",
    long_about = None
)]
struct Cli {
    /// IPv4 address, `start-end` range or CIDR. If omitted, auto-detect the local /24.
    target: Option<String>,

    /// How to read TARGET. Guessed from its shape when omitted.
    #[arg(long, value_enum)]
    mode: Option<TargetMode>,

    /// Also sweep a wide port set for vLLM on non-default ports.
    #[arg(long = "full", default_value_t = false)]
    full: bool,

    /// Max concurrent TCP connects during the full-port sweep.
    #[arg(long, default_value_t = 100)]
    concurrency: usize,

    /// TCP connect timeout in milliseconds.
    #[arg(long = "timeout-ms", default_value_t = 200)]
    timeout_ms: u64,

    /// HTTP request timeout in milliseconds.
    #[arg(long = "http-timeout-ms", default_value_t = 3000)]
    http_timeout_ms: u64,

    /// Ports file (one port or range per line) replacing the built-in sweep ranges.
    #[arg(long = "sweep-ports")]
    sweep_ports: Option<PathBuf>,

    /// Write results as pretty JSON to this path (optional).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Debug-level diagnostics on stderr.
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let (target, mode) = match cli.target.as_deref() {
        Some(t) => (t.trim().to_string(), cli.mode.unwrap_or_else(|| TargetMode::detect(t))),
        None => {
            let cidrs = netdetect::detect_local_cidrs().context("failed to detect local networks")?;
            let Some(first) = cidrs.first() else {
                bail!("no local IPv4 network found; pass a target explicitly");
            };
            println!("Detected local IPv4 networks:");
            for cidr in &cidrs {
                println!("  - {cidr}");
            }
            (first.to_string(), TargetMode::Cidr)
        }
    };

    let mut config = ScanConfig {
        connect_timeout: Duration::from_millis(cli.timeout_ms),
        http_timeout: Duration::from_millis(cli.http_timeout_ms),
        sweep_concurrency: cli.concurrency.clamp(1, 5_000),
        ..Default::default()
    };
    if let Some(path) = cli.sweep_ports.as_deref() {
        config.sweep_ports = ports::load_ports_from_path(path)?;
    }

    println!("llm-scan-rs configuration:");
    println!("  target       : {target}");
    println!("  mode         : {}", mode.as_str());
    println!("  full sweep   : {}", cli.full);
    if cli.full {
        println!("  sweep ports  : {}", config.sweep_candidates().len());
        println!("  concurrency  : {}", config.sweep_concurrency);
    }
    println!("  timeout_ms   : {}", cli.timeout_ms);
    println!(
        "  output       : {}",
        cli.output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".to_string())
    );
    println!();

    let (session, mut events) = ScanSession::new(config).context("failed to build HTTP client")?;
    let stop = session.stop_handle();
    let full = cli.full;
    let scan = tokio::spawn(async move { session.run(&target, mode, full).await });

    let mut results = Vec::new();
    loop {
        tokio::select! {
            ev = events.recv() => match ev {
                Some(ScanEvent::Log { text, level }) => print_log(&text, level),
                Some(ScanEvent::Progress { .. }) => {}
                Some(ScanEvent::Done { results: r }) => {
                    results = r;
                    break;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c(), if !stop.is_stop_requested() => {
                eprintln!("Stopping scan...");
                stop.stop();
            }
        }
    }
    scan.await.context("scan task panicked")?;

    print_results_table(&results);
    if let Some(path) = cli.output.as_deref() {
        match write_results_json(path, &results) {
            Ok(()) => println!("Wrote JSON results to {}", path.display()),
            Err(e) => eprintln!("Failed to write JSON to {}: {e:#}", path.display()),
        }
    }

    Ok(())
}

fn print_log(text: &str, level: LogLevel) {
    match level {
        LogLevel::Info => println!("{text}"),
        LogLevel::Success => println!("{text} [ok]"),
        LogLevel::Warning | LogLevel::Error => println!("{text} [{}]", level.as_str()),
    }
}

fn print_results_table(results: &[ResultRecord]) {
    let ip_w = results.iter().map(|r| r.ip.len()).max().unwrap_or(0).max("ip".len());
    let svc_w = results
        .iter()
        .map(|r| r.service.len())
        .max()
        .unwrap_or(0)
        .max("service".len());
    let port_w = 5usize;

    println!("\nExposed services: {}", results.len());
    if results.is_empty() {
        return;
    }
    println!(
        "{:<ip_w$}  {:>port_w$}  {:<svc_w$}  url",
        "ip",
        "port",
        "service",
        ip_w = ip_w,
        port_w = port_w,
        svc_w = svc_w
    );
    println!(
        "{:-<ip_w$}  {:-<port_w$}  {:-<svc_w$}  {:-<3}",
        "",
        "",
        "",
        "",
        ip_w = ip_w,
        port_w = port_w,
        svc_w = svc_w
    );
    for r in results {
        println!(
            "{:<ip_w$}  {:>port_w$}  {:<svc_w$}  {}",
            r.ip,
            r.port,
            r.service,
            r.url,
            ip_w = ip_w,
            port_w = port_w,
            svc_w = svc_w
        );
    }
}

fn write_results_json(path: &std::path::Path, results: &[ResultRecord]) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}
