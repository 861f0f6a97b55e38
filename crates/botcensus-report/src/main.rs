//! CLI entry point for the botcensus-report pipeline.

use std::path::Path;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use botcensus_core::types::{CensysVersion, SeenField};

use botcensus_report::config::ReportConfig;
use botcensus_report::{censys, convert, mirai, report};

#[derive(Parser)]
#[command(name = "botcensus-report")]
#[command(about = "Infection-report batch pipeline over Mirai and Censys datasets")]
struct Cli {
    /// Mirai CSV table (overrides config).
    #[arg(long)]
    mirai: Option<String>,

    /// Directory of Censys JSON record files (overrides config).
    #[arg(long)]
    censys_dir: Option<String>,

    /// Output directory for exports and charts.
    #[arg(long)]
    out_dir: Option<String>,

    /// File-name base for this run's outputs.
    #[arg(long)]
    base: Option<String>,

    /// Censys schema generation: v1, v2.
    #[arg(long)]
    censys_version: Option<String>,

    /// Keep only telnet-port rows when selecting candidates.
    #[arg(long)]
    filter_port: bool,

    /// Keep only rows seen at or after the date limit.
    #[arg(long)]
    filter_date: bool,

    /// Date limit, YYYY-MM-DDTHH:MM:SSZ.
    #[arg(long)]
    date_limit: Option<String>,

    /// Seen column for the date filter: first_seen, last_seen.
    #[arg(long)]
    seen: Option<String>,

    /// Also run the device-description classification.
    #[arg(long)]
    devices: bool,

    /// Skip chart rendering.
    #[arg(long)]
    no_charts: bool,

    /// Convert a directory of raw line files into JSON record files in the
    /// Censys directory, then exit.
    #[arg(long, value_name = "DIR")]
    convert_raw: Option<String>,

    /// Delete raw files after conversion.
    #[arg(long)]
    delete_raw: bool,

    /// Config file prefix (default: botcensus).
    #[arg(short, long, default_value = "botcensus")]
    config: String,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    if let Some(raw_dir) = cli.convert_raw.as_deref() {
        let written = convert::convert_dir(
            Path::new(raw_dir),
            Path::new(&config.censys_dir),
            cli.delete_raw,
        )?;
        tracing::info!(files = written, dir = %config.censys_dir, "Conversion complete");
        return Ok(());
    }

    let table = mirai::load_table(Path::new(&config.mirai_csv))?;
    let catalog = censys::load_catalog(Path::new(&config.censys_dir), config.censys_version)?;

    report::generate_report(&table, &catalog, &config)?;
    if cli.devices {
        report::device_report(&table, &catalog, &config)?;
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> anyhow::Result<ReportConfig> {
    let mut config = load_report_config(&cli.config)?;

    if let Some(path) = &cli.mirai {
        config.mirai_csv = path.clone();
    }
    if let Some(dir) = &cli.censys_dir {
        config.censys_dir = dir.clone();
    }
    if let Some(dir) = &cli.out_dir {
        config.output_dir = dir.clone();
    }
    if let Some(base) = &cli.base {
        config.base_name = base.clone();
    }
    if let Some(limit) = &cli.date_limit {
        config.date_limit = limit.clone();
    }
    if let Some(seen) = &cli.seen {
        config.seen = parse_seen(seen)?;
    }
    if let Some(version) = &cli.censys_version {
        config.censys_version = parse_version(version)?;
    }
    if cli.filter_port {
        config.filter_by_port = true;
    }
    if cli.filter_date {
        config.filter_by_date = true;
    }
    if cli.no_charts {
        config.charts = false;
    }

    Ok(config)
}

fn parse_seen(s: &str) -> anyhow::Result<SeenField> {
    match s.to_lowercase().as_str() {
        "first_seen" | "fseen" => Ok(SeenField::FirstSeen),
        "last_seen" | "lseen" => Ok(SeenField::LastSeen),
        _ => anyhow::bail!("Invalid seen field: {s}. Choose: first_seen, last_seen"),
    }
}

fn parse_version(s: &str) -> anyhow::Result<CensysVersion> {
    match s.to_lowercase().as_str() {
        "v1" | "1" => Ok(CensysVersion::V1),
        "v2" | "2" => Ok(CensysVersion::V2),
        _ => anyhow::bail!("Invalid censys version: {s}. Choose: v1, v2"),
    }
}

fn load_report_config(file_prefix: &str) -> anyhow::Result<ReportConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("BOTCENSUS_REPORT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    match cfg.get::<ReportConfig>("report") {
        Ok(c) => Ok(c),
        Err(_) => Ok(ReportConfig::default()),
    }
}
