//! Report generation: the staged pipeline from loaded datasets to exported
//! tables and charts.
//!
//! Select candidates → intersect → count/group → export. Each destructive
//! counting pass receives its own clone of the infected set.

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use botcensus_core::types::{CensysCatalog, Dimension, SkipTally};
use botcensus_core::{aggregate, banner, devices, duration, filter, matcher};

use crate::config::ReportConfig;
use crate::error::Result;
use crate::mirai::MiraiTable;
use crate::{chart, export};

/// Where one run writes its files: `<dir>/<base>_<suffix>.{csv,png}`.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    dir: PathBuf,
    base: String,
}

impl OutputPaths {
    pub fn new(dir: &Path, base: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            base: base.to_string(),
        }
    }

    pub fn csv(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.csv", self.base, suffix))
    }

    pub fn png(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.png", self.base, suffix))
    }
}

/// Totals of one report run.
#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub report_id: Uuid,
    pub candidates: usize,
    pub infected: usize,
    pub with_banner: usize,
    pub without_banner: usize,
    pub excluded_other_ports: u64,
    /// Merged skip audit across both loaders and the filter pass.
    pub skipped: SkipTally,
}

/// Totals of one device-classification run.
#[derive(Debug, Clone)]
pub struct DeviceSummary {
    pub report_id: Uuid,
    pub infected: usize,
    pub device_names: usize,
    pub multi_device_ips: usize,
    pub missing_description: u64,
}

/// Run the full infection report over preloaded datasets.
pub fn generate_report(
    table: &MiraiTable,
    catalog: &CensysCatalog,
    config: &ReportConfig,
) -> Result<ReportSummary> {
    let report_id = Uuid::new_v4();
    let paths = OutputPaths::new(Path::new(&config.output_dir), &config.base_name);
    fs::create_dir_all(&config.output_dir)?;

    let policy = config.filter_policy()?;
    tracing::info!(
        report_id = %report_id,
        base = %config.base_name,
        filter_by_port = policy.by_port,
        filter_by_date = policy.by_date,
        "Report started"
    );

    let selection = filter::select_candidate_ips(&table.rows, &policy);
    let infected = matcher::intersect(&selection.ips, &catalog.eligible);

    let mut skipped = table.skipped;
    skipped.absorb(catalog.skipped);
    skipped.absorb(selection.skipped);

    // One private copy of the infected set per counting pass.
    for dimension in [Dimension::Prefix, Dimension::Country, Dimension::Asn] {
        let counts = aggregate::count_by(&table.rows, infected.clone(), dimension);
        let ranked = aggregate::rank(&counts);
        export::write_counts(&paths.csv(&format!("{}_count", dimension.slug())), &ranked)?;
        if config.charts {
            chart::bar_chart(
                &paths.png(dimension.slug()),
                top(&ranked, config.top_n),
                dimension.chart_title(),
                dimension.slug(),
            )?;
        }
    }

    let port_counts = aggregate::count_ports(&table.rows, infected.clone());
    export::write_counts(&paths.csv("ports_count"), &aggregate::rank(&port_counts))?;

    let presence = banner::presence_stats(&infected, &catalog.without_banner);
    let groups = banner::group_by_banner(&infected, &catalog.banners);
    export::write_banner_groups(&paths.csv("banners2ips"), &groups)?;

    for dimension in [Dimension::Asn, Dimension::Country] {
        let grouped = aggregate::group_by_dimension(&table.rows, &infected, dimension);
        export::write_ip_groups(&paths.csv(&format!("ips2{}", dimension.slug())), &grouped)?;
    }

    let hours = duration::activity_hours(&table.rows, &infected);
    export::write_duration_stats(
        &paths.csv("duration_with_zeros"),
        duration::describe(&hours).as_ref(),
    )?;
    let nonzero = duration::nonzero(&hours);
    export::write_duration_stats(
        &paths.csv("duration_no_zeros"),
        duration::describe(&nonzero).as_ref(),
    )?;
    if config.charts {
        chart::duration_histogram(&paths.png("duration"), &hours, "Hours of Activity")?;
    }

    let summary = ReportSummary {
        report_id,
        candidates: selection.ips.len(),
        infected: infected.len(),
        with_banner: presence.with_banner,
        without_banner: presence.without_banner,
        excluded_other_ports: catalog.excluded_other_ports,
        skipped,
    };
    export::write_infected(&paths.csv("infected"), &summary, &infected)?;

    tracing::info!(
        report_id = %report_id,
        candidates = summary.candidates,
        infected = summary.infected,
        with_banner = summary.with_banner,
        without_banner = summary.without_banner,
        excluded_other_ports = summary.excluded_other_ports,
        skipped = summary.skipped.total(),
        "Report complete"
    );
    Ok(summary)
}

/// Run the device-description classification over preloaded datasets.
pub fn device_report(
    table: &MiraiTable,
    catalog: &CensysCatalog,
    config: &ReportConfig,
) -> Result<DeviceSummary> {
    let report_id = Uuid::new_v4();
    let paths = OutputPaths::new(Path::new(&config.output_dir), &config.base_name);
    fs::create_dir_all(&config.output_dir)?;

    let policy = config.filter_policy()?;
    let selection = filter::select_candidate_ips(&table.rows, &policy);
    let infected = matcher::intersect(&selection.ips, &catalog.eligible);

    let breakdown = devices::classify(&catalog.observations, &infected, &config.focus_asns);

    let ranked = aggregate::rank(&breakdown.device_counts);
    export::write_counts(&paths.csv("devices_count"), &ranked)?;
    export::write_asn_devices(&paths.csv("asn_devices"), &breakdown.per_asn)?;
    export::write_ip_list(&paths.csv("multi_device_ips"), &breakdown.multi_device_ips)?;
    export::write_ip_list(&paths.csv("multi_device_asn"), &breakdown.multi_device_asns)?;
    let countries = aggregate::rank(&breakdown.multi_country_counts);
    export::write_counts(&paths.csv("multi_country_count"), &countries)?;

    if config.charts {
        chart::bar_chart(
            &paths.png("devices"),
            top(&ranked, config.top_n),
            "Top 10 most often attacked devices",
            "device",
        )?;
        chart::bar_chart(
            &paths.png("multi_country"),
            top(&countries, config.top_n),
            "Countries where one IP was attacked on multiple devices",
            "country",
        )?;
    }

    let summary = DeviceSummary {
        report_id,
        infected: infected.len(),
        device_names: breakdown.device_counts.len(),
        multi_device_ips: breakdown.multi_device_ips.len(),
        missing_description: breakdown.missing_description,
    };
    tracing::info!(
        report_id = %report_id,
        infected = summary.infected,
        device_names = summary.device_names,
        multi_device_ips = summary.multi_device_ips,
        missing_description = summary.missing_description,
        "Device report complete"
    );
    Ok(summary)
}

fn top(ranked: &[(String, u64)], n: usize) -> &[(String, u64)] {
    &ranked[..ranked.len().min(n)]
}
