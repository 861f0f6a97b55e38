//! PNG rendering of ranked bar charts and the activity-duration histogram.

use std::path::Path;

use plotters::prelude::*;

use botcensus_core::duration;

use crate::error::{ReportError, Result};

const CHART_SIZE: (u32, u32) = (1100, 650);
const HISTOGRAM_BIN_HOURS: f64 = 2.0;
const HISTOGRAM_MAX_HOURS: f64 = 200.0;

fn chart_error<E: std::fmt::Display>(path: &Path) -> impl FnOnce(E) -> ReportError + '_ {
    move |e| ReportError::Chart {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Vertical bars for ranked label/count pairs. An empty ranking renders
/// nothing and logs a warning.
pub fn bar_chart(path: &Path, ranked: &[(String, u64)], title: &str, x_desc: &str) -> Result<()> {
    if ranked.is_empty() {
        tracing::warn!(path = %path.display(), "Nothing to chart");
        return Ok(());
    }

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error(path))?;

    let y_max = ranked.iter().map(|(_, c)| *c).max().unwrap_or(1).max(1) as f64 * 1.15;
    let labels: Vec<&str> = ranked.iter().map(|(label, _)| label.as_str()).collect();

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(title, ("sans-serif", 24))
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(0f64..ranked.len() as f64, 0f64..y_max)
        .map_err(chart_error(path))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(ranked.len())
        .x_label_formatter(&|x: &f64| {
            labels
                .get(x.floor() as usize)
                .map(|label| label.to_string())
                .unwrap_or_default()
        })
        .x_desc(x_desc)
        .y_desc("Count")
        .draw()
        .map_err(chart_error(path))?;

    chart
        .draw_series(ranked.iter().enumerate().map(|(i, (_, count))| {
            Rectangle::new(
                [(i as f64 + 0.1, 0.0), (i as f64 + 0.9, *count as f64)],
                BLUE.mix(0.6).filled(),
            )
        }))
        .map_err(chart_error(path))?;

    root.present().map_err(chart_error(path))?;
    Ok(())
}

/// Histogram of activity hours in 2-hour bins over [0, 200). Zero-duration
/// samples are dropped before binning, the same filter the no-zeros stat
/// export applies. Renders nothing when every bin is empty.
pub fn duration_histogram(path: &Path, hours: &[f64], title: &str) -> Result<()> {
    let samples = duration::nonzero(hours);
    let bins = histogram_bins(&samples, HISTOGRAM_BIN_HOURS, HISTOGRAM_MAX_HOURS);
    if bins.iter().all(|(_, count)| *count == 0) {
        tracing::warn!(path = %path.display(), "Nothing to chart");
        return Ok(());
    }

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error(path))?;

    let y_max = bins.iter().map(|(_, c)| *c).max().unwrap_or(1) as f64 * 1.15;
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(title, ("sans-serif", 24))
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(0f64..HISTOGRAM_MAX_HOURS, 0f64..y_max)
        .map_err(chart_error(path))?;

    chart
        .configure_mesh()
        .x_desc("Active in hours")
        .y_desc("Devices")
        .draw()
        .map_err(chart_error(path))?;

    chart
        .draw_series(bins.iter().map(|((lo, hi), count)| {
            Rectangle::new([(*lo, 0.0), (*hi, *count as f64)], BLUE.mix(0.6).filled())
        }))
        .map_err(chart_error(path))?;

    root.present().map_err(chart_error(path))?;
    Ok(())
}

/// Count samples into `[lo, hi)` bins of `bin_width` covering `[0, max)`.
/// Samples outside the range are dropped.
fn histogram_bins(samples: &[f64], bin_width: f64, max: f64) -> Vec<((f64, f64), u64)> {
    let bin_count = (max / bin_width).ceil() as usize;
    let mut bins: Vec<((f64, f64), u64)> = (0..bin_count)
        .map(|i| ((i as f64 * bin_width, (i as f64 + 1.0) * bin_width), 0))
        .collect();
    for sample in samples {
        if *sample < 0.0 || *sample >= max {
            continue;
        }
        bins[(*sample / bin_width) as usize].1 += 1;
    }
    bins
}
