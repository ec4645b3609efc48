//! Heatmap figure for a finished sweep
//!
//! One column per integrator, three rows: relative energy error (log scale),
//! sign of the energy error, and runtime per timestep. Each panel carries its
//! own colorbar; the scales are shared across integrators so columns compare.

use std::path::Path;
use std::process::Command;

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::{info, warn};

use crate::error::{Result, SweepError};
use crate::sweep::grid::SweepAxes;
use crate::sweep::pipeline::SweepReport;
use crate::sweep::reduce::Grid;
use crate::visualization::colormap::{ColorScale, Colormap};

/// Lower end of the energy-error scale
pub const ENERGY_ERROR_VMIN: f64 = 1e-16;

const PANEL_SIZE: (u32, u32) = (850, 400);
const COLORBAR_STEPS: usize = 128;

/// The three colour scales shared by every column
#[derive(Debug, Clone, Copy)]
pub struct Scales {
    pub energy: ColorScale,
    pub sign: ColorScale,
    pub timing: ColorScale,
}

impl Scales {
    pub fn from_report(report: &SweepReport) -> Self {
        let energy_max = report
            .integrators
            .iter()
            .map(|ig| ig.grids.energy_error.max())
            .fold(f64::NEG_INFINITY, f64::max);
        let timings: Vec<f64> = report
            .integrators
            .iter()
            .flat_map(|ig| ig.grids.timing.iter().copied())
            .collect();

        Self {
            energy: ColorScale::logarithmic(ENERGY_ERROR_VMIN, energy_max, Colormap::RdYlGnReversed),
            sign: ColorScale::linear(-1.0, 1.0, Colormap::Bwr),
            timing: ColorScale::linear(0.0, 3.0 * median(&timings), Colormap::RdYlGnReversed),
        }
    }
}

/// Median of `values`, mean of the middle two for even counts, 0 when empty
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    }
}

/// -1, 0 or 1
pub fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn plot_err<E: std::fmt::Display>(e: E) -> SweepError {
    SweepError::Render(e.to_string())
}

/// Write the full figure to `path` as a bitmap
pub fn render_heatmaps(report: &SweepReport, path: &Path) -> Result<()> {
    let cols = report.integrators.len().max(1);
    let size = (PANEL_SIZE.0 * cols as u32, PANEL_SIZE.1 * 3);

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let panels = root.split_evenly((3, cols));
    let scales = Scales::from_report(report);

    for (c, ig) in report.integrators.iter().enumerate() {
        let name = ig.integrator;
        draw_panel(
            &panels[c],
            &report.axes,
            &ig.grids.energy_error,
            &scales.energy,
            &format!("Relative energy error, {name}"),
        )?;
        draw_panel(
            &panels[cols + c],
            &report.axes,
            &ig.grids.energy_error_signed.map(sign),
            &scales.sign,
            &format!("Sign of energy error, {name}"),
        )?;
        draw_panel(
            &panels[2 * cols + c],
            &report.axes,
            &ig.grids.timing,
            &scales.timing,
            &format!("Runtime per timestep [us], {name}"),
        )?;
    }

    root.present().map_err(plot_err)?;
    info!(path = %path.display(), "figure written");
    Ok(())
}

/// Half the spacing of an axis, 0.5 for a single point
fn half_cell(values: &[f64]) -> f64 {
    if values.len() > 1 {
        0.5 * (values[1] - values[0]).abs()
    } else {
        0.5
    }
}

fn padded_range(values: &[f64]) -> std::ops::Range<f64> {
    let half = half_cell(values);
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (lo - half)..(hi + half)
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    axes: &SweepAxes,
    grid: &Grid,
    scale: &ColorScale,
    label: &str,
) -> Result<()> {
    let width = area.dim_in_pixel().0 as i32;
    let (plot_area, bar_area) = area.split_horizontally(width * 4 / 5);

    let xs = axes.log_dts();
    let ys = axes.log_one_minus_es();
    let (hx, hy) = (half_cell(&xs), half_cell(&ys));

    let mut chart = ChartBuilder::on(&plot_area)
        .caption(label, ("sans-serif", 16))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(padded_range(&xs), padded_range(&ys))
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("log10(dt/t_orb)")
        .y_desc("log10(1-e)")
        .draw()
        .map_err(plot_err)?;

    // grid[(j, i)] sits at (xs[i], ys[j])
    chart
        .draw_series((0..ys.len()).flat_map(|j| (0..xs.len()).map(move |i| (j, i))).map(|(j, i)| {
            Rectangle::new(
                [(xs[i] - hx, ys[j] - hy), (xs[i] + hx, ys[j] + hy)],
                scale.color(grid[(j, i)]).filled(),
            )
        }))
        .map_err(plot_err)?;

    draw_colorbar(&bar_area, scale)
}

/// Vertical colorbar on the normalized axis, labelled in data units
fn draw_colorbar(area: &DrawingArea<BitMapBackend<'_>, Shift>, scale: &ColorScale) -> Result<()> {
    let format_tick = |u: &f64| {
        let v = scale.value_at(*u);
        if scale.log { format!("{v:.0e}") } else { format!("{v:.2}") }
    };

    let mut bar = ChartBuilder::on(area)
        .margin_top(40)
        .margin_bottom(45)
        .margin_right(10)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..1.0, 0.0..1.0)
        .map_err(plot_err)?;

    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(5)
        .y_label_formatter(&format_tick)
        .draw()
        .map_err(plot_err)?;

    let du = 1.0 / COLORBAR_STEPS as f64;
    bar.draw_series((0..COLORBAR_STEPS).map(|k| {
        let u = k as f64 * du;
        Rectangle::new([(0.0, u), (1.0, u + du)], scale.cmap.at(u + 0.5 * du).filled())
    }))
    .map_err(plot_err)?;

    Ok(())
}

/// Hand the figure to the platform's default viewer
pub fn open_in_viewer(path: &Path) {
    let opener = if cfg!(target_os = "macos") { "open" } else { "xdg-open" };
    match Command::new(opener).arg(path).spawn() {
        Ok(_) => info!(path = %path.display(), "opened figure"),
        Err(e) => warn!(%e, "could not open figure with {opener}"),
    }
}
