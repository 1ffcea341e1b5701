use std::{error::Error, fs, ops::Range, path::Path};

use plotters::prelude::*;

use crate::{
    aggregate::AggregatedResult,
    error::{BenchError, Result},
};

const SIZE: (u32, u32) = (1000, 700);
const ORANGE: RGBColor = RGBColor(255, 165, 0);

struct Curve<'a> {
    title: &'a str,
    y_desc: &'a str,
    color: RGBColor,
}

/// Draws `RAT(len)` to `rat_plot` and `Time(len)` to `time_plot`.
#[allow(clippy::cast_precision_loss)]
pub fn render_plots(
    results: &[AggregatedResult],
    rat_plot: &Path,
    time_plot: &Path,
) -> Result<()> {
    if results.is_empty() {
        return Err(BenchError::Render("result table is empty".to_string()));
    }

    let mut rows = results.to_vec();
    rows.sort_by_key(|r| r.length);

    let rat: Vec<(f64, f64)> = rows.iter().map(|r| (r.length as f64, r.quality)).collect();
    let time: Vec<(f64, f64)> = rows
        .iter()
        .map(|r| (r.length as f64, r.mean_elapsed_time))
        .collect();

    render_curve(
        &rat,
        rat_plot,
        &Curve {
            title: "RAT(len)",
            y_desc: "RAT",
            color: BLUE,
        },
    )?;
    render_curve(
        &time,
        time_plot,
        &Curve {
            title: "Time(len)",
            y_desc: "Time",
            color: ORANGE,
        },
    )?;
    Ok(())
}

fn render_curve(points: &[(f64, f64)], out_path: &Path, curve: &Curve<'_>) -> Result<()> {
    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    // Text needs a system font; headless hosts still get the curve
    if let Err(e) = draw(points, out_path, curve, true) {
        log::warn!("{}: {e}, drawing without labels", out_path.display());
        draw(points, out_path, curve, false)
            .map_err(|e| BenchError::Render(format!("{}: {e}", out_path.display())))?;
    }
    log::info!("wrote {}", out_path.display());
    Ok(())
}

fn draw(
    points: &[(f64, f64)],
    out_path: &Path,
    curve: &Curve<'_>,
    labelled: bool,
) -> std::result::Result<(), Box<dyn Error>> {
    let x_range = padded_range(points.iter().map(|p| p.0));
    let y_range = padded_range(points.iter().map(|p| p.1));

    let root = BitMapBackend::new(out_path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut builder = ChartBuilder::on(&root);
    builder.margin(10);
    if labelled {
        builder
            .caption(curve.title, ("sans-serif", 22))
            .x_label_area_size(40)
            .y_label_area_size(60);
    }
    let mut chart = builder.build_cartesian_2d(x_range, y_range)?;

    if labelled {
        chart
            .configure_mesh()
            .x_desc("Length")
            .y_desc(curve.y_desc)
            .draw()?;
    }

    chart.draw_series(LineSeries::new(points.iter().copied(), &curve.color))?;
    chart.draw_series(
        points
            .iter()
            .map(|&p| Circle::new(p, 4, curve.color.filled())),
    )?;

    root.present()?;
    Ok(())
}

/// Data bounds widened by 5% on each side; degenerate or empty input gets a
/// unit-wide window.
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() {
        return -1.0..1.0;
    }
    let span = max - min;
    if span < 1e-9 {
        return (min - 1.0)..(max + 1.0);
    }
    let pad = span * 0.05;
    (min - pad)..(max + pad)
}
