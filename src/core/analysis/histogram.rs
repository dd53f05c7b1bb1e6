use super::describe::sample_std;
use crate::core::data::Table;
use crate::error::{AnalysisError, Result};
use plotters::prelude::*;
use std::f64::consts::PI;
use plotters::style::FontStyle;
use std::path::{self, Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

pub const DEFAULT_BINS: usize = 10;

const IMAGE_SIZE: (u32, u32) = (800, 600);
const KDE_GRID_POINTS: usize = 200;
const BAR_COLOR: RGBColor = RGBColor(31, 119, 180);
const BAR_OPACITY: f64 = 0.6;
const FONT_FAMILY: &str = "sans-serif";

// Bundled so rendering needs no system font libraries
static FONT: &[u8] = include_bytes!("../../../assets/fonts/DejaVuSans.ttf");
static FONT_REGISTERED: OnceLock<bool> = OnceLock::new();

/// Equal-width bins whose bar areas sum to one.
///
/// `compute` expects at least one finite value and at least one bin.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityHistogram {
    pub edges: Vec<f64>,
    pub densities: Vec<f64>,
}

impl DensityHistogram {
    pub fn compute(values: &[f64], bins: usize) -> Self {
        let (mut lo, mut hi) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

        let mut counts = vec![0usize; bins];
        for &v in values {
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        let total = values.len() as f64;
        let densities = counts
            .into_iter()
            .map(|count| count as f64 / (total * width))
            .collect();

        Self { edges, densities }
    }

    /// `(left, right, height)` for every bar.
    pub fn bars(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.densities)
            .map(|(edge, &height)| (edge[0], edge[1], height))
    }

    pub fn range(&self) -> (f64, f64) {
        (self.edges[0], self.edges[self.edges.len() - 1])
    }
}

/// Gaussian kernel density estimate with Scott's bandwidth, sampled over the
/// data range. `None` when the bandwidth would be zero.
pub fn gaussian_kde(values: &[f64], grid_points: usize) -> Option<Vec<(f64, f64)>> {
    let std = sample_std(values)?;
    let n = values.len() as f64;
    let bandwidth = std * n.powf(-0.2);
    if bandwidth <= 0.0 || grid_points < 2 {
        return None;
    }

    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let step = (hi - lo) / (grid_points - 1) as f64;
    let norm = 1.0 / (n * bandwidth * (2.0 * PI).sqrt());

    let curve = (0..grid_points)
        .map(|i| {
            let x = lo + step * i as f64;
            let density: f64 = values
                .iter()
                .map(|&v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum();
            (x, density * norm)
        })
        .collect();
    Some(curve)
}

/// The image file name embeds the column name, so it must stay one path component.
fn check_file_name(column: &str) -> Result<()> {
    if column.chars().any(|c| c == '/' || path::is_separator(c)) {
        return Err(AnalysisError::invalid_argument(format!(
            "Column '{}' contains a path separator and cannot name an image file.",
            column
        )));
    }
    Ok(())
}

/// Where the image for `column` is written.
pub fn output_path(column: &str, output_dir: Option<&Path>) -> PathBuf {
    let file_name = format!("{}_density_hist.png", column);
    match output_dir {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Render a density histogram of `column` and return the written path.
///
/// All argument checks run before anything touches the filesystem.
pub fn plot_histogram(
    csv_path: impl AsRef<Path>,
    column: &str,
    bins: usize,
    output_dir: Option<&Path>,
) -> Result<PathBuf> {
    let table = Table::from_csv_path(csv_path)?;
    let mut values = table.column(column)?.numeric_values().ok_or_else(|| {
        AnalysisError::invalid_argument(format!(
            "Column '{}' is not numeric and cannot be plotted as a histogram.",
            column
        ))
    })?;
    if bins == 0 {
        return Err(AnalysisError::invalid_argument("bins must be at least 1."));
    }
    check_file_name(column)?;
    values.retain(|v| v.is_finite());
    if values.is_empty() {
        return Err(AnalysisError::invalid_argument(format!(
            "Column '{}' has no values to plot.",
            column
        )));
    }

    let histogram = DensityHistogram::compute(&values, bins);
    let curve = gaussian_kde(&values, KDE_GRID_POINTS);
    debug!(
        "Histogram for '{}': {} values, {} bins, kde={}",
        column,
        values.len(),
        bins,
        curve.is_some()
    );

    let path = output_path(column, output_dir);
    render(&path, column, &histogram, curve.as_deref())?;
    info!("Wrote density histogram to {}", path.display());
    Ok(path)
}

fn render(
    path: &Path,
    column: &str,
    histogram: &DensityHistogram,
    curve: Option<&[(f64, f64)]>,
) -> Result<()> {
    register_font()?;

    let root = BitMapBackend::new(path, IMAGE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let (x_lo, x_hi) = histogram.range();
    let peak = histogram
        .densities
        .iter()
        .copied()
        .chain(curve.into_iter().flatten().map(|&(_, y)| y))
        .fold(0.0, f64::max);
    let y_hi = if peak > 0.0 { peak * 1.1 } else { 1.0 };

    let mut chart = ChartBuilder::on(&root)
        .margin(30)
        .caption(format!("Density Histogram of {}", column), (FONT_FAMILY, 28))
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_lo..x_hi, 0.0..y_hi)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(column)
        .y_desc("Density")
        .axis_desc_style((FONT_FAMILY, 20))
        .label_style((FONT_FAMILY, 14))
        .draw()
        .map_err(plot_error)?;

    chart
        .draw_series(histogram.bars().map(|(left, right, height)| {
            Rectangle::new([(left, 0.0), (right, height)], BAR_COLOR.mix(BAR_OPACITY).filled())
        }))
        .map_err(plot_error)?;
    chart
        .draw_series(histogram.bars().map(|(left, right, height)| {
            Rectangle::new([(left, 0.0), (right, height)], BLACK.stroke_width(1))
        }))
        .map_err(plot_error)?;

    if let Some(curve) = curve {
        chart
            .draw_series(LineSeries::new(curve.iter().copied(), BAR_COLOR.stroke_width(2)))
            .map_err(plot_error)?;
    }

    root.present().map_err(plot_error)?;
    Ok(())
}

fn register_font() -> Result<()> {
    let registered = *FONT_REGISTERED
        .get_or_init(|| plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, FONT).is_ok());
    if registered {
        Ok(())
    } else {
        Err(AnalysisError::Plot("bundled font could not be loaded".to_string()))
    }
}

fn plot_error<E: std::fmt::Display>(err: E) -> AnalysisError {
    AnalysisError::Plot(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(histogram: &DensityHistogram) -> f64 {
        histogram
            .bars()
            .map(|(left, right, height)| (right - left) * height)
            .sum()
    }

    #[test]
    fn test_density_integrates_to_one() {
        let values: Vec<f64> = (0..37).map(|i| (i as f64 * 1.7).sin() * 10.0).collect();
        let histogram = DensityHistogram::compute(&values, 7);
        assert_eq!(histogram.edges.len(), 8);
        assert!((area(&histogram) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_value_lands_in_last_bin() {
        let histogram = DensityHistogram::compute(&[0.0, 1.0, 2.0, 3.0], 3);
        let width = 1.0;
        let counts: Vec<f64> = histogram.densities.iter().map(|d| d * 4.0 * width).collect();
        assert_eq!(counts, vec![1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_constant_values_widen_range() {
        let histogram = DensityHistogram::compute(&[5.0, 5.0, 5.0], 10);
        assert_eq!(histogram.range(), (4.5, 5.5));
        assert!((area(&histogram) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_kde_is_positive_and_spans_data() {
        let values = [1.0, 2.0, 2.5, 3.0, 7.0];
        let curve = gaussian_kde(&values, 50).unwrap();
        assert_eq!(curve.len(), 50);
        assert_eq!(curve[0].0, 1.0);
        assert!((curve[49].0 - 7.0).abs() < 1e-12);
        assert!(curve.iter().all(|&(_, y)| y > 0.0));
    }

    #[test]
    fn test_kde_skipped_without_spread() {
        assert!(gaussian_kde(&[4.0, 4.0, 4.0], 50).is_none());
        assert!(gaussian_kde(&[4.0], 50).is_none());
    }

    #[test]
    fn test_file_name_must_be_one_component() {
        assert!(check_file_name("age").is_ok());
        assert!(check_file_name("..").is_ok());
        for column in ["a/b", "../x", "/abs"] {
            assert!(check_file_name(column).unwrap_err().is_invalid_argument(), "{}", column);
        }
    }

    #[test]
    fn test_bundled_font_registers() {
        assert!(register_font().is_ok());
    }

    #[test]
    fn test_output_path() {
        assert_eq!(output_path("age", None), PathBuf::from("age_density_hist.png"));
        assert_eq!(
            output_path("age", Some(Path::new("/tmp/out"))),
            PathBuf::from("/tmp/out/age_density_hist.png")
        );
    }
}
