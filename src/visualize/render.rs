//! Renders a [Projection][projection] as scatter plots.
//!
//! Every class plot shows all label anchors as annotated markers, the data points of one
//! class in red and the anchor of that class in green.
//!
//! [projection]: ../struct.Projection.html
use std::fs;
use std::iter;
use std::ops::Range;
use std::path::{Path, PathBuf};
use plotters::prelude::*;
use error::Error;
use super::Projection;

const PLOT_SIZE: (u32, u32) = (1024, 1024);
const MARGIN_RATIO: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
/// Everything needed to draw one plot.
pub struct ClassPlot {
    /// Caption of the plot.
    pub title: String,
    /// All label anchors with their names.
    pub anchors: Vec<(String, [f64; 2])>,
    /// The highlighted data points.
    pub data: Vec<[f64; 2]>,
    /// The highlighted anchor.
    pub target: Option<[f64; 2]>,
}

impl ClassPlot {
    /// The ranges of both axes, covering every point with a small margin.
    pub fn bounds(&self) -> (Range<f64>, Range<f64>) {
        let positions = self.anchors.iter().map(|&(_, position)| position)
            .chain(self.data.iter().cloned())
            .collect::<Vec<[f64; 2]>>();
        (axis_range(&positions, 0), axis_range(&positions, 1))
    }
}

fn axis_range(positions: &[[f64; 2]], axis: usize) -> Range<f64> {
    if positions.is_empty() {
        return -1f64..1f64;
    }
    let min = positions.iter().fold(::std::f64::INFINITY, |min, p| min.min(p[axis]));
    let max = positions.iter().fold(::std::f64::NEG_INFINITY, |max, p| max.max(p[axis]));
    let margin = ((max - min) * MARGIN_RATIO).max(1f64);
    (min - margin)..(max + margin)
}

/// Prepares the plot of a single label.
pub fn class_plot(projection: &Projection, label: &str) -> ClassPlot {
    ClassPlot {
        title: label.to_owned(),
        anchors: anchors(projection),
        data: projection.data_of(label),
        target: projection.anchor_of(label),
    }
}

/// Prepares the plot of the label anchors alone.
pub fn overview_plot(projection: &Projection) -> ClassPlot {
    ClassPlot {
        title: "labels".to_owned(),
        anchors: anchors(projection),
        data: vec![],
        target: None,
    }
}

fn anchors(projection: &Projection) -> Vec<(String, [f64; 2])> {
    projection.labels.iter().map(|point| (point.tag.label().to_owned(), point.position)).collect()
}

/// The file a class plot is written to.
pub fn class_plot_path(folder: &Path, label: &str) -> PathBuf {
    folder.join(format!("{}.png", label.replace(|c: char| c == '/' || c == '\\', "_")))
}

/// Draws the plot of `label` into `<folder>/<label>.png`.
pub fn render_class(projection: &Projection, label: &str, folder: &Path) -> Result<PathBuf, Error> {
    fs::create_dir_all(folder)?;
    let path = class_plot_path(folder, label);
    draw(&class_plot(projection, label), &path)?;
    debug!("Wrote {:?}", path);
    Ok(path)
}

/// Draws the annotated label anchors into `path`.
pub fn render_overview(projection: &Projection, path: &Path) -> Result<(), Error> {
    if let Some(folder) = path.parent() {
        fs::create_dir_all(folder)?;
    }
    draw(&overview_plot(projection), path)
}

/// Draws one plot for every label that has data points.
pub fn render_all(projection: &Projection, folder: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut written = Vec::new();
    for label in projection.data_labels() {
        written.push(render_class(projection, label, folder)?);
    }
    Ok(written)
}

fn draw(plot: &ClassPlot, path: &Path) -> Result<(), Error> {
    let root = BitMapBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| Error::Render(format!("backend error: {}", e)))?;

    {
        let (x_range, y_range) = plot.bounds();
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(&plot.title, ("sans-serif", 24.0))
            .set_label_area_size(LabelAreaPosition::Left, 40)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(x_range, y_range)
            .map_err(|e| Error::Render(format!("chart build error: {}", e)))?;

        chart.configure_mesh()
            .disable_mesh()
            .draw()
            .map_err(|e| Error::Render(format!("mesh error: {}", e)))?;

        chart.draw_series(plot.data.iter().map(|p| Circle::new((p[0], p[1]), 3, RED.filled())))
            .map_err(|e| Error::Render(format!("draw error: {}", e)))?;

        chart.draw_series(plot.anchors.iter().map(|&(ref name, p)| {
                EmptyElement::at((p[0], p[1]))
                    + Circle::new((0, 0), 3, BLACK.filled())
                    + Text::new(name.clone(), (5, -5), ("sans-serif", 12).into_font())
            }))
            .map_err(|e| Error::Render(format!("draw error: {}", e)))?;

        if let Some(target) = plot.target {
            chart.draw_series(iter::once(Circle::new((target[0], target[1]), 6, GREEN.filled())))
                .map_err(|e| Error::Render(format!("draw error: {}", e)))?;
        }
    }

    root.present().map_err(|e| Error::Render(format!("render error: {}", e)))
}
