use anyhow::{anyhow, bail, Context, Result};
use image::ImageEncoder;
use plotters::coord::{CoordTranslate, Shift};
use plotters::element::EmptyElement;
use plotters::prelude::*;
use std::fmt::Debug;

use crate::ir::{BarSeries, ChartKind, ChartOutcome, DerivedView, Sample, ViewData};

const BAR_ALPHA: f64 = 0.8;
const GROUP_WIDTH: f64 = 0.8;
/// Largest accepted canvas side, in pixels
pub const MAX_DIMENSION: u32 = 8192;

fn draw_err<E: Debug>(e: E) -> anyhow::Error {
    anyhow!("Drawing failed: {:?}", e)
}

/// Fixed-size drawing surface for one chart
pub struct Canvas {
    width: u32,
    height: u32,
    bins: usize,
}

impl Canvas {
    pub fn new(width: u32, height: u32, bins: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("Canvas size must be non-zero (got {}x{})", width, height);
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            bail!(
                "Canvas size {}x{} exceeds the {} pixel limit per side",
                width,
                height,
                MAX_DIMENSION
            );
        }
        if bins == 0 {
            bail!("Histogram needs at least one bin");
        }
        Ok(Self { width, height, bins })
    }

    /// Draw and encode as PNG
    pub fn render_png(&self, outcome: &ChartOutcome) -> Result<Vec<u8>> {
        let len = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(3))
            .ok_or_else(|| anyhow!("Canvas {}x{} is too large", self.width, self.height))?;
        let mut buffer = vec![0u8; len];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (self.width, self.height))
                .into_drawing_area();
            self.draw(&root, outcome)?;
            root.present().map_err(draw_err)?;
        }

        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(&buffer, self.width, self.height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }

    /// Draw as an SVG document
    pub fn render_svg(&self, outcome: &ChartOutcome) -> Result<Vec<u8>> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height))
                .into_drawing_area();
            self.draw(&root, outcome)?;
            root.present().map_err(draw_err)?;
        }
        Ok(svg.into_bytes())
    }

    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        outcome: &ChartOutcome,
    ) -> Result<()> {
        root.fill(&WHITE).map_err(draw_err)?;

        // NoData clears the chart
        let Some(view) = outcome.view() else {
            return Ok(());
        };

        match (&view.kind, &view.data) {
            (ChartKind::GroupedBar, ViewData::Bars(series)) => draw_grouped_bars(root, view, series),
            (ChartKind::Histogram, ViewData::Samples(samples)) => {
                draw_histogram(root, view, samples, self.bins)
            }
            (ChartKind::Boxplot, ViewData::Samples(samples)) => draw_boxplot(root, view, samples),
            (kind, _) => bail!("Chart kind {:?} does not match its data", kind),
        }
    }
}

/// Parse a colour name or #RRGGBB / #RGB hex string
pub fn parse_color(color_str: &str) -> RGBColor {
    let color_str = color_str.trim();
    if let Some(hex) = color_str.strip_prefix('#') {
        if let Some(c) = parse_hex_color(hex) {
            return c;
        }
    }

    match color_str.to_lowercase().as_str() {
        "red" => RGBColor(255, 0, 0),
        "green" => RGBColor(0, 128, 0),
        "blue" => RGBColor(0, 0, 255),
        "black" => BLACK,
        "white" => WHITE,
        "orange" => RGBColor(255, 165, 0),
        "purple" => RGBColor(128, 0, 128),
        "gray" | "grey" => RGBColor(128, 128, 128),
        _ => BLUE, // default
    }
}

fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(RGBColor(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(RGBColor(r, g, b))
        }
        _ => None,
    }
}

/// Pad a data range by 5%, widening degenerate ranges to +/-1
fn pad_range(min: f64, max: f64) -> (f64, f64) {
    if min == max {
        (min - 1.0, max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding, max + padding)
    }
}

/// Categories of all series, in order of first appearance
pub fn category_axis(series: &[BarSeries]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for s in series {
        for c in &s.categories {
            if !categories.contains(c) {
                categories.push(c.clone());
            }
        }
    }
    categories
}

fn category_label(categories: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    categories.get(idx as usize).cloned().unwrap_or_default()
}

fn draw_grouped_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    view: &DerivedView,
    series: &[BarSeries],
) -> Result<()> {
    let categories = category_axis(series);
    let num_categories = categories.len().max(1);
    let num_series = series.len().max(1);

    let y_top = series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .fold(0.0f64, f64::max);
    let y_top = if y_top <= 0.0 { 1.0 } else { y_top * 1.05 };

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(&view.title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5..(num_categories as f64 - 0.5), 0.0..y_top)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(num_categories + 1)
        .x_label_formatter(&|x| category_label(&categories, *x))
        .x_desc(view.x_label.as_str())
        .y_desc(view.y_label.as_str())
        .draw()
        .map_err(draw_err)?;

    draw_legend_header(&mut chart, view.legend_title.as_deref())?;

    // Side-by-side bars; a category missing from a series leaves a gap
    let bar_width = GROUP_WIDTH / num_series as f64;
    for (series_idx, s) in series.iter().enumerate() {
        let color = parse_color(&s.color);
        let x_offset = (series_idx as f64 - (num_series as f64 - 1.0) / 2.0) * bar_width;

        let rects: Vec<[(f64, f64); 2]> = s
            .categories
            .iter()
            .zip(&s.values)
            .filter_map(|(cat, &y)| {
                let idx = categories.iter().position(|c| c == cat)?;
                let x_center = idx as f64 + x_offset;
                Some([
                    (x_center - bar_width / 2.0, 0.0),
                    (x_center + bar_width / 2.0, y),
                ])
            })
            .collect();

        chart
            .draw_series(
                rects
                    .iter()
                    .map(|r| Rectangle::new(*r, color.mix(BAR_ALPHA).filled())),
            )
            .map_err(draw_err)?
            .label(s.name.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));

        chart
            .draw_series(
                rects
                    .iter()
                    .map(|r| Rectangle::new(*r, BLACK.stroke_width(1))),
            )
            .map_err(draw_err)?;
    }

    draw_legend(&mut chart)
}

/// Lower edge and width of equal-width bins spanning the values
pub fn bin_edges(values: &[f64], bins: usize) -> (f64, f64) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    let width = if range == 0.0 { 1.0 } else { range / bins as f64 };
    (min, width)
}

fn bin_index(v: f64, min: f64, width: f64, bins: usize) -> usize {
    (((v - min) / width).floor() as usize).min(bins - 1)
}

fn draw_histogram<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    view: &DerivedView,
    samples: &[Sample],
    bins: usize,
) -> Result<()> {
    let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
    let (min, width) = if values.is_empty() {
        (0.0, 100.0 / bins as f64)
    } else {
        bin_edges(&values, bins)
    };

    // counts[group][bin], groups in legend order
    let mut counts = vec![vec![0usize; bins]; view.colors.len()];
    for s in samples {
        if let Some(g) = view.colors.iter().position(|(k, _)| *k == s.gender) {
            counts[g][bin_index(s.value, min, width, bins)] += 1;
        }
    }

    let tallest = (0..bins)
        .map(|b| counts.iter().map(|c| c[b]).sum::<usize>())
        .max()
        .unwrap_or(0)
        .max(1);

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(&view.title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(min..(min + width * bins as f64), 0.0..(tallest as f64 * 1.05))
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc(view.x_label.as_str())
        .y_desc(view.y_label.as_str())
        .draw()
        .map_err(draw_err)?;

    draw_legend_header(&mut chart, view.legend_title.as_deref())?;

    // Stack groups bin by bin
    let mut base = vec![0usize; bins];
    for (g, (key, color)) in view.colors.iter().enumerate() {
        let color = parse_color(color);
        let rects: Vec<[(f64, f64); 2]> = (0..bins)
            .filter(|&b| counts[g][b] > 0)
            .map(|b| {
                let x0 = min + b as f64 * width;
                let bottom = base[b] as f64;
                [(x0, bottom), (x0 + width, bottom + counts[g][b] as f64)]
            })
            .collect();
        for b in 0..bins {
            base[b] += counts[g][b];
        }

        chart
            .draw_series(
                rects
                    .iter()
                    .map(|r| Rectangle::new(*r, color.mix(BAR_ALPHA).filled())),
            )
            .map_err(draw_err)?
            .label(key.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));

        chart
            .draw_series(
                rects
                    .iter()
                    .map(|r| Rectangle::new(*r, BLACK.stroke_width(1))),
            )
            .map_err(draw_err)?;
    }

    draw_legend(&mut chart)
}

/// Linear-interpolated percentile of sorted data
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted_data[0];
    }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
}

/// Quartiles plus whiskers at the most extreme values within 1.5 IQR
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    if values.is_empty() {
        return None;
    }
    let mut ys = values.to_vec();
    ys.sort_by(|a, b| a.total_cmp(b));

    let q1 = percentile(&ys, 0.25);
    let median = percentile(&ys, 0.50);
    let q3 = percentile(&ys, 0.75);
    let iqr = q3 - q1;
    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    let lower_whisker = ys.iter().copied().find(|&v| v >= lower_fence).unwrap_or(q1);
    let upper_whisker = ys.iter().rev().copied().find(|&v| v <= upper_fence).unwrap_or(q3);

    Some(BoxStats {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
    })
}

fn draw_boxplot<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    view: &DerivedView,
    samples: &[Sample],
) -> Result<()> {
    let mut categories: Vec<String> = Vec::new();
    for s in samples {
        let c = s.test_prep.to_string();
        if !categories.contains(&c) {
            categories.push(c);
        }
    }
    let num_categories = categories.len().max(1);
    let num_groups = view.colors.len().max(1);

    let (y_min, y_max) = if samples.is_empty() {
        (0.0, 100.0)
    } else {
        let lo = samples.iter().map(|s| s.value).fold(f64::INFINITY, f64::min);
        let hi = samples.iter().map(|s| s.value).fold(f64::NEG_INFINITY, f64::max);
        pad_range(lo, hi)
    };

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(&view.title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5..(num_categories as f64 - 0.5), y_min..y_max)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(num_categories + 1)
        .x_label_formatter(&|x| category_label(&categories, *x))
        .x_desc(view.x_label.as_str())
        .y_desc(view.y_label.as_str())
        .draw()
        .map_err(draw_err)?;

    draw_legend_header(&mut chart, view.legend_title.as_deref())?;

    let box_width = GROUP_WIDTH / num_groups as f64;
    let half = box_width / 2.0;

    for (g, (key, color)) in view.colors.iter().enumerate() {
        let color = parse_color(color);
        let x_offset = (g as f64 - (num_groups as f64 - 1.0) / 2.0) * box_width;
        let mut points: Vec<(f64, f64)> = Vec::new();

        for (c, category) in categories.iter().enumerate() {
            let values: Vec<f64> = samples
                .iter()
                .filter(|s| s.gender == *key && s.test_prep.as_str() == category)
                .map(|s| s.value)
                .collect();
            let Some(stats) = box_stats(&values) else {
                continue;
            };
            let cx = c as f64 + x_offset;

            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(cx - half * 0.6, stats.q3), (cx + half * 0.6, stats.q1)],
                    color.mix(0.4).filled(),
                )))
                .map_err(draw_err)?;
            chart
                .draw_series(vec![
                    PathElement::new(
                        vec![(cx - half * 0.6, stats.median), (cx + half * 0.6, stats.median)],
                        color.stroke_width(2),
                    ),
                    PathElement::new(vec![(cx, stats.lower_whisker), (cx, stats.q1)], color.stroke_width(1)),
                    PathElement::new(vec![(cx, stats.q3), (cx, stats.upper_whisker)], color.stroke_width(1)),
                ])
                .map_err(draw_err)?;

            // Every sample is shown beside its box, spread deterministically
            for (i, v) in values.iter().enumerate() {
                let jitter = ((i * 37) % 11) as f64 / 10.0 - 0.5;
                points.push((cx - half * 0.8 + jitter * half * 0.3, *v));
            }
        }

        chart
            .draw_series(points.iter().map(|&p| Circle::new(p, 2, color.mix(0.7).filled())))
            .map_err(draw_err)?
            .label(key.clone())
            .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));
    }

    draw_legend(&mut chart)
}

/// Title row for the legend: an empty series whose only content is its label
fn draw_legend_header<'a, DB: DrawingBackend + 'a, CT: CoordTranslate<From = (f64, f64)>>(
    chart: &mut ChartContext<'a, DB, CT>,
    title: Option<&str>,
) -> Result<()> {
    let Some(title) = title else {
        return Ok(());
    };
    chart
        .draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())
        .map_err(draw_err)?
        .label(title)
        .legend(|(x, y)| EmptyElement::at((x, y)));
    Ok(())
}

fn draw_legend<'a, DB: DrawingBackend + 'a, CT: CoordTranslate>(
    chart: &mut ChartContext<'a, DB, CT>,
) -> Result<()> {
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)
}
