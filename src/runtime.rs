// Runtime executor: evaluate charts and hand them to the renderer

use crate::dashboard::{ChartId, ChartUpdate};
use crate::graph::Canvas;
use crate::ir::ChartOutcome;
use crate::{OutputFormat, RenderOptions};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Render one outcome to image bytes in the configured format
pub fn render_outcome(outcome: &ChartOutcome, options: &RenderOptions) -> Result<Vec<u8>> {
    let canvas = Canvas::new(options.width, options.height, options.bins)?;
    match options.format {
        OutputFormat::Png => canvas.render_png(outcome),
        OutputFormat::Svg => canvas.render_svg(outcome),
    }
}

/// File name a chart is written under, e.g. `histogram.png`
pub fn output_file_name(chart: ChartId, format: OutputFormat) -> String {
    format!("{}.{}", chart.name(), format.extension())
}

/// Render every update into `out_dir`, returning the written paths
pub fn write_updates(
    updates: &[ChartUpdate],
    options: &RenderOptions,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(updates.len());
    for update in updates {
        let bytes = render_outcome(&update.outcome, options)
            .with_context(|| format!("Failed to render {}", update.chart))?;
        let path = out_dir.join(output_file_name(update.chart, options.format));
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        if update.outcome.is_no_data() {
            log::info!("{}: no data for current selection, wrote empty chart", update.chart);
        } else {
            log::info!("{}: wrote {}", update.chart, path.display());
        }
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name(ChartId::ScoreHistogram, OutputFormat::Png), "histogram.png");
        assert_eq!(output_file_name(ChartId::RaceSubject, OutputFormat::Svg), "race-subject.svg");
    }

    #[test]
    fn test_render_outcome_svg_no_data() {
        let options = RenderOptions {
            width: 50,
            height: 40,
            format: OutputFormat::Svg,
            bins: 10,
        };
        let bytes = render_outcome(&ChartOutcome::NoData, &options).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("<svg"));
    }

    #[test]
    fn test_render_outcome_rejects_zero_bins() {
        let options = RenderOptions {
            bins: 0,
            ..RenderOptions::default()
        };
        assert!(render_outcome(&ChartOutcome::NoData, &options).is_err());
    }

    #[test]
    fn test_render_outcome_huge_size_is_error() {
        let options = RenderOptions {
            width: 40_000,
            height: 40_000,
            ..RenderOptions::default()
        };
        let err = render_outcome(&ChartOutcome::NoData, &options).unwrap_err();
        assert!(err.to_string().contains("pixel limit"));
    }

    #[test]
    fn test_write_updates_creates_files() {
        let dir = std::env::temp_dir().join(format!("gradeboard-runtime-{}", std::process::id()));
        let updates = vec![ChartUpdate {
            chart: ChartId::PrepBoxplot,
            outcome: ChartOutcome::NoData,
        }];
        let options = RenderOptions {
            width: 20,
            height: 20,
            ..RenderOptions::default()
        };
        let written = write_updates(&updates, &options, &dir).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("boxplot.png"));
        assert!(written[0].exists());
        std::fs::remove_dir_all(&dir).ok();
    }
}
