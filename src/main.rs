use anyhow::{bail, Context, Result};
use clap::Parser;
use gradeboard::dashboard::{ChartId, ChartUpdate, Dashboard};
use gradeboard::data::Dataset;
use gradeboard::selection::Selection;
use gradeboard::{parser, resolve, runtime, RenderOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "gradeboard")]
#[command(about = "Render student exam dashboard charts from a CSV dataset", long_about = None)]
struct Args {
    /// Dataset file (.csv or .json); `-` reads CSV from stdin
    data: PathBuf,

    /// Render only this chart: education-lunch, race-subject, histogram or boxplot
    #[arg(long)]
    chart: Option<ChartId>,

    /// Control changes to apply, e.g. 'metric(reading) | prep(completed)'
    #[arg(long)]
    events: Option<String>,

    /// JSON file with the starting selection (defaults to the dashboard's initial state)
    #[arg(long)]
    selection: Option<PathBuf>,

    /// Start from every option selected instead of the initial state
    #[arg(long, conflicts_with = "selection")]
    select_all: bool,

    /// JSON file with render options (width, height, type, bins)
    #[arg(long)]
    options: Option<PathBuf>,

    /// Directory to write chart images into
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Print the derived chart data as JSON instead of rendering images
    #[arg(long)]
    json: bool,

    /// Print the options each control offers for this dataset as JSON and exit
    #[arg(long)]
    controls: bool,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let dataset = Dataset::load(&args.data).context("Failed to load dataset")?;

    let selection = match (&args.selection, args.select_all) {
        (Some(path), _) => read_json::<Selection>(path)?,
        (None, true) => Selection::everything(&dataset),
        (None, false) => Selection::default(),
    };
    let options = match &args.options {
        Some(path) => read_json::<RenderOptions>(path)?,
        None => RenderOptions::default(),
    };

    let mut dashboard = Dashboard::new(&dataset, selection);

    if args.controls {
        let json = serde_json::to_string_pretty(&dashboard.controls())
            .context("Failed to serialize controls")?;
        println!("{}", json);
        return Ok(());
    }

    let recomputed = match &args.events {
        Some(script) => {
            let script = parser::parse_script(script)?;
            let events = resolve::resolve_events(&script, &dataset);
            log::debug!("applying {} events", events.len());
            dashboard.apply_all(events)
        }
        None => Vec::new(),
    };

    let charts = match args.chart {
        Some(chart) => vec![chart],
        None => ChartId::ALL.to_vec(),
    };
    let updates: Vec<ChartUpdate> = dashboard.outcomes_for(&charts, recomputed);

    if args.json {
        let json = serde_json::to_string_pretty(&updates).context("Failed to serialize charts")?;
        println!("{}", json);
        return Ok(());
    }

    if let Some(dir) = &args.out_dir {
        runtime::write_updates(&updates, &options, dir)?;
        return Ok(());
    }

    let [update] = updates.as_slice() else {
        bail!("--out-dir is required when rendering more than one chart");
    };

    let bytes = runtime::render_outcome(&update.outcome, &options)
        .with_context(|| format!("Failed to render {}", update.chart))?;

    // Write image to stdout
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(&bytes)
        .context("Failed to write image to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}
