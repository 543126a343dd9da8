use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use trackplot::{PlotStyle, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "trackplot", version)]
struct Cli {
    /// Input CSV of vehicle samples.
    #[arg(long, default_value = "data/data0.csv")]
    file: PathBuf,

    /// Directory the PNG frames are written into. Must already exist.
    #[arg(long, default_value = "res")]
    out_dir: PathBuf,

    /// Font file (TTF/OTF) used for all text. When omitted, well-known
    /// system font locations are probed.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Distinct-timestamp steps grouped into one frame.
    #[arg(long, default_value_t = 10)]
    window: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let font = match cli.font {
        Some(path) => path,
        None => trackplot::text::find_system_font()
            .context("no usable system font found; pass one with --font")?,
    };

    let style = PlotStyle {
        steps_per_frame: cli.window,
        ..PlotStyle::default()
    };
    let config = RunConfig {
        input: cli.file,
        out_dir: cli.out_dir,
        font,
        style,
    };
    trackplot::run(&config)?;
    Ok(())
}
