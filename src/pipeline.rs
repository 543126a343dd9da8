use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{TrackplotError, TrackplotResult};
use crate::metric::SquaredSpeed;
use crate::render_cpu::{CpuRenderer, FrameRGBA};
use crate::scene::build_frame_scene;
use crate::style::PlotStyle;
use crate::text::TextEngine;
use crate::window::FrameWindows;

/// Everything one rendering run needs.
pub struct RunConfig {
    /// Input CSV path.
    pub input: PathBuf,
    /// Directory the PNG frames are written into. Must already exist.
    pub out_dir: PathBuf,
    /// Font file used for all text.
    pub font: PathBuf,
    /// Styling and layout parameters.
    pub style: PlotStyle,
}

/// Stem of the input file, used to name output frames.
///
/// `data/data0.csv` maps to frames `data0_t_1.png`, `data0_t_2.png`, ...
pub fn input_stem(input: &Path) -> TrackplotResult<String> {
    input
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            TrackplotError::validation(format!(
                "cannot derive an output stem from '{}'",
                input.display()
            ))
        })
}

/// Render the whole run: one cumulative PNG per frame window.
///
/// Prints one `{name}.png is saved` line per frame on stdout, in frame order.
#[tracing::instrument(skip(config), fields(input = %config.input.display()))]
pub fn run(config: &RunConfig) -> TrackplotResult<()> {
    let stem = input_stem(&config.input)?;
    if !config.out_dir.is_dir() {
        return Err(TrackplotError::validation(format!(
            "output directory '{}' does not exist",
            config.out_dir.display()
        )));
    }

    let ds = Dataset::load_csv(&config.input, &SquaredSpeed)?;
    info!(rows = ds.len(), "dataset loaded");

    let windows = FrameWindows::new(ds.distinct_times(), config.style.steps_per_frame)?;
    info!(frames = windows.len(), "frame windows computed");

    let engine = TextEngine::from_font_file(&config.font)?;
    let mut renderer = CpuRenderer::new(engine);

    for window in windows.iter() {
        let scene = build_frame_scene(&ds, window, &config.style)?;
        let mut frame = renderer.render(&scene)?;
        frame.unpremultiply_in_place();

        let name = format!("{stem}_t_{}.png", window.index);
        let path = config.out_dir.join(&name);
        save_png(&path, &frame)?;
        debug!(frame = window.index, path = %path.display(), "frame written");
        println!("{name} is saved");
    }

    Ok(())
}

/// Write a rendered frame as a PNG with alpha preserved.
///
/// PNG stores straight alpha, so the frame must be unpremultiplied first.
fn save_png(path: &Path, frame: &FrameRGBA) -> TrackplotResult<()> {
    if frame.premultiplied {
        return Err(TrackplotError::render(
            "refusing to encode premultiplied pixels as a straight-alpha PNG",
        ));
    }
    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| TrackplotError::render(format!("failed to write '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_strips_directories_and_extension() {
        assert_eq!(input_stem(Path::new("data/data0.csv")).unwrap(), "data0");
        assert_eq!(input_stem(Path::new("trace.csv")).unwrap(), "trace");
        assert_eq!(input_stem(Path::new("/a/b/run7")).unwrap(), "run7");
    }

    #[test]
    fn stem_of_a_bare_directory_is_an_error() {
        assert!(input_stem(Path::new("/")).is_err());
    }

    #[test]
    fn save_png_refuses_premultiplied_frames() {
        let frame = FrameRGBA {
            width: 1,
            height: 1,
            data: vec![0; 4],
            premultiplied: true,
        };
        let err = save_png(Path::new("target/never-written.png"), &frame).unwrap_err();
        assert!(matches!(err, TrackplotError::Render(_)));
        assert!(!Path::new("target/never-written.png").exists());
    }

    #[test]
    fn missing_out_dir_is_rejected_before_any_rendering() {
        let config = RunConfig {
            input: PathBuf::from("data/data0.csv"),
            out_dir: PathBuf::from("target/definitely-not-created-by-anything"),
            font: PathBuf::from("nonexistent.ttf"),
            style: PlotStyle::default(),
        };
        let err = run(&config).unwrap_err();
        assert!(matches!(err, TrackplotError::Validation(_)));
    }
}
