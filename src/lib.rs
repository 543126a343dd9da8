//! Trackplot renders vehicle trajectory logs into cumulative plot frames.
//!
//! A CSV of per-vehicle samples is turned into a sequence of PNG images, one
//! per window of distinct timestamps, each showing every trajectory recorded
//! up to that point.
//!
//! # Pipeline overview
//!
//! 1. **Load**: CSV rows become a [`dataset::Dataset`] with a derived,
//!    dataset-wide min-max normalized velocity metric.
//! 2. **Window**: the sorted distinct timestamps are cut into fixed-size
//!    cumulative [`window::FrameWindows`].
//! 3. **Scene**: each window is compiled into a pure, deterministic
//!    [`scene::FrameScene`] display list in pixel coordinates.
//! 4. **Render**: the display list is rasterized on the CPU and written out
//!    as a transparent-background PNG.
//!
//! Evaluation through scene building is pure and IO-free; file reads happen
//! at load time and file writes in [`pipeline::run`].
#![forbid(unsafe_code)]

pub mod colormap;
pub mod dataset;
pub mod error;
pub mod metric;
pub mod pipeline;
pub mod render_cpu;
pub mod scene;
pub mod style;
pub mod text;
pub mod window;

pub use dataset::{Dataset, Sample};
pub use error::{TrackplotError, TrackplotResult};
pub use metric::{SampleMetric, SquaredSpeed};
pub use pipeline::{RunConfig, run};
pub use style::PlotStyle;
pub use window::{FrameWindow, FrameWindows};
