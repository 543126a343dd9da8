use crate::colormap::{DivergingMap, RD_YL_GN, Rgba8};

/// All styling and layout parameters of the rendered figures.
///
/// The defaults reproduce the tool's reference output: a 20 × 15 inch canvas
/// at 300 DPI, 25 pt base font, 10 distinct-time steps per frame and a
/// sampling cadence of 10 rows per second.
#[derive(Clone, Debug)]
pub struct PlotStyle {
    /// Figure width in inches.
    pub fig_width_in: f64,
    /// Figure height in inches.
    pub fig_height_in: f64,
    /// Raster resolution in dots per inch.
    pub dpi: f64,

    /// Base font size in points (title, axis and tick labels).
    pub font_size_pt: f64,
    /// Font size of the per-marker time labels, in points.
    pub time_label_size_pt: f64,
    /// Diameter of the time markers, in points.
    pub time_marker_size_pt: f64,
    /// Stroke width of trajectory segments, in points.
    pub line_width_pt: f64,
    /// Stroke width of the vehicle footprint outline, in points.
    pub box_line_width_pt: f64,
    /// Stroke width of axes, ticks and the colorbar outline, in points.
    pub axis_line_width_pt: f64,

    /// Distinct-timestamp steps grouped into one frame.
    pub steps_per_frame: usize,
    /// Assumed sampling cadence, rows per second. Divides sample indices into
    /// the pseudo-seconds shown in time labels and titles.
    pub samples_per_sec: f64,
    /// Place a marker and time label every this many rows of a trajectory.
    pub mark_every: usize,
    /// Offset of the time label from its marker, in data units.
    pub label_offset: f64,

    /// Vehicle footprint length in data units.
    pub vehicle_length: f64,
    /// Vehicle footprint width in data units.
    pub vehicle_width: f64,

    /// Colormap for the velocity metric.
    pub colormap: DivergingMap,
    /// Footprint outline color.
    pub vehicle_color: Rgba8,
    /// Time marker color.
    pub marker_color: Rgba8,
    /// Text and axes color.
    pub foreground: Rgba8,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            fig_width_in: 20.0,
            fig_height_in: 15.0,
            dpi: 300.0,
            font_size_pt: 25.0,
            time_label_size_pt: 20.0,
            time_marker_size_pt: 5.0,
            line_width_pt: 5.0,
            box_line_width_pt: 2.0,
            axis_line_width_pt: 1.0,
            steps_per_frame: 10,
            samples_per_sec: 10.0,
            mark_every: 10,
            label_offset: 1.0,
            vehicle_length: 4.0,
            vehicle_width: 2.5,
            colormap: RD_YL_GN,
            vehicle_color: Rgba8::BLUE,
            marker_color: Rgba8::BLACK,
            foreground: Rgba8::BLACK,
        }
    }
}

impl PlotStyle {
    /// Canvas size in pixels.
    pub fn canvas_px(&self) -> (u32, u32) {
        (
            (self.fig_width_in * self.dpi).round() as u32,
            (self.fig_height_in * self.dpi).round() as u32,
        )
    }

    /// Convert a size in points to pixels at this style's DPI.
    pub fn pt_to_px(&self, pt: f64) -> f64 {
        pt * self.dpi / 72.0
    }
}
