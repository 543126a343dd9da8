use kurbo::{Point, Rect};

use crate::colormap::Rgba8;
use crate::dataset::Dataset;
use crate::error::{TrackplotError, TrackplotResult};
use crate::style::PlotStyle;
use crate::window::FrameWindow;

// Fractional figure layout: the plot axes sit left of a vertical colorbar.
const AXES_LEFT: f64 = 0.10;
const AXES_RIGHT: f64 = 0.74;
const AXES_TOP: f64 = 0.10;
const AXES_BOTTOM: f64 = 0.90;
const CBAR_LEFT: f64 = 0.79;
const CBAR_RIGHT: f64 = 0.83;
const CBAR_STEPS: usize = 256;
const TICK_LEN_PT: f64 = 3.5;
const TICK_TARGET: usize = 6;

/// Which point of the laid-out text box `pos` refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAnchor {
    /// `pos` is the top-center of the text box.
    TopCenter,
    /// `pos` is the bottom-center of the text box.
    BottomCenter,
    /// `pos` is the bottom-left corner of the text box.
    BottomLeft,
    /// `pos` is the middle of the left edge.
    MidLeft,
    /// `pos` is the middle of the right edge.
    MidRight,
    /// `pos` is the center of the text box.
    Center,
}

/// One pixel-space drawing operation of a frame scene.
///
/// Ops are executed in order, so later ops paint over earlier ones.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Straight stroked line with round caps.
    Segment {
        /// Start point, pixels.
        from: Point,
        /// End point, pixels.
        to: Point,
        /// Stroke width, pixels.
        width_px: f64,
        /// Stroke color.
        color: Rgba8,
    },
    /// Filled circle.
    Dot {
        /// Center, pixels.
        center: Point,
        /// Radius, pixels.
        radius_px: f64,
        /// Fill color.
        color: Rgba8,
    },
    /// Closed stroked polygon, unfilled.
    Outline {
        /// Vertices in draw order, pixels.
        points: Vec<Point>,
        /// Stroke width, pixels.
        width_px: f64,
        /// Stroke color.
        color: Rgba8,
    },
    /// Axis-aligned filled rectangle.
    FillRect {
        /// Rectangle, pixels.
        rect: Rect,
        /// Fill color.
        color: Rgba8,
    },
    /// Text run anchored at `pos`, optionally rotated about it.
    Text {
        /// Anchor position, pixels.
        pos: Point,
        /// UTF-8 content.
        text: String,
        /// Font size, pixels.
        size_px: f64,
        /// Fill color.
        color: Rgba8,
        /// Anchor semantics of `pos`.
        anchor: TextAnchor,
        /// Rotation about `pos` in degrees (screen coordinates, y down).
        rotate_deg: f64,
    },
}

/// The display list for one cumulative frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameScene {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Draw operations, back to front.
    pub ops: Vec<DrawOp>,
}

/// Equal-aspect mapping from data coordinates to pixel coordinates.
///
/// One shared scale for both axes keeps spatial distances undistorted; the
/// data rect is centered inside the axes rect and y is flipped (data y up,
/// pixels y down).
#[derive(Clone, Copy, Debug)]
struct Projection {
    scale: f64,
    data_cx: f64,
    data_cy: f64,
    px_cx: f64,
    px_cy: f64,
}

impl Projection {
    fn fit(data: Rect, axes: Rect) -> Self {
        let scale = (axes.width() / data.width()).min(axes.height() / data.height());
        let data_c = data.center();
        let px_c = axes.center();
        Self {
            scale,
            data_cx: data_c.x,
            data_cy: data_c.y,
            px_cx: px_c.x,
            px_cy: px_c.y,
        }
    }

    fn project(&self, x: f64, y: f64) -> Point {
        Point::new(
            self.px_cx + (x - self.data_cx) * self.scale,
            self.px_cy - (y - self.data_cy) * self.scale,
        )
    }

    /// Data range visible along x once the equal-aspect fit widens the view.
    fn visible_x(&self, axes: Rect) -> (f64, f64) {
        let half = axes.width() / (2.0 * self.scale);
        (self.data_cx - half, self.data_cx + half)
    }

    /// Data range visible along y.
    fn visible_y(&self, axes: Rect) -> (f64, f64) {
        let half = axes.height() / (2.0 * self.scale);
        (self.data_cy - half, self.data_cy + half)
    }
}

/// Build the display list for one frame.
///
/// Pure and deterministic: identical inputs produce an identical op list.
/// Draw order is axes furniture, then per-vehicle trajectories with markers
/// and labels, then every vehicle footprint on top, then the colorbar and
/// title.
#[tracing::instrument(skip(ds, style), fields(frame = window.index))]
pub fn build_frame_scene(
    ds: &Dataset,
    window: FrameWindow,
    style: &PlotStyle,
) -> TrackplotResult<FrameScene> {
    if style.mark_every == 0 {
        return Err(TrackplotError::validation("mark_every must be > 0"));
    }
    if !(style.samples_per_sec > 0.0) {
        return Err(TrackplotError::validation("samples_per_sec must be > 0"));
    }

    let (width, height) = style.canvas_px();
    let wf = f64::from(width);
    let hf = f64::from(height);
    let axes = Rect::new(AXES_LEFT * wf, AXES_TOP * hf, AXES_RIGHT * wf, AXES_BOTTOM * hf);
    let cbar = Rect::new(CBAR_LEFT * wf, AXES_TOP * hf, CBAR_RIGHT * wf, AXES_BOTTOM * hf);

    let rows = ds.rows_through(window.bound);
    if rows.is_empty() {
        return Err(TrackplotError::render(format!(
            "frame {} selects no rows (bound {})",
            window.index, window.bound
        )));
    }

    let data = data_bounds(ds, &rows, style);
    let proj = Projection::fit(data, axes);

    let mut ops = Vec::new();
    axes_ops(&mut ops, axes, &proj, style);

    let vehicles = ds.vehicles_in(&rows);
    for vehicle in &vehicles {
        trajectory_ops(&mut ops, ds, &rows, vehicle, &proj, style);
    }
    // Footprints sit above every line and marker layer.
    for vehicle in &vehicles {
        footprint_ops(&mut ops, ds, &rows, vehicle, &proj, style);
    }

    colorbar_ops(&mut ops, cbar, ds, style);

    let elapsed = (window.covered as f64 / style.samples_per_sec).floor() as i64;
    ops.push(DrawOp::Text {
        pos: Point::new(axes.center().x, axes.y0 - 0.6 * style.pt_to_px(style.font_size_pt)),
        text: format!("Time of {elapsed}s trajectory"),
        size_px: style.pt_to_px(style.font_size_pt),
        color: style.foreground,
        anchor: TextAnchor::BottomCenter,
        rotate_deg: 0.0,
    });

    Ok(FrameScene { width, height, ops })
}

/// Bounding rect of the frame's positions, padded so footprints and a bit of
/// breathing room stay inside the axes.
fn data_bounds(ds: &Dataset, rows: &[usize], style: &PlotStyle) -> Rect {
    let samples = ds.samples();
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &i in rows {
        min_x = min_x.min(samples[i].location_x);
        max_x = max_x.max(samples[i].location_x);
        min_y = min_y.min(samples[i].location_y);
        max_y = max_y.max(samples[i].location_y);
    }

    let half_diag = style.vehicle_length.hypot(style.vehicle_width) / 2.0;
    // The 1.0 floor keeps the projection finite for a single stationary point.
    let pad_x = (0.05 * (max_x - min_x)).max(half_diag).max(1.0);
    let pad_y = (0.05 * (max_y - min_y)).max(half_diag).max(1.0);
    Rect::new(min_x - pad_x, min_y - pad_y, max_x + pad_x, max_y + pad_y)
}

fn axes_ops(ops: &mut Vec<DrawOp>, axes: Rect, proj: &Projection, style: &PlotStyle) {
    let lw = style.pt_to_px(style.axis_line_width_pt);
    let tick_len = style.pt_to_px(TICK_LEN_PT);
    let font_px = style.pt_to_px(style.font_size_pt);
    let fg = style.foreground;

    ops.push(DrawOp::Outline {
        points: vec![
            Point::new(axes.x0, axes.y0),
            Point::new(axes.x1, axes.y0),
            Point::new(axes.x1, axes.y1),
            Point::new(axes.x0, axes.y1),
        ],
        width_px: lw,
        color: fg,
    });

    let (x_lo, x_hi) = proj.visible_x(axes);
    let (x_ticks, x_step) = nice_ticks(x_lo, x_hi, TICK_TARGET);
    for v in x_ticks {
        let px = proj.project(v, 0.0).x;
        ops.push(DrawOp::Segment {
            from: Point::new(px, axes.y1),
            to: Point::new(px, axes.y1 + tick_len),
            width_px: lw,
            color: fg,
        });
        ops.push(DrawOp::Text {
            pos: Point::new(px, axes.y1 + tick_len + 0.3 * font_px),
            text: format_tick(v, x_step),
            size_px: font_px,
            color: fg,
            anchor: TextAnchor::TopCenter,
            rotate_deg: 0.0,
        });
    }

    let (y_lo, y_hi) = proj.visible_y(axes);
    let (y_ticks, y_step) = nice_ticks(y_lo, y_hi, TICK_TARGET);
    for v in y_ticks {
        let py = proj.project(0.0, v).y;
        ops.push(DrawOp::Segment {
            from: Point::new(axes.x0 - tick_len, py),
            to: Point::new(axes.x0, py),
            width_px: lw,
            color: fg,
        });
        ops.push(DrawOp::Text {
            pos: Point::new(axes.x0 - tick_len - 0.3 * font_px, py),
            text: format_tick(v, y_step),
            size_px: font_px,
            color: fg,
            anchor: TextAnchor::MidRight,
            rotate_deg: 0.0,
        });
    }

    ops.push(DrawOp::Text {
        pos: Point::new(axes.center().x, axes.y1 + tick_len + 1.8 * font_px),
        text: "Location X (m)".to_string(),
        size_px: font_px,
        color: fg,
        anchor: TextAnchor::TopCenter,
        rotate_deg: 0.0,
    });
    ops.push(DrawOp::Text {
        pos: Point::new(axes.x0 - tick_len - 3.2 * font_px, axes.center().y),
        text: "Location Y (m)".to_string(),
        size_px: font_px,
        color: fg,
        anchor: TextAnchor::Center,
        rotate_deg: -90.0,
    });
}

fn trajectory_ops(
    ops: &mut Vec<DrawOp>,
    ds: &Dataset,
    rows: &[usize],
    vehicle: &str,
    proj: &Projection,
    style: &PlotStyle,
) {
    let idx = ds.vehicle_rows_sorted(rows, vehicle);
    let samples = ds.samples();
    let norm = ds.metric_norm();

    let lw = style.pt_to_px(style.line_width_pt);
    for pair in idx.windows(2) {
        let (a, b) = (&samples[pair[0]], &samples[pair[1]]);
        let mean = 0.5 * (norm[pair[0]] + norm[pair[1]]);
        ops.push(DrawOp::Segment {
            from: proj.project(a.location_x, a.location_y),
            to: proj.project(b.location_x, b.location_y),
            width_px: lw,
            color: style.colormap.sample(mean),
        });
    }

    // A marker and an index-based pseudo-time label every mark_every rows.
    let radius = style.pt_to_px(style.time_marker_size_pt) / 2.0;
    let label_px = style.pt_to_px(style.time_label_size_pt);
    for (k, &i) in idx.iter().enumerate().step_by(style.mark_every) {
        let s = &samples[i];
        ops.push(DrawOp::Text {
            pos: proj.project(
                s.location_x + style.label_offset,
                s.location_y + style.label_offset,
            ),
            text: format!("{}s", (k as f64 / style.samples_per_sec).floor() as i64),
            size_px: label_px,
            color: style.foreground,
            anchor: TextAnchor::BottomLeft,
            rotate_deg: 0.0,
        });
        ops.push(DrawOp::Dot {
            center: proj.project(s.location_x, s.location_y),
            radius_px: radius,
            color: style.marker_color,
        });
    }
}

/// Unfilled rectangle at the vehicle's last known pose, rotated about its
/// own center by the recorded yaw.
fn footprint_ops(
    ops: &mut Vec<DrawOp>,
    ds: &Dataset,
    rows: &[usize],
    vehicle: &str,
    proj: &Projection,
    style: &PlotStyle,
) {
    let idx = ds.vehicle_rows_sorted(rows, vehicle);
    let Some(&last) = idx.last() else {
        return;
    };
    let s = &ds.samples()[last];

    let yaw = s.rotation_yaw.to_radians();
    let (sin, cos) = yaw.sin_cos();
    let (hl, hw) = (style.vehicle_length / 2.0, style.vehicle_width / 2.0);
    // Long axis along the heading, short axis perpendicular to it.
    let corners = [(hl, hw), (hl, -hw), (-hl, -hw), (-hl, hw)];
    let points = corners
        .iter()
        .map(|&(u, v)| {
            proj.project(
                s.location_x + u * cos - v * sin,
                s.location_y + u * sin + v * cos,
            )
        })
        .collect();

    ops.push(DrawOp::Outline {
        points,
        width_px: style.pt_to_px(style.box_line_width_pt),
        color: style.vehicle_color,
    });
}

fn colorbar_ops(ops: &mut Vec<DrawOp>, cbar: Rect, ds: &Dataset, style: &PlotStyle) {
    let h = cbar.height();

    // Gradient strip: metric minimum at the bottom, maximum at the top.
    for s in 0..CBAR_STEPS {
        let t0 = s as f64 / CBAR_STEPS as f64;
        let t1 = (s + 1) as f64 / CBAR_STEPS as f64;
        ops.push(DrawOp::FillRect {
            rect: Rect::new(cbar.x0, cbar.y1 - t1 * h, cbar.x1, cbar.y1 - t0 * h),
            color: style.colormap.sample((t0 + t1) / 2.0),
        });
    }

    let lw = style.pt_to_px(style.axis_line_width_pt);
    let tick_len = style.pt_to_px(TICK_LEN_PT);
    let font_px = style.pt_to_px(style.font_size_pt);
    let fg = style.foreground;

    ops.push(DrawOp::Outline {
        points: vec![
            Point::new(cbar.x0, cbar.y0),
            Point::new(cbar.x1, cbar.y0),
            Point::new(cbar.x1, cbar.y1),
            Point::new(cbar.x0, cbar.y1),
        ],
        width_px: lw,
        color: fg,
    });

    let (min, max) = (ds.metric_min(), ds.metric_max());
    let (ticks, step) = nice_ticks(min, max, TICK_TARGET);
    for v in ticks {
        let y = cbar.y1 - (v - min) / (max - min) * h;
        ops.push(DrawOp::Segment {
            from: Point::new(cbar.x1, y),
            to: Point::new(cbar.x1 + tick_len, y),
            width_px: lw,
            color: fg,
        });
        ops.push(DrawOp::Text {
            pos: Point::new(cbar.x1 + tick_len + 0.3 * font_px, y),
            text: format_tick(v, step),
            size_px: font_px,
            color: fg,
            anchor: TextAnchor::MidLeft,
            rotate_deg: 0.0,
        });
    }

    ops.push(DrawOp::Text {
        pos: Point::new(cbar.x1 + tick_len + 3.2 * font_px, cbar.center().y),
        text: "Speed (m/s)".to_string(),
        size_px: font_px,
        color: fg,
        anchor: TextAnchor::Center,
        rotate_deg: -90.0,
    });
}

/// Round tick positions covering `[lo, hi]` with a 1/2/5-series step.
/// Returns the ticks inside the range and the chosen step.
fn nice_ticks(lo: f64, hi: f64, target: usize) -> (Vec<f64>, f64) {
    let span = hi - lo;
    if !(span > 0.0) || !span.is_finite() {
        return (vec![lo], 1.0);
    }

    let raw = span / target.max(1) as f64;
    let mag = 10f64.powf(raw.log10().floor());
    let norm = raw / mag;
    let step = if norm < 1.5 {
        1.0
    } else if norm < 3.0 {
        2.0
    } else if norm < 7.0 {
        5.0
    } else {
        10.0
    } * mag;

    let mut out = Vec::new();
    let mut v = (lo / step).ceil() * step;
    let eps = step * 1e-9;
    while v <= hi + eps {
        // Normalize -0.0 so labels never read "-0".
        out.push(if v == 0.0 { 0.0 } else { v });
        v += step;
    }
    (out, step)
}

fn format_tick(v: f64, step: f64) -> String {
    let decimals = if step >= 1.0 {
        0
    } else {
        (-step.log10().floor()) as usize
    };
    format!("{v:.decimals$}")
}
