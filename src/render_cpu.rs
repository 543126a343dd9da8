use kurbo::{Affine, BezPath, Cap, Join, Point, Shape, Stroke, StrokeOpts, Vec2};

use crate::colormap::Rgba8;
use crate::error::{TrackplotError, TrackplotResult};
use crate::scene::{DrawOp, FrameScene, TextAnchor};
use crate::text::{TextBrushRgba8, TextEngine};

/// Flattening tolerance for circles and stroke expansion, in pixels.
const TOLERANCE: f64 = 0.1;

/// One rendered frame as RGBA8 pixels, row-major.
///
/// The rasterizer produces **premultiplied alpha**; the `premultiplied` flag
/// makes this explicit at API boundaries. Convert with
/// [`FrameRGBA::unpremultiply_in_place`] before handing the bytes to a
/// straight-alpha consumer such as a PNG encoder.
#[derive(Debug, Clone)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes of RGBA.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Convert premultiplied pixels to straight alpha. No-op when the frame
    /// is already straight alpha.
    pub fn unpremultiply_in_place(&mut self) {
        if !self.premultiplied {
            return;
        }
        for px in self.data.chunks_exact_mut(4) {
            let a = px[3] as u16;
            if a == 0 {
                px[0] = 0;
                px[1] = 0;
                px[2] = 0;
                continue;
            }
            px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
            px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
            px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
        }
        self.premultiplied = false;
    }
}

/// CPU rasterizer for [`FrameScene`] display lists.
///
/// The render context is kept across frames and reused while the canvas size
/// is unchanged; every frame of a run shares one size.
pub struct CpuRenderer {
    ctx: Option<vello_cpu::RenderContext>,
    text: TextEngine,
}

impl CpuRenderer {
    /// Build a renderer around a prepared text engine.
    pub fn new(text: TextEngine) -> Self {
        Self { ctx: None, text }
    }

    /// Rasterize `scene` onto a transparent canvas.
    #[tracing::instrument(skip_all, fields(width = scene.width, height = scene.height))]
    pub fn render(&mut self, scene: &FrameScene) -> TrackplotResult<FrameRGBA> {
        let width = u16::try_from(scene.width)
            .map_err(|_| TrackplotError::render("canvas width exceeds u16"))?;
        let height = u16::try_from(scene.height)
            .map_err(|_| TrackplotError::render("canvas height exceeds u16"))?;

        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        self.with_ctx_mut(width, height, |this, ctx| {
            for op in &scene.ops {
                this.draw_op(op, ctx)?;
            }
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            Ok(())
        })?;

        Ok(FrameRGBA {
            width: scene.width,
            height: scene.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> TrackplotResult<R>,
    ) -> TrackplotResult<R> {
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(width, height),
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            Some(_) => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    fn draw_op(&mut self, op: &DrawOp, ctx: &mut vello_cpu::RenderContext) -> TrackplotResult<()> {
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        match op {
            DrawOp::Segment {
                from,
                to,
                width_px,
                color,
            } => {
                let mut path = BezPath::new();
                path.move_to(*from);
                path.line_to(*to);
                let filled = expand_stroke(&path, *width_px, Cap::Round, Join::Round);
                set_paint(ctx, *color);
                ctx.fill_path(&bezpath_to_cpu(&filled));
            }
            DrawOp::Dot {
                center,
                radius_px,
                color,
            } => {
                let circle = kurbo::Circle::new(*center, *radius_px);
                let mut path = BezPath::new();
                path.extend(circle.path_elements(TOLERANCE));
                set_paint(ctx, *color);
                ctx.fill_path(&bezpath_to_cpu(&path));
            }
            DrawOp::Outline {
                points,
                width_px,
                color,
            } => {
                let Some((first, rest)) = points.split_first() else {
                    return Ok(());
                };
                let mut path = BezPath::new();
                path.move_to(*first);
                for p in rest {
                    path.line_to(*p);
                }
                path.close_path();
                let filled = expand_stroke(&path, *width_px, Cap::Butt, Join::Miter);
                set_paint(ctx, *color);
                ctx.fill_path(&bezpath_to_cpu(&filled));
            }
            DrawOp::FillRect { rect, color } => {
                set_paint(ctx, *color);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    rect.x0, rect.y0, rect.x1, rect.y1,
                ));
            }
            DrawOp::Text {
                pos,
                text,
                size_px,
                color,
                anchor,
                rotate_deg,
            } => self.draw_text(ctx, *pos, text, *size_px, *color, *anchor, *rotate_deg)?,
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        pos: Point,
        text: &str,
        size_px: f64,
        color: Rgba8,
        anchor: TextAnchor,
        rotate_deg: f64,
    ) -> TrackplotResult<()> {
        let brush = TextBrushRgba8 {
            r: color.r,
            g: color.g,
            b: color.b,
            a: color.a,
        };
        let layout = self.text.layout(text, size_px as f32, brush)?;

        let (w, h) = (f64::from(layout.width()), f64::from(layout.height()));
        let offset = anchor_offset(anchor, w, h);
        // Rotation happens about the anchor point, after the anchor shift.
        let tr = Affine::translate(pos.to_vec2())
            * Affine::rotate(rotate_deg.to_radians())
            * Affine::translate(offset);
        ctx.set_transform(affine_to_cpu(tr));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let b = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(b.r, b.g, b.b, b.a));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(self.text.font())
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        Ok(())
    }
}

/// Offset from the anchor point to the layout box's top-left corner, in
/// unrotated text-local coordinates.
fn anchor_offset(anchor: TextAnchor, w: f64, h: f64) -> Vec2 {
    match anchor {
        TextAnchor::TopCenter => Vec2::new(-w / 2.0, 0.0),
        TextAnchor::BottomCenter => Vec2::new(-w / 2.0, -h),
        TextAnchor::BottomLeft => Vec2::new(0.0, -h),
        TextAnchor::MidLeft => Vec2::new(0.0, -h / 2.0),
        TextAnchor::MidRight => Vec2::new(-w, -h / 2.0),
        TextAnchor::Center => Vec2::new(-w / 2.0, -h / 2.0),
    }
}

/// Expand a stroke into a fillable outline.
fn expand_stroke(path: &BezPath, width_px: f64, cap: Cap, join: Join) -> BezPath {
    let style = Stroke::new(width_px).with_caps(cap).with_join(join);
    kurbo::stroke(
        path.elements().iter().copied(),
        &style,
        &StrokeOpts::default(),
        TOLERANCE,
    )
}

fn set_paint(ctx: &mut vello_cpu::RenderContext, color: Rgba8) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        color.r, color.g, color.b, color.a,
    ));
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
