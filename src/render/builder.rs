use std::f32::consts::PI;

use glam::Mat4;

use crate::geometry::{CornerRadius, Point, Rect, Thickness};
use crate::style::Color;

use super::{
    DrawGeometry, ExpandContext, RenderBatch, RenderCallback, RenderCommand, RendererCaps,
    RoundedRectKind, TextureRef, TransformMode, VertexLayout,
};

const CORNER_SEGMENTS: usize = 8;
const BEZIER_SEGMENTS: usize = 16;

/// One glyph cell: where it lands and which atlas region it samples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphQuad {
    pub rect: Rect,
    pub uv: Rect,
}

/// Fluent accumulator that tessellates shapes into flat vertex commands.
pub struct RenderBatchBuilder {
    caps: RendererCaps,
    batch: RenderBatch,
}

impl RenderBatchBuilder {
    pub fn new(caps: RendererCaps) -> Self {
        Self {
            caps,
            batch: RenderBatch::new(),
        }
    }

    pub fn caps(&self) -> RendererCaps {
        self.caps
    }

    pub fn build(self) -> RenderBatch {
        self.batch
    }

    pub fn command(&mut self, command: RenderCommand) -> &mut Self {
        self.batch.push(command);
        self
    }

    pub fn rect(&mut self, rect: Rect) -> &mut Self {
        let mut vertices = Vec::with_capacity(12);
        for [x, y] in rect_corners(rect) {
            vertices.extend_from_slice(&[x, y]);
        }
        self.command(RenderCommand::DrawPositions(DrawGeometry::new(
            VertexLayout::Position,
            vertices,
            None,
        )))
    }

    pub fn colored_rect(&mut self, rect: Rect, color: Color) -> &mut Self {
        if color.is_transparent() || rect.is_empty() {
            return self;
        }
        let rgba = color.to_rgba_f32();
        let mut vertices = Vec::with_capacity(36);
        for point in rect_corners(rect) {
            push_colored(&mut vertices, point, rgba);
        }
        self.command(RenderCommand::DrawColored(DrawGeometry::new(
            VertexLayout::PositionColor,
            vertices,
            None,
        )))
    }

    pub fn textured_rect(&mut self, rect: Rect, uv: Rect, texture: TextureRef, tint: Color) -> &mut Self {
        let mut vertices = Vec::with_capacity(48);
        push_glyph(&mut vertices, GlyphQuad { rect, uv }, tint.to_rgba_f32());
        self.command(RenderCommand::DrawTextured(DrawGeometry::new(
            VertexLayout::PositionColorTexture,
            vertices,
            Some(texture),
        )))
    }

    pub fn rounded_rect(&mut self, rect: Rect, radii: CornerRadius, fill: Color) -> &mut Self {
        if fill.is_transparent() || rect.is_empty() {
            return self;
        }
        let mut vertices = Vec::new();
        fill_polygon(&mut vertices, &rounded_outline(rect, radii), fill.to_rgba_f32());
        self.command(RenderCommand::RoundedRect {
            geometry: DrawGeometry::new(VertexLayout::PositionColor, vertices, None),
            kind: RoundedRectKind::Plain,
        })
    }

    /// Fill plus a solid ring of `thickness` drawn inside `rect`.
    pub fn bordered_rounded_rect(
        &mut self,
        rect: Rect,
        radii: CornerRadius,
        thickness: f32,
        fill: Color,
        border: Color,
    ) -> &mut Self {
        if rect.is_empty() {
            return self;
        }
        let inset = Thickness::uniform(thickness);
        let outer = rounded_outline(rect, radii);
        let inner = rounded_outline(rect.deflate(inset), radii.normalized(rect.width, rect.height).inset(inset));
        let mut vertices = Vec::new();
        if !fill.is_transparent() {
            fill_polygon(&mut vertices, &inner, fill.to_rgba_f32());
        }
        stroke_ring(&mut vertices, &outer, &inner, border.to_rgba_f32(), None);
        self.command(RenderCommand::RoundedRect {
            geometry: DrawGeometry::new(VertexLayout::PositionColor, vertices, None),
            kind: RoundedRectKind::Bordered { thickness },
        })
    }

    /// Ring only, broken into dashes of roughly `dash` pixels.
    pub fn dotted_rounded_rect(
        &mut self,
        rect: Rect,
        radii: CornerRadius,
        thickness: f32,
        dash: f32,
        color: Color,
    ) -> &mut Self {
        if rect.is_empty() {
            return self;
        }
        let inset = Thickness::uniform(thickness);
        let outer = rounded_outline(rect, radii);
        let inner = rounded_outline(rect.deflate(inset), radii.normalized(rect.width, rect.height).inset(inset));
        let mut vertices = Vec::new();
        stroke_ring(&mut vertices, &outer, &inner, color.to_rgba_f32(), Some(dash.max(1.0)));
        self.command(RenderCommand::RoundedRect {
            geometry: DrawGeometry::new(VertexLayout::PositionColor, vertices, None),
            kind: RoundedRectKind::Dotted { thickness, dash },
        })
    }

    /// Cubic bezier stroked as a strip of quads.
    pub fn bezier(&mut self, points: [Point; 4], thickness: f32, color: Color) -> &mut Self {
        let rgba = color.to_rgba_f32();
        let half = thickness.max(0.0) * 0.5;
        let samples: Vec<[f32; 2]> = (0..=BEZIER_SEGMENTS)
            .map(|i| cubic_point(points, i as f32 / BEZIER_SEGMENTS as f32))
            .collect();
        let mut vertices = Vec::with_capacity(BEZIER_SEGMENTS * 36);
        for pair in samples.windows(2) {
            let [a, b] = [pair[0], pair[1]];
            let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
            let len = (dx * dx + dy * dy).sqrt();
            if len <= f32::EPSILON {
                continue;
            }
            let (nx, ny) = (-dy / len * half, dx / len * half);
            let quad = [
                [a[0] + nx, a[1] + ny],
                [b[0] + nx, b[1] + ny],
                [b[0] - nx, b[1] - ny],
                [a[0] - nx, a[1] - ny],
            ];
            push_quad(&mut vertices, quad, rgba);
        }
        self.command(RenderCommand::Bezier(DrawGeometry::new(
            VertexLayout::PositionColor,
            vertices,
            None,
        )))
    }

    pub fn glyph(&mut self, quad: GlyphQuad, color: Color, atlas: Option<TextureRef>) -> &mut Self {
        let mut vertices = Vec::with_capacity(48);
        push_glyph(&mut vertices, quad, color.to_rgba_f32());
        self.command(RenderCommand::Glyph(DrawGeometry::new(
            VertexLayout::PositionColorTexture,
            vertices,
            atlas,
        )))
    }

    pub fn glyph_batch(&mut self, quads: &[GlyphQuad], color: Color, atlas: Option<TextureRef>) -> &mut Self {
        let rgba = color.to_rgba_f32();
        let mut vertices = Vec::with_capacity(quads.len() * 48);
        for quad in quads {
            push_glyph(&mut vertices, *quad, rgba);
        }
        self.command(RenderCommand::GlyphBatch {
            geometry: DrawGeometry::new(VertexLayout::PositionColorTexture, vertices, atlas),
            glyph_count: quads.len(),
        })
    }

    /// Laid-out text at `origin`. Backends with shader text get a single
    /// `Text` command, the rest a glyph batch.
    pub fn text(
        &mut self,
        origin: Point,
        glyphs: &[GlyphQuad],
        color: Color,
        atlas: Option<TextureRef>,
    ) -> &mut Self {
        if glyphs.is_empty() {
            return self;
        }
        let placed: Vec<GlyphQuad> = glyphs
            .iter()
            .map(|g| GlyphQuad {
                rect: g.rect.translate(origin.x, origin.y),
                uv: g.uv,
            })
            .collect();
        if !self.caps.contains(RendererCaps::SHADER_TEXT) {
            return self.glyph_batch(&placed, color, atlas);
        }
        let rgba = color.to_rgba_f32();
        let mut vertices = Vec::with_capacity(placed.len() * 48);
        for quad in &placed {
            push_glyph(&mut vertices, *quad, rgba);
        }
        self.command(RenderCommand::Text(DrawGeometry::new(
            VertexLayout::PositionColorTexture,
            vertices,
            atlas,
        )))
    }

    pub fn push_transform(&mut self, matrix: Mat4, mode: TransformMode) -> &mut Self {
        self.command(RenderCommand::PushTransform { matrix, mode })
    }

    pub fn pop_transform(&mut self) -> &mut Self {
        self.command(RenderCommand::PopTransform)
    }

    pub fn push_clip(&mut self, region: Rect) -> &mut Self {
        self.command(RenderCommand::PushClip(region))
    }

    pub fn pop_clip(&mut self) -> &mut Self {
        self.command(RenderCommand::PopClip)
    }

    pub fn callback(&mut self, callback: impl Fn(&ExpandContext) -> RenderBatch + 'static) -> &mut Self {
        self.command(RenderCommand::Callback(RenderCallback::new(callback)))
    }
}

fn rect_corners(rect: Rect) -> [[f32; 2]; 6] {
    let (l, t, r, b) = (rect.x, rect.y, rect.right(), rect.bottom());
    [[l, t], [r, t], [r, b], [l, t], [r, b], [l, b]]
}

fn push_colored(out: &mut Vec<f32>, [x, y]: [f32; 2], rgba: [f32; 4]) {
    out.extend_from_slice(&[x, y, rgba[0], rgba[1], rgba[2], rgba[3]]);
}

fn push_quad(out: &mut Vec<f32>, quad: [[f32; 2]; 4], rgba: [f32; 4]) {
    for index in [0, 1, 2, 0, 2, 3] {
        push_colored(out, quad[index], rgba);
    }
}

fn push_glyph(out: &mut Vec<f32>, quad: GlyphQuad, rgba: [f32; 4]) {
    let positions = rect_corners(quad.rect);
    let uvs = rect_corners(quad.uv);
    for (pos, uv) in positions.iter().zip(uvs.iter()) {
        out.extend_from_slice(&[pos[0], pos[1], rgba[0], rgba[1], rgba[2], rgba[3], uv[0], uv[1]]);
    }
}

/// Clockwise outline starting at the left end of the top-left arc. Every
/// corner contributes the same number of points, zero radii included, so two
/// outlines of the same rect can be stitched into a ring.
fn rounded_outline(rect: Rect, radii: CornerRadius) -> Vec<[f32; 2]> {
    let r = radii.normalized(rect.width, rect.height);
    let corners = [
        (rect.x + r.top_left, rect.y + r.top_left, r.top_left, PI),
        (rect.right() - r.top_right, rect.y + r.top_right, r.top_right, 1.5 * PI),
        (rect.right() - r.bottom_right, rect.bottom() - r.bottom_right, r.bottom_right, 0.0),
        (rect.x + r.bottom_left, rect.bottom() - r.bottom_left, r.bottom_left, 0.5 * PI),
    ];
    let mut points = Vec::with_capacity(4 * (CORNER_SEGMENTS + 1));
    for (cx, cy, radius, start) in corners {
        for step in 0..=CORNER_SEGMENTS {
            let angle = start + step as f32 / CORNER_SEGMENTS as f32 * PI * 0.5;
            points.push([cx + radius * angle.cos(), cy + radius * angle.sin()]);
        }
    }
    points
}

fn fill_polygon(out: &mut Vec<f32>, outline: &[[f32; 2]], rgba: [f32; 4]) {
    if outline.len() < 3 {
        return;
    }
    let n = outline.len() as f32;
    let center = outline
        .iter()
        .fold([0.0, 0.0], |acc, p| [acc[0] + p[0] / n, acc[1] + p[1] / n]);
    for i in 0..outline.len() {
        push_colored(out, center, rgba);
        push_colored(out, outline[i], rgba);
        push_colored(out, outline[(i + 1) % outline.len()], rgba);
    }
}

fn stroke_ring(
    out: &mut Vec<f32>,
    outer: &[[f32; 2]],
    inner: &[[f32; 2]],
    rgba: [f32; 4],
    dash: Option<f32>,
) {
    let count = outer.len().min(inner.len());
    let mut travelled = 0.0;
    for i in 0..count {
        let j = (i + 1) % count;
        let (dx, dy) = (outer[j][0] - outer[i][0], outer[j][1] - outer[i][1]);
        let midpoint = travelled + (dx * dx + dy * dy).sqrt() * 0.5;
        travelled += (dx * dx + dy * dy).sqrt();
        if let Some(dash) = dash {
            if (midpoint / dash) as u32 % 2 == 1 {
                continue;
            }
        }
        push_quad(out, [outer[i], outer[j], inner[j], inner[i]], rgba);
    }
}

fn cubic_point(p: [Point; 4], t: f32) -> [f32; 2] {
    let u = 1.0 - t;
    let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
    [
        a * p[0].x + b * p[1].x + c * p[2].x + d * p[3].x,
        a * p[0].y + b * p[1].y + c * p[2].y + d * p[3].y,
    ]
}
