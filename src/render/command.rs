use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use glam::Mat4;

use crate::geometry::Rect;

use super::RenderBatch;

/// Floats per vertex for each flat vertex layout emitted by the builder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexLayout {
    /// `x, y`
    Position,
    /// `x, y, r, g, b, a`
    PositionColor,
    /// `x, y, r, g, b, a, u, v`
    PositionColorTexture,
}

impl VertexLayout {
    pub const fn floats_per_vertex(self) -> usize {
        match self {
            Self::Position => 2,
            Self::PositionColor => 6,
            Self::PositionColorTexture => 8,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8,
    R8,
}

impl TextureFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::R8 => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Backend texture handle. Draw commands share it, so the texture lives as
/// long as the last batch that references it.
#[derive(Debug)]
pub struct Texture {
    pub id: u64,
    pub desc: TextureDesc,
}

pub type TextureRef = Arc<Texture>;

#[derive(Debug)]
pub struct GpuBuffer {
    pub id: u64,
    pub len: usize,
}

pub type BufferRef = Arc<GpuBuffer>;

/// Tessellated payload shared by every draw command.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawGeometry {
    pub vertices: Vec<f32>,
    pub vertex_count: usize,
    pub texture: Option<TextureRef>,
}

impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl DrawGeometry {
    pub fn new(layout: VertexLayout, vertices: Vec<f32>, texture: Option<TextureRef>) -> Self {
        let stride = layout.floats_per_vertex();
        debug_assert_eq!(vertices.len() % stride, 0, "vertex data is not a whole number of vertices");
        Self {
            vertex_count: vertices.len() / stride,
            vertices,
            texture,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformMode {
    /// Concatenate with the transform already on the stack.
    Multiply,
    /// Ignore the stack and use the matrix as is.
    Replace,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RoundedRectKind {
    Plain,
    Bordered { thickness: f32 },
    Dotted { thickness: f32, dash: f32 },
}

/// State visible to a callback command at the moment it is expanded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExpandContext {
    pub transform: Mat4,
    pub clip: Option<Rect>,
}

impl Default for ExpandContext {
    fn default() -> Self {
        Self {
            transform: Mat4::IDENTITY,
            clip: None,
        }
    }
}

/// Deferred batch producer. Invoked again on every traversal.
#[derive(Clone)]
pub struct RenderCallback(Rc<dyn Fn(&ExpandContext) -> RenderBatch>);

impl RenderCallback {
    pub fn new(callback: impl Fn(&ExpandContext) -> RenderBatch + 'static) -> Self {
        Self(Rc::new(callback))
    }

    pub fn expand(&self, cx: &ExpandContext) -> RenderBatch {
        (self.0)(cx)
    }
}

impl fmt::Debug for RenderCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RenderCallback(..)")
    }
}

#[derive(Clone, Debug)]
pub enum RenderCommand {
    DrawPositions(DrawGeometry),
    DrawColored(DrawGeometry),
    DrawTextured(DrawGeometry),
    Text(DrawGeometry),
    RoundedRect {
        geometry: DrawGeometry,
        kind: RoundedRectKind,
    },
    Bezier(DrawGeometry),
    Glyph(DrawGeometry),
    GlyphBatch {
        geometry: DrawGeometry,
        glyph_count: usize,
    },
    PushTransform {
        matrix: Mat4,
        mode: TransformMode,
    },
    PopTransform,
    PushClip(Rect),
    PopClip,
    Callback(RenderCallback),
}

impl RenderCommand {
    pub fn geometry(&self) -> Option<&DrawGeometry> {
        match self {
            Self::DrawPositions(geometry)
            | Self::DrawColored(geometry)
            | Self::DrawTextured(geometry)
            | Self::Text(geometry)
            | Self::Bezier(geometry)
            | Self::Glyph(geometry)
            | Self::RoundedRect { geometry, .. }
            | Self::GlyphBatch { geometry, .. } => Some(geometry),
            Self::PushTransform { .. }
            | Self::PopTransform
            | Self::PushClip(_)
            | Self::PopClip
            | Self::Callback(_) => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::DrawPositions(_) => "draw_positions",
            Self::DrawColored(_) => "draw_colored",
            Self::DrawTextured(_) => "draw_textured",
            Self::Text(_) => "text",
            Self::RoundedRect { .. } => "rounded_rect",
            Self::Bezier(_) => "bezier",
            Self::Glyph(_) => "glyph",
            Self::GlyphBatch { .. } => "glyph_batch",
            Self::PushTransform { .. } => "push_transform",
            Self::PopTransform => "pop_transform",
            Self::PushClip(_) => "push_clip",
            Self::PopClip => "pop_clip",
            Self::Callback(_) => "callback",
        }
    }
}
