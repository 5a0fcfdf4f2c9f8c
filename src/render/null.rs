use std::mem;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use tracing::{debug, warn};

use crate::geometry::Rect;

use super::{
    BufferRef, CommandSink, ExpandContext, GpuBuffer, RenderBatch, RenderCommand, Renderer,
    RendererCaps, Texture, TextureDesc, TextureRef, TransformMode, VertexLayout,
};

/// A draw that reached the backend during the last flush.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutedDraw {
    pub kind: &'static str,
    pub transform: Mat4,
    pub clip: Option<Rect>,
    pub vertex_count: usize,
    /// Untransformed bounds of the vertex positions.
    pub bounds: Rect,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draws: usize,
    pub transform_pushes: usize,
    pub transform_pops: usize,
    pub clip_pushes: usize,
    pub clip_pops: usize,
    pub max_transform_depth: usize,
}

enum Queued {
    Batch(RenderBatch),
    Scope(RenderCommand),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OpenScope {
    Transform,
    Clip,
}

/// Headless backend. Executes queued work with real transform and clip
/// stacks and keeps a record of what was drawn.
pub struct NullRenderer {
    caps: RendererCaps,
    queue: Vec<Queued>,
    open: Vec<OpenScope>,
    recording_transforms: Vec<Mat4>,
    executed: Vec<ExecutedDraw>,
    stats: FrameStats,
    frames: u64,
    next_resource_id: u64,
}

impl Default for NullRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl NullRenderer {
    pub fn new() -> Self {
        Self::with_caps(RendererCaps::TEXTURES | RendererCaps::SCISSOR_CLIP)
    }

    pub fn with_caps(caps: RendererCaps) -> Self {
        Self {
            caps,
            queue: Vec::new(),
            open: Vec::new(),
            recording_transforms: Vec::new(),
            executed: Vec::new(),
            stats: FrameStats::default(),
            frames: 0,
            next_resource_id: 1,
        }
    }

    pub fn executed(&self) -> &[ExecutedDraw] {
        &self.executed
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn open_scopes(&self) -> usize {
        self.open.len()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    fn close_scope(&mut self, expected: OpenScope) {
        match self.open.pop() {
            Some(scope) if scope == expected => {}
            other => panic!("unbalanced render scope: closing {expected:?}, innermost open is {other:?}"),
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_resource_id;
        self.next_resource_id += 1;
        id
    }
}

impl Renderer for NullRenderer {
    fn capabilities(&self) -> RendererCaps {
        self.caps
    }

    fn enqueue_commands(&mut self, batch: &RenderBatch) {
        if !batch.is_empty() {
            self.queue.push(Queued::Batch(batch.clone()));
        }
    }

    fn flush(&mut self) {
        assert!(
            self.open.is_empty(),
            "flush with {} render scope(s) still open",
            self.open.len()
        );
        let queue = mem::take(&mut self.queue);
        self.executed.clear();
        self.stats = FrameStats::default();

        {
            let mut execution = Execution {
                transforms: vec![Mat4::IDENTITY],
                clips: Vec::new(),
                executed: &mut self.executed,
                stats: &mut self.stats,
            };
            for item in &queue {
                match item {
                    Queued::Batch(batch) => batch.visit(&mut execution),
                    Queued::Scope(command) => execution.command(command),
                }
            }
            execution.finish();
        }
        self.frames += 1;
        debug!(frame = self.frames, draws = self.stats.draws, "null renderer flushed");
    }

    fn push_transform(&mut self, matrix: Mat4, mode: TransformMode) {
        let next = match mode {
            TransformMode::Multiply => self.current_transform() * matrix,
            TransformMode::Replace => matrix,
        };
        self.recording_transforms.push(next);
        self.open.push(OpenScope::Transform);
        self.queue.push(Queued::Scope(RenderCommand::PushTransform { matrix, mode }));
    }

    fn pop_transform(&mut self) {
        self.close_scope(OpenScope::Transform);
        self.recording_transforms.pop();
        self.queue.push(Queued::Scope(RenderCommand::PopTransform));
    }

    fn push_clip(&mut self, region: Rect) {
        self.open.push(OpenScope::Clip);
        self.queue.push(Queued::Scope(RenderCommand::PushClip(region)));
    }

    fn pop_clip(&mut self) {
        self.close_scope(OpenScope::Clip);
        self.queue.push(Queued::Scope(RenderCommand::PopClip));
    }

    fn current_transform(&self) -> Mat4 {
        self.recording_transforms
            .last()
            .copied()
            .unwrap_or(Mat4::IDENTITY)
    }

    fn create_texture(&mut self, desc: TextureDesc, pixels: &[u8]) -> Option<TextureRef> {
        let expected = desc.width as usize * desc.height as usize * desc.format.bytes_per_pixel();
        if expected == 0 || pixels.len() != expected {
            warn!(?desc, len = pixels.len(), "texture creation rejected");
            return None;
        }
        Some(Arc::new(Texture {
            id: self.next_id(),
            desc,
        }))
    }

    fn create_buffer(&mut self, bytes: &[u8]) -> Option<BufferRef> {
        if bytes.is_empty() {
            warn!("buffer creation rejected: empty upload");
            return None;
        }
        Some(Arc::new(GpuBuffer {
            id: self.next_id(),
            len: bytes.len(),
        }))
    }
}

struct Execution<'a> {
    transforms: Vec<Mat4>,
    clips: Vec<Rect>,
    executed: &'a mut Vec<ExecutedDraw>,
    stats: &'a mut FrameStats,
}

impl Execution<'_> {
    fn current_transform(&self) -> Mat4 {
        self.transforms.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    fn finish(&mut self) {
        assert!(
            self.transforms.len() == 1 && self.clips.is_empty(),
            "unbalanced render batch: {} transform(s) and {} clip(s) left open",
            self.transforms.len() - 1,
            self.clips.len()
        );
    }
}

impl CommandSink for Execution<'_> {
    fn expand_context(&self) -> ExpandContext {
        ExpandContext {
            transform: self.current_transform(),
            clip: self.clips.last().copied(),
        }
    }

    fn command(&mut self, command: &RenderCommand) {
        match command {
            RenderCommand::PushTransform { matrix, mode } => {
                let next = match mode {
                    TransformMode::Multiply => self.current_transform() * *matrix,
                    TransformMode::Replace => *matrix,
                };
                self.transforms.push(next);
                self.stats.transform_pushes += 1;
                self.stats.max_transform_depth =
                    self.stats.max_transform_depth.max(self.transforms.len() - 1);
            }
            RenderCommand::PopTransform => {
                assert!(self.transforms.len() > 1, "pop_transform without matching push");
                self.transforms.pop();
                self.stats.transform_pops += 1;
            }
            RenderCommand::PushClip(region) => {
                let region = transform_rect(self.current_transform(), *region);
                let clipped = match self.clips.last() {
                    Some(current) => current
                        .intersect(region)
                        .unwrap_or(Rect::new(region.x, region.y, 0.0, 0.0)),
                    None => region,
                };
                self.clips.push(clipped);
                self.stats.clip_pushes += 1;
            }
            RenderCommand::PopClip => {
                assert!(self.clips.pop().is_some(), "pop_clip without matching push");
                self.stats.clip_pops += 1;
            }
            RenderCommand::Callback(_) => unreachable!("callbacks are expanded by the batch walk"),
            draw => {
                let Some(geometry) = draw.geometry() else {
                    return;
                };
                self.executed.push(ExecutedDraw {
                    kind: draw.kind_name(),
                    transform: self.current_transform(),
                    clip: self.clips.last().copied(),
                    vertex_count: geometry.vertex_count,
                    bounds: vertex_bounds(&geometry.vertices, layout_of(draw)),
                });
                self.stats.draws += 1;
            }
        }
    }
}

impl Drop for Execution<'_> {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            return;
        }
        // Unwinding out of a batch: close what it opened so the backend is
        // usable for the next frame.
        while self.transforms.len() > 1 {
            self.transforms.pop();
            self.stats.transform_pops += 1;
        }
        while self.clips.pop().is_some() {
            self.stats.clip_pops += 1;
        }
    }
}

fn layout_of(command: &RenderCommand) -> VertexLayout {
    match command {
        RenderCommand::DrawPositions(_) => VertexLayout::Position,
        RenderCommand::DrawColored(_) | RenderCommand::RoundedRect { .. } | RenderCommand::Bezier(_) => {
            VertexLayout::PositionColor
        }
        _ => VertexLayout::PositionColorTexture,
    }
}

fn vertex_bounds(vertices: &[f32], layout: VertexLayout) -> Rect {
    let mut min = [f32::INFINITY; 2];
    let mut max = [f32::NEG_INFINITY; 2];
    for vertex in vertices.chunks_exact(layout.floats_per_vertex()) {
        min = [min[0].min(vertex[0]), min[1].min(vertex[1])];
        max = [max[0].max(vertex[0]), max[1].max(vertex[1])];
    }
    if min[0] > max[0] {
        return Rect::ZERO;
    }
    Rect::new(min[0], min[1], max[0] - min[0], max[1] - min[1])
}

fn transform_rect(matrix: Mat4, rect: Rect) -> Rect {
    let a = matrix.transform_point3(Vec3::new(rect.x, rect.y, 0.0));
    let b = matrix.transform_point3(Vec3::new(rect.right(), rect.bottom(), 0.0));
    let (left, right) = (a.x.min(b.x), a.x.max(b.x));
    let (top, bottom) = (a.y.min(b.y), a.y.max(b.y));
    Rect::new(left, top, right - left, bottom - top)
}
