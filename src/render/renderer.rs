use std::ops::{Deref, DerefMut};

use bitflags::bitflags;
use glam::{Mat4, Vec3};

use crate::error::RenderError;
use crate::geometry::Rect;

use super::{BufferRef, NullRenderer, RenderBatch, RenderBatchBuilder, TextureDesc, TextureRef, TransformMode};

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct RendererCaps: u32 {
        /// Text is rasterised by a dedicated shader from an atlas.
        const SHADER_TEXT = 1 << 0;
        const TEXTURES = 1 << 1;
        const SCISSOR_CLIP = 1 << 2;
        const INSTANCED_GLYPHS = 1 << 3;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RendererKind {
    OpenGl,
    Metal,
    DirectX,
    Null,
}

impl RendererKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::OpenGl => "opengl",
            Self::Metal => "metal",
            Self::DirectX => "directx",
            Self::Null => "null",
        }
    }
}

/// Backend contract consumed by the element tree.
///
/// Batches and scope operations are queued in call order and executed on
/// `flush`. Every `push_*` must be matched by its `pop_*` before `flush`;
/// prefer the guards returned by [`RendererExt`].
pub trait Renderer {
    fn capabilities(&self) -> RendererCaps;

    fn create_command_builder(&self) -> RenderBatchBuilder {
        RenderBatchBuilder::new(self.capabilities())
    }

    fn enqueue_commands(&mut self, batch: &RenderBatch);

    fn flush(&mut self);

    fn push_transform(&mut self, matrix: Mat4, mode: TransformMode);

    fn pop_transform(&mut self);

    fn push_clip(&mut self, region: Rect);

    fn pop_clip(&mut self);

    /// Transform that queued commands will be drawn with.
    fn current_transform(&self) -> Mat4;

    /// `None` when the backend cannot allocate the texture.
    fn create_texture(&mut self, desc: TextureDesc, pixels: &[u8]) -> Option<TextureRef>;

    fn create_buffer(&mut self, bytes: &[u8]) -> Option<BufferRef>;
}

/// Scoped helpers available on every renderer, trait objects included.
pub trait RendererExt: Renderer {
    fn transform(&mut self, matrix: Mat4, mode: TransformMode) -> RenderScope<'_, Self> {
        self.push_transform(matrix, mode);
        RenderScope {
            renderer: self,
            kind: ScopeKind::Transform,
        }
    }

    fn translate_transform(&mut self, x: f32, y: f32) -> RenderScope<'_, Self> {
        self.transform(Mat4::from_translation(Vec3::new(x, y, 0.0)), TransformMode::Multiply)
    }

    fn clip(&mut self, region: Rect) -> RenderScope<'_, Self> {
        self.push_clip(region);
        RenderScope {
            renderer: self,
            kind: ScopeKind::Clip,
        }
    }

    fn upload_vertices(&mut self, vertices: &[f32]) -> Option<BufferRef> {
        self.create_buffer(bytemuck::cast_slice(vertices))
    }

    fn try_create_texture(&mut self, desc: TextureDesc, pixels: &[u8]) -> Result<TextureRef, RenderError> {
        self.create_texture(desc, pixels).ok_or_else(|| {
            RenderError::ResourceCreation(format!(
                "{}x{} {:?} texture from {} bytes",
                desc.width,
                desc.height,
                desc.format,
                pixels.len()
            ))
        })
    }
}

impl<R: Renderer + ?Sized> RendererExt for R {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScopeKind {
    Transform,
    Clip,
}

/// Emits the matching pop when dropped, unwinding included.
pub struct RenderScope<'a, R: Renderer + ?Sized> {
    renderer: &'a mut R,
    kind: ScopeKind,
}

impl<R: Renderer + ?Sized> Deref for RenderScope<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        self.renderer
    }
}

impl<R: Renderer + ?Sized> DerefMut for RenderScope<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        self.renderer
    }
}

impl<R: Renderer + ?Sized> Drop for RenderScope<'_, R> {
    fn drop(&mut self) {
        match self.kind {
            ScopeKind::Transform => self.renderer.pop_transform(),
            ScopeKind::Clip => self.renderer.pop_clip(),
        }
    }
}

pub fn create_renderer(kind: RendererKind) -> Result<Box<dyn Renderer>, RenderError> {
    match kind {
        RendererKind::Null => Ok(Box::new(NullRenderer::new())),
        other => {
            tracing::warn!(backend = other.name(), "renderer backend not compiled in");
            Err(RenderError::UnsupportedBackend(other.name()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use glam::{Mat4, Vec3};

    use super::{Renderer, RendererExt, RendererKind, create_renderer};
    use crate::error::RenderError;
    use crate::geometry::Rect;
    use crate::render::{NullRenderer, TextureDesc, TextureFormat, TransformMode};

    #[test]
    fn scopes_pop_in_reverse_order() {
        let mut renderer = NullRenderer::new();
        {
            let mut clip = renderer.clip(Rect::new(0.0, 0.0, 50.0, 50.0));
            let shifted = clip.translate_transform(10.0, 0.0);
            assert_eq!(
                shifted.current_transform(),
                Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0))
            );
        }
        assert_eq!(renderer.current_transform(), Mat4::IDENTITY);
        assert_eq!(renderer.open_scopes(), 0);
        renderer.flush();
        assert_eq!(renderer.stats().transform_pushes, 1);
        assert_eq!(renderer.stats().transform_pops, 1);
        assert_eq!(renderer.stats().clip_pushes, renderer.stats().clip_pops);
    }

    #[test]
    fn scope_guard_pops_while_unwinding() {
        let mut renderer = NullRenderer::new();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut outer = renderer.transform(Mat4::IDENTITY, TransformMode::Replace);
            let _inner = outer.clip(Rect::new(0.0, 0.0, 1.0, 1.0));
            panic!("draw aborted");
        }));
        assert!(result.is_err());
        assert_eq!(renderer.open_scopes(), 0);
        renderer.flush();
        assert_eq!(renderer.stats().transform_pushes, renderer.stats().transform_pops);
    }

    #[test]
    fn gpu_backends_are_unsupported() {
        assert!(matches!(
            create_renderer(RendererKind::Metal),
            Err(RenderError::UnsupportedBackend("metal"))
        ));
        let mut null = create_renderer(RendererKind::Null).expect("null renderer");
        assert!(null.upload_vertices(&[0.0, 1.0]).is_some());
    }

    #[test]
    fn texture_failures_surface_as_errors() {
        let mut renderer = NullRenderer::new();
        let desc = TextureDesc {
            width: 2,
            height: 2,
            format: TextureFormat::R8,
        };
        assert!(renderer.try_create_texture(desc, &[0; 4]).is_ok());
        assert!(matches!(
            renderer.try_create_texture(desc, &[0; 3]),
            Err(RenderError::ResourceCreation(_))
        ));
    }
}
