//! Text measurement and the `TextBlock` leaf element.

use std::sync::{Arc, Mutex, PoisonError};

use cosmic_text::{Align, Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Wrap};
use once_cell::sync::Lazy;
use smol_str::SmolStr;

use crate::geometry::{Rect, Size};
use crate::render::{GlyphQuad, RenderBatchBuilder};
use crate::style::{Color, Invalidates, UiProperty, kind_property_owner, ui_property};
use crate::view::element::element_boilerplate;
use crate::view::{Element, InputTarget, LayoutCx, Layoutable, Renderable, VisualCx};

#[derive(Clone, Debug, PartialEq)]
pub struct FontSpec {
    /// `None` picks the platform sans-serif.
    pub family: Option<SmolStr>,
    pub size: f32,
    /// Multiple of `size`.
    pub line_height: f32,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: None,
            size: 14.0,
            line_height: 1.25,
        }
    }
}

impl FontSpec {
    pub fn sized(size: f32) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    fn line_height_px(&self) -> f32 {
        (self.size * self.line_height.max(0.8)).max(1.0)
    }
}

/// Shapes and lays out a run of text. Coordinates of the geometry are
/// relative to the top-left corner of the text box.
pub trait FormattedText {
    fn set_text(&mut self, text: &str);
    fn set_font(&mut self, font: FontSpec);
    /// `f32::INFINITY` disables wrapping.
    fn set_max_width(&mut self, width: f32);
    fn set_max_height(&mut self, height: f32);
    fn build_geometry(&mut self) -> Vec<GlyphQuad>;
    fn bounds(&mut self) -> Size;
    /// Distance from the top of the box to the first baseline.
    fn baseline(&mut self) -> f32;
}

/// Font-free layout from per-character width estimates. Wraps at glyph
/// boundaries.
#[derive(Clone, Debug, Default)]
pub struct EstimatedText {
    text: String,
    font: FontSpec,
    max_width: Option<f32>,
    max_height: Option<f32>,
}

impl EstimatedText {
    pub fn new() -> Self {
        Self::default()
    }

    fn lines(&self) -> Vec<Vec<(char, f32, f32)>> {
        let limit = self.max_width.unwrap_or(f32::INFINITY);
        let mut lines = Vec::new();
        for source in self.text.split('\n') {
            let mut line = Vec::new();
            let mut x = 0.0;
            for ch in source.chars() {
                let width = estimate_char_width_px(ch, self.font.size);
                if x + width > limit && !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                    x = 0.0;
                }
                line.push((ch, x, width));
                x += width;
            }
            lines.push(line);
        }
        lines
    }
}

impl FormattedText for EstimatedText {
    fn set_text(&mut self, text: &str) {
        text.clone_into(&mut self.text);
    }

    fn set_font(&mut self, font: FontSpec) {
        self.font = font;
    }

    fn set_max_width(&mut self, width: f32) {
        self.max_width = width.is_finite().then_some(width);
    }

    fn set_max_height(&mut self, height: f32) {
        self.max_height = height.is_finite().then_some(height);
    }

    fn build_geometry(&mut self) -> Vec<GlyphQuad> {
        let line_height = self.font.line_height_px();
        let max_height = self.max_height.unwrap_or(f32::INFINITY);
        let mut quads = Vec::new();
        for (row, line) in self.lines().into_iter().enumerate() {
            let top = row as f32 * line_height;
            if top >= max_height {
                break;
            }
            quads.extend(line.into_iter().filter(|(ch, _, _)| !ch.is_whitespace()).map(
                |(_, x, width)| GlyphQuad {
                    rect: Rect::new(x, top, width, line_height),
                    uv: Rect::ZERO,
                },
            ));
        }
        quads
    }

    fn bounds(&mut self) -> Size {
        if self.text.is_empty() {
            return Size::ZERO;
        }
        let lines = self.lines();
        let width = lines
            .iter()
            .map(|line| line.last().map_or(0.0, |(_, x, w)| x + w))
            .fold(0.0, f32::max);
        Size::new(width, lines.len() as f32 * self.font.line_height_px())
    }

    fn baseline(&mut self) -> f32 {
        let line_height = self.font.line_height_px();
        (line_height - self.font.size) * 0.5 + self.font.size * 0.8
    }
}

fn estimate_char_width_px(ch: char, font_size: f32) -> f32 {
    // CJK and fullwidth glyphs are near 1em, ASCII is narrower and
    // whitespace narrower still.
    if ch == '\t' {
        return font_size * 2.0;
    }
    if ch.is_whitespace() {
        return font_size * 0.33;
    }
    if ch.is_ascii() {
        return font_size * 0.56;
    }
    font_size
}

static FONT_SYSTEM: Lazy<Arc<Mutex<FontSystem>>> = Lazy::new(|| Arc::new(Mutex::new(FontSystem::new())));

/// Real shaping through `cosmic-text`.
pub struct CosmicText {
    font_system: Arc<Mutex<FontSystem>>,
    text: String,
    font: FontSpec,
    max_width: Option<f32>,
    max_height: Option<f32>,
    buffer: Option<Buffer>,
}

impl CosmicText {
    /// Uses the process-wide font system, loading system fonts on first use.
    pub fn new() -> Self {
        Self::with_font_system(FONT_SYSTEM.clone())
    }

    pub fn with_font_system(font_system: Arc<Mutex<FontSystem>>) -> Self {
        Self {
            font_system,
            text: String::new(),
            font: FontSpec::default(),
            max_width: None,
            max_height: None,
            buffer: None,
        }
    }

    fn shaped(&mut self) -> &Buffer {
        let buffer = match self.buffer.take() {
            Some(buffer) => buffer,
            None => self.shape(),
        };
        self.buffer.insert(buffer)
    }

    fn shape(&self) -> Buffer {
        let mut font_system = self.font_system.lock().unwrap_or_else(PoisonError::into_inner);
        let mut buffer = Buffer::new(
            &mut font_system,
            Metrics::new(self.font.size.max(1.0), self.font.line_height_px()),
        );
        buffer.set_wrap(&mut font_system, Wrap::WordOrGlyph);
        buffer.set_size(&mut font_system, self.max_width, self.max_height);
        let attrs = match &self.font.family {
            Some(family) => Attrs::new().family(Family::Name(family.as_str())),
            None => Attrs::new().family(Family::SansSerif),
        };
        buffer.set_text(&mut font_system, &self.text, &attrs, Shaping::Advanced, Some(Align::Left));
        buffer.shape_until_scroll(&mut font_system, false);
        buffer
    }
}

impl Default for CosmicText {
    fn default() -> Self {
        Self::new()
    }
}

impl FormattedText for CosmicText {
    fn set_text(&mut self, text: &str) {
        if self.text != text {
            text.clone_into(&mut self.text);
            self.buffer = None;
        }
    }

    fn set_font(&mut self, font: FontSpec) {
        if self.font != font {
            self.font = font;
            self.buffer = None;
        }
    }

    fn set_max_width(&mut self, width: f32) {
        let width = width.is_finite().then_some(width.max(1.0));
        if self.max_width != width {
            self.max_width = width;
            self.buffer = None;
        }
    }

    fn set_max_height(&mut self, height: f32) {
        let height = height.is_finite().then_some(height.max(1.0));
        if self.max_height != height {
            self.max_height = height;
            self.buffer = None;
        }
    }

    fn build_geometry(&mut self) -> Vec<GlyphQuad> {
        let buffer = self.shaped();
        let mut quads = Vec::new();
        for run in buffer.layout_runs() {
            for glyph in run.glyphs {
                quads.push(GlyphQuad {
                    rect: Rect::new(glyph.x, run.line_top, glyph.w, run.line_height),
                    uv: Rect::ZERO,
                });
            }
        }
        quads
    }

    fn bounds(&mut self) -> Size {
        let buffer = self.shaped();
        let mut size = Size::ZERO;
        for run in buffer.layout_runs() {
            size.width = size.width.max(run.line_w);
            size.height = size.height.max(run.line_top + run.line_height);
        }
        size
    }

    fn baseline(&mut self) -> f32 {
        let buffer = self.shaped();
        buffer.layout_runs().next().map_or(0.0, |run| run.line_y)
    }
}

/// Leaf element showing a run of text.
pub struct TextBlock {
    text: UiProperty<SmolStr>,
    font_size: UiProperty<f32>,
    color: UiProperty<Color>,
    layout: Box<dyn FormattedText>,
}

kind_property_owner!(TextBlock);
ui_property!(pub TextContent: TextBlock => text: SmolStr);
ui_property!(pub FontSize: TextBlock => font_size: f32);
ui_property!(pub TextColor: TextBlock => color: Color);

impl TextBlock {
    /// Laid out with [`EstimatedText`]; see [`TextBlock::with_layout`].
    pub fn new(text: impl Into<SmolStr>) -> Self {
        Self::with_layout(text, Box::new(EstimatedText::new()))
    }

    pub fn with_layout(text: impl Into<SmolStr>, layout: Box<dyn FormattedText>) -> Self {
        Self {
            text: UiProperty::new(text.into(), Invalidates::SelfLayout),
            font_size: UiProperty::new(14.0, Invalidates::SelfLayout)
                .themed("text.size")
                .with_setter(|size: f32| size.max(1.0)),
            color: UiProperty::new(Color::BLACK, Invalidates::Visuals).themed("text.color"),
            layout,
        }
    }

    pub fn baseline(&mut self) -> f32 {
        self.layout.baseline()
    }
}

impl Layoutable for TextBlock {
    fn on_measure(&mut self, cx: &mut LayoutCx<'_>, available: Size) -> Size {
        let text = self.text.get(&mut cx.props());
        let size = self.font_size.get(&mut cx.props());
        self.layout.set_text(&text);
        self.layout.set_font(FontSpec::sized(size));
        self.layout.set_max_width(available.width);
        self.layout.set_max_height(available.height);
        self.layout.bounds()
    }

    fn on_arrange(&mut self, _cx: &mut LayoutCx<'_>, inside: Rect) {
        self.layout.set_max_width(inside.width);
        self.layout.set_max_height(inside.height);
    }
}

impl Renderable for TextBlock {
    fn on_update_visuals(&mut self, cx: &mut VisualCx<'_>, builder: &mut RenderBatchBuilder) {
        let color = self.color.get(&mut cx.props());
        let glyphs = self.layout.build_geometry();
        builder.text(cx.inside_rect().origin(), &glyphs, color, None);
    }
}

impl InputTarget for TextBlock {}

impl Element for TextBlock {
    element_boilerplate!("text_block");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{EstimatedText, FontSize, FontSpec, FormattedText, TextBlock, TextContent};
    use crate::geometry::Size;
    use crate::render::{NullRenderer, RenderCommand, RendererCaps};
    use crate::style::{ThemeEngine, ThemeValue};
    use crate::view::UiTree;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn estimate_wraps_at_max_width() {
        let mut text = EstimatedText::new();
        text.set_font(FontSpec::sized(10.0));
        text.set_text("abcd");
        let bounds = text.bounds();
        assert!(close(bounds.width, 22.4));
        assert_eq!(bounds.height, 12.5);

        text.set_max_width(12.0);
        let bounds = text.bounds();
        assert_eq!(bounds.height, 25.0);
        assert!(bounds.width <= 12.0);
        let glyphs = text.build_geometry();
        assert_eq!(glyphs.len(), 4);
        assert_eq!(glyphs[2].rect.y, 12.5);
        assert_eq!(glyphs[2].rect.x, 0.0);
    }

    #[test]
    fn whitespace_has_width_but_no_glyph() {
        let mut text = EstimatedText::new();
        text.set_font(FontSpec::sized(10.0));
        text.set_text("a b\n\tc");
        let glyphs = text.build_geometry();
        assert_eq!(glyphs.len(), 3);
        let last = glyphs[2].rect;
        assert!(close(last.x, 20.0) && close(last.width, 5.6));
        assert_eq!(last.y, 12.5);
    }

    #[test]
    fn text_block_measures_with_themed_size() {
        let theme = ThemeEngine::new().with("text.size", ThemeValue::Number(20.0));
        let mut tree = UiTree::new().with_theme(Arc::new(theme));
        let block = tree.insert(TextBlock::new("hi"));
        tree.set_root(block);
        assert_eq!(tree.get::<FontSize>(block), 20.0);
        let desired = tree.measure(block, Size::new(500.0, 500.0));
        assert!(close(desired.width, 22.4));
        assert_eq!(desired.height, 25.0);

        tree.set::<TextContent>(block, "hi!".into());
        assert!(tree.core(block).needs_measure());
        assert!(close(tree.measure(block, Size::new(500.0, 500.0)).width, 33.6));
    }

    #[test]
    fn shader_text_backends_get_one_text_command() {
        let mut tree = UiTree::new();
        let block = tree.insert(TextBlock::new("abc"));
        tree.set_root(block);
        let mut renderer = NullRenderer::with_caps(RendererCaps::SHADER_TEXT);
        tree.run_frame(Size::new(100.0, 40.0), &mut renderer);
        assert!(matches!(tree.core(block).batch().commands(), [RenderCommand::Text(_)]));

        let mut plain = NullRenderer::new();
        let mut tree = UiTree::new();
        let block = tree.insert(TextBlock::new("abc"));
        tree.set_root(block);
        tree.run_frame(Size::new(100.0, 40.0), &mut plain);
        assert!(matches!(
            tree.core(block).batch().commands(),
            [RenderCommand::GlyphBatch { glyph_count: 3, .. }]
        ));
    }
}
