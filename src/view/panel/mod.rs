//! Container elements and their layout algorithms.

mod border;
mod grid;
mod item;
mod length;
mod scroll;
mod stack;
mod tree;

pub use border::*;
pub use grid::*;
pub use item::*;
pub use length::*;
pub use scroll::*;
pub use stack::*;
pub use tree::*;

use crate::geometry::{Rect, Size};
use crate::render::RenderBatchBuilder;
use crate::style::{Color, Invalidates, UiProperty, kind_property_owner, ui_property};
use crate::view::element::element_boilerplate;
use crate::view::{
    Element, ElementId, HorizontalAlign, HorizontalAlignment, InputTarget, LayoutCx, Layoutable,
    Renderable, VerticalAlign, VerticalAlignment, VisualCx,
};

/// Rectangle a child with `desired` size (margin included) takes inside
/// `slot`. Stretch fills the slot along that axis; any other alignment keeps
/// the desired extent, capped by the slot.
pub fn align_in_slot(
    slot: Rect,
    desired: Size,
    horizontal: HorizontalAlignment,
    vertical: VerticalAlignment,
) -> Rect {
    let width = desired.width.min(slot.width);
    let height = desired.height.min(slot.height);
    let (x, width) = match horizontal {
        HorizontalAlignment::Stretch => (slot.x, slot.width),
        HorizontalAlignment::Left => (slot.x, width),
        HorizontalAlignment::Center => (slot.x + (slot.width - width) * 0.5, width),
        HorizontalAlignment::Right => (slot.right() - width, width),
    };
    let (y, height) = match vertical {
        VerticalAlignment::Stretch => (slot.y, slot.height),
        VerticalAlignment::Top => (slot.y, height),
        VerticalAlignment::Center => (slot.y + (slot.height - height) * 0.5, height),
        VerticalAlignment::Bottom => (slot.bottom() - height, height),
    };
    Rect::new(x, y, width, height)
}

/// Arranges `child` inside `slot` according to its own alignment.
pub(crate) fn arrange_aligned(cx: &mut LayoutCx<'_>, child: ElementId, slot: Rect) {
    let horizontal = cx.get::<HorizontalAlign>(child);
    let vertical = cx.get::<VerticalAlign>(child);
    let rect = align_in_slot(slot, cx.desired_size(child), horizontal, vertical);
    cx.arrange_child(child, rect);
}

/// Generic container: every child gets the whole content area and aligns
/// itself inside it. Later children draw on top.
pub struct Panel {
    background: UiProperty<Color>,
}

kind_property_owner!(Panel);
ui_property!(pub PanelBackground: Panel => background: Color);

impl Default for Panel {
    fn default() -> Self {
        Self::new()
    }
}

impl Panel {
    pub fn new() -> Self {
        Self {
            background: UiProperty::new(Color::TRANSPARENT, Invalidates::Visuals),
        }
    }
}

impl Layoutable for Panel {
    fn on_measure(&mut self, cx: &mut LayoutCx<'_>, available: Size) -> Size {
        let mut size = Size::ZERO;
        for child in cx.children() {
            size = size.max(cx.measure_child(child, available));
        }
        size
    }

    fn on_arrange(&mut self, cx: &mut LayoutCx<'_>, inside: Rect) {
        for child in cx.children() {
            arrange_aligned(cx, child, inside);
        }
    }
}

impl Renderable for Panel {
    fn on_update_visuals(&mut self, cx: &mut VisualCx<'_>, builder: &mut RenderBatchBuilder) {
        let background = self.background.get(&mut cx.props());
        if !background.is_transparent() {
            builder.colored_rect(cx.actual_rect(), background);
        }
    }
}

impl InputTarget for Panel {}

impl Element for Panel {
    element_boilerplate!("panel");
}
