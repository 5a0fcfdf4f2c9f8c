//! Arena-backed element tree and the measure / arrange / visuals / draw
//! protocol every element kind plugs into.

mod attached;
mod context;
mod core;
mod tree;

use std::any::Any;

pub use attached::*;
pub use context::*;
pub use self::core::*;
pub use tree::*;

use crate::geometry::{Point, Rect, Size};
use crate::render::RenderBatchBuilder;

slotmap::new_key_type! {
    /// Stable handle of an element inside its [`UiTree`].
    pub struct ElementId;
}

pub trait Layoutable {
    /// Desired content size for `available`, which already excludes margin,
    /// border and padding and may be infinite along either axis.
    fn on_measure(&mut self, cx: &mut LayoutCx<'_>, available: Size) -> Size;

    /// Places children inside `inside`, the content rectangle in tree
    /// coordinates.
    fn on_arrange(&mut self, cx: &mut LayoutCx<'_>, inside: Rect);
}

pub trait Renderable {
    /// Rebuilds the element's own batch after layout changed it.
    fn on_update_visuals(&mut self, _cx: &mut VisualCx<'_>, _builder: &mut RenderBatchBuilder) {}

    /// Submits the cached batch and the children, every frame.
    fn on_draw(&mut self, cx: &mut DrawCx<'_>) {
        cx.draw_own_batch();
        cx.draw_children();
    }
}

pub trait InputTarget {
    fn on_input(&mut self, _cx: &mut InputCx<'_>) {}
}

pub trait Element: Layoutable + Renderable + InputTarget + Any {
    fn name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Upper bound on children, checked when one is added.
    fn max_children(&self) -> Option<usize> {
        None
    }

    /// Children that currently take no part in layout, drawing or input.
    fn is_child_hidden(&self, _index: usize) -> bool {
        false
    }

    /// Offset applied to children when drawing and hit testing.
    fn scroll_offset(&self) -> Point {
        Point::ZERO
    }
}

macro_rules! element_boilerplate {
    ($name:literal) => {
        fn name(&self) -> &'static str {
            $name
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}

pub(crate) use element_boilerplate;
