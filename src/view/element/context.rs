use crate::config::UiConfig;
use crate::geometry::{Point, Rect, Size};
use crate::render::Renderer;
use crate::style::{Property, PropertyCx};
use crate::ui::{InputService, MouseButton};

use super::{AttachedProperty, ElementCore, ElementId, UiTree};

/// Handed to `on_measure` / `on_arrange`.
pub struct LayoutCx<'a> {
    tree: &'a mut UiTree,
    id: ElementId,
}

impl<'a> LayoutCx<'a> {
    pub(crate) fn new(tree: &'a mut UiTree, id: ElementId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn tree(&mut self) -> &mut UiTree {
        self.tree
    }

    pub fn config(&self) -> &UiConfig {
        self.tree.config()
    }

    pub fn core(&self) -> &ElementCore {
        self.tree.core(self.id)
    }

    pub fn children(&self) -> Vec<ElementId> {
        self.tree.children(self.id).to_vec()
    }

    pub fn measure_child(&mut self, child: ElementId, constraint: Size) -> Size {
        self.tree.measure(child, constraint)
    }

    pub fn arrange_child(&mut self, child: ElementId, rect: Rect) {
        self.tree.arrange(child, rect);
    }

    pub fn desired_size(&self, child: ElementId) -> Size {
        self.tree.core(child).desired_size()
    }

    pub fn get<P: Property>(&mut self, id: ElementId) -> P::Value {
        self.tree.get::<P>(id)
    }

    pub fn attached_or<A: AttachedProperty>(&self, child: ElementId, default: A::Value) -> A::Value {
        self.tree.attached_or::<A>(child, default)
    }

    /// Reads the element's own kind properties.
    pub fn props(&mut self) -> PropertyCx<'_> {
        self.tree.property_cx(self.id)
    }
}

/// Handed to `on_update_visuals`.
pub struct VisualCx<'a> {
    tree: &'a mut UiTree,
    id: ElementId,
    renderer: &'a mut dyn Renderer,
}

impl<'a> VisualCx<'a> {
    pub(crate) fn new(tree: &'a mut UiTree, id: ElementId, renderer: &'a mut dyn Renderer) -> Self {
        Self { tree, id, renderer }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn core(&self) -> &ElementCore {
        self.tree.core(self.id)
    }

    pub fn actual_rect(&self) -> Rect {
        self.core().actual_rect()
    }

    pub fn inside_rect(&self) -> Rect {
        self.core().inside_rect()
    }

    pub fn get<P: Property>(&mut self, id: ElementId) -> P::Value {
        self.tree.get::<P>(id)
    }

    pub fn props(&mut self) -> PropertyCx<'_> {
        self.tree.property_cx(self.id)
    }

    /// For resources such as glyph atlases.
    pub fn renderer(&mut self) -> &mut dyn Renderer {
        self.renderer
    }
}

/// Handed to `on_draw`.
pub struct DrawCx<'a> {
    tree: &'a mut UiTree,
    id: ElementId,
    renderer: &'a mut dyn Renderer,
}

impl<'a> DrawCx<'a> {
    pub(crate) fn new(tree: &'a mut UiTree, id: ElementId, renderer: &'a mut dyn Renderer) -> Self {
        Self { tree, id, renderer }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn core(&self) -> &ElementCore {
        self.tree.core(self.id)
    }

    pub fn draw_own_batch(&mut self) {
        let batch = self.tree.core(self.id).batch();
        self.renderer.enqueue_commands(batch);
    }

    pub fn draw_children(&mut self) {
        for child in self.tree.children(self.id).to_vec() {
            self.tree.draw(child, &mut *self.renderer);
        }
    }

    pub fn draw_child(&mut self, child: ElementId) {
        self.tree.draw(child, &mut *self.renderer);
    }

    /// Tree and renderer together, for drawing children inside a scope the
    /// element opens itself.
    pub fn split(&mut self) -> (&mut UiTree, &mut dyn Renderer) {
        (&mut *self.tree, &mut *self.renderer)
    }
}

/// Handed to `on_input`. Pointer positions are in the element's layout
/// coordinates, scroll offsets of ancestors already applied.
pub struct InputCx<'a> {
    tree: &'a mut UiTree,
    id: ElementId,
    input: &'a dyn InputService,
    offset: Point,
    wheel: &'a mut Point,
}

impl<'a> InputCx<'a> {
    pub(crate) fn new(
        tree: &'a mut UiTree,
        id: ElementId,
        input: &'a dyn InputService,
        offset: Point,
        wheel: &'a mut Point,
    ) -> Self {
        Self {
            tree,
            id,
            input,
            offset,
            wheel,
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn core(&self) -> &ElementCore {
        self.tree.core(self.id)
    }

    pub fn config(&self) -> &UiConfig {
        self.tree.config()
    }

    /// Core of any element in the tree, e.g. a child's layout result.
    pub fn core_of(&self, id: ElementId) -> &ElementCore {
        self.tree.core(id)
    }

    /// Polled input with the pointer mapped into layout coordinates.
    pub fn input(&self) -> OffsetInput<'_> {
        OffsetInput {
            inner: self.input,
            offset: self.offset,
        }
    }

    pub fn is_pointer_inside(&self, rect: Rect) -> bool {
        self.input().pointer_position().is_some_and(|p| rect.contains(p))
    }

    /// Wheel notches not yet consumed by a deeper element.
    pub fn wheel(&self) -> Point {
        *self.wheel
    }

    pub fn consume_wheel(&mut self) -> Point {
        std::mem::replace(self.wheel, Point::ZERO)
    }

    pub fn props(&mut self) -> PropertyCx<'_> {
        self.tree.property_cx(self.id)
    }

    pub fn invalidate_visuals(&mut self) {
        self.tree.invalidate_visuals(self.id);
    }

    pub fn invalidate_layout(&mut self) {
        self.tree.invalidate_layout(self.id);
    }
}

pub struct OffsetInput<'a> {
    inner: &'a dyn InputService,
    offset: Point,
}

impl InputService for OffsetInput<'_> {
    fn pointer_position(&self) -> Option<Point> {
        self.inner
            .pointer_position()
            .map(|p| Point::new(p.x + self.offset.x, p.y + self.offset.y))
    }

    fn is_button_down(&self, button: MouseButton) -> bool {
        self.inner.is_button_down(button)
    }

    fn wheel_delta(&self) -> Point {
        self.inner.wheel_delta()
    }
}
