use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::SlotMap;
use tracing::{debug, trace};

use crate::config::UiConfig;
use crate::geometry::{Point, Rect, Size, Thickness};
use crate::render::{Renderer, RendererExt};
use crate::style::{self, Invalidates, Property, PropertyCx, PropertyOwner, ThemeEngine};
use crate::transition::{FrameSync, Tween, TweenRegistry, TweenTarget};
use crate::ui::InputService;

use super::{
    AttachedProperty, BorderThickness, ClipToBounds, DrawCx, Element, ElementCore, ElementId,
    Height, InputCx, LayoutCx, LayoutFlags, Margin, MaxHeight, MaxWidth, MinHeight, MinWidth,
    Padding, PixelPerfect, Visible, VisualCx, Width,
};

/// Distinguishes trees in process-wide registries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(u64);

impl TreeId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

struct Node {
    core: ElementCore,
    /// Taken out while one of the element's own callbacks runs.
    kind: Option<Box<dyn Element>>,
}

/// Box-model properties read once per measure or arrange.
#[derive(Clone, Copy, Debug)]
struct BoxProps {
    width: Option<f32>,
    height: Option<f32>,
    min: Size,
    max: Size,
    margin: Thickness,
    chrome: Thickness,
    pixel_perfect: bool,
    visible: bool,
}

/// Owns every element. Parents refer to children by id; the child list of
/// a parent is the only record of sibling order.
pub struct UiTree {
    id: TreeId,
    nodes: SlotMap<ElementId, Node>,
    root: Option<ElementId>,
    theme: Arc<ThemeEngine>,
    config: UiConfig,
    invalidations: Vec<(ElementId, Invalidates)>,
    frame_sync: FrameSync,
}

impl Default for UiTree {
    fn default() -> Self {
        Self::new()
    }
}

impl UiTree {
    /// Empty tree using the current process theme and default config.
    pub fn new() -> Self {
        Self::with_config(UiConfig::default())
    }

    pub fn with_config(config: UiConfig) -> Self {
        Self {
            id: TreeId::next(),
            nodes: SlotMap::with_key(),
            root: None,
            theme: style::theme::current(),
            config,
            invalidations: Vec::new(),
            frame_sync: FrameSync::new(),
        }
    }

    pub fn with_theme(mut self, theme: Arc<ThemeEngine>) -> Self {
        self.theme = theme;
        self
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn config(&self) -> &UiConfig {
        &self.config
    }

    pub fn theme(&self) -> &ThemeEngine {
        &self.theme
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(id)
    }

    // ---- structure ----

    pub fn insert<E: Element>(&mut self, kind: E) -> ElementId {
        let id = self.nodes.insert_with_key(|id| Node {
            core: ElementCore::new(id),
            kind: Some(Box::new(kind)),
        });
        debug!(?id, kind = self.kind_name(id), "element inserted");
        id
    }

    pub fn root(&self) -> Option<ElementId> {
        self.root
    }

    pub fn set_root(&mut self, id: ElementId) {
        assert!(
            self.node(id).core.parent.is_none(),
            "root element {id:?} must not have a parent"
        );
        self.root = Some(id);
        self.invalidate_layout(id);
    }

    pub fn add_child(&mut self, parent: ElementId, child: ElementId) {
        let index = self.node(parent).core.children.len();
        self.insert_child(parent, index, child);
    }

    pub fn insert_child(&mut self, parent: ElementId, index: usize, child: ElementId) {
        assert!(
            self.node(child).core.parent.is_none(),
            "element {child:?} already has a parent"
        );
        assert!(
            !self.is_ancestor_or_self(child, parent),
            "adding {child:?} under {parent:?} would create a cycle"
        );
        assert!(Some(child) != self.root, "the root element cannot become a child");
        let count = self.node(parent).core.children.len();
        if let Some(max) = self.node(parent).kind.as_ref().and_then(|k| k.max_children()) {
            assert!(
                count < max,
                "{} accepts at most {max} child element(s)",
                self.kind_name(parent)
            );
        }

        self.node_mut(parent).core.children.insert(index, child);
        self.node_mut(child).core.parent = Some(parent);
        self.invalidate_layout(child);
        self.invalidate_layout(parent);
    }

    /// Unlinks `child` from its parent; the subtree stays alive.
    pub fn detach(&mut self, child: ElementId) -> bool {
        let Some(parent) = self.node(child).core.parent else {
            return false;
        };
        self.node_mut(parent).core.children.retain(|c| *c != child);
        self.node_mut(child).core.parent = None;
        self.invalidate_layout(parent);
        true
    }

    /// Destroys `id` and its whole subtree. Running tweens for the removed
    /// elements are unregistered first.
    pub fn remove(&mut self, id: ElementId) {
        self.detach(id);
        let mut doomed = Vec::new();
        self.collect_subtree(id, &mut doomed);
        let registry = TweenRegistry::global();
        for element in &doomed {
            registry.unregister(TweenTarget {
                tree: self.id,
                element: *element,
            });
        }
        for element in &doomed {
            self.nodes.remove(*element);
        }
        if self.root == Some(id) {
            self.root = None;
        }
        debug!(?id, removed = doomed.len(), "subtree removed");
    }

    fn collect_subtree(&self, id: ElementId, out: &mut Vec<ElementId>) {
        for child in &self.node(id).core.children {
            self.collect_subtree(*child, out);
        }
        out.push(id);
    }

    fn is_ancestor_or_self(&self, candidate: ElementId, mut id: ElementId) -> bool {
        loop {
            if id == candidate {
                return true;
            }
            match self.node(id).core.parent {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.node(id).core.parent
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        &self.node(id).core.children
    }

    pub fn first_child(&self, id: ElementId) -> Option<ElementId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: ElementId) -> Option<ElementId> {
        self.children(id).last().copied()
    }

    pub fn next_sibling(&self, id: ElementId) -> Option<ElementId> {
        let (siblings, index) = self.sibling_position(id)?;
        siblings.get(index + 1).copied()
    }

    pub fn prev_sibling(&self, id: ElementId) -> Option<ElementId> {
        let (siblings, index) = self.sibling_position(id)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    fn sibling_position(&self, id: ElementId) -> Option<(&[ElementId], usize)> {
        let parent = self.node(id).core.parent?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|c| *c == id)?;
        Some((siblings, index))
    }

    pub fn core(&self, id: ElementId) -> &ElementCore {
        &self.node(id).core
    }

    /// Concrete kind of an element, `None` for another kind.
    pub fn kind<K: Element>(&self, id: ElementId) -> Option<&K> {
        self.node(id).kind.as_ref()?.as_any().downcast_ref::<K>()
    }

    /// Mutable kind access. Changes made through it bypass property
    /// invalidation; call `invalidate_*` as needed.
    pub fn kind_mut<K: Element>(&mut self, id: ElementId) -> Option<&mut K> {
        self.node_mut(id).kind.as_mut()?.as_any_mut().downcast_mut::<K>()
    }

    pub fn kind_name(&self, id: ElementId) -> &'static str {
        self.node(id).kind.as_ref().map_or("<busy>", |k| k.name())
    }

    fn node(&self, id: ElementId) -> &Node {
        self.nodes
            .get(id)
            .unwrap_or_else(|| panic!("element {id:?} is not part of this tree"))
    }

    fn node_mut(&mut self, id: ElementId) -> &mut Node {
        self.nodes
            .get_mut(id)
            .unwrap_or_else(|| panic!("element {id:?} is not part of this tree"))
    }

    fn with_kind<R>(&mut self, id: ElementId, f: impl FnOnce(&mut dyn Element, &mut UiTree) -> R) -> R {
        let mut kind = self
            .node_mut(id)
            .kind
            .take()
            .unwrap_or_else(|| panic!("element {id:?} re-entered from its own callback"));
        let result = f(kind.as_mut(), self);
        self.node_mut(id).kind = Some(kind);
        result
    }

    // ---- properties ----

    pub fn get<P: Property>(&mut self, id: ElementId) -> P::Value {
        let value = {
            let node = self
                .nodes
                .get_mut(id)
                .unwrap_or_else(|| panic!("element {id:?} is not part of this tree"));
            let owner = P::Owner::project(&mut node.core, node.kind.as_deref_mut());
            let mut cx = PropertyCx::new(id, &self.theme, &mut self.invalidations);
            P::slot(owner).get(&mut cx)
        };
        self.apply_invalidations();
        value
    }

    pub fn set<P: Property>(&mut self, id: ElementId, value: P::Value) {
        {
            let node = self
                .nodes
                .get_mut(id)
                .unwrap_or_else(|| panic!("element {id:?} is not part of this tree"));
            let owner = P::Owner::project(&mut node.core, node.kind.as_deref_mut());
            let mut cx = PropertyCx::new(id, &self.theme, &mut self.invalidations);
            P::slot(owner).set(value, &mut cx);
        }
        self.apply_invalidations();
    }

    pub fn unset<P: Property>(&mut self, id: ElementId) {
        {
            let node = self
                .nodes
                .get_mut(id)
                .unwrap_or_else(|| panic!("element {id:?} is not part of this tree"));
            let owner = P::Owner::project(&mut node.core, node.kind.as_deref_mut());
            let mut cx = PropertyCx::new(id, &self.theme, &mut self.invalidations);
            P::slot(owner).unset(&mut cx);
        }
        self.apply_invalidations();
    }

    pub(crate) fn property_cx(&mut self, id: ElementId) -> PropertyCx<'_> {
        PropertyCx::new(id, &self.theme, &mut self.invalidations)
    }

    fn apply_invalidations(&mut self) {
        if self.invalidations.is_empty() {
            return;
        }
        for (id, category) in std::mem::take(&mut self.invalidations) {
            if !self.nodes.contains_key(id) {
                continue;
            }
            match category {
                Invalidates::None => {}
                Invalidates::SelfLayout => self.invalidate_layout(id),
                Invalidates::ParentLayout => {
                    let target = self.node(id).core.parent.unwrap_or(id);
                    self.invalidate_layout(target);
                }
                Invalidates::Visuals => self.invalidate_visuals(id),
            }
        }
    }

    // ---- attached properties ----

    /// Stores an attached value on `id` and re-lays out its parent, which is
    /// the element that reads it.
    pub fn set_attached<A: AttachedProperty>(&mut self, id: ElementId, value: A::Value) {
        self.node_mut(id).core.attached.set::<A>(value);
        self.invalidate_parent_layout(id);
    }

    pub fn attached<A: AttachedProperty>(&self, id: ElementId) -> Option<A::Value> {
        self.node(id).core.attached.get::<A>().cloned()
    }

    pub fn attached_or<A: AttachedProperty>(&self, id: ElementId, default: A::Value) -> A::Value {
        self.node(id).core.attached.get_or::<A>(default)
    }

    pub fn remove_attached<A: AttachedProperty>(&mut self, id: ElementId) -> Option<A::Value> {
        let removed = self.node_mut(id).core.attached.remove::<A>();
        if removed.is_some() {
            self.invalidate_parent_layout(id);
        }
        removed
    }

    fn invalidate_parent_layout(&mut self, id: ElementId) {
        let target = self.node(id).core.parent.unwrap_or(id);
        self.invalidate_layout(target);
    }

    // ---- invalidation ----

    /// Marks `id` for measure, arrange and visuals, and every ancestor up to
    /// the root for measure and arrange.
    pub fn invalidate_layout(&mut self, id: ElementId) {
        let core = &mut self.node_mut(id).core;
        core.flags.insert(LayoutFlags::all());
        let mut next = core.parent;
        while let Some(at) = next {
            let core = &mut self.node_mut(at).core;
            core.flags
                .insert(LayoutFlags::NEEDS_MEASURE | LayoutFlags::NEEDS_ARRANGE);
            next = core.parent;
        }
    }

    pub fn invalidate_visuals(&mut self, id: ElementId) {
        self.node_mut(id)
            .core
            .flags
            .insert(LayoutFlags::NEEDS_VISUALS_UPDATE);
    }

    // ---- layout passes ----

    fn box_props(&mut self, id: ElementId) -> BoxProps {
        BoxProps {
            width: self.get::<Width>(id),
            height: self.get::<Height>(id),
            min: Size::new(self.get::<MinWidth>(id), self.get::<MinHeight>(id)),
            max: Size::new(self.get::<MaxWidth>(id), self.get::<MaxHeight>(id)),
            margin: self.get::<Margin>(id),
            chrome: self.get::<BorderThickness>(id) + self.get::<Padding>(id),
            pixel_perfect: self.get::<PixelPerfect>(id),
            visible: self.get::<Visible>(id),
        }
    }

    /// Desired size of `id` for `constraint`, margin included.
    ///
    /// A clean element asked again with the constraint it was last measured
    /// with returns its cached size without running `on_measure`.
    pub fn measure(&mut self, id: ElementId, constraint: Size) -> Size {
        assert!(
            is_valid_extent(constraint.width) && is_valid_extent(constraint.height),
            "{} {id:?} measured with invalid constraint {constraint:?}",
            self.kind_name(id)
        );
        {
            let core = &self.node(id).core;
            if !core.needs_measure() && core.last_constraint == Some(constraint) {
                return core.desired_size;
            }
        }

        let props = self.box_props(id);
        let desired = if props.visible {
            let mut available = constraint.deflate(props.margin).deflate(props.chrome);
            if let Some(width) = props.width {
                available.width = (width - props.chrome.horizontal()).max(0.0);
            }
            if let Some(height) = props.height {
                available.height = (height - props.chrome.vertical()).max(0.0);
            }
            available = available.min(props.max.deflate(props.chrome));

            let content = self.with_kind(id, |kind, tree| {
                kind.on_measure(&mut LayoutCx::new(tree, id), available)
            });
            assert!(
                is_valid_extent(content.width)
                    && is_valid_extent(content.height)
                    && content.width.is_finite()
                    && content.height.is_finite(),
                "{} {id:?} measured to invalid size {content:?}",
                self.kind_name(id)
            );

            let mut size = content.inflate(props.chrome);
            if let Some(width) = props.width {
                size.width = width;
            }
            if let Some(height) = props.height {
                size.height = height;
            }
            size.min(props.max).max(props.min).inflate(props.margin)
        } else {
            Size::ZERO
        };
        self.apply_invalidations();

        if self.config.trace_layout {
            trace!(?id, kind = self.kind_name(id), ?constraint, ?desired, "measure");
        }
        let core = &mut self.node_mut(id).core;
        core.desired_size = desired;
        core.last_constraint = Some(constraint);
        core.flags.remove(LayoutFlags::NEEDS_MEASURE);
        core.flags.insert(LayoutFlags::NEEDS_ARRANGE);
        desired
    }

    /// Places `id` in `rect` (margin included) and arranges its children.
    pub fn arrange(&mut self, id: ElementId, rect: Rect) {
        assert!(
            rect.x.is_finite()
                && rect.y.is_finite()
                && rect.width.is_finite()
                && rect.height.is_finite()
                && is_valid_extent(rect.width)
                && is_valid_extent(rect.height),
            "{} {id:?} arranged into invalid rect {rect:?}",
            self.kind_name(id)
        );
        {
            let core = &self.node(id).core;
            if !core.needs_arrange() && core.slot_rect == Some(rect) {
                return;
            }
        }

        let props = self.box_props(id);
        let mut actual = rect.deflate(props.margin);
        if let Some(width) = props.width {
            actual.width = width;
        }
        if let Some(height) = props.height {
            actual.height = height;
        }
        actual.width = actual.width.min(props.max.width).max(props.min.width);
        actual.height = actual.height.min(props.max.height).max(props.min.height);
        if !props.visible {
            actual.width = 0.0;
            actual.height = 0.0;
        }
        if props.pixel_perfect || self.config.pixel_snap {
            actual = actual.round_to_pixels();
        }
        let inside = actual.deflate(props.chrome);

        let moved = {
            let core = &mut self.node_mut(id).core;
            let moved = core.actual_rect != actual;
            core.slot_rect = Some(rect);
            core.actual_rect = actual;
            core.inside_rect = inside;
            moved
        };
        if props.visible {
            self.with_kind(id, |kind, tree| {
                kind.on_arrange(&mut LayoutCx::new(tree, id), inside)
            });
        }
        self.apply_invalidations();

        if self.config.trace_layout {
            trace!(?id, kind = self.kind_name(id), ?actual, "arrange");
        }
        let core = &mut self.node_mut(id).core;
        core.flags.remove(LayoutFlags::NEEDS_ARRANGE);
        if moved {
            core.flags.insert(LayoutFlags::NEEDS_VISUALS_UPDATE);
        }
    }

    /// Rebuilds the batch of every dirty element in the subtree.
    pub fn update_visuals(&mut self, id: ElementId, renderer: &mut dyn Renderer) {
        if !self.get::<Visible>(id) {
            return;
        }
        if self.node(id).core.needs_visuals_update() {
            let mut builder = renderer.create_command_builder();
            self.with_kind(id, |kind, tree| {
                kind.on_update_visuals(&mut VisualCx::new(tree, id, &mut *renderer), &mut builder)
            });
            self.apply_invalidations();
            let core = &mut self.node_mut(id).core;
            core.batch = builder.build();
            core.flags.remove(LayoutFlags::NEEDS_VISUALS_UPDATE);
        }
        for child in self.shown_children(id) {
            self.update_visuals(child, renderer);
        }
    }

    /// Submits the subtree to `renderer`. Runs every frame.
    pub fn draw(&mut self, id: ElementId, renderer: &mut dyn Renderer) {
        if !self.get::<Visible>(id) {
            return;
        }
        if self.get::<ClipToBounds>(id) {
            let region = self.node(id).core.actual_rect;
            let mut scope = renderer.clip(region);
            self.draw_kind(id, &mut *scope);
        } else {
            self.draw_kind(id, renderer);
        }
    }

    fn draw_kind(&mut self, id: ElementId, renderer: &mut dyn Renderer) {
        self.with_kind(id, |kind, tree| kind.on_draw(&mut DrawCx::new(tree, id, renderer)));
    }

    // ---- input & hit testing ----

    /// Top-most visible element under `point`, in tree coordinates.
    pub fn hit_test(&self, point: Point) -> Option<ElementId> {
        self.hit_test_from(self.root?, point)
    }

    fn hit_test_from(&self, id: ElementId, point: Point) -> Option<ElementId> {
        let node = self.node(id);
        if !node.core.is_visible() || !node.core.actual_rect.contains(point) {
            return None;
        }
        let offset = node.kind.as_ref().map_or(Point::ZERO, |k| k.scroll_offset());
        let inner = Point::new(point.x + offset.x, point.y + offset.y);
        for child in self.shown_children(id).into_iter().rev() {
            if let Some(hit) = self.hit_test_from(child, inner) {
                return Some(hit);
            }
        }
        Some(id)
    }

    /// Children the element does not currently hide, in order.
    fn shown_children(&self, id: ElementId) -> Vec<ElementId> {
        let node = self.node(id);
        node.core
            .children
            .iter()
            .enumerate()
            .filter(|(index, _)| !node.kind.as_ref().is_some_and(|k| k.is_child_hidden(*index)))
            .map(|(_, child)| *child)
            .collect()
    }

    /// Lets every element poll `input`, deepest and top-most first, so inner
    /// scroll panels see the wheel before their ancestors.
    pub fn process_input(&mut self, input: &dyn InputService) {
        let Some(root) = self.root else {
            return;
        };
        let mut wheel = input.wheel_delta();
        self.input_walk(root, input, Point::ZERO, &mut wheel);
        self.apply_invalidations();
    }

    fn input_walk(&mut self, id: ElementId, input: &dyn InputService, offset: Point, wheel: &mut Point) {
        if !self.node(id).core.is_visible() {
            return;
        }
        let scroll = self.node(id).kind.as_ref().map_or(Point::ZERO, |k| k.scroll_offset());
        let child_offset = Point::new(offset.x + scroll.x, offset.y + scroll.y);
        for child in self.shown_children(id).into_iter().rev() {
            self.input_walk(child, input, child_offset, wheel);
        }
        self.with_kind(id, |kind, tree| {
            kind.on_input(&mut InputCx::new(tree, id, input, offset, wheel))
        });
    }

    // ---- cross-thread writes & animation ----

    /// Queue other threads push property writes into.
    pub fn frame_sync(&self) -> FrameSync {
        self.frame_sync.clone()
    }

    /// Runs queued cross-thread writes. Writes aimed at removed elements are
    /// dropped.
    pub fn apply_pending(&mut self) -> usize {
        let mut applied = 0;
        for (target, write) in self.frame_sync.drain() {
            if self.nodes.contains_key(target) {
                write(self, target);
                applied += 1;
            } else {
                debug!(?target, "dropping frame write for removed element");
            }
        }
        applied
    }

    /// Starts `tween` on `id`; each sampled value reaches `apply` through
    /// this tree's frame queue.
    pub fn animate(
        &self,
        id: ElementId,
        tween: Tween,
        apply: impl Fn(&mut UiTree, ElementId, f32) + Send + Sync + 'static,
    ) {
        assert!(self.contains(id), "element {id:?} is not part of this tree");
        TweenRegistry::global().register(
            TweenTarget {
                tree: self.id,
                element: id,
            },
            tween,
            self.frame_sync.clone(),
            Arc::new(apply),
        );
    }

    pub fn is_animating(&self, id: ElementId) -> bool {
        TweenRegistry::global().is_registered(TweenTarget {
            tree: self.id,
            element: id,
        })
    }

    // ---- frame ----

    /// One full frame: pending writes, measure, arrange, visuals, draw,
    /// flush.
    pub fn run_frame(&mut self, viewport: Size, renderer: &mut dyn Renderer) {
        if let Some(root) = self.root {
            self.apply_pending();
            self.measure(root, viewport);
            self.arrange(root, Rect::from_origin_size(Point::ZERO, viewport));
            self.update_visuals(root, renderer);
            self.draw(root, renderer);
        }
        renderer.flush();
    }
}

impl Drop for UiTree {
    fn drop(&mut self) {
        TweenRegistry::global().unregister_tree(self.id);
    }
}

fn is_valid_extent(value: f32) -> bool {
    !value.is_nan() && value >= 0.0
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    use super::UiTree;
    use crate::config::UiConfig;
    use crate::geometry::{Point, Rect, Size, Thickness};
    use crate::render::NullRenderer;
    use crate::style::Color;
    use crate::transition::Tween;
    use crate::view::element::element_boilerplate;
    use crate::view::panel::{Panel, PanelBackground};
    use crate::view::{
        ClipToBounds, Element, ElementId, HorizontalAlign, HorizontalAlignment, InputTarget,
        LayoutCx, Layoutable, Margin, MaxWidth, MinHeight, Renderable, Visible, Width,
    };

    struct Probe {
        measures: Rc<Cell<usize>>,
    }

    impl Layoutable for Probe {
        fn on_measure(&mut self, _cx: &mut LayoutCx<'_>, available: Size) -> Size {
            self.measures.set(self.measures.get() + 1);
            Size::new(available.width.min(33.3), 7.7)
        }

        fn on_arrange(&mut self, _cx: &mut LayoutCx<'_>, _inside: Rect) {}
    }

    impl Renderable for Probe {}
    impl InputTarget for Probe {}

    impl Element for Probe {
        element_boilerplate!("probe");
    }

    fn chain(tree: &mut UiTree) -> (ElementId, ElementId, ElementId) {
        let root = tree.insert(Panel::new());
        let middle = tree.insert(Panel::new());
        let leaf = tree.insert(Panel::new());
        tree.add_child(root, middle);
        tree.add_child(middle, leaf);
        tree.set_root(root);
        (root, middle, leaf)
    }

    fn settle(tree: &mut UiTree) {
        tree.run_frame(Size::new(100.0, 100.0), &mut NullRenderer::new());
    }

    #[test]
    fn measure_twice_is_cached_and_identical() {
        let mut tree = UiTree::new();
        let measures = Rc::new(Cell::new(0));
        let root = tree.insert(Probe {
            measures: measures.clone(),
        });
        tree.set_root(root);
        tree.set::<Margin>(root, Thickness::new(0.1, 0.2, 0.3, 0.4));

        let first = tree.measure(root, Size::new(120.5, 80.25));
        let second = tree.measure(root, Size::new(120.5, 80.25));
        assert_eq!(first.width.to_bits(), second.width.to_bits());
        assert_eq!(first.height.to_bits(), second.height.to_bits());
        assert_eq!(measures.get(), 1);

        tree.measure(root, Size::new(20.0, 80.25));
        assert_eq!(measures.get(), 2);
    }

    #[test]
    fn box_properties_shape_the_desired_size() {
        let mut tree = UiTree::new();
        let measures = Rc::new(Cell::new(0));
        let root = tree.insert(Probe { measures });
        tree.set_root(root);
        tree.set::<MaxWidth>(root, 20.0);
        tree.set::<MinHeight>(root, 30.0);
        tree.set::<Margin>(root, Thickness::uniform(5.0));
        assert_eq!(tree.measure(root, Size::new(100.0, 100.0)), Size::new(30.0, 40.0));

        tree.set::<Visible>(root, false);
        assert_eq!(tree.measure(root, Size::new(100.0, 100.0)), Size::ZERO);
    }

    #[test]
    fn parent_layout_property_dirties_the_parent() {
        let mut tree = UiTree::new();
        let (root, middle, leaf) = chain(&mut tree);
        settle(&mut tree);
        assert!(!tree.core(middle).needs_measure());

        tree.set::<HorizontalAlign>(leaf, HorizontalAlignment::Center);
        assert!(tree.core(middle).needs_measure());
        assert!(tree.core(root).needs_measure());
        assert!(!tree.core(leaf).needs_measure());
    }

    #[test]
    fn self_layout_reaches_the_root_and_visuals_stay_local() {
        let mut tree = UiTree::new();
        let (root, middle, leaf) = chain(&mut tree);
        settle(&mut tree);

        tree.set::<PanelBackground>(middle, Color::WHITE);
        assert!(tree.core(middle).needs_visuals_update());
        assert!(!tree.core(middle).needs_measure());
        assert!(!tree.core(root).needs_measure());
        assert!(!tree.core(root).needs_visuals_update());

        tree.set::<Width>(leaf, Some(10.0));
        assert!(tree.core(leaf).needs_measure());
        assert!(tree.core(root).needs_measure());
        assert!(tree.core(leaf).needs_visuals_update());
        assert!(!tree.core(root).needs_visuals_update());
    }

    #[test]
    fn sibling_queries_follow_child_order() {
        let mut tree = UiTree::new();
        let root = tree.insert(Panel::new());
        let [a, b, c] = [(); 3].map(|_| tree.insert(Panel::new()));
        tree.add_child(root, a);
        tree.add_child(root, c);
        tree.insert_child(root, 1, b);

        assert_eq!(tree.children(root), &[a, b, c]);
        assert_eq!(tree.first_child(root), Some(a));
        assert_eq!(tree.last_child(root), Some(c));
        assert_eq!(tree.next_sibling(a), Some(b));
        assert_eq!(tree.prev_sibling(c), Some(b));
        assert_eq!(tree.prev_sibling(a), None);

        assert!(tree.detach(b));
        assert_eq!(tree.next_sibling(a), Some(c));
        assert_eq!(tree.parent(b), None);
        assert!(tree.contains(b));
    }

    #[test]
    #[should_panic(expected = "would create a cycle")]
    fn cycles_are_rejected() {
        let mut tree = UiTree::new();
        let (root, _, leaf) = chain(&mut tree);
        tree.add_child(leaf, root);
    }

    #[test]
    #[should_panic(expected = "invalid constraint")]
    fn nan_constraint_is_a_contract_violation() {
        let mut tree = UiTree::new();
        let root = tree.insert(Panel::new());
        tree.measure(root, Size::new(f32::NAN, 10.0));
    }

    #[test]
    fn remove_unregisters_tweens_and_drops_pending_writes() {
        let mut tree = UiTree::new();
        let (root, middle, leaf) = chain(&mut tree);
        tree.animate(leaf, Tween::new(0.0, 1.0, Duration::from_secs(5)), |tree, id, value| {
            tree.set::<Width>(id, Some(value));
        });
        assert!(tree.is_animating(leaf));

        let sync = tree.frame_sync();
        sync.push(leaf, |tree, id| tree.set::<Width>(id, Some(1.0)));
        sync.push(root, |tree, id| tree.set::<Width>(id, Some(2.0)));

        tree.remove(middle);
        assert!(!tree.contains(middle));
        assert!(!tree.contains(leaf));
        assert!(!tree.is_animating(leaf));
        assert!(tree.children(root).is_empty());

        assert_eq!(tree.apply_pending(), 1);
        assert_eq!(tree.get::<Width>(root), Some(2.0));
    }

    #[test]
    fn clip_to_bounds_wraps_the_subtree() {
        let mut tree = UiTree::new();
        let (root, middle, leaf) = chain(&mut tree);
        tree.set::<Margin>(middle, Thickness::uniform(10.0));
        tree.set::<ClipToBounds>(middle, true);
        tree.set::<PanelBackground>(leaf, Color::WHITE);
        tree.set::<PanelBackground>(root, Color::BLACK);

        let mut renderer = NullRenderer::new();
        tree.run_frame(Size::new(100.0, 50.0), &mut renderer);
        let draws = renderer.executed();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].clip, None);
        assert_eq!(draws[1].clip, Some(Rect::new(10.0, 10.0, 80.0, 30.0)));
        assert_eq!(renderer.stats().clip_pushes, 1);
        assert_eq!(renderer.stats().clip_pops, 1);
    }

    #[test]
    fn toggling_clip_dirties_nothing_and_applies_next_draw() {
        let mut tree = UiTree::new();
        let (root, middle, leaf) = chain(&mut tree);
        tree.set::<PanelBackground>(leaf, Color::WHITE);
        let mut renderer = NullRenderer::new();
        tree.run_frame(Size::new(100.0, 50.0), &mut renderer);
        assert_eq!(renderer.stats().clip_pushes, 0);

        tree.set::<ClipToBounds>(middle, true);
        for id in [root, middle, leaf] {
            assert!(tree.core(id).flags().is_empty());
        }
        tree.run_frame(Size::new(100.0, 50.0), &mut renderer);
        assert_eq!(renderer.stats().clip_pushes, 1);
        assert_eq!(renderer.executed()[0].clip, Some(Rect::new(0.0, 0.0, 100.0, 50.0)));
    }

    #[test]
    fn overflowing_child_is_not_hit_outside_its_parent() {
        let mut tree = UiTree::new();
        let (root, middle, leaf) = chain(&mut tree);
        tree.set::<Width>(middle, Some(40.0));
        tree.set::<HorizontalAlign>(middle, HorizontalAlignment::Left);
        tree.set::<ClipToBounds>(middle, true);
        tree.set::<Width>(leaf, Some(80.0));
        tree.set::<HorizontalAlign>(leaf, HorizontalAlignment::Left);
        settle(&mut tree);
        assert_eq!(tree.core(leaf).actual_rect().width, 80.0);

        assert_eq!(tree.hit_test(Point::new(20.0, 10.0)), Some(leaf));
        assert_eq!(tree.hit_test(Point::new(60.0, 10.0)), Some(root));
    }

    #[test]
    fn pixel_snap_rounds_arranged_rects() {
        let config = UiConfig {
            pixel_snap: true,
            ..UiConfig::default()
        };
        let mut tree = UiTree::with_config(config);
        let root = tree.insert(Panel::new());
        tree.set_root(root);
        tree.measure(root, Size::new(10.0, 10.0));
        tree.arrange(root, Rect::new(0.4, 0.6, 10.2, 10.0));
        assert_eq!(tree.core(root).actual_rect(), Rect::new(0.0, 1.0, 11.0, 10.0));
    }

    #[test]
    fn frame_without_root_still_flushes() {
        let mut tree = UiTree::new();
        let mut renderer = NullRenderer::new();
        tree.run_frame(Size::new(10.0, 10.0), &mut renderer);
        assert_eq!(renderer.frames(), 1);
        assert!(tree.is_empty());
    }
}
