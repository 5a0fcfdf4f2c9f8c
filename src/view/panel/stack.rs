use crate::geometry::{Point, Rect, Size};
use crate::render::RendererExt;
use crate::style::{Invalidates, UiProperty, kind_property_owner, ui_property};
use crate::view::element::element_boilerplate;
use crate::view::{DrawCx, Element, InputCx, InputTarget, LayoutCx, Layoutable, Renderable};

use super::{PanelLength, ScrollState, StackLength, arrange_aligned, resolve_lengths};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

impl Orientation {
    pub fn main(self, size: Size) -> f32 {
        match self {
            Self::Vertical => size.height,
            Self::Horizontal => size.width,
        }
    }

    pub fn cross(self, size: Size) -> f32 {
        match self {
            Self::Vertical => size.width,
            Self::Horizontal => size.height,
        }
    }

    pub fn size(self, main: f32, cross: f32) -> Size {
        match self {
            Self::Vertical => Size::new(cross, main),
            Self::Horizontal => Size::new(main, cross),
        }
    }

    pub fn point(self, main: f32) -> Point {
        match self {
            Self::Vertical => Point::new(0.0, main),
            Self::Horizontal => Point::new(main, 0.0),
        }
    }

    /// Slot spanning the full cross extent of `inside`.
    fn slot(self, inside: Rect, start: f32, length: f32) -> Rect {
        match self {
            Self::Vertical => Rect::new(inside.x, inside.y + start, inside.width, length),
            Self::Horizontal => Rect::new(inside.x + start, inside.y, length, inside.height),
        }
    }
}

/// Lays children out one after another along its orientation.
///
/// Each child's main-axis share comes from its [`StackLength`]. A scrollable
/// stack measures its content unbounded along the main axis and shows a
/// window of it, offset by a translate transform inside a clip.
pub struct StackPanel {
    orientation: UiProperty<Orientation>,
    scroll: Option<ScrollState>,
    /// Main-axis span of each child from the last arrange, content relative.
    spans: Vec<(f32, f32)>,
}

kind_property_owner!(StackPanel);
ui_property!(pub StackOrientation: StackPanel => orientation: Orientation);

impl StackPanel {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation: UiProperty::new(orientation, Invalidates::SelfLayout),
            scroll: None,
            spans: Vec::new(),
        }
    }

    pub fn vertical() -> Self {
        Self::new(Orientation::Vertical)
    }

    pub fn horizontal() -> Self {
        Self::new(Orientation::Horizontal)
    }

    pub fn scrollable(mut self) -> Self {
        self.scroll = Some(ScrollState::new());
        self
    }

    pub fn scroll(&self) -> Option<&ScrollState> {
        self.scroll.as_ref()
    }

    /// Moves a scrollable stack; takes effect on the next draw.
    pub fn scroll_to(&mut self, offset: f32) -> bool {
        self.scroll.as_mut().is_some_and(|scroll| scroll.scroll_to(offset))
    }

    fn main_limit(&self, orientation: Orientation, size: Size) -> f32 {
        if self.scroll.is_some() {
            f32::INFINITY
        } else {
            orientation.main(size)
        }
    }
}

impl Layoutable for StackPanel {
    fn on_measure(&mut self, cx: &mut LayoutCx<'_>, available: Size) -> Size {
        let orientation = self.orientation.get(&mut cx.props());
        let children = cx.children();
        let lengths: Vec<PanelLength> = children
            .iter()
            .map(|child| cx.attached_or::<StackLength>(*child, PanelLength::auto()))
            .collect();
        let cross = orientation.cross(available);

        let mut measured = vec![None; children.len()];
        let resolved = resolve_lengths(&lengths, self.main_limit(orientation, available), |index| {
            let desired = cx.measure_child(children[index], orientation.size(f32::INFINITY, cross));
            measured[index] = Some(desired);
            orientation.main(desired)
        });

        let mut cross_extent: f32 = 0.0;
        for (index, child) in children.iter().enumerate() {
            let desired = match measured[index] {
                Some(desired) => desired,
                None => cx.measure_child(*child, orientation.size(resolved[index], cross)),
            };
            cross_extent = cross_extent.max(orientation.cross(desired));
        }
        orientation.size(resolved.iter().sum(), cross_extent)
    }

    fn on_arrange(&mut self, cx: &mut LayoutCx<'_>, inside: Rect) {
        let orientation = self.orientation.get(&mut cx.props());
        let children = cx.children();
        let lengths: Vec<PanelLength> = children
            .iter()
            .map(|child| cx.attached_or::<StackLength>(*child, PanelLength::auto()))
            .collect();
        let resolved = resolve_lengths(&lengths, self.main_limit(orientation, inside.size()), |index| {
            orientation.main(cx.desired_size(children[index]))
        });

        self.spans.clear();
        let mut cursor = 0.0;
        for (child, length) in children.iter().zip(resolved) {
            arrange_aligned(cx, *child, orientation.slot(inside, cursor, length));
            self.spans.push((cursor, cursor + length));
            cursor += length;
        }
        if let Some(scroll) = self.scroll.as_mut() {
            scroll.set_bounds(cursor, orientation.main(inside.size()));
        }
    }
}

impl Renderable for StackPanel {
    fn on_draw(&mut self, cx: &mut DrawCx<'_>) {
        cx.draw_own_batch();
        let Some(scroll) = self.scroll else {
            cx.draw_children();
            return;
        };

        let orientation = *self.orientation.peek();
        let viewport = cx.core().inside_rect();
        let children = cx.core().children().to_vec();
        let shift = orientation.point(-scroll.offset());
        let (tree, renderer) = cx.split();
        let mut clip = renderer.clip(viewport);
        let mut shifted = clip.translate_transform(shift.x, shift.y);
        let window_end = scroll.offset() + scroll.viewport();
        for (child, &(start, end)) in children.iter().zip(&self.spans) {
            // Children are laid out in increasing main-axis order.
            if start >= window_end {
                break;
            }
            if scroll.is_visible(start, end) {
                tree.draw(*child, &mut *shifted);
            }
        }
    }
}

impl InputTarget for StackPanel {
    fn on_input(&mut self, cx: &mut InputCx<'_>) {
        let orientation = *self.orientation.peek();
        let Some(scroll) = self.scroll.as_mut() else {
            return;
        };
        let wheel = cx.wheel();
        let notches = match orientation {
            Orientation::Vertical => wheel.y,
            Orientation::Horizontal if wheel.x != 0.0 => wheel.x,
            Orientation::Horizontal => wheel.y,
        };
        if notches == 0.0 || !cx.is_pointer_inside(cx.core().inside_rect()) {
            return;
        }
        if scroll.scroll_by(-notches * cx.config().wheel_step) {
            cx.consume_wheel();
        }
    }
}

impl Element for StackPanel {
    element_boilerplate!("stack_panel");

    fn scroll_offset(&self) -> Point {
        match self.scroll {
            Some(scroll) => self.orientation.peek().point(scroll.offset()),
            None => Point::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::{Orientation, StackOrientation, StackPanel};
    use crate::geometry::{Point, Rect, Size};
    use crate::render::{NullRenderer, Renderer};
    use crate::style::Color;
    use crate::ui::PolledInput;
    use crate::view::element::element_boilerplate;
    use crate::view::panel::{Panel, PanelBackground, PanelLength, StackLength};
    use crate::view::{
        Element, ElementId, Height, InputTarget, LayoutCx, Layoutable, Renderable, UiTree,
    };

    struct Leaf {
        size: Size,
        measures: Rc<Cell<usize>>,
    }

    impl Layoutable for Leaf {
        fn on_measure(&mut self, _cx: &mut LayoutCx<'_>, _available: Size) -> Size {
            self.measures.set(self.measures.get() + 1);
            self.size
        }

        fn on_arrange(&mut self, _cx: &mut LayoutCx<'_>, _inside: Rect) {}
    }

    impl Renderable for Leaf {}
    impl InputTarget for Leaf {}

    impl Element for Leaf {
        element_boilerplate!("leaf");
    }

    fn stack_with(tree: &mut UiTree, stack: StackPanel, lengths: &[PanelLength]) -> (ElementId, Vec<ElementId>) {
        let root = tree.insert(stack);
        let children = lengths
            .iter()
            .map(|length| {
                let child = tree.insert(Panel::new());
                tree.add_child(root, child);
                tree.set_attached::<StackLength>(child, *length);
                child
            })
            .collect();
        tree.set_root(root);
        (root, children)
    }

    #[test]
    fn star_children_split_the_leftover() {
        let mut tree = UiTree::new();
        let (root, children) = stack_with(
            &mut tree,
            StackPanel::vertical(),
            &[PanelLength::pixel(40.0), PanelLength::star(1.0), PanelLength::star(3.0)],
        );
        let desired = tree.measure(root, Size::new(50.0, 200.0));
        assert_eq!(desired.height, 200.0);
        tree.arrange(root, Rect::new(0.0, 0.0, 50.0, 200.0));

        let rects: Vec<Rect> = children.iter().map(|c| tree.core(*c).actual_rect()).collect();
        assert_eq!(rects[0], Rect::new(0.0, 0.0, 50.0, 40.0));
        assert_eq!(rects[1], Rect::new(0.0, 40.0, 50.0, 40.0));
        assert_eq!(rects[2], Rect::new(0.0, 80.0, 50.0, 120.0));
        let total: f32 = rects.iter().map(|r| r.height).sum();
        assert!((total - 200.0).abs() < 1e-4);
    }

    #[test]
    fn pixel_overflow_gives_star_the_full_constraint() {
        let mut tree = UiTree::new();
        let (root, children) = stack_with(
            &mut tree,
            StackPanel::vertical(),
            &[PanelLength::pixel(150.0), PanelLength::star(1.0)],
        );
        tree.measure(root, Size::new(50.0, 100.0));
        tree.arrange(root, Rect::new(0.0, 0.0, 50.0, 100.0));
        let star = tree.core(children[1]).actual_rect();
        assert_eq!(star.height, 100.0);
        assert_eq!(star.y, 150.0);
    }

    #[test]
    fn auto_children_are_measured_once() {
        let mut tree = UiTree::new();
        let root = tree.insert(StackPanel::horizontal());
        let measures = Rc::new(Cell::new(0));
        let leaf = tree.insert(Leaf {
            size: Size::new(30.0, 12.0),
            measures: measures.clone(),
        });
        tree.add_child(root, leaf);
        tree.set_root(root);

        let desired = tree.measure(root, Size::new(100.0, 100.0));
        assert_eq!(desired, Size::new(30.0, 12.0));
        assert_eq!(measures.get(), 1);

        tree.set::<StackOrientation>(root, Orientation::Vertical);
        assert!(tree.core(root).needs_measure());
        assert_eq!(tree.measure(root, Size::new(100.0, 100.0)), Size::new(30.0, 12.0));
    }

    fn scrolled_list(tree: &mut UiTree, rows: usize) -> (ElementId, Vec<ElementId>) {
        let root = tree.insert(StackPanel::vertical().scrollable());
        let children = (0..rows)
            .map(|_| {
                let row = tree.insert(Panel::new());
                tree.set::<Height>(row, Some(30.0));
                tree.set::<PanelBackground>(row, Color::WHITE);
                tree.add_child(root, row);
                row
            })
            .collect();
        tree.set_root(root);
        (root, children)
    }

    #[test]
    fn scrolling_culls_rows_outside_the_viewport() {
        let mut tree = UiTree::new();
        let (root, _) = scrolled_list(&mut tree, 10);
        let mut renderer = NullRenderer::new();
        tree.run_frame(Size::new(60.0, 100.0), &mut renderer);

        let scroll = *tree.kind::<StackPanel>(root).and_then(StackPanel::scroll).expect("scrollable");
        assert_eq!(scroll.extent(), 300.0);
        assert_eq!(scroll.viewport(), 100.0);
        assert_eq!(renderer.executed().len(), 4);

        assert!(tree.kind_mut::<StackPanel>(root).expect("stack").scroll_to(45.0));
        tree.run_frame(Size::new(60.0, 100.0), &mut renderer);
        let draws = renderer.executed();
        assert_eq!(draws.len(), 4);
        assert_eq!(draws[0].bounds, Rect::new(0.0, 30.0, 60.0, 30.0));
        assert_eq!(
            draws[0].transform,
            glam::Mat4::from_translation(glam::Vec3::new(0.0, -45.0, 0.0))
        );
        assert!(draws.iter().all(|d| d.clip == Some(Rect::new(0.0, 0.0, 60.0, 100.0))));
        assert_eq!(renderer.stats().transform_pushes, renderer.stats().transform_pops);
    }

    #[test]
    fn wheel_scrolls_and_hit_test_follows_offset() {
        let mut tree = UiTree::new();
        let (root, rows) = scrolled_list(&mut tree, 10);
        let mut renderer = NullRenderer::new();
        tree.run_frame(Size::new(60.0, 100.0), &mut renderer);

        let mut input = PolledInput::new();
        input.move_pointer(Point::new(10.0, 10.0));
        input.scroll(0.0, -1.0);
        tree.process_input(&input);
        let offset = tree.kind::<StackPanel>(root).and_then(StackPanel::scroll).map(|s| s.offset());
        assert_eq!(offset, Some(tree.config().wheel_step));

        assert_eq!(tree.hit_test(Point::new(10.0, 10.0)), Some(rows[1]));
        assert_eq!(renderer.current_transform(), glam::Mat4::IDENTITY);
    }
}
