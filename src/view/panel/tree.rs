use crate::geometry::{Rect, Size};
use crate::style::{Invalidates, UiProperty, kind_property_owner, ui_property};
use crate::ui::ClickTracker;
use crate::view::element::element_boilerplate;
use crate::view::{
    DrawCx, Element, InputCx, InputTarget, LayoutCx, Layoutable, Renderable,
};

use super::arrange_aligned;

/// Vertical list of top-level [`TreeNode`]s, each as wide as the panel.
#[derive(Default)]
pub struct TreePanel;

impl TreePanel {
    pub fn new() -> Self {
        Self
    }
}

impl Layoutable for TreePanel {
    fn on_measure(&mut self, cx: &mut LayoutCx<'_>, available: Size) -> Size {
        let mut size = Size::ZERO;
        for child in cx.children() {
            let desired = cx.measure_child(child, Size::new(available.width, f32::INFINITY));
            size.width = size.width.max(desired.width);
            size.height += desired.height;
        }
        size
    }

    fn on_arrange(&mut self, cx: &mut LayoutCx<'_>, inside: Rect) {
        let mut y = inside.y;
        for child in cx.children() {
            let height = cx.desired_size(child).height;
            arrange_aligned(cx, child, Rect::new(inside.x, y, inside.width, height));
            y += height;
        }
    }
}

impl Renderable for TreePanel {}
impl InputTarget for TreePanel {}

impl Element for TreePanel {
    element_boilerplate!("tree_panel");
}

/// One level of a tree: the first child is the header, the rest are the
/// nested entries shown below it, indented by `UiConfig::tree_indent`.
///
/// Clicking the header toggles [`TreeNodeExpanded`]. While collapsed the
/// nested entries are not measured, drawn or given input.
pub struct TreeNode {
    expanded: UiProperty<bool>,
    header: ClickTracker,
}

kind_property_owner!(TreeNode);
ui_property!(pub TreeNodeExpanded: TreeNode => expanded: bool);

impl Default for TreeNode {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeNode {
    /// Starts collapsed.
    pub fn new() -> Self {
        Self {
            expanded: UiProperty::new(false, Invalidates::SelfLayout),
            header: ClickTracker::default(),
        }
    }

    pub fn expanded(mut self) -> Self {
        self.expanded = UiProperty::new(true, Invalidates::SelfLayout);
        self
    }

    pub fn is_expanded(&self) -> bool {
        *self.expanded.peek()
    }
}

impl Layoutable for TreeNode {
    fn on_measure(&mut self, cx: &mut LayoutCx<'_>, available: Size) -> Size {
        let expanded = self.expanded.get(&mut cx.props());
        let indent = cx.config().tree_indent;
        let children = cx.children();
        let Some((header, entries)) = children.split_first() else {
            return Size::ZERO;
        };

        let mut size = cx.measure_child(*header, Size::new(available.width, f32::INFINITY));
        if expanded {
            let width = (available.width - indent).max(0.0);
            for entry in entries {
                let desired = cx.measure_child(*entry, Size::new(width, f32::INFINITY));
                size.width = size.width.max(indent + desired.width);
                size.height += desired.height;
            }
        }
        size
    }

    fn on_arrange(&mut self, cx: &mut LayoutCx<'_>, inside: Rect) {
        let expanded = self.expanded.get(&mut cx.props());
        let indent = cx.config().tree_indent;
        let children = cx.children();
        let Some((header, entries)) = children.split_first() else {
            return;
        };

        let header_height = cx.desired_size(*header).height;
        arrange_aligned(cx, *header, Rect::new(inside.x, inside.y, inside.width, header_height));
        if !expanded {
            return;
        }
        let mut y = inside.y + header_height;
        let width = (inside.width - indent).max(0.0);
        for entry in entries {
            let height = cx.desired_size(*entry).height;
            arrange_aligned(cx, *entry, Rect::new(inside.x + indent, y, width, height));
            y += height;
        }
    }
}

impl Renderable for TreeNode {
    fn on_draw(&mut self, cx: &mut DrawCx<'_>) {
        cx.draw_own_batch();
        let children = cx.core().children().to_vec();
        for (index, child) in children.into_iter().enumerate() {
            if !self.is_child_hidden(index) {
                cx.draw_child(child);
            }
        }
    }
}

impl InputTarget for TreeNode {
    fn on_input(&mut self, cx: &mut InputCx<'_>) {
        let Some(header) = cx.core().children().first().copied() else {
            return;
        };
        let bounds = cx.core_of(header).actual_rect();
        let update = self.header.update(bounds, &cx.input());
        if update.clicked {
            let expanded = self.expanded.get(&mut cx.props());
            self.expanded.set(!expanded, &mut cx.props());
        }
    }
}

impl Element for TreeNode {
    element_boilerplate!("tree_node");

    fn is_child_hidden(&self, index: usize) -> bool {
        index > 0 && !self.is_expanded()
    }
}
