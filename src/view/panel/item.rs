use tracing::debug;

use crate::geometry::{Rect, Size};
use crate::render::RenderBatchBuilder;
use crate::style::{Color, Invalidates, UiProperty, kind_property_owner, ui_property};
use crate::ui::ClickTracker;
use crate::view::element::element_boilerplate;
use crate::view::{
    Element, ElementId, InputCx, InputTarget, LayoutCx, Layoutable, Renderable, VisualCx,
};

use super::arrange_aligned;

type ClickHandler = Box<dyn FnMut(ElementId)>;

/// Clickable row around a single content element, e.g. a list entry.
///
/// The fill follows the pointer: pressed, then hovered, then selected, then
/// the plain background.
pub struct ItemPanel {
    tracker: ClickTracker,
    selectable: bool,
    on_click: Option<ClickHandler>,
    background: UiProperty<Color>,
    hover_color: UiProperty<Color>,
    pressed_color: UiProperty<Color>,
    selected_color: UiProperty<Color>,
    selected: UiProperty<bool>,
}

kind_property_owner!(ItemPanel);
ui_property!(pub ItemBackground: ItemPanel => background: Color);
ui_property!(pub ItemHoverColor: ItemPanel => hover_color: Color);
ui_property!(pub ItemPressedColor: ItemPanel => pressed_color: Color);
ui_property!(pub ItemSelectedColor: ItemPanel => selected_color: Color);
ui_property!(pub ItemSelected: ItemPanel => selected: bool);

impl Default for ItemPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemPanel {
    pub fn new() -> Self {
        Self {
            tracker: ClickTracker::default(),
            selectable: false,
            on_click: None,
            background: UiProperty::new(Color::TRANSPARENT, Invalidates::Visuals).themed("item.background"),
            hover_color: UiProperty::new(Color::rgba(255, 255, 255, 24), Invalidates::Visuals).themed("item.hover"),
            pressed_color: UiProperty::new(Color::rgba(255, 255, 255, 48), Invalidates::Visuals).themed("item.pressed"),
            selected_color: UiProperty::new(Color::rgba(64, 128, 255, 96), Invalidates::Visuals).themed("item.selected"),
            selected: UiProperty::new(false, Invalidates::Visuals),
        }
    }

    /// Clicking toggles [`ItemSelected`].
    pub fn selectable(mut self) -> Self {
        self.selectable = true;
        self
    }

    pub fn on_click(mut self, handler: impl FnMut(ElementId) + 'static) -> Self {
        self.on_click = Some(Box::new(handler));
        self
    }

    pub fn is_hovered(&self) -> bool {
        self.tracker.is_hovered()
    }

    pub fn is_pressed(&self) -> bool {
        self.tracker.is_pressed()
    }
}

impl Layoutable for ItemPanel {
    fn on_measure(&mut self, cx: &mut LayoutCx<'_>, available: Size) -> Size {
        match cx.children().first() {
            Some(child) => cx.measure_child(*child, available),
            None => Size::ZERO,
        }
    }

    fn on_arrange(&mut self, cx: &mut LayoutCx<'_>, inside: Rect) {
        if let Some(child) = cx.children().first() {
            arrange_aligned(cx, *child, inside);
        }
    }
}

impl Renderable for ItemPanel {
    fn on_update_visuals(&mut self, cx: &mut VisualCx<'_>, builder: &mut RenderBatchBuilder) {
        let fill = if self.tracker.is_pressed() {
            self.pressed_color.get(&mut cx.props())
        } else if self.tracker.is_hovered() {
            self.hover_color.get(&mut cx.props())
        } else if self.selected.get(&mut cx.props()) {
            self.selected_color.get(&mut cx.props())
        } else {
            self.background.get(&mut cx.props())
        };
        builder.colored_rect(cx.actual_rect(), fill);
    }
}

impl InputTarget for ItemPanel {
    fn on_input(&mut self, cx: &mut InputCx<'_>) {
        let bounds = cx.core().actual_rect();
        let update = self.tracker.update(bounds, &cx.input());
        if update.changed {
            cx.invalidate_visuals();
        }
        if !update.clicked {
            return;
        }
        debug!(id = ?cx.id(), "item clicked");
        if self.selectable {
            let selected = self.selected.get(&mut cx.props());
            self.selected.set(!selected, &mut cx.props());
        }
        if let Some(handler) = self.on_click.as_mut() {
            handler(cx.id());
        }
    }
}

impl Element for ItemPanel {
    element_boilerplate!("item_panel");

    fn max_children(&self) -> Option<usize> {
        Some(1)
    }
}
