use crate::geometry::{CornerRadius, Rect, Size};
use crate::render::RenderBatchBuilder;
use crate::style::{Color, Invalidates, UiProperty, kind_property_owner, ui_property};
use crate::view::element::element_boilerplate;
use crate::view::{
    BorderThickness, Element, InputTarget, LayoutCx, Layoutable, Renderable, VisualCx,
};

use super::arrange_aligned;

/// Decorates at most one child with a background and a rounded outline.
/// The outline width is the element's `BorderThickness`.
pub struct Border {
    background: UiProperty<Color>,
    border_color: UiProperty<Color>,
    corner_radius: UiProperty<CornerRadius>,
}

kind_property_owner!(Border);
ui_property!(pub BorderBackground: Border => background: Color);
ui_property!(pub BorderColor: Border => border_color: Color);
ui_property!(pub BorderCornerRadius: Border => corner_radius: CornerRadius);

impl Default for Border {
    fn default() -> Self {
        Self::new()
    }
}

impl Border {
    pub fn new() -> Self {
        Self {
            background: UiProperty::new(Color::TRANSPARENT, Invalidates::Visuals).themed("border.background"),
            border_color: UiProperty::new(Color::BLACK, Invalidates::Visuals).themed("border.color"),
            corner_radius: UiProperty::new(CornerRadius::ZERO, Invalidates::Visuals).themed("border.radius"),
        }
    }
}

impl Layoutable for Border {
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

impl Renderable for Border {
    fn on_update_visuals(&mut self, cx: &mut VisualCx<'_>, builder: &mut RenderBatchBuilder) {
        let rect = cx.actual_rect();
        let id = cx.id();
        let thickness = cx.get::<BorderThickness>(id);
        let background = self.background.get(&mut cx.props());
        let border = self.border_color.get(&mut cx.props());
        let radii = self
            .corner_radius
            .get(&mut cx.props())
            .normalized(rect.width, rect.height);

        // Rings are drawn with one width; uneven edges use the widest.
        let width = thickness.left.max(thickness.top).max(thickness.right).max(thickness.bottom);
        if width > 0.0 && !border.is_transparent() {
            builder.bordered_rounded_rect(rect, radii, width, background, border);
        } else if !background.is_transparent() {
            builder.rounded_rect(rect, radii, background);
        }
    }
}

impl InputTarget for Border {}

impl Element for Border {
    element_boilerplate!("border");

    fn max_children(&self) -> Option<usize> {
        Some(1)
    }
}

#[cfg(test)]
mod tests {
    use super::{Border, BorderBackground, BorderColor};
    use crate::geometry::{Rect, Size, Thickness};
    use crate::render::{NullRenderer, RenderCommand, RoundedRectKind};
    use crate::style::{Color, ThemeEngine, ThemeValue};
    use crate::view::panel::Panel;
    use crate::view::{BorderThickness, Padding, UiTree};
    use std::sync::Arc;

    #[test]
    fn child_sits_inside_border_and_padding() {
        let mut tree = UiTree::new();
        let border = tree.insert(Border::new());
        let child = tree.insert(Panel::new());
        tree.add_child(border, child);
        tree.set_root(border);
        tree.set::<BorderThickness>(border, Thickness::uniform(2.0));
        tree.set::<Padding>(border, Thickness::symmetric(4.0, 1.0));

        assert_eq!(tree.measure(border, Size::new(50.0, 50.0)), Size::new(12.0, 6.0));
        tree.arrange(border, Rect::new(0.0, 0.0, 50.0, 30.0));
        assert_eq!(tree.core(child).actual_rect(), Rect::new(6.0, 3.0, 38.0, 24.0));
    }

    #[test]
    #[should_panic(expected = "accepts at most 1 child")]
    fn second_child_is_rejected() {
        let mut tree = UiTree::new();
        let border = tree.insert(Border::new());
        let a = tree.insert(Panel::new());
        let b = tree.insert(Panel::new());
        tree.add_child(border, a);
        tree.add_child(border, b);
    }

    #[test]
    fn visuals_follow_thickness_and_theme() {
        let theme = ThemeEngine::new().with("border.background", ThemeValue::Color(Color::WHITE));
        let mut tree = UiTree::new().with_theme(Arc::new(theme));
        let border = tree.insert(Border::new());
        tree.set_root(border);
        let mut renderer = NullRenderer::new();

        tree.run_frame(Size::new(40.0, 20.0), &mut renderer);
        let batch = tree.core(border).batch();
        assert!(matches!(
            batch.commands(),
            [RenderCommand::RoundedRect { kind: RoundedRectKind::Plain, .. }]
        ));

        tree.set::<BorderThickness>(border, Thickness::uniform(1.0));
        tree.set::<BorderColor>(border, Color::rgb(200, 0, 0));
        tree.set::<BorderBackground>(border, Color::TRANSPARENT);
        tree.run_frame(Size::new(40.0, 20.0), &mut renderer);
        assert!(matches!(
            tree.core(border).batch().commands(),
            [RenderCommand::RoundedRect { kind: RoundedRectKind::Bordered { .. }, .. }]
        ));
    }
}
