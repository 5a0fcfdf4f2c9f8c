use bitflags::bitflags;

use crate::geometry::{Rect, Size, Thickness};
use crate::render::RenderBatch;
use crate::style::{Invalidates, UiProperty, ui_property};

use super::{AttachedMap, ElementId};

bitflags! {
    /// Independent dirty bits. A set bit means that pass must run again.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct LayoutFlags: u8 {
        const NEEDS_MEASURE = 1 << 0;
        const NEEDS_ARRANGE = 1 << 1;
        const NEEDS_VISUALS_UPDATE = 1 << 2;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HorizontalAlignment {
    Left,
    Center,
    Right,
    #[default]
    Stretch,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VerticalAlignment {
    Top,
    Center,
    Bottom,
    #[default]
    Stretch,
}

/// State every element carries regardless of its kind: tree links, layout
/// results, dirty flags, the last built batch and the common properties.
pub struct ElementCore {
    id: ElementId,
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
    pub(crate) flags: LayoutFlags,
    pub(crate) desired_size: Size,
    pub(crate) last_constraint: Option<Size>,
    pub(crate) slot_rect: Option<Rect>,
    pub(crate) actual_rect: Rect,
    pub(crate) inside_rect: Rect,
    pub(crate) batch: RenderBatch,
    pub(crate) attached: AttachedMap,

    width: UiProperty<Option<f32>>,
    height: UiProperty<Option<f32>>,
    min_width: UiProperty<f32>,
    max_width: UiProperty<f32>,
    min_height: UiProperty<f32>,
    max_height: UiProperty<f32>,
    margin: UiProperty<Thickness>,
    padding: UiProperty<Thickness>,
    border_thickness: UiProperty<Thickness>,
    horizontal_alignment: UiProperty<HorizontalAlignment>,
    vertical_alignment: UiProperty<VerticalAlignment>,
    clip_to_bounds: UiProperty<bool>,
    pixel_perfect: UiProperty<bool>,
    visible: UiProperty<bool>,
}

impl ElementCore {
    pub(crate) fn new(id: ElementId) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            flags: LayoutFlags::all(),
            desired_size: Size::ZERO,
            last_constraint: None,
            slot_rect: None,
            actual_rect: Rect::ZERO,
            inside_rect: Rect::ZERO,
            batch: RenderBatch::new(),
            attached: AttachedMap::default(),
            width: UiProperty::new(None, Invalidates::SelfLayout),
            height: UiProperty::new(None, Invalidates::SelfLayout),
            min_width: UiProperty::new(0.0, Invalidates::SelfLayout),
            max_width: UiProperty::new(f32::INFINITY, Invalidates::SelfLayout),
            min_height: UiProperty::new(0.0, Invalidates::SelfLayout),
            max_height: UiProperty::new(f32::INFINITY, Invalidates::SelfLayout),
            margin: UiProperty::new(Thickness::ZERO, Invalidates::SelfLayout),
            padding: UiProperty::new(Thickness::ZERO, Invalidates::SelfLayout),
            border_thickness: UiProperty::new(Thickness::ZERO, Invalidates::SelfLayout),
            horizontal_alignment: UiProperty::new(HorizontalAlignment::Stretch, Invalidates::ParentLayout),
            vertical_alignment: UiProperty::new(VerticalAlignment::Stretch, Invalidates::ParentLayout),
            clip_to_bounds: UiProperty::new(false, Invalidates::None),
            pixel_perfect: UiProperty::new(false, Invalidates::SelfLayout),
            visible: UiProperty::new(true, Invalidates::SelfLayout),
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn flags(&self) -> LayoutFlags {
        self.flags
    }

    pub fn needs_measure(&self) -> bool {
        self.flags.contains(LayoutFlags::NEEDS_MEASURE)
    }

    pub fn needs_arrange(&self) -> bool {
        self.flags.contains(LayoutFlags::NEEDS_ARRANGE)
    }

    pub fn needs_visuals_update(&self) -> bool {
        self.flags.contains(LayoutFlags::NEEDS_VISUALS_UPDATE)
    }

    /// Size requested by the last measure, margin included.
    pub fn desired_size(&self) -> Size {
        self.desired_size
    }

    /// Final rectangle, margin excluded.
    pub fn actual_rect(&self) -> Rect {
        self.actual_rect
    }

    /// Content rectangle: actual rect minus border and padding.
    pub fn inside_rect(&self) -> Rect {
        self.inside_rect
    }

    pub fn batch(&self) -> &RenderBatch {
        &self.batch
    }

    pub fn attached(&self) -> &AttachedMap {
        &self.attached
    }

    /// Stored visibility, without theme resolution.
    pub fn is_visible(&self) -> bool {
        *self.visible.peek()
    }
}

ui_property!(pub Width: ElementCore => width: Option<f32>);
ui_property!(pub Height: ElementCore => height: Option<f32>);
ui_property!(pub MinWidth: ElementCore => min_width: f32);
ui_property!(pub MaxWidth: ElementCore => max_width: f32);
ui_property!(pub MinHeight: ElementCore => min_height: f32);
ui_property!(pub MaxHeight: ElementCore => max_height: f32);
ui_property!(pub Margin: ElementCore => margin: Thickness);
ui_property!(pub Padding: ElementCore => padding: Thickness);
ui_property!(pub BorderThickness: ElementCore => border_thickness: Thickness);
ui_property!(pub HorizontalAlign: ElementCore => horizontal_alignment: HorizontalAlignment);
ui_property!(pub VerticalAlign: ElementCore => vertical_alignment: VerticalAlignment);
ui_property!(
    /// Wraps the element's subtree draw in a clip scope of its actual rect.
    pub ClipToBounds: ElementCore => clip_to_bounds: bool
);
ui_property!(
    /// Round the arranged rect to whole pixels.
    pub PixelPerfect: ElementCore => pixel_perfect: bool
);
ui_property!(
    /// Hidden elements measure to zero and are skipped by draw, input and
    /// hit testing.
    pub Visible: ElementCore => visible: bool
);
