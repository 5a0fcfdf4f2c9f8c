use crate::geometry::{Rect, Size};
use crate::style::{Invalidates, UiProperty, kind_property_owner, ui_property};
use crate::view::element::element_boilerplate;
use crate::view::{
    AttachedProperty, DrawCx, Element, ElementId, InputTarget, LayoutCx, Layoutable, Renderable,
};

use super::{LengthKind, PanelLength, arrange_aligned, resolve_lengths};

/// Row index of a grid child. Indices past the last row use the last row.
#[derive(Clone, Copy, Debug)]
pub struct GridRow;

impl AttachedProperty for GridRow {
    type Value = usize;
}

/// Column index of a grid child, clamped like [`GridRow`].
#[derive(Clone, Copy, Debug)]
pub struct GridColumn;

impl AttachedProperty for GridColumn {
    type Value = usize;
}

/// Rows and columns sized independently with [`PanelLength`] tracks.
///
/// Children sharing a cell are all measured, but only the last one in child
/// order is arranged and drawn there; the others are treated as hidden.
pub struct GridPanel {
    rows: UiProperty<Vec<PanelLength>>,
    columns: UiProperty<Vec<PanelLength>>,
    natural_rows: Vec<f32>,
    natural_columns: Vec<f32>,
    cells: Vec<Option<ElementId>>,
    placed: Vec<bool>,
}

kind_property_owner!(GridPanel);
ui_property!(pub GridRows: GridPanel => rows: Vec<PanelLength>);
ui_property!(pub GridColumns: GridPanel => columns: Vec<PanelLength>);

impl Default for GridPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl GridPanel {
    pub fn new() -> Self {
        Self {
            rows: UiProperty::new(Vec::new(), Invalidates::SelfLayout),
            columns: UiProperty::new(Vec::new(), Invalidates::SelfLayout),
            natural_rows: Vec::new(),
            natural_columns: Vec::new(),
            cells: Vec::new(),
            placed: Vec::new(),
        }
    }

    pub fn with_rows(mut self, rows: Vec<PanelLength>) -> Self {
        self.rows = UiProperty::new(rows, Invalidates::SelfLayout);
        self
    }

    pub fn with_columns(mut self, columns: Vec<PanelLength>) -> Self {
        self.columns = UiProperty::new(columns, Invalidates::SelfLayout);
        self
    }

    /// Child occupying `(row, column)` after the last measure.
    pub fn cell(&self, row: usize, column: usize) -> Option<ElementId> {
        let columns = self.natural_columns.len();
        if column >= columns {
            return None;
        }
        self.cells.get(row * columns + column).copied().flatten()
    }

    fn tracks(&mut self, cx: &mut LayoutCx<'_>) -> (Vec<PanelLength>, Vec<PanelLength>) {
        let rows = self.rows.get(&mut cx.props());
        let columns = self.columns.get(&mut cx.props());
        (or_single_star(rows), or_single_star(columns))
    }
}

fn or_single_star(tracks: Vec<PanelLength>) -> Vec<PanelLength> {
    if tracks.is_empty() {
        vec![PanelLength::star(1.0)]
    } else {
        tracks
    }
}

fn pixel_or_unbounded(track: PanelLength) -> f32 {
    match track.kind {
        LengthKind::Pixel(value) => track.clamp(value.max(0.0)),
        LengthKind::Auto | LengthKind::Star(_) => f32::INFINITY,
    }
}

impl Layoutable for GridPanel {
    fn on_measure(&mut self, cx: &mut LayoutCx<'_>, available: Size) -> Size {
        let (rows, columns) = self.tracks(cx);
        let children = cx.children();
        let cells: Vec<(usize, usize)> = children
            .iter()
            .map(|child| {
                (
                    cx.attached_or::<GridRow>(*child, 0).min(rows.len() - 1),
                    cx.attached_or::<GridColumn>(*child, 0).min(columns.len() - 1),
                )
            })
            .collect();

        self.natural_rows = vec![0.0; rows.len()];
        self.natural_columns = vec![0.0; columns.len()];
        for (child, &(row, column)) in children.iter().zip(&cells) {
            let constraint = Size::new(pixel_or_unbounded(columns[column]), pixel_or_unbounded(rows[row]));
            let natural = cx.measure_child(*child, constraint);
            self.natural_rows[row] = self.natural_rows[row].max(natural.height);
            self.natural_columns[column] = self.natural_columns[column].max(natural.width);
        }

        let column_sizes = resolve_lengths(&columns, available.width, |c| self.natural_columns[c]);
        let row_sizes = resolve_lengths(&rows, available.height, |r| self.natural_rows[r]);

        self.cells = vec![None; rows.len() * columns.len()];
        for (child, &(row, column)) in children.iter().zip(&cells) {
            cx.measure_child(*child, Size::new(column_sizes[column], row_sizes[row]));
            self.cells[row * columns.len() + column] = Some(*child);
        }
        self.placed = children.iter().map(|child| self.cells.contains(&Some(*child))).collect();

        Size::new(column_sizes.iter().sum(), row_sizes.iter().sum())
    }

    fn on_arrange(&mut self, cx: &mut LayoutCx<'_>, inside: Rect) {
        let (rows, columns) = self.tracks(cx);
        let natural = |sizes: &[f32], index: usize| sizes.get(index).copied().unwrap_or(0.0);
        let column_sizes = resolve_lengths(&columns, inside.width, |c| natural(&self.natural_columns, c));
        let row_sizes = resolve_lengths(&rows, inside.height, |r| natural(&self.natural_rows, r));

        let mut y = inside.y;
        for (row, height) in row_sizes.iter().enumerate() {
            let mut x = inside.x;
            for (column, width) in column_sizes.iter().enumerate() {
                let occupant = self.cells.get(row * columns.len() + column).copied().flatten();
                if let Some(child) = occupant {
                    arrange_aligned(cx, child, Rect::new(x, y, *width, *height));
                }
                x += width;
            }
            y += height;
        }
    }
}

impl Renderable for GridPanel {
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

impl InputTarget for GridPanel {}

impl Element for GridPanel {
    element_boilerplate!("grid_panel");

    fn is_child_hidden(&self, index: usize) -> bool {
        self.placed.get(index).is_some_and(|placed| !placed)
    }
}
