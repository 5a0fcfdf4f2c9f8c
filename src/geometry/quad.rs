use super::{Rect, Thickness};

/// Nine-slice split of a rectangle.
///
/// The corners keep their size from `insets` while the edges and the center
/// stretch. When the insets exceed the rectangle the middle row/column
/// collapses to zero and the corners shrink proportionally.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadSlice {
    pub slices: [Rect; 9],
}

impl QuadSlice {
    pub fn new(rect: Rect, insets: Thickness) -> Self {
        let (left, right) = split_extent(rect.width, insets.left, insets.right);
        let (top, bottom) = split_extent(rect.height, insets.top, insets.bottom);
        let middle_w = (rect.width - left - right).max(0.0);
        let middle_h = (rect.height - top - bottom).max(0.0);

        let xs = [rect.x, rect.x + left, rect.x + left + middle_w];
        let ws = [left, middle_w, right];
        let ys = [rect.y, rect.y + top, rect.y + top + middle_h];
        let hs = [top, middle_h, bottom];

        let mut slices = [Rect::ZERO; 9];
        for row in 0..3 {
            for col in 0..3 {
                slices[row * 3 + col] = Rect::new(xs[col], ys[row], ws[col], hs[row]);
            }
        }
        Self { slices }
    }

    pub fn center(&self) -> Rect {
        self.slices[4]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rect> {
        self.slices.iter()
    }
}

fn split_extent(extent: f32, start: f32, end: f32) -> (f32, f32) {
    let extent = extent.max(0.0);
    let start = start.max(0.0);
    let end = end.max(0.0);
    let total = start + end;
    if total <= extent || total <= 0.0 {
        return (start, end);
    }
    let scale = extent / total;
    (start * scale, end * scale)
}

#[cfg(test)]
mod tests {
    use super::QuadSlice;
    use crate::geometry::{Rect, Thickness};

    #[test]
    fn slices_cover_the_source_rect() {
        let quad = QuadSlice::new(Rect::new(10.0, 20.0, 100.0, 50.0), Thickness::uniform(8.0));
        assert_eq!(quad.slices[0], Rect::new(10.0, 20.0, 8.0, 8.0));
        assert_eq!(quad.center(), Rect::new(18.0, 28.0, 84.0, 34.0));
        assert_eq!(quad.slices[8], Rect::new(102.0, 62.0, 8.0, 8.0));
        let area: f32 = quad.iter().map(|r| r.width * r.height).sum();
        assert!((area - 5000.0).abs() < 0.01);
    }

    #[test]
    fn oversized_insets_collapse_the_middle() {
        let quad = QuadSlice::new(Rect::new(0.0, 0.0, 10.0, 10.0), Thickness::new(10.0, 2.0, 10.0, 2.0));
        assert_eq!(quad.center().width, 0.0);
        assert_eq!(quad.slices[0].width, 5.0);
        assert!(quad.iter().all(|r| r.width >= 0.0 && r.height >= 0.0));
    }
}
