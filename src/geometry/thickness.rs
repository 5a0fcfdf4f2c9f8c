use serde::Deserialize;

/// Per-edge lengths used for margin, padding and border widths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Thickness {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Thickness {
    pub const ZERO: Self = Self::uniform(0.0);

    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    pub const fn symmetric(horizontal: f32, vertical: f32) -> Self {
        Self::new(horizontal, vertical, horizontal, vertical)
    }

    pub fn horizontal(self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(self) -> f32 {
        self.top + self.bottom
    }

    pub fn is_zero(self) -> bool {
        self.left == 0.0 && self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0
    }
}

impl std::ops::Add for Thickness {
    type Output = Thickness;

    fn add(self, rhs: Self) -> Self::Output {
        Thickness::new(
            self.left + rhs.left,
            self.top + rhs.top,
            self.right + rhs.right,
            self.bottom + rhs.bottom,
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct CornerRadius {
    pub top_left: f32,
    pub top_right: f32,
    pub bottom_right: f32,
    pub bottom_left: f32,
}

impl CornerRadius {
    pub const ZERO: Self = Self::uniform(0.0);

    pub const fn uniform(value: f32) -> Self {
        Self {
            top_left: value,
            top_right: value,
            bottom_right: value,
            bottom_left: value,
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    pub fn has_any_rounding(self) -> bool {
        self.top_left > 0.0 || self.top_right > 0.0 || self.bottom_right > 0.0 || self.bottom_left > 0.0
    }

    pub fn max(self) -> f32 {
        self.top_left
            .max(self.top_right)
            .max(self.bottom_right)
            .max(self.bottom_left)
    }

    /// Scales the radii down so adjacent corners never overlap inside a
    /// `width` x `height` box.
    pub fn normalized(mut self, width: f32, height: f32) -> Self {
        self.top_left = self.top_left.max(0.0);
        self.top_right = self.top_right.max(0.0);
        self.bottom_right = self.bottom_right.max(0.0);
        self.bottom_left = self.bottom_left.max(0.0);
        let w = width.max(0.0);
        let h = height.max(0.0);
        if w <= 0.0 || h <= 0.0 {
            return Self::ZERO;
        }

        let top = self.top_left + self.top_right;
        let bottom = self.bottom_left + self.bottom_right;
        let left = self.top_left + self.bottom_left;
        let right = self.top_right + self.bottom_right;

        let mut scale = 1.0_f32;
        if top > w {
            scale = scale.min(w / top);
        }
        if bottom > w {
            scale = scale.min(w / bottom);
        }
        if left > h {
            scale = scale.min(h / left);
        }
        if right > h {
            scale = scale.min(h / right);
        }

        if scale < 1.0 {
            self.top_left *= scale;
            self.top_right *= scale;
            self.bottom_right *= scale;
            self.bottom_left *= scale;
        }
        self
    }

    /// Radii of the inner edge of a border of the given thickness.
    pub fn inset(self, thickness: Thickness) -> Self {
        Self {
            top_left: (self.top_left - thickness.left.min(thickness.top)).max(0.0),
            top_right: (self.top_right - thickness.right.min(thickness.top)).max(0.0),
            bottom_right: (self.bottom_right - thickness.right.min(thickness.bottom)).max(0.0),
            bottom_left: (self.bottom_left - thickness.left.min(thickness.bottom)).max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CornerRadius, Thickness};

    #[test]
    fn oversized_radii_are_scaled_to_fit() {
        let radii = CornerRadius::uniform(40.0).normalized(60.0, 200.0);
        assert_eq!(radii.top_left, 30.0);
        assert_eq!(radii.bottom_right, 30.0);
        assert_eq!(CornerRadius::uniform(5.0).normalized(0.0, 10.0), CornerRadius::ZERO);
    }

    #[test]
    fn inset_subtracts_the_thinner_adjacent_edge() {
        let inner = CornerRadius::uniform(10.0).inset(Thickness::new(2.0, 4.0, 6.0, 12.0));
        assert_eq!(inner.top_left, 8.0);
        assert_eq!(inner.top_right, 6.0);
        assert_eq!(inner.bottom_right, 4.0);
        assert_eq!(inner.bottom_left, 8.0);
    }
}
