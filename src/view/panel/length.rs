use crate::view::AttachedProperty;

/// How a stack slot or grid track takes its main-axis size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum LengthKind {
    /// Fixed size in pixels.
    Pixel(f32),
    /// Size of the content.
    #[default]
    Auto,
    /// Weighted share of the space left after pixel and auto slots.
    Star(f32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanelLength {
    pub kind: LengthKind,
    pub min: f32,
    pub max: f32,
}

impl Default for PanelLength {
    fn default() -> Self {
        Self::auto()
    }
}

impl PanelLength {
    pub const fn new(kind: LengthKind) -> Self {
        Self {
            kind,
            min: 0.0,
            max: f32::INFINITY,
        }
    }

    pub const fn pixel(value: f32) -> Self {
        Self::new(LengthKind::Pixel(value))
    }

    pub const fn auto() -> Self {
        Self::new(LengthKind::Auto)
    }

    pub const fn star(weight: f32) -> Self {
        Self::new(LengthKind::Star(weight))
    }

    pub const fn with_min(mut self, min: f32) -> Self {
        self.min = min;
        self
    }

    pub const fn with_max(mut self, max: f32) -> Self {
        self.max = max;
        self
    }

    pub fn is_star(self) -> bool {
        matches!(self.kind, LengthKind::Star(_))
    }

    pub fn clamp(self, value: f32) -> f32 {
        value.min(self.max).max(self.min)
    }
}

/// Main-axis length of a stack child. Children without one are `Auto`.
#[derive(Clone, Copy, Debug)]
pub struct StackLength;

impl AttachedProperty for StackLength {
    type Value = PanelLength;
}

/// Resolves one axis of slots against `available`.
///
/// `content` yields the natural size of an auto slot and is called at most
/// once per auto slot. When pixel and auto slots already exceed `available`,
/// star slots share the whole of `available` instead of nothing. An infinite
/// `available` has no leftover to share, so star slots size like auto ones.
pub fn resolve_lengths(
    lengths: &[PanelLength],
    available: f32,
    mut content: impl FnMut(usize) -> f32,
) -> Vec<f32> {
    let stars_enabled = available.is_finite();
    let mut resolved = vec![0.0; lengths.len()];
    let mut pixels = 0.0;
    let mut stars = 0.0;

    for (index, length) in lengths.iter().enumerate() {
        let size = match length.kind {
            LengthKind::Pixel(value) => value.max(0.0),
            LengthKind::Star(weight) if stars_enabled => {
                stars += weight.max(0.0);
                continue;
            }
            LengthKind::Auto | LengthKind::Star(_) => content(index),
        };
        resolved[index] = length.clamp(size);
        pixels += resolved[index];
    }

    if stars > 0.0 {
        let remaining = if available - pixels >= 0.0 {
            available - pixels
        } else {
            available
        };
        let per_star = remaining / stars;
        for (index, length) in lengths.iter().enumerate() {
            if let LengthKind::Star(weight) = length.kind {
                resolved[index] = length.clamp(weight.max(0.0) * per_star);
            }
        }
    }
    resolved
}
