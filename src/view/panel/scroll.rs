/// Scroll position along one axis, delegated to by scrolling panels.
///
/// `offset` is how far the content is shifted back, `extent` the content
/// length and `viewport` the visible length. The offset stays within
/// `0..=extent - viewport`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollState {
    offset: f32,
    extent: f32,
    viewport: f32,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn extent(&self) -> f32 {
        self.extent
    }

    pub fn viewport(&self) -> f32 {
        self.viewport
    }

    pub fn max_offset(&self) -> f32 {
        (self.extent - self.viewport).max(0.0)
    }

    pub fn can_scroll(&self) -> bool {
        self.max_offset() > 0.0
    }

    /// Records a new layout and re-clamps the offset into it.
    pub fn set_bounds(&mut self, extent: f32, viewport: f32) {
        self.extent = extent.max(0.0);
        self.viewport = viewport.max(0.0);
        self.offset = self.offset.clamp(0.0, self.max_offset());
    }

    /// Returns whether the offset moved.
    pub fn scroll_to(&mut self, offset: f32) -> bool {
        let next = offset.clamp(0.0, self.max_offset());
        let changed = !approx_eq(next, self.offset);
        self.offset = next;
        changed
    }

    pub fn scroll_by(&mut self, delta: f32) -> bool {
        self.scroll_to(self.offset + delta)
    }

    /// Whether `start..end` (content coordinates) overlaps the viewport.
    pub fn is_visible(&self, start: f32, end: f32) -> bool {
        end > self.offset && start < self.offset + self.viewport
    }
}

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.0001
}

#[cfg(test)]
mod tests {
    use super::ScrollState;

    #[test]
    fn offset_is_clamped_to_content() {
        let mut scroll = ScrollState::new();
        scroll.set_bounds(300.0, 100.0);
        assert!(scroll.scroll_by(250.0));
        assert_eq!(scroll.offset(), 200.0);
        assert!(!scroll.scroll_by(10.0));
        scroll.set_bounds(150.0, 100.0);
        assert_eq!(scroll.offset(), 50.0);
        assert!(scroll.scroll_by(-80.0));
        assert_eq!(scroll.offset(), 0.0);
    }

    #[test]
    fn short_content_cannot_scroll() {
        let mut scroll = ScrollState::new();
        scroll.set_bounds(40.0, 100.0);
        assert!(!scroll.can_scroll());
        assert!(!scroll.scroll_by(5.0));
        assert!(scroll.is_visible(0.0, 40.0));
    }
}
