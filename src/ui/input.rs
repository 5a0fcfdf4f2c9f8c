use rustc_hash::FxHashSet;

use crate::geometry::{Point, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

/// Polled pointer state. Elements query it while input is processed instead
/// of receiving pushed events.
pub trait InputService {
    fn pointer_position(&self) -> Option<Point>;
    fn is_button_down(&self, button: MouseButton) -> bool;
    /// Wheel movement since the last frame, in notches.
    fn wheel_delta(&self) -> Point;
}

/// Plain state holder for hosts that translate window events themselves.
#[derive(Clone, Debug, Default)]
pub struct PolledInput {
    pointer: Option<Point>,
    buttons: FxHashSet<MouseButton>,
    wheel: Point,
}

impl PolledInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_pointer(&mut self, position: Point) {
        self.pointer = Some(position);
    }

    pub fn leave(&mut self) {
        self.pointer = None;
    }

    pub fn press(&mut self, button: MouseButton) {
        self.buttons.insert(button);
    }

    pub fn release(&mut self, button: MouseButton) {
        self.buttons.remove(&button);
    }

    pub fn scroll(&mut self, dx: f32, dy: f32) {
        self.wheel.x += dx;
        self.wheel.y += dy;
    }

    /// Clears per-frame deltas.
    pub fn end_frame(&mut self) {
        self.wheel = Point::ZERO;
    }
}

impl InputService for PolledInput {
    fn pointer_position(&self) -> Option<Point> {
        self.pointer
    }

    fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    fn wheel_delta(&self) -> Point {
        self.wheel
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClickUpdate {
    /// Hover or pressed state changed.
    pub changed: bool,
    pub clicked: bool,
}

/// Press-inside then release-inside detection over polled input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClickTracker {
    button: MouseButton,
    hovered: bool,
    pressed: bool,
    was_down: bool,
}

impl Default for ClickTracker {
    fn default() -> Self {
        Self::new(MouseButton::Left)
    }
}

impl ClickTracker {
    pub const fn new(button: MouseButton) -> Self {
        Self {
            button,
            hovered: false,
            pressed: false,
            was_down: false,
        }
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn update(&mut self, bounds: Rect, input: &dyn InputService) -> ClickUpdate {
        let inside = input.pointer_position().is_some_and(|p| bounds.contains(p));
        let down = input.is_button_down(self.button);
        let before = (self.hovered, self.pressed);

        self.hovered = inside;
        let mut clicked = false;
        if down && !self.was_down && inside {
            self.pressed = true;
        }
        if !down && self.was_down {
            clicked = self.pressed && inside;
            self.pressed = false;
        }
        self.was_down = down;

        ClickUpdate {
            changed: before != (self.hovered, self.pressed),
            clicked,
        }
    }

    /// Forget any press in progress, e.g. when the element is hidden.
    pub fn reset(&mut self) {
        self.hovered = false;
        self.pressed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::{ClickTracker, MouseButton, PolledInput};
    use crate::geometry::{Point, Rect};

    const BOUNDS: Rect = Rect::new(0.0, 0.0, 10.0, 10.0);

    #[test]
    fn press_and_release_inside_is_a_click() {
        let mut input = PolledInput::new();
        let mut tracker = ClickTracker::default();
        input.move_pointer(Point::new(5.0, 5.0));
        assert!(tracker.update(BOUNDS, &input).changed);

        input.press(MouseButton::Left);
        let update = tracker.update(BOUNDS, &input);
        assert!(tracker.is_pressed());
        assert!(!update.clicked);

        input.release(MouseButton::Left);
        let update = tracker.update(BOUNDS, &input);
        assert!(update.clicked);
        assert!(!tracker.is_pressed());
    }

    #[test]
    fn release_outside_cancels() {
        let mut input = PolledInput::new();
        let mut tracker = ClickTracker::default();
        input.move_pointer(Point::new(5.0, 5.0));
        input.press(MouseButton::Left);
        tracker.update(BOUNDS, &input);

        input.move_pointer(Point::new(50.0, 5.0));
        input.release(MouseButton::Left);
        assert!(!tracker.update(BOUNDS, &input).clicked);
    }

    #[test]
    fn press_that_started_outside_is_ignored() {
        let mut input = PolledInput::new();
        let mut tracker = ClickTracker::new(MouseButton::Right);
        input.move_pointer(Point::new(50.0, 5.0));
        input.press(MouseButton::Right);
        tracker.update(BOUNDS, &input);

        input.move_pointer(Point::new(5.0, 5.0));
        tracker.update(BOUNDS, &input);
        input.release(MouseButton::Right);
        assert!(!tracker.update(BOUNDS, &input).clicked);
    }
}
