use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimeFunction {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// CSS-style cubic bezier through (0,0), (x1,y1), (x2,y2), (1,1).
    CubicBezier(f32, f32, f32, f32),
}

impl TimeFunction {
    pub fn sample(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) * 0.5)
                }
            }
            Self::CubicBezier(x1, y1, x2, y2) => {
                let s = solve_bezier_parameter(t, x1.clamp(0.0, 1.0), x2.clamp(0.0, 1.0));
                bezier_axis(s, y1, y2)
            }
        }
    }
}

fn bezier_axis(s: f32, p1: f32, p2: f32) -> f32 {
    let u = 1.0 - s;
    3.0 * u * u * s * p1 + 3.0 * u * s * s * p2 + s * s * s
}

// Bisection on x(s) = t; x is monotonic once the control points are in [0, 1].
fn solve_bezier_parameter(t: f32, x1: f32, x2: f32) -> f32 {
    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    for _ in 0..24 {
        let mid = (lo + hi) * 0.5;
        if bezier_axis(mid, x1, x2) < t {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    (lo + hi) * 0.5
}

/// Progress in `[0, 1]` once `delay` has passed, `None` before.
pub fn normalized_timeline_progress(elapsed: Duration, delay: Duration, duration: Duration) -> Option<f32> {
    let active = elapsed.checked_sub(delay)?;
    if duration.is_zero() {
        return Some(1.0);
    }
    Some((active.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0))
}
