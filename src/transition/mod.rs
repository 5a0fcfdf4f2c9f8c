//! Timed value changes driven off the UI thread.

mod frame_sync;
mod time_function;
mod tween;

pub use frame_sync::*;
pub use time_function::*;
pub use tween::*;
