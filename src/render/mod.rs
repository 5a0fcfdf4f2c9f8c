//! Declarative draw commands and the backend contract that executes them.

mod batch;
mod builder;
mod command;
mod null;
mod renderer;

pub use batch::*;
pub use builder::*;
pub use command::*;
pub use null::*;
pub use renderer::*;
