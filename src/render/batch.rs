use super::{ExpandContext, RenderCallback, RenderCommand};

/// Receives commands during a traversal and supplies the state callbacks
/// are expanded against.
pub trait CommandSink {
    fn expand_context(&self) -> ExpandContext;
    fn command(&mut self, command: &RenderCommand);
}

/// Ordered draw list produced by one element. Insertion order is draw order.
#[derive(Clone, Debug, Default)]
pub struct RenderBatch {
    commands: Vec<RenderCommand>,
}

impl RenderBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    pub fn extend(&mut self, other: RenderBatch) {
        self.commands.extend(other.commands);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Top-level commands, callbacks left unexpanded.
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Depth-first walk. A callback is invoked when reached and the batch it
    /// produces is walked in place before the next command.
    pub fn visit(&self, sink: &mut dyn CommandSink) {
        for command in &self.commands {
            match command {
                RenderCommand::Callback(callback) => {
                    let produced = callback.expand(&sink.expand_context());
                    produced.visit(sink);
                }
                other => sink.command(other),
            }
        }
    }

    /// Walks with a fixed expansion context.
    pub fn for_each_command(&self, cx: &ExpandContext, f: impl FnMut(&RenderCommand)) {
        struct FixedSink<F> {
            cx: ExpandContext,
            f: F,
        }

        impl<F: FnMut(&RenderCommand)> CommandSink for FixedSink<F> {
            fn expand_context(&self) -> ExpandContext {
                self.cx
            }

            fn command(&mut self, command: &RenderCommand) {
                (self.f)(command);
            }
        }

        self.visit(&mut FixedSink { cx: *cx, f });
    }

    pub fn flatten(&self, cx: &ExpandContext) -> Vec<RenderCommand> {
        let mut out = Vec::with_capacity(self.commands.len());
        self.for_each_command(cx, |command| out.push(command.clone()));
        out
    }
}

impl FromIterator<RenderCommand> for RenderBatch {
    fn from_iter<I: IntoIterator<Item = RenderCommand>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().collect(),
        }
    }
}

impl From<RenderCallback> for RenderCommand {
    fn from(callback: RenderCallback) -> Self {
        RenderCommand::Callback(callback)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use glam::{Mat4, Vec3};

    use super::RenderBatch;
    use crate::geometry::Rect;
    use crate::render::{DrawGeometry, ExpandContext, RenderCallback, RenderCommand, VertexLayout};

    fn marker(x: f32) -> RenderCommand {
        RenderCommand::DrawPositions(DrawGeometry::new(VertexLayout::Position, vec![x, 0.0], None))
    }

    fn marker_x(command: &RenderCommand) -> f32 {
        command.geometry().map(|g| g.vertices[0]).unwrap_or(f32::NAN)
    }

    #[test]
    fn callback_expands_in_place() {
        let batch: RenderBatch = [
            marker(1.0),
            RenderCallback::new(|_| [marker(10.0), marker(11.0)].into_iter().collect()).into(),
            marker(2.0),
        ]
        .into_iter()
        .collect();

        let order: Vec<f32> = batch
            .flatten(&ExpandContext::default())
            .iter()
            .map(marker_x)
            .collect();
        assert_eq!(order, vec![1.0, 10.0, 11.0, 2.0]);
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn nested_callbacks_expand_depth_first() {
        let inner = RenderCallback::new(|_| [marker(21.0)].into_iter().collect());
        let outer = RenderCallback::new(move |_| {
            [marker(20.0), inner.clone().into(), marker(22.0)]
                .into_iter()
                .collect()
        });
        let batch: RenderBatch = [RenderCommand::Callback(outer), marker(3.0)]
            .into_iter()
            .collect();

        let order: Vec<f32> = batch
            .flatten(&ExpandContext::default())
            .iter()
            .map(marker_x)
            .collect();
        assert_eq!(order, vec![20.0, 21.0, 22.0, 3.0]);
    }

    #[test]
    fn callbacks_run_once_per_traversal_with_current_context() {
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        let mut batch = RenderBatch::new();
        batch.push(RenderCommand::Callback(RenderCallback::new(move |cx| {
            seen.set(seen.get() + 1);
            [RenderCommand::PushClip(cx.clip.unwrap_or(Rect::ZERO))]
                .into_iter()
                .collect()
        })));

        let cx = ExpandContext {
            transform: Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)),
            clip: Some(Rect::new(0.0, 0.0, 4.0, 4.0)),
        };
        let flat = batch.flatten(&cx);
        batch.flatten(&cx);
        assert_eq!(calls.get(), 2);
        assert!(matches!(flat[0], RenderCommand::PushClip(r) if r.width == 4.0));
    }
}
