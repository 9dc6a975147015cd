/*
 * Per-invocation dispatch state.
 *
 * Every message that reaches a shared native callback gets its own
 * `DispatchContext` on that callback's stack frame, passed by `&mut` down the
 * router and into the handler. A nested pump or synchronous send re-enters the
 * callback and creates a fresh context, so an inner dispatch can never clobber
 * the `(handled, result)` pair of the message it interrupted.
 *
 * The thread-local depth counter is diagnostic only: `DispatchFrame` bumps it
 * for the lifetime of one callback invocation.
 */

use crate::platform_layer::types::Message;

use std::cell::Cell;

thread_local! {
    static DISPATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchContext {
    message: Message,
    handled: bool,
    result: isize,
    depth: usize,
}

impl DispatchContext {
    /// Opens a context for `message` at the current nesting depth.
    pub fn new(message: Message) -> Self {
        Self {
            message,
            handled: false,
            result: 0,
            depth: current_depth(),
        }
    }

    pub fn message(&self) -> Message {
        self.message
    }

    pub fn is_handled(&self) -> bool {
        self.handled
    }

    pub fn result(&self) -> isize {
        self.result
    }

    /// 1 for the outermost dispatch on this thread.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn set_handled(&mut self, result: isize) {
        self.handled = true;
        self.result = result;
    }

    /// Lets the dispatcher's default processing run after all.
    pub fn mark_unhandled(&mut self) {
        self.handled = false;
        self.result = 0;
    }

    pub fn outcome(&self) -> Option<isize> {
        self.handled.then_some(self.result)
    }
}

/// Number of dispatches currently on this thread's stack.
pub fn current_depth() -> usize {
    DISPATCH_DEPTH.with(Cell::get)
}

// RAII marker for one native callback invocation.
pub(crate) struct DispatchFrame {
    _private: (),
}

impl DispatchFrame {
    pub(crate) fn enter() -> Self {
        DISPATCH_DEPTH.with(|depth| depth.set(depth.get() + 1));
        DispatchFrame { _private: () }
    }
}

impl Drop for DispatchFrame {
    fn drop(&mut self) {
        DISPATCH_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_nest_and_unwind() {
        // Arrange
        let base = current_depth();

        // Act
        let outer = DispatchFrame::enter();
        let outer_ctx = DispatchContext::new(Message::new(0x8000, 0, 0));
        {
            let _inner = DispatchFrame::enter();
            let inner_ctx = DispatchContext::new(Message::new(0x8001, 0, 0));
            assert_eq!(inner_ctx.depth(), base + 2);
        }

        // Assert
        assert_eq!(outer_ctx.depth(), base + 1);
        assert_eq!(current_depth(), base + 1);
        drop(outer);
        assert_eq!(current_depth(), base);
    }

    #[test]
    fn outcome_reflects_handled_state() {
        let mut ctx = DispatchContext::new(Message::new(0x8000, 0, 0));
        assert_eq!(ctx.outcome(), None);

        ctx.set_handled(5);
        assert_eq!(ctx.outcome(), Some(5));

        ctx.mark_unhandled();
        assert!(!ctx.is_handled());
        assert_eq!(ctx.result(), 0);
    }
}
