//! Call-stack bookkeeping for diagnostics and the recursion limit.
//!
//! Every function, method, constructor and accessor body pushes a
//! `CallFrame` before it runs and pops it afterwards. The depth check lives
//! in `push()`, so exceeding the limit fails before any callee state is
//! created and the caller's state is left as it was.

use dws_ir::Span;

use crate::errors::{max_recursion_exceeded, BacktraceFrame, EvalBacktrace, EvalError};

/// A single frame in the live call stack.
#[derive(Clone, Debug)]
pub struct CallFrame {
    /// Qualified routine name (`TFoo.Bar`, `Main`).
    pub name: String,
    /// Source location of the call site.
    pub call_span: Option<Span>,
}

/// Live call stack for the interpreter.
///
/// # Example
///
/// ```ignore
/// stack.push(CallFrame { name, call_span: Some(span) })?;
/// // ... run the body ...
/// stack.pop();
/// ```
#[derive(Clone, Debug)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: usize,
}

impl CallStack {
    /// Create an empty call stack with the given depth limit.
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a call frame, checking the depth limit.
    ///
    /// The frame is NOT pushed on overflow.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), EvalError> {
        if self.frames.len() >= self.max_depth {
            tracing::warn!(depth = self.max_depth, routine = %frame.name, "recursion limit hit");
            return Err(max_recursion_exceeded(self.max_depth));
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Pop the most recent call frame.
    pub fn pop(&mut self) {
        debug_assert!(
            !self.frames.is_empty(),
            "CallStack::pop() called on empty stack"
        );
        self.frames.pop();
    }

    /// Current call depth.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The configured depth limit.
    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Check if the stack is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Name of the innermost routine, if any.
    pub fn current(&self) -> Option<&str> {
        self.frames.last().map(|frame| frame.name.as_str())
    }

    /// Snapshot the stack, most recent call first.
    pub fn capture(&self) -> EvalBacktrace {
        let frames = self
            .frames
            .iter()
            .rev()
            .map(|frame| BacktraceFrame {
                name: frame.name.clone(),
                span: frame.call_span,
            })
            .collect();
        EvalBacktrace::new(frames)
    }

    /// Attach a backtrace to an error that does not have one yet.
    pub fn attach_backtrace(&self, err: EvalError) -> EvalError {
        if self.frames.is_empty() || err.backtrace.is_some() {
            return err;
        }
        err.with_backtrace(self.capture())
    }
}
