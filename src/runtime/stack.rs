//! The call stack: an ordered sequence of frames, bottom = oldest.
//!
//! Name resolution searches frames from the top of the stack down, so a
//! called function sees (and may rebind) variables of every enclosing
//! execution, while names it creates stay local to its own frame. This is
//! the documented dynamic-style scoping of the language, not an accident.

use crate::runtime::error::RuntimeError;
use crate::runtime::frame::{Frame, FrameRef, FunctionDef};
use crate::runtime::value::Value;

#[derive(Debug, Default)]
pub struct CallStack {
    frames: Vec<FrameRef>,
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push_frame(&mut self, name: &str) {
        self.frames.push(Frame::shared(name));
    }

    /// Attaches an existing frame, e.g. a built-ins scope shared with other
    /// stacks. The frame is not copied; bindings stay visible everywhere it
    /// is attached.
    pub fn add_shared_frame(&mut self, frame: FrameRef) {
        self.frames.push(frame);
    }

    /// Every push must be paired with exactly one pop on every exit path.
    pub fn pop_frame(&mut self) -> Result<(), RuntimeError> {
        self.frames.pop().map(|_| ()).ok_or(RuntimeError::EmptyStack)
    }

    pub fn current_frame(&self) -> Result<FrameRef, RuntimeError> {
        self.frames.last().cloned().ok_or(RuntimeError::EmptyStack)
    }

    pub fn resolve_variable(&self, name: &str) -> Result<Value, RuntimeError> {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.borrow().variable(name) {
                return Ok(value);
            }
        }
        Err(RuntimeError::UndefinedVariable {
            name: name.to_string(),
        })
    }

    /// Updates the innermost frame that already binds `name`; otherwise
    /// creates the binding in the current frame, where it lives until that
    /// frame pops.
    pub fn assign_variable(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        for frame in self.frames.iter().rev() {
            let mut frame = frame.borrow_mut();
            if frame.has_variable(name) {
                frame.set_variable(name, value);
                return Ok(());
            }
        }
        let current = self.current_frame()?;
        current.borrow_mut().set_variable(name, value);
        Ok(())
    }

    pub fn resolve_function(&self, name: &str) -> Result<FunctionDef, RuntimeError> {
        for frame in self.frames.iter().rev() {
            if let Some(def) = frame.borrow().function(name) {
                return Ok(def);
            }
        }
        Err(RuntimeError::UndefinedFunction {
            name: name.to_string(),
        })
    }

    pub fn register_function(&self, name: &str, def: FunctionDef) -> Result<(), RuntimeError> {
        let current = self.current_frame()?;
        current.borrow_mut().register_function(name, def)
    }

    /// Truncates back to `depth`, discarding frames left behind by an
    /// abnormal exit so the next run starts from a clean stack.
    pub fn reset_to(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::ast::Block;
    use crate::runtime::frame::Frame;

    fn number(value: f64) -> Value {
        Value::Number(value)
    }

    fn user_function() -> FunctionDef {
        FunctionDef::user(Vec::new(), Rc::new(Block::default()))
    }

    #[test]
    fn reads_back_what_was_assigned() {
        let mut stack = CallStack::new();
        stack.push_frame("top");
        stack.assign_variable("x", number(3.0)).expect("assign x");
        assert_eq!(stack.resolve_variable("x").expect("resolve x"), number(3.0));
    }

    #[test]
    fn resolving_missing_variable_fails() {
        let mut stack = CallStack::new();
        stack.push_frame("top");
        assert_eq!(
            stack.resolve_variable("missing").expect_err("must be absent"),
            RuntimeError::UndefinedVariable {
                name: "missing".to_string()
            }
        );
    }

    #[test]
    fn assignment_updates_outer_binding_in_place() {
        let mut stack = CallStack::new();
        stack.push_frame("outer");
        stack.assign_variable("x", number(1.0)).expect("assign x");
        stack.push_frame("inner");
        stack.assign_variable("x", number(2.0)).expect("reassign x");
        stack.pop_frame().expect("pop inner");
        assert_eq!(stack.resolve_variable("x").expect("resolve x"), number(2.0));
    }

    #[test]
    fn new_binding_in_inner_frame_disappears_on_pop() {
        let mut stack = CallStack::new();
        stack.push_frame("outer");
        stack.push_frame("inner");
        stack.assign_variable("local", number(7.0)).expect("assign");
        assert_eq!(
            stack.resolve_variable("local").expect("visible while inner"),
            number(7.0)
        );
        stack.pop_frame().expect("pop inner");
        assert!(stack.resolve_variable("local").is_err());
    }

    #[test]
    fn duplicate_function_in_same_frame_is_rejected() {
        let mut stack = CallStack::new();
        stack.push_frame("top");
        stack
            .register_function("f", user_function())
            .expect("first definition");
        assert_eq!(
            stack
                .register_function("f", user_function())
                .expect_err("second definition in same frame"),
            RuntimeError::DuplicateFunction {
                name: "f".to_string()
            }
        );
    }

    #[test]
    fn redefinition_in_fresh_frame_shadows_for_its_lifetime() {
        let mut stack = CallStack::new();
        stack.push_frame("outer");
        stack
            .register_function("f", FunctionDef::user(vec!["a".to_string()], Rc::new(Block::default())))
            .expect("outer definition");
        stack.push_frame("inner");
        stack
            .register_function("f", user_function())
            .expect("shadowing definition");
        assert_eq!(stack.resolve_function("f").expect("inner wins").arity(), 0);
        stack.pop_frame().expect("pop inner");
        assert_eq!(stack.resolve_function("f").expect("outer again").arity(), 1);
    }

    #[test]
    fn popping_an_empty_stack_is_an_error() {
        let mut stack = CallStack::new();
        assert_eq!(
            stack.pop_frame().expect_err("nothing to pop"),
            RuntimeError::EmptyStack
        );
    }

    #[test]
    fn reset_discards_frames_left_by_an_abnormal_exit() {
        let mut stack = CallStack::new();
        stack.push_frame("builtins");
        let marker = stack.depth();
        stack.push_frame("run");
        stack.push_frame("abandoned-call");
        stack.reset_to(marker);
        assert_eq!(stack.depth(), 1);
        assert_eq!(
            stack.current_frame().expect("builtins frame").borrow().name(),
            "builtins"
        );
    }

    #[test]
    fn shared_frame_exposes_bindings_to_both_stacks() {
        let shared = Frame::shared("builtins");
        shared
            .borrow_mut()
            .register_function("print", user_function())
            .expect("register print");

        let mut first = CallStack::new();
        first.add_shared_frame(Rc::clone(&shared));
        let mut second = CallStack::new();
        second.add_shared_frame(shared);

        assert!(first.resolve_function("print").is_ok());
        assert!(second.resolve_function("print").is_ok());

        first.push_frame("script");
        first
            .assign_variable("seen", number(1.0))
            .expect("assign in first stack");
        // "seen" was created in first's own frame, not the shared one.
        assert!(second.resolve_variable("seen").is_err());
    }
}
