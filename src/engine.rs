//! The execution engine: a tree-walker over parsed programs.
//!
//! Execution pipeline:
//! run -> top-level statements -> exec_statement -> eval -> eval_call
//! -> exec_block (function body).
//!
//! Control flow out of a call is carried by the return signal on the active
//! frame, never by unwinding: every block and loop stops the moment the
//! current frame's flag is set and lets the call boundary read the value.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::{
    BinaryOperator, Block, ElseBranch, Expression, Program, Span, Statement,
};
use crate::runtime::error::{ExecutionError, RuntimeError};
use crate::runtime::frame::{FrameRef, FunctionBody, FunctionDef, NativeFunction};
use crate::runtime::stack::CallStack;
use crate::runtime::value::Value;

/// A single-threaded synchronous executor owning one call stack.
pub struct Engine {
    stack: CallStack,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            stack: CallStack::new(),
        }
    }

    /// Pushes an empty frame, typically a scope the host will populate with
    /// built-ins before the first run.
    pub fn push_frame(&mut self, name: &str) {
        self.stack.push_frame(name);
    }

    /// Attaches an existing frame, e.g. a built-ins scope shared with other
    /// engines.
    pub fn add_shared_frame(&mut self, frame: FrameRef) {
        self.stack.add_shared_frame(frame);
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Registers a host-provided function in the current frame.
    pub fn register_native_function(
        &mut self,
        native: NativeFunction,
    ) -> Result<(), ExecutionError> {
        let def = FunctionDef::native(native.arity, native.function);
        self.stack.register_function(&native.name, def)?;
        Ok(())
    }

    /// Executes a program to completion or first error. On error the stack
    /// is restored to its pre-run shape before the error surfaces, so a host
    /// (e.g. a REPL) can keep using this engine.
    pub fn run(&mut self, program: &Program) -> Result<(), ExecutionError> {
        let depth = self.stack.depth();
        self.stack.push_frame("run");
        match self.run_top_level(program) {
            Ok(()) => {
                self.stack.pop_frame().expect("run frame pushed above");
                Ok(())
            }
            Err(error) => {
                self.stack.reset_to(depth);
                Err(error)
            }
        }
    }

    fn run_top_level(&mut self, program: &Program) -> Result<(), ExecutionError> {
        for statement in &program.statements {
            if let Statement::ReturnStatement { start, .. } = statement {
                return Err(RuntimeError::ReturnOutsideFunction.at(*start));
            }
            self.exec_statement(statement)?;
            // A return nested in a top-level loop sets the flag without a
            // direct return statement here.
            if self.return_pending()? {
                return Err(RuntimeError::ReturnOutsideFunction.at(statement.span()));
            }
        }
        Ok(())
    }

    fn exec_block(&mut self, block: &Block) -> Result<(), ExecutionError> {
        for statement in &block.statements {
            self.exec_statement(statement)?;
            if self.return_pending()? {
                break;
            }
        }
        Ok(())
    }

    fn exec_statement(&mut self, statement: &Statement) -> Result<(), ExecutionError> {
        match statement {
            Statement::Comment { .. } => Ok(()),
            Statement::FunctionDefinition {
                name,
                parameters,
                body,
                start,
            } => self.register_user_function(name, parameters, body, *start),
            Statement::VarAssignment {
                var_name,
                value,
                start,
            } => {
                let value = self.eval(value)?;
                self.stack
                    .assign_variable(var_name, value)
                    .map_err(|error| error.at(*start))
            }
            Statement::CallExpression {
                fn_name,
                arguments,
                start,
            } => {
                self.eval_call(fn_name, arguments, *start)?;
                Ok(())
            }
            Statement::WhileLoop {
                condition, body, ..
            } => {
                while self.eval_condition(condition, "while")? {
                    self.exec_block(body)?;
                    if self.return_pending()? {
                        break;
                    }
                }
                Ok(())
            }
            Statement::IfStatement {
                condition,
                consequent,
                alternate,
                ..
            } => {
                if self.eval_condition(condition, "if")? {
                    self.exec_block(consequent)
                } else {
                    match alternate {
                        ElseBranch::ElseIf(statement) => self.exec_statement(statement),
                        ElseBranch::Block(block) => self.exec_block(block),
                    }
                }
            }
            Statement::ForLoop {
                loop_variable,
                iterable,
                body,
                ..
            } => self.exec_for_loop(loop_variable, iterable, body),
            Statement::IndexedAssignment {
                subject,
                index,
                value,
                start,
            } => self.exec_indexed_assignment(subject, index, value, *start),
            Statement::ReturnStatement { value, .. } => {
                let value = self.eval(value)?;
                self.current_frame()?.borrow_mut().set_return(value);
                Ok(())
            }
        }
    }

    fn exec_for_loop(
        &mut self,
        loop_variable: &str,
        iterable: &Expression,
        body: &Block,
    ) -> Result<(), ExecutionError> {
        let value = self.eval(iterable)?;
        let Value::List(items) = value else {
            return Err(RuntimeError::type_mismatch("a list in 'for'", value.type_name())
                .at(iterable.span()));
        };
        // Snapshot of the element handles: mutating the list inside the
        // body does not change the iteration sequence.
        let items: Vec<Value> = items.borrow().clone();
        for item in items {
            self.stack.assign_variable(loop_variable, item)?;
            self.exec_block(body)?;
            if self.return_pending()? {
                break;
            }
        }
        Ok(())
    }

    fn exec_indexed_assignment(
        &mut self,
        subject: &Expression,
        index: &Expression,
        value: &Expression,
        start: Span,
    ) -> Result<(), ExecutionError> {
        let target = self.eval(subject)?;
        let Value::List(items) = target else {
            return Err(
                RuntimeError::type_mismatch("a list in indexed assignment", target.type_name())
                    .at(subject.span()),
            );
        };
        let index_value = self.eval(index)?;
        let raw_index = list_index(&index_value).map_err(|error| error.at(index.span()))?;
        let value = self.eval(value)?;

        let mut items = items.borrow_mut();
        let len = items.len();
        if raw_index < 0 || raw_index as usize >= len {
            return Err(RuntimeError::IndexOutOfBounds {
                index: raw_index,
                len,
            }
            .at(start));
        }
        items[raw_index as usize] = value;
        Ok(())
    }

    fn register_user_function(
        &mut self,
        name: &str,
        parameters: &[String],
        body: &Block,
        start: Span,
    ) -> Result<(), ExecutionError> {
        let def = FunctionDef::user(parameters.to_vec(), Rc::new(body.clone()));
        self.stack
            .register_function(name, def)
            .map_err(|error| error.at(start))
    }

    fn eval(&mut self, expression: &Expression) -> Result<Value, ExecutionError> {
        match expression {
            Expression::StringLiteral { value, .. } => Ok(Value::String(value.clone())),
            Expression::NumberLiteral { value, .. } => Ok(Value::Number(*value)),
            Expression::BooleanLiteral { value, .. } => Ok(Value::Boolean(*value)),
            Expression::ListLiteral { items, .. } => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item)?);
                }
                Ok(Value::list(values))
            }
            Expression::DictionaryLiteral { entries, .. } => {
                let mut record = IndexMap::with_capacity(entries.len());
                for entry in entries {
                    // Duplicate keys: last write wins.
                    let value = self.eval(&entry.value)?;
                    record.insert(entry.key.clone(), value);
                }
                Ok(Value::record(record))
            }
            Expression::BinaryOperation {
                operator,
                left,
                right,
                start,
            } => self.eval_binary(*operator, left, right, *start),
            Expression::VarReference { var_name, start } => self
                .stack
                .resolve_variable(var_name)
                .map_err(|error| error.at(*start)),
            Expression::CallExpression {
                fn_name,
                arguments,
                start,
            } => self.eval_call(fn_name, arguments, *start),
            Expression::IndexedAccess {
                subject,
                index,
                start,
            } => self.eval_indexed_access(subject, index, *start),
            Expression::FunctionExpression {
                name,
                parameters,
                body,
                start,
            } => {
                self.register_user_function(name, parameters, body, *start)?;
                Ok(Value::Null)
            }
        }
    }

    fn eval_binary(
        &mut self,
        operator: BinaryOperator,
        left: &Expression,
        right: &Expression,
        start: Span,
    ) -> Result<Value, ExecutionError> {
        match operator {
            // Short-circuit: the result is whichever operand decided it,
            // and the right operand is not evaluated when the left decides.
            BinaryOperator::And => {
                let left = self.eval(left)?;
                if left.is_truthy() {
                    self.eval(right)
                } else {
                    Ok(left)
                }
            }
            BinaryOperator::Or => {
                let left = self.eval(left)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            _ => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Value::apply_binary(operator, &left, &right).map_err(|error| error.at(start))
            }
        }
    }

    fn eval_indexed_access(
        &mut self,
        subject: &Expression,
        index: &Expression,
        start: Span,
    ) -> Result<Value, ExecutionError> {
        let subject_value = self.eval(subject)?;
        let index_value = self.eval(index)?;
        match subject_value {
            Value::List(items) => {
                let raw_index =
                    list_index(&index_value).map_err(|error| error.at(index.span()))?;
                let items = items.borrow();
                if raw_index < 0 || raw_index as usize >= items.len() {
                    return Err(RuntimeError::IndexOutOfBounds {
                        index: raw_index,
                        len: items.len(),
                    }
                    .at(start));
                }
                Ok(items[raw_index as usize].clone())
            }
            Value::Record(entries) => {
                let Value::String(key) = index_value else {
                    return Err(RuntimeError::type_mismatch(
                        "a string key",
                        index_value.type_name(),
                    )
                    .at(index.span()));
                };
                entries
                    .borrow()
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| RuntimeError::UndefinedKey { key }.at(start))
            }
            other => Err(
                RuntimeError::type_mismatch("a list or record", other.type_name())
                    .at(subject.span()),
            ),
        }
    }

    fn eval_call(
        &mut self,
        fn_name: &str,
        arguments: &[Expression],
        start: Span,
    ) -> Result<Value, ExecutionError> {
        let def = self
            .stack
            .resolve_function(fn_name)
            .map_err(|error| error.at(start))?;
        if def.arity() != arguments.len() {
            return Err(RuntimeError::ArityMismatch {
                name: fn_name.to_string(),
                expected: def.arity(),
                found: arguments.len(),
            }
            .at(start));
        }

        // Arguments are evaluated left to right in the caller's scope,
        // before the callee's frame exists.
        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            values.push(self.eval(argument)?);
        }

        match &def.body {
            FunctionBody::Native(native) => native(&values).map_err(|error| error.at(start)),
            FunctionBody::User(body) => {
                self.stack.push_frame(fn_name);
                let result = self.execute_call(&def.parameters, body, values);
                self.stack.pop_frame().expect("call frame pushed above");
                result
            }
        }
    }

    fn execute_call(
        &mut self,
        parameters: &[String],
        body: &Block,
        arguments: Vec<Value>,
    ) -> Result<Value, ExecutionError> {
        // Parameters bind in the callee's own frame, shadowing any outer
        // variable of the same name, so recursive activations stay separate.
        let frame = self.current_frame()?;
        for (parameter, argument) in parameters.iter().zip(arguments) {
            frame.borrow_mut().set_variable(parameter, argument);
        }
        self.exec_block(body)?;
        let result = frame.borrow().return_value();
        Ok(result)
    }

    fn eval_condition(
        &mut self,
        condition: &Expression,
        construct: &str,
    ) -> Result<bool, ExecutionError> {
        let value = self.eval(condition)?;
        match value {
            Value::Boolean(value) => Ok(value),
            other => Err(RuntimeError::type_mismatch(
                &format!("a boolean condition in '{construct}'"),
                other.type_name(),
            )
            .at(condition.span())),
        }
    }

    fn current_frame(&self) -> Result<FrameRef, ExecutionError> {
        Ok(self.stack.current_frame()?)
    }

    fn return_pending(&self) -> Result<bool, ExecutionError> {
        Ok(self.current_frame()?.borrow().return_pending())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

fn list_index(value: &Value) -> Result<i64, RuntimeError> {
    match value {
        Value::Number(index) if index.fract() == 0.0 && index.is_finite() => Ok(*index as i64),
        other => Err(RuntimeError::type_mismatch(
            "an integer list index",
            other.type_name(),
        )),
    }
}
