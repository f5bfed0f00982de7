//! Standard native functions a host registers before running programs.
//!
//! The engine only defines the registration and dispatch contract; these
//! bodies are host conveniences. Printed lines accumulate in a shared
//! buffer the host presents when the run completes.

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::Engine;
use crate::runtime::error::{ExecutionError, RuntimeError};
use crate::runtime::frame::NativeFunction;
use crate::runtime::value::Value;

pub type OutputBuffer = Rc<RefCell<Vec<String>>>;

pub fn output_buffer() -> OutputBuffer {
    Rc::new(RefCell::new(Vec::new()))
}

/// Registers `print` and `len` into the engine's current frame.
pub fn register_standard(engine: &mut Engine, output: &OutputBuffer) -> Result<(), ExecutionError> {
    let sink = Rc::clone(output);
    engine.register_native_function(NativeFunction {
        name: "print".to_string(),
        arity: 1,
        function: Rc::new(move |args| {
            sink.borrow_mut().push(args[0].to_output());
            Ok(Value::Null)
        }),
    })?;

    engine.register_native_function(NativeFunction {
        name: "len".to_string(),
        arity: 1,
        function: Rc::new(|args| match &args[0] {
            Value::List(items) => Ok(Value::Number(items.borrow().len() as f64)),
            Value::Record(entries) => Ok(Value::Number(entries.borrow().len() as f64)),
            Value::String(text) => Ok(Value::Number(text.chars().count() as f64)),
            other => Err(RuntimeError::type_mismatch(
                "a list, record or string in 'len'",
                other.type_name(),
            )),
        }),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Program;

    fn run(json: &str) -> (Result<(), ExecutionError>, Vec<String>) {
        let program: Program = serde_json::from_str(json).expect("valid program JSON");
        let mut engine = Engine::new();
        engine.push_frame("builtins");
        let output = output_buffer();
        register_standard(&mut engine, &output).expect("register builtins");
        let result = engine.run(&program);
        let lines = output.borrow().clone();
        (result, lines)
    }

    #[test]
    fn print_renders_one_value_per_line() {
        let (result, lines) = run(
            r#"{"statements": [
                {"type": "call_expression", "fn_name": "print",
                 "arguments": [{"type": "string_literal", "value": "hello"}]},
                {"type": "call_expression", "fn_name": "print",
                 "arguments": [{"type": "boolean_literal", "value": true}]}
            ]}"#,
        );
        result.expect("run failed");
        assert_eq!(lines, vec!["hello", "true"]);
    }

    #[test]
    fn len_counts_lists_records_and_strings() {
        let (result, lines) = run(
            r#"{"statements": [
                {"type": "call_expression", "fn_name": "print",
                 "arguments": [{"type": "call_expression", "fn_name": "len",
                     "arguments": [{"type": "list_literal", "items": [
                         {"type": "number_literal", "value": 1},
                         {"type": "number_literal", "value": 2}
                     ]}]}]},
                {"type": "call_expression", "fn_name": "print",
                 "arguments": [{"type": "call_expression", "fn_name": "len",
                     "arguments": [{"type": "string_literal", "value": "abc"}]}]}
            ]}"#,
        );
        result.expect("run failed");
        assert_eq!(lines, vec!["2", "3"]);
    }

    #[test]
    fn len_rejects_numbers() {
        let (result, _lines) = run(
            r#"{"statements": [
                {"type": "call_expression", "fn_name": "len",
                 "arguments": [{"type": "number_literal", "value": 1}]}
            ]}"#,
        );
        let error = result.expect_err("expected type error");
        assert_eq!(
            error.kind,
            RuntimeError::type_mismatch("a list, record or string in 'len'", "number")
        );
    }
}
