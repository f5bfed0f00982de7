//! Runtime value model.
//!
//! Lists and records are reference-like: a `Value` holds an `Rc` handle, so
//! cloning a value shares the underlying storage and indexed mutation is
//! visible to every holder. Records preserve key insertion order.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::BinaryOperator;
use crate::runtime::error::RuntimeError;

pub type ListRef = Rc<RefCell<Vec<Value>>>;
pub type RecordRef = Rc<RefCell<IndexMap<String, Value>>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
    List(ListRef),
    Record(RecordRef),
    Null,
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn record(entries: IndexMap<String, Value>) -> Self {
        Value::Record(Rc::new(RefCell::new(entries)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::List(_) => "list",
            Value::Record(_) => "record",
            Value::Null => "null",
        }
    }

    /// Truthiness for the short-circuit operators: `false`, `null`, `0`,
    /// `NaN` and `""` are falsy; lists and records are always truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(value) => *value != 0.0 && !value.is_nan(),
            Value::String(value) => !value.is_empty(),
            Value::Boolean(value) => *value,
            Value::List(_) | Value::Record(_) => true,
            Value::Null => false,
        }
    }

    /// Renders the value for display and string concatenation. Whole numbers
    /// print without a fractional part.
    pub fn to_output(&self) -> String {
        match self {
            Value::Number(value) => format_number(*value),
            Value::String(value) => value.clone(),
            Value::Boolean(value) => value.to_string(),
            Value::List(items) => {
                let rendered = items
                    .borrow()
                    .iter()
                    .map(Value::to_output)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{rendered}]")
            }
            Value::Record(entries) => {
                let rendered = entries
                    .borrow()
                    .iter()
                    .map(|(key, value)| format!("{key}: {}", value.to_output()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{rendered}}}")
            }
            Value::Null => "null".to_string(),
        }
    }

    /// Applies an eager binary operator to two evaluated operands. The
    /// short-circuit operators never reach this point; the evaluator decides
    /// them before the right operand is touched.
    pub fn apply_binary(
        operator: BinaryOperator,
        left: &Value,
        right: &Value,
    ) -> Result<Value, RuntimeError> {
        match operator {
            BinaryOperator::Add => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(_), _) | (_, Value::String(_)) => Ok(Value::String(format!(
                    "{}{}",
                    left.to_output(),
                    right.to_output()
                ))),
                _ => Err(invalid_operands(operator, left, right)),
            },
            BinaryOperator::Sub => numeric(operator, left, right, |a, b| a - b),
            BinaryOperator::Mul => numeric(operator, left, right, |a, b| a * b),
            BinaryOperator::Div => {
                nonzero_divisor(operator, left, right)?;
                numeric(operator, left, right, |a, b| a / b)
            }
            BinaryOperator::Mod => {
                nonzero_divisor(operator, left, right)?;
                // f64 remainder already follows the sign of the dividend.
                numeric(operator, left, right, |a, b| a % b)
            }
            BinaryOperator::Gt => ordering(operator, left, right, |o| o.is_gt()),
            BinaryOperator::Ge => ordering(operator, left, right, |o| o.is_ge()),
            BinaryOperator::Lt => ordering(operator, left, right, |o| o.is_lt()),
            BinaryOperator::Le => ordering(operator, left, right, |o| o.is_le()),
            // Strict equality: same kind and same content, structural for
            // lists and records.
            BinaryOperator::Eq => Ok(Value::Boolean(left == right)),
            BinaryOperator::And | BinaryOperator::Or => {
                unreachable!("short-circuit operators are decided by the evaluator")
            }
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn invalid_operands(operator: BinaryOperator, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::InvalidOperands {
        operator: operator.to_string(),
        left: left.type_name().to_string(),
        right: right.type_name().to_string(),
    }
}

fn numeric(
    operator: BinaryOperator,
    left: &Value,
    right: &Value,
    apply: impl FnOnce(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(apply(*a, *b))),
        _ => Err(invalid_operands(operator, left, right)),
    }
}

fn nonzero_divisor(
    operator: BinaryOperator,
    left: &Value,
    right: &Value,
) -> Result<(), RuntimeError> {
    match right {
        Value::Number(divisor) if *divisor == 0.0 => Err(RuntimeError::DivisionByZero),
        Value::Number(_) => Ok(()),
        _ => Err(invalid_operands(operator, left, right)),
    }
}

fn ordering(
    operator: BinaryOperator,
    left: &Value,
    right: &Value,
    decide: impl FnOnce(std::cmp::Ordering) -> bool,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            // NaN compares false on every ordering, as in the source language.
            Ok(Value::Boolean(a.partial_cmp(b).is_some_and(decide)))
        }
        (Value::String(a), Value::String(b)) => Ok(Value::Boolean(decide(a.cmp(b)))),
        _ => Err(invalid_operands(operator, left, right)),
    }
}
