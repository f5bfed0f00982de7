//! A single scope: its function table, variable table and return signal.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ast::Block;
use crate::runtime::error::RuntimeError;
use crate::runtime::value::Value;

/// A host-provided routine. Natives receive their evaluated arguments in
/// order and run without a frame of their own.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value, RuntimeError>>;

/// Registration descriptor for a built-in function: fixed name, exact
/// argument count, and the callable itself.
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub function: NativeFn,
}

#[derive(Clone)]
pub enum FunctionBody {
    User(Rc<Block>),
    Native(NativeFn),
}

impl fmt::Debug for FunctionBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionBody::User(body) => f.debug_tuple("User").field(body).finish(),
            FunctionBody::Native(_) => f.write_str("Native(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub parameters: Vec<String>,
    pub body: FunctionBody,
}

impl FunctionDef {
    pub fn user(parameters: Vec<String>, body: Rc<Block>) -> Self {
        Self {
            parameters,
            body: FunctionBody::User(body),
        }
    }

    /// Natives declare a count rather than names; placeholder names carry
    /// the arity through the same definition shape as user functions.
    pub fn native(arity: usize, function: NativeFn) -> Self {
        let parameters = (0..arity).map(|i| format!("param{i}")).collect();
        Self {
            parameters,
            body: FunctionBody::Native(function),
        }
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

/// Shared handle to a frame. The same frame may be attached to several
/// independent call stacks to expose common bindings.
pub type FrameRef = Rc<RefCell<Frame>>;

#[derive(Debug)]
pub struct Frame {
    name: String,
    functions: FxHashMap<String, FunctionDef>,
    variables: FxHashMap<String, Value>,
    return_flag: bool,
    return_value: Value,
}

impl Frame {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: FxHashMap::default(),
            variables: FxHashMap::default(),
            return_flag: false,
            return_value: Value::Null,
        }
    }

    pub fn shared(name: impl Into<String>) -> FrameRef {
        Rc::new(RefCell::new(Frame::new(name)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variable(&self, name: &str) -> Option<Value> {
        self.variables.get(name).cloned()
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn set_variable(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_string(), value);
    }

    pub fn function(&self, name: &str) -> Option<FunctionDef> {
        self.functions.get(name).cloned()
    }

    /// Each frame defines a name at most once; shadowing a definition from
    /// another frame is fine.
    pub fn register_function(&mut self, name: &str, def: FunctionDef) -> Result<(), RuntimeError> {
        if self.functions.contains_key(name) {
            return Err(RuntimeError::DuplicateFunction {
                name: name.to_string(),
            });
        }
        self.functions.insert(name.to_string(), def);
        Ok(())
    }

    pub fn return_pending(&self) -> bool {
        self.return_flag
    }

    pub fn set_return(&mut self, value: Value) {
        self.return_flag = true;
        self.return_value = value;
    }

    /// The call's result: the stored value when a return ran, Null otherwise.
    pub fn return_value(&self) -> Value {
        if self.return_flag {
            self.return_value.clone()
        } else {
            Value::Null
        }
    }
}
