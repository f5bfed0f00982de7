pub mod ast;
pub mod builtins;
pub mod engine;
pub mod runtime;
