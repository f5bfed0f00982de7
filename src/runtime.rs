//! Runtime model shared by the executor: values, frames, the call stack and
//! error types.

pub mod error;
pub mod frame;
pub mod stack;
pub mod value;
