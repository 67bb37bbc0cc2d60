//! Tree types for the tessera template compiler.
//!
//! - [`ast`]: the template AST produced by the parser and mutated by transforms
//! - [`ir`]: the generic expression/statement IR consumed by both backends
//! - [`helpers`]: the runtime helper vocabulary referenced by generated code
//! - [`options`]: parser, transform and codegen options
//! - [`errors`]: numeric error codes and the reported error type

pub mod ast;
pub mod errors;
pub mod helpers;
pub mod ir;
pub mod options;

pub use ast::*;
pub use errors::{CompilerError, ErrorCode};
pub use helpers::RuntimeHelper;
pub use ir::*;
pub use options::*;
