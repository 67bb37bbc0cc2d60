//! Template scanner and parser.
//!
//! Turns template source into the arena-backed AST from `tessera_ast`,
//! collecting recoverable syntax errors along the way.
//!
//! ```ignore
//! let allocator = tessera_arena::Allocator::default();
//! let (root, errors) = tessera_parser::parse(&allocator, "<div>{{ msg }}</div>");
//! assert!(errors.is_empty());
//! assert_eq!(root.children.len(), 1);
//! ```

pub mod cursor;
pub mod parser;

pub use cursor::Cursor;
pub use parser::{condense_whitespace, parse, parse_with_options, Parser};
