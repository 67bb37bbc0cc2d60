//! Arena and shared utilities for tessera.
//!
//! Everything the compiler stages have in common lives here: the bump
//! allocator that owns a compile's AST, the collection aliases used by the
//! tree, flag types shared by the transform and codegen stages, markup tag
//! tables, and memoized string case helpers.
//!
//! # Example
//!
//! ```
//! use tessera_arena::{Allocator, Box, Vec};
//!
//! let allocator = Allocator::default();
//!
//! let boxed = Box::new_in(42, allocator.as_bump());
//! assert_eq!(*boxed, 42);
//!
//! let mut vec = Vec::new_in(allocator.as_bump());
//! vec.push(1);
//! vec.push(2);
//! assert_eq!(vec.len(), 2);
//! ```

mod allocator;
mod clone_in;

pub mod dom_tag_config;
pub mod flags;
pub mod general;

pub use allocator::Allocator;
pub use clone_in::CloneIn;

/// Arena-backed box.
pub type Box<'a, T> = bumpalo::boxed::Box<'a, T>;
/// Arena-backed vector.
pub type Vec<'a, T> = bumpalo::collections::Vec<'a, T>;

pub use bumpalo::collections::String as BumpString;
pub use bumpalo::Bump;

pub use compact_str::CompactString;
pub use compact_str::CompactString as String;
pub use compact_str::ToCompactString;

pub use smallvec::{smallvec, SmallVec};

pub use bitflags::bitflags;

pub use rustc_hash::{FxHashMap, FxHashSet};

pub use phf::{phf_map, phf_set, Map as PhfMap, Set as PhfSet};

pub use dom_tag_config::*;
pub use flags::*;
pub use general::*;
