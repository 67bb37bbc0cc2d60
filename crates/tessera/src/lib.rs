//! # tessera
//!
//! A template compiler for interactive and server rendering.
//!
//! This crate is the front door of the workspace: [`compile`] picks the
//! browser or server backend from the options, and the `tessera` binary
//! wraps it in a command-line tool.
//!
//! | crate | stage |
//! |---|---|
//! | [`tessera_ast`] | AST, codegen IR, options and error codes |
//! | [`tessera_core`] | transforms, hoisting, printer, source maps |
//! | [`tessera_dom`] | browser platform and stringification |
//! | [`tessera_ssr`] | server rendering backend |

pub mod config;

pub use tessera_ast as ast;
pub use tessera_core as compiler;
pub use tessera_dom as dom;
pub use tessera_ssr as ssr;

pub use tessera_ast::{CodegenMode, CompilerError, SourceLocation};
pub use tessera_dom::{Bump, CodegenError, CompileOutput, DomCompilerOptions, RootNode, SourceMap};

/// Compile a template with the backend selected by `options.ssr`.
///
/// Diagnostics are returned in the output; `Err` only reports an internal
/// codegen failure.
pub fn compile(source: &str, options: &DomCompilerOptions) -> Result<CompileOutput, CodegenError> {
    if options.ssr {
        tessera_ssr::compile_ssr(source, options)
    } else {
        tessera_dom::compile_template_with_options(source, options)
    }
}

/// [`compile`] that also hands back the transformed tree, allocated in
/// `allocator`.
pub fn compile_ast<'a>(
    allocator: &'a Bump,
    source: &'a str,
    options: &DomCompilerOptions,
) -> Result<(RootNode<'a>, CompileOutput), CodegenError> {
    if options.ssr {
        tessera_ssr::compile_ssr_ast(allocator, source, options)
    } else {
        tessera_dom::compile_template_ast(allocator, source, options)
    }
}
