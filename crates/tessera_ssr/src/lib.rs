//! Server rendering backend of the tessera template compiler.
//!
//! Produces an `ssrRender(_ctx, _push, _parent, _attrs)` function that
//! writes markup through `_push` instead of building vnodes:
//! - elements become template literals with `_ssrRender*` attribute calls
//! - components, slots and teleports become `_ssrRender*` statements
//! - `v-if` / `v-for` become plain `if` statements and `_ssrRenderList`
//!
//! Slot content of components is compiled twice: once as string pushes and
//! once through the DOM preset as a vnode fallback for components that
//! render through a render function.

pub mod codegen;
pub mod errors;
pub mod transforms;

pub use codegen::{lower_root, SsrCodegenContext};
pub use errors::{create_ssr_error, SsrErrorCode};
pub use transforms::{ssr_directive_transforms, ssr_node_transforms, ssr_preset};

pub use tessera_dom::{Bump, CodegenError, CompileOutput, DomCompilerOptions, RootNode};

use tessera_core::{
    compile_ast_with_preset, compile_with_preset, BoxedNodeTransform, DirectiveTransform,
};

/// Options forced for server compiles.
fn ssr_options(options: &DomCompilerOptions) -> DomCompilerOptions {
    DomCompilerOptions {
        ssr: true,
        prefix_identifiers: true,
        hoist_static: false,
        cache_handlers: false,
        ..options.clone()
    }
}

/// Compile a template into a server render function.
///
/// Identifier prefixing is always on; hoisting and handler caching are
/// off since the output runs once per request.
pub fn compile_ssr(source: &str, options: &DomCompilerOptions) -> Result<CompileOutput, CodegenError> {
    let options = ssr_options(options);
    let _span = tracing::debug_span!("compile_ssr", filename = %options.filename).entered();
    compile_with_preset(source, options.to_compiler_options(), &ssr_preset())
}

/// Compile into a server render function, returning the transformed tree
/// allocated in `allocator` together with the generated code.
pub fn compile_ssr_ast<'a>(
    allocator: &'a Bump,
    source: &'a str,
    options: &DomCompilerOptions,
) -> Result<(RootNode<'a>, CompileOutput), CodegenError> {
    let options = ssr_options(options);
    let _span = tracing::debug_span!("compile_ssr", filename = %options.filename).entered();
    compile_ast_with_preset(allocator, source, options.to_compiler_options(), &ssr_preset())
}

/// Compile with user transforms appended to the server preset.
pub fn compile_ssr_with_transforms(
    source: &str,
    options: &DomCompilerOptions,
    node_transforms: std::vec::Vec<BoxedNodeTransform>,
    directive_transforms: std::vec::Vec<(tessera_arena::String, DirectiveTransform)>,
) -> Result<CompileOutput, CodegenError> {
    let options = ssr_options(options);
    let mut preset = ssr_preset();
    preset.extend(node_transforms, directive_transforms);
    compile_with_preset(source, options.to_compiler_options(), &preset)
}

#[cfg(test)]
pub(crate) mod test_utils {
    use crate::{compile_ssr, CompileOutput, DomCompilerOptions};

    pub fn compile(source: &str) -> CompileOutput {
        compile_with(source, DomCompilerOptions::default())
    }

    /// Compile and join the output lines with indentation stripped, so
    /// assertions do not depend on where the printer breaks lines.
    pub fn compile_with(source: &str, options: DomCompilerOptions) -> CompileOutput {
        let mut out = compile_ssr(source, &options).expect("codegen");
        out.code = out.code.lines().map(str::trim).collect();
        out
    }
}
