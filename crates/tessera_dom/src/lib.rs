//! Browser platform layer of the tessera template compiler.
//!
//! This crate adds what the platform independent core leaves open:
//! - HTML namespaces, text modes, void and native tags for the parser
//! - `v-html`, `v-text`, `v-show`, and form-aware `v-model`
//! - `v-on` event, key and system modifiers
//! - static `style` normalization, `<Transition>` checks
//! - stringification of large static runs into `createStaticVNode`

pub mod errors;
pub mod options;
pub mod transforms;

pub use errors::{create_dom_error, DomErrorCode};
pub use options::*;
pub use transforms::{dom_directive_transforms, dom_node_transforms, dom_preset};

// Re-export the core entry types so callers need a single dependency
pub use tessera_arena::Bump;
pub use tessera_ast::RootNode;
pub use tessera_core::{CodegenError, CompileOutput, SourceMap};

use tessera_core::{
    compile_ast_with_preset, compile_with_preset, BoxedNodeTransform, DirectiveTransform,
};

/// Compile a template for the browser with default options
pub fn compile_template(source: &str) -> Result<CompileOutput, CodegenError> {
    compile_template_with_options(source, &DomCompilerOptions::default())
}

/// Compile a template for the browser
pub fn compile_template_with_options(
    source: &str,
    options: &DomCompilerOptions,
) -> Result<CompileOutput, CodegenError> {
    let _span = tracing::debug_span!("compile_dom", filename = %options.filename).entered();
    compile_with_preset(source, options.to_compiler_options(), &dom_preset())
}

/// Compile a template for the browser, returning the transformed tree
/// allocated in `allocator` together with the generated code.
pub fn compile_template_ast<'a>(
    allocator: &'a Bump,
    source: &'a str,
    options: &DomCompilerOptions,
) -> Result<(RootNode<'a>, CompileOutput), CodegenError> {
    let _span = tracing::debug_span!("compile_dom", filename = %options.filename).entered();
    compile_ast_with_preset(allocator, source, options.to_compiler_options(), &dom_preset())
}

/// Compile with user transforms appended to the DOM preset.
///
/// User node transforms run after the built-ins; a user directive
/// transform replaces a built-in one of the same name.
pub fn compile_template_with_transforms(
    source: &str,
    options: &DomCompilerOptions,
    node_transforms: std::vec::Vec<BoxedNodeTransform>,
    directive_transforms: std::vec::Vec<(tessera_arena::String, DirectiveTransform)>,
) -> Result<CompileOutput, CodegenError> {
    let mut preset = dom_preset();
    preset.extend(node_transforms, directive_transforms);
    compile_with_preset(source, options.to_compiler_options(), &preset)
}

#[cfg(test)]
pub(crate) mod test_utils {
    use tessera_arena::Bump;
    use tessera_ast::{JsNode, Property};
    use tessera_core::{transform, CompileOutput};

    use crate::{compile_template_with_options, dom_preset, DomCompilerOptions};

    pub fn compile(source: &str) -> CompileOutput {
        compile_with(source, DomCompilerOptions::default())
    }

    pub fn compile_with(source: &str, options: DomCompilerOptions) -> CompileOutput {
        compile_template_with_options(source, &options).expect("codegen")
    }

    /// Props object of the root element's vnode call.
    pub fn root_props(source: &str, f: impl FnOnce(&[Property])) {
        let allocator = Bump::new();
        let mut options = DomCompilerOptions::default().to_compiler_options();
        options.normalize();
        let (mut root, _) =
            tessera_parser::parse_with_options(&allocator, source, options.parser.clone());
        transform(&allocator, &mut root, &options.transform, &dom_preset());
        let el = root.children[0].as_element().expect("element root");
        let call = el
            .codegen_node
            .as_ref()
            .and_then(JsNode::as_vnode_call)
            .expect("vnode call");
        match &call.props {
            Some(JsNode::Object(obj)) => f(&obj.properties),
            other => panic!("expected props object, got {:?}", other),
        }
    }
}
