//! Platform independent half of the tessera template compiler.
//!
//! - [`transform`]: the node walker, transform context and preset plumbing
//! - [`transforms`]: the built-in structural, element and directive transforms
//! - [`codegen`]: the IR printer with optional source map
//!
//! Platform crates (`tessera_dom`, `tessera_ssr`) build their presets on top
//! of [`transforms::base_node_transforms`] and call [`transform`] and
//! [`codegen::generate`] directly.

pub mod codegen;
pub mod transform;
pub mod transforms;
pub mod utils;

pub use codegen::{generate, CodegenError, CodegenResult, SourceMap};
pub use transform::{
    transform, BoxedNodeTransform, Container, DirectiveTransform, DirectiveTransformFn,
    DirectiveTransformResult, ExitFn, HoistTransformFn, NeedRuntime, NodeCursor, NodeTransform,
    ParentInfo, RootTransformFn, TransformContext, TransformPreset, Walker,
};
pub use transforms::{base_node_transforms, base_preset};

use tessera_arena::Bump;
use tessera_ast::{CompilerError, CompilerOptions, RootNode};

/// Output of a full compile
#[derive(Debug)]
pub struct CompileOutput {
    pub code: std::string::String,
    pub preamble: std::string::String,
    pub map: Option<SourceMap>,
    pub errors: std::vec::Vec<CompilerError>,
    pub warnings: std::vec::Vec<CompilerError>,
}

/// Parse, transform and generate with a preset.
///
/// Option validation and parse errors are collected rather than returned
/// early; the caller decides whether a non-empty `errors` list is fatal.
pub fn compile_with_preset(
    source: &str,
    options: CompilerOptions,
    preset: &TransformPreset,
) -> Result<CompileOutput, CodegenError> {
    let allocator = Bump::new();
    compile_ast_with_preset(&allocator, source, options, preset).map(|(_, output)| output)
}

/// Like [`compile_with_preset`], but the tree lives in `allocator` and is
/// returned next to the output, transformed exactly as it was printed.
pub fn compile_ast_with_preset<'a>(
    allocator: &'a Bump,
    source: &'a str,
    mut options: CompilerOptions,
    preset: &TransformPreset,
) -> Result<(RootNode<'a>, CompileOutput), CodegenError> {
    options.normalize();
    let mut errors = options.validate();
    let (mut root, parse_errors) =
        tessera_parser::parse_with_options(allocator, source, options.parser.clone());
    errors.extend(parse_errors);

    let diagnostics = transform(allocator, &mut root, &options.transform, preset);
    errors.extend(diagnostics.errors);

    let result = generate(&root, &options.codegen)?;
    let output = CompileOutput {
        code: result.code,
        preamble: result.preamble,
        map: result.map,
        errors,
        warnings: diagnostics.warnings,
    };
    Ok((root, output))
}

/// Compile with the platform independent preset only.
pub fn base_compile(source: &str, options: CompilerOptions) -> Result<CompileOutput, CodegenError> {
    compile_with_preset(source, options, &base_preset())
}

#[cfg(test)]
pub(crate) mod test_utils {
    use tessera_arena::Bump;
    use tessera_ast::{Callee, CompilerError, JsNode, Property, RootNode, RuntimeHelper, TransformOptions};

    use crate::transform::transform;
    use crate::transforms::base_preset;

    pub fn compile_root_with(
        source: &str,
        options: TransformOptions,
        f: impl FnOnce(&RootNode<'_>, &[CompilerError]),
    ) {
        let allocator = Bump::new();
        let (mut root, mut errors) = tessera_parser::parse(&allocator, source);
        let diagnostics = transform(&allocator, &mut root, &options, &base_preset());
        errors.extend(diagnostics.errors);
        f(&root, &errors);
    }

    pub fn compile_root(source: &str, f: impl FnOnce(&RootNode<'_>, &[CompilerError])) {
        compile_root_with(source, TransformOptions::default(), f);
    }

    /// Seeded generator of small single-root templates for property tests.
    ///
    /// Every non-constant reference is spelled `dyn`, `go` or `Comp`, so a
    /// generated subtree is static exactly when its source holds none of
    /// them outside `v-if` / `v-for`.
    pub struct TemplateGen {
        state: u64,
    }

    impl TemplateGen {
        pub const TAGS: [&'static str; 4] = ["div", "span", "p", "section"];

        const ATTRS: [&'static str; 8] = [
            r#" class="a""#,
            r#" data-k="v""#,
            r#" :title="1""#,
            r#" :lang="'en'""#,
            r#" :id="dyn""#,
            r#" :class="dyn""#,
            r#" :style="dyn""#,
            r#" @click="go""#,
        ];

        pub fn new(seed: u64) -> Self {
            Self {
                state: seed.wrapping_mul(0x9e37_79b9_7f4a_7c15) | 1,
            }
        }

        // xorshift64
        fn next(&mut self) -> u64 {
            let mut x = self.state;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.state = x;
            x
        }

        fn pick(&mut self, n: usize) -> usize {
            (self.next() % n as u64) as usize
        }

        pub fn template(&mut self) -> std::string::String {
            self.element(3)
        }

        fn element(&mut self, depth: usize) -> std::string::String {
            let tag = Self::TAGS[self.pick(Self::TAGS.len())];
            let mut out = format!("<{}", tag);
            for attr in Self::ATTRS {
                if self.pick(5) == 0 {
                    out.push_str(attr);
                }
            }
            out.push('>');
            if depth > 0 {
                for _ in 0..self.pick(4) {
                    let child = self.child(depth - 1);
                    out.push_str(&child);
                }
            }
            out.push_str(&format!("</{}>", tag));
            out
        }

        fn child(&mut self, depth: usize) -> std::string::String {
            match self.pick(9) {
                0 => "text ".into(),
                1 => "{{ 1 + 1 }}".into(),
                2 => "{{ dyn }}".into(),
                3 => "<Comp/>".into(),
                4 => r#"<i v-if="dyn">x</i>"#.into(),
                5 => r#"<b v-for="n in dyn">x</b>"#.into(),
                _ => self.element(depth),
            }
        }
    }

    /// Props object of the first root element, looking through the
    /// `normalizeProps` wrapper dynamic keys get.
    pub fn first_element_props(
        source: &str,
        options: TransformOptions,
        f: impl FnOnce(&[Property]),
    ) {
        compile_root_with(source, options, |root, _| {
            let el = root.children[0].as_element().expect("element root");
            let call = el
                .codegen_node
                .as_ref()
                .and_then(JsNode::as_vnode_call)
                .expect("vnode call");
            match &call.props {
                Some(JsNode::Object(obj)) => f(&obj.properties),
                Some(JsNode::Call(normalize))
                    if normalize.callee == Callee::Helper(RuntimeHelper::NormalizeProps) =>
                {
                    match normalize.arguments.first() {
                        Some(JsNode::Object(obj)) => f(&obj.properties),
                        other => panic!("expected props object, got {:?}", other),
                    }
                }
                other => panic!("expected props object, got {:?}", other),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_ast::{JsNode, TransformOptions};

    #[test]
    fn test_compile_keeps_the_transformed_tree() {
        let allocator = Bump::new();
        let options = CompilerOptions {
            transform: TransformOptions {
                prefix_identifiers: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let (root, output) =
            compile_ast_with_preset(&allocator, "<div>{{ msg }}</div>", options, &base_preset())
                .unwrap();
        assert!(output.errors.is_empty(), "{:?}", output.errors);
        assert!(output.code.contains("_toDisplayString(_ctx.msg)"), "{}", output.code);

        let el = root.children[0].as_element().unwrap();
        assert_eq!(el.tag, "div");
        assert!(matches!(
            el.codegen_node.as_ref(),
            Some(JsNode::VNodeCall(call)) if call.is_block
        ));
        assert!(root.codegen_node.is_some());
        assert_eq!(root.source, "<div>{{ msg }}</div>");
    }
}
