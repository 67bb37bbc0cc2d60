//! Render function generation.
//!
//! Prints the root IR as a `render` (or `ssrRender`) function preceded by
//! a preamble that imports or destructures the runtime helpers and declares
//! hoisted constants. [`NodeId`](tessera_ast::NodeId) references are
//! resolved against the final tree, so every rewrite made by later passes
//! is visible here.

mod context;
mod node_index;
mod printer;
mod source_map;

pub use context::CodegenContext;
pub use node_index::NodeIndex;
pub use printer::escape_template;
pub use source_map::{encode_vlq, Mapping, SourceMap, SourceMapBuilder};

use tessera_ast::{CodegenMode, CodegenOptions, NodeId, RootNode, RuntimeHelper};

use crate::utils::to_valid_asset_id;

/// Code generation failure
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("IR references node {0:?} which is not in the tree")]
    UnresolvedNode(NodeId),
    #[error("IR references the children of {0:?} which is not a container")]
    UnresolvedChildren(NodeId),
    #[error("node {0:?} was never lowered by a transform")]
    MissingCodegen(NodeId),
}

/// Generated code
#[derive(Debug, Clone)]
pub struct CodegenResult {
    pub code: String,
    /// Imports and hoists, split out when the render function is inlined
    pub preamble: String,
    pub map: Option<SourceMap>,
}

/// Helpers hoisted initializers may call before `_Vue` is destructured.
const STATIC_HELPERS: [RuntimeHelper; 5] = [
    RuntimeHelper::CreateVNode,
    RuntimeHelper::CreateElementVNode,
    RuntimeHelper::CreateComment,
    RuntimeHelper::CreateText,
    RuntimeHelper::CreateStatic,
];

fn alias(helper: RuntimeHelper) -> String {
    format!("{}: _{}", helper.name(), helper.name())
}

fn import_alias(helper: RuntimeHelper) -> String {
    format!("{} as _{}", helper.name(), helper.name())
}

fn join(helpers: &[RuntimeHelper], f: fn(RuntimeHelper) -> String) -> String {
    helpers.iter().map(|h| f(*h)).collect::<Vec<_>>().join(", ")
}

/// Generate the render function for a transformed root.
pub fn generate(root: &RootNode<'_>, options: &CodegenOptions) -> Result<CodegenResult, CodegenError> {
    let index = NodeIndex::build(root);
    let mut ctx = CodegenContext::new(options, &index, options.source_map);
    let use_with_block = !options.prefix_identifiers && options.mode != CodegenMode::Module;
    let has_helpers = !root.helpers.is_empty();

    let preamble = if options.inline {
        let mut preamble_ctx = CodegenContext::new(options, &index, false);
        gen_preamble(root, &mut preamble_ctx)?;
        preamble_ctx.into_parts().0
    } else {
        gen_preamble(root, &mut ctx)?;
        String::new()
    };

    let function_name = if options.ssr { "ssrRender" } else { "render" };
    let mut args: Vec<&str> = if options.ssr {
        vec!["_ctx", "_push", "_parent", "_attrs"]
    } else {
        vec!["_ctx", "_cache"]
    };
    if options.binding_metadata.is_some() && !options.inline {
        args.extend(["$props", "$setup", "$data", "$options"]);
    }
    let signature = if options.is_ts {
        args.iter().map(|a| format!("{}: any", a)).collect::<Vec<_>>().join(",")
    } else {
        args.join(", ")
    };
    if options.inline {
        ctx.push(&format!("({}) => {{", signature));
    } else {
        ctx.push(&format!("function {}({}) {{", function_name, signature));
    }
    ctx.indent();

    if use_with_block {
        ctx.push("with (_ctx) {");
        ctx.indent();
        if has_helpers {
            ctx.push(&format!("const {{ {} }} = _Vue\n", join(&root.helpers, alias)));
            ctx.newline();
        }
    }

    if !root.components.is_empty() {
        gen_assets(&mut ctx, &root.components, "component");
        if !root.directives.is_empty() || root.temps > 0 {
            ctx.newline();
        }
    }
    if !root.directives.is_empty() {
        gen_assets(&mut ctx, &root.directives, "directive");
        if root.temps > 0 {
            ctx.newline();
        }
    }
    if root.temps > 0 {
        let temps: Vec<String> = (0..root.temps).map(|i| format!("_temp{}", i)).collect();
        ctx.push(&format!("let {}", temps.join(", ")));
    }
    if !root.components.is_empty() || !root.directives.is_empty() || root.temps > 0 {
        ctx.push("\n");
        ctx.newline();
    }

    if !options.ssr {
        ctx.push("return ");
    }
    match &root.codegen_node {
        Some(node) => ctx.gen_node(node)?,
        None => ctx.push("null"),
    }

    if use_with_block {
        ctx.deindent(false);
        ctx.push("}");
    }
    ctx.deindent(false);
    ctx.push("}");

    let (code, map) = ctx.into_parts();
    let map = map.map(|builder| builder.finish(&options.filename, &root.source));
    tracing::trace!(bytes = code.len(), "render function generated");
    Ok(CodegenResult {
        code,
        preamble,
        map,
    })
}

fn gen_preamble(root: &RootNode<'_>, ctx: &mut CodegenContext<'_, '_>) -> Result<(), CodegenError> {
    match ctx.options.mode {
        CodegenMode::Module => gen_module_preamble(root, ctx),
        CodegenMode::Function => gen_function_preamble(root, ctx),
    }
}

fn gen_function_preamble(
    root: &RootNode<'_>,
    ctx: &mut CodegenContext<'_, '_>,
) -> Result<(), CodegenError> {
    let options = ctx.options;
    let binding = if options.ssr {
        format!("require({})", tessera_arena::to_js_string_literal(&options.runtime_module_name))
    } else {
        options.runtime_global_name.to_string()
    };

    if !root.helpers.is_empty() {
        if options.prefix_identifiers {
            ctx.push(&format!("const {{ {} }} = {}\n", join(&root.helpers, alias), binding));
        } else {
            ctx.push(&format!("const _Vue = {}\n", binding));
            if !root.hoists.is_empty() {
                let static_helpers: Vec<RuntimeHelper> = STATIC_HELPERS
                    .into_iter()
                    .filter(|h| root.helpers.contains(h))
                    .collect();
                ctx.push(&format!("const {{ {} }} = _Vue\n", join(&static_helpers, alias)));
            }
        }
    }
    if !root.ssr_helpers.is_empty() {
        ctx.push(&format!(
            "const {{ {} }} = require({})\n",
            join(&root.ssr_helpers, alias),
            tessera_arena::to_js_string_literal(&options.ssr_runtime_module_name)
        ));
    }
    gen_hoists(root, ctx)?;
    ctx.newline();
    ctx.push("return ");
    Ok(())
}

fn gen_module_preamble(
    root: &RootNode<'_>,
    ctx: &mut CodegenContext<'_, '_>,
) -> Result<(), CodegenError> {
    let options = ctx.options;
    let runtime = tessera_arena::to_js_string_literal(&options.runtime_module_name);

    if !root.helpers.is_empty() {
        if options.optimize_imports {
            let names: Vec<&str> = root.helpers.iter().map(|h| h.name()).collect();
            ctx.push(&format!("import {{ {} }} from {}\n", names.join(", "), runtime));
            let bindings: Vec<String> = root
                .helpers
                .iter()
                .map(|h| format!("_{} = {}", h.name(), h.name()))
                .collect();
            ctx.push(&format!(
                "\n// Binding optimization for webpack code-split\nconst {}\n",
                bindings.join(", ")
            ));
        } else {
            ctx.push(&format!("import {{ {} }} from {}\n", join(&root.helpers, import_alias), runtime));
        }
    }
    if !root.ssr_helpers.is_empty() {
        ctx.push(&format!(
            "import {{ {} }} from {}\n",
            join(&root.ssr_helpers, import_alias),
            tessera_arena::to_js_string_literal(&options.ssr_runtime_module_name)
        ));
    }
    if !root.imports.is_empty() {
        for import in &root.imports {
            ctx.push("import ");
            ctx.push(&import.exp.content);
            ctx.push(&format!(" from '{}'", import.path));
            ctx.newline();
        }
        ctx.newline();
    }
    gen_hoists(root, ctx)?;
    ctx.newline();
    if !options.inline {
        ctx.push("export ");
    }
    Ok(())
}

fn gen_hoists(root: &RootNode<'_>, ctx: &mut CodegenContext<'_, '_>) -> Result<(), CodegenError> {
    if root.hoists.is_empty() {
        return Ok(());
    }
    ctx.pure = true;
    ctx.newline();
    for (i, hoist) in root.hoists.iter().enumerate() {
        if let Some(exp) = hoist {
            ctx.push(&format!("const _hoisted_{} = ", i + 1));
            ctx.gen_node(exp)?;
            ctx.newline();
        }
    }
    ctx.pure = false;
    Ok(())
}

fn gen_assets(ctx: &mut CodegenContext<'_, '_>, assets: &[tessera_arena::String], kind: &str) {
    let resolver = if kind == "component" {
        RuntimeHelper::ResolveComponent
    } else {
        RuntimeHelper::ResolveDirective
    };
    for (i, asset) in assets.iter().enumerate() {
        let (id, self_reference) = match asset.strip_suffix("__self") {
            Some(id) => (id, true),
            None => (asset.as_str(), false),
        };
        ctx.push(&format!(
            "const {} = _{}({}{}){}",
            to_valid_asset_id(id, kind),
            resolver.name(),
            tessera_arena::to_js_string_literal(id),
            if self_reference { ", true" } else { "" },
            if ctx.options.is_ts { "!" } else { "" }
        ));
        if i + 1 < assets.len() {
            ctx.newline();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::transform;
    use crate::transforms::base_preset;
    use tessera_arena::Bump;
    use tessera_ast::{CompilerOptions, TransformOptions};

    fn compile(source: &str, options: CompilerOptions) -> CodegenResult {
        let mut options = options;
        options.normalize();
        let allocator = Bump::new();
        let (mut root, _) = tessera_parser::parse(&allocator, source);
        transform(&allocator, &mut root, &options.transform, &base_preset());
        generate(&root, &options.codegen).unwrap()
    }

    fn prefixed() -> CompilerOptions {
        CompilerOptions {
            transform: TransformOptions {
                prefix_identifiers: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_function_mode_with_block() {
        let result = compile("{{ foo }}", CompilerOptions::default());
        assert_eq!(
            result.code,
            "const _Vue = Vue\n\nreturn function render(_ctx, _cache) {\n  with (_ctx) {\n    const { toDisplayString: _toDisplayString } = _Vue\n\n    return _toDisplayString(foo)\n  }\n}"
        );
    }

    #[test]
    fn test_prefixed_function_mode_destructures_helpers() {
        let result = compile("{{ foo }}", prefixed());
        assert_eq!(
            result.code,
            "const { toDisplayString: _toDisplayString } = Vue\n\nreturn function render(_ctx, _cache) {\n  return _toDisplayString(_ctx.foo)\n}"
        );
    }

    #[test]
    fn test_module_mode_imports() {
        let mut options = CompilerOptions::default();
        options.codegen.mode = CodegenMode::Module;
        let result = compile("{{ foo }}", options);
        assert!(result
            .code
            .starts_with("import { toDisplayString as _toDisplayString } from \"vue\"\n"));
        assert!(result.code.contains("export function render(_ctx, _cache) {"));
        assert!(result.code.contains("return _toDisplayString(_ctx.foo)"));
    }

    #[test]
    fn test_empty_template_returns_null() {
        let result = compile("", prefixed());
        assert_eq!(result.code, "\nreturn function render(_ctx, _cache) {\n  return null\n}");
    }

    #[test]
    fn test_assets_are_resolved() {
        let result = compile("<Foo v-bar/>", prefixed());
        assert!(result.code.contains(
            "const _component_Foo = _resolveComponent(\"Foo\")\n  const _directive_bar = _resolveDirective(\"bar\")\n\n  return "
        ));
    }

    #[test]
    fn test_single_element_root_block() {
        let result = compile(r#"<div id="foo">{{ msg }}</div>"#, prefixed());
        assert!(result.code.contains(
            "return (_openBlock(), _createElementBlock(\"div\", { id: \"foo\" }, _toDisplayString(_ctx.msg), 1 /* TEXT */))"
        ));
    }

    #[test]
    fn test_fragment_children_are_multiline() {
        let result = compile("<div/><span/>", prefixed());
        assert!(result.code.contains(
            "return (_openBlock(), _createElementBlock(_Fragment, null, [\n    _createElementVNode(\"div\"),\n    _createElementVNode(\"span\")\n  ], 64 /* STABLE_FRAGMENT */))"
        ));
    }

    #[test]
    fn test_hoists_are_pure() {
        let mut options = prefixed();
        options.transform.hoist_static = true;
        let result = compile("<div><span class=\"a\">x</span>{{ y }}</div>", options);
        assert!(result
            .code
            .contains("const _hoisted_1 = /*#__PURE__*/_createElementVNode(\"span\", { class: \"a\" }, \"x\", -1 /* HOISTED */)"));
        assert!(result.code.contains("_hoisted_1,"));
    }

    #[test]
    fn test_static_root_returns_its_hoist() {
        let mut options = prefixed();
        options.transform.hoist_static = true;
        let result = compile("<div>hello</div>", options);
        assert_eq!(result.code.matches("const _hoisted_").count(), 1, "{}", result.code);
        assert!(
            result.code.contains(
                "const _hoisted_1 = /*#__PURE__*/_createElementVNode(\"div\", null, \"hello\", -1 /* HOISTED */)"
            ),
            "{}",
            result.code
        );
        assert!(result.code.contains("return _hoisted_1"), "{}", result.code);
        assert!(!result.code.contains("_openBlock"), "{}", result.code);
    }

    #[test]
    fn test_source_map() {
        let mut options = prefixed();
        options.codegen.source_map = true;
        options.transform.filename = "foo.vue".into();
        let result = compile("<div>{{ msg }}</div>", options);
        let map = result.map.unwrap();
        assert_eq!(map.sources, vec!["foo.vue".to_string()]);
        assert_eq!(map.names, vec!["msg".to_string()]);
        assert!(!map.mappings.is_empty());
    }

    #[test]
    fn test_inline_mode_splits_preamble() {
        let mut options = prefixed();
        options.codegen.mode = CodegenMode::Module;
        options.transform.inline = true;
        let result = compile("{{ foo }}", options);
        assert!(result.preamble.starts_with("import { toDisplayString as _toDisplayString }"));
        assert!(result.code.starts_with("(_ctx, _cache) => {"));
    }
}
