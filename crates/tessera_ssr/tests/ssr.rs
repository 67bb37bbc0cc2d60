//! End-to-end server compiles.

use tessera_ast::{CodegenMode, RuntimeHelper};
use tessera_ssr::{compile_ssr, compile_ssr_ast, Bump, DomCompilerOptions};

/// The render function with line breaks and indentation removed.
fn render_fn(code: &str) -> String {
    let flat: String = code.lines().map(str::trim).collect();
    match flat.find("function ssrRender") {
        Some(start) => flat[start..].to_string(),
        None => panic!("no render function in\n{}", code),
    }
}

fn compile(source: &str) -> String {
    let output = compile_ssr(source, &DomCompilerOptions::default()).unwrap();
    assert!(output.errors.is_empty(), "{:?}", output.errors);
    render_fn(&output.code)
}

mod output {
    use super::*;

    #[test]
    fn single_root_with_interpolation() {
        insta::assert_snapshot!(
            compile("<div>{{ msg }}</div>"),
            @"function ssrRender(_ctx, _push, _parent, _attrs) {_push(`<div${_ssrRenderAttrs(_attrs)}>${_ssrInterpolate(_ctx.msg)}</div>`)}"
        );
    }

    #[test]
    fn text_only_root() {
        insta::assert_snapshot!(
            compile("hello"),
            @"function ssrRender(_ctx, _push, _parent, _attrs) {_push(`hello`)}"
        );
    }

    #[test]
    fn fragment_root() {
        insta::assert_snapshot!(
            compile("<p>a</p><p>b</p>"),
            @"function ssrRender(_ctx, _push, _parent, _attrs) {_push(`<!--[--><p>a</p><p>b</p><!--]-->`)}"
        );
    }

    #[test]
    fn helpers_come_from_the_server_renderer() {
        let output = compile_ssr("<div>{{ msg }}</div>", &DomCompilerOptions::default()).unwrap();
        assert!(output.code.contains(r#"require("vue/server-renderer")"#), "{}", output.code);
        assert!(output.code.contains("ssrInterpolate: _ssrInterpolate"), "{}", output.code);
        assert!(!output.code.contains("return _push"), "{}", output.code);
    }

    #[test]
    fn module_mode_imports() {
        let options = DomCompilerOptions {
            mode: CodegenMode::Module,
            ..Default::default()
        };
        let output = compile_ssr("<div>{{ msg }}</div>", &options).unwrap();
        assert!(output.code.contains(r#"from "vue/server-renderer""#), "{}", output.code);
        assert!(output.code.contains("export function ssrRender("), "{}", output.code);
    }

    #[test]
    fn identifiers_are_always_prefixed() {
        let options = DomCompilerOptions {
            prefix_identifiers: false,
            ..Default::default()
        };
        let output = compile_ssr("<div>{{ msg }}</div>", &options).unwrap();
        assert!(output.code.contains("_ctx.msg"), "{}", output.code);
        assert!(!output.code.contains("with (_ctx)"), "{}", output.code);
    }
}

mod control_flow {
    use super::*;

    #[test]
    fn if_inside_for() {
        let code = compile(r#"<ul><template v-for="item in items"><li v-if="item.ok">{{ item.name }}</li></template></ul>"#);
        assert!(code.contains("_ssrRenderList(_ctx.items, (item) => {"), "{}", code);
        assert!(code.contains("if (item.ok) {"), "{}", code);
        assert!(code.contains("_ssrInterpolate(item.name)"), "{}", code);
        assert!(code.contains("} else {_push(`<!---->`)}"), "{}", code);
    }

    #[test]
    fn root_if_chain_receives_attrs() {
        let code = compile(r#"<div v-if="a">a</div><span v-else>b</span>"#);
        assert!(code.contains("if (_ctx.a) {_push(`<div${_ssrRenderAttrs(_attrs)}>a</div>`)}"), "{}", code);
        assert!(code.contains("else {_push(`<span${_ssrRenderAttrs(_attrs)}>b</span>`)}"), "{}", code);
    }

    #[test]
    fn multi_node_loop_body_is_a_fragment() {
        let code = compile(r#"<div><template v-for="i in 3"><b>{{ i }}</b>,</template></div>"#);
        assert!(code.contains("_push(`<!--[--><b>${_ssrInterpolate(i)}</b>,<!--]-->`)"), "{}", code);
    }
}

mod components {
    use super::*;

    #[test]
    fn slot_forwarding() {
        let code = compile(r#"<div><Child><template #item="{ value }"><slot name="row" :value="value"/></template></Child></div>"#);
        assert!(code.contains("item: _withCtx(({ value }, _push, _parent, _scopeId) => {"), "{}", code);
        assert!(
            code.contains(r#"_ssrRenderSlot(_ctx.$slots, "row", { value: value }, null, _push, _parent, _scopeId)"#),
            "{}",
            code
        );
        assert!(code.contains(r#"_renderSlot(_ctx.$slots, "row""#), "{}", code);
    }

    #[test]
    fn nested_components_render_through_push() {
        let code = compile("<Outer><Inner/></Outer>");
        assert!(code.contains("_push(_ssrRenderComponent(_component_Outer, _attrs, {"), "{}", code);
        assert!(
            code.contains("_push(_ssrRenderComponent(_component_Inner, null, null, _parent, _scopeId))"),
            "{}",
            code
        );
        assert!(code.contains("_createVNode(_component_Inner)"), "{}", code);
    }

    #[test]
    fn v_model_on_component_is_a_prop() {
        let code = compile(r#"<div><Field v-model="name"/></div>"#);
        assert!(code.contains("modelValue: _ctx.name"), "{}", code);
        assert!(code.contains(r#""onUpdate:modelValue": $event => ((_ctx.name) = $event)"#), "{}", code);
    }
}

mod diagnostics {
    use super::*;

    #[test]
    fn errors_do_not_abort_codegen() {
        let output = compile_ssr("<div><Teleport>x</Teleport><p :a'b=\"c\"></p></div>", &DomCompilerOptions::default()).unwrap();
        let codes: Vec<u16> = output.errors.iter().map(|e| e.code).collect();
        assert!(codes.contains(&65), "{:?}", codes);
        assert!(codes.contains(&66), "{:?}", codes);
        assert!(output.code.contains("function ssrRender("), "{}", output.code);
    }
}

#[test]
fn tree_is_returned_with_the_code() {
    let allocator = Bump::new();
    let (root, output) =
        compile_ssr_ast(&allocator, "<p>{{ msg }}</p>", &DomCompilerOptions::default()).unwrap();
    assert!(output.code.contains("_ssrInterpolate(_ctx.msg)"), "{}", output.code);
    assert_eq!(root.children.len(), 1);
    assert_eq!(root.children[0].as_element().unwrap().tag, "p");
    assert!(root.ssr_helpers.contains(&RuntimeHelper::SsrInterpolate));
}
