//! Facade compiles across both backends.

use tessera::config::parse_config;
use tessera::{compile, CodegenMode, DomCompilerOptions};

#[test]
fn browser_function_mode_with_scope() {
    let output = compile("{{ foo }}", &DomCompilerOptions::default()).unwrap();
    insta::assert_snapshot!(output.code, @r"
    const _Vue = Vue

    return function render(_ctx, _cache) {
      with (_ctx) {
        const { toDisplayString: _toDisplayString } = _Vue

        return _toDisplayString(foo)
      }
    }
    ");
}

#[test]
fn config_file_drives_the_backend() {
    let config = parse_config(r#"{ "ssr": true, "mode": "module" }"#).unwrap();
    let output = compile("<p>{{ a }}</p>", &config.compiler).unwrap();
    assert!(output.errors.is_empty(), "{:?}", output.errors);
    assert!(output.code.contains(r#"from "vue/server-renderer""#), "{}", output.code);
    assert!(output.code.contains("export function ssrRender("), "{}", output.code);
}

#[test]
fn module_mode_browser_output() {
    let options = DomCompilerOptions {
        mode: CodegenMode::Module,
        ..Default::default()
    };
    let output = compile(r#"<button @click="count++">{{ count }}</button>"#, &options).unwrap();
    assert!(output.errors.is_empty(), "{:?}", output.errors);
    assert!(output.code.starts_with("import {"), "{}", output.code);
    assert!(output.code.contains("export function render(_ctx, _cache) {"), "{}", output.code);
    assert!(output.code.contains("_ctx.count++"), "{}", output.code);
}

#[test]
fn same_template_on_both_backends() {
    let source = r#"<ul><li v-for="item in items" :key="item.id">{{ item.label }}</li></ul>"#;

    let client = compile(source, &DomCompilerOptions::default()).unwrap();
    assert!(client.code.contains("_renderList(items, (item) =>"), "{}", client.code);

    let server = compile(
        source,
        &DomCompilerOptions {
            ssr: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert!(server.code.contains("_ssrRenderList(_ctx.items, (item) => {"), "{}", server.code);
}

#[test]
fn source_map_is_attached_when_requested() {
    let options = DomCompilerOptions {
        source_map: true,
        filename: "card.html".into(),
        ..Default::default()
    };
    let output = compile("<div>{{ msg }}</div>", &options).unwrap();
    let map = output.map.expect("source map");
    assert_eq!(map.sources, vec!["card.html".to_string()]);
    assert!(!map.mappings.is_empty());
}
