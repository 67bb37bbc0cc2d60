//! Plain elements on the server.
//!
//! On exit an element gets its open tag as a template literal in
//! `ssr_codegen_node`: the tag name, static attributes inlined as text and
//! dynamic ones as `_ssrRender*` calls. Directives that replace the content
//! (`v-html`, `v-text`, `<textarea>` values) set `ssr_raw_children` or swap
//! the children for an interpolation. The closing `>`, the children and
//! the end tag are added by the statement lowering.

use tessera_arena::{escape_html, is_boolean_attr, is_ssr_safe_attr_name, Box, String, PROP_TO_ATTR};
use tessera_ast::{
    create_assignment_expression, create_conditional_expression, create_helper_call,
    create_sequence_expression, create_template_literal, Callee, CompoundExpressionNode,
    CompoundPart, ElementNode, ElementType, ErrorCode, ExpressionNode, InterpolationNode, JsNode,
    PropNode, Property, RuntimeHelper, SourceLocation, TemplateChildNode, TemplateLiteralPart,
    TextNode,
};
use tessera_core::transforms::transform_element::{
    build_directive_args, build_props, is_built_in_directive,
};
use tessera_core::utils::find_dir;
use tessera_core::{ExitFn, NodeCursor, NodeTransform, TransformContext, Walker};

use crate::errors::{create_ssr_error, SsrErrorCode};
use crate::transforms::v_model::{apply_model_children, dynamic_model_part, has_dynamic_key_v_bind};

pub struct SsrTransformElement;

impl<'a> NodeTransform<'a> for SsrTransformElement {
    fn enter(
        &self,
        cursor: &mut NodeCursor<'_, 'a>,
        _ctx: &mut TransformContext<'a>,
        _walker: &Walker<'_>,
    ) -> Option<ExitFn<'a>> {
        let TemplateChildNode::Element(el) = cursor.node() else {
            return None;
        };
        if el.tag_type != ElementType::Element {
            return None;
        }
        Some(std::boxed::Box::new(|node, ctx| {
            if let TemplateChildNode::Element(el) = node {
                build_open_tag(el, ctx);
            }
        }))
    }
}

/// Open tag parts plus the content overrides found among the props
struct OpenTag {
    parts: std::vec::Vec<TemplateLiteralPart>,
    /// Part index of the `_ssrRenderClass` call
    dynamic_class: Option<usize>,
    static_class: Option<String>,
    /// Part index of the `_ssrRenderStyle` call
    dynamic_style: Option<usize>,
}

impl OpenTag {
    fn push_str(&mut self, s: impl Into<String>) {
        self.parts.push(TemplateLiteralPart::Str(s.into()));
    }

    fn push_exp(&mut self, exp: JsNode) -> usize {
        self.parts.push(TemplateLiteralPart::Expr(exp));
        self.parts.len() - 1
    }
}

fn build_open_tag<'a>(el: &mut ElementNode<'a>, ctx: &mut TransformContext<'a>) {
    let tag = el.tag.clone();
    let need_tag_for_runtime = tag == "textarea" || tag.find('-').is_some_and(|i| i > 0);

    // v-show merges into the style last
    if let Some(i) = el
        .props
        .iter()
        .position(|p| matches!(p, PropNode::Directive(d) if d.name == "show"))
    {
        let show = el.props.remove(i);
        el.props.push(show);
    }
    apply_model_children(el, ctx);

    let need_merge = has_dynamic_key_v_bind(el)
        || el
            .props
            .iter()
            .any(|p| matches!(p, PropNode::Directive(d) if !is_built_in_directive(&d.name)));

    let mut open = OpenTag {
        parts: vec![TemplateLiteralPart::Str(format!("<{}", tag).into())],
        dynamic_class: None,
        static_class: None,
        dynamic_style: None,
    };
    let mut raw_children: Option<JsNode> = None;
    let mut text_child: Option<ExpressionNode> = None;

    if need_merge {
        let props: std::vec::Vec<&PropNode<'a>> = el.props.iter().collect();
        if let Some((merged, has_directives)) = build_ssr_props(el, ctx, &props, false, false, true) {
            let mut attrs = merged;
            if tag == "textarea" {
                let existing = match el.children.first() {
                    Some(TemplateChildNode::Interpolation(_)) => None,
                    Some(TemplateChildNode::Text(text)) => Some(text.content.clone()),
                    _ => Some(String::default()),
                };
                // the merged object may carry the value
                if let Some(existing) = existing {
                    let temp = next_temp(ctx);
                    attrs = create_assignment_expression(JsNode::raw(temp.as_str()), attrs);
                    let value = create_conditional_expression(
                        JsNode::raw(format!("\"value\" in {}", temp)),
                        JsNode::raw(format!("{}.value", temp)),
                        JsNode::string_literal(&existing),
                        false,
                    );
                    raw_children = Some(create_helper_call(
                        ctx.helper(RuntimeHelper::SsrInterpolate),
                        vec![value],
                    ));
                }
            } else if tag == "input" {
                if let Some(model) = find_dir(el, "model", false).and_then(|d| d.exp.clone()) {
                    let temp = next_temp(ctx);
                    let model_props = create_helper_call(
                        ctx.helper(RuntimeHelper::SsrGetDynamicModelProps),
                        vec![JsNode::raw(temp.as_str()), JsNode::expression(model)],
                    );
                    let merged = create_helper_call(
                        ctx.helper(RuntimeHelper::MergeProps),
                        vec![JsNode::raw(temp.as_str()), model_props],
                    );
                    attrs = create_sequence_expression(vec![
                        create_assignment_expression(JsNode::raw(temp.as_str()), attrs),
                        merged,
                    ]);
                }
            } else if has_directives && el.children.is_empty() && find_dir(el, "text", true).is_none() {
                // custom directives may provide the content
                let temp = next_temp(ctx);
                attrs = create_assignment_expression(JsNode::raw(temp.as_str()), attrs);
                raw_children = Some(create_conditional_expression(
                    JsNode::raw(format!("\"textContent\" in {}", temp)),
                    create_helper_call(
                        ctx.helper(RuntimeHelper::SsrInterpolate),
                        vec![JsNode::raw(format!("{}.textContent", temp))],
                    ),
                    JsNode::raw(format!("{}.innerHTML ?? ''", temp)),
                    false,
                ));
            }
            let mut args = vec![attrs];
            if need_tag_for_runtime {
                args.push(JsNode::string_literal(&tag));
            }
            open.push_exp(create_helper_call(ctx.helper(RuntimeHelper::SsrRenderAttrs), args));
        }
    }

    for prop in el.props.iter() {
        if tag == "input" && is_true_false_value(prop) {
            continue;
        }
        match prop {
            PropNode::Directive(dir) => {
                let name = dir.name.as_str();
                if name == "html" {
                    if let Some(exp) = &dir.exp {
                        raw_children = Some(JsNode::Compound(CompoundExpressionNode::new(
                            vec![
                                CompoundPart::Code("(".into()),
                                compound_part(exp.clone()),
                                CompoundPart::Code(") ?? ''".into()),
                            ],
                            dir.loc.clone(),
                        )));
                    }
                } else if name == "text" {
                    if let Some(exp) = &dir.exp {
                        text_child = Some(exp.clone());
                    }
                } else if name == "slot" {
                    ctx.report(ErrorCode::VSlotMisplaced, &dir.loc);
                } else if tag == "textarea" && name == "bind" && dir.static_arg() == Some("value") {
                    if let (Some(exp), false) = (&dir.exp, need_merge) {
                        text_child = Some(exp.clone());
                    }
                } else if !need_merge && name != "on" {
                    let Some(transform) = ctx.directive_transform(name) else {
                        continue;
                    };
                    if name == "model" {
                        if let Some(part) = dynamic_model_part(el, ctx) {
                            open.push_exp(part);
                        }
                    }
                    let result = transform.apply(dir, el, ctx);
                    for property in result.props {
                        push_attr(&mut open, property, &tag, need_tag_for_runtime, ctx);
                    }
                }
            }
            PropNode::Attribute(attr) => {
                let value = attr.value.as_ref().map(|v| v.content.as_str());
                if tag == "textarea" && attr.name == "value" && value.is_some() {
                    let text = escape_html(value.unwrap_or_default());
                    raw_children = Some(JsNode::Text(TextNode::new(text, attr.loc.clone())));
                } else if !need_merge {
                    if attr.name == "key" || attr.name == "ref" {
                        continue;
                    }
                    if attr.name == "class" {
                        open.static_class = value.map(String::from);
                    }
                    match value {
                        Some(value) => open.push_str(format!(" {}=\"{}\"", attr.name, escape_html(value))),
                        None => open.push_str(format!(" {}", attr.name)),
                    }
                }
            }
        }
    }

    // a bound class absorbs the static one
    if let (Some(i), Some(static_class)) = (open.dynamic_class, open.static_class.take()) {
        merge_call(&mut open.parts[i], JsNode::string_literal(&static_class));
        if let Some(pos) = open.parts.iter().position(is_static_class_part) {
            open.parts.remove(pos);
        }
    }
    if let Some(scope_id) = &ctx.options.scope_id {
        open.push_str(format!(" {}", scope_id));
    }

    if let Some(content) = text_child {
        let loc = content.loc().clone();
        el.children.clear();
        el.children.push(TemplateChildNode::Interpolation(Box::new_in(
            InterpolationNode { content, loc },
            ctx.allocator,
        )));
    }
    el.ssr_raw_children = raw_children;
    el.ssr_codegen_node = Some(JsNode::TemplateLiteral(create_template_literal(open.parts)));
}

/// One rendered prop of a directive transform.
fn push_attr(
    open: &mut OpenTag,
    property: Property,
    tag: &str,
    need_tag_for_runtime: bool,
    ctx: &mut TransformContext<'_>,
) {
    let Property { key, value, .. } = property;
    let Some(name) = key.as_simple().filter(|k| k.is_static).map(|k| k.content.clone()) else {
        let mut args = vec![JsNode::expression(key), value];
        if need_tag_for_runtime {
            args.push(JsNode::string_literal(tag));
        }
        open.push_exp(create_helper_call(ctx.helper(RuntimeHelper::SsrRenderDynamicAttr), args));
        return;
    };

    match name.as_str() {
        "key" | "ref" => {}
        "class" => {
            open.push_str(" class=\"");
            let call = create_helper_call(ctx.helper(RuntimeHelper::SsrRenderClass), vec![value]);
            open.dynamic_class = Some(open.push_exp(call));
            open.push_str("\"");
        }
        "style" => match open.dynamic_style {
            Some(i) => merge_call(&mut open.parts[i], value),
            None => {
                open.push_str(" style=\"");
                let call = create_helper_call(ctx.helper(RuntimeHelper::SsrRenderStyle), vec![value]);
                open.dynamic_style = Some(open.push_exp(call));
                open.push_str("\"");
            }
        },
        _ => {
            // custom elements keep the raw prop name
            let attr_name: String = if tag.find('-').is_some_and(|i| i > 0) {
                name.clone()
            } else {
                PROP_TO_ATTR
                    .get(name.as_str())
                    .map(|a| String::from(*a))
                    .unwrap_or_else(|| name.to_ascii_lowercase().into())
            };
            if is_boolean_attr(&attr_name) {
                let include = create_helper_call(ctx.helper(RuntimeHelper::SsrIncludeBooleanAttr), vec![value]);
                open.push_exp(create_conditional_expression(
                    include,
                    JsNode::string_literal(&format!(" {}", attr_name)),
                    JsNode::string_literal(""),
                    false,
                ));
            } else if is_ssr_safe_attr_name(&attr_name) {
                let call = create_helper_call(
                    ctx.helper(RuntimeHelper::SsrRenderAttr),
                    vec![JsNode::expression(key), value],
                );
                open.push_exp(call);
            } else {
                let loc = key.loc().clone();
                ctx.on_error(create_ssr_error(SsrErrorCode::UnsafeAttrName, &loc));
            }
        }
    }
}

/// Merged props of an element or component in one expression: the props
/// object (or the arguments of its `mergeProps`) followed by the props
/// custom directives provide through `_ssrGetDirectiveProps`.
///
/// Returns `None` when there are neither props nor directives, and whether
/// directives took part.
pub(crate) fn build_ssr_props<'p, 'a>(
    el: &'p ElementNode<'a>,
    ctx: &mut TransformContext<'a>,
    props: &[&'p PropNode<'a>],
    is_component: bool,
    is_dynamic_component: bool,
    ssr: bool,
) -> Option<(JsNode, bool)> {
    let result = build_props(el, ctx, props, is_component, is_dynamic_component, ssr);
    if result.props.is_none() && result.directives.is_empty() {
        return None;
    }
    let mut args = match result.props {
        Some(JsNode::Call(call)) if call.callee == Callee::Helper(RuntimeHelper::MergeProps) => {
            call.arguments
        }
        Some(props) => vec![props],
        None => vec![],
    };
    let has_directives = !result.directives.is_empty();
    for directive in &result.directives {
        let mut dir_args = vec![JsNode::raw("_ctx")];
        dir_args.extend(build_directive_args(directive.dir, directive.runtime, ctx).elements);
        args.push(create_helper_call(ctx.helper(RuntimeHelper::SsrGetDirectiveProps), dir_args));
    }
    let merged = if args.len() > 1 {
        create_helper_call(ctx.helper(RuntimeHelper::MergeProps), args)
    } else {
        args.pop()?
    };
    Some((merged, has_directives))
}

/// Add an argument to a render call, collecting into an array.
fn merge_call(part: &mut TemplateLiteralPart, arg: JsNode) {
    let TemplateLiteralPart::Expr(JsNode::Call(call)) = part else {
        return;
    };
    match call.arguments.first_mut() {
        Some(JsNode::Array(array)) => array.elements.push(arg),
        Some(existing) => {
            let first = std::mem::replace(existing, JsNode::raw(""));
            *existing = tessera_ast::create_array_expression(vec![first, arg], SourceLocation::STUB);
        }
        None => call.arguments.push(arg),
    }
}

fn is_static_class_part(part: &TemplateLiteralPart) -> bool {
    const PREFIX: &str = " class=\"";
    matches!(part, TemplateLiteralPart::Str(s) if s.starts_with(PREFIX) && s.len() > PREFIX.len() && s.ends_with('"'))
}

fn is_true_false_value(prop: &PropNode<'_>) -> bool {
    match prop {
        PropNode::Attribute(attr) => matches!(attr.name.as_str(), "true-value" | "false-value"),
        PropNode::Directive(dir) => {
            dir.name == "bind" && matches!(dir.static_arg(), Some("true-value" | "false-value"))
        }
    }
}

fn compound_part(exp: ExpressionNode) -> CompoundPart {
    match exp {
        ExpressionNode::Simple(s) => CompoundPart::Simple(s),
        ExpressionNode::Compound(c) => CompoundPart::Compound(c),
    }
}

pub(crate) fn next_temp(ctx: &mut TransformContext<'_>) -> std::string::String {
    let temp = format!("_temp{}", ctx.temps);
    ctx.temps += 1;
    temp
}

#[cfg(test)]
mod tests {
    use crate::test_utils::compile_with;
    use tessera_dom::DomCompilerOptions;

    /// Wrapped so the element under test does not receive `_attrs`.
    fn compile(source: &str) -> tessera_dom::CompileOutput {
        crate::test_utils::compile(&format!("<div>{}</div>", source))
    }

    #[test]
    fn test_static_attrs_are_inlined() {
        let out = compile(r#"<span id="a" title="x &amp; y" hidden></span>"#);
        assert!(
            out.code.contains(r#"<span id="a" title="x &amp; y" hidden></span>"#),
            "{}",
            out.code
        );
    }

    #[test]
    fn test_bound_attrs() {
        let out = compile(r#"<img :src="url" :alt="label">"#);
        assert!(
            out.code.contains(r#"<img${_ssrRenderAttr("src", _ctx.url)}${_ssrRenderAttr("alt", _ctx.label)}>"#),
            "{}",
            out.code
        );
    }

    #[test]
    fn test_boolean_attr() {
        let out = compile(r#"<button :disabled="busy"></button>"#);
        assert!(
            out.code.contains(r#"${(_ssrIncludeBooleanAttr(_ctx.busy)) ? " disabled" : ""}"#),
            "{}",
            out.code
        );
    }

    #[test]
    fn test_prop_name_mapping() {
        let out = compile(r#"<label :htmlFor="id"></label>"#);
        assert!(out.code.contains(r#"_ssrRenderAttr("htmlFor", _ctx.id)"#), "{}", out.code);
    }

    #[test]
    fn test_static_and_bound_class_merge() {
        let out = compile(r#"<p class="a" :class="b"></p>"#);
        assert!(
            out.code.contains(r#"<p class="${_ssrRenderClass([_ctx.b, "a"])}"></p>"#),
            "{}",
            out.code
        );
    }

    #[test]
    fn test_v_bind_object_merges() {
        let out = compile(r#"<p v-bind="obj" id="x"></p>"#);
        assert!(
            out.code.contains(r#"<p${_ssrRenderAttrs(_mergeProps(_ctx.obj, { id: "x" }))}></p>"#),
            "{}",
            out.code
        );
    }

    #[test]
    fn test_v_html_and_v_text() {
        let out = compile(r#"<p v-html="raw"></p>"#);
        assert!(out.code.contains("<p>${(_ctx.raw) ?? ''}</p>"), "{}", out.code);
        let out = compile(r#"<p v-text="msg"></p>"#);
        assert!(out.code.contains("<p>${_ssrInterpolate(_ctx.msg)}</p>"), "{}", out.code);
    }

    #[test]
    fn test_textarea_value() {
        let out = compile(r#"<textarea value="a<b"></textarea>"#);
        assert!(out.code.contains("<textarea>a&lt;b</textarea>"), "{}", out.code);
        let out = compile(r#"<textarea :value="v"></textarea>"#);
        assert!(out.code.contains("<textarea>${_ssrInterpolate(_ctx.v)}</textarea>"), "{}", out.code);
    }

    #[test]
    fn test_textarea_with_object_binding() {
        let out = compile(r#"<textarea v-bind="obj">fallback</textarea>"#);
        assert!(out.code.contains("_ssrRenderAttrs(_temp0 = _ctx.obj, \"textarea\")"), "{}", out.code);
        assert!(out.code.contains("let _temp0"), "{}", out.code);
        assert!(
            out.code.contains(r#"_ssrInterpolate(("value" in _temp0) ? _temp0.value : "fallback")"#),
            "{}",
            out.code
        );
    }

    #[test]
    fn test_custom_directive_props() {
        let out = compile(r#"<p v-focus:x.y="v"></p>"#);
        assert!(out.code.contains(r#"_resolveDirective("focus")"#), "{}", out.code);
        assert!(
            out.code.contains("_ssrGetDirectiveProps(_ctx, _directive_focus, _ctx.v, \"x\""),
            "{}",
            out.code
        );
        assert!(out.code.contains("\"textContent\" in _temp0"), "{}", out.code);
    }

    #[test]
    fn test_listeners_are_dropped() {
        let out = compile(r#"<button @click="go">x</button>"#);
        assert!(out.code.contains("<button>x</button>"), "{}", out.code);
    }

    #[test]
    fn test_unsafe_attr_name() {
        let out = compile(r#"<p :a'b="v"></p>"#);
        assert!(out.errors.iter().any(|e| e.code == 65), "{:?}", out.errors);
        assert!(!out.code.contains("a'b"), "{}", out.code);
    }

    #[test]
    fn test_scope_id() {
        let options = DomCompilerOptions {
            mode: tessera_ast::CodegenMode::Module,
            scope_id: Some("data-v-1".into()),
            ..Default::default()
        };
        let out = compile_with("<div><p></p></div>", options);
        assert!(out.code.contains("<p data-v-1></p>"), "{}", out.code);
    }
}
