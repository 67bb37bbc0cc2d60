//! `v-model` on the server.
//!
//! Form elements render their current state as attributes: `value` for
//! text inputs, `checked` for radios and checkboxes. A `<textarea>` renders
//! the model as its content and `<select>` marks the matching options
//! `selected`; those two rewrite the element's children and are applied by
//! the element transform through [`apply_model_children`].

use tessera_ast::{
    create_conditional_expression, create_helper_call, create_object_property, Callee,
    DirectiveNode, ElementNode, ElementType, ExpressionNode, InterpolationNode, JsNode, PropNode,
    RuntimeHelper, SourceLocation, TemplateChildNode, TemplateLiteralPart,
};
use tessera_core::transforms::v_model::transform_model;
use tessera_core::utils::find_prop;
use tessera_core::{DirectiveTransformResult, TransformContext};
use tessera_dom::{create_dom_error, DomErrorCode};

pub fn ssr_transform_model<'a>(
    dir: &DirectiveNode<'a>,
    el: &ElementNode<'a>,
    ctx: &mut TransformContext<'a>,
) -> DirectiveTransformResult {
    if el.tag_type != ElementType::Element {
        return transform_model(dir, el, ctx);
    }
    let Some(model) = dir.exp.clone().map(JsNode::expression) else {
        return transform_model(dir, el, ctx);
    };
    let value_prop = || vec![create_object_property("value", model.clone())];

    match el.tag.as_str() {
        "input" => match find_prop(el, "type", false, false) {
            Some(PropNode::Directive(_)) => DirectiveTransformResult::default(),
            Some(PropNode::Attribute(attr)) => {
                let ty = attr.value.as_ref().map(|v| v.content.as_str()).unwrap_or_default();
                match ty {
                    "radio" => {
                        let value = value_binding(el);
                        let checked = create_helper_call(
                            ctx.helper(RuntimeHelper::SsrLooseEqual),
                            vec![model, value],
                        );
                        DirectiveTransformResult::props(vec![create_object_property("checked", checked)])
                    }
                    "checkbox" => {
                        let checked = checkbox_checked(el, model, ctx);
                        DirectiveTransformResult::props(vec![create_object_property("checked", checked)])
                    }
                    "file" => {
                        ctx.on_error(create_dom_error(DomErrorCode::VModelOnFileInputElement, &dir.loc));
                        DirectiveTransformResult::default()
                    }
                    _ => {
                        check_duplicated_value(el, ctx);
                        DirectiveTransformResult::props(value_prop())
                    }
                }
            }
            None if has_dynamic_key_v_bind(el) => DirectiveTransformResult::default(),
            None => {
                check_duplicated_value(el, ctx);
                DirectiveTransformResult::props(value_prop())
            }
        },
        "textarea" => {
            check_duplicated_value(el, ctx);
            DirectiveTransformResult::default()
        }
        "select" => DirectiveTransformResult::default(),
        _ => {
            ctx.on_error(create_dom_error(DomErrorCode::VModelOnInvalidElement, &dir.loc));
            DirectiveTransformResult::default()
        }
    }
}

fn checkbox_checked(el: &ElementNode<'_>, model: JsNode, ctx: &mut TransformContext<'_>) -> JsNode {
    if let Some(true_value) = find_prop(el, "true-value", false, false) {
        let true_value = match true_value {
            PropNode::Attribute(attr) => {
                JsNode::string_literal(attr.value.as_ref().map(|v| v.content.as_str()).unwrap_or_default())
            }
            PropNode::Directive(dir) => dir
                .exp
                .clone()
                .map(JsNode::expression)
                .unwrap_or_else(|| JsNode::raw("true")),
        };
        return create_helper_call(ctx.helper(RuntimeHelper::SsrLooseEqual), vec![model, true_value]);
    }
    let value = value_binding(el);
    create_conditional_expression(
        tessera_ast::create_call_expression(
            Callee::Raw("Array.isArray".into()),
            vec![model.clone()],
            SourceLocation::STUB,
        ),
        create_helper_call(ctx.helper(RuntimeHelper::SsrLooseContain), vec![model.clone(), value]),
        model,
        false,
    )
}

/// The `value` an option, radio or checkbox stands for.
fn value_binding(el: &ElementNode<'_>) -> JsNode {
    match find_prop(el, "value", false, false) {
        Some(PropNode::Directive(dir)) => dir
            .exp
            .clone()
            .map(JsNode::expression)
            .unwrap_or_else(|| JsNode::raw("null")),
        Some(PropNode::Attribute(attr)) => {
            JsNode::string_literal(attr.value.as_ref().map(|v| v.content.as_str()).unwrap_or_default())
        }
        None => JsNode::raw("null"),
    }
}

fn check_duplicated_value(el: &ElementNode<'_>, ctx: &mut TransformContext<'_>) {
    if let Some(value) = find_prop(el, "value", false, false) {
        let loc = value.loc().clone();
        ctx.on_error(create_dom_error(DomErrorCode::VModelUnnecessaryValue, &loc));
    }
}

/// `v-bind="obj"` or `:[key]="v"`.
pub fn has_dynamic_key_v_bind(el: &ElementNode<'_>) -> bool {
    el.props.iter().any(|p| match p {
        PropNode::Directive(dir) => {
            dir.name == "bind" && !matches!(&dir.arg, Some(ExpressionNode::Simple(arg)) if arg.is_static)
        }
        PropNode::Attribute(_) => false,
    })
}

/// Children rewrites of `v-model` on `<textarea>` and `<select>`.
///
/// Runs on the element's exit, after the options' open tags were built.
pub fn apply_model_children<'a>(el: &mut ElementNode<'a>, ctx: &mut TransformContext<'a>) {
    let Some(model) = el
        .props
        .iter()
        .find_map(|p| p.as_directive().filter(|d| d.name == "model"))
        .and_then(|d| d.exp.clone())
    else {
        return;
    };
    match el.tag.as_str() {
        "textarea" => {
            let loc = model.loc().clone();
            el.children.clear();
            el.children.push(TemplateChildNode::Interpolation(tessera_arena::Box::new_in(
                InterpolationNode { content: model, loc },
                ctx.allocator,
            )));
        }
        "select" => mark_selected_options(&mut el.children, &JsNode::expression(model), ctx),
        _ => {}
    }
}

fn mark_selected_options(
    children: &mut [TemplateChildNode<'_>],
    model: &JsNode,
    ctx: &mut TransformContext<'_>,
) {
    for child in children.iter_mut() {
        match child {
            TemplateChildNode::Element(el) if el.tag == "option" => {
                if el.find_prop("selected", true).is_some() {
                    continue;
                }
                let value = value_binding(el);
                let selected = selected_part(model, value, ctx);
                if let Some(JsNode::TemplateLiteral(open_tag)) = el.ssr_codegen_node.as_mut() {
                    open_tag.elements.push(TemplateLiteralPart::Expr(selected));
                }
            }
            TemplateChildNode::Element(el) if el.tag == "optgroup" => {
                mark_selected_options(&mut el.children, model, ctx);
            }
            TemplateChildNode::For(for_node) => {
                mark_selected_options(&mut for_node.children, model, ctx);
            }
            TemplateChildNode::If(if_node) => {
                for branch in if_node.branches.iter_mut() {
                    mark_selected_options(&mut branch.children, model, ctx);
                }
            }
            _ => {}
        }
    }
}

/// `_ssrIncludeBooleanAttr(match) ? " selected" : ""`
fn selected_part(model: &JsNode, value: JsNode, ctx: &mut TransformContext<'_>) -> JsNode {
    let matches = create_conditional_expression(
        tessera_ast::create_call_expression(
            Callee::Raw("Array.isArray".into()),
            vec![model.clone()],
            SourceLocation::STUB,
        ),
        create_helper_call(
            ctx.helper(RuntimeHelper::SsrLooseContain),
            vec![model.clone(), value.clone()],
        ),
        create_helper_call(ctx.helper(RuntimeHelper::SsrLooseEqual), vec![model.clone(), value]),
        false,
    );
    create_conditional_expression(
        create_helper_call(ctx.helper(RuntimeHelper::SsrIncludeBooleanAttr), vec![matches]),
        JsNode::string_literal(" selected"),
        JsNode::string_literal(""),
        false,
    )
}

/// `_ssrRenderDynamicModel(type, model, value)` for `<input :type>`.
pub fn dynamic_model_part(el: &ElementNode<'_>, ctx: &mut TransformContext<'_>) -> Option<JsNode> {
    if el.tag != "input" {
        return None;
    }
    let Some(PropNode::Directive(ty)) = find_prop(el, "type", false, false) else {
        return None;
    };
    let ty = ty.exp.clone()?;
    let model = el
        .props
        .iter()
        .find_map(|p| p.as_directive().filter(|d| d.name == "model"))
        .and_then(|d| d.exp.clone())?;
    Some(create_helper_call(
        ctx.helper(RuntimeHelper::SsrRenderDynamicModel),
        vec![JsNode::expression(ty), JsNode::expression(model), value_binding(el)],
    ))
}

#[cfg(test)]
mod tests {
    fn compile(source: &str) -> tessera_dom::CompileOutput {
        crate::test_utils::compile(&format!("<div>{}</div>", source))
    }

    #[test]
    fn test_text_input_value() {
        let out = compile(r#"<input v-model="bar">"#);
        assert!(out.code.contains(r#"<input${_ssrRenderAttr("value", _ctx.bar)}>"#), "{}", out.code);
    }

    #[test]
    fn test_radio_checked() {
        let out = compile(r#"<input type="radio" value="foo" v-model="bar">"#);
        assert!(
            out.code.contains(r#"${(_ssrIncludeBooleanAttr(_ssrLooseEqual(_ctx.bar, "foo"))) ? " checked" : ""}"#),
            "{}",
            out.code
        );
    }

    #[test]
    fn test_checkbox_array_or_boolean() {
        let out = compile(r#"<input type="checkbox" v-model="bar">"#);
        assert!(out.code.contains("_ssrLooseContain(_ctx.bar, null)"), "{}", out.code);
        let out = compile(r#"<input type="checkbox" true-value="yes" v-model="bar">"#);
        assert!(out.code.contains(r#"_ssrLooseEqual(_ctx.bar, "yes")"#), "{}", out.code);
        assert!(!out.code.contains("true-value"), "{}", out.code);
    }

    #[test]
    fn test_textarea_content() {
        let out = compile(r#"<textarea v-model="foo">bar</textarea>"#);
        assert!(out.code.contains("<textarea>${_ssrInterpolate(_ctx.foo)}</textarea>"), "{}", out.code);
    }

    #[test]
    fn test_select_marks_options() {
        let out = compile(r#"<select v-model="model"><option value="1"></option></select>"#);
        assert!(out.code.contains(r#"_ssrLooseEqual(_ctx.model, "1")"#), "{}", out.code);
        assert!(out.code.contains(r#"? " selected" : """#), "{}", out.code);
    }

    #[test]
    fn test_dynamic_type() {
        let out = compile(r#"<input :type="kind" v-model="bar">"#);
        assert!(
            out.code.contains("_ssrRenderDynamicModel(_ctx.kind, _ctx.bar, null)"),
            "{}",
            out.code
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(compile(r#"<span v-model="m"/>"#).errors[0].code, 57);
        assert_eq!(compile(r#"<input type="file" v-model="m"/>"#).errors[0].code, 59);
        assert_eq!(compile(r#"<input v-model="m" :value="v"/>"#).errors[0].code, 60);
    }
}
