//! v-model transform (component form).
//!
//! Produces the `modelValue` / `onUpdate:modelValue` prop pair plus a
//! `modelModifiers` object on components. The DOM layer wraps this for
//! native form elements.

use tessera_arena::{camelize, is_simple_identifier, to_js_string_literal};
use tessera_ast::{
    BindingType, CompoundExpressionNode, CompoundPart, ConstantType, DirectiveNode, ElementNode,
    ElementType, ErrorCode, ExpressionNode, JsNode, Property, RuntimeHelper,
    SimpleExpressionNode, SourceLocation,
};

use crate::transform::{DirectiveTransformResult, TransformContext};
use crate::transforms::v_bind::property;
use crate::utils::{exp_has_scope_ref, is_member_expression};

fn compound(parts: std::vec::Vec<CompoundPart>, loc: SourceLocation) -> ExpressionNode {
    ExpressionNode::Compound(CompoundExpressionNode::new(parts, loc))
}

fn part(exp: &ExpressionNode) -> CompoundPart {
    match exp {
        ExpressionNode::Simple(s) => CompoundPart::Simple(s.clone()),
        ExpressionNode::Compound(c) => CompoundPart::Compound(c.clone()),
    }
}

fn static_key(key: &str) -> ExpressionNode {
    ExpressionNode::Simple(SimpleExpressionNode::new(key, true, SourceLocation::STUB))
}

pub fn transform_model<'a>(
    dir: &DirectiveNode<'a>,
    el: &ElementNode<'a>,
    ctx: &mut TransformContext<'a>,
) -> DirectiveTransformResult {
    let Some(exp) = dir.exp.as_ref() else {
        ctx.report(ErrorCode::VModelNoExpression, &dir.loc);
        return DirectiveTransformResult::default();
    };

    let raw_exp = exp.loc().source.to_string();
    let exp_string = match exp {
        ExpressionNode::Simple(s) => s.content.to_string(),
        ExpressionNode::Compound(_) => raw_exp.clone(),
    };
    let binding = ctx
        .options
        .binding_metadata
        .as_ref()
        .and_then(|meta| meta.get(&raw_exp));

    if matches!(binding, Some(BindingType::Props | BindingType::PropsAliased)) {
        ctx.report(ErrorCode::VModelOnProps, exp.loc());
        return DirectiveTransformResult::default();
    }

    let maybe_ref = ctx.options.inline
        && matches!(
            binding,
            Some(BindingType::SetupLet | BindingType::SetupRef | BindingType::SetupMaybeRef)
        );
    if exp_string.trim().is_empty() || (!is_member_expression(&exp_string) && !maybe_ref) {
        ctx.report(ErrorCode::VModelMalformedExpression, exp.loc());
        return DirectiveTransformResult::default();
    }

    if ctx.prefix_identifiers()
        && is_simple_identifier(&exp_string)
        && ctx.is_identifier(&exp_string)
    {
        ctx.report(ErrorCode::VModelOnScopeVariable, exp.loc());
        return DirectiveTransformResult::default();
    }

    let prop_name = dir.arg.clone().unwrap_or_else(|| static_key("modelValue"));
    let event_name = match &dir.arg {
        Some(ExpressionNode::Simple(arg)) if arg.is_static => {
            static_key(&format!("onUpdate:{}", camelize(&arg.content)))
        }
        Some(arg) => compound(
            vec![CompoundPart::Code("\"onUpdate:\" + ".into()), part(arg)],
            arg.loc().clone(),
        ),
        None => static_key("onUpdate:modelValue"),
    };

    let event_arg = if ctx.options.is_ts { "($event: any)" } else { "$event" };
    let raw_ref = || {
        CompoundPart::Simple(SimpleExpressionNode::new(raw_exp.as_str(), false, exp.loc().clone()))
    };
    let assignment = if maybe_ref {
        if binding == Some(BindingType::SetupRef) {
            compound(
                vec![
                    CompoundPart::Code(format!("{} => ((", event_arg).into()),
                    raw_ref(),
                    CompoundPart::Code(").value = $event)".into()),
                ],
                exp.loc().clone(),
            )
        } else {
            let alternate = if binding == Some(BindingType::SetupLet) {
                format!("{} = $event", raw_exp)
            } else {
                "null".to_string()
            };
            let is_ref = ctx.helper_string(RuntimeHelper::IsRef);
            compound(
                vec![
                    CompoundPart::Code(
                        format!("{} => ({}({}) ? (", event_arg, is_ref, raw_exp).into(),
                    ),
                    raw_ref(),
                    CompoundPart::Code(format!(").value = $event : {})", alternate).into()),
                ],
                exp.loc().clone(),
            )
        }
    } else {
        compound(
            vec![
                CompoundPart::Code(format!("{} => ((", event_arg).into()),
                part(exp),
                CompoundPart::Code(") = $event)".into()),
            ],
            exp.loc().clone(),
        )
    };

    let mut props: std::vec::Vec<Property> = vec![
        property(prop_name, JsNode::expression(exp.clone())),
        property(event_name, JsNode::expression(assignment)),
    ];

    if ctx.prefix_identifiers()
        && !ctx.in_v_once
        && ctx.options.cache_handlers
        && !exp_has_scope_ref(exp, &ctx.identifiers)
    {
        let handler = std::mem::replace(&mut props[1].value, JsNode::raw(""));
        props[1].value = ctx.cache(handler, false, false);
    }

    if !dir.modifiers.is_empty() && el.tag_type == ElementType::Component {
        let modifiers = dir
            .modifiers
            .iter()
            .map(|m| {
                let key = if is_simple_identifier(&m.content) {
                    m.content.to_string()
                } else {
                    to_js_string_literal(&m.content).to_string()
                };
                format!("{}: true", key)
            })
            .collect::<std::vec::Vec<_>>()
            .join(", ");
        let modifiers_key = match &dir.arg {
            Some(ExpressionNode::Simple(arg)) if arg.is_static => {
                static_key(&format!("{}Modifiers", arg.content))
            }
            Some(arg) => compound(
                vec![part(arg), CompoundPart::Code(" + \"Modifiers\"".into())],
                arg.loc().clone(),
            ),
            None => static_key("modelModifiers"),
        };
        props.push(property(
            modifiers_key,
            JsNode::Simple(
                SimpleExpressionNode::new(format!("{{ {} }}", modifiers), false, dir.loc.clone())
                    .with_const_type(ConstantType::CanHoist),
            ),
        ));
    }

    DirectiveTransformResult::props(props)
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{compile_root, first_element_props};
    use tessera_ast::{JsNode, TransformOptions};

    fn code(node: &JsNode) -> std::string::String {
        match node {
            JsNode::Simple(s) => s.content.to_string(),
            JsNode::Compound(c) => c.to_code(),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_component_model() {
        let options = TransformOptions {
            prefix_identifiers: true,
            ..Default::default()
        };
        first_element_props(r#"<Comp v-model="foo.bar"/>"#, options, |props| {
            assert_eq!(props[0].static_key(), Some("modelValue"));
            assert_eq!(code(&props[0].value), "_ctx.foo.bar");
            assert_eq!(props[1].static_key(), Some("onUpdate:modelValue"));
            assert_eq!(code(&props[1].value), "$event => ((_ctx.foo.bar) = $event)");
        });
    }

    #[test]
    fn test_named_model_with_modifiers() {
        first_element_props(
            r#"<Comp v-model:title.trim="t"/>"#,
            TransformOptions::default(),
            |props| {
                assert_eq!(props[0].static_key(), Some("title"));
                assert_eq!(props[1].static_key(), Some("onUpdate:title"));
                assert_eq!(props[2].static_key(), Some("titleModifiers"));
                assert_eq!(code(&props[2].value), "{ trim: true }");
            },
        );
    }

    #[test]
    fn test_malformed_and_missing() {
        compile_root(r#"<Comp v-model="a + b"/>"#, |_, errors| {
            assert_eq!(errors[0].code, 42);
        });
        compile_root(r#"<Comp v-model/>"#, |_, errors| {
            assert_eq!(errors[0].code, 41);
        });
    }

    #[test]
    fn test_scope_variable() {
        let options = TransformOptions {
            prefix_identifiers: true,
            ..Default::default()
        };
        crate::test_utils::compile_root_with(
            r#"<div v-for="item in list"><Comp v-model="item"/></div>"#,
            options,
            |_, errors| {
                assert_eq!(errors[0].code, 43);
            },
        );
    }
}
