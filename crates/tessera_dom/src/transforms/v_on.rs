//! v-on with DOM event modifiers.
//!
//! Modifiers are split three ways: event options (`.once`, `.capture`,
//! `.passive`) become a suffix on the handler key, system and mouse
//! modifiers are applied by `withModifiers`, and anything else filters
//! keyboard events through `withKeys`.

use tessera_arena::{capitalize, SmallVec};
use tessera_ast::{
    create_call_expression, CompoundExpressionNode, CompoundPart, DirectiveNode, ElementNode,
    ExpressionNode, JsNode, Property, RuntimeHelper, SimpleExpressionNode, SourceLocation,
};
use tessera_core::transforms::v_on::transform_on_with;
use tessera_core::{DirectiveTransformResult, TransformContext};

use crate::options::event_modifiers::{
    is_event_option_modifier, is_keyboard_event, is_maybe_key_modifier, is_non_key_modifier,
};

#[derive(Debug, Default, PartialEq)]
struct ResolvedModifiers {
    key_modifiers: SmallVec<[std::string::String; 2]>,
    non_key_modifiers: SmallVec<[std::string::String; 2]>,
    event_option_modifiers: SmallVec<[std::string::String; 2]>,
}

fn resolve_modifiers(key: &ExpressionNode, modifiers: &[SimpleExpressionNode]) -> ResolvedModifiers {
    let mut resolved = ResolvedModifiers::default();
    let static_key = static_content(key).map(str::to_ascii_lowercase);
    for modifier in modifiers {
        let modifier = modifier.content.to_string();
        if is_event_option_modifier(&modifier) {
            resolved.event_option_modifiers.push(modifier);
        } else if is_maybe_key_modifier(&modifier) {
            match &static_key {
                Some(key) if is_keyboard_event(key) => resolved.key_modifiers.push(modifier),
                Some(_) => resolved.non_key_modifiers.push(modifier),
                None => {
                    resolved.key_modifiers.push(modifier.clone());
                    resolved.non_key_modifiers.push(modifier);
                }
            }
        } else if is_non_key_modifier(&modifier) {
            resolved.non_key_modifiers.push(modifier);
        } else {
            resolved.key_modifiers.push(modifier);
        }
    }
    resolved
}

fn static_content(exp: &ExpressionNode) -> Option<&str> {
    match exp {
        ExpressionNode::Simple(s) if s.is_static => Some(s.content.as_str()),
        _ => None,
    }
}

fn exp_part(exp: &ExpressionNode) -> CompoundPart {
    match exp {
        ExpressionNode::Simple(s) => CompoundPart::Simple(s.clone()),
        ExpressionNode::Compound(c) => CompoundPart::Compound(c.clone()),
    }
}

/// `click.right` and `click.middle` never fire a click event.
fn transform_click(key: ExpressionNode, event: &str) -> ExpressionNode {
    if static_content(&key).is_some_and(|k| k.eq_ignore_ascii_case("onclick")) {
        let mut name = SimpleExpressionNode::new(event, true, key.loc().clone());
        name.is_handler_key = true;
        return ExpressionNode::Simple(name);
    }
    match &key {
        ExpressionNode::Compound(_) => {
            let loc = key.loc().clone();
            let mut compound = CompoundExpressionNode::new(
                vec![
                    CompoundPart::Code("(".into()),
                    exp_part(&key),
                    CompoundPart::Code(format!(") === \"onClick\" ? \"{}\" : (", event).into()),
                    exp_part(&key),
                    CompoundPart::Code(")".into()),
                ],
                loc,
            );
            compound.is_handler_key = true;
            ExpressionNode::Compound(compound)
        }
        ExpressionNode::Simple(_) => key,
    }
}

fn json_list(items: &[std::string::String]) -> JsNode {
    JsNode::raw(serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string()))
}

pub fn transform_v_on<'a>(
    dir: &DirectiveNode<'a>,
    el: &ElementNode<'a>,
    ctx: &mut TransformContext<'a>,
) -> DirectiveTransformResult {
    transform_on_with(dir, el, ctx, |mut result, ctx| {
        if dir.modifiers.is_empty() || result.props.is_empty() {
            return result;
        }
        let Property {
            mut key,
            value: mut handler,
            loc,
        } = result.props.remove(0);
        let modifiers = resolve_modifiers(&key, &dir.modifiers);

        if modifiers.non_key_modifiers.iter().any(|m| m == "right") {
            key = transform_click(key, "onContextmenu");
        }
        if modifiers.non_key_modifiers.iter().any(|m| m == "middle") {
            key = transform_click(key, "onMouseup");
        }

        if !modifiers.non_key_modifiers.is_empty() {
            let helper = ctx.helper(RuntimeHelper::WithModifiers);
            handler = create_call_expression(
                tessera_ast::Callee::Helper(helper),
                vec![handler, json_list(&modifiers.non_key_modifiers)],
                SourceLocation::STUB,
            );
        }

        let filters_keys = match static_content(&key) {
            Some(name) => is_keyboard_event(&name.to_ascii_lowercase()),
            None => true,
        };
        if !modifiers.key_modifiers.is_empty() && filters_keys {
            let helper = ctx.helper(RuntimeHelper::WithKeys);
            handler = create_call_expression(
                tessera_ast::Callee::Helper(helper),
                vec![handler, json_list(&modifiers.key_modifiers)],
                SourceLocation::STUB,
            );
        }

        if !modifiers.event_option_modifiers.is_empty() {
            let postfix: std::string::String = modifiers
                .event_option_modifiers
                .iter()
                .map(|m| capitalize(m))
                .collect::<std::vec::Vec<_>>()
                .concat();
            key = match key {
                ExpressionNode::Simple(mut s) if s.is_static => {
                    s.content = format!("{}{}", s.content, postfix).into();
                    ExpressionNode::Simple(s)
                }
                other => {
                    let loc = other.loc().clone();
                    let mut compound = CompoundExpressionNode::new(
                        vec![
                            CompoundPart::Code("(".into()),
                            exp_part(&other),
                            CompoundPart::Code(format!(") + \"{}\"", postfix).into()),
                        ],
                        loc,
                    );
                    compound.is_handler_key = true;
                    ExpressionNode::Compound(compound)
                }
            };
        }

        result.props.insert(0, Property { key, value: handler, loc });
        result
    })
}
