//! v-on transform.
//!
//! Normalizes the event name to a handler key (`onClick`) and wraps inline
//! statements in an arrow function receiving `$event`. With handler
//! caching, handlers that reference nothing from an enclosing scope are
//! stored in the render cache.

use once_cell::sync::Lazy;
use regex::Regex;
use tessera_arena::{camelize, to_handler_key};
use tessera_ast::{
    CompoundExpressionNode, CompoundPart, ConstantType, DirectiveNode, ElementNode, ElementType,
    ErrorCode, ExpressionNode, JsNode, RuntimeHelper, SimpleExpressionNode,
};

use crate::transform::{DirectiveTransformResult, TransformContext};
use crate::transforms::transform_expression::process_expression;
use crate::transforms::v_bind::{property, wrap};
use crate::utils::{exp_has_scope_ref, is_fn_expression, is_member_expression};

static UPPERCASE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]").expect("valid regex"));

pub fn transform_on<'a>(
    dir: &DirectiveNode<'a>,
    el: &ElementNode<'a>,
    ctx: &mut TransformContext<'a>,
) -> DirectiveTransformResult {
    transform_on_with(dir, el, ctx, |result, _| result)
}

/// Event name as a handler key.
fn event_name(
    arg: &ExpressionNode,
    el: &ElementNode<'_>,
    ctx: &mut TransformContext<'_>,
) -> ExpressionNode {
    match arg {
        ExpressionNode::Simple(s) if s.is_static => {
            let mut raw_name = s.content.to_string();
            if raw_name.starts_with("vnode") {
                ctx.report(ErrorCode::VnodeHooks, &s.loc);
            }
            if let Some(rest) = raw_name.strip_prefix("vue:") {
                raw_name = format!("vnode-{}", rest);
            }
            // plain elements keep the case of custom events with uppercase letters
            let key = if el.tag_type != ElementType::Element
                || raw_name.starts_with("vnode")
                || !UPPERCASE_RE.is_match(&raw_name)
            {
                to_handler_key(&camelize(&raw_name)).to_string()
            } else {
                format!("on:{}", raw_name)
            };
            let mut name = SimpleExpressionNode::new(key, true, s.loc.clone());
            name.is_handler_key = true;
            ExpressionNode::Simple(name)
        }
        _ => {
            let to_handler = ctx.helper_string(RuntimeHelper::ToHandlerKey);
            let mut name = arg.clone();
            match &mut name {
                ExpressionNode::Simple(s) => {
                    let mut compound = CompoundExpressionNode::new(
                        vec![
                            CompoundPart::Code(format!("{}(", to_handler).into()),
                            CompoundPart::Simple(s.clone()),
                            CompoundPart::Code(")".into()),
                        ],
                        s.loc.clone(),
                    );
                    compound.is_handler_key = true;
                    return ExpressionNode::Compound(compound);
                }
                ExpressionNode::Compound(c) => {
                    c.is_handler_key = true;
                }
            }
            wrap(&mut name, &format!("{}(", to_handler), ")");
            name
        }
    }
}

/// The `v-on` transform with a platform hook applied to the result before
/// handler caching.
pub fn transform_on_with<'a>(
    dir: &DirectiveNode<'a>,
    el: &ElementNode<'a>,
    ctx: &mut TransformContext<'a>,
    augment: impl FnOnce(DirectiveTransformResult, &mut TransformContext<'a>) -> DirectiveTransformResult,
) -> DirectiveTransformResult {
    if dir.exp.is_none() && dir.modifiers.is_empty() {
        ctx.report(ErrorCode::VOnNoExpression, &dir.loc);
    }
    let Some(arg) = dir.arg.as_ref() else {
        return DirectiveTransformResult::default();
    };
    let name = event_name(arg, el, ctx);

    let mut exp = dir.exp.clone().filter(|_| !dir.exp_is_empty());
    let mut should_cache = ctx.options.cache_handlers && exp.is_none() && !ctx.in_v_once;

    if let Some(ExpressionNode::Simple(source)) = exp.clone() {
        let content = source.content.as_str();
        let is_member = is_member_expression(content);
        let is_inline_statement = !(is_member || is_fn_expression(content));
        let has_multiple_statements = content.contains(';');

        let mut handler = ExpressionNode::Simple(source.clone());
        if ctx.prefix_identifiers() {
            if is_inline_statement {
                ctx.add_identifier("$event");
            }
            handler = process_expression(&source, ctx, false, has_multiple_statements);
            if is_inline_statement {
                ctx.remove_identifier("$event");
            }
            let is_constant =
                matches!(&handler, ExpressionNode::Simple(s) if s.const_type > ConstantType::NotConstant);
            should_cache = ctx.options.cache_handlers
                && !ctx.in_v_once
                && !is_constant
                && !(is_member && el.tag_type == ElementType::Component)
                && !exp_has_scope_ref(&handler, &ctx.identifiers);
            if should_cache && is_member {
                handler = match handler {
                    ExpressionNode::Simple(mut s) => {
                        s.content = format!("{0} && {0}(...args)", s.content).into();
                        ExpressionNode::Simple(s)
                    }
                    ExpressionNode::Compound(mut c) => {
                        let mut parts = c.parts.clone();
                        parts.push(CompoundPart::Code(" && ".into()));
                        parts.extend(c.parts.drain(..));
                        parts.push(CompoundPart::Code("(...args)".into()));
                        c.parts = parts;
                        ExpressionNode::Compound(c)
                    }
                };
            }
        }

        if is_inline_statement || (should_cache && is_member) {
            let params = if is_inline_statement {
                if ctx.options.is_ts { "($event: any)" } else { "$event" }
            } else if ctx.options.is_ts {
                "\n//@ts-ignore\n(...args)"
            } else {
                "(...args)"
            };
            let (open, close) = if has_multiple_statements { ("{", "}") } else { ("(", ")") };
            let loc = handler.loc().clone();
            handler = ExpressionNode::Compound(CompoundExpressionNode::new(
                vec![
                    CompoundPart::Code(format!("{} => {}", params, open).into()),
                    match handler {
                        ExpressionNode::Simple(s) => CompoundPart::Simple(s),
                        ExpressionNode::Compound(c) => CompoundPart::Compound(c),
                    },
                    CompoundPart::Code(close.into()),
                ],
                loc,
            ));
        }
        exp = Some(handler);
    }

    let value = match exp {
        Some(exp) => JsNode::expression(exp),
        None => JsNode::Simple(SimpleExpressionNode::new("() => {}", false, dir.loc.clone())),
    };
    let mut result = augment(DirectiveTransformResult::props(vec![property(name, value)]), ctx);

    if should_cache {
        if let Some(first) = result.props.first_mut() {
            let value = std::mem::replace(&mut first.value, JsNode::raw(""));
            first.value = ctx.cache(value, false, false);
        }
    }
    for prop in result.props.iter_mut() {
        match &mut prop.key {
            ExpressionNode::Simple(s) => s.is_handler_key = true,
            ExpressionNode::Compound(c) => c.is_handler_key = true,
        }
    }
    result
}
