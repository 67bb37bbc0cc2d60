//! v-bind transform.
//!
//! Only bindings with an argument reach this transform; argument-less
//! object spreads are merged by the element transform.

use tessera_arena::camelize;
use tessera_ast::{
    CompoundPart, DirectiveNode, ElementNode, ErrorCode, ExpressionNode, JsNode, Property,
    RuntimeHelper, SimpleExpressionNode,
};

use crate::transform::{DirectiveTransformResult, TransformContext};
use crate::transforms::transform_expression::process_expression;

/// Expand `:foo` to `:foo="foo"`.
pub fn transform_bind_shorthand(dir: &mut DirectiveNode<'_>, ctx: &mut TransformContext<'_>) {
    let Some(ExpressionNode::Simple(arg)) = &dir.arg else {
        return;
    };
    let exp = SimpleExpressionNode::new(camelize(&arg.content), false, arg.loc.clone());
    dir.exp = Some(process_expression(&exp, ctx, false, false));
}

pub(crate) fn wrap(exp: &mut ExpressionNode, before: &str, after: &str) {
    match exp {
        ExpressionNode::Simple(s) => {
            s.content = [before, s.content.as_str(), after].concat().into();
        }
        ExpressionNode::Compound(c) => {
            c.parts.insert(0, CompoundPart::Code(before.into()));
            c.parts.push(CompoundPart::Code(after.into()));
        }
    }
}

fn inject_prefix(arg: &mut ExpressionNode, prefix: &str) {
    match arg {
        ExpressionNode::Simple(s) if s.is_static => {
            s.content = [prefix, s.content.as_str()].concat().into();
        }
        ExpressionNode::Simple(s) => {
            s.content = format!("`{}${{{}}}`", prefix, s.content).into();
        }
        ExpressionNode::Compound(_) => wrap(arg, &format!("'{}' + (", prefix), ")"),
    }
}

pub fn transform_bind<'a>(
    dir: &DirectiveNode<'a>,
    _el: &ElementNode<'a>,
    ctx: &mut TransformContext<'a>,
) -> DirectiveTransformResult {
    let Some(mut arg) = dir.arg.clone() else {
        return DirectiveTransformResult::default();
    };
    let empty = || JsNode::Simple(SimpleExpressionNode::new("", true, dir.loc.clone()));

    let exp = match dir.exp.clone().filter(|_| !dir.exp_is_empty()) {
        Some(exp) => exp,
        None => {
            let ExpressionNode::Simple(name) = &arg else {
                ctx.report(ErrorCode::VBindInvalidSameNameArgument, arg.loc());
                return DirectiveTransformResult::props(vec![property(arg, empty())]);
            };
            if !name.is_static {
                let loc = name.loc.clone();
                ctx.report(ErrorCode::VBindInvalidSameNameArgument, &loc);
                return DirectiveTransformResult::props(vec![property(arg, empty())]);
            }
            let shorthand = SimpleExpressionNode::new(camelize(&name.content), false, name.loc.clone());
            process_expression(&shorthand, ctx, false, false)
        }
    };

    match &mut arg {
        ExpressionNode::Compound(_) => wrap(&mut arg, "(", ") || \"\""),
        ExpressionNode::Simple(s) if !s.is_static => {
            s.content = format!("{} || \"\"", s.content).into();
        }
        _ => {}
    }

    if dir.has_modifier("camel") {
        match &mut arg {
            ExpressionNode::Simple(s) if s.is_static => s.content = camelize(&s.content),
            _ => {
                let camelize_fn = ctx.helper_string(RuntimeHelper::Camelize);
                wrap(&mut arg, &format!("{}(", camelize_fn), ")");
            }
        }
    }

    if !ctx.options.in_ssr {
        if dir.has_modifier("prop") {
            inject_prefix(&mut arg, ".");
        }
        if dir.has_modifier("attr") {
            inject_prefix(&mut arg, "^");
        }
    }

    DirectiveTransformResult::props(vec![property(arg, JsNode::expression(exp))])
}

pub(crate) fn property(key: ExpressionNode, value: JsNode) -> Property {
    let loc = key.loc().clone();
    Property { key, value, loc }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::first_element_props;
    use tessera_ast::TransformOptions;

    #[test]
    fn test_static_arg() {
        first_element_props(r#"<div :id="foo"/>"#, TransformOptions::default(), |props| {
            assert_eq!(props[0].static_key(), Some("id"));
            assert_eq!(code(&props[0].value), "foo");
        });
    }

    #[test]
    fn test_dynamic_arg_falls_back_to_empty_string() {
        // the dynamic key makes the element wrap its props in `normalizeProps`
        first_element_props(r#"<div v-bind:[name]="foo"/>"#, TransformOptions::default(), |props| {
            assert_eq!(props[0].key.to_code(), "name || \"\"");
        });
    }

    #[test]
    fn test_camel_and_prop_modifiers() {
        first_element_props(
            r#"<div :foo-bar.camel="x" :inner-text.prop="y"/>"#,
            TransformOptions::default(),
            |props| {
                assert_eq!(props[0].static_key(), Some("fooBar"));
                assert_eq!(props[1].static_key(), Some(".inner-text"));
            },
        );
    }

    #[test]
    fn test_same_name_shorthand() {
        let options = TransformOptions {
            prefix_identifiers: true,
            ..Default::default()
        };
        first_element_props(r#"<div :msg-id/>"#, options, |props| {
            assert_eq!(props[0].static_key(), Some("msg-id"));
            assert_eq!(code(&props[0].value), "_ctx.msgId");
        });
    }

    fn code(node: &JsNode) -> std::string::String {
        match node {
            JsNode::Simple(s) => s.content.to_string(),
            JsNode::Compound(c) => c.to_code(),
            other => panic!("unexpected {:?}", other),
        }
    }
}
