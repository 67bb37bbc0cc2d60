//! v-html transform.

use tessera_ast::{create_object_property, DirectiveNode, ElementNode, JsNode, SimpleExpressionNode};
use tessera_core::{DirectiveTransformResult, TransformContext};

use crate::errors::{create_dom_error, DomErrorCode};

pub fn transform_v_html<'a>(
    dir: &DirectiveNode<'a>,
    _el: &ElementNode<'a>,
    ctx: &mut TransformContext<'a>,
) -> DirectiveTransformResult {
    let value = match &dir.exp {
        Some(exp) => JsNode::expression(exp.clone()),
        None => {
            ctx.on_error(create_dom_error(DomErrorCode::VHtmlNoExpression, &dir.loc));
            JsNode::Simple(SimpleExpressionNode::new("", true, dir.loc.clone()))
        }
    };
    DirectiveTransformResult::props(vec![create_object_property("innerHTML", value)])
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{compile, root_props};

    #[test]
    fn test_inner_html_prop() {
        root_props(r#"<div v-html="test"/>"#, |props| {
            assert_eq!(props[0].static_key(), Some("innerHTML"));
        });
        let output = compile(r#"<div v-html="test"/>"#);
        assert!(output.code.contains(r#"{ innerHTML: test }"#), "{}", output.code);
        assert!(output.code.contains(r#"8 /* PROPS */, ["innerHTML"]"#), "{}", output.code);
    }

    #[test]
    fn test_children_are_dropped() {
        let output = compile(r#"<div v-html="test">hello</div>"#);
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].code, 54);
        assert!(!output.code.contains("hello"));
    }

    #[test]
    fn test_missing_expression() {
        let output = compile(r#"<div v-html></div>"#);
        assert_eq!(output.errors[0].code, 53);
    }
}
