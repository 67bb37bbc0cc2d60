//! v-text transform.

use tessera_ast::{
    create_call_expression, create_object_property, Callee, ConstantType, DirectiveNode,
    ElementNode, JsNode, RuntimeHelper, SimpleExpressionNode,
};
use tessera_core::{DirectiveTransformResult, TransformContext};

use crate::errors::{create_dom_error, DomErrorCode};

pub fn transform_v_text<'a>(
    dir: &DirectiveNode<'a>,
    _el: &ElementNode<'a>,
    ctx: &mut TransformContext<'a>,
) -> DirectiveTransformResult {
    let value = match &dir.exp {
        Some(exp) if exp.const_type() > ConstantType::NotConstant => {
            JsNode::expression(exp.clone())
        }
        Some(exp) => {
            let helper = ctx.helper(RuntimeHelper::ToDisplayString);
            create_call_expression(
                Callee::Helper(helper),
                vec![JsNode::expression(exp.clone())],
                dir.loc.clone(),
            )
        }
        None => {
            ctx.on_error(create_dom_error(DomErrorCode::VTextNoExpression, &dir.loc));
            JsNode::Simple(SimpleExpressionNode::new("", true, dir.loc.clone()))
        }
    };
    DirectiveTransformResult::props(vec![create_object_property("textContent", value)])
}

#[cfg(test)]
mod tests {
    use crate::test_utils::compile;

    #[test]
    fn test_text_content_prop() {
        let output = compile(r#"<div v-text="msg"/>"#);
        // a call value puts the props object on its own lines
        assert!(output.code.contains("{\n"), "{}", output.code);
        let flat = output.code.split_whitespace().collect::<std::vec::Vec<_>>().join(" ");
        assert!(
            flat.contains("{ textContent: _toDisplayString(msg) }"),
            "{}",
            output.code
        );
        assert!(output.code.contains(r#"["textContent"]"#), "{}", output.code);
    }

    #[test]
    fn test_children_are_dropped() {
        let output = compile(r#"<div v-text="msg">hello</div>"#);
        assert_eq!(output.errors[0].code, 56);
        assert!(!output.code.contains("hello"));
    }

    #[test]
    fn test_missing_expression() {
        let output = compile(r#"<div v-text></div>"#);
        assert_eq!(output.errors[0].code, 55);
    }
}
