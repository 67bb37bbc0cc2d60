//! `v-show` on the server: a `display: none` style merged into the
//! element's style.

use tessera_ast::{
    create_conditional_expression, create_object_expression, create_object_property,
    DirectiveNode, ElementNode, JsNode, SourceLocation,
};
use tessera_core::{DirectiveTransformResult, TransformContext};
use tessera_dom::{create_dom_error, DomErrorCode};

pub fn ssr_transform_show<'a>(
    dir: &DirectiveNode<'a>,
    _el: &ElementNode<'a>,
    ctx: &mut TransformContext<'a>,
) -> DirectiveTransformResult {
    let Some(exp) = &dir.exp else {
        ctx.on_error(create_dom_error(DomErrorCode::VShowNoExpression, &dir.loc));
        return DirectiveTransformResult::default();
    };
    let hidden = create_object_expression(
        vec![create_object_property("display", JsNode::string_literal("none"))],
        SourceLocation::STUB,
    );
    DirectiveTransformResult::props(vec![create_object_property(
        "style",
        create_conditional_expression(
            JsNode::expression(exp.clone()),
            JsNode::raw("null"),
            hidden,
            false,
        ),
    )])
}

#[cfg(test)]
mod tests {
    use crate::test_utils::compile;

    #[test]
    fn test_style_from_condition() {
        let out = compile(r#"<div><p v-show="ok"/></div>"#);
        assert!(
            out.code.contains(r#"_ssrRenderStyle((_ctx.ok) ? null : { display: "none" })"#),
            "{}",
            out.code
        );
    }

    #[test]
    fn test_merges_with_static_style() {
        let out = compile(r#"<div><p style="color: red" v-show="ok"/></div>"#);
        assert!(out.code.contains("_ssrRenderStyle([{"), "{}", out.code);
        assert!(out.code.contains(r#"? null : { display: "none" }"#), "{}", out.code);
    }

    #[test]
    fn test_missing_expression() {
        let out = compile(r#"<div v-show/>"#);
        assert_eq!(out.errors[0].code, 61);
    }
}
