//! v-show transform.

use tessera_ast::{DirectiveNode, ElementNode, RuntimeHelper};
use tessera_core::{DirectiveTransformResult, NeedRuntime, TransformContext};

use crate::errors::{create_dom_error, DomErrorCode};

/// Applied at runtime through `vShow`; contributes no props.
pub fn transform_v_show<'a>(
    dir: &DirectiveNode<'a>,
    _el: &ElementNode<'a>,
    ctx: &mut TransformContext<'a>,
) -> DirectiveTransformResult {
    if dir.exp.is_none() {
        ctx.on_error(create_dom_error(DomErrorCode::VShowNoExpression, &dir.loc));
    }
    DirectiveTransformResult {
        props: vec![],
        need_runtime: Some(NeedRuntime::Helper(RuntimeHelper::VShow)),
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::compile;

    #[test]
    fn test_runtime_directive() {
        let output = compile(r#"<div v-show="ok"/>"#);
        assert!(output.errors.is_empty());
        assert!(
            output.code.contains("[_vShow, ok]"),
            "{}",
            output.code
        );
        assert!(output.code.contains("_withDirectives("), "{}", output.code);
    }

    #[test]
    fn test_missing_expression() {
        let output = compile(r#"<div v-show/>"#);
        assert_eq!(output.errors[0].code, 61);
    }
}
