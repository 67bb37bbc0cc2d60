//! Removes `<script>` and `<style>` from client templates.

use tessera_ast::{ElementType, TemplateChildNode};
use tessera_core::{ExitFn, NodeCursor, NodeTransform, TransformContext, Walker};

use crate::errors::{create_dom_error, DomErrorCode};

pub struct IgnoreSideEffectTags;

impl<'a> NodeTransform<'a> for IgnoreSideEffectTags {
    fn enter(
        &self,
        cursor: &mut NodeCursor<'_, 'a>,
        ctx: &mut TransformContext<'a>,
        _walker: &Walker<'_>,
    ) -> Option<ExitFn<'a>> {
        let TemplateChildNode::Element(el) = cursor.node() else {
            return None;
        };
        if el.tag_type == ElementType::Element && matches!(el.tag.as_str(), "script" | "style") {
            ctx.on_error(create_dom_error(DomErrorCode::IgnoredSideEffectTag, &el.loc));
            cursor.remove();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::compile;

    #[test]
    fn test_script_and_style_are_removed() {
        let output = compile(r#"<div><script>alert(1)</script><style>.a{}</style><p/></div>"#);
        assert_eq!(output.errors.len(), 2);
        assert!(output.errors.iter().all(|e| e.code == 63));
        assert!(!output.code.contains("alert"), "{}", output.code);
        assert!(!output.code.contains("\"style\""), "{}", output.code);
    }
}
