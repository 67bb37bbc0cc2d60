//! Children of elements whose content is set by `v-html` / `v-text`.

use tessera_ast::{PropNode, TemplateChildNode};
use tessera_core::{ExitFn, NodeCursor, NodeTransform, TransformContext, Walker};

use crate::errors::{create_dom_error, DomErrorCode};

/// Drops the children of an element carrying `v-html` or `v-text`.
///
/// Runs on exit ahead of the element transform so the lowered call never
/// sees the overridden children.
pub struct DropOverriddenChildren;

impl<'a> NodeTransform<'a> for DropOverriddenChildren {
    fn enter(
        &self,
        cursor: &mut NodeCursor<'_, 'a>,
        _ctx: &mut TransformContext<'a>,
        _walker: &Walker<'_>,
    ) -> Option<ExitFn<'a>> {
        let el = cursor.node().as_element()?;
        let code = el.props.iter().find_map(|p| match p {
            PropNode::Directive(dir) if dir.name == "html" => {
                Some((DomErrorCode::VHtmlWithChildren, dir.loc.clone()))
            }
            PropNode::Directive(dir) if dir.name == "text" => {
                Some((DomErrorCode::VTextWithChildren, dir.loc.clone()))
            }
            _ => None,
        })?;
        Some(std::boxed::Box::new(move |node, ctx| {
            if let TemplateChildNode::Element(el) = node {
                if !el.children.is_empty() {
                    ctx.on_error(create_dom_error(code.0, &code.1));
                    el.children.clear();
                }
            }
        }))
    }
}
