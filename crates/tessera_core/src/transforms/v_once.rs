//! v-once transform.
//!
//! The node's codegen is wrapped in a cache slot read on every render after
//! the first. Nested `v-once` nodes are left alone since the outer cache
//! already covers them.

use tessera_ast::{JsNode, RuntimeHelper, TemplateChildNode};

use crate::transform::{ExitFn, NodeCursor, NodeTransform, TransformContext, Walker};
use crate::utils::find_dir;

pub struct TransformOnce;

/// The codegen slot of a node that can carry one.
pub(crate) fn codegen_slot_mut<'n>(node: &'n mut TemplateChildNode<'_>) -> Option<&'n mut Option<JsNode>> {
    match node {
        TemplateChildNode::Element(el) => Some(&mut el.codegen_node),
        TemplateChildNode::If(n) => Some(&mut n.codegen_node),
        TemplateChildNode::For(n) => Some(&mut n.codegen_node),
        TemplateChildNode::TextCall(n) => Some(&mut n.codegen_node),
        _ => None,
    }
}

impl<'a> NodeTransform<'a> for TransformOnce {
    fn enter(
        &self,
        cursor: &mut NodeCursor<'_, 'a>,
        ctx: &mut TransformContext<'a>,
        _walker: &Walker<'_>,
    ) -> Option<ExitFn<'a>> {
        let TemplateChildNode::Element(el) = cursor.node() else {
            return None;
        };
        find_dir(el, "once", true)?;
        if ctx.once_seen.contains(&el.id) || ctx.in_v_once || ctx.options.in_ssr {
            return None;
        }
        ctx.once_seen.insert(el.id);
        ctx.in_v_once = true;
        ctx.helper(RuntimeHelper::SetBlockTracking);
        Some(std::boxed::Box::new(|node, ctx| {
            ctx.in_v_once = false;
            if let Some(slot) = codegen_slot_mut(node) {
                if let Some(codegen) = slot.take() {
                    *slot = Some(ctx.cache(codegen, true, true));
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::compile_root;

    #[test]
    fn test_once_element_is_cached() {
        compile_root(r#"<div><span v-once>{{ msg }}</span></div>"#, |root, errors| {
            assert!(errors.is_empty());
            assert!(root.helpers.contains(&RuntimeHelper::SetBlockTracking));
            assert_eq!(root.cached, 1);
            let div = root.children[0].as_element().unwrap();
            let Some(JsNode::Cache(cache)) = div.children[0].codegen_node() else {
                panic!("expected cached codegen");
            };
            assert!(cache.need_pause_tracking);
            assert!(cache.in_v_once);
        });
    }

    #[test]
    fn test_once_with_if_caches_the_conditional() {
        compile_root(r#"<div><p v-if="ok" v-once/></div>"#, |root, _| {
            let div = root.children[0].as_element().unwrap();
            assert!(matches!(div.children[0], TemplateChildNode::If(_)));
            assert!(matches!(div.children[0].codegen_node(), Some(JsNode::Cache(_))));
        });
    }

    #[test]
    fn test_nested_once_uses_one_slot() {
        compile_root(r#"<div v-once><span v-once/></div>"#, |root, _| {
            assert_eq!(root.cached, 1);
        });
    }
}
