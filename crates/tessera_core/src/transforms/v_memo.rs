//! v-memo transform.
//!
//! Wraps the element's vnode call in `withMemo(deps, () => vnode, _cache, n)`.
//! On a `v-for` element the loop transform handles the memo itself.

use tessera_ast::{
    create_call_expression, create_function_expression, Callee, ElementType, JsNode,
    RuntimeHelper, TemplateChildNode,
};

use crate::transform::{ExitFn, NodeCursor, NodeTransform, TransformContext, Walker};
use crate::utils::{convert_to_block, find_dir};

pub struct TransformMemo;

impl<'a> NodeTransform<'a> for TransformMemo {
    fn enter(
        &self,
        cursor: &mut NodeCursor<'_, 'a>,
        ctx: &mut TransformContext<'a>,
        _walker: &Walker<'_>,
    ) -> Option<ExitFn<'a>> {
        let TemplateChildNode::Element(el) = cursor.node() else {
            return None;
        };
        find_dir(el, "memo", false)?;
        if ctx.memo_seen.contains(&el.id) {
            return None;
        }
        ctx.memo_seen.insert(el.id);
        if el.has_dir("for") {
            return None;
        }
        Some(std::boxed::Box::new(|node, ctx| {
            let TemplateChildNode::Element(el) = node else {
                return;
            };
            let Some(deps) = find_dir(el, "memo", false).and_then(|d| d.exp.clone()) else {
                return;
            };
            let is_component = el.tag_type == ElementType::Component;
            let Some(JsNode::VNodeCall(mut call)) = el.codegen_node.take() else {
                return;
            };
            if !is_component {
                convert_to_block(&mut call, ctx);
            }
            let loc = call.loc.clone();
            let render = create_function_expression(
                vec![],
                Some(JsNode::VNodeCall(call)),
                false,
                false,
                loc.clone(),
            );
            let index = ctx.cached;
            ctx.cached += 1;
            let with_memo = ctx.helper(RuntimeHelper::WithMemo);
            el.codegen_node = Some(create_call_expression(
                Callee::Helper(with_memo),
                vec![
                    JsNode::expression(deps),
                    JsNode::Function(std::boxed::Box::new(render)),
                    JsNode::raw("_cache"),
                    JsNode::raw(index.to_string()),
                ],
                loc,
            ));
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{compile_root, compile_root_with};
    use tessera_ast::TransformOptions;

    #[test]
    fn test_memo_wraps_vnode_call() {
        let options = TransformOptions {
            prefix_identifiers: true,
            ..Default::default()
        };
        compile_root_with(r#"<div><p v-memo="[a]">{{ a }}</p></div>"#, options, |root, errors| {
            assert!(errors.is_empty());
            let div = root.children[0].as_element().unwrap();
            let Some(JsNode::Call(call)) = div.children[0].codegen_node() else {
                panic!("expected withMemo");
            };
            assert_eq!(call.callee, Callee::Helper(RuntimeHelper::WithMemo));
            assert!(matches!(&call.arguments[0], JsNode::Compound(_) | JsNode::Simple(_)));
            let JsNode::Function(render) = &call.arguments[1] else {
                panic!("expected render function");
            };
            assert!(matches!(&render.returns, Some(JsNode::VNodeCall(v)) if v.is_block));
            assert!(matches!(&call.arguments[3], JsNode::Raw(r) if r == "0"));
            assert_eq!(root.cached, 1);
        });
    }

    #[test]
    fn test_memo_on_for_is_left_to_the_loop() {
        compile_root(r#"<div v-for="i in list" :key="i" v-memo="[i]"/>"#, |root, _| {
            let TemplateChildNode::For(for_node) = &root.children[0] else {
                panic!("expected for");
            };
            assert!(matches!(for_node.children[0].codegen_node(), Some(JsNode::VNodeCall(_))));
            assert!(root.helpers.contains(&RuntimeHelper::IsMemoSame));
        });
    }
}
