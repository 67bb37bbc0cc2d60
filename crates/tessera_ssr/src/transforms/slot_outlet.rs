//! `<slot>` outlets on the server.
//!
//! The outlet becomes `_ssrRenderSlot($slots, name, props, fallback, _push,
//! _parent)`. The fallback argument stays `null` here; the lowering fills in
//! a function pushing the outlet's children when it has any.

use tessera_ast::{
    create_call_expression, create_object_expression, Callee, ElementType, JsNode, RuntimeHelper,
    SourceLocation, TemplateChildNode,
};
use tessera_core::transforms::transform_slot_outlet::{process_slot_outlet, slots_receiver, SlotOutletInfo};
use tessera_core::{ExitFn, NodeCursor, NodeTransform, ParentInfo, TransformContext, Walker};

pub struct SsrTransformSlotOutlet;

/// Index of the fallback argument
pub const FALLBACK_ARG: usize = 3;

impl<'a> NodeTransform<'a> for SsrTransformSlotOutlet {
    fn enter(
        &self,
        cursor: &mut NodeCursor<'_, 'a>,
        ctx: &mut TransformContext<'a>,
        _walker: &Walker<'_>,
    ) -> Option<ExitFn<'a>> {
        if !matches!(cursor.node(), TemplateChildNode::Element(el) if el.tag_type == ElementType::Slot) {
            return None;
        }
        let inner = in_single_child_transition(cursor.siblings(), &ctx.parent);
        let TemplateChildNode::Element(el) = cursor.node_mut() else {
            return None;
        };

        let SlotOutletInfo {
            slot_name,
            slot_props,
        } = process_slot_outlet(el, ctx, true);
        let mut args = vec![
            JsNode::raw(slots_receiver(ctx)),
            slot_name,
            slot_props.unwrap_or_else(|| create_object_expression(vec![], SourceLocation::STUB)),
            JsNode::raw("null"),
            JsNode::raw("_push"),
            JsNode::raw("_parent"),
        ];
        let with_scope = match &ctx.options.scope_id {
            Some(scope_id) if ctx.options.slotted => {
                args.push(JsNode::raw(format!("\"{}-s\"", scope_id)));
                true
            }
            _ => false,
        };

        let mut helper = RuntimeHelper::SsrRenderSlot;
        // the transition needs the slot's single root without fragment anchors
        if inner {
            helper = RuntimeHelper::SsrRenderSlotInner;
            if !with_scope {
                args.push(JsNode::raw("null"));
            }
            args.push(JsNode::raw("true"));
        }
        let callee = Callee::Helper(ctx.helper(helper));
        el.ssr_codegen_node = Some(create_call_expression(callee, args, el.loc.clone()));
        None
    }
}

fn in_single_child_transition(siblings: &[TemplateChildNode<'_>], parent: &ParentInfo) -> bool {
    let ParentInfo::Element {
        tag,
        tag_type: ElementType::Component,
        ..
    } = parent
    else {
        return false;
    };
    matches!(tag.as_str(), "Transition" | "transition")
        && siblings
            .iter()
            .filter(|c| matches!(c, TemplateChildNode::Element(_)))
            .count()
            == 1
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{compile, compile_with};
    use tessera_dom::DomCompilerOptions;

    fn code(source: &str) -> std::string::String {
        compile(source).code
    }

    #[test]
    fn test_default_outlet() {
        let out = code("<div><slot/></div>");
        assert!(
            out.contains(r#"_ssrRenderSlot(_ctx.$slots, "default", {}, null, _push, _parent)"#),
            "{}",
            out
        );
    }

    #[test]
    fn test_named_outlet_with_props() {
        let out = code(r#"<div><slot name="foo" :p="x" /></div>"#);
        assert!(
            out.contains(r#"_ssrRenderSlot(_ctx.$slots, "foo", { p: _ctx.x }, null, _push, _parent)"#),
            "{}",
            out
        );
    }

    #[test]
    fn test_fallback_content() {
        let out = code("<div><slot>fallback</slot></div>");
        assert!(out.contains("{}, () => {"), "{}", out);
        assert!(out.contains("_push(`fallback`)"), "{}", out);
    }

    #[test]
    fn test_scoped_outlet() {
        let options = DomCompilerOptions {
            mode: tessera_ast::CodegenMode::Module,
            scope_id: Some("data-v-7".into()),
            ..Default::default()
        };
        let out = compile_with("<div><slot/></div>", options).code;
        assert!(out.contains(r#"_push, _parent, "data-v-7-s")"#), "{}", out);
    }

    #[test]
    fn test_single_child_of_transition() {
        let out = code("<transition><slot/></transition>");
        assert!(out.contains("_ssrRenderSlotInner("), "{}", out);
        assert!(out.contains("_push, _parent, null, true)"), "{}", out);
    }
}
