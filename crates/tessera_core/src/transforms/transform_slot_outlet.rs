//! `<slot>` outlets.
//!
//! Lowered on exit to `renderSlot($slots, name, props, fallback)`.
//! Trailing arguments are omitted when they carry nothing.

use tessera_arena::camelize;
use tessera_ast::{
    create_call_expression, create_function_expression, Callee, ElementNode, ElementType,
    ErrorCode, JsNode, PropNode, RuntimeHelper, TemplateChildNode,
};

use crate::transform::{ExitFn, NodeCursor, NodeTransform, TransformContext, Walker};
use crate::transforms::transform_element::build_props;
use crate::transforms::v_bind::transform_bind_shorthand;

pub struct TransformSlotOutlet;

impl<'a> NodeTransform<'a> for TransformSlotOutlet {
    fn enter(
        &self,
        cursor: &mut NodeCursor<'_, 'a>,
        _ctx: &mut TransformContext<'a>,
        _walker: &Walker<'_>,
    ) -> Option<ExitFn<'a>> {
        let TemplateChildNode::Element(el) = cursor.node() else {
            return None;
        };
        if el.tag_type != ElementType::Slot {
            return None;
        }
        Some(std::boxed::Box::new(|node, ctx| {
            if let TemplateChildNode::Element(el) = node {
                let codegen = build_render_slot(el, ctx);
                el.codegen_node = Some(codegen);
            }
        }))
    }
}

/// Name and props of a slot outlet
pub struct SlotOutletInfo {
    pub slot_name: JsNode,
    pub slot_props: Option<JsNode>,
}

/// Split the outlet's `name` from the props passed to the slot.
///
/// Prop names are camelized in place so both backends see `fooBar` for
/// `foo-bar`.
pub fn process_slot_outlet<'a>(
    el: &mut ElementNode<'a>,
    ctx: &mut TransformContext<'a>,
    ssr: bool,
) -> SlotOutletInfo {
    let mut slot_name = JsNode::raw("\"default\"");
    let mut name_index = None;

    for (i, prop) in el.props.iter_mut().enumerate() {
        match prop {
            PropNode::Attribute(attr) => {
                if attr.name == "name" {
                    if let Some(value) = &attr.value {
                        slot_name = JsNode::string_literal(&value.content);
                        name_index = Some(i);
                    }
                } else {
                    attr.name = camelize(&attr.name);
                }
            }
            PropNode::Directive(dir) => {
                if dir.name == "bind" && dir.static_arg() == Some("name") {
                    if dir.exp.is_none() {
                        transform_bind_shorthand(dir, ctx);
                    }
                    if let Some(exp) = &dir.exp {
                        slot_name = JsNode::expression(exp.clone());
                        name_index = Some(i);
                    }
                } else if dir.name == "bind" {
                    if let Some(tessera_ast::ExpressionNode::Simple(arg)) = dir.arg.as_mut() {
                        if arg.is_static {
                            arg.content = camelize(&arg.content);
                        }
                    }
                }
            }
        }
    }

    let non_name_props: std::vec::Vec<&PropNode<'a>> = el
        .props
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != name_index)
        .map(|(_, p)| p)
        .collect();
    let mut slot_props = None;
    if !non_name_props.is_empty() {
        let result = build_props(el, ctx, &non_name_props, false, false, ssr);
        slot_props = result.props;
        if let Some(first) = result.directives.first() {
            let loc = first.dir.loc.clone();
            ctx.report(ErrorCode::VSlotUnexpectedDirectiveOnSlotOutlet, &loc);
        }
    }

    SlotOutletInfo {
        slot_name,
        slot_props,
    }
}

/// Receiver of the slot functions in generated code.
pub fn slots_receiver(ctx: &TransformContext<'_>) -> &'static str {
    if ctx.prefix_identifiers() {
        "_ctx.$slots"
    } else {
        "$slots"
    }
}

fn build_render_slot<'a>(el: &mut ElementNode<'a>, ctx: &mut TransformContext<'a>) -> JsNode {
    let SlotOutletInfo {
        slot_name,
        slot_props,
    } = process_slot_outlet(el, ctx, false);

    let mut args = vec![
        JsNode::raw(slots_receiver(ctx)),
        slot_name,
        JsNode::raw("{}"),
        JsNode::raw("undefined"),
        JsNode::raw("true"),
    ];
    let mut expected_len = 2;
    if let Some(props) = slot_props {
        args[2] = props;
        expected_len = 3;
    }
    if !el.children.is_empty() {
        args[3] = JsNode::Function(std::boxed::Box::new(create_function_expression(
            vec![],
            Some(JsNode::Children(el.id)),
            false,
            false,
            el.loc.clone(),
        )));
        expected_len = 4;
    }
    if ctx.options.scope_id.is_some() && !ctx.options.slotted {
        expected_len = 5;
    }
    args.truncate(expected_len);

    let render_slot = ctx.helper(RuntimeHelper::RenderSlot);
    create_call_expression(Callee::Helper(render_slot), args, el.loc.clone())
}
