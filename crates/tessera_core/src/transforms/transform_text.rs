//! Text transform.
//!
//! Merges adjacent text and interpolation children into one compound
//! expression, then lowers text children that sit next to elements into
//! `createTextVNode` calls so they can live in a children array.

use tessera_arena::{Box, PatchFlags, Vec};
use tessera_ast::{
    create_call_expression, Callee, CompoundExpressionNode, CompoundPart, ConstantType,
    ElementType, JsNode, PropNode, RuntimeHelper, TemplateChildNode, TextCallContent,
    TextCallNode,
};

use crate::transform::{Container, ExitFn, NodeCursor, NodeTransform, TransformContext, Walker};
use crate::transforms::hoist_static::text_constant_type;

pub struct TransformText;

fn is_text(node: &TemplateChildNode<'_>) -> bool {
    matches!(node, TemplateChildNode::Text(_) | TemplateChildNode::Interpolation(_))
}

fn compound_part(node: TemplateChildNode<'_>) -> std::vec::Vec<CompoundPart> {
    match node {
        TemplateChildNode::Text(t) => vec![CompoundPart::Text((*t).clone())],
        TemplateChildNode::Interpolation(i) => vec![CompoundPart::Interpolation((*i).clone())],
        TemplateChildNode::Compound(c) => c.parts.clone(),
        _ => vec![],
    }
}

/// Merge each run of adjacent text-like children into a compound node.
/// Returns whether any text-like child exists.
fn merge_adjacent_text<'a>(
    children: &mut Vec<'a, TemplateChildNode<'a>>,
    ctx: &TransformContext<'a>,
) -> bool {
    let mut has_text = false;
    let mut i = 0;
    while i < children.len() {
        if !is_text(&children[i]) {
            i += 1;
            continue;
        }
        has_text = true;
        let mut j = i + 1;
        while j < children.len() && is_text(&children[j]) {
            j += 1;
        }
        if j > i + 1 {
            let loc = children[i].loc().clone();
            let mut parts = std::vec::Vec::new();
            for (n, child) in children.drain(i..j).enumerate() {
                if n > 0 {
                    parts.push(CompoundPart::Code(" + ".into()));
                }
                parts.extend(compound_part(child));
            }
            let compound = CompoundExpressionNode::new(parts, loc);
            children.insert(
                i,
                TemplateChildNode::Compound(Box::new_in(compound, ctx.allocator)),
            );
        }
        i += 1;
    }
    has_text
}

/// A lone text child of the root or of a plain element is passed as the
/// element's text content directly.
fn keeps_inline_text(container: &Container<'_, '_>, ctx: &TransformContext<'_>) -> bool {
    match container {
        Container::Root => true,
        Container::Element {
            tag_type, props, ..
        } => {
            *tag_type == ElementType::Element
                && !props.iter().any(|p| {
                    matches!(p, PropNode::Directive(dir) if ctx.directive_transform(&dir.name).is_none())
                })
        }
        _ => false,
    }
}

impl<'a> NodeTransform<'a> for TransformText {
    fn enter(
        &self,
        _cursor: &mut NodeCursor<'_, 'a>,
        _ctx: &mut TransformContext<'a>,
        _walker: &Walker<'_>,
    ) -> Option<ExitFn<'a>> {
        None
    }

    fn exit_children(
        &self,
        container: Container<'_, 'a>,
        children: &mut Vec<'a, TemplateChildNode<'a>>,
        ctx: &mut TransformContext<'a>,
    ) {
        let has_text = merge_adjacent_text(children, ctx);
        if !has_text || (children.len() == 1 && keeps_inline_text(&container, ctx)) {
            return;
        }

        for i in 0..children.len() {
            if !children[i].is_text_like() {
                continue;
            }
            let const_type = text_constant_type(&children[i]);
            let loc = children[i].loc().clone();
            let content = match &children[i] {
                TemplateChildNode::Text(t) => TextCallContent::Text((**t).clone()),
                TemplateChildNode::Interpolation(n) => TextCallContent::Interpolation((**n).clone()),
                TemplateChildNode::Compound(c) => TextCallContent::Compound((**c).clone()),
                _ => continue,
            };
            let id = ctx.alloc_id();

            let mut args = std::vec::Vec::new();
            match &content {
                // a single space is the runtime default
                TextCallContent::Text(t) if t.content == " " => {}
                TextCallContent::Text(t) => args.push(JsNode::Text(t.clone())),
                TextCallContent::Interpolation(n) => args.push(JsNode::Interpolation(n.clone())),
                TextCallContent::Compound(c) => args.push(JsNode::Compound(c.clone())),
            }
            if !ctx.is_ssr() && const_type == ConstantType::NotConstant {
                args.push(JsNode::raw(PatchFlags::TEXT.to_annotated()));
            }
            let create_text = ctx.helper(RuntimeHelper::CreateText);
            let codegen = create_call_expression(Callee::Helper(create_text), args, loc.clone());
            children[i] = TemplateChildNode::TextCall(Box::new_in(
                TextCallNode {
                    id,
                    content,
                    loc,
                    codegen_node: Some(codegen),
                },
                ctx.allocator,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::compile_root;

    #[test]
    fn test_adjacent_text_is_merged() {
        compile_root(r#"<div>a {{ b }} c</div>"#, |root, _| {
            let el = root.children[0].as_element().unwrap();
            assert_eq!(el.children.len(), 1);
            let TemplateChildNode::Compound(c) = &el.children[0] else {
                panic!("expected compound text");
            };
            assert_eq!(c.parts.len(), 5);
        });
    }

    #[test]
    fn test_text_next_to_element_becomes_text_call() {
        compile_root(r#"<div>{{ msg }}<span/>plain</div>"#, |root, _| {
            let el = root.children[0].as_element().unwrap();
            let TemplateChildNode::TextCall(dynamic) = &el.children[0] else {
                panic!("expected text call");
            };
            let Some(JsNode::Call(call)) = &dynamic.codegen_node else {
                panic!("expected createTextVNode");
            };
            assert_eq!(call.callee, Callee::Helper(RuntimeHelper::CreateText));
            assert!(matches!(&call.arguments[1], JsNode::Raw(r) if r == "1 /* TEXT */"));

            let TemplateChildNode::TextCall(plain) = &el.children[2] else {
                panic!("expected text call");
            };
            let Some(JsNode::Call(call)) = &plain.codegen_node else {
                panic!("expected createTextVNode");
            };
            assert_eq!(call.arguments.len(), 1);
        });
    }

    #[test]
    fn test_single_text_child_of_component_is_lowered() {
        compile_root(r#"<Comp>{{ a }}</Comp>"#, |root, _| {
            let el = root.children[0].as_element().unwrap();
            assert!(matches!(el.children[0], TemplateChildNode::TextCall(_)));
        });
    }

    #[test]
    fn test_custom_directive_forces_text_call() {
        compile_root(r#"<div v-foo>text</div>"#, |root, _| {
            let el = root.children[0].as_element().unwrap();
            assert!(matches!(el.children[0], TemplateChildNode::TextCall(_)));
        });
        compile_root(r#"<div>text</div>"#, |root, _| {
            let el = root.children[0].as_element().unwrap();
            assert!(matches!(el.children[0], TemplateChildNode::Text(_)));
        });
    }
}
