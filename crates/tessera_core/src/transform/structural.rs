//! Structural directive transforms.
//!
//! `v-if` and `v-for` change the shape of the tree, so they are written
//! against [`StructuralDirectiveTransform`]: the matching directive is taken
//! off the element before the handler runs, which keeps a replaced node
//! from matching the same directive again when it is re-dispatched.

use tessera_arena::Box;
use tessera_ast::{DirectiveNode, ElementType, PropNode, TemplateChildNode};

use super::{ExitFn, NodeCursor, NodeTransform, TransformContext, Walker};

/// Handler invoked with the directive already removed from the element
pub type StructuralHandler = for<'c, 'a> fn(
    &mut NodeCursor<'c, 'a>,
    Box<'a, DirectiveNode<'a>>,
    &mut TransformContext<'a>,
    &Walker<'_>,
) -> Option<ExitFn<'a>>;

/// A node transform driven by directive names
pub struct StructuralDirectiveTransform {
    matches: fn(&str) -> bool,
    handler: StructuralHandler,
}

impl StructuralDirectiveTransform {
    pub const fn new(matches: fn(&str) -> bool, handler: StructuralHandler) -> Self {
        Self { matches, handler }
    }
}

/// Remove and return the first directive whose name matches.
pub fn take_directive<'a>(
    node: &mut TemplateChildNode<'a>,
    matches: impl Fn(&str) -> bool,
) -> Option<Box<'a, DirectiveNode<'a>>> {
    let TemplateChildNode::Element(el) = node else {
        return None;
    };
    // `<template v-slot>` children are owned by the slot transform
    if el.tag_type == ElementType::Template
        && el.props.iter().any(|p| matches!(p, PropNode::Directive(d) if d.name == "slot"))
    {
        return None;
    }
    let index = el
        .props
        .iter()
        .position(|p| matches!(p, PropNode::Directive(d) if matches(&d.name)))?;
    match el.props.remove(index) {
        PropNode::Directive(dir) => Some(dir),
        PropNode::Attribute(_) => None,
    }
}

impl<'a> NodeTransform<'a> for StructuralDirectiveTransform {
    fn enter(
        &self,
        cursor: &mut NodeCursor<'_, 'a>,
        ctx: &mut TransformContext<'a>,
        walker: &Walker<'_>,
    ) -> Option<ExitFn<'a>> {
        let mut exits: std::vec::Vec<ExitFn<'a>> = std::vec::Vec::new();
        while !cursor.is_removed() {
            let Some(dir) = take_directive(cursor.node_mut(), self.matches) else {
                break;
            };
            if let Some(exit) = (self.handler)(cursor, dir, ctx, walker) {
                exits.push(exit);
            }
        }
        match exits.len() {
            0 => None,
            1 => exits.pop(),
            _ => Some(std::boxed::Box::new(move |node, ctx| {
                for exit in exits.into_iter().rev() {
                    exit(node, ctx);
                }
            })),
        }
    }
}
