//! `<Transition>` child checks.

use tessera_arena::Box;
use tessera_ast::{
    AttributeNode, ElementType, IfBranchNode, PropNode, RuntimeHelper, SourceLocation,
    TemplateChildNode,
};
use tessera_core::{ExitFn, NodeCursor, NodeTransform, TransformContext, Walker};

use crate::errors::{create_dom_error, DomErrorCode};
use crate::options::is_built_in_component;

/// Reports a `<Transition>` without exactly one child, and marks the
/// transition `persisted` when its child is toggled with `v-show`.
pub struct TransformTransition;

impl<'a> NodeTransform<'a> for TransformTransition {
    fn enter(
        &self,
        cursor: &mut NodeCursor<'_, 'a>,
        _ctx: &mut TransformContext<'a>,
        _walker: &Walker<'_>,
    ) -> Option<ExitFn<'a>> {
        let el = cursor.node().as_element()?;
        if el.tag_type != ElementType::Component
            || is_built_in_component(&el.tag) != Some(RuntimeHelper::Transition)
        {
            return None;
        }
        Some(std::boxed::Box::new(|node, ctx| {
            let TemplateChildNode::Element(el) = node else {
                return;
            };
            if el.children.is_empty() {
                return;
            }
            el.children.retain(|c| !is_ignorable(c));
            if has_multiple_children(&el.children) {
                let first = el.children.first().map(|c| c.loc().start);
                let last = el.children.last().map(|c| c.loc().end);
                if let (Some(start), Some(end)) = (first, last) {
                    let loc = SourceLocation::new(start, end, "");
                    ctx.on_error(create_dom_error(DomErrorCode::TransitionInvalidChildren, &loc));
                }
            }

            let shown = match el.children.first() {
                Some(TemplateChildNode::Element(child)) => child
                    .props
                    .iter()
                    .filter(|p| matches!(p, PropNode::Directive(d) if d.name == "show"))
                    .count(),
                _ => 0,
            };
            for _ in 0..shown {
                let attr = AttributeNode::new("persisted", el.loc.clone());
                el.props.push(PropNode::Attribute(Box::new_in(attr, ctx.allocator)));
            }
        }))
    }
}

fn is_ignorable(node: &TemplateChildNode<'_>) -> bool {
    match node {
        TemplateChildNode::Comment(_) => true,
        TemplateChildNode::Text(text) => text.content.trim().is_empty(),
        _ => false,
    }
}

fn has_multiple_children(children: &[TemplateChildNode<'_>]) -> bool {
    let meaningful: std::vec::Vec<&TemplateChildNode<'_>> =
        children.iter().filter(|c| !is_ignorable(c)).collect();
    match meaningful.as_slice() {
        [TemplateChildNode::For(_)] => true,
        [TemplateChildNode::If(if_node)] => if_node.branches.iter().any(branch_has_multiple_children),
        [_] => false,
        _ => true,
    }
}

fn branch_has_multiple_children(branch: &IfBranchNode<'_>) -> bool {
    has_multiple_children(&branch.children)
}

#[cfg(test)]
mod tests {
    use crate::test_utils::compile;

    #[test]
    fn test_single_child_is_valid() {
        let output = compile(r#"<Transition><div>a</div></Transition>"#);
        assert!(output.errors.is_empty(), "{:?}", output.errors);
        assert!(output.code.contains("_Transition"), "{}", output.code);
    }

    #[test]
    fn test_multiple_children_are_reported() {
        let output = compile(r#"<transition><div/><span/></transition>"#);
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].code, 62);
    }

    #[test]
    fn test_comments_and_if_chains() {
        let output = compile(r#"<Transition><!-- c --><div v-if="a"/><p v-else/></Transition>"#);
        assert!(output.errors.is_empty(), "{:?}", output.errors);
        let output = compile(r#"<Transition><div v-for="i in list"/></Transition>"#);
        assert_eq!(output.errors[0].code, 62);
    }

    #[test]
    fn test_v_show_child_marks_persisted() {
        let output = compile(r#"<Transition><div v-show="ok"/></Transition>"#);
        assert!(output.code.contains("persisted: \"\""), "{}", output.code);
    }
}
