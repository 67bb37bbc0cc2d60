//! Fallthrough `_attrs` and `_cssVars` on root elements.
//!
//! The server render function receives the parent's fallthrough attributes
//! as `_attrs`. They are bound with `v-bind="_attrs"` on the single root
//! element, or on every branch root of a root-level `v-if` chain.

use tessera_arena::Box;
use tessera_ast::{
    DirectiveNode, ElementNode, ElementType, ExpressionNode, PropNode, SimpleExpressionNode,
    SourceLocation, TemplateChildNode,
};
use tessera_core::utils::find_dir;
use tessera_core::{ExitFn, NodeCursor, NodeTransform, ParentInfo, TransformContext, Walker};

pub struct InjectFallthroughAttrs;

impl<'a> NodeTransform<'a> for InjectFallthroughAttrs {
    fn enter(
        &self,
        cursor: &mut NodeCursor<'_, 'a>,
        ctx: &mut TransformContext<'a>,
        _walker: &Walker<'_>,
    ) -> Option<ExitFn<'a>> {
        if ctx.parent != ParentInfo::Root || cursor.index() != 0 {
            return None;
        }
        ctx.add_identifier("_attrs");

        let roots: std::vec::Vec<usize> = cursor
            .siblings()
            .iter()
            .enumerate()
            .filter(|(_, c)| !is_comment_or_blank(c))
            .map(|(i, _)| i)
            .collect();

        if roots.len() == 1 {
            if let TemplateChildNode::Element(el) = cursor.sibling_mut(roots[0]) {
                inject_into_root(el, ctx);
            }
        } else if is_if_chain(cursor.siblings(), &roots) {
            for &i in &roots {
                if let TemplateChildNode::Element(el) = cursor.sibling_mut(i) {
                    inject_into_branch(el, "_attrs", ctx);
                }
            }
        }

        if ctx.options.ssr_css_vars.is_some() {
            ctx.add_identifier("_cssVars");
            for &i in &roots {
                if let TemplateChildNode::Element(el) = cursor.sibling_mut(i) {
                    inject_css_vars(el, ctx);
                }
            }
        }
        None
    }
}

fn is_comment_or_blank(node: &TemplateChildNode<'_>) -> bool {
    matches!(node, TemplateChildNode::Comment(_)) || node.is_whitespace_text()
}

fn is_transition_like(tag: &str) -> bool {
    matches!(tag, "transition" | "Transition" | "KeepAlive" | "keep-alive")
}

/// `v-if` followed only by `v-else-if` / `v-else` siblings.
fn is_if_chain(siblings: &[TemplateChildNode<'_>], roots: &[usize]) -> bool {
    roots.iter().enumerate().all(|(n, &i)| match &siblings[i] {
        TemplateChildNode::Element(el) if n == 0 => el.has_dir("if"),
        TemplateChildNode::Element(el) => el.has_dir("else-if") || el.has_dir("else"),
        _ => false,
    })
}

fn inject_into_root<'a>(el: &mut ElementNode<'a>, ctx: &mut TransformContext<'a>) {
    if el.is_component() && is_transition_like(&el.tag) {
        let mut children = el.children.iter_mut().filter(|c| !is_comment_or_blank(c));
        if let (Some(TemplateChildNode::Element(child)), None) = (children.next(), children.next()) {
            inject(child, "_attrs", ctx);
        }
        return;
    }
    inject_into_branch(el, "_attrs", ctx);
}

/// A `<template v-if>` passes the binding to its single child.
fn inject_into_branch<'a>(el: &mut ElementNode<'a>, name: &str, ctx: &mut TransformContext<'a>) {
    if el.tag_type != ElementType::Template {
        inject(el, name, ctx);
        return;
    }
    let mut children = el.children.iter_mut().filter(|c| !is_comment_or_blank(c));
    if let (Some(TemplateChildNode::Element(child)), None) = (children.next(), children.next()) {
        inject(child, name, ctx);
    }
}

fn inject<'a>(el: &mut ElementNode<'a>, name: &str, ctx: &mut TransformContext<'a>) {
    if !matches!(el.tag_type, ElementType::Element | ElementType::Component) {
        return;
    }
    if find_dir(el, "for", true).is_some() {
        return;
    }
    let mut dir = DirectiveNode::new(ctx.allocator, "bind", SourceLocation::STUB);
    dir.raw_name = "v-bind".into();
    dir.exp = Some(ExpressionNode::Simple(SimpleExpressionNode::new(
        name,
        false,
        SourceLocation::STUB,
    )));
    el.props.push(PropNode::Directive(Box::new_in(dir, ctx.allocator)));
}

/// Every root element carries the css variables, including the roots of
/// conditional templates and `<Suspense>` slots.
fn inject_css_vars<'a>(el: &mut ElementNode<'a>, ctx: &mut TransformContext<'a>) {
    let is_suspense = el.is_component() && matches!(el.tag.as_str(), "Suspense" | "suspense");
    if el.tag_type == ElementType::Template || is_suspense {
        if is_suspense {
            inject(el, "_cssVars", ctx);
        }
        for child in el.children.iter_mut() {
            if let TemplateChildNode::Element(child) = child {
                inject_css_vars(child, ctx);
            }
        }
        return;
    }
    inject(el, "_cssVars", ctx);
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{compile, compile_with};
    use tessera_dom::DomCompilerOptions;

    fn code(source: &str) -> std::string::String {
        compile(source).code
    }

    #[test]
    fn test_single_root_receives_attrs() {
        let out = code("<div>hi</div>");
        assert!(out.contains("<div${_ssrRenderAttrs(_attrs)}>hi</div>"), "{}", out);
    }

    #[test]
    fn test_multiple_roots_do_not() {
        let out = code("<div/><span/>");
        assert!(!out.contains("_ssrRenderAttrs(_attrs)"), "{}", out);
    }

    #[test]
    fn test_if_chain_roots() {
        let out = code(r#"<div v-if="ok"/><span v-else/>"#);
        assert!(out.contains("<div${_ssrRenderAttrs(_attrs)}>"), "{}", out);
        assert!(out.contains("<span${_ssrRenderAttrs(_attrs)}>"), "{}", out);
    }

    #[test]
    fn test_loop_root_is_skipped() {
        let out = code(r#"<div v-for="i in list"/>"#);
        assert!(!out.contains("_ssrRenderAttrs(_attrs)"), "{}", out);
    }

    #[test]
    fn test_css_vars() {
        let options = DomCompilerOptions {
            ssr_css_vars: Some("{ color: color }".into()),
            ..Default::default()
        };
        let out = compile_with("<div/>", options).code;
        assert!(out.contains("const _cssVars = { style: { color: _ctx.color } }"), "{}", out);
        assert!(out.contains("_mergeProps(_attrs, _cssVars)"), "{}", out);
    }
}
