//! Helpers shared by the transforms and both backends.

use once_cell::sync::Lazy;
use oxc_allocator::Allocator;
use oxc_ast::ast::Expression;
use oxc_parser::Parser;
use oxc_span::SourceType;
use regex::Regex;
use tessera_arena::{FxHashMap, PatchFlags, String};
use tessera_ast::{
    create_call_expression, create_object_expression, ArrayExpression, Callee, CompoundPart,
    DirectiveNode, ElementNode, ElementType, ExpressionNode, JsNode, ObjectExpression, PropNode,
    Property, RuntimeHelper, SourceLocation, TemplateChildNode, VNodeCall,
};

use crate::transform::TransformContext;

// ============================================================================
// VNode calls
// ============================================================================

pub fn vnode_helper(in_ssr: bool, is_component: bool) -> RuntimeHelper {
    if in_ssr || is_component {
        RuntimeHelper::CreateVNode
    } else {
        RuntimeHelper::CreateElementVNode
    }
}

pub fn vnode_block_helper(in_ssr: bool, is_component: bool) -> RuntimeHelper {
    if in_ssr || is_component {
        RuntimeHelper::CreateBlock
    } else {
        RuntimeHelper::CreateElementBlock
    }
}

/// Build a vnode call and register the helpers it prints with.
#[allow(clippy::too_many_arguments)]
pub fn create_vnode_call(
    ctx: &mut TransformContext<'_>,
    tag: JsNode,
    props: Option<JsNode>,
    children: Option<JsNode>,
    patch_flag: Option<PatchFlags>,
    dynamic_props: Option<JsNode>,
    directives: Option<ArrayExpression>,
    is_block: bool,
    disable_tracking: bool,
    is_component: bool,
    loc: SourceLocation,
) -> JsNode {
    let in_ssr = ctx.options.in_ssr;
    if is_block {
        ctx.helper(RuntimeHelper::OpenBlock);
        ctx.helper(vnode_block_helper(in_ssr, is_component));
    } else {
        ctx.helper(vnode_helper(in_ssr, is_component));
    }
    if directives.is_some() {
        ctx.helper(RuntimeHelper::WithDirectives);
    }
    JsNode::VNodeCall(Box::new(VNodeCall {
        tag,
        props,
        children,
        patch_flag,
        dynamic_props,
        directives,
        is_block,
        disable_tracking,
        is_component,
        loc,
    }))
}

/// Turn a plain vnode call into a block, swapping the helpers it uses.
pub fn convert_to_block(call: &mut VNodeCall, ctx: &mut TransformContext<'_>) {
    if call.is_block {
        return;
    }
    let in_ssr = ctx.options.in_ssr;
    call.is_block = true;
    ctx.remove_helper(vnode_helper(in_ssr, call.is_component));
    ctx.helper(RuntimeHelper::OpenBlock);
    ctx.helper(vnode_block_helper(in_ssr, call.is_component));
}

/// The vnode call inside a `withMemo(...)` wrapper, or the node itself.
pub fn memoed_vnode_call_mut(node: &mut JsNode) -> Option<&mut VNodeCall> {
    match node {
        JsNode::VNodeCall(call) => Some(call),
        JsNode::Call(call) if call.callee == Callee::Helper(RuntimeHelper::WithMemo) => {
            match call.arguments.get_mut(1) {
                Some(JsNode::Function(func)) => func.returns.as_mut()?.as_vnode_call_mut(),
                _ => None,
            }
        }
        _ => None,
    }
}

/// IR reference to a child of a container.
///
/// Nodes with an id are printed through their codegen slot; text-like
/// leaves are copied since no later pass rewrites them.
pub fn child_ref(node: &TemplateChildNode<'_>) -> JsNode {
    match node {
        TemplateChildNode::Element(el) => JsNode::Node(el.id),
        TemplateChildNode::If(n) => JsNode::Node(n.id),
        TemplateChildNode::For(n) => JsNode::Node(n.id),
        TemplateChildNode::TextCall(n) => JsNode::Node(n.id),
        TemplateChildNode::Text(t) => JsNode::Text((**t).clone()),
        TemplateChildNode::Comment(c) => JsNode::Comment((**c).clone()),
        TemplateChildNode::Interpolation(i) => JsNode::Interpolation((**i).clone()),
        TemplateChildNode::Compound(c) => JsNode::Compound((**c).clone()),
    }
}

/// A lone root element that can be turned into a block.
pub fn is_single_element_root(child: &TemplateChildNode<'_>) -> bool {
    matches!(child, TemplateChildNode::Element(el) if !el.is_slot_outlet())
}

// ============================================================================
// Props
// ============================================================================

fn is_props_helper(callee: &Callee) -> bool {
    matches!(
        callee,
        Callee::Helper(RuntimeHelper::NormalizeProps | RuntimeHelper::GuardReactiveProps)
    )
}

fn has_prop(obj: &ObjectExpression, prop: &Property) -> bool {
    match prop.static_key() {
        Some(key) => obj.properties.iter().any(|p| p.static_key() == Some(key)),
        None => false,
    }
}

fn merge_with(prop: Property, props: JsNode, ctx: &mut TransformContext<'_>) -> JsNode {
    create_call_expression(
        Callee::Helper(ctx.helper(RuntimeHelper::MergeProps)),
        vec![create_object_expression(vec![prop], SourceLocation::STUB), props],
        SourceLocation::STUB,
    )
}

/// Add a property (usually `key`) to the props of a vnode call or a
/// `renderSlot` call without overriding a user supplied one.
pub fn inject_prop(props: &mut Option<JsNode>, prop: Property, ctx: &mut TransformContext<'_>) {
    match props {
        None => *props = Some(create_object_expression(vec![prop], SourceLocation::STUB)),
        Some(node) => inject_into(node, prop, ctx),
    }
}

fn inject_into(node: &mut JsNode, prop: Property, ctx: &mut TransformContext<'_>) {
    match node {
        JsNode::Call(call) if is_props_helper(&call.callee) => {
            let is_guard = call.callee == Callee::Helper(RuntimeHelper::GuardReactiveProps);
            let plain = !matches!(
                call.arguments.first(),
                Some(JsNode::Call(_) | JsNode::Object(_))
            );
            if is_guard && plain && !call.arguments.is_empty() {
                // a guarded single binding is replaced by the merge
                let exp = call.arguments.remove(0);
                *node = merge_with(prop, exp, ctx);
            } else if let Some(arg) = call.arguments.first_mut() {
                inject_into(arg, prop, ctx);
            }
        }
        JsNode::Call(call) => {
            if let Some(JsNode::Object(first)) = call.arguments.first_mut() {
                if !has_prop(first, &prop) {
                    first.properties.insert(0, prop);
                }
            } else if call.callee == Callee::Helper(RuntimeHelper::ToHandlers) {
                let handlers = std::mem::replace(node, JsNode::Raw(String::default()));
                *node = merge_with(prop, handlers, ctx);
            } else {
                call.arguments
                    .insert(0, create_object_expression(vec![prop], SourceLocation::STUB));
            }
        }
        JsNode::Object(obj) => {
            if !has_prop(obj, &prop) {
                obj.properties.insert(0, prop);
            }
        }
        _ => {
            let exp = std::mem::replace(node, JsNode::Raw(String::default()));
            *node = merge_with(prop, exp, ctx);
        }
    }
}

/// Add a prop to a (possibly memoized) vnode call or a `renderSlot` call.
pub fn inject_codegen_prop(node: &mut JsNode, prop: Property, ctx: &mut TransformContext<'_>) {
    if let Some(call) = memoed_vnode_call_mut(node) {
        inject_prop(&mut call.props, prop, ctx);
        return;
    }
    if let JsNode::Call(call) = node {
        if call.callee != Callee::Helper(RuntimeHelper::RenderSlot) {
            return;
        }
        // renderSlot($slots, name, props?, fallback?)
        if call.arguments.len() > 2 {
            let mut props = Some(std::mem::replace(&mut call.arguments[2], JsNode::raw("{}")));
            inject_prop(&mut props, prop, ctx);
            if let Some(props) = props {
                call.arguments[2] = props;
            }
        } else {
            let mut props = None;
            inject_prop(&mut props, prop, ctx);
            call.arguments.extend(props);
        }
    }
}

// ============================================================================
// Directive and prop lookup
// ============================================================================

/// Find a directive; without `allow_empty` the directive must carry an
/// expression.
pub fn find_dir<'e, 'a>(
    el: &'e ElementNode<'a>,
    name: &str,
    allow_empty: bool,
) -> Option<&'e DirectiveNode<'a>> {
    el.props.iter().find_map(|p| match p {
        PropNode::Directive(dir) if dir.name == name && (allow_empty || dir.exp.is_some()) => {
            Some(&**dir)
        }
        _ => None,
    })
}

/// Find a static attribute or a `v-bind` with a matching static argument.
pub fn find_prop<'e, 'a>(
    el: &'e ElementNode<'a>,
    name: &str,
    dynamic_only: bool,
    allow_empty: bool,
) -> Option<&'e PropNode<'a>> {
    el.props.iter().find(|p| match p {
        PropNode::Attribute(attr) => {
            !dynamic_only && attr.name == name && (attr.value.is_some() || allow_empty)
        }
        PropNode::Directive(dir) => {
            dir.name == "bind"
                && (dir.exp.is_some() || allow_empty)
                && is_static_arg_of(dir.arg.as_ref(), name)
        }
    })
}

pub fn is_static_exp(exp: &ExpressionNode) -> bool {
    exp.is_static()
}

pub fn is_static_arg_of(arg: Option<&ExpressionNode>, name: &str) -> bool {
    matches!(arg, Some(ExpressionNode::Simple(s)) if s.is_static && s.content == name)
}

/// `<template>` that groups children for a structural directive or slot.
pub fn is_template_node(node: &TemplateChildNode<'_>) -> bool {
    matches!(node, TemplateChildNode::Element(el) if el.tag_type == ElementType::Template)
}

pub fn is_slot_outlet(node: &TemplateChildNode<'_>) -> bool {
    matches!(node, TemplateChildNode::Element(el) if el.tag_type == ElementType::Slot)
}

/// Whether a subtree references any of the given scope identifiers.
pub fn has_scope_ref(node: &TemplateChildNode<'_>, ids: &FxHashMap<String, u32>) -> bool {
    if ids.is_empty() {
        return false;
    }
    match node {
        TemplateChildNode::Element(el) => element_has_scope_ref(el, ids),
        TemplateChildNode::For(for_node) => {
            exp_has_scope_ref(&for_node.source, ids)
                || for_node.children.iter().any(|c| has_scope_ref(c, ids))
        }
        TemplateChildNode::If(if_node) => if_node.branches.iter().any(|b| {
            b.condition.as_ref().is_some_and(|c| exp_has_scope_ref(c, ids))
                || b.children.iter().any(|c| has_scope_ref(c, ids))
        }),
        TemplateChildNode::Interpolation(i) => exp_has_scope_ref(&i.content, ids),
        TemplateChildNode::Compound(c) => compound_has_scope_ref(&c.parts, ids),
        TemplateChildNode::TextCall(call) => match &call.content {
            tessera_ast::TextCallContent::Interpolation(i) => exp_has_scope_ref(&i.content, ids),
            tessera_ast::TextCallContent::Compound(c) => compound_has_scope_ref(&c.parts, ids),
            tessera_ast::TextCallContent::Text(_) => false,
        },
        TemplateChildNode::Text(_) | TemplateChildNode::Comment(_) => false,
    }
}

pub fn element_has_scope_ref(el: &ElementNode<'_>, ids: &FxHashMap<String, u32>) -> bool {
    el.props.iter().any(|p| match p {
        PropNode::Directive(dir) => {
            dir.arg.as_ref().is_some_and(|a| exp_has_scope_ref(a, ids))
                || dir.exp.as_ref().is_some_and(|e| exp_has_scope_ref(e, ids))
        }
        PropNode::Attribute(_) => false,
    }) || el.children.iter().any(|c| has_scope_ref(c, ids))
}

pub fn exp_has_scope_ref(exp: &ExpressionNode, ids: &FxHashMap<String, u32>) -> bool {
    match exp {
        ExpressionNode::Simple(s) => {
            !s.is_static
                && tessera_arena::is_simple_identifier(&s.content)
                && ids.contains_key(s.content.as_str())
        }
        ExpressionNode::Compound(c) => compound_has_scope_ref(&c.parts, ids),
    }
}

fn compound_has_scope_ref(parts: &[CompoundPart], ids: &FxHashMap<String, u32>) -> bool {
    parts.iter().any(|part| match part {
        CompoundPart::Simple(s) => {
            !s.is_static
                && tessera_arena::is_simple_identifier(&s.content)
                && ids.contains_key(s.content.as_str())
        }
        CompoundPart::Compound(c) => compound_has_scope_ref(&c.parts, ids),
        CompoundPart::Interpolation(i) => exp_has_scope_ref(&i.content, ids),
        _ => false,
    })
}

// ============================================================================
// Expression shapes
// ============================================================================

static FN_EXP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(async\s*)?(\([^)]*?\)|[\w$]+)\s*(:[^=]+)?=>|^\s*(async\s+)?function(?:\s+[\w$]+)?\s*\(")
        .expect("valid regex")
});

/// Arrow or function expression (`$event => foo`, `function () {}`).
pub fn is_fn_expression(source: &str) -> bool {
    FN_EXP_RE.is_match(source)
}

/// Whether the source is an assignable member access or identifier
/// (`foo`, `foo.bar`, `foo[bar]`).
pub fn is_member_expression(source: &str) -> bool {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(true).with_typescript(true);
    let Ok(expr) = Parser::new(&allocator, source, source_type).parse_expression() else {
        return false;
    };
    is_member_like(&expr)
}

fn is_member_like(expr: &Expression<'_>) -> bool {
    match expr {
        Expression::Identifier(_)
        | Expression::StaticMemberExpression(_)
        | Expression::ComputedMemberExpression(_)
        | Expression::PrivateFieldExpression(_) => true,
        Expression::TSAsExpression(e) => is_member_like(&e.expression),
        Expression::TSNonNullExpression(e) => is_member_like(&e.expression),
        Expression::TSSatisfiesExpression(e) => is_member_like(&e.expression),
        Expression::ParenthesizedExpression(e) => is_member_like(&e.expression),
        _ => false,
    }
}

static NON_IDENT_CHAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]").expect("valid regex"));

/// Local variable name for a resolved asset (`_component_my_button`).
pub fn to_valid_asset_id(name: &str, kind: &str) -> std::string::String {
    let id = NON_IDENT_CHAR_RE.replace_all(name, |caps: &regex::Captures<'_>| {
        let ch = caps[0].chars().next().unwrap_or('_');
        if ch == '-' {
            "_".to_string()
        } else {
            (ch as u32).to_string()
        }
    });
    format!("_{}_{}", kind, id)
}

/// Props access inside an inlined setup render function.
pub fn gen_props_access_exp(name: &str) -> std::string::String {
    if tessera_arena::is_simple_identifier(name) {
        format!("__props.{}", name)
    } else {
        format!("__props[{}]", tessera_arena::to_js_string_literal(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_ast::{create_object_property, create_helper_call, TransformOptions};
    use tessera_arena::Bump;

    fn key_prop() -> Property {
        create_object_property("key", JsNode::raw("0"))
    }

    fn keys(node: &JsNode) -> std::vec::Vec<std::string::String> {
        match node {
            JsNode::Object(obj) => obj
                .properties
                .iter()
                .filter_map(|p| p.static_key().map(|k| k.to_string()))
                .collect(),
            _ => vec![],
        }
    }

    #[test]
    fn test_asset_id() {
        assert_eq!(to_valid_asset_id("my-button", "component"), "_component_my_button");
        assert_eq!(to_valid_asset_id("foo.bar", "component"), "_component_foo46bar");
        assert_eq!(to_valid_asset_id("focus", "directive"), "_directive_focus");
    }

    #[test]
    fn test_fn_expression() {
        assert!(is_fn_expression("$event => foo($event)"));
        assert!(is_fn_expression("(a, b) => a"));
        assert!(is_fn_expression("function () {}"));
        assert!(is_fn_expression("async () => {}"));
        assert!(!is_fn_expression("foo($event)"));
    }

    #[test]
    fn test_member_expression() {
        assert!(is_member_expression("foo"));
        assert!(is_member_expression("foo.bar"));
        assert!(is_member_expression("foo[bar].baz"));
        assert!(is_member_expression("(foo as any).bar"));
        assert!(!is_member_expression("foo()"));
        assert!(!is_member_expression("a + b"));
    }

    #[test]
    fn test_inject_into_object_keeps_user_key() {
        let bump = Bump::new();
        let mut ctx = TransformContext::new(&bump, TransformOptions::default(), 1, vec![]);
        let mut props = Some(create_object_expression(
            vec![create_object_property("key", JsNode::raw("user"))],
            SourceLocation::STUB,
        ));
        inject_prop(&mut props, key_prop(), &mut ctx);
        let props = props.unwrap();
        assert_eq!(keys(&props), vec!["key"]);
    }

    #[test]
    fn test_inject_into_empty_and_spread() {
        let bump = Bump::new();
        let mut ctx = TransformContext::new(&bump, TransformOptions::default(), 1, vec![]);
        let mut empty = None;
        inject_prop(&mut empty, key_prop(), &mut ctx);
        assert_eq!(keys(empty.as_ref().unwrap()), vec!["key"]);

        let mut spread = Some(create_helper_call(
            RuntimeHelper::NormalizeProps,
            vec![create_helper_call(
                RuntimeHelper::GuardReactiveProps,
                vec![JsNode::raw("_ctx.obj")],
            )],
        ));
        inject_prop(&mut spread, key_prop(), &mut ctx);
        match spread.unwrap() {
            JsNode::Call(outer) => {
                assert_eq!(outer.callee, Callee::Helper(RuntimeHelper::NormalizeProps));
                match &outer.arguments[0] {
                    JsNode::Call(merge) => {
                        assert_eq!(merge.callee, Callee::Helper(RuntimeHelper::MergeProps));
                        assert_eq!(merge.arguments.len(), 2);
                    }
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(ctx.helpers.contains(RuntimeHelper::MergeProps));
    }
}
