//! Components on the server.
//!
//! A component renders through `_ssrRenderComponent(comp, props, slots,
//! _parent)`. Each slot function gets two bodies:
//!
//! ```js
//! default: _withCtx((_, _push, _parent, _scopeId) => {
//!   if (_push) {
//!     // optimized string pushes
//!   } else {
//!     return [/* vnodes */]
//!   }
//! })
//! ```
//!
//! The vnode branch is for child components that render through a render
//! function. It is built from a copy of the component taken before its
//! children were transformed; the copy's slot content goes through the
//! client preset and is kept in the context's detached trees. The string
//! branch is filled in by the statement lowering.
//!
//! `<Suspense>` and `<TransitionGroup>` get their own lowering; the other
//! built-ins render their children in place.

use once_cell::sync::Lazy;
use tessera_arena::{Box, CloneIn, Vec};
use tessera_ast::{
    create_block_statement, create_function_expression, create_helper_call, create_if_statement,
    create_template_literal, Callee, ElementNode, ElementType, ExpressionNode, ForParseResult,
    IfAlternate, JsNode, NodeId, PropNode, ReturnStatement, RuntimeHelper, SourceLocation,
    TemplateChildNode, TemplateLiteralPart,
};
use tessera_core::transforms::transform_element::resolve_component_type;
use tessera_core::transforms::transform_expression::process_expression;
use tessera_core::transforms::v_for::{finalize_for_parse_result, parse_for_expression};
use tessera_core::transforms::v_slot::{build_slots, SlotSource};
use tessera_core::{
    Container, ExitFn, NodeCursor, NodeTransform, ParentInfo, TransformContext, TransformPreset,
    Walker,
};
use tessera_dom::{dom_directive_transforms, dom_preset};

use crate::transforms::element::build_ssr_props;

/// Client preset the vnode slot branches are transformed with
static VNODE_PRESET: Lazy<TransformPreset> = Lazy::new(dom_preset);

pub struct SsrTransformComponent;

impl<'a> NodeTransform<'a> for SsrTransformComponent {
    fn enter(
        &self,
        cursor: &mut NodeCursor<'_, 'a>,
        ctx: &mut TransformContext<'a>,
        _walker: &Walker<'_>,
    ) -> Option<ExitFn<'a>> {
        let TemplateChildNode::Element(el) = cursor.node() else {
            return None;
        };
        if el.tag_type != ElementType::Component {
            return None;
        }
        match resolve_component_type(el, ctx, true) {
            JsNode::Helper(RuntimeHelper::Suspense) => Some(std::boxed::Box::new(|node, ctx| {
                if let TemplateChildNode::Element(el) = node {
                    build_suspense(el, ctx);
                }
            })),
            JsNode::Helper(RuntimeHelper::TransitionGroup) => Some(std::boxed::Box::new(|node, ctx| {
                if let TemplateChildNode::Element(el) = node {
                    build_transition_group(el, ctx);
                }
            })),
            JsNode::Helper(_) => None,
            component => {
                let mut clone = (**el).clone_in(ctx.allocator);
                clone.id = ctx.alloc_id();
                renumber(&mut clone.children, ctx);
                Some(std::boxed::Box::new(move |node, ctx| {
                    if let TemplateChildNode::Element(el) = node {
                        build_component(el, component, clone, ctx);
                    }
                }))
            }
        }
    }
}

/// Built-in component a tag names, if any.
pub fn built_in_component(tag: &str) -> Option<RuntimeHelper> {
    RuntimeHelper::from_builtin_component(tag).or_else(|| tessera_dom::is_built_in_component(tag))
}

/// Give a copied subtree fresh ids so it can live next to the original.
fn renumber<'a>(children: &mut [TemplateChildNode<'a>], ctx: &mut TransformContext<'a>) {
    for child in children.iter_mut() {
        match child {
            TemplateChildNode::Element(el) => {
                el.id = ctx.alloc_id();
                renumber(&mut el.children, ctx);
            }
            TemplateChildNode::If(if_node) => {
                if_node.id = ctx.alloc_id();
                for branch in if_node.branches.iter_mut() {
                    branch.id = ctx.alloc_id();
                    renumber(&mut branch.children, ctx);
                }
            }
            TemplateChildNode::For(for_node) => {
                for_node.id = ctx.alloc_id();
                renumber(&mut for_node.children, ctx);
            }
            TemplateChildNode::TextCall(call) => call.id = ctx.alloc_id(),
            _ => {}
        }
    }
}

fn build_component<'a>(
    el: &mut ElementNode<'a>,
    component: JsNode,
    mut clone: ElementNode<'a>,
    ctx: &mut TransformContext<'a>,
) {
    let is_dynamic = matches!(
        &component,
        JsNode::Call(call) if call.callee == Callee::Helper(RuntimeHelper::ResolveDynamicComponent)
    );
    let vnode_branches = if clone.children.is_empty() {
        std::vec::Vec::new()
    } else {
        build_vnode_branches(&mut clone, ctx)
    };

    // listeners stay props on components
    let props = if el.props.is_empty() {
        None
    } else {
        let all: std::vec::Vec<&PropNode<'a>> = el.props.iter().collect();
        build_ssr_props(el, ctx, &all, true, is_dynamic, false).map(|(props, _)| props)
    }
    .unwrap_or_else(|| JsNode::raw("null"));

    let slots = if el.children.is_empty() {
        JsNode::raw("null")
    } else {
        let mut branches = vnode_branches.into_iter();
        build_slots(el, ctx, |source, _ctx| ssr_slot_fn(source, branches.next())).0
    };

    el.ssr_codegen_node = Some(if is_dynamic {
        let vnode = create_helper_call(ctx.helper(RuntimeHelper::CreateVNode), vec![component, props, slots]);
        create_helper_call(
            ctx.helper(RuntimeHelper::SsrRenderVNode),
            vec![JsNode::raw("_push"), vnode, JsNode::raw("_parent")],
        )
    } else {
        create_helper_call(
            ctx.helper(RuntimeHelper::SsrRenderComponent),
            vec![component, props, slots, JsNode::raw("_parent")],
        )
    });
}

/// `if (_push) { <content> } else { return <vnode branch> }`
///
/// The consequent holds a `Children` placeholder for the lowering.
fn ssr_slot_fn(source: SlotSource<'_, '_>, vnode_branch: Option<NodeId>) -> JsNode {
    let param = source
        .props
        .map(|props| JsNode::expression(props.clone()))
        .unwrap_or_else(|| JsNode::raw("_"));
    let mut func = create_function_expression(
        vec![param, JsNode::raw("_push"), JsNode::raw("_parent"), JsNode::raw("_scopeId")],
        None,
        true,
        true,
        source.loc,
    );
    let alternate = vnode_branch.map(|id| {
        IfAlternate::Return(std::boxed::Box::new(ReturnStatement {
            returns: JsNode::Children(id),
            loc: SourceLocation::STUB,
        }))
    });
    func.body = Some(JsNode::If(std::boxed::Box::new(create_if_statement(
        JsNode::raw("_push"),
        create_block_statement(vec![JsNode::Children(source.container)]),
        alternate,
    ))));
    JsNode::Function(std::boxed::Box::new(func))
}

/// Slot content recorded from the copy
struct BranchSource {
    props: Option<ExpressionNode>,
    for_result: Option<ForParseResult>,
    container: NodeId,
    loc: SourceLocation,
}

/// Client renderings of every slot of the copy, in slot order. Returns the
/// ids of the detached wrappers holding them.
fn build_vnode_branches<'a>(clone: &mut ElementNode<'a>, ctx: &mut TransformContext<'a>) -> std::vec::Vec<NodeId> {
    // the string slots object reports problems and registers helpers
    let helpers = ctx.helpers.clone();
    let error_count = ctx.diagnostics.errors.len();
    let mut sources = std::vec::Vec::new();
    build_slots(clone, ctx, |source, _ctx| {
        let for_result = source.v_for.and_then(|dir| {
            dir.for_parse_result.clone().or_else(|| match &dir.exp {
                Some(ExpressionNode::Simple(exp)) => parse_for_expression(exp),
                _ => None,
            })
        });
        sources.push(BranchSource {
            props: source.props.cloned(),
            for_result,
            container: source.container,
            loc: source.loc,
        });
        JsNode::raw("null")
    });
    ctx.helpers = helpers;
    ctx.diagnostics.errors.truncate(error_count);

    sources
        .into_iter()
        .map(|source| build_vnode_branch(clone, source, ctx))
        .collect()
}

fn build_vnode_branch<'a>(
    clone: &mut ElementNode<'a>,
    source: BranchSource,
    ctx: &mut TransformContext<'a>,
) -> NodeId {
    let id = ctx.alloc_id();
    let mut wrapper = ElementNode::new(ctx.allocator, id, "template", source.loc);
    wrapper.tag_type = ElementType::Template;
    wrapper.children = take_container_children(clone, source.container, ctx);

    let prefix = ctx.prefix_identifiers();
    // slot props of the copy are still raw text; bind the names they declare
    let props = source.props.map(|props| match props {
        ExpressionNode::Simple(raw) if prefix && raw.identifiers.is_none() => {
            process_expression(&raw, ctx, true, false)
        }
        processed => processed,
    });
    let mut scope: std::vec::Vec<ExpressionNode> = props.into_iter().collect();
    if let Some(mut result) = source.for_result {
        finalize_for_parse_result(&mut result, ctx);
        scope.extend([result.value, result.key, result.index].into_iter().flatten());
    }
    if prefix {
        for exp in &scope {
            ctx.add_identifiers(exp);
        }
    }
    ctx.scopes.v_slot += 1;
    let ssr = std::mem::replace(&mut ctx.options.ssr, false);
    let saved = ctx.swap_directive_transforms(dom_directive_transforms());

    let walker = Walker::new(&VNODE_PRESET);
    let parent = ParentInfo::Element {
        id,
        tag: wrapper.tag.clone(),
        tag_type: ElementType::Template,
    };
    let container = Container::Element {
        id,
        tag_type: ElementType::Template,
        props: &wrapper.props,
    };
    walker.traverse_children(&mut wrapper.children, container, parent, ctx);

    ctx.swap_directive_transforms(saved);
    ctx.options.ssr = ssr;
    ctx.scopes.v_slot -= 1;
    if prefix {
        for exp in &scope {
            ctx.remove_identifiers(exp);
        }
    }
    ctx.detached.push(TemplateChildNode::Element(Box::new_in(wrapper, ctx.allocator)));
    id
}

/// Move out the children of the copy itself or of one of its slot
/// templates.
fn take_container_children<'a>(
    clone: &mut ElementNode<'a>,
    container: NodeId,
    ctx: &TransformContext<'a>,
) -> Vec<'a, TemplateChildNode<'a>> {
    let empty = Vec::new_in(ctx.allocator);
    if clone.id == container {
        return std::mem::replace(&mut clone.children, empty);
    }
    clone
        .children
        .iter_mut()
        .find_map(|c| match c {
            TemplateChildNode::Element(el) if el.id == container => Some(el),
            _ => None,
        })
        .map(|el| std::mem::replace(&mut el.children, Vec::new_in(ctx.allocator)))
        .unwrap_or(empty)
}

/// `_ssrRenderSuspense(_push, slots)`; the slot bodies are placeholders
/// the lowering fills.
fn build_suspense<'a>(el: &mut ElementNode<'a>, ctx: &mut TransformContext<'a>) {
    let (slots, _) = build_slots(el, ctx, |source, _ctx| {
        let mut func = create_function_expression(vec![], None, true, false, source.loc);
        func.body = Some(JsNode::Block(create_block_statement(vec![JsNode::Children(
            source.container,
        )])));
        JsNode::Function(std::boxed::Box::new(func))
    });
    let helper = ctx.helper(RuntimeHelper::SsrRenderSuspense);
    el.ssr_codegen_node = Some(create_helper_call(helper, vec![JsNode::raw("_push"), slots]));
}

/// A `<TransitionGroup>` with a `tag` renders that element around its
/// children. Stored as `[open tag, close tag]`; without a tag nothing is
/// stored and the children render as a fragment.
fn build_transition_group<'a>(el: &mut ElementNode<'a>, ctx: &mut TransformContext<'a>) {
    let Some(tag_index) = el.find_prop_index("tag", true) else {
        return;
    };
    let tag: TemplateLiteralPart = match &el.props[tag_index] {
        PropNode::Attribute(attr) => {
            TemplateLiteralPart::Str(attr.value.as_ref().map(|v| v.content.clone()).unwrap_or_default())
        }
        PropNode::Directive(dir) => match &dir.exp {
            Some(exp) => TemplateLiteralPart::Expr(JsNode::expression(exp.clone())),
            None => return,
        },
    };

    let mut open = vec![TemplateLiteralPart::Str("<".into()), tag.clone()];
    let others: std::vec::Vec<&PropNode<'a>> = el
        .props
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != tag_index)
        .map(|(_, p)| p)
        .collect();
    if let Some((props, _)) = build_ssr_props(el, ctx, &others, true, false, true) {
        let attrs = create_helper_call(ctx.helper(RuntimeHelper::SsrRenderAttrs), vec![props]);
        open.push(TemplateLiteralPart::Expr(attrs));
    }
    if let Some(scope_id) = &ctx.options.scope_id {
        open.push(TemplateLiteralPart::Str(format!(" {}", scope_id).into()));
    }
    let close = vec![
        TemplateLiteralPart::Str("</".into()),
        tag,
        TemplateLiteralPart::Str(">".into()),
    ];
    el.ssr_codegen_node = Some(tessera_ast::create_array_expression(
        vec![
            JsNode::TemplateLiteral(create_template_literal(open)),
            JsNode::TemplateLiteral(create_template_literal(close)),
        ],
        el.loc.clone(),
    ));
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{compile, compile_with};
    use tessera_dom::DomCompilerOptions;

    #[test]
    fn test_component_without_slots() {
        let out = compile(r#"<div><foo :id="x" @click="go"/></div>"#);
        assert!(out.code.contains(r#"const _component_foo = _resolveComponent("foo")"#), "{}", out.code);
        assert!(
            out.code.contains("_push(_ssrRenderComponent(_component_foo, {id: _ctx.x,onClick: _ctx.go}, null, _parent))"),
            "{}",
            out.code
        );
    }

    #[test]
    fn test_root_component_receives_attrs() {
        let out = compile("<foo/>");
        assert!(
            out.code.contains("_push(_ssrRenderComponent(_component_foo, _attrs, null, _parent))"),
            "{}",
            out.code
        );
    }

    #[test]
    fn test_default_slot_has_both_branches() {
        let out = compile("<div><foo>hello {{ msg }}</foo></div>");
        assert!(out.code.contains("default: _withCtx((_, _push, _parent, _scopeId) => {"), "{}", out.code);
        assert!(out.code.contains("if (_push) {"), "{}", out.code);
        assert!(out.code.contains("_push(`hello ${_ssrInterpolate(_ctx.msg)}`)"), "{}", out.code);
        assert!(out.code.contains("} else {return ["), "{}", out.code);
        assert!(out.code.contains("_createTextVNode("), "{}", out.code);
        assert!(out.code.contains("_toDisplayString(_ctx.msg)"), "{}", out.code);
    }

    #[test]
    fn test_scoped_slot_params() {
        let out = compile(r#"<div><foo v-slot="{ item }"><span>{{ item }}</span></foo></div>"#);
        assert!(out.code.contains("_withCtx(({ item }, _push, _parent, _scopeId) => {"), "{}", out.code);
        assert!(out.code.contains("<span${_scopeId}>${_ssrInterpolate(item)}</span>"), "{}", out.code);
        assert!(out.code.contains("_toDisplayString(item)"), "{}", out.code);
    }

    #[test]
    fn test_named_slots() {
        let out = compile(r#"<div><foo><template #header>h</template><template #footer>f</template></foo></div>"#);
        assert!(out.code.contains("header: _withCtx("), "{}", out.code);
        assert!(out.code.contains("footer: _withCtx("), "{}", out.code);
        assert!(out.code.contains("_push(`h`)"), "{}", out.code);
        assert!(out.code.contains("_createTextVNode(\"f\""), "{}", out.code);
    }

    #[test]
    fn test_destructured_template_slot_props_stay_local() {
        let out = compile(r#"<Comp><template #foo="{ v }"><p>{{ v }}</p></template></Comp>"#);
        assert!(out.code.contains("foo: _withCtx(({ v }, _push, _parent, _scopeId) => {"), "{}", out.code);
        assert!(out.code.contains("_ssrInterpolate(v)"), "{}", out.code);
        assert!(out.code.contains("_toDisplayString(v)"), "{}", out.code);
        assert!(!out.code.contains("_ctx.v"), "{}", out.code);
    }

    #[test]
    fn test_dynamic_component() {
        let out = compile(r#"<div><component :is="view" :a="b"/></div>"#);
        assert!(
            out.code.contains("_ssrRenderVNode(_push, _createVNode(_resolveDynamicComponent(_ctx.view), { a: _ctx.b }, null), _parent)"),
            "{}",
            out.code
        );
        assert!(!out.code.contains("_push(_ssrRenderVNode"), "{}", out.code);
    }

    #[test]
    fn test_suspense() {
        let out = compile("<div><Suspense><p>ok</p></Suspense></div>");
        assert!(out.code.contains("_ssrRenderSuspense(_push, {"), "{}", out.code);
        assert!(out.code.contains("default: () => {_push(`<p>ok</p>`)}"), "{}", out.code);
    }

    #[test]
    fn test_transition_group_with_tag() {
        let out = compile(r#"<TransitionGroup tag="ul" class="list"><li v-for="i in items" :key="i">{{ i }}</li></TransitionGroup>"#);
        assert!(out.code.contains(r#"<ul${_ssrRenderAttrs(_mergeProps({ class: "list" }, _attrs))}>"#), "{}", out.code);
        assert!(out.code.contains("_ssrRenderList(_ctx.items, (i) => {"), "{}", out.code);
        assert!(!out.code.contains("<!--[-->"), "{}", out.code);
        assert!(out.code.contains("</ul>"), "{}", out.code);
    }

    #[test]
    fn test_scope_id_is_forwarded_into_slots() {
        let options = DomCompilerOptions {
            mode: tessera_ast::CodegenMode::Module,
            scope_id: Some("data-v-1".into()),
            ..Default::default()
        };
        let out = compile_with("<div><foo><bar/></foo></div>", options);
        assert!(
            out.code.contains("_push(_ssrRenderComponent(_component_bar, null, null, _parent, _scopeId))"),
            "{}",
            out.code
        );
    }
}
