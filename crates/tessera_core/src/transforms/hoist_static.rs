//! Static hoisting.
//!
//! Runs after the transform walk over the lowered IR. Every plain element
//! whose const type reaches [`ConstantType::CanHoist`] has its vnode call
//! moved into the root hoist list and replaced by a `_hoisted_N`
//! reference. Elements that stay dynamic may still get their props object
//! and dynamic prop list hoisted.
//!
//! A fully static single root is hoisted like any other element, so the
//! render function returns the hoisted reference directly.
//!
//! Component children are slot content and are never hoisted: a slot
//! function has to build fresh nodes every time it is called.

use tessera_arena::{PatchFlags, Vec};
use tessera_ast::{
    create_array_expression, Callee, ConstantType, ElementNode, ElementType, JsNode,
    PropNode, RootNode, RuntimeHelper, SourceLocation, TemplateChildNode,
};

use crate::transform::{HoistTransformFn, ParentInfo, TransformContext};
use crate::utils::{child_ref, vnode_block_helper, vnode_helper};

/// Const type of a text-like node. Other nodes report `NotConstant`.
pub fn text_constant_type(node: &TemplateChildNode<'_>) -> ConstantType {
    match node {
        TemplateChildNode::Text(_) | TemplateChildNode::Comment(_) => ConstantType::CanStringify,
        TemplateChildNode::Interpolation(i) => i.content.const_type(),
        TemplateChildNode::Compound(c) => c.const_type(),
        TemplateChildNode::TextCall(t) => t.content.const_type(),
        _ => ConstantType::NotConstant,
    }
}

/// Hoist constant subtrees of the root.
pub fn hoist_static<'a>(
    root: &mut RootNode<'a>,
    ctx: &mut TransformContext<'a>,
    transform_hoist: Option<HoistTransformFn>,
) {
    walk(&mut root.children, ParentInfo::Root, ctx, false, transform_hoist);
}

fn walk<'a>(
    children: &mut Vec<'a, TemplateChildNode<'a>>,
    parent: ParentInfo,
    ctx: &mut TransformContext<'a>,
    do_not_hoist_node: bool,
    transform_hoist: Option<HoistTransformFn>,
) -> bool {
    let original_count = children.len();
    let mut hoisted_count = 0;

    for child in children.iter_mut() {
        match child {
            TemplateChildNode::Element(el) if el.tag_type == ElementType::Element => {
                let constant_type = if do_not_hoist_node {
                    ConstantType::NotConstant
                } else {
                    get_constant_type(el, ctx)
                };
                if constant_type >= ConstantType::CanHoist {
                    if let Some(mut codegen) = el.codegen_node.take() {
                        if let JsNode::VNodeCall(call) = &mut codegen {
                            call.patch_flag = Some(PatchFlags::HOISTED);
                        }
                        el.codegen_node = Some(ctx.hoist(codegen));
                        ctx.hoisted_nodes.insert(el.id, ctx.hoists.len() - 1);
                        hoisted_count += 1;
                        tracing::trace!(id = el.id.0, tag = %el.tag, "hoisted element");
                        continue;
                    }
                } else if constant_type == ConstantType::NotConstant {
                    hoist_props_of_dynamic_element(el, ctx);
                }
            }
            TemplateChildNode::TextCall(text) => {
                if text.content.const_type() >= ConstantType::CanHoist {
                    if let Some(codegen) = text.codegen_node.take() {
                        text.codegen_node = Some(ctx.hoist(codegen));
                        ctx.hoisted_nodes.insert(text.id, ctx.hoists.len() - 1);
                        hoisted_count += 1;
                        continue;
                    }
                }
            }
            _ => {}
        }

        match child {
            TemplateChildNode::Element(el) if el.tag_type != ElementType::Component => {
                let parent = ParentInfo::Element {
                    id: el.id,
                    tag: el.tag.clone(),
                    tag_type: el.tag_type,
                };
                if walk(&mut el.children, parent, ctx, false, transform_hoist) {
                    hoist_children_array(el, ctx);
                }
            }
            TemplateChildNode::For(for_node) => {
                let single = for_node.children.len() == 1;
                let parent = ParentInfo::For(for_node.id);
                walk(&mut for_node.children, parent, ctx, single, transform_hoist);
            }
            TemplateChildNode::If(if_node) => {
                for branch in if_node.branches.iter_mut() {
                    let single = branch.children.len() == 1;
                    let parent = ParentInfo::IfBranch(branch.id);
                    walk(&mut branch.children, parent, ctx, single, transform_hoist);
                }
            }
            _ => {}
        }
    }

    if hoisted_count > 0 {
        if let Some(transform) = transform_hoist {
            transform(children, ctx, &parent);
        }
    }
    hoisted_count > 0 && hoisted_count == original_count
}

/// When every child of a plain element was hoisted, the children array
/// itself is constant.
fn hoist_children_array<'a>(el: &mut ElementNode<'a>, ctx: &mut TransformContext<'a>) {
    if el.tag_type != ElementType::Element {
        return;
    }
    let Some(JsNode::VNodeCall(call)) = el.codegen_node.as_mut() else {
        return;
    };
    if !matches!(call.children, Some(JsNode::Children(_))) {
        return;
    }
    let elements = el.children.iter().map(child_ref).collect();
    call.children = Some(ctx.hoist(create_array_expression(elements, SourceLocation::STUB)));
}

fn hoist_props_of_dynamic_element<'a>(el: &mut ElementNode<'a>, ctx: &mut TransformContext<'a>) {
    let props_type = match el.codegen_node.as_ref() {
        Some(JsNode::VNodeCall(call)) => generated_props_constant_type(call.props.as_ref()),
        _ => return,
    };
    let Some(JsNode::VNodeCall(call)) = el.codegen_node.as_mut() else {
        return;
    };
    let flag = call.patch_flag.unwrap_or_else(PatchFlags::empty);
    if (flag.is_empty() || flag == PatchFlags::NEED_PATCH || flag == PatchFlags::TEXT)
        && props_type >= ConstantType::CanHoist
    {
        if let Some(props) = call.props.take() {
            call.props = Some(ctx.hoist(props));
        }
    }
    if let Some(dynamic_props) = call.dynamic_props.take() {
        call.dynamic_props = Some(ctx.hoist(dynamic_props));
    }
}

/// Const type of a plain element, memoized per node.
///
/// An element with a patch flag is never constant. A block can only be
/// constant for `svg` / `foreignObject` / `math`, which are demoted to a
/// plain vnode call once they are known to be static.
pub fn get_constant_type<'a>(el: &mut ElementNode<'a>, ctx: &mut TransformContext<'a>) -> ConstantType {
    if el.tag_type != ElementType::Element {
        return ConstantType::NotConstant;
    }
    if let Some(cached) = ctx.constant_cache.get(&el.id) {
        return *cached;
    }
    let result = compute_element_constant_type(el, ctx);
    ctx.constant_cache.insert(el.id, result);
    result
}

fn compute_element_constant_type<'a>(
    el: &mut ElementNode<'a>,
    ctx: &mut TransformContext<'a>,
) -> ConstantType {
    let (is_block, patch_flag, props_type) = match el.codegen_node.as_ref() {
        Some(JsNode::VNodeCall(call)) => (
            call.is_block,
            call.patch_flag,
            generated_props_constant_type(call.props.as_ref()),
        ),
        _ => return ConstantType::NotConstant,
    };
    let block_tag = matches!(el.tag.as_str(), "svg" | "foreignObject" | "math");
    if is_block && !block_tag {
        return ConstantType::NotConstant;
    }
    if patch_flag.is_some() {
        return ConstantType::NotConstant;
    }

    let mut result = ConstantType::CanStringify;
    if props_type == ConstantType::NotConstant {
        return ConstantType::NotConstant;
    }
    result = result.min(props_type);

    for child in el.children.iter_mut() {
        let child_type = child_constant_type(child, ctx);
        if child_type == ConstantType::NotConstant {
            return ConstantType::NotConstant;
        }
        result = result.min(child_type);
    }

    if result > ConstantType::NotConstant {
        for prop in el.props.iter() {
            if let PropNode::Directive(dir) = prop {
                if dir.name == "bind" {
                    if let Some(exp) = &dir.exp {
                        let exp_type = exp.const_type();
                        if exp_type == ConstantType::NotConstant {
                            return ConstantType::NotConstant;
                        }
                        result = result.min(exp_type);
                    }
                }
            }
        }
    }

    if is_block {
        if el.props.iter().any(|p| matches!(p, PropNode::Directive(_))) {
            return ConstantType::NotConstant;
        }
        if let Some(JsNode::VNodeCall(call)) = el.codegen_node.as_mut() {
            let in_ssr = ctx.options.in_ssr;
            ctx.remove_helper(RuntimeHelper::OpenBlock);
            ctx.remove_helper(vnode_block_helper(in_ssr, call.is_component));
            call.is_block = false;
            ctx.helper(vnode_helper(in_ssr, call.is_component));
        }
    }
    result
}

fn child_constant_type<'a>(child: &mut TemplateChildNode<'a>, ctx: &mut TransformContext<'a>) -> ConstantType {
    match child {
        TemplateChildNode::Element(el) => get_constant_type(el, ctx),
        TemplateChildNode::If(_) | TemplateChildNode::For(_) => ConstantType::NotConstant,
        other => text_constant_type(other),
    }
}

/// Least const type among the generated props object's keys and values.
fn generated_props_constant_type(props: Option<&JsNode>) -> ConstantType {
    let mut result = ConstantType::CanStringify;
    let Some(JsNode::Object(object)) = props else {
        return result;
    };
    for property in &object.properties {
        let key_type = property.key.const_type();
        if key_type == ConstantType::NotConstant {
            return key_type;
        }
        result = result.min(key_type);
        let value_type = value_constant_type(&property.value);
        if value_type == ConstantType::NotConstant {
            return value_type;
        }
        result = result.min(value_type);
    }
    result
}

fn value_constant_type(value: &JsNode) -> ConstantType {
    match value {
        JsNode::Simple(s) => s.const_type,
        JsNode::Compound(c) => c.const_type(),
        JsNode::Call(call) => {
            let allowed = matches!(
                call.callee,
                Callee::Helper(
                    RuntimeHelper::NormalizeClass
                        | RuntimeHelper::NormalizeStyle
                        | RuntimeHelper::NormalizeProps
                        | RuntimeHelper::GuardReactiveProps
                )
            );
            match call.arguments.first() {
                Some(arg) if allowed => value_constant_type(arg),
                _ => ConstantType::NotConstant,
            }
        }
        _ => ConstantType::NotConstant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{compile_root_with, TemplateGen};
    use crate::transform::{Container, Walker};
    use crate::transforms::base_preset;
    use tessera_arena::Bump;
    use tessera_ast::TransformOptions;

    const SEEDS: u64 = 200;

    fn hoisting() -> TransformOptions {
        TransformOptions {
            hoist_static: true,
            prefix_identifiers: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_static_child_is_hoisted() {
        compile_root_with(r#"<div><span class="a">hi</span>{{ msg }}</div>"#, hoisting(), |root, _| {
            assert_eq!(root.hoists.len(), 1);
            let Some(Some(JsNode::VNodeCall(call))) = root.hoists.first() else {
                panic!("expected hoisted vnode call");
            };
            assert_eq!(call.patch_flag, Some(PatchFlags::HOISTED));
            let div = root.children[0].as_element().unwrap();
            assert!(matches!(
                div.children[0].codegen_node(),
                Some(JsNode::Simple(s)) if s.content == "_hoisted_1"
            ));
        });
    }

    #[test]
    fn test_static_single_root_is_hoisted() {
        compile_root_with(r#"<div class="a">static</div>"#, hoisting(), |root, _| {
            assert_eq!(root.hoists.len(), 1);
            let Some(Some(JsNode::VNodeCall(call))) = root.hoists.first() else {
                panic!("expected hoisted vnode call");
            };
            assert!(!call.is_block);
            assert_eq!(call.patch_flag, Some(PatchFlags::HOISTED));
            assert!(matches!(
                root.children[0].codegen_node(),
                Some(JsNode::Simple(s)) if s.content == "_hoisted_1"
            ));
        });
    }

    #[test]
    fn test_dynamic_single_root_hoists_its_props() {
        compile_root_with(r#"<div class="a">{{ msg }}</div>"#, hoisting(), |root, _| {
            assert_eq!(root.hoists.len(), 1);
            assert!(matches!(root.hoists[0], Some(JsNode::Object(_))));
        });
    }

    #[test]
    fn test_dynamic_binding_blocks_hoisting() {
        compile_root_with(r#"<div><span :id="foo"/></div>"#, hoisting(), |root, _| {
            assert!(root.hoists.iter().all(|h| !matches!(h, Some(JsNode::VNodeCall(_)))));
        });
    }

    #[test]
    fn test_constant_binding_is_hoisted() {
        compile_root_with(r#"<div><span :id="1"/><p/>{{ x }}</div>"#, hoisting(), |root, _| {
            let vnode_hoists = root
                .hoists
                .iter()
                .filter(|h| matches!(h, Some(JsNode::VNodeCall(_))))
                .count();
            assert_eq!(vnode_hoists, 2);
        });
    }

    #[test]
    fn test_all_children_hoisted_hoists_the_array() {
        compile_root_with(r#"<div><section><span/><b/></section>{{ x }}</div>"#, hoisting(), |root, _| {
            // the section itself is hoisted whole
            assert_eq!(root.hoists.len(), 1);
        });
        compile_root_with(r#"<div :id="x"><span/><b/></div>"#, hoisting(), |root, _| {
            // dynamic prop names, both children, then the children array
            assert_eq!(root.hoists.len(), 4);
            assert!(matches!(root.hoists[0], Some(JsNode::Raw(_))));
            assert!(matches!(root.hoists[3], Some(JsNode::Array(_))));
        });
    }

    #[test]
    fn test_static_props_of_dynamic_element_are_hoisted() {
        compile_root_with(r#"<div><p class="x">{{ msg }}</p></div>"#, hoisting(), |root, _| {
            assert_eq!(root.hoists.len(), 1);
            assert!(matches!(root.hoists[0], Some(JsNode::Object(_))));
        });
    }

    #[test]
    fn test_slot_content_is_not_hoisted() {
        compile_root_with(r#"<div><Comp><span class="a"/></Comp></div>"#, hoisting(), |root, _| {
            assert!(root.hoists.is_empty());
        });
    }

    #[test]
    fn test_single_child_of_branch_is_not_hoisted() {
        compile_root_with(r#"<div><p v-if="ok">static</p></div>"#, hoisting(), |root, _| {
            // only the `{ key: 0 }` props object of the branch child
            assert_eq!(root.hoists.len(), 1);
            assert!(matches!(root.hoists[0], Some(JsNode::Object(_))));
        });
    }

    fn assert_monotonic<'a>(
        children: &mut Vec<'a, TemplateChildNode<'a>>,
        ctx: &mut TransformContext<'a>,
        source: &str,
    ) {
        for child in children.iter_mut() {
            match child {
                TemplateChildNode::Element(el) => {
                    let own = get_constant_type(el, ctx);
                    for inner in el.children.iter_mut() {
                        let below = child_constant_type(inner, ctx);
                        assert!(own <= below, "{:?} over child {:?} in {}", own, below, source);
                    }
                    if let Some(JsNode::VNodeCall(call)) = el.codegen_node.as_ref() {
                        let props = generated_props_constant_type(call.props.as_ref());
                        assert!(own <= props, "{:?} over props {:?} in {}", own, props, source);
                    }
                    assert_monotonic(&mut el.children, ctx, source);
                }
                TemplateChildNode::If(if_node) => {
                    for branch in if_node.branches.iter_mut() {
                        assert_monotonic(&mut branch.children, ctx, source);
                    }
                }
                TemplateChildNode::For(for_node) => assert_monotonic(&mut for_node.children, ctx, source),
                _ => {}
            }
        }
    }

    #[test]
    fn test_constant_type_never_exceeds_children_or_props() {
        let preset = base_preset();
        for seed in 0..SEEDS {
            let source = TemplateGen::new(seed).template();
            let allocator = Bump::new();
            let (mut root, _) = tessera_parser::parse(&allocator, &source);
            let mut ctx = TransformContext::new(
                &allocator,
                hoisting(),
                root.next_id,
                preset.directive_transforms.clone(),
            );
            Walker::new(&preset).traverse_children(
                &mut root.children,
                Container::Root,
                ParentInfo::Root,
                &mut ctx,
            );
            assert_monotonic(&mut root.children, &mut ctx, &source);
        }
    }

    fn assert_hoisted_are_static(children: &[TemplateChildNode<'_>], source: &str) {
        for child in children {
            let hoisted = matches!(
                child.codegen_node(),
                Some(JsNode::Simple(s)) if s.content.starts_with("_hoisted_")
            );
            if hoisted {
                let text = child.loc().source.as_str();
                for name in ["dyn", "go", "Comp", "v-if", "v-for"] {
                    assert!(!text.contains(name), "hoisted {} in {}", text, source);
                }
                continue;
            }
            match child {
                TemplateChildNode::Element(el) => assert_hoisted_are_static(&el.children, source),
                TemplateChildNode::If(if_node) => {
                    for branch in if_node.branches.iter() {
                        assert_hoisted_are_static(&branch.children, source);
                    }
                }
                TemplateChildNode::For(for_node) => assert_hoisted_are_static(&for_node.children, source),
                _ => {}
            }
        }
    }

    #[test]
    fn test_hoisted_subtrees_bind_no_instance_names() {
        let mut hoisted_vnodes = 0;
        for seed in 0..SEEDS {
            let source = TemplateGen::new(seed).template();
            compile_root_with(&source, hoisting(), |root, _| {
                assert_hoisted_are_static(&root.children, &source);
                for hoist in root.hoists.iter().flatten() {
                    if let JsNode::VNodeCall(call) = hoist {
                        hoisted_vnodes += 1;
                        assert!(!call.is_block, "{}", source);
                        assert_eq!(call.patch_flag, Some(PatchFlags::HOISTED), "{}", source);
                    }
                }
            });
        }
        // the generator has to produce static subtrees for this to mean anything
        assert!(hoisted_vnodes > 0);
    }
}
