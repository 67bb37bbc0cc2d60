//! Slot scopes and the slots object of a component.
//!
//! [`TrackSlotScopes`] and [`TrackVForSlotScopes`] register the names a
//! `v-slot` (or a looped `<template v-slot>`) binds while its content is
//! transformed. [`build_slots`] runs on component exit and produces the
//! slots object handed to the component, delegating each slot function to
//! a backend specific builder.

use tessera_arena::{Box, SlotFlags};
use tessera_ast::{
    create_call_expression, create_conditional_expression, create_function_expression,
    create_object_expression, create_object_property, Callee, DirectiveNode, ElementNode,
    ElementType, ErrorCode, ExpressionNode, JsNode, NodeId, PropNode, RuntimeHelper,
    SimpleExpressionNode, SourceLocation, TemplateChildNode,
};

use crate::transform::{ExitFn, NodeCursor, NodeTransform, TransformContext, Walker};
use crate::transforms::v_bind::property;
use crate::transforms::v_for::{create_for_loop_params, finalize_for_parse_result, parse_for_expression};
use crate::utils::{element_has_scope_ref, find_dir, is_template_node};

// ============================================================================
// Scope tracking
// ============================================================================

/// Binds `v-slot` props on components and slot templates
pub struct TrackSlotScopes;

impl<'a> NodeTransform<'a> for TrackSlotScopes {
    fn enter(
        &self,
        cursor: &mut NodeCursor<'_, 'a>,
        ctx: &mut TransformContext<'a>,
        _walker: &Walker<'_>,
    ) -> Option<ExitFn<'a>> {
        let TemplateChildNode::Element(el) = cursor.node() else {
            return None;
        };
        if !matches!(el.tag_type, ElementType::Component | ElementType::Template) {
            return None;
        }
        let slot_props = find_dir(el, "slot", false)?.exp.clone();
        if ctx.prefix_identifiers() {
            if let Some(props) = &slot_props {
                ctx.add_identifiers(props);
            }
        }
        ctx.scopes.v_slot += 1;
        Some(std::boxed::Box::new(move |_, ctx| {
            if ctx.prefix_identifiers() {
                if let Some(props) = &slot_props {
                    ctx.remove_identifiers(props);
                }
            }
            ctx.scopes.v_slot -= 1;
        }))
    }
}

/// Binds the aliases of `<template v-slot v-for>`, which stays a template
/// instead of becoming a loop node
pub struct TrackVForSlotScopes;

impl<'a> NodeTransform<'a> for TrackVForSlotScopes {
    fn enter(
        &self,
        cursor: &mut NodeCursor<'_, 'a>,
        ctx: &mut TransformContext<'a>,
        _walker: &Walker<'_>,
    ) -> Option<ExitFn<'a>> {
        let TemplateChildNode::Element(el) = cursor.node_mut() else {
            return None;
        };
        if el.tag_type != ElementType::Template || !el.has_dir("slot") {
            return None;
        }
        let dir = el.props.iter_mut().find_map(|p| match p {
            PropNode::Directive(dir) if dir.name == "for" && dir.exp.is_some() => Some(dir),
            _ => None,
        })?;
        if dir.for_parse_result.is_none() {
            dir.for_parse_result = match &dir.exp {
                Some(ExpressionNode::Simple(exp)) => parse_for_expression(exp),
                _ => None,
            };
        }
        let result = dir.for_parse_result.as_mut()?;
        finalize_for_parse_result(result, ctx);

        if !ctx.prefix_identifiers() {
            return None;
        }
        let aliases: std::vec::Vec<ExpressionNode> = [&result.value, &result.key, &result.index]
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        for alias in &aliases {
            ctx.add_identifiers(alias);
        }
        Some(std::boxed::Box::new(move |_, ctx| {
            for alias in &aliases {
                ctx.remove_identifiers(alias);
            }
        }))
    }
}

// ============================================================================
// Slots object
// ============================================================================

/// What one slot function is built from
pub struct SlotSource<'s, 'a> {
    /// Slot props pattern (`v-slot="{ item }"`)
    pub props: Option<&'s ExpressionNode>,
    /// `v-for` of a looped `<template v-slot>`
    pub v_for: Option<&'s DirectiveNode<'a>>,
    /// Element whose children are the slot content
    pub container: NodeId,
    pub loc: SourceLocation,
}

/// Client slot function: `_withCtx((props) => [children])`
pub fn client_slot_fn(source: SlotSource<'_, '_>, _ctx: &mut TransformContext<'_>) -> JsNode {
    let params = source.props.map(|p| vec![JsNode::expression(p.clone())]).unwrap_or_default();
    JsNode::Function(std::boxed::Box::new(create_function_expression(
        params,
        Some(JsNode::Children(source.container)),
        false,
        true,
        source.loc,
    )))
}

fn static_name(name: &str) -> ExpressionNode {
    ExpressionNode::Simple(SimpleExpressionNode::new(name, true, SourceLocation::STUB))
}

fn build_dynamic_slot(name: ExpressionNode, slot_fn: JsNode, key: Option<u32>) -> JsNode {
    let mut props = vec![
        create_object_property("name", JsNode::expression(name)),
        create_object_property("fn", slot_fn),
    ];
    if let Some(key) = key {
        props.push(create_object_property(
            "key",
            JsNode::Simple(SimpleExpressionNode::new(key.to_string(), true, SourceLocation::STUB)),
        ));
    }
    create_object_expression(props, SourceLocation::STUB)
}

fn undefined_fallback() -> JsNode {
    JsNode::Simple(SimpleExpressionNode::new("undefined", false, SourceLocation::STUB))
}

/// The alternate at the end of a chain of conditional slots.
fn conditional_tail(node: &mut JsNode) -> Option<&mut JsNode> {
    let JsNode::Conditional(cond) = node else {
        return None;
    };
    if matches!(cond.alternate, JsNode::Conditional(_)) {
        conditional_tail(&mut cond.alternate)
    } else {
        Some(&mut cond.alternate)
    }
}

/// Whether any descendant is a `<slot>` outlet.
pub fn has_forwarded_slots(children: &[TemplateChildNode<'_>]) -> bool {
    children.iter().any(|child| match child {
        TemplateChildNode::Element(el) => {
            el.tag_type == ElementType::Slot || has_forwarded_slots(&el.children)
        }
        TemplateChildNode::If(if_node) => {
            if_node.branches.iter().any(|b| has_forwarded_slots(&b.children))
        }
        TemplateChildNode::For(for_node) => has_forwarded_slots(&for_node.children),
        _ => false,
    })
}

fn else_directive<'e, 'a>(el: &'e ElementNode<'a>) -> Option<&'e DirectiveNode<'a>> {
    el.props.iter().find_map(|p| match p {
        PropNode::Directive(dir) if dir.name == "else" || dir.name == "else-if" => Some(&**dir),
        _ => None,
    })
}

fn content_loc(el: &ElementNode<'_>) -> SourceLocation {
    el.children
        .first()
        .map(|c| c.loc().clone())
        .unwrap_or_else(|| el.loc.clone())
}

/// Build the slots object of a component.
///
/// Returns the object (or a `createSlots` call when some slots are
/// conditional or looped) and whether the slots need a dynamic patch.
/// Implicit default content mixed with named slot templates is moved into
/// a synthetic `<template>` child so it has a container of its own.
pub fn build_slots<'a>(
    el: &mut ElementNode<'a>,
    ctx: &mut TransformContext<'a>,
    mut build_slot_fn: impl FnMut(SlotSource<'_, 'a>, &mut TransformContext<'a>) -> JsNode,
) -> (JsNode, bool) {
    ctx.helper(RuntimeHelper::WithCtx);

    let mut slots_properties = std::vec::Vec::new();
    let mut dynamic_slots: std::vec::Vec<JsNode> = std::vec::Vec::new();

    let mut has_dynamic_slots = ctx.scopes.v_slot > 0 || ctx.scopes.v_for > 0;
    if !ctx.is_ssr() && ctx.prefix_identifiers() {
        has_dynamic_slots = element_has_scope_ref(el, &ctx.identifiers);
    }

    let on_component_slot = find_dir(el, "slot", true).map(|d| (d.arg.clone(), d.exp.clone()));
    if let Some((arg, exp)) = &on_component_slot {
        if arg.as_ref().is_some_and(|a| !a.is_static()) {
            has_dynamic_slots = true;
        }
        let slot_fn = build_slot_fn(
            SlotSource {
                props: exp.as_ref(),
                v_for: None,
                container: el.id,
                loc: el.loc.clone(),
            },
            ctx,
        );
        let name = arg.clone().unwrap_or_else(|| static_name("default"));
        slots_properties.push(property(name, slot_fn));
    }

    let mut has_template_slots = false;
    let mut has_named_default_slot = false;
    let mut implicit_default: std::vec::Vec<usize> = std::vec::Vec::new();
    let mut seen_slot_names: std::vec::Vec<String> = std::vec::Vec::new();
    let mut conditional_index = 0u32;

    for (i, child) in el.children.iter().enumerate() {
        let slot = match child {
            TemplateChildNode::Element(slot_el) if is_template_node(child) => {
                find_dir(slot_el, "slot", true).map(|dir| (&**slot_el, dir))
            }
            _ => None,
        };
        let Some((slot_el, slot_dir)) = slot else {
            if !matches!(child, TemplateChildNode::Comment(_)) {
                implicit_default.push(i);
            }
            continue;
        };

        if on_component_slot.is_some() {
            ctx.report(ErrorCode::VSlotMixedSlotUsage, &slot_dir.loc);
            break;
        }
        has_template_slots = true;

        let slot_name = slot_dir.arg.clone().unwrap_or_else(|| static_name("default"));
        let static_slot_name = match &slot_name {
            ExpressionNode::Simple(s) if s.is_static => Some(s.content.to_string()),
            _ => {
                has_dynamic_slots = true;
                None
            }
        };

        let v_for = find_dir(slot_el, "for", false);
        let slot_fn = build_slot_fn(
            SlotSource {
                props: slot_dir.exp.as_ref(),
                v_for,
                container: slot_el.id,
                loc: content_loc(slot_el),
            },
            ctx,
        );

        if let Some(v_if) = find_dir(slot_el, "if", false) {
            has_dynamic_slots = true;
            let test = v_if.exp.clone().map(JsNode::expression).unwrap_or_else(|| JsNode::raw("true"));
            dynamic_slots.push(create_conditional_expression(
                test,
                build_dynamic_slot(slot_name, slot_fn, Some(conditional_index)),
                undefined_fallback(),
                true,
            ));
            conditional_index += 1;
        } else if let Some(v_else) = else_directive(slot_el) {
            let prev = el.children[..i]
                .iter()
                .rev()
                .find(|c| !matches!(c, TemplateChildNode::Comment(_)));
            let follows_if = matches!(
                prev,
                Some(TemplateChildNode::Element(p))
                    if p.tag_type == ElementType::Template
                        && (find_dir(p, "if", false).is_some()
                            || find_dir(p, "else-if", false).is_some())
            );
            let tail = dynamic_slots.last_mut().and_then(conditional_tail);
            match (follows_if, tail) {
                (true, Some(tail)) => {
                    let branch = build_dynamic_slot(slot_name, slot_fn, Some(conditional_index));
                    conditional_index += 1;
                    *tail = match &v_else.exp {
                        Some(exp) if v_else.name == "else-if" => create_conditional_expression(
                            JsNode::expression(exp.clone()),
                            branch,
                            undefined_fallback(),
                            true,
                        ),
                        _ => branch,
                    };
                }
                _ => ctx.report(ErrorCode::VElseNoAdjacentIf, &v_else.loc),
            }
        } else if let Some(v_for) = v_for {
            has_dynamic_slots = true;
            let parsed = v_for.for_parse_result.clone().or_else(|| match &v_for.exp {
                Some(ExpressionNode::Simple(exp)) => parse_for_expression(exp),
                _ => None,
            });
            match parsed {
                Some(mut result) => {
                    finalize_for_parse_result(&mut result, ctx);
                    let params = create_for_loop_params(&result, &[]);
                    let body = build_dynamic_slot(slot_name, slot_fn, None);
                    let render_list = ctx.helper(RuntimeHelper::RenderList);
                    dynamic_slots.push(create_call_expression(
                        Callee::Helper(render_list),
                        vec![
                            JsNode::expression(result.source.clone()),
                            JsNode::Function(std::boxed::Box::new(create_function_expression(
                                params,
                                Some(body),
                                true,
                                false,
                                v_for.loc.clone(),
                            ))),
                        ],
                        v_for.loc.clone(),
                    ));
                }
                None => ctx.report(ErrorCode::VForMalformedExpression, &v_for.loc),
            }
        } else {
            if let Some(name) = static_slot_name {
                if seen_slot_names.contains(&name) {
                    ctx.report(ErrorCode::VSlotDuplicateSlotNames, &slot_dir.loc);
                    continue;
                }
                if name == "default" {
                    has_named_default_slot = true;
                }
                seen_slot_names.push(name);
            }
            slots_properties.push(property(slot_name, slot_fn));
        }
    }

    if on_component_slot.is_none() {
        if !has_template_slots {
            let source = SlotSource {
                props: None,
                v_for: None,
                container: el.id,
                loc: content_loc(el),
            };
            let slot_fn = build_slot_fn(source, ctx);
            slots_properties.push(property(static_name("default"), slot_fn));
        } else if implicit_default
            .iter()
            .any(|&i| !el.children[i].is_whitespace_text())
        {
            if has_named_default_slot {
                let loc = el.children[implicit_default[0]].loc().clone();
                ctx.report(ErrorCode::VSlotExtraneousDefaultSlotChildren, &loc);
            } else {
                let container = wrap_implicit_default(el, &implicit_default, ctx);
                let loc = el.children[implicit_default[0]..]
                    .iter()
                    .find_map(|c| c.as_element().filter(|e| e.id == container))
                    .map(content_loc)
                    .unwrap_or_else(|| el.loc.clone());
                let slot_fn = build_slot_fn(
                    SlotSource {
                        props: None,
                        v_for: None,
                        container,
                        loc,
                    },
                    ctx,
                );
                slots_properties.push(property(static_name("default"), slot_fn));
            }
        }
    }

    let slot_flag = if has_dynamic_slots {
        SlotFlags::Dynamic
    } else if has_forwarded_slots(&el.children) {
        SlotFlags::Forwarded
    } else {
        SlotFlags::Stable
    };
    slots_properties.push(create_object_property(
        "_",
        JsNode::raw(format!("{} /* {} */", slot_flag as u8, slot_flag.name())),
    ));
    let mut slots = create_object_expression(slots_properties, el.loc.clone());
    if !dynamic_slots.is_empty() {
        let create_slots = ctx.helper(RuntimeHelper::CreateSlots);
        slots = create_call_expression(
            Callee::Helper(create_slots),
            vec![slots, tessera_ast::create_array_expression(dynamic_slots, SourceLocation::STUB)],
            el.loc.clone(),
        );
    }
    (slots, has_dynamic_slots)
}

/// Move the implicit default children into a new `<template>` placed where
/// the first of them was. Returns the template's id.
fn wrap_implicit_default<'a>(
    el: &mut ElementNode<'a>,
    indices: &[usize],
    ctx: &mut TransformContext<'a>,
) -> NodeId {
    let id = ctx.alloc_id();
    let first = indices[0];
    let loc = el.children[first].loc().clone();
    let mut wrapper = ElementNode::new(ctx.allocator, id, "template", loc);
    wrapper.tag_type = ElementType::Template;
    for &i in indices.iter().rev() {
        let child = el.children.remove(i);
        wrapper.children.insert(0, child);
    }
    el.children
        .insert(first, TemplateChildNode::Element(Box::new_in(wrapper, ctx.allocator)));
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{compile_root, compile_root_with};
    use tessera_ast::{ObjectExpression, RootNode, TransformOptions};

    fn slots<'r>(root: &'r RootNode<'_>) -> &'r JsNode {
        root.children[0]
            .as_element()
            .and_then(|el| el.codegen_node.as_ref())
            .and_then(|c| c.as_vnode_call())
            .and_then(|call| call.children.as_ref())
            .expect("component slots")
    }

    fn object(node: &JsNode) -> &ObjectExpression {
        match node {
            JsNode::Object(obj) => obj,
            JsNode::Call(call) => match &call.arguments[0] {
                JsNode::Object(obj) => obj,
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    fn flag(obj: &ObjectExpression) -> std::string::String {
        match &obj.find("_").expect("slot flag").value {
            JsNode::Raw(r) => r.to_string(),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_implicit_default_slot() {
        compile_root(r#"<Comp><div/></Comp>"#, |root, errors| {
            assert!(errors.is_empty());
            let obj = object(slots(root));
            let JsNode::Function(f) = &obj.find("default").unwrap().value else {
                panic!("expected slot function");
            };
            assert!(f.is_slot);
            assert!(f.params.is_empty());
            assert_eq!(flag(obj), "1 /* STABLE */");
        });
    }

    #[test]
    fn test_named_and_scoped_slots() {
        let options = TransformOptions {
            prefix_identifiers: true,
            ..Default::default()
        };
        compile_root_with(
            r#"<Comp><template #header="{ title }">{{ title }}</template><template #footer>f</template></Comp>"#,
            options,
            |root, errors| {
                assert!(errors.is_empty());
                let obj = object(slots(root));
                let JsNode::Function(header) = &obj.find("header").unwrap().value else {
                    panic!("expected slot function");
                };
                assert_eq!(header.params.len(), 1);
                assert!(obj.find("footer").is_some());
                assert_eq!(flag(obj), "1 /* STABLE */");
            },
        );
    }

    #[test]
    fn test_conditional_slots_use_create_slots() {
        compile_root(
            r#"<Comp><template v-if="ok" #a>A</template><template v-else #b>B</template></Comp>"#,
            |root, errors| {
                assert!(errors.is_empty());
                let JsNode::Call(call) = slots(root) else {
                    panic!("expected createSlots");
                };
                assert_eq!(call.callee, Callee::Helper(RuntimeHelper::CreateSlots));
                let JsNode::Array(dynamic) = &call.arguments[1] else {
                    panic!("expected dynamic slot array");
                };
                assert_eq!(dynamic.elements.len(), 1);
                assert!(matches!(&dynamic.elements[0], JsNode::Conditional(c) if matches!(c.alternate, JsNode::Object(_))));
                let call_flag = root.children[0]
                    .as_element()
                    .and_then(|el| el.codegen_node.as_ref())
                    .and_then(|c| c.as_vnode_call())
                    .and_then(|c| c.patch_flag);
                assert_eq!(call_flag, Some(tessera_arena::PatchFlags::DYNAMIC_SLOTS));
            },
        );
    }

    #[test]
    fn test_looped_slots() {
        compile_root(
            r#"<Comp><template v-for="n in names" #[n]>{{ n }}</template></Comp>"#,
            |root, errors| {
                assert!(errors.is_empty());
                let JsNode::Call(call) = slots(root) else {
                    panic!("expected createSlots");
                };
                let JsNode::Array(dynamic) = &call.arguments[1] else {
                    panic!("expected dynamic slot array");
                };
                assert!(matches!(
                    &dynamic.elements[0],
                    JsNode::Call(c) if c.callee == Callee::Helper(RuntimeHelper::RenderList)
                ));
            },
        );
    }

    #[test]
    fn test_mixed_implicit_default_gets_template() {
        compile_root(r#"<Comp><template #a>A</template><span/></Comp>"#, |root, errors| {
            assert!(errors.is_empty());
            let el = root.children[0].as_element().unwrap();
            assert_eq!(el.children.len(), 2);
            let wrapper = el.children[1].as_element().unwrap();
            assert_eq!(wrapper.tag_type, ElementType::Template);
            let obj = object(slots(root));
            let JsNode::Function(f) = &obj.find("default").unwrap().value else {
                panic!("expected slot function");
            };
            assert!(matches!(f.returns, Some(JsNode::Children(id)) if id == wrapper.id));
        });
    }

    #[test]
    fn test_slot_errors() {
        compile_root(r#"<Comp v-slot="p"><template #a/></Comp>"#, |_, errors| {
            assert_eq!(errors[0].code, ErrorCode::VSlotMixedSlotUsage as u16);
        });
        compile_root(r#"<Comp><template #a/><template #a/></Comp>"#, |_, errors| {
            assert_eq!(errors[0].code, ErrorCode::VSlotDuplicateSlotNames as u16);
        });
        compile_root(r#"<Comp><template #default/><span/></Comp>"#, |_, errors| {
            assert_eq!(errors[0].code, ErrorCode::VSlotExtraneousDefaultSlotChildren as u16);
        });
        compile_root(r#"<div v-slot="p"/>"#, |_, errors| {
            assert_eq!(errors[0].code, ErrorCode::VSlotMisplaced as u16);
        });
    }

    #[test]
    fn test_forwarded_slot_flag() {
        compile_root(r#"<Comp><slot/></Comp>"#, |root, _| {
            assert_eq!(flag(object(slots(root))), "3 /* FORWARDED */");
        });
    }

    #[test]
    fn test_scope_variable_makes_slots_dynamic() {
        let options = TransformOptions {
            prefix_identifiers: true,
            ..Default::default()
        };
        compile_root_with(
            r#"<div v-for="i in list"><Comp>{{ i }}</Comp></div>"#,
            options,
            |root, _| {
                let TemplateChildNode::For(for_node) = &root.children[0] else {
                    panic!("expected for");
                };
                let div = for_node.children[0].as_element().unwrap();
                let comp = div.children[0].as_element().unwrap();
                let call = comp.codegen_node.as_ref().unwrap().as_vnode_call().unwrap();
                assert_eq!(flag(object(call.children.as_ref().unwrap())), "2 /* DYNAMIC */");
            },
        );
    }
}
