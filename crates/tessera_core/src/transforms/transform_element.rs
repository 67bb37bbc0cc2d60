//! Element transform.
//!
//! Runs on exit, after every child has its codegen, and lowers plain
//! elements and components to a [`VNodeCall`](tessera_ast::VNodeCall):
//! tag resolution, the props object (or `mergeProps` call), runtime
//! directives, children or slots, and the patch flag summarizing what can
//! change between renders.

use tessera_arena::{camelize, capitalize, PatchFlags, String};
use tessera_ast::{
    create_array_expression, create_call_expression, create_helper_call,
    create_object_expression, create_object_property, BindingType, Callee, ConstantType,
    DirectiveNode, ElementNode, ElementType, ErrorCode, ExpressionNode, JsNode, PropNode,
    Property, RuntimeHelper, SimpleExpressionNode, SourceLocation, TemplateChildNode,
};

use crate::transform::{
    ExitFn, NeedRuntime, NodeCursor, NodeTransform, TransformContext, Walker,
};
use crate::transforms::hoist_static::text_constant_type;
use crate::transforms::transform_expression::process_expression;
use crate::transforms::v_slot::{build_slots, client_slot_fn};
use crate::utils::{create_vnode_call, find_prop, is_static_arg_of, to_valid_asset_id};

/// Lowers elements and components on exit
pub struct TransformElement;

impl<'a> NodeTransform<'a> for TransformElement {
    fn enter(
        &self,
        cursor: &mut NodeCursor<'_, 'a>,
        _ctx: &mut TransformContext<'a>,
        _walker: &Walker<'_>,
    ) -> Option<ExitFn<'a>> {
        let TemplateChildNode::Element(el) = cursor.node() else {
            return None;
        };
        if !matches!(el.tag_type, ElementType::Element | ElementType::Component) {
            return None;
        }
        Some(std::boxed::Box::new(|node, ctx| {
            if let TemplateChildNode::Element(el) = node {
                let codegen = build_element_codegen(el, ctx);
                el.codegen_node = Some(codegen);
            }
        }))
    }
}

fn build_element_codegen<'a>(el: &mut ElementNode<'a>, ctx: &mut TransformContext<'a>) -> JsNode {
    let is_component = el.tag_type == ElementType::Component;
    let vnode_tag = if is_component {
        resolve_component_type(el, ctx, false)
    } else {
        JsNode::raw(format!("\"{}\"", el.tag))
    };
    let is_dynamic_component = matches!(
        &vnode_tag,
        JsNode::Call(call) if call.callee == Callee::Helper(RuntimeHelper::ResolveDynamicComponent)
    );
    let is_helper = |h: RuntimeHelper| matches!(&vnode_tag, JsNode::Helper(t) if *t == h);

    let mut should_use_block = is_dynamic_component
        || is_helper(RuntimeHelper::Teleport)
        || is_helper(RuntimeHelper::Suspense)
        || (!is_component && matches!(el.tag.as_str(), "svg" | "foreignObject" | "math"));

    let mut patch_flag = PatchFlags::empty();
    let mut vnode_props = None;
    let mut dynamic_prop_names = std::vec::Vec::new();
    let mut vnode_directives = None;

    if !el.props.is_empty() {
        let props: std::vec::Vec<&PropNode<'a>> = el.props.iter().collect();
        let result = build_props(el, ctx, &props, is_component, is_dynamic_component, false);
        vnode_props = result.props;
        patch_flag = result.patch_flag;
        dynamic_prop_names = result.dynamic_prop_names;
        if !result.directives.is_empty() {
            let elements = result
                .directives
                .iter()
                .map(|d| JsNode::Array(build_directive_args(d.dir, d.runtime, ctx)))
                .collect();
            vnode_directives = Some(tessera_ast::ArrayExpression {
                elements,
                loc: SourceLocation::STUB,
            });
        }
        should_use_block |= result.should_use_block;
    }

    let mut vnode_children = None;
    if !el.children.is_empty() {
        if is_helper(RuntimeHelper::KeepAlive) {
            should_use_block = true;
            patch_flag |= PatchFlags::DYNAMIC_SLOTS;
            if el.children.len() > 1 {
                let first = el.children[0].loc().start;
                let last = el.children[el.children.len() - 1].loc().end;
                ctx.report(
                    ErrorCode::KeepAliveInvalidChildren,
                    &SourceLocation::new(first, last, ""),
                );
            }
        }

        let build_as_slots = is_component
            && !is_helper(RuntimeHelper::Teleport)
            && !is_helper(RuntimeHelper::KeepAlive);
        if build_as_slots {
            let (slots, has_dynamic_slots) = build_slots(el, ctx, client_slot_fn);
            vnode_children = Some(slots);
            if has_dynamic_slots {
                patch_flag |= PatchFlags::DYNAMIC_SLOTS;
            }
        } else if el.children.len() == 1 && !is_helper(RuntimeHelper::Teleport) {
            let child = &el.children[0];
            let has_dynamic_text_child = matches!(
                child,
                TemplateChildNode::Interpolation(_) | TemplateChildNode::Compound(_)
            );
            if has_dynamic_text_child && text_constant_type(child) == ConstantType::NotConstant {
                patch_flag |= PatchFlags::TEXT;
            }
            vnode_children = Some(
                if has_dynamic_text_child || matches!(child, TemplateChildNode::Text(_)) {
                    crate::utils::child_ref(child)
                } else {
                    JsNode::Children(el.id)
                },
            );
        } else {
            vnode_children = Some(JsNode::Children(el.id));
        }
    }

    let (vnode_patch_flag, vnode_dynamic_props) = if patch_flag.is_empty() {
        (None, None)
    } else {
        let dynamic = (!dynamic_prop_names.is_empty())
            .then(|| JsNode::raw(stringify_dynamic_prop_names(&dynamic_prop_names)));
        (Some(patch_flag), dynamic)
    };

    create_vnode_call(
        ctx,
        vnode_tag,
        vnode_props,
        vnode_children,
        vnode_patch_flag,
        vnode_dynamic_props,
        vnode_directives,
        should_use_block,
        false,
        is_component,
        el.loc.clone(),
    )
}

fn stringify_dynamic_prop_names(names: &[String]) -> std::string::String {
    let quoted: std::vec::Vec<_> = names
        .iter()
        .map(|n| tessera_arena::to_js_string_literal(n).to_string())
        .collect();
    format!("[{}]", quoted.join(", "))
}

fn is_component_tag(tag: &str) -> bool {
    tag == "component" || tag == "Component"
}

// ============================================================================
// Component resolution
// ============================================================================

/// Resolve a component tag to the expression used as the vnode type.
pub fn resolve_component_type(
    el: &ElementNode<'_>,
    ctx: &mut TransformContext<'_>,
    ssr: bool,
) -> JsNode {
    let mut tag: std::string::String = el.tag.to_string();

    // 1. dynamic component
    if let Some(is_prop) = find_prop(el, "is", false, true) {
        if is_component_tag(&tag) {
            let exp = match is_prop {
                PropNode::Attribute(attr) => attr.value.as_ref().map(|v| {
                    ExpressionNode::Simple(SimpleExpressionNode::new(
                        v.content.clone(),
                        true,
                        v.loc.clone(),
                    ))
                }),
                PropNode::Directive(dir) => Some(match &dir.exp {
                    Some(exp) => exp.clone(),
                    None => {
                        let exp = SimpleExpressionNode::new("is", false, dir.loc.clone());
                        process_expression(&exp, ctx, false, false)
                    }
                }),
            };
            if let Some(exp) = exp {
                let helper = ctx.helper(RuntimeHelper::ResolveDynamicComponent);
                return create_helper_call(helper, vec![JsNode::expression(exp)]);
            }
        } else if let PropNode::Attribute(attr) = is_prop {
            if let Some(rest) = attr.value.as_ref().and_then(|v| v.content.strip_prefix("vue:")) {
                tag = rest.to_string();
            }
        }
    }

    // 2. built-in components
    let built_in = RuntimeHelper::from_builtin_component(&tag)
        .or_else(|| ctx.options.is_built_in_component.and_then(|f| f(&tag)));
    if let Some(helper) = built_in {
        if !ssr {
            ctx.helper(helper);
        }
        return JsNode::Helper(helper);
    }

    // 3. setup bindings
    if let Some(reference) = resolve_setup_reference(&tag, ctx) {
        return JsNode::raw(reference);
    }
    if let Some(dot) = tag.find('.').filter(|&i| i > 0) {
        if let Some(ns) = resolve_setup_reference(&tag[..dot], ctx) {
            return JsNode::raw(format!("{}{}", ns, &tag[dot..]));
        }
    }

    // 4. self reference
    ctx.helper(RuntimeHelper::ResolveComponent);
    if ctx
        .self_name
        .as_deref()
        .is_some_and(|name| capitalize(&camelize(&tag)) == name)
    {
        ctx.add_component(&format!("{}__self", tag));
        return JsNode::raw(to_valid_asset_id(&tag, "component"));
    }

    // 5. resolved at runtime
    ctx.add_component(&tag);
    JsNode::raw(to_valid_asset_id(&tag, "component"))
}

/// Access path for a component or directive exposed by `<script setup>`.
pub fn resolve_setup_reference(name: &str, ctx: &mut TransformContext<'_>) -> Option<std::string::String> {
    let meta = ctx.options.binding_metadata.as_ref()?;
    if !meta.is_script_setup {
        return None;
    }
    let camel_name = camelize(name).to_string();
    let pascal_name = capitalize(&camel_name).to_string();
    let check = |ty: BindingType| -> Option<std::string::String> {
        [name, camel_name.as_str(), pascal_name.as_str()]
            .into_iter()
            .find(|n| meta.get(n) == Some(ty))
            .map(|n| n.to_string())
    };
    let inline = ctx.options.inline;

    let from_const = check(BindingType::SetupConst)
        .or_else(|| check(BindingType::SetupReactiveConst))
        .or_else(|| check(BindingType::LiteralConst));
    if let Some(found) = from_const {
        return Some(if inline {
            found
        } else {
            format!("$setup[{}]", tessera_arena::to_js_string_literal(&found))
        });
    }

    let from_maybe_ref = check(BindingType::SetupLet)
        .or_else(|| check(BindingType::SetupRef))
        .or_else(|| check(BindingType::SetupMaybeRef));
    if let Some(found) = from_maybe_ref {
        return Some(if inline {
            format!("{}({})", ctx.helper_string(RuntimeHelper::Unref), found)
        } else {
            format!("$setup[{}]", tessera_arena::to_js_string_literal(&found))
        });
    }

    let from_props = check(BindingType::Props)?;
    let unref = ctx.helper_string(RuntimeHelper::Unref);
    Some(format!(
        "{}({}[{}])",
        unref,
        if inline { "__props" } else { "$props" },
        tessera_arena::to_js_string_literal(&from_props)
    ))
}

// ============================================================================
// Props
// ============================================================================

/// A directive that needs runtime support (`withDirectives`)
pub struct RuntimeDirective<'p, 'a> {
    pub dir: &'p DirectiveNode<'a>,
    /// Known runtime directive, or `None` to resolve by name
    pub runtime: Option<RuntimeHelper>,
}

/// Output of [`build_props`]
pub struct PropsBuildResult<'p, 'a> {
    pub props: Option<JsNode>,
    pub directives: std::vec::Vec<RuntimeDirective<'p, 'a>>,
    pub patch_flag: PatchFlags,
    pub dynamic_prop_names: std::vec::Vec<String>,
    pub should_use_block: bool,
}

fn is_on(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() > 2 && bytes.starts_with(b"on") && !bytes[2].is_ascii_lowercase()
}

fn is_reserved_prop(name: &str) -> bool {
    matches!(
        name,
        "" | "key"
            | "ref"
            | "ref_for"
            | "ref_key"
            | "onVnodeBeforeMount"
            | "onVnodeMounted"
            | "onVnodeBeforeUpdate"
            | "onVnodeUpdated"
            | "onVnodeBeforeUnmount"
            | "onVnodeUnmounted"
    )
}

pub fn is_built_in_directive(name: &str) -> bool {
    matches!(
        name,
        "bind"
            | "cloak"
            | "else-if"
            | "else"
            | "for"
            | "html"
            | "if"
            | "model"
            | "on"
            | "once"
            | "pre"
            | "show"
            | "slot"
            | "text"
            | "memo"
    )
}

fn value_constant_type(value: &JsNode) -> Option<ConstantType> {
    match value {
        JsNode::Simple(s) => Some(s.const_type),
        JsNode::Compound(c) => Some(c.const_type()),
        _ => None,
    }
}

#[derive(Default)]
struct FlagAnalysis {
    has_ref: bool,
    has_class_binding: bool,
    has_style_binding: bool,
    has_hydration_event_binding: bool,
    has_dynamic_keys: bool,
    has_vnode_hook: bool,
    dynamic_prop_names: std::vec::Vec<String>,
}

impl FlagAnalysis {
    fn push_name(&mut self, name: &str) {
        if !self.dynamic_prop_names.iter().any(|n| n == name) {
            self.dynamic_prop_names.push(String::from(name));
        }
    }

    fn analyze(&mut self, prop: &Property, is_component: bool, is_dynamic_component: bool) {
        let Some(name) = prop.static_key() else {
            self.has_dynamic_keys = true;
            return;
        };
        let is_event_handler = is_on(name);
        if is_event_handler
            && (!is_component || is_dynamic_component)
            && name.to_ascii_lowercase() != "onclick"
            && name != "onUpdate:modelValue"
            && !is_reserved_prop(name)
        {
            self.has_hydration_event_binding = true;
        }
        if is_event_handler && is_reserved_prop(name) {
            self.has_vnode_hook = true;
        }

        let mut value = &prop.value;
        // handler wrapped by a runtime helper such as withModifiers(fn)
        if is_event_handler {
            if let JsNode::Call(call) = value {
                if let Some(first) = call.arguments.first() {
                    value = first;
                }
            }
        }
        if matches!(value, JsNode::Cache(_))
            || value_constant_type(value).is_some_and(|t| t > ConstantType::NotConstant)
        {
            return;
        }

        match name {
            "ref" => self.has_ref = true,
            "class" => self.has_class_binding = true,
            "style" => self.has_style_binding = true,
            "key" => {}
            _ => self.push_name(name),
        }
        if is_component && (name == "class" || name == "style") {
            self.push_name(name);
        }
    }
}

fn dedupe_properties(properties: std::vec::Vec<Property>) -> std::vec::Vec<Property> {
    let mut deduped: std::vec::Vec<Property> = std::vec::Vec::with_capacity(properties.len());
    for prop in properties {
        let Some(name) = prop.static_key().map(String::from) else {
            deduped.push(prop);
            continue;
        };
        match deduped.iter_mut().find(|p| p.static_key() == Some(name.as_str())) {
            Some(existing) => {
                if name == "style" || name == "class" || is_on(&name) {
                    merge_as_array(existing, prop);
                }
            }
            None => deduped.push(prop),
        }
    }
    deduped
}

fn merge_as_array(existing: &mut Property, incoming: Property) {
    if let JsNode::Array(array) = &mut existing.value {
        array.elements.push(incoming.value);
    } else {
        let value = std::mem::replace(&mut existing.value, JsNode::raw(""));
        existing.value = create_array_expression(vec![value, incoming.value], existing.loc.clone());
    }
}

fn static_prop(name: &str, loc: SourceLocation) -> ExpressionNode {
    ExpressionNode::Simple(SimpleExpressionNode::new(name, true, loc))
}

/// Build the props expression of an element from a subset of its props.
///
/// With `ssr` the event listeners are dropped and props are left
/// unnormalized for the server renderer.
pub fn build_props<'p, 'a>(
    el: &'p ElementNode<'a>,
    ctx: &mut TransformContext<'a>,
    props: &[&'p PropNode<'a>],
    is_component: bool,
    is_dynamic_component: bool,
    ssr: bool,
) -> PropsBuildResult<'p, 'a> {
    let element_loc = el.loc.clone();
    let has_children = !el.children.is_empty();
    let mut properties: std::vec::Vec<Property> = std::vec::Vec::new();
    let mut merge_args: std::vec::Vec<JsNode> = std::vec::Vec::new();
    let mut runtime_directives: std::vec::Vec<RuntimeDirective<'p, 'a>> = std::vec::Vec::new();
    let mut should_use_block = false;
    let mut patch_flag = PatchFlags::empty();
    let mut flags = FlagAnalysis::default();

    let push_merge_arg = |properties: &mut std::vec::Vec<Property>,
                          merge_args: &mut std::vec::Vec<JsNode>,
                          arg: Option<JsNode>| {
        if !properties.is_empty() {
            let props = dedupe_properties(std::mem::take(properties));
            merge_args.push(create_object_expression(props, element_loc.clone()));
        }
        merge_args.extend(arg);
    };
    let in_v_for = ctx.scopes.v_for > 0;
    let push_ref_for_marker = |properties: &mut std::vec::Vec<Property>| {
        if in_v_for {
            properties.push(create_object_property("ref_for", JsNode::raw("true")));
        }
    };

    for prop in props.iter().copied() {
        match prop {
            PropNode::Attribute(attr) => {
                let mut is_static = true;
                if attr.name == "ref" {
                    flags.has_ref = true;
                    push_ref_for_marker(&mut properties);
                    if let (Some(value), true) = (&attr.value, ctx.options.inline) {
                        let binding = ctx
                            .options
                            .binding_metadata
                            .as_ref()
                            .and_then(|m| m.get(&value.content));
                        if matches!(
                            binding,
                            Some(BindingType::SetupLet | BindingType::SetupRef | BindingType::SetupMaybeRef)
                        ) {
                            is_static = false;
                            properties.push(Property {
                                key: static_prop("ref_key", SourceLocation::STUB),
                                value: JsNode::Simple(SimpleExpressionNode::new(
                                    value.content.clone(),
                                    true,
                                    value.loc.clone(),
                                )),
                                loc: SourceLocation::STUB,
                            });
                        }
                    }
                }
                if attr.name == "is"
                    && (is_component_tag(&el.tag)
                        || attr.value.as_ref().is_some_and(|v| v.content.starts_with("vue:")))
                {
                    continue;
                }
                let (content, loc) = match &attr.value {
                    Some(v) => (v.content.clone(), v.loc.clone()),
                    None => (String::default(), attr.loc.clone()),
                };
                properties.push(Property {
                    key: static_prop(&attr.name, attr.name_loc.clone()),
                    value: JsNode::Simple(SimpleExpressionNode::new(content, is_static, loc)),
                    loc: attr.loc.clone(),
                });
            }
            PropNode::Directive(dir) => {
                let dir: &'p DirectiveNode<'a> = dir;
                let name = dir.name.as_str();
                let is_v_bind = name == "bind";
                let is_v_on = name == "on";

                if name == "slot" {
                    if !is_component {
                        ctx.report(ErrorCode::VSlotMisplaced, &dir.loc);
                    }
                    continue;
                }
                if name == "once" || name == "memo" {
                    continue;
                }
                if name == "is"
                    || (is_v_bind && is_static_arg_of(dir.arg.as_ref(), "is") && is_component_tag(&el.tag))
                {
                    continue;
                }
                if is_v_on && ssr {
                    continue;
                }

                if (is_v_bind && is_static_arg_of(dir.arg.as_ref(), "key"))
                    || (is_v_on && has_children && is_static_arg_of(dir.arg.as_ref(), "vue:before-update"))
                {
                    should_use_block = true;
                }
                if is_v_bind && is_static_arg_of(dir.arg.as_ref(), "ref") {
                    push_ref_for_marker(&mut properties);
                }

                if dir.arg.is_none() && (is_v_bind || is_v_on) {
                    flags.has_dynamic_keys = true;
                    match &dir.exp {
                        Some(exp) if is_v_bind => {
                            push_ref_for_marker(&mut properties);
                            push_merge_arg(&mut properties, &mut merge_args, None);
                            merge_args.push(JsNode::expression(exp.clone()));
                        }
                        Some(exp) => {
                            let mut args = vec![JsNode::expression(exp.clone())];
                            if !is_component {
                                args.push(JsNode::raw("true"));
                            }
                            let helper = ctx.helper(RuntimeHelper::ToHandlers);
                            let call =
                                create_call_expression(Callee::Helper(helper), args, dir.loc.clone());
                            push_merge_arg(&mut properties, &mut merge_args, Some(call));
                        }
                        None => {
                            let code = if is_v_bind {
                                ErrorCode::VBindNoExpression
                            } else {
                                ErrorCode::VOnNoExpression
                            };
                            ctx.report(code, &dir.loc);
                        }
                    }
                    continue;
                }

                if is_v_bind && dir.has_modifier("prop") {
                    patch_flag |= PatchFlags::NEED_HYDRATION;
                }

                if let Some(transform) = ctx.directive_transform(name) {
                    let result = transform.apply(dir, el, ctx);
                    if !ssr {
                        for p in &result.props {
                            flags.analyze(p, is_component, is_dynamic_component);
                        }
                    }
                    let dynamic_event = is_v_on && dir.arg.as_ref().is_some_and(|a| !a.is_static());
                    if dynamic_event {
                        push_merge_arg(
                            &mut properties,
                            &mut merge_args,
                            Some(create_object_expression(result.props, element_loc.clone())),
                        );
                    } else {
                        properties.extend(result.props);
                    }
                    if let Some(need) = result.need_runtime {
                        runtime_directives.push(RuntimeDirective {
                            dir,
                            runtime: match need {
                                NeedRuntime::Helper(h) => Some(h),
                                NeedRuntime::Resolve => None,
                            },
                        });
                    }
                } else if !is_built_in_directive(name) {
                    runtime_directives.push(RuntimeDirective { dir, runtime: None });
                    if has_children {
                        should_use_block = true;
                    }
                }
            }
        }
    }

    let mut props_expression = if !merge_args.is_empty() {
        push_merge_arg(&mut properties, &mut merge_args, None);
        if merge_args.len() > 1 {
            let helper = ctx.helper(RuntimeHelper::MergeProps);
            Some(create_call_expression(Callee::Helper(helper), merge_args, element_loc.clone()))
        } else {
            merge_args.pop()
        }
    } else if !properties.is_empty() {
        Some(create_object_expression(dedupe_properties(properties), element_loc.clone()))
    } else {
        None
    };

    if flags.has_dynamic_keys {
        patch_flag |= PatchFlags::FULL_PROPS;
    } else {
        if flags.has_class_binding && !is_component {
            patch_flag |= PatchFlags::CLASS;
        }
        if flags.has_style_binding && !is_component {
            patch_flag |= PatchFlags::STYLE;
        }
        if !flags.dynamic_prop_names.is_empty() {
            patch_flag |= PatchFlags::PROPS;
        }
        if flags.has_hydration_event_binding {
            patch_flag |= PatchFlags::NEED_HYDRATION;
        }
    }
    if !should_use_block
        && (patch_flag.is_empty() || patch_flag == PatchFlags::NEED_HYDRATION)
        && (flags.has_ref || flags.has_vnode_hook || !runtime_directives.is_empty())
    {
        patch_flag |= PatchFlags::NEED_PATCH;
    }

    if !ctx.options.in_ssr {
        if let Some(expression) = props_expression.take() {
            props_expression = Some(normalize_props(expression, flags.has_style_binding, ctx));
        }
    }

    PropsBuildResult {
        props: props_expression,
        directives: runtime_directives,
        patch_flag,
        dynamic_prop_names: flags.dynamic_prop_names,
        should_use_block,
    }
}

/// Pre-normalize class and style so the runtime can skip it.
fn normalize_props(expression: JsNode, has_style_binding: bool, ctx: &mut TransformContext<'_>) -> JsNode {
    match expression {
        JsNode::Object(mut object) => {
            let mut class_index = None;
            let mut style_index = None;
            let mut has_dynamic_key = false;
            for (i, prop) in object.properties.iter().enumerate() {
                match prop.static_key() {
                    Some("class") => class_index = Some(i),
                    Some("style") => style_index = Some(i),
                    Some(_) => {}
                    None => {
                        let is_handler_key = match &prop.key {
                            ExpressionNode::Simple(s) => s.is_handler_key,
                            ExpressionNode::Compound(c) => c.is_handler_key,
                        };
                        if !is_handler_key {
                            has_dynamic_key = true;
                        }
                    }
                }
            }
            if has_dynamic_key {
                let helper = ctx.helper(RuntimeHelper::NormalizeProps);
                return create_helper_call(helper, vec![JsNode::Object(object)]);
            }
            if let Some(i) = class_index {
                let prop = &mut object.properties[i];
                let is_static = matches!(&prop.value, JsNode::Simple(s) if s.is_static);
                if !is_static {
                    let helper = ctx.helper(RuntimeHelper::NormalizeClass);
                    let value = std::mem::replace(&mut prop.value, JsNode::raw(""));
                    prop.value = create_helper_call(helper, vec![value]);
                }
            }
            if let Some(i) = style_index {
                let prop = &mut object.properties[i];
                let array_literal = matches!(
                    &prop.value,
                    JsNode::Simple(s) if s.content.trim_start().starts_with('[')
                );
                if has_style_binding || array_literal || matches!(prop.value, JsNode::Array(_)) {
                    let helper = ctx.helper(RuntimeHelper::NormalizeStyle);
                    let value = std::mem::replace(&mut prop.value, JsNode::raw(""));
                    prop.value = create_helper_call(helper, vec![value]);
                }
            }
            JsNode::Object(object)
        }
        call @ JsNode::Call(_) => call,
        single => {
            let guard = ctx.helper(RuntimeHelper::GuardReactiveProps);
            let normalize = ctx.helper(RuntimeHelper::NormalizeProps);
            create_helper_call(normalize, vec![create_helper_call(guard, vec![single])])
        }
    }
}

/// `[dir, exp, arg, modifiers]` entry of a `withDirectives` array.
pub fn build_directive_args(
    dir: &DirectiveNode<'_>,
    runtime: Option<RuntimeHelper>,
    ctx: &mut TransformContext<'_>,
) -> tessera_ast::ArrayExpression {
    let mut args = std::vec::Vec::new();
    match runtime {
        Some(helper) => args.push(JsNode::raw(ctx.helper_string(helper))),
        None => match resolve_setup_reference(&format!("v-{}", dir.name), ctx) {
            Some(reference) => args.push(JsNode::raw(reference)),
            None => {
                ctx.helper(RuntimeHelper::ResolveDirective);
                ctx.add_directive(&dir.name);
                args.push(JsNode::raw(to_valid_asset_id(&dir.name, "directive")));
            }
        },
    }
    if let Some(exp) = &dir.exp {
        args.push(JsNode::expression(exp.clone()));
    }
    if let Some(arg) = &dir.arg {
        if dir.exp.is_none() {
            args.push(JsNode::raw("void 0"));
        }
        args.push(JsNode::expression(arg.clone()));
    }
    if !dir.modifiers.is_empty() {
        if dir.arg.is_none() {
            if dir.exp.is_none() {
                args.push(JsNode::raw("void 0"));
            }
            args.push(JsNode::raw("void 0"));
        }
        let modifiers = dir
            .modifiers
            .iter()
            .map(|m| Property {
                key: ExpressionNode::Simple(m.clone()),
                value: JsNode::Simple(SimpleExpressionNode::new("true", false, dir.loc.clone())),
                loc: dir.loc.clone(),
            })
            .collect();
        args.push(create_object_expression(modifiers, dir.loc.clone()));
    }
    tessera_ast::ArrayExpression {
        elements: args,
        loc: dir.loc.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{compile_root, compile_root_with, first_element_props, TemplateGen};
    use tessera_ast::{BindingMetadata, TransformOptions};

    fn root_call<'r>(root: &'r tessera_ast::RootNode<'_>) -> &'r tessera_ast::VNodeCall {
        root.children[0]
            .as_element()
            .and_then(|el| el.codegen_node.as_ref())
            .and_then(|c| c.as_vnode_call())
            .expect("element codegen")
    }

    #[test]
    fn test_static_props_have_no_flag() {
        compile_root(r#"<div id="foo" class="bar"/>"#, |root, errors| {
            assert!(errors.is_empty());
            let call = root_call(root);
            assert!(call.patch_flag.is_none());
            assert!(matches!(call.tag, JsNode::Raw(ref t) if t == "\"div\""));
        });
    }

    #[test]
    fn test_dynamic_prop_flags() {
        compile_root(r#"<div :id="id" :class="cls" :style="s"/>"#, |root, _| {
            let call = root_call(root);
            assert_eq!(
                call.patch_flag,
                Some(PatchFlags::CLASS | PatchFlags::STYLE | PatchFlags::PROPS)
            );
            assert!(matches!(&call.dynamic_props, Some(JsNode::Raw(r)) if r == "[\"id\"]"));
        });
    }

    #[test]
    fn test_object_spread_is_full_props() {
        compile_root(r#"<div id="a" v-bind="obj" class="b"/>"#, |root, _| {
            let call = root_call(root);
            assert_eq!(call.patch_flag, Some(PatchFlags::FULL_PROPS));
            let Some(JsNode::Call(merge)) = &call.props else {
                panic!("expected mergeProps");
            };
            assert_eq!(merge.callee, Callee::Helper(RuntimeHelper::MergeProps));
            assert_eq!(merge.arguments.len(), 3);
        });
    }

    #[test]
    fn test_single_spread_is_guarded() {
        compile_root(r#"<div v-bind="obj"/>"#, |root, _| {
            let Some(JsNode::Call(call)) = &root_call(root).props else {
                panic!("expected normalizeProps");
            };
            assert_eq!(call.callee, Callee::Helper(RuntimeHelper::NormalizeProps));
        });
    }

    #[test]
    fn test_duplicate_class_is_merged() {
        first_element_props(
            r#"<div class="a" :class="b"/>"#,
            TransformOptions::default(),
            |props| {
                assert_eq!(props.len(), 1);
                let JsNode::Call(call) = &props[0].value else {
                    panic!("expected normalizeClass");
                };
                assert!(matches!(&call.arguments[0], JsNode::Array(a) if a.elements.len() == 2));
            },
        );
    }

    #[test]
    fn test_text_child_flag() {
        compile_root(r#"<div>{{ msg }}</div>"#, |root, _| {
            let call = root_call(root);
            assert_eq!(call.patch_flag, Some(PatchFlags::TEXT));
            assert!(matches!(call.children, Some(JsNode::Interpolation(_))));
        });
    }

    #[test]
    fn test_user_component_and_custom_directive() {
        compile_root(r#"<MyComp v-focus/>"#, |root, _| {
            let call = root_call(root);
            assert!(call.is_component);
            assert!(matches!(&call.tag, JsNode::Raw(t) if t == "_component_MyComp"));
            assert_eq!(call.patch_flag, Some(PatchFlags::NEED_PATCH));
            assert!(call.directives.is_some());
            assert_eq!(root.components, vec!["MyComp"]);
            assert_eq!(root.directives, vec!["focus"]);
        });
    }

    #[test]
    fn test_dynamic_component() {
        compile_root(r#"<component :is="view"/>"#, |root, _| {
            let call = root_call(root);
            assert!(call.is_block);
            assert!(matches!(
                &call.tag,
                JsNode::Call(c) if c.callee == Callee::Helper(RuntimeHelper::ResolveDynamicComponent)
            ));
            assert!(call.props.is_none());
        });
    }

    #[test]
    fn test_builtin_and_self_reference() {
        compile_root(r#"<keep-alive><div/></keep-alive>"#, |root, _| {
            let call = root_call(root);
            assert!(matches!(call.tag, JsNode::Helper(RuntimeHelper::KeepAlive)));
            assert!(call.patch_flag.unwrap().contains(PatchFlags::DYNAMIC_SLOTS));
        });
        let options = TransformOptions {
            filename: "FooBar.vue".into(),
            ..Default::default()
        };
        compile_root_with(r#"<FooBar/>"#, options, |root, _| {
            assert_eq!(root.components, vec!["FooBar__self"]);
        });
    }

    #[test]
    fn test_setup_reference() {
        let mut meta = BindingMetadata {
            is_script_setup: true,
            ..Default::default()
        };
        meta.bindings.insert("Foo".into(), BindingType::SetupConst);
        let options = TransformOptions {
            binding_metadata: Some(meta),
            ..Default::default()
        };
        compile_root_with(r#"<Foo/>"#, options, |root, _| {
            let call = root_call(root);
            assert!(matches!(&call.tag, JsNode::Raw(t) if t == "$setup[\"Foo\"]"));
            assert!(root.components.is_empty());
        });
    }

    #[test]
    fn test_ref_in_v_for() {
        compile_root(r#"<div v-for="i in list" ref="item"/>"#, |root, _| {
            let TemplateChildNode::For(for_node) = &root.children[0] else {
                panic!("expected for");
            };
            let el = for_node.children[0].as_element().unwrap();
            let call = el.codegen_node.as_ref().unwrap().as_vnode_call().unwrap();
            let Some(JsNode::Object(obj)) = &call.props else {
                panic!("expected object props");
            };
            assert!(obj.find("ref_for").is_some());
        });
    }

    /// Elements the template generator emits with random attributes.
    fn generated_elements<'r, 'a>(
        children: &'r [TemplateChildNode<'a>],
        out: &mut std::vec::Vec<&'r ElementNode<'a>>,
    ) {
        for child in children {
            match child {
                TemplateChildNode::Element(el) => {
                    if TemplateGen::TAGS.contains(&el.tag.as_str()) {
                        out.push(&**el);
                    }
                    generated_elements(&el.children, out);
                }
                TemplateChildNode::If(if_node) => {
                    for branch in if_node.branches.iter() {
                        generated_elements(&branch.children, out);
                    }
                }
                TemplateChildNode::For(for_node) => generated_elements(&for_node.children, out),
                _ => {}
            }
        }
    }

    #[test]
    fn test_patch_flags_follow_dynamic_bindings() {
        let options = TransformOptions {
            prefix_identifiers: true,
            ..Default::default()
        };
        for seed in 0..200 {
            let source = TemplateGen::new(seed).template();
            compile_root_with(&source, options.clone(), |root, errors| {
                assert!(errors.is_empty(), "{:?} in {}", errors, source);
                let mut elements = std::vec::Vec::new();
                generated_elements(&root.children, &mut elements);
                for el in elements {
                    let text = el.loc.source.as_str();
                    let open_end = text.find('>').expect("start tag");
                    let open = &text[..open_end];
                    let inner = &text[open_end + 1..text.rfind("</").expect("end tag")];

                    let mut expected = PatchFlags::empty();
                    if open.contains(r#":class="dyn""#) {
                        expected |= PatchFlags::CLASS;
                    }
                    if open.contains(r#":style="dyn""#) {
                        expected |= PatchFlags::STYLE;
                    }
                    if open.contains(r#":id="dyn""#) || open.contains(r#"@click="go""#) {
                        expected |= PatchFlags::PROPS;
                    }
                    if !inner.contains('<') && inner.contains("{{ dyn }}") {
                        expected |= PatchFlags::TEXT;
                    }

                    let call = el
                        .codegen_node
                        .as_ref()
                        .and_then(JsNode::as_vnode_call)
                        .expect("element codegen");
                    let flag = call.patch_flag.unwrap_or_else(PatchFlags::empty);
                    assert!(!flag.is_sentinel(), "{} in {}", text, source);
                    assert_eq!(flag, expected, "{} in {}", text, source);
                }
            });
        }
    }
}
