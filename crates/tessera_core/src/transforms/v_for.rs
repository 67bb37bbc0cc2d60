//! v-for transform.
//!
//! The loop expression is split by a small fixed grammar
//! (`value, key, index in source`); only the alias positions go through
//! the expression rewriter as parameter lists. The element is replaced by
//! a [`ForNode`] whose codegen is a fragment block over `renderList`.

use once_cell::sync::Lazy;
use regex::Regex;
use tessera_arena::{Box, PatchFlags};
use tessera_ast::{
    create_block_statement, create_function_expression, create_helper_call,
    create_object_expression, create_object_property, Callee, CompoundExpressionNode,
    CompoundPart, ConstantType, DirectiveNode, ElementType, ErrorCode, ExpressionNode, ForNode,
    ForParseResult, JsNode, PropNode, Property, RuntimeHelper, SimpleExpressionNode,
    SourceLocation, TemplateChildNode,
};
use tessera_parser::cursor::advance_position;

use crate::transform::{
    ExitFn, NodeCursor, StructuralDirectiveTransform, TransformContext, Walker,
};
use crate::transforms::transform_expression::process_expression;
use crate::transforms::v_bind::transform_bind_shorthand;
use crate::utils::{
    create_vnode_call, find_dir, find_prop, inject_codegen_prop, vnode_block_helper, vnode_helper,
};

// ============================================================================
// Loop expression grammar
// ============================================================================

static FOR_ALIAS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\s\S]*?)\s+(?:in|of)\s+(\S[\s\S]*)").expect("valid regex"));
static FOR_ITERATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",([^,\}\]]*)(?:,([^,\}\]]*))?$").expect("valid regex"));

fn strip_parens(s: &str) -> &str {
    let s = s.strip_prefix('(').unwrap_or(s);
    s.strip_suffix(')').unwrap_or(s)
}

/// Split a `v-for` expression into source and aliases.
///
/// Returns `None` when there is no `in` / `of` separator.
pub fn parse_for_expression(input: &SimpleExpressionNode) -> Option<ForParseResult> {
    let exp = input.content.as_str();
    let caps = FOR_ALIAS_RE.captures(exp)?;
    let lhs = caps.get(1)?;
    let rhs = caps.get(2)?;

    let alias = |content: &str, offset: usize| -> ExpressionNode {
        let start = advance_position(input.loc.start, exp, offset);
        let end = advance_position(input.loc.start, exp, offset + content.len());
        ExpressionNode::Simple(SimpleExpressionNode::new(
            content,
            false,
            SourceLocation::new(start, end, content),
        ))
    };

    let rhs_trimmed = rhs.as_str().trim();
    let rhs_offset = rhs.start() + (rhs.as_str().len() - rhs.as_str().trim_start().len());
    let mut result = ForParseResult {
        source: alias(rhs_trimmed, rhs_offset),
        value: None,
        key: None,
        index: None,
        finalized: false,
    };

    let lhs_str = lhs.as_str();
    let mut value_content = strip_parens(lhs_str.trim()).trim().to_string();
    let trimmed_offset = lhs_str.find(value_content.as_str()).unwrap_or(0);

    if let Some(iter) = FOR_ITERATOR_RE.captures(&value_content.clone()) {
        let iter_start = iter.get(0).map(|m| m.start()).unwrap_or(value_content.len());
        value_content = value_content[..iter_start].trim().to_string();

        let key_content = iter.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        let mut key_offset = 0;
        if !key_content.is_empty() {
            let from = trimmed_offset + value_content.len();
            key_offset = exp[from..].find(key_content).map(|i| i + from).unwrap_or(from);
            result.key = Some(alias(key_content, key_offset));
        }
        if let Some(index) = iter.get(2) {
            let index_content = index.as_str().trim();
            if !index_content.is_empty() {
                let from = if result.key.is_some() {
                    key_offset + key_content.len()
                } else {
                    trimmed_offset + value_content.len()
                };
                let index_offset = exp[from..].find(index_content).map(|i| i + from).unwrap_or(from);
                result.index = Some(alias(index_content, index_offset));
            }
        }
    }

    if !value_content.is_empty() {
        result.value = Some(alias(&value_content, trimmed_offset));
    }
    Some(result)
}

/// Run the alias and source expressions through the rewriter once.
pub fn finalize_for_parse_result(result: &mut ForParseResult, ctx: &mut TransformContext<'_>) {
    if result.finalized {
        return;
    }
    if ctx.prefix_identifiers() {
        if let ExpressionNode::Simple(source) = &result.source {
            result.source = process_expression(source, ctx, false, false);
        }
        for alias in [&mut result.key, &mut result.index, &mut result.value] {
            if let Some(ExpressionNode::Simple(exp)) = alias.as_ref() {
                *alias = Some(process_expression(exp, ctx, true, false));
            }
        }
    }
    result.finalized = true;
}

/// `(value, key, index, ...extra)` with holes filled by `_`, `__` ...
pub fn create_for_loop_params(result: &ForParseResult, extra: &[&str]) -> std::vec::Vec<JsNode> {
    let mut params: std::vec::Vec<Option<JsNode>> = vec![
        result.value.clone().map(JsNode::expression),
        result.key.clone().map(JsNode::expression),
        result.index.clone().map(JsNode::expression),
    ];
    params.extend(extra.iter().map(|e| Some(JsNode::raw(*e))));
    while matches!(params.last(), Some(None)) {
        params.pop();
    }
    params
        .into_iter()
        .enumerate()
        .map(|(i, p)| p.unwrap_or_else(|| JsNode::raw("_".repeat(i + 1))))
        .collect()
}

// ============================================================================
// Transform
// ============================================================================

/// Client `v-for` transform
pub fn transform_for() -> StructuralDirectiveTransform {
    StructuralDirectiveTransform::new(|name| name == "for", process_for_with_codegen)
}

/// `v-for` transform without client codegen, for the server backend
pub fn transform_for_ssr() -> StructuralDirectiveTransform {
    StructuralDirectiveTransform::new(|name| name == "for", process_for_plain)
}

fn process_for_with_codegen<'c, 'a>(
    cursor: &mut NodeCursor<'c, 'a>,
    dir: Box<'a, DirectiveNode<'a>>,
    ctx: &mut TransformContext<'a>,
    _walker: &Walker<'_>,
) -> Option<ExitFn<'a>> {
    process_for(cursor, dir, ctx, true)
}

fn process_for_plain<'c, 'a>(
    cursor: &mut NodeCursor<'c, 'a>,
    dir: Box<'a, DirectiveNode<'a>>,
    ctx: &mut TransformContext<'a>,
    _walker: &Walker<'_>,
) -> Option<ExitFn<'a>> {
    process_for(cursor, dir, ctx, false)
}

/// What the codegen exit needs to know about the replaced element
struct LoopInfo {
    is_template: bool,
    memo: Option<ExpressionNode>,
    has_key: bool,
    key_exp: Option<ExpressionNode>,
}

/// Replace the element by a [`ForNode`] and bind its aliases for the body.
pub fn process_for<'a>(
    cursor: &mut NodeCursor<'_, 'a>,
    dir: Box<'a, DirectiveNode<'a>>,
    ctx: &mut TransformContext<'a>,
    with_codegen: bool,
) -> Option<ExitFn<'a>> {
    let Some(ExpressionNode::Simple(exp)) = dir.exp.as_ref().filter(|_| !dir.exp_is_empty()) else {
        ctx.report(ErrorCode::VForNoExpression, &dir.loc);
        return None;
    };
    let parsed = dir.for_parse_result.clone().or_else(|| parse_for_expression(exp));
    let Some(mut parse_result) = parsed else {
        ctx.report(ErrorCode::VForMalformedExpression, &exp.loc);
        return None;
    };
    finalize_for_parse_result(&mut parse_result, ctx);

    let id = ctx.alloc_id();
    let allocator = ctx.allocator;
    let loc = dir.loc.clone();
    let mut info = LoopInfo {
        is_template: false,
        memo: None,
        has_key: false,
        key_exp: None,
    };
    let result = parse_result.clone();
    cursor.replace(|node| {
        let mut children = tessera_arena::Vec::new_in(allocator);
        match node {
            TemplateChildNode::Element(mut el) if el.tag_type == ElementType::Template => {
                info.is_template = true;
                info.memo = find_dir(&el, "memo", false).and_then(|d| d.exp.clone());
                std::mem::swap(&mut children, &mut el.children);
                info.has_key = find_prop(&el, "key", false, true).is_some();
                info.key_exp = take_key_exp(&mut el.props);
            }
            TemplateChildNode::Element(el) => {
                info.memo = find_dir(&el, "memo", false).and_then(|d| d.exp.clone());
                info.has_key = find_prop(&el, "key", false, true).is_some();
                children.push(TemplateChildNode::Element(el));
            }
            other => children.push(other),
        }
        TemplateChildNode::For(Box::new_in(
            ForNode {
                id,
                source: result.source.clone(),
                value_alias: result.value.clone(),
                key_alias: result.key.clone(),
                object_index_alias: result.index.clone(),
                parse_result: result,
                children,
                loc,
                codegen_node: None,
            },
            allocator,
        ))
    });

    ctx.scopes.v_for += 1;
    if ctx.prefix_identifiers() {
        for alias in [&parse_result.value, &parse_result.key, &parse_result.index]
            .into_iter()
            .flatten()
        {
            ctx.add_identifiers(alias);
        }
    }

    if with_codegen {
        prepare_loop_codegen(cursor, &mut info, ctx);
    }

    Some(std::boxed::Box::new(move |node, ctx| {
        ctx.scopes.v_for -= 1;
        if ctx.prefix_identifiers() {
            for alias in [&parse_result.value, &parse_result.key, &parse_result.index]
                .into_iter()
                .flatten()
            {
                ctx.remove_identifiers(alias);
            }
        }
        if with_codegen {
            if let TemplateChildNode::For(for_node) = node {
                finish_loop_codegen(for_node, info, ctx);
            }
        }
    }))
}

/// Key expression of a `<template v-for>`, expanding `:key` shorthand.
fn take_key_exp<'a>(props: &mut tessera_arena::Vec<'a, PropNode<'a>>) -> Option<ExpressionNode> {
    props.iter().find_map(|p| match p {
        PropNode::Attribute(attr) if attr.name == "key" => attr.value.as_ref().map(|v| {
            ExpressionNode::Simple(SimpleExpressionNode::new(
                v.content.clone(),
                true,
                v.loc.clone(),
            ))
        }),
        PropNode::Directive(dir) if dir.name == "bind" && dir.static_arg() == Some("key") => {
            dir.exp.clone()
        }
        _ => None,
    })
}

fn key_prop_index(props: &[PropNode<'_>]) -> Option<usize> {
    props.iter().position(|p| match p {
        PropNode::Attribute(attr) => attr.name == "key",
        PropNode::Directive(dir) => dir.name == "bind" && dir.static_arg() == Some("key"),
    })
}

fn prepare_loop_codegen<'a>(
    cursor: &mut NodeCursor<'_, 'a>,
    info: &mut LoopInfo,
    ctx: &mut TransformContext<'a>,
) {
    let TemplateChildNode::For(for_node) = cursor.node_mut() else {
        return;
    };

    if !info.is_template {
        if let Some(TemplateChildNode::Element(el)) = for_node.children.first_mut() {
            if let Some(index) = key_prop_index(&el.props) {
                if let PropNode::Directive(key_dir) = &mut el.props[index] {
                    if key_dir.exp.is_none() {
                        transform_bind_shorthand(key_dir, ctx);
                    }
                    // with v-memo the key is compared inside the loop body
                    if info.memo.is_some() {
                        if let Some(ExpressionNode::Simple(key)) = &key_dir.exp {
                            key_dir.exp = Some(process_expression(key, ctx, false, false));
                        }
                    }
                }
                info.key_exp = take_key_exp(&mut el.props);
            }
        }
    } else {
        if let Some(ExpressionNode::Simple(memo)) = &info.memo {
            info.memo = Some(process_expression(memo, ctx, false, false));
        }
        if let Some(ExpressionNode::Simple(key)) = &info.key_exp {
            if !key.is_static {
                info.key_exp = Some(process_expression(key, ctx, false, false));
            }
        }
    }

    let render_list = ctx.helper(RuntimeHelper::RenderList);
    let is_stable = matches!(
        &for_node.source,
        ExpressionNode::Simple(s) if s.const_type > ConstantType::NotConstant
    );
    let flag = if is_stable {
        PatchFlags::STABLE_FRAGMENT
    } else if info.has_key {
        PatchFlags::KEYED_FRAGMENT
    } else {
        PatchFlags::UNKEYED_FRAGMENT
    };
    let fragment = ctx.helper(RuntimeHelper::Fragment);
    let render_exp = create_helper_call(render_list, vec![JsNode::expression(for_node.source.clone())]);
    for_node.codegen_node = Some(create_vnode_call(
        ctx,
        JsNode::Helper(fragment),
        None,
        Some(render_exp),
        Some(flag),
        None,
        None,
        true,
        !is_stable,
        false,
        for_node.loc.clone(),
    ));
}

fn finish_loop_codegen<'a>(
    for_node: &mut ForNode<'a>,
    info: LoopInfo,
    ctx: &mut TransformContext<'a>,
) {
    let key_property: Option<Property> =
        info.key_exp.clone().map(|exp| create_object_property("key", JsNode::expression(exp)));

    if info.is_template {
        for child in for_node.children.iter() {
            if let TemplateChildNode::Element(el) = child {
                if let Some(key) = find_prop(el, "key", false, false) {
                    ctx.report(ErrorCode::VForTemplateKeyPlacement, key.loc());
                    break;
                }
            }
        }
    }

    let is_stable = for_node
        .codegen_node
        .as_ref()
        .and_then(|c| c.as_vnode_call())
        .is_some_and(|call| !call.disable_tracking);

    let single_slot_outlet = for_node.children.len() == 1
        && matches!(&for_node.children[0], TemplateChildNode::Element(el) if el.is_slot_outlet());
    let single_element = for_node.children.len() == 1
        && matches!(&for_node.children[0], TemplateChildNode::Element(_));

    let child_block = if single_slot_outlet || single_element {
        let TemplateChildNode::Element(el) = &mut for_node.children[0] else {
            return;
        };
        if let Some(codegen) = el.codegen_node.as_mut() {
            if info.is_template {
                if let Some(key) = key_property.clone() {
                    inject_codegen_prop(codegen, key, ctx);
                }
            }
            if !single_slot_outlet {
                if let JsNode::VNodeCall(call) = codegen {
                    let in_ssr = ctx.options.in_ssr;
                    if call.is_block {
                        ctx.remove_helper(RuntimeHelper::OpenBlock);
                        ctx.remove_helper(vnode_block_helper(in_ssr, call.is_component));
                    } else {
                        ctx.remove_helper(vnode_helper(in_ssr, call.is_component));
                    }
                    call.is_block = !is_stable;
                    if call.is_block {
                        ctx.helper(RuntimeHelper::OpenBlock);
                        ctx.helper(vnode_block_helper(in_ssr, call.is_component));
                    } else {
                        ctx.helper(vnode_helper(in_ssr, call.is_component));
                    }
                }
            }
        }
        JsNode::Node(el.id)
    } else {
        let fragment = ctx.helper(RuntimeHelper::Fragment);
        create_vnode_call(
            ctx,
            JsNode::Helper(fragment),
            key_property
                .clone()
                .map(|k| create_object_expression(vec![k], SourceLocation::STUB)),
            Some(JsNode::Children(for_node.id)),
            Some(PatchFlags::STABLE_FRAGMENT),
            None,
            None,
            true,
            false,
            false,
            for_node.loc.clone(),
        )
    };

    let mut loop_args = std::vec::Vec::new();
    if let Some(memo) = info.memo {
        let mut func = create_function_expression(
            create_for_loop_params(&for_node.parse_result, &["_cached"]),
            None,
            false,
            false,
            for_node.loc.clone(),
        );
        let is_memo_same = ctx.helper_string(RuntimeHelper::IsMemoSame);
        let mut check = vec![CompoundPart::Code("if (_cached".into())];
        if let Some(key) = &info.key_exp {
            check.push(CompoundPart::Code(" && _cached.key === ".into()));
            check.push(expression_part(key));
        }
        check.push(CompoundPart::Code(
            format!(" && {}(_cached, _memo)) return _cached", is_memo_same).into(),
        ));
        func.body = Some(JsNode::Block(create_block_statement(vec![
            JsNode::Compound(CompoundExpressionNode::new(
                vec![
                    CompoundPart::Code("const _memo = (".into()),
                    expression_part(&memo),
                    CompoundPart::Code(")".into()),
                ],
                SourceLocation::STUB,
            )),
            JsNode::Compound(CompoundExpressionNode::new(check, SourceLocation::STUB)),
            tessera_ast::create_assignment_expression(JsNode::raw("const _item"), child_block),
            JsNode::raw("_item.memo = _memo"),
            JsNode::raw("return _item"),
        ])));
        let index = ctx.cached;
        ctx.cached += 1;
        loop_args.push(JsNode::Function(std::boxed::Box::new(func)));
        loop_args.push(JsNode::raw("_cache"));
        loop_args.push(JsNode::raw(index.to_string()));
    } else {
        let func = create_function_expression(
            create_for_loop_params(&for_node.parse_result, &[]),
            Some(child_block),
            true,
            false,
            for_node.loc.clone(),
        );
        loop_args.push(JsNode::Function(std::boxed::Box::new(func)));
    }

    if let Some(JsNode::VNodeCall(call)) = for_node.codegen_node.as_mut() {
        if let Some(JsNode::Call(render)) = call.children.as_mut() {
            if render.callee == Callee::Helper(RuntimeHelper::RenderList) {
                render.arguments.extend(loop_args);
            }
        }
    }
}

fn expression_part(exp: &ExpressionNode) -> CompoundPart {
    match exp {
        ExpressionNode::Simple(s) => CompoundPart::Simple(s.clone()),
        ExpressionNode::Compound(c) => CompoundPart::Compound(c.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{compile_root, compile_root_with};
    use tessera_ast::TransformOptions;

    fn parse(source: &str) -> ForParseResult {
        let exp = SimpleExpressionNode::new(source, false, SourceLocation::STUB);
        parse_for_expression(&exp).unwrap()
    }

    fn code(exp: &Option<ExpressionNode>) -> Option<std::string::String> {
        exp.as_ref().map(|e| e.to_code())
    }

    #[test]
    fn test_parse_aliases() {
        let result = parse("(item, key, index) in items");
        assert_eq!(result.source.to_code(), "items");
        assert_eq!(code(&result.value).as_deref(), Some("item"));
        assert_eq!(code(&result.key).as_deref(), Some("key"));
        assert_eq!(code(&result.index).as_deref(), Some("index"));
    }

    #[test]
    fn test_parse_destructured_value() {
        let result = parse("{ id, name } of list");
        assert_eq!(code(&result.value).as_deref(), Some("{ id, name }"));
        assert!(result.key.is_none());
        assert_eq!(result.source.to_code(), "list");
    }

    #[test]
    fn test_parse_skipped_key() {
        let result = parse("(item, , index) in items");
        assert!(result.key.is_none());
        assert_eq!(code(&result.index).as_deref(), Some("index"));
        let params = create_for_loop_params(&result, &[]);
        assert_eq!(params.len(), 3);
        assert!(matches!(&params[1], JsNode::Raw(r) if r == "__"));
    }

    #[test]
    fn test_malformed() {
        let exp = SimpleExpressionNode::new("items", false, SourceLocation::STUB);
        assert!(parse_for_expression(&exp).is_none());
        compile_root(r#"<div v-for="items"></div>"#, |_, errors| {
            assert_eq!(errors[0].code, 32);
        });
    }

    #[test]
    fn test_keyed_list_codegen() {
        let options = TransformOptions {
            prefix_identifiers: true,
            ..Default::default()
        };
        compile_root_with(
            r#"<li v-for="item in list" :key="item.id">{{ item.name }}</li>"#,
            options,
            |root, errors| {
                assert!(errors.is_empty());
                let TemplateChildNode::For(for_node) = &root.children[0] else {
                    panic!("expected for node");
                };
                assert_eq!(for_node.source.to_code(), "_ctx.list");
                let call = for_node.codegen_node.as_ref().unwrap().as_vnode_call().unwrap();
                assert_eq!(call.patch_flag, Some(PatchFlags::KEYED_FRAGMENT));
                assert!(call.disable_tracking);
                let Some(JsNode::Call(render)) = &call.children else {
                    panic!("expected renderList call");
                };
                let JsNode::Function(func) = &render.arguments[1] else {
                    panic!("expected loop function");
                };
                assert_eq!(func.params.len(), 1);
                let TemplateChildNode::Element(li) = &for_node.children[0] else {
                    panic!("expected element");
                };
                let li_call = li.codegen_node.as_ref().unwrap().as_vnode_call().unwrap();
                assert!(li_call.is_block);
            },
        );
    }

    #[test]
    fn test_template_key_placement() {
        compile_root(
            r#"<template v-for="i in 3"><div :key="i"/></template>"#,
            |_, errors| {
                assert_eq!(errors[0].code, 33);
            },
        );
    }

    #[test]
    fn test_constant_source_is_stable() {
        let options = TransformOptions {
            prefix_identifiers: true,
            ..Default::default()
        };
        compile_root_with(r#"<span v-for="i in 10">{{ i }}</span>"#, options, |root, _| {
            let TemplateChildNode::For(for_node) = &root.children[0] else {
                panic!("expected for node");
            };
            let call = for_node.codegen_node.as_ref().unwrap().as_vnode_call().unwrap();
            assert_eq!(call.patch_flag, Some(PatchFlags::STABLE_FRAGMENT));
            assert!(!call.disable_tracking);
        });
    }
}
