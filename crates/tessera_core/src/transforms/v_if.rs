//! v-if / v-else-if / v-else transform.
//!
//! The `v-if` element is replaced by an [`IfNode`] with one branch. Each
//! following `v-else-if` / `v-else` sibling is moved into that node as a
//! further branch and traversed on the spot. Codegen is a chain of
//! conditional expressions ending in a `v-if` comment placeholder.

use tessera_arena::{Box, CloneIn, PatchFlags};
use tessera_ast::{
    create_conditional_expression, create_helper_call, create_object_expression,
    create_object_property, ConstantType, DirectiveNode, ElementType, ErrorCode, ExpressionNode,
    IfBranchNode, IfNode, JsNode, PropNode, RuntimeHelper, SimpleExpressionNode,
    SourceLocation, TemplateChildNode,
};

use crate::transform::{
    Container, ExitFn, NodeCursor, ParentInfo, StructuralDirectiveTransform, TransformContext,
    Walker,
};
use crate::transforms::transform_expression::process_expression;
use crate::utils::{
    convert_to_block, create_vnode_call, find_prop, inject_codegen_prop, memoed_vnode_call_mut,
};

/// `v-if` family transform
pub fn transform_if() -> StructuralDirectiveTransform {
    StructuralDirectiveTransform::new(
        |name| matches!(name, "if" | "else" | "else-if"),
        process_if,
    )
}

fn process_if<'c, 'a>(
    cursor: &mut NodeCursor<'c, 'a>,
    mut dir: Box<'a, DirectiveNode<'a>>,
    ctx: &mut TransformContext<'a>,
    walker: &Walker<'_>,
) -> Option<ExitFn<'a>> {
    if dir.name != "else" && dir.exp_is_empty() {
        let loc = dir.exp.as_ref().map(|e| e.loc().clone()).unwrap_or_else(|| dir.loc.clone());
        ctx.report(ErrorCode::VIfNoExpression, &loc);
        dir.exp = Some(ExpressionNode::Simple(SimpleExpressionNode::new(
            "true",
            false,
            loc,
        )));
    }

    if let Some(ExpressionNode::Simple(exp)) = &dir.exp {
        if !exp.is_static {
            dir.exp = Some(process_expression(exp, ctx, false, false));
        }
    }

    if dir.name == "if" {
        process_root_if(cursor, dir, ctx)
    } else {
        process_else_branch(cursor, dir, ctx, walker);
        None
    }
}

fn create_if_branch<'a>(
    node: TemplateChildNode<'a>,
    dir: &DirectiveNode<'a>,
    ctx: &mut TransformContext<'a>,
) -> IfBranchNode<'a> {
    let id = ctx.alloc_id();
    let loc = node.loc().clone();
    let condition = if dir.name == "else" { None } else { dir.exp.clone() };
    let mut branch = IfBranchNode::new(ctx.allocator, id, condition, loc);
    if let TemplateChildNode::Element(mut el) = node {
        branch.user_key = find_prop(&el, "key", false, false).map(|p| p.clone_in(ctx.allocator));
        branch.is_template_if = el.tag_type == ElementType::Template;
        if branch.is_template_if && !el.has_dir("for") {
            std::mem::swap(&mut branch.children, &mut el.children);
            return branch;
        }
        branch.children.push(TemplateChildNode::Element(el));
    } else {
        branch.children.push(node);
    }
    branch
}

/// Number of branches in `v-if` chains before position `index`.
fn preceding_branch_count(siblings: &[TemplateChildNode<'_>], index: usize) -> u32 {
    siblings[..index]
        .iter()
        .map(|s| match s {
            TemplateChildNode::If(if_node) => if_node.branches.len() as u32,
            _ => 0,
        })
        .sum()
}

fn process_root_if<'c, 'a>(
    cursor: &mut NodeCursor<'c, 'a>,
    dir: Box<'a, DirectiveNode<'a>>,
    ctx: &mut TransformContext<'a>,
) -> Option<ExitFn<'a>> {
    let key = preceding_branch_count(cursor.siblings(), cursor.index());
    let if_id = ctx.alloc_id();
    let allocator = ctx.allocator;
    let mut original = None;
    cursor.replace(|node| {
        let if_node = IfNode::new(allocator, if_id, node.loc().clone());
        original = Some(node);
        TemplateChildNode::If(Box::new_in(if_node, allocator))
    });
    if let Some(node) = original {
        let branch = create_if_branch(node, &dir, ctx);
        if let TemplateChildNode::If(if_node) = cursor.node_mut() {
            if_node.branches.push(branch);
        }
    }

    // the server backend lowers branches to statements instead
    if ctx.is_ssr() {
        return None;
    }
    Some(std::boxed::Box::new(move |node, ctx| {
        let TemplateChildNode::If(if_node) = node else {
            return;
        };
        if let Some(branch) = if_node.branches.first_mut() {
            if_node.codegen_node = Some(create_branch_codegen(branch, key, ctx));
        }
    }))
}

fn is_same_key(a: Option<&PropNode<'_>>, b: Option<&PropNode<'_>>) -> bool {
    let (Some(a), Some(b)) = (a, b) else {
        return false;
    };
    match (a, b) {
        (PropNode::Attribute(a), PropNode::Attribute(b)) => {
            a.value.as_ref().map(|v| &v.content) == b.value.as_ref().map(|v| &v.content)
        }
        (PropNode::Directive(a), PropNode::Directive(b)) => match (&a.exp, &b.exp) {
            (Some(ExpressionNode::Simple(x)), Some(ExpressionNode::Simple(y))) => {
                x.is_static == y.is_static && x.content == y.content
            }
            _ => false,
        },
        _ => false,
    }
}

fn process_else_branch<'c, 'a>(
    cursor: &mut NodeCursor<'c, 'a>,
    dir: Box<'a, DirectiveNode<'a>>,
    ctx: &mut TransformContext<'a>,
    walker: &Walker<'_>,
) {
    // walk back over comments and blank text to the v-if chain
    let mut comments = std::vec::Vec::new();
    let mut index = cursor.index();
    let mut target = None;
    while index > 0 {
        index -= 1;
        let sibling = &cursor.siblings()[index];
        let is_comment = matches!(sibling, TemplateChildNode::Comment(_));
        let is_if = matches!(sibling, TemplateChildNode::If(_));
        if is_comment {
            comments.push(cursor.remove_sibling(index));
        } else if sibling.is_whitespace_text() {
            cursor.remove_sibling(index);
        } else {
            if is_if {
                target = Some(index);
            }
            break;
        }
    }

    let Some(if_index) = target else {
        ctx.report(ErrorCode::VElseNoAdjacentIf, cursor.node().loc());
        return;
    };

    let key = preceding_branch_count(cursor.siblings(), if_index);
    if let TemplateChildNode::If(if_node) = &cursor.siblings()[if_index] {
        let closed = if_node.branches.last().is_some_and(|b| b.condition.is_none());
        if dir.name == "else-if" && closed {
            ctx.report(ErrorCode::VElseNoAdjacentIf, cursor.node().loc());
        }
    }

    let node = cursor.remove();
    let mut branch = create_if_branch(node, &dir, ctx);
    let keep_comments = !matches!(
        ctx.parent.tag(),
        Some("transition" | "Transition")
    );
    if keep_comments && !comments.is_empty() {
        let mut children = tessera_arena::Vec::with_capacity_in(
            comments.len() + branch.children.len(),
            ctx.allocator,
        );
        children.extend(comments.into_iter().rev());
        children.extend(branch.children.drain(..));
        branch.children = children;
    }

    let TemplateChildNode::If(if_node) = cursor.sibling_mut(if_index) else {
        return;
    };
    if branch.user_key.is_some()
        && if_node
            .branches
            .iter()
            .any(|b| is_same_key(b.user_key.as_ref(), branch.user_key.as_ref()))
    {
        if let Some(loc) = branch.user_key.as_ref().map(|k| k.loc().clone()) {
            ctx.report(ErrorCode::VIfSameKey, &loc);
        }
    }
    if_node.branches.push(branch);

    let branch_index = if_node.branches.len() - 1;
    let branch = &mut if_node.branches[branch_index];
    let id = branch.id;
    walker.traverse_children(
        &mut branch.children,
        Container::Branch(id),
        ParentInfo::IfBranch(id),
        ctx,
    );

    if ctx.is_ssr() {
        return;
    }
    let codegen = create_branch_codegen(branch, key + branch_index as u32, ctx);
    if let Some(root) = if_node.codegen_node.as_mut() {
        if let Some(tail) = tail_condition(root) {
            *tail = codegen;
        }
    }
}

/// The alternate slot at the end of a conditional chain.
fn tail_condition(node: &mut JsNode) -> Option<&mut JsNode> {
    match node {
        JsNode::Conditional(cond) => {
            if matches!(cond.alternate, JsNode::Conditional(_)) {
                tail_condition(&mut cond.alternate)
            } else {
                Some(&mut cond.alternate)
            }
        }
        JsNode::Cache(cache) => tail_condition(&mut cache.value),
        _ => None,
    }
}

fn create_branch_codegen<'a>(
    branch: &mut IfBranchNode<'a>,
    key_index: u32,
    ctx: &mut TransformContext<'a>,
) -> JsNode {
    let children = create_children_codegen(branch, key_index, ctx);
    match &branch.condition {
        Some(condition) => {
            let comment = create_helper_call(
                ctx.helper(RuntimeHelper::CreateComment),
                vec![JsNode::raw("\"v-if\""), JsNode::raw("true")],
            );
            create_conditional_expression(
                JsNode::expression(condition.clone()),
                children,
                comment,
                true,
            )
        }
        None => children,
    }
}

fn create_children_codegen<'a>(
    branch: &mut IfBranchNode<'a>,
    key_index: u32,
    ctx: &mut TransformContext<'a>,
) -> JsNode {
    let key_property = create_object_property(
        "key",
        JsNode::Simple(
            SimpleExpressionNode::new(key_index.to_string(), false, SourceLocation::STUB)
                .with_const_type(ConstantType::CanHoist),
        ),
    );
    if branch.children.len() == 1 {
        match &mut branch.children[0] {
            TemplateChildNode::Element(el) => {
                if let Some(codegen) = el.codegen_node.as_mut() {
                    if let Some(call) = memoed_vnode_call_mut(codegen) {
                        convert_to_block(call, ctx);
                    }
                    inject_codegen_prop(codegen, key_property, ctx);
                }
                return JsNode::Node(el.id);
            }
            TemplateChildNode::For(for_node) => {
                // the loop fragment doubles as the branch block
                if let Some(codegen) = for_node.codegen_node.as_mut() {
                    inject_codegen_prop(codegen, key_property, ctx);
                }
                return JsNode::Node(for_node.id);
            }
            _ => {}
        }
    }

    let mut flag = PatchFlags::STABLE_FRAGMENT;
    let non_comments = branch
        .children
        .iter()
        .filter(|c| !matches!(c, TemplateChildNode::Comment(_)))
        .count();
    if !branch.is_template_if && non_comments == 1 {
        flag |= PatchFlags::DEV_ROOT_FRAGMENT;
    }
    let fragment = ctx.helper(RuntimeHelper::Fragment);
    create_vnode_call(
        ctx,
        JsNode::Helper(fragment),
        Some(create_object_expression(vec![key_property], SourceLocation::STUB)),
        Some(JsNode::Children(branch.id)),
        Some(flag),
        None,
        None,
        true,
        false,
        false,
        branch.loc.clone(),
    )
}
