//! SSR statement lowering.
//!
//! Runs once every node is transformed and replaces the root codegen with a
//! block of statements. Static markup and `${}` expressions accumulate in a
//! template literal that is flushed as one `_push(...)` call whenever a
//! statement (a conditional, a loop, a component or slot render) has to be
//! emitted in between.

use tessera_arena::{escape_html, is_void_tag};
use tessera_ast::{
    create_block_statement, create_call_expression, create_function_expression, create_helper_call,
    create_if_statement, create_template_literal, BlockStatement, Callee, CompoundExpressionNode,
    CompoundPart, ElementNode, ElementType, ExpressionNode, ForNode, IfAlternate, IfNode, JsNode,
    PropNode, RootNode, RuntimeHelper, SimpleExpressionNode, SourceLocation, TemplateChildNode,
    TemplateLiteralPart,
};
use tessera_core::codegen::NodeIndex;
use tessera_core::transforms::transform_expression::process_expression;
use tessera_core::transforms::v_for::create_for_loop_params;
use tessera_core::utils::find_prop;
use tessera_core::{CodegenError, TransformContext};

use crate::errors::{create_ssr_error, SsrErrorCode};
use crate::transforms::component::built_in_component;
use crate::transforms::slot_outlet::FALLBACK_ARG;

type Result<T = ()> = std::result::Result<T, CodegenError>;

/// Index of the slot scope id argument of `_ssrRenderSlot`
const SCOPE_ID_ARG: usize = 6;

/// Statement list under construction
pub struct SsrCodegenContext {
    pub body: Vec<JsNode>,
    parts: Vec<TemplateLiteralPart>,
    /// Inside a slot function: elements also render `${_scopeId}`
    pub with_slot_scope_id: bool,
}

impl SsrCodegenContext {
    pub fn new(with_slot_scope_id: bool) -> Self {
        Self {
            body: Vec::new(),
            parts: Vec::new(),
            with_slot_scope_id,
        }
    }

    pub fn push_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        match self.parts.last_mut() {
            Some(TemplateLiteralPart::Str(last)) => last.push_str(s),
            _ => self.parts.push(TemplateLiteralPart::Str(s.into())),
        }
    }

    pub fn push_exp(&mut self, exp: JsNode) {
        self.parts.push(TemplateLiteralPart::Expr(exp));
    }

    pub fn push_part(&mut self, part: &TemplateLiteralPart) {
        match part {
            TemplateLiteralPart::Str(s) => self.push_str(s),
            TemplateLiteralPart::Expr(exp) => self.push_exp(exp.clone()),
        }
    }

    pub fn push_statement(&mut self, statement: JsNode) {
        self.flush();
        self.body.push(statement);
    }

    fn flush(&mut self) {
        if self.parts.is_empty() {
            return;
        }
        let literal = create_template_literal(std::mem::take(&mut self.parts));
        self.body.push(create_call_expression(
            Callee::Raw("_push".into()),
            vec![JsNode::TemplateLiteral(literal)],
            SourceLocation::STUB,
        ));
    }

    pub fn finish(mut self) -> BlockStatement {
        self.flush();
        create_block_statement(self.body)
    }
}

/// How a children list is printed
#[derive(Clone, Copy, Default)]
struct ChildrenMode {
    /// Wrap in `<!--[-->` `<!--]-->` anchors
    as_fragment: bool,
    /// Nested `v-if` / `v-for` never get anchors of their own
    disable_nested_fragments: bool,
    /// No comments and no `<!---->` placeholder for a missing `v-else`
    disable_comment: bool,
    /// Skip comment nodes but keep the placeholders
    skip_comment_nodes: bool,
}

impl ChildrenMode {
    fn fragment(as_fragment: bool) -> Self {
        Self {
            as_fragment,
            ..Self::default()
        }
    }

    /// Children of a transition: a single root, no anchors
    fn flat(as_fragment: bool) -> Self {
        Self {
            as_fragment,
            disable_nested_fragments: true,
            disable_comment: true,
            skip_comment_nodes: true,
        }
    }
}

struct Lowering<'l, 'g, 'a> {
    ctx: &'l mut TransformContext<'a>,
    index: &'l NodeIndex<'g, 'a>,
}

impl<'l, 'g, 'a> Lowering<'l, 'g, 'a> {
    fn children(
        &mut self,
        children: &'g [TemplateChildNode<'a>],
        out: &mut SsrCodegenContext,
        mode: ChildrenMode,
    ) -> Result {
        if mode.as_fragment {
            out.push_str("<!--[-->");
        }
        for child in children {
            match child {
                TemplateChildNode::Element(el) => match el.tag_type {
                    ElementType::Element => self.element(el, out)?,
                    ElementType::Component => self.component(el, out)?,
                    ElementType::Slot => self.slot_outlet(el, out)?,
                    ElementType::Template => self.children(&el.children, out, ChildrenMode::default())?,
                },
                TemplateChildNode::Text(text) => out.push_str(&escape_html(&text.content)),
                TemplateChildNode::Comment(comment) => {
                    if !mode.disable_comment && !mode.skip_comment_nodes {
                        out.push_str(&format!("<!--{}-->", comment.content));
                    }
                }
                TemplateChildNode::Interpolation(interp) => {
                    let helper = self.ctx.helper(RuntimeHelper::SsrInterpolate);
                    out.push_exp(create_helper_call(
                        helper,
                        vec![JsNode::expression(interp.content.clone())],
                    ));
                }
                TemplateChildNode::If(if_node) => self.if_node(if_node, out, mode)?,
                TemplateChildNode::For(for_node) => {
                    self.for_node(for_node, out, mode.disable_nested_fragments)?
                }
                TemplateChildNode::Compound(_) | TemplateChildNode::TextCall(_) => {
                    let loc = child.loc().clone();
                    self.ctx.on_error(create_ssr_error(SsrErrorCode::InvalidAstNode, &loc));
                }
            }
        }
        if mode.as_fragment {
            out.push_str("<!--]-->");
        }
        Ok(())
    }

    fn children_as_block(
        &mut self,
        children: &'g [TemplateChildNode<'a>],
        mode: ChildrenMode,
        with_slot_scope_id: bool,
    ) -> Result<BlockStatement> {
        let mut out = SsrCodegenContext::new(with_slot_scope_id);
        self.children(children, &mut out, mode)?;
        Ok(out.finish())
    }

    fn element(&mut self, el: &'g ElementNode<'a>, out: &mut SsrCodegenContext) -> Result {
        let Some(JsNode::TemplateLiteral(open)) = &el.ssr_codegen_node else {
            return Err(CodegenError::MissingCodegen(el.id));
        };
        for part in &open.elements {
            out.push_part(part);
        }
        if out.with_slot_scope_id {
            out.push_exp(JsNode::raw("_scopeId"));
        }
        out.push_str(">");

        match &el.ssr_raw_children {
            Some(JsNode::Text(text)) => out.push_str(&text.content),
            Some(raw) => out.push_exp(raw.clone()),
            None => self.children(&el.children, out, ChildrenMode::default())?,
        }
        if !is_void_tag(&el.tag) {
            out.push_str(&format!("</{}>", el.tag));
        }
        Ok(())
    }

    fn component(&mut self, el: &'g ElementNode<'a>, out: &mut SsrCodegenContext) -> Result {
        match built_in_component(&el.tag) {
            Some(RuntimeHelper::Teleport) => self.teleport(el, out),
            Some(RuntimeHelper::Suspense) => match &el.ssr_codegen_node {
                Some(call) => {
                    let mut call = call.clone();
                    self.fill_slot_bodies(&mut call, out.with_slot_scope_id)?;
                    out.push_statement(call);
                    Ok(())
                }
                None => self.children(&el.children, out, ChildrenMode::default()),
            },
            Some(RuntimeHelper::TransitionGroup) => match &el.ssr_codegen_node {
                Some(JsNode::Array(tags)) => {
                    if let [JsNode::TemplateLiteral(open), JsNode::TemplateLiteral(close)] = tags.elements.as_slice() {
                        open.elements.iter().for_each(|p| out.push_part(p));
                        out.push_str(">");
                        self.children(&el.children, out, ChildrenMode::flat(false))?;
                        close.elements.iter().for_each(|p| out.push_part(p));
                    }
                    Ok(())
                }
                _ => self.children(&el.children, out, ChildrenMode::flat(true)),
            },
            Some(RuntimeHelper::Transition) => {
                let mode = ChildrenMode {
                    disable_nested_fragments: true,
                    skip_comment_nodes: true,
                    ..ChildrenMode::default()
                };
                // `appear` needs a template wrapper for the client to find the root
                let appear = find_prop(el, "appear", false, true).is_some();
                if appear {
                    out.push_str("<template>");
                }
                self.children(&el.children, out, mode)?;
                if appear {
                    out.push_str("</template>");
                }
                Ok(())
            }
            Some(_) => self.children(&el.children, out, ChildrenMode::default()),
            None => {
                let Some(call) = &el.ssr_codegen_node else {
                    return Err(CodegenError::MissingCodegen(el.id));
                };
                let mut call = call.clone();
                self.fill_slot_bodies(&mut call, out.with_slot_scope_id)?;
                let JsNode::Call(render) = &mut call else {
                    return Err(CodegenError::MissingCodegen(el.id));
                };
                if out.with_slot_scope_id {
                    render.arguments.push(JsNode::raw("_scopeId"));
                }
                if render.callee == Callee::Helper(RuntimeHelper::SsrRenderVNode) {
                    out.push_statement(call);
                } else {
                    out.push_statement(create_call_expression(
                        Callee::Raw("_push".into()),
                        vec![call],
                        SourceLocation::STUB,
                    ));
                }
                Ok(())
            }
        }
    }

    /// `_ssrRenderTeleport(_push, (_push) => {...}, target, disabled, _parent)`
    fn teleport(&mut self, el: &'g ElementNode<'a>, out: &mut SsrCodegenContext) -> Result {
        let target = match find_prop(el, "to", false, false) {
            Some(PropNode::Attribute(attr)) => attr.value.as_ref().map(|v| JsNode::string_literal(&v.content)),
            Some(PropNode::Directive(dir)) => dir.exp.clone().map(JsNode::expression),
            None => None,
        };
        let Some(target) = target else {
            self.ctx.on_error(create_ssr_error(SsrErrorCode::NoTeleportTarget, &el.loc));
            return Ok(());
        };
        let disabled = match find_prop(el, "disabled", false, true) {
            Some(PropNode::Attribute(_)) => JsNode::raw("true"),
            Some(PropNode::Directive(dir)) => dir
                .exp
                .clone()
                .map(JsNode::expression)
                .unwrap_or_else(|| JsNode::raw("false")),
            None => JsNode::raw("false"),
        };

        let mut content = create_function_expression(vec![JsNode::raw("_push")], None, true, false, el.loc.clone());
        let body = self.children_as_block(&el.children, ChildrenMode::default(), out.with_slot_scope_id)?;
        content.body = Some(JsNode::Block(body));

        let helper = self.ctx.helper(RuntimeHelper::SsrRenderTeleport);
        out.push_statement(create_helper_call(
            helper,
            vec![
                JsNode::raw("_push"),
                JsNode::Function(std::boxed::Box::new(content)),
                target,
                disabled,
                JsNode::raw("_parent"),
            ],
        ));
        Ok(())
    }

    /// Replace the `Children` placeholders of slot functions with the
    /// lowered content.
    ///
    /// Component slots hold `if (_push) { Children } else { return vnodes }`;
    /// only the string branch is lowered. `<Suspense>` slots hold a plain
    /// block.
    fn fill_slot_bodies(&mut self, node: &mut JsNode, with_slot_scope_id: bool) -> Result {
        match node {
            JsNode::Function(func) => {
                match func.body.as_mut() {
                    Some(JsNode::If(stmt)) => {
                        if let [JsNode::Children(id)] = stmt.consequent.body.as_slice() {
                            let children = self.index.children(*id)?;
                            stmt.consequent = self.children_as_block(children, ChildrenMode::default(), true)?;
                        }
                    }
                    Some(JsNode::Block(block)) => {
                        if let [JsNode::Children(id)] = block.body.as_slice() {
                            let children = self.index.children(*id)?;
                            *block = self.children_as_block(children, ChildrenMode::default(), with_slot_scope_id)?;
                        }
                    }
                    _ => {}
                }
                if let Some(returns) = func.returns.as_mut() {
                    self.fill_slot_bodies(returns, with_slot_scope_id)?;
                }
            }
            JsNode::Call(call) => {
                for arg in call.arguments.iter_mut() {
                    self.fill_slot_bodies(arg, with_slot_scope_id)?;
                }
            }
            JsNode::Object(obj) => {
                for prop in obj.properties.iter_mut() {
                    self.fill_slot_bodies(&mut prop.value, with_slot_scope_id)?;
                }
            }
            JsNode::Array(array) => {
                for element in array.elements.iter_mut() {
                    self.fill_slot_bodies(element, with_slot_scope_id)?;
                }
            }
            JsNode::Conditional(cond) => {
                self.fill_slot_bodies(&mut cond.consequent, with_slot_scope_id)?;
                self.fill_slot_bodies(&mut cond.alternate, with_slot_scope_id)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn slot_outlet(&mut self, el: &'g ElementNode<'a>, out: &mut SsrCodegenContext) -> Result {
        let Some(JsNode::Call(call)) = &el.ssr_codegen_node else {
            return Err(CodegenError::MissingCodegen(el.id));
        };
        let mut call = call.clone();
        if !el.children.is_empty() {
            let mut fallback = create_function_expression(vec![], None, true, false, el.loc.clone());
            let body = self.children_as_block(&el.children, ChildrenMode::default(), out.with_slot_scope_id)?;
            fallback.body = Some(JsNode::Block(body));
            if let Some(arg) = call.arguments.get_mut(FALLBACK_ARG) {
                *arg = JsNode::Function(std::boxed::Box::new(fallback));
            }
        }
        if out.with_slot_scope_id {
            match call.arguments.get_mut(SCOPE_ID_ARG) {
                Some(JsNode::Raw(scope)) if scope.as_str() != "null" => {
                    *scope = format!("{} + _scopeId", scope).into();
                }
                Some(arg) => *arg = JsNode::raw("_scopeId"),
                None => call.arguments.push(JsNode::raw("_scopeId")),
            }
        }
        out.push_statement(JsNode::Call(call));
        Ok(())
    }

    fn if_node(&mut self, if_node: &'g IfNode<'a>, out: &mut SsrCodegenContext, mode: ChildrenMode) -> Result {
        let mut branches = std::vec::Vec::with_capacity(if_node.branches.len());
        for branch in if_node.branches.iter() {
            let children: &'g [TemplateChildNode<'a>] = &branch.children;
            // a single element or loop brings its own anchors
            let as_fragment = !mode.disable_nested_fragments
                && !matches!(
                    children,
                    [TemplateChildNode::Element(_)] | [TemplateChildNode::For(_)]
                );
            let block = self.children_as_block(children, ChildrenMode::fragment(as_fragment), out.with_slot_scope_id)?;
            branches.push((branch.condition.clone(), block));
        }
        let has_else = branches.last().is_some_and(|(condition, _)| condition.is_none());
        if !has_else && !mode.disable_comment {
            let mut placeholder = SsrCodegenContext::new(false);
            placeholder.push_str("<!---->");
            branches.push((None, placeholder.finish()));
        }

        // fold from the last branch so each condition wraps the rest
        let mut chain: Option<IfAlternate> = None;
        for (condition, block) in branches.into_iter().rev() {
            chain = Some(match condition {
                Some(test) => IfAlternate::If(std::boxed::Box::new(create_if_statement(
                    JsNode::expression(test),
                    block,
                    chain.take(),
                ))),
                None => IfAlternate::Block(block),
            });
        }
        if let Some(IfAlternate::If(statement)) = chain {
            out.push_statement(JsNode::If(statement));
        }
        Ok(())
    }

    fn for_node(&mut self, for_node: &'g ForNode<'a>, out: &mut SsrCodegenContext, disable_nested_fragments: bool) -> Result {
        let children: &'g [TemplateChildNode<'a>] = &for_node.children;
        let as_fragment = !disable_nested_fragments && !matches!(children, [TemplateChildNode::Element(_)]);
        let mut render_item = create_function_expression(
            create_for_loop_params(&for_node.parse_result, &[]),
            None,
            true,
            false,
            for_node.loc.clone(),
        );
        let body = self.children_as_block(children, ChildrenMode::fragment(as_fragment), out.with_slot_scope_id)?;
        render_item.body = Some(JsNode::Block(body));

        if !disable_nested_fragments {
            out.push_str("<!--[-->");
        }
        let helper = self.ctx.helper(RuntimeHelper::SsrRenderList);
        out.push_statement(create_helper_call(
            helper,
            vec![
                JsNode::expression(for_node.source.clone()),
                JsNode::Function(std::boxed::Box::new(render_item)),
            ],
        ));
        if !disable_nested_fragments {
            out.push_str("<!--]-->");
        }
        Ok(())
    }
}

/// Lower the transformed tree to the body of `ssrRender`.
pub fn lower_root<'a>(root: &mut RootNode<'a>, ctx: &mut TransformContext<'a>) {
    let lowered = {
        let index = NodeIndex::build(root);
        let mut out = SsrCodegenContext::new(false);

        if let Some(vars) = ctx.options.ssr_css_vars.clone() {
            let exp = SimpleExpressionNode::new(vars, false, SourceLocation::STUB);
            let vars = process_expression(&exp, ctx, false, false);
            out.body.push(JsNode::Compound(CompoundExpressionNode::new(
                vec![
                    CompoundPart::Code("const _cssVars = { style: ".into()),
                    match vars {
                        ExpressionNode::Simple(s) => CompoundPart::Simple(s),
                        ExpressionNode::Compound(c) => CompoundPart::Compound(c),
                    },
                    CompoundPart::Code(" }".into()),
                ],
                SourceLocation::STUB,
            )));
        }

        let is_fragment = root.children.len() > 1
            && root
                .children
                .iter()
                .any(|c| !matches!(c, TemplateChildNode::Text(_) | TemplateChildNode::Interpolation(_)));
        let mut lowering = Lowering {
            ctx: &mut *ctx,
            index: &index,
        };
        lowering
            .children(&root.children, &mut out, ChildrenMode::fragment(is_fragment))
            .map(|()| out.finish())
    };

    match lowered {
        Ok(body) => {
            tracing::trace!(statements = body.body.len(), "ssr tree lowered");
            root.codegen_node = Some(JsNode::Block(body));
        }
        Err(err) => {
            tracing::warn!(%err, "ssr lowering failed");
            let loc = root.loc.clone();
            ctx.on_error(create_ssr_error(SsrErrorCode::InvalidAstNode, &loc));
        }
    }
}
