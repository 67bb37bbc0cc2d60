//! IR printer.

use tessera_arena::{is_simple_identifier, to_js_string_literal, PatchFlags};
use tessera_ast::{
    BlockStatement, CacheExpression, Callee, CommentNode, CompoundExpressionNode, CompoundPart,
    ConditionalExpression, ExpressionNode, FunctionExpression, IfAlternate, IfStatement,
    InterpolationNode, JsNode, NodeId, ObjectExpression, RuntimeHelper, SimpleExpressionNode,
    TemplateChildNode, TemplateLiteralPart, TextNode, VNodeCall,
};

use super::context::CodegenContext;
use super::CodegenError;
use crate::utils::{vnode_block_helper, vnode_helper};

type Result<T = ()> = std::result::Result<T, CodegenError>;

/// One entry of a printed list
enum ListItem<'n, 'g, 'a> {
    Js(&'n JsNode),
    Child(&'g TemplateChildNode<'a>),
    Code(&'n str),
}

impl ListItem<'_, '_, '_> {
    /// Strings and expressions keep an array on one line.
    fn is_text(&self) -> bool {
        match self {
            Self::Code(_) => true,
            Self::Js(node) => matches!(
                node,
                JsNode::Raw(_)
                    | JsNode::Simple(_)
                    | JsNode::Compound(_)
                    | JsNode::Text(_)
                    | JsNode::Interpolation(_)
            ),
            Self::Child(child) => child.is_text_like(),
        }
    }
}

impl<'g, 'a> CodegenContext<'g, 'a> {
    pub fn gen_node(&mut self, node: &JsNode) -> Result {
        match node {
            JsNode::Raw(code) => self.push(code),
            JsNode::Helper(helper) => self.push_helper(*helper),
            JsNode::Simple(exp) => self.gen_expression(exp),
            JsNode::Compound(exp) => self.gen_compound(exp)?,
            JsNode::Text(text) => self.gen_text(text),
            JsNode::Comment(comment) => self.gen_comment(comment),
            JsNode::Interpolation(interp) => self.gen_interpolation(interp)?,
            JsNode::Node(id) => {
                let target = self.index.node(*id)?;
                self.gen_child(target)?;
            }
            JsNode::Children(id) => {
                let children = self.index.children(*id)?;
                let items: Vec<ListItem<'_, 'g, 'a>> = children.iter().map(ListItem::Child).collect();
                self.gen_list_as_array(&items)?;
            }
            JsNode::VNodeCall(call) => self.gen_vnode_call(call)?,
            JsNode::Call(call) => {
                self.push_pure();
                match &call.callee {
                    Callee::Helper(helper) => self.push_helper(*helper),
                    Callee::Raw(callee) => self.push(callee),
                }
                self.push("(");
                let items: Vec<ListItem<'_, 'g, 'a>> = call.arguments.iter().map(ListItem::Js).collect();
                self.gen_list(&items, false)?;
                self.push(")");
            }
            JsNode::Object(obj) => self.gen_object(obj)?,
            JsNode::Array(array) => {
                let items: Vec<ListItem<'_, 'g, 'a>> = array.elements.iter().map(ListItem::Js).collect();
                self.gen_list_as_array(&items)?;
            }
            JsNode::Function(func) => self.gen_function(func)?,
            JsNode::Conditional(cond) => self.gen_conditional(cond)?,
            JsNode::Cache(cache) => self.gen_cache(cache)?,
            JsNode::Assignment(assign) => {
                self.gen_node(&assign.left)?;
                self.push(" = ");
                self.gen_node(&assign.right)?;
            }
            JsNode::Sequence(seq) => {
                self.push("(");
                let items: Vec<ListItem<'_, 'g, 'a>> = seq.expressions.iter().map(ListItem::Js).collect();
                self.gen_list(&items, false)?;
                self.push(")");
            }
            JsNode::TemplateLiteral(literal) => {
                let multilines = literal.elements.len() > 3;
                self.push("`");
                for part in &literal.elements {
                    match part {
                        TemplateLiteralPart::Str(s) => self.push(&escape_template(s)),
                        TemplateLiteralPart::Expr(exp) => {
                            self.push("${");
                            if multilines {
                                self.indent();
                            }
                            self.gen_node(exp)?;
                            if multilines {
                                self.deindent(false);
                            }
                            self.push("}");
                        }
                    }
                }
                self.push("`");
            }
            JsNode::If(stmt) => self.gen_if(stmt)?,
            JsNode::Block(block) => self.gen_block(block)?,
            JsNode::Return(ret) => {
                self.push("return ");
                self.gen_node(&ret.returns)?;
            }
        }
        Ok(())
    }

    /// A template child in a children list.
    fn gen_child(&mut self, child: &'g TemplateChildNode<'a>) -> Result {
        match child {
            TemplateChildNode::Text(text) => self.gen_text(text),
            TemplateChildNode::Comment(comment) => self.gen_comment(comment),
            TemplateChildNode::Interpolation(interp) => self.gen_interpolation(interp)?,
            TemplateChildNode::Compound(exp) => self.gen_compound(exp)?,
            other => {
                let id = other.id().unwrap_or(NodeId::ROOT);
                let codegen = other
                    .codegen_node()
                    .ok_or(CodegenError::MissingCodegen(id))?;
                self.gen_node(codegen)?;
            }
        }
        Ok(())
    }

    fn gen_list(&mut self, items: &[ListItem<'_, 'g, 'a>], multilines: bool) -> Result {
        self.gen_list_with(items, multilines, true)
    }

    fn gen_list_with(
        &mut self,
        items: &[ListItem<'_, 'g, 'a>],
        multilines: bool,
        comma: bool,
    ) -> Result {
        for (i, item) in items.iter().enumerate() {
            match item {
                ListItem::Code(code) => self.push(code),
                ListItem::Js(node) => self.gen_node(node)?,
                ListItem::Child(child) => self.gen_child(*child)?,
            }
            if i + 1 < items.len() {
                if multilines {
                    if comma {
                        self.push(",");
                    }
                    self.newline();
                } else if comma {
                    self.push(", ");
                }
            }
        }
        Ok(())
    }

    fn gen_list_as_array(&mut self, items: &[ListItem<'_, 'g, 'a>]) -> Result {
        let multilines = items.len() > 3 || items.iter().any(|item| !item.is_text());
        self.push("[");
        if multilines {
            self.indent();
        }
        self.gen_list(items, multilines)?;
        if multilines {
            self.deindent(false);
        }
        self.push("]");
        Ok(())
    }

    fn gen_text(&mut self, text: &TextNode) {
        self.push_mapped(&to_js_string_literal(&text.content), &text.loc, None);
    }

    fn gen_comment(&mut self, comment: &CommentNode) {
        self.push_pure();
        self.push_helper(RuntimeHelper::CreateComment);
        self.push("(");
        self.push_mapped(&to_js_string_literal(&comment.content), &comment.loc, None);
        self.push(")");
    }

    fn gen_interpolation(&mut self, interp: &InterpolationNode) -> Result {
        self.push_pure();
        self.push_helper(RuntimeHelper::ToDisplayString);
        self.push("(");
        self.gen_expression_node(&interp.content)?;
        self.push(")");
        Ok(())
    }

    fn gen_expression_node(&mut self, exp: &ExpressionNode) -> Result {
        match exp {
            ExpressionNode::Simple(s) => {
                self.gen_expression(s);
                Ok(())
            }
            ExpressionNode::Compound(c) => self.gen_compound(c),
        }
    }

    fn gen_expression(&mut self, exp: &SimpleExpressionNode) {
        if exp.is_static {
            self.push_mapped(&to_js_string_literal(&exp.content), &exp.loc, None);
            return;
        }
        let name = exp
            .content
            .strip_prefix("_ctx.")
            .filter(|rest| is_simple_identifier(rest));
        self.push_mapped(&exp.content, &exp.loc, name);
    }

    fn gen_compound(&mut self, exp: &CompoundExpressionNode) -> Result {
        for part in &exp.parts {
            match part {
                CompoundPart::Code(code) => self.push(code),
                CompoundPart::Simple(s) => self.gen_expression(s),
                CompoundPart::Compound(c) => self.gen_compound(c)?,
                CompoundPart::Text(t) => self.gen_text(t),
                CompoundPart::Interpolation(i) => self.gen_interpolation(i)?,
                CompoundPart::Helper(h) => self.push_helper(*h),
            }
        }
        Ok(())
    }

    fn gen_property_key(&mut self, key: &ExpressionNode) -> Result {
        match key {
            ExpressionNode::Compound(c) => {
                self.push("[");
                self.gen_compound(c)?;
                self.push("]");
            }
            ExpressionNode::Simple(s) if s.is_static => {
                if is_simple_identifier(&s.content) {
                    self.push_mapped(&s.content, &s.loc, None);
                } else {
                    self.push_mapped(&to_js_string_literal(&s.content), &s.loc, None);
                }
            }
            ExpressionNode::Simple(s) => {
                self.push("[");
                self.push_mapped(&s.content, &s.loc, None);
                self.push("]");
            }
        }
        Ok(())
    }

    fn gen_object(&mut self, obj: &ObjectExpression) -> Result {
        if obj.properties.is_empty() {
            self.push_mapped("{}", &obj.loc, None);
            return Ok(());
        }
        let multilines = obj.properties.len() > 1
            || obj
                .properties
                .iter()
                .any(|p| !matches!(p.value, JsNode::Simple(_) | JsNode::Raw(_)));
        self.push_mapped(if multilines { "{" } else { "{ " }, &obj.loc, None);
        if multilines {
            self.indent();
        }
        for (i, prop) in obj.properties.iter().enumerate() {
            self.gen_property_key(&prop.key)?;
            self.push(": ");
            self.gen_node(&prop.value)?;
            if i + 1 < obj.properties.len() {
                self.push(",");
                self.newline();
            }
        }
        if multilines {
            self.deindent(false);
        }
        self.push(if multilines { "}" } else { " }" });
        Ok(())
    }

    fn gen_vnode_call(&mut self, call: &VNodeCall) -> Result {
        let patch_flag = call
            .patch_flag
            .filter(|flag| flag.bits() != 0)
            .map(PatchFlags::to_annotated);

        if call.directives.is_some() {
            self.push_helper(RuntimeHelper::WithDirectives);
            self.push("(");
        }
        if call.is_block {
            self.push("(");
            self.push_helper(RuntimeHelper::OpenBlock);
            self.push(if call.disable_tracking { "(true), " } else { "(), " });
        }
        self.push_pure();
        let in_ssr = self.options.ssr;
        let helper = if call.is_block {
            vnode_block_helper(in_ssr, call.is_component)
        } else {
            vnode_helper(in_ssr, call.is_component)
        };
        self.push_helper(helper);
        self.push_mapped("(", &call.loc, None);

        let mut args: Vec<Option<ListItem<'_, 'g, 'a>>> = vec![
            Some(ListItem::Js(&call.tag)),
            call.props.as_ref().map(ListItem::Js),
            call.children.as_ref().map(ListItem::Js),
            patch_flag.as_deref().map(ListItem::Code),
            call.dynamic_props.as_ref().map(ListItem::Js),
        ];
        while matches!(args.last(), Some(None)) {
            args.pop();
        }
        let items: Vec<ListItem<'_, 'g, 'a>> = args
            .into_iter()
            .map(|arg| arg.unwrap_or(ListItem::Code("null")))
            .collect();
        self.gen_list(&items, false)?;
        self.push(")");

        if call.is_block {
            self.push(")");
        }
        if let Some(directives) = &call.directives {
            self.push(", ");
            let items: Vec<ListItem<'_, 'g, 'a>> = directives.elements.iter().map(ListItem::Js).collect();
            self.gen_list_as_array(&items)?;
            self.push(")");
        }
        Ok(())
    }

    fn gen_function(&mut self, func: &FunctionExpression) -> Result {
        if func.is_slot {
            self.push_helper(RuntimeHelper::WithCtx);
            self.push("(");
        }
        self.push_mapped("(", &func.loc, None);
        let params: Vec<ListItem<'_, 'g, 'a>> = func.params.iter().map(ListItem::Js).collect();
        self.gen_list(&params, false)?;
        self.push(") => ");

        let braces = func.newline || func.body.is_some();
        if braces {
            self.push("{");
            self.indent();
        }
        if let Some(returns) = &func.returns {
            if func.newline {
                self.push("return ");
            }
            self.gen_node(returns)?;
        } else if let Some(body) = &func.body {
            self.gen_node(body)?;
        }
        if braces {
            self.deindent(false);
            self.push("}");
        }
        if func.is_slot {
            if func.is_non_scoped_slot {
                self.push(", undefined, true");
            }
            self.push(")");
        }
        Ok(())
    }

    fn gen_conditional(&mut self, cond: &ConditionalExpression) -> Result {
        match &cond.test {
            JsNode::Simple(test) => {
                let parens = !is_simple_identifier(&test.content);
                if parens {
                    self.push("(");
                }
                self.gen_expression(test);
                if parens {
                    self.push(")");
                }
            }
            test => {
                self.push("(");
                self.gen_node(test)?;
                self.push(")");
            }
        }

        if cond.newline {
            self.indent();
        }
        *self.indent_level_mut() += 1;
        if !cond.newline {
            self.push(" ");
        }
        self.push("? ");
        self.gen_node(&cond.consequent)?;
        *self.indent_level_mut() -= 1;
        if cond.newline {
            self.newline();
        } else {
            self.push(" ");
        }
        self.push(": ");

        let nested = matches!(cond.alternate, JsNode::Conditional(_));
        if !nested {
            *self.indent_level_mut() += 1;
        }
        self.gen_node(&cond.alternate)?;
        if !nested {
            *self.indent_level_mut() -= 1;
        }
        if cond.newline {
            self.deindent(true);
        }
        Ok(())
    }

    fn gen_cache(&mut self, cache: &CacheExpression) -> Result {
        let index = cache.index;
        if cache.need_array_spread {
            self.push("[...(");
        }
        self.push(&format!("_cache[{}] || (", index));
        if cache.need_pause_tracking {
            self.indent();
            self.push_helper(RuntimeHelper::SetBlockTracking);
            self.push("(-1");
            if cache.in_v_once {
                self.push(", true");
            }
            self.push("),");
            self.newline();
            self.push("(");
        }
        self.push(&format!("_cache[{}] = ", index));
        self.gen_node(&cache.value)?;
        if cache.need_pause_tracking {
            self.push(&format!(").cacheIndex = {},", index));
            self.newline();
            self.push_helper(RuntimeHelper::SetBlockTracking);
            self.push("(1),");
            self.newline();
            self.push(&format!("_cache[{}]", index));
            self.deindent(false);
        }
        self.push(")");
        if cache.need_array_spread {
            self.push(")]");
        }
        Ok(())
    }

    fn gen_block(&mut self, block: &BlockStatement) -> Result {
        let items: Vec<ListItem<'_, 'g, 'a>> = block.body.iter().map(ListItem::Js).collect();
        self.gen_list_with(&items, true, false)
    }

    fn gen_if(&mut self, stmt: &IfStatement) -> Result {
        self.push("if (");
        self.gen_node(&stmt.test)?;
        self.push(") {");
        self.indent();
        self.gen_block(&stmt.consequent)?;
        self.deindent(false);
        self.push("}");
        match &stmt.alternate {
            None => {}
            Some(IfAlternate::If(nested)) => {
                self.push(" else ");
                self.gen_if(nested)?;
            }
            Some(alternate) => {
                self.push(" else {");
                self.indent();
                match alternate {
                    IfAlternate::Block(block) => self.gen_block(block)?,
                    IfAlternate::Return(ret) => {
                        self.push("return ");
                        self.gen_node(&ret.returns)?;
                    }
                    IfAlternate::If(_) => {}
                }
                self.deindent(false);
                self.push("}");
            }
        }
        Ok(())
    }
}

/// Escape static text placed in a template literal.
pub fn escape_template(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '`' | '$' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
