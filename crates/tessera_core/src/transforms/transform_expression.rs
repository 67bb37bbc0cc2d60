//! Expression transform.
//!
//! Rewrites free identifiers in directive values and interpolations to the
//! access path of the binding they resolve to (`_ctx.foo`, `$setup.foo`,
//! `foo.value` ...). Names bound by an enclosing `v-for` / `v-slot`, or
//! declared inside the expression itself, are left alone.
//!
//! The JavaScript side is handled by [`parse_expression`], a pure function
//! that parses the source with oxc and reports every identifier reference
//! together with the syntactic facts the rewriter needs. The rewriter then
//! splits the original text into a compound expression around those spans.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, ArrowFunctionExpression, AssignmentExpression, AssignmentTarget, BindingIdentifier,
    BindingPattern, BlockStatement, CallExpression, CatchClause, ComputedMemberExpression,
    Expression, ForInStatement, ForOfStatement, ForStatement, ForStatementInit, ForStatementLeft,
    FormalParameters, Function, FunctionBody, IdentifierReference, NewExpression,
    ObjectProperty, PrivateFieldExpression, SimpleAssignmentTarget, Statement,
    StaticMemberExpression, TSType, UpdateExpression,
};
use oxc_ast_visit::{walk, Visit};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};
use oxc_syntax::scope::ScopeFlags;
use once_cell::sync::Lazy;
use regex::Regex;
use tessera_arena::{
    is_globally_allowed, is_literal_whitelisted, is_simple_identifier, FxHashMap, FxHashSet,
    String,
};
use tessera_ast::{
    BindingType, CompilerError, CompoundExpressionNode, CompoundPart, ConstantType, ErrorCode,
    ExpressionNode, PropNode, RuntimeHelper, SimpleExpressionNode, SourceLocation,
    TemplateChildNode,
};
use tessera_parser::cursor::advance_position;

use crate::transform::{ExitFn, NodeCursor, NodeTransform, TransformContext, Walker};
use crate::utils::gen_props_access_exp;

// ============================================================================
// Pure parsing
// ============================================================================

/// How the source text is wrapped before parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionMode {
    /// A single expression
    Expression,
    /// A parameter list (`v-slot`, `v-for` aliases)
    Params,
    /// One or more statements (inline `v-on` handlers)
    Statements,
}

/// Assignment whose left side is a bare identifier
#[derive(Debug, Clone)]
pub struct AssignmentSite {
    pub operator: &'static str,
    pub right_start: usize,
    pub right_end: usize,
    /// Names declared inside the expression that are visible at this point
    pub locals: std::vec::Vec<String>,
}

/// `x++` / `--x` on a bare identifier
#[derive(Debug, Clone, Copy)]
pub struct UpdateSite {
    pub start: usize,
    pub end: usize,
    pub prefix: bool,
    pub operator: &'static str,
}

/// One identifier reference, with offsets into the unwrapped source
#[derive(Debug, Clone)]
pub struct ExpressionIdentifier {
    pub name: String,
    pub start: usize,
    pub end: usize,
    /// Bound by a function, block or catch clause inside the expression
    pub local: bool,
    /// Direct child of a call, `new` or member expression
    pub in_call_or_member: bool,
    /// Value of a `{ foo }` shorthand property
    pub shorthand: bool,
    pub in_destructure: bool,
    pub in_new: bool,
    pub assignment: Option<AssignmentSite>,
    pub update: Option<UpdateSite>,
}

/// Result of [`parse_expression`]
#[derive(Debug, Default)]
pub struct ParsedExpression {
    /// References in source order
    pub identifiers: std::vec::Vec<ExpressionIdentifier>,
    /// Names the root expression itself declares (function parameters)
    pub declared: std::vec::Vec<String>,
}

/// Parse `source` and collect its identifier references.
///
/// The source is wrapped as `(source)`, `(source)=>{}` or ` source `
/// according to `mode`; reported offsets are relative to `source`.
pub fn parse_expression(
    source: &str,
    mode: ExpressionMode,
    is_ts: bool,
) -> Result<ParsedExpression, std::string::String> {
    let wrapped = match mode {
        ExpressionMode::Expression => format!("({})", source),
        ExpressionMode::Params => format!("({})=>{{}}", source),
        ExpressionMode::Statements => format!(" {} ", source),
    };
    let allocator = Allocator::default();
    let source_type = SourceType::default()
        .with_module(true)
        .with_typescript(is_ts);
    let parser = Parser::new(&allocator, &wrapped, source_type);

    let mut collector = IdentifierCollector::default();
    match mode {
        ExpressionMode::Statements => {
            let ret = parser.parse();
            if ret.panicked || !ret.errors.is_empty() {
                return Err(diagnostic_message(ret.errors.iter().map(|e| e.to_string())));
            }
            if let Some(Statement::ExpressionStatement(stmt)) = ret.program.body.first() {
                collector.root_span = Some(unwrap_parens(&stmt.expression).span());
            }
            collector.visit_program(&ret.program);
        }
        _ => {
            let expr = parser
                .parse_expression()
                .map_err(|errors| diagnostic_message(errors.iter().map(|e| e.to_string())))?;
            collector.root_span = Some(unwrap_parens(&expr).span());
            collector.visit_expression(&expr);
        }
    }
    Ok(collector.finish())
}

fn diagnostic_message(messages: impl Iterator<Item = std::string::String>) -> std::string::String {
    let joined: std::vec::Vec<_> = messages.collect();
    if joined.is_empty() {
        std::string::String::from("unexpected end of expression")
    } else {
        joined.join("; ")
    }
}

fn unwrap_parens<'e, 'a>(expr: &'e Expression<'a>) -> &'e Expression<'a> {
    match expr {
        Expression::ParenthesizedExpression(paren) => unwrap_parens(&paren.expression),
        _ => expr,
    }
}

/// Collects names bound by a pattern or parameter list
#[derive(Default)]
struct BindingNames(std::vec::Vec<String>);

impl<'a> Visit<'a> for BindingNames {
    fn visit_binding_identifier(&mut self, it: &BindingIdentifier<'a>) {
        self.0.push(String::from(it.name.as_str()));
    }

    // default values are evaluated, not bound
    fn visit_expression(&mut self, _it: &Expression<'a>) {}
}

fn pattern_names(pattern: &BindingPattern<'_>) -> std::vec::Vec<String> {
    let mut names = BindingNames::default();
    names.visit_binding_pattern(pattern);
    names.0
}

fn param_names(params: &FormalParameters<'_>) -> std::vec::Vec<String> {
    let mut names = BindingNames::default();
    names.visit_formal_parameters(params);
    names.0
}

fn block_declarations(body: &[Statement<'_>]) -> std::vec::Vec<String> {
    let mut names = std::vec::Vec::new();
    for stmt in body {
        match stmt {
            Statement::VariableDeclaration(decl) if !decl.declare => {
                for d in &decl.declarations {
                    names.extend(pattern_names(&d.id));
                }
            }
            Statement::FunctionDeclaration(func) if !func.declare => {
                if let Some(id) = &func.id {
                    names.push(String::from(id.name.as_str()));
                }
            }
            Statement::ClassDeclaration(class) if !class.declare => {
                if let Some(id) = &class.id {
                    names.push(String::from(id.name.as_str()));
                }
            }
            _ => {}
        }
    }
    names
}

#[derive(Default)]
struct IdentifierCollector {
    root_span: Option<oxc_span::Span>,
    known: FxHashMap<String, u32>,
    identifiers: std::vec::Vec<ExpressionIdentifier>,
    call_or_member: FxHashSet<u32>,
    shorthand: FxHashSet<u32>,
    in_new: FxHashSet<u32>,
    assignments: FxHashMap<u32, AssignmentSite>,
    updates: FxHashMap<u32, UpdateSite>,
    destructure_depth: u32,
    declared: std::vec::Vec<String>,
}

impl IdentifierCollector {
    fn push_scope(&mut self, names: &[String]) {
        for name in names {
            *self.known.entry(name.clone()).or_insert(0) += 1;
        }
    }

    fn pop_scope(&mut self, names: &[String]) {
        for name in names {
            if let Some(count) = self.known.get_mut(name) {
                *count -= 1;
                if *count == 0 {
                    self.known.remove(name);
                }
            }
        }
    }

    fn is_root(&self, span: oxc_span::Span) -> bool {
        self.root_span == Some(span)
    }

    fn mark_direct_ident(set: &mut FxHashSet<u32>, expr: &Expression<'_>) {
        if let Expression::Identifier(id) = expr {
            set.insert(id.span.start);
        }
    }

    fn mark_arguments(set: &mut FxHashSet<u32>, arguments: &[Argument<'_>]) {
        for arg in arguments {
            if let Argument::Identifier(id) = arg {
                set.insert(id.span.start);
            }
        }
    }

    fn finish(mut self) -> ParsedExpression {
        for id in &mut self.identifiers {
            let key = id.start as u32 + 1;
            id.in_call_or_member = self.call_or_member.contains(&key);
            id.shorthand = self.shorthand.contains(&key);
            id.in_new = self.in_new.contains(&key);
            id.assignment = self.assignments.remove(&key);
            id.update = self.updates.get(&key).copied();
        }
        ParsedExpression {
            identifiers: self.identifiers,
            declared: self.declared,
        }
    }

    fn scoped_function(&mut self, span: oxc_span::Span, names: std::vec::Vec<String>, body: impl FnOnce(&mut Self)) {
        self.push_scope(&names);
        body(self);
        if self.is_root(span) {
            // parameters of the root function stay visible to the caller
            self.declared.extend(names);
        } else {
            self.pop_scope(&names);
        }
    }
}

impl<'a> Visit<'a> for IdentifierCollector {
    fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
        let name = it.name.as_str();
        self.identifiers.push(ExpressionIdentifier {
            name: String::from(name),
            // spans include the one-character wrapper prefix
            start: it.span.start as usize - 1,
            end: it.span.end as usize - 1,
            local: self.known.contains_key(name),
            in_call_or_member: false,
            shorthand: false,
            in_destructure: self.destructure_depth > 0,
            in_new: false,
            assignment: None,
            update: None,
        });
    }

    fn visit_arrow_function_expression(&mut self, it: &ArrowFunctionExpression<'a>) {
        let names = param_names(&it.params);
        self.scoped_function(it.span, names, |this| {
            walk::walk_arrow_function_expression(this, it);
        });
    }

    fn visit_function(&mut self, it: &Function<'a>, flags: ScopeFlags) {
        let names = param_names(&it.params);
        self.scoped_function(it.span, names, |this| {
            walk::walk_function(this, it, flags);
        });
    }

    fn visit_function_body(&mut self, it: &FunctionBody<'a>) {
        let names = block_declarations(&it.statements);
        self.push_scope(&names);
        walk::walk_function_body(self, it);
        self.pop_scope(&names);
    }

    fn visit_block_statement(&mut self, it: &BlockStatement<'a>) {
        let names = block_declarations(&it.body);
        self.push_scope(&names);
        walk::walk_block_statement(self, it);
        self.pop_scope(&names);
    }

    fn visit_catch_clause(&mut self, it: &CatchClause<'a>) {
        let names = it
            .param
            .as_ref()
            .map(|p| pattern_names(&p.pattern))
            .unwrap_or_default();
        self.push_scope(&names);
        walk::walk_catch_clause(self, it);
        self.pop_scope(&names);
    }

    fn visit_for_statement(&mut self, it: &ForStatement<'a>) {
        let mut names = std::vec::Vec::new();
        if let Some(ForStatementInit::VariableDeclaration(decl)) = &it.init {
            for d in &decl.declarations {
                names.extend(pattern_names(&d.id));
            }
        }
        self.push_scope(&names);
        walk::walk_for_statement(self, it);
        self.pop_scope(&names);
    }

    fn visit_for_in_statement(&mut self, it: &ForInStatement<'a>) {
        let names = for_left_names(&it.left);
        self.push_scope(&names);
        walk::walk_for_in_statement(self, it);
        self.pop_scope(&names);
    }

    fn visit_for_of_statement(&mut self, it: &ForOfStatement<'a>) {
        let names = for_left_names(&it.left);
        self.push_scope(&names);
        walk::walk_for_of_statement(self, it);
        self.pop_scope(&names);
    }

    fn visit_object_property(&mut self, it: &ObjectProperty<'a>) {
        if it.shorthand {
            if let Expression::Identifier(id) = &it.value {
                self.shorthand.insert(id.span.start);
            }
            // the key and value share a span; only the value is a reference
            self.visit_expression(&it.value);
            return;
        }
        walk::walk_object_property(self, it);
    }

    fn visit_assignment_expression(&mut self, it: &AssignmentExpression<'a>) {
        match &it.left {
            AssignmentTarget::AssignmentTargetIdentifier(id) => {
                let right = it.right.span();
                let mut locals: std::vec::Vec<String> = self.known.keys().cloned().collect();
                locals.sort();
                self.assignments.insert(
                    id.span.start,
                    AssignmentSite {
                        operator: it.operator.as_str(),
                        right_start: right.start as usize - 1,
                        right_end: right.end as usize - 1,
                        locals,
                    },
                );
                walk::walk_assignment_expression(self, it);
            }
            AssignmentTarget::ArrayAssignmentTarget(_) | AssignmentTarget::ObjectAssignmentTarget(_) => {
                self.destructure_depth += 1;
                self.visit_assignment_target(&it.left);
                self.destructure_depth -= 1;
                self.visit_expression(&it.right);
            }
            _ => walk::walk_assignment_expression(self, it),
        }
    }

    fn visit_update_expression(&mut self, it: &UpdateExpression<'a>) {
        if let SimpleAssignmentTarget::AssignmentTargetIdentifier(id) = &it.argument {
            self.updates.insert(
                id.span.start,
                UpdateSite {
                    start: it.span.start as usize - 1,
                    end: it.span.end as usize - 1,
                    prefix: it.prefix,
                    operator: it.operator.as_str(),
                },
            );
        }
        walk::walk_update_expression(self, it);
    }

    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        Self::mark_direct_ident(&mut self.call_or_member, &it.callee);
        Self::mark_arguments(&mut self.call_or_member, &it.arguments);
        walk::walk_call_expression(self, it);
    }

    fn visit_new_expression(&mut self, it: &NewExpression<'a>) {
        Self::mark_direct_ident(&mut self.call_or_member, &it.callee);
        Self::mark_arguments(&mut self.call_or_member, &it.arguments);
        Self::mark_arguments(&mut self.in_new, &it.arguments);
        // `new a.b.C()` wraps the base object as well
        let mut callee = &it.callee;
        loop {
            match callee {
                Expression::StaticMemberExpression(m) => callee = &m.object,
                Expression::ComputedMemberExpression(m) => callee = &m.object,
                _ => break,
            }
        }
        Self::mark_direct_ident(&mut self.in_new, callee);
        walk::walk_new_expression(self, it);
    }

    fn visit_static_member_expression(&mut self, it: &StaticMemberExpression<'a>) {
        Self::mark_direct_ident(&mut self.call_or_member, &it.object);
        walk::walk_static_member_expression(self, it);
    }

    fn visit_computed_member_expression(&mut self, it: &ComputedMemberExpression<'a>) {
        Self::mark_direct_ident(&mut self.call_or_member, &it.object);
        Self::mark_direct_ident(&mut self.call_or_member, &it.expression);
        walk::walk_computed_member_expression(self, it);
    }

    fn visit_private_field_expression(&mut self, it: &PrivateFieldExpression<'a>) {
        Self::mark_direct_ident(&mut self.call_or_member, &it.object);
        walk::walk_private_field_expression(self, it);
    }

    // type positions never reference runtime bindings
    fn visit_ts_type(&mut self, _it: &TSType<'a>) {}
}

fn for_left_names(left: &ForStatementLeft<'_>) -> std::vec::Vec<String> {
    let mut names = std::vec::Vec::new();
    if let ForStatementLeft::VariableDeclaration(decl) = left {
        for d in &decl.declarations {
            names.extend(pattern_names(&d.id));
        }
    }
    names
}

// ============================================================================
// Rewriting
// ============================================================================

/// Calls or non-numeric member access keep an identifier-free expression
/// from being treated as a constant.
static CONSTANT_BAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w\s*\(|\.[^\d]").expect("valid regex"));

fn binding_type(ctx: &TransformContext<'_>, name: &str) -> Option<BindingType> {
    ctx.options
        .binding_metadata
        .as_ref()
        .and_then(|meta| meta.get(name))
}

fn is_const_binding(binding: Option<BindingType>) -> bool {
    matches!(
        binding,
        Some(BindingType::SetupConst | BindingType::LiteralConst)
    )
}

fn props_alias(ctx: &TransformContext<'_>, name: &str) -> std::string::String {
    ctx.options
        .binding_metadata
        .as_ref()
        .and_then(|meta| meta.props_aliases.get(name).cloned())
        .unwrap_or_else(|| name.to_string())
}

/// Whether a free identifier gets an access path at all.
fn can_prefix(name: &str) -> bool {
    !is_globally_allowed(name) && name != "require"
}

/// Where in the expression an identifier sits, for bindings whose access
/// differs between reads and writes.
#[derive(Default)]
struct Site<'s> {
    assignment: Option<&'s AssignmentSite>,
    update: Option<UpdateSite>,
    in_destructure: bool,
    in_new: bool,
}

fn rewrite_identifier(
    raw: &str,
    source: &str,
    site: &Site<'_>,
    locals: &[String],
    ctx: &mut TransformContext<'_>,
) -> std::string::String {
    let binding = binding_type(ctx, raw);

    if ctx.options.inline {
        let ts_ignore = if ctx.options.is_ts { " //@ts-ignore\n" } else { "" };
        let unref = |ctx: &mut TransformContext<'_>| {
            let wrapped = format!("{}({})", ctx.helper_string(RuntimeHelper::Unref), raw);
            if site.in_new {
                format!("({})", wrapped)
            } else {
                wrapped
            }
        };
        let is_local = locals.iter().any(|l| l == raw);
        return match binding {
            Some(BindingType::SetupConst | BindingType::LiteralConst | BindingType::SetupReactiveConst) => {
                raw.to_string()
            }
            _ if is_local => raw.to_string(),
            Some(BindingType::SetupRef) => format!("{}.value", raw),
            Some(BindingType::SetupMaybeRef) => {
                if site.assignment.is_some() || site.update.is_some() || site.in_destructure {
                    format!("{}.value", raw)
                } else {
                    unref(ctx)
                }
            }
            Some(BindingType::SetupLet) => {
                if let Some(assign) = site.assignment {
                    let right = &source[assign.right_start..assign.right_end];
                    let right_exp = SimpleExpressionNode::new(right, false, SourceLocation::STUB);
                    let right_code =
                        process_with_locals(&right_exp, ctx, ExpressionMode::Expression, &assign.locals)
                            .to_code();
                    let is_ref = ctx.helper_string(RuntimeHelper::IsRef);
                    format!(
                        "{}({}){} ? {}.value {} {} : {}",
                        is_ref, raw, ts_ignore, raw, assign.operator, right_code, raw
                    )
                } else if let Some(update) = site.update {
                    let is_ref = ctx.helper_string(RuntimeHelper::IsRef);
                    let (pre, post) = if update.prefix {
                        (update.operator, "")
                    } else {
                        ("", update.operator)
                    };
                    format!(
                        "{}({}){} ? {}{}.value{} : {}{}{}",
                        is_ref, raw, ts_ignore, pre, raw, post, pre, raw, post
                    )
                } else if site.in_destructure {
                    raw.to_string()
                } else {
                    unref(ctx)
                }
            }
            Some(BindingType::Props) => gen_props_access_exp(raw),
            Some(BindingType::PropsAliased) => gen_props_access_exp(&props_alias(ctx, raw)),
            _ => format!("_ctx.{}", raw),
        };
    }

    match binding {
        Some(
            BindingType::SetupLet
            | BindingType::SetupMaybeRef
            | BindingType::SetupRef
            | BindingType::SetupReactiveConst
            | BindingType::SetupConst
            | BindingType::LiteralConst,
        ) => format!("$setup.{}", raw),
        Some(BindingType::PropsAliased) => format!("$props['{}']", props_alias(ctx, raw)),
        Some(BindingType::Props) => format!("$props.{}", raw),
        Some(BindingType::Data) => format!("$data.{}", raw),
        Some(BindingType::Options) => format!("$options.{}", raw),
        None => format!("_ctx.{}", raw),
    }
}

/// Rewrite the free identifiers of an expression.
///
/// With `as_params` the content is a parameter list whose names are
/// reported through the result's `identifiers`; with `as_raw_statements`
/// it may hold several statements. Without identifier prefixing the
/// expression is returned unchanged.
pub fn process_expression(
    exp: &SimpleExpressionNode,
    ctx: &mut TransformContext<'_>,
    as_params: bool,
    as_raw_statements: bool,
) -> ExpressionNode {
    let mode = if as_raw_statements {
        ExpressionMode::Statements
    } else if as_params {
        ExpressionMode::Params
    } else {
        ExpressionMode::Expression
    };
    process_with_locals(exp, ctx, mode, &[])
}

fn process_with_locals(
    exp: &SimpleExpressionNode,
    ctx: &mut TransformContext<'_>,
    mode: ExpressionMode,
    locals: &[String],
) -> ExpressionNode {
    if !ctx.prefix_identifiers() || exp.content.trim().is_empty() {
        return ExpressionNode::Simple(exp.clone());
    }
    let raw = exp.content.as_str();

    if is_simple_identifier(raw) {
        let mut node = exp.clone();
        let is_scope_ref = ctx.is_identifier(raw) || locals.iter().any(|l| l == raw);
        let is_allowed_global = is_globally_allowed(raw);
        let is_literal = is_literal_whitelisted(raw);
        let binding = binding_type(ctx, raw);
        if mode != ExpressionMode::Params
            && !is_scope_ref
            && !is_literal
            && (!is_allowed_global || binding.is_some())
        {
            if is_const_binding(binding) {
                node.const_type = ConstantType::CanSkipPatch;
            }
            node.content = rewrite_identifier(raw, raw, &Site::default(), locals, ctx).into();
        } else if !is_scope_ref {
            node.const_type = if is_literal {
                ConstantType::CanStringify
            } else {
                ConstantType::CanHoist
            };
        }
        return ExpressionNode::Simple(node);
    }

    let parsed = match parse_expression(raw, mode, ctx.options.is_ts) {
        Ok(parsed) => parsed,
        Err(message) => {
            ctx.on_error(CompilerError::with_detail(
                ErrorCode::InvalidExpression,
                Some(exp.loc.clone()),
                &message,
            ));
            return ExpressionNode::Simple(exp.clone());
        }
    };

    struct Rewritten {
        start: usize,
        end: usize,
        code: std::string::String,
        prefix: Option<std::string::String>,
        constant: bool,
    }

    let mut ids: std::vec::Vec<Rewritten> = std::vec::Vec::with_capacity(parsed.identifiers.len());
    for id in &parsed.identifiers {
        let name = id.name.as_str();
        let is_local =
            id.local || ctx.is_identifier(name) || locals.iter().any(|l| l == name);
        let need_prefix = can_prefix(name);
        if need_prefix && !is_local {
            let site = Site {
                assignment: id.assignment.as_ref(),
                update: id.update,
                in_destructure: id.in_destructure,
                in_new: id.in_new,
            };
            let code = rewrite_identifier(name, raw, &site, locals, ctx);
            let (start, end) = match (id.update, binding_type(ctx, name), ctx.options.inline) {
                (Some(update), Some(BindingType::SetupLet), true) => (update.start, update.end),
                _ => (id.start, id.end),
            };
            ids.push(Rewritten {
                start,
                end,
                code,
                prefix: id.shorthand.then(|| format!("{}: ", name)),
                constant: false,
            });
        } else {
            ids.push(Rewritten {
                start: id.start,
                end: id.end,
                code: name.to_string(),
                prefix: None,
                constant: !(need_prefix && is_local) && !id.in_call_or_member,
            });
        }
    }
    ids.sort_by_key(|id| id.start);

    let mut parts = std::vec::Vec::with_capacity(ids.len() * 2 + 1);
    let mut last_end = 0;
    for (i, id) in ids.iter().enumerate() {
        let leading = &raw[last_end.min(id.start)..id.start];
        if !leading.is_empty() || id.prefix.is_some() {
            let mut code = std::string::String::from(leading);
            if let Some(prefix) = &id.prefix {
                code.push_str(prefix);
            }
            parts.push(CompoundPart::Code(code.into()));
        }
        let loc = SourceLocation::new(
            advance_position(exp.loc.start, raw, id.start),
            advance_position(exp.loc.start, raw, id.end),
            &raw[id.start..id.end],
        );
        let const_type = if id.constant {
            ConstantType::CanStringify
        } else {
            ConstantType::NotConstant
        };
        parts.push(CompoundPart::Simple(
            SimpleExpressionNode::new(id.code.as_str(), false, loc).with_const_type(const_type),
        ));
        last_end = id.end;
        if i == ids.len() - 1 && id.end < raw.len() {
            parts.push(CompoundPart::Code(String::from(&raw[id.end..])));
        }
    }

    let mut ret = if parts.is_empty() {
        let mut node = exp.clone();
        node.const_type = if CONSTANT_BAIL_RE.is_match(raw) {
            ConstantType::NotConstant
        } else {
            ConstantType::CanStringify
        };
        ExpressionNode::Simple(node)
    } else {
        let mut compound = CompoundExpressionNode::new(parts, exp.loc.clone());
        compound.is_handler_key = exp.is_handler_key;
        ExpressionNode::Compound(compound)
    };
    let declared = Some(parsed.declared);
    match &mut ret {
        ExpressionNode::Simple(s) => s.identifiers = declared,
        ExpressionNode::Compound(c) => c.identifiers = declared,
    }
    ret
}

/// Stringified code of a processed expression.
pub fn stringify_expression(exp: &ExpressionNode) -> std::string::String {
    exp.to_code()
}

// ============================================================================
// Node transform
// ============================================================================

/// Processes interpolations and the expressions of non-structural
/// directives.
pub struct TransformExpression;

impl<'a> NodeTransform<'a> for TransformExpression {
    fn enter(
        &self,
        cursor: &mut NodeCursor<'_, 'a>,
        ctx: &mut TransformContext<'a>,
        _walker: &Walker<'_>,
    ) -> Option<ExitFn<'a>> {
        match cursor.node_mut() {
            TemplateChildNode::Interpolation(interp) => {
                if let ExpressionNode::Simple(s) = &interp.content {
                    interp.content = process_expression(s, ctx, false, false);
                }
            }
            TemplateChildNode::Element(el) => {
                // a memoized loop item has its key processed by the loop transform
                let key_done = matches!(ctx.parent, crate::transform::ParentInfo::For(_))
                    && crate::utils::find_dir(el, "memo", false).is_some();
                for prop in el.props.iter_mut() {
                    let PropNode::Directive(dir) = prop else {
                        continue;
                    };
                    if dir.name == "for" {
                        continue;
                    }
                    // v-on with an argument wraps inline statements itself
                    let skip_exp = (dir.name == "on" && dir.arg.is_some())
                        || (key_done && dir.static_arg() == Some("key"));
                    if !skip_exp {
                        if let Some(ExpressionNode::Simple(s)) = &dir.exp {
                            let as_params = dir.name == "slot";
                            dir.exp = Some(process_expression(s, ctx, as_params, false));
                        }
                    }
                    if let Some(ExpressionNode::Simple(arg)) = &dir.arg {
                        if !arg.is_static {
                            dir.arg = Some(process_expression(arg, ctx, false, false));
                        }
                    }
                }
            }
            _ => {}
        }
        None
    }
}
