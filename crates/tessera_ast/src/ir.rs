//! Codegen IR.
//!
//! A small expression-and-statement tree shared by the client and server
//! backends. It is owned (no arena lifetime) and independent of the
//! template AST: wherever generated code needs a template node, the IR holds
//! a [`NodeId`] reference that the printer resolves against the final tree.
//! That way later passes (hoisting, stringification) can rewrite a node's
//! codegen slot or splice a children list and every reference observes it.

use tessera_arena::{PatchFlags, String};

use crate::ast::{
    CommentNode, CompoundExpressionNode, ConstantType, ExpressionNode, InterpolationNode, NodeId,
    SimpleExpressionNode, SourceLocation, TextNode,
};
use crate::helpers::RuntimeHelper;

/// Any IR node
#[derive(Debug, Clone)]
pub enum JsNode {
    /// Code emitted verbatim
    Raw(String),
    /// Reference to a runtime helper, printed as `_name`
    Helper(RuntimeHelper),
    Simple(SimpleExpressionNode),
    Compound(CompoundExpressionNode),
    /// Text child, printed as a string literal
    Text(TextNode),
    Comment(CommentNode),
    Interpolation(InterpolationNode),
    /// The codegen of one template node
    Node(NodeId),
    /// The current children of a container node, printed as an array
    Children(NodeId),
    VNodeCall(Box<VNodeCall>),
    Call(Box<CallExpression>),
    Object(ObjectExpression),
    Array(ArrayExpression),
    Function(Box<FunctionExpression>),
    Conditional(Box<ConditionalExpression>),
    Cache(Box<CacheExpression>),
    Assignment(Box<AssignmentExpression>),
    Sequence(SequenceExpression),
    TemplateLiteral(TemplateLiteral),
    If(Box<IfStatement>),
    Block(BlockStatement),
    Return(Box<ReturnStatement>),
}

impl JsNode {
    pub fn raw(code: impl Into<String>) -> Self {
        Self::Raw(code.into())
    }

    /// A string literal value.
    pub fn string_literal(value: &str) -> Self {
        Self::Raw(tessera_arena::to_js_string_literal(value))
    }

    pub fn expression(exp: ExpressionNode) -> Self {
        match exp {
            ExpressionNode::Simple(s) => Self::Simple(s),
            ExpressionNode::Compound(c) => Self::Compound(c),
        }
    }

    pub fn as_vnode_call(&self) -> Option<&VNodeCall> {
        match self {
            Self::VNodeCall(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_vnode_call_mut(&mut self) -> Option<&mut VNodeCall> {
        match self {
            Self::VNodeCall(call) => Some(call),
            _ => None,
        }
    }

    pub fn loc(&self) -> Option<&SourceLocation> {
        match self {
            Self::Simple(s) => Some(&s.loc),
            Self::Compound(c) => Some(&c.loc),
            Self::Text(t) => Some(&t.loc),
            Self::Comment(c) => Some(&c.loc),
            Self::Interpolation(i) => Some(&i.loc),
            Self::VNodeCall(v) => Some(&v.loc),
            Self::Call(c) => Some(&c.loc),
            Self::Object(o) => Some(&o.loc),
            Self::Array(a) => Some(&a.loc),
            Self::Function(f) => Some(&f.loc),
            Self::Conditional(c) => Some(&c.loc),
            Self::Cache(c) => Some(&c.loc),
            _ => None,
        }
    }
}

impl From<ExpressionNode> for JsNode {
    fn from(exp: ExpressionNode) -> Self {
        Self::expression(exp)
    }
}

/// Element or component creation call
#[derive(Debug, Clone)]
pub struct VNodeCall {
    /// `"div"`, `_component_foo`, a helper symbol, or a resolve call
    pub tag: JsNode,
    pub props: Option<JsNode>,
    pub children: Option<JsNode>,
    pub patch_flag: Option<PatchFlags>,
    /// `["id", "title"]`, or an expression for dynamic key lists
    pub dynamic_props: Option<JsNode>,
    pub directives: Option<ArrayExpression>,
    pub is_block: bool,
    pub disable_tracking: bool,
    pub is_component: bool,
    pub loc: SourceLocation,
}

/// Function callee
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    Helper(RuntimeHelper),
    Raw(String),
}

#[derive(Debug, Clone)]
pub struct CallExpression {
    pub callee: Callee,
    pub arguments: Vec<JsNode>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct ObjectExpression {
    pub properties: Vec<Property>,
    pub loc: SourceLocation,
}

impl ObjectExpression {
    pub fn find(&self, key: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.static_key() == Some(key))
    }
}

#[derive(Debug, Clone)]
pub struct Property {
    pub key: ExpressionNode,
    pub value: JsNode,
    pub loc: SourceLocation,
}

impl Property {
    pub fn static_key(&self) -> Option<&str> {
        match &self.key {
            ExpressionNode::Simple(s) if s.is_static => Some(s.content.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArrayExpression {
    pub elements: Vec<JsNode>,
    pub loc: SourceLocation,
}

/// Arrow function
#[derive(Debug, Clone)]
pub struct FunctionExpression {
    pub params: Vec<JsNode>,
    pub returns: Option<JsNode>,
    pub body: Option<JsNode>,
    /// Put the returned value on its own line
    pub newline: bool,
    /// Wrap in `withCtx`
    pub is_slot: bool,
    pub is_non_scoped_slot: bool,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct ConditionalExpression {
    pub test: JsNode,
    pub consequent: JsNode,
    pub alternate: JsNode,
    pub newline: bool,
    pub loc: SourceLocation,
}

/// `_cache[index] || (_cache[index] = value)`
#[derive(Debug, Clone)]
pub struct CacheExpression {
    pub index: u32,
    pub value: JsNode,
    pub need_pause_tracking: bool,
    pub in_v_once: bool,
    pub need_array_spread: bool,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct AssignmentExpression {
    pub left: JsNode,
    pub right: JsNode,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct SequenceExpression {
    pub expressions: Vec<JsNode>,
    pub loc: SourceLocation,
}

/// Backtick string; literal parts are escaped by the printer
#[derive(Debug, Clone)]
pub struct TemplateLiteral {
    pub elements: Vec<TemplateLiteralPart>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub enum TemplateLiteralPart {
    Str(String),
    Expr(JsNode),
}

#[derive(Debug, Clone)]
pub struct IfStatement {
    pub test: JsNode,
    pub consequent: BlockStatement,
    pub alternate: Option<IfAlternate>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub enum IfAlternate {
    If(Box<IfStatement>),
    Block(BlockStatement),
    Return(Box<ReturnStatement>),
}

#[derive(Debug, Clone, Default)]
pub struct BlockStatement {
    pub body: Vec<JsNode>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub returns: JsNode,
    pub loc: SourceLocation,
}

// ============================================================================
// Builders
// ============================================================================

pub fn create_call_expression(callee: Callee, arguments: Vec<JsNode>, loc: SourceLocation) -> JsNode {
    JsNode::Call(Box::new(CallExpression {
        callee,
        arguments,
        loc,
    }))
}

pub fn create_helper_call(helper: RuntimeHelper, arguments: Vec<JsNode>) -> JsNode {
    create_call_expression(Callee::Helper(helper), arguments, SourceLocation::STUB)
}

pub fn create_object_expression(properties: Vec<Property>, loc: SourceLocation) -> JsNode {
    JsNode::Object(ObjectExpression { properties, loc })
}

/// A property with a static string key.
pub fn create_object_property(key: &str, value: JsNode) -> Property {
    Property {
        key: ExpressionNode::Simple(SimpleExpressionNode::new(key, true, SourceLocation::STUB)),
        value,
        loc: SourceLocation::STUB,
    }
}

pub fn create_array_expression(elements: Vec<JsNode>, loc: SourceLocation) -> JsNode {
    JsNode::Array(ArrayExpression { elements, loc })
}

pub fn create_function_expression(
    params: Vec<JsNode>,
    returns: Option<JsNode>,
    newline: bool,
    is_slot: bool,
    loc: SourceLocation,
) -> FunctionExpression {
    FunctionExpression {
        params,
        returns,
        body: None,
        newline,
        is_slot,
        is_non_scoped_slot: false,
        loc,
    }
}

pub fn create_conditional_expression(
    test: JsNode,
    consequent: JsNode,
    alternate: JsNode,
    newline: bool,
) -> JsNode {
    JsNode::Conditional(Box::new(ConditionalExpression {
        test,
        consequent,
        alternate,
        newline,
        loc: SourceLocation::STUB,
    }))
}

pub fn create_cache_expression(index: u32, value: JsNode, need_pause_tracking: bool, in_v_once: bool) -> JsNode {
    let loc = value.loc().cloned().unwrap_or_default();
    JsNode::Cache(Box::new(CacheExpression {
        index,
        value,
        need_pause_tracking,
        in_v_once,
        need_array_spread: false,
        loc,
    }))
}

pub fn create_assignment_expression(left: JsNode, right: JsNode) -> JsNode {
    JsNode::Assignment(Box::new(AssignmentExpression {
        left,
        right,
        loc: SourceLocation::STUB,
    }))
}

pub fn create_sequence_expression(expressions: Vec<JsNode>) -> JsNode {
    JsNode::Sequence(SequenceExpression {
        expressions,
        loc: SourceLocation::STUB,
    })
}

pub fn create_template_literal(elements: Vec<TemplateLiteralPart>) -> TemplateLiteral {
    TemplateLiteral {
        elements,
        loc: SourceLocation::STUB,
    }
}

pub fn create_block_statement(body: Vec<JsNode>) -> BlockStatement {
    BlockStatement {
        body,
        loc: SourceLocation::STUB,
    }
}

pub fn create_if_statement(
    test: JsNode,
    consequent: BlockStatement,
    alternate: Option<IfAlternate>,
) -> IfStatement {
    IfStatement {
        test,
        consequent,
        alternate,
        loc: SourceLocation::STUB,
    }
}

pub fn create_return_statement(returns: JsNode) -> JsNode {
    JsNode::Return(Box::new(ReturnStatement {
        returns,
        loc: SourceLocation::STUB,
    }))
}

/// A constant simple expression used as a static key or literal.
pub fn create_static_key(content: &str) -> ExpressionNode {
    ExpressionNode::Simple(
        SimpleExpressionNode::new(content, true, SourceLocation::STUB)
            .with_const_type(ConstantType::CanStringify),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_find_by_static_key() {
        let obj = ObjectExpression {
            properties: vec![
                create_object_property("id", JsNode::string_literal("foo")),
                create_object_property("class", JsNode::raw("_ctx.cls")),
            ],
            loc: SourceLocation::STUB,
        };
        assert!(obj.find("class").is_some());
        assert!(obj.find("style").is_none());
    }

    #[test]
    fn test_string_literal_is_quoted() {
        match JsNode::string_literal("a\"b") {
            JsNode::Raw(code) => assert_eq!(code, "\"a\\\"b\""),
            other => panic!("unexpected {:?}", other),
        }
    }
}
