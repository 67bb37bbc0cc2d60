//! Template AST node types.
//!
//! Structural nodes (root, elements, conditionals, loops) are allocated in a
//! bumpalo arena and borrow from it for the lifetime of one compile. Leaf
//! nodes (text, comments, expressions) own their data so they can be copied
//! into the codegen IR without touching the arena.
//!
//! Nodes that transforms or codegen need to refer to from elsewhere carry a
//! [`NodeId`]. Ids are unique within one compile; side tables keyed by them
//! replace any reliance on node identity.

use serde::{Deserialize, Serialize};
use tessera_arena::{Box, Bump, CloneIn, String, Vec};

use crate::ir::JsNode;

/// Stable per-compile node id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The root node always has id 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// Element kind resolved by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum ElementType {
    #[default]
    Element = 0,
    Component = 1,
    Slot = 2,
    Template = 3,
}

/// Markup namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum Namespace {
    #[default]
    Html = 0,
    Svg = 1,
    MathMl = 2,
}

/// How constant an expression or subtree is.
///
/// Ordered from fully dynamic to safely string-serializable. A node is never
/// more constant than the least constant of its props and children.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[repr(u8)]
pub enum ConstantType {
    #[default]
    NotConstant = 0,
    CanSkipPatch = 1,
    CanHoist = 2,
    CanStringify = 3,
}

/// Source position in the template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Position {
    /// Byte offset from start of source
    pub offset: u32,
    /// 1-indexed line number
    pub line: u32,
    /// 1-indexed column number
    pub column: u32,
}

impl Position {
    pub const fn new(offset: u32, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

/// Source location span [start, end)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
    pub source: String,
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::STUB
    }
}

impl SourceLocation {
    /// Location for generated nodes
    pub const STUB: Self = Self {
        start: Position {
            offset: 0,
            line: 1,
            column: 1,
        },
        end: Position {
            offset: 0,
            line: 1,
            column: 1,
        },
        source: String::const_new(""),
    };

    pub fn new(start: Position, end: Position, source: impl Into<String>) -> Self {
        Self {
            start,
            end,
            source: source.into(),
        }
    }

    pub fn is_stub(&self) -> bool {
        self.start.offset == 0 && self.end.offset == 0 && self.source.is_empty()
    }
}

// ============================================================================
// Root
// ============================================================================

/// Import emitted into a module-mode preamble
#[derive(Debug, Clone)]
pub struct ImportItem {
    pub exp: SimpleExpressionNode,
    pub path: String,
}

/// Root of a parsed template
#[derive(Debug)]
pub struct RootNode<'a> {
    pub children: Vec<'a, TemplateChildNode<'a>>,
    /// Runtime helpers referenced by the generated code, in stable order
    pub helpers: std::vec::Vec<crate::RuntimeHelper>,
    /// SSR runtime helpers, imported from the server renderer module
    pub ssr_helpers: std::vec::Vec<crate::RuntimeHelper>,
    pub components: std::vec::Vec<String>,
    pub directives: std::vec::Vec<String>,
    /// Hoisted initializers; `None` marks a slot freed by a later pass
    pub hoists: std::vec::Vec<Option<JsNode>>,
    pub imports: std::vec::Vec<ImportItem>,
    /// Number of cache slots used by the render function
    pub cached: u32,
    pub temps: u32,
    pub source: String,
    pub loc: SourceLocation,
    pub codegen_node: Option<JsNode>,
    pub transformed: bool,
    /// Next free node id
    pub next_id: u32,
    /// Trees that are only reachable from the IR, such as the client
    /// lowering of server slot content
    pub detached: Vec<'a, TemplateChildNode<'a>>,
}

impl<'a> RootNode<'a> {
    pub fn new(allocator: &'a Bump, source: impl Into<String>) -> Self {
        Self {
            children: Vec::new_in(allocator),
            helpers: std::vec::Vec::new(),
            ssr_helpers: std::vec::Vec::new(),
            components: std::vec::Vec::new(),
            directives: std::vec::Vec::new(),
            hoists: std::vec::Vec::new(),
            imports: std::vec::Vec::new(),
            cached: 0,
            temps: 0,
            source: source.into(),
            loc: SourceLocation::STUB,
            codegen_node: None,
            transformed: false,
            next_id: 1,
            detached: Vec::new_in(allocator),
        }
    }

    /// Count every node reachable from the root (used for logging).
    pub fn node_count(&self) -> usize {
        fn count(children: &[TemplateChildNode<'_>]) -> usize {
            children
                .iter()
                .map(|child| {
                    1 + match child {
                        TemplateChildNode::Element(el) => count(&el.children),
                        TemplateChildNode::If(if_node) => if_node
                            .branches
                            .iter()
                            .map(|b| count(&b.children))
                            .sum(),
                        TemplateChildNode::For(for_node) => count(&for_node.children),
                        _ => 0,
                    }
                })
                .sum()
        }
        count(&self.children)
    }
}

// ============================================================================
// Template Nodes
// ============================================================================

/// Any node that may appear in a children list
#[derive(Debug)]
pub enum TemplateChildNode<'a> {
    Element(Box<'a, ElementNode<'a>>),
    Text(Box<'a, TextNode>),
    Comment(Box<'a, CommentNode>),
    Interpolation(Box<'a, InterpolationNode>),
    /// Merged run of adjacent text and interpolations
    Compound(Box<'a, CompoundExpressionNode>),
    If(Box<'a, IfNode<'a>>),
    For(Box<'a, ForNode<'a>>),
    /// Text lowered to a `createTextVNode` call
    TextCall(Box<'a, TextCallNode>),
}

impl<'a> TemplateChildNode<'a> {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            Self::Element(n) => &n.loc,
            Self::Text(n) => &n.loc,
            Self::Comment(n) => &n.loc,
            Self::Interpolation(n) => &n.loc,
            Self::Compound(n) => &n.loc,
            Self::If(n) => &n.loc,
            Self::For(n) => &n.loc,
            Self::TextCall(n) => &n.loc,
        }
    }

    /// Id of nodes that can be referenced from the IR.
    pub fn id(&self) -> Option<NodeId> {
        match self {
            Self::Element(n) => Some(n.id),
            Self::If(n) => Some(n.id),
            Self::For(n) => Some(n.id),
            Self::TextCall(n) => Some(n.id),
            _ => None,
        }
    }

    /// Text, interpolation or merged compound.
    pub fn is_text_like(&self) -> bool {
        matches!(
            self,
            Self::Text(_) | Self::Interpolation(_) | Self::Compound(_)
        )
    }

    pub fn is_whitespace_text(&self) -> bool {
        matches!(self, Self::Text(t) if t.content.trim().is_empty())
    }

    pub fn as_element(&self) -> Option<&ElementNode<'a>> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementNode<'a>> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    /// The codegen slot of nodes that carry one.
    pub fn codegen_node(&self) -> Option<&JsNode> {
        match self {
            Self::Element(n) => n.codegen_node.as_ref(),
            Self::If(n) => n.codegen_node.as_ref(),
            Self::For(n) => n.codegen_node.as_ref(),
            Self::TextCall(n) => n.codegen_node.as_ref(),
            _ => None,
        }
    }
}

/// Element node
#[derive(Debug)]
pub struct ElementNode<'a> {
    pub id: NodeId,
    pub ns: Namespace,
    pub tag: String,
    pub tag_type: ElementType,
    pub props: Vec<'a, PropNode<'a>>,
    pub children: Vec<'a, TemplateChildNode<'a>>,
    pub is_self_closing: bool,
    pub loc: SourceLocation,
    pub inner_loc: Option<SourceLocation>,
    /// Client lowering, filled on transform exit
    pub codegen_node: Option<JsNode>,
    /// Server lowering (open-tag template literal or component call)
    pub ssr_codegen_node: Option<JsNode>,
    /// Server-rendered content that replaces the children (`v-html`,
    /// a static `<textarea>` value)
    pub ssr_raw_children: Option<JsNode>,
}

impl<'a> ElementNode<'a> {
    pub fn new(
        allocator: &'a Bump,
        id: NodeId,
        tag: impl Into<String>,
        loc: SourceLocation,
    ) -> Self {
        Self {
            id,
            ns: Namespace::Html,
            tag: tag.into(),
            tag_type: ElementType::Element,
            props: Vec::new_in(allocator),
            children: Vec::new_in(allocator),
            is_self_closing: false,
            loc,
            inner_loc: None,
            codegen_node: None,
            ssr_codegen_node: None,
            ssr_raw_children: None,
        }
    }

    pub fn is_component(&self) -> bool {
        self.tag_type == ElementType::Component
    }

    pub fn is_slot_outlet(&self) -> bool {
        self.tag_type == ElementType::Slot
    }

    pub fn is_template(&self) -> bool {
        self.tag_type == ElementType::Template
    }

    /// Find a directive by name (`if`, `for`, `bind` ...).
    pub fn find_dir(&self, name: &str) -> Option<&DirectiveNode<'a>> {
        self.props.iter().find_map(|p| match p {
            PropNode::Directive(dir) if dir.name == name => Some(&**dir),
            _ => None,
        })
    }

    /// Find a static attribute, or with `dynamic`, a `v-bind` with a static
    /// argument of that name.
    pub fn find_prop(&self, name: &str, dynamic: bool) -> Option<&PropNode<'a>> {
        self.props.iter().find(|p| match p {
            PropNode::Attribute(attr) => attr.name == name,
            PropNode::Directive(dir) => {
                dynamic && dir.name == "bind" && dir.static_arg() == Some(name)
            }
        })
    }

    pub fn find_prop_index(&self, name: &str, dynamic: bool) -> Option<usize> {
        self.props.iter().position(|p| match p {
            PropNode::Attribute(attr) => attr.name == name,
            PropNode::Directive(dir) => {
                dynamic && dir.name == "bind" && dir.static_arg() == Some(name)
            }
        })
    }

    pub fn has_dir(&self, name: &str) -> bool {
        self.find_dir(name).is_some()
    }
}

/// Attribute or directive
#[derive(Debug)]
pub enum PropNode<'a> {
    Attribute(Box<'a, AttributeNode>),
    Directive(Box<'a, DirectiveNode<'a>>),
}

impl<'a> PropNode<'a> {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            Self::Attribute(n) => &n.loc,
            Self::Directive(n) => &n.loc,
        }
    }

    pub fn as_directive(&self) -> Option<&DirectiveNode<'a>> {
        match self {
            Self::Directive(dir) => Some(dir),
            Self::Attribute(_) => None,
        }
    }
}

/// Static attribute `name="value"`
#[derive(Debug, Clone)]
pub struct AttributeNode {
    pub name: String,
    pub name_loc: SourceLocation,
    pub value: Option<TextNode>,
    pub loc: SourceLocation,
}

impl AttributeNode {
    pub fn new(name: impl Into<String>, loc: SourceLocation) -> Self {
        Self {
            name: name.into(),
            name_loc: loc.clone(),
            value: None,
            loc,
        }
    }
}

/// Directive such as `v-if`, `:id` or `@click.stop`
#[derive(Debug)]
pub struct DirectiveNode<'a> {
    /// Normalized name without prefix (`if`, `for`, `bind`, `on` ...)
    pub name: String,
    /// Attribute name as written (`@click`, `:class`)
    pub raw_name: String,
    pub exp: Option<ExpressionNode>,
    pub arg: Option<ExpressionNode>,
    pub modifiers: Vec<'a, SimpleExpressionNode>,
    /// Parsed alias/source parts for `v-for`
    pub for_parse_result: Option<ForParseResult>,
    pub loc: SourceLocation,
}

impl<'a> DirectiveNode<'a> {
    pub fn new(allocator: &'a Bump, name: impl Into<String>, loc: SourceLocation) -> Self {
        Self {
            name: name.into(),
            raw_name: String::default(),
            exp: None,
            arg: None,
            modifiers: Vec::new_in(allocator),
            for_parse_result: None,
            loc,
        }
    }

    /// The argument when it is static, e.g. `id` for `:id`.
    pub fn static_arg(&self) -> Option<&str> {
        match &self.arg {
            Some(ExpressionNode::Simple(s)) if s.is_static => Some(s.content.as_str()),
            _ => None,
        }
    }

    pub fn has_modifier(&self, name: &str) -> bool {
        self.modifiers.iter().any(|m| m.content == name)
    }

    /// Whether the expression is missing or blank.
    pub fn exp_is_empty(&self) -> bool {
        match &self.exp {
            None => true,
            Some(ExpressionNode::Simple(s)) => s.content.trim().is_empty(),
            Some(ExpressionNode::Compound(_)) => false,
        }
    }
}

/// Text node
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub content: String,
    pub loc: SourceLocation,
}

impl TextNode {
    pub fn new(content: impl Into<String>, loc: SourceLocation) -> Self {
        Self {
            content: content.into(),
            loc,
        }
    }
}

/// Comment node
#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    pub content: String,
    pub loc: SourceLocation,
}

impl CommentNode {
    pub fn new(content: impl Into<String>, loc: SourceLocation) -> Self {
        Self {
            content: content.into(),
            loc,
        }
    }
}

/// `{{ expr }}`
#[derive(Debug, Clone)]
pub struct InterpolationNode {
    pub content: ExpressionNode,
    pub loc: SourceLocation,
}

// ============================================================================
// Expression Nodes
// ============================================================================

/// Expression as stored in the AST and the IR
#[derive(Debug, Clone)]
pub enum ExpressionNode {
    Simple(SimpleExpressionNode),
    Compound(CompoundExpressionNode),
}

impl ExpressionNode {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            Self::Simple(n) => &n.loc,
            Self::Compound(n) => &n.loc,
        }
    }

    pub fn as_simple(&self) -> Option<&SimpleExpressionNode> {
        match self {
            Self::Simple(s) => Some(s),
            Self::Compound(_) => None,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Self::Simple(s) if s.is_static)
    }

    /// Const type; for compounds, the minimum of their expression parts.
    pub fn const_type(&self) -> ConstantType {
        match self {
            Self::Simple(s) => s.const_type,
            Self::Compound(c) => c.const_type(),
        }
    }

    /// Concatenated source text of the expression, as it will be emitted.
    pub fn to_code(&self) -> std::string::String {
        match self {
            Self::Simple(s) => s.content.to_string(),
            Self::Compound(c) => c.to_code(),
        }
    }

    pub fn identifiers(&self) -> Option<&[String]> {
        match self {
            Self::Simple(s) => s.identifiers.as_deref(),
            Self::Compound(c) => c.identifiers.as_deref(),
        }
    }
}

/// Expression whose content is emitted as-is
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleExpressionNode {
    pub content: String,
    /// Static means a literal string value rather than code
    pub is_static: bool,
    pub const_type: ConstantType,
    pub loc: SourceLocation,
    /// Identifiers declared by this expression (slot/for aliases)
    pub identifiers: Option<std::vec::Vec<String>>,
    /// Whether this is an event handler key (`onClick`)
    pub is_handler_key: bool,
}

impl SimpleExpressionNode {
    pub fn new(content: impl Into<String>, is_static: bool, loc: SourceLocation) -> Self {
        Self {
            content: content.into(),
            is_static,
            const_type: if is_static {
                ConstantType::CanStringify
            } else {
                ConstantType::NotConstant
            },
            loc,
            identifiers: None,
            is_handler_key: false,
        }
    }

    pub fn with_const_type(mut self, const_type: ConstantType) -> Self {
        self.const_type = const_type;
        self
    }
}

/// Shorthand for a [`SimpleExpressionNode`] wrapped as an expression.
pub fn create_simple_expression(
    content: impl Into<String>,
    is_static: bool,
    loc: SourceLocation,
    const_type: ConstantType,
) -> ExpressionNode {
    ExpressionNode::Simple(SimpleExpressionNode::new(content, is_static, loc).with_const_type(const_type))
}

/// Mixed literal code and sub-expressions
#[derive(Debug, Clone)]
pub struct CompoundExpressionNode {
    pub parts: std::vec::Vec<CompoundPart>,
    pub loc: SourceLocation,
    pub identifiers: Option<std::vec::Vec<String>>,
    pub is_handler_key: bool,
}

impl CompoundExpressionNode {
    pub fn new(parts: std::vec::Vec<CompoundPart>, loc: SourceLocation) -> Self {
        Self {
            parts,
            loc,
            identifiers: None,
            is_handler_key: false,
        }
    }

    pub fn const_type(&self) -> ConstantType {
        let mut result = ConstantType::CanStringify;
        for part in &self.parts {
            let part_type = match part {
                CompoundPart::Code(_) | CompoundPart::Helper(_) => continue,
                CompoundPart::Text(_) => ConstantType::CanStringify,
                CompoundPart::Simple(s) => s.const_type,
                CompoundPart::Compound(c) => c.const_type(),
                CompoundPart::Interpolation(i) => i.content.const_type(),
            };
            result = result.min(part_type);
        }
        result
    }

    /// Source text with all parts concatenated.
    pub fn to_code(&self) -> std::string::String {
        let mut out = std::string::String::new();
        for part in &self.parts {
            match part {
                CompoundPart::Code(s) => out.push_str(s),
                CompoundPart::Simple(s) => out.push_str(&s.content),
                CompoundPart::Compound(c) => out.push_str(&c.to_code()),
                CompoundPart::Text(t) => out.push_str(&t.content),
                CompoundPart::Interpolation(i) => out.push_str(&i.content.to_code()),
                CompoundPart::Helper(h) => {
                    out.push('_');
                    out.push_str(h.name());
                }
            }
        }
        out
    }
}

/// One part of a compound expression
#[derive(Debug, Clone)]
pub enum CompoundPart {
    /// Literal code such as ` + ` or `.value`
    Code(String),
    Simple(SimpleExpressionNode),
    Compound(CompoundExpressionNode),
    Text(TextNode),
    Interpolation(InterpolationNode),
    Helper(crate::RuntimeHelper),
}

// ============================================================================
// Control Flow Nodes
// ============================================================================

/// `v-if` chain
#[derive(Debug)]
pub struct IfNode<'a> {
    pub id: NodeId,
    pub branches: Vec<'a, IfBranchNode<'a>>,
    pub loc: SourceLocation,
    pub codegen_node: Option<JsNode>,
}

impl<'a> IfNode<'a> {
    pub fn new(allocator: &'a Bump, id: NodeId, loc: SourceLocation) -> Self {
        Self {
            id,
            branches: Vec::new_in(allocator),
            loc,
            codegen_node: None,
        }
    }
}

/// One `v-if` / `v-else-if` / `v-else` branch
#[derive(Debug)]
pub struct IfBranchNode<'a> {
    pub id: NodeId,
    /// `None` for `v-else`
    pub condition: Option<ExpressionNode>,
    pub children: Vec<'a, TemplateChildNode<'a>>,
    /// User supplied `key` attribute or binding
    pub user_key: Option<PropNode<'a>>,
    pub is_template_if: bool,
    pub loc: SourceLocation,
}

impl<'a> IfBranchNode<'a> {
    pub fn new(
        allocator: &'a Bump,
        id: NodeId,
        condition: Option<ExpressionNode>,
        loc: SourceLocation,
    ) -> Self {
        Self {
            id,
            condition,
            children: Vec::new_in(allocator),
            user_key: None,
            is_template_if: false,
            loc,
        }
    }
}

/// `v-for` loop
#[derive(Debug)]
pub struct ForNode<'a> {
    pub id: NodeId,
    pub source: ExpressionNode,
    pub value_alias: Option<ExpressionNode>,
    pub key_alias: Option<ExpressionNode>,
    pub object_index_alias: Option<ExpressionNode>,
    pub parse_result: ForParseResult,
    pub children: Vec<'a, TemplateChildNode<'a>>,
    pub loc: SourceLocation,
    pub codegen_node: Option<JsNode>,
}

/// Parsed `value, key, index in source`
#[derive(Debug, Clone)]
pub struct ForParseResult {
    pub source: ExpressionNode,
    pub value: Option<ExpressionNode>,
    pub key: Option<ExpressionNode>,
    pub index: Option<ExpressionNode>,
    /// Set once the alias expressions went through identifier processing
    pub finalized: bool,
}

/// Text child lowered to `createTextVNode`
#[derive(Debug)]
pub struct TextCallNode {
    pub id: NodeId,
    pub content: TextCallContent,
    pub loc: SourceLocation,
    pub codegen_node: Option<JsNode>,
}

#[derive(Debug, Clone)]
pub enum TextCallContent {
    Text(TextNode),
    Interpolation(InterpolationNode),
    Compound(CompoundExpressionNode),
}

impl TextCallContent {
    pub fn const_type(&self) -> ConstantType {
        match self {
            Self::Text(_) => ConstantType::CanStringify,
            Self::Interpolation(i) => i.content.const_type(),
            Self::Compound(c) => c.const_type(),
        }
    }
}

// ============================================================================
// Arena cloning
// ============================================================================
//
// Clones start with empty codegen slots: a cloned subtree is always
// transformed again before it is printed.

impl<'new> CloneIn<'new> for TemplateChildNode<'_> {
    type Cloned = TemplateChildNode<'new>;

    fn clone_in(&self, allocator: &'new Bump) -> Self::Cloned {
        match self {
            Self::Element(el) => TemplateChildNode::Element(el.clone_in(allocator)),
            Self::Text(t) => TemplateChildNode::Text(Box::new_in((**t).clone(), allocator)),
            Self::Comment(c) => TemplateChildNode::Comment(Box::new_in((**c).clone(), allocator)),
            Self::Interpolation(i) => {
                TemplateChildNode::Interpolation(Box::new_in((**i).clone(), allocator))
            }
            Self::Compound(c) => TemplateChildNode::Compound(Box::new_in((**c).clone(), allocator)),
            Self::If(if_node) => TemplateChildNode::If(if_node.clone_in(allocator)),
            Self::For(for_node) => TemplateChildNode::For(for_node.clone_in(allocator)),
            Self::TextCall(call) => TemplateChildNode::TextCall(Box::new_in(
                TextCallNode {
                    id: call.id,
                    content: call.content.clone(),
                    loc: call.loc.clone(),
                    codegen_node: None,
                },
                allocator,
            )),
        }
    }
}

impl<'new> CloneIn<'new> for ElementNode<'_> {
    type Cloned = ElementNode<'new>;

    fn clone_in(&self, allocator: &'new Bump) -> Self::Cloned {
        ElementNode {
            id: self.id,
            ns: self.ns,
            tag: self.tag.clone(),
            tag_type: self.tag_type,
            props: self.props.clone_in(allocator),
            children: self.children.clone_in(allocator),
            is_self_closing: self.is_self_closing,
            loc: self.loc.clone(),
            inner_loc: self.inner_loc.clone(),
            codegen_node: None,
            ssr_codegen_node: None,
            ssr_raw_children: None,
        }
    }
}

impl<'new> CloneIn<'new> for PropNode<'_> {
    type Cloned = PropNode<'new>;

    fn clone_in(&self, allocator: &'new Bump) -> Self::Cloned {
        match self {
            Self::Attribute(attr) => PropNode::Attribute(Box::new_in((**attr).clone(), allocator)),
            Self::Directive(dir) => PropNode::Directive(dir.clone_in(allocator)),
        }
    }
}

impl<'new> CloneIn<'new> for DirectiveNode<'_> {
    type Cloned = DirectiveNode<'new>;

    fn clone_in(&self, allocator: &'new Bump) -> Self::Cloned {
        let mut modifiers = Vec::with_capacity_in(self.modifiers.len(), allocator);
        modifiers.extend(self.modifiers.iter().cloned());
        DirectiveNode {
            name: self.name.clone(),
            raw_name: self.raw_name.clone(),
            exp: self.exp.clone(),
            arg: self.arg.clone(),
            modifiers,
            for_parse_result: self.for_parse_result.clone(),
            loc: self.loc.clone(),
        }
    }
}

impl<'new> CloneIn<'new> for IfNode<'_> {
    type Cloned = IfNode<'new>;

    fn clone_in(&self, allocator: &'new Bump) -> Self::Cloned {
        IfNode {
            id: self.id,
            branches: self.branches.clone_in(allocator),
            loc: self.loc.clone(),
            codegen_node: None,
        }
    }
}

impl<'new> CloneIn<'new> for IfBranchNode<'_> {
    type Cloned = IfBranchNode<'new>;

    fn clone_in(&self, allocator: &'new Bump) -> Self::Cloned {
        IfBranchNode {
            id: self.id,
            condition: self.condition.clone(),
            children: self.children.clone_in(allocator),
            user_key: self.user_key.clone_in(allocator),
            is_template_if: self.is_template_if,
            loc: self.loc.clone(),
        }
    }
}

impl<'new> CloneIn<'new> for ForNode<'_> {
    type Cloned = ForNode<'new>;

    fn clone_in(&self, allocator: &'new Bump) -> Self::Cloned {
        ForNode {
            id: self.id,
            source: self.source.clone(),
            value_alias: self.value_alias.clone(),
            key_alias: self.key_alias.clone(),
            object_index_alias: self.object_index_alias.clone(),
            parse_result: self.parse_result.clone(),
            children: self.children.clone_in(allocator),
            loc: self.loc.clone(),
            codegen_node: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::STUB
    }

    #[test]
    fn test_const_type_order() {
        assert!(ConstantType::NotConstant < ConstantType::CanSkipPatch);
        assert!(ConstantType::CanSkipPatch < ConstantType::CanHoist);
        assert!(ConstantType::CanHoist < ConstantType::CanStringify);
    }

    #[test]
    fn test_compound_const_type_is_minimum() {
        let compound = CompoundExpressionNode::new(
            vec![
                CompoundPart::Simple(
                    SimpleExpressionNode::new("a", false, loc())
                        .with_const_type(ConstantType::CanHoist),
                ),
                CompoundPart::Code(" + ".into()),
                CompoundPart::Simple(SimpleExpressionNode::new("_ctx.b", false, loc())),
            ],
            loc(),
        );
        assert_eq!(compound.const_type(), ConstantType::NotConstant);
        assert_eq!(compound.to_code(), "a + _ctx.b");
    }

    #[test]
    fn test_element_lookup() {
        let bump = Bump::new();
        let mut el = ElementNode::new(&bump, NodeId(1), "div", loc());
        el.props.push(PropNode::Attribute(Box::new_in(
            AttributeNode::new("id", loc()),
            &bump,
        )));
        let mut dir = DirectiveNode::new(&bump, "bind", loc());
        dir.arg = Some(create_simple_expression(
            "title",
            true,
            loc(),
            ConstantType::CanStringify,
        ));
        el.props.push(PropNode::Directive(Box::new_in(dir, &bump)));

        assert!(el.find_prop("id", false).is_some());
        assert!(el.find_prop("title", false).is_none());
        assert!(el.find_prop("title", true).is_some());
        assert_eq!(el.find_prop_index("title", true), Some(1));
        assert!(el.has_dir("bind"));
    }

    #[test]
    fn test_clone_in_resets_codegen() {
        let bump = Bump::new();
        let mut el = ElementNode::new(&bump, NodeId(3), "span", loc());
        el.codegen_node = Some(JsNode::Raw("x".into()));
        let node = TemplateChildNode::Element(Box::new_in(el, &bump));
        let other = Bump::new();
        let cloned = node.clone_in(&other);
        match cloned {
            TemplateChildNode::Element(el) => {
                assert_eq!(el.tag, "span");
                assert_eq!(el.id, NodeId(3));
                assert!(el.codegen_node.is_none());
            }
            _ => panic!("expected element"),
        }
    }
}
