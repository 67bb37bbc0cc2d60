//! Transform context.

use tessera_arena::{Bump, FxHashMap, FxHashSet, String};
use tessera_ast::{
    create_cache_expression, CompilerError, ConstantType, ElementType, ErrorCode, ExpressionNode,
    ImportItem, JsNode, NodeId, RuntimeHelper, SimpleExpressionNode, SourceLocation,
    TemplateChildNode, TransformOptions,
};

use super::DirectiveTransform;

/// Insertion-ordered helper multiset.
///
/// Passes that rewrite a call away retract the helper they added, so each
/// helper keeps a reference count and disappears when it drops to zero.
#[derive(Debug, Clone, Default)]
pub struct HelperCounter {
    entries: std::vec::Vec<(RuntimeHelper, u32)>,
}

impl HelperCounter {
    pub fn add(&mut self, helper: RuntimeHelper) {
        match self.entries.iter_mut().find(|(h, _)| *h == helper) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((helper, 1)),
        }
    }

    pub fn remove(&mut self, helper: RuntimeHelper) {
        if let Some(pos) = self.entries.iter().position(|(h, _)| *h == helper) {
            let count = &mut self.entries[pos].1;
            *count -= 1;
            if *count == 0 {
                self.entries.remove(pos);
            }
        }
    }

    pub fn count(&self, helper: RuntimeHelper) -> u32 {
        self.entries
            .iter()
            .find(|(h, _)| *h == helper)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    pub fn contains(&self, helper: RuntimeHelper) -> bool {
        self.count(helper) > 0
    }

    /// Helpers in first-use order.
    pub fn iter(&self) -> impl Iterator<Item = RuntimeHelper> + '_ {
        self.entries.iter().map(|(h, _)| *h)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Nesting depth of scope-introducing constructs
#[derive(Debug, Clone, Copy, Default)]
pub struct Scopes {
    pub v_for: u32,
    pub v_slot: u32,
    pub v_pre: u32,
    pub v_once: u32,
}

/// The container whose children are being traversed
#[derive(Debug, Clone, PartialEq)]
pub enum ParentInfo {
    Root,
    Element {
        id: NodeId,
        tag: String,
        tag_type: ElementType,
    },
    IfBranch(NodeId),
    For(NodeId),
}

impl ParentInfo {
    pub fn is_component(&self) -> bool {
        matches!(
            self,
            Self::Element {
                tag_type: ElementType::Component,
                ..
            }
        )
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }
}

/// Errors and warnings collected by one transform run
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub errors: std::vec::Vec<CompilerError>,
    pub warnings: std::vec::Vec<CompilerError>,
}

/// Mutable state shared by every transform during one compile
pub struct TransformContext<'a> {
    pub allocator: &'a Bump,
    pub options: TransformOptions,
    /// Component name inferred from the filename
    pub self_name: Option<String>,

    pub helpers: HelperCounter,
    pub components: std::vec::Vec<String>,
    pub directives: std::vec::Vec<String>,
    pub hoists: std::vec::Vec<Option<JsNode>>,
    pub imports: std::vec::Vec<ImportItem>,
    pub temps: u32,
    pub cached: u32,

    /// Names bound by enclosing `v-for` / `v-slot` scopes, with nesting counts
    pub identifiers: FxHashMap<String, u32>,
    pub scopes: Scopes,
    pub parent: ParentInfo,
    pub child_index: usize,
    pub in_v_once: bool,

    pub diagnostics: Diagnostics,
    next_id: u32,

    /// Nodes already processed by `v-once` / `v-memo`
    pub(crate) once_seen: FxHashSet<NodeId>,
    pub(crate) memo_seen: FxHashSet<NodeId>,
    /// Hoist slot of each hoisted node
    pub hoisted_nodes: FxHashMap<NodeId, usize>,
    /// Memoized const types computed by the hoisting pass
    pub constant_cache: FxHashMap<NodeId, ConstantType>,
    /// Trees reachable only from the IR, moved to the root after the walk
    pub detached: std::vec::Vec<TemplateChildNode<'a>>,

    directive_transforms: std::vec::Vec<(String, DirectiveTransform)>,
}

impl<'a> TransformContext<'a> {
    pub fn new(
        allocator: &'a Bump,
        options: TransformOptions,
        next_id: u32,
        directive_transforms: std::vec::Vec<(String, DirectiveTransform)>,
    ) -> Self {
        let self_name = options.self_name();
        Self {
            allocator,
            options,
            self_name,
            helpers: HelperCounter::default(),
            components: std::vec::Vec::new(),
            directives: std::vec::Vec::new(),
            hoists: std::vec::Vec::new(),
            imports: std::vec::Vec::new(),
            temps: 0,
            cached: 0,
            identifiers: FxHashMap::default(),
            scopes: Scopes::default(),
            parent: ParentInfo::Root,
            child_index: 0,
            in_v_once: false,
            diagnostics: Diagnostics::default(),
            next_id,
            once_seen: FxHashSet::default(),
            memo_seen: FxHashSet::default(),
            hoisted_nodes: FxHashMap::default(),
            constant_cache: FxHashMap::default(),
            detached: std::vec::Vec::new(),
            directive_transforms,
        }
    }

    /// Whether free identifiers are rewritten.
    #[inline]
    pub fn prefix_identifiers(&self) -> bool {
        self.options.prefix_identifiers
    }

    #[inline]
    pub fn is_ssr(&self) -> bool {
        self.options.ssr
    }

    /// Allocate an id for a node created by a transform.
    pub fn alloc_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    // ------------------------------------------------------------------
    // Helpers, assets, hoists
    // ------------------------------------------------------------------

    pub fn helper(&mut self, helper: RuntimeHelper) -> RuntimeHelper {
        self.helpers.add(helper);
        helper
    }

    pub fn remove_helper(&mut self, helper: RuntimeHelper) {
        self.helpers.remove(helper);
    }

    /// The local name generated code uses for a helper.
    pub fn helper_string(&mut self, helper: RuntimeHelper) -> std::string::String {
        self.helper(helper);
        ["_", helper.name()].concat()
    }

    pub fn add_component(&mut self, name: &str) {
        if !self.components.iter().any(|c| c == name) {
            self.components.push(String::from(name));
        }
    }

    pub fn add_directive(&mut self, name: &str) {
        if !self.directives.iter().any(|d| d == name) {
            self.directives.push(String::from(name));
        }
    }

    /// Move an initializer into the hoist list and return its reference.
    pub fn hoist(&mut self, exp: JsNode) -> JsNode {
        let loc = exp.loc().cloned().unwrap_or_default();
        self.hoists.push(Some(exp));
        let name = format!("_hoisted_{}", self.hoists.len());
        JsNode::Simple(
            SimpleExpressionNode::new(name, false, loc).with_const_type(ConstantType::CanHoist),
        )
    }

    /// Wrap a value in the next render cache slot.
    pub fn cache(&mut self, exp: JsNode, is_vnode: bool, in_v_once: bool) -> JsNode {
        let index = self.cached;
        self.cached += 1;
        create_cache_expression(index, exp, is_vnode, in_v_once)
    }

    // ------------------------------------------------------------------
    // Scope identifiers
    // ------------------------------------------------------------------

    pub fn add_identifier(&mut self, name: &str) {
        *self.identifiers.entry(String::from(name)).or_insert(0) += 1;
    }

    pub fn remove_identifier(&mut self, name: &str) {
        if let Some(count) = self.identifiers.get_mut(name) {
            *count -= 1;
            if *count == 0 {
                self.identifiers.remove(name);
            }
        }
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        self.identifiers.contains_key(name)
    }

    /// Register the names an expression declares (or the expression itself
    /// when it is a bare identifier).
    pub fn add_identifiers(&mut self, exp: &ExpressionNode) {
        match exp.identifiers() {
            Some(ids) => {
                for id in ids {
                    self.add_identifier(id);
                }
            }
            None => {
                if let ExpressionNode::Simple(s) = exp {
                    self.add_identifier(&s.content);
                }
            }
        }
    }

    pub fn remove_identifiers(&mut self, exp: &ExpressionNode) {
        match exp.identifiers() {
            Some(ids) => {
                for id in ids {
                    self.remove_identifier(id);
                }
            }
            None => {
                if let ExpressionNode::Simple(s) = exp {
                    self.remove_identifier(&s.content);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Directive transforms
    // ------------------------------------------------------------------

    /// Install another backend's directive transforms, returning the
    /// current ones.
    pub fn swap_directive_transforms(
        &mut self,
        transforms: std::vec::Vec<(String, DirectiveTransform)>,
    ) -> std::vec::Vec<(String, DirectiveTransform)> {
        std::mem::replace(&mut self.directive_transforms, transforms)
    }

    /// Transform for a directive name: platform overrides first, then the
    /// built-in kinds.
    pub fn directive_transform(&self, name: &str) -> Option<DirectiveTransform> {
        self.directive_transforms
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
            .or_else(|| DirectiveTransform::builtin(name))
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    pub fn on_error(&mut self, error: CompilerError) {
        if let Some(cb) = self.options.on_error {
            cb(&error);
        }
        self.diagnostics.errors.push(error);
    }

    pub fn on_warn(&mut self, warning: CompilerError) {
        match self.options.on_warn {
            Some(cb) => cb(&warning),
            None => tracing::warn!(code = warning.code, "{}", warning.message),
        }
        self.diagnostics.warnings.push(warning);
    }

    /// Report a core error code at a location.
    pub fn report(&mut self, code: ErrorCode, loc: &SourceLocation) {
        self.on_error(CompilerError::new(code, Some(loc.clone())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helper_counter_order_and_retraction() {
        let mut helpers = HelperCounter::default();
        helpers.add(RuntimeHelper::OpenBlock);
        helpers.add(RuntimeHelper::CreateElementVNode);
        helpers.add(RuntimeHelper::CreateElementVNode);
        helpers.remove(RuntimeHelper::CreateElementVNode);
        assert!(helpers.contains(RuntimeHelper::CreateElementVNode));
        helpers.remove(RuntimeHelper::CreateElementVNode);
        assert!(!helpers.contains(RuntimeHelper::CreateElementVNode));
        helpers.add(RuntimeHelper::ToDisplayString);
        helpers.add(RuntimeHelper::CreateElementVNode);
        let order: std::vec::Vec<_> = helpers.iter().collect();
        assert_eq!(
            order,
            vec![
                RuntimeHelper::OpenBlock,
                RuntimeHelper::ToDisplayString,
                RuntimeHelper::CreateElementVNode
            ]
        );
    }

    #[test]
    fn test_identifier_counts() {
        let bump = Bump::new();
        let mut ctx = TransformContext::new(&bump, TransformOptions::default(), 1, vec![]);
        ctx.add_identifier("item");
        ctx.add_identifier("item");
        ctx.remove_identifier("item");
        assert!(ctx.is_identifier("item"));
        ctx.remove_identifier("item");
        assert!(!ctx.is_identifier("item"));
    }

    #[test]
    fn test_hoist_names() {
        let bump = Bump::new();
        let mut ctx = TransformContext::new(&bump, TransformOptions::default(), 1, vec![]);
        let first = ctx.hoist(JsNode::raw("a"));
        let second = ctx.hoist(JsNode::raw("b"));
        match (first, second) {
            (JsNode::Simple(a), JsNode::Simple(b)) => {
                assert_eq!(a.content, "_hoisted_1");
                assert_eq!(b.content, "_hoisted_2");
                assert_eq!(a.const_type, ConstantType::CanHoist);
            }
            _ => panic!("expected simple expressions"),
        }
    }
}
