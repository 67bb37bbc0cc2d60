//! Transform engine.
//!
//! A depth-first walk over the template AST. At each node every registered
//! [`NodeTransform`] gets an `enter` call, in order, and may hand back an
//! exit closure. Once the node's children have been walked, the collected
//! exits run in reverse, so the element transform registered early sees
//! fully processed children when its exit builds the node's IR.
//!
//! Transforms replace or remove the visited node through the
//! [`NodeCursor`]; the walker reads the cursor afterwards to decide which
//! index to visit next.

mod context;
mod cursor;
mod structural;

pub use context::{Diagnostics, HelperCounter, ParentInfo, Scopes, TransformContext};
pub use cursor::NodeCursor;
pub use structural::{take_directive, StructuralDirectiveTransform, StructuralHandler};

use tessera_arena::{Bump, String, Vec};
use tessera_ast::{
    DirectiveNode, ElementNode, ElementType, JsNode, NodeId, PropNode, Property, RootNode,
    RuntimeHelper, TemplateChildNode, TransformOptions,
};

use crate::transforms::hoist_static::hoist_static;
use crate::utils::{child_ref, convert_to_block, create_vnode_call, is_single_element_root};

/// Exit callback returned from [`NodeTransform::enter`].
///
/// Receives the node at the cursor position once its children are done.
pub type ExitFn<'a> =
    std::boxed::Box<dyn FnOnce(&mut TemplateChildNode<'a>, &mut TransformContext<'a>) + 'a>;

/// Container whose children list is being finished
#[derive(Clone, Copy)]
pub enum Container<'p, 'a> {
    Root,
    Element {
        id: NodeId,
        tag_type: ElementType,
        props: &'p [PropNode<'a>],
    },
    Branch(NodeId),
    For(NodeId),
}

/// A node-level transform
pub trait NodeTransform<'a> {
    /// Called before the node's children are visited.
    fn enter(
        &self,
        cursor: &mut NodeCursor<'_, 'a>,
        ctx: &mut TransformContext<'a>,
        walker: &Walker<'_>,
    ) -> Option<ExitFn<'a>>;

    /// Called once a container's children are visited, before the
    /// container's own exits run.
    fn exit_children(
        &self,
        _container: Container<'_, 'a>,
        _children: &mut Vec<'a, TemplateChildNode<'a>>,
        _ctx: &mut TransformContext<'a>,
    ) {
    }
}

/// Node transform usable for any compile.
pub type BoxedNodeTransform = std::boxed::Box<dyn for<'a> NodeTransform<'a> + Send + Sync>;

/// Directive transform supplied by a platform or the user.
pub type DirectiveTransformFn = for<'a> fn(
    &DirectiveNode<'a>,
    &ElementNode<'a>,
    &mut TransformContext<'a>,
) -> DirectiveTransformResult;

/// Extra pass over a children list that had nodes hoisted.
pub type HoistTransformFn =
    for<'a> fn(&mut Vec<'a, TemplateChildNode<'a>>, &mut TransformContext<'a>, &ParentInfo);

/// Lowering of the whole tree once every node is transformed. Replaces
/// the client root codegen.
pub type RootTransformFn = for<'a> fn(&mut RootNode<'a>, &mut TransformContext<'a>);

/// Transform applied to a non-structural directive while building props
#[derive(Clone, Copy)]
pub enum DirectiveTransform {
    Bind,
    On,
    Model,
    /// Directive that produces nothing (`v-cloak`, server-side `v-on`)
    Noop,
    Extension(DirectiveTransformFn),
}

impl DirectiveTransform {
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "bind" => Some(Self::Bind),
            "on" => Some(Self::On),
            "model" => Some(Self::Model),
            "cloak" => Some(Self::Noop),
            _ => None,
        }
    }

    pub fn apply<'a>(
        self,
        dir: &DirectiveNode<'a>,
        el: &ElementNode<'a>,
        ctx: &mut TransformContext<'a>,
    ) -> DirectiveTransformResult {
        match self {
            Self::Bind => crate::transforms::v_bind::transform_bind(dir, el, ctx),
            Self::On => crate::transforms::v_on::transform_on(dir, el, ctx),
            Self::Model => crate::transforms::v_model::transform_model(dir, el, ctx),
            Self::Noop => DirectiveTransformResult::default(),
            Self::Extension(f) => f(dir, el, ctx),
        }
    }
}

/// How a directive needs runtime support
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeedRuntime {
    /// Resolve the user directive by name
    Resolve,
    /// Apply a known runtime directive (`vShow`, `vModelText` ...)
    Helper(RuntimeHelper),
}

/// Output of a directive transform
#[derive(Debug, Default)]
pub struct DirectiveTransformResult {
    pub props: std::vec::Vec<Property>,
    pub need_runtime: Option<NeedRuntime>,
}

impl DirectiveTransformResult {
    pub fn props(props: std::vec::Vec<Property>) -> Self {
        Self {
            props,
            need_runtime: None,
        }
    }
}

/// Ordered transforms for one backend
#[derive(Default)]
pub struct TransformPreset {
    pub node_transforms: std::vec::Vec<BoxedNodeTransform>,
    /// Directive transforms that override or extend the built-in kinds
    pub directive_transforms: std::vec::Vec<(String, DirectiveTransform)>,
    pub transform_hoist: Option<HoistTransformFn>,
    pub transform_root: Option<RootTransformFn>,
}

impl TransformPreset {
    /// Append user transforms after the built-ins.
    pub fn extend(
        &mut self,
        node_transforms: impl IntoIterator<Item = BoxedNodeTransform>,
        directive_transforms: impl IntoIterator<Item = (String, DirectiveTransform)>,
    ) {
        self.node_transforms.extend(node_transforms);
        for (name, transform) in directive_transforms {
            match self.directive_transforms.iter_mut().find(|(n, _)| *n == name) {
                Some(entry) => entry.1 = transform,
                None => self.directive_transforms.push((name, transform)),
            }
        }
    }
}

/// Drives the node transforms over a tree
pub struct Walker<'p> {
    preset: &'p TransformPreset,
}

impl<'p> Walker<'p> {
    pub fn new(preset: &'p TransformPreset) -> Self {
        Self { preset }
    }

    /// Visit every child of a container, then let the transforms finish
    /// the list.
    pub fn traverse_children<'a>(
        &self,
        children: &mut Vec<'a, TemplateChildNode<'a>>,
        container: Container<'_, 'a>,
        parent: ParentInfo,
        ctx: &mut TransformContext<'a>,
    ) {
        let saved_parent = std::mem::replace(&mut ctx.parent, parent);
        let saved_index = ctx.child_index;
        let mut i = 0;
        while i < children.len() {
            ctx.child_index = i;
            let mut cursor = NodeCursor::new(children, i);
            self.traverse_node(&mut cursor, ctx);
            i = cursor.next_index();
        }
        ctx.child_index = saved_index;
        ctx.parent = saved_parent;

        for transform in &self.preset.node_transforms {
            transform.exit_children(container, children, ctx);
        }
    }

    /// Run the transforms on the node under the cursor and recurse.
    pub fn traverse_node<'a>(&self, cursor: &mut NodeCursor<'_, 'a>, ctx: &mut TransformContext<'a>) {
        let mut exits: std::vec::Vec<ExitFn<'a>> = std::vec::Vec::new();
        for transform in &self.preset.node_transforms {
            if let Some(exit) = transform.enter(cursor, ctx, self) {
                exits.push(exit);
            }
            if cursor.is_removed() {
                return;
            }
        }

        let ssr = ctx.options.ssr;
        match cursor.node_mut() {
            TemplateChildNode::Comment(_) => {
                if !ssr {
                    ctx.helper(RuntimeHelper::CreateComment);
                }
            }
            TemplateChildNode::Interpolation(_) => {
                if !ssr {
                    ctx.helper(RuntimeHelper::ToDisplayString);
                }
            }
            TemplateChildNode::If(if_node) => {
                for branch in if_node.branches.iter_mut() {
                    let id = branch.id;
                    self.traverse_children(
                        &mut branch.children,
                        Container::Branch(id),
                        ParentInfo::IfBranch(id),
                        ctx,
                    );
                }
            }
            TemplateChildNode::For(for_node) => {
                let id = for_node.id;
                self.traverse_children(
                    &mut for_node.children,
                    Container::For(id),
                    ParentInfo::For(id),
                    ctx,
                );
            }
            TemplateChildNode::Element(el) => {
                let el = &mut **el;
                let parent = ParentInfo::Element {
                    id: el.id,
                    tag: el.tag.clone(),
                    tag_type: el.tag_type,
                };
                let container = Container::Element {
                    id: el.id,
                    tag_type: el.tag_type,
                    props: &el.props,
                };
                self.traverse_children(&mut el.children, container, parent, ctx);
            }
            _ => {}
        }

        for exit in exits.into_iter().rev() {
            exit(cursor.node_mut(), ctx);
        }
    }
}

/// Run the preset over a parsed template and finalize root metadata.
pub fn transform<'a>(
    allocator: &'a Bump,
    root: &mut RootNode<'a>,
    options: &TransformOptions,
    preset: &TransformPreset,
) -> Diagnostics {
    let mut ctx = TransformContext::new(
        allocator,
        options.clone(),
        root.next_id,
        preset.directive_transforms.clone(),
    );
    let walker = Walker::new(preset);
    walker.traverse_children(&mut root.children, Container::Root, ParentInfo::Root, &mut ctx);

    if ctx.options.hoist_static {
        hoist_static(root, &mut ctx, preset.transform_hoist);
    }
    match preset.transform_root {
        Some(lower) => lower(root, &mut ctx),
        None if !ctx.options.ssr => create_root_codegen(root, &mut ctx),
        None => {}
    }

    let (client, server): (std::vec::Vec<_>, std::vec::Vec<_>) =
        ctx.helpers.iter().partition(|h| !h.is_ssr());
    root.helpers = client;
    root.ssr_helpers = server;
    root.components = std::mem::take(&mut ctx.components);
    root.directives = std::mem::take(&mut ctx.directives);
    root.imports = std::mem::take(&mut ctx.imports);
    root.hoists = std::mem::take(&mut ctx.hoists);
    root.detached.extend(ctx.detached.drain(..));
    root.temps = ctx.temps;
    root.cached = ctx.cached;
    root.transformed = true;
    root.next_id = ctx.next_id();

    tracing::debug!(
        helpers = root.helpers.len() + root.ssr_helpers.len(),
        hoists = root.hoists.len(),
        errors = ctx.diagnostics.errors.len(),
        "template transformed"
    );
    ctx.diagnostics
}

fn create_root_codegen<'a>(root: &mut RootNode<'a>, ctx: &mut TransformContext<'a>) {
    if root.children.len() == 1 {
        let single_element = is_single_element_root(&root.children[0]);
        let child = &mut root.children[0];
        if single_element {
            if let Some(el) = child.as_element_mut() {
                if let Some(JsNode::VNodeCall(call)) = el.codegen_node.as_mut() {
                    convert_to_block(call, ctx);
                }
            }
        }
        root.codegen_node = Some(child_ref(child));
    } else if root.children.len() > 1 {
        let mut flag = tessera_arena::PatchFlags::STABLE_FRAGMENT;
        let non_comments = root
            .children
            .iter()
            .filter(|c| !matches!(c, TemplateChildNode::Comment(_)))
            .count();
        if non_comments == 1 {
            flag |= tessera_arena::PatchFlags::DEV_ROOT_FRAGMENT;
        }
        ctx.helper(RuntimeHelper::Fragment);
        let call = create_vnode_call(
            ctx,
            JsNode::Helper(RuntimeHelper::Fragment),
            None,
            Some(JsNode::Children(NodeId::ROOT)),
            Some(flag),
            None,
            None,
            true,
            false,
            false,
            root.loc.clone(),
        );
        root.codegen_node = Some(call);
    }
}
