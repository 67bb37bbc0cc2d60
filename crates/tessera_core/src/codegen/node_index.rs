//! Id lookup over the final tree.

use tessera_arena::FxHashMap;
use tessera_ast::{NodeId, RootNode, TemplateChildNode};

use super::CodegenError;

/// Resolves [`NodeId`] references held by the IR
pub struct NodeIndex<'g, 'a> {
    nodes: FxHashMap<NodeId, &'g TemplateChildNode<'a>>,
    containers: FxHashMap<NodeId, &'g [TemplateChildNode<'a>]>,
}

impl<'g, 'a> NodeIndex<'g, 'a> {
    pub fn build(root: &'g RootNode<'a>) -> Self {
        let mut index = Self {
            nodes: FxHashMap::default(),
            containers: FxHashMap::default(),
        };
        index.containers.insert(NodeId::ROOT, &root.children);
        index.add_children(&root.children);
        index.add_children(&root.detached);
        index
    }

    fn add_children(&mut self, children: &'g [TemplateChildNode<'a>]) {
        for child in children {
            if let Some(id) = child.id() {
                self.nodes.insert(id, child);
            }
            match child {
                TemplateChildNode::Element(el) => {
                    self.containers.insert(el.id, &el.children);
                    self.add_children(&el.children);
                }
                TemplateChildNode::If(if_node) => {
                    for branch in if_node.branches.iter() {
                        self.containers.insert(branch.id, &branch.children);
                        self.add_children(&branch.children);
                    }
                }
                TemplateChildNode::For(for_node) => {
                    self.containers.insert(for_node.id, &for_node.children);
                    self.add_children(&for_node.children);
                }
                _ => {}
            }
        }
    }

    pub fn node(&self, id: NodeId) -> Result<&'g TemplateChildNode<'a>, CodegenError> {
        self.nodes
            .get(&id)
            .copied()
            .ok_or(CodegenError::UnresolvedNode(id))
    }

    pub fn children(&self, id: NodeId) -> Result<&'g [TemplateChildNode<'a>], CodegenError> {
        self.containers
            .get(&id)
            .copied()
            .ok_or(CodegenError::UnresolvedChildren(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
