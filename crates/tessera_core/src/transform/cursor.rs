//! Cursor over a children list during traversal.
//!
//! The walker hands each transform a cursor positioned at the node being
//! visited. Replacing or removing the node goes through the cursor so the
//! walker always knows which index to visit next.

use tessera_arena::Vec;
use tessera_ast::TemplateChildNode;

/// Position of the node being visited within its siblings
pub struct NodeCursor<'c, 'a> {
    siblings: &'c mut Vec<'a, TemplateChildNode<'a>>,
    index: usize,
    removed: bool,
}

impl<'c, 'a> NodeCursor<'c, 'a> {
    pub fn new(siblings: &'c mut Vec<'a, TemplateChildNode<'a>>, index: usize) -> Self {
        Self {
            siblings,
            index,
            removed: false,
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Index the walker continues with.
    pub fn next_index(&self) -> usize {
        if self.removed {
            self.index
        } else {
            self.index + 1
        }
    }

    pub fn node(&self) -> &TemplateChildNode<'a> {
        &self.siblings[self.index]
    }

    pub fn node_mut(&mut self) -> &mut TemplateChildNode<'a> {
        &mut self.siblings[self.index]
    }

    pub fn siblings(&self) -> &[TemplateChildNode<'a>] {
        self.siblings
    }

    pub fn sibling_mut(&mut self, index: usize) -> &mut TemplateChildNode<'a> {
        &mut self.siblings[index]
    }

    /// Swap the current node for one built from it. Later transforms and
    /// the child traversal see the new node.
    pub fn replace(&mut self, f: impl FnOnce(TemplateChildNode<'a>) -> TemplateChildNode<'a>) {
        debug_assert!(!self.removed, "replacing a removed node");
        let old = self.siblings.remove(self.index);
        self.siblings.insert(self.index, f(old));
    }

    /// Take the current node out of the list.
    pub fn remove(&mut self) -> TemplateChildNode<'a> {
        debug_assert!(!self.removed, "node removed twice");
        self.removed = true;
        self.siblings.remove(self.index)
    }

    /// Remove another sibling, keeping the cursor on the same node.
    pub fn remove_sibling(&mut self, index: usize) -> TemplateChildNode<'a> {
        debug_assert!(index != self.index || self.removed);
        if index < self.index {
            self.index -= 1;
        }
        self.siblings.remove(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_arena::{Box, Bump};
    use tessera_ast::{SourceLocation, TextNode};

    fn text<'a>(bump: &'a Bump, s: &str) -> TemplateChildNode<'a> {
        TemplateChildNode::Text(Box::new_in(TextNode::new(s, SourceLocation::STUB), bump))
    }

    fn content(node: &TemplateChildNode<'_>) -> String {
        match node {
            TemplateChildNode::Text(t) => t.content.to_string(),
            _ => String::new(),
        }
    }

    #[test]
    fn test_remove_keeps_next_index() {
        let bump = Bump::new();
        let mut children = Vec::new_in(&bump);
        children.push(text(&bump, "a"));
        children.push(text(&bump, "b"));
        let mut cursor = NodeCursor::new(&mut children, 0);
        cursor.remove();
        assert_eq!(cursor.next_index(), 0);
        assert_eq!(children.len(), 1);
        assert_eq!(content(&children[0]), "b");
    }

    #[test]
    fn test_remove_previous_sibling_shifts_index() {
        let bump = Bump::new();
        let mut children = Vec::new_in(&bump);
        children.push(text(&bump, "a"));
        children.push(text(&bump, "b"));
        children.push(text(&bump, "c"));
        let mut cursor = NodeCursor::new(&mut children, 2);
        cursor.remove_sibling(1);
        assert_eq!(cursor.index(), 1);
        assert_eq!(content(cursor.node()), "c");
        assert_eq!(cursor.next_index(), 2);
    }

    #[test]
    fn test_replace() {
        let bump = Bump::new();
        let mut children = Vec::new_in(&bump);
        children.push(text(&bump, "a"));
        let mut cursor = NodeCursor::new(&mut children, 0);
        cursor.replace(|_| text(&bump, "z"));
        assert_eq!(content(cursor.node()), "z");
        assert_eq!(cursor.next_index(), 1);
    }
}
