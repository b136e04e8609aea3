/*!
Parent/child relationships for the in-memory document.

Single source of truth for the tree shape. All mutations go through methods
that maintain bidirectional link invariants.

## Invariants

1. **Single parent**: Each child has exactly ONE parent for its lifetime.
2. **Bidirectional consistency**: If `parent_of[child] = parent`, then
   `children_of[parent]` contains `child`, and vice versa.
3. **No reparenting**: Once a node has a parent, it cannot be moved.
   Removing a subtree detaches it for good.
*/

use super::NodeId;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub(super) struct NodeTree {
  parent_of: HashMap<NodeId, NodeId>,
  children_of: HashMap<NodeId, Vec<NodeId>>,
}

impl NodeTree {
  pub(super) fn new() -> Self {
    Self::default()
  }

  /// Get parent of a node.
  pub(super) fn parent(&self, id: NodeId) -> Option<NodeId> {
    self.parent_of.get(&id).copied()
  }

  /// Get children of a node (empty slice if none).
  pub(super) fn children(&self, id: NodeId) -> &[NodeId] {
    self.children_of.get(&id).map_or(&[], Vec::as_slice)
  }

  /// Append a child to a parent.
  ///
  /// - Same parent: no-op (idempotent)
  /// - No parent: appended as the last child
  /// - Different parent: rejected (nodes are never moved)
  pub(super) fn append_child(&mut self, parent: NodeId, child: NodeId) {
    if let Some(&existing_parent) = self.parent_of.get(&child) {
      if existing_parent != parent {
        log::error!(
          "append_child: node {child} already has parent {existing_parent}, \
           cannot append to {parent}"
        );
      }
      return;
    }

    self.parent_of.insert(child, parent);
    self.children_of.entry(parent).or_default().push(child);
  }

  /// Detach a node and forget all its descendants.
  /// Returns removed IDs in removal order (parent before children).
  /// Iterative to avoid stack overflow on deep trees.
  pub(super) fn remove_subtree(&mut self, root: NodeId) -> Vec<NodeId> {
    let mut removed = Vec::new();
    let mut queue = vec![root];

    while let Some(id) = queue.pop() {
      if let Some(parent_id) = self.parent_of.remove(&id) {
        if let Some(siblings) = self.children_of.get_mut(&parent_id) {
          siblings.retain(|&sid| sid != id);
        }
      }

      if let Some(children) = self.children_of.remove(&id) {
        queue.extend(children);
      }

      removed.push(id);
    }

    removed
  }

  /// Pre-order walk below `root` (excluding `root`).
  pub(super) fn descendants(&self, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
      out.push(id);
      stack.extend(self.children(id).iter().rev().copied());
    }
    out
  }
}
