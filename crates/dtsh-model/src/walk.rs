//! Tree walks, searches and pruned virtual subtrees.
//!
//! `walk` orders siblings level by level before descending. `find` collects
//! matches in pre-order, then orders the whole result at once. The two
//! orderings are distinct on purpose and callers rely on both.

use std::collections::HashSet;

use crate::criteria::CriteriaChain;
use crate::sort::{SortKey, arrange};
use crate::tree::{Devicetree, NodeId};

/// Walk parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkOptions {
    pub order_by: Option<SortKey>,
    pub reverse: bool,
    /// Skip disabled nodes and everything below them.
    pub enabled_only: bool,
    /// Maximum depth below the walk root; 0 means unlimited.
    pub fixed_depth: usize,
}

impl Devicetree {
    /// Children of `id` in declaration order, without the disabled ones if
    /// `enabled_only` is set.
    pub fn visible_children(&self, id: NodeId, enabled_only: bool) -> Vec<NodeId> {
        self.node(id)
            .children()
            .filter(|child| !enabled_only || child.enabled())
            .map(|child| child.id())
            .collect()
    }

    /// Descendants of `root` in pre-order, root excluded.
    pub fn walk(&self, root: NodeId, opts: &WalkOptions) -> Vec<NodeId> {
        let mut out = Vec::new();
        if opts.enabled_only && !self.node(root).enabled() {
            return out;
        }
        self.walk_into(root, 1, opts, &mut out);
        out
    }

    fn walk_into(&self, parent: NodeId, depth: usize, opts: &WalkOptions, out: &mut Vec<NodeId>) {
        if opts.fixed_depth > 0 && depth > opts.fixed_depth {
            return;
        }
        let children = self.visible_children(parent, opts.enabled_only);
        for id in arrange(self, &children, opts.order_by, opts.reverse) {
            out.push(id);
            self.walk_into(id, depth + 1, opts, out);
        }
    }

    /// Descendants of `root` that match `criteria`, ordered once over the
    /// whole result.
    pub fn find(
        &self,
        root: NodeId,
        criteria: &CriteriaChain,
        order_by: Option<SortKey>,
        reverse: bool,
        enabled_only: bool,
    ) -> Vec<NodeId> {
        let opts = WalkOptions {
            enabled_only,
            ..WalkOptions::default()
        };
        let matches: Vec<NodeId> = self
            .walk(root, &opts)
            .into_iter()
            .filter(|&id| criteria.matches(self.node(id)))
            .collect();
        log::debug!(
            "find under {}: {} match(es)",
            self.node(root).path(),
            matches.len()
        );
        arrange(self, &matches, order_by, reverse)
    }
}

/// The part of a branch that leads to a set of nodes: the branch root, the
/// nodes themselves, and every node in between.
#[derive(Debug, Clone)]
pub struct VirtualTree<'t> {
    tree: &'t Devicetree,
    root: NodeId,
    comb: HashSet<NodeId>,
    order_by: Option<SortKey>,
    reverse: bool,
}

impl<'t> VirtualTree<'t> {
    /// Nodes of `matches` that are not below `root` are ignored.
    pub fn new(
        tree: &'t Devicetree,
        root: NodeId,
        matches: &[NodeId],
        order_by: Option<SortKey>,
        reverse: bool,
    ) -> Self {
        let branch = tree.node(root);
        let mut comb = HashSet::new();
        comb.insert(root);
        for &id in matches {
            if !branch.contains(id) {
                continue;
            }
            let mut node = tree.node(id);
            while comb.insert(node.id()) {
                node = node.parent();
            }
        }
        Self {
            tree,
            root,
            comb,
            order_by,
            reverse,
        }
    }

    pub fn tree(&self) -> &'t Devicetree {
        self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.comb.contains(&id)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.comb.len()
    }

    /// Always false: the root is part of the tree.
    pub fn is_empty(&self) -> bool {
        self.comb.is_empty()
    }

    /// Retained children of `id`, ordered.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let kept: Vec<NodeId> = self
            .tree
            .node(id)
            .child_ids()
            .iter()
            .copied()
            .filter(|child| self.comb.contains(child))
            .collect();
        arrange(self.tree, &kept, self.order_by, self.reverse)
    }

    /// Retained nodes below the root, in pre-order, with their depth.
    pub fn walk(&self) -> Vec<(NodeId, usize)> {
        let mut out = Vec::new();
        let mut stack: Vec<(NodeId, usize)> = self
            .children(self.root)
            .into_iter()
            .rev()
            .map(|id| (id, 1))
            .collect();
        while let Some((id, depth)) = stack.pop() {
            out.push((id, depth));
            stack.extend(self.children(id).into_iter().rev().map(|child| (child, depth + 1)));
        }
        out
    }
}
