//! ASCII tree rendering.

use dtsh_model::{Devicetree, NodeId};

/// Draw the branch at `root`, labelled `anchor`, one line per node.
///
/// `children(id, depth)` gives the ordered children to draw below `id`,
/// which sits at `depth` below the root.
pub fn draw_tree(
    tree: &Devicetree,
    anchor: &str,
    root: NodeId,
    children: &dyn Fn(NodeId, usize) -> Vec<NodeId>,
) -> Vec<String> {
    let mut lines = vec![anchor.to_string()];
    draw_recursive(tree, root, 0, "", children, &mut lines);
    lines
}

fn draw_recursive(
    tree: &Devicetree,
    parent: NodeId,
    depth: usize,
    prefix: &str,
    children: &dyn Fn(NodeId, usize) -> Vec<NodeId>,
    lines: &mut Vec<String>,
) {
    let entries = children(parent, depth);
    let count = entries.len();
    for (i, id) in entries.into_iter().enumerate() {
        let is_last = i + 1 == count;
        let connector = if is_last { "└── " } else { "├── " };
        lines.push(format!("{prefix}{connector}{}", tree.node(id).name()));

        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };
        draw_recursive(tree, id, depth + 1, &child_prefix, children, lines);
    }
}
