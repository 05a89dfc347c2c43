//! Arena devicetree.
//!
//! Nodes live in a `Vec` and reference each other by [`NodeId`]. The root is
//! stored first and is its own parent, which closes `..` at the top of the
//! tree without a cyclic ownership. A `BTreeMap` keyed by absolute path gives
//! direct lookups. Trees are assembled with [`DevicetreeBuilder`] and are
//! read-only afterwards.

use std::collections::BTreeMap;

use dtsh_types::error::{DtshError, Result};

use crate::node::{Node, NodeAttributes};

/// Stable handle of a node within its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) parent: NodeId,
    pub(crate) children: Vec<NodeId>,
    pub(crate) attrs: NodeAttributes,
    pub(crate) dep_ordinal: u64,
    pub(crate) aliases: Vec<String>,
    pub(crate) chosen: Vec<String>,
}

/// A read-only devicetree.
#[derive(Debug, Clone)]
pub struct Devicetree {
    nodes: Vec<NodeData>,
    paths: BTreeMap<String, NodeId>,
    aliases: Vec<(String, NodeId)>,
    chosen: Vec<(String, NodeId)>,
}

impl Devicetree {
    const ROOT: NodeId = NodeId(0);

    /// Start building a tree with a bare root node.
    pub fn builder() -> DevicetreeBuilder {
        DevicetreeBuilder::new()
    }

    pub(crate) fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    pub fn root_id(&self) -> NodeId {
        Self::ROOT
    }

    pub fn root(&self) -> Node<'_> {
        Node::new(self, Self::ROOT)
    }

    /// View of the node with the given handle.
    pub fn node(&self, id: NodeId) -> Node<'_> {
        Node::new(self, id)
    }

    /// Node at an exact absolute path.
    pub fn node_at(&self, path: &str) -> Option<Node<'_>> {
        self.paths.get(path).map(|&id| Node::new(self, id))
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in pre-order (DTS order), root first.
    pub fn iter(&self) -> impl Iterator<Item = Node<'_>> {
        let mut stack = vec![Self::ROOT];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.data(id).children.iter().rev());
            Some(Node::new(self, id))
        })
    }

    /// Aliased nodes, by alias name.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, Node<'_>)> {
        self.aliases
            .iter()
            .map(|(name, id)| (name.as_str(), Node::new(self, *id)))
    }

    /// Chosen nodes, by chosen name.
    pub fn chosen(&self) -> impl Iterator<Item = (&str, Node<'_>)> {
        self.chosen
            .iter()
            .map(|(name, id)| (name.as_str(), Node::new(self, *id)))
    }
}

/// Incremental construction of a [`Devicetree`].
#[derive(Debug)]
pub struct DevicetreeBuilder {
    nodes: Vec<NodeData>,
    paths: BTreeMap<String, NodeId>,
    aliases: Vec<(String, String)>,
    chosen: Vec<(String, String)>,
}

impl DevicetreeBuilder {
    pub fn new() -> Self {
        let root = NodeData {
            name: "/".to_string(),
            path: "/".to_string(),
            parent: Devicetree::ROOT,
            children: Vec::new(),
            attrs: NodeAttributes::default(),
            dep_ordinal: 0,
            aliases: Vec::new(),
            chosen: Vec::new(),
        };
        let mut paths = BTreeMap::new();
        paths.insert("/".to_string(), Devicetree::ROOT);
        Self {
            nodes: vec![root],
            paths,
            aliases: Vec::new(),
            chosen: Vec::new(),
        }
    }

    pub fn root_id(&self) -> NodeId {
        Devicetree::ROOT
    }

    pub fn set_root_attributes(&mut self, attrs: NodeAttributes) {
        self.nodes[0].attrs = attrs;
    }

    /// Append a child to `parent`.
    pub fn add_node(&mut self, parent: NodeId, name: &str, attrs: NodeAttributes) -> Result<NodeId> {
        if name.is_empty() || name.contains('/') {
            return Err(DtshError::Source(format!("invalid node name: '{name}'")));
        }
        let parent_path = &self
            .nodes
            .get(parent.0)
            .ok_or_else(|| DtshError::Source(format!("no such parent: #{}", parent.0)))?
            .path;
        let path = if parent_path == "/" {
            format!("/{name}")
        } else {
            format!("{parent_path}/{name}")
        };
        if self.paths.contains_key(&path) {
            return Err(DtshError::Source(format!("duplicate node: {path}")));
        }

        let id = NodeId(self.nodes.len());
        self.paths.insert(path.clone(), id);
        self.nodes.push(NodeData {
            name: name.to_string(),
            path,
            parent,
            children: Vec::new(),
            attrs,
            dep_ordinal: 0,
            aliases: Vec::new(),
            chosen: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Declare an alias; the target path is resolved by [`build`](Self::build).
    pub fn add_alias(&mut self, name: &str, path: &str) {
        self.aliases.push((name.to_string(), path.to_string()));
    }

    /// Declare a chosen entry; the target path is resolved by [`build`](Self::build).
    pub fn add_chosen(&mut self, name: &str, path: &str) {
        self.chosen.push((name.to_string(), path.to_string()));
    }

    /// Freeze the tree.
    ///
    /// Resolves alias and chosen targets, and assigns pre-order dependency
    /// ordinals to nodes that were not given one.
    pub fn build(mut self) -> Result<Devicetree> {
        let aliases = Self::resolve(&self.paths, &self.aliases, "alias")?;
        let chosen = Self::resolve(&self.paths, &self.chosen, "chosen")?;
        for (name, id) in &aliases {
            self.nodes[id.0].aliases.push(name.clone());
        }
        for (name, id) in &chosen {
            self.nodes[id.0].chosen.push(name.clone());
        }

        let mut ordinal = 0;
        let mut stack = vec![Devicetree::ROOT];
        while let Some(id) = stack.pop() {
            let data = &mut self.nodes[id.0];
            data.dep_ordinal = data.attrs.dep_ordinal.unwrap_or(ordinal);
            ordinal += 1;
            stack.extend(data.children.iter().rev());
        }

        log::debug!(
            "devicetree: {} nodes, {} aliases, {} chosen",
            self.nodes.len(),
            aliases.len(),
            chosen.len()
        );
        Ok(Devicetree {
            nodes: self.nodes,
            paths: self.paths,
            aliases,
            chosen,
        })
    }

    fn resolve(
        paths: &BTreeMap<String, NodeId>,
        entries: &[(String, String)],
        what: &str,
    ) -> Result<Vec<(String, NodeId)>> {
        entries
            .iter()
            .map(|(name, path)| match paths.get(path) {
                Some(&id) => Ok((name.clone(), id)),
                None => Err(DtshError::Source(format!("{what} '{name}': no such node '{path}'"))),
            })
            .collect()
    }
}

impl Default for DevicetreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::board;

    #[test]
    fn builder_assigns_paths() {
        let mut b = Devicetree::builder();
        let parent = b.add_node(b.root_id(), "parent", NodeAttributes::default()).unwrap();
        let child = b.add_node(parent, "child-1", NodeAttributes::default()).unwrap();
        let tree = b.build().unwrap();
        assert_eq!(tree.node(parent).path(), "/parent");
        assert_eq!(tree.node(child).path(), "/parent/child-1");
        assert_eq!(tree.node(child).parent().id(), parent);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn builder_rejects_duplicates() {
        let mut b = Devicetree::builder();
        b.add_node(b.root_id(), "soc", NodeAttributes::default()).unwrap();
        let err = b.add_node(b.root_id(), "soc", NodeAttributes::default()).unwrap_err();
        assert_eq!(format!("{err}"), "devicetree source error: duplicate node: /soc");
    }

    #[test]
    fn builder_rejects_bad_names() {
        let mut b = Devicetree::builder();
        assert!(b.add_node(b.root_id(), "", NodeAttributes::default()).is_err());
        assert!(b.add_node(b.root_id(), "a/b", NodeAttributes::default()).is_err());
    }

    #[test]
    fn builder_rejects_dangling_alias() {
        let mut b = Devicetree::builder();
        b.add_alias("led0", "/leds/led_0");
        let err = b.build().unwrap_err();
        assert_eq!(
            format!("{err}"),
            "devicetree source error: alias 'led0': no such node '/leds/led_0'"
        );
    }

    #[test]
    fn dep_ordinals_follow_preorder() {
        let mut b = Devicetree::builder();
        let a = b.add_node(b.root_id(), "a", NodeAttributes::default()).unwrap();
        let c = b.add_node(b.root_id(), "c", NodeAttributes::default()).unwrap();
        // Added last, but visited before "c".
        let b_node = b.add_node(a, "b", NodeAttributes::default()).unwrap();
        let tree = b.build().unwrap();
        assert_eq!(tree.root().dep_ordinal(), 0);
        assert_eq!(tree.node(a).dep_ordinal(), 1);
        assert_eq!(tree.node(b_node).dep_ordinal(), 2);
        assert_eq!(tree.node(c).dep_ordinal(), 3);
    }

    #[test]
    fn iter_is_preorder() {
        let tree = board();
        let paths: Vec<&str> = tree.iter().map(|n| n.path()).take(5).collect();
        assert_eq!(
            paths,
            ["/", "/cpus", "/cpus/cpu@0", "/soc", "/soc/interrupt-controller@e000e100"]
        );
        assert_eq!(tree.iter().count(), tree.len());
        assert_eq!(tree.len(), 20);
    }

    #[test]
    fn node_at_exact_path_only() {
        let tree = board();
        assert!(tree.node_at("/soc").is_some());
        assert!(tree.node_at("/soc/").is_none());
        assert!(tree.node_at("soc").is_none());
    }

    #[test]
    fn alias_table() {
        let tree = board();
        let aliases: Vec<(&str, &str)> = tree.aliases().map(|(a, n)| (a, n.path())).collect();
        assert_eq!(
            aliases,
            [
                ("led0", "/leds/led_0"),
                ("led1", "/leds/led_1"),
                ("sensor", "/soc/i2c@40003000/bme680@76"),
            ]
        );
    }
}
